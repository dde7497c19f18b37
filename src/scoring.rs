//! Solunar scoring engine
//!
//! Turns a day's moon phase and solar/lunar timings into a 0-100 fishing
//! score, a 24-hour activity curve, and the single best activity window.
//! Peaks that fall within 90 minutes of sunrise or sunset are "aligned" and
//! earn extra weight both in the score and in the curve.

use std::f64::consts::PI;

use crate::astronomy::{clock_parts, LunarPeaks, SolarTimes};

/// Maximum twilight distance for a peak to count as aligned
pub const ALIGNMENT_WINDOW_MINUTES: f64 = 90.0;

/// Cap on the summed alignment bonus
pub const MAX_ALIGNMENT_BONUS: u32 = 20;

const MINUTES_PER_DAY: f64 = 1440.0;

/// Phase distance from new or full moon that earns the stacking bonus
const STRONG_PHASE_TOLERANCE: f64 = 0.05;
const STRONG_PHASE_BONUS: f64 = 5.0;

/// Baseline activity of every hour
const CURVE_FLOOR: f64 = 20.0;
const CURVE_MIN: f64 = 10.0;
const CURVE_MAX: f64 = 100.0;

/// Half-width and amplitude of the dawn/dusk bumps
const TWILIGHT_WINDOW_MINUTES: f64 = 120.0;
const TWILIGHT_AMPLITUDE: f64 = 22.0;

/// Solunar peak types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeakKind {
    /// Lunar transit or opposite transit
    Major,
    /// Quarter-day offsets, near moonrise and moonset
    Minor,
}

impl PeakKind {
    pub fn label(&self) -> &'static str {
        match self {
            PeakKind::Major => "major",
            PeakKind::Minor => "minor",
        }
    }
}

/// Shape and weight of one peak kind
#[derive(Debug, Clone, Copy)]
pub struct PeakProfile {
    /// Score bonus per matched twilight anchor
    pub alignment_bonus: u32,
    /// Half-width of the curve bump in minutes
    pub window_minutes: f64,
    /// Curve bump height
    pub amplitude: f64,
    /// Extra curve height when the peak is aligned
    pub aligned_amplitude: f64,
    /// Half-width of the reported activity window in minutes
    pub report_half_width_minutes: f64,
}

impl PeakKind {
    pub fn profile(&self) -> PeakProfile {
        match self {
            PeakKind::Major => PeakProfile {
                alignment_bonus: 10,
                window_minutes: 120.0,
                amplitude: 45.0,
                aligned_amplitude: 30.0,
                report_half_width_minutes: 60.0,
            },
            PeakKind::Minor => PeakProfile {
                alignment_bonus: 5,
                window_minutes: 75.0,
                amplitude: 20.0,
                aligned_amplitude: 15.0,
                report_half_width_minutes: 30.0,
            },
        }
    }
}

/// A peak at a local time of day in decimal hours
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Peak {
    pub kind: PeakKind,
    pub hour: f64,
}

/// Collects the two major and two minor peaks of a day
pub fn peaks_of(lunar: &LunarPeaks) -> Vec<Peak> {
    lunar
        .major
        .iter()
        .map(|&hour| Peak {
            kind: PeakKind::Major,
            hour,
        })
        .chain(lunar.minor.iter().map(|&hour| Peak {
            kind: PeakKind::Minor,
            hour,
        }))
        .collect()
}

/// Best activity window of a day, centred on its winning peak
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeakWindow {
    pub kind: PeakKind,
    pub aligned: bool,
    /// Centre in decimal hours
    pub center: f64,
    pub start: f64,
    pub end: f64,
}

impl PeakWindow {
    /// 12-hour range such as "5:30 AM - 7:30 AM"
    pub fn range_label(&self) -> String {
        format!("{} - {}", format_12h(self.start), format_12h(self.end))
    }
}

/// Result of scoring one day
#[derive(Debug, Clone, PartialEq)]
pub struct DayScore {
    /// 0-100
    pub score: u8,
    /// 24 values within 10..=100
    pub hourly_activity: Vec<u8>,
    pub peak_window: Option<PeakWindow>,
}

/// Scores a day from its phase, solar times and lunar peaks
pub fn score_day(phase: f64, solar: &SolarTimes, lunar: &LunarPeaks) -> DayScore {
    let peaks = peaks_of(lunar);
    let score = daily_score(phase, &peaks, solar);

    DayScore {
        score,
        hourly_activity: hourly_activity(score, &peaks, solar),
        peak_window: peak_window(&peaks, solar),
    }
}

/// Shortest distance between two clock times in minutes, wrapping at midnight
pub fn circular_distance_minutes(a_hours: f64, b_hours: f64) -> f64 {
    let diff = (a_hours - b_hours).abs() * 60.0 % MINUTES_PER_DAY;
    diff.min(MINUTES_PER_DAY - diff)
}

/// Distance from a time to the nearer of sunrise and sunset
pub fn twilight_distance_minutes(hour: f64, solar: &SolarTimes) -> f64 {
    circular_distance_minutes(hour, solar.sunrise).min(circular_distance_minutes(hour, solar.sunset))
}

pub fn is_aligned(hour: f64, solar: &SolarTimes) -> bool {
    twilight_distance_minutes(hour, solar) <= ALIGNMENT_WINDOW_MINUTES
}

/// Moon-phase component of the score, in [50, 95]
///
/// `cos(4πp)` peaks at new and full moon and bottoms out at the quarters;
/// new and full moon also get a flat bonus on top.
pub fn base_score(phase: f64) -> f64 {
    let impact = ((phase * 4.0 * PI).cos() + 1.0) / 2.0;
    let mut base = 50.0 + impact * 40.0;

    let near_new = phase < STRONG_PHASE_TOLERANCE || phase > 1.0 - STRONG_PHASE_TOLERANCE;
    let near_full = (phase - 0.5).abs() < STRONG_PHASE_TOLERANCE;
    if near_new || near_full {
        base += STRONG_PHASE_BONUS;
    }

    base
}

/// Sum of per-anchor bonuses for peaks near sunrise or sunset, capped
pub fn alignment_bonus(peaks: &[Peak], solar: &SolarTimes) -> u32 {
    let total: u32 = peaks
        .iter()
        .map(|peak| {
            let bonus = peak.kind.profile().alignment_bonus;
            [solar.sunrise, solar.sunset]
                .iter()
                .filter(|&&anchor| {
                    circular_distance_minutes(peak.hour, anchor) <= ALIGNMENT_WINDOW_MINUTES
                })
                .count() as u32
                * bonus
        })
        .sum();

    total.min(MAX_ALIGNMENT_BONUS)
}

pub fn daily_score(phase: f64, peaks: &[Peak], solar: &SolarTimes) -> u8 {
    let total = base_score(phase) + f64::from(alignment_bonus(peaks, solar));
    total.floor().clamp(0.0, 100.0) as u8
}

/// Activity for each hour of the day, evaluated at the start of the hour.
///
/// Strong days are rescaled so the curve reaches near saturation: score 85+
/// stretches the peak to 100 when it is below 95, and score 70+ stretches it
/// to 85 when it is below 80.
pub fn hourly_activity(score: u8, peaks: &[Peak], solar: &SolarTimes) -> Vec<u8> {
    let mut curve: Vec<u8> = (0..24)
        .map(|hour| {
            let at = f64::from(hour);
            let mut value = CURVE_FLOOR;

            for anchor in [solar.sunrise, solar.sunset] {
                let distance = circular_distance_minutes(at, anchor);
                if distance <= TWILIGHT_WINDOW_MINUTES {
                    value += TWILIGHT_AMPLITUDE * ((PI * distance / TWILIGHT_WINDOW_MINUTES).cos() + 1.0) / 2.0;
                }
            }

            for peak in peaks {
                let profile = peak.kind.profile();
                let distance = circular_distance_minutes(at, peak.hour);
                if distance <= profile.window_minutes {
                    let mut amplitude = profile.amplitude;
                    if is_aligned(peak.hour, solar) {
                        amplitude += profile.aligned_amplitude;
                    }
                    let shape = (PI / 2.0 * distance / profile.window_minutes).cos();
                    value += amplitude * shape * shape;
                }
            }

            value.clamp(CURVE_MIN, CURVE_MAX).floor() as u8
        })
        .collect();

    // Every hour is at least CURVE_MIN, so max is never zero
    let max = curve.iter().copied().max().unwrap_or(CURVE_MIN as u8);
    let target = if score >= 85 && max < 95 {
        Some(100.0)
    } else if score >= 70 && max < 80 {
        Some(85.0)
    } else {
        None
    };

    if let Some(target) = target {
        for value in curve.iter_mut() {
            let scaled = (f64::from(*value) * target / f64::from(max)).floor();
            *value = scaled.clamp(CURVE_MIN, CURVE_MAX) as u8;
        }
    }

    curve
}

/// Picks the day's best window.
///
/// Aligned peaks beat unaligned ones, majors beat minors, then the peak
/// closer to twilight wins, then the earlier one.
pub fn peak_window(peaks: &[Peak], solar: &SolarTimes) -> Option<PeakWindow> {
    let best = peaks.iter().min_by(|a, b| {
        let rank = |peak: &Peak| {
            (
                !is_aligned(peak.hour, solar),
                peak.kind != PeakKind::Major,
            )
        };
        rank(a)
            .cmp(&rank(b))
            .then_with(|| {
                twilight_distance_minutes(a.hour, solar)
                    .total_cmp(&twilight_distance_minutes(b.hour, solar))
            })
            .then_with(|| a.hour.total_cmp(&b.hour))
    })?;

    let half_width = best.kind.profile().report_half_width_minutes / 60.0;
    Some(PeakWindow {
        kind: best.kind,
        aligned: is_aligned(best.hour, solar),
        center: best.hour,
        start: best.hour - half_width,
        end: best.hour + half_width,
    })
}

/// Formats decimal hours as a 12-hour clock time such as "5:30 AM"
pub fn format_12h(hours: f64) -> String {
    let (hour, minute) = clock_parts(hours);
    let suffix = if hour < 12 { "AM" } else { "PM" };
    let display_hour = match hour % 12 {
        0 => 12,
        h => h,
    };
    format!("{}:{:02} {}", display_hour, minute, suffix)
}
