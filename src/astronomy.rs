//! Solar and lunar timing for a date and location
//!
//! Closed-form approximations good to within tens of minutes: moon phase from
//! the synodic month, sunrise/sunset from solar declination and hour angle, and
//! solunar major/minor peaks from an approximate lunar transit. All functions
//! are pure; polar latitudes clamp instead of failing.

use std::f64::consts::PI;

use chrono::{Datelike, NaiveDate};

use crate::data::{Location, MoonPhase};

/// Mean length of the synodic month in days
pub const SYNODIC_MONTH_DAYS: f64 = 29.530588853;

/// Julian day of a reference new moon (2000-01-06)
const NEW_MOON_REFERENCE_JD: f64 = 2_451_550.1;

/// Julian day of 0001-01-01T00:00 UTC minus one day, so that adding
/// `num_days_from_ce` gives the Julian day at midnight
const CE_EPOCH_JD: f64 = 1_721_424.5;

/// Half a lunar day in hours, the spacing of the two major peaks
pub const HALF_LUNAR_DAY_HOURS: f64 = 12.42;

/// Quarter of a lunar day in hours, the offset of minor peaks from transit
pub const QUARTER_LUNAR_DAY_HOURS: f64 = 6.21;

/// Sunrise, solar noon and sunset in local decimal hours
///
/// Values are not wrapped: at polar latitudes sunrise may be at or below 0
/// and sunset at or above 24.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolarTimes {
    pub sunrise: f64,
    pub solar_noon: f64,
    pub sunset: f64,
}

/// Lunar transit and the solunar peaks derived from it, in hours within [0, 24)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LunarPeaks {
    pub transit: f64,
    /// Transit and the opposite transit, ascending
    pub major: [f64; 2],
    /// Quarter-day offsets from transit, ascending
    pub minor: [f64; 2],
    pub moonrise: f64,
    pub moonset: f64,
}

/// Everything the scorer needs to know about one day's sky
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DayAstronomy {
    pub phase: f64,
    pub phase_name: MoonPhase,
    pub solar: SolarTimes,
    pub lunar: LunarPeaks,
}

impl DayAstronomy {
    pub fn compute(date: NaiveDate, location: &Location) -> Self {
        let phase = moon_phase(date);
        let solar = solar_times(date, location.latitude, location.longitude);
        let lunar = lunar_peaks(solar.solar_noon, phase);

        Self {
            phase,
            phase_name: moon_phase_name(phase),
            solar,
            lunar,
        }
    }
}

/// Moon phase in [0, 1) at midnight UTC of `date`; 0 is new, 0.5 is full
pub fn moon_phase(date: NaiveDate) -> f64 {
    let julian_day = CE_EPOCH_JD + f64::from(date.num_days_from_ce());
    let cycles = (julian_day - NEW_MOON_REFERENCE_JD) / SYNODIC_MONTH_DAYS;

    let mut phase = cycles.fract();
    if phase < 0.0 {
        phase += 1.0;
    }
    // Adding 1 to a tiny negative fraction can round to exactly 1.0
    if phase >= 1.0 {
        phase = 0.0;
    }
    phase
}

/// Buckets a phase value into one of the 8 named phases.
///
/// Lower bounds are inclusive, upper bounds exclusive, except that the
/// waning crescent includes 0.97 itself.
pub fn moon_phase_name(phase: f64) -> MoonPhase {
    match phase {
        p if p < 0.03 => MoonPhase::NewMoon,
        p if p < 0.22 => MoonPhase::WaxingCrescent,
        p if p < 0.28 => MoonPhase::FirstQuarter,
        p if p < 0.47 => MoonPhase::WaxingGibbous,
        p if p < 0.53 => MoonPhase::FullMoon,
        p if p < 0.72 => MoonPhase::WaningGibbous,
        p if p < 0.78 => MoonPhase::LastQuarter,
        p if p <= 0.97 => MoonPhase::WaningCrescent,
        _ => MoonPhase::NewMoon,
    }
}

/// Sunrise, solar noon and sunset for a date and location
///
/// Solar noon is shifted from 12:00 by the distance between the longitude
/// and the centre of its nominal 15°-wide time zone.
pub fn solar_times(date: NaiveDate, latitude: f64, longitude: f64) -> SolarTimes {
    let day_of_year = f64::from(date.ordinal());
    let declination = 0.409 * (2.0 * PI * (day_of_year - 81.0) / 365.0).sin();

    let cos_hour_angle = (-latitude.to_radians().tan() * declination.tan()).clamp(-1.0, 1.0);
    let hour_angle = cos_hour_angle.acos() * (12.0 / PI);

    let zone_meridian = (longitude / 15.0).round() * 15.0;
    let correction = (zone_meridian - longitude) * (12.0 / 180.0);
    let solar_noon = 12.0 + correction;

    SolarTimes {
        sunrise: solar_noon - hour_angle,
        solar_noon,
        sunset: solar_noon + hour_angle,
    }
}

/// Approximate lunar transit and solunar peaks
///
/// The transit lags solar noon by the phase fraction of a day. This drifts
/// from the true lunar hour angle by up to an hour or so over a lunation;
/// scoring thresholds are tuned against this approximation.
pub fn lunar_peaks(solar_noon: f64, phase: f64) -> LunarPeaks {
    let transit = (solar_noon + phase * 24.0).rem_euclid(24.0);

    let mut major = [transit, (transit + HALF_LUNAR_DAY_HOURS).rem_euclid(24.0)];
    major.sort_by(f64::total_cmp);

    let moonrise = (transit - QUARTER_LUNAR_DAY_HOURS + 24.0).rem_euclid(24.0);
    let moonset = (transit + QUARTER_LUNAR_DAY_HOURS).rem_euclid(24.0);
    let mut minor = [moonrise, moonset];
    minor.sort_by(f64::total_cmp);

    LunarPeaks {
        transit,
        major,
        minor,
        moonrise,
        moonset,
    }
}

/// Splits decimal hours into whole (hour, minute) after wrapping into [0, 24)
pub fn clock_parts(hours: f64) -> (u32, u32) {
    let wrapped = hours.rem_euclid(24.0);
    let hour = wrapped.floor();
    let minute = ((wrapped - hour) * 60.0).floor();
    ((hour as u32).min(23), (minute as u32).min(59))
}

/// Formats decimal hours as a 24-hour "HH:MM" string
pub fn format_clock(hours: f64) -> String {
    let (hour, minute) = clock_parts(hours);
    format!("{:02}:{:02}", hour, minute)
}
