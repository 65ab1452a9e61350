//! ICBM flight-duration and altitude modeling (§4.5).
//!
//! A flight is split into three phases — boost, midcourse, re-entry — each
//! capped at `PHASE_FRACTION_CAP` of the total duration (and at an absolute
//! millisecond cap besides). Altitude rises sinusoidally through boost, holds
//! near apex through midcourse, and falls sinusoidally through re-entry.

use standoff_core::constants::{
    APEX_ALTITUDE_MAX_M, APEX_ALTITUDE_PER_KM, BOOST_PHASE_CAP_MS, ICBM_SPEED_KM_PER_SEC,
    MIN_FLIGHT_DURATION_MS, PHASE_FRACTION_CAP, REENTRY_PHASE_CAP_MS,
};

/// Which leg of the flight a given elapsed time falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlightPhase {
    Boost,
    Midcourse,
    Reentry,
}

/// The boost/midcourse/re-entry millisecond split for a flight of the given
/// total duration (§4.5: each of boost and re-entry is capped both in
/// absolute ms and as a fraction of the total).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaseSplit {
    pub boost_ms: u64,
    pub midcourse_ms: u64,
    pub reentry_ms: u64,
}

impl PhaseSplit {
    pub fn for_duration(total_duration_ms: u64) -> Self {
        let fraction_cap = (total_duration_ms as f64 * PHASE_FRACTION_CAP) as u64;
        let boost_ms = BOOST_PHASE_CAP_MS.min(fraction_cap);
        let reentry_ms = REENTRY_PHASE_CAP_MS.min(fraction_cap);
        let midcourse_ms = total_duration_ms.saturating_sub(boost_ms + reentry_ms);
        Self {
            boost_ms,
            midcourse_ms,
            reentry_ms,
        }
    }

    pub fn total_ms(&self) -> u64 {
        self.boost_ms + self.midcourse_ms + self.reentry_ms
    }

    pub fn phase_at(&self, elapsed_ms: u64) -> FlightPhase {
        if elapsed_ms < self.boost_ms {
            FlightPhase::Boost
        } else if elapsed_ms < self.boost_ms + self.midcourse_ms {
            FlightPhase::Midcourse
        } else {
            FlightPhase::Reentry
        }
    }
}

/// Total flight duration for a launch covering `distance_km`, respecting the
/// minimum flight duration floor so very short hops still render (§4.5).
pub fn flight_duration_ms(distance_km: f64) -> u64 {
    let nominal_ms = (distance_km / ICBM_SPEED_KM_PER_SEC * 1000.0).round() as u64;
    nominal_ms.max(MIN_FLIGHT_DURATION_MS)
}

/// Apex altitude (meters) for a launch covering `distance_km`, clamped at
/// `APEX_ALTITUDE_MAX_M` (§4.5).
pub fn apex_altitude_m(distance_km: f64) -> f64 {
    (distance_km * APEX_ALTITUDE_PER_KM).min(APEX_ALTITUDE_MAX_M)
}

/// Altitude (meters) at `elapsed_ms` into a flight with the given
/// `apex_altitude_m` and phase split.
pub fn altitude_m(elapsed_ms: u64, apex_altitude_m: f64, split: PhaseSplit) -> f64 {
    use std::f64::consts::FRAC_PI_2;

    match split.phase_at(elapsed_ms) {
        FlightPhase::Boost => {
            if split.boost_ms == 0 {
                return apex_altitude_m;
            }
            let t = elapsed_ms as f64 / split.boost_ms as f64;
            apex_altitude_m * (t * FRAC_PI_2).sin()
        }
        FlightPhase::Midcourse => apex_altitude_m,
        FlightPhase::Reentry => {
            if split.reentry_ms == 0 {
                return 0.0;
            }
            let into_reentry = elapsed_ms - split.boost_ms - split.midcourse_ms;
            let t = (into_reentry as f64 / split.reentry_ms as f64).min(1.0);
            apex_altitude_m * (t * FRAC_PI_2).cos()
        }
    }
}

/// Progress fraction `[0, 1]` of the flight at `elapsed_ms`, used to index
/// the rail-interceptor search window (§4.5).
pub fn progress(elapsed_ms: u64, total_duration_ms: u64) -> f64 {
    if total_duration_ms == 0 {
        return 1.0;
    }
    (elapsed_ms as f64 / total_duration_ms as f64).clamp(0.0, 1.0)
}

/// Current altitude (meters) of an in-flight missile tracked by `progress`
/// rather than elapsed time directly — the shape `MissileCommon` stores its
/// flight state in (§4.8's radar-horizon check reads this).
pub fn altitude_at_progress(progress: f64, flight_duration_ms: u64, apex_altitude_m: f64) -> f64 {
    let elapsed_ms = (progress * flight_duration_ms as f64) as u64;
    let split = PhaseSplit::for_duration(flight_duration_ms);
    altitude_m(elapsed_ms, apex_altitude_m, split)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_hops_still_meet_the_minimum_duration() {
        assert_eq!(flight_duration_ms(1.0), MIN_FLIGHT_DURATION_MS);
    }

    #[test]
    fn long_hops_scale_with_distance() {
        let d = flight_duration_ms(14_000.0);
        assert!(d > MIN_FLIGHT_DURATION_MS);
        assert_eq!(d, (14_000.0 / ICBM_SPEED_KM_PER_SEC * 1000.0).round() as u64);
    }

    #[test]
    fn apex_altitude_is_clamped() {
        assert!(apex_altitude_m(100_000.0) <= APEX_ALTITUDE_MAX_M);
        assert_eq!(apex_altitude_m(10.0), 10.0 * APEX_ALTITUDE_PER_KM);
    }

    #[test]
    fn phase_split_caps_boost_and_reentry_fractions() {
        let split = PhaseSplit::for_duration(1_000_000);
        // at this duration the absolute caps bind, not the fraction caps
        assert_eq!(split.boost_ms, BOOST_PHASE_CAP_MS);
        assert_eq!(split.reentry_ms, REENTRY_PHASE_CAP_MS);
        assert!(split.midcourse_ms > 0);
    }

    #[test]
    fn phase_split_respects_fraction_cap_on_short_flights() {
        let split = PhaseSplit::for_duration(10_000);
        let expected = (10_000.0 * PHASE_FRACTION_CAP) as u64;
        assert_eq!(split.boost_ms, expected.min(BOOST_PHASE_CAP_MS));
        assert_eq!(split.total_ms(), 10_000);
    }

    #[test]
    fn altitude_starts_and_ends_near_zero() {
        let split = PhaseSplit::for_duration(20_000);
        let apex = 500_000.0;
        assert!(altitude_m(0, apex, split) < 1.0);
        assert!(altitude_m(split.total_ms(), apex, split) < 1.0);
    }

    #[test]
    fn altitude_reaches_apex_during_midcourse() {
        let split = PhaseSplit::for_duration(20_000);
        let apex = 500_000.0;
        let mid_point = split.boost_ms + split.midcourse_ms / 2;
        assert!((altitude_m(mid_point, apex, split) - apex).abs() < 1e-6);
    }

    #[test]
    fn altitude_rises_through_boost_and_falls_through_reentry() {
        let split = PhaseSplit::for_duration(20_000);
        let apex = 500_000.0;
        let early = altitude_m(split.boost_ms / 4, apex, split);
        let late_boost = altitude_m(split.boost_ms - 1, apex, split);
        assert!(early < late_boost);

        let reentry_start = split.boost_ms + split.midcourse_ms;
        let early_reentry = altitude_m(reentry_start + 1, apex, split);
        let late_reentry = altitude_m(reentry_start + split.reentry_ms - 1, apex, split);
        assert!(late_reentry < early_reentry);
    }

    #[test]
    fn progress_is_clamped_to_unit_interval() {
        assert_eq!(progress(0, 10_000), 0.0);
        assert_eq!(progress(10_000, 10_000), 1.0);
        assert_eq!(progress(20_000, 10_000), 1.0);
    }
}
