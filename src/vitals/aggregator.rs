//! Presentation-derived facts over a vitals history.
//!
//! Nothing here mutates the store; everything is recomputed on read.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::store::VitalsHistory;
use super::types::{Measurement, NormalRange, PrimaryValue, Reading, VitalType};

/// Direction of change between the two most recent readings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    Stable,
}

impl Trend {
    pub fn arrow(&self) -> &'static str {
        match self {
            Self::Up => "↑",
            Self::Down => "↓",
            Self::Stable => "→",
        }
    }
}

/// Compare the primary value of the last two readings
pub fn trend<V: PrimaryValue>(readings: &[Reading<V>]) -> Trend {
    let [.., previous, last] = readings else {
        return Trend::Stable;
    };
    let (last, previous) = (last.value.primary(), previous.value.primary());
    if last > previous {
        Trend::Up
    } else if last < previous {
        Trend::Down
    } else {
        Trend::Stable
    }
}

/// Whether a measurement falls outside its normal range.
///
/// Fail-open: a measurement whose shape does not match the vital type, or a
/// non-finite value, is reported as not critical.
pub fn is_critical(vital: VitalType, measurement: &Measurement) -> bool {
    match evaluate_critical(vital, measurement) {
        Some(critical) => critical,
        None => {
            debug!(
                "Unable to evaluate {} measurement {:?}; treating as not critical",
                vital, measurement
            );
            false
        }
    }
}

fn evaluate_critical(vital: VitalType, measurement: &Measurement) -> Option<bool> {
    match (vital, measurement) {
        (VitalType::BloodPressure, Measurement::BloodPressure(bp)) => {
            if !bp.systolic.is_finite() || !bp.diastolic.is_finite() {
                return None;
            }
            Some(
                NormalRange::SYSTOLIC.is_breached(bp.systolic)
                    || NormalRange::DIASTOLIC.is_breached(bp.diastolic),
            )
        }
        (VitalType::BloodPressure, Measurement::Scalar(_)) => None,
        (_, Measurement::BloodPressure(_)) => None,
        (_, Measurement::Scalar(value)) if !value.is_finite() => None,
        // Oxygen saturation has no upper bound; its range max is infinite
        (scalar, Measurement::Scalar(value)) => Some(scalar.normal_range().is_breached(*value)),
    }
}

impl VitalsHistory {
    /// Trend for a vital type (systolic drives blood pressure)
    pub fn trend(&self, vital: VitalType) -> Trend {
        match vital {
            VitalType::HeartRate => trend(self.heart_rate.readings()),
            VitalType::BloodPressure => trend(self.blood_pressure.readings()),
            VitalType::Temperature => trend(self.temperature.readings()),
            VitalType::OxygenSaturation => trend(self.oxygen_saturation.readings()),
        }
    }

    /// Latest reading of a vital type as a type-erased measurement
    pub fn latest(&self, vital: VitalType) -> Option<(DateTime<Utc>, Measurement)> {
        match vital {
            VitalType::HeartRate => latest_of(self.heart_rate.latest()),
            VitalType::BloodPressure => latest_of(self.blood_pressure.latest()),
            VitalType::Temperature => latest_of(self.temperature.latest()),
            VitalType::OxygenSaturation => latest_of(self.oxygen_saturation.latest()),
        }
    }

    /// Whether the latest reading of a vital type is critical
    pub fn is_latest_critical(&self, vital: VitalType) -> bool {
        self.latest(vital)
            .map(|(_, m)| is_critical(vital, &m))
            .unwrap_or(false)
    }

    /// Every reading of a vital type that breaches its normal range
    pub fn critical_readings(&self, vital: VitalType) -> Vec<(DateTime<Utc>, Measurement)> {
        self.measurements(vital)
            .into_iter()
            .filter(|(_, m)| is_critical(vital, m))
            .collect()
    }

    /// All readings of a vital type as type-erased measurements, in time order
    pub fn measurements(&self, vital: VitalType) -> Vec<(DateTime<Utc>, Measurement)> {
        fn erase<V: Copy + Into<Measurement>>(readings: &[Reading<V>]) -> Vec<(DateTime<Utc>, Measurement)> {
            readings.iter().map(|r| (r.timestamp, r.value.into())).collect()
        }
        match vital {
            VitalType::HeartRate => erase(self.heart_rate.readings()),
            VitalType::BloodPressure => erase(self.blood_pressure.readings()),
            VitalType::Temperature => erase(self.temperature.readings()),
            VitalType::OxygenSaturation => erase(self.oxygen_saturation.readings()),
        }
    }
}

fn latest_of<V: Copy + Into<Measurement>>(reading: Option<&Reading<V>>) -> Option<(DateTime<Utc>, Measurement)> {
    reading.map(|r| (r.timestamp, r.value.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vitals::types::BloodPressure;
    use chrono::{Duration, TimeZone};
    use proptest::prelude::*;

    fn series(values: &[f64]) -> Vec<Reading<f64>> {
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        values
            .iter()
            .enumerate()
            .map(|(i, v)| Reading::new(start + Duration::hours(i as i64), *v))
            .collect()
    }

    #[test]
    fn test_trend_directions() {
        assert_eq!(trend(&series(&[70.0, 75.0])), Trend::Up);
        assert_eq!(trend(&series(&[75.0, 70.0])), Trend::Down);
        assert_eq!(trend(&series(&[80.0, 70.0, 70.0])), Trend::Stable);
    }

    #[test]
    fn test_trend_short_sequences_are_stable() {
        assert_eq!(trend::<f64>(&[]), Trend::Stable);
        assert_eq!(trend(&series(&[90.0])), Trend::Stable);
    }

    #[test]
    fn test_blood_pressure_trend_uses_systolic() {
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let readings = vec![
            Reading::new(start, BloodPressure::new(120.0, 90.0)),
            Reading::new(start + Duration::hours(1), BloodPressure::new(125.0, 70.0)),
        ];
        assert_eq!(trend(&readings), Trend::Up);
    }

    #[test]
    fn test_oxygen_saturation_lower_bound_only() {
        assert!(is_critical(VitalType::OxygenSaturation, &94.0.into()));
        assert!(!is_critical(VitalType::OxygenSaturation, &100.0.into()));
        assert!(!is_critical(VitalType::OxygenSaturation, &95.0.into()));
    }

    #[test]
    fn test_blood_pressure_either_breach_is_critical() {
        let systolic_high = BloodPressure::new(145.0, 70.0).into();
        let diastolic_low = BloodPressure::new(120.0, 55.0).into();
        let normal = BloodPressure::new(120.0, 80.0).into();
        assert!(is_critical(VitalType::BloodPressure, &systolic_high));
        assert!(is_critical(VitalType::BloodPressure, &diastolic_low));
        assert!(!is_critical(VitalType::BloodPressure, &normal));
    }

    #[test]
    fn test_scalar_ranges_are_inclusive() {
        assert!(!is_critical(VitalType::HeartRate, &60.0.into()));
        assert!(!is_critical(VitalType::HeartRate, &100.0.into()));
        assert!(is_critical(VitalType::HeartRate, &100.5.into()));
        assert!(is_critical(VitalType::Temperature, &37.5.into()));
        assert!(is_critical(VitalType::Temperature, &35.9.into()));
    }

    #[test]
    fn test_malformed_measurements_fail_open() {
        assert!(!is_critical(VitalType::BloodPressure, &180.0.into()));
        assert!(!is_critical(
            VitalType::HeartRate,
            &BloodPressure::new(200.0, 120.0).into()
        ));
        assert!(!is_critical(VitalType::HeartRate, &f64::NAN.into()));
        assert!(!is_critical(
            VitalType::BloodPressure,
            &BloodPressure::new(f64::NAN, 200.0).into()
        ));
    }

    #[test]
    fn test_history_latest_on_empty() {
        let history = VitalsHistory::new();
        for vital in VitalType::ALL {
            assert!(history.latest(vital).is_none());
            assert!(!history.is_latest_critical(vital));
            assert_eq!(history.trend(vital), Trend::Stable);
        }
    }

    proptest! {
        #[test]
        fn prop_equal_last_pair_is_stable(prefix in proptest::collection::vec(40.0f64..200.0, 0..20), v in 40.0f64..200.0) {
            let mut values = prefix;
            values.push(v);
            values.push(v);
            prop_assert_eq!(trend(&series(&values)), Trend::Stable);
        }
    }
}
