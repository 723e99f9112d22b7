//! In-memory reading store.
//!
//! One ordered sequence per vital type. Sequences only grow during a session:
//! readings are appended (and re-sorted by timestamp), never edited or removed.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use super::types::{BloodPressure, Reading, VitalType};
use crate::capture::NewVitalData;

/// Timestamp-ordered readings for a single vital type
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ReadingStore<V> {
    readings: Vec<Reading<V>>,
}

impl<V> Default for ReadingStore<V> {
    fn default() -> Self {
        Self { readings: Vec::new() }
    }
}

impl<V> ReadingStore<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from arbitrary-order readings
    pub fn from_readings(readings: Vec<Reading<V>>) -> Self {
        let mut store = Self { readings };
        store.sort();
        store
    }

    /// Insert a reading, keeping the sequence non-decreasing by timestamp.
    /// Late arrivals land in timestamp order; ties keep insertion order.
    pub fn append(&mut self, reading: Reading<V>) {
        self.readings.push(reading);
        self.sort();
    }

    /// Most recent reading, or `None` when nothing has been recorded
    pub fn latest(&self) -> Option<&Reading<V>> {
        self.readings.last()
    }

    /// The last `window` readings (all of them if the store is shorter)
    pub fn slice(&self, window: usize) -> &[Reading<V>] {
        let start = self.readings.len().saturating_sub(window);
        &self.readings[start..]
    }

    pub fn readings(&self) -> &[Reading<V>] {
        &self.readings
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    fn sort(&mut self) {
        self.readings.sort_by_key(|r| r.timestamp);
    }
}

/// Complete vitals history for one patient
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VitalsHistory {
    pub heart_rate: ReadingStore<f64>,
    pub blood_pressure: ReadingStore<BloodPressure>,
    pub temperature: ReadingStore<f64>,
    pub oxygen_saturation: ReadingStore<f64>,
}

impl VitalsHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a normalized capture in all four sequences at the same instant
    pub fn record(&mut self, at: DateTime<Utc>, entry: &NewVitalData) {
        self.heart_rate.append(Reading::new(at, entry.heart_rate));
        self.blood_pressure.append(Reading::new(
            at,
            BloodPressure::new(entry.systolic, entry.diastolic),
        ));
        self.temperature.append(Reading::new(at, entry.temperature));
        self.oxygen_saturation
            .append(Reading::new(at, entry.oxygen_saturation));
        debug!("Recorded vitals at {}", at);
    }

    /// Length of the sequence for a vital type
    pub fn len_of(&self, vital: VitalType) -> usize {
        match vital {
            VitalType::HeartRate => self.heart_rate.len(),
            VitalType::BloodPressure => self.blood_pressure.len(),
            VitalType::Temperature => self.temperature.len(),
            VitalType::OxygenSaturation => self.oxygen_saturation.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use proptest::prelude::*;

    fn at(minutes: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap() + Duration::minutes(minutes)
    }

    #[test]
    fn test_append_out_of_order_is_sorted() {
        let mut store = ReadingStore::new();
        store.append(Reading::new(at(30), 72.0));
        store.append(Reading::new(at(10), 70.0));
        store.append(Reading::new(at(20), 71.0));

        let values: Vec<f64> = store.readings().iter().map(|r| r.value).collect();
        assert_eq!(values, vec![70.0, 71.0, 72.0]);
    }

    #[test]
    fn test_latest_empty_is_none() {
        let store: ReadingStore<f64> = ReadingStore::new();
        assert!(store.latest().is_none());
    }

    #[test]
    fn test_latest_after_late_arrival() {
        let mut store = ReadingStore::new();
        store.append(Reading::new(at(60), 80.0));
        store.append(Reading::new(at(0), 60.0));
        assert_eq!(store.latest().unwrap().value, 80.0);
    }

    #[test]
    fn test_slice_window() {
        let store = ReadingStore::from_readings((0..10).map(|i| Reading::new(at(i), i as f64)).collect());
        let window = store.slice(3);
        assert_eq!(window.len(), 3);
        assert_eq!(window[0].value, 7.0);
        assert_eq!(store.slice(50).len(), 10);
        assert!(store.slice(0).is_empty());
    }

    #[test]
    fn test_record_appends_to_every_sequence() {
        let mut history = VitalsHistory::new();
        history.heart_rate.append(Reading::new(at(0), 70.0));
        let entry = NewVitalData {
            heart_rate: 75.0,
            systolic: 120.0,
            diastolic: 80.0,
            temperature: 36.8,
            oxygen_saturation: 98.0,
        };
        history.record(at(5), &entry);

        assert_eq!(history.heart_rate.len(), 2);
        assert_eq!(history.blood_pressure.len(), 1);
        assert_eq!(history.temperature.len(), 1);
        assert_eq!(history.oxygen_saturation.len(), 1);
        assert_eq!(
            history.blood_pressure.latest().unwrap().value,
            BloodPressure::new(120.0, 80.0)
        );
    }

    proptest! {
        #[test]
        fn prop_append_keeps_timestamps_non_decreasing(offsets in proptest::collection::vec(-10_000i64..10_000, 0..200)) {
            let mut store = ReadingStore::new();
            for (i, offset) in offsets.iter().enumerate() {
                store.append(Reading::new(at(*offset), i as f64));
                let readings = store.readings();
                prop_assert!(readings.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
            }
            prop_assert_eq!(store.len(), offsets.len());
        }

        #[test]
        fn prop_slice_never_exceeds_window(len in 0usize..100, window in 0usize..150) {
            let store = ReadingStore::from_readings((0..len).map(|i| Reading::new(at(i as i64), i as f64)).collect());
            let slice = store.slice(window);
            prop_assert_eq!(slice.len(), window.min(len));
            if let (Some(last), Some(latest)) = (slice.last(), store.latest()) {
                prop_assert_eq!(last, latest);
            }
        }
    }
}
