//! Synthetic vitals for demos and tests.
//!
//! All randomness comes from a caller-supplied RNG so a seeded generator
//! reproduces the same patient.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use super::{CaptureAdapter, CaptureError, CaptureSource, NewVitalData};
use crate::chart::TimeRange;
use crate::patient::Patient;
use crate::vitals::{BloodPressure, Reading, ReadingStore};

/// One plausible reading for sample `i` of a series
fn sample_vitals(i: usize, rng: &mut impl Rng) -> NewVitalData {
    let x = i as f64;
    NewVitalData {
        heart_rate: (65.0 + rng.gen::<f64>() * 10.0 - 5.0 + (x / 4.0).sin() * 3.0).round(),
        systolic: (125.0 + rng.gen::<f64>() * 15.0 - 7.0 + (x / 5.0).sin() * 5.0).round(),
        diastolic: (80.0 + rng.gen::<f64>() * 10.0 - 5.0 + (x / 6.0).sin() * 4.0).round(),
        temperature: 36.5 + rng.gen::<f64>() * 0.8 - 0.4 + (x / 8.0).sin() * 0.2,
        oxygen_saturation: 96.0 + rng.gen::<f64>() * 3.0 - 1.5 - (x / 3.0).sin() * 0.5,
    }
}

/// Default patient with a synthetic history covering `range`, ending at `now`
pub fn generate_patient(range: TimeRange, now: DateTime<Utc>, rng: &mut impl Rng) -> Patient {
    let (count, step) = range.sampling();
    let mut patient = Patient::default();

    let mut heart_rate = Vec::with_capacity(count);
    let mut blood_pressure = Vec::with_capacity(count);
    let mut temperature = Vec::with_capacity(count);
    let mut oxygen_saturation = Vec::with_capacity(count);
    for i in 0..count {
        let at = now - step * (count - 1 - i) as i32;
        let v = sample_vitals(i, rng);
        heart_rate.push(Reading::new(at, v.heart_rate));
        blood_pressure.push(Reading::new(at, BloodPressure::new(v.systolic, v.diastolic)));
        temperature.push(Reading::new(at, v.temperature));
        oxygen_saturation.push(Reading::new(at, v.oxygen_saturation));
    }

    patient.vitals.heart_rate = ReadingStore::from_readings(heart_rate);
    patient.vitals.blood_pressure = ReadingStore::from_readings(blood_pressure);
    patient.vitals.temperature = ReadingStore::from_readings(temperature);
    patient.vitals.oxygen_saturation = ReadingStore::from_readings(oxygen_saturation);
    debug!("Generated {} mock readings per vital for {}", count, range);
    patient
}

/// Capture adapter producing a fresh synthetic reading on every call
pub struct MockCapture {
    rng: StdRng,
    sample: usize,
}

impl MockCapture {
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            sample: 0,
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
            sample: 0,
        }
    }
}

#[async_trait]
impl CaptureAdapter for MockCapture {
    fn source(&self) -> CaptureSource {
        CaptureSource::Mock
    }

    async fn capture(&mut self) -> Result<NewVitalData, CaptureError> {
        let reading = sample_vitals(self.sample, &mut self.rng);
        self.sample += 1;
        reading.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use crate::vitals::VitalType;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_generate_counts_per_range() {
        let mut rng = StdRng::seed_from_u64(7);
        for (range, count) in [(TimeRange::Day, 24), (TimeRange::Week, 7), (TimeRange::Month, 30)] {
            let patient = generate_patient(range, now(), &mut rng);
            for vital in VitalType::ALL {
                assert_eq!(patient.vitals.len_of(vital), count);
            }
        }
    }

    #[test]
    fn test_generate_ends_at_now_hourly() {
        let mut rng = StdRng::seed_from_u64(1);
        let patient = generate_patient(TimeRange::Day, now(), &mut rng);
        let readings = patient.vitals.heart_rate.readings();
        assert_eq!(readings.last().unwrap().timestamp, now());
        assert_eq!(readings[0].timestamp, now() - chrono::Duration::hours(23));
    }

    #[test]
    fn test_generate_values_plausible() {
        let mut rng = StdRng::seed_from_u64(42);
        let patient = generate_patient(TimeRange::Month, now(), &mut rng);
        for r in patient.vitals.heart_rate.readings() {
            assert!((57.0..=73.0).contains(&r.value));
            assert_eq!(r.value, r.value.round());
        }
        for r in patient.vitals.temperature.readings() {
            assert!((35.9..=37.1).contains(&r.value));
        }
        for r in patient.vitals.oxygen_saturation.readings() {
            assert!((94.0..=98.0).contains(&r.value));
        }
    }

    #[test]
    fn test_seeded_generation_is_reproducible() {
        let a = generate_patient(TimeRange::Week, now(), &mut StdRng::seed_from_u64(9));
        let b = generate_patient(TimeRange::Week, now(), &mut StdRng::seed_from_u64(9));
        assert_eq!(a.vitals, b.vitals);
    }

    #[tokio::test]
    async fn test_mock_capture() {
        let mut capture = MockCapture::seeded(3);
        assert_eq!(capture.source(), CaptureSource::Mock);
        let first = capture.capture().await.unwrap();
        assert!(first.systolic >= 118.0 && first.systolic <= 133.0);
    }
}
