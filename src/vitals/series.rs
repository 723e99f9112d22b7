//! Chart-ready rows for one vital type.

use serde::Serialize;

use super::store::VitalsHistory;
use super::types::{BloodPressure, Reading, VitalType};

/// One chart row per reading; timestamps are epoch milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ChartRow {
    Scalar {
        timestamp: i64,
        value: f64,
    },
    BloodPressure {
        timestamp: i64,
        systolic: f64,
        diastolic: f64,
    },
}

impl ChartRow {
    pub fn timestamp_ms(&self) -> i64 {
        match self {
            Self::Scalar { timestamp, .. } | Self::BloodPressure { timestamp, .. } => *timestamp,
        }
    }

    /// Every plotted value of the row (two for blood pressure)
    pub fn values(&self) -> impl Iterator<Item = f64> {
        let pair = match *self {
            Self::Scalar { value, .. } => [Some(value), None],
            Self::BloodPressure {
                systolic, diastolic, ..
            } => [Some(systolic), Some(diastolic)],
        };
        pair.into_iter().flatten()
    }
}

fn scalar_rows(readings: &[Reading<f64>]) -> Vec<ChartRow> {
    readings
        .iter()
        .map(|r| ChartRow::Scalar {
            timestamp: r.timestamp.timestamp_millis(),
            value: r.value,
        })
        .collect()
}

fn blood_pressure_rows(readings: &[Reading<BloodPressure>]) -> Vec<ChartRow> {
    readings
        .iter()
        .map(|r| ChartRow::BloodPressure {
            timestamp: r.timestamp.timestamp_millis(),
            systolic: r.value.systolic,
            diastolic: r.value.diastolic,
        })
        .collect()
}

/// Reshape a vital type's readings into chart rows, preserving order 1:1
pub fn rows(history: &VitalsHistory, vital: VitalType) -> Vec<ChartRow> {
    match vital {
        VitalType::HeartRate => scalar_rows(history.heart_rate.readings()),
        VitalType::BloodPressure => blood_pressure_rows(history.blood_pressure.readings()),
        VitalType::Temperature => scalar_rows(history.temperature.readings()),
        VitalType::OxygenSaturation => scalar_rows(history.oxygen_saturation.readings()),
    }
}
