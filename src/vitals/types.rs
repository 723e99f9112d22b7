use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The four monitored vital signs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VitalType {
    HeartRate,
    BloodPressure,
    Temperature,
    OxygenSaturation,
}

impl VitalType {
    pub const ALL: [VitalType; 4] = [
        VitalType::HeartRate,
        VitalType::BloodPressure,
        VitalType::Temperature,
        VitalType::OxygenSaturation,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::HeartRate => "Heart Rate",
            Self::BloodPressure => "Blood Pressure",
            Self::Temperature => "Temperature",
            Self::OxygenSaturation => "Oxygen Saturation",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            Self::HeartRate => "bpm",
            Self::BloodPressure => "mmHg",
            Self::Temperature => "°C",
            Self::OxygenSaturation => "%",
        }
    }

    pub fn normal_range(&self) -> NormalRange {
        match self {
            Self::HeartRate => NormalRange::HEART_RATE,
            Self::BloodPressure => NormalRange::SYSTOLIC,
            Self::Temperature => NormalRange::TEMPERATURE,
            Self::OxygenSaturation => NormalRange::OXYGEN_SATURATION,
        }
    }
}

impl fmt::Display for VitalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for VitalType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace(['_', ' '], "-").as_str() {
            "heart-rate" | "hr" | "pulse" => Ok(Self::HeartRate),
            "blood-pressure" | "bp" => Ok(Self::BloodPressure),
            "temperature" | "temp" => Ok(Self::Temperature),
            "oxygen-saturation" | "spo2" | "o2" => Ok(Self::OxygenSaturation),
            _ => Err(format!("Unknown vital type: {}", s)),
        }
    }
}

/// Systolic/diastolic pair in mmHg
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BloodPressure {
    pub systolic: f64,
    pub diastolic: f64,
}

impl BloodPressure {
    pub fn new(systolic: f64, diastolic: f64) -> Self {
        Self { systolic, diastolic }
    }
}

impl fmt::Display for BloodPressure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.systolic, self.diastolic)
    }
}

/// A single timestamped observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading<V> {
    pub timestamp: DateTime<Utc>,
    pub value: V,
}

impl<V> Reading<V> {
    pub fn new(timestamp: DateTime<Utc>, value: V) -> Self {
        Self { timestamp, value }
    }
}

/// Value whose first component drives trend comparison
pub trait PrimaryValue {
    fn primary(&self) -> f64;
}

impl PrimaryValue for f64 {
    fn primary(&self) -> f64 {
        *self
    }
}

impl PrimaryValue for BloodPressure {
    fn primary(&self) -> f64 {
        self.systolic
    }
}

/// A value of any vital type, used where the type is only known at runtime
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Measurement {
    BloodPressure(BloodPressure),
    Scalar(f64),
}

impl From<f64> for Measurement {
    fn from(value: f64) -> Self {
        Self::Scalar(value)
    }
}

impl From<BloodPressure> for Measurement {
    fn from(value: BloodPressure) -> Self {
        Self::BloodPressure(value)
    }
}

/// Inclusive normal range; `max` is infinite for lower-bound-only vitals
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalRange {
    pub min: f64,
    pub max: f64,
}

impl NormalRange {
    pub const HEART_RATE: NormalRange = NormalRange { min: 60.0, max: 100.0 };
    pub const SYSTOLIC: NormalRange = NormalRange { min: 90.0, max: 140.0 };
    pub const DIASTOLIC: NormalRange = NormalRange { min: 60.0, max: 90.0 };
    pub const TEMPERATURE: NormalRange = NormalRange { min: 36.1, max: 37.2 };
    pub const OXYGEN_SATURATION: NormalRange = NormalRange {
        min: 95.0,
        max: f64::INFINITY,
    };

    /// True when `value` lies outside the range
    pub fn is_breached(&self, value: f64) -> bool {
        value < self.min || value > self.max
    }
}
