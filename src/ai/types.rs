//! Typed AI responses and their validation.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

use super::AiError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureIdea {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthInsight {
    pub summary: String,
    pub recommendations: Vec<String>,
}

/// Vitals extracted from free text; anything not mentioned stays `None`
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialVitals {
    pub heart_rate: Option<f64>,
    pub systolic: Option<f64>,
    pub diastolic: Option<f64>,
    pub temperature: Option<f64>,
    pub oxygen_saturation: Option<f64>,
}

impl PartialVitals {
    /// Read whatever numeric fields the object carries; non-numeric values
    /// are treated as not mentioned.
    pub fn from_json(value: &Value) -> Result<Self, AiError> {
        let object = value
            .as_object()
            .ok_or_else(|| AiError::InvalidResponse("expected a JSON object".into()))?;
        let number = |name: &str| {
            object
                .get(name)
                .and_then(Value::as_f64)
                .filter(|v| v.is_finite())
        };
        Ok(Self {
            heart_rate: number("heartRate"),
            systolic: number("systolic"),
            diastolic: number("diastolic"),
            temperature: number("temperature"),
            oxygen_saturation: number("oxygenSaturation"),
        })
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsultationSummary {
    pub key_observations: Vec<String>,
    pub suggested_questions: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertSeverity {
    Observation,
    Warning,
}

impl fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Observation => "Observation",
            Self::Warning => "Warning",
        })
    }
}

/// Alert as returned by the model, before it is stamped
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct AlertFinding {
    pub severity: AlertSeverity,
    pub finding: String,
    pub context: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SmartAlert {
    pub id: Uuid,
    pub severity: AlertSeverity,
    pub finding: String,
    pub context: String,
    pub timestamp: DateTime<Utc>,
}

impl SmartAlert {
    pub(crate) fn stamp(finding: AlertFinding, at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            severity: finding.severity,
            finding: finding.finding,
            context: finding.context,
            timestamp: at,
        }
    }
}

/// Deserialize a model reply into `T`, reporting shape mismatches
pub(crate) fn decode<T: DeserializeOwned>(value: Value) -> Result<T, AiError> {
    serde_json::from_value(value).map_err(|e| AiError::InvalidResponse(e.to_string()))
}

/// The dietary call's reply is either a bare array of strings or an object
/// wrapping one under `insights`.
pub(crate) fn decode_insight_list(value: Value) -> Result<Vec<String>, AiError> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Reply {
        List(Vec<String>),
        Wrapped { insights: Vec<String> },
    }
    match decode::<Reply>(value)? {
        Reply::List(items) | Reply::Wrapped { insights: items } => Ok(items),
    }
}
