use serde::{Deserialize, Serialize};

use crate::vitals::VitalsHistory;

pub const DEFAULT_PATIENT_NAME: &str = "Manish Sharma";
pub const DEFAULT_PATIENT_AGE: u32 = 82;

/// Condensed medical history
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MedicalSummary {
    pub conditions: Vec<String>,
    pub allergies: Vec<String>,
}

/// The monitored patient and their session vitals
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub name: String,
    pub age: u32,
    pub vitals: VitalsHistory,
    pub medical_history: String,
    pub medical_summary: MedicalSummary,
}

impl Patient {
    pub fn new(name: impl Into<String>, age: u32) -> Self {
        Self {
            name: name.into(),
            age,
            vitals: VitalsHistory::new(),
            medical_history: String::new(),
            medical_summary: MedicalSummary::default(),
        }
    }
}

impl Default for Patient {
    fn default() -> Self {
        Self::new(DEFAULT_PATIENT_NAME, DEFAULT_PATIENT_AGE)
    }
}
