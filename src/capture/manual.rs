use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{CaptureAdapter, CaptureError, CaptureSource, NewVitalData};
use crate::ai::PartialVitals;

/// Raw text of the five vitals form fields
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VitalsForm {
    pub heart_rate: String,
    pub systolic: String,
    pub diastolic: String,
    pub temperature: String,
    pub oxygen_saturation: String,
}

impl VitalsForm {
    /// Pre-fill from an AI extraction; missing values stay blank
    pub fn from_partial(partial: &PartialVitals) -> Self {
        fn text(value: Option<f64>) -> String {
            value.map(|v| v.to_string()).unwrap_or_default()
        }
        Self {
            heart_rate: text(partial.heart_rate),
            systolic: text(partial.systolic),
            diastolic: text(partial.diastolic),
            temperature: text(partial.temperature),
            oxygen_saturation: text(partial.oxygen_saturation),
        }
    }

    fn fields(&self) -> [&str; 5] {
        [
            &self.heart_rate,
            &self.systolic,
            &self.diastolic,
            &self.temperature,
            &self.oxygen_saturation,
        ]
    }

    /// Validate and convert. Blank fields block submission before numbers are checked.
    pub fn submit(&self) -> Result<NewVitalData, CaptureError> {
        if self.fields().iter().any(|f| f.trim().is_empty()) {
            return Err(CaptureError::MissingFields);
        }
        let [heart_rate, systolic, diastolic, temperature, oxygen_saturation] =
            self.fields().map(parse_number);
        NewVitalData {
            heart_rate: heart_rate?,
            systolic: systolic?,
            diastolic: diastolic?,
            temperature: temperature?,
            oxygen_saturation: oxygen_saturation?,
        }
        .validate()
    }
}

fn parse_number(field: &str) -> Result<f64, CaptureError> {
    field.trim().parse::<f64>().map_err(|e| {
        debug!("Rejected form value {:?}: {}", field, e);
        CaptureError::InvalidNumber
    })
}

/// Manual entry adapter wrapping a filled-in form
pub struct ManualEntry {
    form: VitalsForm,
}

impl ManualEntry {
    pub fn new(form: VitalsForm) -> Self {
        Self { form }
    }
}

#[async_trait]
impl CaptureAdapter for ManualEntry {
    fn source(&self) -> CaptureSource {
        CaptureSource::Manual
    }

    async fn capture(&mut self) -> Result<NewVitalData, CaptureError> {
        self.form.submit()
    }
}
