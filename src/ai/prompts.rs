//! Prompt text and response schemas for each AI call.

use serde::Serialize;
use serde_json::{json, Value};

use crate::care::DailyLogEntry;
use crate::patient::Patient;
use crate::vitals::{ReadingStore, VitalsHistory};

pub struct Prompt {
    pub text: String,
    pub schema: Value,
}

/// Compact series sent to the model: heart rate rounded, blood pressure as
/// "s/d", temperature and SpO2 with one decimal.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimplifiedVitals {
    pub heart_rate: Vec<i64>,
    pub blood_pressure: Vec<String>,
    pub temperature: Vec<String>,
    pub oxygen_saturation: Vec<String>,
}

impl SimplifiedVitals {
    /// Keep only the last `window` readings of each series
    pub fn from_history(history: &VitalsHistory, window: usize) -> Self {
        fn one_decimal(store: &ReadingStore<f64>, window: usize) -> Vec<String> {
            store
                .slice(window)
                .iter()
                .map(|r| format!("{:.1}", r.value))
                .collect()
        }
        Self {
            heart_rate: history
                .heart_rate
                .slice(window)
                .iter()
                .map(|r| r.value.round() as i64)
                .collect(),
            blood_pressure: history
                .blood_pressure
                .slice(window)
                .iter()
                .map(|r| r.value.to_string())
                .collect(),
            temperature: one_decimal(&history.temperature, window),
            oxygen_saturation: one_decimal(&history.oxygen_saturation, window),
        }
    }

    fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

fn string_array(description: &str) -> Value {
    json!({"type": "ARRAY", "items": {"type": "STRING"}, "description": description})
}

fn patient_context(patient: &Patient) -> String {
    let summary = &patient.medical_summary;
    let mut context = format!("Patient: {}, age {}.", patient.name, patient.age);
    if !summary.conditions.is_empty() {
        context.push_str(&format!(" Known conditions: {}.", summary.conditions.join(", ")));
    }
    if !summary.allergies.is_empty() {
        context.push_str(&format!(" Allergies: {}.", summary.allergies.join(", ")));
    }
    if !patient.medical_history.trim().is_empty() {
        context.push_str(&format!(" Medical history: {}", patient.medical_history.trim()));
    }
    context
}

pub fn feature_ideas() -> Prompt {
    Prompt {
        text: "Generate 5 innovative feature ideas for a patient vitals management app, \
               focusing on elderly care. Provide a list of features with a brief description for each."
            .to_string(),
        schema: json!({
            "type": "ARRAY",
            "items": {
                "type": "OBJECT",
                "properties": {
                    "name": {"type": "STRING", "description": "The name of the feature idea."},
                    "description": {"type": "STRING", "description": "A brief description of the feature."}
                },
                "required": ["name", "description"]
            }
        }),
    }
}

pub fn health_insights(vitals: &SimplifiedVitals) -> Prompt {
    Prompt {
        text: format!(
            "Analyze the following vital signs history for an elderly patient.\n\
             Data: {}\n\
             Identify any potential trends, patterns, or anomalies.\n\
             Provide a concise summary of the patient's overall status and a list of 2-3 actionable recommendations.\n\
             Frame the response as a helpful, non-diagnostic insight for a caregiver. Do not provide medical advice.",
            vitals.to_json()
        ),
        schema: json!({
            "type": "OBJECT",
            "properties": {
                "summary": {"type": "STRING", "description": "A brief summary of the patient's vital signs."},
                "recommendations": string_array("A list of actionable recommendations for the caregiver.")
            },
            "required": ["summary", "recommendations"]
        }),
    }
}

pub fn vitals_extraction(transcript: &str) -> Prompt {
    Prompt {
        text: format!(
            "Extract vital signs from the following text. The text is a voice transcription.\n\
             Text: \"{}\"\n\
             Identify values for heart rate (in bpm), blood pressure (systolic and diastolic, in mmHg), \
             temperature (in Celsius), and oxygen saturation (as a percentage).\n\
             For blood pressure, \"120 over 80\" means systolic is 120 and diastolic is 80.\n\
             Return only the numeric values. If a value is not mentioned, do not include it in the response.",
            transcript.replace('"', "'")
        ),
        schema: json!({
            "type": "OBJECT",
            "properties": {
                "heartRate": {"type": "NUMBER", "description": "Heart rate in beats per minute."},
                "systolic": {"type": "NUMBER", "description": "Systolic blood pressure in mmHg."},
                "diastolic": {"type": "NUMBER", "description": "Diastolic blood pressure in mmHg."},
                "temperature": {"type": "NUMBER", "description": "Body temperature in Celsius."},
                "oxygenSaturation": {"type": "NUMBER", "description": "Blood oxygen saturation percentage."}
            }
        }),
    }
}

pub fn consultation_summary(patient: &Patient, vitals: &SimplifiedVitals) -> Prompt {
    Prompt {
        text: format!(
            "{}\nRecent vital signs: {}\n\
             Prepare a caregiver's briefing for an upcoming video consultation with the patient's doctor.\n\
             List the key observations from the vitals and 3-5 questions the caregiver should ask.\n\
             Do not provide a diagnosis.",
            patient_context(patient),
            vitals.to_json()
        ),
        schema: json!({
            "type": "OBJECT",
            "properties": {
                "keyObservations": string_array("Notable observations from the recent vitals."),
                "suggestedQuestions": string_array("Questions the caregiver should ask the doctor.")
            },
            "required": ["keyObservations", "suggestedQuestions"]
        }),
    }
}

pub fn medical_summary(history: &str) -> Prompt {
    Prompt {
        text: format!(
            "Summarize the following medical history into a list of chronic conditions and a list of allergies.\n\
             History: \"{}\"\n\
             Use short clinical names. Return empty lists when nothing is mentioned.",
            history.replace('"', "'")
        ),
        schema: json!({
            "type": "OBJECT",
            "properties": {
                "conditions": string_array("Chronic or ongoing conditions."),
                "allergies": string_array("Known allergies.")
            },
            "required": ["conditions", "allergies"]
        }),
    }
}

pub fn smart_alerts(patient: &Patient, vitals: &SimplifiedVitals) -> Prompt {
    Prompt {
        text: format!(
            "{}\nRecent vital signs: {}\n\
             Look for subtle patterns a caregiver might miss, such as gradual drifts, \
             readings that conflict with the known conditions, or unusual combinations.\n\
             Return a list of alerts. Use severity \"Warning\" for findings that deserve prompt attention \
             and \"Observation\" otherwise. Return an empty list if nothing stands out.",
            patient_context(patient),
            vitals.to_json()
        ),
        schema: json!({
            "type": "ARRAY",
            "items": {
                "type": "OBJECT",
                "properties": {
                    "severity": {"type": "STRING", "enum": ["Observation", "Warning"]},
                    "finding": {"type": "STRING", "description": "One-sentence finding."},
                    "context": {"type": "STRING", "description": "Why the finding matters for this patient."}
                },
                "required": ["severity", "finding", "context"]
            }
        }),
    }
}

pub fn dietary_insights(entries: &[DailyLogEntry], vitals: &SimplifiedVitals) -> Prompt {
    let log: Vec<Value> = entries
        .iter()
        .map(|e| {
            json!({
                "type": e.kind.to_string(),
                "description": e.description,
                "time": e.timestamp.to_rfc3339(),
            })
        })
        .collect();
    Prompt {
        text: format!(
            "Here is today's meal and activity log for an elderly patient: {}\n\
             And their recent vital signs: {}\n\
             Point out 2-3 possible correlations between the log and the vitals that a caregiver could watch for. \
             Keep each insight to one sentence and do not provide medical advice.",
            Value::Array(log),
            vitals.to_json()
        ),
        schema: string_array("Correlation insights between the daily log and the vitals."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::NewVitalData;
    use crate::patient::MedicalSummary;
    use chrono::{Duration, TimeZone, Utc};

    fn history(count: usize) -> VitalsHistory {
        let start = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let mut history = VitalsHistory::new();
        for i in 0..count {
            history.record(
                start + Duration::hours(i as i64),
                &NewVitalData {
                    heart_rate: 70.6,
                    systolic: 120.0,
                    diastolic: 80.0,
                    temperature: 36.84,
                    oxygen_saturation: 97.26,
                },
            );
        }
        history
    }

    #[test]
    fn test_simplified_vitals_formatting() {
        let simple = SimplifiedVitals::from_history(&history(2), 24);
        assert_eq!(simple.heart_rate, vec![71, 71]);
        assert_eq!(simple.blood_pressure[0], "120/80");
        assert_eq!(simple.temperature[0], "36.8");
        assert_eq!(simple.oxygen_saturation[0], "97.3");
    }

    #[test]
    fn test_simplified_vitals_window() {
        let simple = SimplifiedVitals::from_history(&history(30), 24);
        assert_eq!(simple.heart_rate.len(), 24);
        assert_eq!(simple.blood_pressure.len(), 24);
    }

    #[test]
    fn test_health_prompt_embeds_payload() {
        let prompt = health_insights(&SimplifiedVitals::from_history(&history(1), 24));
        assert!(prompt.text.contains(r#""bloodPressure":["120/80"]"#));
        assert_eq!(prompt.schema["required"][0], "summary");
    }

    #[test]
    fn test_patient_context_lists_conditions() {
        let mut patient = Patient::new("Test Patient", 80);
        patient.medical_summary = MedicalSummary {
            conditions: vec!["Hypertension".into()],
            allergies: vec![],
        };
        let context = patient_context(&patient);
        assert!(context.contains("Hypertension"));
        assert!(!context.contains("Allergies"));
    }
}
