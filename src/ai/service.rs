use chrono::Utc;
use serde_json::Value;
use tracing::{info, warn};

use super::prompts::{self, Prompt, SimplifiedVitals};
use super::types::{
    decode, decode_insight_list, AlertFinding, ConsultationSummary, FeatureIdea, HealthInsight,
    PartialVitals, SmartAlert,
};
use super::{AiError, AiTask, GenerativeModel};
use crate::care::DailyLogEntry;
use crate::patient::{MedicalSummary, Patient};
use crate::vitals::VitalsHistory;

/// Readings per series sent with each vitals payload
pub const DEFAULT_WINDOW: usize = 24;

/// Typed AI calls over a [`GenerativeModel`]. One request per call; failures
/// are returned to the caller, who decides whether to ask again.
pub struct InsightService<M> {
    model: M,
    window: usize,
}

impl<M: GenerativeModel> InsightService<M> {
    pub fn new(model: M) -> Self {
        Self {
            model,
            window: DEFAULT_WINDOW,
        }
    }

    pub fn with_window(mut self, window: usize) -> Self {
        self.window = window.max(1);
        self
    }

    pub fn window(&self) -> usize {
        self.window
    }

    async fn request(&self, task: AiTask, prompt: Prompt) -> Result<Value, AiError> {
        info!("Requesting {}", task);
        self.model
            .generate_json(&prompt.text, &prompt.schema)
            .await
            .inspect_err(|e| warn!("{} request failed: {}", task, e))
    }

    pub async fn feature_ideas(&self) -> Result<Vec<FeatureIdea>, AiError> {
        let value = self.request(AiTask::FeatureIdeas, prompts::feature_ideas()).await?;
        decode(value)
    }

    pub async fn health_insights(&self, vitals: &VitalsHistory) -> Result<HealthInsight, AiError> {
        let payload = SimplifiedVitals::from_history(vitals, self.window);
        let value = self
            .request(AiTask::HealthInsights, prompts::health_insights(&payload))
            .await?;
        decode(value)
    }

    pub async fn parse_vitals_from_text(&self, text: &str) -> Result<PartialVitals, AiError> {
        let value = self
            .request(AiTask::VitalsExtraction, prompts::vitals_extraction(text))
            .await?;
        PartialVitals::from_json(&value)
    }

    pub async fn consultation_summary(&self, patient: &Patient) -> Result<ConsultationSummary, AiError> {
        let payload = SimplifiedVitals::from_history(&patient.vitals, self.window);
        let value = self
            .request(
                AiTask::ConsultationSummary,
                prompts::consultation_summary(patient, &payload),
            )
            .await?;
        decode(value)
    }

    pub async fn medical_summary(&self, history: &str) -> Result<MedicalSummary, AiError> {
        if history.trim().is_empty() {
            return Ok(MedicalSummary::default());
        }
        let value = self
            .request(AiTask::MedicalSummary, prompts::medical_summary(history))
            .await?;
        decode(value)
    }

    /// Alerts are stamped with a fresh id and the current time once the
    /// reply has been validated
    pub async fn smart_alerts(&self, patient: &Patient) -> Result<Vec<SmartAlert>, AiError> {
        let payload = SimplifiedVitals::from_history(&patient.vitals, self.window);
        let value = self
            .request(AiTask::SmartAlerts, prompts::smart_alerts(patient, &payload))
            .await?;
        let findings: Vec<AlertFinding> = decode(value)?;
        let now = Utc::now();
        Ok(findings
            .into_iter()
            .map(|f| SmartAlert::stamp(f, now))
            .collect())
    }

    pub async fn dietary_insights(
        &self,
        entries: &[DailyLogEntry],
        vitals: &VitalsHistory,
    ) -> Result<Vec<String>, AiError> {
        let payload = SimplifiedVitals::from_history(vitals, self.window);
        let value = self
            .request(
                AiTask::DietaryInsights,
                prompts::dietary_insights(entries, &payload),
            )
            .await?;
        decode_insight_list(value)
    }
}


#[cfg(test)]
mod tests {
    use super::fake::FakeModel;
    use super::*;
    use crate::capture::NewVitalData;
    use chrono::{Duration, TimeZone};
    use serde_json::json;

    fn history(count: usize) -> VitalsHistory {
        let start = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let mut history = VitalsHistory::new();
        for i in 0..count {
            history.record(
                start + Duration::hours(i as i64),
                &NewVitalData {
                    heart_rate: 60.0 + i as f64,
                    systolic: 120.0,
                    diastolic: 80.0,
                    temperature: 36.8,
                    oxygen_saturation: 97.0,
                },
            );
        }
        history
    }

    #[tokio::test]
    async fn test_feature_ideas() {
        let service = InsightService::new(FakeModel::replying(json!([
            {"name": "Hydration tracker", "description": "Reminds the patient to drink water."}
        ])));
        let ideas = service.feature_ideas().await.unwrap();
        assert_eq!(ideas[0].name, "Hydration tracker");
    }

    #[tokio::test]
    async fn test_health_insights_bounded_payload() {
        let service = InsightService::new(FakeModel::replying(json!({
            "summary": "Stable overall.",
            "recommendations": ["Keep monitoring"]
        })))
        .with_window(3);
        let insight = service.health_insights(&history(10)).await.unwrap();
        assert_eq!(insight.recommendations.len(), 1);

        let prompt = service.model.last_prompt();
        assert!(prompt.contains(r#""heartRate":[67,68,69]"#));
    }

    #[tokio::test]
    async fn test_health_insights_rejects_wrong_shape() {
        let service = InsightService::new(FakeModel::replying(json!({"summary": "ok"})));
        let err = service.health_insights(&history(2)).await.unwrap_err();
        assert!(matches!(err, AiError::InvalidResponse(_)));
        assert_eq!(
            err.user_message_for(AiTask::HealthInsights),
            "Failed to communicate with the AI model for health insights."
        );
    }

    #[tokio::test]
    async fn test_missing_key_propagates() {
        let service = InsightService::new(FakeModel::failing(AiError::MissingApiKey));
        let err = service.parse_vitals_from_text("pulse 70").await.unwrap_err();
        assert!(matches!(err, AiError::MissingApiKey));
    }

    #[tokio::test]
    async fn test_parse_vitals_from_text() {
        let service = InsightService::new(FakeModel::replying(json!({
            "heartRate": 72, "systolic": 120, "diastolic": 80
        })));
        let partial = service
            .parse_vitals_from_text("pulse 72, pressure 120 over 80")
            .await
            .unwrap();
        assert_eq!(partial.diastolic, Some(80.0));
        assert_eq!(partial.oxygen_saturation, None);
        assert!(service.model.last_prompt().contains("pulse 72, pressure 120 over 80"));
    }

    #[tokio::test]
    async fn test_smart_alerts_are_stamped() {
        let service = InsightService::new(FakeModel::replying(json!([
            {"severity": "Warning", "finding": "Evening BP rising", "context": "History of hypertension"},
            {"severity": "Observation", "finding": "Stable SpO2", "context": "No action"}
        ])));
        let alerts = service.smart_alerts(&Patient::default()).await.unwrap();
        assert_eq!(alerts.len(), 2);
        assert_ne!(alerts[0].id, alerts[1].id);
        assert_eq!(alerts[0].severity, super::super::AlertSeverity::Warning);
    }

    #[tokio::test]
    async fn test_consultation_summary_includes_patient() {
        let service = InsightService::new(FakeModel::replying(json!({
            "keyObservations": ["Heart rate trending up"],
            "suggestedQuestions": ["Is this expected?"]
        })));
        let summary = service.consultation_summary(&Patient::default()).await.unwrap();
        assert_eq!(summary.suggested_questions, vec!["Is this expected?"]);
        assert!(service.model.last_prompt().contains("Manish Sharma"));
    }

    #[tokio::test]
    async fn test_medical_summary_blank_history_skips_request() {
        let service = InsightService::new(FakeModel::failing(AiError::MissingApiKey));
        let summary = service.medical_summary("  ").await.unwrap();
        assert_eq!(summary, MedicalSummary::default());
        assert!(service.model.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_medical_summary() {
        let service = InsightService::new(FakeModel::replying(json!({
            "conditions": ["Type 2 diabetes"],
            "allergies": ["Penicillin"]
        })));
        let summary = service
            .medical_summary("Diabetic since 2010, allergic to penicillin.")
            .await
            .unwrap();
        assert_eq!(summary.allergies, vec!["Penicillin"]);
    }

    #[tokio::test]
    async fn test_dietary_insights() {
        let mut log = crate::care::DailyLog::new();
        log.add(crate::care::LogKind::Meal, "Salty soup", Utc::now()).unwrap();
        let service = InsightService::new(FakeModel::replying(json!([
            "Blood pressure rose after the salty meal."
        ])));
        let insights = service
            .dietary_insights(log.entries(), &history(4))
            .await
            .unwrap();
        assert_eq!(insights.len(), 1);
        assert!(service.model.last_prompt().contains("Salty soup"));
    }
}
