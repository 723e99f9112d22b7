//! AI insight service.
//!
//! A hosted generative model (Gemini) answers structured prompts with JSON
//! matching a response schema. [`GenerativeModel`] is the seam between the
//! typed calls in [`InsightService`] and the HTTP client, so the service can
//! run against a fake model in tests.

pub mod client;
pub mod prompts;
pub mod service;
pub mod types;

use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use thiserror::Error;

pub use client::{extract_json, GeminiClient};
pub use service::{InsightService, DEFAULT_WINDOW};
pub use types::{
    AlertSeverity, ConsultationSummary, FeatureIdea, HealthInsight, PartialVitals, SmartAlert,
};

/// Errors from the AI service
#[derive(Debug, Error)]
pub enum AiError {
    #[error("Gemini API key not found. Set GEMINI_API_KEY or run `vitals config --api-key <KEY>`.")]
    MissingApiKey,

    #[error("Gemini API request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Gemini API error {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid response format from API: {0}")]
    InvalidResponse(String),
}

impl AiError {
    /// Message shown to the caregiver. A missing key is actionable and passes
    /// through; every other failure collapses to a generic message.
    pub fn user_message(&self) -> String {
        self.user_message_for(AiTask::FeatureIdeas)
    }

    pub fn user_message_for(&self, task: AiTask) -> String {
        match self {
            Self::MissingApiKey => self.to_string(),
            _ => task.failure_message().to_string(),
        }
    }
}

/// The typed calls the service makes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AiTask {
    FeatureIdeas,
    HealthInsights,
    VitalsExtraction,
    ConsultationSummary,
    MedicalSummary,
    SmartAlerts,
    DietaryInsights,
}

impl AiTask {
    pub fn failure_message(&self) -> &'static str {
        match self {
            Self::FeatureIdeas => "Failed to communicate with the AI model.",
            Self::HealthInsights => "Failed to communicate with the AI model for health insights.",
            Self::VitalsExtraction => "AI could not understand the provided text. Please try again.",
            Self::ConsultationSummary => "Failed to generate the consultation summary.",
            Self::MedicalSummary => "Failed to summarize the medical history.",
            Self::SmartAlerts => "Failed to generate smart alerts.",
            Self::DietaryInsights => "Failed to generate dietary and activity insights.",
        }
    }
}

impl fmt::Display for AiTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::FeatureIdeas => "feature ideas",
            Self::HealthInsights => "health insights",
            Self::VitalsExtraction => "vitals extraction",
            Self::ConsultationSummary => "consultation summary",
            Self::MedicalSummary => "medical summary",
            Self::SmartAlerts => "smart alerts",
            Self::DietaryInsights => "dietary insights",
        })
    }
}

/// A model that answers a prompt with JSON shaped by `schema`
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    async fn generate_json(&self, prompt: &str, schema: &Value) -> Result<Value, AiError>;
}
