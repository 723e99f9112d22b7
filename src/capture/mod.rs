//! Capture adapters.
//!
//! Every entry path (manual form, voice transcript, NFC tag, mock feed)
//! produces the same normalized [`NewVitalData`] record before anything is
//! appended to the vitals history.

pub mod manual;
pub mod mock;
pub mod nfc;
pub mod voice;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::ai::{AiError, AiTask};

pub use manual::{ManualEntry, VitalsForm};
pub use mock::{generate_patient, MockCapture};
pub use nfc::{
    AbortHandle, NdefMessage, NdefRecord, NfcCapture, NfcEvent, NfcReader, NfcStatus,
    ScriptedReader,
};
pub use voice::{
    RecognitionResult, SpeechEvent, SpeechSource, TranscriptAccumulator, TranscriptLines,
    VoiceCapture, VoiceEntry, VoiceStatus,
};

/// Errors surfaced next to the control that triggered the capture
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("All fields are required.")]
    MissingFields,

    #[error("Please enter valid numbers for all fields.")]
    InvalidNumber,

    #[error("NFC is not supported on this device.")]
    NfcUnsupported,

    #[error("No text record found on NFC tag.")]
    NoTextRecord,

    #[error("NFC data is missing required fields or has incorrect types.")]
    InvalidNfcPayload,

    #[error("Cannot read data from the NFC tag. Try again.")]
    NfcReadFailed,

    #[error("Scan cancelled")]
    Aborted,

    #[error("Speech recognition error: {0}")]
    SpeechRecognition(String),

    #[error("Voice recognition is not supported on this device.")]
    SpeechUnsupported,

    #[error("No speech detected. Please try again.")]
    NoSpeechDetected,

    #[error("Capture is not ready: {0}")]
    InvalidState(&'static str),

    #[error("{}", .0.user_message_for(AiTask::VitalsExtraction))]
    Ai(#[from] AiError),
}

/// The single record every capture path must produce
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewVitalData {
    pub heart_rate: f64,
    pub systolic: f64,
    pub diastolic: f64,
    pub temperature: f64,
    pub oxygen_saturation: f64,
}

impl NewVitalData {
    fn fields(&self) -> [f64; 5] {
        [
            self.heart_rate,
            self.systolic,
            self.diastolic,
            self.temperature,
            self.oxygen_saturation,
        ]
    }

    /// Reject NaN or infinite fields
    pub fn validate(self) -> Result<Self, CaptureError> {
        if self.fields().iter().all(|v| v.is_finite()) {
            Ok(self)
        } else {
            Err(CaptureError::InvalidNumber)
        }
    }
}

/// Where a reading came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureSource {
    Manual,
    Voice,
    Nfc,
    Mock,
}

impl fmt::Display for CaptureSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Manual => "manual entry",
            Self::Voice => "voice entry",
            Self::Nfc => "NFC scan",
            Self::Mock => "mock feed",
        })
    }
}

/// A source of normalized vitals readings
#[async_trait]
pub trait CaptureAdapter: Send {
    fn source(&self) -> CaptureSource;

    async fn capture(&mut self) -> Result<NewVitalData, CaptureError>;
}
