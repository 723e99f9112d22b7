//! Voice capture: speech transcript, AI extraction, then a review form.
//!
//! The speech engine is host-provided ([`SpeechSource`]). Results arrive as
//! the engine's full result list plus the index of the first changed entry;
//! [`TranscriptAccumulator`] turns those into a finalized transcript and the
//! current interim text.

use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::manual::VitalsForm;
use super::{CaptureAdapter, CaptureError, CaptureSource, NewVitalData};
use crate::ai::{GenerativeModel, InsightService};

/// One entry of the recognizer's result list
#[derive(Debug, Clone, PartialEq)]
pub struct RecognitionResult {
    pub text: String,
    pub is_final: bool,
}

impl RecognitionResult {
    pub fn final_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_final: true,
        }
    }

    pub fn interim(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_final: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TranscriptAccumulator {
    finalized: String,
    interim: String,
}

impl TranscriptAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume results from `result_index` onward. Final chunks are appended
    /// with a trailing space; the interim text is replaced.
    pub fn on_result(&mut self, results: &[RecognitionResult], result_index: usize) {
        let mut finished = String::new();
        let mut interim = String::new();
        for result in results.iter().skip(result_index) {
            if result.is_final {
                finished.push_str(&result.text);
            } else {
                interim.push_str(&result.text);
            }
        }
        self.interim = interim;
        if !finished.is_empty() {
            self.finalized.push_str(&finished);
            self.finalized.push(' ');
        }
    }

    pub fn finalized(&self) -> &str {
        &self.finalized
    }

    pub fn interim(&self) -> &str {
        &self.interim
    }

    pub fn reset(&mut self) {
        self.finalized.clear();
        self.interim.clear();
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum VoiceStatus {
    Idle,
    Listening,
    Processing,
    Review(VitalsForm),
    Error(String),
}

/// Voice entry session state machine:
/// Idle -> Listening -> Processing -> Review | Error
#[derive(Debug, Clone)]
pub struct VoiceEntry {
    status: VoiceStatus,
    transcript: TranscriptAccumulator,
}

impl Default for VoiceEntry {
    fn default() -> Self {
        Self::new()
    }
}

impl VoiceEntry {
    pub fn new() -> Self {
        Self {
            status: VoiceStatus::Idle,
            transcript: TranscriptAccumulator::new(),
        }
    }

    pub fn status(&self) -> &VoiceStatus {
        &self.status
    }

    pub fn transcript(&self) -> &TranscriptAccumulator {
        &self.transcript
    }

    fn fail(&mut self, error: CaptureError) -> CaptureError {
        warn!("Voice entry failed: {}", error);
        self.status = VoiceStatus::Error(error.to_string());
        error
    }

    /// Begin listening; clears any previous transcript, form and error
    pub fn start(&mut self) -> Result<(), CaptureError> {
        match self.status {
            VoiceStatus::Listening | VoiceStatus::Processing => {
                Err(CaptureError::InvalidState("voice entry is already running"))
            }
            _ => {
                self.transcript.reset();
                self.status = VoiceStatus::Listening;
                info!("Voice entry listening");
                Ok(())
            }
        }
    }

    pub fn on_result(&mut self, results: &[RecognitionResult], result_index: usize) {
        if self.status == VoiceStatus::Listening {
            self.transcript.on_result(results, result_index);
            debug!("Transcript so far: {} chars", self.transcript.finalized().len());
        }
    }

    pub fn on_error(&mut self, code: &str) {
        self.fail(CaptureError::SpeechRecognition(code.to_string()));
    }

    /// Stop listening and hand back the finalized transcript
    pub fn stop(&mut self) -> Result<String, CaptureError> {
        if self.status != VoiceStatus::Listening {
            return Err(CaptureError::InvalidState("voice entry is not listening"));
        }
        self.status = VoiceStatus::Processing;
        let transcript = self.transcript.finalized().trim().to_string();
        if transcript.is_empty() {
            return Err(self.fail(CaptureError::NoSpeechDetected));
        }
        Ok(transcript)
    }

    /// Extract vitals from the transcript and move to review
    pub async fn process<M: GenerativeModel>(
        &mut self,
        service: &InsightService<M>,
        transcript: &str,
    ) -> Result<&VitalsForm, CaptureError> {
        if self.status != VoiceStatus::Processing {
            return Err(CaptureError::InvalidState("no transcript to process"));
        }
        match service.parse_vitals_from_text(transcript).await {
            Ok(partial) => {
                self.status = VoiceStatus::Review(VitalsForm::from_partial(&partial));
                match &self.status {
                    VoiceStatus::Review(form) => Ok(form),
                    _ => Err(CaptureError::InvalidState("review form missing")),
                }
            }
            Err(e) => Err(self.fail(e.into())),
        }
    }

    /// Editable form while in review
    pub fn form_mut(&mut self) -> Option<&mut VitalsForm> {
        match &mut self.status {
            VoiceStatus::Review(form) => Some(form),
            _ => None,
        }
    }

    /// Validate the reviewed form like a manual entry
    pub fn submit(&self) -> Result<NewVitalData, CaptureError> {
        match &self.status {
            VoiceStatus::Review(form) => form.submit(),
            _ => Err(CaptureError::InvalidState("nothing to submit")),
        }
    }
}

/// Event from the host speech engine
#[derive(Debug, Clone)]
pub enum SpeechEvent {
    Results {
        results: Vec<RecognitionResult>,
        result_index: usize,
    },
    Error(String),
}

/// Host speech recognizer; `None` from `next_event` means the engine stopped
#[async_trait]
pub trait SpeechSource: Send {
    fn is_supported(&self) -> bool;

    async fn next_event(&mut self) -> Option<SpeechEvent>;
}

/// Speech source over already-transcribed lines, each a final result
pub struct TranscriptLines {
    lines: std::vec::IntoIter<String>,
}

impl TranscriptLines {
    pub fn new(lines: impl IntoIterator<Item = String>) -> Self {
        Self {
            lines: lines.into_iter().collect::<Vec<_>>().into_iter(),
        }
    }
}

#[async_trait]
impl SpeechSource for TranscriptLines {
    fn is_supported(&self) -> bool {
        true
    }

    async fn next_event(&mut self) -> Option<SpeechEvent> {
        self.lines.next().map(|line| SpeechEvent::Results {
            results: vec![RecognitionResult::final_text(line)],
            result_index: 0,
        })
    }
}

/// Runs a full voice session against a speech source and the AI service.
/// The extracted form is submitted as-is.
pub struct VoiceCapture<S, M> {
    source: S,
    service: InsightService<M>,
    entry: VoiceEntry,
}

impl<S: SpeechSource, M: GenerativeModel> VoiceCapture<S, M> {
    pub fn new(source: S, service: InsightService<M>) -> Self {
        Self {
            source,
            service,
            entry: VoiceEntry::new(),
        }
    }

    pub fn entry(&self) -> &VoiceEntry {
        &self.entry
    }
}

#[async_trait]
impl<S: SpeechSource, M: GenerativeModel> CaptureAdapter for VoiceCapture<S, M> {
    fn source(&self) -> CaptureSource {
        CaptureSource::Voice
    }

    async fn capture(&mut self) -> Result<NewVitalData, CaptureError> {
        if !self.source.is_supported() {
            return Err(self.entry.fail(CaptureError::SpeechUnsupported));
        }
        self.entry.start()?;
        while let Some(event) = self.source.next_event().await {
            match event {
                SpeechEvent::Results {
                    results,
                    result_index,
                } => self.entry.on_result(&results, result_index),
                SpeechEvent::Error(code) => {
                    self.entry.on_error(&code);
                    return Err(CaptureError::SpeechRecognition(code));
                }
            }
        }
        let transcript = self.entry.stop()?;
        self.entry.process(&self.service, &transcript).await?;
        self.entry.submit()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::service::fake::FakeModel;
    use crate::ai::AiError;
    use serde_json::json;

    #[test]
    fn test_accumulator_final_and_interim() {
        let mut acc = TranscriptAccumulator::new();
        acc.on_result(&[RecognitionResult::interim("heart rate")], 0);
        assert_eq!(acc.finalized(), "");
        assert_eq!(acc.interim(), "heart rate");

        acc.on_result(
            &[
                RecognitionResult::final_text("heart rate 72"),
                RecognitionResult::interim("blood"),
            ],
            0,
        );
        assert_eq!(acc.finalized(), "heart rate 72 ");
        assert_eq!(acc.interim(), "blood");
    }

    #[test]
    fn test_accumulator_skips_before_result_index() {
        let mut acc = TranscriptAccumulator::new();
        let results = [
            RecognitionResult::final_text("already seen"),
            RecognitionResult::final_text("pressure 120 over 80"),
        ];
        acc.on_result(&results, 1);
        assert_eq!(acc.finalized(), "pressure 120 over 80 ");
    }

    #[test]
    fn test_start_clears_previous_session() {
        let mut entry = VoiceEntry::new();
        entry.start().unwrap();
        entry.on_result(&[RecognitionResult::final_text("temp 37")], 0);
        entry.on_error("network");
        assert_eq!(
            entry.status(),
            &VoiceStatus::Error("Speech recognition error: network".into())
        );

        entry.start().unwrap();
        assert_eq!(entry.status(), &VoiceStatus::Listening);
        assert_eq!(entry.transcript().finalized(), "");
    }

    #[test]
    fn test_stop_without_speech() {
        let mut entry = VoiceEntry::new();
        entry.start().unwrap();
        entry.on_result(&[RecognitionResult::interim("um")], 0);
        let err = entry.stop().unwrap_err();
        assert!(matches!(err, CaptureError::NoSpeechDetected));
        assert_eq!(
            entry.status(),
            &VoiceStatus::Error("No speech detected. Please try again.".into())
        );
    }

    #[test]
    fn test_results_ignored_when_not_listening() {
        let mut entry = VoiceEntry::new();
        entry.on_result(&[RecognitionResult::final_text("pulse 80")], 0);
        assert_eq!(entry.transcript().finalized(), "");
        assert!(entry.stop().is_err());
    }

    #[tokio::test]
    async fn test_process_prefills_review_form() {
        let service = InsightService::new(FakeModel::replying(json!({
            "heartRate": 72, "systolic": 120, "diastolic": 80, "temperature": 36.9
        })));
        let mut entry = VoiceEntry::new();
        entry.start().unwrap();
        entry.on_result(
            &[RecognitionResult::final_text("pulse 72 pressure 120 over 80 temp 36.9")],
            0,
        );
        let transcript = entry.stop().unwrap();
        assert_eq!(entry.status(), &VoiceStatus::Processing);

        let form = entry.process(&service, &transcript).await.unwrap();
        assert_eq!(form.heart_rate, "72");
        assert!(form.oxygen_saturation.is_empty());

        // Missing SpO2 blocks submission until the caregiver fills it in
        assert!(matches!(entry.submit(), Err(CaptureError::MissingFields)));
        if let Some(form) = entry.form_mut() {
            form.oxygen_saturation = "97".into();
        }
        assert_eq!(entry.submit().unwrap().oxygen_saturation, 97.0);
    }

    #[tokio::test]
    async fn test_process_ai_failure() {
        let service = InsightService::new(FakeModel::failing(AiError::InvalidResponse("bad".into())));
        let mut entry = VoiceEntry::new();
        entry.start().unwrap();
        entry.on_result(&[RecognitionResult::final_text("something")], 0);
        let transcript = entry.stop().unwrap();
        let err = entry.process(&service, &transcript).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "AI could not understand the provided text. Please try again."
        );
        assert!(matches!(entry.status(), VoiceStatus::Error(_)));
    }

    #[tokio::test]
    async fn test_voice_capture_adapter() {
        let service = InsightService::new(FakeModel::replying(json!({
            "heartRate": 68, "systolic": 118, "diastolic": 76,
            "temperature": 36.7, "oxygenSaturation": 98
        })));
        let source = TranscriptLines::new(vec![
            "heart rate 68".to_string(),
            "pressure 118 over 76 temperature 36.7 oxygen 98".to_string(),
        ]);
        let mut capture = VoiceCapture::new(source, service);
        let data = capture.capture().await.unwrap();
        assert_eq!(data.systolic, 118.0);
        assert_eq!(
            capture.entry().transcript().finalized(),
            "heart rate 68 pressure 118 over 76 temperature 36.7 oxygen 98 "
        );
    }
}
