//! NFC tag capture.
//!
//! Tags carry an NDEF text record whose payload is a JSON object with the
//! five numeric vitals fields. The physical reader sits behind [`NfcReader`];
//! this module owns the scan session state and payload validation.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::{CaptureAdapter, CaptureError, CaptureSource, NewVitalData};

/// How long Success/Error stay visible before the status returns to Idle
pub const STATUS_RESET_AFTER: Duration = Duration::from_secs(3);

const TEXT_RECORD_TYPE: &str = "text";

/// A single NDEF record as delivered by the reader
#[derive(Debug, Clone, PartialEq)]
pub struct NdefRecord {
    pub record_type: String,
    pub data: Vec<u8>,
}

impl NdefRecord {
    pub fn text(payload: &str) -> Self {
        Self {
            record_type: TEXT_RECORD_TYPE.to_string(),
            data: payload.as_bytes().to_vec(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NdefMessage {
    pub records: Vec<NdefRecord>,
}

/// Event reported by the reader while a scan is active
#[derive(Debug, Clone)]
pub enum NfcEvent {
    Reading(NdefMessage),
    ReadingError,
}

/// Platform NFC reader
#[async_trait]
pub trait NfcReader: Send {
    fn is_supported(&self) -> bool;

    /// Wait for the next tag event
    async fn next_event(&mut self) -> Result<NfcEvent, CaptureError>;
}

/// Extract the vitals record from a tag message
pub fn parse_tag(message: &NdefMessage) -> Result<NewVitalData, CaptureError> {
    let record = message
        .records
        .iter()
        .find(|r| r.record_type == TEXT_RECORD_TYPE)
        .ok_or(CaptureError::NoTextRecord)?;

    let text = std::str::from_utf8(&record.data).map_err(|e| {
        debug!("NFC text record is not UTF-8: {}", e);
        CaptureError::InvalidNfcPayload
    })?;
    let json: Value = serde_json::from_str(text.trim()).map_err(|e| {
        debug!("NFC text record is not JSON: {}", e);
        CaptureError::InvalidNfcPayload
    })?;

    let field = |name: &str| json.get(name).and_then(Value::as_f64);
    match (
        field("heartRate"),
        field("systolic"),
        field("diastolic"),
        field("temperature"),
        field("oxygenSaturation"),
    ) {
        (Some(heart_rate), Some(systolic), Some(diastolic), Some(temperature), Some(oxygen_saturation)) => {
            NewVitalData {
                heart_rate,
                systolic,
                diastolic,
                temperature,
                oxygen_saturation,
            }
            .validate()
        }
        _ => Err(CaptureError::InvalidNfcPayload),
    }
}

/// Scan session status shown on the scan control
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NfcStatus {
    Idle,
    Scanning,
    Success,
    Error(String),
    Unsupported,
}

/// Cancels an in-progress scan from another task
#[derive(Debug, Clone)]
pub struct AbortHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl AbortHandle {
    pub fn abort(&self) {
        self.tx.send_replace(true);
    }
}

pub struct NfcCapture<R> {
    reader: R,
    status: NfcStatus,
    status_since: Instant,
    abort_tx: Arc<watch::Sender<bool>>,
}

impl<R: NfcReader> NfcCapture<R> {
    pub fn new(reader: R) -> Self {
        let status = if reader.is_supported() {
            NfcStatus::Idle
        } else {
            NfcStatus::Unsupported
        };
        let (abort_tx, _) = watch::channel(false);
        Self {
            reader,
            status,
            status_since: Instant::now(),
            abort_tx: Arc::new(abort_tx),
        }
    }

    pub fn abort_handle(&self) -> AbortHandle {
        AbortHandle {
            tx: self.abort_tx.clone(),
        }
    }

    /// Status as of `now`; Success and Error revert to Idle after a few seconds
    pub fn status_at(&self, now: Instant) -> NfcStatus {
        match &self.status {
            NfcStatus::Success | NfcStatus::Error(_)
                if now.saturating_duration_since(self.status_since) >= STATUS_RESET_AFTER =>
            {
                NfcStatus::Idle
            }
            status => status.clone(),
        }
    }

    pub fn status(&self) -> NfcStatus {
        self.status_at(Instant::now())
    }

    fn set_status(&mut self, status: NfcStatus) {
        self.status = status;
        self.status_since = Instant::now();
    }

    /// Run one scan session until a tag is read, the reader fails, or the
    /// scan is aborted. The session ends after the first tag either way.
    pub async fn scan(&mut self) -> Result<NewVitalData, CaptureError> {
        if self.status == NfcStatus::Unsupported {
            return Err(CaptureError::NfcUnsupported);
        }

        self.abort_tx.send_replace(false);
        let mut abort_rx = self.abort_tx.subscribe();
        self.set_status(NfcStatus::Scanning);
        info!("NFC scan started");

        let outcome = tokio::select! {
            _ = abort_rx.wait_for(|aborted| *aborted) => {
                info!("NFC scan cancelled");
                self.set_status(NfcStatus::Idle);
                return Err(CaptureError::Aborted);
            }
            event = self.reader.next_event() => event,
        };

        let result = match outcome {
            Ok(NfcEvent::Reading(message)) => parse_tag(&message),
            Ok(NfcEvent::ReadingError) => Err(CaptureError::NfcReadFailed),
            Err(e) => Err(e),
        };

        match &result {
            Ok(_) => {
                info!("NFC tag read successfully");
                self.set_status(NfcStatus::Success);
            }
            Err(e) => {
                warn!("NFC scan failed: {}", e);
                self.set_status(NfcStatus::Error(e.to_string()));
            }
        }
        result
    }
}

#[async_trait]
impl<R: NfcReader> CaptureAdapter for NfcCapture<R> {
    fn source(&self) -> CaptureSource {
        CaptureSource::Nfc
    }

    async fn capture(&mut self) -> Result<NewVitalData, CaptureError> {
        self.scan().await
    }
}

/// Reader that replays a fixed list of events, then waits forever.
/// Used for payload files and tests.
pub struct ScriptedReader {
    events: std::collections::VecDeque<NfcEvent>,
    supported: bool,
}

impl ScriptedReader {
    pub fn new(events: impl IntoIterator<Item = NfcEvent>) -> Self {
        Self {
            events: events.into_iter().collect(),
            supported: true,
        }
    }

    pub fn unsupported() -> Self {
        Self {
            events: Default::default(),
            supported: false,
        }
    }
}

#[async_trait]
impl NfcReader for ScriptedReader {
    fn is_supported(&self) -> bool {
        self.supported
    }

    async fn next_event(&mut self) -> Result<NfcEvent, CaptureError> {
        match self.events.pop_front() {
            Some(event) => Ok(event),
            None => std::future::pending().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAYLOAD: &str =
        r#"{"heartRate":72,"systolic":118,"diastolic":76,"temperature":36.7,"oxygenSaturation":97}"#;

    fn message(records: Vec<NdefRecord>) -> NdefMessage {
        NdefMessage { records }
    }

    #[test]
    fn test_parse_valid_tag() {
        let data = parse_tag(&message(vec![NdefRecord::text(PAYLOAD)])).unwrap();
        assert_eq!(data.heart_rate, 72.0);
        assert_eq!(data.oxygen_saturation, 97.0);
    }

    #[test]
    fn test_parse_skips_non_text_records() {
        let url = NdefRecord {
            record_type: "url".into(),
            data: b"https://example.org".to_vec(),
        };
        let data = parse_tag(&message(vec![url, NdefRecord::text(PAYLOAD)])).unwrap();
        assert_eq!(data.systolic, 118.0);
    }

    #[test]
    fn test_parse_without_text_record() {
        let err = parse_tag(&message(vec![])).unwrap_err();
        assert_eq!(err.to_string(), "No text record found on NFC tag.");
    }

    #[test]
    fn test_parse_missing_field() {
        let payload = r#"{"heartRate":72,"systolic":118,"diastolic":76,"temperature":36.7}"#;
        let err = parse_tag(&message(vec![NdefRecord::text(payload)])).unwrap_err();
        assert!(matches!(err, CaptureError::InvalidNfcPayload));
    }

    #[test]
    fn test_parse_string_typed_field() {
        let payload = r#"{"heartRate":"72","systolic":118,"diastolic":76,"temperature":36.7,"oxygenSaturation":97}"#;
        assert!(matches!(
            parse_tag(&message(vec![NdefRecord::text(payload)])),
            Err(CaptureError::InvalidNfcPayload)
        ));
    }

    #[test]
    fn test_parse_not_json() {
        assert!(matches!(
            parse_tag(&message(vec![NdefRecord::text("hello")])),
            Err(CaptureError::InvalidNfcPayload)
        ));
    }

    #[tokio::test]
    async fn test_scan_success_then_status_expires() {
        let reader = ScriptedReader::new([NfcEvent::Reading(message(vec![NdefRecord::text(PAYLOAD)]))]);
        let mut capture = NfcCapture::new(reader);
        assert_eq!(capture.status(), NfcStatus::Idle);

        let data = capture.scan().await.unwrap();
        assert_eq!(data.diastolic, 76.0);
        assert_eq!(capture.status(), NfcStatus::Success);
        assert_eq!(
            capture.status_at(Instant::now() + STATUS_RESET_AFTER + Duration::from_millis(10)),
            NfcStatus::Idle
        );
    }

    #[tokio::test]
    async fn test_scan_reader_error() {
        let mut capture = NfcCapture::new(ScriptedReader::new([NfcEvent::ReadingError]));
        let err = capture.scan().await.unwrap_err();
        assert!(matches!(err, CaptureError::NfcReadFailed));
        assert_eq!(
            capture.status(),
            NfcStatus::Error("Cannot read data from the NFC tag. Try again.".into())
        );
    }

    #[tokio::test]
    async fn test_unsupported_reader() {
        let mut capture = NfcCapture::new(ScriptedReader::unsupported());
        assert_eq!(capture.status(), NfcStatus::Unsupported);
        assert!(matches!(capture.scan().await, Err(CaptureError::NfcUnsupported)));
        assert_eq!(capture.status(), NfcStatus::Unsupported);
    }

    #[tokio::test]
    async fn test_abort_cancels_pending_scan() {
        let mut capture = NfcCapture::new(ScriptedReader::new([]));
        let handle = capture.abort_handle();

        let (result, _) = tokio::join!(capture.scan(), async move {
            tokio::task::yield_now().await;
            handle.abort();
        });

        assert!(matches!(result, Err(CaptureError::Aborted)));
        assert_eq!(capture.status(), NfcStatus::Idle);
    }

    #[tokio::test]
    async fn test_stale_abort_does_not_cancel_next_scan() {
        let reader = ScriptedReader::new([NfcEvent::Reading(message(vec![NdefRecord::text(PAYLOAD)]))]);
        let mut capture = NfcCapture::new(reader);
        capture.abort_handle().abort();
        assert!(capture.scan().await.is_ok());
    }
}
