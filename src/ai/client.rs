//! Google Gemini API client for structured JSON generation
//!
//! Thin wrapper around the Gemini generateContent endpoint. Each request
//! carries a response schema and asks for `application/json`; the first
//! candidate's text is then parsed as JSON.

use async_trait::async_trait;
use reqwest::header::{HeaderValue, CONTENT_TYPE};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};

use super::{AiError, GenerativeModel};

pub const GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta/models";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Error bodies are cut to this many characters before surfacing
const MAX_ERROR_BODY_CHARS: usize = 200;

pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
    endpoint: String,
}

// -- Response types --

#[derive(Debug, Deserialize)]
pub struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiResponseContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponseContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponsePart {
    text: Option<String>,
}

impl GeminiClient {
    pub fn new(api_key: &str) -> Result<Self, AiError> {
        Self::with_options(api_key, DEFAULT_MODEL, GEMINI_ENDPOINT, DEFAULT_TIMEOUT)
    }

    pub fn with_options(
        api_key: &str,
        model: &str,
        endpoint: &str,
        timeout: Duration,
    ) -> Result<Self, AiError> {
        if api_key.trim().is_empty() {
            return Err(AiError::MissingApiKey);
        }

        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            api_key: api_key.trim().to_string(),
            model: model.to_string(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn build_request_body(prompt: &str, schema: &Value) -> Value {
        serde_json::json!({
            "contents": [{
                "parts": [{"text": prompt}]
            }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": schema
            }
        })
    }

    /// Concatenated text parts of the first candidate
    pub fn extract_text(response: &GeminiResponse) -> Option<String> {
        let content = response.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

#[async_trait]
impl GenerativeModel for GeminiClient {
    async fn generate_json(&self, prompt: &str, schema: &Value) -> Result<Value, AiError> {
        let url = format!("{}/{}:generateContent", self.endpoint, self.model);
        let body = Self::build_request_body(prompt, schema);

        info!("Gemini request: model={}, prompt={} chars", self.model, prompt.len());

        let api_key = HeaderValue::from_str(&self.api_key)
            .map_err(|_| AiError::MissingApiKey)?;
        let response = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            // Error bodies can echo request content
            let truncated: String = error_body.chars().take(MAX_ERROR_BODY_CHARS).collect();
            return Err(AiError::Status {
                status: status.as_u16(),
                body: truncated,
            });
        }

        let gemini_response: GeminiResponse = response.json().await?;
        let text = Self::extract_text(&gemini_response)
            .ok_or_else(|| AiError::InvalidResponse("response contained no text".into()))?;
        debug!("Gemini response: {} chars", text.len());
        extract_json(&text)
    }
}

/// Parse the JSON value out of a model reply.
///
/// Markdown fences are stripped; if the remaining text is not valid JSON on
/// its own, the span from the first opening bracket to the last closing one
/// is tried.
pub fn extract_json(response: &str) -> Result<Value, AiError> {
    let text = response.replace("```json", "").replace("```", "");
    let text = text.trim();

    if let Ok(value) = serde_json::from_str(text) {
        return Ok(value);
    }

    let start = text.find(['{', '[']);
    let end = text.rfind(['}', ']']);
    let candidate = match (start, end) {
        (Some(start), Some(end)) if end > start => &text[start..=end],
        _ => return Err(AiError::InvalidResponse("no JSON value in response".into())),
    };

    serde_json::from_str(&escape_newlines_in_strings(candidate))
        .map_err(|e| AiError::InvalidResponse(e.to_string()))
}

/// Models occasionally emit raw newlines inside string literals
fn escape_newlines_in_strings(json: &str) -> String {
    let mut result = String::with_capacity(json.len());
    let mut in_string = false;
    let mut escape_next = false;

    for ch in json.chars() {
        if escape_next {
            result.push(ch);
            escape_next = false;
            continue;
        }
        match ch {
            '\\' if in_string => {
                result.push(ch);
                escape_next = true;
            }
            '"' => {
                in_string = !in_string;
                result.push(ch);
            }
            '\n' if in_string => result.push_str("\\n"),
            '\r' if in_string => {}
            _ => result.push(ch),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_request_body() {
        let schema = serde_json::json!({"type": "OBJECT"});
        let body = GeminiClient::build_request_body("Summarize vitals", &schema);
        assert_eq!(body["contents"][0]["parts"][0]["text"], "Summarize vitals");
        assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");
        assert_eq!(body["generationConfig"]["responseSchema"]["type"], "OBJECT");
    }

    #[test]
    fn test_extract_text_joins_parts() {
        let response: GeminiResponse = serde_json::from_value(serde_json::json!({
            "candidates": [{
                "content": {"parts": [{"text": "{\"summary\":"}, {"text": "\"ok\"}"}]}
            }]
        }))
        .unwrap();
        assert_eq!(
            GeminiClient::extract_text(&response).as_deref(),
            Some("{\"summary\":\"ok\"}")
        );
    }

    #[test]
    fn test_extract_text_empty_candidates() {
        let response: GeminiResponse =
            serde_json::from_value(serde_json::json!({"candidates": []})).unwrap();
        assert!(GeminiClient::extract_text(&response).is_none());
    }

    #[test]
    fn test_extract_text_blocked_candidate() {
        let response: GeminiResponse = serde_json::from_value(serde_json::json!({
            "candidates": [{"finishReason": "SAFETY"}]
        }))
        .unwrap();
        assert!(GeminiClient::extract_text(&response).is_none());
    }

    #[test]
    fn test_new_empty_api_key() {
        assert!(matches!(GeminiClient::new("  "), Err(AiError::MissingApiKey)));
    }

    #[test]
    fn test_extract_json_plain() {
        let value = extract_json(r#"[{"name":"a","description":"b"}]"#).unwrap();
        assert_eq!(value[0]["name"], "a");
    }

    #[test]
    fn test_extract_json_fenced() {
        let value = extract_json("```json\n{\"heartRate\": 72}\n```").unwrap();
        assert_eq!(value["heartRate"], 72);
    }

    #[test]
    fn test_extract_json_with_prose() {
        let value = extract_json("Here you go: {\"summary\": \"line one\nline two\"} hope it helps").unwrap();
        assert_eq!(value["summary"], "line one\nline two");
    }

    #[test]
    fn test_extract_json_rejects_prose() {
        assert!(matches!(
            extract_json("I cannot help with that."),
            Err(AiError::InvalidResponse(_))
        ));
    }
}
