//! Google Generative Language API client

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::entities::GenerationRequest;
use crate::services::guidance::{GenerativeModel, GuidanceError};

/// Default API root
pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
enum Part<'a> {
    Text(&'a str),
    InlineData {
        #[serde(rename = "mimeType")]
        mime_type: &'a str,
        data: &'a str,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    status: String,
    #[serde(default)]
    message: String,
}

/// Join the text parts of the first candidate
fn extract_text(body: &str) -> Result<String, GuidanceError> {
    let response: GenerateContentResponse = serde_json::from_str(body)
        .map_err(|e| GuidanceError::MalformedResponse(format!("generateContent reply: {}", e)))?;

    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .map(|content| content.parts.into_iter().filter_map(|part| part.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(GuidanceError::MalformedResponse("model returned no text".to_string()));
    }
    Ok(text)
}

/// Describe a non-success reply using the API's error envelope when present
fn describe_api_error(status: reqwest::StatusCode, body: &str) -> String {
    match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(parsed) => format!("{} {}: {}", status.as_u16(), parsed.error.status, parsed.error.message),
        Err(_) => format!("{}: {}", status, body.trim()),
    }
}

/// [`GenerativeModel`] backed by the `models/{model}:generateContent` endpoint
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>, timeout: Duration) -> Result<Self, GuidanceError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            model: model.into(),
            base_url: GEMINI_BASE_URL.to_string(),
        })
    }

    /// Point the client at a different API root
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }
}

#[async_trait]
impl GenerativeModel for GeminiClient {
    async fn generate(&self, request: GenerationRequest) -> Result<String, GuidanceError> {
        let mut parts = vec![Part::Text(&request.prompt)];
        if let Some(media) = &request.media {
            parts.push(Part::InlineData {
                mime_type: &media.mime_type,
                data: &media.data,
            });
        }

        let body = GenerateContentRequest {
            contents: vec![Content { role: "user", parts }],
            generation_config: request.json_output.then_some(GenerationConfig {
                response_mime_type: "application/json",
            }),
        };

        debug!("Calling generative model {}", self.model);
        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let message = describe_api_error(status, &text);
            error!("Generative model request failed: {}", message);
            return Err(GuidanceError::Upstream(message));
        }

        extract_text(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::InlineMedia;

    #[test]
    fn test_request_serialization() {
        let request = GenerationRequest::text("Analyze this")
            .with_media(InlineMedia {
                mime_type: "audio/wav".to_string(),
                data: "AAAA".to_string(),
            })
            .expect_json();

        let body = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![
                    Part::Text(&request.prompt),
                    Part::InlineData { mime_type: "audio/wav", data: "AAAA" },
                ],
            }],
            generation_config: Some(GenerationConfig { response_mime_type: "application/json" }),
        };

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["contents"][0]["parts"][0]["text"], "Analyze this");
        assert_eq!(json["contents"][0]["parts"][1]["inlineData"]["mimeType"], "audio/wav");
        assert_eq!(json["generationConfig"]["responseMimeType"], "application/json");
    }

    #[test]
    fn test_extract_text_joins_parts() {
        let body = r#"{"candidates":[{"content":{"parts":[{"text":"Call "},{"text":"911."}]}}]}"#;
        assert_eq!(extract_text(body).unwrap(), "Call 911.");
    }

    #[test]
    fn test_extract_text_without_candidates() {
        assert!(matches!(
            extract_text(r#"{"candidates":[]}"#),
            Err(GuidanceError::MalformedResponse(_))
        ));
        assert!(matches!(extract_text("<html>"), Err(GuidanceError::MalformedResponse(_))));
    }

    #[test]
    fn test_describe_api_error() {
        let body = r#"{"error":{"code":403,"status":"PERMISSION_DENIED","message":"API key not valid"}}"#;
        let message = describe_api_error(reqwest::StatusCode::FORBIDDEN, body);
        assert_eq!(message, "403 PERMISSION_DENIED: API key not valid");
    }

    #[test]
    fn test_endpoint() {
        let client = GeminiClient::new("key", "gemini-2.0-flash", Duration::from_secs(5))
            .unwrap()
            .with_base_url("http://localhost:9999/v1beta/");
        assert_eq!(
            client.endpoint(),
            "http://localhost:9999/v1beta/models/gemini-2.0-flash:generateContent"
        );
    }
}
