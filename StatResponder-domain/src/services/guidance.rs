//! AI guidance flows: voice analysis and symptom guidance on top of a
//! generative model.

use std::sync::Arc;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::GuidanceConfig;
use crate::entities::{GenerationRequest, InlineMedia, SymptomAdvice, SymptomGuidance, VoiceGuidance};
use crate::services::gemini::GeminiClient;
use crate::services::symptoms::{self, COMMON_SYMPTOMS};

/// Errors from the AI guidance and places lookups
#[derive(Debug, Error)]
pub enum GuidanceError {
    /// Input rejected before any upstream call
    #[error("Validation error: {0}")]
    Validation(String),

    /// A required key or setting is missing
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The upstream service answered with an error
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// The request never got a usable answer
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The upstream answer could not be understood
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

/// A text-generating model
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    /// Run a single prompt and return the model's text output
    async fn generate(&self, request: GenerationRequest) -> Result<String, GuidanceError>;
}

/// Parse a `data:<mime>;base64,<payload>` URI.
///
/// Extra parameters between the MIME type and `base64` (such as
/// `codecs=opus`) are accepted and dropped.
pub fn parse_data_uri(uri: &str) -> Result<InlineMedia, GuidanceError> {
    let invalid = |reason: &str| GuidanceError::Validation(format!("Invalid data URI: {}", reason));

    let rest = uri
        .trim()
        .strip_prefix("data:")
        .ok_or_else(|| invalid("missing data: scheme"))?;
    let (header, payload) = rest.split_once(',').ok_or_else(|| invalid("missing payload"))?;

    let mut params = header.split(';');
    let mime_type = params.next().unwrap_or_default().trim().to_ascii_lowercase();
    if params.last().map(str::trim) != Some("base64") {
        return Err(invalid("payload must be base64 encoded"));
    }
    match mime_type.split_once('/') {
        Some((kind, sub)) if !kind.is_empty() && !sub.is_empty() => {}
        _ => return Err(invalid("missing MIME type")),
    }

    if payload.is_empty() {
        return Err(invalid("empty payload"));
    }
    STANDARD
        .decode(payload)
        .map_err(|e| invalid(&format!("payload is not valid base64 ({})", e)))?;

    Ok(InlineMedia {
        mime_type,
        data: payload.to_string(),
    })
}

/// Strip a surrounding markdown code fence, if any
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string on the opening fence line
    let inner = match inner.split_once('\n') {
        Some((_, body)) => body,
        None => inner,
    };
    inner.trim_end().strip_suffix("```").unwrap_or(inner).trim()
}

/// Whether the first line of advice already tells the reader to call for help
fn leads_with_emergency_call(guidance: &str, emergency_number: &str) -> bool {
    let first = guidance
        .lines()
        .map(|line| line.trim_start_matches(|c: char| !c.is_alphanumeric()).trim())
        .find(|line| !line.is_empty())
        .unwrap_or_default()
        .to_lowercase();

    if NEGATED_CALLS.iter().any(|negated| first.contains(negated)) {
        return false;
    }

    first.contains("call")
        && (first.contains("emergency") || first.contains(emergency_number) || first.contains("ambulance"))
}

/// Phrasings that mention calling only to advise against it
const NEGATED_CALLS: &[&str] = &[
    "do not call",
    "don't call",
    "don\u{2019}t call",
    "dont call",
    "never call",
    "no need to call",
];

const VOICE_PROMPT: &str = "You are an AI assistant specialized in providing first-aid guidance based on voice analysis.

You will receive a voice recording of a user in distress. Your task is to analyze the recording, identify keywords related to medical emergencies, and provide relevant first-aid guidance.

Based on the identified keywords, provide first-aid guidance. Respond in a JSON format:

{
  \"keywords\": [\"keyword1\", \"keyword2\"],
  \"guidance\": \"First-aid guidance based on the identified keywords.\"
}";

fn symptom_prompt(symptom: &str) -> String {
    format!(
        "You are an AI assistant providing first-aid guidance.
The user has selected the following symptom: \"{}\".

Please provide concise, actionable first-aid steps for this symptom.
If the symptom is indicative of a life-threatening emergency, your first and most important piece of advice MUST be to call local emergency services immediately.
Keep the advice practical and easy to understand for a layperson in a stressful situation.
Format the guidance clearly, using bullet points or numbered steps if appropriate.
Respond with only the guidance text.",
        symptom
    )
}

/// First-aid guidance flows
pub struct GuidanceService {
    model: Option<Arc<dyn GenerativeModel>>,
    emergency_number: String,
}

impl GuidanceService {
    /// Create a service. Without a model only the built-in flows work.
    pub fn new(model: Option<Arc<dyn GenerativeModel>>, emergency_number: impl Into<String>) -> Self {
        Self {
            model,
            emergency_number: emergency_number.into(),
        }
    }

    /// Whether AI-backed flows are available
    pub fn has_model(&self) -> bool {
        self.model.is_some()
    }

    fn model(&self) -> Result<&Arc<dyn GenerativeModel>, GuidanceError> {
        self.model.as_ref().ok_or_else(|| {
            GuidanceError::Configuration(
                "No generative model configured; set GOOGLE_GENAI_API_KEY or GEMINI_API_KEY".to_string(),
            )
        })
    }

    /// Analyze a distress recording and return keywords plus guidance
    pub async fn voice_guidance(&self, voice_recording_data_uri: &str) -> Result<VoiceGuidance, GuidanceError> {
        let media = parse_data_uri(voice_recording_data_uri)?;
        if !media.mime_type.starts_with("audio/") {
            return Err(GuidanceError::Validation(format!(
                "Expected an audio recording, got {}",
                media.mime_type
            )));
        }
        let model = self.model()?;

        debug!("Requesting voice analysis for {} recording", media.mime_type);
        let request = GenerationRequest::text(VOICE_PROMPT).with_media(media).expect_json();
        let reply = model.generate(request).await?;

        let parsed: VoiceGuidance = serde_json::from_str(strip_code_fence(&reply)).map_err(|e| {
            warn!("Voice analysis reply was not valid JSON: {}", e);
            GuidanceError::MalformedResponse(format!("voice analysis reply: {}", e))
        })?;

        if parsed.guidance.trim().is_empty() {
            return Err(GuidanceError::MalformedResponse("voice analysis returned no guidance".to_string()));
        }

        info!("Voice analysis identified {} keywords", parsed.keywords.len());
        Ok(parsed)
    }

    /// First-aid advice for a selected symptom. Life-threatening symptoms
    /// always lead with a call to emergency services.
    pub async fn symptom_guidance(&self, symptom: &str) -> Result<SymptomGuidance, GuidanceError> {
        let symptom = symptom.trim();
        if symptom.is_empty() {
            return Err(GuidanceError::Validation("Symptom is required".to_string()));
        }
        let model = self.model()?;

        let reply = model.generate(GenerationRequest::text(symptom_prompt(symptom))).await?;
        let mut guidance = reply.trim().to_string();
        if guidance.is_empty() {
            return Err(GuidanceError::MalformedResponse("symptom guidance was empty".to_string()));
        }

        if symptoms::is_critical_symptom(symptom)
            && !leads_with_emergency_call(&guidance, &self.emergency_number)
        {
            debug!("Prepending emergency directive for critical symptom {:?}", symptom);
            guidance = format!(
                "Call emergency services ({}) immediately.\n{}",
                self.emergency_number, guidance
            );
        }

        Ok(SymptomGuidance { guidance })
    }

    /// Symptoms offered for quick selection
    pub fn common_symptoms(&self) -> &'static [&'static str] {
        COMMON_SYMPTOMS
    }

    /// Built-in advice lookup that works without a model
    pub fn check_symptoms(&self, query: &str) -> Option<SymptomAdvice> {
        symptoms::check_symptoms(query)
    }
}

/// Build the guidance service, wiring a Gemini client when a key is configured
pub fn create_guidance_service(config: &GuidanceConfig, emergency_number: &str) -> Result<GuidanceService, GuidanceError> {
    let model: Option<Arc<dyn GenerativeModel>> = match &config.genai_api_key {
        Some(key) => Some(Arc::new(GeminiClient::new(key.clone(), config.model.clone(), config.http_timeout)?)),
        None => None,
    };
    Ok(GuidanceService::new(model, emergency_number))
}
