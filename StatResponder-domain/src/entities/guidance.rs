use serde::{Deserialize, Serialize};

/// Keywords heard in a distress recording and the advice derived from them
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceGuidance {
    #[serde(default)]
    pub keywords: Vec<String>,
    pub guidance: String,
}

/// First-aid advice for a single symptom
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymptomGuidance {
    pub guidance: String,
}

/// Canned advice from the built-in symptom checker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymptomAdvice {
    pub title: String,
    pub advice: Vec<String>,
}

/// A hospital returned by a places search
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hospital {
    pub name: String,
    /// Address or general vicinity
    pub vicinity: String,
    pub place_id: String,
}

/// Binary media attached inline to a model prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineMedia {
    pub mime_type: String,
    /// Base64 payload, already validated
    pub data: String,
}

/// A single prompt sent to a generative model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub media: Option<InlineMedia>,
    /// Ask the model for a JSON document instead of free text
    pub json_output: bool,
}

impl GenerationRequest {
    pub fn text(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            media: None,
            json_output: false,
        }
    }

    pub fn with_media(mut self, media: InlineMedia) -> Self {
        self.media = Some(media);
        self
    }

    pub fn expect_json(mut self) -> Self {
        self.json_output = true;
        self
    }
}
