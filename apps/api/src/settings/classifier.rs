//! Provider Key Classifier: guesses the AI provider from an API key's shape.
//!
//! Rules, first match wins:
//! 1. prefix `AIza` → gemini
//! 2. prefix `hf_` → huggingface
//! 3. longer than 20 characters → cohere
//! 4. otherwise unrecognized
//!
//! This is a heuristic, not a validity check. Rule 3 in particular accepts any
//! long string. Callers must refuse to save keys that classify as `None`.

use serde::Serialize;

use crate::llm_client::ProviderId;

const GEMINI_PREFIX: &str = "AIza";
const HUGGING_FACE_PREFIX: &str = "hf_";
const COHERE_MIN_EXCLUSIVE_LEN: usize = 20;

pub fn classify(raw_key: &str) -> Option<ProviderId> {
    let key = raw_key.trim();
    if key.is_empty() {
        None
    } else if key.starts_with(GEMINI_PREFIX) {
        Some(ProviderId::Gemini)
    } else if key.starts_with(HUGGING_FACE_PREFIX) {
        Some(ProviderId::HuggingFace)
    } else if key.chars().count() > COHERE_MIN_EXCLUSIVE_LEN {
        Some(ProviderId::Cohere)
    } else {
        None
    }
}

/// A key as typed by the user together with the provider it classifies as.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderCredential {
    #[serde(skip)]
    pub raw_key: String,
    pub provider: Option<ProviderId>,
}

impl ProviderCredential {
    pub fn detect(raw_key: &str) -> Self {
        let raw_key = raw_key.trim().to_string();
        let provider = classify(&raw_key);
        Self { raw_key, provider }
    }

    pub fn is_recognized(&self) -> bool {
        self.provider.is_some()
    }
}
