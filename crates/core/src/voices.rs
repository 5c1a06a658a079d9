//! Synthesis voice catalog.
//!
//! Voices are configured per language. Lookups fall back from the exact
//! code (`pt-BR`) to its primary subtag (`pt`) and finally to the
//! [`DEFAULT_LANGUAGE`] set, so every language has at least the English
//! voices available.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::language::{primary_subtag, DEFAULT_LANGUAGE};

/// A text-to-speech voice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voice {
    pub voice_id: String,
    pub name: String,
    pub language_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
}

impl Voice {
    fn builtin(voice_id: &str, name: &str, language_code: &str, gender: &str) -> Self {
        Self {
            voice_id: voice_id.to_string(),
            name: name.to_string(),
            language_code: language_code.to_string(),
            gender: Some(gender.to_string()),
        }
    }
}

/// Voices keyed by language code.
#[derive(Debug, Clone)]
pub struct VoiceCatalog {
    by_language: BTreeMap<String, Vec<Voice>>,
}

impl VoiceCatalog {
    /// Build a catalog from a flat voice list, preserving list order within
    /// each language.
    pub fn new(voices: Vec<Voice>) -> Self {
        let mut by_language: BTreeMap<String, Vec<Voice>> = BTreeMap::new();
        for voice in voices {
            by_language
                .entry(voice.language_code.clone())
                .or_default()
                .push(voice);
        }
        Self { by_language }
    }

    /// Parse a JSON array of [`Voice`] objects.
    ///
    /// The catalog must contain at least one voice for the fallback
    /// language.
    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        let voices: Vec<Voice> = serde_json::from_str(json)
            .map_err(|e| CoreError::Validation(format!("Invalid voice catalog: {e}")))?;
        let catalog = Self::new(voices);
        if catalog.configured(DEFAULT_LANGUAGE).is_empty() {
            return Err(CoreError::Validation(format!(
                "Voice catalog must configure at least one '{DEFAULT_LANGUAGE}' voice"
            )));
        }
        Ok(catalog)
    }

    /// Voices configured for exactly `language_code`.
    fn configured(&self, language_code: &str) -> &[Voice] {
        self.by_language
            .get(language_code)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Voices usable for `language_code`, falling back to the primary
    /// subtag and then to the default-language set.
    pub fn voices_for(&self, language_code: &str) -> &[Voice] {
        let exact = self.configured(language_code);
        if !exact.is_empty() {
            return exact;
        }
        let primary = self.configured(primary_subtag(language_code));
        if !primary.is_empty() {
            return primary;
        }
        self.configured(DEFAULT_LANGUAGE)
    }

    /// First voice for `language_code` after fallback.
    pub fn default_voice(&self, language_code: &str) -> Option<&Voice> {
        self.voices_for(language_code).first()
    }

    /// Every configured voice, grouped by language code.
    pub fn all(&self) -> impl Iterator<Item = &Voice> {
        self.by_language.values().flatten()
    }

    /// Languages with at least one configured voice.
    pub fn languages(&self) -> impl Iterator<Item = &str> {
        self.by_language.keys().map(String::as_str)
    }
}

impl Default for VoiceCatalog {
    /// Built-in multilingual voices.
    fn default() -> Self {
        Self::new(vec![
            Voice::builtin("21m00Tcm4TlvDq8ikWAM", "Rachel", "en", "female"),
            Voice::builtin("pNInz6obpgDQGcFmaJgB", "Adam", "en", "male"),
            Voice::builtin("ErXwobaYiN019PkySvjV", "Antoni", "es", "male"),
            Voice::builtin("EXAVITQu4vr4xnSDxMaL", "Bella", "es", "female"),
            Voice::builtin("ThT5KcBeYPX3keUQqHPh", "Dorothy", "fr", "female"),
            Voice::builtin("TxGEqnHWrfWFTfGW9XjX", "Josh", "fr", "male"),
            Voice::builtin("MF3mGyEYCl7XYWbV9V6O", "Elli", "de", "female"),
            Voice::builtin("VR6AewLTigWG4xSOukaG", "Arnold", "de", "male"),
            Voice::builtin("yoZ06aMxZJJ28mfd3POQ", "Sam", "pt", "male"),
        ])
    }
}
