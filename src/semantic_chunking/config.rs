use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use super::embeddings::{EmbeddingProvider, SharedEmbeddingProvider};
use super::segmenter::LanguageProfile;
use super::tokenizer::TokenEstimator;
use super::types::ChunkingError;

pub const ENV_MAX_TOKENS: &str = "SEMANTIC_CHUNKER_MAX_TOKENS";
pub const ENV_MIN_SIMILARITY: &str = "SEMANTIC_CHUNKER_MIN_SIMILARITY";
pub const ENV_OVERLAP: &str = "SEMANTIC_CHUNKER_OVERLAP";
pub const ENV_LANGUAGE: &str = "SEMANTIC_CHUNKER_LANGUAGE";

/// Tuning knobs for the chunker. Serializable so it can live in config files.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingOptions {
    pub language: LanguageProfile,
    pub max_tokens: usize,
    pub min_similarity: f32,
    /// Trailing sentences carried from one chunk into the next.
    pub overlap: usize,
    pub estimator: TokenEstimator,
}

impl Default for ChunkingOptions {
    fn default() -> Self {
        Self {
            language: LanguageProfile::default(),
            max_tokens: 200,
            min_similarity: 0.6,
            overlap: 0,
            estimator: TokenEstimator::default(),
        }
    }
}

impl ChunkingOptions {
    /// Reject settings that would silently degrade the chunking pass.
    pub fn validate(&self) -> Result<(), ChunkingError> {
        if self.max_tokens == 0 {
            return Err(ChunkingError::invalid_configuration(
                "max_tokens must be greater than zero",
            ));
        }
        if !(0.0..=1.0).contains(&self.min_similarity) {
            return Err(ChunkingError::invalid_configuration(format!(
                "min_similarity must lie in [0, 1], got {}",
                self.min_similarity
            )));
        }
        Ok(())
    }

    pub fn from_json_str(raw: &str) -> Result<Self, ChunkingError> {
        let options: Self = serde_json::from_str(raw).map_err(|err| {
            ChunkingError::invalid_configuration(format!("malformed chunking options: {err}"))
        })?;
        options.validate()?;
        Ok(options)
    }

    /// Defaults overridden by `SEMANTIC_CHUNKER_*` variables (a `.env` file is honoured).
    pub fn from_env() -> Result<Self, ChunkingError> {
        dotenvy::dotenv().ok();
        Self::default().with_env_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup.
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Result<Self, ChunkingError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(ENV_MAX_TOKENS) {
            self.max_tokens = parse_var(ENV_MAX_TOKENS, &value)?;
        }
        if let Some(value) = lookup(ENV_MIN_SIMILARITY) {
            self.min_similarity = parse_var(ENV_MIN_SIMILARITY, &value)?;
        }
        if let Some(value) = lookup(ENV_OVERLAP) {
            self.overlap = parse_var(ENV_OVERLAP, &value)?;
        }
        if let Some(value) = lookup(ENV_LANGUAGE) {
            self.language = value
                .parse()
                .map_err(|err: String| ChunkingError::invalid_configuration(err))?;
        }
        self.validate()?;
        Ok(self)
    }
}

fn parse_var<T>(key: &str, value: &str) -> Result<T, ChunkingError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    value.trim().parse().map_err(|err: T::Err| {
        ChunkingError::invalid_configuration(format!("{key}={value:?}: {err}"))
    })
}

/// Everything one chunking call needs: the tuning knobs plus the embedding capability.
#[derive(Clone)]
pub struct ChunkingConfig {
    pub options: ChunkingOptions,
    pub embedder: SharedEmbeddingProvider,
}

impl ChunkingConfig {
    pub fn new(embedder: SharedEmbeddingProvider) -> Self {
        Self {
            options: ChunkingOptions::default(),
            embedder,
        }
    }

    pub fn from_provider<P>(provider: P) -> Self
    where
        P: EmbeddingProvider + 'static,
    {
        Self::new(Arc::new(provider))
    }

    pub fn with_options(mut self, options: ChunkingOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_language(mut self, language: LanguageProfile) -> Self {
        self.options.language = language;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.options.max_tokens = max_tokens;
        self
    }

    pub fn with_min_similarity(mut self, min_similarity: f32) -> Self {
        self.options.min_similarity = min_similarity;
        self
    }

    pub fn with_overlap(mut self, overlap: usize) -> Self {
        self.options.overlap = overlap;
        self
    }

    pub fn with_estimator(mut self, estimator: TokenEstimator) -> Self {
        self.options.estimator = estimator;
        self
    }

    pub fn validate(&self) -> Result<(), ChunkingError> {
        self.options.validate()
    }
}

impl fmt::Debug for ChunkingConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChunkingConfig")
            .field("options", &self.options)
            .field("embedder", &self.embedder.identify())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_are_valid() {
        let options = ChunkingOptions::default();
        assert_eq!(options.max_tokens, 200);
        assert_eq!(options.overlap, 0);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn rejects_zero_budget_and_out_of_range_threshold() {
        let zero = ChunkingOptions {
            max_tokens: 0,
            ..ChunkingOptions::default()
        };
        assert!(matches!(
            zero.validate(),
            Err(ChunkingError::InvalidConfiguration { .. })
        ));

        for bad in [-0.1_f32, 1.1, f32::NAN] {
            let options = ChunkingOptions {
                min_similarity: bad,
                ..ChunkingOptions::default()
            };
            assert!(options.validate().is_err(), "{bad} should be rejected");
        }

        for edge in [0.0_f32, 1.0] {
            let options = ChunkingOptions {
                min_similarity: edge,
                ..ChunkingOptions::default()
            };
            assert!(options.validate().is_ok());
        }
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let options =
            ChunkingOptions::from_json_str(r#"{"max_tokens": 64, "language": "vi"}"#).unwrap();
        assert_eq!(options.max_tokens, 64);
        assert_eq!(options.language, LanguageProfile::Vietnamese);
        assert_eq!(options.min_similarity, 0.6);
    }

    #[test]
    fn env_overrides_apply_and_validate() {
        let vars: HashMap<&str, &str> = [
            (ENV_MAX_TOKENS, "120"),
            (ENV_MIN_SIMILARITY, "0.75"),
            (ENV_OVERLAP, "2"),
            (ENV_LANGUAGE, "english"),
        ]
        .into_iter()
        .collect();
        let options = ChunkingOptions::default()
            .with_env_overrides(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(options.max_tokens, 120);
        assert_eq!(options.min_similarity, 0.75);
        assert_eq!(options.overlap, 2);
        assert_eq!(options.language, LanguageProfile::English);

        let broken = ChunkingOptions::default()
            .with_env_overrides(|key| (key == ENV_OVERLAP).then(|| "-1".to_string()));
        assert!(matches!(
            broken,
            Err(ChunkingError::InvalidConfiguration { .. })
        ));
    }
}
