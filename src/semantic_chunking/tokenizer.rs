use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

#[cfg(feature = "semantic-chunking-tiktoken")]
use tiktoken_rs::CoreBPE;

/// Token accounting policy used to budget chunks.
///
/// `WordRuns` is a coarse proxy (one token per run of word characters).
/// When parity with a real subword tokenizer matters, swap in `Cl100k`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenEstimator {
    #[default]
    WordRuns,
    #[cfg(feature = "semantic-chunking-tiktoken")]
    Cl100k,
}

impl TokenEstimator {
    pub fn estimate(&self, text: &str) -> usize {
        match self {
            TokenEstimator::WordRuns => count(text),
            #[cfg(feature = "semantic-chunking-tiktoken")]
            TokenEstimator::Cl100k => match encoder() {
                Some(encoder) => encoder.encode_with_special_tokens(text).len(),
                None => count(text),
            },
        }
    }

    pub fn batch_estimate<'a, I>(&self, texts: I) -> Vec<usize>
    where
        I: IntoIterator<Item = &'a str>,
    {
        texts.into_iter().map(|text| self.estimate(text)).collect()
    }
}

/// Count maximal runs of Unicode word characters, ignoring punctuation and whitespace.
pub fn count(text: &str) -> usize {
    if text.trim().is_empty() {
        return 0;
    }
    word_runs().find_iter(text).count()
}

/// Compute word-run counts for a batch of strings.
pub fn batch_count<'a, I>(texts: I) -> Vec<usize>
where
    I: IntoIterator<Item = &'a str>,
{
    texts.into_iter().map(count).collect()
}

fn word_runs() -> &'static Regex {
    static WORD_RUNS: OnceLock<Regex> = OnceLock::new();
    WORD_RUNS.get_or_init(|| Regex::new(r"\w+").expect("valid word regex"))
}

#[cfg(feature = "semantic-chunking-tiktoken")]
fn encoder() -> Option<&'static CoreBPE> {
    static ENCODER: OnceLock<Option<CoreBPE>> = OnceLock::new();
    ENCODER
        .get_or_init(|| tiktoken_rs::cl100k_base().ok())
        .as_ref()
}
