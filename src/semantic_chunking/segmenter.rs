use serde::{Deserialize, Serialize};

#[cfg(feature = "semantic-chunking-segtok")]
use segtok::segmenter::{split_single, SegmentConfig};

use super::types::Sentence;

/// Sentence-boundary rules selected per document language.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LanguageProfile {
    #[serde(alias = "en")]
    English,
    #[serde(alias = "vi")]
    Vietnamese,
    /// Punctuation-only rules that hold for any language.
    #[default]
    #[serde(alias = "multi")]
    Multilingual,
}

impl LanguageProfile {
    /// Characters that may end a sentence.
    pub fn terminals(&self) -> &'static [char] {
        match self {
            LanguageProfile::English | LanguageProfile::Vietnamese => &['.', '!', '?', '…'],
            LanguageProfile::Multilingual => &[
                '.', '!', '?', '…', '。', '！', '？', '؟', '۔', '।',
            ],
        }
    }

    /// Lowercased words whose trailing period never ends a sentence.
    pub fn abbreviations(&self) -> &'static [&'static str] {
        match self {
            LanguageProfile::English => &[
                "mr", "mrs", "ms", "dr", "prof", "sr", "jr", "vs", "etc", "e.g", "i.e", "approx",
                "fig", "inc", "ltd",
            ],
            LanguageProfile::Vietnamese | LanguageProfile::Multilingual => &[],
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            LanguageProfile::English => "english",
            LanguageProfile::Vietnamese => "vietnamese",
            LanguageProfile::Multilingual => "multilingual",
        }
    }
}

impl std::str::FromStr for LanguageProfile {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "english" | "en" => Ok(LanguageProfile::English),
            "vietnamese" | "vi" => Ok(LanguageProfile::Vietnamese),
            "multilingual" | "multi" | "xx" => Ok(LanguageProfile::Multilingual),
            other => Err(format!("unknown language profile `{other}`")),
        }
    }
}

/// Terminals that close a sentence even without trailing whitespace.
const SELF_DELIMITING: &[char] = &['。', '！', '？'];

/// Closing marks that stay attached to the sentence they follow.
const CLOSERS: &[char] = &['"', '\'', ')', ']', '}', '”', '’', '»', '」', '』'];

/// Split text into ordered, trimmed, non-empty sentences.
pub fn split_sentences(text: &str, profile: LanguageProfile) -> Vec<String> {
    if text.trim().is_empty() {
        return Vec::new();
    }
    match profile {
        #[cfg(feature = "semantic-chunking-segtok")]
        LanguageProfile::English => {
            let collected: Vec<String> = split_single(text, SegmentConfig::default())
                .into_iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
            if collected.is_empty() {
                punctuation_split(text, profile)
            } else {
                collected
            }
        }
        _ => punctuation_split(text, profile),
    }
}

/// Segment text and attach positional indices.
pub fn segment(text: &str, profile: LanguageProfile) -> Vec<Sentence> {
    split_sentences(text, profile)
        .into_iter()
        .enumerate()
        .map(|(index, text)| Sentence::new(index, text))
        .collect()
}

fn punctuation_split(text: &str, profile: LanguageProfile) -> Vec<String> {
    let terminals = profile.terminals();
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let mut sentences = Vec::new();
    let mut start = 0usize;
    let mut i = 0usize;

    while i < chars.len() {
        let (pos, ch) = chars[i];
        if !terminals.contains(&ch) {
            i += 1;
            continue;
        }

        let mut j = i;
        let mut self_delimiting = false;
        while j < chars.len() && terminals.contains(&chars[j].1) {
            self_delimiting |= SELF_DELIMITING.contains(&chars[j].1);
            j += 1;
        }
        while j < chars.len() && CLOSERS.contains(&chars[j].1) {
            j += 1;
        }

        let end = chars.get(j).map_or(text.len(), |(offset, _)| *offset);
        let followed_by_space = chars.get(j).map_or(true, |(_, next)| next.is_whitespace());
        let single_period = j == i + 1 && ch == '.';
        let abbreviation = single_period && ends_with_abbreviation(&text[start..pos], profile);

        if (followed_by_space || self_delimiting) && !abbreviation {
            push_trimmed(&text[start..end], &mut sentences);
            start = end;
        }
        i = j;
    }

    push_trimmed(&text[start..], &mut sentences);
    sentences
}

fn ends_with_abbreviation(prefix: &str, profile: LanguageProfile) -> bool {
    let abbreviations = profile.abbreviations();
    if abbreviations.is_empty() {
        return false;
    }
    let word = prefix
        .rsplit(char::is_whitespace)
        .next()
        .unwrap_or("")
        .trim_start_matches(|c: char| !c.is_alphanumeric())
        .to_lowercase();
    !word.is_empty() && abbreviations.contains(&word.as_str())
}

fn push_trimmed(candidate: &str, sentences: &mut Vec<String>) {
    let trimmed = candidate.trim();
    if !trimmed.is_empty() {
        sentences.push(trimmed.to_string());
    }
}
