// Document loading: sentence splitting, tokenization, tagging, normalization.
//
// A loaded Document is the only per-request state of the extractor. Every
// sentence keeps three parallel vectors (surface words, POS tags, normalized
// forms) so candidates can be reported in surface form but keyed by stem.

use std::str::FromStr;

use rust_stemmers::Stemmer;

use super::tagger::{PosTag, PosTagger};
use crate::error::HandlerError;
use crate::language::Language;

/// Word normalization applied before graph construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Normalization {
    /// Lowercased Snowball stem.
    #[default]
    Stemming,
    /// Lowercase only.
    None,
}

impl Normalization {
    /// Interpret the `normalization` parameter. JSON `null` maps to `None`.
    pub fn from_param(value: Option<&str>) -> Result<Self, HandlerError> {
        match value {
            None => Ok(Normalization::None),
            Some(s) => s.parse(),
        }
    }
}

impl FromStr for Normalization {
    type Err = HandlerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "stemming" => Ok(Normalization::Stemming),
            "none" | "" => Ok(Normalization::None),
            other => Err(HandlerError::invalid_param(
                "normalization",
                format!("expected \"stemming\" or null, found {other:?}"),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sentence {
    pub words: Vec<String>,
    pub tags: Vec<PosTag>,
    /// Normalized form of each word (stem or lowercase).
    pub stems: Vec<String>,
}

impl Sentence {
    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub language: Language,
    pub sentences: Vec<Sentence>,
}

impl Document {
    pub fn load(
        text: &str,
        language: Language,
        normalization: Normalization,
        tagger: &dyn PosTagger,
    ) -> Self {
        let stemmer = match normalization {
            Normalization::Stemming => Some(Stemmer::create(language.stemmer())),
            Normalization::None => None,
        };

        let sentences = split_sentences(&tokenize(text))
            .into_iter()
            .map(|words| {
                let tags = tagger.tag(&words);
                let stems = words
                    .iter()
                    .map(|w| {
                        let lower = w.to_lowercase();
                        match &stemmer {
                            Some(s) => s.stem(&lower).into_owned(),
                            None => lower,
                        }
                    })
                    .collect();
                Sentence { words, tags, stems }
            })
            .collect();

        Self {
            language,
            sentences,
        }
    }

    /// Every (normalized word, tag) pair in document order.
    pub fn words(&self) -> impl Iterator<Item = (&str, PosTag)> + '_ {
        self.sentences.iter().flat_map(|s| {
            s.stems
                .iter()
                .zip(s.tags.iter())
                .map(|(stem, tag)| (stem.as_str(), *tag))
        })
    }

    pub fn word_count(&self) -> usize {
        self.sentences.iter().map(Sentence::len).sum()
    }
}

/// Split text into word and punctuation tokens.
///
/// Hyphens and apostrophes stay inside a word when both neighbours are
/// alphanumeric; `.` and `,` stay inside numbers.
pub fn tokenize(text: &str) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let mut tokens = Vec::new();
    let mut current = String::new();

    for (i, &c) in chars.iter().enumerate() {
        let next = chars.get(i + 1).copied();
        let prev = current.chars().last();

        let joins = match c {
            '-' | '\'' | '\u{2019}' => {
                prev.is_some_and(char::is_alphanumeric) && next.is_some_and(char::is_alphanumeric)
            }
            '.' | ',' => {
                prev.is_some_and(|p| p.is_ascii_digit()) && next.is_some_and(|n| n.is_ascii_digit())
            }
            _ => false,
        };

        if c.is_alphanumeric() || joins {
            current.push(c);
            continue;
        }

        if !current.is_empty() {
            tokens.push(std::mem::take(&mut current));
        }
        if !c.is_whitespace() {
            tokens.push(c.to_string());
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }

    tokens
}

/// Group tokens into sentences ending at `.`, `!` or `?`.
fn split_sentences(tokens: &[String]) -> Vec<Vec<String>> {
    let mut sentences = Vec::new();
    let mut current = Vec::new();

    for token in tokens {
        current.push(token.clone());
        if matches!(token.as_str(), "." | "!" | "?") {
            sentences.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        sentences.push(current);
    }

    sentences
}
