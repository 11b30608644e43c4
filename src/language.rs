// Language codes accepted in model params, and the per-language resources
// (stop words, Snowball stemmer) that hang off them.

use std::fmt;
use std::str::FromStr;

use rust_stemmers::Algorithm;
use stop_words::LANGUAGE;

use crate::error::HandlerError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Language {
    #[default]
    English,
    German,
    French,
    Spanish,
    Italian,
    Portuguese,
    Dutch,
}

impl Language {
    /// Stop words for this language from the `stop-words` crate.
    pub fn stop_words(self) -> Vec<String> {
        let lang = match self {
            Language::English => LANGUAGE::English,
            Language::German => LANGUAGE::German,
            Language::French => LANGUAGE::French,
            Language::Spanish => LANGUAGE::Spanish,
            Language::Italian => LANGUAGE::Italian,
            Language::Portuguese => LANGUAGE::Portuguese,
            Language::Dutch => LANGUAGE::Dutch,
        };
        stop_words::get(lang)
    }

    /// Snowball algorithm used for `"stemming"` normalization.
    pub fn stemmer(self) -> Algorithm {
        match self {
            Language::English => Algorithm::English,
            Language::German => Algorithm::German,
            Language::French => Algorithm::French,
            Language::Spanish => Algorithm::Spanish,
            Language::Italian => Algorithm::Italian,
            Language::Portuguese => Algorithm::Portuguese,
            Language::Dutch => Algorithm::Dutch,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Language::English => "en",
            Language::German => "de",
            Language::French => "fr",
            Language::Spanish => "es",
            Language::Italian => "it",
            Language::Portuguese => "pt",
            Language::Dutch => "nl",
        }
    }
}

impl FromStr for Language {
    type Err = HandlerError;

    /// Accepts both ISO 639-1 codes ("de") and NLTK-style names ("german").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "en" | "english" => Ok(Language::English),
            "de" | "german" => Ok(Language::German),
            "fr" | "french" => Ok(Language::French),
            "es" | "spanish" => Ok(Language::Spanish),
            "it" | "italian" => Ok(Language::Italian),
            "pt" | "portuguese" => Ok(Language::Portuguese),
            "nl" | "dutch" => Ok(Language::Dutch),
            other => Err(HandlerError::invalid_param(
                "language",
                format!("unsupported language {other:?}"),
            )),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_and_names_agree() {
        assert_eq!("en".parse::<Language>().unwrap(), Language::English);
        assert_eq!("English".parse::<Language>().unwrap(), Language::English);
        assert_eq!("de".parse::<Language>().unwrap(), Language::German);
        assert_eq!("german".parse::<Language>().unwrap(), Language::German);
    }

    #[test]
    fn test_unknown_language_is_invalid_param() {
        let err = "klingon".parse::<Language>().unwrap_err();
        assert!(matches!(err, HandlerError::InvalidParameter { .. }));
    }

    #[test]
    fn test_english_stop_words_cover_articles() {
        let words = Language::English.stop_words();
        assert!(words.iter().any(|w| w == "the"));
        assert!(words.iter().any(|w| w == "and"));
    }
}
