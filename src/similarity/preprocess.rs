// Tokenization and stop-word filtering for document similarity.

use std::collections::HashSet;

use crate::language::Language;

/// Shortest token kept by `simple_preprocess`, in characters.
pub const MIN_TOKEN_LEN: usize = 2;
/// Longest token kept by `simple_preprocess`, in characters.
pub const MAX_TOKEN_LEN: usize = 15;

const PUNCTUATION: &str = r##"!"#$%&'()*+,-./:;<=>?@[\]^_`{|}~"##;

/// Lowercase `text` and split it into runs of word characters that are not
/// digits. Tokens shorter than 2 or longer than 15 characters, or starting
/// with `_`, are dropped.
pub fn simple_preprocess(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    let mut tokens = Vec::new();
    let mut current = String::new();

    for c in lowered.chars() {
        if is_token_char(c) {
            current.push(c);
        } else if !current.is_empty() {
            push_token(&mut tokens, std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        push_token(&mut tokens, current);
    }
    tokens
}

fn is_token_char(c: char) -> bool {
    (c.is_alphanumeric() || c == '_') && !c.is_numeric()
}

fn push_token(tokens: &mut Vec<String>, token: String) {
    let len = token.chars().count();
    if (MIN_TOKEN_LEN..=MAX_TOKEN_LEN).contains(&len) && !token.starts_with('_') {
        tokens.push(token);
    }
}

/// ASCII punctuation plus the language's stop words.
#[derive(Debug, Clone)]
pub struct Stoplist {
    words: HashSet<String>,
}

impl Stoplist {
    pub fn new(language: Language) -> Self {
        let mut words: HashSet<String> = language.stop_words().into_iter().collect();
        words.extend(PUNCTUATION.chars().map(String::from));
        Self { words }
    }

    pub fn contains(&self, token: &str) -> bool {
        self.words.contains(token)
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}
