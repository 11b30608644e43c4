// Unit tests for the similarity module.
//
// Tests word-vector loading from disk in both layouts, the tokenizer's
// boundary behavior, and DocSimModel over parsed tables.

use std::io::Write;

use nlp_endpoint::artifacts::params::ModelParams;
use nlp_endpoint::similarity::doc_sim::{DocSimModel, SimilarityParams};
use nlp_endpoint::similarity::preprocess::{simple_preprocess, Stoplist};
use nlp_endpoint::similarity::table::TextTable;
use nlp_endpoint::similarity::vectors::KeyedVectors;
use nlp_endpoint::language::Language;
use nlp_endpoint::HandlerError;

const WORDS: [(&str, [f32; 3]); 4] = [
    ("hund", [1.0, 0.0, 0.0]),
    ("katze", [0.8, 0.2, 0.0]),
    ("auto", [0.0, 0.0, 1.0]),
    ("motor", [0.0, 0.3, 0.9]),
];

fn text_file() -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "{} 3", WORDS.len()).unwrap();
    for (word, v) in WORDS {
        writeln!(file, "{word} {} {} {}", v[0], v[1], v[2]).unwrap();
    }
    file
}

fn binary_file() -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "{} 3", WORDS.len()).unwrap();
    for (word, v) in WORDS {
        file.write_all(word.as_bytes()).unwrap();
        file.write_all(b" ").unwrap();
        for x in v {
            file.write_all(&x.to_le_bytes()).unwrap();
        }
    }
    file
}

// ============================================================
// KeyedVectors::load
// ============================================================

#[test]
fn load_text_and_binary_agree() {
    let text = KeyedVectors::load(text_file().path()).unwrap();
    let binary = KeyedVectors::load(binary_file().path()).unwrap();

    assert_eq!(text.len(), 4);
    assert_eq!(binary.len(), 4);
    for (word, v) in WORDS {
        assert_eq!(text.get(word), Some(&v[..]), "text {word}");
        assert_eq!(binary.get(word), Some(&v[..]), "binary {word}");
    }
}

#[test]
fn load_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = KeyedVectors::load(&dir.path().join("nope")).unwrap_err();
    assert!(matches!(err, HandlerError::Io(_)));
}

#[test]
fn load_garbage_is_invalid_artifact() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "two three").unwrap();
    let err = KeyedVectors::load(file.path()).unwrap_err();
    assert!(matches!(err, HandlerError::InvalidArtifact { .. }));
}

// ============================================================
// simple_preprocess edge cases
// ============================================================

#[test]
fn preprocess_empty_and_symbol_only_text() {
    assert!(simple_preprocess("").is_empty());
    assert!(simple_preprocess("!!! 123 ... a").is_empty());
}

#[test]
fn preprocess_keeps_order_and_duplicates() {
    assert_eq!(
        simple_preprocess("Dog bites dog"),
        vec!["dog", "bites", "dog"]
    );
}

// ============================================================
// DocSimModel
// ============================================================

fn german_model() -> DocSimModel {
    let params = ModelParams::from_json(r#"{"language": "de"}"#).unwrap();
    DocSimModel::load(text_file().path(), &params).unwrap()
}

#[test]
fn load_binds_language() {
    let model = german_model();
    assert_eq!(model.params().language, Language::German);
    assert_eq!(model.vectors().dim(), 3);
}

#[test]
fn german_stop_words_are_removed() {
    let model = german_model();
    assert_eq!(model.filter_tokens("Der Hund und die Katze"), vec!["hund", "katze"]);
}

#[test]
fn symmetric_and_bounded() {
    let model = german_model();
    let table = TextTable::from_pairs([("hund", "auto motor"), ("auto motor", "hund")]);
    let sims = model.compare(&table, 0).unwrap();
    assert!((sims[0] - sims[1]).abs() < 1e-12);
    assert!(sims.iter().all(|s| (-1.0..=1.0 + 1e-9).contains(s)));
}

#[test]
fn word_order_does_not_matter() {
    let model = german_model();
    let table = TextTable::from_pairs([("Hund und Katze", "die Katze, der Hund")]);
    let sims = model.compare(&table, 0).unwrap();
    assert!((sims[0] - 1.0).abs() < 1e-9);
}

#[test]
fn english_stoplist_by_default() {
    let vectors = KeyedVectors::load(text_file().path()).unwrap();
    let model = DocSimModel::new(SimilarityParams::default(), vectors);
    assert_eq!(model.params().language, Language::English);
    assert!(Stoplist::new(Language::English).contains("and"));
}
