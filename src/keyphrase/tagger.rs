// Part-of-speech tagging behind a swappable trait.
//
// Candidate selection only needs to tell content words (nouns, proper nouns,
// adjectives) from everything else, so the default tagger is a closed-class
// lexicon plus orthographic and suffix rules. A statistical tagger can be
// dropped in behind the PosTagger trait without touching the extractor.

use std::collections::HashSet;
use std::fmt;

use crate::language::Language;

/// Universal Dependencies coarse tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PosTag {
    Noun,
    Propn,
    Adj,
    Verb,
    Adv,
    Det,
    Adp,
    Pron,
    Cconj,
    Sconj,
    Aux,
    Num,
    Part,
    Punct,
    X,
}

impl PosTag {
    pub fn as_str(self) -> &'static str {
        match self {
            PosTag::Noun => "NOUN",
            PosTag::Propn => "PROPN",
            PosTag::Adj => "ADJ",
            PosTag::Verb => "VERB",
            PosTag::Adv => "ADV",
            PosTag::Det => "DET",
            PosTag::Adp => "ADP",
            PosTag::Pron => "PRON",
            PosTag::Cconj => "CCONJ",
            PosTag::Sconj => "SCONJ",
            PosTag::Aux => "AUX",
            PosTag::Num => "NUM",
            PosTag::Part => "PART",
            PosTag::Punct => "PUNCT",
            PosTag::X => "X",
        }
    }
}

impl fmt::Display for PosTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trait for tagging the words of one sentence.
pub trait PosTagger: Send + Sync {
    /// Return one tag per word, in order.
    fn tag(&self, words: &[String]) -> Vec<PosTag>;
}

const EN_DET: &[&str] = &[
    "the", "a", "an", "this", "that", "these", "those", "every", "each", "some", "any", "no",
    "all", "both", "either", "neither", "another", "such", "what", "which", "whose", "several",
    "many", "much", "few", "more", "most", "other",
];
const EN_ADP: &[&str] = &[
    "of", "in", "on", "at", "by", "for", "with", "about", "against", "between", "into",
    "through", "during", "before", "after", "above", "below", "from", "up", "down", "over",
    "under", "across", "along", "among", "around", "behind", "beyond", "near", "per", "toward",
    "towards", "upon", "via", "within", "without", "onto", "off", "out",
];
const EN_PRON: &[&str] = &[
    "i", "you", "he", "she", "it", "we", "they", "me", "him", "her", "us", "them", "my", "your",
    "his", "its", "our", "their", "mine", "yours", "ours", "theirs", "myself", "yourself",
    "himself", "herself", "itself", "ourselves", "themselves", "who", "whom", "something",
    "anything", "nothing", "everything", "someone", "anyone", "everyone", "one",
];
const EN_CCONJ: &[&str] = &["and", "or", "but", "nor", "yet", "so", "plus"];
const EN_SCONJ: &[&str] = &[
    "if", "because", "although", "though", "while", "whereas", "since", "unless", "until",
    "than", "whether", "as", "once", "where", "when", "how", "why",
];
const EN_AUX: &[&str] = &[
    "is", "am", "are", "was", "were", "be", "been", "being", "have", "has", "had", "do", "does",
    "did", "will", "would", "shall", "should", "can", "could", "may", "might", "must",
];
const EN_PART: &[&str] = &["to", "not", "n't", "'s"];
const EN_ADV: &[&str] = &[
    "very", "also", "too", "often", "never", "always", "already", "still", "just", "even",
    "here", "there", "then", "now", "again", "well", "almost", "quite", "rather", "soon",
];
const EN_VERB: &[&str] = &[
    "use", "uses", "make", "makes", "made", "provide", "provides", "include", "includes",
    "show", "shows", "shown", "take", "takes", "took", "taken", "give", "gives", "gave",
    "given", "get", "gets", "got", "find", "finds", "found", "become", "becomes", "became",
    "require", "requires", "allow", "allows", "help", "helps", "remain", "remains", "run",
    "runs", "ran", "keep", "keeps", "kept", "offer", "offers", "need", "needs", "seem",
    "seems", "extract", "extracts", "rank", "ranks", "describe", "describes", "build",
    "builds", "built",
];
const EN_ADJ: &[&str] = &[
    "new", "good", "great", "large", "small", "big", "high", "low", "important", "different",
    "local", "social", "national", "political", "public", "economic", "free", "real", "best",
    "better", "main", "major", "old", "young", "long", "short", "open", "early", "late",
    "full", "strong", "hard", "easy", "simple", "modern", "natural", "fast", "safe", "rich",
    "deep", "common", "general", "specific", "recent", "key", "first", "last", "next",
    "single", "multiple", "global", "human", "nuclear", "solar", "urban", "rural", "digital",
    "academic", "scientific", "electric", "statistical", "neural", "semantic", "linguistic",
];
const EN_ADJ_SUFFIXES: &[&str] = &["ous", "ful", "ive", "able", "ible", "ical", "less", "ish", "ular"];
const DE_ADJ_SUFFIXES: &[&str] = &["ig", "lich", "isch", "bar", "sam", "los", "voll", "haft"];

/// Default tagger: closed-class lexicon, orthography, and suffix rules.
pub struct LexiconTagger {
    language: Language,
    /// Function words for languages without a closed-class lexicon.
    stop_words: HashSet<String>,
}

impl LexiconTagger {
    pub fn new(language: Language) -> Self {
        let stop_words = if language == Language::English {
            HashSet::new()
        } else {
            language.stop_words().into_iter().collect()
        };
        Self {
            language,
            stop_words,
        }
    }

    fn tag_word(&self, word: &str, index: usize, prev: Option<PosTag>) -> PosTag {
        if !word.chars().any(char::is_alphanumeric) {
            return PosTag::Punct;
        }
        if word.chars().all(|c| c.is_ascii_digit() || c == '.' || c == ',') {
            return PosTag::Num;
        }

        let lower = word.to_lowercase();
        let capitalized = word.chars().next().is_some_and(char::is_uppercase);

        match self.language {
            Language::English => tag_english(&lower, capitalized, index, prev),
            Language::German => {
                if self.stop_words.contains(&lower) {
                    PosTag::X
                } else if capitalized {
                    // German capitalizes every noun, so capitalization says
                    // nothing about proper nouns.
                    PosTag::Noun
                } else if DE_ADJ_SUFFIXES.iter().any(|s| lower.ends_with(s)) {
                    PosTag::Adj
                } else {
                    PosTag::Verb
                }
            }
            _ => {
                if self.stop_words.contains(&lower) {
                    PosTag::X
                } else if capitalized && index > 0 {
                    PosTag::Propn
                } else {
                    PosTag::Noun
                }
            }
        }
    }
}

impl PosTagger for LexiconTagger {
    fn tag(&self, words: &[String]) -> Vec<PosTag> {
        let mut tags = Vec::with_capacity(words.len());
        for (i, word) in words.iter().enumerate() {
            let prev = tags.last().copied();
            tags.push(self.tag_word(word, i, prev));
        }
        tags
    }
}

fn tag_english(lower: &str, capitalized: bool, index: usize, prev: Option<PosTag>) -> PosTag {
    let closed = [
        (EN_DET, PosTag::Det),
        (EN_ADP, PosTag::Adp),
        (EN_PRON, PosTag::Pron),
        (EN_CCONJ, PosTag::Cconj),
        (EN_SCONJ, PosTag::Sconj),
        (EN_AUX, PosTag::Aux),
        (EN_PART, PosTag::Part),
        (EN_ADV, PosTag::Adv),
    ];
    for (lexicon, tag) in closed {
        if lexicon.contains(&lower) {
            return tag;
        }
    }

    if capitalized && index > 0 {
        return PosTag::Propn;
    }
    if EN_VERB.contains(&lower) {
        return PosTag::Verb;
    }
    if EN_ADJ.contains(&lower) {
        return PosTag::Adj;
    }

    let len = lower.chars().count();
    if len > 4 && lower.ends_with("ly") {
        return PosTag::Adv;
    }
    if len > 4 && (lower.ends_with("ing") || lower.ends_with("ed")) {
        // "the trained model" / "they trained models"
        return match prev {
            Some(PosTag::Det) | Some(PosTag::Adj) | Some(PosTag::Adp) if lower.ends_with("ed") => {
                PosTag::Adj
            }
            Some(PosTag::Det) | Some(PosTag::Adj) | Some(PosTag::Adp) => PosTag::Noun,
            _ => PosTag::Verb,
        };
    }
    if len > 5 && EN_ADJ_SUFFIXES.iter().any(|s| lower.ends_with(s)) {
        return PosTag::Adj;
    }

    PosTag::Noun
}
