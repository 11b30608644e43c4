// TopicalPageRank keyphrase extractor and its serving model.
//
// Pipeline per document, mirroring the usual unsupervised-keyphrase flow:
//   1. load the document (tokenize, tag, normalize)
//   2. select candidates with the chunk grammar
//   3. weight candidates: build the word graph, bias the random walk with
//      each word's topical importance, sum word scores per candidate
//   4. return the n best candidates
//
// The extractor owns only the current document's state. The serving model
// builds a fresh extractor per input text and shares nothing mutable between
// them.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use tracing::{debug, info};

use super::document::{Document, Normalization};
use super::grammar::ChunkGrammar;
use super::graph::WordGraph;
use super::tagger::{LexiconTagger, PosTag, PosTagger};
use super::topic_model::{cosine, TopicModel};
use super::Keyphrase;
use crate::artifacts::params::ModelParams;
use crate::error::{HandlerError, Result};
use crate::handler::context::RequestEntry;
use crate::handler::traits::ServingModel;
use crate::handler::ModelKind;
use crate::language::Language;
use crate::output::truncate_chars;

/// Parts of speech allowed to become graph nodes.
pub const GRAPH_POS: [PosTag; 3] = [PosTag::Noun, PosTag::Propn, PosTag::Adj];

/// Algorithm parameters bound from the params file.
#[derive(Debug, Clone)]
pub struct RankingParams {
    /// Candidate grammar, e.g. "NP: {<ADJ>*<NOUN|PROPN>}".
    pub grammar: ChunkGrammar,
    pub language: Language,
    pub normalization: Normalization,
    /// Co-occurrence window, counting the word itself.
    pub window: usize,
    /// Maximal number of keyphrases returned per document.
    pub max_count: usize,
}

impl RankingParams {
    pub fn from_params(params: &ModelParams) -> Result<Self> {
        let grammar: String = params.require("grammar")?;
        let language: String = params.require("language")?;
        let normalization: Option<String> = params.optional("normalization")?;
        let window: usize = params.require("window")?;
        let max_count: usize = params.require("max_count")?;

        if window == 0 {
            return Err(HandlerError::invalid_param("window", "must be at least 1"));
        }

        Ok(Self {
            grammar: ChunkGrammar::parse(&grammar)?,
            language: language.parse()?,
            normalization: Normalization::from_param(normalization.as_deref())?,
            window,
            max_count,
        })
    }
}

/// A keyphrase candidate, keyed by its normalized (lexical) form.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub lexical_form: Vec<String>,
    /// Every surface form seen, in document order.
    pub surface_forms: Vec<Vec<String>>,
    /// Word offset of each occurrence in the document.
    pub offsets: Vec<usize>,
}

/// Per-document extractor state.
pub struct TopicalPageRank {
    document: Document,
    candidates: Vec<Candidate>,
    weights: Vec<f64>,
}

impl TopicalPageRank {
    /// Step 1: load the input text.
    pub fn load_document(
        text: &str,
        language: Language,
        normalization: Normalization,
        tagger: &dyn PosTagger,
    ) -> Self {
        Self {
            document: Document::load(text, language, normalization, tagger),
            candidates: Vec::new(),
            weights: Vec::new(),
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    /// Step 2: select grammar chunks as candidates.
    ///
    /// Occurrences sharing a lexical form merge into one candidate; candidate
    /// order is order of first occurrence.
    pub fn candidate_selection(&mut self, grammar: &ChunkGrammar) {
        let mut by_form: HashMap<Vec<String>, usize> = HashMap::new();
        let mut candidates: Vec<Candidate> = Vec::new();
        let mut shift = 0;

        for sentence in &self.document.sentences {
            for chunk in grammar.chunk(&sentence.tags) {
                let lexical_form = sentence.stems[chunk.start..chunk.end].to_vec();
                let surface = sentence.words[chunk.start..chunk.end].to_vec();
                let offset = shift + chunk.start;

                match by_form.get(&lexical_form) {
                    Some(&i) => {
                        candidates[i].surface_forms.push(surface);
                        candidates[i].offsets.push(offset);
                    }
                    None => {
                        by_form.insert(lexical_form.clone(), candidates.len());
                        candidates.push(Candidate {
                            lexical_form,
                            surface_forms: vec![surface],
                            offsets: vec![offset],
                        });
                    }
                }
            }
            shift += sentence.len();
        }

        self.candidates = candidates;
        self.weights.clear();
    }

    /// Step 3: weight candidates with a topic-biased random walk.
    ///
    /// `stop_words` are lowercase surface forms excluded from the document's
    /// topic inference.
    pub fn candidate_weighting(
        &mut self,
        window: usize,
        pos: &[PosTag],
        topic_model: &TopicModel,
        stop_words: &HashSet<String>,
    ) {
        let graph = WordGraph::build(self.document.words(), window, pos);

        let topic_words = self.document.sentences.iter().flat_map(|s| {
            s.words
                .iter()
                .zip(&s.stems)
                .zip(&s.tags)
                .filter(move |((word, _), tag)| {
                    **tag != PosTag::Punct && !stop_words.contains(&word.to_lowercase())
                })
                .map(|((_, stem), _)| stem.as_str())
        });
        let theta = topic_model.infer(topic_words);

        let importance = topical_importance(&graph, topic_model, &theta);
        let scores = graph.pagerank(&importance);

        self.weights = self
            .candidates
            .iter()
            .map(|c| {
                c.lexical_form
                    .iter()
                    .map(|w| scores.get(w).copied().unwrap_or(0.0))
                    .sum::<f64>()
            })
            .collect();

        debug!(
            nodes = graph.node_count(),
            candidates = self.candidates.len(),
            "Weighted keyphrase candidates"
        );
    }

    /// Step 4: the `n` highest scored candidates, best first. Equal scores
    /// keep document order.
    pub fn get_n_best(&self, n: usize) -> Vec<Keyphrase> {
        let mut order: Vec<usize> = (0..self.candidates.len().min(self.weights.len())).collect();
        order.sort_by(|&a, &b| {
            self.weights[b]
                .partial_cmp(&self.weights[a])
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        order
            .into_iter()
            .take(n)
            .map(|i| Keyphrase {
                phrase: self.candidates[i].surface_forms[0].join(" ").to_lowercase(),
                score: self.weights[i],
            })
            .collect()
    }
}

/// Cosine similarity between each node's topic distribution and the
/// document's, normalized to sum to one. Out-of-vocabulary nodes take the
/// smallest in-vocabulary value, or 1 when no node is in vocabulary.
fn topical_importance(
    graph: &WordGraph,
    topic_model: &TopicModel,
    theta: &[f64],
) -> HashMap<String, f64> {
    let mut importance: HashMap<String, f64> = graph
        .nodes()
        .filter_map(|w| {
            topic_model
                .word_topics(w)
                .map(|dist| (w.to_string(), cosine(&dist, theta)))
        })
        .collect();

    let default = importance
        .values()
        .copied()
        .fold(f64::INFINITY, f64::min);
    let default = if default.is_finite() { default } else { 1.0 };

    for w in graph.nodes() {
        importance.entry(w.to_string()).or_insert(default);
    }

    let total: f64 = importance.values().sum();
    if total > 0.0 {
        importance.values_mut().for_each(|v| *v /= total);
    }
    importance
}

/// The TopicalPageRank serving model: bound parameters plus the loaded topic
/// model, shared read-only by every request.
pub struct TopicalPageRankModel {
    params: RankingParams,
    topic_model: TopicModel,
    tagger: Box<dyn PosTagger>,
    stop_words: HashSet<String>,
}

impl TopicalPageRankModel {
    /// Bind parameters and load the topic model artifact at `model_path`.
    pub fn load(model_path: &Path, params: &ModelParams) -> Result<Self> {
        let params = RankingParams::from_params(params)?;
        let topic_model = TopicModel::load(model_path)?;
        info!(
            language = %params.language,
            window = params.window,
            max_count = params.max_count,
            topics = topic_model.topic_count(),
            "Loaded TopicalPageRank model"
        );
        Ok(Self::new(params, topic_model))
    }

    pub fn new(params: RankingParams, topic_model: TopicModel) -> Self {
        let tagger = Box::new(LexiconTagger::new(params.language));
        let stop_words = params.language.stop_words().into_iter().collect();
        Self {
            params,
            topic_model,
            tagger,
            stop_words,
        }
    }

    /// Replace the default lexicon tagger.
    pub fn with_tagger(mut self, tagger: Box<dyn PosTagger>) -> Self {
        self.tagger = tagger;
        self
    }

    pub fn params(&self) -> &RankingParams {
        &self.params
    }

    /// Run the full extraction pipeline on one text.
    pub fn extract(&self, text: &str) -> Vec<Keyphrase> {
        let mut extractor = TopicalPageRank::load_document(
            text,
            self.params.language,
            self.params.normalization,
            self.tagger.as_ref(),
        );
        extractor.candidate_selection(&self.params.grammar);
        extractor.candidate_weighting(
            self.params.window,
            &GRAPH_POS,
            &self.topic_model,
            &self.stop_words,
        );
        let keyphrases = extractor.get_n_best(self.params.max_count);

        debug!(
            text_preview = %truncate_chars(text, 50),
            keyphrases = keyphrases.len(),
            "Extracted keyphrases"
        );
        keyphrases
    }
}

impl ServingModel for TopicalPageRankModel {
    type Input = Vec<String>;
    type Output = Vec<Vec<Keyphrase>>;

    fn kind(&self) -> ModelKind {
        ModelKind::TopicalPageRank
    }

    fn preprocess(&self, batch: &[RequestEntry]) -> Result<Self::Input> {
        batch
            .iter()
            .enumerate()
            .map(|(i, entry)| entry.text(i))
            .collect()
    }

    fn infer(&self, input: Self::Input) -> Result<Self::Output> {
        Ok(input.iter().map(|text| self.extract(text)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> RankingParams {
        RankingParams::from_params(
            &ModelParams::from_json(
                r#"{"grammar": "NP: {<ADJ>*<NOUN|PROPN>}", "language": "en",
                    "normalization": "stemming", "window": 10, "max_count": 3}"#,
            )
            .unwrap(),
        )
        .unwrap()
    }

    fn topic_model() -> TopicModel {
        TopicModel::new(
            vec!["graph".into(), "keyphras".into(), "model".into(), "recip".into()],
            vec![vec![30.0, 30.0, 20.0, 1.0], vec![1.0, 1.0, 5.0, 40.0]],
            None,
        )
        .unwrap()
    }

    const TEXT: &str = "Graph models rank keyphrases. A keyphrase extraction model builds a \
        word graph. The random walk over the word graph scores each keyphrase candidate.";

    #[test]
    fn test_params_require_every_key() {
        let err = RankingParams::from_params(
            &ModelParams::from_json(r#"{"grammar": "NP: {<NOUN>}", "language": "en"}"#).unwrap(),
        )
        .unwrap_err();
        assert!(matches!(err, HandlerError::MissingParameter(ref k) if k == "window"));
    }

    #[test]
    fn test_params_reject_zero_window() {
        let err = RankingParams::from_params(
            &ModelParams::from_json(
                r#"{"grammar": "NP: {<NOUN>}", "language": "en", "normalization": null,
                    "window": 0, "max_count": 3}"#,
            )
            .unwrap(),
        )
        .unwrap_err();
        assert!(matches!(err, HandlerError::InvalidParameter { ref key, .. } if key == "window"));
    }

    #[test]
    fn test_candidates_merge_by_lexical_form() {
        let tagger = LexiconTagger::new(Language::English);
        let mut extractor = TopicalPageRank::load_document(
            "Word graphs help. The word graph helps.",
            Language::English,
            Normalization::Stemming,
            &tagger,
        );
        extractor.candidate_selection(&ChunkGrammar::parse("NP: {<NOUN>+}").unwrap());

        let candidates = extractor.candidates();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].lexical_form, vec!["word", "graph"]);
        assert_eq!(candidates[0].surface_forms.len(), 2);
        assert_eq!(candidates[0].offsets, vec![0, 5]);
    }

    #[test]
    fn test_extract_returns_at_most_max_count_sorted() {
        let model = TopicalPageRankModel::new(params(), topic_model());
        let keyphrases = model.extract(TEXT);

        assert!(!keyphrases.is_empty());
        assert!(keyphrases.len() <= 3);
        for pair in keyphrases.windows(2) {
            assert!(pair[0].score >= pair[1].score, "{keyphrases:?}");
        }
        assert!(keyphrases.iter().all(|k| k.phrase == k.phrase.to_lowercase()));
    }

    #[test]
    fn test_topical_words_rank_first() {
        let model = TopicalPageRankModel::new(params(), topic_model());
        let keyphrases = model.extract(TEXT);
        assert!(
            keyphrases[0].phrase.contains("graph") || keyphrases[0].phrase.contains("keyphrase"),
            "unexpected top phrase: {keyphrases:?}"
        );
    }

    #[test]
    fn test_empty_text_yields_nothing() {
        let model = TopicalPageRankModel::new(params(), topic_model());
        assert!(model.extract("").is_empty());
        assert!(model.extract("... !!!").is_empty());
    }

    #[test]
    fn test_importance_defaults_out_of_vocabulary_to_minimum() {
        let graph = WordGraph::build([("graph", PosTag::Noun), ("zebra", PosTag::Noun)], 2, &GRAPH_POS);
        let model = topic_model();
        let theta = vec![0.9, 0.1];
        let importance = topical_importance(&graph, &model, &theta);
        assert!((importance.values().sum::<f64>() - 1.0).abs() < 1e-9);
        // only one node is in vocabulary, so the other copies its value
        assert!((importance["graph"] - importance["zebra"]).abs() < 1e-12);
    }

    #[test]
    fn test_preprocess_rejects_invalid_utf8() {
        let model = TopicalPageRankModel::new(params(), topic_model());
        let batch = vec![RequestEntry::new("fine"), RequestEntry::new(vec![0xffu8, 0xfe])];
        let err = model.preprocess(&batch).unwrap_err();
        assert!(matches!(err, HandlerError::InvalidPayload { index: 1, .. }));
    }
}
