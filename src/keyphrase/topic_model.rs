// LDA topic model used to bias the PageRank random walk.
//
// The artifact is a JSON document holding the vocabulary (normalized words,
// i.e. stems when the model was trained on stemmed text), the topic-word
// pseudo-counts (one row per topic, strictly positive), and the document
// topic prior. A new document's topic mixture is inferred by variational
// folding-in against the fixed topic-word distributions.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::error::{HandlerError, Result};

const MAX_FOLDING_ITERATIONS: usize = 100;
const FOLDING_TOLERANCE: f64 = 1e-3;

#[derive(Debug, Deserialize)]
struct TopicModelFile {
    vocabulary: Vec<String>,
    components: Vec<Vec<f64>>,
    /// Defaults to 1 / number of topics.
    #[serde(default)]
    doc_topic_prior: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct TopicModel {
    index: HashMap<String, usize>,
    /// P(word | topic): components normalized per topic.
    distributions: Vec<Vec<f64>>,
    /// exp(E[log P(word | topic)]) under the Dirichlet posterior.
    exp_topic_word: Vec<Vec<f64>>,
    doc_topic_prior: f64,
}

impl TopicModel {
    /// Read a topic model artifact from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let model = Self::from_json(&raw)
            .map_err(|e| HandlerError::invalid_artifact(path, e.to_string()))?;
        debug!(
            path = %path.display(),
            topics = model.topic_count(),
            vocabulary = model.vocabulary_size(),
            "Loaded topic model"
        );
        Ok(model)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let file: TopicModelFile = serde_json::from_str(raw)?;
        Self::new(file.vocabulary, file.components, file.doc_topic_prior)
    }

    pub fn new(
        vocabulary: Vec<String>,
        components: Vec<Vec<f64>>,
        doc_topic_prior: Option<f64>,
    ) -> Result<Self> {
        let v = vocabulary.len();
        if components.is_empty() || v == 0 {
            return Err(model_error("topic model needs at least one topic and one word"));
        }
        for (k, row) in components.iter().enumerate() {
            if row.len() != v {
                return Err(model_error(&format!(
                    "topic {k} has {} weights for {v} vocabulary words",
                    row.len()
                )));
            }
            if row.iter().any(|&x| x <= 0.0 || !x.is_finite()) {
                return Err(model_error(&format!(
                    "topic {k} has non-positive or non-finite weights"
                )));
            }
        }

        let k = components.len();
        let doc_topic_prior = doc_topic_prior.unwrap_or(1.0 / k as f64);
        if doc_topic_prior <= 0.0 || !doc_topic_prior.is_finite() {
            return Err(model_error("doc_topic_prior must be positive"));
        }

        let distributions: Vec<Vec<f64>> = components
            .iter()
            .map(|row| {
                let total: f64 = row.iter().sum();
                row.iter().map(|x| x / total).collect()
            })
            .collect();

        let exp_topic_word: Vec<Vec<f64>> = components
            .iter()
            .map(|row| {
                let psi_total = digamma(row.iter().sum());
                row.iter().map(|&x| (digamma(x) - psi_total).exp()).collect()
            })
            .collect();

        let index: HashMap<String, usize> = vocabulary
            .into_iter()
            .enumerate()
            .map(|(i, w)| (w, i))
            .collect();

        Ok(Self {
            index,
            distributions,
            exp_topic_word,
            doc_topic_prior,
        })
    }

    pub fn topic_count(&self) -> usize {
        self.distributions.len()
    }

    pub fn vocabulary_size(&self) -> usize {
        self.index.len()
    }

    /// P(word | topic) for every topic, or `None` out of vocabulary.
    pub fn word_topics(&self, word: &str) -> Option<Vec<f64>> {
        let &i = self.index.get(word)?;
        Some(self.distributions.iter().map(|row| row[i]).collect())
    }

    /// Infer the topic mixture of a document from its word counts.
    ///
    /// Out-of-vocabulary words are ignored; a document with no known words
    /// gets the prior mean, which is uniform.
    pub fn infer<'a, I>(&self, words: I) -> Vec<f64>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut counts: HashMap<usize, f64> = HashMap::new();
        for word in words {
            if let Some(&i) = self.index.get(word) {
                *counts.entry(i).or_insert(0.0) += 1.0;
            }
        }

        let k = self.topic_count();
        let alpha = self.doc_topic_prior;
        let mut gamma = vec![1.0; k];

        if counts.is_empty() {
            return vec![1.0 / k as f64; k];
        }

        for _ in 0..MAX_FOLDING_ITERATIONS {
            let psi_total = digamma(gamma.iter().sum());
            let exp_doc_topic: Vec<f64> =
                gamma.iter().map(|&g| (digamma(g) - psi_total).exp()).collect();

            let mut next = vec![0.0; k];
            for (&w, &count) in &counts {
                let norm: f64 = (0..k)
                    .map(|t| exp_doc_topic[t] * self.exp_topic_word[t][w])
                    .sum::<f64>()
                    + f64::EPSILON;
                for t in 0..k {
                    next[t] += count * exp_doc_topic[t] * self.exp_topic_word[t][w] / norm;
                }
            }
            for g in &mut next {
                *g += alpha;
            }

            let change = next
                .iter()
                .zip(&gamma)
                .map(|(a, b)| (a - b).abs())
                .sum::<f64>()
                / k as f64;
            gamma = next;
            if change < FOLDING_TOLERANCE {
                break;
            }
        }

        let total: f64 = gamma.iter().sum();
        gamma.into_iter().map(|g| g / total).collect()
    }
}

fn model_error(reason: &str) -> HandlerError {
    HandlerError::invalid_param("topic model", reason)
}

/// Digamma function for positive arguments: recurrence up to x >= 6, then
/// the asymptotic series.
pub(crate) fn digamma(mut x: f64) -> f64 {
    let mut result = 0.0;
    while x < 6.0 {
        result -= 1.0 / x;
        x += 1.0;
    }
    let f = 1.0 / (x * x);
    result + x.ln()
        - 0.5 / x
        - f * (1.0 / 12.0 - f * (1.0 / 120.0 - f * (1.0 / 252.0 - f * (1.0 / 240.0 - f / 132.0))))
}

/// Cosine similarity of two equal-length vectors; 0.0 when either is zero.
pub fn cosine(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let mag_a = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let mag_b = b.iter().map(|x| x * x).sum::<f64>().sqrt();
    let denom = mag_a * mag_b;
    if denom < f64::EPSILON {
        0.0
    } else {
        dot / denom
    }
}
