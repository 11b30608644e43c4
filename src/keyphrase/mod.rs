// Keyphrase extraction with TopicalPageRank.

pub mod document;
pub mod grammar;
pub mod graph;
pub mod tagger;
pub mod topic_model;
pub mod topical_pagerank;

use serde::{Deserialize, Serialize};

/// A ranked keyphrase: lowercased surface form and its graph score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keyphrase {
    pub phrase: String,
    pub score: f64,
}
