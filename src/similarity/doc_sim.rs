// DocSim serving model: pairwise document similarity over word vectors.
//
// Each request is a table of text pairs. Both texts of a row are tokenized,
// stripped of stop words and out-of-vocabulary tokens, and compared by the
// cosine of their mean word vectors. One similarity per row, rows in order.

use std::path::Path;

use tracing::{debug, info};

use super::preprocess::{simple_preprocess, Stoplist};
use super::table::TextTable;
use super::vectors::KeyedVectors;
use crate::artifacts::params::ModelParams;
use crate::error::{HandlerError, Result};
use crate::handler::context::RequestEntry;
use crate::handler::traits::ServingModel;
use crate::handler::ModelKind;
use crate::language::Language;

/// Parameters bound from the params file. All optional.
#[derive(Debug, Clone, Default)]
pub struct SimilarityParams {
    /// Stop-word language, English unless set.
    pub language: Language,
}

impl SimilarityParams {
    pub fn from_params(params: &ModelParams) -> Result<Self> {
        let language = match params.optional::<String>("language")? {
            Some(code) => code.parse()?,
            None => Language::default(),
        };
        Ok(Self { language })
    }
}

pub struct DocSimModel {
    params: SimilarityParams,
    vectors: KeyedVectors,
    stoplist: Stoplist,
}

impl DocSimModel {
    /// Bind parameters and load the word vectors at `model_path`.
    pub fn load(model_path: &Path, params: &ModelParams) -> Result<Self> {
        let params = SimilarityParams::from_params(params)?;
        let vectors = KeyedVectors::load(model_path)?;
        if vectors.is_empty() {
            return Err(HandlerError::invalid_artifact(model_path, "no word vectors"));
        }
        info!(
            language = %params.language,
            words = vectors.len(),
            dim = vectors.dim(),
            "Loaded DocSim model"
        );
        Ok(Self::new(params, vectors))
    }

    pub fn new(params: SimilarityParams, vectors: KeyedVectors) -> Self {
        let stoplist = Stoplist::new(params.language);
        Self {
            params,
            vectors,
            stoplist,
        }
    }

    pub fn params(&self) -> &SimilarityParams {
        &self.params
    }

    pub fn vectors(&self) -> &KeyedVectors {
        &self.vectors
    }

    /// Tokens of `text` that survive the stoplist and exist in the vocabulary.
    pub fn filter_tokens(&self, text: &str) -> Vec<String> {
        simple_preprocess(text)
            .into_iter()
            .filter(|w| !self.stoplist.contains(w) && self.vectors.contains(w))
            .collect()
    }

    /// Similarities for every row of one table. `table_index` is reported
    /// when a row has an empty side.
    pub fn compare(&self, table: &TextTable, table_index: usize) -> Result<Vec<f64>> {
        table
            .rows
            .iter()
            .enumerate()
            .map(|(row, pair)| {
                let words1 = self.filter_tokens(&pair.first);
                let words2 = self.filter_tokens(&pair.second);
                self.vectors
                    .n_similarity(&words1, &words2)
                    .ok_or(HandlerError::EmptyDocument {
                        table: table_index,
                        row,
                    })
            })
            .collect()
    }
}

impl ServingModel for DocSimModel {
    type Input = Vec<TextTable>;
    type Output = Vec<Vec<f64>>;

    fn kind(&self) -> ModelKind {
        ModelKind::DocSim
    }

    fn preprocess(&self, batch: &[RequestEntry]) -> Result<Self::Input> {
        batch
            .iter()
            .enumerate()
            .map(|(i, entry)| TextTable::parse(&entry.text(i)?, i))
            .collect()
    }

    fn infer(&self, input: Self::Input) -> Result<Self::Output> {
        let output = input
            .iter()
            .enumerate()
            .map(|(i, table)| self.compare(table, i))
            .collect::<Result<Vec<_>>>()?;
        debug!(tables = output.len(), "Computed similarities");
        Ok(output)
    }
}
