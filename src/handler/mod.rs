// Model lifecycle adapter.
//
// The host constructs one ModelHandler, calls initialize() once with the
// load-time context, then hands it request batches. The model type is the
// artifact prefix found in the model directory and is fixed for the life of
// the handler:
//
//   Uninitialized --initialize ok--> Ready(model)
//   Uninitialized --unknown prefix--> Rejected(prefix)
//
// Any other initialization failure leaves the handler Uninitialized.

pub mod context;
pub mod traits;

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::Serialize;
use tracing::{debug, error, info};

use crate::artifacts::{self, params::ModelParams};
use crate::error::{HandlerError, Result};
use crate::keyphrase::topical_pagerank::TopicalPageRankModel;
use crate::keyphrase::Keyphrase;
use crate::similarity::doc_sim::DocSimModel;
use crate::similarity::table::TextTable;
use context::{Context, RequestEntry};
use traits::ServingModel;

/// The supported model types, named by their artifact prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelKind {
    TopicalPageRank,
    DocSim,
}

impl ModelKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ModelKind::TopicalPageRank => "TopicalPageRank",
            ModelKind::DocSim => "DocSim",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelKind {
    type Err = HandlerError;

    /// Exact, case-sensitive match on the prefix.
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "TopicalPageRank" => Ok(ModelKind::TopicalPageRank),
            "DocSim" => Ok(ModelKind::DocSim),
            other => Err(HandlerError::UnsupportedModel(other.to_string())),
        }
    }
}

/// The loaded artifact plus its bound parameters.
pub enum LoadedModel {
    Ranking(TopicalPageRankModel),
    Similarity(DocSimModel),
}

impl LoadedModel {
    pub fn load(kind: ModelKind, model_path: &Path, params: &ModelParams) -> Result<Self> {
        match kind {
            ModelKind::TopicalPageRank => {
                TopicalPageRankModel::load(model_path, params).map(LoadedModel::Ranking)
            }
            ModelKind::DocSim => DocSimModel::load(model_path, params).map(LoadedModel::Similarity),
        }
    }

    pub fn kind(&self) -> ModelKind {
        match self {
            LoadedModel::Ranking(m) => m.kind(),
            LoadedModel::Similarity(m) => m.kind(),
        }
    }
}

/// Output of `preprocess`, input of `inference`.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelInput {
    Texts(Vec<String>),
    Tables(Vec<TextTable>),
}

/// One result per request, in request order.
///
/// Serializes as a bare JSON array: keyphrase lists of `{phrase, score}` or
/// similarity lists of floats.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ModelOutput {
    Keyphrases(Vec<Vec<Keyphrase>>),
    Similarities(Vec<Vec<f64>>),
}

impl ModelOutput {
    /// Number of per-request results.
    pub fn len(&self) -> usize {
        match self {
            ModelOutput::Keyphrases(v) => v.len(),
            ModelOutput::Similarities(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

enum HandlerState {
    Uninitialized,
    Ready(LoadedModel),
    /// Initialization found a prefix that names no supported model.
    Rejected(String),
}

pub struct ModelHandler {
    state: HandlerState,
}

impl Default for ModelHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelHandler {
    pub fn new() -> Self {
        Self {
            state: HandlerState::Uninitialized,
        }
    }

    /// True once `initialize` has run to completion, successfully or by
    /// rejecting the model type.
    pub fn is_initialized(&self) -> bool {
        !matches!(self.state, HandlerState::Uninitialized)
    }

    /// The loaded model's type, if one is loaded.
    pub fn model_kind(&self) -> Option<ModelKind> {
        match &self.state {
            HandlerState::Ready(model) => Some(model.kind()),
            _ => None,
        }
    }

    pub fn model(&self) -> Option<&LoadedModel> {
        match &self.state {
            HandlerState::Ready(model) => Some(model),
            _ => None,
        }
    }

    /// Locate the artifacts under the context's `model_dir`, bind the
    /// parameters and load the model.
    pub fn initialize(&mut self, context: &Context) -> Result<()> {
        let model_dir = context.model_dir()?;
        let prefix = artifacts::resolve_prefix(&model_dir)?;

        let params_file = artifacts::params_path(&model_dir, &prefix);
        let params = ModelParams::load(&params_file)?;
        debug!(keys = params.as_map().len(), "Loaded model parameters");

        let kind = match prefix.parse::<ModelKind>() {
            Ok(kind) => kind,
            Err(e) => {
                error!(model_type = %prefix, "Model type not supported");
                self.state = HandlerState::Rejected(prefix);
                return Err(e);
            }
        };

        let model_path = artifacts::require_file(artifacts::model_path(&model_dir, &prefix))?;
        let model = LoadedModel::load(kind, &model_path, &params).map_err(|source| {
            error!(model_type = %kind, error = %source, "Model initialization failed");
            HandlerError::InitializationFailure {
                model_type: kind.to_string(),
                source: Box::new(source),
            }
        })?;

        info!(
            model_type = %kind,
            model_path = %model_path.display(),
            "Model handler initialized"
        );
        self.state = HandlerState::Ready(model);
        Ok(())
    }

    fn ready(&self) -> Result<&LoadedModel> {
        match &self.state {
            HandlerState::Ready(model) => Ok(model),
            HandlerState::Rejected(prefix) => Err(HandlerError::UnsupportedModel(prefix.clone())),
            HandlerState::Uninitialized => Err(HandlerError::NotInitialized),
        }
    }

    /// Decode the batch into model input, preserving order.
    pub fn preprocess(&self, batch: &[RequestEntry]) -> Result<ModelInput> {
        match self.ready()? {
            LoadedModel::Ranking(m) => m.preprocess(batch).map(ModelInput::Texts),
            LoadedModel::Similarity(m) => m.preprocess(batch).map(ModelInput::Tables),
        }
    }

    pub fn inference(&self, input: ModelInput) -> Result<ModelOutput> {
        match (self.ready()?, input) {
            (LoadedModel::Ranking(m), ModelInput::Texts(texts)) => {
                m.infer(texts).map(ModelOutput::Keyphrases)
            }
            (LoadedModel::Similarity(m), ModelInput::Tables(tables)) => {
                m.infer(tables).map(ModelOutput::Similarities)
            }
            (model, _) => Err(HandlerError::InputMismatch {
                expected: model.kind(),
            }),
        }
    }

    /// Identity for both supported models.
    pub fn postprocess(&self, output: ModelOutput) -> Result<ModelOutput> {
        match (self.ready()?, output) {
            (LoadedModel::Ranking(m), ModelOutput::Keyphrases(out)) => {
                m.postprocess(out).map(ModelOutput::Keyphrases)
            }
            (LoadedModel::Similarity(m), ModelOutput::Similarities(out)) => {
                m.postprocess(out).map(ModelOutput::Similarities)
            }
            (model, _) => Err(HandlerError::InputMismatch {
                expected: model.kind(),
            }),
        }
    }

    /// Host entry point. Initializes on first use, returns `None` for an
    /// absent or empty batch, otherwise runs the three stages in order.
    pub fn handle(
        &mut self,
        batch: Option<&[RequestEntry]>,
        context: &Context,
    ) -> Result<Option<ModelOutput>> {
        if !self.is_initialized() {
            self.initialize(context)?;
        }

        let batch = match batch {
            Some(batch) if !batch.is_empty() => batch,
            _ => return Ok(None),
        };

        debug!(requests = batch.len(), "Handling batch");
        let input = self.preprocess(batch)?;
        let output = self.inference(input)?;
        self.postprocess(output).map(Some)
    }
}
