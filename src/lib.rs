// nlp-endpoint: model-serving handler for keyphrase extraction and document
// similarity.
//
// This is the library root. `handler` is the lifecycle adapter a serving host
// drives; `keyphrase` and `similarity` are the two algorithms it dispatches
// to; `artifacts` finds and reads what sits in the model directory.

pub mod artifacts;
pub mod config;
pub mod error;
pub mod handler;
pub mod keyphrase;
pub mod language;
pub mod output;
pub mod similarity;

pub use error::{HandlerError, Result};
pub use handler::context::{Context, RequestEntry};
pub use handler::{ModelHandler, ModelKind, ModelOutput};
