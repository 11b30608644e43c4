// Serving model trait: the per-algorithm half of the request lifecycle.
//
// Each supported model type implements this once. The handler picks the
// implementation at initialization and dispatches to it statically from then
// on, so no stage ever re-checks the model type string.

use super::context::RequestEntry;
use super::ModelKind;
use crate::error::Result;

pub trait ServingModel: Send + Sync {
    /// What `preprocess` produces and `infer` consumes.
    type Input;
    /// What `infer` produces and `postprocess` returns.
    type Output;

    fn kind(&self) -> ModelKind;

    /// Turn raw request payloads into model input, preserving order.
    fn preprocess(&self, batch: &[RequestEntry]) -> Result<Self::Input>;

    /// Run the algorithm over the whole batch.
    fn infer(&self, input: Self::Input) -> Result<Self::Output>;

    /// Shape the output for the host. Identity unless overridden.
    fn postprocess(&self, output: Self::Output) -> Result<Self::Output> {
        Ok(output)
    }

    /// preprocess, infer, postprocess in order.
    fn run(&self, batch: &[RequestEntry]) -> Result<Self::Output> {
        let input = self.preprocess(batch)?;
        let output = self.infer(input)?;
        self.postprocess(output)
    }
}
