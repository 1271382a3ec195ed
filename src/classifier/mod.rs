mod onnx;

pub use onnx::OnnxClassifier;

use crate::error::PipelineError;
use crate::pipeline::{InputTensor, ProbabilityVector};
use anyhow::Result;

/// Trait for digit classifiers.
/// Allows swapping inference backends and stubbing the service in tests.
pub trait Classifier: Send {
    /// Run inference on one input tensor and return the per-class scores.
    ///
    /// Assumed stateless and safe to call repeatedly; failures surface as
    /// `PipelineError::InferenceUnavailable` and are retried by the caller.
    fn predict(&mut self, input: &InputTensor) -> Result<ProbabilityVector, PipelineError>;

    /// The spatial resolution (width, height) the model expects.
    fn input_size(&self) -> (u32, u32);
}

/// Create the default classifier backend (ONNX Runtime).
pub fn create_default_classifier(model_path: &str) -> Result<Box<dyn Classifier>> {
    let classifier = OnnxClassifier::new(model_path)?;
    Ok(Box::new(classifier))
}
