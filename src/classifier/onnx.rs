use super::Classifier;
use crate::error::PipelineError;
use crate::pipeline::{InputTensor, ProbabilityVector};
use anyhow::{Context, Result};
use ndarray::Axis;
use ort::session::{builder::GraphOptimizationLevel, Session};
use std::path::Path;

/// Digit classifier backed by an ONNX Runtime session.
///
/// The model artifact is loaded once at startup; the session is then invoked
/// once per inference cycle with a batch of one 28x28x1 tensor and expected
/// to produce one score per digit class.
pub struct OnnxClassifier {
    session: Session,
    input_width: u32,
    input_height: u32,
}

impl OnnxClassifier {
    /// Load a classifier from an ONNX model file.
    pub fn new<P: AsRef<Path>>(model_path: P) -> Result<Self> {
        let path = model_path.as_ref();

        tracing::info!("Loading classifier model from {}", path.display());

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(2)?
            .commit_from_file(path)
            .with_context(|| format!("Failed to load model from {}", path.display()))?;

        tracing::info!("Classifier model loaded successfully");

        Ok(Self {
            session,
            input_width: 28,
            input_height: 28,
        })
    }

    fn run_session(&mut self, input: &InputTensor) -> Result<ProbabilityVector> {
        // The model takes NHWC batches; add the batch axis to the (H, W, 1)
        // tensor without copying.
        let batched = input.view().insert_axis(Axis(0));

        let outputs = self
            .session
            .run(ort::inputs![batched]?)
            .context("Failed to run classifier session")?;

        let scores = outputs[0]
            .try_extract_tensor::<f32>()
            .context("Failed to extract classifier output")?;

        // Output shape is (1, 10); flatten the batch of one.
        Ok(scores.iter().copied().collect())
    }
}

impl Classifier for OnnxClassifier {
    fn predict(&mut self, input: &InputTensor) -> Result<ProbabilityVector, PipelineError> {
        let _span = tracing::debug_span!("inference").entered();
        self.run_session(input)
            .map_err(PipelineError::InferenceUnavailable)
    }

    fn input_size(&self) -> (u32, u32) {
        (self.input_width, self.input_height)
    }
}
