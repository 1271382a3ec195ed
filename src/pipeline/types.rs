use ndarray::Array3;

/// Number of digit classes the classifier distinguishes.
pub const DIGIT_CLASSES: usize = 10;

/// Normalized classifier input: (height, width, 1) ink-density values in
/// [0, 255], where 0 is blank background and 255 is full ink.
pub type InputTensor = Array3<f32>;

/// Per-class confidence scores, one entry per digit 0-9.
/// Produced by a softmax head, so in practice it sums to ~1.0, but the
/// pipeline does not rely on that.
pub type ProbabilityVector = Vec<f32>;

/// Display-ready outcome of one inference cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionResult {
    /// Winning digit class, ties broken toward the lowest index.
    pub digit: u8,
    pub distribution: ProbabilityVector,
}
