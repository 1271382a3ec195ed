use thiserror::Error;

/// Error kinds produced inside one inference cycle.
///
/// None of these are fatal: the cycle controller handles all of them locally
/// by aborting the current cycle and retrying on the next tick, leaving the
/// last successfully published prediction on screen.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The snapshot buffer does not describe a positive-area RGBA rectangle.
    /// Indicates an integration bug in the caller, not user error.
    #[error("invalid tile shape: {width}x{height} with {len} bytes")]
    InvalidTileShape { width: u32, height: u32, len: usize },

    /// The classifier returned something other than 10 non-negative finite
    /// values. Indicates a service contract violation.
    #[error("malformed probability distribution: {reason}")]
    InvalidDistributionShape { reason: String },

    /// The classifier invocation itself failed.
    #[error("classifier unavailable")]
    InferenceUnavailable(#[source] anyhow::Error),
}
