use crate::error::PipelineError;
use crate::pipeline::types::{PredictionResult, DIGIT_CLASSES};

/// Derive the display-ready result from a classifier distribution.
///
/// The winning class is the running maximum over positions 0..9, updated only
/// on strictly greater values, so exact ties resolve to the lowest index.
/// This tie-break is deliberate and must stay stable for reproducibility.
pub fn interpret(distribution: &[f32]) -> Result<PredictionResult, PipelineError> {
    if distribution.len() != DIGIT_CLASSES {
        return Err(PipelineError::InvalidDistributionShape {
            reason: format!(
                "expected {} classes, got {}",
                DIGIT_CLASSES,
                distribution.len()
            ),
        });
    }
    if let Some(bad) = distribution.iter().find(|p| !p.is_finite() || **p < 0.0) {
        return Err(PipelineError::InvalidDistributionShape {
            reason: format!("probability out of range: {bad}"),
        });
    }

    let mut digit = 0usize;
    let mut best = f32::NEG_INFINITY;
    for (i, &p) in distribution.iter().enumerate() {
        if p > best {
            digit = i;
            best = p;
        }
    }

    Ok(PredictionResult {
        digit: digit as u8,
        distribution: distribution.to_vec(),
    })
}
