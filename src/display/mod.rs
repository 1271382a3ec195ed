use crate::pipeline::PredictionResult;
use anyhow::Result;

/// Trait for prediction displays.
///
/// Sinks are invoked at up to the tick rate and must return quickly; a slow
/// sink delays the next inference cycle, never the drawing side.
pub trait ResultSink: Send {
    /// Show the outcome of one successful inference cycle.
    fn publish(&mut self, result: &PredictionResult) -> Result<()>;

    /// Show the neutral state (no prediction yet, or surface was reset).
    fn clear(&mut self) -> Result<()>;
}

/// Terminal display: logs the winning digit and optionally prints an ASCII
/// bar chart of the full distribution.
pub struct TerminalSink {
    show_chart: bool,
}

impl TerminalSink {
    pub fn new(show_chart: bool) -> Self {
        Self { show_chart }
    }
}

impl ResultSink for TerminalSink {
    fn publish(&mut self, result: &PredictionResult) -> Result<()> {
        let confidence = result
            .distribution
            .get(result.digit as usize)
            .copied()
            .unwrap_or(0.0);
        tracing::info!("Prediction: {} ({:.1}%)", result.digit, confidence * 100.0);

        if self.show_chart {
            for (digit, p) in result.distribution.iter().enumerate() {
                let filled = (p.clamp(0.0, 1.0) * 40.0).round() as usize;
                println!("{digit} |{:<40}| {p:.3}", "#".repeat(filled));
            }
        }
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        tracing::info!("Prediction: ?");
        if self.show_chart {
            for digit in 0..10 {
                println!("{digit} |{:<40}| 0.000", "");
            }
        }
        Ok(())
    }
}
