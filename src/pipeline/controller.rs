use super::interpret::interpret;
use super::preprocess::Preprocessor;
use super::types::PredictionResult;
use crate::classifier::Classifier;
use crate::display::ResultSink;
use crate::error::PipelineError;
use crate::session::Session;
use crate::surface::RawTile;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// What one tick of the inference schedule did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// No pending change; nothing ran.
    Idle,
    /// A full cycle ran and a result was published.
    Completed,
    /// A cycle started but failed; the dirty flag was re-armed for retry.
    Aborted,
}

/// Drives the fixed-period inference schedule.
///
/// Each tick consumes the session's dirty flag and snapshot in one atomic
/// step, then runs preprocess -> inference -> interpret -> publish outside
/// the canvas lock so drawing is never blocked by a slow classifier. At most
/// one cycle runs at a time; strokes landing mid-cycle re-set the dirty flag
/// and are picked up on the next tick (intermediate states may be skipped,
/// never the latest one).
///
/// Cycle failures are handled locally: the dirty flag is re-armed, the last
/// published result stays on display, and the failure is only logged.
pub struct CycleController {
    session: Arc<Session>,
    classifier: Box<dyn Classifier>,
    preprocessor: Preprocessor,
    sink: Box<dyn ResultSink>,
    period: Duration,

    cycles: u64,
    total_preprocess_time: Duration,
    total_infer_time: Duration,
}

impl CycleController {
    pub fn new(
        session: Arc<Session>,
        classifier: Box<dyn Classifier>,
        sink: Box<dyn ResultSink>,
        period: Duration,
    ) -> Self {
        let (input_width, input_height) = classifier.input_size();
        Self {
            session,
            classifier,
            preprocessor: Preprocessor::new(input_width, input_height),
            sink,
            period,
            cycles: 0,
            total_preprocess_time: Duration::ZERO,
            total_infer_time: Duration::ZERO,
        }
    }

    /// Run ticks at the configured period until the session shuts down.
    pub fn run(&mut self) {
        tracing::info!("Starting inference loop, period {:?}", self.period);

        while self.session.is_running() {
            let tick_start = Instant::now();
            self.tick();

            let elapsed = tick_start.elapsed();
            if elapsed < self.period {
                std::thread::sleep(self.period - elapsed);
            }
        }

        tracing::info!("Inference loop stopped after {} cycles", self.cycles);
    }

    /// Execute one tick of the schedule.
    pub fn tick(&mut self) -> TickOutcome {
        if self.session.take_display_stale() {
            if let Err(err) = self.sink.clear() {
                tracing::warn!("Display sink failed to clear: {err:#}");
            }
        }

        let tile = match self.session.take_pending_snapshot() {
            Some(tile) => tile,
            None => return TickOutcome::Idle,
        };

        match self.run_cycle(&tile) {
            Ok(result) => {
                if let Err(err) = self.sink.publish(&result) {
                    tracing::warn!("Display sink failed: {err:#}");
                }
                self.session.store_result(result);

                self.cycles += 1;
                if self.cycles % 50 == 0 {
                    let avg_pre_ms =
                        self.total_preprocess_time.as_secs_f64() * 1000.0 / self.cycles as f64;
                    let avg_infer_ms =
                        self.total_infer_time.as_secs_f64() * 1000.0 / self.cycles as f64;
                    tracing::info!(
                        "Cycle {}: preprocess={:.1}ms, inference={:.1}ms (avg)",
                        self.cycles,
                        avg_pre_ms,
                        avg_infer_ms
                    );
                }

                TickOutcome::Completed
            }
            Err(err) => {
                // Leave the last good prediction on display and retry on the
                // next tick.
                tracing::warn!("Inference cycle aborted: {err}");
                self.session.mark_dirty();
                TickOutcome::Aborted
            }
        }
    }

    fn run_cycle(&mut self, tile: &RawTile) -> Result<PredictionResult, PipelineError> {
        let preprocess_start = Instant::now();
        let tensor = self.preprocessor.to_input_tensor(tile)?;
        self.total_preprocess_time += preprocess_start.elapsed();

        let infer_start = Instant::now();
        let distribution = self.classifier.predict(&tensor)?;
        self.total_infer_time += infer_start.elapsed();

        interpret(&distribution)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{InputTensor, ProbabilityVector};
    use anyhow::anyhow;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Classifier stub replaying a scripted sequence of responses.
    struct StubClassifier {
        responses: VecDeque<Result<ProbabilityVector, PipelineError>>,
        calls: Arc<AtomicUsize>,
    }

    impl StubClassifier {
        fn new(
            responses: Vec<Result<ProbabilityVector, PipelineError>>,
        ) -> (Self, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            (
                Self {
                    responses: responses.into(),
                    calls: calls.clone(),
                },
                calls,
            )
        }
    }

    impl Classifier for StubClassifier {
        fn predict(&mut self, _input: &InputTensor) -> Result<ProbabilityVector, PipelineError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.responses
                .pop_front()
                .unwrap_or_else(|| Ok(vec![0.1; 10]))
        }

        fn input_size(&self) -> (u32, u32) {
            (28, 28)
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        published: Arc<Mutex<Vec<PredictionResult>>>,
        clears: Arc<AtomicUsize>,
    }

    impl ResultSink for RecordingSink {
        fn publish(&mut self, result: &PredictionResult) -> anyhow::Result<()> {
            self.published.lock().unwrap().push(result.clone());
            Ok(())
        }

        fn clear(&mut self) -> anyhow::Result<()> {
            self.clears.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn digit_vector(digit: usize) -> ProbabilityVector {
        let mut v = vec![0.0; 10];
        v[digit] = 1.0;
        v
    }

    fn controller_with(
        responses: Vec<Result<ProbabilityVector, PipelineError>>,
    ) -> (
        CycleController,
        Arc<Session>,
        Arc<AtomicUsize>,
        Arc<Mutex<Vec<PredictionResult>>>,
        Arc<AtomicUsize>,
    ) {
        let session = Arc::new(Session::new(64, 64, 8));
        let (classifier, calls) = StubClassifier::new(responses);
        let sink = RecordingSink::default();
        let published = sink.published.clone();
        let clears = sink.clears.clone();
        let controller = CycleController::new(
            session.clone(),
            Box::new(classifier),
            Box::new(sink),
            Duration::from_millis(100),
        );
        (controller, session, calls, published, clears)
    }

    fn draw_stroke(session: &Session) {
        session.pointer_moved(10.0, 10.0);
        session.pointer_moved(50.0, 50.0);
        session.pointer_released();
    }

    #[test]
    fn tick_on_clean_surface_is_a_noop() {
        let (mut controller, _session, calls, published, clears) = controller_with(vec![]);

        assert_eq!(controller.tick(), TickOutcome::Idle);
        assert_eq!(controller.tick(), TickOutcome::Idle);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(published.lock().unwrap().is_empty());
        // The neutral display renders exactly once at startup.
        assert_eq!(clears.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn one_stroke_triggers_exactly_one_inference() {
        let (mut controller, session, calls, published, _clears) =
            controller_with(vec![Ok(digit_vector(3))]);

        draw_stroke(&session);
        assert_eq!(controller.tick(), TickOutcome::Completed);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!session.is_dirty());
        assert_eq!(published.lock().unwrap().len(), 1);
        assert_eq!(published.lock().unwrap()[0].digit, 3);
        assert_eq!(session.last_result().unwrap().digit, 3);

        // No further work until the surface changes again.
        assert_eq!(controller.tick(), TickOutcome::Idle);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failed_inference_keeps_dirty_flag_and_previous_result() {
        let (mut controller, session, calls, published, _clears) = controller_with(vec![
            Ok(digit_vector(5)),
            Err(PipelineError::InferenceUnavailable(anyhow!(
                "backend offline"
            ))),
            Ok(digit_vector(8)),
        ]);

        draw_stroke(&session);
        assert_eq!(controller.tick(), TickOutcome::Completed);
        assert_eq!(session.last_result().unwrap().digit, 5);

        session.pointer_moved(20.0, 10.0);
        session.pointer_moved(20.0, 50.0);
        assert_eq!(controller.tick(), TickOutcome::Aborted);
        // Stale-but-valid display: last result untouched, retry armed.
        assert!(session.is_dirty());
        assert_eq!(session.last_result().unwrap().digit, 5);
        assert_eq!(published.lock().unwrap().len(), 1);

        // The next tick retries the same pending work and succeeds.
        assert_eq!(controller.tick(), TickOutcome::Completed);
        assert!(!session.is_dirty());
        assert_eq!(session.last_result().unwrap().digit, 8);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn malformed_distribution_aborts_the_cycle() {
        let (mut controller, session, _calls, published, _clears) =
            controller_with(vec![Ok(vec![0.1; 9])]);

        draw_stroke(&session);
        assert_eq!(controller.tick(), TickOutcome::Aborted);
        assert!(session.is_dirty());
        assert!(published.lock().unwrap().is_empty());
    }

    #[test]
    fn continuous_drawing_runs_at_most_one_cycle_per_tick() {
        let (mut controller, session, calls, _published, _clears) = controller_with(vec![]);

        session.pointer_moved(10.0, 10.0);
        for i in 0..5 {
            session.pointer_moved(10.0 + i as f32 * 8.0, 30.0);
            controller.tick();
        }

        assert!(calls.load(Ordering::SeqCst) <= 5);
        assert!(!session.is_dirty());
    }

    #[test]
    fn reset_renders_the_neutral_display_on_the_next_tick() {
        let (mut controller, session, _calls, _published, clears) =
            controller_with(vec![Ok(digit_vector(2))]);

        draw_stroke(&session);
        assert_eq!(controller.tick(), TickOutcome::Completed);
        let clears_before = clears.load(Ordering::SeqCst);

        session.reset();
        assert_eq!(controller.tick(), TickOutcome::Idle);
        assert_eq!(clears.load(Ordering::SeqCst), clears_before + 1);
        assert!(session.last_result().is_none());
    }
}
