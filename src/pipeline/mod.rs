mod controller;
mod interpret;
mod preprocess;
pub mod types;

pub use controller::{CycleController, TickOutcome};
pub use interpret::interpret;
pub use preprocess::Preprocessor;
pub use types::{InputTensor, PredictionResult, ProbabilityVector, DIGIT_CLASSES};
