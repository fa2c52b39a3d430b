//! Model Module - prediction backends and dispatch
//!
//! Kept separate from feature handling so the model format can be swapped.

pub mod predictor;
pub mod pipeline;
pub mod state;
pub mod classify;

// Re-export common types
pub use predictor::PredictError;
pub use state::{ModelState, ModelStatus};
pub use classify::{classify, ClassifyOptions, ClassifyOutcome};
