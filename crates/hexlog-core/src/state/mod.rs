//! Recognizer state machine module.

pub mod emit;
mod handlers;
pub mod machine;

pub use emit::{Annotation, Emit};
pub use machine::{Recognizer, RecognizerOptions, RecognizerState, Step};
