pub mod capture;
pub mod decoder;
pub mod dominant;
pub mod loudness;
pub mod pitch;
pub mod spectrum;
pub mod stream;

pub use capture::{AudioConfig, MicCapture};
pub use loudness::LoudnessMeter;
pub use pitch::PitchClass;
pub use spectrum::SpectralAnalyzer;
pub use stream::{FeatureStream, FrameSource, ListenerId};

use thiserror::Error;

/// Recoverable per-frame analysis failures.
///
/// These never stop the stream: the orchestrator logs the frame and moves on.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InputError {
    #[error("empty sample frame")]
    EmptyFrame,

    #[error("frequency/magnitude bins mismatched: {frequencies} vs {magnitudes}")]
    MismatchedBins { frequencies: usize, magnitudes: usize },
}
