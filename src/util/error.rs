//! Error types for detpost.

use thiserror::Error;

/// Result alias for detpost operations.
pub type DetPostResult<T> = std::result::Result<T, DetPostError>;

/// Errors raised when validating postprocessing inputs and configuration.
///
/// The decode and suppression kernels themselves never fail on well-formed
/// data; every variant here is a precondition violation caught up front.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum DetPostError {
    /// The input data or parameters are invalid.
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    /// Tensor dimensions are zero or overflow.
    #[error("invalid tensor dimensions: {features} features x {proposals} proposals")]
    InvalidDimensions { features: usize, proposals: usize },
    /// Row stride is smaller than the proposal count.
    #[error("invalid stride {stride} for {proposals} proposals")]
    InvalidStride { proposals: usize, stride: usize },
    /// Backing buffer is shorter than the declared shape requires.
    #[error("buffer too small: needed {needed} values, got {got}")]
    BufferTooSmall { needed: usize, got: usize },
    /// Tensor shape does not match the model shape the pipeline was built for.
    #[error(
        "tensor shape mismatch: expected [{expected_features}, {expected_proposals}], \
         got [{got_features}, {got_proposals}]"
    )]
    ShapeMismatch {
        expected_features: usize,
        expected_proposals: usize,
        got_features: usize,
        got_proposals: usize,
    },
    /// Box and score arrays passed to suppression differ in length.
    #[error("length mismatch: {boxes} boxes vs {scores} scores")]
    LengthMismatch { boxes: usize, scores: usize },
    /// A threshold lies outside `[0, 1]` or is NaN.
    #[error("{name} threshold out of range [0, 1]: {value}")]
    ThresholdOutOfRange { name: &'static str, value: f32 },
    /// Model input size is not a positive finite extent.
    #[error("invalid input size: {width}x{height}")]
    InvalidInputSize { width: f32, height: f32 },
    /// Reading a tensor dump or label file failed.
    #[error("i/o error: {reason}")]
    Io { reason: String },
}

impl From<std::io::Error> for DetPostError {
    fn from(err: std::io::Error) -> Self {
        DetPostError::Io {
            reason: err.to_string(),
        }
    }
}
