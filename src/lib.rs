//! detpost turns the dense output tensor of a single-head object detector
//! into a short list of labeled, de-duplicated boxes.
//!
//! The model emits one `[4 + num_classes, num_proposals]` f32 tensor. Decoding
//! picks each proposal's best class, converts its box to corner form, drops
//! proposals below the confidence threshold and remaps the rest for the camera
//! sensor orientation. Greedy non-maximum suppression then keeps at most
//! `max_results` proposals in scan order. [`Postprocessor`] runs both stages on
//! reusable buffers; optional parallelism is available via the `rayon` feature.

pub mod decode;
pub mod geometry;
pub mod labels;
pub mod lowlevel;
pub mod pipeline;
pub mod suppress;
pub mod tensor;
mod trace;
pub mod util;

pub use geometry::{BoxXyxy, SensorOrientation};
pub use labels::{LabelPolicy, LabelTable};
pub use pipeline::{
    Detection, Extent, FrameStats, ModelShape, PostprocessConfig, Postprocessor,
};
pub use suppress::OverlapMetric;
pub use tensor::{OwnedTensor, TensorView};
pub use util::{DetPostError, DetPostResult};
