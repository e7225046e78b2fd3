//! Stage-level building blocks for custom pipelines.
//!
//! These expose the decode and suppression kernels directly, for callers that
//! manage their own buffers or want to inspect intermediate proposals. Most
//! users should prefer [`crate::Postprocessor`].

pub use crate::decode::{decode, decode_into, decode_proposal, DecodeParams, Decoded, Proposals};
pub use crate::suppress::overlap::OverlapMetric;
pub use crate::suppress::{suppress, suppress_into, SuppressParams};
pub use crate::tensor::io::{load_f32_le, tensor_from_le_bytes};
pub use crate::tensor::BOX_CHANNELS;

#[cfg(feature = "rayon")]
pub use crate::decode::rayon::decode_into_par;
#[cfg(feature = "rayon")]
pub use crate::suppress::rayon::suppress_into_par;
