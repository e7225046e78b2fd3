//! Loading raw tensor dumps for offline replay.
//!
//! Dumps are headerless little-endian f32 buffers in `[features, proposals]`
//! order, as written by copying an interpreter's output buffer to disk.

use crate::tensor::OwnedTensor;
use crate::util::{DetPostError, DetPostResult};
use std::path::Path;

const F32_BYTES: usize = std::mem::size_of::<f32>();

/// Decodes little-endian f32 bytes into a tensor of the given shape.
pub fn tensor_from_le_bytes(
    bytes: &[u8],
    features: usize,
    proposals: usize,
) -> DetPostResult<OwnedTensor> {
    if bytes.len() % F32_BYTES != 0 {
        return Err(DetPostError::InvalidInput(
            "tensor dump length is not a multiple of 4 bytes",
        ));
    }
    let data = bytes
        .chunks_exact(F32_BYTES)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect();
    OwnedTensor::new(data, features, proposals)
}

/// Reads a little-endian f32 tensor dump from disk.
pub fn load_f32_le<P: AsRef<Path>>(
    path: P,
    features: usize,
    proposals: usize,
) -> DetPostResult<OwnedTensor> {
    let bytes = std::fs::read(path)?;
    tensor_from_le_bytes(&bytes, features, proposals)
}
