//! Views over the raw detector output tensor.
//!
//! A detector emits one dense `[features, proposals]` f32 tensor laid out
//! row-major by feature: every proposal's value for feature 0, then feature 1,
//! and so on. Features `0..4` hold the center-form box regression
//! `(cx, cy, w, h)`, features `4..4 + num_classes` hold per-class scores.
//!
//! `TensorView` borrows such a buffer with an explicit row stride so padded
//! outputs can be read without a copy. `OwnedTensor` keeps a contiguous copy
//! for offline replay and bindings.

use crate::util::{DetPostError, DetPostResult};

pub mod io;

/// Number of box regression channels preceding the class scores.
pub const BOX_CHANNELS: usize = 4;

/// Borrowed `[features, proposals]` tensor view with an explicit stride.
#[derive(Copy, Clone, Debug)]
pub struct TensorView<'a> {
    data: &'a [f32],
    features: usize,
    proposals: usize,
    stride: usize,
}

impl<'a> TensorView<'a> {
    /// Creates a contiguous view with `stride == proposals`.
    pub fn from_slice(data: &'a [f32], features: usize, proposals: usize) -> DetPostResult<Self> {
        Self::new(data, features, proposals, proposals)
    }

    /// Creates a view with an explicit stride between feature rows.
    pub fn new(
        data: &'a [f32],
        features: usize,
        proposals: usize,
        stride: usize,
    ) -> DetPostResult<Self> {
        let needed = required_len(features, proposals, stride)?;
        if data.len() < needed {
            return Err(DetPostError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        Ok(Self {
            data,
            features,
            proposals,
            stride,
        })
    }

    /// Returns the number of feature rows (`4 + num_classes`).
    pub fn features(&self) -> usize {
        self.features
    }

    /// Returns the number of proposals (anchors).
    pub fn proposals(&self) -> usize {
        self.proposals
    }

    /// Returns the number of class score rows.
    pub fn num_classes(&self) -> usize {
        self.features.saturating_sub(BOX_CHANNELS)
    }

    /// Returns the stride in elements between feature rows.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Returns all proposal values for feature `f`.
    pub fn feature(&self, f: usize) -> Option<&'a [f32]> {
        if f >= self.features {
            return None;
        }
        let start = f.checked_mul(self.stride)?;
        let end = start.checked_add(self.proposals)?;
        self.data.get(start..end)
    }

    /// Returns the value of feature `f` for proposal `p`.
    pub fn get(&self, f: usize, p: usize) -> Option<f32> {
        if f >= self.features || p >= self.proposals {
            return None;
        }
        let idx = f.checked_mul(self.stride)?.checked_add(p)?;
        self.data.get(idx).copied()
    }
}

/// Owned contiguous `[features, proposals]` tensor.
#[derive(Clone, Debug)]
pub struct OwnedTensor {
    data: Vec<f32>,
    features: usize,
    proposals: usize,
}

impl OwnedTensor {
    /// Wraps a contiguous buffer whose length must equal `features * proposals`.
    pub fn new(data: Vec<f32>, features: usize, proposals: usize) -> DetPostResult<Self> {
        let needed = required_len(features, proposals, proposals)?;
        if data.len() < needed {
            return Err(DetPostError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        if data.len() > needed {
            return Err(DetPostError::InvalidDimensions {
                features,
                proposals,
            });
        }
        Ok(Self {
            data,
            features,
            proposals,
        })
    }

    /// Builds a tensor from one row per feature.
    pub fn from_rows(rows: &[Vec<f32>]) -> DetPostResult<Self> {
        let features = rows.len();
        let proposals = rows.first().map_or(0, Vec::len);
        if rows.iter().any(|row| row.len() != proposals) {
            return Err(DetPostError::InvalidInput("feature rows differ in length"));
        }
        let data = rows.iter().flatten().copied().collect();
        Self::new(data, features, proposals)
    }

    /// Returns a borrowed view of the tensor.
    pub fn view(&self) -> TensorView<'_> {
        TensorView {
            data: &self.data,
            features: self.features,
            proposals: self.proposals,
            stride: self.proposals,
        }
    }

    pub fn features(&self) -> usize {
        self.features
    }

    pub fn proposals(&self) -> usize {
        self.proposals
    }

    /// Returns the contiguous backing buffer.
    pub fn data(&self) -> &[f32] {
        &self.data
    }
}

fn required_len(features: usize, proposals: usize, stride: usize) -> DetPostResult<usize> {
    if features <= BOX_CHANNELS || proposals == 0 {
        return Err(DetPostError::InvalidDimensions {
            features,
            proposals,
        });
    }
    if stride < proposals {
        return Err(DetPostError::InvalidStride { proposals, stride });
    }
    (features - 1)
        .checked_mul(stride)
        .and_then(|v| v.checked_add(proposals))
        .ok_or(DetPostError::InvalidDimensions {
            features,
            proposals,
        })
}
