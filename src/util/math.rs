//! Numeric helpers shared by the decode kernels and parameter validation.

use crate::util::{DetPostError, DetPostResult};

/// Running argmax with first-wins tie-breaking.
///
/// Starts from `f32::MIN` at index 0, so NaN values never win and an
/// all-NaN input reports `(0, f32::MIN)`.
#[derive(Clone, Copy, Debug)]
pub(crate) struct ArgMax {
    pub(crate) index: usize,
    pub(crate) value: f32,
}

impl ArgMax {
    #[inline]
    pub(crate) fn new() -> Self {
        Self {
            index: 0,
            value: f32::MIN,
        }
    }

    #[inline]
    pub(crate) fn offer(&mut self, index: usize, value: f32) {
        if value > self.value {
            self.index = index;
            self.value = value;
        }
    }
}

/// Returns `true` when `value` is finite and at least `threshold`.
#[inline]
pub(crate) fn passes_gate(value: f32, threshold: f32) -> bool {
    value.is_finite() && value >= threshold
}

/// Rejects a threshold outside `[0, 1]`; NaN is rejected too.
pub(crate) fn check_unit(name: &'static str, value: f32) -> DetPostResult<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(DetPostError::ThresholdOutOfRange { name, value });
    }
    Ok(())
}
