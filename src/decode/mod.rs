//! Tensor de-multiplexing into per-proposal boxes, scores and classes.
//!
//! Each proposal goes through four steps in order: class argmax over the score
//! rows, center-form to corner-form box conversion, the confidence gate, and
//! (only for proposals that pass) the sensor orientation remap. Proposals that
//! fail the gate get a `None` score and keep their untransformed box, which
//! nothing downstream reads.

use crate::geometry::{BoxXyxy, SensorOrientation};
use crate::tensor::{TensorView, BOX_CHANNELS};
use crate::trace::{trace_event, trace_span};
use crate::util::math::{check_unit, passes_gate, ArgMax};
use crate::util::{DetPostError, DetPostResult};

#[cfg(feature = "rayon")]
pub mod rayon;

/// Per-frame decode parameters.
#[derive(Clone, Copy, Debug)]
pub struct DecodeParams {
    /// Number of class score rows following the four box rows.
    pub num_classes: usize,
    /// Model input width used by the orientation remap.
    pub input_width: f32,
    /// Model input height used by the orientation remap.
    pub input_height: f32,
    /// Sensor rotation applied to proposals that pass the gate.
    pub orientation: SensorOrientation,
    /// Minimum best-class score; compared with `>=`.
    pub confidence_threshold: f32,
}

impl DecodeParams {
    /// Number of feature rows a matching tensor carries.
    ///
    /// Saturates for class counts that [`DecodeParams::validate`] rejects.
    pub fn features(&self) -> usize {
        BOX_CHANNELS.saturating_add(self.num_classes)
    }

    /// Checks the class count, input extent and confidence threshold.
    ///
    /// Every decode entry point calls this before touching the tensor, so a
    /// NaN or out-of-range threshold is an error rather than a silent gate.
    pub fn validate(&self) -> DetPostResult<()> {
        if self.num_classes == 0 || self.num_classes.checked_add(BOX_CHANNELS).is_none() {
            return Err(DetPostError::InvalidInput(
                "num_classes must be at least 1 and fit the feature count",
            ));
        }
        let ok = |v: f32| v.is_finite() && v > 0.0;
        if !ok(self.input_width) || !ok(self.input_height) {
            return Err(DetPostError::InvalidInputSize {
                width: self.input_width,
                height: self.input_height,
            });
        }
        check_unit("confidence", self.confidence_threshold)
    }
}

/// Reusable per-proposal output buffers.
///
/// Sized once for a fixed proposal count and overwritten in full by every
/// decode call, so nothing from a previous frame survives.
#[derive(Clone, Debug)]
pub struct Proposals {
    boxes: Vec<BoxXyxy>,
    scores: Vec<Option<f32>>,
    classes: Vec<usize>,
}

impl Proposals {
    /// Allocates buffers for `proposals` entries.
    pub fn new(proposals: usize) -> Self {
        Self {
            boxes: vec![BoxXyxy::default(); proposals],
            scores: vec![None; proposals],
            classes: vec![0; proposals],
        }
    }

    /// Returns the proposal count the buffers were sized for.
    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    /// Returns `true` when the buffers hold no proposals.
    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    /// Corner-form boxes. Gated proposals keep their unrotated box.
    pub fn boxes(&self) -> &[BoxXyxy] {
        &self.boxes
    }

    /// Scores after the confidence gate; `None` marks a removed proposal.
    pub fn scores(&self) -> &[Option<f32>] {
        &self.scores
    }

    /// Argmax class index per proposal, set even for gated proposals.
    pub fn classes(&self) -> &[usize] {
        &self.classes
    }

    /// Returns the number of proposals still holding a score.
    pub fn valid_count(&self) -> usize {
        self.scores.iter().filter(|s| s.is_some()).count()
    }

    /// Splits into read-only boxes and mutable scores for suppression.
    pub fn suppression_parts(&mut self) -> (&[BoxXyxy], &mut [Option<f32>]) {
        (&self.boxes, &mut self.scores)
    }

    /// Mutable views of all three buffers for the decode kernels.
    pub(crate) fn slots_mut(
        &mut self,
    ) -> (&mut [BoxXyxy], &mut [Option<f32>], &mut [usize]) {
        (&mut self.boxes, &mut self.scores, &mut self.classes)
    }
}

/// Decoded state of a single proposal.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Decoded {
    pub bbox: BoxXyxy,
    pub score: Option<f32>,
    pub class_index: usize,
}

/// Decodes proposal `p` of a tensor already checked against `params`.
///
/// Missing values read as NaN, which fails the gate.
#[inline]
pub fn decode_proposal(tensor: &TensorView<'_>, p: usize, params: &DecodeParams) -> Decoded {
    let value = |f: usize| tensor.get(f, p).unwrap_or(f32::NAN);

    let mut best = ArgMax::new();
    for c in 0..params.num_classes {
        best.offer(c, value(BOX_CHANNELS + c));
    }

    let bbox = BoxXyxy::from_center(value(0), value(1), value(2), value(3));
    if !passes_gate(best.value, params.confidence_threshold) || !bbox.is_finite() {
        return Decoded {
            bbox,
            score: None,
            class_index: best.index,
        };
    }

    Decoded {
        bbox: params
            .orientation
            .apply(bbox, params.input_width, params.input_height),
        score: Some(best.value),
        class_index: best.index,
    }
}

/// Validates `params`, then checks that `tensor` and `out` agree with them.
pub(crate) fn check_shapes(
    tensor: &TensorView<'_>,
    params: &DecodeParams,
    out: &Proposals,
) -> DetPostResult<()> {
    params.validate()?;
    let expected_features = params.features();
    if tensor.features() != expected_features || tensor.proposals() != out.len() {
        return Err(DetPostError::ShapeMismatch {
            expected_features,
            expected_proposals: out.len(),
            got_features: tensor.features(),
            got_proposals: tensor.proposals(),
        });
    }
    Ok(())
}

/// Decodes every proposal of `tensor` into `out`.
///
/// Returns the number of proposals that passed the confidence gate. Invalid
/// parameters or a tensor that does not match them leave `out` untouched.
pub fn decode_into(
    tensor: TensorView<'_>,
    params: &DecodeParams,
    out: &mut Proposals,
) -> DetPostResult<usize> {
    check_shapes(&tensor, params, out)?;
    let _span = trace_span!("decode", proposals = tensor.proposals()).entered();

    let (boxes, scores, classes) = out.slots_mut();
    let mut valid = 0usize;
    for (p, ((bbox, score), class)) in boxes
        .iter_mut()
        .zip(scores.iter_mut())
        .zip(classes.iter_mut())
        .enumerate()
    {
        let decoded = decode_proposal(&tensor, p, params);
        *bbox = decoded.bbox;
        *score = decoded.score;
        *class = decoded.class_index;
        valid += usize::from(decoded.score.is_some());
    }

    trace_event!("decoded", proposals = tensor.proposals(), valid = valid);
    Ok(valid)
}

/// Allocating convenience wrapper around [`decode_into`].
pub fn decode(tensor: TensorView<'_>, params: &DecodeParams) -> DetPostResult<Proposals> {
    let mut out = Proposals::new(tensor.proposals());
    decode_into(tensor, params, &mut out)?;
    Ok(out)
}
