//! Greedy non-maximum suppression over decoded proposals.
//!
//! Priority is scan order, not score order: the first valid proposal is
//! accepted, every later valid proposal overlapping it by more than the
//! threshold loses its score, and the scan moves on. Once `top_n` proposals
//! are accepted the scan stops; the last accepted proposal suppresses nothing.
//! Suppression is irrevocable for the rest of the frame.

use crate::geometry::BoxXyxy;
use crate::trace::{trace_event, trace_span};
use crate::util::math::check_unit;
use crate::util::{DetPostError, DetPostResult};

pub mod overlap;

#[cfg(feature = "rayon")]
pub mod rayon;

pub use overlap::OverlapMetric;

/// Suppression parameters.
#[derive(Clone, Copy, Debug)]
pub struct SuppressParams {
    /// Maximum number of accepted proposals.
    pub top_n: usize,
    /// Overlap above which a later proposal is suppressed; ties are kept.
    pub iou_threshold: f32,
    /// Overlap formula used to compare an accepted box with later ones.
    pub metric: OverlapMetric,
}

impl SuppressParams {
    /// Rejects a NaN or out-of-range IoU threshold.
    ///
    /// A NaN threshold would compare false against every overlap and turn
    /// suppression off without any error.
    pub fn validate(&self) -> DetPostResult<()> {
        check_unit("iou", self.iou_threshold)
    }
}

/// Validates `params` and checks that boxes and scores pair up.
pub(crate) fn check_inputs(
    boxes: &[BoxXyxy],
    scores: &[Option<f32>],
    params: &SuppressParams,
) -> DetPostResult<()> {
    params.validate()?;
    if boxes.len() != scores.len() {
        return Err(DetPostError::LengthMismatch {
            boxes: boxes.len(),
            scores: scores.len(),
        });
    }
    Ok(())
}

/// Suppresses every valid proposal after `anchor` that overlaps it too much.
#[inline]
fn suppress_after(
    anchor: &BoxXyxy,
    boxes: &[BoxXyxy],
    scores: &mut [Option<f32>],
    params: &SuppressParams,
) {
    for (bbox, score) in boxes.iter().zip(scores.iter_mut()) {
        if score.is_some() && params.metric.overlap(anchor, bbox) > params.iou_threshold {
            *score = None;
        }
    }
}

/// Runs greedy NMS, writing accepted indices into `keep`.
///
/// `scores` is mutated: suppressed proposals become `None`. `keep` is cleared
/// first and ends up in ascending index order. Invalid parameters are
/// rejected before either buffer is touched.
pub fn suppress_into(
    boxes: &[BoxXyxy],
    scores: &mut [Option<f32>],
    params: &SuppressParams,
    keep: &mut Vec<usize>,
) -> DetPostResult<()> {
    check_inputs(boxes, scores, params)?;
    keep.clear();
    if params.top_n == 0 {
        return Ok(());
    }
    let _span = trace_span!("suppress", proposals = boxes.len(), top_n = params.top_n).entered();

    for i in 0..boxes.len() {
        if scores[i].is_none() {
            continue;
        }
        keep.push(i);
        if keep.len() >= params.top_n {
            break;
        }
        let anchor = boxes[i];
        suppress_after(&anchor, &boxes[i + 1..], &mut scores[i + 1..], params);
    }

    trace_event!("suppressed", kept = keep.len());
    Ok(())
}

/// Allocating convenience wrapper around [`suppress_into`].
pub fn suppress(
    boxes: &[BoxXyxy],
    scores: &mut [Option<f32>],
    params: &SuppressParams,
) -> DetPostResult<Vec<usize>> {
    let mut keep = Vec::with_capacity(params.top_n.min(boxes.len()));
    suppress_into(boxes, scores, params, &mut keep)?;
    Ok(keep)
}
