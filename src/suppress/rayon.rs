//! Suppression with a parallel inner scan (feature-gated).
//!
//! Acceptance decisions depend on every earlier acceptance, so the outer scan
//! stays sequential. Only the sweep that clears proposals overlapping one
//! accepted anchor is split across threads; each slot is written by exactly
//! one task and the sweep finishes before the next anchor is considered.

use crate::geometry::BoxXyxy;
use crate::suppress::{check_inputs, SuppressParams};
use crate::trace::{trace_event, trace_span};
use crate::util::DetPostResult;
use rayon::prelude::*;

/// Parallel counterpart of [`crate::suppress::suppress_into`].
pub fn suppress_into_par(
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
    let _span = trace_span!("suppress", proposals = boxes.len(), parallel = true).entered();

    for i in 0..boxes.len() {
        if scores[i].is_none() {
            continue;
        }
        keep.push(i);
        if keep.len() >= params.top_n {
            break;
        }
        let anchor = boxes[i];
        scores[i + 1..]
            .par_iter_mut()
            .zip(boxes[i + 1..].par_iter())
            .for_each(|(score, bbox)| {
                if score.is_some() && params.metric.overlap(&anchor, bbox) > params.iou_threshold {
                    *score = None;
                }
            });
    }

    trace_event!("suppressed", kept = keep.len());
    Ok(())
}
