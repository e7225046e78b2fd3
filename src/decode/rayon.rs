//! Proposal-parallel decode (feature-gated).
//!
//! Every proposal is decoded independently, so splitting the proposal range
//! across threads yields the same buffers as the sequential path.

use crate::decode::{check_shapes, decode_proposal, DecodeParams, Proposals};
use crate::tensor::TensorView;
use crate::trace::{trace_event, trace_span};
use crate::util::DetPostResult;
use rayon::prelude::*;

/// Parallel counterpart of [`crate::decode::decode_into`].
pub fn decode_into_par(
    tensor: TensorView<'_>,
    params: &DecodeParams,
    out: &mut Proposals,
) -> DetPostResult<usize> {
    check_shapes(&tensor, params, out)?;
    let _span = trace_span!("decode", proposals = tensor.proposals(), parallel = true).entered();

    let (boxes, scores, classes) = out.slots_mut();
    let valid = boxes
        .par_iter_mut()
        .zip(scores.par_iter_mut())
        .zip(classes.par_iter_mut())
        .enumerate()
        .map(|(p, ((bbox, score), class))| {
            let decoded = decode_proposal(&tensor, p, params);
            *bbox = decoded.bbox;
            *score = decoded.score;
            *class = decoded.class_index;
            usize::from(decoded.score.is_some())
        })
        .sum::<usize>();

    trace_event!("decoded", proposals = tensor.proposals(), valid = valid);
    Ok(valid)
}
