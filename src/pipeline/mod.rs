//! Per-frame postprocessing pipeline.
//!
//! `Postprocessor` owns the scratch buffers for one model. They are sized once
//! from the model's fixed output shape and reused for every frame, so the
//! steady-state cost of a frame is decode, suppression and building the short
//! result list. Calls take `&mut self`; share a postprocessor across threads
//! only behind external synchronization.

use std::time::{Duration, Instant};

use crate::decode::{decode_into, DecodeParams, Proposals};
use crate::geometry::{BoxXyxy, SensorOrientation};
use crate::labels::LabelTable;
use crate::suppress::{suppress_into, SuppressParams};
use crate::tensor::TensorView;
use crate::trace::{trace_event, trace_span, trace_warn};
use crate::util::{DetPostError, DetPostResult};

#[cfg(feature = "rayon")]
use crate::decode::rayon::decode_into_par;
#[cfg(feature = "rayon")]
use crate::suppress::rayon::suppress_into_par;

mod config;

pub use config::{Extent, ModelShape, PostprocessConfig};

/// One surviving detection.
#[derive(Clone, Debug, PartialEq)]
pub struct Detection {
    /// Box in model input space, or image space after [`Detection::scaled`].
    pub bbox: BoxXyxy,
    /// Best-class confidence that passed the gate.
    pub score: f32,
    /// Argmax class; ties go to the lowest index.
    pub class_index: usize,
    /// Label from the attached table, resolved under the config's policy.
    pub label: Option<String>,
    /// Index of the proposal this detection came from.
    pub proposal_index: usize,
}

impl Detection {
    /// Rescales the box from model input space to image space.
    pub fn scaled(mut self, input: Extent, image: Extent) -> Self {
        self.bbox = self
            .bbox
            .scaled(image.width / input.width, image.height / input.height);
        self
    }
}

/// Counters and timing for the most recent frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameStats {
    /// Proposals decoded, always the model's proposal count.
    pub proposals: usize,
    /// Proposals that passed the confidence gate.
    pub valid: usize,
    /// Detections returned to the caller.
    pub kept: usize,
    /// Wall time spent in decode, suppression and result building.
    pub elapsed: Duration,
}

impl FrameStats {
    /// Elapsed time in whole microseconds, saturating at `u64::MAX`.
    pub fn elapsed_micros(&self) -> u64 {
        u64::try_from(self.elapsed.as_micros()).unwrap_or(u64::MAX)
    }
}

/// Decode and suppression pipeline bound to one model shape.
pub struct Postprocessor {
    shape: ModelShape,
    input: Extent,
    cfg: PostprocessConfig,
    labels: LabelTable,
    proposals: Proposals,
    keep: Vec<usize>,
    last_stats: Option<FrameStats>,
}

impl Postprocessor {
    /// Builds a postprocessor, validating all settings up front.
    pub fn new(shape: ModelShape, input: Extent, cfg: PostprocessConfig) -> DetPostResult<Self> {
        shape.validate()?;
        input.validate()?;
        cfg.validate()?;
        Ok(Self {
            shape,
            input,
            proposals: Proposals::new(shape.num_proposals),
            keep: Vec::with_capacity(cfg.max_results.min(shape.num_proposals)),
            cfg,
            labels: LabelTable::default(),
            last_stats: None,
        })
    }

    /// Attaches a label table used to name detections.
    pub fn with_labels(mut self, labels: LabelTable) -> Self {
        if labels.len() != self.shape.num_classes {
            trace_warn!(
                "label_count_mismatch",
                labels = labels.len(),
                classes = self.shape.num_classes
            );
        }
        self.labels = labels;
        self
    }

    /// Replaces the configuration, keeping the scratch buffers.
    pub fn set_config(&mut self, cfg: PostprocessConfig) -> DetPostResult<()> {
        cfg.validate()?;
        self.cfg = cfg;
        Ok(())
    }

    /// Returns the active configuration.
    pub fn config(&self) -> &PostprocessConfig {
        &self.cfg
    }

    /// Returns the model shape the scratch buffers were sized for.
    pub fn shape(&self) -> ModelShape {
        self.shape
    }

    /// Returns the model input extent used by the orientation remap.
    pub fn input_size(&self) -> Extent {
        self.input
    }

    /// Returns the attached label table; empty when none was attached.
    pub fn labels(&self) -> &LabelTable {
        &self.labels
    }

    /// Decoded proposals of the most recent frame, after suppression.
    pub fn proposals(&self) -> &Proposals {
        &self.proposals
    }

    /// Stats of the most recent successful frame; `None` before the first.
    pub fn last_stats(&self) -> Option<FrameStats> {
        self.last_stats
    }

    /// Decodes and suppresses one frame, returning detections in input space.
    pub fn process(
        &mut self,
        tensor: TensorView<'_>,
        orientation: SensorOrientation,
    ) -> DetPostResult<Vec<Detection>> {
        let expected_features = self.shape.features();
        if tensor.features() != expected_features || tensor.proposals() != self.shape.num_proposals
        {
            return Err(DetPostError::ShapeMismatch {
                expected_features,
                expected_proposals: self.shape.num_proposals,
                got_features: tensor.features(),
                got_proposals: tensor.proposals(),
            });
        }

        let _span = trace_span!("postprocess", orientation = orientation.degrees()).entered();
        let start = Instant::now();

        let decode_params = DecodeParams {
            num_classes: self.shape.num_classes,
            input_width: self.input.width,
            input_height: self.input.height,
            orientation,
            confidence_threshold: self.cfg.confidence_threshold,
        };
        let suppress_params = SuppressParams {
            top_n: self.cfg.max_results,
            iou_threshold: self.cfg.iou_threshold,
            metric: self.cfg.overlap,
        };

        let valid = self.run_kernels(tensor, &decode_params, &suppress_params)?;
        let detections = self.collect_detections();

        let stats = FrameStats {
            proposals: tensor.proposals(),
            valid,
            kept: detections.len(),
            elapsed: start.elapsed(),
        };
        trace_event!(
            "frame",
            valid = stats.valid,
            kept = stats.kept,
            elapsed_us = stats.elapsed_micros()
        );
        self.last_stats = Some(stats);
        Ok(detections)
    }

    /// Like [`Postprocessor::process`], then rescales boxes to `image` size.
    pub fn process_scaled(
        &mut self,
        tensor: TensorView<'_>,
        orientation: SensorOrientation,
        image: Extent,
    ) -> DetPostResult<Vec<Detection>> {
        image.validate()?;
        let input = self.input;
        let detections = self.process(tensor, orientation)?;
        Ok(detections
            .into_iter()
            .map(|det| det.scaled(input, image))
            .collect())
    }

    #[cfg(feature = "rayon")]
    fn run_kernels(
        &mut self,
        tensor: TensorView<'_>,
        decode_params: &DecodeParams,
        suppress_params: &SuppressParams,
    ) -> DetPostResult<usize> {
        if !self.cfg.parallel {
            return self.run_kernels_seq(tensor, decode_params, suppress_params);
        }
        let valid = decode_into_par(tensor, decode_params, &mut self.proposals)?;
        let (boxes, scores) = self.proposals.suppression_parts();
        suppress_into_par(boxes, scores, suppress_params, &mut self.keep)?;
        Ok(valid)
    }

    #[cfg(not(feature = "rayon"))]
    fn run_kernels(
        &mut self,
        tensor: TensorView<'_>,
        decode_params: &DecodeParams,
        suppress_params: &SuppressParams,
    ) -> DetPostResult<usize> {
        self.run_kernels_seq(tensor, decode_params, suppress_params)
    }

    fn run_kernels_seq(
        &mut self,
        tensor: TensorView<'_>,
        decode_params: &DecodeParams,
        suppress_params: &SuppressParams,
    ) -> DetPostResult<usize> {
        let valid = decode_into(tensor, decode_params, &mut self.proposals)?;
        let (boxes, scores) = self.proposals.suppression_parts();
        suppress_into(boxes, scores, suppress_params, &mut self.keep)?;
        Ok(valid)
    }

    fn label_for(&self, class_index: usize) -> Option<String> {
        if self.labels.is_empty() {
            return None;
        }
        self.labels
            .resolve(class_index, self.cfg.label_policy)
            .map(str::to_owned)
    }

    fn collect_detections(&self) -> Vec<Detection> {
        let boxes = self.proposals.boxes();
        let scores = self.proposals.scores();
        let classes = self.proposals.classes();

        self.keep
            .iter()
            .copied()
            .filter(|&idx| !(self.cfg.skip_index_zero && idx == 0))
            .filter_map(|idx| {
                let score = scores[idx]?;
                let class_index = classes[idx];
                Some(Detection {
                    bbox: boxes[idx],
                    score,
                    class_index,
                    label: self.label_for(class_index),
                    proposal_index: idx,
                })
            })
            .collect()
    }
}
