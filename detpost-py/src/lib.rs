//! Python bindings for the detpost postprocessing library.
//!
//! This module exposes the pipeline object and the standalone suppressor to
//! Python via PyO3.

use numpy::{PyReadonlyArray2, PyUntypedArrayMethods};
use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;

use detpost::lowlevel::{suppress, SuppressParams};
use detpost::{
    BoxXyxy, DetPostError, Detection as RustDetection, Extent, LabelPolicy, LabelTable,
    ModelShape, OverlapMetric, PostprocessConfig as RustPostprocessConfig,
    Postprocessor as RustPostprocessor, SensorOrientation, TensorView,
};

/// Convert a DetPostError to a Python exception.
fn to_py_err(err: DetPostError) -> PyErr {
    match err {
        DetPostError::Io { .. } => PyRuntimeError::new_err(err.to_string()),
        _ => PyValueError::new_err(err.to_string()),
    }
}

fn parse_overlap(name: &str) -> PyResult<OverlapMetric> {
    match name.to_lowercase().as_str() {
        "pixel_inclusive" => Ok(OverlapMetric::PixelInclusive),
        "legacy_asymmetric" => Ok(OverlapMetric::LegacyAsymmetric),
        _ => Err(PyValueError::new_err(
            "overlap must be 'pixel_inclusive' or 'legacy_asymmetric'",
        )),
    }
}

fn overlap_name(metric: OverlapMetric) -> &'static str {
    match metric {
        OverlapMetric::PixelInclusive => "pixel_inclusive",
        OverlapMetric::LegacyAsymmetric => "legacy_asymmetric",
    }
}

/// Read an `(N, 4)` array of `x0, y0, x1, y1` rows.
fn boxes_from_array(boxes: &PyReadonlyArray2<'_, f32>) -> PyResult<Vec<BoxXyxy>> {
    if boxes.shape()[1] != 4 {
        return Err(PyValueError::new_err("boxes must have shape (N, 4)"));
    }
    Ok(boxes
        .as_slice()?
        .chunks_exact(4)
        .map(|c| BoxXyxy::new(c[0], c[1], c[2], c[3]))
        .collect())
}

/// One surviving detection.
#[pyclass]
#[derive(Clone)]
pub struct Detection {
    /// Corner-form box `(x0, y0, x1, y1)`.
    #[pyo3(get)]
    pub bbox: (f32, f32, f32, f32),
    #[pyo3(get)]
    pub score: f32,
    #[pyo3(get)]
    pub class_index: usize,
    /// Class label, if a label table was attached.
    #[pyo3(get)]
    pub label: Option<String>,
    /// Index of the proposal this detection came from.
    #[pyo3(get)]
    pub proposal_index: usize,
}

#[pymethods]
impl Detection {
    fn __repr__(&self) -> String {
        let (x0, y0, x1, y1) = self.bbox;
        format!(
            "Detection(bbox=({:.1}, {:.1}, {:.1}, {:.1}), score={:.4}, class_index={}, label={:?})",
            x0, y0, x1, y1, self.score, self.class_index, self.label
        )
    }
}

impl From<RustDetection> for Detection {
    fn from(d: RustDetection) -> Self {
        Self {
            bbox: (d.bbox.x0, d.bbox.y0, d.bbox.x1, d.bbox.y1),
            score: d.score,
            class_index: d.class_index,
            label: d.label,
            proposal_index: d.proposal_index,
        }
    }
}

/// Thresholds and policies for postprocessing.
#[pyclass]
#[derive(Clone)]
pub struct PostprocessConfig {
    inner: RustPostprocessConfig,
}

#[pymethods]
impl PostprocessConfig {
    /// Create a new PostprocessConfig.
    ///
    /// Args:
    ///     confidence_threshold: Minimum best-class score (default: 0.25)
    ///     iou_threshold: Suppression overlap threshold (default: 0.45)
    ///     max_results: Maximum detections per frame (default: 30)
    ///     overlap: "pixel_inclusive" or "legacy_asymmetric" (default: "pixel_inclusive")
    ///     skip_index_zero: Drop proposal 0 from results (default: False)
    ///     wrap_labels: Wrap out-of-range class indices (default: False)
    ///     parallel: Enable parallel execution (default: False)
    #[new]
    #[pyo3(signature = (
        confidence_threshold = 0.25,
        iou_threshold = 0.45,
        max_results = 30,
        overlap = "pixel_inclusive",
        skip_index_zero = false,
        wrap_labels = false,
        parallel = false
    ))]
    fn new(
        confidence_threshold: f32,
        iou_threshold: f32,
        max_results: usize,
        overlap: &str,
        skip_index_zero: bool,
        wrap_labels: bool,
        parallel: bool,
    ) -> PyResult<Self> {
        let inner = RustPostprocessConfig {
            confidence_threshold,
            iou_threshold,
            max_results,
            overlap: parse_overlap(overlap)?,
            skip_index_zero,
            label_policy: if wrap_labels {
                LabelPolicy::Wrap
            } else {
                LabelPolicy::Strict
            },
            parallel,
        };
        inner.validate().map_err(to_py_err)?;
        Ok(Self { inner })
    }

    /// Settings of the camera overlay detector.
    #[staticmethod]
    fn legacy_overlay() -> Self {
        Self {
            inner: RustPostprocessConfig::legacy_overlay(),
        }
    }

    /// Validate the configuration.
    fn validate(&self) -> PyResult<()> {
        self.inner.validate().map_err(to_py_err)
    }

    fn __repr__(&self) -> String {
        format!(
            "PostprocessConfig(confidence_threshold={}, iou_threshold={}, max_results={}, overlap='{}', skip_index_zero={})",
            self.inner.confidence_threshold,
            self.inner.iou_threshold,
            self.inner.max_results,
            overlap_name(self.inner.overlap),
            self.inner.skip_index_zero
        )
    }
}

/// Decode and suppression pipeline bound to one model shape.
#[pyclass]
pub struct Postprocessor {
    inner: RustPostprocessor,
}

#[pymethods]
impl Postprocessor {
    /// Create a postprocessor for a `(4 + num_classes, num_proposals)` output.
    ///
    /// Args:
    ///     num_classes: Number of class score rows
    ///     num_proposals: Number of proposals per frame
    ///     input_size: Model input `(width, height)` (default: (640, 640))
    ///     config: PostprocessConfig (default: PostprocessConfig())
    ///     labels: Optional list of class labels
    #[new]
    #[pyo3(signature = (num_classes, num_proposals, input_size = (640.0, 640.0), config = None, labels = None))]
    fn new(
        num_classes: usize,
        num_proposals: usize,
        input_size: (f32, f32),
        config: Option<PostprocessConfig>,
        labels: Option<Vec<String>>,
    ) -> PyResult<Self> {
        let cfg = config.map(|c| c.inner).unwrap_or_default();
        let mut inner = RustPostprocessor::new(
            ModelShape::new(num_classes, num_proposals),
            Extent::new(input_size.0, input_size.1),
            cfg,
        )
        .map_err(to_py_err)?;
        if let Some(labels) = labels {
            inner = inner.with_labels(LabelTable::new(labels));
        }
        Ok(Self { inner })
    }

    /// Process one frame.
    ///
    /// Args:
    ///     tensor: 2D float32 numpy array (features x proposals)
    ///     orientation: Sensor orientation in degrees (default: 90)
    ///     image_size: Rescale boxes to this `(width, height)` (default: None)
    ///
    /// Returns:
    ///     List of Detection objects in proposal order
    #[pyo3(signature = (tensor, orientation = 90, image_size = None))]
    fn process(
        &mut self,
        tensor: PyReadonlyArray2<'_, f32>,
        orientation: i32,
        image_size: Option<(f32, f32)>,
    ) -> PyResult<Vec<Detection>> {
        let shape = tensor.shape();
        let features = shape[0];
        let proposals = shape[1];
        let data = tensor.as_slice()?;

        let view = TensorView::from_slice(data, features, proposals).map_err(to_py_err)?;
        let orientation = SensorOrientation::from_degrees(orientation);
        let detections = match image_size {
            Some((width, height)) => {
                self.inner
                    .process_scaled(view, orientation, Extent::new(width, height))
            }
            None => self.inner.process(view, orientation),
        }
        .map_err(to_py_err)?;
        Ok(detections.into_iter().map(Detection::from).collect())
    }

    /// Stats of the last frame as `(proposals, valid, kept, elapsed_seconds)`.
    #[getter]
    fn last_stats(&self) -> Option<(usize, usize, usize, f64)> {
        self.inner
            .last_stats()
            .map(|s| (s.proposals, s.valid, s.kept, s.elapsed.as_secs_f64()))
    }

    fn __repr__(&self) -> String {
        let shape = self.inner.shape();
        format!(
            "Postprocessor(num_classes={}, num_proposals={})",
            shape.num_classes, shape.num_proposals
        )
    }
}

/// Run greedy suppression on already decoded boxes.
///
/// Proposals are scanned in the given order, not by score.
///
/// Args:
///     boxes: 2D float32 numpy array (N x 4) of `x0, y0, x1, y1`
///     scores: Sequence of N scores, None marks an invalid proposal
///     top_n: Maximum number of kept proposals
///     iou_threshold: Overlap above which later proposals are suppressed
///     overlap: "pixel_inclusive" or "legacy_asymmetric" (default: "pixel_inclusive")
///
/// Returns:
///     Ascending list of kept proposal indices
///
/// Raises:
///     ValueError: iou_threshold is NaN or outside [0, 1], or lengths differ
#[pyfunction]
#[pyo3(signature = (boxes, scores, top_n, iou_threshold, overlap = "pixel_inclusive"))]
fn suppress_boxes(
    boxes: PyReadonlyArray2<'_, f32>,
    scores: Vec<Option<f32>>,
    top_n: usize,
    iou_threshold: f32,
    overlap: &str,
) -> PyResult<Vec<usize>> {
    let boxes = boxes_from_array(&boxes)?;
    let mut scores = scores;
    let params = SuppressParams {
        top_n,
        iou_threshold,
        metric: parse_overlap(overlap)?,
    };
    suppress(&boxes, &mut scores, &params).map_err(to_py_err)
}

/// Python module for detection postprocessing.
#[pymodule]
fn _detpost(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<Detection>()?;
    m.add_class::<PostprocessConfig>()?;
    m.add_class::<Postprocessor>()?;
    m.add_function(wrap_pyfunction!(suppress_boxes, m)?)?;

    m.add("__version__", env!("CARGO_PKG_VERSION"))?;

    Ok(())
}
