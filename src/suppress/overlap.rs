//! Pixel-inclusive overlap metrics.
//!
//! Box extents count both end pixels, so a box from `x0` to `x1` is
//! `x1 - x0 + 1` wide. A negative intersection extent means the boxes do not
//! touch and the overlap is zero; an extent of exactly zero also yields zero.

use crate::geometry::BoxXyxy;

/// Which intersection-over-union formula suppression uses.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OverlapMetric {
    /// Symmetric pixel-inclusive IoU.
    #[default]
    PixelInclusive,
    /// Pixel-inclusive IoU where the second box's height is measured from the
    /// first box's `y0`. Not symmetric; kept for output parity with deployed
    /// detectors that shipped this formula.
    LegacyAsymmetric,
}

impl OverlapMetric {
    /// Overlap of `b` against the already accepted box `a`.
    ///
    /// Non-finite coordinates or results report zero overlap.
    #[inline]
    pub fn overlap(self, a: &BoxXyxy, b: &BoxXyxy) -> f32 {
        if !a.is_finite() || !b.is_finite() {
            return 0.0;
        }

        let w = a.x1.min(b.x1) - a.x0.max(b.x0) + 1.0;
        let h = a.y1.min(b.y1) - a.y0.max(b.y0) + 1.0;
        if w < 0.0 || h < 0.0 {
            return 0.0;
        }
        let inter = w * h;

        let area_a = (a.x1 - a.x0 + 1.0) * (a.y1 - a.y0 + 1.0);
        let b_top = match self {
            Self::PixelInclusive => b.y0,
            Self::LegacyAsymmetric => a.y0,
        };
        let area_b = (b.x1 - b.x0 + 1.0) * (b.y1 - b_top + 1.0);

        let iou = inter / (area_a + area_b - inter);
        if iou.is_finite() {
            iou
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::OverlapMetric;
    use crate::geometry::BoxXyxy;

    #[test]
    fn identical_boxes_overlap_fully() {
        let a = BoxXyxy::new(8.0, 8.0, 12.0, 12.0);
        assert_eq!(OverlapMetric::PixelInclusive.overlap(&a, &a), 1.0);
        assert_eq!(OverlapMetric::LegacyAsymmetric.overlap(&a, &a), 1.0);
    }

    #[test]
    fn adjacent_pixels_count_as_touching() {
        // Extents [0, 9] and [10, 19] share no pixel: width = 9 - 10 + 1 = 0.
        let a = BoxXyxy::new(0.0, 0.0, 9.0, 9.0);
        let b = BoxXyxy::new(10.0, 0.0, 19.0, 9.0);
        assert_eq!(OverlapMetric::PixelInclusive.overlap(&a, &b), 0.0);

        let far = BoxXyxy::new(30.0, 30.0, 40.0, 40.0);
        assert_eq!(OverlapMetric::PixelInclusive.overlap(&a, &far), 0.0);
    }

    #[test]
    fn half_overlap_is_exact() {
        let a = BoxXyxy::new(0.0, 0.0, 9.0, 9.0);
        let b = BoxXyxy::new(0.0, 0.0, 9.0, 4.0);
        assert_eq!(OverlapMetric::PixelInclusive.overlap(&a, &b), 0.5);
        assert_eq!(OverlapMetric::PixelInclusive.overlap(&b, &a), 0.5);
    }

    #[test]
    fn legacy_metric_is_asymmetric() {
        let a = BoxXyxy::new(0.0, 0.0, 9.0, 9.0);
        let b = BoxXyxy::new(0.0, 5.0, 9.0, 14.0);
        let metric = OverlapMetric::LegacyAsymmetric;

        // a first: inter 10*5 = 50, area_b = 10 * (14 - 0 + 1) = 150.
        assert_eq!(metric.overlap(&a, &b), 50.0 / 200.0);
        // b first: area_b = 10 * (9 - 5 + 1) = 50.
        assert_eq!(metric.overlap(&b, &a), 50.0 / 100.0);
        assert_eq!(OverlapMetric::PixelInclusive.overlap(&a, &b), 50.0 / 150.0);
    }

    #[test]
    fn non_finite_boxes_never_overlap() {
        let a = BoxXyxy::new(0.0, 0.0, 9.0, 9.0);
        let nan = BoxXyxy::new(f32::NAN, 0.0, 9.0, 9.0);
        let inf = BoxXyxy::new(0.0, 0.0, f32::INFINITY, 9.0);
        assert_eq!(OverlapMetric::PixelInclusive.overlap(&a, &nan), 0.0);
        assert_eq!(OverlapMetric::PixelInclusive.overlap(&inf, &a), 0.0);
    }
}
