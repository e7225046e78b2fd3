use detpost::lowlevel::{suppress, suppress_into, SuppressParams};
use detpost::{BoxXyxy, DetPostError, OverlapMetric};

fn params(top_n: usize, iou_threshold: f32) -> SuppressParams {
    SuppressParams {
        top_n,
        iou_threshold,
        metric: OverlapMetric::PixelInclusive,
    }
}

#[test]
fn single_proposal_is_kept() {
    let boxes = [BoxXyxy::new(8.0, 8.0, 12.0, 12.0)];
    let mut scores = [Some(0.9)];
    let keep = suppress(&boxes, &mut scores, &params(5, 0.2)).unwrap();
    assert_eq!(keep, vec![0]);
}

#[test]
fn identical_boxes_keep_first_scanned() {
    let b = BoxXyxy::new(8.0, 8.0, 12.0, 12.0);
    let boxes = [b, b];
    let mut scores = [Some(0.9), Some(0.8)];
    let keep = suppress(&boxes, &mut scores, &params(5, 0.3)).unwrap();

    assert_eq!(keep, vec![0]);
    assert_eq!(scores, [Some(0.9), None]);
}

#[test]
fn scan_order_wins_over_score() {
    let b = BoxXyxy::new(0.0, 0.0, 20.0, 20.0);
    let boxes = [b, b];
    let mut scores = [Some(0.3), Some(0.95)];
    let keep = suppress(&boxes, &mut scores, &params(5, 0.5)).unwrap();
    assert_eq!(keep, vec![0]);
}

#[test]
fn overlap_equal_to_threshold_is_kept() {
    // Pixel-inclusive IoU of these boxes is exactly 0.5.
    let boxes = [
        BoxXyxy::new(0.0, 0.0, 9.0, 9.0),
        BoxXyxy::new(0.0, 0.0, 9.0, 4.0),
    ];

    let mut scores = [Some(0.9), Some(0.8)];
    let keep = suppress(&boxes, &mut scores, &params(5, 0.5)).unwrap();
    assert_eq!(keep, vec![0, 1]);

    let mut scores = [Some(0.9), Some(0.8)];
    let keep = suppress(&boxes, &mut scores, &params(5, 0.49)).unwrap();
    assert_eq!(keep, vec![0]);
}

#[test]
fn output_is_ascending_not_score_sorted() {
    let boxes = [
        BoxXyxy::new(0.0, 0.0, 9.0, 9.0),
        BoxXyxy::new(100.0, 100.0, 109.0, 109.0),
        BoxXyxy::new(200.0, 200.0, 209.0, 209.0),
    ];
    let mut scores = [Some(0.3), Some(0.9), Some(0.6)];
    let keep = suppress(&boxes, &mut scores, &params(5, 0.2)).unwrap();
    assert_eq!(keep, vec![0, 1, 2]);
}

#[test]
fn cap_stops_the_scan_at_top_n() {
    let a = BoxXyxy::new(0.0, 0.0, 9.0, 9.0);
    let b = BoxXyxy::new(50.0, 50.0, 59.0, 59.0);
    let boxes = [a, b, b, BoxXyxy::new(90.0, 90.0, 99.0, 99.0)];
    let mut scores = [Some(0.9), Some(0.8), Some(0.7), Some(0.6)];
    let keep = suppress(&boxes, &mut scores, &params(2, 0.3)).unwrap();

    assert_eq!(keep, vec![0, 1]);
    // The last accepted proposal suppresses nothing.
    assert_eq!(scores[2], Some(0.7));
}

#[test]
fn cap_bounds_output_length() {
    let boxes: Vec<BoxXyxy> = (0..50)
        .map(|i| {
            let x = i as f32 * 20.0;
            BoxXyxy::new(x, 0.0, x + 9.0, 9.0)
        })
        .collect();
    for top_n in [1usize, 7, 30, 100] {
        let mut scores = vec![Some(0.5f32); boxes.len()];
        let keep = suppress(&boxes, &mut scores, &params(top_n, 0.45)).unwrap();
        assert_eq!(keep.len(), top_n.min(boxes.len()));
    }
}

#[test]
fn all_invalid_yields_empty() {
    let boxes = [BoxXyxy::new(0.0, 0.0, 9.0, 9.0); 4];
    for (top_n, iou) in [(1usize, 0.0f32), (20, 0.45), (100, 1.0)] {
        let mut scores = [None; 4];
        let keep = suppress(&boxes, &mut scores, &params(top_n, iou)).unwrap();
        assert!(keep.is_empty());
    }
}

#[test]
fn zero_cap_yields_empty() {
    let boxes = [BoxXyxy::new(0.0, 0.0, 9.0, 9.0)];
    let mut scores = [Some(0.9)];
    let keep = suppress(&boxes, &mut scores, &params(0, 0.5)).unwrap();
    assert!(keep.is_empty());
    assert_eq!(scores, [Some(0.9)]);
}

#[test]
fn legacy_metric_changes_decisions() {
    // Pixel-inclusive IoU is 1/3, the legacy formula gives 0.25 for this order.
    let boxes = [
        BoxXyxy::new(0.0, 0.0, 9.0, 9.0),
        BoxXyxy::new(0.0, 5.0, 9.0, 14.0),
    ];

    let mut scores = [Some(0.9), Some(0.8)];
    let keep = suppress(&boxes, &mut scores, &params(5, 0.3)).unwrap();
    assert_eq!(keep, vec![0]);

    let legacy = SuppressParams {
        metric: OverlapMetric::LegacyAsymmetric,
        ..params(5, 0.3)
    };
    let mut scores = [Some(0.9), Some(0.8)];
    let keep = suppress(&boxes, &mut scores, &legacy).unwrap();
    assert_eq!(keep, vec![0, 1]);
}

#[test]
fn nan_boxes_never_suppress() {
    let boxes = [
        BoxXyxy::new(f32::NAN, 0.0, 9.0, 9.0),
        BoxXyxy::new(0.0, 0.0, 9.0, 9.0),
    ];
    let mut scores = [Some(0.9), Some(0.8)];
    let keep = suppress(&boxes, &mut scores, &params(5, 0.0)).unwrap();
    assert_eq!(keep, vec![0, 1]);
}

#[test]
fn keep_buffer_is_reused() {
    let boxes = [BoxXyxy::new(0.0, 0.0, 9.0, 9.0)];
    let mut keep = vec![42, 43, 44];

    let mut scores = [Some(0.9)];
    suppress_into(&boxes, &mut scores, &params(5, 0.5), &mut keep).unwrap();
    assert_eq!(keep, vec![0]);

    let mut scores = [None];
    suppress_into(&boxes, &mut scores, &params(5, 0.5), &mut keep).unwrap();
    assert!(keep.is_empty());
}

#[test]
fn mismatched_lengths_are_rejected() {
    let boxes = [BoxXyxy::new(0.0, 0.0, 9.0, 9.0); 2];
    let mut scores = [Some(0.9)];
    let err = suppress(&boxes, &mut scores, &params(5, 0.5)).unwrap_err();
    assert_eq!(err, DetPostError::LengthMismatch { boxes: 2, scores: 1 });
}

#[test]
fn invalid_iou_threshold_is_rejected() {
    let b = BoxXyxy::new(0.0, 0.0, 9.0, 9.0);
    let boxes = [b, b];
    for iou in [f32::NAN, 2.0, -0.1] {
        let mut scores = [Some(0.9), Some(0.8)];
        let mut keep = vec![7];
        let err = suppress_into(&boxes, &mut scores, &params(5, iou), &mut keep).unwrap_err();
        assert!(matches!(
            err,
            DetPostError::ThresholdOutOfRange { name: "iou", .. }
        ));
        // Nothing is touched when the parameters are rejected.
        assert_eq!(scores, [Some(0.9), Some(0.8)]);
        assert_eq!(keep, vec![7]);
    }

    let mut scores = [Some(0.9)];
    assert!(suppress(&boxes[..1], &mut scores, &params(0, f32::NAN)).is_err());
}
