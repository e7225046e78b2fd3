#![cfg(feature = "rayon")]

use detpost::lowlevel::{
    decode, decode_into_par, suppress, suppress_into_par, DecodeParams, Proposals, SuppressParams,
};
use detpost::{
    Extent, ModelShape, OverlapMetric, OwnedTensor, PostprocessConfig, Postprocessor,
    SensorOrientation,
};

const INPUT: f32 = 640.0;

/// Dense, overlapping synthetic output so suppression has real work to do.
fn make_tensor(num_classes: usize, proposals: usize) -> OwnedTensor {
    let features = 4 + num_classes;
    let mut data = Vec::with_capacity(features * proposals);
    for f in 0..features {
        for p in 0..proposals {
            let hash = (p.wrapping_mul(2654435761) ^ (f * 40503) ^ (p * f)) & 0xFFFF;
            let unit = hash as f32 / 65535.0;
            let value = match f {
                0 | 1 => 40.0 + unit * (INPUT - 80.0),
                2 | 3 => 10.0 + unit * 70.0,
                _ => unit,
            };
            data.push(value);
        }
    }
    OwnedTensor::new(data, features, proposals).unwrap()
}

fn decode_params(orientation: SensorOrientation) -> DecodeParams {
    DecodeParams {
        num_classes: 80,
        input_width: INPUT,
        input_height: INPUT,
        orientation,
        confidence_threshold: 0.25,
    }
}

#[test]
fn parallel_decode_matches_sequential() {
    let tensor = make_tensor(80, 2000);
    for orientation in [
        SensorOrientation::Deg0,
        SensorOrientation::Deg90,
        SensorOrientation::Deg270,
    ] {
        let params = decode_params(orientation);
        let seq = decode(tensor.view(), &params).unwrap();

        let mut par = Proposals::new(2000);
        let valid = decode_into_par(tensor.view(), &params, &mut par).unwrap();

        assert_eq!(valid, seq.valid_count());
        assert_eq!(par.boxes(), seq.boxes());
        assert_eq!(par.scores(), seq.scores());
        assert_eq!(par.classes(), seq.classes());
    }
}

#[test]
fn parallel_suppression_matches_sequential() {
    let tensor = make_tensor(80, 2000);
    let decoded = decode(tensor.view(), &decode_params(SensorOrientation::Deg90)).unwrap();

    for metric in [OverlapMetric::PixelInclusive, OverlapMetric::LegacyAsymmetric] {
        for top_n in [1usize, 30, 2000] {
            let params = SuppressParams {
                top_n,
                iou_threshold: 0.45,
                metric,
            };
            let mut seq_scores = decoded.scores().to_vec();
            let seq = suppress(decoded.boxes(), &mut seq_scores, &params).unwrap();

            let mut par_scores = decoded.scores().to_vec();
            let mut par = Vec::new();
            suppress_into_par(decoded.boxes(), &mut par_scores, &params, &mut par).unwrap();

            assert_eq!(par, seq);
            assert_eq!(par_scores, seq_scores);
        }
    }
}

#[test]
fn parallel_postprocessor_matches_sequential() {
    let tensor = make_tensor(80, 2000);
    let shape = ModelShape::new(80, 2000);
    let input = Extent::new(INPUT, INPUT);

    let mut seq = Postprocessor::new(shape, input, PostprocessConfig::default()).unwrap();
    let mut par = Postprocessor::new(
        shape,
        input,
        PostprocessConfig {
            parallel: true,
            ..PostprocessConfig::default()
        },
    )
    .unwrap();

    let a = seq.process(tensor.view(), SensorOrientation::Deg180).unwrap();
    let b = par.process(tensor.view(), SensorOrientation::Deg180).unwrap();
    assert!(!a.is_empty());
    assert_eq!(a, b);
}
