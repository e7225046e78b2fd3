use detpost::lowlevel::{decode, suppress, DecodeParams, SuppressParams};
use detpost::{
    Extent, ModelShape, OverlapMetric, OwnedTensor, PostprocessConfig, Postprocessor,
    SensorOrientation,
};
use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;

const NUM_CLASSES: usize = 80;
const PROPOSALS: usize = 8400;
const INPUT: f32 = 640.0;

/// YOLO-sized output with a sparse set of confident proposals.
fn make_tensor() -> OwnedTensor {
    let features = 4 + NUM_CLASSES;
    let mut data = Vec::with_capacity(features * PROPOSALS);
    for f in 0..features {
        for p in 0..PROPOSALS {
            let hash = (p.wrapping_mul(2654435761) ^ (f * 97) ^ (p * f)) & 0xFFFF;
            let unit = hash as f32 / 65535.0;
            let value = match f {
                0 | 1 => 40.0 + unit * (INPUT - 80.0),
                2 | 3 => 10.0 + unit * 90.0,
                _ => unit * unit * unit,
            };
            data.push(value);
        }
    }
    OwnedTensor::new(data, features, PROPOSALS).unwrap()
}

fn bench_postprocess(c: &mut Criterion) {
    let tensor = make_tensor();
    let decode_params = DecodeParams {
        num_classes: NUM_CLASSES,
        input_width: INPUT,
        input_height: INPUT,
        orientation: SensorOrientation::Deg90,
        confidence_threshold: 0.25,
    };

    c.bench_function("decode_84x8400", |b| {
        b.iter(|| black_box(decode(tensor.view(), &decode_params).unwrap()));
    });

    let decoded = decode(tensor.view(), &decode_params).unwrap();
    let suppress_params = SuppressParams {
        top_n: 30,
        iou_threshold: 0.45,
        metric: OverlapMetric::PixelInclusive,
    };
    c.bench_function("suppress_84x8400", |b| {
        b.iter(|| {
            let mut scores = decoded.scores().to_vec();
            black_box(suppress(decoded.boxes(), &mut scores, &suppress_params).unwrap())
        });
    });

    let shape = ModelShape::new(NUM_CLASSES, PROPOSALS);
    let input = Extent::new(INPUT, INPUT);
    let mut post = Postprocessor::new(shape, input, PostprocessConfig::default()).unwrap();
    c.bench_function("postprocess_84x8400", |b| {
        b.iter(|| black_box(post.process(tensor.view(), SensorOrientation::Deg90).unwrap()));
    });

    if cfg!(feature = "rayon") {
        let mut post_par = Postprocessor::new(
            shape,
            input,
            PostprocessConfig {
                parallel: true,
                ..PostprocessConfig::default()
            },
        )
        .unwrap();
        c.bench_function("postprocess_84x8400_parallel", |b| {
            b.iter(|| {
                black_box(
                    post_par
                        .process(tensor.view(), SensorOrientation::Deg90)
                        .unwrap(),
                )
            });
        });
    }
}

criterion_group!(benches, bench_postprocess);
criterion_main!(benches);
