use clap::Parser;
use detpost::lowlevel::load_f32_le;
use detpost::{
    Detection, Extent, FrameStats, LabelPolicy, LabelTable, ModelShape, OverlapMetric,
    PostprocessConfig, Postprocessor, SensorOrientation,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const SCHEMA_JSON: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.schema.json"));
const EXAMPLE_JSON: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.example.json"));

#[derive(Parser, Debug)]
#[command(author, version, about = "Detection postprocessing CLI (JSON config driven)")]
struct Cli {
    /// Path to the JSON configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "config.json")]
    config: PathBuf,
    /// Print the JSON schema and exit.
    #[arg(long)]
    print_schema: bool,
    /// Print an example config and exit.
    #[arg(long)]
    print_example: bool,
    /// Enable tracing output for performance profiling.
    #[arg(long)]
    trace: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum OverlapConfig {
    PixelInclusive,
    LegacyAsymmetric,
}

impl From<OverlapConfig> for OverlapMetric {
    fn from(value: OverlapConfig) -> Self {
        match value {
            OverlapConfig::PixelInclusive => OverlapMetric::PixelInclusive,
            OverlapConfig::LegacyAsymmetric => OverlapMetric::LegacyAsymmetric,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum LabelPolicyConfig {
    Strict,
    Wrap,
}

impl From<LabelPolicyConfig> for LabelPolicy {
    fn from(value: LabelPolicyConfig) -> Self {
        match value {
            LabelPolicyConfig::Strict => LabelPolicy::Strict,
            LabelPolicyConfig::Wrap => LabelPolicy::Wrap,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum PresetConfig {
    Default,
    LegacyOverlay,
}

/// Overrides applied on top of the chosen preset.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct PostprocessConfigJson {
    preset: Option<PresetConfig>,
    confidence_threshold: Option<f32>,
    iou_threshold: Option<f32>,
    max_results: Option<usize>,
    overlap: Option<OverlapConfig>,
    skip_index_zero: Option<bool>,
    label_policy: Option<LabelPolicyConfig>,
    parallel: Option<bool>,
}

impl PostprocessConfigJson {
    fn resolve(self) -> PostprocessConfig {
        let mut cfg = match self.preset {
            Some(PresetConfig::LegacyOverlay) => PostprocessConfig::legacy_overlay(),
            Some(PresetConfig::Default) | None => PostprocessConfig::default(),
        };
        if let Some(v) = self.confidence_threshold {
            cfg.confidence_threshold = v;
        }
        if let Some(v) = self.iou_threshold {
            cfg.iou_threshold = v;
        }
        if let Some(v) = self.max_results {
            cfg.max_results = v;
        }
        if let Some(v) = self.overlap {
            cfg.overlap = v.into();
        }
        if let Some(v) = self.skip_index_zero {
            cfg.skip_index_zero = v;
        }
        if let Some(v) = self.label_policy {
            cfg.label_policy = v.into();
        }
        if let Some(v) = self.parallel {
            cfg.parallel = v;
        }
        cfg
    }
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct Config {
    tensor_path: String,
    num_classes: usize,
    num_proposals: usize,
    input_width: f32,
    input_height: f32,
    orientation: i32,
    image_width: Option<f32>,
    image_height: Option<f32>,
    labels_path: Option<String>,
    output_path: Option<String>,
    postprocess: PostprocessConfigJson,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tensor_path: String::new(),
            num_classes: 80,
            num_proposals: 8400,
            input_width: 640.0,
            input_height: 640.0,
            orientation: SensorOrientation::default().degrees(),
            image_width: None,
            image_height: None,
            labels_path: None,
            output_path: None,
            postprocess: PostprocessConfigJson::default(),
        }
    }
}

#[derive(Debug, Serialize)]
struct DetectionRecord {
    bbox: [f32; 4],
    score: f32,
    class_index: usize,
    label: Option<String>,
    proposal_index: usize,
}

impl From<Detection> for DetectionRecord {
    fn from(value: Detection) -> Self {
        Self {
            bbox: value.bbox.to_array(),
            score: value.score,
            class_index: value.class_index,
            label: value.label,
            proposal_index: value.proposal_index,
        }
    }
}

#[derive(Debug, Serialize)]
struct StatsRecord {
    proposals: usize,
    valid: usize,
    kept: usize,
    elapsed_us: u64,
}

impl From<FrameStats> for StatsRecord {
    fn from(value: FrameStats) -> Self {
        Self {
            proposals: value.proposals,
            valid: value.valid,
            kept: value.kept,
            elapsed_us: value.elapsed_micros(),
        }
    }
}

#[derive(Debug, Serialize)]
struct Output {
    detections: Vec<DetectionRecord>,
    stats: Option<StatsRecord>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.trace {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env().add_directive("detpost=debug".parse()?))
            .with_target(false)
            .init();
    }

    if cli.print_schema {
        println!("{SCHEMA_JSON}");
        return Ok(());
    }
    if cli.print_example {
        println!("{EXAMPLE_JSON}");
        return Ok(());
    }

    let config_text = fs::read_to_string(&cli.config)?;
    let config: Config = serde_json::from_str(&config_text)?;
    if config.tensor_path.is_empty() {
        return Err("tensor_path must be set in the config".into());
    }
    let image = match (config.image_width, config.image_height) {
        (Some(width), Some(height)) => Some(Extent::new(width, height)),
        (None, None) => None,
        _ => return Err("image_width and image_height must be set together".into()),
    };

    let shape = ModelShape::new(config.num_classes, config.num_proposals);
    let input = Extent::new(config.input_width, config.input_height);
    let tensor = load_f32_le(&config.tensor_path, shape.features(), shape.num_proposals)?;

    let mut post = Postprocessor::new(shape, input, config.postprocess.resolve())?;
    if let Some(path) = &config.labels_path {
        post = post.with_labels(LabelTable::load(path)?);
    }

    let orientation = SensorOrientation::from_degrees(config.orientation);
    let detections = match image {
        Some(image) => post.process_scaled(tensor.view(), orientation, image)?,
        None => post.process(tensor.view(), orientation)?,
    };

    tracing::info!(
        kept = detections.len(),
        orientation = orientation.degrees(),
        "processed {}",
        config.tensor_path
    );

    let output = Output {
        detections: detections.into_iter().map(DetectionRecord::from).collect(),
        stats: post.last_stats().map(StatsRecord::from),
    };
    let json = serde_json::to_string_pretty(&output)?;

    match config.output_path {
        Some(path) => fs::write(path, json)?,
        None => println!("{json}"),
    }

    Ok(())
}
