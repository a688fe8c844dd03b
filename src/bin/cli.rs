//! CLI application for body measurements from pose landmarks.
//!
//! Usage:
//!   tailor-measure <landmarks.json>...                 # Human-readable output
//!   tailor-measure <landmarks.json> --json             # JSON output
//!   tailor-measure <landmarks.json> --unit cm -o out.json

use clap::Parser;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tailor_measure::{
    Error, LandmarkSet, MeasurementConfig, MeasurementPipeline, MeasurementSet, MeasurementStats,
    MeasurementSummary, QualityReport, ScaleFactor, Unit,
};

#[derive(Parser, Debug)]
#[command(name = "tailor-measure")]
#[command(author, version, about = "Body measurements from pose landmarks", long_about = None)]
struct Args {
    /// Landmark JSON files produced by the pose detector
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Output as JSON
    #[arg(short, long)]
    json: bool,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output unit: inches or cm (default: configured base unit)
    #[arg(short, long)]
    unit: Option<Unit>,

    /// Configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Include per-file summaries and aggregate statistics
    #[arg(long)]
    summary: bool,

    /// Show verbose output
    #[arg(short, long)]
    verbose: bool,
}

/// Output structure for JSON serialization
#[derive(Serialize)]
struct Output {
    files: Vec<FileOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stats: Option<MeasurementStats>,
}

#[derive(Serialize)]
struct FileOutput {
    input: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    image: Option<ImageOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    measurements: Option<MeasurementSet>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<MeasurementSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    quality: Option<QualityReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    scale: Option<ScaleFactor>,
    fallback: bool,
    processing_ms: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Serialize)]
struct ImageOutput {
    width: u32,
    height: u32,
}

impl FileOutput {
    fn failed(input: &Path, error: &Error) -> Self {
        Self {
            input: input.display().to_string(),
            image: None,
            measurements: None,
            summary: None,
            quality: None,
            scale: None,
            fallback: false,
            processing_ms: 0.0,
            error: Some(error.to_string()),
        }
    }
}

fn main() {
    let args = Args::parse();

    let default_filter = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    match run(&args) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Returns whether every input was measured.
fn run(args: &Args) -> Result<bool, Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => MeasurementConfig::load_from_file(path)?,
        None => MeasurementConfig::load_from_file(MeasurementConfig::default_path())?,
    };
    config.apply_env_overrides();
    config.validate()?;

    let unit = args.unit.unwrap_or(config.base_unit);
    let pipeline = MeasurementPipeline::new(config);

    let mut files = Vec::with_capacity(args.inputs.len());
    let mut all_ok = true;

    for input in &args.inputs {
        log::info!("Measuring {:?}", input);
        let output = match load_landmarks(input) {
            Ok(landmarks) => measure(&pipeline, input, &landmarks, unit, args.summary),
            Err(e) => FileOutput::failed(input, &e),
        };
        all_ok &= output.error.is_none();
        files.push(output);
    }

    let stats = args.summary.then(|| {
        MeasurementStats::from_sets(files.iter().filter_map(|f| f.measurements.as_ref()))
    });
    let output = Output { files, stats };

    // Generate output
    let output_str = if args.json {
        serde_json::to_string_pretty(&output)?
    } else {
        format_human_readable(&output)
    };

    // Write output
    if let Some(ref path) = args.output {
        std::fs::write(path, &output_str)?;
        log::info!("Output written to {:?}", path);
    } else {
        println!("{}", output_str);
    }

    Ok(all_ok)
}

fn load_landmarks(path: &Path) -> Result<LandmarkSet, Error> {
    let contents = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}

fn measure(
    pipeline: &MeasurementPipeline,
    input: &Path,
    landmarks: &LandmarkSet,
    unit: Unit,
    with_summary: bool,
) -> FileOutput {
    let report = match pipeline.run(landmarks) {
        Ok(report) => report,
        Err(e) => return FileOutput::failed(input, &e),
    };

    let measurements = report.measurements.convert_to(unit);
    FileOutput {
        input: input.display().to_string(),
        image: Some(ImageOutput {
            width: landmarks.width(),
            height: landmarks.height(),
        }),
        summary: with_summary.then(|| MeasurementSummary::from_set(&measurements)),
        measurements: Some(measurements),
        quality: report.quality,
        scale: report.scale,
        fallback: report.fallback,
        processing_ms: report.elapsed.as_secs_f64() * 1000.0,
        error: None,
    }
}

fn format_human_readable(output: &Output) -> String {
    let mut s = String::new();

    for file in &output.files {
        s.push_str(&format!("--- {} ---\n", file.input));

        if let Some(ref error) = file.error {
            s.push_str(&format!("Error: {}\n\n", error));
            continue;
        }

        if let Some(ref image) = file.image {
            s.push_str(&format!("Image: {}x{}\n", image.width, image.height));
        }
        if let Some(ref q) = file.quality {
            s.push_str(&format!(
                "Pose quality: {:.2} (visibility {:.2}, symmetry {:.2}, posture {:.2})\n",
                q.overall, q.visibility_score, q.symmetry_score, q.posture_score
            ));
        }
        if let Some(ref scale) = file.scale {
            let note = if scale.is_fallback() { " (image-height fallback)" } else { "" };
            s.push_str(&format!("Scale: {:.4}{}\n", scale.value, note));
        }
        if file.fallback {
            s.push_str("Warning: estimation failed, showing default measurements\n");
        }

        if let Some(ref set) = file.measurements {
            s.push_str("\nMeasurements:\n");
            for (kind, m) in set.iter() {
                s.push_str(&format!("  {:<10} {}\n", kind.key(), m));
            }
            s.push_str(&format!("  {:<10} {}\n", "confidence", set.confidence_label()));
        }
        s.push_str(&format!("\nProcessed in {:.1} ms\n\n", file.processing_ms));
    }

    if let Some(ref stats) = output.stats {
        s.push_str(&format!("Files measured: {}\n", stats.total_count));
        s.push_str(&format!("Average confidence: {:.0}%\n", stats.average_confidence));
    }

    s
}
