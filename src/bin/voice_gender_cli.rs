use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use voice_gender::error::{log_extraction_error, ErrorCode, ExtractionError};
use voice_gender::{AppConfig, AppContext, PredictionOutcome};

/// Exit code when the audio could not be turned into features
const EXIT_NO_PREDICTION: u8 = 3;

#[derive(Parser, Debug)]
#[command(
    name = "voice_gender_cli",
    about = "Classify speaker gender from a voice recording"
)]
struct Cli {
    /// JSON configuration file (defaults to ./voice_gender.json)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Override the directory holding the model artifacts
    #[arg(long)]
    artifacts_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Predict with every model and print the results as JSON
    Predict {
        #[arg(long)]
        audio: PathBuf,
    },
    /// Print the extracted feature vector as JSON
    Features {
        #[arg(long)]
        audio: PathBuf,
    },
    /// Print the recorded model accuracies
    Accuracies,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => AppConfig::load_from_file(path),
        None => AppConfig::load(),
    };
    if let Some(dir) = cli.artifacts_dir {
        config.artifacts.dir = dir;
    }
    let context = AppContext::new(config);

    match cli.command {
        Commands::Predict { audio } => run_predict(&context, &audio),
        Commands::Features { audio } => run_features(&context, &audio),
        Commands::Accuracies => run_accuracies(&context),
    }
}

#[derive(Serialize)]
struct PredictionPayload<'a> {
    audio: String,
    predictions: Vec<ModelPayload<'a>>,
}

#[derive(Serialize)]
struct ModelPayload<'a> {
    model: &'static str,
    label: &'a str,
    probabilities: BTreeMap<&'a str, f64>,
}

fn run_predict(context: &AppContext, audio: &Path) -> Result<ExitCode> {
    let artifacts = context.artifacts().context("loading model artifacts")?;
    let outcome = context
        .predict_file(audio)
        .with_context(|| format!("predicting {}", audio.display()))?;

    let set = match outcome {
        PredictionOutcome::Predicted(set) => set,
        PredictionOutcome::NoPrediction(err) => return Ok(no_prediction(&err)),
    };

    let classes = artifacts.encoder().classes();
    let payload = PredictionPayload {
        audio: audio.display().to_string(),
        predictions: set
            .iter()
            .map(|(id, result)| ModelPayload {
                model: id.name(),
                label: &result.label,
                probabilities: classes
                    .iter()
                    .map(String::as_str)
                    .zip(result.probabilities.iter().copied())
                    .collect(),
            })
            .collect(),
    };

    println!("{}", serde_json::to_string_pretty(&payload)?);
    Ok(ExitCode::from(0))
}

#[derive(Serialize)]
struct FeaturesPayload<'a> {
    audio: String,
    features: &'a [f64],
}

fn run_features(context: &AppContext, audio: &Path) -> Result<ExitCode> {
    let features = match context.extract_features(audio) {
        Ok(features) => features,
        Err(err) => return Ok(no_prediction(&err)),
    };

    let payload = FeaturesPayload {
        audio: audio.display().to_string(),
        features: features.as_slice(),
    };
    println!("{}", serde_json::to_string_pretty(&payload)?);
    Ok(ExitCode::from(0))
}

fn run_accuracies(context: &AppContext) -> Result<ExitCode> {
    let (report, warning) = context.accuracy_report();
    if let Some(err) = warning {
        eprintln!("{}", err.message());
        eprintln!("No accuracy data available.");
        return Ok(ExitCode::from(0));
    }

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(ExitCode::from(0))
}

fn no_prediction(err: &ExtractionError) -> ExitCode {
    log_extraction_error(err, "voice_gender_cli");
    eprintln!("Failed to process the audio file: {}", err.message());
    ExitCode::from(EXIT_NO_PREDICTION)
}
