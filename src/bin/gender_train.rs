use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use voice_gender::{AppConfig, Trainer};

#[derive(Parser, Debug)]
#[command(
    name = "gender_train",
    about = "Train the voice gender models from a folder-per-category dataset"
)]
struct Cli {
    /// Dataset root containing one folder per category
    #[arg(long)]
    dataset: PathBuf,
    /// Directory receiving the model artifacts
    #[arg(long)]
    out: PathBuf,
    /// JSON configuration file (defaults to ./voice_gender.json)
    #[arg(long)]
    config: Option<PathBuf>,
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
    let config = match &cli.config {
        Some(path) => AppConfig::load_from_file(path),
        None => AppConfig::load(),
    };

    let summary = Trainer::new(config)
        .run(&cli.dataset, &cli.out)
        .with_context(|| format!("training from {}", cli.dataset.display()))?;

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(ExitCode::from(0))
}
