//! # house-price
//!
//! Command-line interface for training and using house price models.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use house_price_ml::{HouseFeatures, PricePredictor, TrainingConfig, TrainingPipeline};
use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "house-price")]
#[command(about = "Train and apply house price regression models", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fit the preprocessor, select the best model and save both artifacts
    Train {
        /// Training data (CSV with a `price` column)
        #[arg(long)]
        train: PathBuf,

        /// Held-out data used to score candidates (CSV)
        #[arg(long)]
        test: PathBuf,

        /// TOML configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Minimum held-out R² for the best model
        #[arg(long)]
        min_score: Option<f64>,

        /// Directory for the preprocessor and model artifacts
        #[arg(long)]
        artifact_dir: Option<PathBuf>,

        /// Write the training summary as JSON
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Predict prices for houses described in a JSON file
    Predict {
        /// A JSON object or array of objects with the house features
        #[arg(short, long)]
        input: PathBuf,

        /// TOML configuration file (for artifact locations)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum HouseInput {
    One(HouseFeatures),
    Many(Vec<HouseFeatures>),
}

fn load_config(path: Option<&Path>) -> Result<TrainingConfig> {
    match path {
        Some(path) => TrainingConfig::from_file(path)
            .with_context(|| format!("loading config from {}", path.display())),
        None => Ok(TrainingConfig::default()),
    }
}

fn train(
    train: &Path,
    test: &Path,
    config: Option<&Path>,
    min_score: Option<f64>,
    artifact_dir: Option<PathBuf>,
    report: Option<&Path>,
) -> Result<()> {
    let mut config = load_config(config)?;
    if let Some(min_score) = min_score {
        config.min_score = min_score;
    }
    if let Some(dir) = artifact_dir {
        config.artifact_dir = dir;
    }

    let summary = TrainingPipeline::new(config)
        .run(train, test)
        .context("training failed")?;

    print!("{}", summary.report);
    println!(
        "\nBest model: {} (R² = {:.4})\nPreprocessor: {}\nModel: {}",
        summary.model_name,
        summary.score,
        summary.preprocessor_path.display(),
        summary.model_path.display()
    );

    if let Some(path) = report {
        let file = File::create(path)
            .with_context(|| format!("creating report file {}", path.display()))?;
        serde_json::to_writer_pretty(file, &summary).context("writing report")?;
    }
    Ok(())
}

fn predict(input: &Path, config: Option<&Path>) -> Result<()> {
    let config = load_config(config)?;
    let predictor = PricePredictor::load(config.preprocessor_path(), config.model_path())
        .context("loading artifacts")?;

    let file = File::open(input).with_context(|| format!("opening {}", input.display()))?;
    let houses = match serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("parsing houses from {}", input.display()))?
    {
        HouseInput::One(house) => vec![house],
        HouseInput::Many(houses) => houses,
    };

    let prices = predictor.predict(&houses).context("prediction failed")?;
    println!("{}", serde_json::to_string_pretty(&prices)?);
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "house_price_ml=info,house_price=info".into()),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Train {
            train: train_path,
            test,
            config,
            min_score,
            artifact_dir,
            report,
        } => train(
            &train_path,
            &test,
            config.as_deref(),
            min_score,
            artifact_dir,
            report.as_deref(),
        ),
        Commands::Predict { input, config } => predict(&input, config.as_deref()),
    }
}
