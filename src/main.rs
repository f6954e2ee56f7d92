use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use xcstrings_translate::{config::Config, run, RunOptions};

/// Translate the strings of an Xcode string catalog with an OpenAI model
/// and write the results back into the file.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Path to the .xcstrings file
    #[arg(long, default_value = "Localizable.xcstrings")]
    file: PathBuf,

    /// Target languages (comma-separated), e.g. zh,fr,de
    #[arg(long, value_delimiter = ',', default_value = "zh,fr,de")]
    languages: Vec<String>,

    /// Source language code; defaults to the catalog's sourceLanguage
    #[arg(long)]
    source_language: Option<String>,

    /// OpenAI API endpoint (overrides OPENAI_API_URL)
    #[arg(long)]
    openai_endpoint: Option<String>,

    /// Model name (overrides OPENAI_MODEL)
    #[arg(long)]
    model: Option<String>,

    /// Strings per request (overrides TRANSLATION_BATCH_SIZE)
    #[arg(long)]
    batch_size: Option<usize>,

    /// Print prompts, raw responses and token usage for every request
    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Load .env file (ignored when not present)
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    // Initialize logging
    let level = if args.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(format!("xcstrings_translate={}", level).parse()?),
        )
        .init();

    let config = Config::from_env()
        .context("Failed to load configuration")?
        .with_overrides(
            args.openai_endpoint.as_deref(),
            args.model.as_deref(),
            args.batch_size,
        );

    let mut options = RunOptions::new(args.file, args.languages);
    options.source_language = args.source_language;
    options.debug = args.debug;

    info!("Starting translation of {}", options.file.display());

    let report = match run(&config, &options).await {
        Ok(report) => report,
        Err(e) => {
            error!("Translation aborted: {}", e);
            return Err(e.into());
        }
    };

    println!("\nTranslation process completed!");
    println!("Total tokens used: {}", report.usage);

    if report.is_complete() {
        Ok(ExitCode::SUCCESS)
    } else {
        for failure in &report.failures {
            println!(
                "Untranslated ({}, batch {}): {}",
                failure.language,
                failure.batch,
                failure.keys.join(", ")
            );
        }
        println!("Re-run the command to retry the missing entries.");
        Ok(ExitCode::from(2))
    }
}
