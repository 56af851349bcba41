//! Retro reader command-line entrypoint.
//!
//! Loads a reader, answers one query against one passage and prints the
//! result bundle as JSON. With no query or context it runs the example set
//! of the configured language.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use mimalloc::MiMalloc;
use tracing_subscriber::EnvFilter;

use retro_reader::config::ReaderConfig;
use retro_reader::constants::{Language, example_set};
use retro_reader::pipeline::RetroReader;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

/// Answer a question against a passage, or report that it has no answer.
#[derive(Parser, Debug)]
#[command(name = "retro-reader", version, about)]
struct Cli {
    /// YAML configuration file (falls back to $RETRO_CONFIG, then RETRO_* variables)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Question to answer
    #[arg(short, long)]
    query: Option<String>,

    /// Passage to search
    #[arg(short = 'x', long)]
    context: Option<String>,

    /// Example set used when the query or context is omitted
    #[arg(short, long)]
    lang: Option<Language>,

    /// Include the full n-best list and intermediate scores
    #[arg(short, long)]
    submodule_outputs: bool,
}

fn load_config(path: Option<PathBuf>) -> anyhow::Result<ReaderConfig> {
    let path = path.or_else(|| std::env::var_os(ReaderConfig::ENV_CONFIG_PATH).map(PathBuf::from));
    match path {
        Some(path) => {
            let mut config = ReaderConfig::from_yaml_file(&path)?;
            config.apply_env_overrides()?;
            tracing::info!(config_path = %path.display(), "Configuration loaded from file");
            Ok(config)
        }
        None => Ok(ReaderConfig::from_env()?),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = load_config(cli.config)?;
    if let Some(language) = cli.lang {
        config.language = language;
    }
    let example = example_set(config.language);
    let query = cli.query.unwrap_or_else(|| example.query.to_string());
    let context = cli.context.unwrap_or_else(|| example.context.to_string());

    if config.is_stub() {
        tracing::warn!("No model paths configured, running both readers in stub mode");
    }

    let reader = RetroReader::load(config).context("failed to load reader")?;

    let bundle = reader
        .infer_with_cancel(&query, &context, cli.submodule_outputs, async {
            if tokio::signal::ctrl_c().await.is_err() {
                std::future::pending::<()>().await;
            }
        })
        .await
        .context("inference failed")?;

    println!("{}", serde_json::to_string_pretty(&bundle)?);
    Ok(())
}
