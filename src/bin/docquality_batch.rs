use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use docquality::{
    config::Config,
    extraction::DocType,
    logging,
    metadata::BatchExtractor,
    quality::QualityAssessment,
};

#[derive(Parser)]
#[command(
    name = "docquality-batch",
    about = "Offline document quality assessment and metadata extraction"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Assess every PDF in a directory and write one metadata record per document.
    Metadata {
        /// Directory holding the PDF files (defaults to `PDF_DIR`).
        #[arg(long)]
        input_dir: Option<PathBuf>,
        /// Directory receiving records of valid documents (defaults to `VALID_META_DIR`).
        #[arg(long)]
        output_valid: Option<PathBuf>,
        /// Directory receiving records of invalid documents (defaults to `INVALID_META_DIR`).
        #[arg(long)]
        output_invalid: Option<PathBuf>,
        /// Only process the first N files in name order.
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Assess one file and print the verdict as JSON.
    Assess {
        /// Document to assess.
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    dotenvy::dotenv().ok();
    let config = Config::from_env().context("failed to load configuration")?;
    logging::init_tracing(&config.log_file);

    let engine =
        QualityAssessment::from_config(&config).context("failed to build quality engine")?;

    match cli.command {
        Command::Metadata {
            input_dir,
            output_valid,
            output_invalid,
            limit,
        } => {
            let input_dir = input_dir.unwrap_or_else(|| config.pdf_dir.clone());
            let valid_dir = output_valid.unwrap_or_else(|| config.valid_meta_dir.clone());
            let invalid_dir = output_invalid.unwrap_or_else(|| config.invalid_meta_dir.clone());

            let summary = BatchExtractor::new(&engine)
                .extract_all(&input_dir, &valid_dir, &invalid_dir, limit)
                .await
                .with_context(|| format!("batch over {} failed", input_dir.display()))?;

            println!(
                "processed {} file(s): {} valid, {} invalid, {} skipped, {} unreadable",
                summary.discovered, summary.valid, summary.invalid, summary.skipped, summary.failed
            );
        }
        Command::Assess { file } => {
            let file_name = file
                .file_name()
                .and_then(|name| name.to_str())
                .context("file path has no usable file name")?
                .to_string();
            let doc_type = DocType::from_file_name(&file_name)?;
            let bytes =
                fs::read(&file).with_context(|| format!("failed to read {}", file.display()))?;

            let verdict = engine.validate_named(&bytes, doc_type, &file_name).await;
            println!("{}", serde_json::to_string_pretty(&verdict)?);
        }
    }

    Ok(())
}
