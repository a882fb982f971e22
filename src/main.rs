//! pdftk-forms - Entry point
//!
//! Command-line access to form inspection and filling.

use anyhow::Context;
use clap::{Parser, Subcommand};
use pdftk_forms::{DocumentInfo, FieldValues, FillOptions, PdfForms, PdftkConfig};
use std::path::{Path, PathBuf};
use tokio::io::AsyncReadExt;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "pdftk-forms")]
#[command(version)]
#[command(about = "Inspect and fill PDF forms with pdftk")]
struct Cli {
    /// pdftk executable
    #[arg(long, global = true, env = "PDFTK_PATH", default_value = "pdftk")]
    pdftk: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the fields of a PDF form as JSON
    Fields {
        /// PDF form to inspect
        pdf: PathBuf,
    },

    /// Fill a PDF form from a JSON object of field values
    Fill {
        /// PDF form to fill
        pdf: PathBuf,

        /// JSON object mapping field names to values ("-" reads stdin)
        #[arg(short, long)]
        data: PathBuf,

        /// JSON object of document info (title, author, creationDate, ...)
        #[arg(long)]
        info: Option<PathBuf>,

        /// Keep the form fields editable
        #[arg(long)]
        no_flatten: bool,

        /// Log a correlation label and timing for the fill
        #[arg(short, long)]
        verbose: bool,

        /// Output file (writes to stdout if not provided)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pdftk_forms=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let forms = PdfForms::with_config(PdftkConfig::with_program(cli.pdftk));

    match cli.command {
        Commands::Fields { pdf } => {
            let fields = forms
                .fields(&pdf)
                .await
                .with_context(|| format!("Failed to read fields of {}", pdf.display()))?;
            println!("{}", serde_json::to_string_pretty(&fields)?);
        }
        Commands::Fill {
            pdf,
            data,
            info,
            no_flatten,
            verbose,
            output,
        } => {
            let values: FieldValues = serde_json::from_slice(&read_input(&data).await?)
                .with_context(|| format!("Invalid field values in {}", data.display()))?;

            let info = match info {
                Some(path) => Some(
                    serde_json::from_slice::<DocumentInfo>(&read_input(&path).await?)
                        .with_context(|| format!("Invalid document info in {}", path.display()))?,
                ),
                None => None,
            };

            let options = FillOptions {
                flatten: !no_flatten,
                info,
                verbose,
            };

            let filled = forms
                .fill(&pdf, &values, &options)
                .await
                .with_context(|| format!("Failed to fill {}", pdf.display()))?;

            let written = match &output {
                Some(path) => {
                    let mut file = tokio::fs::File::create(path)
                        .await
                        .with_context(|| format!("Failed to create {}", path.display()))?;
                    filled.copy_to(&mut file).await?
                }
                None => filled.copy_to(&mut tokio::io::stdout()).await?,
            };

            tracing::info!(bytes = written, "Filled PDF written");
        }
    }

    Ok(())
}

/// Read a file, or stdin for `-`.
async fn read_input(path: &Path) -> anyhow::Result<Vec<u8>> {
    if path == Path::new("-") {
        let mut data = Vec::new();
        tokio::io::stdin().read_to_end(&mut data).await?;
        return Ok(data);
    }

    tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))
}
