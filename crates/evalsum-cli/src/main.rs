use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use evalsum_core::credential::{self, KeyCheck};
use evalsum_core::{AnthropicClient, Config, config_file};
use evalsum_pdf::{ExtractionPipeline, PdfError};

mod output;
mod summarize;

use output::ColorMode;

/// Course evaluation summarizer - extract comments from evaluation PDFs and
/// summarize them with Claude
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the extraction pipeline on a PDF and report every attempt
    Extract {
        /// Path to the evaluation PDF
        pdf: PathBuf,

        /// Keep only lines inside detected comment sections
        #[arg(long)]
        comments_only: bool,

        /// Print the cleaned text after the attempt log
        #[arg(long)]
        show_text: bool,
    },

    /// Check an Anthropic API key (format check, then a live call)
    CheckKey {
        /// API key (defaults to ANTHROPIC_API_KEY, then the config file)
        #[arg(long)]
        api_key: Option<String>,
    },

    /// Extract and summarize an evaluation PDF
    Summarize {
        /// Path to the evaluation PDF
        pdf: PathBuf,

        /// API key (defaults to ANTHROPIC_API_KEY, then the config file)
        #[arg(long)]
        api_key: Option<String>,

        /// Send the PDF itself to the model instead of extracted text
        #[arg(long)]
        direct: bool,

        /// Keep only lines inside detected comment sections
        #[arg(long)]
        comments_only: bool,

        /// Write the summary to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Give up after this many seconds
        #[arg(long)]
        timeout: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let color = ColorMode(!cli.no_color);

    // Resolve configuration: CLI flags > env vars > config file > defaults
    let config = Config::from_config_file(&config_file::load_config()).with_env_overrides();

    match cli.command {
        Command::Extract {
            pdf,
            comments_only,
            show_text,
        } => extract(&pdf, comments_only, show_text, config, color).await,
        Command::CheckKey { api_key } => check_key(api_key, config, color).await,
        Command::Summarize {
            pdf,
            api_key,
            direct,
            comments_only,
            output,
            timeout,
        } => {
            let mut config = config;
            config.comment_sections |= comments_only;
            if let Some(secs) = timeout {
                config.request_timeout_secs = secs;
            }
            let api_key = resolve_api_key(api_key, &config)?;
            let color = ColorMode(color.enabled() && output.is_none());
            summarize::run(summarize::Options {
                pdf,
                api_key,
                direct,
                output,
                config,
                color,
            })
            .await
        }
    }
}

fn resolve_api_key(flag: Option<String>, config: &Config) -> anyhow::Result<String> {
    flag.filter(|k| !k.is_empty())
        .or_else(|| config.api_key.clone())
        .ok_or_else(|| {
            anyhow::anyhow!(
                "No API key. Pass --api-key, set ANTHROPIC_API_KEY, or add api_key to [anthropic] in {}",
                config_file::config_path()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| ".evalsum.toml".to_string())
            )
        })
}

async fn extract(
    pdf: &Path,
    comments_only: bool,
    show_text: bool,
    mut config: Config,
    color: ColorMode,
) -> anyhow::Result<()> {
    config.comment_sections |= comments_only;
    let pipeline = Arc::new(ExtractionPipeline::from_config(&config)?);
    let bytes = tokio::fs::read(pdf).await?;

    let mut stdout = std::io::stdout();
    writeln!(stdout, "Extracting text from {}...", pdf.display())?;

    let worker = Arc::clone(&pipeline);
    let result = tokio::task::spawn_blocking(move || {
        let mut stderr = std::io::stderr();
        worker.run_with_progress(&bytes, |event| {
            let _ = output::print_progress(&mut stderr, &event, color);
        })
    })
    .await?;

    match result {
        Ok(extraction) => {
            output::print_attempts(&mut stdout, &extraction.attempts, color)?;
            writeln!(stdout)?;
            writeln!(
                stdout,
                "Winner: {} ({} raw chars, {} cleaned)",
                extraction.winning_backend,
                extraction.raw_text.chars().count(),
                extraction.cleaned_text.chars().count()
            )?;
            if show_text {
                writeln!(stdout)?;
                writeln!(stdout, "{}", extraction.cleaned_text)?;
            }
            Ok(())
        }
        Err(PdfError::ExtractionExhausted {
            attempts,
            diagnostics,
        }) => {
            output::print_attempts(&mut stdout, &attempts, color)?;
            writeln!(stdout)?;
            output::print_diagnostics(&mut stdout, &diagnostics, color)?;
            anyhow::bail!("all {} extraction backends failed", attempts.len())
        }
        Err(e) => Err(e.into()),
    }
}

async fn check_key(flag: Option<String>, config: Config, color: ColorMode) -> anyhow::Result<()> {
    use owo_colors::OwoColorize;

    let key = resolve_api_key(flag, &config)?;
    let client = AnthropicClient::from_config(&config)?;
    let shown = credential::redact(&key);

    match credential::check_key(&client, &key).await {
        KeyCheck::Valid => {
            let line = format!("API key {} is valid", shown);
            if color.enabled() {
                println!("{}", line.green());
            } else {
                println!("{}", line);
            }
            Ok(())
        }
        KeyCheck::Malformed => anyhow::bail!(
            "API key {} is malformed: expected it to start with {} and be at least 21 characters",
            shown,
            credential::KEY_PREFIX
        ),
        KeyCheck::Rejected(e) => anyhow::bail!("API key {} was rejected: {}", shown, e),
    }
}
