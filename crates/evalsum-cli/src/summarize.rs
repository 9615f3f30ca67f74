//! The `summarize` command: drives the upload session from key check to results.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use evalsum_core::credential::{self, KeyCheck};
use evalsum_core::{
    AnthropicClient, CompressionInfo, Config, SessionEvent, SessionState, SourceDocument,
    Summarizer, SummaryInput,
};
use evalsum_pdf::cleaner::truncate;
use evalsum_pdf::{ExtractionPipeline, PdfError, maybe_compress};

use crate::output::{self, ColorMode};

const TICK: Duration = Duration::from_millis(250);

pub struct Options {
    pub pdf: PathBuf,
    pub api_key: String,
    pub direct: bool,
    pub output: Option<PathBuf>,
    pub config: Config,
    pub color: ColorMode,
}

pub async fn run(opts: Options) -> anyhow::Result<()> {
    let client = AnthropicClient::from_config(&opts.config)?;
    let pipeline = Arc::new(ExtractionPipeline::from_config(&opts.config)?);
    let mut stderr = std::io::stderr();

    // Credential step
    let session = SessionState::new();
    let session = match credential::check_key(&client, &opts.api_key).await {
        KeyCheck::Valid => session.transition(SessionEvent::KeyValidated {
            api_key: opts.api_key.clone(),
        })?,
        KeyCheck::Malformed => anyhow::bail!(
            "API key {} is malformed (expected {}...)",
            credential::redact(&opts.api_key),
            credential::KEY_PREFIX
        ),
        KeyCheck::Rejected(e) => anyhow::bail!("API key rejected: {}", e),
    };

    // Upload step
    let (file, compression) = load_document(&opts, &mut stderr).await?;
    let session = session.transition(SessionEvent::FileSelected { file, compression })?;
    if let Some(error) = session.last_error() {
        anyhow::bail!("{}", error);
    }

    // Confirm step
    if let Some(doc) = session.selected_file() {
        writeln!(
            stderr,
            "{} {} ({}){}",
            if opts.direct { "Sending" } else { "Analyzing" },
            doc.original_filename(),
            indicatif::HumanBytes(doc.size_bytes() as u64),
            if opts.direct { " as a document" } else { "" }
        )?;
    }
    let mut session = session.transition(SessionEvent::Confirmed)?;

    // Processing step
    let (api_key, doc) = match (session.api_key(), session.selected_file()) {
        (Some(key), Some(doc)) => (key.to_string(), doc.clone()),
        _ => anyhow::bail!("session lost its file before processing"),
    };

    let bar = ProgressBar::new(100);
    bar.set_style(
        ProgressStyle::with_template("{spinner:.green} {msg} [{bar:40.green/dim}] {pos}%")?
            .progress_chars("=> "),
    );
    bar.set_message("Processing");

    let work = process(
        &client,
        &pipeline,
        &doc,
        &api_key,
        opts.direct,
        opts.config.summary_text_chars,
    );
    let outcome = {
        let animate = async {
            let mut interval = tokio::time::interval(TICK);
            loop {
                interval.tick().await;
                if let Some(progress) = session.progress_mut() {
                    bar.set_position(u64::from(progress.tick()));
                }
            }
        };
        tokio::select! {
            result = tokio::time::timeout(opts.config.request_timeout(), work) => result,
            _ = animate => unreachable!("progress animation never finishes"),
        }
    };

    let event = match outcome {
        Ok(Ok(summary)) => {
            if let Some(progress) = session.progress_mut() {
                progress.complete();
                bar.set_position(u64::from(progress.percent()));
            }
            bar.finish_and_clear();
            SessionEvent::Completed { summary }
        }
        Ok(Err(error)) => {
            bar.abandon();
            SessionEvent::Failed {
                error: error.to_string(),
            }
        }
        Err(_) => {
            bar.abandon();
            SessionEvent::TimedOut
        }
    };
    let session = session.transition(event)?;

    // Results step, or back to upload with the error
    match session.summary() {
        Some(summary) => {
            write_summary(&opts, summary)?;
            Ok(())
        }
        None => anyhow::bail!(
            "{}",
            session.last_error().unwrap_or("processing failed")
        ),
    }
}

/// Read the PDF, compressing it first in direct mode.
async fn load_document(
    opts: &Options,
    stderr: &mut dyn Write,
) -> anyhow::Result<(SourceDocument, Option<CompressionInfo>)> {
    let bytes = tokio::fs::read(&opts.pdf).await?;
    let filename = opts
        .pdf
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload.pdf".to_string());

    let (bytes, compression) = if opts.direct {
        let threshold = opts.config.compress_threshold_bytes;
        tokio::task::spawn_blocking(move || maybe_compress(bytes, threshold)).await?
    } else {
        (bytes, None)
    };
    if let Some(info) = &compression {
        output::print_compression(stderr, info, opts.color)?;
    }
    if opts.direct && bytes.len() > opts.config.direct_warn_bytes {
        tracing::warn!(
            size_bytes = bytes.len(),
            "document is larger than recommended for direct mode"
        );
    }

    Ok((SourceDocument::new(bytes, filename, None), compression))
}

/// Extract-then-summarize, or send the document as-is in direct mode.
async fn process(
    client: &dyn Summarizer,
    pipeline: &Arc<ExtractionPipeline>,
    doc: &SourceDocument,
    api_key: &str,
    direct: bool,
    text_cap: usize,
) -> anyhow::Result<String> {
    if direct {
        let summary = client
            .summarize(
                SummaryInput::Document {
                    bytes: doc.bytes(),
                    filename: doc.original_filename(),
                },
                api_key,
            )
            .await?;
        return Ok(summary);
    }

    let worker = Arc::clone(pipeline);
    let bytes = doc.bytes().to_vec();
    let extraction = match tokio::task::spawn_blocking(move || worker.run(&bytes)).await? {
        Ok(extraction) => extraction,
        Err(PdfError::ExtractionExhausted { diagnostics, .. }) => {
            anyhow::bail!(
                "No text found in PDF. {}",
                diagnostics.likely_cause().message()
            )
        }
        Err(e) => return Err(e.into()),
    };
    tracing::info!(
        backend = %extraction.winning_backend,
        cleaned_chars = extraction.cleaned_text.chars().count(),
        "extraction complete"
    );

    let forwarded = truncate(&extraction.cleaned_text, text_cap);
    let summary = client
        .summarize(SummaryInput::Text(&forwarded), api_key)
        .await?;
    Ok(summary)
}

fn write_summary(opts: &Options, summary: &str) -> anyhow::Result<()> {
    match &opts.output {
        Some(path) => {
            std::fs::write(path, summary)?;
            eprintln!("Summary written to {}", path.display());
        }
        None => {
            let mut stdout = std::io::stdout();
            writeln!(stdout, "{}", summary)?;
        }
    }
    Ok(())
}
