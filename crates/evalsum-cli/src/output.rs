use std::io::Write;

use evalsum_core::{CompressionInfo, ExtractionAttempt, ProgressEvent};
use evalsum_pdf::PdfDiagnostics;
use indicatif::HumanBytes;
use owo_colors::OwoColorize;

/// Whether to use colored output.
#[derive(Debug, Clone, Copy)]
pub struct ColorMode(pub bool);

impl ColorMode {
    pub fn enabled(&self) -> bool {
        self.0
    }
}

/// Print a pipeline progress event as one line.
pub fn print_progress(
    w: &mut dyn Write,
    event: &ProgressEvent,
    color: ColorMode,
) -> std::io::Result<()> {
    match event {
        ProgressEvent::BackendStarted {
            backend,
            index,
            total,
            percent,
        } => {
            writeln!(
                w,
                "[{:>3}%] ({}/{}) Trying {}",
                percent,
                index + 1,
                total,
                backend
            )?;
        }
        ProgressEvent::BackendRejected {
            backend,
            reason,
            percent,
        } => {
            let line = format!("[{:>3}%] {} rejected: {}", percent, backend, reason);
            if color.enabled() {
                writeln!(w, "{}", line.yellow())?;
            } else {
                writeln!(w, "{}", line)?;
            }
        }
        ProgressEvent::BackendAccepted {
            backend,
            extracted_len,
            percent,
        } => {
            let line = format!(
                "[{:>3}%] {} accepted ({} chars)",
                percent, backend, extracted_len
            );
            if color.enabled() {
                writeln!(w, "{}", line.green())?;
            } else {
                writeln!(w, "{}", line)?;
            }
        }
        ProgressEvent::Cleaning { percent } => {
            writeln!(w, "[{:>3}%] Cleaning text", percent)?;
        }
        ProgressEvent::Finished { success } => {
            let status = if *success { "done" } else { "failed" };
            writeln!(w, "[100%] Extraction {}", status)?;
        }
    }
    Ok(())
}

/// Print the attempt log in the order backends ran.
pub fn print_attempts(
    w: &mut dyn Write,
    attempts: &[ExtractionAttempt],
    color: ColorMode,
) -> std::io::Result<()> {
    writeln!(w)?;
    writeln!(w, "Extraction attempts:")?;
    for attempt in attempts {
        let ms = attempt.elapsed.as_millis();
        if attempt.succeeded {
            let mark = format!(
                "  + {:<18} {:>7} chars {:>6} ms",
                attempt.backend, attempt.extracted_len, ms
            );
            if color.enabled() {
                writeln!(w, "{}", mark.green().bold())?;
            } else {
                writeln!(w, "{}", mark)?;
            }
        } else {
            let reason = attempt.error.as_deref().unwrap_or("rejected");
            let mark = format!(
                "  - {:<18} {:>7} chars {:>6} ms  {}",
                attempt.backend, attempt.extracted_len, ms, reason
            );
            if color.enabled() {
                writeln!(w, "{}", mark.dimmed())?;
            } else {
                writeln!(w, "{}", mark)?;
            }
        }
    }
    Ok(())
}

pub fn print_diagnostics(
    w: &mut dyn Write,
    diagnostics: &PdfDiagnostics,
    color: ColorMode,
) -> std::io::Result<()> {
    let cause = diagnostics.likely_cause().message();
    if color.enabled() {
        writeln!(w, "{}", "No text could be extracted from this PDF.".red().bold())?;
        writeln!(w, "{}", cause.yellow())?;
    } else {
        writeln!(w, "No text could be extracted from this PDF.")?;
        writeln!(w, "{}", cause)?;
    }
    writeln!(
        w,
        "  size: {}, streams: {}, BT: {}, Tj: {}, encrypted: {}, string literals: {}",
        HumanBytes(diagnostics.size_bytes as u64),
        diagnostics.has_stream,
        diagnostics.has_bt,
        diagnostics.has_tj,
        diagnostics.has_encrypt,
        diagnostics.paren_count
    )?;
    Ok(())
}

pub fn print_compression(
    w: &mut dyn Write,
    info: &CompressionInfo,
    color: ColorMode,
) -> std::io::Result<()> {
    let line = format!(
        "Compressed {} -> {} ({:.1}% smaller)",
        HumanBytes(info.original_bytes as u64),
        HumanBytes(info.compressed_bytes as u64),
        info.ratio()
    );
    if color.enabled() {
        writeln!(w, "{}", line.cyan())
    } else {
        writeln!(w, "{}", line)
    }
}
