mod common;

use evalsum_core::ExtractionBackend;
use evalsum_pdf::backends::{LiteralScanBackend, LopdfPerPageBackend, TextObjectScanBackend};
use evalsum_pdf::{
    ExtractionPipeline, LikelyCause, PdfError, ProgressEvent, extract_text, maybe_compress,
};

const PARSER_BACKENDS: [&str; 3] = ["pdf-extract", "lopdf", "lopdf-per-page"];

#[test]
fn well_formed_pdf_is_read_by_a_parser() -> anyhow::Result<()> {
    let pdf = common::text_pdf(common::COMMENTS);
    let result = extract_text(&pdf)?;

    assert!(
        PARSER_BACKENDS.contains(&result.winning_backend.as_str()),
        "unexpected winner {}",
        result.winning_backend
    );
    assert!(result.cleaned_text.contains("Great course, learned a lot."));

    let (winner, losers) = result.attempts.split_last().unwrap();
    assert!(winner.succeeded);
    assert_eq!(winner.backend, result.winning_backend);
    assert!(losers.iter().all(|a| !a.succeeded && a.error.is_some()));
    Ok(())
}

#[test]
fn per_page_backend_marks_pages() -> anyhow::Result<()> {
    let pdf = common::text_pdf(common::COMMENTS);
    let text = LopdfPerPageBackend.extract(&pdf)?;
    assert!(text.starts_with("--- Page 1 ---\n"));
    Ok(())
}

#[test]
fn unparsable_pdf_falls_through_to_text_objects() -> anyhow::Result<()> {
    let pdf = common::unparsable_pdf(common::COMMENTS);

    assert!(LiteralScanBackend::default().extract(&pdf).is_err());

    let result = extract_text(&pdf)?;
    assert_eq!(result.winning_backend, "text-object-scan");
    assert_eq!(result.attempts.len(), 5);
    assert!(result.attempts[..4].iter().all(|a| !a.succeeded));
    assert!(result.cleaned_text.contains("This course was excellent"));
    for comment in common::COMMENTS {
        assert!(result.cleaned_text.contains(comment), "missing {comment}");
    }
    assert_eq!(result.cleaned_text.lines().count(), common::COMMENTS.len());
    Ok(())
}

#[test]
fn text_object_scan_ignores_noise_literals() -> anyhow::Result<()> {
    let pdf = common::unparsable_pdf(common::COMMENTS);
    let text = TextObjectScanBackend.extract(&pdf)?;
    assert_eq!(text, common::COMMENTS.join("\n"));
    Ok(())
}

#[test]
fn empty_pdf_exhausts_every_backend() {
    let pdf = common::empty_pdf();
    let mut events = Vec::new();
    let err = ExtractionPipeline::new()
        .run_with_progress(&pdf, |e| events.push(e))
        .unwrap_err();

    match err {
        PdfError::ExtractionExhausted {
            attempts,
            diagnostics,
        } => {
            assert_eq!(attempts.len(), 5);
            assert!(attempts.iter().all(|a| !a.succeeded));
            assert!(!diagnostics.has_stream);
            assert!(!diagnostics.has_bt);
            assert!(!diagnostics.has_tj);
            assert!(!diagnostics.has_encrypt);
            assert_eq!(diagnostics.paren_count, 0);
            assert_eq!(diagnostics.likely_cause(), LikelyCause::NoContent);
        }
        other => panic!("expected ExtractionExhausted, got {other:?}"),
    }

    assert_eq!(events.last(), Some(&ProgressEvent::Finished { success: false }));
    let percents: Vec<u8> = events.iter().map(ProgressEvent::percent).collect();
    assert!(percents.windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn non_pdf_is_rejected_before_any_backend() {
    let err = extract_text(b"GIF89a not a pdf").unwrap_err();
    assert!(matches!(err, PdfError::InvalidFormat));
}

#[test]
fn compression_never_grows_the_upload() -> anyhow::Result<()> {
    let pdf = common::text_pdf(common::COMMENTS);
    let (out, info) = maybe_compress(pdf.clone(), 0);
    assert!(out.len() <= pdf.len());
    match info {
        Some(info) => assert!(info.compressed_bytes < info.original_bytes),
        None => assert_eq!(out, pdf),
    }

    let result = extract_text(&out)?;
    assert!(result.cleaned_text.contains("patience"));
    Ok(())
}
