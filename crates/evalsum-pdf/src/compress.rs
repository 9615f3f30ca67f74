//! Lossless PDF size reduction before direct document upload.

use std::panic::{AssertUnwindSafe, catch_unwind};

use lopdf::Document;

use crate::PdfError;
use evalsum_core::CompressionInfo;

/// Rewrite `bytes` with unused objects pruned and streams deflated.
///
/// The output may be larger than the input for already-compressed files;
/// callers that only want a size win should use [`maybe_compress`].
pub fn compress_pdf(bytes: &[u8]) -> Result<(Vec<u8>, CompressionInfo), PdfError> {
    let rewritten = catch_unwind(AssertUnwindSafe(|| rewrite(bytes)))
        .map_err(|_| PdfError::Compression("PDF parser panicked".to_string()))??;

    let info = CompressionInfo {
        original_bytes: bytes.len(),
        compressed_bytes: rewritten.len(),
    };
    Ok((rewritten, info))
}

fn rewrite(bytes: &[u8]) -> Result<Vec<u8>, PdfError> {
    let mut doc = Document::load_mem(bytes).map_err(|e| PdfError::Compression(e.to_string()))?;
    let pruned = doc.prune_objects().len();
    let emptied = doc.delete_zero_length_streams().len();
    doc.compress();
    tracing::debug!(pruned, emptied, "rewrote PDF objects");

    let mut out = Vec::with_capacity(bytes.len());
    doc.save_to(&mut out).map_err(|e| PdfError::Compression(e.to_string()))?;
    Ok(out)
}

/// Compress `bytes` if they exceed `threshold` and the rewrite actually helps.
///
/// Any failure falls back to the original bytes; compression is never fatal.
pub fn maybe_compress(bytes: Vec<u8>, threshold: usize) -> (Vec<u8>, Option<CompressionInfo>) {
    if bytes.len() <= threshold {
        return (bytes, None);
    }

    match compress_pdf(&bytes) {
        Ok((compressed, info)) if info.compressed_bytes < info.original_bytes => {
            tracing::info!(
                original_bytes = info.original_bytes,
                compressed_bytes = info.compressed_bytes,
                saved_pct = format!("{:.1}", info.ratio()),
                "compressed PDF"
            );
            (compressed, Some(info))
        }
        Ok((_, info)) => {
            tracing::info!(
                original_bytes = info.original_bytes,
                compressed_bytes = info.compressed_bytes,
                "compression did not reduce size, keeping original"
            );
            (bytes, None)
        }
        Err(e) => {
            tracing::warn!(error = %e, "PDF compression failed, using original file");
            (bytes, None)
        }
    }
}

#[cfg(test)]
mod tests {
    use lopdf::content::{Content, Operation};
    use lopdf::{Object, Stream, dictionary};

    use super::*;

    /// An uncompressed one-page document with a bulky content stream and an
    /// unreachable object.
    fn bloated_pdf() -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut operations = vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 10.into()]),
            Operation::new("TL", vec![12.into()]),
            Operation::new("Td", vec![50.into(), 800.into()]),
        ];
        for _ in 0..200 {
            operations.push(Operation::new(
                "Tj",
                vec![Object::string_literal("The lectures were clear and well paced.")],
            ));
            operations.push(Operation::new("T*", vec![]));
        }
        operations.push(Operation::new("ET", vec![]));
        let content = Content { operations };
        let content_id =
            doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        // Orphan that pruning should drop.
        doc.add_object(Stream::new(dictionary! {}, vec![b'x'; 4096]));

        let mut buf = Vec::new();
        doc.save_to(&mut buf).unwrap();
        buf
    }

    #[test]
    fn compress_shrinks_bloated_document() {
        let original = bloated_pdf();
        let (compressed, info) = compress_pdf(&original).unwrap();
        assert_eq!(info.original_bytes, original.len());
        assert_eq!(info.compressed_bytes, compressed.len());
        assert!(compressed.len() < original.len());
        assert!(info.ratio() > 0.0);
        assert!(compressed.starts_with(b"%PDF"));
    }

    #[test]
    fn compressed_output_keeps_its_text() {
        let (compressed, _) = compress_pdf(&bloated_pdf()).unwrap();
        let doc = Document::load_mem(&compressed).unwrap();
        let text = doc.extract_text(&[1]).unwrap();
        assert!(text.contains("lectures"));
    }

    #[test]
    fn compress_rejects_garbage() {
        let err = compress_pdf(b"definitely not a pdf").unwrap_err();
        assert!(matches!(err, PdfError::Compression(_)));
    }

    #[test]
    fn maybe_compress_skips_small_files() {
        let original = bloated_pdf();
        let (out, info) = maybe_compress(original.clone(), original.len());
        assert_eq!(out, original);
        assert!(info.is_none());
    }

    #[test]
    fn maybe_compress_above_threshold() {
        let original = bloated_pdf();
        let (out, info) = maybe_compress(original.clone(), 1024);
        let info = info.expect("should report compression");
        assert!(out.len() < original.len());
        assert_eq!(info.compressed_bytes, out.len());
    }

    #[test]
    fn maybe_compress_falls_back_on_failure() {
        let garbage = vec![0u8; 2048];
        let (out, info) = maybe_compress(garbage.clone(), 16);
        assert_eq!(out, garbage);
        assert!(info.is_none());
    }
}
