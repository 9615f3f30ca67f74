//! PDF fixtures shared by the integration tests.

#![allow(dead_code)]

use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};

pub const COMMENTS: &[&str] = &[
    "Great course, learned a lot.",
    "This course was excellent",
    "The instructor explained difficult topics with patience.",
    "Weekly problem sets helped me keep up with the material.",
    "Office hours were crowded near the midterm exam.",
    "I wish the slides had been posted before each lecture.",
    "Group projects were the most rewarding part of the class.",
    "Grading on the second essay felt inconsistent.",
];

/// A well-formed single-page PDF with one line of text per entry, built the
/// way the lopdf README builds its "Hello World" document.
pub fn text_pdf(lines: &[&str]) -> Vec<u8> {
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
        Operation::new("TL", vec![14.into()]),
        Operation::new("Td", vec![50.into(), 780.into()]),
    ];
    for line in lines {
        operations.push(Operation::new("Tj", vec![Object::string_literal(*line)]));
        operations.push(Operation::new("T*", vec![]));
    }
    operations.push(Operation::new("ET", vec![]));
    let content = Content { operations };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));

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
    doc.compress();

    let mut buf = Vec::new();
    doc.save_to(&mut buf).unwrap();
    buf
}

/// Bytes no parser accepts: loose text objects with no object table, buried
/// in string literals full of high bytes.
pub fn unparsable_pdf(lines: &[&str]) -> Vec<u8> {
    let mut bytes = b"%PDF-1.4\n%\xe2\xe3\xcf\xd3\n".to_vec();
    for i in 0..40u8 {
        bytes.extend_from_slice(b"(A");
        bytes.extend((0xE0u8..=0xFE).map(|b| b ^ (i & 0x0F)));
        bytes.extend_from_slice(b")\n");
    }
    for line in lines {
        bytes.extend_from_slice(b"BT /F1 12 Tf 72 700 Td (");
        bytes.extend_from_slice(line.as_bytes());
        bytes.extend_from_slice(b") Tj ET\n");
    }
    bytes.extend_from_slice(b"%%EOF\n");
    bytes
}

/// A PDF signature followed by nothing recognizable.
pub fn empty_pdf() -> Vec<u8> {
    let mut bytes = b"%PDF".to_vec();
    bytes.extend(std::iter::repeat_n(0u8, 512));
    bytes
}
