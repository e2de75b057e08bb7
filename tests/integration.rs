//! Integration tests for the certificate batch library

use std::io::{Cursor, Read};

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, Stream};
use proptest::prelude::*;
use tempfile::TempDir;

use pdf_cert_batch::layout::{overlay_transform, Rotation, WatermarkStyle};
use pdf_cert_batch::manifest::load_batch;
use pdf_cert_batch::pdf::{apply_watermark, merge_pdfs, PdfDocument};
use pdf_cert_batch::{archive, build_bundle, ArchiveEntry, BundleOptions, Error, OutputMode};

/// Build a PDF whose pages show their label, with the given MediaBox size and rotation
fn make_pdf(pages: &[(&str, f32, f32, i64)]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(Dictionary::from_iter([
        ("Type", Object::Name(b"Font".to_vec())),
        ("Subtype", Object::Name(b"Type1".to_vec())),
        ("BaseFont", Object::Name(b"Helvetica".to_vec())),
    ]));
    let resources_id = doc.add_object(Dictionary::from_iter([(
        "Font",
        Object::Dictionary(Dictionary::from_iter([("F1", Object::Reference(font_id))])),
    )]));

    let mut kids = Vec::new();
    for (label, width, height, rotate) in pages {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 18.into()]),
                Operation::new("Td", vec![50.into(), 50.into()]),
                Operation::new("Tj", vec![Object::string_literal(*label)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(Dictionary::new(), content.encode().unwrap()));

        let page_id = doc.add_object(Dictionary::from_iter([
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(pages_id)),
            ("Contents", Object::Reference(content_id)),
            ("Resources", Object::Reference(resources_id)),
            (
                "MediaBox",
                Object::Array(vec![0.into(), 0.into(), Object::Real(*width), Object::Real(*height)]),
            ),
            ("Rotate", Object::Integer(*rotate)),
        ]));
        kids.push(Object::Reference(page_id));
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(Dictionary::from_iter([
            ("Type", Object::Name(b"Pages".to_vec())),
            ("Count", Object::Integer(kids.len() as i64)),
            ("Kids", Object::Array(kids)),
        ])),
    );
    let catalog_id = doc.add_object(Dictionary::from_iter([
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]));
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut output = Vec::new();
    doc.save_to(&mut output).unwrap();
    output
}

fn letter(label: &str) -> Vec<u8> {
    make_pdf(&[(label, 612.0, 792.0, 0)])
}

fn page_count(bytes: &[u8]) -> usize {
    PdfDocument::from_bytes("test", bytes).unwrap().page_count()
}

/// Labels drawn by each page's own content, in page order
fn page_labels(bytes: &[u8]) -> Vec<String> {
    let doc = Document::load_mem(bytes).unwrap();
    let mut labels = Vec::new();
    for (_, page_id) in doc.get_pages() {
        let content = doc.get_page_content(page_id).unwrap();
        let ops = Content::decode(&content).unwrap().operations;
        for op in ops.iter().filter(|op| op.operator == "Tj") {
            labels.push(String::from_utf8_lossy(op.operands[0].as_str().unwrap()).into_owned());
        }
    }
    labels
}

fn unzip(bytes: &[u8]) -> Vec<(String, Vec<u8>)> {
    let mut zip = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    (0..zip.len())
        .map(|i| {
            let mut file = zip.by_index(i).unwrap();
            let mut content = Vec::new();
            file.read_to_end(&mut content).unwrap();
            (file.name().to_string(), content)
        })
        .collect()
}

#[test]
fn test_watermark_then_merge_page_count_and_order() {
    let report = make_pdf(&[("R1", 612.0, 792.0, 0), ("R2", 612.0, 792.0, 0)]);
    let certificate = make_pdf(&[("C1", 842.0, 595.0, 90)]);

    let stamped = apply_watermark(&certificate, "SIDSA: S1\n Albarán: WH/OUT/1").unwrap();
    let merged = merge_pdfs(&[report, stamped]).unwrap();

    assert_eq!(page_count(&merged), 3);
    assert_eq!(page_labels(&merged), vec!["R1", "R2", "C1"]);

    let pages = PdfDocument::from_bytes("merged", &merged).unwrap().pages().unwrap();
    assert_eq!((pages[2].width, pages[2].height), (842.0, 595.0));
    assert_eq!(pages[2].rotation, Rotation::Quarter);
}

#[test]
fn test_merge_empty_list() {
    let merged = merge_pdfs::<Vec<u8>>(&[]).unwrap();
    assert_eq!(page_count(&merged), 0);
}

#[test]
fn test_archive_round_trip() {
    let x = letter("X");
    let y = make_pdf(&[("Y1", 612.0, 792.0, 0), ("Y2", 612.0, 792.0, 180)]);

    let zipped = archive(&[ArchiveEntry::new("a.pdf", x), ArchiveEntry::new("b.pdf", y)]).unwrap();
    let files = unzip(&zipped);

    assert_eq!(files.len(), 2);
    assert_eq!(files[0].0, "a.pdf");
    assert_eq!(files[1].0, "b.pdf");
    assert_eq!(page_count(&files[0].1), 1);
    assert_eq!(page_count(&files[1].1), 2);
    assert_eq!(page_labels(&files[1].1), vec!["Y1", "Y2"]);
}

#[test]
fn test_archive_twice_gives_same_pdfs() {
    let entries = vec![
        ArchiveEntry::new("a.pdf", letter("A")),
        ArchiveEntry::new("b.pdf", letter("B")),
    ];
    assert_eq!(unzip(&archive(&entries).unwrap()), unzip(&archive(&entries).unwrap()));
}

#[test]
fn test_malformed_input_fails_every_pipeline() {
    let truncated = {
        let full = letter("A");
        full[..full.len() / 2].to_vec()
    };

    for bad in [b"not a pdf at all".to_vec(), truncated] {
        assert!(matches!(apply_watermark(&bad, "x"), Err(Error::CorruptDocument { .. })));
        assert!(matches!(merge_pdfs(&[bad.clone()]), Err(Error::CorruptDocument { .. })));
        assert!(matches!(
            archive(&[ArchiveEntry::new("bad.pdf", bad.clone())]),
            Err(Error::CorruptDocument { .. })
        ));
    }
}

#[test]
fn test_bundle_from_manifest() {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir(dir.path().join("certs")).unwrap();
    std::fs::write(dir.path().join("report.pdf"), letter("REPORT")).unwrap();
    std::fs::write(dir.path().join("certs/a.pdf"), letter("CERT-A")).unwrap();

    let manifest_path = dir.path().join("batch.json");
    std::fs::write(
        &manifest_path,
        r#"{
            "name": "BATCH/0009",
            "shipments": [{
                "name": "WH/OUT/0009",
                "customer": "ACME",
                "report": "report.pdf",
                "lines": [{
                    "origin": { "name": "S009", "client_order_ref": "PO-9" },
                    "item": "20",
                    "quantity_planned": 7.5,
                    "lot": "H-1",
                    "certificates": [{ "name": "CERT-A", "file": "certs/a.pdf" }]
                }]
            }]
        }"#,
    )
    .unwrap();

    let batch = load_batch(&manifest_path).unwrap();

    let merged = build_bundle(&batch, &BundleOptions::default()).unwrap();
    assert_eq!(merged.mime_type, "application/pdf");
    assert_eq!(page_labels(&merged.data), vec!["REPORT", "CERT-A"]);

    let options = BundleOptions { mode: OutputMode::Archive, ..Default::default() };
    let zipped = build_bundle(&batch, &options).unwrap();
    let names: Vec<String> = unzip(&zipped.data).into_iter().map(|(name, _)| name).collect();
    assert_eq!(names, vec!["WH-OUT-0009.pdf", "CERT-A-20.pdf"]);
}

proptest! {
    #[test]
    fn prop_watermark_preserves_geometry(
        width in 100.0f32..1500.0,
        height in 100.0f32..1500.0,
        quarter_turns in 0i64..4,
        text in "[ -~]{0,40}(\n[ -~]{0,40})?",
    ) {
        let width = width.round();
        let height = height.round();
        let input = make_pdf(&[("P", width, height, quarter_turns * 90)]);
        let output = apply_watermark(&input, &text).unwrap();

        let before = PdfDocument::from_bytes("before", &input).unwrap().pages().unwrap();
        let after = PdfDocument::from_bytes("after", &output).unwrap().pages().unwrap();
        prop_assert_eq!(before, after);
    }

    #[test]
    fn prop_anchor_stays_on_page(
        width in 50.0f32..2000.0,
        height in 50.0f32..2000.0,
        quarter_turns in 0i64..4,
    ) {
        let rotation = Rotation::from_degrees(quarter_turns * 90).unwrap();
        let transform = overlay_transform(rotation, width, height);

        for (x, y) in WatermarkStyle::default().line_origins() {
            let (px, py) = transform.apply(x, y);
            prop_assert!(px >= 0.0 && px <= width, "x {} outside 0..{}", px, width);
            prop_assert!(py >= 0.0 && py <= height, "y {} outside 0..{}", py, height);
        }
    }

    #[test]
    fn prop_merge_page_count_is_sum(a in 0usize..4, b in 0usize..4) {
        let pages_a: Vec<(&str, f32, f32, i64)> = (0..a).map(|_| ("A", 612.0, 792.0, 0)).collect();
        let pages_b: Vec<(&str, f32, f32, i64)> = (0..b).map(|_| ("B", 595.0, 842.0, 0)).collect();

        let merged = merge_pdfs(&[make_pdf(&pages_a), make_pdf(&pages_b)]).unwrap();
        let labels = page_labels(&merged);

        prop_assert_eq!(labels.len(), a + b);
        prop_assert!(labels[..a].iter().all(|l| l == "A"));
        prop_assert!(labels[a..].iter().all(|l| l == "B"));
    }
}
