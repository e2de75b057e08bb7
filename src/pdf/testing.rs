//! In-memory PDF fixtures for unit tests

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};

use crate::pdf::metadata::resolve;

#[derive(Debug, Clone, Copy, PartialEq)]
enum MediaBoxPlacement {
    OnPage,
    Inherited,
    Missing,
}

/// Description of one fixture page
#[derive(Debug, Clone)]
pub struct SamplePage {
    label: String,
    media_box: [f32; 4],
    rotate: Option<i64>,
    placement: MediaBoxPlacement,
}

impl SamplePage {
    pub fn sized(label: &str, media_box: [f32; 4]) -> Self {
        Self {
            label: label.to_string(),
            media_box,
            rotate: None,
            placement: MediaBoxPlacement::OnPage,
        }
    }

    pub fn letter(label: &str) -> Self {
        Self::sized(label, [0.0, 0.0, 612.0, 792.0])
    }

    pub fn a4_landscape(label: &str) -> Self {
        Self::sized(label, [0.0, 0.0, 842.0, 595.0])
    }

    pub fn rotated(mut self, degrees: i64) -> Self {
        self.rotate = Some(degrees);
        self
    }

    pub fn with_inherited_media_box(mut self) -> Self {
        self.placement = MediaBoxPlacement::Inherited;
        self
    }

    pub fn without_media_box(mut self) -> Self {
        self.placement = MediaBoxPlacement::Missing;
        self
    }
}

fn media_box_object(media_box: [f32; 4]) -> Object {
    Object::Array(media_box.iter().map(|v| Object::Real(*v)).collect())
}

/// Build a document whose pages each show their label as text
pub fn sample_document(pages: &[SamplePage]) -> Document {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(Dictionary::from_iter([
        ("Type", Object::Name(b"Font".to_vec())),
        ("Subtype", Object::Name(b"Type1".to_vec())),
        ("BaseFont", Object::Name(b"Times-Roman".to_vec())),
    ]));

    let mut kids: Vec<Object> = Vec::new();
    let mut inherited_box = None;

    for page in pages {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 24.into()]),
                Operation::new("Td", vec![72.into(), 700.into()]),
                Operation::new("Tj", vec![Object::string_literal(page.label.as_str())]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(
            Dictionary::new(),
            content.encode().unwrap_or_default(),
        ));

        let mut page_dict = Dictionary::from_iter([
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(pages_id)),
            ("Contents", Object::Reference(content_id)),
            (
                "Resources",
                Object::Dictionary(Dictionary::from_iter([(
                    "Font",
                    Object::Dictionary(Dictionary::from_iter([("F1", Object::Reference(font_id))])),
                )])),
            ),
        ]);

        match page.placement {
            MediaBoxPlacement::OnPage => page_dict.set("MediaBox", media_box_object(page.media_box)),
            MediaBoxPlacement::Inherited => inherited_box = Some(page.media_box),
            MediaBoxPlacement::Missing => {}
        }
        if let Some(degrees) = page.rotate {
            page_dict.set("Rotate", Object::Integer(degrees));
        }

        kids.push(Object::Reference(doc.add_object(page_dict)));
    }

    let mut pages_dict = Dictionary::from_iter([
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Count", Object::Integer(kids.len() as i64)),
        ("Kids", Object::Array(kids)),
    ]);
    if let Some(media_box) = inherited_box {
        pages_dict.set("MediaBox", media_box_object(media_box));
    }
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

    let catalog_id = doc.add_object(Dictionary::from_iter([
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]));
    doc.trailer.set("Root", Object::Reference(catalog_id));

    doc
}

/// Serialized form of [`sample_document`]
pub fn sample_pdf(pages: &[SamplePage]) -> Vec<u8> {
    let mut doc = sample_document(pages);
    let mut output = Vec::new();
    doc.save_to(&mut output).expect("fixture PDF serializes");
    output
}

fn stream_operations(stream: &Stream) -> Vec<Operation> {
    let bytes = stream
        .decompressed_content()
        .unwrap_or_else(|_| stream.content.clone());
    Content::decode(&bytes).map(|c| c.operations).unwrap_or_default()
}

fn page_id(doc: &Document, page_number: u32) -> ObjectId {
    doc.get_pages()[&page_number]
}

/// Every operation of a page's own content streams, in drawing order
pub fn page_operations(doc: &Document, page_number: u32) -> Vec<Operation> {
    let page = doc.get_dictionary(page_id(doc, page_number)).expect("page dictionary");
    let contents = match page.get(b"Contents").map(|obj| resolve(doc, obj)) {
        Ok(Object::Array(items)) => items.clone(),
        Ok(_) => vec![page.get(b"Contents").cloned().expect("contents")],
        Err(_) => vec![],
    };

    contents
        .iter()
        .filter_map(|obj| match resolve(doc, obj) {
            Object::Stream(stream) => Some(stream_operations(stream)),
            _ => None,
        })
        .flatten()
        .collect()
}

/// Operations of the watermark overlay Form XObjects attached to a page
pub fn overlay_operations(doc: &Document, page_number: u32) -> Vec<Operation> {
    let page = doc.get_dictionary(page_id(doc, page_number)).expect("page dictionary");
    let Ok(resources) = page.get(b"Resources").map(|obj| resolve(doc, obj)) else {
        return vec![];
    };
    let Ok(xobjects) = resources
        .as_dict()
        .and_then(|r| r.get(b"XObject"))
        .map(|obj| resolve(doc, obj))
        .and_then(Object::as_dict)
    else {
        return vec![];
    };

    xobjects
        .iter()
        .filter(|(name, _)| name.starts_with(b"CertWatermark"))
        .filter_map(|(_, obj)| match resolve(doc, obj) {
            Object::Stream(stream) => Some(stream_operations(stream)),
            _ => None,
        })
        .flatten()
        .collect()
}

/// Byte strings shown with `Tj` in a list of operations
pub fn shown_strings(operations: &[Operation]) -> Vec<Vec<u8>> {
    operations
        .iter()
        .filter(|op| op.operator == "Tj")
        .filter_map(|op| op.operands.first())
        .filter_map(|obj| obj.as_str().ok().map(<[u8]>::to_vec))
        .collect()
}
