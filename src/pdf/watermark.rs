//! Watermark engine: stamp two lines of text onto every page of a PDF
//!
//! Each page gets its own Form XObject the size of the page's MediaBox. The
//! form carries its own font resource and a rotation-aware transform, so the
//! text reads upright at the displayed bottom-left corner whatever `/Rotate`
//! says. The page's original content is wrapped in `q`/`Q` and the form is
//! drawn after it, on top.

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, StringFormat};
use tracing::{debug, info, instrument, warn};

use crate::error::Result;
use crate::layout::{overlay_transform, split_lines, WatermarkStyle};
use crate::pdf::document::{save_to_bytes, PdfDocument};
use crate::pdf::metadata::{inherited_attribute, resolve, PageGeometry};

/// Resource name prefix for the overlay Form XObjects
const OVERLAY_NAME: &str = "CertWatermark";

/// Font resource name inside the overlay form
const FONT_NAME: &str = "F1";

/// Stamp `text` onto every page of `pdf_bytes` using the default style
///
/// The text is split on its first newline into two display lines. An empty
/// text still composites an (empty) overlay, leaving every page visually
/// unchanged.
///
/// # Example
///
/// ```no_run
/// use pdf_cert_batch::pdf::apply_watermark;
///
/// let certificate = std::fs::read("certificate.pdf").unwrap();
/// let stamped = apply_watermark(&certificate, "Lot 42\nShipment WH/OUT/7").unwrap();
/// std::fs::write("stamped.pdf", stamped).unwrap();
/// ```
pub fn apply_watermark(pdf_bytes: &[u8], text: &str) -> Result<Vec<u8>> {
    apply_watermark_with_style(pdf_bytes, text, &WatermarkStyle::default())
}

/// Stamp `text` onto every page of `pdf_bytes` using `style`
pub fn apply_watermark_with_style(
    pdf_bytes: &[u8],
    text: &str,
    style: &WatermarkStyle,
) -> Result<Vec<u8>> {
    watermark_labeled("input", pdf_bytes, text, style)
}

/// Watermark a document, naming it `label` in errors
#[instrument(skip_all, fields(label = %label, text_len = text.len()))]
pub(crate) fn watermark_labeled(
    label: &str,
    pdf_bytes: &[u8],
    text: &str,
    style: &WatermarkStyle,
) -> Result<Vec<u8>> {
    let source = PdfDocument::from_bytes(label, pdf_bytes)?;

    // Read all geometry before touching the document so a bad page aborts cleanly
    let geometries = source.pages()?;
    let page_ids = source.page_ids();
    let mut doc = source.into_document();

    let (line1, line2) = split_lines(text);
    let lines = [encode_win_ansi(line1), encode_win_ansi(line2)];

    if !geometries.is_empty() {
        let font_id = add_standard_font(&mut doc, &style.font);

        for (geometry, page_id) in geometries.iter().zip(page_ids) {
            let content = overlay_content(geometry, &lines, style)?;
            let xobject_id = create_overlay_xobject(&mut doc, geometry, content, font_id);
            let name = add_xobject_to_page_resources(&mut doc, page_id, xobject_id)?;
            wrap_and_draw_overlay(&mut doc, page_id, &name)?;

            debug!(
                page = geometry.number,
                rotation = geometry.rotation.degrees(),
                xobject = %name,
                "Overlay composited"
            );
        }
    }

    let output = save_to_bytes(&mut doc)?;
    info!(pages = geometries.len(), output_bytes = output.len(), "Watermark applied");

    Ok(output)
}

/// Add one of the standard 14 fonts with WinAnsiEncoding
fn add_standard_font(doc: &mut Document, base_font: &str) -> ObjectId {
    let mut font = Dictionary::new();
    font.set("Type", Object::Name(b"Font".to_vec()));
    font.set("Subtype", Object::Name(b"Type1".to_vec()));
    font.set("BaseFont", Object::Name(base_font.as_bytes().to_vec()));
    font.set("Encoding", Object::Name(b"WinAnsiEncoding".to_vec()));

    doc.add_object(Object::Dictionary(font))
}

/// Encode text for a WinAnsiEncoding font
///
/// Latin-1 maps straight through, the CP1252 extras (curly quotes, dashes,
/// euro) get their 0x80-0x9F codes, control characters are dropped and
/// anything else becomes `?`.
pub(crate) fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .filter_map(|c| {
            let code = c as u32;
            match code {
                0x20..=0x7E | 0xA0..=0xFF => Some(code as u8),
                0x00..=0x1F | 0x7F..=0x9F => None,
                _ => Some(cp1252_extra(c).unwrap_or(b'?')),
            }
        })
        .collect()
}

fn cp1252_extra(c: char) -> Option<u8> {
    let code = match c {
        '€' => 0x80,
        '‚' => 0x82,
        'ƒ' => 0x83,
        '„' => 0x84,
        '…' => 0x85,
        '†' => 0x86,
        '‡' => 0x87,
        'ˆ' => 0x88,
        '‰' => 0x89,
        'Š' => 0x8A,
        '‹' => 0x8B,
        'Œ' => 0x8C,
        'Ž' => 0x8E,
        '‘' => 0x91,
        '’' => 0x92,
        '“' => 0x93,
        '”' => 0x94,
        '•' => 0x95,
        '–' => 0x96,
        '—' => 0x97,
        '˜' => 0x98,
        '™' => 0x99,
        'š' => 0x9A,
        '›' => 0x9B,
        'œ' => 0x9C,
        'ž' => 0x9E,
        'Ÿ' => 0x9F,
        _ => return None,
    };
    Some(code)
}

/// Content stream of the overlay form for one page
fn overlay_content(
    geometry: &PageGeometry,
    lines: &[Vec<u8>; 2],
    style: &WatermarkStyle,
) -> Result<Vec<u8>> {
    let mut operations = vec![Operation::new("q", vec![])];

    let transform = overlay_transform(geometry.rotation, geometry.width, geometry.height);
    if !transform.is_identity() {
        operations.push(Operation::new(
            "cm",
            transform.operands().iter().map(|v| Object::Real(*v)).collect(),
        ));
    }

    operations.push(Operation::new("g", vec![Object::Real(style.fill_gray)]));

    for (line, (x, y)) in lines.iter().zip(style.line_origins()) {
        if line.is_empty() {
            continue;
        }
        operations.extend([
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec![FONT_NAME.into(), Object::Real(style.font_size)]),
            Operation::new("Td", vec![Object::Real(x), Object::Real(y)]),
            Operation::new("Tj", vec![Object::String(line.clone(), StringFormat::Literal)]),
            Operation::new("ET", vec![]),
        ]);
    }

    operations.push(Operation::new("Q", vec![]));

    Ok(Content { operations }.encode()?)
}

/// Create the page-sized Form XObject holding the overlay
fn create_overlay_xobject(
    doc: &mut Document,
    geometry: &PageGeometry,
    content: Vec<u8>,
    font_id: ObjectId,
) -> ObjectId {
    let mut fonts = Dictionary::new();
    fonts.set(FONT_NAME, Object::Reference(font_id));

    let mut resources = Dictionary::new();
    resources.set("Font", Object::Dictionary(fonts));
    resources.set("ProcSet", Object::Array(vec![
        Object::Name(b"PDF".to_vec()),
        Object::Name(b"Text".to_vec()),
    ]));

    let mut xobject_dict = Dictionary::new();
    xobject_dict.set("Type", Object::Name(b"XObject".to_vec()));
    xobject_dict.set("Subtype", Object::Name(b"Form".to_vec()));
    xobject_dict.set("FormType", Object::Integer(1));

    // The form's space is the unrotated MediaBox with its origin at (0, 0)
    xobject_dict.set("BBox", Object::Array(vec![
        Object::Integer(0),
        Object::Integer(0),
        Object::Real(geometry.width),
        Object::Real(geometry.height),
    ]));
    let (x0, y0) = geometry.origin;
    xobject_dict.set("Matrix", Object::Array(vec![
        Object::Integer(1),
        Object::Integer(0),
        Object::Integer(0),
        Object::Integer(1),
        Object::Real(x0),
        Object::Real(y0),
    ]));
    xobject_dict.set("Resources", Object::Dictionary(resources));

    doc.add_object(Stream::new(xobject_dict, content))
}

/// Register the overlay form in the page's own Resources and return its name
///
/// Inherited or shared resources are copied onto the page so other pages
/// never see this page's overlay.
fn add_xobject_to_page_resources(
    doc: &mut Document,
    page_id: ObjectId,
    xobject_id: ObjectId,
) -> Result<String> {
    let mut resources = inherited_attribute(doc, page_id, b"Resources")
        .map(|obj| resolve(doc, obj))
        .and_then(|obj| obj.as_dict().ok())
        .cloned()
        .unwrap_or_else(Dictionary::new);

    let mut xobjects = resources
        .get(b"XObject")
        .ok()
        .map(|obj| resolve(doc, obj))
        .and_then(|obj| obj.as_dict().ok())
        .cloned()
        .unwrap_or_else(Dictionary::new);

    let mut name = OVERLAY_NAME.to_string();
    let mut suffix = 1;
    while xobjects.has(name.as_bytes()) {
        name = format!("{OVERLAY_NAME}{suffix}");
        suffix += 1;
    }
    if suffix > 1 {
        warn!(page_id = ?page_id, %name, "Page already carries an overlay; using a fresh name");
    }

    xobjects.set(name.as_bytes().to_vec(), Object::Reference(xobject_id));
    resources.set("XObject", Object::Dictionary(xobjects));

    let page_dict = doc.get_object_mut(page_id)?.as_dict_mut()?;
    page_dict.set("Resources", Object::Dictionary(resources));

    Ok(name)
}

/// Wrap the page's content in q/Q and draw the overlay form after it
fn wrap_and_draw_overlay(doc: &mut Document, page_id: ObjectId, xobject_name: &str) -> Result<()> {
    let existing: Vec<Object> = {
        let page_dict = doc.get_object(page_id)?.as_dict()?;
        match page_dict.get(b"Contents") {
            Ok(contents) => match resolve(doc, contents) {
                Object::Array(items) => items.clone(),
                Object::Stream(_) => vec![contents.clone()],
                _ => vec![],
            },
            Err(_) => vec![],
        }
    };

    let draw = Content {
        operations: vec![
            Operation::new("q", vec![]),
            Operation::new("Do", vec![Object::Name(xobject_name.as_bytes().to_vec())]),
            Operation::new("Q", vec![]),
        ],
    }
    .encode()?;

    let contents = if existing.is_empty() {
        let draw_id = doc.add_object(Stream::new(Dictionary::new(), draw));
        vec![Object::Reference(draw_id)]
    } else {
        // The original content may leave its CTM or colour changed; isolate it
        let save_id = doc.add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
        let mut restore_and_draw = b"Q\n".to_vec();
        restore_and_draw.extend(draw);
        let draw_id = doc.add_object(Stream::new(Dictionary::new(), restore_and_draw));

        let mut contents = Vec::with_capacity(existing.len() + 2);
        contents.push(Object::Reference(save_id));
        contents.extend(existing);
        contents.push(Object::Reference(draw_id));
        contents
    };

    let page_dict = doc.get_object_mut(page_id)?.as_dict_mut()?;
    page_dict.set("Contents", Object::Array(contents));

    Ok(())
}
