//! Page geometry and document metadata extraction

use lopdf::{Document, Object, ObjectId};
use crate::error::{Error, Result};
use crate::layout::Rotation;

/// Page attributes a page may inherit from its ancestors in the page tree
pub(crate) const INHERITABLE_KEYS: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Guard against cyclic `/Parent` chains in malformed files
const MAX_TREE_DEPTH: usize = 32;

/// Size and orientation of a single page
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    /// 1-based page number
    pub number: u32,
    /// Lower-left corner of the MediaBox
    pub origin: (f32, f32),
    /// MediaBox width in points (unrotated)
    pub width: f32,
    /// MediaBox height in points (unrotated)
    pub height: f32,
    /// Display rotation from `/Rotate`
    pub rotation: Rotation,
}

/// PDF metadata
#[derive(Debug, Clone)]
pub struct DocumentInfo {
    /// Number of pages in the PDF
    pub page_count: usize,
    /// Document title (if present)
    pub title: Option<String>,
    /// Document author (if present)
    pub author: Option<String>,
    /// Geometry of each page in order
    pub pages: Vec<PageGeometry>,
}

/// Follow an indirect reference, returning the object itself otherwise
pub(crate) fn resolve<'a>(doc: &'a Document, object: &'a Object) -> &'a Object {
    match object {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(object),
        _ => object,
    }
}

/// Look up a page attribute on the page or the nearest ancestor that sets it
pub(crate) fn inherited_attribute<'a>(
    doc: &'a Document,
    page_id: ObjectId,
    key: &[u8],
) -> Option<&'a Object> {
    let mut node = doc.get_object(page_id).and_then(Object::as_dict).ok()?;

    for _ in 0..MAX_TREE_DEPTH {
        if let Ok(value) = node.get(key) {
            return Some(value);
        }
        let parent_id = node.get(b"Parent").and_then(Object::as_reference).ok()?;
        node = doc.get_object(parent_id).and_then(Object::as_dict).ok()?;
    }

    None
}

fn number(object: &Object) -> Option<f32> {
    match object {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

/// Read the geometry of one page
pub fn page_geometry(doc: &Document, number_in_doc: u32, page_id: ObjectId) -> Result<PageGeometry> {
    let media_box = inherited_attribute(doc, page_id, b"MediaBox")
        .map(|obj| resolve(doc, obj))
        .ok_or_else(|| Error::render(number_in_doc, "page has no MediaBox"))?;

    let corners: Vec<f32> = match media_box {
        Object::Array(values) => values
            .iter()
            .filter_map(|v| number(resolve(doc, v)))
            .collect(),
        _ => return Err(Error::render(number_in_doc, "MediaBox is not an array")),
    };

    if corners.len() != 4 {
        return Err(Error::render(number_in_doc, "MediaBox must hold four numbers"));
    }

    let (x0, x1) = (corners[0].min(corners[2]), corners[0].max(corners[2]));
    let (y0, y1) = (corners[1].min(corners[3]), corners[1].max(corners[3]));
    let (width, height) = (x1 - x0, y1 - y0);

    if width <= 0.0 || height <= 0.0 {
        return Err(Error::render(
            number_in_doc,
            format!("degenerate MediaBox {width}x{height}"),
        ));
    }

    let rotation = match inherited_attribute(doc, page_id, b"Rotate").map(|obj| resolve(doc, obj)) {
        None => Rotation::None,
        Some(Object::Integer(degrees)) => Rotation::from_degrees(*degrees)
            .ok_or_else(|| Error::render(number_in_doc, format!("unsupported rotation {degrees}")))?,
        Some(Object::Real(degrees)) if degrees.fract() == 0.0 => Rotation::from_degrees(*degrees as i64)
            .ok_or_else(|| Error::render(number_in_doc, format!("unsupported rotation {degrees}")))?,
        Some(other) => {
            return Err(Error::render(
                number_in_doc,
                format!("Rotate is not an integer: {other:?}"),
            ))
        }
    };

    Ok(PageGeometry {
        number: number_in_doc,
        origin: (x0, y0),
        width,
        height,
        rotation,
    })
}

/// Read the geometry of every page, in order
pub fn page_geometries(doc: &Document) -> Result<Vec<PageGeometry>> {
    doc.get_pages()
        .into_iter()
        .map(|(page_number, page_id)| page_geometry(doc, page_number, page_id))
        .collect()
}

fn info_string(info: &lopdf::Dictionary, key: &[u8]) -> Option<String> {
    let bytes = info.get(key).ok()?.as_str().ok()?;
    Some(String::from_utf8_lossy(bytes).into_owned())
}

/// Extract page count, title, author and page geometry
pub fn extract_info(doc: &Document) -> Result<DocumentInfo> {
    let pages = page_geometries(doc)?;

    // Try to extract title and author from Info dictionary
    let info = doc
        .trailer
        .get(b"Info")
        .ok()
        .map(|obj| resolve(doc, obj))
        .and_then(|obj| obj.as_dict().ok());

    let (title, author) = match info {
        Some(info) => (info_string(info, b"Title"), info_string(info, b"Author")),
        None => (None, None),
    };

    Ok(DocumentInfo {
        page_count: pages.len(),
        title,
        author,
        pages,
    })
}
