//! PDF merging functionality using lopdf

use std::collections::BTreeMap;
use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::{debug, info, instrument};

use crate::error::Result;
use crate::pdf::document::{save_to_bytes, PdfDocument};
use crate::pdf::metadata::{inherited_attribute, INHERITABLE_KEYS};

/// Concatenate PDF documents, in order, into a single PDF
///
/// Every page of every input is kept, in input order. An empty input list
/// yields a valid zero-page document.
///
/// Based on the lopdf merge example:
/// https://github.com/J-F-Liu/lopdf/blob/main/examples/merge.rs
///
/// # Example
///
/// ```no_run
/// use pdf_cert_batch::pdf::merge_pdfs;
///
/// let report = std::fs::read("delivery.pdf").unwrap();
/// let certificate = std::fs::read("certificate.pdf").unwrap();
///
/// let merged = merge_pdfs(&[report, certificate]).expect("Failed to merge");
/// std::fs::write("merged.pdf", merged).unwrap();
/// ```
pub fn merge_pdfs<B: AsRef<[u8]>>(documents: &[B]) -> Result<Vec<u8>> {
    merge_labeled(
        documents
            .iter()
            .enumerate()
            .map(|(i, bytes)| (format!("document {}", i + 1), bytes.as_ref())),
    )
}

/// Merge `(label, bytes)` pairs; labels name the input in errors
#[instrument(skip_all)]
pub(crate) fn merge_labeled<'a, I>(inputs: I) -> Result<Vec<u8>>
where
    I: IntoIterator<Item = (String, &'a [u8])>,
{
    // Parse everything first; any corrupt input aborts before output is built
    let mut documents: Vec<PdfDocument> = Vec::new();
    for (label, bytes) in inputs {
        documents.push(PdfDocument::from_bytes(&label, bytes)?);
    }

    let mut merged_doc = concatenate(documents);
    let output = save_to_bytes(&mut merged_doc)?;

    info!(output_bytes = output.len(), "Merged PDF written");
    Ok(output)
}

/// Build a fresh document holding every page of `documents`, in order
fn concatenate(documents: Vec<PdfDocument>) -> Document {
    // Define a starting max_id for merged document
    let mut max_id = 1;
    let mut page_ids: Vec<ObjectId> = Vec::new();
    let mut objects: BTreeMap<ObjectId, Object> = BTreeMap::new();
    let document_count = documents.len();

    for source in documents {
        let label = source.label().to_string();
        let mut doc = source.into_document();

        // Pages lose their old parent below; pin what they inherited from it
        flatten_inherited_attributes(&mut doc);

        // Renumber objects in this document to avoid conflicts
        doc.renumber_objects_with(max_id);

        // Update max_id for next document
        max_id = doc.max_id + 1;

        // Collect page IDs from this document
        let pages = doc.get_pages();
        debug!(document = %label, pages = pages.len(), "Appending pages");
        page_ids.extend(pages.into_values());

        // Collect all objects from this document
        objects.extend(doc.objects);
    }

    let mut merged_doc = Document::with_version("1.5");

    // Add all collected objects FIRST
    merged_doc.objects.extend(objects);

    // Keep new_object_id() clear of the IDs we just inserted
    merged_doc.max_id = max_id - 1;

    let pages_id = merged_doc.new_object_id();

    let kids: Vec<Object> = page_ids
        .iter()
        .map(|&id| Object::Reference(id))
        .collect();

    let mut pages_object = Dictionary::new();
    pages_object.set("Type", Object::Name(b"Pages".to_vec()));
    pages_object.set("Count", Object::Integer(page_ids.len() as i64));
    pages_object.set("Kids", Object::Array(kids));

    let catalog_id = merged_doc.new_object_id();
    let mut catalog = Dictionary::new();
    catalog.set("Type", Object::Name(b"Catalog".to_vec()));
    catalog.set("Pages", Object::Reference(pages_id));

    merged_doc.objects.insert(catalog_id, Object::Dictionary(catalog));
    merged_doc.objects.insert(pages_id, Object::Dictionary(pages_object));
    merged_doc.trailer.set("Root", Object::Reference(catalog_id));

    // Update parent references for all pages
    for &page_id in &page_ids {
        if let Ok(Object::Dictionary(dict)) = merged_doc.get_object_mut(page_id) {
            dict.set("Parent", Object::Reference(pages_id));
        }
    }

    // Drop the old catalogs and page trees, now unreachable
    merged_doc.prune_objects();

    debug!(documents = document_count, pages = page_ids.len(), "Page tree assembled");
    merged_doc
}

/// Copy inherited page attributes onto each page dictionary
fn flatten_inherited_attributes(doc: &mut Document) {
    let page_ids: Vec<ObjectId> = doc.get_pages().into_values().collect();

    for page_id in page_ids {
        let inherited: Vec<(&[u8], Object)> = INHERITABLE_KEYS
            .iter()
            .filter_map(|&key| {
                inherited_attribute(doc, page_id, key).map(|value| (key, value.clone()))
            })
            .collect();

        if let Ok(Object::Dictionary(page_dict)) = doc.get_object_mut(page_id) {
            for (key, value) in inherited {
                if !page_dict.has(key) {
                    page_dict.set(key.to_vec(), value);
                }
            }
        }
    }
}
