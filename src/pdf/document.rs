//! Parsed, read-only PDF documents

use lopdf::{Document, ObjectId};
use tracing::{debug, instrument};

use crate::error::{Error, Result};
use crate::pdf::metadata::{self, DocumentInfo, PageGeometry};

/// A parsed PDF held fully in memory
///
/// The wrapper never mutates the parsed document; the pipelines consume it
/// with [`PdfDocument::into_document`] and serialize a new one.
#[derive(Debug)]
pub struct PdfDocument {
    label: String,
    document: Document,
}

impl PdfDocument {
    /// Parse PDF bytes, tagging failures with `label`
    #[instrument(skip_all, fields(label = %label, bytes_len = bytes.len()))]
    pub fn from_bytes(label: &str, bytes: &[u8]) -> Result<Self> {
        let document = Document::load_mem(bytes).map_err(|err| Error::corrupt(label, err))?;

        debug!(pages = document.get_pages().len(), "PDF loaded from bytes");

        Ok(Self {
            label: label.to_string(),
            document,
        })
    }

    /// Name used in error messages and logs
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Number of pages in the document
    pub fn page_count(&self) -> usize {
        self.document.get_pages().len()
    }

    /// Page object ids in display order
    pub(crate) fn page_ids(&self) -> Vec<ObjectId> {
        self.document.get_pages().into_values().collect()
    }

    /// Size and rotation of every page, in order
    pub fn pages(&self) -> Result<Vec<PageGeometry>> {
        metadata::page_geometries(&self.document)
    }

    /// Page count, Info dictionary fields and page geometry
    pub fn info(&self) -> Result<DocumentInfo> {
        metadata::extract_info(&self.document)
    }

    pub(crate) fn into_document(self) -> Document {
        self.document
    }
}

/// Compress streams and serialize a document to bytes
pub(crate) fn save_to_bytes(document: &mut Document) -> Result<Vec<u8>> {
    document.compress();

    let mut output = Vec::new();
    document.save_to(&mut output)?;
    Ok(output)
}
