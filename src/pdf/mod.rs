//! PDF manipulation module

pub mod document;
pub mod merge;
pub mod metadata;
pub mod watermark;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used items
pub use document::PdfDocument;
pub use merge::merge_pdfs;
pub use metadata::{DocumentInfo, PageGeometry};
pub use watermark::{apply_watermark, apply_watermark_with_style};
