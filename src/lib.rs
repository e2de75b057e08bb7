//! PDF Certificate Batch Library
//!
//! Bundles the quality certificates of a picking batch into one deliverable.
//! This library provides functionality to:
//! - Stamp a two-line watermark on every page of a PDF, upright on rotated pages
//! - Merge PDFs into one document, preserving page order
//! - Package PDFs into a deflate-compressed ZIP archive
//! - Compose certificate captions from shipment data
//! - Build a merged-PDF or ZIP bundle for a whole batch
//!
//! # Example
//!
//! ```no_run
//! use pdf_cert_batch::pdf::{apply_watermark, merge_pdfs};
//!
//! let report = std::fs::read("WH-OUT-0001.pdf").unwrap();
//! let certificate = std::fs::read("certificate.pdf").unwrap();
//!
//! let stamped = apply_watermark(&certificate, "Lot H-7781\nShipment WH/OUT/0001").unwrap();
//! let merged = merge_pdfs(&[report, stamped]).expect("Failed to merge PDFs");
//! std::fs::write("bundle.pdf", merged).unwrap();
//! ```

pub mod archive;
pub mod batch;
pub mod caption;
pub mod error;
pub mod inputs;
pub mod layout;
pub mod manifest;
pub mod pdf;

// Re-export commonly used items
pub use archive::{archive, ArchiveEntry};
pub use batch::{build_bundle, Batch, Bundle, BundleOptions, OutputMode};
pub use error::{Error, Result};
