//! Error types for the certificate batch library

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the certificate batch library
#[derive(Error, Debug)]
pub enum Error {
    /// Input bytes could not be parsed as a PDF document
    #[error("Corrupt document `{label}`: {source}")]
    CorruptDocument {
        label: String,
        #[source]
        source: lopdf::Error,
    },

    /// Page geometry could not be determined while watermarking
    #[error("Cannot render page {page}: {reason}")]
    Render { page: u32, reason: String },

    /// PDF serialization error
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    /// ZIP packaging error
    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Required field missing on a typed input record
    #[error("Missing {field} on {record}")]
    MissingField {
        record: &'static str,
        field: &'static str,
    },

    /// Batch manifest could not be parsed
    #[error("Invalid manifest: {0}")]
    Manifest(#[from] serde_json::Error),

    /// File not found
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// Invalid glob pattern
    #[error("Invalid glob pattern: {0}")]
    InvalidGlob(String),

    /// No files matched pattern
    #[error("No PDF files found matching pattern: {0}")]
    NoFilesMatched(String),
}

impl Error {
    pub(crate) fn corrupt(label: impl Into<String>, source: lopdf::Error) -> Self {
        Error::CorruptDocument {
            label: label.into(),
            source,
        }
    }

    pub(crate) fn render(page: u32, reason: impl Into<String>) -> Self {
        Error::Render {
            page,
            reason: reason.into(),
        }
    }
}
