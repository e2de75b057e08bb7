//! ZIP packaging of individually named PDFs

use std::io::{Cursor, Write};

use tracing::{debug, info, instrument};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::Result;
use crate::pdf::merge::merge_labeled;

/// One file of the archive
#[derive(Debug, Clone, PartialEq)]
pub struct ArchiveEntry {
    /// Entry name, written as given (no escaping, no dedup)
    pub name: String,
    /// PDF bytes
    pub content: Vec<u8>,
}

impl ArchiveEntry {
    pub fn new(name: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            content,
        }
    }
}

/// Package PDFs into a deflate-compressed ZIP, in input order
///
/// Each entry's PDF is read and rewritten page by page before it is stored,
/// which validates it and drops producer leftovers such as unreachable
/// objects. Rewriting is deterministic, so identical input gives identical
/// entry contents.
#[instrument(skip_all, fields(entries = entries.len()))]
pub fn archive(entries: &[ArchiveEntry]) -> Result<Vec<u8>> {
    // Normalise everything up front; a bad entry aborts before any ZIP bytes exist
    let mut normalized = Vec::with_capacity(entries.len());
    for entry in entries {
        let pdf = merge_labeled([(entry.name.clone(), entry.content.as_slice())])?;
        debug!(name = %entry.name, input_bytes = entry.content.len(), output_bytes = pdf.len(), "Entry normalized");
        normalized.push((entry.name.as_str(), pdf));
    }

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));

    for (name, pdf) in normalized {
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        writer.start_file(name, options)?;
        writer.write_all(&pdf)?;
    }

    let output = writer.finish()?.into_inner();
    info!(output_bytes = output.len(), "Archive written");

    Ok(output)
}
