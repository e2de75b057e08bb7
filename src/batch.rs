//! Bundling a picking batch's delivery reports and certificates
//!
//! A batch groups several shipments. Each shipment contributes its delivery
//! report followed by the certificates of its lines, each certificate
//! stamped with its caption. The result is either one merged PDF or a ZIP
//! of individually named PDFs.

use std::collections::HashSet;

use tracing::{debug, info, instrument};

use crate::archive::{archive, ArchiveEntry};
use crate::caption::Caption;
use crate::error::Result;
use crate::layout::WatermarkStyle;
use crate::pdf::merge::merge_labeled;
use crate::pdf::watermark::watermark_labeled;

/// A group of shipments processed together
#[derive(Debug, Clone)]
pub struct Batch {
    pub name: String,
    /// Stamp certificates with their caption
    pub add_watermark: bool,
    pub shipments: Vec<Shipment>,
}

/// One outgoing shipment (delivery note)
#[derive(Debug, Clone)]
pub struct Shipment {
    pub name: String,
    pub customer: Option<String>,
    /// Rendered delivery report, placed before the shipment's certificates
    pub report: Option<Vec<u8>>,
    pub lines: Vec<ShipmentLine>,
}

/// A shipped product line and the certificates attached to it
#[derive(Debug, Clone, Default)]
pub struct ShipmentLine {
    pub origin: Option<SourceOrder>,
    pub item: Option<String>,
    pub quantity_done: Option<f64>,
    pub quantity_planned: Option<f64>,
    pub lot: Option<String>,
    pub certificates: Vec<Certificate>,
}

impl ShipmentLine {
    /// Done quantity, else planned quantity; zero counts as unset
    pub fn quantity(&self) -> Option<f64> {
        self.quantity_done
            .filter(|q| *q != 0.0)
            .or(self.quantity_planned.filter(|q| *q != 0.0))
    }
}

/// The sales order a shipment line was created from
#[derive(Debug, Clone)]
pub struct SourceOrder {
    pub name: String,
    pub customer: Option<String>,
    pub client_order_ref: Option<String>,
}

/// A quality certificate PDF
#[derive(Debug, Clone, Default)]
pub struct Certificate {
    pub name: Option<String>,
    pub file: Option<Vec<u8>>,
}

impl Certificate {
    fn content(&self) -> Option<&[u8]> {
        self.file.as_deref().filter(|bytes| !bytes.is_empty())
    }
}

/// Shape of the bundle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Everything concatenated into one PDF
    #[default]
    Merged,
    /// One PDF per report and certificate, zipped
    Archive,
}

/// Options for building a bundle
#[derive(Debug, Clone, Default)]
pub struct BundleOptions {
    pub mode: OutputMode,
    pub style: WatermarkStyle,
}

/// The finished deliverable, ready to be attached to the batch
#[derive(Debug, Clone)]
pub struct Bundle {
    /// Display name of the attachment
    pub name: String,
    pub mime_type: &'static str,
    pub data: Vec<u8>,
}

impl Bundle {
    /// Suggested file name: the display name plus an extension
    pub fn file_name(&self) -> String {
        let extension = match self.mime_type {
            "application/zip" => "zip",
            _ => "pdf",
        };
        format!("{}.{}", self.name.replace('/', "-"), extension)
    }
}

/// A document on its way into the bundle
struct Part {
    entry_name: String,
    bytes: Vec<u8>,
}

/// Build the merged PDF or ZIP bundle for a batch
///
/// # Example
///
/// ```no_run
/// use pdf_cert_batch::batch::{build_bundle, Batch, BundleOptions, OutputMode};
///
/// let batch = Batch { name: "BATCH/0007".into(), add_watermark: true, shipments: vec![] };
/// let options = BundleOptions { mode: OutputMode::Archive, ..Default::default() };
/// let bundle = build_bundle(&batch, &options).unwrap();
/// assert_eq!(bundle.mime_type, "application/zip");
/// ```
#[instrument(skip_all, fields(batch = %batch.name, mode = ?options.mode))]
pub fn build_bundle(batch: &Batch, options: &BundleOptions) -> Result<Bundle> {
    let parts = collect_parts(batch, &options.style)?;

    let bundle = match options.mode {
        OutputMode::Merged => Bundle {
            name: format!("Certificados Lote - {}", batch.name),
            mime_type: "application/pdf",
            data: merge_labeled(
                parts
                    .iter()
                    .map(|part| (part.entry_name.clone(), part.bytes.as_slice())),
            )?,
        },
        OutputMode::Archive => {
            let entries = unique_entries(parts);
            Bundle {
                name: format!("Certificados Lote (ZIP) - {}", batch.name),
                mime_type: "application/zip",
                data: archive(&entries)?,
            }
        }
    };

    info!(name = %bundle.name, bytes = bundle.data.len(), "Bundle built");
    Ok(bundle)
}

/// Reports and stamped certificates in bundle order
fn collect_parts(batch: &Batch, style: &WatermarkStyle) -> Result<Vec<Part>> {
    let mut parts = Vec::new();

    for shipment in &batch.shipments {
        if let Some(report) = &shipment.report {
            parts.push(Part {
                entry_name: format!("{}.pdf", shipment.name).replace('/', "-"),
                bytes: report.clone(),
            });
        }

        for line in &shipment.lines {
            for certificate in &line.certificates {
                let name = certificate
                    .name
                    .as_deref()
                    .filter(|n| !n.is_empty())
                    .unwrap_or("CERT");

                let Some(content) = certificate.content() else {
                    debug!(certificate = name, "Certificate has no file; skipped");
                    continue;
                };

                let text = if batch.add_watermark {
                    Caption::for_line(shipment, line)?.to_string()
                } else {
                    String::new()
                };

                let stamped = watermark_labeled(name, content, &text, style)?;
                parts.push(Part {
                    entry_name: format!("{}-{}.pdf", name, line.item.as_deref().unwrap_or("")),
                    bytes: stamped,
                });
            }
        }
    }

    debug!(parts = parts.len(), "Bundle parts collected");
    Ok(parts)
}

/// Archive entries with repeated names suffixed ` (2)`, ` (3)`, ...
fn unique_entries(parts: Vec<Part>) -> Vec<ArchiveEntry> {
    let mut taken = HashSet::new();

    parts
        .into_iter()
        .map(|part| {
            let stem = part.entry_name.strip_suffix(".pdf").unwrap_or(&part.entry_name);
            let mut name = part.entry_name.clone();
            let mut copy = 2;
            while !taken.insert(name.clone()) {
                name = format!("{stem} ({copy}).pdf");
                copy += 1;
            }
            if name != part.entry_name {
                debug!(entry = %part.entry_name, renamed = %name, "Duplicate entry name");
            }
            ArchiveEntry::new(name, part.bytes)
        })
        .collect()
}
