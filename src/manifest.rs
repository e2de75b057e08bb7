//! JSON batch manifests
//!
//! A manifest describes a batch on disk so the CLI can bundle it without a
//! host system. File paths are relative to the manifest's directory.
//!
//! ```json
//! {
//!   "name": "BATCH/0001",
//!   "shipments": [{
//!     "name": "WH/OUT/0001",
//!     "customer": "ACME",
//!     "report": "reports/WH-OUT-0001.pdf",
//!     "lines": [{
//!       "origin": { "name": "S001", "client_order_ref": "PO-1" },
//!       "item": "10",
//!       "quantity_done": 3.0,
//!       "lot": "L-1",
//!       "certificates": [{ "name": "CERT-A", "file": "certs/a.pdf" }]
//!     }]
//!   }]
//! }
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, instrument};

use crate::batch::{Batch, Certificate, Shipment, ShipmentLine, SourceOrder};
use crate::error::Result;
use crate::inputs::read_file;

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct BatchManifest {
    pub name: String,
    #[serde(default = "default_true")]
    pub add_watermark: bool,
    #[serde(default)]
    pub shipments: Vec<ShipmentManifest>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ShipmentManifest {
    pub name: String,
    #[serde(default)]
    pub customer: Option<String>,
    /// Path of the rendered delivery report
    #[serde(default)]
    pub report: Option<PathBuf>,
    #[serde(default)]
    pub lines: Vec<LineManifest>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LineManifest {
    #[serde(default)]
    pub origin: Option<OriginManifest>,
    #[serde(default)]
    pub item: Option<String>,
    #[serde(default)]
    pub quantity_done: Option<f64>,
    #[serde(default)]
    pub quantity_planned: Option<f64>,
    #[serde(default)]
    pub lot: Option<String>,
    #[serde(default)]
    pub certificates: Vec<CertificateManifest>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OriginManifest {
    pub name: String,
    #[serde(default)]
    pub customer: Option<String>,
    #[serde(default)]
    pub client_order_ref: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CertificateManifest {
    #[serde(default)]
    pub name: Option<String>,
    /// Path of the certificate PDF; certificates without one are skipped
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl BatchManifest {
    /// Parse a manifest from JSON text
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a manifest file
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = read_file(path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Read every referenced file and build the in-memory batch
    #[instrument(skip(self), fields(batch = %self.name))]
    pub fn into_batch(self, base_dir: &Path) -> Result<Batch> {
        let resolve = |path: &Path| -> Result<Vec<u8>> {
            let full = base_dir.join(path);
            debug!(path = %full.display(), "Reading manifest file");
            read_file(&full)
        };

        let mut shipments = Vec::with_capacity(self.shipments.len());
        for shipment in self.shipments {
            let report = shipment.report.as_deref().map(resolve).transpose()?;

            let mut lines = Vec::with_capacity(shipment.lines.len());
            for line in shipment.lines {
                let mut certificates = Vec::with_capacity(line.certificates.len());
                for certificate in line.certificates {
                    certificates.push(Certificate {
                        name: certificate.name,
                        file: certificate.file.as_deref().map(resolve).transpose()?,
                    });
                }

                lines.push(ShipmentLine {
                    origin: line.origin.map(|o| SourceOrder {
                        name: o.name,
                        customer: o.customer,
                        client_order_ref: o.client_order_ref,
                    }),
                    item: line.item,
                    quantity_done: line.quantity_done,
                    quantity_planned: line.quantity_planned,
                    lot: line.lot,
                    certificates,
                });
            }

            shipments.push(Shipment {
                name: shipment.name,
                customer: shipment.customer,
                report,
                lines,
            });
        }

        Ok(Batch {
            name: self.name,
            add_watermark: self.add_watermark,
            shipments,
        })
    }
}

/// Load a manifest file and every file it references
pub fn load_batch(path: &Path) -> Result<Batch> {
    let manifest = BatchManifest::load(path)?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    manifest.into_batch(base_dir)
}
