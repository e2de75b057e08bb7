//! Watermark caption for a certificate
//!
//! The caption carries the order, customer, shipment, item, quantity and lot
//! of the shipment line a certificate belongs to. The line break sits right
//! after the order reference so both halves fit along the page's bottom edge.

use std::fmt;

use crate::batch::{Shipment, ShipmentLine};
use crate::error::{Error, Result};

/// Fields shown in a certificate watermark
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Caption {
    /// Name of the source order
    pub source_document: String,
    pub customer: String,
    /// Customer's own order reference
    pub order_reference: String,
    /// Shipment (delivery note) name
    pub shipment: String,
    pub item: String,
    pub quantity: String,
    /// Lot / heat number
    pub lot: String,
}

impl Caption {
    /// Gather the caption fields for one shipment line
    ///
    /// The customer comes from the source order when it has one, otherwise
    /// from the shipment. The quantity is the done quantity, falling back to
    /// the planned one, then to `0`.
    pub fn for_line(shipment: &Shipment, line: &ShipmentLine) -> Result<Self> {
        if shipment.name.trim().is_empty() {
            return Err(Error::MissingField { record: "shipment", field: "name" });
        }

        let origin = line.origin.as_ref();
        if let Some(origin) = origin {
            if origin.name.trim().is_empty() {
                return Err(Error::MissingField { record: "source order", field: "name" });
            }
        }

        let customer = origin
            .and_then(|o| o.customer.clone())
            .or_else(|| shipment.customer.clone())
            .unwrap_or_default();

        Ok(Self {
            source_document: origin.map(|o| o.name.clone()).unwrap_or_default(),
            customer,
            order_reference: origin
                .and_then(|o| o.client_order_ref.clone())
                .unwrap_or_default(),
            shipment: shipment.name.clone(),
            item: line.item.clone().unwrap_or_default(),
            quantity: format_quantity(line.quantity()),
            lot: line.lot.clone().unwrap_or_default(),
        })
    }
}

impl fmt::Display for Caption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SIDSA: {}  Cliente: {} N°Pedido: {} \n Albarán: {} Item: {} Cantidad: {} Colada: {}",
            self.source_document,
            self.customer,
            self.order_reference,
            self.shipment,
            self.item,
            self.quantity,
            self.lot,
        )
    }
}

/// Quantities print with at least one decimal (`5.0`); a missing one is `0`
fn format_quantity(quantity: Option<f64>) -> String {
    match quantity {
        Some(q) => format!("{q:?}"),
        None => "0".to_string(),
    }
}
