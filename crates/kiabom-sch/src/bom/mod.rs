pub mod columns;
pub mod gap_fill;
pub mod group;
pub mod matcher;
pub mod table;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::BomWarning;
use crate::supplier::{PriceBreak, SupplierRecord, unit_price_at_qty};
use crate::{Component, Currency};

pub use columns::{Column, Projector};
pub use group::{Group, GroupFields};
pub use table::{BomTable, InfoBlock, RowKind, TableOptions, TableRow};

/// Which supplier the resolved offer of a merged record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    Primary,
    Secondary,
    #[default]
    None,
}

impl std::fmt::Display for Provenance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Provenance::Primary => write!(f, "primary"),
            Provenance::Secondary => write!(f, "secondary"),
            Provenance::None => Ok(()),
        }
    }
}

/// The supplier-derived fields of a merged record.
///
/// Every field is present on every record; a miss is an explicit `None`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Offer {
    pub supplier: Option<String>,
    pub unit_price: Option<Decimal>,
    pub price_breaks: Vec<PriceBreak>,
    pub currency: Option<Currency>,
    pub stock: Option<u64>,
    pub order_code: Option<String>,
    pub manufacturer: Option<String>,
    pub datasheet: Option<String>,
}

impl Offer {
    /// Unit price for `qty` parts, see [`unit_price_at_qty`].
    pub fn unit_price_at_qty(&self, qty: u64) -> Option<Decimal> {
        unit_price_at_qty(&self.price_breaks, self.unit_price, qty)
    }
}

impl From<&SupplierRecord> for Offer {
    fn from(record: &SupplierRecord) -> Self {
        if !record.found {
            return Offer::default();
        }
        Offer {
            supplier: Some(record.supplier.clone()),
            unit_price: record.unit_price,
            price_breaks: record.price_breaks.clone(),
            currency: record.currency,
            stock: record.stock,
            order_code: record.order_code.clone(),
            manufacturer: record.manufacturer.clone(),
            datasheet: record.datasheet.clone(),
        }
    }
}

/// One component joined with its supplier results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergedRecord {
    pub component: Component,
    pub primary: SupplierRecord,
    /// `None` when secondary lookups are disabled.
    pub secondary: Option<SupplierRecord>,
    /// Resolved offer after gap filling.
    pub offer: Offer,
    pub provenance: Provenance,
}

impl MergedRecord {
    /// The secondary record, if one was found.
    pub fn alternative(&self) -> Option<&SupplierRecord> {
        self.secondary.as_ref().filter(|r| r.found)
    }
}

/// A fully grouped BOM: populated lines, the DNP section and any warnings
/// raised while building it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Bom {
    pub groups: Vec<Group>,
    pub dnp_groups: Vec<Group>,
    pub columns: Vec<Column>,
    pub warnings: Vec<BomWarning>,
}

impl Bom {
    /// Number of components across every group, DNP section included.
    pub fn component_count(&self) -> usize {
        self.groups
            .iter()
            .chain(&self.dnp_groups)
            .map(|g| g.members.len())
            .sum()
    }

    /// Datasheet URLs of every group, first occurrence first.
    pub fn datasheet_urls(&self) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        self.groups
            .iter()
            .chain(&self.dnp_groups)
            .filter_map(|g| g.datasheet())
            .filter(|url| seen.insert(url.clone()))
            .collect()
    }
}
