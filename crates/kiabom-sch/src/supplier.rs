use std::collections::{BTreeSet, HashMap};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::Currency;

/// Quantity price break
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceBreak {
    pub quantity: u64,
    pub unit_price: Decimal,
}

/// Pricing and availability for one part query at one supplier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplierRecord {
    pub supplier: String,
    /// The query string this record answers.
    pub query: String,
    pub found: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_price: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub price_breaks: Vec<PriceBreak>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<Currency>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datasheet: Option<String>,
}

impl SupplierRecord {
    /// An empty record for a found part; fill the fields that apply.
    pub fn found(supplier: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            found: true,
            ..Self::not_found(supplier, query)
        }
    }

    /// The explicit "not found" record every miss is turned into.
    pub fn not_found(supplier: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            supplier: supplier.into(),
            query: query.into(),
            found: false,
            unit_price: None,
            price_breaks: Vec::new(),
            currency: None,
            stock: None,
            order_code: None,
            manufacturer: None,
            datasheet: None,
        }
    }

    /// Unit price when buying `qty` parts, see [`unit_price_at_qty`].
    pub fn unit_price_at_qty(&self, qty: u64) -> Option<Decimal> {
        unit_price_at_qty(&self.price_breaks, self.unit_price, qty)
    }
}

/// Unit price when buying `qty` parts.
///
/// Uses the highest price break at or below `qty`, the lowest break when
/// none applies, and the flat `unit_price` when there are no breaks.
pub fn unit_price_at_qty(
    price_breaks: &[PriceBreak],
    unit_price: Option<Decimal>,
    qty: u64,
) -> Option<Decimal> {
    if price_breaks.is_empty() {
        return unit_price;
    }

    let best_break = price_breaks
        .iter()
        .filter(|pb| pb.quantity <= qty)
        .max_by_key(|pb| pb.quantity)
        .or_else(|| price_breaks.iter().min_by_key(|pb| pb.quantity));

    best_break.map(|pb| pb.unit_price)
}

/// A supplier that can price a batch of part queries.
pub trait SupplierQuery {
    /// Display name, e.g. "Mouser".
    fn name(&self) -> &str;

    /// Component field holding this supplier's own order code (e.g. `Mouser#`).
    /// When a component carries it, it is queried instead of the MPN.
    fn order_code_field(&self) -> Option<&str> {
        None
    }

    /// Look up every query in `queries`.
    ///
    /// A part the supplier does not carry comes back as a not-found record.
    /// A query left out of the map could not be answered (e.g. a network
    /// error); it is treated as not found for this run but never cached.
    fn lookup(
        &self,
        queries: &BTreeSet<String>,
        currency: Currency,
    ) -> anyhow::Result<HashMap<String, SupplierRecord>>;
}

impl<T: SupplierQuery + ?Sized> SupplierQuery for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn order_code_field(&self) -> Option<&str> {
        (**self).order_code_field()
    }

    fn lookup(
        &self,
        queries: &BTreeSet<String>,
        currency: Currency,
    ) -> anyhow::Result<HashMap<String, SupplierRecord>> {
        (**self).lookup(queries, currency)
    }
}

/// In-memory supplier backed by a fixed record table.
///
/// Used for offline runs and tests; lookups are keyed case-insensitively like
/// the matcher does.
#[derive(Debug, Clone, Default)]
pub struct StaticSupplier {
    name: String,
    order_code_field: Option<String>,
    records: HashMap<String, SupplierRecord>,
}

impl StaticSupplier {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_order_code_field(mut self, field: impl Into<String>) -> Self {
        self.order_code_field = Some(field.into());
        self
    }

    pub fn with_record(mut self, record: SupplierRecord) -> Self {
        self.records
            .insert(record.query.trim().to_lowercase(), record);
        self
    }
}

impl SupplierQuery for StaticSupplier {
    fn name(&self) -> &str {
        &self.name
    }

    fn order_code_field(&self) -> Option<&str> {
        self.order_code_field.as_deref()
    }

    fn lookup(
        &self,
        queries: &BTreeSet<String>,
        _currency: Currency,
    ) -> anyhow::Result<HashMap<String, SupplierRecord>> {
        Ok(queries
            .iter()
            .map(|q| {
                let record = self
                    .records
                    .get(&q.trim().to_lowercase())
                    .cloned()
                    .unwrap_or_else(|| SupplierRecord::not_found(&self.name, q.as_str()));
                (q.clone(), record)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn with_breaks(breaks: &[(u64, Decimal)]) -> SupplierRecord {
        let mut record = SupplierRecord::found("Mouser", "ABC");
        record.price_breaks = breaks
            .iter()
            .map(|(quantity, unit_price)| PriceBreak {
                quantity: *quantity,
                unit_price: *unit_price,
            })
            .collect();
        record
    }

    #[test]
    fn test_unit_price_at_qty_picks_highest_applicable_break() {
        let record = with_breaks(&[(1, dec!(0.10)), (10, dec!(0.05)), (100, dec!(0.02))]);
        assert_eq!(record.unit_price_at_qty(1), Some(dec!(0.10)));
        assert_eq!(record.unit_price_at_qty(9), Some(dec!(0.10)));
        assert_eq!(record.unit_price_at_qty(10), Some(dec!(0.05)));
        assert_eq!(record.unit_price_at_qty(5000), Some(dec!(0.02)));
    }

    #[test]
    fn test_unit_price_below_lowest_break_uses_lowest() {
        let record = with_breaks(&[(100, dec!(0.02)), (10, dec!(0.05))]);
        assert_eq!(record.unit_price_at_qty(2), Some(dec!(0.05)));
    }

    #[test]
    fn test_unit_price_without_breaks() {
        let mut record = SupplierRecord::found("Mouser", "ABC");
        assert_eq!(record.unit_price_at_qty(3), None);
        record.unit_price = Some(dec!(1.25));
        assert_eq!(record.unit_price_at_qty(3), Some(dec!(1.25)));
    }

    #[test]
    fn test_static_supplier_matches_case_insensitively() {
        let supplier = StaticSupplier::new("Mouser")
            .with_record(SupplierRecord::found("Mouser", "ABC-1"));
        let queries: BTreeSet<String> = ["abc-1".to_string(), "nope".to_string()].into();
        let results = supplier.lookup(&queries, Currency::Gbp).unwrap();
        assert_eq!(results.len(), 2);
        assert!(results["abc-1"].found);
        assert_eq!(results["nope"], SupplierRecord::not_found("Mouser", "nope"));
    }
}
