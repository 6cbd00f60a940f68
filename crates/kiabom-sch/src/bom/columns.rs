use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{Group, Provenance};
use crate::error::BomError;
use crate::{Currency, FIELD_DATASHEET, FIELD_DESCRIPTION, FIELD_MANUFACTURER};

/// An output column: either computed from the group or a verbatim schematic field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Column {
    GroupId,
    Quantity,
    SchematicRef,
    Designator,
    Dnp,
    Description,
    Datasheet,
    Footprint,
    Value,
    Comment,
    Manufacturer,
    Mpn,
    PreferredSupplier,
    OrderCode,
    AltSupplier,
    AltOrderCode,
    UnitPrice,
    TotalPrice,
    Stock,
    Provenance,
    Field(String),
}

impl Column {
    /// Every computed column, in the canonical order.
    pub const COMPUTED: [Column; 20] = [
        Column::GroupId,
        Column::Quantity,
        Column::SchematicRef,
        Column::Designator,
        Column::Dnp,
        Column::Description,
        Column::Datasheet,
        Column::Footprint,
        Column::Value,
        Column::Comment,
        Column::Manufacturer,
        Column::Mpn,
        Column::PreferredSupplier,
        Column::OrderCode,
        Column::AltSupplier,
        Column::AltOrderCode,
        Column::UnitPrice,
        Column::TotalPrice,
        Column::Stock,
        Column::Provenance,
    ];

    pub fn name(&self) -> &str {
        match self {
            Column::GroupId => "Group ID",
            Column::Quantity => "Quantity",
            Column::SchematicRef => "Schematic Ref",
            Column::Designator => "Designator",
            Column::Dnp => "DNP",
            Column::Description => "Description",
            Column::Datasheet => "Datasheet",
            Column::Footprint => "Footprint",
            Column::Value => "Value",
            Column::Comment => "Comment",
            Column::Manufacturer => "Manufacturer",
            Column::Mpn => "MPN",
            Column::PreferredSupplier => "Preferred Supplier",
            Column::OrderCode => "Order Code",
            Column::AltSupplier => "Alt. Supplier",
            Column::AltOrderCode => "Alt. Order Code",
            Column::UnitPrice => "Unit/Reel Price",
            Column::TotalPrice => "Total Price",
            Column::Stock => "Stock",
            Column::Provenance => "Provenance",
            Column::Field(name) => name,
        }
    }

    /// The computed column called `name`, if any.
    pub fn computed(name: &str) -> Option<Column> {
        Self::COMPUTED.into_iter().find(|c| c.name() == name)
    }

    /// Resolve a requested column name.
    ///
    /// Names that are neither computed nor a field known to some component
    /// are rejected.
    pub fn resolve(name: &str, is_field: impl Fn(&str) -> bool) -> Result<Column, BomError> {
        if let Some(column) = Self::computed(name) {
            return Ok(column);
        }
        if is_field(name) {
            return Ok(Column::Field(name.to_string()));
        }
        Err(BomError::UnsupportedColumn(name.to_string()))
    }
}

impl std::fmt::Display for Column {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Renders groups onto the resolved column list.
#[derive(Debug, Clone)]
pub struct Projector<'a> {
    columns: &'a [Column],
    currency: Currency,
    board_quantity: u64,
    currency_symbol: bool,
}

impl<'a> Projector<'a> {
    pub fn new(columns: &'a [Column], currency: Currency, board_quantity: u64) -> Self {
        Self {
            columns,
            currency,
            board_quantity,
            currency_symbol: false,
        }
    }

    /// Prefix prices with the currency symbol.
    pub fn with_currency_symbol(mut self, yes: bool) -> Self {
        self.currency_symbol = yes;
        self
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    pub fn currency_symbol(&self) -> bool {
        self.currency_symbol
    }

    pub fn header(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name().to_string()).collect()
    }

    /// Parts to order for this line across all boards, saturating at
    /// `u64::MAX`. [`crate::build_bom`] rejects boards that would overflow.
    pub fn order_quantity(&self, group: &Group) -> u64 {
        group.quantity.saturating_mul(self.board_quantity)
    }

    /// Unit price at the order quantity's price break.
    pub fn unit_price(&self, group: &Group) -> Option<Decimal> {
        group
            .representative()
            .offer
            .unit_price_at_qty(self.order_quantity(group))
    }

    /// Unit price times the order quantity, rounded to the currency's minor unit.
    pub fn total_price(&self, group: &Group) -> Option<Decimal> {
        let unit = self.unit_price(group)?;
        let total = unit.checked_mul(Decimal::from(self.order_quantity(group)))?;
        Some(self.currency.round(total))
    }

    /// The cells of `group`, which is line `index` (0-based) of its section.
    pub fn row(&self, index: usize, group: &Group) -> Vec<String> {
        self.columns
            .iter()
            .map(|column| self.cell(column, index, group))
            .collect()
    }

    fn cell(&self, column: &Column, index: usize, group: &Group) -> String {
        let rep = group.representative();
        let component = &rep.component;
        let offer = &rep.offer;
        // Alternative columns only carry data when the primary supplied the line.
        let alternative = rep
            .alternative()
            .filter(|_| rep.provenance == Provenance::Primary);

        match column {
            Column::GroupId => format!("{}{}", component.dnp_marker(), index + 1),
            Column::Quantity => self.order_quantity(group).to_string(),
            Column::SchematicRef | Column::Designator => {
                group.references().collect::<Vec<_>>().join(",")
            }
            Column::Dnp => component.dnp_marker().to_string(),
            Column::Description => component.field_or_empty(FIELD_DESCRIPTION).to_string(),
            Column::Datasheet => component.field_or_empty(FIELD_DATASHEET).to_string(),
            Column::Footprint => component.footprint_name().to_string(),
            Column::Value | Column::Comment => component.value().to_string(),
            Column::Manufacturer => offer
                .manufacturer
                .clone()
                .unwrap_or_else(|| component.field_or_empty(FIELD_MANUFACTURER).to_string()),
            Column::Mpn => component.mpn().to_string(),
            Column::PreferredSupplier => offer.supplier.clone().unwrap_or_default(),
            Column::OrderCode => offer.order_code.clone().unwrap_or_default(),
            Column::AltSupplier => alternative
                .map(|r| r.supplier.clone())
                .unwrap_or_default(),
            Column::AltOrderCode => alternative
                .and_then(|r| r.order_code.clone())
                .unwrap_or_default(),
            Column::UnitPrice => self
                .unit_price(group)
                .map(|p| self.format_unit_price(p))
                .unwrap_or_default(),
            Column::TotalPrice => self
                .total_price(group)
                .map(|p| self.currency.format(p, self.currency_symbol))
                .unwrap_or_default(),
            Column::Stock => offer.stock.map(|s| s.to_string()).unwrap_or_default(),
            Column::Provenance => rep.provenance.to_string(),
            Column::Field(name) => component.field_or_empty(name).to_string(),
        }
    }

    fn format_unit_price(&self, price: Decimal) -> String {
        if self.currency_symbol {
            format!("{}{}", self.currency.symbol(), price)
        } else {
            price.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Component;
    use crate::bom::gap_fill::fill_gaps;
    use crate::bom::matcher::Candidate;
    use crate::supplier::{PriceBreak, SupplierRecord};
    use rust_decimal_macros::dec;

    fn group(records: Vec<(Component, SupplierRecord, Option<SupplierRecord>)>) -> Group {
        let members: Vec<_> = records
            .into_iter()
            .map(|(component, primary, secondary)| {
                fill_gaps(Candidate {
                    component,
                    primary,
                    secondary,
                })
            })
            .collect();
        Group {
            key: Vec::new(),
            quantity: members.len() as u64,
            members,
        }
    }

    fn hit(supplier: &str, query: &str, price: Decimal, code: &str) -> SupplierRecord {
        let mut record = SupplierRecord::found(supplier, query);
        record.unit_price = Some(price);
        record.order_code = Some(code.to_string());
        record.manufacturer = Some("Yageo".to_string());
        record.stock = Some(500);
        record
    }

    fn resistor(reference: &str) -> Component {
        Component::new(reference, "10k", "Resistor_SMD:R_0603")
            .with_field("MPN", "ABC")
            .with_field("Rating", "0.1W")
    }

    #[test]
    fn test_resolve_columns() {
        let is_field = |name: &str| name == "Rating";
        assert_eq!(Column::resolve("Total Price", is_field).unwrap(), Column::TotalPrice);
        assert_eq!(
            Column::resolve("Rating", is_field).unwrap(),
            Column::Field("Rating".to_string())
        );
        let err = Column::resolve("Colour", is_field).unwrap_err();
        assert!(matches!(err, BomError::UnsupportedColumn(ref c) if c == "Colour"));
    }

    #[test]
    fn test_row_projection() {
        let columns: Vec<Column> = [
            "Group ID",
            "Quantity",
            "Designator",
            "Footprint",
            "Comment",
            "Rating",
            "Manufacturer",
            "Preferred Supplier",
            "Order Code",
            "Alt. Supplier",
            "Alt. Order Code",
            "Unit/Reel Price",
            "Total Price",
            "Stock",
            "Provenance",
        ]
        .iter()
        .map(|name| Column::resolve(name, |f| f == "Rating").unwrap())
        .collect();
        let g = group(vec![
            (
                resistor("R1"),
                hit("Mouser", "ABC", dec!(0.05), "603-ABC"),
                Some(hit("DigiKey", "ABC", dec!(0.06), "311-ABC-ND")),
            ),
            (
                resistor("R2"),
                hit("Mouser", "ABC", dec!(0.05), "603-ABC"),
                Some(hit("DigiKey", "ABC", dec!(0.06), "311-ABC-ND")),
            ),
        ]);

        let projector = Projector::new(&columns, Currency::Gbp, 3);
        assert_eq!(
            projector.row(0, &g),
            vec![
                "1",
                "6",
                "R1,R2",
                "R_0603",
                "10k",
                "0.1W",
                "Yageo",
                "Mouser",
                "603-ABC",
                "DigiKey",
                "311-ABC-ND",
                "0.05",
                "0.30",
                "500",
                "primary",
            ]
        );
    }

    #[test]
    fn test_total_uses_price_break_at_order_quantity() {
        let mut record = SupplierRecord::found("Mouser", "ABC");
        record.price_breaks = vec![
            PriceBreak {
                quantity: 1,
                unit_price: dec!(0.10),
            },
            PriceBreak {
                quantity: 10,
                unit_price: dec!(0.04),
            },
        ];
        let g = group(vec![(resistor("R1"), record, None)]);
        let columns = [Column::UnitPrice, Column::TotalPrice];

        let single = Projector::new(&columns, Currency::Gbp, 1);
        assert_eq!(single.row(0, &g), vec!["0.10", "0.10"]);

        let batch = Projector::new(&columns, Currency::Gbp, 25).with_currency_symbol(true);
        assert_eq!(batch.row(0, &g), vec!["£0.04", "£1.00"]);
    }

    #[test]
    fn test_order_quantity_saturates() {
        let g = group(vec![
            (resistor("R1"), hit("Mouser", "ABC", dec!(0.10), "603-ABC"), None),
            (resistor("R2"), hit("Mouser", "ABC", dec!(0.10), "603-ABC"), None),
        ]);
        let columns = [Column::Quantity, Column::TotalPrice];
        let projector = Projector::new(&columns, Currency::Gbp, u64::MAX);

        let row = projector.row(0, &g);
        assert_eq!(row[0], u64::MAX.to_string());
        assert!(!row[1].is_empty());
    }

    #[test]
    fn test_secondary_fill_hides_alternative_columns() {
        let g = group(vec![(
            resistor("R1"),
            SupplierRecord::not_found("Mouser", "ABC"),
            Some(hit("DigiKey", "ABC", dec!(0.06), "311-ABC-ND")),
        )]);
        let columns = [
            Column::PreferredSupplier,
            Column::OrderCode,
            Column::AltSupplier,
            Column::AltOrderCode,
            Column::Provenance,
        ];
        let projector = Projector::new(&columns, Currency::Usd, 1);
        assert_eq!(
            projector.row(0, &g),
            vec!["DigiKey", "311-ABC-ND", "", "", "secondary"]
        );
    }

    #[test]
    fn test_not_found_has_empty_supplier_cells() {
        let component = Component::new("R1", "10k", "0603")
            .with_field("MPN", "")
            .with_field("Manufacturer", "Generic")
            .with_dnp(true);
        let g = group(vec![(
            component,
            SupplierRecord::not_found("Mouser", ""),
            None,
        )]);
        let columns = [
            Column::GroupId,
            Column::Dnp,
            Column::Manufacturer,
            Column::UnitPrice,
            Column::TotalPrice,
            Column::Stock,
            Column::Provenance,
        ];
        let projector = Projector::new(&columns, Currency::Gbp, 1);
        assert_eq!(
            projector.row(1, &g),
            vec!["DNP2", "DNP", "Generic", "", "", "", ""]
        );
    }
}
