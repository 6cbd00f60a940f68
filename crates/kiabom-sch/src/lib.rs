//! Component model and BOM reconciliation for KiCad schematics.
//!
//! The crate takes the components of a KiCad XML netlist export, joins them
//! with supplier pricing records and produces an ordered, grouped table that
//! the output writers can serialise without further processing.
//!
//! The pipeline runs strictly in order:
//!
//! * [`filter`] drops ignored, excluded and DNP components.
//! * [`bom::matcher`] aligns every surviving component with the supplier results.
//! * [`bom::gap_fill`] substitutes secondary supplier data where the primary missed.
//! * [`bom::group`] buckets the merged records into BOM lines.
//! * [`bom::columns`] and [`bom::table`] project and assemble the final rows.
//!
//! [`build_bom`] drives all of the above.

pub mod bom;
pub mod currency;
pub mod error;
pub mod filter;
pub mod kicad_netlist;
mod pipeline;
pub mod refdes;
pub mod supplier;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub use bom::Bom;
pub use currency::Currency;
pub use error::{BomError, BomWarning, MalformedReference};
pub use pipeline::{BomConfig, Suppliers, build_bom};
pub use refdes::RefDes;

/// Field names KiCad always emits for a symbol.
pub const FIELD_VALUE: &str = "Value";
pub const FIELD_FOOTPRINT: &str = "Footprint";
pub const FIELD_DATASHEET: &str = "Datasheet";
pub const FIELD_DESCRIPTION: &str = "Description";
pub const FIELD_MPN: &str = "MPN";
pub const FIELD_MANUFACTURER: &str = "Manufacturer";

/// Pseudo grouping field keyed on the component's DNP flag.
pub const FIELD_DNP: &str = "DNP";

/// A single schematic symbol instance.
///
/// Every field of the symbol lives in `fields`, including the built-in
/// `Value`, `Footprint`, `Datasheet` and `Description` entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Component {
    pub reference: String,
    pub fields: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub dnp: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub exclude_from_bom: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub exclude_from_board: bool,
}

impl Component {
    pub fn new(
        reference: impl Into<String>,
        value: impl Into<String>,
        footprint: impl Into<String>,
    ) -> Self {
        let mut fields = BTreeMap::new();
        fields.insert(FIELD_VALUE.to_string(), value.into());
        fields.insert(FIELD_FOOTPRINT.to_string(), footprint.into());
        Self {
            reference: reference.into(),
            fields,
            dnp: false,
            exclude_from_bom: false,
            exclude_from_board: false,
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn with_dnp(mut self, dnp: bool) -> Self {
        self.dnp = dnp;
        self
    }

    pub fn with_exclude_from_bom(mut self, exclude: bool) -> Self {
        self.exclude_from_bom = exclude;
        self
    }

    pub fn with_exclude_from_board(mut self, exclude: bool) -> Self {
        self.exclude_from_board = exclude;
        self
    }

    /// Field value by exact name, `None` when the symbol does not carry it.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Field value by exact name with missing fields read as empty.
    pub fn field_or_empty(&self, name: &str) -> &str {
        self.field(name).unwrap_or_default()
    }

    pub fn value(&self) -> &str {
        self.field_or_empty(FIELD_VALUE)
    }

    pub fn footprint(&self) -> &str {
        self.field_or_empty(FIELD_FOOTPRINT)
    }

    /// Footprint name without its `Library:` prefix.
    pub fn footprint_name(&self) -> &str {
        let footprint = self.footprint();
        footprint
            .split_once(':')
            .map(|(_, name)| name)
            .unwrap_or(footprint)
    }

    pub fn mpn(&self) -> &str {
        self.field_or_empty(FIELD_MPN)
    }

    /// "DNP" for do-not-populate components, empty otherwise.
    pub fn dnp_marker(&self) -> &'static str {
        if self.dnp { FIELD_DNP } else { "" }
    }

    /// Value used when grouping by `name`.
    ///
    /// `DNP` reads the flag rather than a field, and missing fields are the
    /// empty string so they still form a valid key component.
    pub fn group_value(&self, name: &str) -> String {
        if name == FIELD_DNP {
            self.dnp_marker().to_string()
        } else {
            self.field_or_empty(name).to_string()
        }
    }
}
