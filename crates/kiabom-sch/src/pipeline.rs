use std::collections::BTreeSet;

use crate::bom::group::{Grouper, sort_by_reference};
use crate::bom::matcher::{self, SupplierResults};
use crate::bom::{Bom, Column, Group, GroupFields, gap_fill};
use crate::error::BomError;
use crate::filter::{DnpRetention, FilterOptions, IgnoreSet, filter_components};
use crate::supplier::SupplierQuery;
use crate::{Component, Currency, FIELD_MPN};

/// Fully resolved settings for one BOM run.
///
/// Presets and command-line parsing happen upstream; this only carries plain
/// lists and flags.
#[derive(Debug, Clone)]
pub struct BomConfig {
    pub group_fields: GroupFields,
    pub columns: Vec<String>,
    pub ignore: IgnoreSet,
    /// Field identifying the part at a supplier.
    pub identity_field: String,
    /// Optional field holding a per-instance repeat count.
    pub quantity_field: Option<String>,
    pub currency: Currency,
    pub board_quantity: u64,
    pub primary_only: bool,
    pub keep_dnp: bool,
    pub keep_exclude_from_bom: bool,
    pub keep_exclude_from_board: bool,
    pub remove_ignore_mpn_parts: bool,
}

impl BomConfig {
    pub fn new(group_fields: GroupFields, columns: Vec<String>) -> Self {
        Self {
            group_fields,
            columns,
            ignore: IgnoreSet::default(),
            identity_field: FIELD_MPN.to_string(),
            quantity_field: Some("Qty".to_string()),
            currency: Currency::default(),
            board_quantity: 1,
            primary_only: false,
            keep_dnp: false,
            keep_exclude_from_bom: false,
            keep_exclude_from_board: false,
            remove_ignore_mpn_parts: false,
        }
    }

    pub fn filter_options(&self) -> FilterOptions {
        FilterOptions {
            ignore: self.ignore.clone(),
            remove_ignore_mpn_parts: self.remove_ignore_mpn_parts,
            keep_exclude_from_bom: self.keep_exclude_from_bom,
            keep_exclude_from_board: self.keep_exclude_from_board,
            dnp: if self.keep_dnp {
                DnpRetention::Keep
            } else {
                DnpRetention::Exclude
            },
        }
    }
}

/// Suppliers consulted for a run. No primary means an offline run where every
/// supplier column stays empty.
#[derive(Default, Clone, Copy)]
pub struct Suppliers<'a> {
    pub primary: Option<&'a dyn SupplierQuery>,
    pub secondary: Option<&'a dyn SupplierQuery>,
}

/// Build the grouped BOM for `components`.
///
/// Configuration errors (bad columns, board quantity) abort before any
/// supplier is queried; an order quantity overflowing `u64` aborts once the
/// lines are known. Supplier failures and malformed references only add
/// warnings.
pub fn build_bom(
    components: &[Component],
    config: &BomConfig,
    suppliers: Suppliers,
) -> Result<Bom, BomError> {
    if config.board_quantity == 0 {
        return Err(BomError::InvalidBoardQuantity);
    }

    let options = config.filter_options();
    let main = filter_components(components, &options);
    let dnp = if config.keep_dnp {
        Vec::new()
    } else {
        filter_components(components, &options.dnp_view())
    };
    log::debug!(
        "{} components after filtering, {} in the DNP section",
        main.len(),
        dnp.len()
    );

    // Fields of filtered-out components are still schematic fields.
    let columns = resolve_columns(&config.columns, components.iter())?;

    let mut warnings = Vec::new();
    let surviving: Vec<&Component> = main.iter().chain(&dnp).copied().collect();
    let primary = match suppliers.primary {
        Some(supplier) => {
            let (results, warning) = matcher::lookup(
                supplier,
                &surviving,
                &config.identity_field,
                &config.ignore,
                config.currency,
            );
            warnings.extend(warning);
            results
        }
        None => SupplierResults::empty(""),
    };
    let secondary = match suppliers.secondary.filter(|_| !config.primary_only) {
        Some(supplier) => {
            let (results, warning) = matcher::lookup(
                supplier,
                &surviving,
                &config.identity_field,
                &config.ignore,
                config.currency,
            );
            warnings.extend(warning);
            Some(results)
        }
        None => None,
    };

    let grouper = Grouper::new(&config.group_fields)
        .with_quantity_field(config.quantity_field.as_deref());
    let mut section = |components: &[&Component]| {
        let candidates = matcher::match_components(
            components,
            &primary,
            secondary.as_ref(),
            &config.identity_field,
            &config.ignore,
        );
        let mut records = gap_fill::fill_all(candidates);
        sort_by_reference(&mut records, &mut warnings);
        grouper.group(records, &mut warnings)
    };
    let groups = section(&main);
    let dnp_groups = section(&dnp);
    check_order_quantities(groups.iter().chain(&dnp_groups), config.board_quantity)?;

    Ok(Bom {
        groups,
        dnp_groups,
        columns,
        warnings,
    })
}

/// Every line's order quantity must fit in a `u64`.
fn check_order_quantities<'a>(
    groups: impl Iterator<Item = &'a Group>,
    board_quantity: u64,
) -> Result<(), BomError> {
    for group in groups {
        if group.quantity.checked_mul(board_quantity).is_none() {
            return Err(BomError::QuantityOverflow {
                reference: group.references().collect::<Vec<_>>().join(","),
                board_quantity,
            });
        }
    }
    Ok(())
}

/// Resolve requested column names against the fields the components carry.
fn resolve_columns<'a>(
    names: &[String],
    components: impl Iterator<Item = &'a Component>,
) -> Result<Vec<Column>, BomError> {
    let known: BTreeSet<&str> = components
        .flat_map(|c| c.fields.keys().map(String::as_str))
        .collect();
    let columns = names
        .iter()
        .map(|name| name.trim())
        .filter(|name| !name.is_empty())
        .map(|name| Column::resolve(name, |field| known.contains(field)))
        .collect::<Result<Vec<_>, _>>()?;
    if columns.is_empty() {
        return Err(BomError::NoColumns);
    }
    Ok(columns)
}
