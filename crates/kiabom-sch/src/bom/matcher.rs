//! Joins the ordered component list with per-supplier lookup results.

use std::collections::{BTreeSet, HashMap};

use crate::error::BomWarning;
use crate::filter::IgnoreSet;
use crate::supplier::{SupplierQuery, SupplierRecord};
use crate::{Component, Currency};

/// Matching key: trimmed and case-folded.
pub fn match_key(query: &str) -> String {
    query.trim().to_lowercase()
}

/// Lookup results of one supplier, keyed by [`match_key`].
#[derive(Debug, Clone, Default)]
pub struct SupplierResults {
    pub supplier: String,
    pub order_code_field: Option<String>,
    records: HashMap<String, SupplierRecord>,
}

impl SupplierResults {
    /// Results of a supplier that was not consulted: every component misses.
    pub fn empty(supplier: impl Into<String>) -> Self {
        Self {
            supplier: supplier.into(),
            ..Default::default()
        }
    }

    pub fn from_records(
        supplier: impl Into<String>,
        order_code_field: Option<String>,
        records: impl IntoIterator<Item = (String, SupplierRecord)>,
    ) -> Self {
        Self {
            supplier: supplier.into(),
            order_code_field,
            records: records
                .into_iter()
                .map(|(query, record)| (match_key(&query), record))
                .collect(),
        }
    }

    /// Query `component` would be looked up with at this supplier, or `None`
    /// when it must not be queried.
    ///
    /// The supplier's own order-code field wins over the identity field.
    /// Ignored or empty identities are never queried.
    pub fn query_for(
        order_code_field: Option<&str>,
        component: &Component,
        identity_field: &str,
        ignore: &IgnoreSet,
    ) -> Option<String> {
        if let Some(code) = order_code_field
            .and_then(|field| component.field(field))
            .map(str::trim)
            .filter(|code| !code.is_empty())
        {
            return Some(code.to_string());
        }

        let identity = component.field_or_empty(identity_field).trim();
        if identity.is_empty() || ignore.contains(identity) {
            None
        } else {
            Some(identity.to_string())
        }
    }

    /// Record for `component`; a miss yields an explicit not-found record.
    pub fn record_for(
        &self,
        component: &Component,
        identity_field: &str,
        ignore: &IgnoreSet,
    ) -> SupplierRecord {
        let query = Self::query_for(
            self.order_code_field.as_deref(),
            component,
            identity_field,
            ignore,
        );
        match query {
            Some(query) => self
                .records
                .get(&match_key(&query))
                .filter(|record| record.found)
                .cloned()
                .unwrap_or_else(|| SupplierRecord::not_found(&self.supplier, query)),
            None => SupplierRecord::not_found(
                &self.supplier,
                component.field_or_empty(identity_field).trim(),
            ),
        }
    }
}

/// Query `supplier` for every component that has a queryable key.
///
/// A failing supplier does not abort the run: the failure is returned as a
/// warning and every component misses.
pub fn lookup(
    supplier: &dyn SupplierQuery,
    components: &[&Component],
    identity_field: &str,
    ignore: &IgnoreSet,
    currency: Currency,
) -> (SupplierResults, Option<BomWarning>) {
    let order_code_field = supplier.order_code_field().map(str::to_string);

    // One query per distinct key, keeping the first spelling seen.
    let mut seen = BTreeSet::new();
    let queries: BTreeSet<String> = components
        .iter()
        .filter_map(|c| {
            SupplierResults::query_for(order_code_field.as_deref(), c, identity_field, ignore)
        })
        .filter(|q| seen.insert(match_key(q)))
        .collect();

    if queries.is_empty() {
        return (
            SupplierResults::from_records(supplier.name(), order_code_field, []),
            None,
        );
    }

    log::info!("Querying {} for {} parts", supplier.name(), queries.len());
    match supplier.lookup(&queries, currency) {
        Ok(records) => {
            let found = records.values().filter(|r| r.found).count();
            log::info!(
                "{}: {} of {} parts found",
                supplier.name(),
                found,
                queries.len()
            );
            (
                SupplierResults::from_records(supplier.name(), order_code_field, records),
                None,
            )
        }
        Err(err) => {
            let warning = BomWarning::SupplierUnavailable {
                supplier: supplier.name().to_string(),
                reason: format!("{err:#}"),
            };
            log::warn!("{warning}");
            (
                SupplierResults {
                    order_code_field,
                    ..SupplierResults::empty(supplier.name())
                },
                Some(warning),
            )
        }
    }
}

/// A component with its raw per-supplier records, before gap filling.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub component: Component,
    pub primary: SupplierRecord,
    pub secondary: Option<SupplierRecord>,
}

/// One candidate per component, in input order. Components sharing an MPN
/// stay separate candidates.
pub fn match_components(
    components: &[&Component],
    primary: &SupplierResults,
    secondary: Option<&SupplierResults>,
    identity_field: &str,
    ignore: &IgnoreSet,
) -> Vec<Candidate> {
    components
        .iter()
        .map(|c| Candidate {
            component: (*c).clone(),
            primary: primary.record_for(c, identity_field, ignore),
            secondary: secondary.map(|s| s.record_for(c, identity_field, ignore)),
        })
        .collect()
}
