use std::collections::BTreeSet;

use crate::Component;

/// MPN values that mean "no real part number".
pub const DEFAULT_IGNORE_MPNS: [&str; 4] = ["Generic", "TBD", "Manufacturer's Stock", ""];

/// Case-insensitive set of MPN values that are never sent to a supplier and
/// that can optionally drop a component from the BOM.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IgnoreSet {
    entries: BTreeSet<String>,
}

impl Default for IgnoreSet {
    fn default() -> Self {
        Self::new(std::iter::empty::<&str>())
    }
}

impl IgnoreSet {
    /// The default entries plus `extra`.
    pub fn new<I, S>(extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let entries = DEFAULT_IGNORE_MPNS
            .iter()
            .map(|s| fold(s))
            .chain(extra.into_iter().map(|s| fold(s.as_ref())))
            .collect();
        Self { entries }
    }

    pub fn contains(&self, mpn: &str) -> bool {
        self.entries.contains(&fold(mpn))
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }
}

fn fold(s: &str) -> String {
    s.trim().to_lowercase()
}

/// How DNP components are treated by a filter run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DnpRetention {
    /// Drop DNP components.
    #[default]
    Exclude,
    /// Keep DNP components alongside the populated ones.
    Keep,
    /// Keep only DNP components.
    Only,
}

#[derive(Debug, Clone, Default)]
pub struct FilterOptions {
    pub ignore: IgnoreSet,
    pub remove_ignore_mpn_parts: bool,
    pub keep_exclude_from_bom: bool,
    pub keep_exclude_from_board: bool,
    pub dnp: DnpRetention,
}

impl FilterOptions {
    /// The same options restricted to DNP components, for the DNP section.
    pub fn dnp_view(&self) -> Self {
        Self {
            dnp: DnpRetention::Only,
            ..self.clone()
        }
    }

    fn retains(&self, component: &Component) -> bool {
        if self.remove_ignore_mpn_parts && self.ignore.contains(component.mpn()) {
            return false;
        }
        if component.exclude_from_bom && !self.keep_exclude_from_bom {
            return false;
        }
        if component.exclude_from_board && !self.keep_exclude_from_board {
            return false;
        }
        match self.dnp {
            DnpRetention::Exclude => !component.dnp,
            DnpRetention::Keep => true,
            DnpRetention::Only => component.dnp,
        }
    }
}

/// Components that survive `options`, in their original order.
pub fn filter_components<'a>(
    components: &'a [Component],
    options: &FilterOptions,
) -> Vec<&'a Component> {
    components.iter().filter(|c| options.retains(c)).collect()
}
