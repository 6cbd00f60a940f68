//! Column, group and combined presets.

use std::collections::BTreeMap;

use anyhow::{Context, Result, bail};
use serde::Deserialize;

const BUILTIN_PRESETS: &str = include_str!("presets.toml");

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CombinedPreset {
    pub columns: String,
    pub groups: String,
}

/// Named column lists, group-field lists and combinations of the two.
///
/// Names are matched case-insensitively.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Presets {
    pub columns: BTreeMap<String, Vec<String>>,
    pub groups: BTreeMap<String, Vec<String>>,
    pub combined: BTreeMap<String, CombinedPreset>,
}

/// Preset-related command line inputs.
#[derive(Debug, Clone, Default)]
pub struct PresetRequest<'a> {
    pub preset: &'a str,
    pub columns_preset: Option<&'a str>,
    pub group_preset: Option<&'a str>,
    pub columns: &'a [String],
    pub append_columns: &'a [String],
    pub group_by: &'a [String],
    pub append_groups: &'a [String],
}

/// Column names and grouping fields chosen for a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub columns: Vec<String>,
    pub group_fields: Vec<String>,
}

impl Presets {
    pub fn builtin() -> Result<Self> {
        let presets: Presets =
            toml::from_str(BUILTIN_PRESETS).context("Failed to parse built-in presets")?;
        Ok(presets.normalized())
    }

    /// Overlay `other` on top of `self`; presets with the same name are replaced.
    pub fn merge(mut self, other: Presets) -> Self {
        let other = other.normalized();
        self.columns.extend(other.columns);
        self.groups.extend(other.groups);
        self.combined.extend(other.combined);
        self
    }

    fn normalized(self) -> Self {
        fn lower<V>(map: BTreeMap<String, V>) -> BTreeMap<String, V> {
            map.into_iter()
                .map(|(k, v)| (k.trim().to_lowercase(), v))
                .collect()
        }
        Self {
            columns: lower(self.columns),
            groups: lower(self.groups),
            combined: lower(self.combined),
        }
    }

    pub fn columns(&self, name: &str) -> Result<&[String]> {
        lookup(&self.columns, name, "columns preset", "--list-column-presets")
            .map(Vec::as_slice)
    }

    pub fn groups(&self, name: &str) -> Result<&[String]> {
        lookup(&self.groups, name, "group preset", "--list-group-presets").map(Vec::as_slice)
    }

    pub fn combined(&self, name: &str) -> Result<&CombinedPreset> {
        lookup(&self.combined, name, "preset", "--list-presets")
    }

    /// Resolve the column list and grouping fields.
    ///
    /// `--preset` names a column preset and a group preset; `--columns-preset`
    /// and `--group-preset` override either half. Explicit `--columns` and
    /// `--group-by` lists replace the presets entirely. Appended entries come
    /// last and blank entries are dropped.
    pub fn select(&self, request: &PresetRequest) -> Result<Selection> {
        let combined = self.combined(request.preset)?;
        let columns_preset = request.columns_preset.unwrap_or(combined.columns.as_str());
        let group_preset = request.group_preset.unwrap_or(combined.groups.as_str());

        // Validate both names even when explicit lists make them moot.
        let preset_columns = self.columns(columns_preset)?;
        let preset_groups = self.groups(group_preset)?;

        let base_columns = if non_blank(request.columns).next().is_some() {
            request.columns
        } else {
            preset_columns
        };
        let base_groups = if non_blank(request.group_by).next().is_some() {
            request.group_by
        } else {
            preset_groups
        };

        Ok(Selection {
            columns: non_blank(base_columns)
                .chain(non_blank(request.append_columns))
                .collect(),
            group_fields: non_blank(base_groups)
                .chain(non_blank(request.append_groups))
                .collect(),
        })
    }
}

fn non_blank(items: &[String]) -> impl Iterator<Item = String> + '_ {
    items
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn lookup<'a, V>(
    map: &'a BTreeMap<String, V>,
    name: &str,
    kind: &str,
    list_flag: &str,
) -> Result<&'a V> {
    if let Some(value) = map.get(&name.trim().to_lowercase()) {
        return Ok(value);
    }
    let valid: Vec<&str> = map.keys().map(String::as_str).collect();
    bail!(
        "Selected {kind} '{name}' not supported. Valid options are: {} (see '{list_flag}')",
        valid.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_builtin_presets_parse() {
        let presets = Presets::builtin().unwrap();
        assert_eq!(
            presets.groups("Default").unwrap(),
            strings(&["Value", "Footprint", "DNP", "MPN"])
        );
        assert_eq!(
            presets.columns("JLCPCB").unwrap(),
            strings(&["Comment", "Designator", "Footprint"])
        );
        assert_eq!(presets.combined("mage").unwrap().groups, "mage");
        assert!(presets.columns("custom").unwrap().is_empty());
    }

    #[test]
    fn test_default_selection() {
        let presets = Presets::builtin().unwrap();
        let selection = presets
            .select(&PresetRequest {
                preset: "default",
                ..Default::default()
            })
            .unwrap();
        assert_eq!(selection.columns.len(), 16);
        assert_eq!(selection.columns[0], "Group ID");
        assert_eq!(
            selection.group_fields,
            strings(&["Value", "Footprint", "DNP", "MPN"])
        );
    }

    #[test]
    fn test_explicit_lists_and_appends() {
        let presets = Presets::builtin().unwrap();
        let columns = strings(&["Designator", " ", "Value"]);
        let append_columns = strings(&["Rating"]);
        let append_groups = strings(&["Voltage", ""]);
        let selection = presets
            .select(&PresetRequest {
                preset: "default",
                group_preset: Some("minimal"),
                columns: &columns,
                append_columns: &append_columns,
                append_groups: &append_groups,
                ..Default::default()
            })
            .unwrap();
        assert_eq!(selection.columns, strings(&["Designator", "Value", "Rating"]));
        assert_eq!(
            selection.group_fields,
            strings(&["Value", "Footprint", "Voltage"])
        );
    }

    #[test]
    fn test_unknown_preset_lists_valid_names() {
        let presets = Presets::builtin().unwrap();
        let err = presets
            .select(&PresetRequest {
                preset: "default",
                columns_preset: Some("fancy"),
                ..Default::default()
            })
            .unwrap_err()
            .to_string();
        assert!(err.contains("columns preset 'fancy'"), "{err}");
        assert!(err.contains("no-suppliers"), "{err}");
        assert!(err.contains("--list-column-presets"), "{err}");
    }

    #[test]
    fn test_user_presets_override_builtin() {
        let user: Presets = toml::from_str(
            r#"
            [columns]
            Default = ["Designator", "Value"]
            [groups]
            board = ["Value", "Footprint", "Voltage"]
            "#,
        )
        .unwrap();
        let presets = Presets::builtin().unwrap().merge(user);
        assert_eq!(
            presets.columns("default").unwrap(),
            strings(&["Designator", "Value"])
        );
        assert_eq!(presets.groups("BOARD").unwrap().len(), 3);
        assert!(presets.groups("mage").is_ok());
    }
}
