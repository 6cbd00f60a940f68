use std::collections::BTreeMap;
use std::io::{self, Write};

use anyhow::Result;

use kiabom_sch::bom::Column;
use kiabom_supplier::SupplierKind;

use crate::Cli;
use crate::config::UserConfig;
use crate::presets::Presets;

pub fn requested(cli: &Cli) -> bool {
    cli.list_suppliers
        || cli.list_presets
        || cli.list_column_presets
        || cli.list_group_presets
        || cli.list_supported_columns
}

pub fn execute(cli: &Cli) -> Result<()> {
    let presets = Presets::builtin()?.merge(UserConfig::load(cli.config.as_deref())?.presets);
    let mut out = io::stdout().lock();

    if cli.list_suppliers {
        writeln!(out, "Supported suppliers are:\n")?;
        for kind in SupplierKind::ALL {
            writeln!(out, "\t{kind}")?;
        }
    }
    if cli.list_presets {
        let combined: BTreeMap<&str, Vec<String>> = presets
            .combined
            .iter()
            .map(|(name, p)| (name.as_str(), vec![p.columns.clone(), p.groups.clone()]))
            .collect();
        write_presets(&mut out, "Available presets are:", &combined)?;
    }
    if cli.list_column_presets {
        write_presets(&mut out, "Available column presets are:", &as_str_keys(&presets.columns))?;
    }
    if cli.list_group_presets {
        write_presets(&mut out, "Available group presets are:", &as_str_keys(&presets.groups))?;
    }
    if cli.list_supported_columns {
        writeln!(out, "Supported columns are:\n")?;
        for column in Column::COMPUTED {
            writeln!(out, "\t{column}")?;
        }
        writeln!(out, "[+ any symbol field]")?;
    }
    Ok(())
}

fn as_str_keys(map: &BTreeMap<String, Vec<String>>) -> BTreeMap<&str, Vec<String>> {
    map.iter().map(|(k, v)| (k.as_str(), v.clone())).collect()
}

fn write_presets(
    out: &mut impl Write,
    title: &str,
    presets: &BTreeMap<&str, Vec<String>>,
) -> io::Result<()> {
    writeln!(out, "{title}\n")?;
    for (name, entries) in presets {
        writeln!(out, "{name}:")?;
        for entry in entries {
            writeln!(out, "\t{entry}")?;
        }
        writeln!(out)?;
    }
    Ok(())
}
