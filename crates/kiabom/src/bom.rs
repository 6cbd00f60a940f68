use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Local;
use colored::Colorize;
use indicatif::ProgressBar;

use kiabom_sch::bom::{BomTable, Group, GroupFields, InfoBlock, Projector, TableOptions};
use kiabom_sch::filter::IgnoreSet;
use kiabom_sch::kicad_netlist::Netlist;
use kiabom_sch::supplier::SupplierQuery;
use kiabom_sch::{BomConfig, BomWarning, Currency, Suppliers, build_bom};
use kiabom_supplier::datasheet::{self, DATASHEET_DIR, Download};
use kiabom_supplier::{CachedSupplier, SupplierKind};

use crate::Cli;
use crate::config::UserConfig;
use crate::output::{self, OutputFormat};
use crate::presets::{PresetRequest, Presets};

const TITLE: &str = "KiABOM Bill Of Materials";

pub fn execute(cli: Cli) -> Result<()> {
    let input = cli
        .input
        .as_deref()
        .context("Please specify a schematic XML")?;
    let output_path = cli.output.clone().unwrap_or_else(default_output_path);

    // Reject unsupported formats before any lookups happen.
    OutputFormat::from_path(&output_path)?;
    if let Some(path) = &cli.dnp_output {
        OutputFormat::from_path(path)?;
    }

    let user_config = UserConfig::load(cli.config.as_deref())?;
    let config = resolve_config(&cli, &user_config)?;
    let primary_kind: SupplierKind = cli.primary_supplier.parse()?;
    let secondary_kind: SupplierKind = cli.secondary_supplier.parse()?;

    progress(&cli, format!("Reading {}", input.display().to_string().yellow()));
    let netlist = Netlist::parse_file(input)
        .with_context(|| format!("Failed to read schematic XML {}", input.display()))?;

    let (primary, secondary) = if cli.no_suppliers {
        progress(&cli, "Supplier lookups disabled".to_string());
        (None, None)
    } else {
        let primary = open_supplier(primary_kind, &user_config);
        let secondary = if cli.primary_only {
            None
        } else {
            open_supplier(secondary_kind, &user_config)
        };
        (primary, secondary)
    };
    let suppliers = Suppliers {
        primary: primary.as_deref(),
        secondary: secondary.as_deref(),
    };

    progress(
        &cli,
        format!(
            "Columns for the BOM will be: {}",
            config.columns.join(",").yellow()
        ),
    );

    let spinner = (suppliers.primary.is_some() || suppliers.secondary.is_some())
        .then(|| spinner(&cli, "Looking up supplier data"));
    let bom = build_bom(&netlist.components, &config, suppliers)?;
    if let Some(spinner) = spinner {
        spinner.finish_with_message(format!("{} Supplier lookups done", "✓".green()));
    }

    let projector = Projector::new(&bom.columns, config.currency, config.board_quantity)
        .with_currency_symbol(cli.currency_symbol);
    let writer = TableWriter {
        projector: &projector,
        options: TableOptions {
            headers: !cli.no_headers,
            info: cli.info,
            sum: cli.sum,
        },
        board_quantity: config.board_quantity,
        schematic: if netlist.source.is_empty() {
            input.display().to_string()
        } else {
            netlist.source.clone()
        },
        schematic_date: netlist.date.clone(),
        generated: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
    };

    match &cli.dnp_output {
        Some(dnp_path) => {
            writer.write(&output_path, &[bom.groups.as_slice()])?;
            writer.write(dnp_path, &[bom.dnp_groups.as_slice()])?;
            progress(
                &cli,
                format!("Wrote DNP parts to '{}'", dnp_path.display().to_string().yellow()),
            );
        }
        None => writer.write(
            &output_path,
            &[bom.groups.as_slice(), bom.dnp_groups.as_slice()],
        )?,
    }
    progress(
        &cli,
        format!("Wrote results to '{}'", output_path.display().to_string().yellow()),
    );

    report_warnings(&cli, &bom.warnings);

    if cli.download_datasheets {
        let dest = output_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."))
            .join(DATASHEET_DIR);
        download_datasheets(&cli, &bom.datasheet_urls(), &dest, user_config.timeout());
    }

    progress(&cli, format!("{} KiABOM finished", "✓".green()));
    Ok(())
}

fn default_output_path() -> PathBuf {
    PathBuf::from(format!(
        "kiabom-output-{}.csv",
        Local::now().format("%H%M%S%d%m%y")
    ))
}

/// Turn command line flags and presets into the core configuration.
fn resolve_config(cli: &Cli, user_config: &UserConfig) -> Result<BomConfig> {
    let presets = Presets::builtin()?.merge(user_config.presets.clone());
    let selection = presets.select(&PresetRequest {
        preset: &cli.preset,
        columns_preset: cli.columns_preset.as_deref(),
        group_preset: cli.group_preset.as_deref(),
        columns: &cli.columns,
        append_columns: &cli.append_columns,
        group_by: &cli.group_by,
        append_groups: &cli.append_groups,
    })?;
    log::debug!("Grouping by {}", selection.group_fields.join(","));

    let mut config = BomConfig::new(
        GroupFields::new(&selection.group_fields)?,
        selection.columns,
    );
    config.ignore = IgnoreSet::new(&cli.ignore_mpns);
    config.currency = cli.currency.parse::<Currency>()?;
    config.board_quantity = cli.board_quantity;
    config.primary_only = cli.primary_only;
    config.keep_dnp = cli.keep_dnp;
    config.keep_exclude_from_bom = cli.keep_exclude_from_bom;
    config.keep_exclude_from_board = cli.keep_exclude_from_board;
    config.remove_ignore_mpn_parts = cli.remove_ignore_mpn_parts;
    Ok(config)
}

/// Live client for `kind`, behind the response cache when it is enabled.
/// A supplier that cannot be set up is skipped with a warning.
fn open_supplier(kind: SupplierKind, config: &UserConfig) -> Option<Box<dyn SupplierQuery>> {
    let client = match kiabom_supplier::connect(kind, &config.credentials(), config.timeout()) {
        Ok(client) => client,
        Err(err) => {
            log::warn!("Continuing without {kind}: {err}");
            return None;
        }
    };
    match config.cache_dir() {
        Some(dir) => {
            log::debug!("Caching {kind} responses in {}", dir.display());
            Some(Box::new(CachedSupplier::new(
                client,
                dir,
                config.cache_ttl(),
            )))
        }
        None => Some(client),
    }
}

struct TableWriter<'a> {
    projector: &'a Projector<'a>,
    options: TableOptions,
    board_quantity: u64,
    schematic: String,
    schematic_date: String,
    generated: String,
}

impl TableWriter<'_> {
    fn write(&self, path: &Path, sections: &[&[Group]]) -> Result<()> {
        let info = InfoBlock {
            board_quantity: self.board_quantity,
            schematic: self.schematic.clone(),
            component_count: sections
                .iter()
                .flat_map(|groups| groups.iter())
                .map(|group| group.members.len())
                .sum(),
            schematic_date: self.schematic_date.clone(),
            generated: self.generated.clone(),
            generator: format!("KiABOM {}", env!("CARGO_PKG_VERSION")),
        };
        let table = BomTable::assemble(self.projector, sections, Some(&info), self.options);
        output::write(path, &table, TITLE)
    }
}

/// Datasheet problems are reported as warnings and never fail the run.
fn download_datasheets(cli: &Cli, urls: &[String], dest: &Path, timeout: Duration) {
    if urls.is_empty() {
        progress(cli, "No datasheets to download".to_string());
        return;
    }

    let spinner = spinner(cli, "Downloading datasheets");
    let results = match datasheet::download_all(urls.iter().map(String::as_str), dest, timeout) {
        Ok(results) => results,
        Err(err) => {
            spinner.finish_and_clear();
            log::warn!("{err}");
            if !cli.quiet {
                eprintln!("{} {err}", "Warning:".yellow());
            }
            return;
        }
    };
    let saved = results.iter().filter(|r| r.is_saved()).count();
    spinner.finish_with_message(format!(
        "{} Downloaded {saved} datasheets into '{}'",
        "✓".green(),
        dest.display()
    ));

    if !cli.quiet {
        for result in &results {
            if let Download::Failed(err) = result {
                eprintln!("{} {err}", "Warning:".yellow());
            }
        }
    }
}

fn report_warnings(cli: &Cli, warnings: &[BomWarning]) {
    if cli.quiet {
        return;
    }
    for warning in warnings {
        eprintln!("{} {warning}", "Warning:".yellow());
    }
}

fn progress(cli: &Cli, message: String) {
    if !cli.quiet {
        eprintln!("{message}");
    }
}

fn spinner(cli: &Cli, message: &str) -> ProgressBar {
    let spinner = if cli.quiet {
        ProgressBar::hidden()
    } else {
        ProgressBar::new_spinner()
    };
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}
