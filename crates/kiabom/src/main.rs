use std::path::PathBuf;

use clap::Parser;
use colored::Colorize;
use env_logger::Env;

mod bom;
mod config;
mod list;
mod output;
mod presets;

#[derive(Parser, Debug)]
#[command(name = "kiabom")]
#[command(about = "Automatic BOM tool for KiCad", long_about = None)]
#[command(version)]
pub struct Cli {
    /// KiCad XML netlist exported from the schematic
    #[arg(value_name = "INPUT_XML", value_hint = clap::ValueHint::FilePath)]
    pub input: Option<PathBuf>,

    /// Output file; the format follows the extension (.csv, .html or .txt)
    #[arg(value_name = "OUTPUT_FILE", value_hint = clap::ValueHint::FilePath)]
    pub output: Option<PathBuf>,

    /// Add general information (board quantity, schematic, date) ahead of the table
    #[arg(long)]
    pub info: bool,

    /// Leave out the column headers
    #[arg(long)]
    pub no_headers: bool,

    /// Skip supplier lookups entirely
    #[arg(short = 'k', long = "no-suppliers", alias = "no-kicost")]
    pub no_suppliers: bool,

    /// Columns and group preset in one; --columns-preset and --group-preset override it
    #[arg(long, default_value = "default")]
    pub preset: String,

    /// Column preset
    #[arg(long, value_name = "NAME")]
    pub columns_preset: Option<String>,

    /// Group-field preset
    #[arg(long, value_name = "NAME")]
    pub group_preset: Option<String>,

    /// Comma separated fields to group by, replacing the group preset
    #[arg(short = 'g', long, value_delimiter = ',', value_name = "FIELDS")]
    pub group_by: Vec<String>,

    /// Comma separated columns to output, replacing the column preset
    #[arg(short = 'c', long, value_delimiter = ',', value_name = "COLUMNS")]
    pub columns: Vec<String>,

    /// Comma separated columns appended to the selected columns
    #[arg(short = 'a', long, value_delimiter = ',', value_name = "COLUMNS")]
    pub append_columns: Vec<String>,

    /// Comma separated fields appended to the grouping fields
    #[arg(long, value_delimiter = ',', value_name = "FIELDS")]
    pub append_groups: Vec<String>,

    /// Extra MPN values to ignore, on top of Generic, TBD, Manufacturer's Stock and blank
    #[arg(long, value_delimiter = ',', value_name = "MPNS")]
    pub ignore_mpns: Vec<String>,

    /// Primary supplier
    #[arg(short = 'p', long, default_value = "Mouser")]
    pub primary_supplier: String,

    /// Secondary supplier, used where the primary has no data
    #[arg(short = 's', long, default_value = "DigiKey")]
    pub secondary_supplier: String,

    /// Download the datasheets of the BOM into a `datasheets` directory
    #[arg(short = 'd', long)]
    pub download_datasheets: bool,

    /// Only query the primary supplier
    #[arg(short = 'u', long)]
    pub primary_only: bool,

    /// Silence warnings and progress output
    #[arg(short = 'q', long)]
    pub quiet: bool,

    /// Enable debug logging
    #[arg(long, hide = true)]
    pub debug: bool,

    /// Keep components marked "exclude from BOM"
    #[arg(long = "keep-exclude-from-bom", visible_alias = "kefbom")]
    pub keep_exclude_from_bom: bool,

    /// Keep components marked "exclude from board"
    #[arg(long = "keep-exclude-from-board", visible_alias = "kefboard")]
    pub keep_exclude_from_board: bool,

    /// Group DNP components with the populated ones instead of in their own section
    #[arg(long)]
    pub keep_dnp: bool,

    /// Write the DNP section to this file instead of appending it
    #[arg(long, value_name = "FILE", conflicts_with = "keep_dnp")]
    pub dnp_output: Option<PathBuf>,

    /// Number of boards to build
    #[arg(short = 'b', long, default_value_t = 1, value_parser = clap::value_parser!(u64).range(1..))]
    pub board_quantity: u64,

    /// Add a total price row after the table
    #[arg(long)]
    pub sum: bool,

    /// Currency for supplier prices (GBP, EUR or USD)
    #[arg(long, default_value = "GBP")]
    pub currency: String,

    /// Prefix prices with the currency symbol
    #[arg(long)]
    pub currency_symbol: bool,

    /// Drop components whose MPN is on the ignore list
    #[arg(long)]
    pub remove_ignore_mpn_parts: bool,

    /// Config file (default: <config dir>/kiabom/config.toml)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// List supported suppliers
    #[arg(long)]
    pub list_suppliers: bool,

    /// List combined presets
    #[arg(long)]
    pub list_presets: bool,

    /// List column presets
    #[arg(long)]
    pub list_column_presets: bool,

    /// List group presets
    #[arg(long)]
    pub list_group_presets: bool,

    /// List supported columns
    #[arg(long)]
    pub list_supported_columns: bool,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("{} {e}", "Error:".red());
        for cause in e.chain().skip(1) {
            eprintln!("  {cause}");
        }
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Default level depends on --debug / --quiet (overridden by RUST_LOG)
    let env = if cli.debug {
        Env::default().default_filter_or("debug")
    } else if cli.quiet {
        Env::default().default_filter_or("error")
    } else {
        Env::default().default_filter_or("warn")
    };
    env_logger::Builder::from_env(env).init();

    if list::requested(&cli) {
        return list::execute(&cli);
    }
    bom::execute(cli)
}
