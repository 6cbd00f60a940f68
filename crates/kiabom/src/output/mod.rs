//! BOM table writers.

mod csv;
mod html;
mod txt;

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};

use kiabom_sch::bom::BomTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Csv,
    Html,
    Txt,
}

impl OutputFormat {
    /// Pick the format from the file extension (case-insensitive).
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "csv" => Ok(OutputFormat::Csv),
            "html" => Ok(OutputFormat::Html),
            "txt" => Ok(OutputFormat::Txt),
            _ => bail!(
                "Output format '{ext}' of '{}' not supported. Supported ones are CSV, HTML, and TXT",
                path.display()
            ),
        }
    }

    pub fn render(self, table: &BomTable, title: &str) -> Result<Vec<u8>> {
        match self {
            OutputFormat::Csv => csv::render(table),
            OutputFormat::Html => html::render(table, title).map(String::into_bytes),
            OutputFormat::Txt => Ok(txt::render(table).into_bytes()),
        }
    }
}

/// Render `table` in the format implied by `path` and write it there.
pub fn write(path: &Path, table: &BomTable, title: &str) -> Result<()> {
    let format = OutputFormat::from_path(path)?;
    let bytes = format.render(table, title)?;
    fs::write(path, bytes).with_context(|| format!("Failed to write {}", path.display()))
}
