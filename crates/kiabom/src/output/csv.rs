use anyhow::{Context, Result};
use ::csv::{QuoteStyle, Terminator, WriterBuilder};

use kiabom_sch::bom::BomTable;

/// UTF-8 byte order mark, so spreadsheet tools pick the right encoding.
const BOM: &[u8] = "\u{feff}".as_bytes();

/// Every cell quoted, `\n` line endings. Rows keep their own widths, so
/// info and sum rows are shorter than the group rows.
pub fn render(table: &BomTable) -> Result<Vec<u8>> {
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .terminator(Terminator::Any(b'\n'))
        .flexible(true)
        .from_writer(BOM.to_vec());

    for row in &table.rows {
        writer
            .write_record(&row.cells)
            .context("Failed to write CSV row")?;
    }

    writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to flush CSV output: {}", e.error()))
}
