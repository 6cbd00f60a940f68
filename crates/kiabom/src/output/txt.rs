use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{ContentArrangement, Table};

use kiabom_sch::bom::{BomTable, RowKind};

/// Info lines, then the aligned table, then the sum line.
pub fn render(table: &BomTable) -> String {
    let mut grid = Table::new();
    grid.load_preset(UTF8_FULL_CONDENSED);
    // A file has no terminal width to fit.
    grid.set_content_arrangement(ContentArrangement::Disabled);

    let mut before = Vec::new();
    let mut after = Vec::new();
    for row in &table.rows {
        match row.kind {
            RowKind::Info => before.push(row.cells.join(" ")),
            RowKind::Header => {
                grid.set_header(&row.cells);
            }
            RowKind::Group => {
                grid.add_row(&row.cells);
            }
            RowKind::Sum => after.push(row.cells.join(" ")),
        }
    }

    let mut out = String::new();
    for line in &before {
        out.push_str(line);
        out.push('\n');
    }
    if !before.is_empty() {
        out.push('\n');
    }
    if grid.header().is_some() || grid.row_count() > 0 {
        out.push_str(&grid.to_string());
        out.push('\n');
    }
    for line in &after {
        out.push_str(line);
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::fixtures;

    #[test]
    fn test_render_txt() {
        let text = render(&fixtures::table());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Board Quantity: 1");
        assert_eq!(lines[1], "");
        assert!(lines[3].contains("Designator"));
        assert!(text.contains("R1,R2"));
        assert!(text.contains("1uF \"X7R\""));
        assert_eq!(lines.last().copied(), Some("Total Price Sum: 0.20"));
    }

    #[test]
    fn test_empty_table_renders_nothing() {
        assert_eq!(render(&BomTable::default()), "");
    }
}
