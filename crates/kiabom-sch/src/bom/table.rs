use rust_decimal::Decimal;
use serde::Serialize;

use super::{Group, Projector};

/// Label of the trailing total row.
pub const SUM_LABEL: &str = "Total Price Sum:";

/// General information printed ahead of the table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InfoBlock {
    pub board_quantity: u64,
    pub schematic: String,
    pub component_count: usize,
    /// When the schematic was exported.
    pub schematic_date: String,
    /// When this BOM was generated.
    pub generated: String,
    pub generator: String,
}

impl InfoBlock {
    fn rows(&self) -> Vec<Vec<String>> {
        let mut rows = vec![
            vec!["Board Quantity:".to_string(), self.board_quantity.to_string()],
            vec!["Schematic:".to_string(), self.schematic.clone()],
            vec![
                "Component Count:".to_string(),
                self.component_count.to_string(),
            ],
        ];
        if !self.schematic_date.is_empty() {
            rows.push(vec![
                "Schematic Date:".to_string(),
                self.schematic_date.clone(),
            ]);
        }
        rows.push(vec!["Date:".to_string(), self.generated.clone()]);
        rows.push(vec!["Generator:".to_string(), self.generator.clone()]);
        rows
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TableOptions {
    pub headers: bool,
    pub info: bool,
    pub sum: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RowKind {
    Info,
    Header,
    Group,
    Sum,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableRow {
    pub kind: RowKind,
    pub cells: Vec<String>,
}

/// The final ordered rows handed to a writer.
///
/// Writers serialise the rows as they are, without reordering or filtering.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct BomTable {
    /// Resolved column names, whether or not a header row is emitted.
    pub columns: Vec<String>,
    pub rows: Vec<TableRow>,
}

impl BomTable {
    /// Assemble the table: info block, header, one row per group in emission
    /// order, then the summary row. Each section is numbered from 1.
    pub fn assemble(
        projector: &Projector,
        sections: &[&[Group]],
        info: Option<&InfoBlock>,
        options: TableOptions,
    ) -> Self {
        let mut rows = Vec::new();

        if options.info {
            if let Some(info) = info {
                rows.extend(info.rows().into_iter().map(|cells| TableRow {
                    kind: RowKind::Info,
                    cells,
                }));
            }
        }

        let columns = projector.header();
        if options.headers {
            rows.push(TableRow {
                kind: RowKind::Header,
                cells: columns.clone(),
            });
        }

        for groups in sections {
            for (index, group) in groups.iter().enumerate() {
                rows.push(TableRow {
                    kind: RowKind::Group,
                    cells: projector.row(index, group),
                });
            }
        }

        if options.sum {
            let total = sections
                .iter()
                .flat_map(|groups| groups.iter())
                .filter_map(|group| projector.total_price(group))
                .fold(Decimal::ZERO, Decimal::saturating_add);
            rows.push(TableRow {
                kind: RowKind::Sum,
                cells: vec![
                    SUM_LABEL.to_string(),
                    projector
                        .currency()
                        .format(total, projector.currency_symbol()),
                ],
            });
        }

        Self { columns, rows }
    }

    pub fn rows_of(&self, kind: RowKind) -> impl Iterator<Item = &TableRow> {
        self.rows.iter().filter(move |row| row.kind == kind)
    }
}
