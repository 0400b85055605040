//! Published pages and their view projection.

use std::collections::HashSet;

use log::warn;

use crate::column::Column;
use crate::column::ColumnKind;
use crate::column::ColumnSchema;
use crate::cursor::Totals;
use crate::error::FieldError;
use crate::model::Record;

/// Row range shown in the footer, one-based and inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Footer {
    pub showing_from: usize,
    pub showing_to: usize,
    pub total_rows: usize,
}

/// The window of rows currently shown, plus the totals it was derived with.
///
/// A page is rebuilt on every recompute and never modified afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    rows: Vec<Record>,
    totals: Totals,
    index: usize,
    page_size: usize,
}

impl Page {
    /// Creates a page. Duplicate row ids are logged, not rejected.
    pub fn new(rows: Vec<Record>, totals: Totals, index: usize, page_size: usize) -> Self {
        let mut seen = HashSet::with_capacity(rows.len());
        for row in &rows {
            if !seen.insert(row.id()) {
                warn!("Duplicate row id '{}' on page {}", row.id(), index);
            }
        }
        Self {
            rows,
            totals,
            index,
            page_size,
        }
    }

    /// Rows of this page.
    pub fn rows(&self) -> &[Record] {
        &self.rows
    }

    /// Rows paired with a flag that is `true` on every second row.
    pub fn rows_with_parity(&self) -> impl Iterator<Item = (&Record, bool)> {
        self.rows.iter().enumerate().map(|(i, row)| (row, i % 2 != 0))
    }

    /// Totals at the time this page was resolved.
    pub fn totals(&self) -> Totals {
        self.totals
    }

    /// Zero-based index of this page.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Page size this page was resolved with.
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Returns `true` when there is nothing to show.
    ///
    /// Footer and navigator are not rendered for an empty page.
    pub fn is_empty(&self) -> bool {
        self.totals.is_empty() || self.rows.is_empty()
    }

    /// Footer counters, or `None` for an empty page.
    pub fn footer(&self) -> Option<Footer> {
        if self.is_empty() {
            return None;
        }
        let last = (self.index + 1) * self.page_size;
        Some(Footer {
            showing_from: self.index * self.page_size + 1,
            showing_to: last.min(self.totals.total_rows),
            total_rows: self.totals.total_rows,
        })
    }

    /// Cells of every row, in row then column order.
    pub fn cells(&self, schema: &ColumnSchema) -> Vec<Vec<Cell>> {
        self.rows.iter().map(|row| row_cells(schema, row)).collect()
    }
}

// =============================================================================
// Cells
// =============================================================================

/// What a cell displays.
#[derive(Debug, Clone, PartialEq)]
pub enum CellContent {
    /// Field value.
    Text(String),
    /// Field value linking to a navigation target.
    Link { target: String, text: String },
    /// Clickable icon.
    Icon { name: String },
    /// The field could not be resolved.
    Placeholder(FieldError),
}

/// One rendered cell.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    /// Reconciliation key, `"{column key}_{row id}"`.
    pub key: String,
    /// Key of the column the cell belongs to.
    pub column: String,
    pub content: CellContent,
}

/// A navigation request exposed to the view layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Link<'a> {
    pub target: &'a str,
    pub row: &'a Record,
}

impl Column {
    /// Returns the navigation request of a linked text column.
    pub fn link<'a>(&'a self, row: &'a Record) -> Option<Link<'a>> {
        self.target().map(|target| Link { target, row })
    }
}

/// Projects one row onto the schema.
///
/// A key that does not resolve becomes [`CellContent::Placeholder`] and is
/// logged; the remaining cells are unaffected.
pub fn row_cells(schema: &ColumnSchema, row: &Record) -> Vec<Cell> {
    schema
        .iter()
        .map(|(column, path)| {
            let content = match &column.kind {
                ColumnKind::Icon { icon, .. } => CellContent::Icon { name: icon.clone() },
                ColumnKind::Text { target } => match row.resolve(path) {
                    Ok(value) => match target {
                        Some(target) => CellContent::Link {
                            target: target.clone(),
                            text: value.to_string(),
                        },
                        None => CellContent::Text(value.to_string()),
                    },
                    Err(err) => {
                        warn!("Row '{}': {}", row.id(), err);
                        CellContent::Placeholder(err)
                    }
                },
            };
            Cell {
                key: format!("{}_{}", column.key, row.id()),
                column: column.key.clone(),
                content,
            }
        })
        .collect()
}
