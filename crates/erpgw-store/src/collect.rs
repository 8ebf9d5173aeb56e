//! Result-set accumulation with a hard row cap

use erpgw_core::{ResultTable, Row};

use crate::errors::{row_limit_exceeded, Result};

/// Gathers rows from a multi-result-set stream.
///
/// The cap counts rows across all sets. Pushing the row that would exceed
/// it fails immediately, so the caller stops reading instead of buffering.
#[derive(Debug, Default)]
pub struct RowCollector {
    max_rows: Option<usize>,
    total: usize,
    tables: Vec<ResultTable>,
}

impl RowCollector {
    pub fn new(max_rows: Option<usize>) -> Self {
        Self {
            max_rows,
            ..Default::default()
        }
    }

    /// Begin a new result set (possibly one that stays empty)
    pub fn start_table(&mut self) {
        self.tables.push(Vec::new());
    }

    /// # Errors
    ///
    /// `RowLimitExceeded` when this row would exceed the cap.
    pub fn push_row(&mut self, row: Row) -> Result<()> {
        if let Some(max) = self.max_rows {
            if self.total >= max {
                return Err(row_limit_exceeded(max));
            }
        }
        if self.tables.is_empty() {
            self.start_table();
        }
        if let Some(table) = self.tables.last_mut() {
            table.push(row);
        }
        self.total += 1;
        Ok(())
    }

    pub fn total_rows(&self) -> usize {
        self.total
    }

    pub fn finish(self) -> Vec<ResultTable> {
        self.tables
    }
}
