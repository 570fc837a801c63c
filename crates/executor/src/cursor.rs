use ofgdb_parser::ast::Predicate;
use ofgdb_storage::{Result, Row, Table};

use crate::operator::{drain, Filter, Scan};

/// A materialized search result. Rows are copies taken when the cursor was
/// built; later table mutations do not affect it. Once exhausted it keeps
/// returning `None`.
#[derive(Debug, Clone, Default)]
pub struct Cursor {
    rows: std::vec::IntoIter<Row>,
}

impl Cursor {
    pub fn new(rows: Vec<Row>) -> Self {
        Self {
            rows: rows.into_iter(),
        }
    }

    /// Snapshot of the rows of `table` matching `predicate`.
    pub fn search(table: &Table, predicate: &Predicate) -> Result<Self> {
        let scan = Box::new(Scan::new(&table.rows));
        let rows = drain(Box::new(Filter::new(scan, predicate)))?;
        Ok(Self::new(rows))
    }

    pub fn remaining(&self) -> usize {
        self.rows.len()
    }
}

impl Iterator for Cursor {
    type Item = Row;

    fn next(&mut self) -> Option<Row> {
        self.rows.next()
    }
}
