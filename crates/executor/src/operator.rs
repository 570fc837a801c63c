//! Volcano-style row pipeline used to materialize search results.

use ofgdb_parser::ast::Predicate;
use ofgdb_storage::{Error, Result, Row};

use crate::eval::row_matches;

pub trait Operator {
    fn open(&mut self) -> Result<()>;
    fn next(&mut self) -> Result<Option<Row>>;
    fn close(&mut self) -> Result<()>;
}

fn not_open() -> Error {
    Error::Internal("operator is not open".to_string())
}

/// Emits copies of borrowed rows in order.
pub struct Scan<'a> {
    rows: &'a [Row],
    position: usize,
    is_open: bool,
}

impl<'a> Scan<'a> {
    pub fn new(rows: &'a [Row]) -> Self {
        Self {
            rows,
            position: 0,
            is_open: false,
        }
    }
}

impl Operator for Scan<'_> {
    fn open(&mut self) -> Result<()> {
        self.position = 0;
        self.is_open = true;
        Ok(())
    }

    fn next(&mut self) -> Result<Option<Row>> {
        if !self.is_open {
            return Err(not_open());
        }
        let Some(row) = self.rows.get(self.position) else {
            return Ok(None);
        };
        self.position += 1;
        Ok(Some(row.clone()))
    }

    fn close(&mut self) -> Result<()> {
        self.is_open = false;
        self.position = 0;
        Ok(())
    }
}

/// Passes through rows satisfying a WHERE predicate.
pub struct Filter<'a> {
    input: Box<dyn Operator + 'a>,
    predicate: &'a Predicate,
    is_open: bool,
}

impl<'a> Filter<'a> {
    pub fn new(input: Box<dyn Operator + 'a>, predicate: &'a Predicate) -> Self {
        Self {
            input,
            predicate,
            is_open: false,
        }
    }
}

impl Operator for Filter<'_> {
    fn open(&mut self) -> Result<()> {
        self.input.open()?;
        self.is_open = true;
        Ok(())
    }

    fn next(&mut self) -> Result<Option<Row>> {
        if !self.is_open {
            return Err(not_open());
        }
        loop {
            let Some(row) = self.input.next()? else {
                return Ok(None);
            };
            if row_matches(&row, self.predicate) {
                return Ok(Some(row));
            }
        }
    }

    fn close(&mut self) -> Result<()> {
        if self.is_open {
            self.input.close()?;
        }
        self.is_open = false;
        Ok(())
    }
}

/// Run a pipeline to completion and collect its rows.
pub fn drain<'a>(mut root: Box<dyn Operator + 'a>) -> Result<Vec<Row>> {
    root.open()?;
    let mut rows = Vec::new();
    while let Some(row) = root.next()? {
        rows.push(row);
    }
    root.close()?;
    Ok(rows)
}
