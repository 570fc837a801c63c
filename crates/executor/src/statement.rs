//! Statement execution against a catalog store.

use ofgdb_parser::ast::{
    CreateTableStatement, DeleteStatement, InsertStatement, Statement, UpdateStatement,
};
use ofgdb_storage::{DbState, Error, Result, Row, Table};
use tracing::debug;

use crate::eval::{literal_value, row_matches};

/// What a statement did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecOutcome {
    /// `created` is false when the table already existed.
    CreateTable { created: bool },
    Insert,
    Update { rows_affected: usize },
    Delete { rows_affected: usize },
    /// Statement with an unrecognized verb; nothing happened.
    Ignored,
}

/// Parse and run one statement.
pub fn execute_sql(db: &mut DbState, sql: &str) -> Result<ExecOutcome> {
    let statement = ofgdb_parser::parse(sql).map_err(|e| Error::invalid(e.message()))?;
    execute(db, &statement)
}

pub fn execute(db: &mut DbState, statement: &Statement) -> Result<ExecOutcome> {
    match statement {
        Statement::CreateTable(ct) => Ok(execute_create_table(db, ct)),
        Statement::Insert(ins) => execute_insert(db, ins),
        Statement::Update(up) => execute_update(db, up),
        Statement::Delete(del) => execute_delete(db, del),
        Statement::Other { verb } => {
            debug!(verb = %verb, "ignoring statement with unsupported verb");
            Ok(ExecOutcome::Ignored)
        }
    }
}

fn execute_create_table(db: &mut DbState, stmt: &CreateTableStatement) -> ExecOutcome {
    let columns = stmt.columns.iter().map(|c| c.name.clone()).collect();
    let created = db.create_table(&stmt.table_name, columns);
    debug!(table = %stmt.table_name, created, "create table");
    ExecOutcome::CreateTable { created }
}

fn execute_insert(db: &mut DbState, stmt: &InsertStatement) -> Result<ExecOutcome> {
    let table = table_mut(db, &stmt.table_name)?;
    let row: Row = stmt
        .columns
        .iter()
        .zip(&stmt.values)
        .map(|(column, literal)| (column.as_str(), literal_value(literal)))
        .collect();
    table.insert(row);
    Ok(ExecOutcome::Insert)
}

fn execute_update(db: &mut DbState, stmt: &UpdateStatement) -> Result<ExecOutcome> {
    let table = table_mut(db, &stmt.table_name)?;
    let mut rows_affected = 0;
    for row in table.rows.iter_mut() {
        if !row_matches(row, &stmt.predicate) {
            continue;
        }
        for assignment in &stmt.assignments {
            row.set(&assignment.column, literal_value(&assignment.value));
        }
        rows_affected += 1;
    }
    debug!(table = %stmt.table_name, rows_affected, "update");
    Ok(ExecOutcome::Update { rows_affected })
}

fn execute_delete(db: &mut DbState, stmt: &DeleteStatement) -> Result<ExecOutcome> {
    let table = table_mut(db, &stmt.table_name)?;
    let before = table.row_count();
    if stmt.predicate.is_empty() {
        table.clear();
    } else {
        table.rows.retain(|row| !row_matches(row, &stmt.predicate));
    }
    let rows_affected = before - table.row_count();
    debug!(table = %stmt.table_name, rows_affected, "delete");
    Ok(ExecOutcome::Delete { rows_affected })
}

fn table_mut<'a>(db: &'a mut DbState, name: &str) -> Result<&'a mut Table> {
    db.table_mut(name)
        .ok_or_else(|| Error::not_found(format!("table '{name}' does not exist")))
}
