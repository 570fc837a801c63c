//! Predicate evaluation against rows.

use ofgdb_parser::ast::{Condition, Literal, Predicate};
use ofgdb_storage::{Row, Value};

/// Storage value for a statement literal. No numeric typing is applied:
/// unquoted tokens stay text.
pub fn literal_value(literal: &Literal) -> Value {
    match literal {
        Literal::Null => Value::Null,
        Literal::String(s) => Value::String(s.clone()),
    }
}

/// True when every condition holds. The empty predicate matches all rows.
pub fn row_matches(row: &Row, predicate: &Predicate) -> bool {
    predicate
        .conditions
        .iter()
        .all(|condition| condition_matches(row, condition))
}

pub fn condition_matches(row: &Row, condition: &Condition) -> bool {
    match condition {
        Condition::IsNull { column } => row.is_null(column),
        Condition::Equals { column, value } => match row.get(column) {
            Some(Value::String(s)) => s == value,
            Some(Value::Int32(i)) => i.to_string() == *value,
            _ => false,
        },
    }
}
