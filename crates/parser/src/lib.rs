//! Statement parser and AST definitions for the ofgdb statement dialect.
//!
//! Modules:
//! - `ast`: statement and predicate node types
//! - `tokenizer`: quote/paren-aware scanner used to split lists and clauses
//! - `parser`: parser producing AST nodes from statement text
//!
//! The dialect covers `CREATE TABLE`, `INSERT INTO ... VALUES`, `UPDATE ... SET`
//! and `DELETE FROM`, with `WHERE` clauses restricted to `AND`-chains of
//! `col = literal` and `col IS NULL`. Any other leading verb parses to
//! [`Statement::Other`].

pub mod ast;
pub mod parser;
pub mod tokenizer;

use ast::{Predicate, Statement};
use parser::Parser;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ParseError {
    message: String,
}

impl ParseError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Parse one statement. Surrounding whitespace and trailing semicolons are ignored.
pub fn parse(input: &str) -> Result<Statement, ParseError> {
    let sql = input.trim().trim_end_matches(';').trim_end();
    Parser::new(sql).parse_statement()
}

/// Parse a bare `WHERE` predicate (without the keyword), as passed to a search.
pub fn parse_where(input: &str) -> Result<Predicate, ParseError> {
    parser::parse_predicate(input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::*;

    #[test]
    fn test_parse_create_table() {
        let stmt = parse("CREATE TABLE Parcels (Name TEXT, Area DOUBLE);").unwrap();
        match stmt {
            Statement::CreateTable(ct) => {
                assert_eq!(ct.table_name, "Parcels");
                assert_eq!(ct.columns.len(), 2);
            }
            _ => panic!("expected CreateTable"),
        }
    }

    #[test]
    fn test_parse_insert() {
        let stmt = parse("INSERT INTO Parcels (Name, Area) VALUES ('Lot1', 12.5);").unwrap();
        match stmt {
            Statement::Insert(ins) => {
                assert_eq!(ins.table_name, "Parcels");
                assert_eq!(ins.values.len(), 2);
            }
            _ => panic!("expected Insert"),
        }
    }

    #[test]
    fn test_parse_update() {
        let stmt = parse("UPDATE t SET x = 1 WHERE id = 2;").unwrap();
        match stmt {
            Statement::Update(u) => {
                assert_eq!(u.table_name, "t");
                assert_eq!(u.assignments.len(), 1);
                assert!(!u.predicate.is_empty());
            }
            _ => panic!("expected Update"),
        }
    }

    #[test]
    fn test_parse_delete() {
        let stmt = parse("  DELETE FROM t WHERE id = 1 ;; ").unwrap();
        match stmt {
            Statement::Delete(d) => {
                assert_eq!(d.table_name, "t");
                assert_eq!(d.predicate.conditions.len(), 1);
            }
            _ => panic!("expected Delete"),
        }
    }

    #[test]
    fn test_parse_other_verb() {
        let stmt = parse("drop table t").unwrap();
        assert_eq!(
            stmt,
            Statement::Other {
                verb: "DROP".to_string()
            }
        );
    }

    #[test]
    fn test_parse_where() {
        let predicate = parse_where("Zone IS NULL AND Name = 'a'").unwrap();
        assert_eq!(predicate.conditions.len(), 2);
        assert!(parse_where("").unwrap().is_empty());
        assert!(parse_where("Zone > 3").is_err());
    }
}
