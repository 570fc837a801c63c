//! Statement executor: runs parsed statements against a catalog store and
//! materializes search results.
//!
//! Searches run through a minimal Volcano-style pipeline (`Scan` feeding
//! `Filter`) and are collected into a [`Cursor`] snapshot.
pub mod cursor;
pub mod eval;
pub mod operator;
pub mod statement;

pub use cursor::Cursor;
pub use eval::{literal_value, row_matches};
pub use statement::{execute, execute_sql, ExecOutcome};
