//! In-memory storage for the ofgdb engine.
//!
//! This crate provides:
//! - The tagged cell [`Value`], [`Row`] and [`Table`] model
//! - The catalog store ([`DbState`]) with coded-value domains,
//!   relationship classes and domain-to-field assignments
//! - Regeneration of the `GDB_Items` / `GDB_ItemRelationships` catalog tables
//! - The path-keyed [`StoreRegistry`] that shares one store per database path
//! - The error taxonomy used by every layer above

pub mod catalog;
pub mod error;
pub mod registry;
pub mod row;
pub mod schema;
pub mod table;
pub mod value;

pub use catalog::{Cardinality, DbState, Domain, DomainAssignment, FieldType, Relationship};
pub use error::{Error, ErrorCode, Result};
pub use registry::{normalize_path, SharedStore, StoreRegistry};
pub use row::Row;
pub use table::Table;
pub use value::{Value, BINARY_PLACEHOLDER};
