//! Handle-based interface to an in-memory tabular/spatial database.
//!
//! Callers talk to a [`Dispatch`], which binds to one registered
//! [`Backend`] on first use. The built-in backend is [`MemoryBackend`]:
//! path-keyed catalog stores, a handle registry, and an interpreter for a
//! small statement dialect (`CREATE TABLE`, `INSERT`, `UPDATE`, `DELETE`).

pub mod backend;
pub mod config;
pub mod dispatch;
pub mod handles;
pub mod logging;
pub mod memory;

pub use backend::{Backend, Handle, RelationshipClassDef};
pub use config::{BackendSelector, Config};
pub use dispatch::{BackendRegistry, Dispatch};
pub use memory::MemoryBackend;
pub use ofgdb_storage::{Error, ErrorCode, Result};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
