//! Backend registry and dispatch.
//!
//! [`Dispatch`] binds to one backend on first use, chosen by a
//! [`BackendSelector`]. A failed selection leaves it unbound so the next call
//! retries. Backend failures are re-worded as `"<backend> backend failed:
//! <message>"` and recorded as the dispatch-level last error.

use std::collections::BTreeMap;
use std::sync::Arc;

use ofgdb_storage::{Error, Result};
use parking_lot::Mutex;
use tracing::{debug, info};

use crate::backend::{Backend, Handle, RelationshipClassDef};
use crate::config::{BackendSelector, Config};
use crate::memory::MemoryBackend;

pub type BackendFactory = Box<dyn Fn() -> Arc<dyn Backend> + Send + Sync>;

/// Backend name to factory.
#[derive(Default)]
pub struct BackendRegistry {
    factories: BTreeMap<String, BackendFactory>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The in-memory engine as `memory`, also reachable as `adapter`.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("memory", || Arc::new(MemoryBackend::new()));
        registry.register("adapter", || Arc::new(MemoryBackend::new()));
        registry
    }

    /// Names are matched case-insensitively. Re-registering replaces.
    pub fn register<F>(&mut self, name: &str, factory: F)
    where
        F: Fn() -> Arc<dyn Backend> + Send + Sync + 'static,
    {
        self.factories
            .insert(name.trim().to_ascii_lowercase(), Box::new(factory));
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    pub fn instantiate(&self, name: &str) -> Option<Arc<dyn Backend>> {
        self.factories
            .get(&name.trim().to_ascii_lowercase())
            .map(|factory| factory())
    }
}

pub struct Dispatch {
    registry: BackendRegistry,
    selector: BackendSelector,
    backend: Mutex<Option<Arc<dyn Backend>>>,
    last_error: Mutex<String>,
}

impl Dispatch {
    pub fn new(registry: BackendRegistry, selector: BackendSelector) -> Self {
        Self {
            registry,
            selector,
            backend: Mutex::new(None),
            last_error: Mutex::new(String::new()),
        }
    }

    /// Default registry bound through `config.backend`. Installs the debug
    /// log subscriber when `config.debug` is set.
    pub fn from_config(config: &Config) -> Self {
        if crate::logging::init_from_config(config) {
            debug!("debug logging enabled");
        }
        Self::new(BackendRegistry::with_defaults(), config.backend.clone())
    }

    /// [`Dispatch::from_config`] over [`Config::from_env`].
    pub fn from_env() -> Self {
        Self::from_config(&Config::from_env())
    }

    /// Name of the bound backend, if any.
    pub fn backend_name(&self) -> Option<String> {
        self.backend.lock().as_ref().map(|b| b.name().to_string())
    }

    /// Dispatch-level message of the last failure, else the backend's own.
    pub fn last_error_message(&self) -> String {
        let own = self.last_error.lock().clone();
        if !own.is_empty() {
            return own;
        }
        self.backend
            .lock()
            .as_ref()
            .map(|b| b.last_error_message())
            .unwrap_or_default()
    }

    pub fn runtime_info(&self) -> Result<String> {
        self.call("runtime_info", |b| Ok(b.runtime_info()))
    }

    fn ensure_backend_selected(&self, op: &'static str) -> Result<Arc<dyn Backend>> {
        let mut slot = self.backend.lock();
        if let Some(backend) = slot.as_ref() {
            return Ok(Arc::clone(backend));
        }
        let name = self.selector.resolve();
        match self.registry.instantiate(&name) {
            Some(backend) => {
                info!(backend = %name, impl_name = backend.name(), "selected backend");
                *slot = Some(Arc::clone(&backend));
                Ok(backend)
            }
            None => {
                let expected = self.registry.names().collect::<Vec<_>>().join(", ");
                let err = Error::invalid(format!(
                    "invalid backend '{name}'; expected one of: {expected}"
                ));
                debug!(op, error = %err, "backend selection failed");
                *self.last_error.lock() = err.message().to_string();
                Err(err)
            }
        }
    }

    fn call<T>(
        &self,
        op: &'static str,
        f: impl FnOnce(&dyn Backend) -> Result<T>,
    ) -> Result<T> {
        let backend = self.ensure_backend_selected(op)?;
        match f(backend.as_ref()) {
            Ok(value) => {
                self.last_error.lock().clear();
                Ok(value)
            }
            Err(err) => {
                let detail = err.message();
                let message = if detail.is_empty() {
                    "backend operation failed".to_string()
                } else {
                    format!("{} backend failed: {detail}", backend.name())
                };
                debug!(op, code = ?err.code(), %message, "backend call failed");
                *self.last_error.lock() = message.clone();
                Err(err.with_message(message))
            }
        }
    }

    // ── Databases ───────────────────────────────────────────────────────

    pub fn open(&self, path: &str) -> Result<Handle> {
        self.call("open", |b| b.open(path))
    }

    pub fn create(&self, path: &str) -> Result<Handle> {
        self.call("create", |b| b.create(path))
    }

    pub fn close(&self, db: Handle) -> Result<()> {
        self.call("close", |b| b.close(db))
    }

    pub fn exec_sql(&self, db: Handle, sql: &str) -> Result<()> {
        self.call("exec_sql", |b| b.exec_sql(db, sql))
    }

    pub fn list_tables_text(&self, db: Handle) -> Result<String> {
        self.call("list_tables_text", |b| b.list_tables_text(db))
    }

    // ── Tables and cursors ──────────────────────────────────────────────

    pub fn open_table(&self, db: Handle, table_name: &str) -> Result<Handle> {
        self.call("open_table", |b| b.open_table(db, table_name))
    }

    pub fn close_table(&self, db: Handle, table: Handle) -> Result<()> {
        self.call("close_table", |b| b.close_table(db, table))
    }

    pub fn search(&self, table: Handle, fields: &str, where_clause: &str) -> Result<Handle> {
        self.call("search", |b| b.search(table, fields, where_clause))
    }

    pub fn fetch_row(&self, cursor: Handle) -> Result<Handle> {
        self.call("fetch_row", |b| b.fetch_row(cursor))
    }

    pub fn close_cursor(&self, cursor: Handle) -> Result<()> {
        self.call("close_cursor", |b| b.close_cursor(cursor))
    }

    // ── Rows ────────────────────────────────────────────────────────────

    pub fn create_row(&self, table: Handle) -> Result<Handle> {
        self.call("create_row", |b| b.create_row(table))
    }

    pub fn insert(&self, table: Handle, row: Handle) -> Result<()> {
        self.call("insert", |b| b.insert(table, row))
    }

    pub fn update(&self, table: Handle, row: Handle) -> Result<()> {
        self.call("update", |b| b.update(table, row))
    }

    pub fn close_row(&self, row: Handle) -> Result<()> {
        self.call("close_row", |b| b.close_row(row))
    }

    // ── Field info ──────────────────────────────────────────────────────

    pub fn get_field_info(&self, table: Handle) -> Result<Handle> {
        self.call("get_field_info", |b| b.get_field_info(table))
    }

    pub fn field_info_count(&self, info: Handle) -> Result<usize> {
        self.call("field_info_count", |b| b.field_info_count(info))
    }

    pub fn field_info_name(&self, info: Handle, index: usize) -> Result<String> {
        self.call("field_info_name", |b| b.field_info_name(info, index))
    }

    pub fn close_field_info(&self, info: Handle) -> Result<()> {
        self.call("close_field_info", |b| b.close_field_info(info))
    }

    // ── Setters ─────────────────────────────────────────────────────────

    pub fn set_string(&self, row: Handle, column: &str, value: &str) -> Result<()> {
        self.call("set_string", |b| b.set_string(row, column, value))
    }

    pub fn set_int32(&self, row: Handle, column: &str, value: i32) -> Result<()> {
        self.call("set_int32", |b| b.set_int32(row, column, value))
    }

    pub fn set_double(&self, row: Handle, column: &str, value: f64) -> Result<()> {
        self.call("set_double", |b| b.set_double(row, column, value))
    }

    pub fn set_blob(&self, row: Handle, column: &str, data: &[u8]) -> Result<()> {
        self.call("set_blob", |b| b.set_blob(row, column, data))
    }

    pub fn set_geometry(&self, row: Handle, wkb: &[u8]) -> Result<()> {
        self.call("set_geometry", |b| b.set_geometry(row, wkb))
    }

    pub fn set_null(&self, row: Handle, column: &str) -> Result<()> {
        self.call("set_null", |b| b.set_null(row, column))
    }

    // ── Getters ─────────────────────────────────────────────────────────

    pub fn row_get_string(&self, row: Handle, column: &str) -> Result<Option<String>> {
        self.call("row_get_string", |b| b.row_get_string(row, column))
    }

    pub fn row_is_null(&self, row: Handle, column: &str) -> Result<bool> {
        self.call("row_is_null", |b| b.row_is_null(row, column))
    }

    pub fn row_get_int32(&self, row: Handle, column: &str) -> Result<Option<i32>> {
        self.call("row_get_int32", |b| b.row_get_int32(row, column))
    }

    pub fn row_get_double(&self, row: Handle, column: &str) -> Result<Option<f64>> {
        self.call("row_get_double", |b| b.row_get_double(row, column))
    }

    pub fn row_get_blob(&self, row: Handle, column: &str) -> Result<Option<Vec<u8>>> {
        self.call("row_get_blob", |b| b.row_get_blob(row, column))
    }

    pub fn row_get_geometry(&self, row: Handle) -> Result<Option<Vec<u8>>> {
        self.call("row_get_geometry", |b| b.row_get_geometry(row))
    }

    // ── Domains ─────────────────────────────────────────────────────────

    pub fn list_domains(&self, db: Handle) -> Result<Handle> {
        self.call("list_domains", |b| b.list_domains(db))
    }

    pub fn list_domains_text(&self, db: Handle) -> Result<String> {
        self.call("list_domains_text", |b| b.list_domains_text(db))
    }

    pub fn create_coded_domain(&self, db: Handle, name: &str, field_type: &str) -> Result<()> {
        self.call("create_coded_domain", |b| {
            b.create_coded_domain(db, name, field_type)
        })
    }

    pub fn add_coded_value(
        &self,
        db: Handle,
        domain: &str,
        code: &str,
        label: Option<&str>,
    ) -> Result<()> {
        self.call("add_coded_value", |b| {
            b.add_coded_value(db, domain, code, label)
        })
    }

    pub fn assign_domain_to_field(
        &self,
        db: Handle,
        table: &str,
        column: &str,
        domain: &str,
    ) -> Result<()> {
        self.call("assign_domain_to_field", |b| {
            b.assign_domain_to_field(db, table, column, domain)
        })
    }

    // ── Relationships ───────────────────────────────────────────────────

    pub fn list_relationships(&self, db: Handle) -> Result<Handle> {
        self.call("list_relationships", |b| b.list_relationships(db))
    }

    pub fn list_relationships_text(&self, db: Handle) -> Result<String> {
        self.call("list_relationships_text", |b| b.list_relationships_text(db))
    }

    pub fn create_relationship_class(
        &self,
        db: Handle,
        def: &RelationshipClassDef<'_>,
    ) -> Result<()> {
        self.call("create_relationship_class", |b| {
            b.create_relationship_class(db, def)
        })
    }
}
