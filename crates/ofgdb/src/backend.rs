//! The backend contract shared by every engine.

use std::fmt;

use ofgdb_storage::Result;

/// Opaque identifier for a live database, table, cursor, row or field-info
/// resource. `Handle::NONE` (zero) is never issued and marks "no resource",
/// e.g. an exhausted cursor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Handle(u64);

impl Handle {
    pub const NONE: Handle = Handle(0);

    pub const fn from_raw(raw: u64) -> Self {
        Handle(raw)
    }

    pub const fn get(self) -> u64 {
        self.0
    }

    pub const fn is_none(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Arguments of [`Backend::create_relationship_class`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelationshipClassDef<'a> {
    pub name: &'a str,
    pub origin_table: &'a str,
    pub destination_table: &'a str,
    pub origin_pk: &'a str,
    pub origin_fk: &'a str,
    pub forward_label: &'a str,
    pub backward_label: &'a str,
    /// `1:1`, `1:n`, `n:1`, `m:n` or a spelled-out form.
    pub cardinality: &'a str,
    pub composite: bool,
    pub attributed: bool,
}

/// Every operation an engine exposes through the handle interface.
///
/// Close operations are idempotent: unknown handles succeed. Nullable text
/// and byte outputs are `Option`s; `None` means the cell is absent or null.
pub trait Backend: Send + Sync {
    /// Registry name of this engine, used to prefix dispatch errors.
    fn name(&self) -> &str;
    fn runtime_info(&self) -> String;
    /// Message of the last failing call; empty after a successful one.
    fn last_error_message(&self) -> String;

    // Databases
    fn open(&self, path: &str) -> Result<Handle>;
    fn create(&self, path: &str) -> Result<Handle>;
    fn close(&self, db: Handle) -> Result<()>;
    fn exec_sql(&self, db: Handle, sql: &str) -> Result<()>;
    fn list_tables_text(&self, db: Handle) -> Result<String>;

    // Tables and cursors
    fn open_table(&self, db: Handle, table_name: &str) -> Result<Handle>;
    fn close_table(&self, db: Handle, table: Handle) -> Result<()>;
    /// `fields` is accepted for compatibility; full rows are returned.
    fn search(&self, table: Handle, fields: &str, where_clause: &str) -> Result<Handle>;
    /// Next row as a fresh row handle, or `Handle::NONE` once exhausted.
    fn fetch_row(&self, cursor: Handle) -> Result<Handle>;
    fn close_cursor(&self, cursor: Handle) -> Result<()>;

    // Rows
    fn create_row(&self, table: Handle) -> Result<Handle>;
    fn insert(&self, table: Handle, row: Handle) -> Result<()>;
    fn update(&self, table: Handle, row: Handle) -> Result<()>;
    fn close_row(&self, row: Handle) -> Result<()>;

    // Field info
    fn get_field_info(&self, table: Handle) -> Result<Handle>;
    fn field_info_count(&self, info: Handle) -> Result<usize>;
    fn field_info_name(&self, info: Handle, index: usize) -> Result<String>;
    fn close_field_info(&self, info: Handle) -> Result<()>;

    // Setters
    fn set_string(&self, row: Handle, column: &str, value: &str) -> Result<()>;
    fn set_int32(&self, row: Handle, column: &str, value: i32) -> Result<()>;
    fn set_double(&self, row: Handle, column: &str, value: f64) -> Result<()>;
    fn set_blob(&self, row: Handle, column: &str, data: &[u8]) -> Result<()>;
    fn set_geometry(&self, row: Handle, wkb: &[u8]) -> Result<()>;
    fn set_null(&self, row: Handle, column: &str) -> Result<()>;

    // Getters
    fn row_get_string(&self, row: Handle, column: &str) -> Result<Option<String>>;
    fn row_is_null(&self, row: Handle, column: &str) -> Result<bool>;
    fn row_get_int32(&self, row: Handle, column: &str) -> Result<Option<i32>>;
    fn row_get_double(&self, row: Handle, column: &str) -> Result<Option<f64>>;
    fn row_get_blob(&self, row: Handle, column: &str) -> Result<Option<Vec<u8>>>;
    fn row_get_geometry(&self, row: Handle) -> Result<Option<Vec<u8>>>;

    // Domains
    fn list_domains(&self, db: Handle) -> Result<Handle>;
    fn list_domains_text(&self, db: Handle) -> Result<String>;
    fn create_coded_domain(&self, db: Handle, name: &str, field_type: &str) -> Result<()>;
    fn add_coded_value(
        &self,
        db: Handle,
        domain: &str,
        code: &str,
        label: Option<&str>,
    ) -> Result<()>;
    fn assign_domain_to_field(
        &self,
        db: Handle,
        table: &str,
        column: &str,
        domain: &str,
    ) -> Result<()>;

    // Relationships
    fn list_relationships(&self, db: Handle) -> Result<Handle>;
    fn list_relationships_text(&self, db: Handle) -> Result<String>;
    fn create_relationship_class(&self, db: Handle, def: &RelationshipClassDef<'_>) -> Result<()>;
}
