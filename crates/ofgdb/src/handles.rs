//! Handle registry: issues identifiers and resolves them to live state.
//!
//! All five resource kinds draw from one counter, so a handle value is never
//! reused across kinds or after it is closed. Every non-database resource
//! records the database handle it was opened under; closing that database
//! erases them all.

use ofgdb_executor::Cursor;
use ofgdb_storage::{Error, Result, Row, SharedStore};
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::backend::Handle;

pub struct DatabaseEntry {
    pub store: SharedStore,
}

#[derive(Debug, Clone)]
pub struct TableEntry {
    pub db: Handle,
    /// Stored spelling of the table name at open time.
    pub name: String,
}

pub struct CursorEntry {
    pub db: Handle,
    pub cursor: Cursor,
}

pub struct RowEntry {
    pub db: Handle,
    pub row: Row,
}

pub struct FieldInfoEntry {
    pub db: Handle,
    pub columns: Vec<String>,
}

#[derive(Default)]
pub struct HandleRegistry {
    last_issued: u64,
    databases: FxHashMap<Handle, DatabaseEntry>,
    tables: FxHashMap<Handle, TableEntry>,
    cursors: FxHashMap<Handle, CursorEntry>,
    rows: FxHashMap<Handle, RowEntry>,
    field_infos: FxHashMap<Handle, FieldInfoEntry>,
}

impl HandleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next unused identifier. Starts at 1.
    pub fn allocate(&mut self) -> Handle {
        self.last_issued += 1;
        Handle::from_raw(self.last_issued)
    }

    // ── Registration ────────────────────────────────────────────────────

    pub fn insert_database(&mut self, store: SharedStore) -> Handle {
        let handle = self.allocate();
        self.databases.insert(handle, DatabaseEntry { store });
        handle
    }

    pub fn insert_table(&mut self, db: Handle, name: String) -> Handle {
        let handle = self.allocate();
        self.tables.insert(handle, TableEntry { db, name });
        handle
    }

    pub fn insert_cursor(&mut self, db: Handle, cursor: Cursor) -> Handle {
        let handle = self.allocate();
        self.cursors.insert(handle, CursorEntry { db, cursor });
        handle
    }

    pub fn insert_row(&mut self, db: Handle, row: Row) -> Handle {
        let handle = self.allocate();
        self.rows.insert(handle, RowEntry { db, row });
        handle
    }

    pub fn insert_field_info(&mut self, db: Handle, columns: Vec<String>) -> Handle {
        let handle = self.allocate();
        self.field_infos
            .insert(handle, FieldInfoEntry { db, columns });
        handle
    }

    // ── Resolution ──────────────────────────────────────────────────────

    pub fn database(&self, handle: Handle) -> Result<&SharedStore> {
        self.databases
            .get(&handle)
            .map(|entry| &entry.store)
            .ok_or_else(|| Error::invalid("unknown db handle"))
    }

    pub fn table(&self, handle: Handle) -> Result<&TableEntry> {
        let entry = self
            .tables
            .get(&handle)
            .ok_or_else(|| Error::invalid("unknown table handle"))?;
        self.check_owner(entry.db)?;
        Ok(entry)
    }

    pub fn cursor_mut(&mut self, handle: Handle) -> Result<&mut CursorEntry> {
        let db = self
            .cursors
            .get(&handle)
            .map(|entry| entry.db)
            .ok_or_else(|| Error::invalid("unknown cursor handle"))?;
        self.check_owner(db)?;
        self.cursors
            .get_mut(&handle)
            .ok_or_else(|| Error::invalid("unknown cursor handle"))
    }

    pub fn row(&self, handle: Handle) -> Result<&RowEntry> {
        let entry = self
            .rows
            .get(&handle)
            .ok_or_else(|| Error::invalid("unknown row handle"))?;
        self.check_owner(entry.db)?;
        Ok(entry)
    }

    pub fn row_mut(&mut self, handle: Handle) -> Result<&mut RowEntry> {
        let db = self
            .rows
            .get(&handle)
            .map(|entry| entry.db)
            .ok_or_else(|| Error::invalid("unknown row handle"))?;
        self.check_owner(db)?;
        self.rows
            .get_mut(&handle)
            .ok_or_else(|| Error::invalid("unknown row handle"))
    }

    pub fn field_info(&self, handle: Handle) -> Result<&FieldInfoEntry> {
        let entry = self
            .field_infos
            .get(&handle)
            .ok_or_else(|| Error::invalid("unknown field info handle"))?;
        self.check_owner(entry.db)?;
        Ok(entry)
    }

    /// The owning database must still be open.
    fn check_owner(&self, db: Handle) -> Result<()> {
        if self.databases.contains_key(&db) {
            Ok(())
        } else {
            Err(Error::invalid("owning db handle is closed"))
        }
    }

    // ── Closing ─────────────────────────────────────────────────────────

    /// Remove the database binding and every resource opened under it.
    /// Unknown handles are a no-op. Returns whether the database was open.
    pub fn close_database(&mut self, db: Handle) -> bool {
        if self.databases.remove(&db).is_none() {
            return false;
        }
        let before = self.resource_count();
        self.tables.retain(|_, entry| entry.db != db);
        self.cursors.retain(|_, entry| entry.db != db);
        self.rows.retain(|_, entry| entry.db != db);
        self.field_infos.retain(|_, entry| entry.db != db);
        debug!(db = %db, released = before - self.resource_count(), "closed database handle");
        true
    }

    /// Unknown table handles are a no-op; a known one must belong to `db`.
    pub fn close_table(&mut self, db: Handle, table: Handle) -> Result<()> {
        match self.tables.get(&table) {
            None => Ok(()),
            Some(entry) if entry.db != db => {
                Err(Error::invalid("table handle does not belong to db"))
            }
            Some(_) => {
                self.tables.remove(&table);
                Ok(())
            }
        }
    }

    pub fn close_cursor(&mut self, cursor: Handle) {
        self.cursors.remove(&cursor);
    }

    pub fn close_row(&mut self, row: Handle) {
        self.rows.remove(&row);
    }

    pub fn close_field_info(&mut self, info: Handle) {
        self.field_infos.remove(&info);
    }

    fn resource_count(&self) -> usize {
        self.tables.len() + self.cursors.len() + self.rows.len() + self.field_infos.len()
    }
}
