//! Self-contained in-memory engine.
//!
//! One mutex guards the handle registry and every catalog store, so each
//! call runs atomically with respect to all others. Stores are shared per
//! normalized database path and outlive the handles opened on them.

use ofgdb_executor::{execute_sql, Cursor};
use ofgdb_storage::{Cardinality, Error, Relationship, Result, Row, StoreRegistry, Value};
use parking_lot::Mutex;
use tracing::debug;

use crate::backend::{Backend, Handle, RelationshipClassDef};
use crate::handles::HandleRegistry;

pub const BACKEND_NAME: &str = "memory";

/// Candidate key columns for [`Backend::update`], in lookup order.
const KEY_COLUMNS: [&str; 3] = ["T_Id", "T_ID", "OBJECTID"];

#[derive(Default)]
struct EngineState {
    stores: StoreRegistry,
    handles: HandleRegistry,
    last_error: String,
}

#[derive(Default)]
pub struct MemoryBackend {
    state: Mutex<EngineState>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget the cached store for `path`. Open handles keep their store.
    pub fn evict_store(&self, path: &str) -> Result<bool> {
        self.run("evict_store", |st| st.stores.evict(path))
    }

    /// Run `f` under the engine lock and record its outcome as the last error.
    fn run<T>(
        &self,
        op: &'static str,
        f: impl FnOnce(&mut EngineState) -> Result<T>,
    ) -> Result<T> {
        let mut state = self.state.lock();
        let result = f(&mut state);
        match &result {
            Ok(_) => state.last_error.clear(),
            Err(err) => {
                debug!(op, code = ?err.code(), error = %err, "memory backend call failed");
                state.last_error = err.message().to_string();
            }
        }
        result
    }

    fn set_value(&self, op: &'static str, row: Handle, column: &str, value: Value) -> Result<()> {
        self.run(op, |st| {
            require_column(column)?;
            st.handles.row_mut(row)?.row.set(column, value);
            Ok(())
        })
    }

    fn read_cell<T>(
        &self,
        op: &'static str,
        row: Handle,
        column: &str,
        read: impl FnOnce(Option<&Value>) -> Result<T>,
    ) -> Result<T> {
        self.run(op, |st| {
            require_column(column)?;
            read(st.handles.row(row)?.row.get(column))
        })
    }
}

fn require_column(column: &str) -> Result<()> {
    if column.is_empty() {
        return Err(Error::invalid("column name missing"));
    }
    Ok(())
}

fn table_missing() -> Error {
    Error::not_found("table does not exist")
}

fn type_mismatch(expected: &str, found: &Value) -> Error {
    Error::invalid(format!("value is {} not {expected}", found.type_name()))
}

/// First key column present with a non-null value.
fn row_key(row: &Row) -> Result<(&'static str, Value)> {
    KEY_COLUMNS
        .iter()
        .find_map(|column| {
            row.get(column)
                .filter(|value| !value.is_null())
                .map(|value| (*column, value.clone()))
        })
        .ok_or_else(|| Error::invalid("update requires key column (T_Id/T_ID/OBJECTID)"))
}

fn join_lines<'a>(names: impl Iterator<Item = &'a str>) -> String {
    names.collect::<Vec<_>>().join("\n")
}

impl EngineState {
    /// Resolve a row handle and a table handle that must share a database.
    fn row_for_table(&self, table: Handle, row: Handle) -> Result<(Handle, String, Row)> {
        let target = self.handles.table(table)?;
        let entry = self.handles.row(row)?;
        if entry.db != target.db {
            return Err(Error::invalid("row and table belong to different databases"));
        }
        Ok((target.db, target.name.clone(), entry.row.clone()))
    }
}

impl Backend for MemoryBackend {
    fn name(&self) -> &str {
        BACKEND_NAME
    }

    fn runtime_info(&self) -> String {
        format!(
            "backend={BACKEND_NAME};impl=in_memory;version={}",
            crate::version()
        )
    }

    fn last_error_message(&self) -> String {
        self.state.lock().last_error.clone()
    }

    // ── Databases ───────────────────────────────────────────────────────

    fn open(&self, path: &str) -> Result<Handle> {
        self.run("open", |st| {
            let store = st.stores.open(path)?;
            let db = st.handles.insert_database(store);
            debug!(path, db = %db, "opened database");
            Ok(db)
        })
    }

    fn create(&self, path: &str) -> Result<Handle> {
        self.run("create", |st| {
            let store = st.stores.create(path)?;
            let db = st.handles.insert_database(store);
            debug!(path, db = %db, "created database");
            Ok(db)
        })
    }

    fn close(&self, db: Handle) -> Result<()> {
        self.run("close", |st| {
            st.handles.close_database(db);
            Ok(())
        })
    }

    fn exec_sql(&self, db: Handle, sql: &str) -> Result<()> {
        self.run("exec_sql", |st| {
            let mut db_state = st.handles.database(db)?.lock();
            let outcome = execute_sql(&mut db_state, sql)?;
            debug!(db = %db, ?outcome, "executed statement");
            Ok(())
        })
    }

    fn list_tables_text(&self, db: Handle) -> Result<String> {
        self.run("list_tables_text", |st| {
            let db_state = st.handles.database(db)?.lock();
            Ok(join_lines(db_state.table_names()))
        })
    }

    // ── Tables and cursors ──────────────────────────────────────────────

    fn open_table(&self, db: Handle, table_name: &str) -> Result<Handle> {
        self.run("open_table", |st| {
            if table_name.is_empty() {
                return Err(Error::invalid("table name missing"));
            }
            let name = {
                let db_state = st.handles.database(db)?.lock();
                db_state
                    .resolve_table_name(table_name)
                    .map(str::to_string)
                    .ok_or_else(table_missing)?
            };
            Ok(st.handles.insert_table(db, name))
        })
    }

    fn close_table(&self, db: Handle, table: Handle) -> Result<()> {
        self.run("close_table", |st| st.handles.close_table(db, table))
    }

    fn search(&self, table: Handle, fields: &str, where_clause: &str) -> Result<Handle> {
        self.run("search", |st| {
            let predicate = ofgdb_parser::parse_where(where_clause)
                .map_err(|e| Error::invalid(e.message()))?;
            let target = st.handles.table(table)?.clone();
            let cursor = {
                let db_state = st.handles.database(target.db)?.lock();
                let stored = db_state.table(&target.name).ok_or_else(table_missing)?;
                Cursor::search(stored, &predicate)?
            };
            let fields = fields.trim();
            if !fields.is_empty() && fields != "*" {
                debug!(fields, "field list not applied; returning full rows");
            }
            debug!(table = %target.name, matches = cursor.remaining(), "search");
            Ok(st.handles.insert_cursor(target.db, cursor))
        })
    }

    fn fetch_row(&self, cursor: Handle) -> Result<Handle> {
        self.run("fetch_row", |st| {
            let entry = st.handles.cursor_mut(cursor)?;
            let db = entry.db;
            let next = entry.cursor.next();
            Ok(match next {
                Some(row) => st.handles.insert_row(db, row),
                None => Handle::NONE,
            })
        })
    }

    fn close_cursor(&self, cursor: Handle) -> Result<()> {
        self.run("close_cursor", |st| {
            st.handles.close_cursor(cursor);
            Ok(())
        })
    }

    // ── Rows ────────────────────────────────────────────────────────────

    fn create_row(&self, table: Handle) -> Result<Handle> {
        self.run("create_row", |st| {
            let db = st.handles.table(table)?.db;
            Ok(st.handles.insert_row(db, Row::new()))
        })
    }

    fn insert(&self, table: Handle, row: Handle) -> Result<()> {
        self.run("insert", |st| {
            let (db, name, row) = st.row_for_table(table, row)?;
            let mut db_state = st.handles.database(db)?.lock();
            db_state
                .table_mut(&name)
                .ok_or_else(table_missing)?
                .insert(row);
            Ok(())
        })
    }

    fn update(&self, table: Handle, row: Handle) -> Result<()> {
        self.run("update", |st| {
            let (db, name, row) = st.row_for_table(table, row)?;
            let (key_column, key_value) = row_key(&row)?;
            let mut db_state = st.handles.database(db)?.lock();
            let stored = db_state.table_mut(&name).ok_or_else(table_missing)?;
            match stored
                .rows
                .iter_mut()
                .find(|existing| existing.get(key_column) == Some(&key_value))
            {
                Some(existing) => existing.merge_from(&row),
                None => {
                    debug!(table = %name, key = key_column, "no row with matching key; appending");
                    stored.insert(row);
                }
            }
            Ok(())
        })
    }

    fn close_row(&self, row: Handle) -> Result<()> {
        self.run("close_row", |st| {
            st.handles.close_row(row);
            Ok(())
        })
    }

    // ── Field info ──────────────────────────────────────────────────────

    fn get_field_info(&self, table: Handle) -> Result<Handle> {
        self.run("get_field_info", |st| {
            let target = st.handles.table(table)?.clone();
            let columns = {
                let db_state = st.handles.database(target.db)?.lock();
                db_state
                    .table(&target.name)
                    .ok_or_else(table_missing)?
                    .columns
                    .clone()
            };
            Ok(st.handles.insert_field_info(target.db, columns))
        })
    }

    fn field_info_count(&self, info: Handle) -> Result<usize> {
        self.run("field_info_count", |st| {
            Ok(st.handles.field_info(info)?.columns.len())
        })
    }

    fn field_info_name(&self, info: Handle, index: usize) -> Result<String> {
        self.run("field_info_name", |st| {
            st.handles
                .field_info(info)?
                .columns
                .get(index)
                .cloned()
                .ok_or_else(|| Error::invalid("field index out of range"))
        })
    }

    fn close_field_info(&self, info: Handle) -> Result<()> {
        self.run("close_field_info", |st| {
            st.handles.close_field_info(info);
            Ok(())
        })
    }

    // ── Setters ─────────────────────────────────────────────────────────

    fn set_string(&self, row: Handle, column: &str, value: &str) -> Result<()> {
        self.set_value("set_string", row, column, Value::from(value))
    }

    fn set_int32(&self, row: Handle, column: &str, value: i32) -> Result<()> {
        self.set_value("set_int32", row, column, Value::Int32(value))
    }

    fn set_double(&self, row: Handle, column: &str, value: f64) -> Result<()> {
        self.set_value("set_double", row, column, Value::Double(value))
    }

    fn set_blob(&self, row: Handle, column: &str, data: &[u8]) -> Result<()> {
        self.set_value("set_blob", row, column, Value::Blob(data.to_vec()))
    }

    fn set_geometry(&self, row: Handle, wkb: &[u8]) -> Result<()> {
        self.run("set_geometry", |st| {
            st.handles.row_mut(row)?.row.set_geometry(wkb.to_vec());
            Ok(())
        })
    }

    fn set_null(&self, row: Handle, column: &str) -> Result<()> {
        self.set_value("set_null", row, column, Value::Null)
    }

    // ── Getters ─────────────────────────────────────────────────────────

    fn row_get_string(&self, row: Handle, column: &str) -> Result<Option<String>> {
        self.read_cell("row_get_string", row, column, |value| {
            Ok(value.and_then(Value::to_text))
        })
    }

    fn row_is_null(&self, row: Handle, column: &str) -> Result<bool> {
        self.read_cell("row_is_null", row, column, |value| {
            Ok(value.map_or(true, Value::is_null))
        })
    }

    fn row_get_int32(&self, row: Handle, column: &str) -> Result<Option<i32>> {
        self.read_cell("row_get_int32", row, column, |value| match value {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Int32(i)) => Ok(Some(*i)),
            Some(other) => Err(type_mismatch("int32", other)),
        })
    }

    fn row_get_double(&self, row: Handle, column: &str) -> Result<Option<f64>> {
        self.read_cell("row_get_double", row, column, |value| match value {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Double(d)) => Ok(Some(*d)),
            Some(Value::Int32(i)) => Ok(Some(f64::from(*i))),
            Some(other) => Err(type_mismatch("double", other)),
        })
    }

    fn row_get_blob(&self, row: Handle, column: &str) -> Result<Option<Vec<u8>>> {
        self.read_cell("row_get_blob", row, column, |value| match value {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Blob(bytes)) => Ok(Some(bytes.clone())),
            Some(other) => Err(type_mismatch("blob", other)),
        })
    }

    fn row_get_geometry(&self, row: Handle) -> Result<Option<Vec<u8>>> {
        self.run("row_get_geometry", |st| match st.handles.row(row)?.row.geometry() {
            Value::Null => Ok(None),
            Value::Geometry(wkb) => Ok(Some(wkb.clone())),
            other => Err(type_mismatch("geometry", other)),
        })
    }

    // ── Domains ─────────────────────────────────────────────────────────

    fn list_domains(&self, db: Handle) -> Result<Handle> {
        self.run("list_domains", |st| {
            let rows: Vec<Row> = {
                let db_state = st.handles.database(db)?.lock();
                db_state
                    .domains()
                    .map(|d| {
                        [
                            ("name", Value::from(d.name.as_str())),
                            ("fieldType", Value::from(d.field_type.as_str())),
                        ]
                        .into_iter()
                        .collect::<Row>()
                    })
                    .collect()
            };
            Ok(st.handles.insert_cursor(db, Cursor::new(rows)))
        })
    }

    fn list_domains_text(&self, db: Handle) -> Result<String> {
        self.run("list_domains_text", |st| {
            let db_state = st.handles.database(db)?.lock();
            Ok(join_lines(db_state.domains().map(|d| d.name.as_str())))
        })
    }

    fn create_coded_domain(&self, db: Handle, name: &str, field_type: &str) -> Result<()> {
        self.run("create_coded_domain", |st| {
            let changed = st
                .handles
                .database(db)?
                .lock()
                .create_coded_domain(name, field_type)?;
            debug!(domain = name, changed, "create coded domain");
            Ok(())
        })
    }

    fn add_coded_value(
        &self,
        db: Handle,
        domain: &str,
        code: &str,
        label: Option<&str>,
    ) -> Result<()> {
        self.run("add_coded_value", |st| {
            st.handles
                .database(db)?
                .lock()
                .add_coded_value(domain, code, label)
        })
    }

    fn assign_domain_to_field(
        &self,
        db: Handle,
        table: &str,
        column: &str,
        domain: &str,
    ) -> Result<()> {
        self.run("assign_domain_to_field", |st| {
            let added = st
                .handles
                .database(db)?
                .lock()
                .assign_domain_to_field(table, column, domain)?;
            debug!(domain, table, column, added, "assign domain");
            Ok(())
        })
    }

    // ── Relationships ───────────────────────────────────────────────────

    fn list_relationships(&self, db: Handle) -> Result<Handle> {
        self.run("list_relationships", |st| {
            let rows: Vec<Row> = {
                let db_state = st.handles.database(db)?.lock();
                db_state
                    .relationships()
                    .map(|r| {
                        [("name", Value::from(r.name.as_str()))]
                            .into_iter()
                            .collect::<Row>()
                    })
                    .collect()
            };
            Ok(st.handles.insert_cursor(db, Cursor::new(rows)))
        })
    }

    fn list_relationships_text(&self, db: Handle) -> Result<String> {
        self.run("list_relationships_text", |st| {
            let db_state = st.handles.database(db)?.lock();
            Ok(join_lines(db_state.relationships().map(|r| r.name.as_str())))
        })
    }

    fn create_relationship_class(&self, db: Handle, def: &RelationshipClassDef<'_>) -> Result<()> {
        self.run("create_relationship_class", |st| {
            let rel = Relationship {
                name: def.name.to_string(),
                origin_table: def.origin_table.to_string(),
                destination_table: def.destination_table.to_string(),
                origin_pk: def.origin_pk.to_string(),
                origin_fk: def.origin_fk.to_string(),
                forward_label: def.forward_label.to_string(),
                backward_label: def.backward_label.to_string(),
                cardinality: Cardinality::parse(def.cardinality),
                composite: def.composite,
                attributed: def.attributed,
            };
            let stored = st
                .handles
                .database(db)?
                .lock()
                .create_relationship_class(rel)?;
            debug!(relationship = def.name, stored, "create relationship class");
            Ok(())
        })
    }
}
