//! End-to-end scenarios against the in-memory engine through its handle API.

use ofgdb::{Backend, Error, Handle, MemoryBackend, RelationshipClassDef};
use tempfile::TempDir;

type Rows = Vec<Vec<Option<String>>>;

struct Fixture {
    engine: MemoryBackend,
    db: Handle,
    path: String,
    _dir: TempDir,
}

fn fixture() -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scenario.gdb");
    let path = path.to_string_lossy().into_owned();
    let engine = MemoryBackend::new();
    let db = engine.create(&path).unwrap();
    Fixture {
        engine,
        db,
        path,
        _dir: dir,
    }
}

impl Fixture {
    fn exec(&self, sql: &str) {
        self.engine.exec_sql(self.db, sql).unwrap();
    }

    fn exec_all(&self, statements: &[&str]) {
        for sql in statements {
            self.exec(sql);
        }
    }

    /// Open `table`, search it and read `columns` of every match as text.
    fn search(&self, table: &str, where_clause: &str, columns: &[&str]) -> Rows {
        let table = self.engine.open_table(self.db, table).unwrap();
        let cursor = self.engine.search(table, "*", where_clause).unwrap();
        let rows = collect(&self.engine, cursor, columns);
        self.engine.close_cursor(cursor).unwrap();
        self.engine.close_table(self.db, table).unwrap();
        rows
    }

    fn relationships_text(&self) -> String {
        self.engine.list_relationships_text(self.db).unwrap()
    }

    fn create_relationship(&self, origin: &str) -> Result<(), Error> {
        let def = parcel_owner(origin);
        self.engine.create_relationship_class(self.db, &def)
    }
}

/// Drain a cursor, reading the requested columns of each row as text.
fn collect(engine: &MemoryBackend, cursor: Handle, columns: &[&str]) -> Rows {
    let mut out = Vec::new();
    loop {
        let row = engine.fetch_row(cursor).unwrap();
        if row.is_none() {
            break;
        }
        out.push(
            columns
                .iter()
                .map(|c| engine.row_get_string(row, c).unwrap())
                .collect(),
        );
        engine.close_row(row).unwrap();
    }
    out
}

fn s(v: &str) -> Option<String> {
    Some(v.to_string())
}

fn invalid<T>(result: Result<T, Error>) -> bool {
    matches!(result, Err(Error::InvalidArgument(_)))
}

fn not_found<T>(result: Result<T, Error>) -> bool {
    matches!(result, Err(Error::NotFound(_)))
}

fn parcel_owner(origin: &str) -> RelationshipClassDef<'_> {
    RelationshipClassDef {
        name: "ParcelOwner",
        origin_table: origin,
        destination_table: "Owners",
        origin_pk: "T_Id",
        origin_fk: "parcel_fk",
        forward_label: "owned by",
        backward_label: "owns",
        cardinality: "1:n",
        composite: false,
        attributed: false,
    }
}

#[test]
fn parcels_insert_and_filtered_search() {
    let f = fixture();
    f.exec_all(&[
        "CREATE TABLE Parcels (Name TEXT, Area DOUBLE)",
        "INSERT INTO Parcels (Name, Area) VALUES ('Lot1', 12.5)",
        "INSERT INTO Parcels (Name, Area) VALUES ('Lot2', 3)",
    ]);

    let rows = f.search("Parcels", "Name = 'Lot1'", &["Name", "Area"]);
    assert_eq!(rows, vec![vec![s("Lot1"), s("12.5")]]);
}

#[test]
fn delete_without_where_empties_table() {
    let f = fixture();
    f.exec("CREATE TABLE t (a TEXT)");
    for v in ["x", "y", "z"] {
        f.exec(&format!("INSERT INTO t (a) VALUES ('{v}')"));
    }
    f.exec("DELETE FROM t");
    assert!(f.search("t", "", &["a"]).is_empty());
}

#[test]
fn update_where_is_null_leaves_set_rows_alone() {
    let f = fixture();
    f.exec_all(&[
        "CREATE TABLE t (id TEXT, col TEXT)",
        "INSERT INTO t (id, col) VALUES ('1', NULL)",
        "INSERT INTO t (id) VALUES ('2')",
        "INSERT INTO t (id, col) VALUES ('3', 'keep')",
    ]);

    f.exec("UPDATE t SET col='x' WHERE col IS NULL");
    let rows = f.search("t", "", &["id", "col"]);
    assert_eq!(
        rows,
        vec![
            vec![s("1"), s("x")],
            vec![s("2"), s("x")],
            vec![s("3"), s("keep")],
        ]
    );
}

#[test]
fn cursor_is_a_snapshot() {
    let f = fixture();
    f.exec_all(&[
        "CREATE TABLE t (a TEXT)",
        "INSERT INTO t (a) VALUES ('before')",
    ]);
    let table = f.engine.open_table(f.db, "t").unwrap();
    let cursor = f.engine.search(table, "a", "").unwrap();
    f.exec_all(&[
        "INSERT INTO t (a) VALUES ('after')",
        "UPDATE t SET a = 'changed'",
    ]);

    assert_eq!(collect(&f.engine, cursor, &["a"]), vec![vec![s("before")]]);
    assert!(f.engine.fetch_row(cursor).unwrap().is_none());
}

#[test]
fn fetched_rows_are_copies() {
    let f = fixture();
    f.exec_all(&[
        "CREATE TABLE t (a TEXT)",
        "INSERT INTO t (a) VALUES ('orig')",
    ]);
    let table = f.engine.open_table(f.db, "t").unwrap();
    let cursor = f.engine.search(table, "*", "").unwrap();
    let row = f.engine.fetch_row(cursor).unwrap();
    f.engine.set_string(row, "a", "edited").unwrap();
    assert_eq!(f.search("t", "", &["a"]), vec![vec![s("orig")]]);
}

#[test]
fn row_insert_and_update_upsert() {
    let f = fixture();
    f.exec("CREATE TABLE classa (T_Id INTEGER, color VARCHAR)");
    let table = f.engine.open_table(f.db, "classa").unwrap();

    let row = f.engine.create_row(table).unwrap();
    f.engine.set_int32(row, "T_Id", 1).unwrap();
    f.engine.set_string(row, "color", "red").unwrap();
    f.engine.insert(table, row).unwrap();
    f.engine.close_row(row).unwrap();

    let patch = f.engine.create_row(table).unwrap();
    f.engine.set_int32(patch, "t_id", 1).unwrap();
    f.engine.set_string(patch, "color", "blue").unwrap();
    f.engine.update(table, patch).unwrap();

    let fresh = f.engine.create_row(table).unwrap();
    f.engine.set_int32(fresh, "T_ID", 2).unwrap();
    f.engine.update(table, fresh).unwrap();

    let rows = f.search("classa", "", &["T_Id", "color"]);
    assert_eq!(rows, vec![vec![s("1"), s("blue")], vec![s("2"), None]]);

    // Int32 cells compare against the literal's decimal text.
    assert_eq!(f.search("classa", "T_Id = 2", &["T_Id"]).len(), 1);
}

#[test]
fn insert_rejects_row_from_other_database() {
    let f = fixture();
    let other_dir = tempfile::tempdir().unwrap();
    let other_path = other_dir.path().join("other.gdb");
    let other = f.engine.create(&other_path.to_string_lossy()).unwrap();
    f.exec("CREATE TABLE t (a TEXT)");
    f.engine.exec_sql(other, "CREATE TABLE t (a TEXT)").unwrap();
    let here = f.engine.open_table(f.db, "t").unwrap();
    let there = f.engine.open_table(other, "t").unwrap();
    let row = f.engine.create_row(there).unwrap();

    let err = f.engine.insert(here, row).unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));
    assert!(invalid(f.engine.close_table(other, here)));
}

#[test]
fn field_info_lists_declared_columns() {
    let f = fixture();
    f.exec("CREATE TABLE t (id INTEGER, name TEXT, CONSTRAINT pk PRIMARY KEY (id))");
    let table = f.engine.open_table(f.db, "T").unwrap();
    let info = f.engine.get_field_info(table).unwrap();
    assert_eq!(f.engine.field_info_count(info).unwrap(), 2);
    assert_eq!(f.engine.field_info_name(info, 0).unwrap(), "id");
    assert_eq!(f.engine.field_info_name(info, 1).unwrap(), "name");
    assert!(invalid(f.engine.field_info_name(info, 2)));
    f.engine.close_field_info(info).unwrap();
    f.engine.close_field_info(info).unwrap();
}

#[test]
fn statement_errors() {
    let f = fixture();
    let exec = |sql| f.engine.exec_sql(f.db, sql);
    assert!(not_found(exec("INSERT INTO missing (a) VALUES (1)")));
    f.exec("CREATE TABLE t (a TEXT, b TEXT)");
    assert!(invalid(exec("INSERT INTO t (a, b) VALUES ('1')")));
    let table = f.engine.open_table(f.db, "t").unwrap();
    assert!(invalid(f.engine.search(table, "*", "a > 1")));
    assert!(invalid(f.engine.search(table, "*", "a = 1 AND")));
    assert!(not_found(f.engine.open_table(f.db, "nope")));

    // Unrecognized verbs are accepted and do nothing.
    f.exec_all(&["SELECT * FROM t", "CREATE INDEX idx ON t (a)"]);
    assert_eq!(f.engine.last_error_message(), "");
}

#[test]
fn close_cascades_but_store_survives() {
    let f = fixture();
    f.exec_all(&[
        "CREATE TABLE t (a TEXT)",
        "INSERT INTO t (a) VALUES ('kept')",
    ]);
    let table = f.engine.open_table(f.db, "t").unwrap();
    let cursor = f.engine.search(table, "*", "").unwrap();
    let row = f.engine.create_row(table).unwrap();
    let info = f.engine.get_field_info(table).unwrap();

    f.engine.close(f.db).unwrap();
    f.engine.close(f.db).unwrap();

    assert!(invalid(f.engine.search(table, "*", "")));
    assert!(invalid(f.engine.fetch_row(cursor)));
    assert!(invalid(f.engine.set_string(row, "a", "x")));
    assert!(invalid(f.engine.field_info_count(info)));
    assert!(invalid(f.engine.exec_sql(f.db, "DELETE FROM t")));

    let reopened = f.engine.open(&f.path).unwrap();
    assert_ne!(reopened, f.db);
    let table = f.engine.open_table(reopened, "t").unwrap();
    let cursor = f.engine.search(table, "*", "").unwrap();
    assert_eq!(collect(&f.engine, cursor, &["a"]), vec![vec![s("kept")]]);
}

#[test]
fn two_handles_share_one_store() {
    let f = fixture();
    let second = f.engine.open(&format!("{}/./", f.path)).unwrap();
    f.exec("CREATE TABLE t (a TEXT)");
    let insert = "INSERT INTO t (a) VALUES ('shared')";
    f.engine.exec_sql(second, insert).unwrap();
    assert_eq!(f.search("t", "", &["a"]), vec![vec![s("shared")]]);
}

#[test]
fn open_missing_path_fails() {
    let engine = MemoryBackend::new();
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing.gdb");
    assert!(not_found(engine.open(&missing.to_string_lossy())));
    assert!(invalid(engine.open("")));
    assert_eq!(engine.last_error_message(), "path missing");
}

#[test]
fn create_makes_directory_and_resets_store() {
    let f = fixture();
    assert!(std::path::Path::new(&f.path).is_dir());
    f.exec("CREATE TABLE t (a TEXT)");
    let fresh = f.engine.create(&f.path).unwrap();
    assert!(not_found(f.engine.open_table(fresh, "t")));
    // The earlier handle still sees its own store.
    assert!(f.engine.open_table(f.db, "t").is_ok());
}

#[test]
fn zoning_assignment_is_recorded_once() {
    let f = fixture();
    f.exec("CREATE TABLE Parcels (Name TEXT, Zone TEXT)");
    let (engine, db) = (&f.engine, f.db);
    engine.create_coded_domain(db, "Zoning", "STRING").unwrap();
    engine
        .add_coded_value(db, "Zoning", "R1", Some("Residential"))
        .unwrap();
    engine.add_coded_value(db, "Zoning", "C1", None).unwrap();
    for _ in 0..2 {
        engine
            .assign_domain_to_field(db, "Parcels", "Zone", "Zoning")
            .unwrap();
    }

    let links = f.search(
        "GDB_ItemRelationships",
        "RelationshipType = 'DomainInDataset'",
        &["OriginName", "DestinationName"],
    );
    assert_eq!(links, vec![vec![s("Zoning"), s("Parcels.Zone")]]);

    let items = f.search("GDB_Items", "Name = 'Zoning'", &["Type", "Definition"]);
    assert_eq!(items.len(), 1);
    assert_eq!(items[0][0], s("Coded Value Domain"));
    let definition = items[0][1].clone().unwrap();
    assert!(definition.contains("<CodedValue code=\"C1\" name=\"C1\"/>"));
    assert!(definition.contains("<CodedValue code=\"R1\" name=\"Residential\"/>"));

    let unknown = engine.assign_domain_to_field(db, "Parcels", "Zone", "Unknown");
    assert!(not_found(unknown));
    assert!(invalid(engine.create_coded_domain(db, "Bad", "DATE")));
}

#[test]
fn relationship_creation_is_idempotent() {
    let f = fixture();
    f.create_relationship("Parcels").unwrap();
    f.create_relationship("Parcels").unwrap();
    assert_eq!(f.relationships_text(), "ParcelOwner");

    let err = f.create_relationship("Buildings").unwrap_err();
    assert!(matches!(err, Error::AlreadyExists(_)));
    assert_eq!(
        f.engine.last_error_message(),
        "relationship already exists with different definition"
    );

    let mut renamed = parcel_owner("PARCELS");
    renamed.name = "SameSignature";
    renamed.cardinality = "one_to_many";
    f.engine.create_relationship_class(f.db, &renamed).unwrap();
    assert_eq!(f.relationships_text(), "ParcelOwner");

    let columns = ["OriginName", "DestinationName", "RelationshipType"];
    let links = f.search("GDB_ItemRelationships", "", &columns);
    let link = |origin, destination, kind| vec![s(origin), s(destination), s(kind)];
    assert_eq!(
        links,
        vec![
            link("Parcels", "ParcelOwner", "OriginClassInRelationshipClass"),
            link(
                "Owners",
                "ParcelOwner",
                "DestinationClassInRelationshipClass"
            ),
            link("ParcelOwner", "T_Id", "ClassKey"),
            link("ParcelOwner", "parcel_fk", "DatasetsRelatedThrough"),
        ]
    );
}

#[test]
fn catalog_listing_smoke() {
    let f = fixture();
    f.exec("CREATE TABLE classa (T_Id INTEGER, color VARCHAR)");
    let (engine, db) = (&f.engine, f.db);
    for _ in 0..2 {
        engine
            .create_coded_domain(db, "color_domain", "TEXT")
            .unwrap();
        engine
            .add_coded_value(db, "color_domain", "red", Some("Red"))
            .unwrap();
        engine
            .assign_domain_to_field(db, "classa", "color", "color_domain")
            .unwrap();
        f.create_relationship("classa").unwrap();
    }

    assert_eq!(engine.list_domains_text(db).unwrap(), "color_domain");
    assert_eq!(f.relationships_text(), "ParcelOwner");
    let tables = engine.list_tables_text(db).unwrap();
    let tables: Vec<_> = tables.lines().collect();
    assert!(tables.contains(&"GDB_Items"));
    assert!(tables.contains(&"GDB_ItemRelationships"));
    assert!(tables.contains(&"classa"));
    assert_eq!(f.search("GDB_Items", "", &["Name"]).len(), 2);

    let domains = engine.list_domains(db).unwrap();
    assert_eq!(
        collect(engine, domains, &["name", "fieldType"]),
        vec![vec![s("color_domain"), s("STRING")]]
    );
    let rels = engine.list_relationships(db).unwrap();
    let names = collect(engine, rels, &["name"]);
    assert_eq!(names, vec![vec![s("ParcelOwner")]]);
}

#[test]
fn handles_are_never_reused() {
    let f = fixture();
    f.exec("CREATE TABLE t (a TEXT)");
    let first = f.engine.open_table(f.db, "t").unwrap();
    f.engine.close_table(f.db, first).unwrap();
    let second = f.engine.open_table(f.db, "t").unwrap();
    assert!(second.get() > first.get());
    assert!(invalid(f.engine.create_row(first)));
}

const WORKERS: i32 = 8;
const ROWS_PER_WORKER: i32 = 100;

fn insert_with_sql(f: &Fixture, id: i32, worker: i32) {
    f.exec(&format!("INSERT INTO Parcels (T_Id, Worker) VALUES ({id}, {worker})"));
}

fn insert_with_row(f: &Fixture, table: Handle, id: i32, worker: i32) {
    let row = f.engine.create_row(table).unwrap();
    f.engine.set_int32(row, "T_Id", id).unwrap();
    f.engine.set_int32(row, "Worker", worker).unwrap();
    f.engine.insert(table, row).unwrap();
    f.engine.close_row(row).unwrap();
}

#[test]
fn concurrent_writers_keep_every_row_and_handle() {
    let f = fixture();
    f.exec("CREATE TABLE Parcels (T_Id INTEGER, Worker INTEGER)");
    let table = f.engine.open_table(f.db, "Parcels").unwrap();

    std::thread::scope(|scope| {
        for worker in 0..WORKERS {
            let f = &f;
            scope.spawn(move || {
                for i in 0..ROWS_PER_WORKER {
                    let id = worker * ROWS_PER_WORKER + i;
                    if i % 2 == 0 {
                        insert_with_sql(f, id, worker);
                    } else {
                        insert_with_row(f, table, id, worker);
                    }
                }
            });
        }
    });

    let cursor = f.engine.search(table, "*", "").unwrap();
    let rows = collect(&f.engine, cursor, &["T_Id"]);
    let mut ids: Vec<i32> = rows
        .iter()
        .map(|row| row[0].as_deref().unwrap().parse().unwrap())
        .collect();
    ids.sort_unstable();
    assert_eq!(ids, (0..WORKERS * ROWS_PER_WORKER).collect::<Vec<_>>());

    let third = f.search("Parcels", "Worker = 3", &["T_Id"]);
    assert_eq!(third.len(), ROWS_PER_WORKER as usize);
    assert!(f.engine.list_tables_text(f.db).unwrap().contains("Parcels"));
    f.engine.close_table(f.db, table).unwrap();
}
