//! Catalog store: the in-memory state of one logical database.
//!
//! Holds user tables, coded-value domains, relationship classes and
//! domain-to-field assignments. Every change to domain, relationship or
//! assignment state regenerates the two synthetic catalog tables
//! (see [`crate::schema`]).

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Error, Result};
use crate::schema;
use crate::table::Table;

/// Symbolic field type of a coded-value domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    String,
    Integer,
    Double,
    Blob,
}

impl FieldType {
    /// Case-insensitive. Empty text means `String`.
    pub fn parse(text: &str) -> Result<Self> {
        match text.trim().to_ascii_uppercase().as_str() {
            "" | "STRING" | "TEXT" => Ok(FieldType::String),
            "INTEGER" | "INT" | "INT32" => Ok(FieldType::Integer),
            "DOUBLE" | "FLOAT" | "REAL" => Ok(FieldType::Double),
            "BLOB" | "BINARY" => Ok(FieldType::Blob),
            other => Err(Error::invalid(format!("unsupported domain field type '{other}'"))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FieldType::String => "STRING",
            FieldType::Integer => "INTEGER",
            FieldType::Double => "DOUBLE",
            FieldType::Blob => "BLOB",
        }
    }
}

/// A coded-value domain: an enumeration of codes with display labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Domain {
    pub name: String,
    pub field_type: FieldType,
    pub coded_values: BTreeMap<String, String>,
}

impl Domain {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            coded_values: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Cardinality {
    OneToOne,
    #[default]
    OneToMany,
    ManyToOne,
    ManyToMany,
}

impl Cardinality {
    /// Lenient: anything unrecognized is one-to-many.
    pub fn parse(text: &str) -> Self {
        match text.trim().to_ascii_lowercase().as_str() {
            "1:1" | "one_to_one" | "one-to-one" => Cardinality::OneToOne,
            "n:1" | "many_to_one" | "many-to-one" => Cardinality::ManyToOne,
            "m:n" | "n:n" | "many_to_many" | "many-to-many" => Cardinality::ManyToMany,
            _ => Cardinality::OneToMany,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Cardinality::OneToOne => "1:1",
            Cardinality::OneToMany => "1:n",
            Cardinality::ManyToOne => "n:1",
            Cardinality::ManyToMany => "m:n",
        }
    }
}

/// A named association between an origin and a destination table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    pub name: String,
    pub origin_table: String,
    pub destination_table: String,
    pub origin_pk: String,
    pub origin_fk: String,
    pub forward_label: String,
    pub backward_label: String,
    pub cardinality: Cardinality,
    pub composite: bool,
    pub attributed: bool,
}

impl Relationship {
    /// Everything except the name and labels must match; table and key
    /// names compare case-insensitively.
    pub fn same_signature(&self, other: &Relationship) -> bool {
        let same = |a: &str, b: &str| a.eq_ignore_ascii_case(b);
        same(&self.origin_table, &other.origin_table)
            && same(&self.destination_table, &other.destination_table)
            && same(&self.origin_pk, &other.origin_pk)
            && same(&self.origin_fk, &other.origin_fk)
            && self.cardinality == other.cardinality
            && self.composite == other.composite
            && self.attributed == other.attributed
    }

    fn validate(&self) -> Result<()> {
        let required = [
            &self.name,
            &self.origin_table,
            &self.destination_table,
            &self.origin_pk,
            &self.origin_fk,
        ];
        if required.iter().any(|s| s.is_empty()) {
            return Err(Error::invalid("relationship input incomplete"));
        }
        Ok(())
    }
}

/// A `(domain, table, column)` triple.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DomainAssignment {
    pub domain: String,
    pub table: String,
    pub column: String,
}

#[derive(Debug, Clone)]
pub struct DbState {
    root_path: PathBuf,
    tables: BTreeMap<String, Table>,
    domains: BTreeMap<String, Domain>,
    relationships: BTreeMap<String, Relationship>,
    assignments: BTreeSet<DomainAssignment>,
}

impl DbState {
    /// An empty store. The catalog tables exist from the start.
    pub fn new(root_path: impl Into<PathBuf>) -> Self {
        let mut db = Self {
            root_path: root_path.into(),
            tables: BTreeMap::new(),
            domains: BTreeMap::new(),
            relationships: BTreeMap::new(),
            assignments: BTreeSet::new(),
        };
        schema::rebuild_catalog(&mut db);
        db
    }

    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    // ── Tables ──────────────────────────────────────────────────────────

    /// Stored spelling of a table name: exact match first, then
    /// case-insensitive.
    pub fn resolve_table_name(&self, name: &str) -> Option<&str> {
        if let Some((key, _)) = self.tables.get_key_value(name) {
            return Some(key);
        }
        self.tables
            .keys()
            .find(|k| k.eq_ignore_ascii_case(name))
            .map(String::as_str)
    }

    pub fn table(&self, name: &str) -> Option<&Table> {
        let key = self.resolve_table_name(name)?;
        self.tables.get(key)
    }

    pub fn table_mut(&mut self, name: &str) -> Option<&mut Table> {
        let key = self.resolve_table_name(name)?.to_string();
        self.tables.get_mut(&key)
    }

    /// Returns false, leaving the store untouched, when a table with that
    /// name already exists.
    pub fn create_table(&mut self, name: &str, columns: Vec<String>) -> bool {
        if self.resolve_table_name(name).is_some() {
            return false;
        }
        let table = Table::new(name, columns);
        self.tables.insert(name.to_string(), table);
        true
    }

    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    pub(crate) fn replace_table(&mut self, table: Table) {
        self.tables.insert(table.name.clone(), table);
    }

    // ── Domains ─────────────────────────────────────────────────────────

    pub fn domains(&self) -> impl Iterator<Item = &Domain> {
        self.domains.values()
    }

    pub fn domain(&self, name: &str) -> Option<&Domain> {
        self.domains.get(name)
    }

    /// Creates the domain, or retypes an existing one when `field_type`
    /// is non-empty and differs. Returns whether anything changed.
    pub fn create_coded_domain(&mut self, name: &str, field_type: &str) -> Result<bool> {
        if name.is_empty() {
            return Err(Error::invalid("domain name missing"));
        }
        let parsed = FieldType::parse(field_type)?;
        if let Some(existing) = self.domains.get_mut(name) {
            if field_type.trim().is_empty() || existing.field_type == parsed {
                return Ok(false);
            }
            existing.field_type = parsed;
        } else {
            let domain = Domain::new(name, parsed);
            self.domains.insert(name.to_string(), domain);
        }
        self.rebuild_catalog();
        Ok(true)
    }

    /// A missing label defaults to the code itself. Existing codes are
    /// overwritten.
    pub fn add_coded_value(&mut self, domain: &str, code: &str, label: Option<&str>) -> Result<()> {
        if domain.is_empty() {
            return Err(Error::invalid("domain/code missing"));
        }
        let entry = self
            .domains
            .get_mut(domain)
            .ok_or_else(|| Error::not_found("domain does not exist"))?;
        entry
            .coded_values
            .insert(code.to_string(), label.unwrap_or(code).to_string());
        self.rebuild_catalog();
        Ok(())
    }

    // ── Assignments ─────────────────────────────────────────────────────

    pub fn assignments(&self) -> impl Iterator<Item = &DomainAssignment> {
        self.assignments.iter()
    }

    /// Idempotent. Returns whether the triple was new.
    pub fn assign_domain_to_field(
        &mut self,
        table: &str,
        column: &str,
        domain: &str,
    ) -> Result<bool> {
        if table.is_empty() || column.is_empty() || domain.is_empty() {
            return Err(Error::invalid("table/column/domain missing"));
        }
        if !self.domains.contains_key(domain) {
            return Err(Error::not_found("domain does not exist"));
        }
        let inserted = self.assignments.insert(DomainAssignment {
            domain: domain.to_string(),
            table: table.to_string(),
            column: column.to_string(),
        });
        if inserted {
            self.rebuild_catalog();
        }
        Ok(inserted)
    }

    // ── Relationships ───────────────────────────────────────────────────

    pub fn relationships(&self) -> impl Iterator<Item = &Relationship> {
        self.relationships.values()
    }

    pub fn relationship(&self, name: &str) -> Option<&Relationship> {
        self.relationships.get(name)
    }

    /// Stores the relationship unless an equal signature already exists
    /// under any name. Reusing a name with a different signature is
    /// `AlreadyExists`. Returns whether it was stored.
    pub fn create_relationship_class(&mut self, rel: Relationship) -> Result<bool> {
        rel.validate()?;
        if let Some(existing) = self.relationships.get(&rel.name) {
            if existing.same_signature(&rel) {
                return Ok(false);
            }
            return Err(Error::AlreadyExists(
                "relationship already exists with different definition".to_string(),
            ));
        }
        if let Some(existing) = self.relationships.values().find(|r| r.same_signature(&rel)) {
            debug!(
                requested = %rel.name,
                existing = %existing.name,
                "relationship signature already present"
            );
            return Ok(false);
        }
        self.relationships.insert(rel.name.clone(), rel);
        self.rebuild_catalog();
        Ok(true)
    }

    fn rebuild_catalog(&mut self) {
        schema::rebuild_catalog(self);
    }
}
