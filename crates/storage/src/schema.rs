//! Catalog tables: queryable views of domain and relationship state.
//!
//! `GDB_Items` holds one row per coded-value domain and per relationship
//! class, each with an XML definition. `GDB_ItemRelationships` links
//! domains to the fields they are assigned to and relationship classes to
//! their tables and key columns. Both are regenerated in full from the
//! store's state; nothing is diffed.

use tracing::debug;

use crate::catalog::{DbState, Domain, Relationship};
use crate::row::Row;
use crate::table::Table;
use crate::value::Value;

pub const ITEMS_TABLE: &str = "GDB_Items";
pub const ITEM_RELATIONSHIPS_TABLE: &str = "GDB_ItemRelationships";

pub const CODED_DOMAIN_TYPE_UUID: &str = "{8C5E4548-F3D3-11D4-9F42-00C04F6BC6A5}";
pub const RELATIONSHIP_CLASS_TYPE_UUID: &str = "{725BADAB-3452-491B-A795-55F32D67229C}";

pub const CODED_DOMAIN_TYPE: &str = "Coded Value Domain";
pub const RELATIONSHIP_CLASS_TYPE: &str = "Relationship Class";

/// Relationship-role labels used in `GDB_ItemRelationships`.
pub mod roles {
    pub const DOMAIN_IN_DATASET: &str = "DomainInDataset";
    pub const ORIGIN_CLASS: &str = "OriginClassInRelationshipClass";
    pub const DESTINATION_CLASS: &str = "DestinationClassInRelationshipClass";
    pub const CLASS_KEY: &str = "ClassKey";
    pub const DATASETS_RELATED_THROUGH: &str = "DatasetsRelatedThrough";
}

const ITEM_COLUMNS: [&str; 4] = ["Name", "ItemTypeUUID", "Type", "Definition"];
const ITEM_RELATIONSHIP_COLUMNS: [&str; 3] = ["OriginName", "DestinationName", "RelationshipType"];

/// Regenerate both catalog tables from the store's domains, relationships
/// and assignments.
pub fn rebuild_catalog(db: &mut DbState) {
    let mut items = Table::new(ITEMS_TABLE, column_names(&ITEM_COLUMNS));
    for domain in db.domains() {
        items.insert(item_row(
            &domain.name,
            CODED_DOMAIN_TYPE_UUID,
            CODED_DOMAIN_TYPE,
            domain_definition(domain),
        ));
    }
    for rel in db.relationships() {
        items.insert(item_row(
            &rel.name,
            RELATIONSHIP_CLASS_TYPE_UUID,
            RELATIONSHIP_CLASS_TYPE,
            relationship_definition(rel),
        ));
    }

    let mut links = Table::new(
        ITEM_RELATIONSHIPS_TABLE,
        column_names(&ITEM_RELATIONSHIP_COLUMNS),
    );
    for a in db.assignments() {
        let destination = format!("{}.{}", a.table, a.column);
        links.insert(link_row(&a.domain, &destination, roles::DOMAIN_IN_DATASET));
    }
    for rel in db.relationships() {
        links.insert(link_row(&rel.origin_table, &rel.name, roles::ORIGIN_CLASS));
        links.insert(link_row(&rel.destination_table, &rel.name, roles::DESTINATION_CLASS));
        links.insert(link_row(&rel.name, &rel.origin_pk, roles::CLASS_KEY));
        links.insert(link_row(&rel.name, &rel.origin_fk, roles::DATASETS_RELATED_THROUGH));
    }

    debug!(
        path = %db.root_path().display(),
        items = items.row_count(),
        item_relationships = links.row_count(),
        "rebuilt catalog tables"
    );
    db.replace_table(items);
    db.replace_table(links);
}

fn column_names(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| name.to_string()).collect()
}

fn item_row(name: &str, type_uuid: &str, type_name: &str, definition: String) -> Row {
    [
        ("Name", Value::from(name)),
        ("ItemTypeUUID", Value::from(type_uuid)),
        ("Type", Value::from(type_name)),
        ("Definition", Value::String(definition)),
    ]
    .into_iter()
    .collect()
}

fn link_row(origin: &str, destination: &str, role: &str) -> Row {
    [
        ("OriginName", Value::from(origin)),
        ("DestinationName", Value::from(destination)),
        ("RelationshipType", Value::from(role)),
    ]
    .into_iter()
    .collect()
}

pub fn domain_definition(domain: &Domain) -> String {
    let mut out = format!(
        "<CodedValueDomain name=\"{}\" fieldType=\"{}\">",
        xml_escape(&domain.name),
        domain.field_type.as_str()
    );
    for (code, label) in &domain.coded_values {
        out.push_str(&format!(
            "<CodedValue code=\"{}\" name=\"{}\"/>",
            xml_escape(code),
            xml_escape(label)
        ));
    }
    out.push_str("</CodedValueDomain>");
    out
}

pub fn relationship_definition(rel: &Relationship) -> String {
    format!(
        "<RelationshipClass name=\"{}\" origin=\"{}\" destination=\"{}\" \
         originPK=\"{}\" originFK=\"{}\" forwardLabel=\"{}\" backwardLabel=\"{}\" \
         cardinality=\"{}\" composite=\"{}\" attributed=\"{}\"/>",
        xml_escape(&rel.name),
        xml_escape(&rel.origin_table),
        xml_escape(&rel.destination_table),
        xml_escape(&rel.origin_pk),
        xml_escape(&rel.origin_fk),
        xml_escape(&rel.forward_label),
        xml_escape(&rel.backward_label),
        rel.cardinality.as_str(),
        rel.composite,
        rel.attributed,
    )
}

fn xml_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}
