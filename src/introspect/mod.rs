//! Catalog readers, one per dialect.
//!
//! Each reader walks servers → schemas → tables → columns/keys/indexes/
//! triggers, then routines → parameters, issuing one parameterised query
//! per object, and returns the raw [`IntrospectedSchema`](crate::schema::IntrospectedSchema).
//! Rows that arrive one-per-column are grouped here so every dialect builds
//! constraints the same way.

pub mod mssql;
pub mod pg;
pub mod sqlite;

use std::collections::BTreeMap;

use crate::schema::{ConstraintInfo, ConstraintType, ForeignKeyInfo, TableInfo, TriggerInfo};

/// What to read from the catalog.
#[derive(Debug, Default, Clone)]
pub struct IntrospectOptions {
    pub schemas: Vec<String>,
    /// Empty means every table.
    pub tables: Vec<String>,
    pub noviews: bool,
    pub noprocedures: bool,
}

impl IntrospectOptions {
    /// Apply the table filter, if any.
    pub fn retain_tables(&self, tables: &mut Vec<TableInfo>) {
        if !self.tables.is_empty() {
            tables.retain(|t| self.tables.contains(&t.name));
        }
    }
}

/// One catalog row of a primary key or unique constraint.
pub(crate) struct KeyRow {
    pub constraint_name: String,
    pub constraint_type: ConstraintType,
    pub column_name: String,
}

/// Group key rows (already in key-ordinal order) by constraint name.
pub(crate) fn group_keys(rows: impl IntoIterator<Item = KeyRow>) -> Vec<ConstraintInfo> {
    let mut map: BTreeMap<String, ConstraintInfo> = BTreeMap::new();
    for row in rows {
        map.entry(row.constraint_name.clone())
            .or_insert_with(|| ConstraintInfo {
                name: row.constraint_name,
                constraint_type: row.constraint_type,
                columns: Vec::new(),
                foreign_key: None,
            })
            .columns
            .push(row.column_name);
    }
    map.into_values().collect()
}

/// One catalog row of a foreign key column pair.
pub(crate) struct ForeignKeyRow {
    pub constraint_name: String,
    pub column_name: String,
    pub ref_schema: String,
    pub ref_table: String,
    pub ref_column: String,
    pub update_rule: String,
    pub delete_rule: String,
}

/// Group foreign key rows by constraint name.
///
/// Each row is one local/referenced column pair, in key order. Readers must
/// produce pairs, not a cross product, since the pairs are kept as given.
pub(crate) fn group_foreign_keys(rows: impl IntoIterator<Item = ForeignKeyRow>) -> Vec<ConstraintInfo> {
    let mut map: BTreeMap<String, ConstraintInfo> = BTreeMap::new();
    for row in rows {
        let entry = map
            .entry(row.constraint_name.clone())
            .or_insert_with(|| ConstraintInfo {
                name: row.constraint_name,
                constraint_type: ConstraintType::ForeignKey,
                columns: Vec::new(),
                foreign_key: Some(ForeignKeyInfo {
                    ref_schema: row.ref_schema,
                    ref_table: row.ref_table,
                    ref_columns: Vec::new(),
                    update_rule: normalize_rule(&row.update_rule),
                    delete_rule: normalize_rule(&row.delete_rule),
                }),
            });
        entry.columns.push(row.column_name);
        if let Some(fk) = entry.foreign_key.as_mut() {
            fk.ref_columns.push(row.ref_column);
        }
    }
    map.into_values().collect()
}

/// MSSQL uses underscores in action names: NO_ACTION -> NO ACTION
fn normalize_rule(rule: &str) -> String {
    rule.replace('_', " ").to_ascii_uppercase()
}

/// One catalog row of a trigger event.
pub(crate) struct TriggerRow {
    pub trigger_name: String,
    pub timing: String,
    pub event: String,
    pub is_disabled: bool,
}

/// Group trigger rows (one per event) by trigger name.
pub(crate) fn group_triggers(rows: impl IntoIterator<Item = TriggerRow>) -> Vec<TriggerInfo> {
    let mut map: BTreeMap<String, TriggerInfo> = BTreeMap::new();
    for row in rows {
        let entry = map
            .entry(row.trigger_name.clone())
            .or_insert_with(|| TriggerInfo {
                name: row.trigger_name,
                timing: row.timing.replace('_', " ").to_ascii_uppercase(),
                events: Vec::new(),
                is_disabled: row.is_disabled,
            });
        let event = row.event.to_ascii_uppercase();
        if !entry.events.contains(&event) {
            entry.events.push(event);
        }
    }
    map.into_values().collect()
}
