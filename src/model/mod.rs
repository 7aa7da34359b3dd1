//! The named object model handed to templates.
//!
//! Every entity carries its catalog name plus a [`NameVariants`] block so
//! templates never have to re-case identifiers themselves. The graph is
//! deliberately denormalised: keys repeat column names, foreign keys repeat
//! the target table's name variants, and tables list the keys that
//! reference them.

mod build;
mod defaults;

pub use build::build_server;

use serde::Serialize;

use crate::dialect::Dialect;
use crate::naming::NameVariants;
use crate::typemap::DbType;

#[derive(Debug, Clone, Serialize)]
pub struct Server {
    pub server_name: String,
    pub names: NameVariants,
    pub dialect: Dialect,
    pub server_version: Option<String>,
    pub server_edition: Option<String>,
    pub server_level: Option<String>,
    pub databases: Vec<Database>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Database {
    pub database_name: String,
    pub names: NameVariants,
    pub schemas: Vec<Schema>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Schema {
    pub schema_name: String,
    pub names: NameVariants,
    /// Whether this is the dialect's default schema (`public`, `dbo`, `main`).
    pub is_default: bool,
    pub tables: Vec<Table>,
    pub views: Vec<View>,
    pub procedures: Vec<Procedure>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Table {
    pub table_name: String,
    pub names: NameVariants,
    pub comment: Option<String>,
    pub columns: Vec<Column>,
    pub primary_key: Option<PrimaryKey>,
    pub foreign_keys: Vec<ForeignKey>,
    /// Foreign keys on other tables that reference this one.
    pub child_keys: Vec<ChildKey>,
    pub unique_keys: Vec<UniqueKey>,
    pub indexes: Vec<Index>,
    pub triggers: Vec<Trigger>,
    pub has_primary_key: bool,
    pub has_identity_column: bool,
    pub has_single_column_primary_key: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct View {
    pub view_name: String,
    pub names: NameVariants,
    pub comment: Option<String>,
    pub columns: Vec<Column>,
    pub triggers: Vec<Trigger>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Column {
    pub column_ordinal: i32,
    pub column_name: String,
    pub names: NameVariants,
    pub is_nullable: bool,
    pub sql_type: String,
    pub size: Option<i32>,
    pub precision: Option<i32>,
    pub scale: Option<i32>,
    /// The default exactly as the catalog reports it.
    pub default_value: Option<String>,
    /// The default with dialect noise (casts, wrapping parentheses) removed.
    pub default_expression: Option<String>,
    pub is_identity: bool,
    pub identity_seed: Option<i64>,
    pub identity_increment: Option<i64>,
    pub is_computed: bool,
    pub is_primary_key: bool,
    /// 1-based position within the primary key.
    pub primary_key_ordinal: Option<usize>,
    pub is_foreign_key: bool,
    /// Covered by a single-column unique constraint.
    pub is_unique: bool,
    pub comment: Option<String>,
    pub collation: Option<String>,
    pub db_type: DbType,
    pub client_type: String,
    pub client_nullable_type: String,
    pub effective_client_type: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutineKind {
    Procedure,
    Function,
}

#[derive(Debug, Clone, Serialize)]
pub struct Procedure {
    pub procedure_name: String,
    pub names: NameVariants,
    pub routine_type: RoutineKind,
    pub return_type: Option<String>,
    pub parameters: Vec<Parameter>,
    pub has_output_parameters: bool,
    pub has_return_value: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterDirection {
    Input,
    Output,
    InputOutput,
    ReturnValue,
}

#[derive(Debug, Clone, Serialize)]
pub struct Parameter {
    pub parameter_ordinal: i32,
    pub parameter_name: String,
    /// The name without a leading `@`.
    pub parameter_name_bare: String,
    pub names: NameVariants,
    pub direction: ParameterDirection,
    pub sql_type: String,
    pub size: Option<i32>,
    pub precision: Option<i32>,
    pub scale: Option<i32>,
    pub db_type: DbType,
    pub client_type: String,
    pub client_nullable_type: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct KeyColumn {
    pub column_name: String,
    pub names: NameVariants,
    /// 1-based position within the key.
    pub key_ordinal: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct PrimaryKey {
    pub constraint_name: String,
    pub names: NameVariants,
    pub columns: Vec<KeyColumn>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ForeignKeyColumn {
    pub column_name: String,
    pub target_column_name: String,
    pub names: NameVariants,
    pub target_names: NameVariants,
    pub key_ordinal: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ForeignKey {
    pub constraint_name: String,
    pub names: NameVariants,
    pub target_schema_name: String,
    pub target_table_name: String,
    pub target_names: NameVariants,
    pub columns: Vec<ForeignKeyColumn>,
    pub on_update: String,
    pub on_delete: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChildKey {
    pub constraint_name: String,
    pub names: NameVariants,
    pub source_schema_name: String,
    pub source_table_name: String,
    pub source_names: NameVariants,
    pub columns: Vec<ForeignKeyColumn>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UniqueKey {
    pub constraint_name: String,
    pub names: NameVariants,
    pub columns: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Index {
    pub index_name: String,
    pub names: NameVariants,
    pub is_unique: bool,
    pub columns: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Trigger {
    pub trigger_name: String,
    pub names: NameVariants,
    pub timing: String,
    pub events: Vec<String>,
    pub is_disabled: bool,
}
