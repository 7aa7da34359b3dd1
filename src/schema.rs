use crate::dialect::Dialect;

/// Raw catalog metadata gathered by an introspector, before it is mapped
/// into the named object model.
#[derive(Debug, Clone)]
pub struct IntrospectedSchema {
    pub dialect: Dialect,
    pub server: ServerInfo,
    pub tables: Vec<TableInfo>,
    pub routines: Vec<RoutineInfo>,
}

/// Identity of the server and database the catalog was read from.
#[derive(Debug, Clone, Default)]
pub struct ServerInfo {
    pub server_name: String,
    pub database_name: String,
    pub version: Option<String>,
    pub edition: Option<String>,
    pub level: Option<String>,
}

/// Metadata for a single table or view.
#[derive(Debug, Clone)]
pub struct TableInfo {
    pub schema: String,
    pub name: String,
    pub table_type: TableType,
    pub comment: Option<String>,
    pub columns: Vec<ColumnInfo>,
    pub constraints: Vec<ConstraintInfo>,
    pub indexes: Vec<IndexInfo>,
    pub triggers: Vec<TriggerInfo>,
}

impl TableInfo {
    /// An empty table shell, populated column by column by the introspectors.
    pub fn new(schema: &str, name: &str, table_type: TableType, comment: Option<String>) -> Self {
        TableInfo {
            schema: schema.to_string(),
            name: name.to_string(),
            table_type,
            comment,
            columns: Vec::new(),
            constraints: Vec::new(),
            indexes: Vec::new(),
            triggers: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableType {
    Table,
    View,
}

/// Metadata for a single column.
#[derive(Debug, Clone)]
pub struct ColumnInfo {
    pub name: String,
    pub ordinal_position: i32,
    pub is_nullable: bool,
    pub udt_name: String,
    pub character_maximum_length: Option<i32>,
    pub numeric_precision: Option<i32>,
    pub numeric_scale: Option<i32>,
    pub column_default: Option<String>,
    pub is_identity: bool,
    pub identity: Option<IdentityInfo>,
    pub is_computed: bool,
    pub comment: Option<String>,
    pub collation: Option<String>,
}

/// Seed and increment of an identity column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityInfo {
    pub start: i64,
    pub increment: i64,
}

/// Metadata for a constraint (PK, FK, Unique).
#[derive(Debug, Clone)]
pub struct ConstraintInfo {
    pub name: String,
    pub constraint_type: ConstraintType,
    pub columns: Vec<String>,
    /// For foreign keys: the referenced schema, table, and columns.
    pub foreign_key: Option<ForeignKeyInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstraintType {
    PrimaryKey,
    ForeignKey,
    Unique,
}

#[derive(Debug, Clone)]
pub struct ForeignKeyInfo {
    pub ref_schema: String,
    pub ref_table: String,
    pub ref_columns: Vec<String>,
    pub update_rule: String,
    pub delete_rule: String,
}

/// Metadata for a database index.
#[derive(Debug, Clone)]
pub struct IndexInfo {
    pub name: String,
    pub is_unique: bool,
    pub columns: Vec<String>,
}

/// Metadata for a trigger attached to a table or view.
#[derive(Debug, Clone)]
pub struct TriggerInfo {
    pub name: String,
    /// `BEFORE`, `AFTER` or `INSTEAD OF`.
    pub timing: String,
    /// `INSERT`, `UPDATE`, `DELETE` in catalog order.
    pub events: Vec<String>,
    pub is_disabled: bool,
}

/// A stored procedure or function.
#[derive(Debug, Clone)]
pub struct RoutineInfo {
    pub schema: String,
    pub name: String,
    pub routine_type: RoutineType,
    pub return_type: Option<String>,
    pub parameters: Vec<ParameterInfo>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutineType {
    Procedure,
    Function,
}

impl RoutineType {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PROCEDURE" => Some(RoutineType::Procedure),
            "FUNCTION" => Some(RoutineType::Function),
            _ => None,
        }
    }
}

/// A routine parameter.
#[derive(Debug, Clone)]
pub struct ParameterInfo {
    /// Unnamed parameters (allowed in PostgreSQL) have no name.
    pub name: Option<String>,
    pub ordinal_position: i32,
    pub mode: ParameterMode,
    pub udt_name: String,
    pub character_maximum_length: Option<i32>,
    pub numeric_precision: Option<i32>,
    pub numeric_scale: Option<i32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterMode {
    In,
    Out,
    InOut,
    Return,
}

impl ParameterMode {
    /// Parse an information_schema `PARAMETER_MODE` value. Missing modes are `IN`.
    pub fn parse(s: Option<&str>) -> Self {
        match s.map(|m| m.trim().to_ascii_uppercase()).as_deref() {
            Some("OUT") => ParameterMode::Out,
            Some("INOUT") => ParameterMode::InOut,
            _ => ParameterMode::In,
        }
    }
}
