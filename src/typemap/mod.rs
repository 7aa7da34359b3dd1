pub mod mssql;
pub mod pg;
pub mod sqlite;

use serde::Serialize;

use crate::dialect::Dialect;

/// Portable classification of a catalog type, independent of dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DbType {
    AnsiString,
    AnsiStringFixedLength,
    String,
    StringFixedLength,
    Binary,
    Boolean,
    Byte,
    Int16,
    Int32,
    Int64,
    Single,
    Double,
    Decimal,
    Currency,
    Date,
    Time,
    DateTime,
    DateTimeOffset,
    Guid,
    Xml,
    Json,
    Object,
}

/// The result of mapping a database type to its portable and client representations.
#[derive(Debug, Clone, PartialEq)]
pub struct MappedType {
    pub db_type: DbType,
    /// The Rust type a client would decode a non-null value into (e.g. "i32", "String").
    pub client_type: String,
}

impl MappedType {
    /// The client type for a value that may be NULL.
    pub fn nullable_client_type(&self) -> String {
        format!("Option<{}>", self.client_type)
    }
}

/// Map a catalog type name to its representations, dispatching by dialect.
pub fn map_sql_type(sql_type: &str, dialect: Dialect) -> MappedType {
    match dialect {
        Dialect::Postgres => pg::map_sql_type(sql_type),
        Dialect::Mssql => mssql::map_sql_type(sql_type),
        Dialect::Sqlite => sqlite::map_sql_type(sql_type),
    }
}

/// Helper to create a MappedType.
pub fn simple(db_type: DbType, client_type: &str) -> MappedType {
    MappedType {
        db_type,
        client_type: client_type.to_string(),
    }
}

/// Fallback for catalog types no dialect table knows about.
pub fn unknown() -> MappedType {
    simple(DbType::Object, "String")
}
