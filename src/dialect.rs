use serde::Serialize;

/// Supported database backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    Postgres,
    Mssql,
    Sqlite,
}

impl Dialect {
    /// Return the default schema name for this dialect.
    pub fn default_schema(&self) -> &'static str {
        match self {
            Dialect::Postgres => "public",
            Dialect::Mssql => "dbo",
            Dialect::Sqlite => "main",
        }
    }
}
