mod columns;
mod keys;
mod tables;
mod triggers;

use sqlx::SqlitePool;

use crate::dialect::Dialect;
use crate::error::TextMetalError;
use crate::schema::{IntrospectedSchema, ServerInfo};

use super::IntrospectOptions;

/// Introspect a SQLite database and return the full schema metadata.
///
/// Only the `main` schema is read. SQLite has no stored routines, so
/// `routines` is always empty.
pub async fn introspect(
    pool: &SqlitePool,
    database_name: &str,
    options: &IntrospectOptions,
) -> Result<IntrospectedSchema, TextMetalError> {
    let version: String = sqlx::query_scalar("SELECT sqlite_version()")
        .fetch_one(pool)
        .await?;

    let mut all_tables = Vec::new();
    for schema in &options.schemas {
        if schema != Dialect::Sqlite.default_schema() {
            tracing::warn!("SQLite introspection reads only the main schema; skipping {schema}");
            continue;
        }

        let mut schema_tables = tables::query_tables(pool, options.noviews).await?;
        options.retain_tables(&mut schema_tables);

        for table in &mut schema_tables {
            tracing::debug!("Reading {}", table.name);
            table.columns = columns::query_columns(pool, &table.name).await?;
            table.constraints = keys::query_constraints(pool, &table.name).await?;
            table.indexes = keys::query_indexes(pool, &table.name).await?;
            table.triggers = triggers::query_triggers(pool, &table.name).await?;
        }
        all_tables.extend(schema_tables);
    }

    Ok(IntrospectedSchema {
        dialect: Dialect::Sqlite,
        server: ServerInfo {
            server_name: "sqlite".to_string(),
            database_name: database_name.to_string(),
            version: Some(version),
            edition: None,
            level: None,
        },
        tables: all_tables,
        routines: Vec::new(),
    })
}
