mod columns;
mod constraints;
mod indexes;
mod routines;
mod tables;
mod triggers;

use sqlx::PgPool;

use crate::dialect::Dialect;
use crate::error::TextMetalError;
use crate::schema::{IntrospectedSchema, ServerInfo};

use super::IntrospectOptions;

/// Introspect a PostgreSQL database and return the full schema metadata.
pub async fn introspect(
    pool: &PgPool,
    server_name: &str,
    options: &IntrospectOptions,
) -> Result<IntrospectedSchema, TextMetalError> {
    let server = query_server(pool, server_name).await?;
    let mut all_tables = Vec::new();
    let mut all_routines = Vec::new();

    for schema in &options.schemas {
        let mut schema_tables = tables::query_tables(pool, schema, options.noviews).await?;
        options.retain_tables(&mut schema_tables);

        // Populate columns, constraints, indexes and triggers for each table
        for table in &mut schema_tables {
            tracing::debug!("Reading {}.{}", table.schema, table.name);
            table.columns = columns::query_columns(pool, &table.schema, &table.name).await?;
            table.constraints =
                constraints::query_constraints(pool, &table.schema, &table.name).await?;
            table.indexes = indexes::query_indexes(pool, &table.schema, &table.name).await?;
            table.triggers = triggers::query_triggers(pool, &table.schema, &table.name).await?;
        }
        all_tables.extend(schema_tables);

        if !options.noprocedures {
            all_routines.extend(routines::query_routines(pool, schema).await?);
        }
    }

    Ok(IntrospectedSchema {
        dialect: Dialect::Postgres,
        server,
        tables: all_tables,
        routines: all_routines,
    })
}

async fn query_server(pool: &PgPool, server_name: &str) -> Result<ServerInfo, TextMetalError> {
    let row = sqlx::query_as::<_, ServerRow>(
        r#"
        SELECT current_database()::text AS database_name,
               current_setting('server_version') AS version
        "#,
    )
    .fetch_one(pool)
    .await?;

    Ok(ServerInfo {
        server_name: server_name.to_string(),
        database_name: row.database_name,
        version: Some(row.version),
        edition: Some("PostgreSQL".to_string()),
        level: None,
    })
}

#[derive(sqlx::FromRow)]
struct ServerRow {
    database_name: String,
    version: String,
}
