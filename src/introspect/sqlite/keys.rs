use sqlx::SqlitePool;

use crate::error::TextMetalError;
use crate::introspect::{group_foreign_keys, group_keys, ForeignKeyRow, KeyRow};
use crate::schema::{ConstraintInfo, ConstraintType, IndexInfo};

/// Primary key, unique and foreign key constraints of one table.
///
/// SQLite does not name primary or foreign keys, so those get synthetic
/// names (`pk_<table>`, `fk_<table>_<id>`). Unique constraints keep the
/// name of their backing autoindex.
pub async fn query_constraints(
    pool: &SqlitePool,
    table_name: &str,
) -> Result<Vec<ConstraintInfo>, TextMetalError> {
    let mut key_rows: Vec<KeyRow> = primary_key_columns(pool, table_name)
        .await?
        .into_iter()
        .map(|column_name| KeyRow {
            constraint_name: format!("pk_{table_name}"),
            constraint_type: ConstraintType::PrimaryKey,
            column_name,
        })
        .collect();

    for index in index_list(pool, table_name).await? {
        if index.origin != "u" {
            continue;
        }
        for column_name in index_columns(pool, &index.name).await? {
            key_rows.push(KeyRow {
                constraint_name: index.name.clone(),
                constraint_type: ConstraintType::Unique,
                column_name,
            });
        }
    }

    let mut constraints = group_keys(key_rows);
    constraints.extend(query_foreign_keys(pool, table_name).await?);
    Ok(constraints)
}

/// Indexes created with CREATE INDEX. Indexes backing primary key and
/// unique constraints are reported as constraints instead.
pub async fn query_indexes(
    pool: &SqlitePool,
    table_name: &str,
) -> Result<Vec<IndexInfo>, TextMetalError> {
    let mut indexes = Vec::new();
    for index in index_list(pool, table_name).await? {
        if index.origin != "c" {
            continue;
        }
        let columns = index_columns(pool, &index.name).await?;
        indexes.push(IndexInfo {
            name: index.name,
            is_unique: index.is_unique != 0,
            columns,
        });
    }
    Ok(indexes)
}

async fn query_foreign_keys(
    pool: &SqlitePool,
    table_name: &str,
) -> Result<Vec<ConstraintInfo>, TextMetalError> {
    let rows = sqlx::query_as::<_, ForeignKeyListRow>(
        r#"
        SELECT id, seq, "table" AS ref_table, "from" AS column_name, "to" AS ref_column,
               on_update, on_delete
        FROM pragma_foreign_key_list(?)
        ORDER BY id, seq
        "#,
    )
    .bind(table_name)
    .fetch_all(pool)
    .await?;

    let mut fk_rows = Vec::with_capacity(rows.len());
    for row in rows {
        // REFERENCES parent without a column list targets the parent's primary key
        let ref_column = match row.ref_column {
            Some(column) => column,
            None => primary_key_columns(pool, &row.ref_table)
                .await?
                .into_iter()
                .nth(row.seq as usize)
                .ok_or_else(|| {
                    TextMetalError::Source(format!(
                        "foreign key {} on {table_name} references {} which has no matching primary key column",
                        row.id, row.ref_table
                    ))
                })?,
        };
        fk_rows.push(ForeignKeyRow {
            constraint_name: format!("fk_{table_name}_{}", row.id),
            column_name: row.column_name,
            ref_schema: "main".to_string(),
            ref_table: row.ref_table,
            ref_column,
            update_rule: row.on_update,
            delete_rule: row.on_delete,
        });
    }

    Ok(group_foreign_keys(fk_rows))
}

async fn primary_key_columns(
    pool: &SqlitePool,
    table_name: &str,
) -> Result<Vec<String>, TextMetalError> {
    let columns = sqlx::query_scalar::<_, String>(
        "SELECT name FROM pragma_table_info(?) WHERE pk > 0 ORDER BY pk",
    )
    .bind(table_name)
    .fetch_all(pool)
    .await?;
    Ok(columns)
}

async fn index_list(
    pool: &SqlitePool,
    table_name: &str,
) -> Result<Vec<IndexListRow>, TextMetalError> {
    let rows = sqlx::query_as::<_, IndexListRow>(
        r#"SELECT name, "unique" AS is_unique, origin FROM pragma_index_list(?) ORDER BY name"#,
    )
    .bind(table_name)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

async fn index_columns(pool: &SqlitePool, index_name: &str) -> Result<Vec<String>, TextMetalError> {
    // Expression index entries have no column name
    let names = sqlx::query_scalar::<_, Option<String>>(
        "SELECT name FROM pragma_index_info(?) ORDER BY seqno",
    )
    .bind(index_name)
    .fetch_all(pool)
    .await?;
    Ok(names.into_iter().flatten().collect())
}

#[derive(sqlx::FromRow)]
struct IndexListRow {
    name: String,
    is_unique: i64,
    origin: String,
}

#[derive(sqlx::FromRow)]
struct ForeignKeyListRow {
    id: i64,
    seq: i64,
    ref_table: String,
    column_name: String,
    ref_column: Option<String>,
    on_update: String,
    on_delete: String,
}
