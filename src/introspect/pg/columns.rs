use sqlx::PgPool;

use crate::error::TextMetalError;
use crate::schema::{ColumnInfo, IdentityInfo};

pub async fn query_columns(
    pool: &PgPool,
    schema: &str,
    table_name: &str,
) -> Result<Vec<ColumnInfo>, TextMetalError> {
    let rows = sqlx::query_as::<_, ColumnRow>(
        r#"
        SELECT c.column_name::text AS column_name, c.ordinal_position::int4 AS ordinal_position,
               c.is_nullable = 'YES' AS is_nullable, c.udt_name::text AS udt_name,
               c.character_maximum_length::int4 AS character_maximum_length,
               c.numeric_precision::int4 AS numeric_precision,
               c.numeric_scale::int4 AS numeric_scale,
               c.column_default::text AS column_default,
               c.is_identity = 'YES' AS is_identity,
               c.is_generated = 'ALWAYS' AS is_computed,
               c.collation_name::text AS collation_name,
               col_description(
                   (quote_ident(c.table_schema) || '.' || quote_ident(c.table_name))::regclass,
                   c.ordinal_position
               ) AS comment
        FROM information_schema.columns c
        WHERE c.table_schema = $1 AND c.table_name = $2
        ORDER BY c.ordinal_position
        "#,
    )
    .bind(schema)
    .bind(table_name)
    .fetch_all(pool)
    .await?;

    let mut columns = Vec::with_capacity(rows.len());
    for row in rows {
        let is_serial = row
            .column_default
            .as_deref()
            .is_some_and(|d| d.starts_with("nextval("));
        let identity = if row.is_identity || is_serial {
            query_identity_info(pool, schema, table_name, &row.column_name).await?
        } else {
            None
        };
        columns.push(ColumnInfo {
            name: row.column_name,
            ordinal_position: row.ordinal_position,
            is_nullable: row.is_nullable,
            udt_name: row.udt_name,
            character_maximum_length: row.character_maximum_length,
            numeric_precision: row.numeric_precision,
            numeric_scale: row.numeric_scale,
            column_default: row.column_default,
            is_identity: row.is_identity,
            identity,
            is_computed: row.is_computed,
            comment: row.comment,
            collation: row.collation_name,
        });
    }

    Ok(columns)
}

/// Query the backing sequence of an identity or serial column.
async fn query_identity_info(
    pool: &PgPool,
    schema: &str,
    table_name: &str,
    column_name: &str,
) -> Result<Option<IdentityInfo>, TextMetalError> {
    // The table argument is parsed as an identifier list, so quote it to keep case.
    let qualified = format!("\"{schema}\".\"{table_name}\"");
    let row = sqlx::query_as::<_, IdentityRow>(
        r#"
        SELECT s.seqstart, s.seqincrement
        FROM pg_sequence s
        WHERE s.seqrelid = pg_get_serial_sequence($1, $2)::regclass
        "#,
    )
    .bind(&qualified)
    .bind(column_name)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|r| IdentityInfo {
        start: r.seqstart,
        increment: r.seqincrement,
    }))
}

#[derive(sqlx::FromRow)]
struct ColumnRow {
    column_name: String,
    ordinal_position: i32,
    is_nullable: bool,
    udt_name: String,
    character_maximum_length: Option<i32>,
    numeric_precision: Option<i32>,
    numeric_scale: Option<i32>,
    column_default: Option<String>,
    is_identity: bool,
    is_computed: bool,
    collation_name: Option<String>,
    comment: Option<String>,
}

#[derive(sqlx::FromRow)]
struct IdentityRow {
    seqstart: i64,
    seqincrement: i64,
}
