use crate::error::TextMetalError;
use crate::introspect::{group_foreign_keys, group_keys, ForeignKeyRow, KeyRow};
use crate::schema::{ConstraintInfo, ConstraintType};

use super::MssqlClient;

pub async fn query_constraints(
    client: &mut MssqlClient,
    schema: &str,
    table_name: &str,
) -> Result<Vec<ConstraintInfo>, TextMetalError> {
    // Primary keys and unique constraints via INFORMATION_SCHEMA
    let key_query = r#"
        SELECT
            tc.CONSTRAINT_NAME,
            tc.CONSTRAINT_TYPE,
            kcu.COLUMN_NAME
        FROM INFORMATION_SCHEMA.TABLE_CONSTRAINTS tc
        JOIN INFORMATION_SCHEMA.KEY_COLUMN_USAGE kcu
            ON kcu.CONSTRAINT_NAME = tc.CONSTRAINT_NAME
            AND kcu.TABLE_SCHEMA = tc.TABLE_SCHEMA
            AND kcu.TABLE_NAME = tc.TABLE_NAME
        WHERE tc.TABLE_SCHEMA = @P1
          AND tc.TABLE_NAME = @P2
          AND tc.CONSTRAINT_TYPE IN ('PRIMARY KEY', 'UNIQUE')
        ORDER BY tc.CONSTRAINT_NAME, kcu.ORDINAL_POSITION
    "#;

    let rows = client
        .query(key_query, &[&schema, &table_name])
        .await?
        .into_first_result()
        .await?;

    let mut constraints = group_keys(rows.iter().filter_map(|row| {
        let constraint_type = match row.get::<&str, _>("CONSTRAINT_TYPE")? {
            "PRIMARY KEY" => ConstraintType::PrimaryKey,
            "UNIQUE" => ConstraintType::Unique,
            _ => return None,
        };
        Some(KeyRow {
            constraint_name: row.get::<&str, _>("CONSTRAINT_NAME")?.to_string(),
            constraint_type,
            column_name: row.get::<&str, _>("COLUMN_NAME")?.to_string(),
        })
    }));

    // Foreign keys via sys.foreign_keys + sys.foreign_key_columns
    let fk_query = r#"
        SELECT
            fk.name AS constraint_name,
            COL_NAME(fkc.parent_object_id, fkc.parent_column_id) AS column_name,
            SCHEMA_NAME(ref_t.schema_id) AS ref_schema,
            ref_t.name AS ref_table,
            COL_NAME(fkc.referenced_object_id, fkc.referenced_column_id) AS ref_column,
            fk.update_referential_action_desc AS update_rule,
            fk.delete_referential_action_desc AS delete_rule
        FROM sys.foreign_keys fk
        JOIN sys.foreign_key_columns fkc ON fkc.constraint_object_id = fk.object_id
        JOIN sys.tables ref_t ON ref_t.object_id = fk.referenced_object_id
        WHERE fk.parent_object_id = OBJECT_ID(QUOTENAME(@P1) + '.' + QUOTENAME(@P2))
        ORDER BY fk.name, fkc.constraint_column_id
    "#;

    let fk_rows = client
        .query(fk_query, &[&schema, &table_name])
        .await?
        .into_first_result()
        .await?;

    let text = |row: &tiberius::Row, col: &str, fallback: &str| {
        row.get::<&str, _>(col).unwrap_or(fallback).to_string()
    };
    constraints.extend(group_foreign_keys(fk_rows.iter().map(|row| ForeignKeyRow {
        constraint_name: text(row, "constraint_name", ""),
        column_name: text(row, "column_name", ""),
        ref_schema: text(row, "ref_schema", ""),
        ref_table: text(row, "ref_table", ""),
        ref_column: text(row, "ref_column", ""),
        update_rule: text(row, "update_rule", "NO_ACTION"),
        delete_rule: text(row, "delete_rule", "NO_ACTION"),
    })));

    Ok(constraints)
}
