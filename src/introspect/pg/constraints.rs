use sqlx::PgPool;

use crate::error::TextMetalError;
use crate::introspect::{group_foreign_keys, group_keys, ForeignKeyRow, KeyRow};
use crate::schema::{ConstraintInfo, ConstraintType};

pub async fn query_constraints(
    pool: &PgPool,
    schema: &str,
    table_name: &str,
) -> Result<Vec<ConstraintInfo>, TextMetalError> {
    // Primary keys and unique constraints
    let key_rows = sqlx::query_as::<_, KeyColumnRow>(
        r#"
        SELECT tc.constraint_name::text AS constraint_name,
               tc.constraint_type::text AS constraint_type,
               kcu.column_name::text AS column_name
        FROM information_schema.table_constraints tc
        JOIN information_schema.key_column_usage kcu
            USING (constraint_name, table_schema, table_name)
        WHERE tc.table_schema = $1 AND tc.table_name = $2
            AND tc.constraint_type IN ('PRIMARY KEY', 'UNIQUE')
        ORDER BY tc.constraint_name, kcu.ordinal_position
        "#,
    )
    .bind(schema)
    .bind(table_name)
    .fetch_all(pool)
    .await?;

    let mut constraints = group_keys(key_rows.into_iter().filter_map(|row| {
        let constraint_type = match row.constraint_type.as_str() {
            "PRIMARY KEY" => ConstraintType::PrimaryKey,
            "UNIQUE" => ConstraintType::Unique,
            _ => return None,
        };
        Some(KeyRow {
            constraint_name: row.constraint_name,
            constraint_type,
            column_name: row.column_name,
        })
    }));

    // Foreign keys: one row per column pair, in key order, for this table only
    let fk_rows = sqlx::query_as::<_, FkRow>(
        r#"
        SELECT con.conname::text AS constraint_name,
               att.attname::text AS column_name,
               ref_ns.nspname::text AS ref_schema,
               ref_cl.relname::text AS ref_table,
               ref_att.attname::text AS ref_column,
               CASE con.confupdtype
                   WHEN 'c' THEN 'CASCADE' WHEN 'n' THEN 'SET NULL'
                   WHEN 'd' THEN 'SET DEFAULT' WHEN 'r' THEN 'RESTRICT'
                   ELSE 'NO ACTION' END AS update_rule,
               CASE con.confdeltype
                   WHEN 'c' THEN 'CASCADE' WHEN 'n' THEN 'SET NULL'
                   WHEN 'd' THEN 'SET DEFAULT' WHEN 'r' THEN 'RESTRICT'
                   ELSE 'NO ACTION' END AS delete_rule
        FROM pg_constraint con
        JOIN pg_class cl ON cl.oid = con.conrelid
        JOIN pg_namespace ns ON ns.oid = cl.relnamespace
        JOIN pg_class ref_cl ON ref_cl.oid = con.confrelid
        JOIN pg_namespace ref_ns ON ref_ns.oid = ref_cl.relnamespace
        CROSS JOIN LATERAL unnest(con.conkey, con.confkey)
            WITH ORDINALITY AS k(attnum, ref_attnum, ord)
        JOIN pg_attribute att
            ON att.attrelid = con.conrelid AND att.attnum = k.attnum
        JOIN pg_attribute ref_att
            ON ref_att.attrelid = con.confrelid AND ref_att.attnum = k.ref_attnum
        WHERE con.contype = 'f' AND ns.nspname = $1 AND cl.relname = $2
        ORDER BY con.conname, k.ord
        "#,
    )
    .bind(schema)
    .bind(table_name)
    .fetch_all(pool)
    .await?;

    constraints.extend(group_foreign_keys(fk_rows.into_iter().map(|row| ForeignKeyRow {
        constraint_name: row.constraint_name,
        column_name: row.column_name,
        ref_schema: row.ref_schema,
        ref_table: row.ref_table,
        ref_column: row.ref_column,
        update_rule: row.update_rule,
        delete_rule: row.delete_rule,
    })));

    Ok(constraints)
}

#[derive(sqlx::FromRow)]
struct KeyColumnRow {
    constraint_name: String,
    constraint_type: String,
    column_name: String,
}

#[derive(sqlx::FromRow)]
struct FkRow {
    constraint_name: String,
    column_name: String,
    ref_schema: String,
    ref_table: String,
    ref_column: String,
    update_rule: String,
    delete_rule: String,
}
