use sqlx::SqlitePool;

use crate::error::TextMetalError;
use crate::schema::{ColumnInfo, IdentityInfo};

pub async fn query_columns(
    pool: &SqlitePool,
    table_name: &str,
) -> Result<Vec<ColumnInfo>, TextMetalError> {
    // table_xinfo also lists generated columns (hidden = 2 or 3)
    let rows = sqlx::query_as::<_, ColumnRow>(
        r#"
        SELECT cid, name, type AS declared_type, "notnull" AS not_null, dflt_value, pk, hidden
        FROM pragma_table_xinfo(?)
        WHERE hidden <> 1
        ORDER BY cid
        "#,
    )
    .bind(table_name)
    .fetch_all(pool)
    .await?;

    let pk_count = rows.iter().filter(|r| r.pk > 0).count();

    Ok(rows
        .into_iter()
        .map(|row| {
            // A lone INTEGER PRIMARY KEY aliases the rowid
            let is_identity =
                row.pk > 0 && pk_count == 1 && row.declared_type.eq_ignore_ascii_case("INTEGER");
            let (length, precision, scale) = parse_type_args(&row.declared_type);
            ColumnInfo {
                name: row.name,
                ordinal_position: row.cid as i32 + 1,
                is_nullable: row.not_null == 0 && row.pk == 0,
                udt_name: base_type(&row.declared_type),
                character_maximum_length: length,
                numeric_precision: precision,
                numeric_scale: scale,
                column_default: row.dflt_value,
                is_identity,
                identity: is_identity.then_some(IdentityInfo {
                    start: 1,
                    increment: 1,
                }),
                is_computed: row.hidden == 2 || row.hidden == 3,
                comment: None,
                collation: None,
            }
        })
        .collect())
}

/// The declared type without its arguments: `NUMERIC(10, 2)` -> `NUMERIC`.
fn base_type(declared: &str) -> String {
    declared
        .split('(')
        .next()
        .unwrap_or_default()
        .trim()
        .to_string()
}

/// Arguments of a declared type. One argument is a length for character
/// types and a precision otherwise.
fn parse_type_args(declared: &str) -> (Option<i32>, Option<i32>, Option<i32>) {
    let Some(args) = declared
        .split_once('(')
        .and_then(|(_, rest)| rest.split_once(')'))
        .map(|(args, _)| args)
    else {
        return (None, None, None);
    };
    let nums: Vec<Option<i32>> = args.split(',').map(|a| a.trim().parse().ok()).collect();
    let upper = declared.to_ascii_uppercase();
    let is_text = upper.contains("CHAR") || upper.contains("TEXT") || upper.contains("CLOB");
    match nums.as_slice() {
        [n] if is_text => (*n, None, None),
        [p] => (None, *p, None),
        [p, s] => (None, *p, *s),
        _ => (None, None, None),
    }
}

#[derive(sqlx::FromRow)]
struct ColumnRow {
    cid: i64,
    name: String,
    declared_type: String,
    not_null: i64,
    dflt_value: Option<String>,
    pk: i64,
    hidden: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_type_args() {
        assert_eq!(parse_type_args("VARCHAR(40)"), (Some(40), None, None));
        assert_eq!(parse_type_args("NUMERIC(10, 2)"), (None, Some(10), Some(2)));
        assert_eq!(parse_type_args("DECIMAL(8)"), (None, Some(8), None));
        assert_eq!(parse_type_args("INTEGER"), (None, None, None));
    }

    #[test]
    fn test_base_type() {
        assert_eq!(base_type("NUMERIC(10, 2)"), "NUMERIC");
        assert_eq!(base_type("TEXT"), "TEXT");
        assert_eq!(base_type(""), "");
    }
}
