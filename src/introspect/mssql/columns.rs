use crate::error::TextMetalError;
use crate::schema::{ColumnInfo, IdentityInfo};

use super::MssqlClient;

pub async fn query_columns(
    client: &mut MssqlClient,
    schema: &str,
    table_name: &str,
) -> Result<Vec<ColumnInfo>, TextMetalError> {
    let query = r#"
        SELECT
            c.COLUMN_NAME,
            c.ORDINAL_POSITION,
            CASE WHEN c.IS_NULLABLE = 'YES' THEN 1 ELSE 0 END AS is_nullable,
            c.DATA_TYPE,
            c.CHARACTER_MAXIMUM_LENGTH,
            c.NUMERIC_PRECISION,
            c.NUMERIC_SCALE,
            c.COLUMN_DEFAULT,
            ISNULL(sc.is_identity, 0) AS is_identity,
            ISNULL(sc.is_computed, 0) AS is_computed,
            CAST(ic.seed_value AS BIGINT) AS seed_value,
            CAST(ic.increment_value AS BIGINT) AS increment_value,
            CAST(ep.value AS NVARCHAR(MAX)) AS comment,
            c.COLLATION_NAME
        FROM INFORMATION_SCHEMA.COLUMNS c
        LEFT JOIN sys.columns sc
            ON sc.object_id = OBJECT_ID(QUOTENAME(c.TABLE_SCHEMA) + '.' + QUOTENAME(c.TABLE_NAME))
            AND sc.name = c.COLUMN_NAME
        LEFT JOIN sys.identity_columns ic
            ON ic.object_id = sc.object_id
            AND ic.column_id = sc.column_id
        LEFT JOIN sys.extended_properties ep
            ON ep.major_id = sc.object_id
            AND ep.minor_id = sc.column_id
            AND ep.name = 'MS_Description'
        WHERE c.TABLE_SCHEMA = @P1 AND c.TABLE_NAME = @P2
        ORDER BY c.ORDINAL_POSITION
    "#;

    let stream = client.query(query, &[&schema, &table_name]).await?;
    let rows = stream.into_first_result().await?;

    let mut columns = Vec::new();
    for row in rows {
        let is_identity = row.get::<bool, _>("is_identity").unwrap_or(false);

        // CHARACTER_MAXIMUM_LENGTH is -1 for varchar(max)/nvarchar(max): map to None
        let character_maximum_length = row
            .get::<i32, _>("CHARACTER_MAXIMUM_LENGTH")
            .filter(|&n| n > 0);

        let identity = is_identity.then(|| IdentityInfo {
            start: row.get::<i64, _>("seed_value").unwrap_or(1),
            increment: row.get::<i64, _>("increment_value").unwrap_or(1),
        });

        columns.push(ColumnInfo {
            name: row.get::<&str, _>("COLUMN_NAME").unwrap_or("").to_string(),
            ordinal_position: row.get::<i32, _>("ORDINAL_POSITION").unwrap_or(0),
            is_nullable: row.get::<i32, _>("is_nullable").unwrap_or(0) == 1,
            udt_name: row.get::<&str, _>("DATA_TYPE").unwrap_or("").to_lowercase(),
            character_maximum_length,
            numeric_precision: row.get::<u8, _>("NUMERIC_PRECISION").map(i32::from),
            numeric_scale: row.get::<i32, _>("NUMERIC_SCALE"),
            column_default: row.get::<&str, _>("COLUMN_DEFAULT").map(|s| s.to_string()),
            is_identity,
            identity,
            is_computed: row.get::<bool, _>("is_computed").unwrap_or(false),
            comment: row.get::<&str, _>("comment").map(|s| s.to_string()),
            collation: row.get::<&str, _>("COLLATION_NAME").map(|s| s.to_string()),
        });
    }

    Ok(columns)
}
