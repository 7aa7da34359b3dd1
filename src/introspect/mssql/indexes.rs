use std::collections::BTreeMap;

use crate::error::TextMetalError;
use crate::schema::IndexInfo;

use super::MssqlClient;

pub async fn query_indexes(
    client: &mut MssqlClient,
    schema: &str,
    table_name: &str,
) -> Result<Vec<IndexInfo>, TextMetalError> {
    let query = r#"
        SELECT
            i.name AS index_name,
            i.is_unique,
            COL_NAME(ic.object_id, ic.column_id) AS column_name
        FROM sys.indexes i
        JOIN sys.index_columns ic
            ON ic.object_id = i.object_id AND ic.index_id = i.index_id
        WHERE i.object_id = OBJECT_ID(QUOTENAME(@P1) + '.' + QUOTENAME(@P2))
          AND i.is_primary_key = 0
          AND i.type <> 0
          AND ic.key_ordinal > 0
        ORDER BY i.name, ic.key_ordinal
    "#;

    let rows = client
        .query(query, &[&schema, &table_name])
        .await?
        .into_first_result()
        .await?;

    // One row per key column, unlike PG's array_agg
    let mut index_map: BTreeMap<String, IndexInfo> = BTreeMap::new();
    for row in rows {
        let name = row.get::<&str, _>("index_name").unwrap_or("").to_string();
        let is_unique = row.get::<bool, _>("is_unique").unwrap_or(false);
        let column = row.get::<&str, _>("column_name").unwrap_or("").to_string();

        index_map
            .entry(name.clone())
            .or_insert_with(|| IndexInfo {
                name,
                is_unique,
                columns: Vec::new(),
            })
            .columns
            .push(column);
    }

    Ok(index_map.into_values().collect())
}
