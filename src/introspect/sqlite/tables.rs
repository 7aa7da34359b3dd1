use sqlx::SqlitePool;

use crate::error::TextMetalError;
use crate::schema::{TableInfo, TableType};

pub async fn query_tables(
    pool: &SqlitePool,
    noviews: bool,
) -> Result<Vec<TableInfo>, TextMetalError> {
    let rows = sqlx::query_as::<_, TableRow>(
        r#"
        SELECT name, type AS object_type
        FROM sqlite_master
        WHERE type IN ('table', 'view')
          AND name NOT LIKE 'sqlite_%'
        ORDER BY name
        "#,
    )
    .fetch_all(pool)
    .await?;

    let tables = rows
        .into_iter()
        .filter_map(|row| {
            let table_type = match row.object_type.as_str() {
                "table" => TableType::Table,
                "view" if !noviews => TableType::View,
                _ => return None,
            };
            Some(TableInfo::new("main", &row.name, table_type, None))
        })
        .collect();

    Ok(tables)
}

#[derive(sqlx::FromRow)]
struct TableRow {
    name: String,
    object_type: String,
}
