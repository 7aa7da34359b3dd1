use std::sync::LazyLock;

use regex::Regex;
use sqlx::SqlitePool;

use crate::error::TextMetalError;
use crate::schema::TriggerInfo;

/// Matches the timing and event of a CREATE TRIGGER statement.
static TRIGGER_HEADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?is)^\s*CREATE\s+(?:TEMP(?:ORARY)?\s+)?TRIGGER\s+(?:IF\s+NOT\s+EXISTS\s+)?(?:\S+|`[^`]+`|\x22[^\x22]+\x22|\[[^\]]+\])\s+(BEFORE|AFTER|INSTEAD\s+OF)?\s*(DELETE|INSERT|UPDATE)\b",
    )
    .expect("valid trigger regex")
});

pub async fn query_triggers(
    pool: &SqlitePool,
    table_name: &str,
) -> Result<Vec<TriggerInfo>, TextMetalError> {
    let rows = sqlx::query_as::<_, TriggerRow>(
        r#"
        SELECT name, sql
        FROM sqlite_master
        WHERE type = 'trigger' AND tbl_name = ?
        ORDER BY name
        "#,
    )
    .bind(table_name)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| {
            let (timing, events) = parse_trigger_header(row.sql.as_deref().unwrap_or_default());
            TriggerInfo {
                name: row.name,
                timing,
                events,
                is_disabled: false,
            }
        })
        .collect())
}

/// Timing defaults to BEFORE, as in SQLite itself.
fn parse_trigger_header(sql: &str) -> (String, Vec<String>) {
    match TRIGGER_HEADER_RE.captures(sql) {
        Some(caps) => {
            let timing = caps
                .get(1)
                .map(|m| m.as_str().split_whitespace().collect::<Vec<_>>().join(" "))
                .unwrap_or_else(|| "BEFORE".to_string());
            (timing.to_ascii_uppercase(), vec![caps[2].to_ascii_uppercase()])
        }
        None => {
            tracing::warn!("Could not parse trigger definition: {sql}");
            ("BEFORE".to_string(), Vec::new())
        }
    }
}

#[derive(sqlx::FromRow)]
struct TriggerRow {
    name: String,
    sql: Option<String>,
}
