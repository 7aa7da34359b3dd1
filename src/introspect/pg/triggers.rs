use sqlx::PgPool;

use crate::error::TextMetalError;
use crate::introspect::{group_triggers, TriggerRow};
use crate::schema::TriggerInfo;

pub async fn query_triggers(
    pool: &PgPool,
    schema: &str,
    table_name: &str,
) -> Result<Vec<TriggerInfo>, TextMetalError> {
    let rows = sqlx::query_as::<_, PgTriggerRow>(
        r#"
        SELECT t.trigger_name::text AS trigger_name,
               t.action_timing::text AS timing,
               t.event_manipulation::text AS event,
               COALESCE(tg.tgenabled = 'D', false) AS is_disabled
        FROM information_schema.triggers t
        LEFT JOIN pg_trigger tg
            ON tg.tgname = t.trigger_name
            AND tg.tgrelid = (quote_ident(t.event_object_schema) || '.' || quote_ident(t.event_object_table))::regclass
        WHERE t.event_object_schema = $1 AND t.event_object_table = $2
        ORDER BY t.trigger_name, t.action_order
        "#,
    )
    .bind(schema)
    .bind(table_name)
    .fetch_all(pool)
    .await?;

    Ok(group_triggers(rows.into_iter().map(|row| TriggerRow {
        trigger_name: row.trigger_name,
        timing: row.timing,
        event: row.event,
        is_disabled: row.is_disabled,
    })))
}

#[derive(sqlx::FromRow)]
struct PgTriggerRow {
    trigger_name: String,
    timing: String,
    event: String,
    is_disabled: bool,
}
