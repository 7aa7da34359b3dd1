use crate::error::TextMetalError;
use crate::introspect::{group_triggers, TriggerRow};
use crate::schema::TriggerInfo;

use super::MssqlClient;

pub async fn query_triggers(
    client: &mut MssqlClient,
    schema: &str,
    table_name: &str,
) -> Result<Vec<TriggerInfo>, TextMetalError> {
    let query = r#"
        SELECT
            tr.name AS trigger_name,
            tr.is_instead_of_trigger,
            tr.is_disabled,
            te.type_desc AS event
        FROM sys.triggers tr
        JOIN sys.trigger_events te ON te.object_id = tr.object_id
        WHERE tr.parent_id = OBJECT_ID(QUOTENAME(@P1) + '.' + QUOTENAME(@P2))
        ORDER BY tr.name, te.type
    "#;

    let rows = client
        .query(query, &[&schema, &table_name])
        .await?
        .into_first_result()
        .await?;

    Ok(group_triggers(rows.iter().map(|row| {
        let instead_of = row.get::<bool, _>("is_instead_of_trigger").unwrap_or(false);
        TriggerRow {
            trigger_name: row.get::<&str, _>("trigger_name").unwrap_or("").to_string(),
            timing: if instead_of { "INSTEAD OF" } else { "AFTER" }.to_string(),
            event: row.get::<&str, _>("event").unwrap_or("").to_string(),
            is_disabled: row.get::<bool, _>("is_disabled").unwrap_or(false),
        }
    })))
}
