use crate::error::TextMetalError;
use crate::schema::{ParameterInfo, ParameterMode, RoutineInfo, RoutineType};

use super::MssqlClient;

/// Procedures and functions in a schema, each with its parameters.
pub async fn query_routines(
    client: &mut MssqlClient,
    schema: &str,
) -> Result<Vec<RoutineInfo>, TextMetalError> {
    let query = r#"
        SELECT
            r.SPECIFIC_NAME,
            r.ROUTINE_NAME,
            r.ROUTINE_TYPE,
            r.DATA_TYPE
        FROM INFORMATION_SCHEMA.ROUTINES r
        WHERE r.ROUTINE_SCHEMA = @P1
        ORDER BY r.ROUTINE_NAME
    "#;

    let rows = client
        .query(query, &[&schema])
        .await?
        .into_first_result()
        .await?;

    let headers: Vec<(String, String, RoutineType, Option<String>)> = rows
        .iter()
        .filter_map(|row| {
            let routine_type = RoutineType::parse(row.get::<&str, _>("ROUTINE_TYPE")?)?;
            Some((
                row.get::<&str, _>("SPECIFIC_NAME")?.to_string(),
                row.get::<&str, _>("ROUTINE_NAME")?.to_string(),
                routine_type,
                row.get::<&str, _>("DATA_TYPE").map(|s| s.to_lowercase()),
            ))
        })
        .collect();

    let mut routines = Vec::with_capacity(headers.len());
    for (specific_name, name, routine_type, return_type) in headers {
        let parameters = query_parameters(client, schema, &specific_name).await?;
        routines.push(RoutineInfo {
            schema: schema.to_string(),
            name,
            routine_type,
            // Table-valued functions report TABLE
            return_type: return_type.filter(|t| t != "table"),
            parameters,
        });
    }

    Ok(routines)
}

async fn query_parameters(
    client: &mut MssqlClient,
    schema: &str,
    specific_name: &str,
) -> Result<Vec<ParameterInfo>, TextMetalError> {
    let query = r#"
        SELECT
            p.PARAMETER_NAME,
            p.ORDINAL_POSITION,
            p.PARAMETER_MODE,
            p.IS_RESULT,
            p.DATA_TYPE,
            p.CHARACTER_MAXIMUM_LENGTH,
            p.NUMERIC_PRECISION,
            p.NUMERIC_SCALE
        FROM INFORMATION_SCHEMA.PARAMETERS p
        WHERE p.SPECIFIC_SCHEMA = @P1 AND p.SPECIFIC_NAME = @P2
        ORDER BY p.ORDINAL_POSITION
    "#;

    let rows = client
        .query(query, &[&schema, &specific_name])
        .await?
        .into_first_result()
        .await?;

    Ok(rows
        .iter()
        .map(|row| {
            let is_result = row.get::<&str, _>("IS_RESULT") == Some("YES");
            let mode = if is_result {
                ParameterMode::Return
            } else {
                ParameterMode::parse(row.get::<&str, _>("PARAMETER_MODE"))
            };
            ParameterInfo {
                name: row
                    .get::<&str, _>("PARAMETER_NAME")
                    .filter(|n| !n.is_empty())
                    .map(|s| s.to_string()),
                ordinal_position: row.get::<i32, _>("ORDINAL_POSITION").unwrap_or(0),
                mode,
                udt_name: row.get::<&str, _>("DATA_TYPE").unwrap_or("").to_lowercase(),
                character_maximum_length: row
                    .get::<i32, _>("CHARACTER_MAXIMUM_LENGTH")
                    .filter(|&n| n > 0),
                numeric_precision: row.get::<u8, _>("NUMERIC_PRECISION").map(i32::from),
                numeric_scale: row.get::<i32, _>("NUMERIC_SCALE"),
            }
        })
        .collect())
}
