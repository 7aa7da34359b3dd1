use sqlx::PgPool;

use crate::error::TextMetalError;
use crate::schema::{ParameterInfo, ParameterMode, RoutineInfo, RoutineType};

/// Procedures and functions in a schema, each with its parameters.
pub async fn query_routines(
    pool: &PgPool,
    schema: &str,
) -> Result<Vec<RoutineInfo>, TextMetalError> {
    let rows = sqlx::query_as::<_, RoutineRow>(
        r#"
        SELECT r.specific_name::text AS specific_name,
               r.routine_name::text AS routine_name,
               r.routine_type::text AS routine_type,
               CASE WHEN r.routine_type = 'PROCEDURE' OR r.type_udt_name = 'void' THEN NULL
                    ELSE r.type_udt_name::text END AS return_type
        FROM information_schema.routines r
        WHERE r.routine_schema = $1
          AND r.routine_type IN ('PROCEDURE', 'FUNCTION')
        ORDER BY r.routine_name, r.specific_name
        "#,
    )
    .bind(schema)
    .fetch_all(pool)
    .await?;

    let mut routines = Vec::with_capacity(rows.len());
    for row in rows {
        let Some(routine_type) = row.routine_type.as_deref().and_then(RoutineType::parse) else {
            continue;
        };
        let parameters = query_parameters(pool, schema, &row.specific_name).await?;
        routines.push(RoutineInfo {
            schema: schema.to_string(),
            name: row.routine_name,
            routine_type,
            return_type: row.return_type,
            parameters,
        });
    }

    Ok(routines)
}

async fn query_parameters(
    pool: &PgPool,
    schema: &str,
    specific_name: &str,
) -> Result<Vec<ParameterInfo>, TextMetalError> {
    let rows = sqlx::query_as::<_, ParameterRow>(
        r#"
        SELECT p.parameter_name::text AS parameter_name,
               p.ordinal_position::int4 AS ordinal_position,
               p.parameter_mode::text AS parameter_mode,
               p.udt_name::text AS udt_name,
               p.character_maximum_length::int4 AS character_maximum_length,
               p.numeric_precision::int4 AS numeric_precision,
               p.numeric_scale::int4 AS numeric_scale
        FROM information_schema.parameters p
        WHERE p.specific_schema = $1 AND p.specific_name = $2
        ORDER BY p.ordinal_position
        "#,
    )
    .bind(schema)
    .bind(specific_name)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| ParameterInfo {
            name: row.parameter_name,
            ordinal_position: row.ordinal_position,
            mode: ParameterMode::parse(row.parameter_mode.as_deref()),
            udt_name: row.udt_name,
            character_maximum_length: row.character_maximum_length,
            numeric_precision: row.numeric_precision,
            numeric_scale: row.numeric_scale,
        })
        .collect())
}

#[derive(sqlx::FromRow)]
struct RoutineRow {
    specific_name: String,
    routine_name: String,
    routine_type: Option<String>,
    return_type: Option<String>,
}

#[derive(sqlx::FromRow)]
struct ParameterRow {
    parameter_name: Option<String>,
    ordinal_position: i32,
    parameter_mode: Option<String>,
    udt_name: String,
    character_maximum_length: Option<i32>,
    numeric_precision: Option<i32>,
    numeric_scale: Option<i32>,
}
