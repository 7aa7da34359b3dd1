use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use sqlx::sqlite::SqlitePoolOptions;

use crate::cli::ConnectionConfig;
use crate::error::TextMetalError;
use crate::introspect;
use crate::model::build_server;

use super::SourceOptions;

/// Connect, introspect and build the schema model.
pub async fn load(url: &str, options: &SourceOptions) -> Result<Value, TextMetalError> {
    let config = ConnectionConfig::parse(url, options.trust_cert)?;
    let introspect_options = options.introspect_options(config.dialect());

    tracing::debug!("Connecting to database...");
    let introspected = match config {
        ConnectionConfig::Postgres(url) => {
            let server_name = postgres_host(&url);
            let pool = PgPoolOptions::new()
                .max_connections(1)
                .connect(&url)
                .await?;
            tracing::debug!("Introspecting schema...");
            let s = introspect::pg::introspect(&pool, &server_name, &introspect_options).await;
            pool.close().await;
            s?
        }
        ConnectionConfig::Mssql {
            host,
            port,
            database,
            user,
            password,
            trust_cert,
        } => {
            let mut client =
                introspect::mssql::connect(&host, port, &database, &user, &password, trust_cert)
                    .await?;
            tracing::debug!("Introspecting schema...");
            introspect::mssql::introspect(&mut client, &introspect_options).await?
        }
        ConnectionConfig::Sqlite { url, database } => {
            let pool = SqlitePoolOptions::new()
                .max_connections(1)
                .connect(&url)
                .await?;
            tracing::debug!("Introspecting schema...");
            let s = introspect::sqlite::introspect(&pool, &database, &introspect_options).await;
            pool.close().await;
            s?
        }
    };

    tracing::debug!("Found {} tables/views", introspected.tables.len());
    let server = build_server(&introspected);
    Ok(serde_json::to_value(&server)?)
}

fn postgres_host(url: &str) -> String {
    url::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_else(|| "localhost".to_string())
}
