mod columns;
mod constraints;
mod indexes;
mod routines;
mod tables;
mod triggers;

use tiberius::{Client, Config, EncryptionLevel};
use tokio::net::TcpStream;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};

use crate::dialect::Dialect;
use crate::error::TextMetalError;
use crate::schema::{IntrospectedSchema, ServerInfo};

use super::IntrospectOptions;

pub type MssqlClient = Client<Compat<TcpStream>>;

/// Establish a connection to a MSSQL server.
pub async fn connect(
    host: &str,
    port: u16,
    database: &str,
    user: &str,
    password: &str,
    trust_cert: bool,
) -> Result<MssqlClient, TextMetalError> {
    let mut config = Config::new();
    config.host(host);
    config.port(port);
    config.database(database);
    config.authentication(tiberius::AuthMethod::sql_server(user, password));
    config.encryption(EncryptionLevel::Required);
    if trust_cert {
        config.trust_cert();
    }

    let tcp = TcpStream::connect(config.get_addr()).await.map_err(|e| {
        TextMetalError::Connection(format!("TCP connection to {host}:{port} failed: {e}"))
    })?;
    tcp.set_nodelay(true)
        .map_err(|e| TextMetalError::Connection(format!("Failed to set TCP_NODELAY: {e}")))?;

    let client = Client::connect(config, tcp.compat_write()).await?;
    Ok(client)
}

/// Introspect a MSSQL database and return the full schema metadata.
pub async fn introspect(
    client: &mut MssqlClient,
    options: &IntrospectOptions,
) -> Result<IntrospectedSchema, TextMetalError> {
    let server = query_server(client).await?;
    let mut all_tables = Vec::new();
    let mut all_routines = Vec::new();

    for schema in &options.schemas {
        let mut schema_tables = tables::query_tables(client, schema, options.noviews).await?;
        options.retain_tables(&mut schema_tables);

        for table in &mut schema_tables {
            tracing::debug!("Reading {}.{}", table.schema, table.name);
            table.columns = columns::query_columns(client, &table.schema, &table.name).await?;
            table.constraints =
                constraints::query_constraints(client, &table.schema, &table.name).await?;
            table.indexes = indexes::query_indexes(client, &table.schema, &table.name).await?;
            table.triggers = triggers::query_triggers(client, &table.schema, &table.name).await?;
        }
        all_tables.extend(schema_tables);

        if !options.noprocedures {
            all_routines.extend(routines::query_routines(client, schema).await?);
        }
    }

    Ok(IntrospectedSchema {
        dialect: Dialect::Mssql,
        server,
        tables: all_tables,
        routines: all_routines,
    })
}

async fn query_server(client: &mut MssqlClient) -> Result<ServerInfo, TextMetalError> {
    let query = r#"
        SELECT
            CAST(SERVERPROPERTY('ServerName') AS NVARCHAR(128)) AS server_name,
            CAST(DB_NAME() AS NVARCHAR(128)) AS database_name,
            CAST(SERVERPROPERTY('ProductVersion') AS NVARCHAR(128)) AS version,
            CAST(SERVERPROPERTY('Edition') AS NVARCHAR(128)) AS edition,
            CAST(SERVERPROPERTY('ProductLevel') AS NVARCHAR(128)) AS level
    "#;

    let row = client
        .query(query, &[])
        .await?
        .into_row()
        .await?
        .ok_or_else(|| TextMetalError::Connection("SERVERPROPERTY returned no row".to_string()))?;

    let text = |col: &str| row.get::<&str, _>(col).map(|s| s.to_string());
    Ok(ServerInfo {
        server_name: text("server_name").unwrap_or_default(),
        database_name: text("database_name").unwrap_or_default(),
        version: text("version"),
        edition: text("edition"),
        level: text("level"),
    })
}
