//! Source strategies: the pluggable producers of the template model.

mod document;
mod sql;
mod text;

use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde_json::Value;

use crate::dialect::Dialect;
use crate::error::TextMetalError;
use crate::introspect::IntrospectOptions;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceStrategy {
    /// Introspect a database catalog into the schema model.
    Sql,
    Json,
    Xml,
    /// Delimited text with an optional header row.
    Text,
    /// An empty model, for templates driven by properties alone.
    Null,
}

impl FromStr for SourceStrategy {
    type Err = TextMetalError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name.trim().to_ascii_lowercase().as_str() {
            "sql" => Ok(SourceStrategy::Sql),
            "json" => Ok(SourceStrategy::Json),
            "xml" => Ok(SourceStrategy::Xml),
            "text" => Ok(SourceStrategy::Text),
            "null" => Ok(SourceStrategy::Null),
            _ => Err(TextMetalError::UnknownStrategy(name.to_string())),
        }
    }
}

/// Settings shared by the strategies; each reads the ones it needs.
#[derive(Debug, Clone)]
pub struct SourceOptions {
    /// `None` means the dialect's default schema.
    pub schemas: Option<Vec<String>>,
    pub tables: Vec<String>,
    pub noviews: bool,
    pub noprocedures: bool,
    pub trust_cert: bool,
    pub delimiter: char,
    pub has_header: bool,
}

impl Default for SourceOptions {
    fn default() -> Self {
        SourceOptions {
            schemas: None,
            tables: Vec::new(),
            noviews: false,
            noprocedures: false,
            trust_cert: false,
            delimiter: ',',
            has_header: true,
        }
    }
}

impl SourceOptions {
    pub fn introspect_options(&self, dialect: Dialect) -> IntrospectOptions {
        IntrospectOptions {
            schemas: self
                .schemas
                .clone()
                .unwrap_or_else(|| vec![dialect.default_schema().to_string()]),
            tables: self.tables.clone(),
            noviews: self.noviews,
            noprocedures: self.noprocedures,
        }
    }
}

/// Produce the template model with the given strategy.
pub async fn load_model(
    strategy: SourceStrategy,
    source: Option<&str>,
    options: &SourceOptions,
) -> Result<Value, TextMetalError> {
    if strategy == SourceStrategy::Null {
        return Ok(Value::Object(Default::default()));
    }
    let source = source.ok_or_else(|| {
        TextMetalError::Config(format!("the {strategy:?} strategy needs a source"))
    })?;
    tracing::debug!("Loading model from {source} with the {strategy:?} strategy");

    match strategy {
        SourceStrategy::Sql => sql::load(source, options).await,
        SourceStrategy::Json => Ok(serde_json::from_str(&read_source(source)?)?),
        SourceStrategy::Xml => document::to_value(&read_source(source)?),
        SourceStrategy::Text => {
            text::parse_delimited(&read_source(source)?, options.delimiter, options.has_header)
        }
        SourceStrategy::Null => Ok(Value::Object(Default::default())),
    }
}

fn read_source(path: &str) -> Result<String, TextMetalError> {
    fs::read_to_string(Path::new(path))
        .map_err(|e| TextMetalError::Source(format!("cannot read {path}: {e}")))
}
