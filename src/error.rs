use thiserror::Error;

#[derive(Error, Debug)]
pub enum TextMetalError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("MSSQL error: {0}")]
    Mssql(#[from] tiberius::error::Error),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Unsupported URL scheme: {0}")]
    UnsupportedScheme(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("XML error: {0}")]
    Xml(String),

    #[error("Unknown source strategy: {0}")]
    UnknownStrategy(String),

    #[error("Source error: {0}")]
    Source(String),

    #[error("Template syntax error in {template} at line {line}: {message}")]
    TemplateSyntax {
        template: String,
        line: usize,
        message: String,
    },

    #[error("Expression syntax error in '{expr}': {message}")]
    ExpressionSyntax { expr: String, message: String },

    #[error("Unresolved token: {0}")]
    Unresolved(String),

    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    #[error("Variable error: {0}")]
    Variable(String),

    #[error("Output error: {0}")]
    Output(String),
}

impl TextMetalError {
    /// Create a TemplateSyntax error
    pub fn syntax(template: impl Into<String>, line: usize, message: impl Into<String>) -> Self {
        TextMetalError::TemplateSyntax {
            template: template.into(),
            line,
            message: message.into(),
        }
    }

    /// Create an ExpressionSyntax error
    pub fn expression(expr: impl Into<String>, message: impl Into<String>) -> Self {
        TextMetalError::ExpressionSyntax {
            expr: expr.into(),
            message: message.into(),
        }
    }
}
