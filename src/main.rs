mod cli;
mod dialect;
mod error;
mod inflect;
mod introspect;
mod model;
mod naming;
mod schema;
mod source;
mod template;
#[cfg(test)]
mod testutil;
mod typemap;
mod xml;

use std::fs;
use std::path::Path;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::error::TextMetalError;
use crate::source::{load_model, SourceStrategy};
use crate::template::{render, FileInput, FileOutput, Template, TemplatingContext};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let strategy: SourceStrategy = cli.strategy.parse()?;
    let properties = cli.property_map()?;
    let model = load_model(strategy, cli.source.as_deref(), &cli.source_options()).await?;

    if cli.dump_model {
        println!("{}", serde_json::to_string_pretty(&model)?);
        return Ok(());
    }

    let template_path = cli
        .template
        .as_deref()
        .ok_or_else(|| TextMetalError::Config("no template given (use --template)".to_string()))?;
    let template_name = template_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| template_path.display().to_string());
    let source = fs::read_to_string(template_path).map_err(|e| {
        TextMetalError::Config(format!("cannot read template {}: {e}", template_path.display()))
    })?;
    let template = Template::parse(&template_name, &source)?;

    let base_dir = template_path.parent().unwrap_or(Path::new("."));
    let input = FileInput::new(base_dir);
    let mut output = FileOutput::new(&cli.output_dir);
    let mut ctx = TemplatingContext::new(model, properties, cli.strict);

    render(&template, &mut ctx, &input, &mut output)?;
    tracing::debug!("Rendered {template_name}");

    Ok(())
}
