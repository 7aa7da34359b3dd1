//! Where templates come from and where rendered text goes.

use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Component, Path, PathBuf};

use crate::error::TextMetalError;

/// Loads template sources by name.
pub trait InputMechanism {
    fn load(&self, name: &str) -> Result<String, TextMetalError>;
}

/// Receives rendered text, routed into named scopes by `OutputScope`.
pub trait OutputMechanism {
    fn enter_scope(&mut self, name: &str, append: bool) -> Result<(), TextMetalError>;
    fn leave_scope(&mut self) -> Result<(), TextMetalError>;
    fn write(&mut self, text: &str) -> Result<(), TextMetalError>;
}

/// Templates read from disk, relative to a base directory.
#[derive(Debug, Clone)]
pub struct FileInput {
    base_dir: PathBuf,
}

impl FileInput {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        FileInput {
            base_dir: base_dir.into(),
        }
    }
}

impl InputMechanism for FileInput {
    fn load(&self, name: &str) -> Result<String, TextMetalError> {
        let path = self.base_dir.join(name);
        tracing::debug!("Loading template {}", path.display());
        fs::read_to_string(&path).map_err(|e| {
            TextMetalError::Config(format!("cannot read template {}: {e}", path.display()))
        })
    }
}

/// Templates held in memory by name.
#[allow(dead_code)]
#[derive(Debug, Clone, Default)]
pub struct MemoryInput {
    templates: BTreeMap<String, String>,
}

#[allow(dead_code)]
impl MemoryInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, source: &str) -> Self {
        self.templates.insert(name.to_string(), source.to_string());
        self
    }
}

impl InputMechanism for MemoryInput {
    fn load(&self, name: &str) -> Result<String, TextMetalError> {
        self.templates
            .get(name)
            .cloned()
            .ok_or_else(|| TextMetalError::Config(format!("no template named {name}")))
    }
}

struct OpenScope {
    path: PathBuf,
    append: bool,
    buffer: String,
}

/// Scoped text goes to files under the output directory; unscoped text
/// goes to the fallback writer (stdout by default).
pub struct FileOutput {
    base_dir: PathBuf,
    scopes: Vec<OpenScope>,
    unscoped: Box<dyn Write>,
}

impl FileOutput {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self::with_writer(base_dir, Box::new(std::io::stdout()))
    }

    pub fn with_writer(base_dir: impl Into<PathBuf>, unscoped: Box<dyn Write>) -> Self {
        FileOutput {
            base_dir: base_dir.into(),
            scopes: Vec::new(),
            unscoped,
        }
    }
}

impl OutputMechanism for FileOutput {
    fn enter_scope(&mut self, name: &str, append: bool) -> Result<(), TextMetalError> {
        let relative = checked_relative(name)?;
        self.scopes.push(OpenScope {
            path: self.base_dir.join(relative),
            append,
            buffer: String::new(),
        });
        Ok(())
    }

    fn leave_scope(&mut self) -> Result<(), TextMetalError> {
        let scope = self
            .scopes
            .pop()
            .ok_or_else(|| TextMetalError::Output("no output scope is open".to_string()))?;

        if let Some(parent) = scope.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .append(scope.append)
            .truncate(!scope.append)
            .open(&scope.path)?;
        file.write_all(scope.buffer.as_bytes())?;
        tracing::info!("Wrote {}", scope.path.display());
        Ok(())
    }

    fn write(&mut self, text: &str) -> Result<(), TextMetalError> {
        match self.scopes.last_mut() {
            Some(scope) => scope.buffer.push_str(text),
            None => self.unscoped.write_all(text.as_bytes())?,
        }
        Ok(())
    }
}

/// Records output in memory.
#[allow(dead_code)]
#[derive(Debug, Default)]
pub struct MemoryOutput {
    /// Text written outside any scope.
    pub unscoped: String,
    /// Completed scopes by name.
    pub files: BTreeMap<String, String>,
    open: Vec<(String, String)>,
}

#[allow(dead_code)]
impl MemoryOutput {
    pub fn new() -> Self {
        Self::default()
    }
}

impl OutputMechanism for MemoryOutput {
    fn enter_scope(&mut self, name: &str, append: bool) -> Result<(), TextMetalError> {
        checked_relative(name)?;
        let initial = if append {
            self.files.get(name).cloned().unwrap_or_default()
        } else {
            String::new()
        };
        self.open.push((name.to_string(), initial));
        Ok(())
    }

    fn leave_scope(&mut self) -> Result<(), TextMetalError> {
        let (name, text) = self
            .open
            .pop()
            .ok_or_else(|| TextMetalError::Output("no output scope is open".to_string()))?;
        self.files.insert(name, text);
        Ok(())
    }

    fn write(&mut self, text: &str) -> Result<(), TextMetalError> {
        match self.open.last_mut() {
            Some((_, buffer)) => buffer.push_str(text),
            None => self.unscoped.push_str(text),
        }
        Ok(())
    }
}

/// Scope names must stay inside the output directory.
fn checked_relative(name: &str) -> Result<&Path, TextMetalError> {
    let path = Path::new(name);
    if name.trim().is_empty() {
        return Err(TextMetalError::Output("empty output scope name".to_string()));
    }
    for component in path.components() {
        match component {
            Component::Normal(_) | Component::CurDir => {}
            Component::ParentDir => {
                return Err(TextMetalError::Output(format!("'..' is not allowed in {name}")))
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(TextMetalError::Output(format!("{name} must be a relative path")))
            }
        }
    }
    Ok(path)
}
