//! The XML templating engine.
//!
//! A template is an XML document rooted at `<Template>`. Text and CDATA are
//! emitted with `${...}` tokens expanded against a [`TemplatingContext`];
//! elements such as `ForEach`, `If` and `OutputScope` drive control flow and
//! output routing. Parsing produces an AST up front so syntax errors surface
//! before any output is written.

mod ast;
mod context;
mod eval;
mod expr;
mod functions;
mod io;
mod parser;
mod render;
mod value;

pub use context::TemplatingContext;
pub use io::{FileInput, FileOutput, InputMechanism, OutputMechanism};
pub use parser::Template;
pub use render::render;
