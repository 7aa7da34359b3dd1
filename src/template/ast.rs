use std::fmt;

use serde_json::Value;

/// Text with `${...}` tokens, split into literal and token parts.
pub type Interpolated = Vec<Segment>;

#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    Literal(String),
    /// `source` is the token text between `${` and `}`, kept for lenient
    /// rendering of unresolved tokens.
    Token { source: String, expr: Expr },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Value),
    Path(Path),
    Defined(Path),
    Unary(UnaryOp, Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    Call(String, Vec<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
    IsNull,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Concat,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Field(String),
    Index(usize),
}

/// A dotted lookup such as `table.columns[0].names.pascal_case`.
/// The first segment is always a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Path {
    pub segments: Vec<PathSegment>,
}

impl Path {
    pub fn head(&self) -> &str {
        match self.segments.first() {
            Some(PathSegment::Field(name)) => name,
            _ => "",
        }
    }

    pub fn tail(&self) -> &[PathSegment] {
        self.segments.get(1..).unwrap_or_default()
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                PathSegment::Field(name) if i == 0 => write!(f, "{name}")?,
                PathSegment::Field(name) => write!(f, ".{name}")?,
                PathSegment::Index(n) => write!(f, "[{n}]")?,
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Text(Interpolated),
    Write {
        text: Interpolated,
        newline: bool,
    },
    OutputScope {
        name: Interpolated,
        append: bool,
        body: Vec<Node>,
    },
    ForEach {
        source: Expr,
        var: String,
        index_var: Option<String>,
        filter: Option<Expr>,
        separator: Option<Interpolated>,
        body: Vec<Node>,
    },
    For {
        var: String,
        from: Expr,
        to: Expr,
        step: Option<Expr>,
        body: Vec<Node>,
    },
    If {
        test: Expr,
        then: Vec<Node>,
        otherwise: Vec<Node>,
    },
    With {
        source: Expr,
        body: Vec<Node>,
    },
    Allocate {
        name: String,
        value: Option<Expr>,
    },
    Assign {
        name: String,
        value: Expr,
    },
    Include {
        name: Interpolated,
        line: usize,
    },
    Log {
        message: Interpolated,
        level: LogLevel,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_display() {
        let path = Path {
            segments: vec![
                PathSegment::Field("table".to_string()),
                PathSegment::Field("columns".to_string()),
                PathSegment::Index(2),
                PathSegment::Field("names".to_string()),
            ],
        };
        assert_eq!(path.to_string(), "table.columns[2].names");
        assert_eq!(path.head(), "table");
        assert_eq!(path.tail().len(), 3);
    }
}
