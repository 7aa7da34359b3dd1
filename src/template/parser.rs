use serde_json::Value;

use super::ast::{BinaryOp, Expr, Interpolated, LogLevel, Node, UnaryOp};
use super::expr::{parse_attribute_expression, parse_interpolated, parse_path};
use crate::error::TextMetalError;
use crate::xml::{parse_document, XmlElement, XmlNode};

/// A parsed template document.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    pub name: String,
    pub nodes: Vec<Node>,
}

impl Template {
    pub fn parse(name: &str, source: &str) -> Result<Self, TextMetalError> {
        let root = parse_document(source).map_err(|e| match e {
            TextMetalError::Xml(message) => TextMetalError::Xml(format!("{name}: {message}")),
            other => other,
        })?;
        if root.name != "Template" {
            return Err(TextMetalError::syntax(
                name,
                root.line,
                format!("root element must be <Template>, found <{}>", root.name),
            ));
        }
        let parser = TemplateParser { name };
        Ok(Template {
            name: name.to_string(),
            nodes: parser.body(&root.children)?,
        })
    }
}

struct TemplateParser<'a> {
    name: &'a str,
}

impl TemplateParser<'_> {
    fn error(&self, line: usize, message: impl Into<String>) -> TextMetalError {
        TextMetalError::syntax(self.name, line, message)
    }

    /// Attach the template name and line to expression errors.
    fn locate(&self, line: usize, err: TextMetalError) -> TextMetalError {
        match err {
            TextMetalError::ExpressionSyntax { expr, message } => {
                self.error(line, format!("in '{expr}': {message}"))
            }
            other => other,
        }
    }

    fn body(&self, children: &[XmlNode]) -> Result<Vec<Node>, TextMetalError> {
        let mut nodes = Vec::new();
        for child in children {
            match child {
                XmlNode::Text { text, .. } if text.trim().is_empty() => {}
                XmlNode::Text { text, line } | XmlNode::CData { text, line } => {
                    nodes.push(Node::Text(self.interpolate(text, *line)?));
                }
                XmlNode::Element(element) => nodes.push(self.construct(element)?),
            }
        }
        Ok(nodes)
    }

    fn construct(&self, el: &XmlElement) -> Result<Node, TextMetalError> {
        match el.name.as_str() {
            "Text" => Ok(Node::Text(self.interpolate(&el.text(), el.line)?)),
            "Write" | "WriteLine" => {
                let text = match el.attr("text") {
                    Some(text) => text.to_string(),
                    None => el.text(),
                };
                let newline = el.name == "WriteLine" || self.flag(el, "newline")?;
                Ok(Node::Write {
                    text: self.interpolate(&text, el.line)?,
                    newline,
                })
            }
            "OutputScope" => Ok(Node::OutputScope {
                name: self.interpolate(self.required(el, "name")?, el.line)?,
                append: self.flag(el, "append")?,
                body: self.body(&el.children)?,
            }),
            "ForEach" => Ok(Node::ForEach {
                source: self.expression_attr(el, "in")?,
                var: self.variable(el, "var-it")?.unwrap_or_else(|| "it".to_string()),
                index_var: self.variable(el, "var-index")?,
                filter: self.optional_expression_attr(el, "filter")?,
                separator: el
                    .attr("separator")
                    .map(|s| self.interpolate(s, el.line))
                    .transpose()?,
                body: self.body(&el.children)?,
            }),
            "For" => Ok(Node::For {
                var: self.variable(el, "var-it")?.unwrap_or_else(|| "i".to_string()),
                from: self.expression_attr(el, "from")?,
                to: self.expression_attr(el, "to")?,
                step: self.optional_expression_attr(el, "step")?,
                body: self.body(&el.children)?,
            }),
            "If" => self.if_construct(el),
            "With" => Ok(Node::With {
                source: self.expression_attr(el, "in")?,
                body: self.body(&el.children)?,
            }),
            "Allocate" => Ok(Node::Allocate {
                name: self.token_name(el)?,
                value: self.value_of(el)?,
            }),
            "Assign" => {
                let name = self.token_name(el)?;
                let value = self
                    .value_of(el)?
                    .ok_or_else(|| self.error(el.line, "<Assign> needs a value"))?;
                Ok(Node::Assign { name, value })
            }
            "Include" => Ok(Node::Include {
                name: self.interpolate(self.required(el, "name")?, el.line)?,
                line: el.line,
            }),
            "Log" => {
                let level = match el.attr("level").unwrap_or("info") {
                    "debug" => LogLevel::Debug,
                    "info" => LogLevel::Info,
                    "warn" => LogLevel::Warn,
                    other => return Err(self.error(el.line, format!("unknown log level '{other}'"))),
                };
                let message = match el.attr("message") {
                    Some(message) => message.to_string(),
                    None => el.text(),
                };
                Ok(Node::Log {
                    message: self.interpolate(&message, el.line)?,
                    level,
                })
            }
            other => Err(self.error(el.line, format!("unknown element <{other}>"))),
        }
    }

    fn if_construct(&self, el: &XmlElement) -> Result<Node, TextMetalError> {
        let mut condition = None;
        let mut otherwise = Vec::new();
        let mut body = Vec::new();

        for child in &el.children {
            match child {
                XmlNode::Element(c) if c.name == "Condition" => {
                    if condition.is_some() {
                        return Err(self.error(c.line, "<If> has more than one <Condition>"));
                    }
                    condition = Some(self.single_expression(c)?);
                }
                XmlNode::Element(c) if c.name == "Else" => {
                    otherwise = self.body(&c.children)?;
                }
                other => body.push(other.clone()),
            }
        }

        let test = match (el.attr("test"), condition) {
            (Some(_), Some(_)) => {
                return Err(self.error(el.line, "<If> has both a test attribute and a <Condition>"))
            }
            (Some(test), None) => self.parse_attr_expr(test, el.line)?,
            (None, Some(condition)) => condition,
            (None, None) => return Err(self.error(el.line, "<If> needs a test")),
        };

        Ok(Node::If {
            test,
            then: self.body(&body)?,
            otherwise,
        })
    }

    /// The `value` attribute or a single expression child, if either is present.
    fn value_of(&self, el: &XmlElement) -> Result<Option<Expr>, TextMetalError> {
        match el.attr("value") {
            Some(value) => Ok(Some(self.parse_attr_expr(value, el.line)?)),
            None if el.elements().next().is_some() => Ok(Some(self.single_expression(el)?)),
            None => Ok(None),
        }
    }

    fn single_expression(&self, el: &XmlElement) -> Result<Expr, TextMetalError> {
        let children: Vec<&XmlElement> = el.elements().collect();
        match children.as_slice() {
            [only] => self.expression_element(only),
            _ => Err(self.error(
                el.line,
                format!("<{}> needs exactly one expression element", el.name),
            )),
        }
    }

    fn expression_element(&self, el: &XmlElement) -> Result<Expr, TextMetalError> {
        match el.name.as_str() {
            "Value" => {
                let data = el.attr("data").unwrap_or_default();
                let value = match el.attr("type").unwrap_or("string") {
                    "string" => Value::String(data.to_string()),
                    "number" => serde_json::from_str::<serde_json::Number>(data.trim())
                        .map(Value::Number)
                        .map_err(|_| self.error(el.line, format!("'{data}' is not a number")))?,
                    "bool" => Value::Bool(self.parse_bool(data, el.line)?),
                    "null" => Value::Null,
                    other => {
                        return Err(self.error(el.line, format!("unknown value type '{other}'")))
                    }
                };
                Ok(Expr::Literal(value))
            }
            "Facet" => {
                let name = self.required(el, "name")?;
                parse_path(name)
                    .map(Expr::Path)
                    .map_err(|e| self.locate(el.line, e))
            }
            "Unary" => {
                let operand = self.single_expression(el)?;
                let op = match self.required(el, "operator")? {
                    "not" => UnaryOp::Not,
                    "neg" => UnaryOp::Neg,
                    "isnull" => UnaryOp::IsNull,
                    "isdef" => {
                        return match operand {
                            Expr::Path(path) => Ok(Expr::Defined(path)),
                            _ => Err(self.error(el.line, "isdef needs a <Facet> operand")),
                        }
                    }
                    other => {
                        return Err(self.error(el.line, format!("unknown unary operator '{other}'")))
                    }
                };
                Ok(Expr::Unary(op, Box::new(operand)))
            }
            "Binary" => {
                let op = match self.required(el, "operator")? {
                    "eq" => BinaryOp::Eq,
                    "ne" => BinaryOp::Ne,
                    "lt" => BinaryOp::Lt,
                    "le" => BinaryOp::Le,
                    "gt" => BinaryOp::Gt,
                    "ge" => BinaryOp::Ge,
                    "and" => BinaryOp::And,
                    "or" => BinaryOp::Or,
                    "add" => BinaryOp::Add,
                    "sub" => BinaryOp::Sub,
                    "mul" => BinaryOp::Mul,
                    "div" => BinaryOp::Div,
                    "mod" => BinaryOp::Mod,
                    "concat" => BinaryOp::Concat,
                    other => {
                        return Err(
                            self.error(el.line, format!("unknown binary operator '{other}'"))
                        )
                    }
                };
                let operands: Vec<&XmlElement> = el.elements().collect();
                let [left, right] = operands.as_slice() else {
                    return Err(self.error(el.line, "<Binary> needs exactly two operands"));
                };
                Ok(Expr::Binary(
                    op,
                    Box::new(self.expression_element(left)?),
                    Box::new(self.expression_element(right)?),
                ))
            }
            "Call" => {
                let function = self.required(el, "function")?.to_string();
                let args = el
                    .elements()
                    .map(|arg| self.expression_element(arg))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Expr::Call(function, args))
            }
            other => Err(self.error(el.line, format!("<{other}> is not an expression element"))),
        }
    }

    fn interpolate(&self, text: &str, line: usize) -> Result<Interpolated, TextMetalError> {
        parse_interpolated(text).map_err(|e| self.locate(line, e))
    }

    fn parse_attr_expr(&self, source: &str, line: usize) -> Result<Expr, TextMetalError> {
        parse_attribute_expression(source).map_err(|e| self.locate(line, e))
    }

    fn required<'e>(&self, el: &'e XmlElement, attr: &str) -> Result<&'e str, TextMetalError> {
        el.attr(attr)
            .ok_or_else(|| self.error(el.line, format!("<{}> needs a '{attr}' attribute", el.name)))
    }

    fn expression_attr(&self, el: &XmlElement, attr: &str) -> Result<Expr, TextMetalError> {
        self.parse_attr_expr(self.required(el, attr)?, el.line)
    }

    fn optional_expression_attr(
        &self,
        el: &XmlElement,
        attr: &str,
    ) -> Result<Option<Expr>, TextMetalError> {
        el.attr(attr)
            .map(|source| self.parse_attr_expr(source, el.line))
            .transpose()
    }

    /// A variable-name attribute, which must be a plain identifier.
    fn variable(&self, el: &XmlElement, attr: &str) -> Result<Option<String>, TextMetalError> {
        let Some(name) = el.attr(attr) else {
            return Ok(None);
        };
        let is_identifier = name.starts_with(|c: char| c.is_alphabetic() || c == '_')
            && name.chars().all(|c| c.is_alphanumeric() || c == '_');
        if !is_identifier {
            return Err(self.error(el.line, format!("'{name}' is not a valid variable name")));
        }
        Ok(Some(name.to_string()))
    }

    fn token_name(&self, el: &XmlElement) -> Result<String, TextMetalError> {
        self.variable(el, "token")?
            .ok_or_else(|| self.error(el.line, format!("<{}> needs a 'token' attribute", el.name)))
    }

    fn flag(&self, el: &XmlElement, attr: &str) -> Result<bool, TextMetalError> {
        match el.attr(attr) {
            Some(value) => self.parse_bool(value, el.line),
            None => Ok(false),
        }
    }

    fn parse_bool(&self, value: &str, line: usize) -> Result<bool, TextMetalError> {
        match value.trim() {
            "true" | "1" => Ok(true),
            "false" | "0" => Ok(false),
            other => Err(self.error(line, format!("'{other}' is not a boolean"))),
        }
    }
}
