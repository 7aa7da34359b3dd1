//! `${...}` token splitting and the token expression grammar.
//!
//! Precedence, lowest first: filter `|`, `||`, `&&`, `== !=`,
//! `< <= > >=`, `+ -`, `* / %`, unary `! -`, then primaries.

use serde_json::Value;

use super::ast::{BinaryOp, Expr, Interpolated, Path, PathSegment, Segment, UnaryOp};
use crate::error::TextMetalError;

/// Split text into literal runs and `${...}` tokens. `$${` is an escaped
/// `${`.
pub fn parse_interpolated(text: &str) -> Result<Interpolated, TextMetalError> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut rest = text;

    while let Some(pos) = rest.find("${") {
        if rest[..pos].ends_with('$') {
            literal.push_str(&rest[..pos - 1]);
            literal.push_str("${");
            rest = &rest[pos + 2..];
            continue;
        }
        literal.push_str(&rest[..pos]);
        let body = &rest[pos + 2..];
        let end = token_end(body).ok_or_else(|| {
            TextMetalError::expression(&rest[pos..], "unterminated token")
        })?;
        let source = body[..end].trim();
        if source.is_empty() {
            return Err(TextMetalError::expression("${}", "empty token"));
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(std::mem::take(&mut literal)));
        }
        segments.push(Segment::Token {
            source: source.to_string(),
            expr: parse_expression(source)?,
        });
        rest = &body[end + 1..];
    }

    literal.push_str(rest);
    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }
    Ok(segments)
}

/// Index of the `}` closing a token, skipping braces inside string literals.
fn token_end(body: &str) -> Option<usize> {
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for (i, c) in body.char_indices() {
        match quote {
            Some(_) if escaped => escaped = false,
            Some(_) if c == '\\' => escaped = true,
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if c == '\'' || c == '"' => quote = Some(c),
            None if c == '}' => return Some(i),
            None => {}
        }
    }
    None
}

/// Parse an expression attribute. A value wrapped in a single `${...}`
/// token is accepted as well as the bare expression.
pub fn parse_attribute_expression(source: &str) -> Result<Expr, TextMetalError> {
    let trimmed = source.trim();
    if let Some(inner) = trimmed.strip_prefix("${").and_then(|s| s.strip_suffix('}')) {
        if token_end(inner).is_none() {
            return parse_expression(inner);
        }
    }
    parse_expression(trimmed)
}

pub fn parse_expression(source: &str) -> Result<Expr, TextMetalError> {
    let tokens = lex(source)?;
    let mut parser = Parser {
        source,
        tokens,
        pos: 0,
    };
    let expr = parser.filter()?;
    if let Some(tok) = parser.peek() {
        return Err(parser.error(format!("unexpected {tok:?}")));
    }
    Ok(expr)
}

pub fn parse_path(source: &str) -> Result<Path, TextMetalError> {
    match parse_expression(source)? {
        Expr::Path(path) => Ok(path),
        _ => Err(TextMetalError::expression(source, "expected a path")),
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Tok {
    Str(String),
    Int(i64),
    Float(f64),
    Ident(String),
    Dot,
    LBracket,
    RBracket,
    LParen,
    RParen,
    Comma,
    Pipe,
    OrOr,
    AndAnd,
    EqEq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Bang,
}

fn lex(source: &str) -> Result<Vec<Tok>, TextMetalError> {
    let chars: Vec<char> = source.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();
        let (tok, width) = match c {
            c if c.is_whitespace() => {
                i += 1;
                continue;
            }
            '\'' | '"' => {
                let (s, consumed) = lex_string(&chars[i..], source)?;
                (Tok::Str(s), consumed)
            }
            c if c.is_ascii_digit() => {
                let start = i;
                let mut end = i;
                while end < chars.len() && chars[end].is_ascii_digit() {
                    end += 1;
                }
                let is_float = end + 1 < chars.len()
                    && chars[end] == '.'
                    && chars[end + 1].is_ascii_digit();
                if is_float {
                    end += 1;
                    while end < chars.len() && chars[end].is_ascii_digit() {
                        end += 1;
                    }
                }
                let text: String = chars[start..end].iter().collect();
                let tok = if is_float {
                    Tok::Float(text.parse().map_err(|_| {
                        TextMetalError::expression(source, format!("bad number {text}"))
                    })?)
                } else {
                    Tok::Int(text.parse().map_err(|_| {
                        TextMetalError::expression(source, format!("bad number {text}"))
                    })?)
                };
                (tok, end - start)
            }
            c if c.is_alphabetic() || c == '_' => {
                let start = i;
                let mut end = i;
                while end < chars.len() && (chars[end].is_alphanumeric() || chars[end] == '_') {
                    end += 1;
                }
                (Tok::Ident(chars[start..end].iter().collect()), end - start)
            }
            '.' => (Tok::Dot, 1),
            '[' => (Tok::LBracket, 1),
            ']' => (Tok::RBracket, 1),
            '(' => (Tok::LParen, 1),
            ')' => (Tok::RParen, 1),
            ',' => (Tok::Comma, 1),
            '|' if next == Some('|') => (Tok::OrOr, 2),
            '|' => (Tok::Pipe, 1),
            '&' if next == Some('&') => (Tok::AndAnd, 2),
            '=' if next == Some('=') => (Tok::EqEq, 2),
            '!' if next == Some('=') => (Tok::NotEq, 2),
            '!' => (Tok::Bang, 1),
            '<' if next == Some('=') => (Tok::Le, 2),
            '<' => (Tok::Lt, 1),
            '>' if next == Some('=') => (Tok::Ge, 2),
            '>' => (Tok::Gt, 1),
            '+' => (Tok::Plus, 1),
            '-' => (Tok::Minus, 1),
            '*' => (Tok::Star, 1),
            '/' => (Tok::Slash, 1),
            '%' => (Tok::Percent, 1),
            other => {
                return Err(TextMetalError::expression(
                    source,
                    format!("unexpected character '{other}'"),
                ))
            }
        };
        tokens.push(tok);
        i += width;
    }

    Ok(tokens)
}

/// Lex a quoted string starting at `chars[0]`; returns the value and the
/// number of chars consumed.
fn lex_string(chars: &[char], source: &str) -> Result<(String, usize), TextMetalError> {
    let quote = chars[0];
    let mut out = String::new();
    let mut i = 1;
    while i < chars.len() {
        match chars[i] {
            '\\' => {
                let escaped = chars
                    .get(i + 1)
                    .ok_or_else(|| TextMetalError::expression(source, "unterminated string"))?;
                out.push(match escaped {
                    'n' => '\n',
                    't' => '\t',
                    'r' => '\r',
                    other => *other,
                });
                i += 2;
            }
            c if c == quote => return Ok((out, i + 1)),
            c => {
                out.push(c);
                i += 1;
            }
        }
    }
    Err(TextMetalError::expression(source, "unterminated string"))
}

struct Parser<'a> {
    source: &'a str,
    tokens: Vec<Tok>,
    pos: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Tok> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Tok> {
        let tok = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        tok
    }

    fn eat(&mut self, tok: &Tok) -> bool {
        if self.peek() == Some(tok) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, tok: &Tok) -> Result<(), TextMetalError> {
        if self.eat(tok) {
            Ok(())
        } else {
            Err(self.error(format!("expected {tok:?}")))
        }
    }

    fn error(&self, message: impl Into<String>) -> TextMetalError {
        TextMetalError::expression(self.source, message)
    }

    fn filter(&mut self) -> Result<Expr, TextMetalError> {
        let mut expr = self.or()?;
        while self.eat(&Tok::Pipe) {
            let Some(Tok::Ident(name)) = self.next() else {
                return Err(self.error("expected a function name after '|'"));
            };
            let mut args = vec![expr];
            if self.eat(&Tok::LParen) {
                args.extend(self.arguments()?);
            }
            expr = Expr::Call(name, args);
        }
        Ok(expr)
    }

    fn or(&mut self) -> Result<Expr, TextMetalError> {
        let mut left = self.and()?;
        while self.eat(&Tok::OrOr) {
            let right = self.and()?;
            left = Expr::Binary(BinaryOp::Or, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn and(&mut self) -> Result<Expr, TextMetalError> {
        let mut left = self.equality()?;
        while self.eat(&Tok::AndAnd) {
            let right = self.equality()?;
            left = Expr::Binary(BinaryOp::And, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn equality(&mut self) -> Result<Expr, TextMetalError> {
        let mut left = self.comparison()?;
        loop {
            let op = match self.peek() {
                Some(Tok::EqEq) => BinaryOp::Eq,
                Some(Tok::NotEq) => BinaryOp::Ne,
                _ => return Ok(left),
            };
            self.pos += 1;
            let right = self.comparison()?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
    }

    fn comparison(&mut self) -> Result<Expr, TextMetalError> {
        let mut left = self.additive()?;
        loop {
            let op = match self.peek() {
                Some(Tok::Lt) => BinaryOp::Lt,
                Some(Tok::Le) => BinaryOp::Le,
                Some(Tok::Gt) => BinaryOp::Gt,
                Some(Tok::Ge) => BinaryOp::Ge,
                _ => return Ok(left),
            };
            self.pos += 1;
            let right = self.additive()?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
    }

    fn additive(&mut self) -> Result<Expr, TextMetalError> {
        let mut left = self.multiplicative()?;
        loop {
            let op = match self.peek() {
                Some(Tok::Plus) => BinaryOp::Add,
                Some(Tok::Minus) => BinaryOp::Sub,
                _ => return Ok(left),
            };
            self.pos += 1;
            let right = self.multiplicative()?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
    }

    fn multiplicative(&mut self) -> Result<Expr, TextMetalError> {
        let mut left = self.unary()?;
        loop {
            let op = match self.peek() {
                Some(Tok::Star) => BinaryOp::Mul,
                Some(Tok::Slash) => BinaryOp::Div,
                Some(Tok::Percent) => BinaryOp::Mod,
                _ => return Ok(left),
            };
            self.pos += 1;
            let right = self.unary()?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
    }

    fn unary(&mut self) -> Result<Expr, TextMetalError> {
        if self.eat(&Tok::Bang) {
            return Ok(Expr::Unary(UnaryOp::Not, Box::new(self.unary()?)));
        }
        if self.eat(&Tok::Minus) {
            return Ok(Expr::Unary(UnaryOp::Neg, Box::new(self.unary()?)));
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<Expr, TextMetalError> {
        match self.next() {
            Some(Tok::Str(s)) => Ok(Expr::Literal(Value::String(s))),
            Some(Tok::Int(n)) => Ok(Expr::Literal(Value::from(n))),
            Some(Tok::Float(f)) => Ok(Expr::Literal(Value::from(f))),
            Some(Tok::LParen) => {
                let expr = self.filter()?;
                self.expect(&Tok::RParen)?;
                Ok(expr)
            }
            Some(Tok::Ident(name)) => match name.as_str() {
                "true" => Ok(Expr::Literal(Value::Bool(true))),
                "false" => Ok(Expr::Literal(Value::Bool(false))),
                "null" => Ok(Expr::Literal(Value::Null)),
                _ if self.eat(&Tok::LParen) => self.call(name),
                _ => self.path(name).map(Expr::Path),
            },
            Some(tok) => Err(self.error(format!("unexpected {tok:?}"))),
            None => Err(self.error("unexpected end of expression")),
        }
    }

    fn call(&mut self, name: String) -> Result<Expr, TextMetalError> {
        let args = self.arguments()?;
        if name == "defined" {
            return match args.as_slice() {
                [Expr::Path(path)] => Ok(Expr::Defined(path.clone())),
                _ => Err(self.error("defined() takes a single path")),
            };
        }
        Ok(Expr::Call(name, args))
    }

    /// Arguments after an opening parenthesis, through the closing one.
    fn arguments(&mut self) -> Result<Vec<Expr>, TextMetalError> {
        let mut args = Vec::new();
        if self.eat(&Tok::RParen) {
            return Ok(args);
        }
        loop {
            args.push(self.filter()?);
            if self.eat(&Tok::RParen) {
                return Ok(args);
            }
            self.expect(&Tok::Comma)?;
        }
    }

    fn path(&mut self, head: String) -> Result<Path, TextMetalError> {
        let mut segments = vec![PathSegment::Field(head)];
        loop {
            if self.eat(&Tok::Dot) {
                match self.next() {
                    Some(Tok::Ident(field)) => segments.push(PathSegment::Field(field)),
                    _ => return Err(self.error("expected a field name after '.'")),
                }
            } else if self.eat(&Tok::LBracket) {
                match self.next() {
                    Some(Tok::Int(n)) if n >= 0 => segments.push(PathSegment::Index(n as usize)),
                    _ => return Err(self.error("expected a non-negative index")),
                }
                self.expect(&Tok::RBracket)?;
            } else {
                return Ok(Path { segments });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(name: &str) -> PathSegment {
        PathSegment::Field(name.to_string())
    }

    fn path_expr(names: &[&str]) -> Expr {
        Expr::Path(Path {
            segments: names.iter().map(|n| field(n)).collect(),
        })
    }

    #[test]
    fn test_interpolated_literals_and_tokens() {
        let segments = parse_interpolated("Hello ${ name }!").unwrap();
        assert_eq!(
            segments,
            vec![
                Segment::Literal("Hello ".to_string()),
                Segment::Token {
                    source: "name".to_string(),
                    expr: path_expr(&["name"]),
                },
                Segment::Literal("!".to_string()),
            ]
        );
    }

    #[test]
    fn test_escaped_token() {
        let segments = parse_interpolated("cost: $${price} ${x}").unwrap();
        assert_eq!(segments[0], Segment::Literal("cost: ${price} ".to_string()));
        assert_eq!(segments.len(), 2);
    }

    #[test]
    fn test_brace_inside_string_literal() {
        let segments = parse_interpolated("${ concat('{', x, '}') }").unwrap();
        assert_eq!(segments.len(), 1);
    }

    #[test]
    fn test_unterminated_token() {
        let err = parse_interpolated("abc ${name").unwrap_err();
        assert!(matches!(err, TextMetalError::ExpressionSyntax { .. }));
        assert!(parse_interpolated("${}").is_err());
    }

    #[test]
    fn test_precedence() {
        let expr = parse_expression("a + b * 2 == 7 && !c").unwrap();
        let Expr::Binary(BinaryOp::And, left, right) = expr else {
            panic!("expected &&");
        };
        assert!(matches!(*right, Expr::Unary(UnaryOp::Not, _)));
        let Expr::Binary(BinaryOp::Eq, sum, _) = *left else {
            panic!("expected ==");
        };
        let Expr::Binary(BinaryOp::Add, _, product) = *sum else {
            panic!("expected +");
        };
        assert!(matches!(*product, Expr::Binary(BinaryOp::Mul, _, _)));
    }

    #[test]
    fn test_filter_becomes_call() {
        let expr = parse_expression("name | replace('_', ' ') | upper").unwrap();
        let Expr::Call(outer, outer_args) = expr else {
            panic!("expected call");
        };
        assert_eq!(outer, "upper");
        assert!(matches!(&outer_args[0], Expr::Call(name, args) if name == "replace" && args.len() == 3));
    }

    #[test]
    fn test_paths_and_indexes() {
        let expr = parse_expression("model.tables[1].names.pascal_case").unwrap();
        let Expr::Path(path) = expr else {
            panic!("expected path");
        };
        assert_eq!(path.segments[2], PathSegment::Index(1));
        assert_eq!(path.to_string(), "model.tables[1].names.pascal_case");
    }

    #[test]
    fn test_literals() {
        assert!(parse_expression("'it''s'").is_err());
        assert_eq!(
            parse_expression(r#""say \"hi\"""#).unwrap(),
            Expr::Literal(Value::String("say \"hi\"".to_string()))
        );
        assert_eq!(parse_expression("42").unwrap(), Expr::Literal(Value::from(42)));
        assert_eq!(parse_expression("2.5").unwrap(), Expr::Literal(Value::from(2.5)));
        assert_eq!(parse_expression("null").unwrap(), Expr::Literal(Value::Null));
    }

    #[test]
    fn test_defined_requires_path() {
        assert!(matches!(parse_expression("defined(a.b)").unwrap(), Expr::Defined(_)));
        assert!(parse_expression("defined('a')").is_err());
    }

    #[test]
    fn test_syntax_errors() {
        assert!(parse_expression("a +").is_err());
        assert!(parse_expression("a b").is_err());
        assert!(parse_expression("a = b").is_err());
        assert!(parse_expression("f(a,").is_err());
        assert!(parse_expression("a[-1]").is_err());
    }

    #[test]
    fn test_attribute_expression_accepts_token_form() {
        assert_eq!(
            parse_attribute_expression("${ model.tables }").unwrap(),
            parse_attribute_expression("model.tables").unwrap()
        );
    }
}
