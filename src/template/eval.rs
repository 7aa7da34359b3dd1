use serde_json::Value;

use super::ast::{BinaryOp, Expr, UnaryOp};
use super::context::TemplatingContext;
use super::functions;
use super::value::{arithmetic, compare, equals, negate, truthy};
use crate::error::TextMetalError;

/// What an unresolved path evaluates to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Missing {
    /// Fail with [`TextMetalError::Unresolved`].
    Error,
    /// Evaluate to null.
    Null,
}

impl Missing {
    /// Conditions and loop sources: strict contexts fail, lenient ones see null.
    pub fn for_context(ctx: &TemplatingContext) -> Self {
        if ctx.is_strict() {
            Missing::Error
        } else {
            Missing::Null
        }
    }
}

pub fn evaluate(
    expr: &Expr,
    ctx: &TemplatingContext,
    missing: Missing,
) -> Result<Value, TextMetalError> {
    match expr {
        Expr::Literal(value) => Ok(value.clone()),
        Expr::Path(path) => match ctx.resolve(path) {
            Some(value) => Ok(value),
            None if missing == Missing::Null => Ok(Value::Null),
            None => Err(TextMetalError::Unresolved(path.to_string())),
        },
        Expr::Defined(path) => Ok(Value::Bool(ctx.is_defined(path))),
        Expr::Unary(op, operand) => {
            let value = evaluate(operand, ctx, missing)?;
            match op {
                UnaryOp::Not => Ok(Value::Bool(!truthy(&value))),
                UnaryOp::Neg => negate(&value),
                UnaryOp::IsNull => Ok(Value::Bool(value.is_null())),
            }
        }
        Expr::Binary(BinaryOp::And, left, right) => {
            if !truthy(&evaluate(left, ctx, missing)?) {
                return Ok(Value::Bool(false));
            }
            Ok(Value::Bool(truthy(&evaluate(right, ctx, missing)?)))
        }
        Expr::Binary(BinaryOp::Or, left, right) => {
            if truthy(&evaluate(left, ctx, missing)?) {
                return Ok(Value::Bool(true));
            }
            Ok(Value::Bool(truthy(&evaluate(right, ctx, missing)?)))
        }
        Expr::Binary(op, left, right) => {
            let l = evaluate(left, ctx, missing)?;
            let r = evaluate(right, ctx, missing)?;
            match op {
                BinaryOp::Eq => Ok(Value::Bool(equals(&l, &r))),
                BinaryOp::Ne => Ok(Value::Bool(!equals(&l, &r))),
                BinaryOp::Lt => Ok(Value::Bool(compare(&l, &r)?.is_lt())),
                BinaryOp::Le => Ok(Value::Bool(compare(&l, &r)?.is_le())),
                BinaryOp::Gt => Ok(Value::Bool(compare(&l, &r)?.is_gt())),
                BinaryOp::Ge => Ok(Value::Bool(compare(&l, &r)?.is_ge())),
                _ => arithmetic(*op, &l, &r),
            }
        }
        Expr::Call(name, args) if name == "default" => {
            let [value, fallback] = args.as_slice() else {
                return Err(TextMetalError::TypeMismatch(
                    "default() takes a value and a fallback".to_string(),
                ));
            };
            // An unresolved first argument falls back even in strict mode
            let first = evaluate(value, ctx, Missing::Null)?;
            if first.is_null() {
                evaluate(fallback, ctx, missing)
            } else {
                Ok(first)
            }
        }
        Expr::Call(name, args) => {
            let values = args
                .iter()
                .map(|arg| evaluate(arg, ctx, missing))
                .collect::<Result<Vec<_>, _>>()?;
            functions::call(name, &values)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use serde_json::json;

    use super::*;
    use crate::template::expr::parse_expression;

    fn ctx(strict: bool) -> TemplatingContext {
        TemplatingContext::new(
            json!({
                "table_name": "user_accounts",
                "columns": [
                    {"column_name": "id", "is_nullable": false},
                    {"column_name": "bio", "is_nullable": true}
                ],
                "count": 2
            }),
            BTreeMap::new(),
            strict,
        )
    }

    fn eval(source: &str) -> Value {
        evaluate(&parse_expression(source).unwrap(), &ctx(true), Missing::Error).unwrap()
    }

    #[test]
    fn test_paths_and_functions() {
        assert_eq!(eval("table_name | pascal"), json!("UserAccounts"));
        assert_eq!(eval("singular(table_name) | pascal"), json!("UserAccount"));
        assert_eq!(eval("columns[1].column_name"), json!("bio"));
        assert_eq!(eval("len(columns)"), json!(2));
    }

    #[test]
    fn test_operators() {
        assert_eq!(eval("count * 2 + 1"), json!(5));
        assert_eq!(eval("count >= 2 && !columns[0].is_nullable"), json!(true));
        assert_eq!(eval("'n=' + count"), json!("n=2"));
        assert_eq!(eval("-count"), json!(-2));
        assert_eq!(eval("count == 2.0"), json!(true));
    }

    #[test]
    fn test_short_circuit_skips_unresolved() {
        assert_eq!(eval("false && missing.field"), json!(false));
        assert_eq!(eval("true || missing.field"), json!(true));
    }

    #[test]
    fn test_missing_modes() {
        let expr = parse_expression("missing.field").unwrap();
        let strict = ctx(true);
        assert!(matches!(
            evaluate(&expr, &strict, Missing::Error),
            Err(TextMetalError::Unresolved(p)) if p == "missing.field"
        ));
        let lenient = ctx(false);
        assert_eq!(
            evaluate(&expr, &lenient, Missing::for_context(&lenient)).unwrap(),
            Value::Null
        );
    }

    #[test]
    fn test_defined_and_default() {
        assert_eq!(eval("defined(table_name)"), json!(true));
        assert_eq!(eval("defined(columns[5])"), json!(false));
        assert_eq!(eval("default(nickname, 'anon')"), json!("anon"));
        assert_eq!(eval("default(table_name, 'anon')"), json!("user_accounts"));
        assert_eq!(eval("nickname | default('anon') | upper"), json!("ANON"));
    }

    #[test]
    fn test_errors() {
        let strict = ctx(true);
        let run = |s: &str| evaluate(&parse_expression(s).unwrap(), &strict, Missing::Error);
        assert!(matches!(run("count / 0"), Err(TextMetalError::TypeMismatch(_))));
        assert!(matches!(run("nope(1)"), Err(TextMetalError::UnknownFunction(_))));
        assert!(run("default(1)").is_err());
        assert!(run("columns < 1").is_err());
    }
}
