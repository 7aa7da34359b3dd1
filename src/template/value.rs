//! Truthiness, display, comparison and arithmetic over `serde_json::Value`.

use std::cmp::Ordering;

use serde_json::{Number, Value};

use super::ast::BinaryOp;
use crate::error::TextMetalError;

/// null, false, 0, "" and [] are false; everything else is true.
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(_) => true,
    }
}

/// Text written to output: strings raw, null empty, containers as JSON.
pub fn display(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

/// Equality that treats `1` and `1.0` as equal.
pub fn equals(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => match (a.as_i64(), b.as_i64()) {
            (Some(x), Some(y)) => x == y,
            _ => a.as_f64() == b.as_f64(),
        },
        _ => left == right,
    }
}

/// Ordering for numbers and strings; anything else is a type mismatch.
pub fn compare(left: &Value, right: &Value) -> Result<Ordering, TextMetalError> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => {
            if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
                return Ok(x.cmp(&y));
            }
            let (x, y) = (float(a), float(b));
            x.partial_cmp(&y).ok_or_else(|| {
                TextMetalError::TypeMismatch(format!("cannot compare {x} and {y}"))
            })
        }
        (Value::String(a), Value::String(b)) => Ok(a.cmp(b)),
        _ => Err(TextMetalError::TypeMismatch(format!(
            "cannot compare {} with {}",
            type_name(left),
            type_name(right)
        ))),
    }
}

/// `+ - * / % concat`. `+` concatenates when either side is a string.
pub fn arithmetic(op: BinaryOp, left: &Value, right: &Value) -> Result<Value, TextMetalError> {
    if op == BinaryOp::Concat
        || (op == BinaryOp::Add && (left.is_string() || right.is_string()))
    {
        return Ok(Value::String(display(left) + &display(right)));
    }

    let (Value::Number(a), Value::Number(b)) = (left, right) else {
        return Err(TextMetalError::TypeMismatch(format!(
            "{op:?} needs numbers, got {} and {}",
            type_name(left),
            type_name(right)
        )));
    };

    let is_zero = b.as_f64() == Some(0.0);
    if matches!(op, BinaryOp::Div | BinaryOp::Mod) && is_zero {
        return Err(TextMetalError::TypeMismatch("division by zero".to_string()));
    }

    if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
        let exact = match op {
            BinaryOp::Add => x.checked_add(y),
            BinaryOp::Sub => x.checked_sub(y),
            BinaryOp::Mul => x.checked_mul(y),
            BinaryOp::Div if x.checked_rem(y) == Some(0) => x.checked_div(y),
            BinaryOp::Mod => x.checked_rem(y),
            _ => None,
        };
        if let Some(n) = exact {
            return Ok(Value::from(n));
        }
    }

    let (x, y) = (float(a), float(b));
    let result = match op {
        BinaryOp::Add => x + y,
        BinaryOp::Sub => x - y,
        BinaryOp::Mul => x * y,
        BinaryOp::Div => x / y,
        BinaryOp::Mod => x % y,
        other => {
            return Err(TextMetalError::TypeMismatch(format!(
                "{other:?} is not an arithmetic operator"
            )))
        }
    };
    Number::from_f64(result)
        .map(Value::Number)
        .ok_or_else(|| TextMetalError::TypeMismatch(format!("{result} is not a finite number")))
}

pub fn negate(value: &Value) -> Result<Value, TextMetalError> {
    match value {
        Value::Number(n) => match n.as_i64().and_then(i64::checked_neg) {
            Some(i) => Ok(Value::from(i)),
            None => Ok(Value::from(-float(n))),
        },
        other => Err(TextMetalError::TypeMismatch(format!(
            "cannot negate {}",
            type_name(other)
        ))),
    }
}

pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn float(n: &Number) -> f64 {
    n.as_f64().unwrap_or(f64::NAN)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_truthy() {
        for falsy in [json!(null), json!(false), json!(0), json!(0.0), json!(""), json!([])] {
            assert!(!truthy(&falsy), "{falsy} should be false");
        }
        for t in [json!(true), json!(1), json!("x"), json!([0]), json!({})] {
            assert!(truthy(&t), "{t} should be true");
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(display(&json!(null)), "");
        assert_eq!(display(&json!("raw \"text\"")), "raw \"text\"");
        assert_eq!(display(&json!(3)), "3");
        assert_eq!(display(&json!([1, "a"])), r#"[1,"a"]"#);
    }

    #[test]
    fn test_numeric_equality() {
        assert!(equals(&json!(1), &json!(1.0)));
        assert!(!equals(&json!(1), &json!("1")));
        assert!(equals(&json!({"a": [1]}), &json!({"a": [1]})));
    }

    #[test]
    fn test_compare() {
        assert_eq!(compare(&json!(2), &json!(10)).unwrap(), Ordering::Less);
        assert_eq!(compare(&json!(2.5), &json!(2)).unwrap(), Ordering::Greater);
        assert_eq!(compare(&json!("b"), &json!("a")).unwrap(), Ordering::Greater);
        assert!(compare(&json!("1"), &json!(1)).is_err());
        assert!(compare(&json!(null), &json!(null)).is_err());
    }

    #[test]
    fn test_arithmetic() {
        assert_eq!(arithmetic(BinaryOp::Add, &json!(2), &json!(3)).unwrap(), json!(5));
        assert_eq!(arithmetic(BinaryOp::Div, &json!(6), &json!(3)).unwrap(), json!(2));
        assert_eq!(arithmetic(BinaryOp::Div, &json!(7), &json!(2)).unwrap(), json!(3.5));
        assert_eq!(arithmetic(BinaryOp::Mod, &json!(7), &json!(4)).unwrap(), json!(3));
        assert_eq!(arithmetic(BinaryOp::Add, &json!("v"), &json!(2)).unwrap(), json!("v2"));
        assert_eq!(arithmetic(BinaryOp::Concat, &json!(1), &json!(2)).unwrap(), json!("12"));
        assert!(arithmetic(BinaryOp::Sub, &json!("a"), &json!(1)).is_err());
    }

    #[test]
    fn test_division_by_zero() {
        assert!(arithmetic(BinaryOp::Div, &json!(1), &json!(0)).is_err());
        assert!(arithmetic(BinaryOp::Mod, &json!(1.5), &json!(0.0)).is_err());
    }

    #[test]
    fn test_negate() {
        assert_eq!(negate(&json!(4)).unwrap(), json!(-4));
        assert_eq!(negate(&json!(1.5)).unwrap(), json!(-1.5));
        assert!(negate(&json!("x")).is_err());
    }
}
