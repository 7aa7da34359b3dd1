use heck::{
    ToKebabCase, ToLowerCamelCase, ToShoutySnakeCase, ToSnakeCase, ToTitleCase, ToUpperCamelCase,
};
use serde_json::Value;

use super::value::{display, equals, type_name};
use crate::error::TextMetalError;
use crate::inflect::{pluralize, singularize};

/// Invoke a built-in function on already-evaluated arguments.
///
/// `default` is not here: it is evaluated lazily by the evaluator.
pub fn call(name: &str, args: &[Value]) -> Result<Value, TextMetalError> {
    let value = match (name, args) {
        ("upper", [s]) => Value::String(display(s).to_uppercase()),
        ("lower", [s]) => Value::String(display(s).to_lowercase()),
        ("trim", [s]) => Value::String(display(s).trim().to_string()),
        ("pascal", [s]) => Value::String(display(s).to_upper_camel_case()),
        ("camel", [s]) => Value::String(display(s).to_lower_camel_case()),
        ("snake", [s]) => Value::String(display(s).to_snake_case()),
        ("constant", [s]) => Value::String(display(s).to_shouty_snake_case()),
        ("kebab", [s]) => Value::String(display(s).to_kebab_case()),
        ("title", [s]) => Value::String(display(s).to_title_case()),
        ("plural", [s]) => Value::String(inflect_last_word(&display(s), pluralize)),
        ("singular", [s]) => Value::String(inflect_last_word(&display(s), singularize)),
        ("len", [v]) => Value::from(length(v)?),
        ("join", [Value::Array(items)]) => Value::String(join(items, ", ")),
        ("join", [Value::Array(items), sep]) => Value::String(join(items, &display(sep))),
        ("concat", parts) => Value::String(parts.iter().map(display).collect()),
        ("replace", [s, from, to]) => {
            Value::String(display(s).replace(&display(from), &display(to)))
        }
        ("starts_with", [s, prefix]) => Value::Bool(display(s).starts_with(&display(prefix))),
        ("ends_with", [s, suffix]) => Value::Bool(display(s).ends_with(&display(suffix))),
        ("contains", [Value::Array(items), needle]) => {
            Value::Bool(items.iter().any(|item| equals(item, needle)))
        }
        ("contains", [Value::Object(map), key]) => Value::Bool(map.contains_key(&display(key))),
        ("contains", [s, needle]) => Value::Bool(display(s).contains(&display(needle))),
        ("first", [Value::Array(items)]) => items.first().cloned().unwrap_or(Value::Null),
        ("last", [Value::Array(items)]) => items.last().cloned().unwrap_or(Value::Null),
        ("json", [v]) => Value::String(v.to_string()),
        _ => return Err(bad_call(name, args)),
    };
    Ok(value)
}

fn bad_call(name: &str, args: &[Value]) -> TextMetalError {
    const KNOWN: &[&str] = &[
        "upper", "lower", "trim", "pascal", "camel", "snake", "constant", "kebab", "title",
        "plural", "singular", "len", "join", "default", "concat", "replace", "starts_with",
        "ends_with", "contains", "first", "last", "json",
    ];
    if !KNOWN.contains(&name) {
        return TextMetalError::UnknownFunction(name.to_string());
    }
    let types: Vec<&str> = args.iter().map(type_name).collect();
    TextMetalError::TypeMismatch(format!("{name}() cannot take ({})", types.join(", ")))
}

fn length(value: &Value) -> Result<usize, TextMetalError> {
    match value {
        Value::String(s) => Ok(s.chars().count()),
        Value::Array(items) => Ok(items.len()),
        Value::Object(map) => Ok(map.len()),
        Value::Null => Ok(0),
        other => Err(TextMetalError::TypeMismatch(format!(
            "len() of {}",
            type_name(other)
        ))),
    }
}

fn join(items: &[Value], separator: &str) -> String {
    items.iter().map(display).collect::<Vec<_>>().join(separator)
}

/// Inflect the last word of a name and keep the word's casing, so
/// `OrderItem` becomes `OrderItems` and `ORDER_ITEM` becomes `ORDER_ITEMS`.
fn inflect_last_word(name: &str, inflect: fn(&str) -> String) -> String {
    let start = last_word_start(name);
    let (head, word) = name.split_at(start);
    if word.is_empty() {
        return name.to_string();
    }
    let inflected = inflect(&word.to_lowercase());
    let cased = if word.chars().all(|c| !c.is_lowercase()) && word.chars().count() > 1 {
        inflected.to_uppercase()
    } else if word.starts_with(char::is_uppercase) {
        let mut chars = inflected.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => inflected,
        }
    } else {
        inflected
    };
    format!("{head}{cased}")
}

/// Byte offset of the last word: after the last separator, or at the last
/// lower-to-upper case boundary.
fn last_word_start(name: &str) -> usize {
    let mut start = 0;
    let mut prev: Option<char> = None;
    for (i, c) in name.char_indices() {
        if matches!(c, '_' | '-' | ' ' | '.') {
            start = i + c.len_utf8();
        } else if c.is_uppercase() && prev.is_some_and(|p| p.is_lowercase() || p.is_ascii_digit()) {
            start = i;
        }
        prev = Some(c);
    }
    start
}
