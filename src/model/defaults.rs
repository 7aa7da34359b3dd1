use crate::dialect::Dialect;

/// Normalise a column default to the bare expression a template would emit.
pub fn clean_default(default: &str, dialect: Dialect) -> String {
    match dialect {
        Dialect::Postgres => strip_pg_typecast(default).to_string(),
        Dialect::Mssql => strip_mssql_parens(default).to_string(),
        Dialect::Sqlite => strip_outer_parens(default.trim()).to_string(),
    }
}

/// Strip PostgreSQL type casts from a default expression.
/// e.g. "'hello'::character varying" -> "'hello'"
/// e.g. "0::integer" -> "0"
fn strip_pg_typecast(expr: &str) -> &str {
    // Find the last :: that's not inside quotes
    if let Some(pos) = find_typecast_pos(expr) {
        expr[..pos].trim()
    } else {
        expr.trim()
    }
}

fn find_typecast_pos(expr: &str) -> Option<usize> {
    let bytes = expr.as_bytes();
    let mut in_quotes = false;
    let mut in_parens = 0u32;
    let mut i = 0;
    let mut last_cast_pos = None;

    while i < bytes.len() {
        match bytes[i] {
            b'\'' => in_quotes = !in_quotes,
            b'(' if !in_quotes => in_parens += 1,
            b')' if !in_quotes => in_parens = in_parens.saturating_sub(1),
            b':' if !in_quotes && in_parens == 0 && i + 1 < bytes.len() && bytes[i + 1] == b':' => {
                last_cast_pos = Some(i);
                i += 1; // skip second ':'
            }
            _ => {}
        }
        i += 1;
    }

    last_cast_pos
}

/// Strip MSSQL wrapping parentheses and leading N from string literals.
/// e.g. "((0))" -> "0"
/// e.g. "(N'hello')" -> "'hello'"
fn strip_mssql_parens(expr: &str) -> &str {
    let mut s = strip_outer_parens(expr.trim());
    // Strip leading N from N'string' literals
    if s.starts_with("N'") {
        s = &s[1..];
    }
    s.trim()
}

/// Strip parentheses that wrap the whole expression, leaving `(a) + (b)` intact.
fn strip_outer_parens(mut s: &str) -> &str {
    while s.starts_with('(') && s.ends_with(')') && closes_at_end(s) {
        s = s[1..s.len() - 1].trim();
    }
    s
}

/// Whether the opening paren at index 0 is matched by the final character.
fn closes_at_end(s: &str) -> bool {
    let mut depth = 0i32;
    let mut in_quotes = false;
    for (i, c) in s.char_indices() {
        match c {
            '\'' => in_quotes = !in_quotes,
            '(' if !in_quotes => depth += 1,
            ')' if !in_quotes => {
                depth -= 1;
                if depth == 0 {
                    return i == s.len() - 1;
                }
            }
            _ => {}
        }
    }
    false
}

/// Check if a column default is a serial/sequence default.
/// PG: starts with `nextval(`; other dialects report identity separately.
pub fn is_serial_default(default: &str, dialect: Dialect) -> bool {
    match dialect {
        Dialect::Postgres => default.starts_with("nextval("),
        Dialect::Mssql | Dialect::Sqlite => false,
    }
}
