//! Delimited text (CSV, TSV and friends) as template models.
//!
//! The model is `{"headers": [...], "records": [{header: value}, ...]}`.
//! Fields may be quoted with `"`; a doubled quote inside a quoted field is a
//! literal quote and quoted fields may span lines. All values are strings.

use csv::{ReaderBuilder, StringRecord};
use serde_json::{Map, Value};

use crate::error::TextMetalError;

pub fn parse_delimited(
    text: &str,
    delimiter: char,
    has_header: bool,
) -> Result<Value, TextMetalError> {
    let delimiter = u8::try_from(delimiter)
        .ok()
        .filter(|d| d.is_ascii() && !matches!(d, b'"' | b'\n' | b'\r'))
        .ok_or_else(|| {
            TextMetalError::Config(format!("{delimiter:?} cannot be used as a delimiter"))
        })?;

    // The header row is read as an ordinary record
    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| TextMetalError::Source(e.to_string()))?;
        if record.len() == 1 && record[0].is_empty() {
            continue;
        }
        rows.push(record);
    }

    let (headers, rows) = if has_header {
        let mut rows = rows.into_iter();
        let headers = match rows.next() {
            Some(row) => check_headers(row.iter().map(|h| h.trim().to_string()).collect())?,
            None => Vec::new(),
        };
        (headers, rows.collect::<Vec<_>>())
    } else {
        let width = rows.iter().map(StringRecord::len).max().unwrap_or(0);
        let headers = (1..=width).map(|i| format!("column{i}")).collect();
        (headers, rows)
    };

    let mut records = Vec::with_capacity(rows.len());
    for row in &rows {
        if row.len() > headers.len() {
            let line = row.position().map_or(0, |p| p.line());
            return Err(TextMetalError::Source(format!(
                "line {line}: {} fields but only {} headers",
                row.len(),
                headers.len()
            )));
        }
        // Short rows are padded with empty strings
        let record: Map<String, Value> = headers
            .iter()
            .enumerate()
            .map(|(i, header)| {
                let value = row.get(i).unwrap_or_default();
                (header.clone(), Value::String(value.to_string()))
            })
            .collect();
        records.push(Value::Object(record));
    }

    tracing::debug!("Read {} records with {} columns", records.len(), headers.len());

    let mut model = Map::new();
    model.insert(
        "headers".to_string(),
        Value::Array(headers.into_iter().map(Value::String).collect()),
    );
    model.insert("records".to_string(), Value::Array(records));
    Ok(Value::Object(model))
}

fn check_headers(headers: Vec<String>) -> Result<Vec<String>, TextMetalError> {
    for (i, header) in headers.iter().enumerate() {
        if header.is_empty() {
            return Err(TextMetalError::Source(format!("header {} is empty", i + 1)));
        }
        if headers[..i].contains(header) {
            return Err(TextMetalError::Source(format!("duplicate header '{header}'")));
        }
    }
    Ok(headers)
}

#[cfg(test)]
mod tests {
    use indoc::indoc;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_header_and_records() {
        let model = parse_delimited(
            indoc! {"
                id,name,city
                1,Ann,Oslo

                2,Bob
            "},
            ',',
            true,
        )
        .unwrap();

        assert_eq!(model["headers"], json!(["id", "name", "city"]));
        assert_eq!(
            model["records"],
            json!([
                {"id": "1", "name": "Ann", "city": "Oslo"},
                {"id": "2", "name": "Bob", "city": ""}
            ])
        );
    }

    #[test]
    fn test_quoted_fields() {
        let text = "name,note\r\n\"Smith, J\",\"said \"\"hi\"\"\r\ntwice\"\r\n";
        let model = parse_delimited(text, ',', true).unwrap();
        assert_eq!(model["records"][0]["name"], json!("Smith, J"));
        assert_eq!(model["records"][0]["note"], json!("said \"hi\"\r\ntwice"));
    }

    #[test]
    fn test_no_header() {
        let model = parse_delimited("a\tb\nc\td\te\n", '\t', false).unwrap();
        assert_eq!(model["headers"], json!(["column1", "column2", "column3"]));
        assert_eq!(model["records"][0]["column3"], json!(""));
        assert_eq!(model["records"][1]["column3"], json!("e"));
    }

    #[test]
    fn test_empty_input() {
        let model = parse_delimited("", ',', true).unwrap();
        assert_eq!(model, json!({"headers": [], "records": []}));
    }

    #[test]
    fn test_too_many_fields() {
        let err = parse_delimited("a,b\n1,2\n3,4,5\n", ',', true).unwrap_err();
        assert!(matches!(err, TextMetalError::Source(ref m) if m.starts_with("line 3:")), "{err}");
    }

    #[test]
    fn test_duplicate_and_empty_headers() {
        let err = parse_delimited("id,name,id\n", ',', true).unwrap_err();
        assert!(matches!(err, TextMetalError::Source(ref m) if m.contains("'id'")));
        let err = parse_delimited("id,,name\n", ',', true).unwrap_err();
        assert!(matches!(err, TextMetalError::Source(ref m) if m == "header 2 is empty"));
    }

    #[test]
    fn test_bad_delimiter() {
        for delimiter in ['"', '\n', '§'] {
            assert!(matches!(
                parse_delimited("a", delimiter, true),
                Err(TextMetalError::Config(_))
            ));
        }
    }
}
