//! XML documents as template models.
//!
//! `<app name="shop"><table name="a"/><table name="b"/></app>` becomes
//! `{"app": {"name": "shop", "table": [{"name": "a"}, {"name": "b"}]}}`.
//! Child elements are always grouped into arrays, even when there is only
//! one, so templates can iterate them without checking. Non-blank text is
//! stored trimmed under `text`.

use serde_json::{Map, Value};

use crate::error::TextMetalError;
use crate::xml::{parse_document, XmlElement};

pub fn to_value(source: &str) -> Result<Value, TextMetalError> {
    let root = parse_document(source)?;
    let mut model = Map::new();
    model.insert(root.name.clone(), element_value(&root));
    Ok(Value::Object(model))
}

fn element_value(element: &XmlElement) -> Value {
    let mut object = Map::new();
    for (name, value) in &element.attributes {
        object.insert(name.clone(), Value::String(value.clone()));
    }

    // A child group replaces an attribute of the same name.
    let mut groups: Vec<(String, Vec<Value>)> = Vec::new();
    for child in element.elements() {
        let value = element_value(child);
        match groups.iter_mut().find(|(name, _)| *name == child.name) {
            Some((_, items)) => items.push(value),
            None => groups.push((child.name.clone(), vec![value])),
        }
    }
    for (name, items) in groups {
        if object.contains_key(&name) {
            tracing::debug!("Element <{name}> replaces the attribute of the same name");
        }
        object.insert(name, Value::Array(items));
    }

    let text = element.text();
    let text = text.trim();
    if !text.is_empty() {
        object.insert("text".to_string(), Value::String(text.to_string()));
    }
    Value::Object(object)
}

#[cfg(test)]
mod tests {
    use indoc::indoc;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_attributes_and_groups() {
        let model = to_value(indoc! {r#"
            <app name="shop" version="2">
              <table name="customers"/>
              <table name="orders">
                <column name="id"/>
              </table>
              <owner>Data Team</owner>
            </app>
        "#})
        .unwrap();

        assert_eq!(
            model,
            json!({
                "app": {
                    "name": "shop",
                    "version": "2",
                    "table": [
                        {"name": "customers"},
                        {"name": "orders", "column": [{"name": "id"}]}
                    ],
                    "owner": [{"text": "Data Team"}]
                }
            })
        );
    }

    #[test]
    fn test_cdata_text() {
        let model = to_value("<note><![CDATA[ a < b ]]></note>").unwrap();
        assert_eq!(model, json!({"note": {"text": "a < b"}}));
    }

    #[test]
    fn test_child_replaces_attribute() {
        let model = to_value(r#"<app table="x"><table name="y"/></app>"#).unwrap();
        assert_eq!(model["app"]["table"], json!([{"name": "y"}]));
    }

    #[test]
    fn test_malformed() {
        assert!(matches!(to_value("<app>"), Err(TextMetalError::Xml(_))));
    }
}
