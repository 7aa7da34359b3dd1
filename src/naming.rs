use heck::{
    ToKebabCase, ToLowerCamelCase, ToShoutySnakeCase, ToSnakeCase, ToTitleCase, ToUpperCamelCase,
};
use serde::Serialize;

use crate::inflect::{pluralize, singularize};

/// Pre-computed spellings of a catalog name for use by templates.
///
/// Singular and plural forms inflect the last word only, so `order_items`
/// becomes `OrderItem` / `OrderItems`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NameVariants {
    pub original: String,
    pub pascal_case: String,
    pub camel_case: String,
    pub snake_case: String,
    pub constant_case: String,
    pub kebab_case: String,
    pub title_case: String,
    pub singular_pascal_case: String,
    pub plural_pascal_case: String,
    pub singular_camel_case: String,
    pub plural_camel_case: String,
    pub singular_snake_case: String,
    pub plural_snake_case: String,
    pub singular_constant_case: String,
    pub plural_constant_case: String,
}

impl NameVariants {
    pub fn new(name: &str) -> Self {
        let snake = name.to_snake_case();
        let singular = inflect_last_word(&snake, singularize);
        let plural = inflect_last_word(&snake, pluralize);

        NameVariants {
            original: name.to_string(),
            pascal_case: identifier(snake.to_upper_camel_case()),
            camel_case: identifier(snake.to_lower_camel_case()),
            snake_case: identifier(snake.clone()),
            constant_case: identifier(snake.to_shouty_snake_case()),
            kebab_case: snake.to_kebab_case(),
            title_case: snake.to_title_case(),
            singular_pascal_case: identifier(singular.to_upper_camel_case()),
            plural_pascal_case: identifier(plural.to_upper_camel_case()),
            singular_camel_case: identifier(singular.to_lower_camel_case()),
            plural_camel_case: identifier(plural.to_lower_camel_case()),
            singular_snake_case: identifier(singular.clone()),
            plural_snake_case: identifier(plural.clone()),
            singular_constant_case: identifier(singular.to_shouty_snake_case()),
            plural_constant_case: identifier(plural.to_shouty_snake_case()),
        }
    }
}

/// Apply an inflection to the last `_`-separated word of a snake_case name.
fn inflect_last_word(snake: &str, inflect: fn(&str) -> String) -> String {
    match snake.rsplit_once('_') {
        Some((head, last)) => format!("{head}_{}", inflect(last)),
        None => inflect(snake),
    }
}

/// Identifiers may not start with a digit; prefix those with an underscore.
fn identifier(s: String) -> String {
    if s.starts_with(|c: char| c.is_ascii_digit()) {
        format!("_{s}")
    } else {
        s
    }
}
