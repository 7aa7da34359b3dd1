//! English singular/plural inflection for identifier words.
//!
//! Rules are tried in order and the first match wins, so the specific
//! suffix rules come before the catch-all ones. Input is expected to be a
//! single lower-case word (the introspected names are split and lower-cased
//! by the caller).

use std::sync::LazyLock;

use regex::Regex;

const UNCOUNTABLE: &[&str] = &[
    "data",
    "deer",
    "equipment",
    "fish",
    "information",
    "metadata",
    "money",
    "news",
    "police",
    "rice",
    "series",
    "sheep",
    "species",
];

/// (singular, plural)
const IRREGULAR: &[(&str, &str)] = &[
    ("child", "children"),
    ("foot", "feet"),
    ("goose", "geese"),
    ("man", "men"),
    ("mouse", "mice"),
    ("ox", "oxen"),
    ("person", "people"),
    ("tooth", "teeth"),
    ("woman", "women"),
];

static PLURAL_RULES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    compile(&[
        (r"(quiz)$", "${1}zes"),
        (r"(matr|vert|ind)(?:ix|ex)$", "${1}ices"),
        (r"(alias|status|campus)$", "${1}es"),
        (r"(octop|vir)us$", "${1}i"),
        (r"(ax|test)is$", "${1}es"),
        (r"(buffal|tomat|potat|her|ech)o$", "${1}oes"),
        (r"(bu)s$", "${1}ses"),
        (r"(x|ch|ss|sh|z)$", "${1}es"),
        (r"([^aeiouy]|qu)y$", "${1}ies"),
        (r"(hive)$", "${1}s"),
        (r"(?:([^f])fe|([lr])f)$", "${1}${2}ves"),
        (r"sis$", "ses"),
        (r"([ti])um$", "${1}a"),
        (r"s$", "s"),
        (r"$", "s"),
    ])
});

static SINGULAR_RULES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    compile(&[
        (r"(quiz)zes$", "${1}"),
        (r"(matr)ices$", "${1}ix"),
        (r"(vert|ind)ices$", "${1}ex"),
        (r"(alias|status|campus)(?:es)?$", "${1}"),
        (r"(octop|vir)(?:us|i)$", "${1}us"),
        (r"^(a)x[ie]s$", "${1}xis"),
        (r"(cris|test)(?:is|es)$", "${1}is"),
        (r"(shoe)s$", "${1}"),
        (r"(o)es$", "${1}"),
        (r"(bus)(?:es)?$", "${1}"),
        (r"(x|ch|ss|sh|z)es$", "${1}"),
        (r"(m)ovies$", "${1}ovie"),
        (r"([^aeiouy]|qu)ies$", "${1}y"),
        (r"([lr])ves$", "${1}f"),
        (r"(tive|hive)s$", "${1}"),
        (r"([^f])ves$", "${1}fe"),
        (r"^(analy|ba|diagno|parenthe|progno|synop|the)(?:sis|ses)$", "${1}sis"),
        (r"([ti])a$", "${1}um"),
        (r"(ss|us)$", "${1}"),
        (r"s$", ""),
    ])
});

fn compile(rules: &[(&str, &'static str)]) -> Vec<(Regex, &'static str)> {
    rules
        .iter()
        .map(|(pattern, replacement)| (Regex::new(pattern).expect("valid inflection rule"), *replacement))
        .collect()
}

fn apply(word: &str, rules: &[(Regex, &'static str)]) -> String {
    for (re, replacement) in rules {
        if re.is_match(word) {
            return re.replace(word, *replacement).into_owned();
        }
    }
    word.to_string()
}

/// Return the plural form of a lower-case word.
pub fn pluralize(word: &str) -> String {
    let lower = word.to_lowercase();
    if lower.is_empty() || UNCOUNTABLE.contains(&lower.as_str()) {
        return lower;
    }
    if let Some((_, plural)) = IRREGULAR.iter().find(|(s, p)| *s == lower || *p == lower) {
        return plural.to_string();
    }
    apply(&lower, &PLURAL_RULES)
}

/// Return the singular form of a lower-case word.
pub fn singularize(word: &str) -> String {
    let lower = word.to_lowercase();
    if lower.is_empty() || UNCOUNTABLE.contains(&lower.as_str()) {
        return lower;
    }
    if let Some((singular, _)) = IRREGULAR.iter().find(|(s, p)| *s == lower || *p == lower) {
        return singular.to_string();
    }
    apply(&lower, &SINGULAR_RULES)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regular_plurals() {
        assert_eq!(pluralize("user"), "users");
        assert_eq!(pluralize("category"), "categories");
        assert_eq!(pluralize("box"), "boxes");
        assert_eq!(pluralize("address"), "addresses");
        assert_eq!(pluralize("match"), "matches");
        assert_eq!(pluralize("day"), "days");
        assert_eq!(pluralize("status"), "statuses");
        assert_eq!(pluralize("bus"), "buses");
        assert_eq!(pluralize("knife"), "knives");
        assert_eq!(pluralize("wolf"), "wolves");
        assert_eq!(pluralize("matrix"), "matrices");
        assert_eq!(pluralize("index"), "indices");
        assert_eq!(pluralize("analysis"), "analyses");
        assert_eq!(pluralize("medium"), "media");
    }

    #[test]
    fn test_regular_singulars() {
        assert_eq!(singularize("users"), "user");
        assert_eq!(singularize("categories"), "category");
        assert_eq!(singularize("boxes"), "box");
        assert_eq!(singularize("addresses"), "address");
        assert_eq!(singularize("statuses"), "status");
        assert_eq!(singularize("status"), "status");
        assert_eq!(singularize("buses"), "bus");
        assert_eq!(singularize("knives"), "knife");
        assert_eq!(singularize("wolves"), "wolf");
        assert_eq!(singularize("archives"), "archive");
        assert_eq!(singularize("matrices"), "matrix");
        assert_eq!(singularize("indices"), "index");
        assert_eq!(singularize("movies"), "movie");
        assert_eq!(singularize("analyses"), "analysis");
        assert_eq!(singularize("class"), "class");
        assert_eq!(singularize("taxes"), "tax");
        assert_eq!(singularize("axes"), "axis");
    }

    #[test]
    fn test_sis_words_match_whole_word() {
        assert_eq!(singularize("databases"), "database");
        assert_eq!(singularize("purchases"), "purchase");
        assert_eq!(singularize("theses"), "thesis");
        assert_eq!(pluralize("database"), "databases");
    }

    #[test]
    fn test_already_inflected_is_stable() {
        assert_eq!(pluralize("users"), "users");
        assert_eq!(singularize("user"), "user");
    }

    #[test]
    fn test_irregular_and_uncountable() {
        assert_eq!(pluralize("person"), "people");
        assert_eq!(singularize("people"), "person");
        assert_eq!(pluralize("children"), "children");
        assert_eq!(singularize("child"), "child");
        assert_eq!(pluralize("sheep"), "sheep");
        assert_eq!(singularize("data"), "data");
        assert_eq!(pluralize("metadata"), "metadata");
    }

    #[test]
    fn test_empty() {
        assert_eq!(pluralize(""), "");
        assert_eq!(singularize(""), "");
    }
}
