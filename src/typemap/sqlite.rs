use super::{simple, DbType, MappedType};

/// Map a SQLite declared column type using SQLite's affinity rules.
///
/// SQLite accepts arbitrary type names, so a few common declarations
/// (booleans, dates, timestamps) are recognised before affinity is applied.
pub fn map_sql_type(declared: &str) -> MappedType {
    let t = declared.trim().to_ascii_uppercase();

    match t.as_str() {
        "BOOLEAN" | "BOOL" => return simple(DbType::Boolean, "bool"),
        "DATE" => return simple(DbType::Date, "chrono::NaiveDate"),
        "DATETIME" | "TIMESTAMP" => return simple(DbType::DateTime, "chrono::NaiveDateTime"),
        _ => {}
    }

    if t.contains("INT") {
        simple(DbType::Int64, "i64")
    } else if t.contains("CHAR") || t.contains("CLOB") || t.contains("TEXT") {
        simple(DbType::String, "String")
    } else if t.is_empty() || t.contains("BLOB") {
        simple(DbType::Binary, "Vec<u8>")
    } else if t.contains("REAL") || t.contains("FLOA") || t.contains("DOUB") {
        simple(DbType::Double, "f64")
    } else {
        simple(DbType::Decimal, "rust_decimal::Decimal")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_affinity() {
        assert_eq!(map_sql_type("INTEGER").db_type, DbType::Int64);
        assert_eq!(map_sql_type("bigint").db_type, DbType::Int64);
        assert_eq!(map_sql_type("VARCHAR(40)").db_type, DbType::String);
        assert_eq!(map_sql_type("text").db_type, DbType::String);
        assert_eq!(map_sql_type("BLOB").db_type, DbType::Binary);
        assert_eq!(map_sql_type("").db_type, DbType::Binary);
        assert_eq!(map_sql_type("DOUBLE PRECISION").db_type, DbType::Double);
        assert_eq!(map_sql_type("NUMERIC(10,2)").db_type, DbType::Decimal);
    }

    #[test]
    fn test_named_types() {
        assert_eq!(map_sql_type("boolean").db_type, DbType::Boolean);
        assert_eq!(map_sql_type("DATETIME").db_type, DbType::DateTime);
        assert_eq!(map_sql_type("date").db_type, DbType::Date);
    }
}
