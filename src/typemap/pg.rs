use super::{simple, unknown, DbType, MappedType};

/// Map a PostgreSQL `udt_name` to its portable and client representations.
pub fn map_sql_type(udt: &str) -> MappedType {
    // Handle array types (udt_name starts with underscore)
    if let Some(element_udt) = udt.strip_prefix('_') {
        let element = map_udt_scalar(element_udt);
        return MappedType {
            db_type: DbType::Object,
            client_type: format!("Vec<{}>", element.client_type),
        };
    }

    map_udt_scalar(udt)
}

fn map_udt_scalar(udt: &str) -> MappedType {
    match udt {
        "bool" => simple(DbType::Boolean, "bool"),
        "int2" | "smallserial" => simple(DbType::Int16, "i16"),
        "int4" | "serial" => simple(DbType::Int32, "i32"),
        "int8" | "bigserial" | "oid" => simple(DbType::Int64, "i64"),
        "float4" => simple(DbType::Single, "f32"),
        "float8" => simple(DbType::Double, "f64"),
        "numeric" => simple(DbType::Decimal, "rust_decimal::Decimal"),
        "money" => simple(DbType::Currency, "rust_decimal::Decimal"),
        "text" | "varchar" | "name" | "citext" => simple(DbType::String, "String"),
        "char" | "bpchar" => simple(DbType::StringFixedLength, "String"),
        "bytea" => simple(DbType::Binary, "Vec<u8>"),
        "timestamp" => simple(DbType::DateTime, "chrono::NaiveDateTime"),
        "timestamptz" => simple(DbType::DateTimeOffset, "chrono::DateTime<chrono::Utc>"),
        "date" => simple(DbType::Date, "chrono::NaiveDate"),
        "time" | "timetz" => simple(DbType::Time, "chrono::NaiveTime"),
        "interval" => simple(DbType::Object, "sqlx::postgres::types::PgInterval"),
        "uuid" => simple(DbType::Guid, "uuid::Uuid"),
        "json" | "jsonb" => simple(DbType::Json, "serde_json::Value"),
        "xml" => simple(DbType::Xml, "String"),
        "inet" | "cidr" => simple(DbType::AnsiString, "ipnetwork::IpNetwork"),
        _ => unknown(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bool() {
        let m = map_sql_type("bool");
        assert_eq!(m.db_type, DbType::Boolean);
        assert_eq!(m.client_type, "bool");
    }

    #[test]
    fn test_integer_types() {
        assert_eq!(map_sql_type("int2").db_type, DbType::Int16);
        assert_eq!(map_sql_type("int4").db_type, DbType::Int32);
        assert_eq!(map_sql_type("int8").db_type, DbType::Int64);
        assert_eq!(map_sql_type("serial").client_type, "i32");
        assert_eq!(map_sql_type("bigserial").client_type, "i64");
    }

    #[test]
    fn test_float_types() {
        assert_eq!(map_sql_type("float4").client_type, "f32");
        assert_eq!(map_sql_type("float8").client_type, "f64");
    }

    #[test]
    fn test_string_types() {
        assert_eq!(map_sql_type("text").db_type, DbType::String);
        assert_eq!(map_sql_type("varchar").db_type, DbType::String);
        assert_eq!(map_sql_type("bpchar").db_type, DbType::StringFixedLength);
    }

    #[test]
    fn test_datetime_types() {
        assert_eq!(map_sql_type("timestamp").db_type, DbType::DateTime);
        assert_eq!(map_sql_type("timestamptz").db_type, DbType::DateTimeOffset);
        assert_eq!(map_sql_type("date").client_type, "chrono::NaiveDate");
        assert_eq!(map_sql_type("timetz").db_type, DbType::Time);
    }

    #[test]
    fn test_array_type() {
        let m = map_sql_type("_int4");
        assert_eq!(m.client_type, "Vec<i32>");
        assert_eq!(m.db_type, DbType::Object);
        assert_eq!(map_sql_type("_text").client_type, "Vec<String>");
    }

    #[test]
    fn test_unknown_type() {
        let m = map_sql_type("tsvector");
        assert_eq!(m.db_type, DbType::Object);
        assert_eq!(m.client_type, "String");
    }
}
