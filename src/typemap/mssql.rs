use super::{simple, unknown, DbType, MappedType};

/// Map a MSSQL `DATA_TYPE` to its portable and client representations.
pub fn map_sql_type(dt: &str) -> MappedType {
    match dt.to_ascii_lowercase().as_str() {
        "bit" => simple(DbType::Boolean, "bool"),
        "tinyint" => simple(DbType::Byte, "u8"),
        "smallint" => simple(DbType::Int16, "i16"),
        "int" => simple(DbType::Int32, "i32"),
        "bigint" => simple(DbType::Int64, "i64"),
        "real" => simple(DbType::Single, "f32"),
        "float" => simple(DbType::Double, "f64"),
        "decimal" | "numeric" => simple(DbType::Decimal, "rust_decimal::Decimal"),
        "money" | "smallmoney" => simple(DbType::Currency, "rust_decimal::Decimal"),
        "varchar" | "text" => simple(DbType::AnsiString, "String"),
        "char" => simple(DbType::AnsiStringFixedLength, "String"),
        "nvarchar" | "ntext" | "sysname" => simple(DbType::String, "String"),
        "nchar" => simple(DbType::StringFixedLength, "String"),
        "binary" | "varbinary" | "image" | "timestamp" | "rowversion" => {
            simple(DbType::Binary, "Vec<u8>")
        }
        "datetime" | "datetime2" | "smalldatetime" => {
            simple(DbType::DateTime, "chrono::NaiveDateTime")
        }
        "datetimeoffset" => simple(DbType::DateTimeOffset, "chrono::DateTime<chrono::FixedOffset>"),
        "date" => simple(DbType::Date, "chrono::NaiveDate"),
        "time" => simple(DbType::Time, "chrono::NaiveTime"),
        "uniqueidentifier" => simple(DbType::Guid, "uuid::Uuid"),
        "xml" => simple(DbType::Xml, "String"),
        _ => unknown(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bit() {
        let m = map_sql_type("bit");
        assert_eq!(m.db_type, DbType::Boolean);
        assert_eq!(m.client_type, "bool");
    }

    #[test]
    fn test_integer_types() {
        assert_eq!(map_sql_type("tinyint").client_type, "u8");
        assert_eq!(map_sql_type("smallint").db_type, DbType::Int16);
        assert_eq!(map_sql_type("int").db_type, DbType::Int32);
        assert_eq!(map_sql_type("bigint").db_type, DbType::Int64);
    }

    #[test]
    fn test_money() {
        assert_eq!(map_sql_type("money").db_type, DbType::Currency);
        assert_eq!(map_sql_type("smallmoney").db_type, DbType::Currency);
    }

    #[test]
    fn test_ansi_and_unicode_strings() {
        assert_eq!(map_sql_type("varchar").db_type, DbType::AnsiString);
        assert_eq!(map_sql_type("char").db_type, DbType::AnsiStringFixedLength);
        assert_eq!(map_sql_type("nvarchar").db_type, DbType::String);
        assert_eq!(map_sql_type("nchar").db_type, DbType::StringFixedLength);
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(map_sql_type("UNIQUEIDENTIFIER").db_type, DbType::Guid);
    }

    #[test]
    fn test_binary_types() {
        assert_eq!(map_sql_type("binary").client_type, "Vec<u8>");
        assert_eq!(map_sql_type("varbinary").client_type, "Vec<u8>");
        assert_eq!(map_sql_type("image").client_type, "Vec<u8>");
    }
}
