use crate::dialect::Dialect;
use crate::schema::{
    ColumnInfo, ConstraintInfo, ConstraintType, ForeignKeyInfo, IntrospectedSchema, ServerInfo,
    TableInfo, TableType,
};

/// Create a ColumnInfo with sensible defaults for testing.
/// Returns a non-nullable int4 column with no defaults, no identity, and no comment.
pub fn test_column(name: &str) -> ColumnInfo {
    ColumnInfo {
        name: name.to_string(),
        ordinal_position: 1,
        is_nullable: false,
        udt_name: "int4".to_string(),
        character_maximum_length: None,
        numeric_precision: None,
        numeric_scale: None,
        column_default: None,
        is_identity: false,
        identity: None,
        is_computed: false,
        comment: None,
        collation: None,
    }
}

/// A two-table PostgreSQL catalog: `user_accounts` and `order_items`, the
/// latter referencing the former.
pub fn test_schema() -> IntrospectedSchema {
    let mut users = TableInfo::new("public", "user_accounts", TableType::Table, None);
    users.columns = vec![
        ColumnInfo {
            column_default: Some("nextval('user_accounts_id_seq'::regclass)".to_string()),
            ..test_column("id")
        },
        ColumnInfo {
            ordinal_position: 2,
            udt_name: "varchar".to_string(),
            character_maximum_length: Some(100),
            ..test_column("email_address")
        },
        ColumnInfo {
            ordinal_position: 3,
            is_nullable: true,
            udt_name: "text".to_string(),
            comment: Some("Free-form biography".to_string()),
            ..test_column("bio")
        },
    ];
    users.constraints = vec![
        ConstraintInfo {
            name: "user_accounts_pkey".to_string(),
            constraint_type: ConstraintType::PrimaryKey,
            columns: vec!["id".to_string()],
            foreign_key: None,
        },
        ConstraintInfo {
            name: "user_accounts_email_address_key".to_string(),
            constraint_type: ConstraintType::Unique,
            columns: vec!["email_address".to_string()],
            foreign_key: None,
        },
    ];

    let mut items = TableInfo::new("public", "order_items", TableType::Table, None);
    items.columns = vec![
        test_column("id"),
        ColumnInfo {
            ordinal_position: 2,
            ..test_column("user_account_id")
        },
        ColumnInfo {
            ordinal_position: 3,
            udt_name: "numeric".to_string(),
            numeric_precision: Some(10),
            numeric_scale: Some(2),
            column_default: Some("0::numeric".to_string()),
            ..test_column("unit_price")
        },
    ];
    items.constraints = vec![
        ConstraintInfo {
            name: "order_items_pkey".to_string(),
            constraint_type: ConstraintType::PrimaryKey,
            columns: vec!["id".to_string()],
            foreign_key: None,
        },
        ConstraintInfo {
            name: "order_items_user_account_id_fkey".to_string(),
            constraint_type: ConstraintType::ForeignKey,
            columns: vec!["user_account_id".to_string()],
            foreign_key: Some(ForeignKeyInfo {
                ref_schema: "public".to_string(),
                ref_table: "user_accounts".to_string(),
                ref_columns: vec!["id".to_string()],
                update_rule: "NO ACTION".to_string(),
                delete_rule: "CASCADE".to_string(),
            }),
        },
    ];

    IntrospectedSchema {
        dialect: Dialect::Postgres,
        server: ServerInfo {
            server_name: "localhost".to_string(),
            database_name: "shop".to_string(),
            version: Some("16.2".to_string()),
            edition: None,
            level: None,
        },
        tables: vec![users, items],
        routines: Vec::new(),
    }
}
