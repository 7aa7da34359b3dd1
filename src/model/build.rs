use std::collections::BTreeMap;

use crate::dialect::Dialect;
use crate::naming::NameVariants;
use crate::schema::{
    ColumnInfo, ConstraintInfo, ConstraintType, IntrospectedSchema, ParameterInfo, ParameterMode,
    RoutineInfo, RoutineType, TableInfo, TableType, TriggerInfo,
};
use crate::typemap::map_sql_type;

use super::defaults::{clean_default, is_serial_default};
use super::{
    ChildKey, Column, Database, ForeignKey, ForeignKeyColumn, Index, KeyColumn, Parameter,
    ParameterDirection, PrimaryKey, Procedure, RoutineKind, Schema, Server, Table, Trigger,
    UniqueKey, View,
};

/// Map raw catalog metadata into the named object model.
pub fn build_server(introspected: &IntrospectedSchema) -> Server {
    let dialect = introspected.dialect;

    // Group by schema name; BTreeMap keeps schemas sorted
    let mut schemas: BTreeMap<String, Schema> = BTreeMap::new();
    for table in &introspected.tables {
        let schema = schemas
            .entry(table.schema.clone())
            .or_insert_with(|| new_schema(&table.schema, dialect));
        match table.table_type {
            TableType::Table => schema.tables.push(build_table(table, dialect)),
            TableType::View => schema.views.push(build_view(table, dialect)),
        }
    }
    for routine in &introspected.routines {
        let schema = schemas
            .entry(routine.schema.clone())
            .or_insert_with(|| new_schema(&routine.schema, dialect));
        schema.procedures.push(build_procedure(routine, dialect));
    }

    let mut schemas: Vec<Schema> = schemas.into_values().collect();
    link_child_keys(&mut schemas);

    tracing::debug!(
        "Built model with {} schemas for database {}",
        schemas.len(),
        introspected.server.database_name
    );

    let server = &introspected.server;
    Server {
        server_name: server.server_name.clone(),
        names: NameVariants::new(&server.server_name),
        dialect,
        server_version: server.version.clone(),
        server_edition: server.edition.clone(),
        server_level: server.level.clone(),
        databases: vec![Database {
            database_name: server.database_name.clone(),
            names: NameVariants::new(&server.database_name),
            schemas,
        }],
    }
}

fn new_schema(name: &str, dialect: Dialect) -> Schema {
    Schema {
        schema_name: name.to_string(),
        names: NameVariants::new(name),
        is_default: name == dialect.default_schema(),
        tables: Vec::new(),
        views: Vec::new(),
        procedures: Vec::new(),
    }
}

fn build_table(table: &TableInfo, dialect: Dialect) -> Table {
    let columns: Vec<Column> = table
        .columns
        .iter()
        .map(|c| build_column(c, &table.constraints, dialect))
        .collect();

    let primary_key = find_constraints(&table.constraints, ConstraintType::PrimaryKey)
        .next()
        .map(|pk| PrimaryKey {
            constraint_name: pk.name.clone(),
            names: NameVariants::new(&pk.name),
            columns: pk
                .columns
                .iter()
                .enumerate()
                .map(|(i, c)| KeyColumn {
                    column_name: c.clone(),
                    names: NameVariants::new(c),
                    key_ordinal: i + 1,
                })
                .collect(),
        });

    let foreign_keys = find_constraints(&table.constraints, ConstraintType::ForeignKey)
        .filter_map(|c| {
            let fk = c.foreign_key.as_ref()?;
            Some(ForeignKey {
                constraint_name: c.name.clone(),
                names: NameVariants::new(&c.name),
                target_schema_name: fk.ref_schema.clone(),
                target_table_name: fk.ref_table.clone(),
                target_names: NameVariants::new(&fk.ref_table),
                columns: c
                    .columns
                    .iter()
                    .zip(fk.ref_columns.iter())
                    .enumerate()
                    .map(|(i, (col, target))| ForeignKeyColumn {
                        column_name: col.clone(),
                        target_column_name: target.clone(),
                        names: NameVariants::new(col),
                        target_names: NameVariants::new(target),
                        key_ordinal: i + 1,
                    })
                    .collect(),
                on_update: fk.update_rule.clone(),
                on_delete: fk.delete_rule.clone(),
            })
        })
        .collect();

    let unique_keys = find_constraints(&table.constraints, ConstraintType::Unique)
        .map(|c| UniqueKey {
            constraint_name: c.name.clone(),
            names: NameVariants::new(&c.name),
            columns: c.columns.clone(),
        })
        .collect();

    let indexes = table
        .indexes
        .iter()
        .map(|i| Index {
            index_name: i.name.clone(),
            names: NameVariants::new(&i.name),
            is_unique: i.is_unique,
            columns: i.columns.clone(),
        })
        .collect();

    let has_primary_key = primary_key.is_some();
    let has_single_column_primary_key = primary_key
        .as_ref()
        .is_some_and(|pk| pk.columns.len() == 1);
    let has_identity_column = columns.iter().any(|c| c.is_identity);

    Table {
        table_name: table.name.clone(),
        names: NameVariants::new(&table.name),
        comment: table.comment.clone(),
        columns,
        primary_key,
        foreign_keys,
        child_keys: Vec::new(),
        unique_keys,
        indexes,
        triggers: build_triggers(&table.triggers),
        has_primary_key,
        has_identity_column,
        has_single_column_primary_key,
    }
}

fn build_view(view: &TableInfo, dialect: Dialect) -> View {
    View {
        view_name: view.name.clone(),
        names: NameVariants::new(&view.name),
        comment: view.comment.clone(),
        columns: view
            .columns
            .iter()
            .map(|c| build_column(c, &view.constraints, dialect))
            .collect(),
        triggers: build_triggers(&view.triggers),
    }
}

fn build_column(col: &ColumnInfo, constraints: &[ConstraintInfo], dialect: Dialect) -> Column {
    let mapped = map_sql_type(&col.udt_name, dialect);
    let client_nullable_type = mapped.nullable_client_type();
    let effective_client_type = if col.is_nullable {
        client_nullable_type.clone()
    } else {
        mapped.client_type.clone()
    };

    let primary_key_ordinal = find_constraints(constraints, ConstraintType::PrimaryKey)
        .find_map(|pk| pk.columns.iter().position(|c| *c == col.name))
        .map(|pos| pos + 1);
    let is_foreign_key = find_constraints(constraints, ConstraintType::ForeignKey)
        .any(|fk| fk.columns.contains(&col.name));
    let is_unique = find_constraints(constraints, ConstraintType::Unique)
        .any(|uq| uq.columns.len() == 1 && uq.columns[0] == col.name);

    let is_serial = col
        .column_default
        .as_deref()
        .is_some_and(|d| is_serial_default(d, dialect));

    Column {
        column_ordinal: col.ordinal_position,
        column_name: col.name.clone(),
        names: NameVariants::new(&col.name),
        is_nullable: col.is_nullable,
        sql_type: col.udt_name.clone(),
        size: col.character_maximum_length,
        precision: col.numeric_precision,
        scale: col.numeric_scale,
        default_value: col.column_default.clone(),
        default_expression: col
            .column_default
            .as_deref()
            .map(|d| clean_default(d, dialect)),
        is_identity: col.is_identity || is_serial,
        identity_seed: col.identity.as_ref().map(|i| i.start),
        identity_increment: col.identity.as_ref().map(|i| i.increment),
        is_computed: col.is_computed,
        is_primary_key: primary_key_ordinal.is_some(),
        primary_key_ordinal,
        is_foreign_key,
        is_unique,
        comment: col.comment.clone(),
        collation: col.collation.clone(),
        db_type: mapped.db_type,
        client_type: mapped.client_type,
        client_nullable_type,
        effective_client_type,
    }
}

fn build_triggers(triggers: &[TriggerInfo]) -> Vec<Trigger> {
    triggers
        .iter()
        .map(|t| Trigger {
            trigger_name: t.name.clone(),
            names: NameVariants::new(&t.name),
            timing: t.timing.clone(),
            events: t.events.clone(),
            is_disabled: t.is_disabled,
        })
        .collect()
}

fn build_procedure(routine: &RoutineInfo, dialect: Dialect) -> Procedure {
    let parameters: Vec<Parameter> = routine
        .parameters
        .iter()
        .map(|p| build_parameter(p, dialect))
        .collect();
    let has_output_parameters = parameters.iter().any(|p| {
        matches!(
            p.direction,
            ParameterDirection::Output | ParameterDirection::InputOutput
        )
    });
    let has_return_value = routine.return_type.is_some()
        || parameters
            .iter()
            .any(|p| p.direction == ParameterDirection::ReturnValue);

    Procedure {
        procedure_name: routine.name.clone(),
        names: NameVariants::new(&routine.name),
        routine_type: match routine.routine_type {
            RoutineType::Procedure => RoutineKind::Procedure,
            RoutineType::Function => RoutineKind::Function,
        },
        return_type: routine.return_type.clone(),
        parameters,
        has_output_parameters,
        has_return_value,
    }
}

fn build_parameter(param: &ParameterInfo, dialect: Dialect) -> Parameter {
    let mapped = map_sql_type(&param.udt_name, dialect);
    let parameter_name = param
        .name
        .clone()
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| format!("p{}", param.ordinal_position));
    let parameter_name_bare = parameter_name.trim_start_matches('@').to_string();

    Parameter {
        parameter_ordinal: param.ordinal_position,
        names: NameVariants::new(&parameter_name_bare),
        parameter_name,
        parameter_name_bare,
        direction: match param.mode {
            ParameterMode::In => ParameterDirection::Input,
            ParameterMode::Out => ParameterDirection::Output,
            ParameterMode::InOut => ParameterDirection::InputOutput,
            ParameterMode::Return => ParameterDirection::ReturnValue,
        },
        sql_type: param.udt_name.clone(),
        size: param.character_maximum_length,
        precision: param.numeric_precision,
        scale: param.numeric_scale,
        db_type: mapped.db_type,
        client_nullable_type: mapped.nullable_client_type(),
        client_type: mapped.client_type,
    }
}

fn find_constraints(
    constraints: &[ConstraintInfo],
    constraint_type: ConstraintType,
) -> impl Iterator<Item = &ConstraintInfo> {
    constraints
        .iter()
        .filter(move |c| c.constraint_type == constraint_type)
}

/// Record every foreign key on the table it references.
fn link_child_keys(schemas: &mut [Schema]) {
    let mut children: Vec<(String, String, ChildKey)> = Vec::new();
    for schema in schemas.iter() {
        for table in &schema.tables {
            for fk in &table.foreign_keys {
                children.push((
                    fk.target_schema_name.clone(),
                    fk.target_table_name.clone(),
                    ChildKey {
                        constraint_name: fk.constraint_name.clone(),
                        names: fk.names.clone(),
                        source_schema_name: schema.schema_name.clone(),
                        source_table_name: table.table_name.clone(),
                        source_names: table.names.clone(),
                        columns: fk.columns.clone(),
                    },
                ));
            }
        }
    }

    for (target_schema, target_table, child) in children {
        let target = schemas
            .iter_mut()
            .filter(|s| s.schema_name == target_schema)
            .flat_map(|s| s.tables.iter_mut())
            .find(|t| t.table_name == target_table);
        match target {
            Some(table) => table.child_keys.push(child),
            None => tracing::debug!(
                "Foreign key {} references {}.{} outside the loaded schemas",
                child.constraint_name,
                target_schema,
                target_table
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{IdentityInfo, ServerInfo};
    use crate::testutil::{test_column, test_schema};
    use crate::typemap::DbType;

    #[test]
    fn test_server_and_database() {
        let server = build_server(&test_schema());
        assert_eq!(server.server_name, "localhost");
        assert_eq!(server.dialect, Dialect::Postgres);
        assert_eq!(server.server_version.as_deref(), Some("16.2"));
        assert_eq!(server.databases.len(), 1);
        assert_eq!(server.databases[0].database_name, "shop");
        assert_eq!(server.databases[0].names.pascal_case, "Shop");
    }

    #[test]
    fn test_tables_keep_catalog_order() {
        let server = build_server(&test_schema());
        let schema = &server.databases[0].schemas[0];
        assert_eq!(schema.schema_name, "public");
        assert!(schema.is_default);
        let names: Vec<&str> = schema.tables.iter().map(|t| t.table_name.as_str()).collect();
        assert_eq!(names, ["user_accounts", "order_items"]);
        assert_eq!(schema.tables[0].names.singular_pascal_case, "UserAccount");
    }

    #[test]
    fn test_columns() {
        let server = build_server(&test_schema());
        let users = &server.databases[0].schemas[0].tables[0];

        let id = &users.columns[0];
        assert!(id.is_primary_key);
        assert_eq!(id.primary_key_ordinal, Some(1));
        assert!(id.is_identity, "nextval default marks identity");
        assert_eq!(id.client_type, "i32");
        assert_eq!(id.effective_client_type, "i32");

        let email = &users.columns[1];
        assert!(email.is_unique);
        assert!(!email.is_primary_key);
        assert_eq!(email.size, Some(100));
        assert_eq!(email.db_type, DbType::String);

        let bio = &users.columns[2];
        assert!(bio.is_nullable);
        assert_eq!(bio.client_nullable_type, "Option<String>");
        assert_eq!(bio.effective_client_type, "Option<String>");
        assert_eq!(bio.comment.as_deref(), Some("Free-form biography"));

        assert!(users.has_primary_key);
        assert!(users.has_identity_column);
        assert!(users.has_single_column_primary_key);
    }

    #[test]
    fn test_default_expression_is_cleaned() {
        let server = build_server(&test_schema());
        let price = &server.databases[0].schemas[0].tables[1].columns[2];
        assert_eq!(price.default_value.as_deref(), Some("0::numeric"));
        assert_eq!(price.default_expression.as_deref(), Some("0"));
        assert!(!price.is_identity);
    }

    #[test]
    fn test_foreign_and_child_keys() {
        let server = build_server(&test_schema());
        let tables = &server.databases[0].schemas[0].tables;
        let items = &tables[1];

        assert_eq!(items.foreign_keys.len(), 1);
        let fk = &items.foreign_keys[0];
        assert_eq!(fk.target_table_name, "user_accounts");
        assert_eq!(fk.target_names.singular_pascal_case, "UserAccount");
        assert_eq!(fk.columns[0].column_name, "user_account_id");
        assert_eq!(fk.columns[0].target_column_name, "id");
        assert_eq!(fk.on_delete, "CASCADE");
        assert!(items.columns[1].is_foreign_key);

        let users = &tables[0];
        assert_eq!(users.child_keys.len(), 1);
        assert_eq!(users.child_keys[0].source_table_name, "order_items");
        assert_eq!(users.child_keys[0].source_names.plural_pascal_case, "OrderItems");
        assert!(items.child_keys.is_empty());
    }

    #[test]
    fn test_views_and_procedures() {
        let mut introspected = test_schema();
        let mut view = TableInfo::new("reporting", "active_users", TableType::View, None);
        view.columns = vec![ColumnInfo {
            is_nullable: true,
            ..test_column("id")
        }];
        introspected.tables.push(view);
        introspected.routines.push(RoutineInfo {
            schema: "public".to_string(),
            name: "archive_orders".to_string(),
            routine_type: RoutineType::Procedure,
            return_type: None,
            parameters: vec![
                ParameterInfo {
                    name: Some("@cutoff".to_string()),
                    ordinal_position: 1,
                    mode: ParameterMode::In,
                    udt_name: "date".to_string(),
                    character_maximum_length: None,
                    numeric_precision: None,
                    numeric_scale: None,
                },
                ParameterInfo {
                    name: None,
                    ordinal_position: 2,
                    mode: ParameterMode::Out,
                    udt_name: "int4".to_string(),
                    character_maximum_length: None,
                    numeric_precision: None,
                    numeric_scale: None,
                },
            ],
        });

        let server = build_server(&introspected);
        let schemas = &server.databases[0].schemas;
        assert_eq!(schemas.len(), 2);
        assert_eq!(schemas[0].schema_name, "public");
        assert_eq!(schemas[1].schema_name, "reporting");
        assert!(!schemas[1].is_default);
        assert_eq!(schemas[1].views[0].names.pascal_case, "ActiveUsers");
        assert!(schemas[1].tables.is_empty());

        let proc = &schemas[0].procedures[0];
        assert_eq!(proc.routine_type, RoutineKind::Procedure);
        assert!(proc.has_output_parameters);
        assert!(!proc.has_return_value);
        assert_eq!(proc.parameters[0].parameter_name, "@cutoff");
        assert_eq!(proc.parameters[0].parameter_name_bare, "cutoff");
        assert_eq!(proc.parameters[0].names.pascal_case, "Cutoff");
        assert_eq!(proc.parameters[1].parameter_name, "p2");
        assert_eq!(proc.parameters[1].direction, ParameterDirection::Output);
    }

    #[test]
    fn test_composite_primary_key_and_identity_seed() {
        let mut table = TableInfo::new("dbo", "OrderLines", TableType::Table, None);
        table.columns = vec![
            ColumnInfo {
                udt_name: "int".to_string(),
                is_identity: true,
                identity: Some(IdentityInfo {
                    start: 100,
                    increment: 5,
                }),
                ..test_column("LineId")
            },
            ColumnInfo {
                ordinal_position: 2,
                udt_name: "int".to_string(),
                ..test_column("OrderId")
            },
        ];
        table.constraints = vec![ConstraintInfo {
            name: "PK_OrderLines".to_string(),
            constraint_type: ConstraintType::PrimaryKey,
            columns: vec!["OrderId".to_string(), "LineId".to_string()],
            foreign_key: None,
        }];
        let introspected = IntrospectedSchema {
            dialect: Dialect::Mssql,
            server: ServerInfo::default(),
            tables: vec![table],
            routines: Vec::new(),
        };

        let server = build_server(&introspected);
        let t = &server.databases[0].schemas[0].tables[0];
        assert!(server.databases[0].schemas[0].is_default);
        assert!(!t.has_single_column_primary_key);
        assert_eq!(t.columns[0].primary_key_ordinal, Some(2));
        assert_eq!(t.columns[1].primary_key_ordinal, Some(1));
        assert_eq!(t.columns[0].identity_seed, Some(100));
        assert_eq!(t.columns[0].identity_increment, Some(5));
        assert_eq!(t.names.singular_snake_case, "order_line");
    }
}
