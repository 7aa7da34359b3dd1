use serde_json::{json, Value};

use super::ast::{Expr, Interpolated, LogLevel, Node, Segment};
use super::context::TemplatingContext;
use super::eval::{evaluate, Missing};
use super::io::{InputMechanism, OutputMechanism};
use super::parser::Template;
use super::value::{display, truthy, type_name};
use crate::error::TextMetalError;

/// Includes may nest this deep before rendering fails.
pub const MAX_INCLUDE_DEPTH: usize = 32;

/// Render a parsed template into `output`, loading includes from `input`.
pub fn render(
    template: &Template,
    ctx: &mut TemplatingContext,
    input: &dyn InputMechanism,
    output: &mut dyn OutputMechanism,
) -> Result<(), TextMetalError> {
    tracing::debug!("Rendering {}", template.name);
    let mut renderer = Renderer {
        input,
        output,
        depth: 0,
    };
    renderer.nodes(&template.nodes, &template.name, ctx)
}

struct Renderer<'a> {
    input: &'a dyn InputMechanism,
    output: &'a mut dyn OutputMechanism,
    depth: usize,
}

impl Renderer<'_> {
    fn nodes(
        &mut self,
        nodes: &[Node],
        template: &str,
        ctx: &mut TemplatingContext,
    ) -> Result<(), TextMetalError> {
        for node in nodes {
            self.node(node, template, ctx)?;
        }
        Ok(())
    }

    fn node(
        &mut self,
        node: &Node,
        template: &str,
        ctx: &mut TemplatingContext,
    ) -> Result<(), TextMetalError> {
        match node {
            Node::Text(text) => {
                let text = expand(text, ctx)?;
                self.output.write(&text)
            }
            Node::Write { text, newline } => {
                let mut text = expand(text, ctx)?;
                if *newline {
                    text.push('\n');
                }
                self.output.write(&text)
            }
            Node::OutputScope { name, append, body } => {
                let name = expand(name, ctx)?;
                self.output.enter_scope(&name, *append)?;
                self.nodes(body, template, ctx)?;
                self.output.leave_scope()
            }
            Node::ForEach {
                source,
                var,
                index_var,
                filter,
                separator,
                body,
            } => {
                let items = iterable(evaluate(source, ctx, Missing::for_context(ctx))?)?;
                let items = match filter {
                    Some(filter) => select(items, var, filter, ctx)?,
                    None => items,
                };
                let count = items.len();
                for (index, item) in items.into_iter().enumerate() {
                    if index > 0 {
                        if let Some(separator) = separator {
                            let text = expand(separator, ctx)?;
                            self.output.write(&text)?;
                        }
                    }
                    ctx.push_scope();
                    ctx.bind(var, item.clone());
                    if let Some(index_var) = index_var {
                        ctx.bind(index_var, json!(index));
                    }
                    ctx.bind(
                        "loop",
                        json!({
                            "index": index,
                            "number": index + 1,
                            "first": index == 0,
                            "last": index + 1 == count,
                            "count": count,
                        }),
                    );
                    ctx.push_model(item);
                    let result = self.nodes(body, template, ctx);
                    ctx.pop_model();
                    ctx.pop_scope();
                    result?;
                }
                Ok(())
            }
            Node::For {
                var,
                from,
                to,
                step,
                body,
            } => {
                let from = integer(from, "from", ctx)?;
                let to = integer(to, "to", ctx)?;
                let step = match step {
                    Some(step) => integer(step, "step", ctx)?,
                    None => 1,
                };
                if step == 0 {
                    return Err(TextMetalError::TypeMismatch(
                        "<For> step must not be zero".to_string(),
                    ));
                }
                let mut i = from;
                while (step > 0 && i <= to) || (step < 0 && i >= to) {
                    ctx.push_scope();
                    ctx.bind(var, json!(i));
                    let result = self.nodes(body, template, ctx);
                    ctx.pop_scope();
                    result?;
                    i = match i.checked_add(step) {
                        Some(next) => next,
                        None => break,
                    };
                }
                Ok(())
            }
            Node::If {
                test,
                then,
                otherwise,
            } => {
                let value = evaluate(test, ctx, Missing::for_context(ctx))?;
                if truthy(&value) {
                    self.nodes(then, template, ctx)
                } else {
                    self.nodes(otherwise, template, ctx)
                }
            }
            Node::With { source, body } => {
                let model = evaluate(source, ctx, Missing::for_context(ctx))?;
                ctx.push_model(model);
                let result = self.nodes(body, template, ctx);
                ctx.pop_model();
                result
            }
            Node::Allocate { name, value } => {
                let value = match value {
                    Some(expr) => evaluate(expr, ctx, Missing::for_context(ctx))?,
                    None => Value::Null,
                };
                ctx.allocate(name, value)
            }
            Node::Assign { name, value } => {
                let value = evaluate(value, ctx, Missing::for_context(ctx))?;
                ctx.assign(name, value)
            }
            Node::Include { name, line } => {
                if self.depth >= MAX_INCLUDE_DEPTH {
                    return Err(TextMetalError::syntax(
                        template,
                        *line,
                        format!("includes nest deeper than {MAX_INCLUDE_DEPTH}"),
                    ));
                }
                let name = expand(name, ctx)?;
                let source = self.input.load(&name)?;
                let included = Template::parse(&name, &source)?;
                tracing::debug!("Including {name} from {template}");

                self.depth += 1;
                ctx.push_scope();
                let result = self.nodes(&included.nodes, &included.name, ctx);
                ctx.pop_scope();
                self.depth -= 1;
                result
            }
            Node::Log { message, level } => {
                let message = expand(message, ctx)?;
                match level {
                    LogLevel::Debug => tracing::debug!(template, "{message}"),
                    LogLevel::Info => tracing::info!(template, "{message}"),
                    LogLevel::Warn => tracing::warn!(template, "{message}"),
                }
                Ok(())
            }
        }
    }
}

/// Expand tokens in text. Lenient contexts leave unresolved tokens in place.
fn expand(segments: &Interpolated, ctx: &TemplatingContext) -> Result<String, TextMetalError> {
    let mut out = String::new();
    for segment in segments {
        match segment {
            Segment::Literal(text) => out.push_str(text),
            Segment::Token { source, expr } => match evaluate(expr, ctx, Missing::Error) {
                Ok(value) => out.push_str(&display(&value)),
                Err(TextMetalError::Unresolved(_)) if !ctx.is_strict() => {
                    out.push_str("${");
                    out.push_str(source);
                    out.push('}');
                }
                Err(e) => return Err(e),
            },
        }
    }
    Ok(out)
}

/// Arrays iterate their items, objects their `{key, value}` entries and
/// null nothing.
fn iterable(value: Value) -> Result<Vec<Value>, TextMetalError> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => Ok(items),
        Value::Object(map) => Ok(map
            .into_iter()
            .map(|(key, value)| json!({"key": key, "value": value}))
            .collect()),
        other => Err(TextMetalError::TypeMismatch(format!(
            "<ForEach> cannot iterate a {}",
            type_name(&other)
        ))),
    }
}

/// Items for which `filter` holds, evaluated with the item bound.
fn select(
    items: Vec<Value>,
    var: &str,
    filter: &Expr,
    ctx: &mut TemplatingContext,
) -> Result<Vec<Value>, TextMetalError> {
    let mut selected = Vec::with_capacity(items.len());
    for item in items {
        ctx.push_scope();
        ctx.bind(var, item.clone());
        ctx.push_model(item.clone());
        let keep = evaluate(filter, ctx, Missing::for_context(ctx));
        ctx.pop_model();
        ctx.pop_scope();
        if truthy(&keep?) {
            selected.push(item);
        }
    }
    Ok(selected)
}

fn integer(expr: &Expr, what: &str, ctx: &TemplatingContext) -> Result<i64, TextMetalError> {
    let value = evaluate(expr, ctx, Missing::for_context(ctx))?;
    value.as_i64().ok_or_else(|| {
        TextMetalError::TypeMismatch(format!("<For> {what} must be an integer, got {value}"))
    })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use indoc::indoc;
    use serde_json::json;

    use super::*;
    use crate::template::io::{MemoryInput, MemoryOutput};

    fn shop_model() -> Value {
        json!({
            "server_name": "db01",
            "tables": [
                {"table_name": "user_accounts", "has_primary_key": true, "columns": [
                    {"column_name": "id"}, {"column_name": "email"}
                ]},
                {"table_name": "audit_log", "has_primary_key": false, "columns": []},
                {"table_name": "order_items", "has_primary_key": true, "columns": [
                    {"column_name": "id"}
                ]}
            ]
        })
    }

    fn run_with(
        source: &str,
        input: &MemoryInput,
        strict: bool,
    ) -> Result<MemoryOutput, TextMetalError> {
        let mut properties = BTreeMap::new();
        properties.insert("namespace".to_string(), "Shop".to_string());
        let mut ctx = TemplatingContext::new(shop_model(), properties, strict);
        let template = Template::parse("root.xml", source)?;
        let mut output = MemoryOutput::new();
        render(&template, &mut ctx, input, &mut output)?;
        Ok(output)
    }

    fn run(source: &str) -> String {
        run_with(source, &MemoryInput::new(), true).unwrap().unscoped
    }

    #[test]
    fn test_foreach_with_loop_metadata() {
        let out = run(indoc! {r#"
            <Template>
              <ForEach in="tables" var-it="t" separator=", ">
                <Write text="${loop.number}/${loop.count}:${t.table_name | singular | pascal}"/>
                <If test="loop.last"><Text>.</Text></If>
              </ForEach>
            </Template>
        "#});
        assert_eq!(out, "1/3:UserAccount, 2/3:AuditLog, 3/3:OrderItem.");
    }

    #[test]
    fn test_foreach_filter_uses_item_fields() {
        let out = run(indoc! {r#"
            <Template>
              <ForEach in="tables" filter="has_primary_key" var-index="i">
                <WriteLine text="${i} ${table_name} ${len(columns)}"/>
              </ForEach>
            </Template>
        "#});
        assert_eq!(out, "0 user_accounts 2\n1 order_items 1\n");
    }

    #[test]
    fn test_foreach_over_object_and_null() {
        let out = run(indoc! {r#"
            <Template>
              <ForEach in="properties" var-it="p"><Write text="${p.key}=${p.value}"/></ForEach>
              <ForEach in="null"><Text>never</Text></ForEach>
            </Template>
        "#});
        assert_eq!(out, "namespace=Shop");
    }

    #[test]
    fn test_foreach_rejects_scalars() {
        let err = run_with(
            r#"<Template><ForEach in="server_name"/></Template>"#,
            &MemoryInput::new(),
            true,
        )
        .unwrap_err();
        assert!(matches!(err, TextMetalError::TypeMismatch(_)));
    }

    #[test]
    fn test_for_loop() {
        let out = run(indoc! {r#"
            <Template>
              <For var-it="n" from="1" to="3"><Write text="${n}"/></For>
              <Text>|</Text>
              <For var-it="n" from="10" to="0" step="-5"><Write text="${n} "/></For>
              <Text>|</Text>
              <For var-it="n" from="3" to="1"><Write text="never"/></For>
            </Template>
        "#});
        assert_eq!(out, "123|10 5 0 |");
    }

    #[test]
    fn test_for_zero_step_is_an_error() {
        let result = run_with(
            r#"<Template><For from="1" to="2" step="0"/></Template>"#,
            &MemoryInput::new(),
            true,
        );
        assert!(matches!(result, Err(TextMetalError::TypeMismatch(_))));
    }

    #[test]
    fn test_if_else_with_condition_element() {
        let out = run(indoc! {r#"
            <Template>
              <If>
                <Condition>
                  <Binary operator="eq">
                    <Facet name="server_name"/>
                    <Value data="db01"/>
                  </Binary>
                </Condition>
                <Text>match</Text>
                <Else><Text>other</Text></Else>
              </If>
              <If test="len(tables) &gt; 5"><Text>big</Text><Else><Text>-small</Text></Else></If>
            </Template>
        "#});
        assert_eq!(out, "match-small");
    }

    #[test]
    fn test_with_pushes_model() {
        let out = run(indoc! {r#"
            <Template>
              <With in="tables[2]"><Write text="${table_name}@${server_name}"/></With>
            </Template>
        "#});
        assert_eq!(out, "order_items@db01");
    }

    #[test]
    fn test_allocate_and_assign() {
        let out = run(indoc! {r#"
            <Template>
              <Allocate token="total" value="0"/>
              <ForEach in="tables" var-it="t">
                <Assign token="total" value="total + len(t.columns)"/>
              </ForEach>
              <Write text="${total}"/>
            </Template>
        "#});
        assert_eq!(out, "3");
    }

    #[test]
    fn test_variable_errors() {
        let input = MemoryInput::new();
        let twice = r#"<Template><Allocate token="x"/><Allocate token="x"/></Template>"#;
        assert!(matches!(
            run_with(twice, &input, true),
            Err(TextMetalError::Variable(_))
        ));
        let undeclared = r#"<Template><Assign token="y" value="1"/></Template>"#;
        assert!(matches!(
            run_with(undeclared, &input, true),
            Err(TextMetalError::Variable(_))
        ));
    }

    #[test]
    fn test_output_scopes() {
        let output = run_with(
            indoc! {r#"
                <Template>
                  <ForEach in="tables" var-it="t">
                    <OutputScope name="${t.table_name}.txt"><Write text="${t.table_name | upper}"/></OutputScope>
                  </ForEach>
                  <OutputScope name="all.txt"><Text>a</Text></OutputScope>
                  <OutputScope name="all.txt" append="true"><Text>b</Text></OutputScope>
                </Template>
            "#},
            &MemoryInput::new(),
            true,
        )
        .unwrap();
        assert_eq!(output.unscoped, "");
        assert_eq!(output.files["user_accounts.txt"], "USER_ACCOUNTS");
        assert_eq!(output.files["audit_log.txt"], "AUDIT_LOG");
        assert_eq!(output.files["all.txt"], "ab");
    }

    #[test]
    fn test_include_shares_context() {
        let input = MemoryInput::new().with(
            "header.xml",
            r#"<Template><Write text="// ${properties.namespace} ${name}"/></Template>"#,
        );
        let out = run_with(
            indoc! {r#"
                <Template>
                  <Allocate token="name" value="'gen'"/>
                  <Include name="header.xml"/>
                  <Include name="header.xml"/>
                </Template>
            "#},
            &input,
            true,
        )
        .unwrap();
        assert_eq!(out.unscoped, "// Shop gen// Shop gen");
    }

    #[test]
    fn test_include_depth_limit() {
        let input = MemoryInput::new().with(
            "self.xml",
            r#"<Template><Include name="self.xml"/></Template>"#,
        );
        let err = run_with(
            r#"<Template><Include name="self.xml"/></Template>"#,
            &input,
            true,
        )
        .unwrap_err();
        assert!(err.to_string().contains("includes nest deeper than 32"));
    }

    #[test]
    fn test_lenient_leaves_unresolved_tokens() {
        let out = run_with(
            indoc! {r#"
                <Template>
                  <Write text="${missing.name} ${server_name}"/>
                  <If test="missing"><Text>never</Text></If>
                  <ForEach in="missing.items"><Text>never</Text></ForEach>
                </Template>
            "#},
            &MemoryInput::new(),
            false,
        )
        .unwrap();
        insta::assert_snapshot!(out.unscoped, @"${missing.name} db01");
    }

    #[test]
    fn test_strict_rejects_unresolved_tokens() {
        let err = run_with(
            r#"<Template><Write text="${missing.name}"/></Template>"#,
            &MemoryInput::new(),
            true,
        )
        .unwrap_err();
        assert!(matches!(err, TextMetalError::Unresolved(ref p) if p == "missing.name"));
    }

    #[test]
    fn test_cdata_and_escapes() {
        let out = run(indoc! {r#"
            <Template><![CDATA[fn ${server_name}() -> $${raw} {}]]></Template>
        "#});
        assert_eq!(out, "fn db01() -> ${raw} {}");
    }

    #[test]
    fn test_log_does_not_write_output() {
        let out = run(r#"<Template><Log message="tables: ${len(tables)}" level="warn"/></Template>"#);
        assert_eq!(out, "");
    }
}
