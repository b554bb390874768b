//! TypeScript client target

use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::OnceLock;

use super::CodegenError;
use crate::rpc::schema::{ProcedureSchema, SchemaMap};

const TEMPLATE: &str = include_str!("client.ts.mustache");

/// Fallback for anything without a safe mapping
const ANY: &str = "any";

const RESERVED: &[&str] = &[
    "break", "case", "catch", "class", "const", "continue", "debugger", "default", "delete",
    "do", "else", "enum", "export", "extends", "false", "finally", "for", "function", "if",
    "import", "in", "instanceof", "new", "null", "return", "super", "switch", "this", "throw",
    "true", "try", "typeof", "var", "void", "while", "with", "yield", "let", "static",
    "implements", "interface", "package", "private", "protected", "public", "await",
];

/// Members the generated class defines itself
const CLASS_MEMBERS: &[&str] = &["constructor", "execute", "baseUrl", "path"];

fn identifier_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*$").expect("valid identifier pattern"))
}

fn is_identifier(name: &str) -> bool {
    identifier_pattern().is_match(name)
}

/// Map a JSON-schema fragment to a TypeScript type, only where the mapping is safe
pub fn ts_type(schema: &Value) -> String {
    match schema.get("type") {
        Some(Value::String(kind)) => match kind.as_str() {
            "array" => match schema.get("items") {
                Some(items) if items.is_object() => {
                    let inner = ts_type(items);
                    if inner == ANY {
                        "any[]".to_string()
                    } else if inner.contains(' ') {
                        format!("({})[]", inner)
                    } else {
                        format!("{}[]", inner)
                    }
                }
                _ => "any[]".to_string(),
            },
            other => scalar(other).unwrap_or(ANY).to_string(),
        },
        Some(Value::Array(kinds)) => {
            let mapped: Option<Vec<&str>> = kinds
                .iter()
                .map(|k| k.as_str().and_then(scalar))
                .collect();
            match mapped {
                Some(mut types) if !types.is_empty() => {
                    types.dedup();
                    types.join(" | ")
                }
                _ => ANY.to_string(),
            }
        }
        _ => ANY.to_string(),
    }
}

fn scalar(kind: &str) -> Option<&'static str> {
    match kind {
        "integer" | "number" => Some("number"),
        "string" => Some("string"),
        "boolean" => Some("boolean"),
        "null" => Some("null"),
        _ => None,
    }
}

fn quote(text: &str) -> String {
    Value::String(text.to_string()).to_string()
}

#[derive(Serialize)]
struct ClientView {
    methods: Vec<MethodView>,
}

#[derive(Serialize)]
struct MethodView {
    method_name: String,
    method_literal: String,
    signature: String,
    returns: String,
    has_doc: bool,
    doc_lines: Vec<DocLine>,
    args: Vec<ArgView>,
}

#[derive(Serialize)]
struct DocLine {
    text: String,
}

#[derive(Serialize)]
struct ArgView {
    key: String,
    ident: String,
}

/// Property key for a procedure's method, unique within the class
///
/// Names clashing with the class's own members get a `_` suffix; the wire
/// method string is unaffected.
fn member_name(name: &str, taken: &mut HashSet<String>) -> String {
    let mut member = name.to_string();
    if CLASS_MEMBERS.contains(&name) {
        member.push('_');
    }
    while !taken.insert(member.clone()) {
        member.push('_');
    }
    if is_identifier(&member) {
        member
    } else {
        quote(&member)
    }
}

fn method_view(schema: &ProcedureSchema, taken: &mut HashSet<String>) -> MethodView {
    let mut used = HashSet::new();
    let mut signature = Vec::with_capacity(schema.parameters.len());
    let mut args = Vec::with_capacity(schema.parameters.len());

    for (index, param) in schema.parameters.iter().enumerate() {
        let mut ident = if is_identifier(&param.name) && !RESERVED.contains(&param.name.as_str()) {
            param.name.clone()
        } else {
            format!("arg{}", index)
        };
        while !used.insert(ident.clone()) {
            ident.push('_');
        }

        // A required parameter after an optional one would not type-check
        let optional = !param.required
            && schema.parameters[index..].iter().all(|p| !p.required);
        signature.push(format!(
            "{}{}: {}",
            ident,
            if optional { "?" } else { "" },
            ts_type(&param.schema)
        ));
        args.push(ArgView {
            key: quote(&param.name),
            ident,
        });
    }

    let method_name = member_name(&schema.name, taken);

    let doc_lines: Vec<DocLine> = schema
        .doc
        .as_deref()
        .map(|doc| {
            doc.lines()
                .map(|line| {
                    let line = line.trim_end().replace("*/", "*\\/");
                    DocLine {
                        text: if line.is_empty() { line } else { format!(" {}", line) },
                    }
                })
                .collect()
        })
        .unwrap_or_default();

    MethodView {
        method_name,
        method_literal: quote(&schema.name),
        signature: signature.join(", "),
        returns: ts_type(&schema.return_schema),
        has_doc: !doc_lines.is_empty(),
        doc_lines,
        args,
    }
}

/// Render a TypeScript client for the given schemas
///
/// Methods appear in map order; output is byte-identical for equal input.
pub fn render(schemas: &SchemaMap) -> Result<String, CodegenError> {
    let mut taken: HashSet<String> = CLASS_MEMBERS.iter().map(|m| m.to_string()).collect();
    let view = ClientView {
        methods: schemas
            .iter()
            .map(|schema| method_view(schema, &mut taken))
            .collect(),
    };

    let template =
        mustache::compile_str(TEMPLATE).map_err(|e| CodegenError::Template(e.to_string()))?;
    let mut output = Vec::new();
    template
        .render(&mut output, &view)
        .map_err(|e| CodegenError::Render(e.to_string()))?;
    String::from_utf8(output).map_err(|e| CodegenError::Render(format!("UTF-8 conversion error: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc::introspect::describe_all;
    use crate::rpc::procedure::Procedure;
    use crate::rpc::registry::Registry;
    use serde_json::json;

    fn registry() -> Registry {
        let registry = Registry::new();
        registry
            .declare(
                Procedure::builder("add")
                    .doc("Add two numbers.")
                    .param("a")
                    .param_default("b", 0)
                    .sync(|a: i64, b: i64| -> anyhow::Result<i64> { Ok(a + b) })
                    .unwrap(),
            )
            .unwrap();
        registry
            .declare_as(
                "user.rename",
                Procedure::builder("rename")
                    .params(["value", "new"])
                    .sync(|value: Value, new: String| -> anyhow::Result<Value> {
                        Ok(json!({"old": value, "new": new}))
                    })
                    .unwrap(),
            )
            .unwrap();
        registry
    }

    #[test]
    fn test_ts_type_mapping() {
        assert_eq!(ts_type(&json!({"type": "integer", "format": "int64"})), "number");
        assert_eq!(ts_type(&json!({"type": "string"})), "string");
        assert_eq!(ts_type(&json!({"type": "boolean"})), "boolean");
        assert_eq!(ts_type(&json!({"type": ["string", "null"]})), "string | null");
        assert_eq!(ts_type(&json!({"type": "array", "items": {"type": "number"}})), "number[]");
        assert_eq!(ts_type(&json!({"type": "object", "properties": {}})), "any");
        assert_eq!(ts_type(&json!({"type": "any"})), "any");
        assert_eq!(ts_type(&json!({"$ref": "#/$defs/User"})), "any");
    }

    #[test]
    fn test_render_methods() {
        let output = render(&describe_all(&registry())).unwrap();

        assert!(output.contains("export class PRPCClient"));
        assert!(output.contains("export class PRPCError"));
        assert!(output.contains("private async execute"));
        assert!(output.contains("async add(a: number, b?: number): Promise<number>"));
        assert!(output.contains("return this.execute(\"add\", {"));
        assert!(output.contains("\"a\": a,"));
        assert!(output.contains("\"b\": b,"));
        assert!(output.contains(" * Add two numbers."));

        // Invalid identifiers are quoted or renamed
        assert!(output.contains("async \"user.rename\"(value: any, arg1: string): Promise<any>"));
        assert!(output.contains("\"new\": arg1,"));
    }

    #[test]
    fn test_render_empty_registry() {
        let output = render(&SchemaMap::new()).unwrap();
        let helper = output.find("private async execute").unwrap();

        assert!(output.contains("constructor(baseUrl: string"));
        assert!(!output[helper + "private async execute".len()..].contains("async "));
    }

    #[test]
    fn test_render_is_deterministic() {
        let registry = registry();
        let first = render(&describe_all(&registry)).unwrap();
        let second = render(&describe_all(&registry)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_names_clashing_with_class_members_are_renamed() {
        let registry = Registry::new();
        for name in ["execute", "constructor", "path", "baseUrl", "execute_"] {
            registry
                .declare(
                    Procedure::builder(name)
                        .sync(|| -> anyhow::Result<i64> { Ok(1) })
                        .unwrap(),
                )
                .unwrap();
        }
        let output = render(&describe_all(&registry)).unwrap();

        assert_eq!(output.matches("async execute(").count(), 1);
        assert!(output.contains("private async execute(method: string"));
        assert!(!output.contains("async constructor("));
        assert!(!output.contains("async path("));
        assert!(!output.contains("async baseUrl("));

        assert!(output.contains("async execute_(): Promise<number>"));
        assert!(output.contains("async constructor_(): Promise<number>"));
        assert!(output.contains("async path_(): Promise<number>"));
        assert!(output.contains("async baseUrl_(): Promise<number>"));
        assert!(output.contains("async execute__(): Promise<number>"));

        // The wire name stays the original
        assert!(output.contains("return this.execute(\"execute\", {"));
        assert!(output.contains("return this.execute(\"constructor\", {"));
        assert!(output.contains("return this.execute(\"execute_\", {"));
    }

    #[test]
    fn test_doc_comment_cannot_close_early() {
        let registry = Registry::new();
        registry
            .declare(
                Procedure::builder("tricky")
                    .doc("ends here */ not really")
                    .sync(|| -> anyhow::Result<()> { Ok(()) })
                    .unwrap(),
            )
            .unwrap();
        let output = render(&describe_all(&registry)).unwrap();
        assert!(output.contains("ends here *\\/ not really"));
        assert!(output.contains("async tricky(): Promise<null>"));
    }
}
