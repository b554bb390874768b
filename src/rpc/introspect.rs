//! Procedure → schema translation
//!
//! Schemas are rebuilt on every request from the descriptors captured at
//! declaration time. Nothing here can fail: types without a usable schema
//! were already degraded to `any` when the procedure was declared.

use super::procedure::Procedure;
use super::registry::Registry;
use super::schema::{ParameterSchema, ProcedureSchema, SchemaMap};

/// Describe one procedure, optionally under a registry name that differs
/// from its own
pub fn describe(procedure: &Procedure, name: Option<&str>) -> ProcedureSchema {
    let parameters = procedure
        .parameters()
        .iter()
        .map(|param| ParameterSchema {
            name: param.name.clone(),
            type_name: param.ty.rendered.clone(),
            schema: param.ty.schema.clone(),
            required: param.is_required(),
            default: param.default.clone(),
        })
        .collect();

    ProcedureSchema {
        name: name.unwrap_or_else(|| procedure.name()).to_string(),
        parameters,
        return_type: procedure.returns().rendered.clone(),
        return_schema: procedure.returns().schema.clone(),
        doc: procedure.doc().map(str::to_string),
    }
}

/// Describe every procedure currently registered, in list order
pub fn describe_all(registry: &Registry) -> SchemaMap {
    registry
        .entries()
        .into_iter()
        .map(|(name, procedure)| describe(&procedure, Some(&name)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn add() -> Procedure {
        Procedure::builder("add")
            .doc("Add two numbers.")
            .param("a")
            .param_default("b", 0)
            .sync(|a: i64, b: i64| -> anyhow::Result<i64> { Ok(a + b) })
            .unwrap()
    }

    #[test]
    fn test_describe_add() {
        let schema = describe(&add(), None);

        assert_eq!(schema.name, "add");
        assert_eq!(schema.doc.as_deref(), Some("Add two numbers."));
        assert_eq!(schema.parameters.len(), 2);

        let a = &schema.parameters[0];
        assert_eq!(a.name, "a");
        assert_eq!(a.type_name, "i64");
        assert!(a.required);
        assert_eq!(a.default, None);

        let b = &schema.parameters[1];
        assert!(!b.required);
        assert_eq!(b.default, Some(json!(0)));

        assert_eq!(schema.return_type, "i64");
        assert_eq!(schema.return_schema["type"], "integer");
        assert_eq!(schema.parameter_summary(), "a: i64, b: i64");
    }

    #[test]
    fn test_untyped_parameters_are_any() {
        let echo = Procedure::builder("echo")
            .param("value")
            .sync(|value: Value| -> anyhow::Result<Value> { Ok(value) })
            .unwrap();
        let schema = describe(&echo, None);

        assert_eq!(schema.parameters[0].type_name, "any");
        assert_eq!(schema.parameters[0].schema, json!({"type": "any"}));
        assert_eq!(schema.return_schema, json!({"type": "any"}));
        assert_eq!(schema.doc, None);
    }

    #[test]
    fn test_describe_uses_registry_name() {
        let schema = describe(&add(), Some("math.add"));
        assert_eq!(schema.name, "math.add");
    }

    #[test]
    fn test_describe_all_follows_list_order() {
        let registry = Registry::new();
        registry.declare_as("second", add()).unwrap();
        registry.declare(add()).unwrap();

        let schemas = describe_all(&registry);
        assert_eq!(schemas.names(), vec!["second", "add"]);

        let json = serde_json::to_value(&schemas).unwrap();
        assert_eq!(json["add"]["parameters"][1]["default"], json!(0));
        assert_eq!(json["add"]["parameters"][0]["type"], "i64");
    }

    #[test]
    fn test_describe_all_empty() {
        assert!(describe_all(&Registry::new()).is_empty());
    }
}
