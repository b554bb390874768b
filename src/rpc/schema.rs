//! Structured procedure descriptions
//!
//! A procedure's parameter and return types are captured once, when the
//! procedure is declared, as [`TypeDescriptor`]s. Introspection turns those
//! into [`ProcedureSchema`]s on demand.
//!
//! JSON-schema fragments come from schemars, so proper Rust types (and doc
//! comments on them) produce complete schemas with formats and required lists.

use schemars::JsonSchema;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{json, Value};
use std::any::TypeId;

/// Rendering used when a type carries no usable schema
pub const ANY_TYPE: &str = "any";

/// A declared type: its human rendering plus a JSON-schema fragment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeDescriptor {
    /// Type name with module paths stripped (e.g. `Vec<String>`)
    pub rendered: String,
    /// JSON-schema fragment for values of this type
    pub schema: Value,
}

impl TypeDescriptor {
    /// Describe a Rust type
    ///
    /// Never fails: `serde_json::Value` and anything whose schema cannot be
    /// serialized or carries no constraint degrade to [`TypeDescriptor::any`].
    pub fn of<T: JsonSchema + 'static>() -> Self {
        if TypeId::of::<T>() == TypeId::of::<Value>() {
            return Self::any();
        }

        let rendered = short_type_name(std::any::type_name::<T>());
        let schema = match serde_json::to_value(schemars::schema_for!(T)) {
            Ok(Value::Object(mut obj)) => {
                obj.remove("$schema");
                if is_unconstrained(&obj) {
                    any_schema()
                } else {
                    Value::Object(obj)
                }
            }
            _ => any_schema(),
        };

        Self { rendered, schema }
    }

    /// The unknown/untyped sentinel
    pub fn any() -> Self {
        Self {
            rendered: ANY_TYPE.to_string(),
            schema: any_schema(),
        }
    }

    pub fn is_any(&self) -> bool {
        self.schema == any_schema()
    }

    /// The `type` keyword of the fragment, when it is a single string
    pub fn json_type(&self) -> Option<&str> {
        self.schema.get("type").and_then(Value::as_str)
    }
}

/// `{"type": "any"}`
pub fn any_schema() -> Value {
    json!({ "type": ANY_TYPE })
}

fn is_unconstrained(obj: &serde_json::Map<String, Value>) -> bool {
    obj.keys().all(|k| k == "title" || k == "description")
}

/// Strip module paths from every segment of a type name
///
/// `alloc::vec::Vec<alloc::string::String>` becomes `Vec<String>`.
pub fn short_type_name(full: &str) -> String {
    let mut out = String::with_capacity(full.len());
    let mut segment = String::new();
    let mut chars = full.chars().peekable();

    while let Some(c) = chars.next() {
        if c == ':' && chars.peek() == Some(&':') {
            chars.next();
            segment.clear();
        } else if c.is_alphanumeric() || c == '_' {
            segment.push(c);
        } else {
            out.push_str(&segment);
            segment.clear();
            out.push(c);
        }
    }
    out.push_str(&segment);
    out
}

/// Description of one declared parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSchema {
    pub name: String,

    /// Rendered declared type (`"any"` when untyped)
    #[serde(rename = "type")]
    pub type_name: String,

    /// JSON-schema fragment for the parameter
    pub schema: Value,

    /// True iff the parameter has no default
    pub required: bool,

    /// The default value, when one is declared
    pub default: Option<Value>,
}

/// Description of one procedure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcedureSchema {
    pub name: String,
    /// Parameters in declaration order
    pub parameters: Vec<ParameterSchema>,
    pub return_type: String,
    pub return_schema: Value,
    pub doc: Option<String>,
}

impl ProcedureSchema {
    /// `a: i64, b: i64` style summary used by listings
    pub fn parameter_summary(&self) -> String {
        self.parameters
            .iter()
            .map(|p| format!("{}: {}", p.name, p.type_name))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Ordered name → schema mapping, in registry-list order
///
/// Serializes as a JSON object whose keys keep that order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaMap {
    entries: Vec<ProcedureSchema>,
}

impl SchemaMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a schema, replacing any existing entry with the same name in place
    pub fn insert(&mut self, schema: ProcedureSchema) {
        match self.entries.iter_mut().find(|s| s.name == schema.name) {
            Some(existing) => *existing = schema,
            None => self.entries.push(schema),
        }
    }

    pub fn get(&self, name: &str) -> Option<&ProcedureSchema> {
        self.entries.iter().find(|s| s.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProcedureSchema> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<ProcedureSchema> for SchemaMap {
    fn from_iter<I: IntoIterator<Item = ProcedureSchema>>(iter: I) -> Self {
        let mut map = SchemaMap::new();
        for schema in iter {
            map.insert(schema);
        }
        map
    }
}

impl<'a> IntoIterator for &'a SchemaMap {
    type Item = &'a ProcedureSchema;
    type IntoIter = std::slice::Iter<'a, ProcedureSchema>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl Serialize for SchemaMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for schema in &self.entries {
            map.serialize_entry(&schema.name, schema)?;
        }
        map.end()
    }
}
