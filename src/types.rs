//! Wire envelope types
//!
//! Request: `{"id": <string|integer|null>, "method": "<name>", "params": <array|object|null>}`
//! Response: `{"id": <echoed>, "result": <any|null>, "error": {"code", "message"} | null}`

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;

use crate::rpc::errors::RpcError;

/// Request identifier, echoed verbatim in the response
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    Number(i64),
    /// Integers above `i64::MAX`
    Unsigned(u64),
    String(String),
}

impl RequestId {
    /// Best-effort extraction from an unvalidated payload
    ///
    /// Returns `None` when the payload is not an object, has no `id`, or the
    /// `id` is of an unsupported type.
    pub fn extract(payload: &Value) -> Option<Self> {
        match payload.get("id")? {
            Value::String(s) => Some(RequestId::String(s.clone())),
            Value::Number(n) => n
                .as_i64()
                .map(RequestId::Number)
                .or_else(|| n.as_u64().map(RequestId::Unsigned)),
            _ => None,
        }
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestId::Number(n) => write!(f, "{}", n),
            RequestId::Unsigned(n) => write!(f, "{}", n),
            RequestId::String(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for RequestId {
    fn from(n: i64) -> Self {
        RequestId::Number(n)
    }
}

impl From<&str> for RequestId {
    fn from(s: &str) -> Self {
        RequestId::String(s.to_string())
    }
}

impl From<String> for RequestId {
    fn from(s: String) -> Self {
        RequestId::String(s)
    }
}

/// Call arguments: positional and named binding are mutually exclusive
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Params {
    /// No arguments supplied
    #[default]
    None,
    /// Bound in declaration order
    Positional(Vec<Value>),
    /// Bound by parameter name
    Named(Map<String, Value>),
}

impl Params {
    /// Interpret a raw `params` value
    pub fn from_value(value: Value) -> Result<Self, String> {
        match value {
            Value::Null => Ok(Params::None),
            Value::Array(items) => Ok(Params::Positional(items)),
            Value::Object(map) => Ok(Params::Named(map)),
            other => Err(format!(
                "field 'params' must be an array, an object or null, got {}",
                json_type_name(&other)
            )),
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Params::None)
    }

    /// True when no argument values are carried at all
    pub fn is_empty(&self) -> bool {
        match self {
            Params::None => true,
            Params::Positional(items) => items.is_empty(),
            Params::Named(map) => map.is_empty(),
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Params::None => Value::Null,
            Params::Positional(items) => Value::Array(items.clone()),
            Params::Named(map) => Value::Object(map.clone()),
        }
    }
}

impl From<Vec<Value>> for Params {
    fn from(items: Vec<Value>) -> Self {
        Params::Positional(items)
    }
}

impl From<Map<String, Value>> for Params {
    fn from(map: Map<String, Value>) -> Self {
        Params::Named(map)
    }
}

impl Serialize for Params {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Params::None => serializer.serialize_unit(),
            Params::Positional(items) => items.serialize(serializer),
            Params::Named(map) => map.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Params {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Params::from_value(value).map_err(D::Error::custom)
    }
}

/// Inbound call envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RequestId>,
    pub method: String,
    #[serde(default, skip_serializing_if = "Params::is_none")]
    pub params: Params,
}

impl RpcRequest {
    pub fn new(id: Option<RequestId>, method: impl Into<String>, params: Params) -> Self {
        Self {
            id,
            method: method.into(),
            params,
        }
    }

    /// Validate an untyped payload against the envelope shape
    ///
    /// Messages are written for humans and end up, prefixed, in a 400 error.
    pub fn from_payload(payload: &Value) -> Result<Self, String> {
        let obj = payload.as_object().ok_or_else(|| {
            format!("payload must be a JSON object, got {}", json_type_name(payload))
        })?;

        let id = match obj.get("id") {
            None | Some(Value::Null) => None,
            Some(raw) => Some(RequestId::extract(payload).ok_or_else(|| {
                format!(
                    "field 'id' must be a string, an integer or null, got {}",
                    json_type_name(raw)
                )
            })?),
        };

        let method = match obj.get("method") {
            None => return Err("missing field 'method'".to_string()),
            Some(Value::String(s)) => s.clone(),
            Some(other) => {
                return Err(format!(
                    "field 'method' must be a string, got {}",
                    json_type_name(other)
                ))
            }
        };

        let params = match obj.get("params") {
            None => Params::None,
            Some(raw) => Params::from_value(raw.clone())?,
        };

        Ok(Self { id, method, params })
    }
}

/// Error member of a response envelope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorObject {
    pub code: i64,
    pub message: String,
}

/// Outbound envelope: exactly one of `result`/`error` is populated
///
/// All three keys are always serialized so callers can rely on their presence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcResponse {
    #[serde(default)]
    pub id: Option<RequestId>,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<ErrorObject>,
}

impl RpcResponse {
    pub fn success(id: Option<RequestId>, result: Value) -> Self {
        Self {
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(id: Option<RequestId>, error: &RpcError) -> Self {
        Self {
            id,
            result: None,
            error: Some(error.to_error_object()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Render as a JSON value
    pub fn to_value(&self) -> Value {
        serde_json::json!({
            "id": self.id,
            "result": self.result,
            "error": self.error,
        })
    }
}

pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_id_extract() {
        assert_eq!(RequestId::extract(&json!({"id": 1})), Some(RequestId::Number(1)));
        assert_eq!(
            RequestId::extract(&json!({"id": "req-1"})),
            Some(RequestId::String("req-1".into()))
        );
        assert_eq!(RequestId::extract(&json!({"id": 1.5})), None);
        assert_eq!(RequestId::extract(&json!({"id": -7})), Some(RequestId::Number(-7)));
        assert_eq!(RequestId::extract(&json!({"id": true})), None);
        assert_eq!(RequestId::extract(&json!([1, 2])), None);
        assert_eq!(RequestId::extract(&json!({})), None);
    }

    #[test]
    fn test_large_integer_id_is_accepted_and_echoed() {
        let payload = json!({"id": u64::MAX, "method": "ghost"});
        let req = RpcRequest::from_payload(&payload).unwrap();
        assert_eq!(req.id, Some(RequestId::Unsigned(u64::MAX)));
        assert_eq!(req.id.as_ref().unwrap().to_string(), "18446744073709551615");

        let response = RpcResponse::failure(req.id, &RpcError::MethodNotFound("ghost".into()));
        assert_eq!(response.to_value()["id"], json!(u64::MAX));

        let parsed: RequestId = serde_json::from_value(json!(u64::MAX)).unwrap();
        assert_eq!(parsed, RequestId::Unsigned(u64::MAX));
        let parsed: RequestId = serde_json::from_value(json!(5)).unwrap();
        assert_eq!(parsed, RequestId::Number(5));
    }

    #[test]
    fn test_from_payload_valid() {
        let req = RpcRequest::from_payload(&json!({
            "id": 1, "method": "add", "params": {"a": 10, "b": 20}
        }))
        .unwrap();
        assert_eq!(req.id, Some(RequestId::Number(1)));
        assert_eq!(req.method, "add");
        assert!(matches!(req.params, Params::Named(ref m) if m.len() == 2));

        let req = RpcRequest::from_payload(&json!({"method": "ping"})).unwrap();
        assert_eq!(req.id, None);
        assert!(req.params.is_none());

        let req = RpcRequest::from_payload(&json!({"method": "ping", "params": null})).unwrap();
        assert!(req.params.is_none());
    }

    #[test]
    fn test_from_payload_rejects_bad_method() {
        let err = RpcRequest::from_payload(&json!({"id": 1, "method": 123})).unwrap_err();
        assert_eq!(err, "field 'method' must be a string, got integer");

        let err = RpcRequest::from_payload(&json!({"id": 1})).unwrap_err();
        assert_eq!(err, "missing field 'method'");
    }

    #[test]
    fn test_from_payload_rejects_bad_params_and_id() {
        let err = RpcRequest::from_payload(&json!({"method": "x", "params": "nope"})).unwrap_err();
        assert!(err.contains("'params'"), "{}", err);

        let err = RpcRequest::from_payload(&json!({"method": "x", "id": [1]})).unwrap_err();
        assert!(err.contains("'id'"), "{}", err);

        let err = RpcRequest::from_payload(&json!("just a string")).unwrap_err();
        assert!(err.contains("JSON object"), "{}", err);
    }

    #[test]
    fn test_request_serialization_omits_absent_fields() {
        let req = RpcRequest::new(None, "ping", Params::None);
        assert_eq!(serde_json::to_value(&req).unwrap(), json!({"method": "ping"}));

        let req = RpcRequest::new(Some("abc".into()), "add", Params::Positional(vec![json!(1)]));
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({"id": "abc", "method": "add", "params": [1]})
        );
    }

    #[test]
    fn test_response_always_carries_all_keys() {
        let ok = RpcResponse::success(Some(1.into()), json!(30));
        assert_eq!(
            serde_json::to_value(&ok).unwrap(),
            json!({"id": 1, "result": 30, "error": null})
        );

        let err = RpcResponse::failure(None, &RpcError::MethodNotFound("ghost".into()));
        assert_eq!(
            serde_json::to_value(&err).unwrap(),
            json!({"id": null, "result": null, "error": {"code": 404, "message": "Method not found: ghost"}})
        );
        assert_eq!(err.to_value(), serde_json::to_value(&err).unwrap());
    }

    #[test]
    fn test_params_deserialize() {
        let p: Params = serde_json::from_value(json!([1, 2])).unwrap();
        assert_eq!(p, Params::Positional(vec![json!(1), json!(2)]));
        let p: Params = serde_json::from_value(json!(null)).unwrap();
        assert!(p.is_none());
        assert!(serde_json::from_value::<Params>(json!(5)).is_err());
    }
}
