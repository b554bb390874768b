//! Procedures and their declaration
//!
//! A [`Procedure`] pairs a type-erased handler with the descriptor of its
//! signature: parameter names, declared types, defaults and return type.
//! The descriptor is built once, when the procedure is declared, and is what
//! introspection and argument binding both read.

use serde_json::Value;
use std::collections::HashSet;
use std::fmt;

use super::errors::{DeclarationError, ExecutionError};
use super::handler::{AsyncAdapter, AsyncHandler, InvokeError, Invokable, Outcome, SyncAdapter, SyncHandler};
use super::schema::TypeDescriptor;
use crate::types::Params;

/// One declared parameter
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSpec {
    pub name: String,
    pub ty: TypeDescriptor,
    pub default: Option<Value>,
}

impl ParameterSpec {
    pub fn is_required(&self) -> bool {
        self.default.is_none()
    }
}

/// A named, remotely invocable function
pub struct Procedure {
    name: String,
    doc: Option<String>,
    parameters: Vec<ParameterSpec>,
    returns: TypeDescriptor,
    is_async: bool,
    invokable: Box<dyn Invokable>,
}

impl Procedure {
    /// Start declaring a procedure called `name`
    pub fn builder(name: impl Into<String>) -> ProcedureBuilder {
        ProcedureBuilder::new(name)
    }

    /// The procedure's own identifier
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn doc(&self) -> Option<&str> {
        self.doc.as_deref()
    }

    /// Parameters in declaration order
    pub fn parameters(&self) -> &[ParameterSpec] {
        &self.parameters
    }

    pub fn returns(&self) -> &TypeDescriptor {
        &self.returns
    }

    pub fn is_async(&self) -> bool {
        self.is_async
    }

    /// Bind call arguments to the declared parameter list
    ///
    /// Positional and named binding never mix. Missing arguments take their
    /// declared default; the result is ordered like [`Procedure::parameters`].
    pub fn bind(&self, params: Params) -> Result<Vec<Value>, ExecutionError> {
        match params {
            Params::None => self.fill(Vec::new()),
            Params::Positional(values) => {
                if values.len() > self.parameters.len() {
                    return Err(ExecutionError::new(format!(
                        "{}() takes {} positional argument{} but {} {} given",
                        self.name,
                        self.parameters.len(),
                        if self.parameters.len() == 1 { "" } else { "s" },
                        values.len(),
                        if values.len() == 1 { "was" } else { "were" }
                    )));
                }
                self.fill(values)
            }
            Params::Named(mut map) => {
                if let Some(unexpected) = map
                    .keys()
                    .find(|key| !self.parameters.iter().any(|p| &p.name == *key))
                {
                    return Err(ExecutionError::new(format!(
                        "{}() got an unexpected keyword argument '{}'",
                        self.name, unexpected
                    )));
                }
                self.parameters
                    .iter()
                    .map(|param| match map.remove(&param.name) {
                        Some(value) => Ok(value),
                        None => self.default_for(param),
                    })
                    .collect()
            }
        }
    }

    fn fill(&self, mut values: Vec<Value>) -> Result<Vec<Value>, ExecutionError> {
        for param in &self.parameters[values.len()..] {
            values.push(self.default_for(param)?);
        }
        Ok(values)
    }

    fn default_for(&self, param: &ParameterSpec) -> Result<Value, ExecutionError> {
        param.default.clone().ok_or_else(|| {
            ExecutionError::new(format!(
                "{}() missing required argument '{}'",
                self.name, param.name
            ))
        })
    }

    /// Bind and start the call
    ///
    /// Never panics and never returns early with an error: every failure is
    /// carried in the returned [`Outcome`].
    pub fn dispatch(&self, params: Params) -> Outcome {
        let args = match self.bind(params) {
            Ok(args) => args,
            Err(error) => return Outcome::Ready(Err(error)),
        };

        match self.invokable.invoke(args) {
            Ok(outcome) => outcome,
            Err(InvokeError::Argument { index, message }) => {
                let name = self
                    .parameters
                    .get(index)
                    .map(|p| p.name.as_str())
                    .unwrap_or("?");
                Outcome::Ready(Err(ExecutionError::new(format!(
                    "invalid value for argument '{}': {}",
                    name, message
                ))))
            }
            Err(InvokeError::Failed(error)) => Outcome::Ready(Err(error)),
        }
    }

    /// Call the procedure directly, awaiting it if it is asynchronous
    pub async fn invoke(&self, params: Params) -> Result<Value, ExecutionError> {
        self.dispatch(params).resolve().await
    }
}

impl fmt::Debug for Procedure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Procedure")
            .field("name", &self.name)
            .field("doc", &self.doc)
            .field("parameters", &self.parameters)
            .field("returns", &self.returns.rendered)
            .field("is_async", &self.is_async)
            .finish_non_exhaustive()
    }
}

/// Builder collecting a procedure's declared signature
///
/// Parameter names are declared in order and matched against the handler's
/// arguments when the handler is attached with [`ProcedureBuilder::sync`] or
/// [`ProcedureBuilder::asynchronous`].
#[derive(Debug, Clone)]
pub struct ProcedureBuilder {
    name: String,
    doc: Option<String>,
    params: Vec<(String, Option<Value>)>,
}

impl ProcedureBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            doc: None,
            params: Vec::new(),
        }
    }

    /// Documentation string, surfaced by introspection and generated clients
    pub fn doc(mut self, doc: impl Into<String>) -> Self {
        let doc = doc.into();
        let trimmed = doc.trim();
        self.doc = if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        };
        self
    }

    /// Declare the next required parameter
    pub fn param(mut self, name: impl Into<String>) -> Self {
        self.params.push((name.into(), None));
        self
    }

    /// Declare the next parameter with a default value
    pub fn param_default(mut self, name: impl Into<String>, default: impl Into<Value>) -> Self {
        self.params.push((name.into(), Some(default.into())));
        self
    }

    /// Declare several required parameters at once
    pub fn params<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.params
            .extend(names.into_iter().map(|name| (name.into(), None)));
        self
    }

    /// Attach a synchronous handler
    pub fn sync<F, Args>(self, handler: F) -> Result<Procedure, DeclarationError>
    where
        F: SyncHandler<Args>,
        Args: 'static,
    {
        self.finish(
            F::parameter_types(),
            F::return_type(),
            false,
            Box::new(SyncAdapter::new(handler)),
        )
    }

    /// Attach a handler returning a future
    pub fn asynchronous<F, Args>(self, handler: F) -> Result<Procedure, DeclarationError>
    where
        F: AsyncHandler<Args>,
        Args: 'static,
    {
        self.finish(
            F::parameter_types(),
            F::return_type(),
            true,
            Box::new(AsyncAdapter::new(handler)),
        )
    }

    fn finish(
        self,
        types: Vec<TypeDescriptor>,
        returns: TypeDescriptor,
        is_async: bool,
        invokable: Box<dyn Invokable>,
    ) -> Result<Procedure, DeclarationError> {
        if self.name.trim().is_empty() {
            return Err(DeclarationError::EmptyName);
        }
        if self.params.len() > types.len() {
            return Err(DeclarationError::ArityMismatch {
                procedure: self.name,
                declared: self.params.len(),
                arity: types.len(),
            });
        }

        let mut declared = self.params.into_iter();
        let mut seen = HashSet::new();
        let mut seen_default = false;
        let mut parameters = Vec::with_capacity(types.len());

        for (index, ty) in types.into_iter().enumerate() {
            let (name, default) = declared
                .next()
                .unwrap_or_else(|| (format!("arg{}", index), None));

            if !seen.insert(name.clone()) {
                return Err(DeclarationError::DuplicateParameter {
                    procedure: self.name,
                    parameter: name,
                });
            }
            if default.is_some() {
                seen_default = true;
            } else if seen_default {
                return Err(DeclarationError::RequiredAfterDefault {
                    procedure: self.name,
                    parameter: name,
                });
            }

            parameters.push(ParameterSpec { name, ty, default });
        }

        Ok(Procedure {
            name: self.name,
            doc: self.doc,
            parameters,
            returns,
            is_async,
            invokable,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map};

    fn add() -> Procedure {
        Procedure::builder("add")
            .doc("Add two numbers.")
            .param("a")
            .param_default("b", 0)
            .sync(|a: i64, b: i64| -> anyhow::Result<i64> { Ok(a + b) })
            .unwrap()
    }

    fn named(pairs: &[(&str, Value)]) -> Params {
        let mut map = Map::new();
        for (k, v) in pairs {
            map.insert(k.to_string(), v.clone());
        }
        Params::Named(map)
    }

    #[test]
    fn test_declared_signature() {
        let proc = add();
        assert_eq!(proc.name(), "add");
        assert_eq!(proc.doc(), Some("Add two numbers."));
        assert!(!proc.is_async());
        let params = proc.parameters();
        assert_eq!(params.len(), 2);
        assert!(params[0].is_required());
        assert_eq!(params[1].default, Some(json!(0)));
    }

    #[test]
    fn test_bind_positional_fills_defaults() {
        let proc = add();
        assert_eq!(proc.bind(Params::Positional(vec![json!(5)])).unwrap(), vec![json!(5), json!(0)]);
    }

    #[test]
    fn test_bind_named_is_order_independent() {
        let proc = add();
        let args = proc.bind(named(&[("b", json!(2)), ("a", json!(1))])).unwrap();
        assert_eq!(args, vec![json!(1), json!(2)]);
    }

    #[test]
    fn test_bind_errors() {
        let proc = add();

        let err = proc.bind(Params::None).unwrap_err();
        assert_eq!(err.message(), "add() missing required argument 'a'");

        let err = proc
            .bind(Params::Positional(vec![json!(1), json!(2), json!(3)]))
            .unwrap_err();
        assert_eq!(err.message(), "add() takes 2 positional arguments but 3 were given");

        let err = proc.bind(named(&[("a", json!(1)), ("c", json!(3))])).unwrap_err();
        assert_eq!(err.message(), "add() got an unexpected keyword argument 'c'");
    }

    #[test]
    fn test_unexpected_keyword_reported_before_missing_argument() {
        let err = add().bind(named(&[("c", json!(1))])).unwrap_err();
        assert_eq!(err.message(), "add() got an unexpected keyword argument 'c'");
    }

    #[test]
    fn test_single_extra_positional_uses_singular_verb() {
        let proc = Procedure::builder("z")
            .sync(|| -> anyhow::Result<()> { Ok(()) })
            .unwrap();
        let err = proc.bind(Params::Positional(vec![json!(1)])).unwrap_err();
        assert_eq!(err.message(), "z() takes 0 positional arguments but 1 was given");
    }

    #[tokio::test]
    async fn test_invoke_reports_bad_argument_by_name() {
        let proc = add();
        let err = proc
            .invoke(named(&[("a", json!("ten"))]))
            .await
            .unwrap_err();
        assert!(err.message().starts_with("invalid value for argument 'a'"), "{}", err);
    }

    #[tokio::test]
    async fn test_invoke_sync_and_async() {
        assert_eq!(add().invoke(Params::Positional(vec![json!(10), json!(20)])).await.unwrap(), json!(30));

        let proc = Procedure::builder("later")
            .param("x")
            .asynchronous(|x: String| async move { Ok::<_, anyhow::Error>(format!("later {}", x)) })
            .unwrap();
        assert!(proc.is_async());
        assert!(proc.dispatch(Params::Positional(vec![json!("now")])).is_pending());
        assert_eq!(
            proc.invoke(Params::Positional(vec![json!("now")])).await.unwrap(),
            json!("later now")
        );
    }

    #[test]
    fn test_undeclared_parameters_get_positional_names() {
        let proc = Procedure::builder("pair")
            .sync(|a: i64, b: bool| -> anyhow::Result<(i64, bool)> { Ok((a, b)) })
            .unwrap();
        let names: Vec<_> = proc.parameters().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["arg0", "arg1"]);
    }

    #[test]
    fn test_declaration_errors() {
        let err = Procedure::builder("")
            .sync(|| -> anyhow::Result<()> { Ok(()) })
            .unwrap_err();
        assert_eq!(err, DeclarationError::EmptyName);

        let err = Procedure::builder("f")
            .params(["a", "b"])
            .sync(|a: i64| -> anyhow::Result<i64> { Ok(a) })
            .unwrap_err();
        assert!(matches!(err, DeclarationError::ArityMismatch { declared: 2, arity: 1, .. }));

        let err = Procedure::builder("f")
            .params(["a", "a"])
            .sync(|a: i64, b: i64| -> anyhow::Result<i64> { Ok(a + b) })
            .unwrap_err();
        assert!(matches!(err, DeclarationError::DuplicateParameter { .. }));

        let err = Procedure::builder("f")
            .param_default("a", 1)
            .param("b")
            .sync(|a: i64, b: i64| -> anyhow::Result<i64> { Ok(a + b) })
            .unwrap_err();
        assert!(matches!(err, DeclarationError::RequiredAfterDefault { .. }));
    }

    #[test]
    fn test_blank_doc_is_absent() {
        let proc = Procedure::builder("ping")
            .doc("   ")
            .sync(|| -> anyhow::Result<String> { Ok("pong".to_string()) })
            .unwrap();
        assert_eq!(proc.doc(), None);
    }
}
