//! Typed handler adapters
//!
//! Ordinary Rust functions and closures become procedures through two traits,
//! [`SyncHandler`] and [`AsyncHandler`], implemented for every `Fn` of arity
//! 0 to 8 whose arguments are `DeserializeOwned + JsonSchema` and whose
//! result is `anyhow::Result<R>` with `R: Serialize + JsonSchema`.
//!
//! At declaration time the handler is wrapped in an adapter implementing the
//! object-safe [`Invokable`] trait, which is all the registry ever stores.
//!
//! Closures should spell out their return type so the arity can be inferred:
//!
//! ```ignore
//! Procedure::builder("add")
//!     .params(["a", "b"])
//!     .sync(|a: i64, b: i64| -> anyhow::Result<i64> { Ok(a + b) })?;
//! ```

use futures::future::BoxFuture;
use futures::FutureExt;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::future::Future;
use std::marker::PhantomData;
use std::panic::{catch_unwind, AssertUnwindSafe};

use super::errors::ExecutionError;
use super::schema::TypeDescriptor;

/// Result of starting a procedure call
///
/// Synchronous procedures always produce `Ready`; asynchronous ones produce
/// `Pending` once their arguments have been decoded.
pub enum Outcome {
    Ready(Result<Value, ExecutionError>),
    Pending(BoxFuture<'static, Result<Value, ExecutionError>>),
}

impl Outcome {
    pub fn is_pending(&self) -> bool {
        matches!(self, Outcome::Pending(_))
    }

    /// Resolve to the final value, suspending only for `Pending`
    pub async fn resolve(self) -> Result<Value, ExecutionError> {
        match self {
            Outcome::Ready(result) => result,
            Outcome::Pending(future) => future.await,
        }
    }
}

impl std::fmt::Debug for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::Ready(result) => f.debug_tuple("Ready").field(result).finish(),
            Outcome::Pending(_) => f.write_str("Pending(..)"),
        }
    }
}

/// Failure raised by a handler before or while producing its outcome
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvokeError {
    /// The bound value at `index` could not be decoded into the declared type
    Argument { index: usize, message: String },
    /// The handler itself failed
    Failed(ExecutionError),
}

/// Object-safe calling convention stored in the registry
pub trait Invokable: Send + Sync + 'static {
    /// Call with fully bound arguments, in declaration order
    fn invoke(&self, args: Vec<Value>) -> Result<Outcome, InvokeError>;
}

/// A synchronous function usable as a procedure body
pub trait SyncHandler<Args>: Send + Sync + 'static {
    fn parameter_types() -> Vec<TypeDescriptor>;
    fn return_type() -> TypeDescriptor;
    fn call(&self, args: Vec<Value>) -> Result<Value, InvokeError>;
}

/// A function returning a future, usable as a procedure body
pub trait AsyncHandler<Args>: Send + Sync + 'static {
    fn parameter_types() -> Vec<TypeDescriptor>;
    fn return_type() -> TypeDescriptor;
    fn call(
        &self,
        args: Vec<Value>,
    ) -> Result<BoxFuture<'static, Result<Value, ExecutionError>>, InvokeError>;
}

fn decode<T: DeserializeOwned>(index: usize, value: Option<Value>) -> Result<T, InvokeError> {
    let value = value.unwrap_or(Value::Null);
    serde_json::from_value(value).map_err(|e| InvokeError::Argument {
        index,
        message: e.to_string(),
    })
}

fn encode<R: Serialize>(output: R) -> Result<Value, ExecutionError> {
    serde_json::to_value(output)
        .map_err(|e| ExecutionError::new(format!("failed to serialize result: {}", e)))
}

macro_rules! impl_handlers {
    ($($ty:ident),*) => {
        #[allow(non_snake_case, unused_mut, unused_variables, unused_assignments)]
        impl<F, R, $($ty,)*> SyncHandler<($($ty,)*)> for F
        where
            F: Fn($($ty),*) -> anyhow::Result<R> + Send + Sync + 'static,
            R: Serialize + JsonSchema + 'static,
            $($ty: DeserializeOwned + JsonSchema + 'static,)*
        {
            fn parameter_types() -> Vec<TypeDescriptor> {
                vec![$(TypeDescriptor::of::<$ty>()),*]
            }

            fn return_type() -> TypeDescriptor {
                TypeDescriptor::of::<R>()
            }

            fn call(&self, args: Vec<Value>) -> Result<Value, InvokeError> {
                let mut args = args.into_iter();
                let mut index = 0usize;
                $(
                    let $ty = decode::<$ty>(index, args.next())?;
                    index += 1;
                )*
                let output = (self)($($ty),*)
                    .map_err(|e| InvokeError::Failed(ExecutionError::from(e)))?;
                encode(output).map_err(InvokeError::Failed)
            }
        }

        #[allow(non_snake_case, unused_mut, unused_variables, unused_assignments)]
        impl<F, Fut, R, $($ty,)*> AsyncHandler<($($ty,)*)> for F
        where
            F: Fn($($ty),*) -> Fut + Send + Sync + 'static,
            Fut: Future<Output = anyhow::Result<R>> + Send + 'static,
            R: Serialize + JsonSchema + 'static,
            $($ty: DeserializeOwned + JsonSchema + 'static,)*
        {
            fn parameter_types() -> Vec<TypeDescriptor> {
                vec![$(TypeDescriptor::of::<$ty>()),*]
            }

            fn return_type() -> TypeDescriptor {
                TypeDescriptor::of::<R>()
            }

            fn call(
                &self,
                args: Vec<Value>,
            ) -> Result<BoxFuture<'static, Result<Value, ExecutionError>>, InvokeError> {
                let mut args = args.into_iter();
                let mut index = 0usize;
                $(
                    let $ty = decode::<$ty>(index, args.next())?;
                    index += 1;
                )*
                let future = (self)($($ty),*);
                Ok(Box::pin(async move {
                    let output = future.await.map_err(ExecutionError::from)?;
                    encode(output)
                }))
            }
        }
    };
}

impl_handlers!();
impl_handlers!(A1);
impl_handlers!(A1, A2);
impl_handlers!(A1, A2, A3);
impl_handlers!(A1, A2, A3, A4);
impl_handlers!(A1, A2, A3, A4, A5);
impl_handlers!(A1, A2, A3, A4, A5, A6);
impl_handlers!(A1, A2, A3, A4, A5, A6, A7);
impl_handlers!(A1, A2, A3, A4, A5, A6, A7, A8);

/// Adapter for synchronous handlers; panics become execution errors
pub(crate) struct SyncAdapter<F, Args> {
    handler: F,
    _args: PhantomData<fn() -> Args>,
}

impl<F, Args> SyncAdapter<F, Args> {
    pub(crate) fn new(handler: F) -> Self {
        Self {
            handler,
            _args: PhantomData,
        }
    }
}

impl<F, Args> Invokable for SyncAdapter<F, Args>
where
    F: SyncHandler<Args>,
    Args: 'static,
{
    fn invoke(&self, args: Vec<Value>) -> Result<Outcome, InvokeError> {
        match catch_unwind(AssertUnwindSafe(|| self.handler.call(args))) {
            Ok(Ok(value)) => Ok(Outcome::Ready(Ok(value))),
            Ok(Err(InvokeError::Failed(error))) => Ok(Outcome::Ready(Err(error))),
            Ok(Err(error)) => Err(error),
            Err(panic) => Ok(Outcome::Ready(Err(ExecutionError::from_panic(panic)))),
        }
    }
}

/// Adapter for asynchronous handlers; panics while polling become execution errors
pub(crate) struct AsyncAdapter<F, Args> {
    handler: F,
    _args: PhantomData<fn() -> Args>,
}

impl<F, Args> AsyncAdapter<F, Args> {
    pub(crate) fn new(handler: F) -> Self {
        Self {
            handler,
            _args: PhantomData,
        }
    }
}

impl<F, Args> Invokable for AsyncAdapter<F, Args>
where
    F: AsyncHandler<Args>,
    Args: 'static,
{
    fn invoke(&self, args: Vec<Value>) -> Result<Outcome, InvokeError> {
        match catch_unwind(AssertUnwindSafe(|| self.handler.call(args))) {
            Ok(Ok(future)) => {
                let guarded = AssertUnwindSafe(future).catch_unwind().map(|polled| match polled {
                    Ok(result) => result,
                    Err(panic) => Err(ExecutionError::from_panic(panic)),
                });
                Ok(Outcome::Pending(Box::pin(guarded)))
            }
            Ok(Err(InvokeError::Failed(error))) => Ok(Outcome::Ready(Err(error))),
            Ok(Err(error)) => Err(error),
            Err(panic) => Ok(Outcome::Ready(Err(ExecutionError::from_panic(panic)))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn add(a: i64, b: i64) -> anyhow::Result<i64> {
        Ok(a + b)
    }

    async fn double(x: i64) -> anyhow::Result<i64> {
        Ok(x * 2)
    }

    fn sync_adapter<F: SyncHandler<Args>, Args: 'static>(f: F) -> SyncAdapter<F, Args> {
        SyncAdapter::new(f)
    }

    fn async_adapter<F: AsyncHandler<Args>, Args: 'static>(f: F) -> AsyncAdapter<F, Args> {
        AsyncAdapter::new(f)
    }

    #[test]
    fn test_sync_handler_describes_types() {
        let types = <fn(i64, i64) -> anyhow::Result<i64> as SyncHandler<(i64, i64)>>::parameter_types();
        assert_eq!(types.len(), 2);
        assert_eq!(types[0].json_type(), Some("integer"));
    }

    #[test]
    fn test_sync_adapter_ready() {
        let adapter = sync_adapter(add);
        let outcome = adapter.invoke(vec![json!(2), json!(3)]).unwrap();
        assert!(!outcome.is_pending());
        match outcome {
            Outcome::Ready(result) => assert_eq!(result.unwrap(), json!(5)),
            Outcome::Pending(_) => panic!("sync handler must not be pending"),
        }
    }

    #[test]
    fn test_sync_adapter_bad_argument() {
        let adapter = sync_adapter(add);
        let err = adapter.invoke(vec![json!(1), json!("two")]).unwrap_err();
        match err {
            InvokeError::Argument { index, .. } => assert_eq!(index, 1),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_sync_adapter_catches_panic() {
        let adapter = sync_adapter(|| -> anyhow::Result<()> { panic!("kaboom") });
        match adapter.invoke(vec![]).unwrap() {
            Outcome::Ready(Err(e)) => assert_eq!(e.message(), "kaboom"),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_async_adapter_pending() {
        let adapter = async_adapter(double);
        let outcome = adapter.invoke(vec![json!(21)]).unwrap();
        assert!(outcome.is_pending());
        assert_eq!(outcome.resolve().await.unwrap(), json!(42));
    }

    #[tokio::test]
    async fn test_async_adapter_propagates_error() {
        let adapter = async_adapter(|| async { Err::<(), _>(anyhow::anyhow!("Boom")) });
        let outcome = adapter.invoke(vec![]).unwrap();
        assert_eq!(outcome.resolve().await.unwrap_err().message(), "Boom");
    }
}
