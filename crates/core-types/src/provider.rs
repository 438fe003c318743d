use crate::{BoxError, GeneratorError, Value};
use futures::future::{self, BoxFuture};
use std::future::Future;

/// Produces one value for a field each time a row is generated.
///
/// Implementations may resolve immediately or defer to an asynchronous
/// computation (for example a lookup against a table populated earlier).
/// The returned future is joined with every other field of the table before
/// the INSERT is assembled, so completion order does not matter.
pub trait ValueProvider: Send + Sync {
    fn provide(&self) -> BoxFuture<'_, Result<Value, GeneratorError>>;
}

/// A provider backed by an infallible synchronous closure.
pub struct Immediate<F>(F);

/// A provider backed by a fallible synchronous closure.
pub struct TryImmediate<F>(F);

/// A provider backed by a closure returning a future.
pub struct Deferred<F>(F);

pub fn immediate<F, V>(f: F) -> Immediate<F>
where
    F: Fn() -> V + Send + Sync,
    V: Into<Value>,
{
    Immediate(f)
}

pub fn try_immediate<F, V, E>(f: F) -> TryImmediate<F>
where
    F: Fn() -> Result<V, E> + Send + Sync,
    V: Into<Value>,
    E: Into<BoxError>,
{
    TryImmediate(f)
}

pub fn deferred<F, Fut, V, E>(f: F) -> Deferred<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<V, E>> + Send + 'static,
    V: Into<Value>,
    E: Into<BoxError>,
{
    Deferred(f)
}

impl<F, V> ValueProvider for Immediate<F>
where
    F: Fn() -> V + Send + Sync,
    V: Into<Value>,
{
    fn provide(&self) -> BoxFuture<'_, Result<Value, GeneratorError>> {
        let value = (self.0)().into();
        Box::pin(future::ready(Ok(value)))
    }
}

impl<F, V, E> ValueProvider for TryImmediate<F>
where
    F: Fn() -> Result<V, E> + Send + Sync,
    V: Into<Value>,
    E: Into<BoxError>,
{
    fn provide(&self) -> BoxFuture<'_, Result<Value, GeneratorError>> {
        let result = (self.0)()
            .map(Into::into)
            .map_err(|e| GeneratorError::from(e.into()));
        Box::pin(future::ready(result))
    }
}

impl<F, Fut, V, E> ValueProvider for Deferred<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<V, E>> + Send + 'static,
    V: Into<Value>,
    E: Into<BoxError>,
{
    fn provide(&self) -> BoxFuture<'_, Result<Value, GeneratorError>> {
        let pending = (self.0)();
        Box::pin(async move {
            pending
                .await
                .map(Into::into)
                .map_err(|e| GeneratorError::from(e.into()))
        })
    }
}

/// A constant value is its own provider.
impl ValueProvider for Value {
    fn provide(&self) -> BoxFuture<'_, Result<Value, GeneratorError>> {
        Box::pin(future::ready(Ok(self.clone())))
    }
}
