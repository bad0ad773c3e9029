use super::error::EndpointError;
use super::exchange::Exchange;
use super::handler::respond_with_error;
use futures::future::BoxFuture;
use std::sync::Arc;
use tracing::{debug, warn};

/// Result future returned by asynchronous delegate methods.
pub type AsyncResult<T> = BoxFuture<'static, anyhow::Result<T>>;

/// Drives asynchronous completions to the end.
pub trait AsyncRegistry: Send + Sync {
    fn spawn(&self, task: BoxFuture<'static, ()>);
}

/// Spawns completions on a tokio runtime.
#[derive(Debug, Clone)]
pub struct TokioAsyncRegistry {
    handle: tokio::runtime::Handle,
}

impl TokioAsyncRegistry {
    #[must_use]
    pub fn new(handle: tokio::runtime::Handle) -> Self {
        TokioAsyncRegistry { handle }
    }

    /// Registry on the runtime the caller is running in, if any
    #[must_use]
    pub fn current() -> Option<Self> {
        tokio::runtime::Handle::try_current().ok().map(Self::new)
    }
}

impl AsyncRegistry for TokioAsyncRegistry {
    fn spawn(&self, task: BoxFuture<'static, ()>) {
        // Detached; the task answers the exchange itself
        drop(self.handle.spawn(task));
    }
}

/// Drives each completion on its own thread with a blocking executor.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadAsyncRegistry;

impl AsyncRegistry for ThreadAsyncRegistry {
    fn spawn(&self, task: BoxFuture<'static, ()>) {
        let spawned = std::thread::Builder::new()
            .name("endpointgen-async".to_string())
            .spawn(move || futures::executor::block_on(task));
        if let Err(err) = spawned {
            warn!(error = %err, "Failed to spawn async completion thread");
        }
    }
}

struct RuntimeInner {
    registry: Arc<dyn AsyncRegistry>,
}

/// Shared handle passed to every dispatch unit at construction.
#[derive(Clone)]
pub struct Runtime {
    inner: Arc<RuntimeInner>,
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime").finish_non_exhaustive()
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

impl Runtime {
    /// Runtime using the current tokio runtime, or completion threads outside one.
    #[must_use]
    pub fn new() -> Self {
        Self::builder().build()
    }

    #[must_use]
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::default()
    }

    /// Complete `exchange` once `future` resolves.
    ///
    /// `writer` receives the value and writes the response. An `Err` from the
    /// future or the writer is answered with an error response, so the
    /// exchange is never left without one.
    pub fn register_async<T, W>(&self, future: AsyncResult<T>, exchange: Exchange, writer: W)
    where
        T: Send + 'static,
        W: FnOnce(T, &Exchange) -> Result<(), EndpointError> + Send + 'static,
    {
        debug!(request_id = %exchange.request_id(), "Async result registered");
        let task = async move {
            let outcome = match future.await {
                Ok(value) => writer(value, &exchange),
                Err(err) => Err(EndpointError::AsyncCompletion(err)),
            };
            if let Err(err) = outcome {
                respond_with_error(&exchange, &err);
            }
        };
        self.inner.registry.spawn(Box::pin(task));
    }
}

/// Builder for [`Runtime`].
#[derive(Default)]
pub struct RuntimeBuilder {
    registry: Option<Arc<dyn AsyncRegistry>>,
}

impl RuntimeBuilder {
    #[must_use]
    pub fn async_registry(mut self, registry: impl AsyncRegistry + 'static) -> Self {
        self.registry = Some(Arc::new(registry));
        self
    }

    #[must_use]
    pub fn tokio_handle(self, handle: tokio::runtime::Handle) -> Self {
        self.async_registry(TokioAsyncRegistry::new(handle))
    }

    #[must_use]
    pub fn build(self) -> Runtime {
        let registry = self.registry.unwrap_or_else(|| match TokioAsyncRegistry::current() {
            Some(tokio) => Arc::new(tokio),
            None => Arc::new(ThreadAsyncRegistry),
        });
        Runtime {
            inner: Arc::new(RuntimeInner { registry }),
        }
    }
}
