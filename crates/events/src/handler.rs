use std::future::Future;
use std::marker::PhantomData;

use async_trait::async_trait;

use crate::Event;

/// Outcome of one handler invocation.
///
/// Handlers log their own failures; the error is returned only so the bus can
/// count and report it. It never reaches the publisher.
pub type HandlerResult = anyhow::Result<()>;

/// Reaction to a published event (an "agent").
///
/// Contract for implementors:
/// - treat the payload as untrusted; decode it through the typed contracts in
///   [`crate::payload`] and default missing optional keys
/// - do not panic on bad input (the bus survives it, but the log is noisier)
/// - may publish follow-up events on a shared bus
#[async_trait]
pub trait EventHandler: Send + Sync + 'static {
    /// Name used in logs when this handler fails.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    async fn handle(&self, event: &Event) -> HandlerResult;
}

/// Adapter turning an async closure into an [`EventHandler`].
pub struct FnHandler<F, Fut> {
    name: String,
    f: F,
    _fut: PhantomData<fn() -> Fut>,
}

/// Wrap an async closure as a named handler.
///
/// ```ignore
/// bus.subscribe("order_created", handler_fn("audit", |event| async move {
///     tracing::info!(store = %event.store_id(), "order seen");
///     Ok(())
/// }));
/// ```
pub fn handler_fn<F, Fut>(name: impl Into<String>, f: F) -> FnHandler<F, Fut>
where
    F: Fn(Event) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    FnHandler {
        name: name.into(),
        f,
        _fut: PhantomData,
    }
}

#[async_trait]
impl<F, Fut> EventHandler for FnHandler<F, Fut>
where
    F: Fn(Event) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn handle(&self, event: &Event) -> HandlerResult {
        (self.f)(event.clone()).await
    }
}
