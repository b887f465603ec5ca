use super::InboundEvent;
use serde_json::Value;
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, RwLock};

type Handler = Arc<dyn Fn(&Value) + Send + Sync + 'static>;

/// Routes inbound channel messages to registered handlers by their `type`
/// discriminator.
///
/// The dispatcher is deliberately forgiving: unparseable text and unknown
/// types are logged and dropped, and a panicking handler never prevents the
/// remaining handlers from running. Nothing here can affect connection state.
pub struct MessageDispatcher {
    handlers: RwLock<HashMap<InboundEvent, Vec<Handler>>>,
}

impl MessageDispatcher {
    pub fn new() -> Self {
        Self {
            handlers: RwLock::new(HashMap::new()),
        }
    }

    /// Registers a handler for an event type.
    ///
    /// Handlers for the same event run in registration order and receive the
    /// full decoded message object. Handlers are never removed automatically.
    pub fn on<F>(&self, event: InboundEvent, handler: F)
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        let mut handlers = self.handlers.write().unwrap_or_else(|e| e.into_inner());
        handlers.entry(event).or_default().push(Arc::new(handler));
    }

    /// Decodes raw channel text and dispatches it.
    ///
    /// Parse failures and messages without a string `type` field are dropped
    /// with a log line; inbound traffic is push-only, so there is nothing to
    /// retry.
    pub fn dispatch_text(&self, raw: &str) {
        let message: Value = match serde_json::from_str(raw) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Dropping unparseable inbound message: {} - Raw: {}", e, raw);
                return;
            }
        };

        let Some(kind) = message.get("type").and_then(Value::as_str) else {
            tracing::warn!("Dropping inbound message without a 'type' field: {}", raw);
            return;
        };

        self.dispatch(InboundEvent::from_str(kind), &message);
    }

    /// Invokes all handlers registered for `event` with the decoded message.
    pub fn dispatch(&self, event: InboundEvent, message: &Value) {
        if let InboundEvent::Unknown(ref kind) = event {
            tracing::debug!("Ignoring inbound message with unknown type: {}", kind);
            return;
        }

        let handlers = {
            let registry = self.handlers.read().unwrap_or_else(|e| e.into_inner());
            match registry.get(&event) {
                Some(list) => list.clone(),
                None => {
                    tracing::debug!("No handlers registered for event: {}", event);
                    return;
                }
            }
        };

        for handler in handlers {
            // Isolate each handler so one panic cannot starve the rest
            if let Err(panic) = catch_unwind(AssertUnwindSafe(|| handler(message))) {
                tracing::error!(
                    "Handler for event '{}' panicked: {}",
                    event,
                    panic_message(panic.as_ref())
                );
            }
        }
    }
}

impl Default for MessageDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s
    } else {
        "<non-string panic payload>"
    }
}
