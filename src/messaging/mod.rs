pub mod dispatcher;
pub mod event;

pub use dispatcher::MessageDispatcher;
pub use event::{InboundEvent, OutboundEvent};
