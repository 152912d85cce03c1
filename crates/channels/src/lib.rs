//! Boundary to the chat runtime.
//!
//! Defines the events the runtime delivers, the transport used to post and
//! clean up messages, and the dispatcher that fans events out to attached
//! listeners and to anyone awaiting a matching event.

pub mod delivery;
pub mod dispatch;
pub mod error;
pub mod event;
pub mod listener;
pub mod memory;
pub mod transport;

pub use {
    dispatch::{DispatchLoop, EventDispatcher, EventSubscription},
    error::{Error, Result},
    event::{BotEvent, EventKind, MessageEvent, ReactionEvent},
    listener::{EventListener, ListenerId},
    memory::{MemoryTransport, TransportOp},
    transport::{ChatTransport, ConnectionStatus},
};
