//! The channel boundary between the main process and the renderer.
//!
//! # Structure
//!
//! - `channel` - Closed list of request/response channels
//! - `response` - Structured `{ok, data}` / `{ok, code, message}` results
//! - `events` - One-way main → renderer events and the event bus
//! - `router` - Main-side dispatch to the managers
//! - `transport` - Messaging primitive behind the facade
//! - `facade` - The typed renderer-side `Bridge`

pub mod channel;
pub mod events;
pub mod facade;
pub mod response;
pub mod router;
pub mod transport;

pub use channel::Channel;
pub use events::{Event, EventBus, EventKind};
pub use facade::{Bridge, Subscription};
pub use response::{IpcError, Response};
pub use router::{Collaborators, IpcRouter};
pub use transport::{LocalTransport, Transport};
