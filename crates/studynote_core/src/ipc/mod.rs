//! Request/response boundary between presentation code and the service.
//!
//! # Responsibility
//! - Define channel names, frame shapes and the error codes on the wire.
//! - Run the service behind a worker thread and expose a typed async client.
//!
//! # Invariants
//! - Payload keys are camelCase; returned rows keep their stored snake_case.
//! - Failures cross the boundary as typed codes, never as free text only.

pub mod channel;
pub mod client;
pub mod dispatch;
pub mod host;
pub mod payload;
pub mod wire;

pub use channel::Channel;
pub use client::{ClientError, ClientResult, ServiceClient};
pub use dispatch::Dispatcher;
pub use host::{HostError, HostHandle, ServiceHost};
pub use wire::{ErrorCode, RequestFrame, ResponseFrame, WireError};
