//! # tether-link
//!
//! The core of the tether agent: everything between the WebSocket and the
//! handler functions.
//!
//! - [`transport`]: the duplex JSON frame adapter over `tokio-tungstenite`
//! - [`event_loop`]: the send/receive pumps and their bounded queues
//! - [`hub`]: the session registry and task spawner
//! - [`dispatch`]: inbound frame routing
//! - [`action`]: the session action framework (one-shot, request-response)
//! - [`events`] / [`instructions`] / [`registry`]: the named handler tables
//! - [`supervisor`]: the authenticate → dial → serve reconnect loop

#![deny(unsafe_code)]

pub mod action;
pub mod dispatch;
pub mod error;
pub mod event_loop;
pub mod events;
pub mod hub;
pub mod instructions;
pub mod registry;
pub mod supervisor;
pub mod transport;

pub use action::{SessionAction, SessionCtx};
pub use error::TransportError;
pub use hub::SessionHub;
pub use registry::Registries;
pub use supervisor::Supervisor;
