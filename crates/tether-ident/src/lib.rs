//! # tether-ident
//!
//! Identity acquisition for the tether agent:
//!
//! - [`IdentityStore`]: the persisted `robot_id` record on disk
//! - [`IdentClient`]: the `/ident/*` HTTP control-plane endpoints
//! - [`authenticate`]: the storage → retrieve → whoami fallback chain
//! - [`net`]: MAC address and username probing

#![deny(unsafe_code)]

pub mod auth;
pub mod client;
pub mod error;
pub mod net;
pub mod record;
pub mod store;

pub use auth::authenticate;
pub use client::IdentClient;
pub use error::IdentError;
pub use record::IdentityRecord;
pub use store::IdentityStore;
