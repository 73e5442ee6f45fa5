//! # tether-core
//!
//! Shared vocabulary for the tether agent: the wire message envelope, the
//! session identifier type, and the bot configuration file.

#![deny(unsafe_code)]

pub mod config;
pub mod ids;
pub mod message;

pub use config::BotConfig;
pub use ids::SessionId;
pub use message::{
    EventBody, InboundMessage, InboundPayload, InstructionBody, OutboundMessage, OutboundPayload,
    PayloadKind, RawContent,
};
