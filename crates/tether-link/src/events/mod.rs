//! Event emitters: sessions that produce `type: "event"` frames on their
//! own schedule instead of answering requests.

pub mod heartbeat;

use std::collections::HashMap;

use crate::action::SessionAction;

/// A named event emitter.
pub struct EventEmitter {
    pub name: &'static str,
    pub action: SessionAction,
}

/// Emitters spawned automatically at the start of every connection epoch.
pub const AUTO_START: &[&str] = &[heartbeat::HEARTBEAT_EVENT];

/// All known emitters, keyed by event name.
pub fn event_emitters() -> HashMap<&'static str, EventEmitter> {
    [EventEmitter {
        name: heartbeat::HEARTBEAT_EVENT,
        action: heartbeat::emitter(),
    }]
    .into_iter()
    .map(|emitter| (emitter.name, emitter))
    .collect()
}
