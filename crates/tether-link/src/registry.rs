//! Handler registries, built once at process start and immutable after.

use std::collections::HashMap;
use std::sync::Arc;

use tether_ident::IdentityStore;

use crate::events::{self, EventEmitter};
use crate::instructions::{self, InstructionHandler};

/// The named instruction handlers and event emitters, plus the auto-start
/// list the supervisor seeds at the beginning of every epoch.
pub struct Registries {
    instructions: HashMap<&'static str, InstructionHandler>,
    emitters: HashMap<&'static str, EventEmitter>,
    auto_start: &'static [&'static str],
}

impl Registries {
    /// Build the registries. The identity store backs the handlers that
    /// rewrite the persisted record.
    pub fn new(store: Arc<IdentityStore>) -> Self {
        Self {
            instructions: instructions::instruction_handlers(store),
            emitters: events::event_emitters(),
            auto_start: events::AUTO_START,
        }
    }

    /// Look up an instruction handler by name.
    pub fn instruction(&self, name: &str) -> Option<&InstructionHandler> {
        self.instructions.get(name)
    }

    /// Look up an event emitter by name.
    pub fn emitter(&self, name: &str) -> Option<&EventEmitter> {
        self.emitters.get(name)
    }

    /// Emitters to spawn at epoch start, in declaration order.
    pub fn auto_start(&self) -> impl Iterator<Item = &EventEmitter> {
        self.auto_start
            .iter()
            .filter_map(|name| self.emitters.get(name))
    }
}
