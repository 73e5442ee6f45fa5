//! Instruction handlers: named actions the control plane can invoke.
//!
//! The inbound routing for instructions is reserved (see the dispatcher);
//! the registry itself is live and its handlers are fully functional.

pub mod fetch_network;
pub mod sync_robot_id;
pub mod sync_robot_name;

use std::collections::HashMap;
use std::sync::Arc;

use tether_ident::IdentityStore;

use crate::action::SessionAction;

/// A named instruction handler.
pub struct InstructionHandler {
    pub name: &'static str,
    pub action: SessionAction,
}

/// All known instruction handlers, keyed by instruction name.
pub fn instruction_handlers(
    store: Arc<IdentityStore>,
) -> HashMap<&'static str, InstructionHandler> {
    [
        sync_robot_name::handler(store),
        sync_robot_id::handler(),
        fetch_network::handler(),
    ]
    .into_iter()
    .map(|handler| (handler.name, handler))
    .collect()
}
