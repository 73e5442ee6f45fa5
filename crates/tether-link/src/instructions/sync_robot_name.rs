//! `sync_robot_name`: update the persisted robot name.

use std::sync::Arc;

use serde::Deserialize;
use tracing::{error, info};

use tether_ident::IdentityStore;

use crate::action::one_shot;
use crate::instructions::InstructionHandler;

pub const SYNC_ROBOT_NAME: &str = "sync_robot_name";

#[derive(Debug, Deserialize)]
pub struct SyncRobotNameRequest {
    pub robot_name: String,
}

/// Build the handler. The store is captured so the action can rewrite the
/// identity record.
pub fn handler(store: Arc<IdentityStore>) -> InstructionHandler {
    InstructionHandler {
        name: SYNC_ROBOT_NAME,
        action: one_shot(move |request: SyncRobotNameRequest| {
            info!(name = %request.robot_name, "syncing robot name");
            if let Err(e) = store.set_name(&request.robot_name) {
                error!(error = %e, "failed to update robot name");
            }
        }),
    }
}
