//! `sync_robot_id`: acknowledge a control-plane ID assignment.

use serde::Deserialize;
use tracing::info;

use crate::action::one_shot;
use crate::instructions::InstructionHandler;

pub const SYNC_ROBOT_ID: &str = "sync_robot_id";

#[derive(Debug, Deserialize)]
pub struct SyncRobotIdRequest {
    pub robot_id: String,
}

/// Build the handler. The ID is only logged for now; the persisted record
/// keeps whatever the identity handshake produced.
pub fn handler() -> InstructionHandler {
    InstructionHandler {
        name: SYNC_ROBOT_ID,
        action: one_shot(|request: SyncRobotIdRequest| {
            info!(robot_id = %request.robot_id, "received robot id sync");
        }),
    }
}
