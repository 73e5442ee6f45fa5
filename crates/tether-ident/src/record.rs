//! The persisted identity record.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity of this robot as agreed with the control plane.
///
/// Persisted as a single JSON document at `<storage.dir>/robot_id`. Created
/// on the first successful identity handshake, updated when the name changes,
/// never deleted by the bot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityRecord {
    /// Hardware address used when the identity was acquired.
    pub mac: String,
    /// Human-readable robot name.
    pub name: String,
    /// The UUID the control plane addresses this robot by.
    pub uuid: Uuid,
    /// Control-plane database ID, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub robot_id: Option<String>,
}
