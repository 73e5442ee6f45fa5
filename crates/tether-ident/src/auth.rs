//! The authenticate operation: resolve the robot identity, persist it, and
//! sync it back to the control plane.
//!
//! Resolution order:
//!
//! 1. the record persisted in the [`IdentityStore`]
//! 2. `GET /ident/retrieve` for this username + MAC
//! 3. `POST /ident/whoami` when retrieve fails or returns a nil UUID
//!
//! Whatever was resolved is saved and then pushed via `POST /ident/sync`.
//! Any failure aborts the whole attempt; the supervisor retries with
//! back-off indefinitely.

use tracing::{info, warn};
use uuid::Uuid;

use crate::client::IdentClient;
use crate::error::IdentError;
use crate::net;
use crate::record::IdentityRecord;
use crate::store::IdentityStore;

/// Resolve, persist, and sync the robot identity. Returns the UUID the
/// WebSocket channel is addressed by.
pub async fn authenticate(
    store: &IdentityStore,
    client: &IdentClient,
) -> Result<Uuid, IdentError> {
    let record = match store.load() {
        Ok(record) => record,
        // Any load failure means first run (or a wiped store): probe the
        // host and ask the control plane.
        Err(_) => {
            let username = net::current_username()?;
            let mac = net::local_mac_address()?;
            info!(username, mac, "acquiring identity from control plane");
            resolve_remote(client, &username, &mac).await?
        }
    };

    store.save(&record)?;

    let synced = client.sync(&record).await?;
    if !synced.success {
        warn!(uuid = %record.uuid, "control plane rejected identity sync");
    }

    Ok(record.uuid)
}

async fn resolve_remote(
    client: &IdentClient,
    username: &str,
    mac: &str,
) -> Result<IdentityRecord, IdentError> {
    match client.retrieve(username, mac).await {
        Ok(resp) if !resp.uuid.is_nil() => Ok(IdentityRecord {
            mac: resp.mac,
            name: resp.name,
            uuid: resp.uuid,
            robot_id: resp.robot_id,
        }),
        outcome => {
            if let Err(e) = outcome {
                warn!(error = %e, "identity retrieve failed, falling back to whoami");
            }
            let whoami = client.whoami(username, mac).await?;
            Ok(IdentityRecord {
                mac: mac.to_owned(),
                name: whoami.robot_name,
                uuid: whoami.robot_uuid,
                robot_id: (!whoami.robot_id.is_empty()).then_some(whoami.robot_id),
            })
        }
    }
}
