//! Host probing: MAC address and username.

use sysinfo::{MacAddr, Networks};

use crate::error::IdentError;

/// First non-loopback interface with a hardware address, formatted as
/// `aa:bb:cc:dd:ee:ff`. Interfaces are scanned in name order so the result
/// is stable across calls.
pub fn local_mac_address() -> Result<String, IdentError> {
    let networks = Networks::new_with_refreshed_list();
    let mut interfaces: Vec<_> = networks.iter().collect();
    interfaces.sort_by(|a, b| a.0.cmp(b.0));

    for (name, data) in interfaces {
        if is_loopback(name) {
            continue;
        }
        let mac = data.mac_address();
        if mac != MacAddr::UNSPECIFIED {
            return Ok(mac.to_string());
        }
    }
    Err(IdentError::NoMacAddress)
}

/// The OS username of the process owner.
pub fn current_username() -> Result<String, IdentError> {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .map_err(|_| IdentError::NoUsername)
}

fn is_loopback(name: &str) -> bool {
    name == "lo" || name == "lo0"
}
