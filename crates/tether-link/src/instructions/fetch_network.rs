//! `fetch_network`: report this host's network interfaces.

use serde::{Deserialize, Serialize};
use sysinfo::Networks;
use tracing::info;

use crate::action::request_response;
use crate::instructions::InstructionHandler;

pub const FETCH_NETWORK: &str = "fetch_network";

#[derive(Debug, Default, Deserialize)]
pub struct FetchNetworkRequest {}

/// One network interface in the response.
#[derive(Debug, Serialize)]
pub struct NetworkInfo {
    pub index: usize,
    pub name: String,
    pub mtu: u64,
    pub hardware_addr: String,
    pub addrs: Vec<Addr>,
}

#[derive(Debug, Serialize)]
pub struct Addr {
    pub addr: String,
}

/// Build the handler.
pub fn handler() -> InstructionHandler {
    InstructionHandler {
        name: FETCH_NETWORK,
        action: request_response(|_: FetchNetworkRequest| {
            info!("fetching network interfaces");
            network_interfaces()
        }),
    }
}

/// Enumerate interfaces in name order so responses are stable.
fn network_interfaces() -> Vec<NetworkInfo> {
    let networks = Networks::new_with_refreshed_list();
    let mut interfaces: Vec<_> = networks.iter().collect();
    interfaces.sort_by(|a, b| a.0.cmp(b.0));

    interfaces
        .into_iter()
        .enumerate()
        .map(|(index, (name, data))| NetworkInfo {
            index,
            name: name.clone(),
            mtu: data.mtu(),
            hardware_addr: data.mac_address().to_string(),
            addrs: data
                .ip_networks()
                .iter()
                .map(|ip| Addr {
                    addr: ip.to_string(),
                })
                .collect(),
        })
        .collect()
}
