// Relay map - NAT-traversal relay topology served to clients
//
// Embedded relays run inside the coordinating server and listen on whatever
// address the server binds internally. A client can only reach them at the
// address it used to reach the server, so each client gets a copy of the
// map with embedded nodes pointed at its own access URL.

use super::access::AccessUrl;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One relay server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayNode {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub region_id: i32,
    pub host_name: String,
    pub relay_port: u16,
    /// 0 means the default STUN port; negative disables STUN.
    #[serde(default)]
    pub stun_port: i32,
    /// Dial over plain HTTP instead of TLS.
    #[serde(default)]
    pub force_http: bool,
}

/// A group of relay nodes that serve the same region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayRegion {
    pub region_id: i32,
    #[serde(default)]
    pub region_code: String,
    #[serde(default)]
    pub region_name: String,
    /// Set for the relay built into the coordinating server.
    #[serde(default)]
    pub embedded_relay: bool,
    pub nodes: Vec<RelayNode>,
}

/// The full relay topology.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayMap {
    pub regions: BTreeMap<i32, RelayRegion>,
}

impl RelayMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_region(&mut self, region: RelayRegion) {
        self.regions.insert(region.region_id, region);
    }

    pub fn has_embedded_relay(&self) -> bool {
        self.regions.values().any(|r| r.embedded_relay)
    }

    /// Point every node of every embedded region at `access`.
    ///
    /// Mutates in place: the caller must own this map exclusively. Never
    /// call it on a map shared with other requests; use
    /// [`RelayMap::rewritten_for`] or [`RelayMapCache`](super::RelayMapCache)
    /// to get a private copy first. Non-embedded regions are left untouched.
    pub fn rewrite_for_client(&mut self, access: &AccessUrl) {
        for region in self.regions.values_mut().filter(|r| r.embedded_relay) {
            // Every node of an embedded region is assumed to be the server itself.
            for node in &mut region.nodes {
                node.host_name = access.host().to_string();
                node.relay_port = access.port();
                node.force_http = access.force_http();
            }
        }
    }

    /// Copy of this map rewritten for `access`.
    pub fn rewritten_for(&self, access: &AccessUrl) -> RelayMap {
        let mut copy = self.clone();
        copy.rewrite_for_client(access);
        copy
    }
}
