// Relay map cache - one shared topology, per-client rewritten copies

use super::access::AccessUrl;
use super::map::RelayMap;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::debug;

/// Holds the current relay topology shared by every request.
///
/// The shared map is never rewritten; [`RelayMapCache::map_for_client`]
/// hands each caller its own copy.
#[derive(Debug, Default)]
pub struct RelayMapCache {
    current: RwLock<Arc<RelayMap>>,
}

impl RelayMapCache {
    pub fn new(map: RelayMap) -> Self {
        Self {
            current: RwLock::new(Arc::new(map)),
        }
    }

    /// Swap in a new topology.
    pub fn replace(&self, map: RelayMap) {
        debug!(regions = map.regions.len(), "Replacing cached relay map");
        *self.current.write() = Arc::new(map);
    }

    /// The shared, unrewritten map.
    pub fn snapshot(&self) -> Arc<RelayMap> {
        Arc::clone(&self.current.read())
    }

    /// A private copy of the current map rewritten for `access`.
    pub fn map_for_client(&self, access: &AccessUrl) -> RelayMap {
        let shared = self.snapshot();
        shared.rewritten_for(access)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relay::map::{RelayNode, RelayRegion};

    fn embedded_map() -> RelayMap {
        let mut map = RelayMap::new();
        map.insert_region(RelayRegion {
            region_id: 999,
            region_code: "embedded".to_string(),
            region_name: "Embedded Relay".to_string(),
            embedded_relay: true,
            nodes: vec![RelayNode {
                name: "999a".to_string(),
                region_id: 999,
                host_name: "10.0.0.5".to_string(),
                relay_port: 3000,
                stun_port: -1,
                force_http: false,
            }],
        });
        map
    }

    #[test]
    fn test_clients_get_their_own_address() {
        let cache = RelayMapCache::new(embedded_map());
        let a = cache.map_for_client(&AccessUrl::parse("https://a.example").unwrap());
        let b = cache.map_for_client(&AccessUrl::parse("http://b.example:8080").unwrap());

        assert_eq!(a.regions[&999].nodes[0].host_name, "a.example");
        assert_eq!(b.regions[&999].nodes[0].host_name, "b.example");
        assert_eq!(b.regions[&999].nodes[0].relay_port, 8080);
        assert_eq!(*cache.snapshot(), embedded_map());
    }

    #[test]
    fn test_replace() {
        let cache = RelayMapCache::default();
        assert!(!cache.snapshot().has_embedded_relay());
        cache.replace(embedded_map());
        assert!(cache.snapshot().has_embedded_relay());
    }

    #[test]
    fn test_concurrent_clients_never_see_each_other() {
        let cache = Arc::new(RelayMapCache::new(embedded_map()));
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || {
                    let host = format!("client{}.example", i);
                    let access = AccessUrl::from_parts("https", host.clone(), 443);
                    for _ in 0..200 {
                        let map = cache.map_for_client(&access);
                        assert_eq!(map.regions[&999].nodes[0].host_name, host);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(*cache.snapshot(), embedded_map());
    }
}
