// Integration tests for per-client relay map rewriting

use agentlink_core::{AccessUrl, ControlPlane, ControlPlaneConfig, RelayMap};

const RELAY_MAP_JSON: &str = r#"{
  "regions": {
    "1": {
      "region_id": 1,
      "region_code": "embedded",
      "region_name": "Embedded Relay",
      "embedded_relay": true,
      "nodes": [{"name": "1a", "region_id": 1, "host_name": "bananas.org", "relay_port": 1}]
    },
    "2": {
      "region_id": 2,
      "region_code": "fra",
      "region_name": "Frankfurt",
      "nodes": [
        {"name": "2a", "region_id": 2, "host_name": "fra1.relay.example", "relay_port": 443, "stun_port": 3478},
        {"name": "2b", "region_id": 2, "host_name": "fra2.relay.example", "relay_port": 443, "stun_port": 3478}
      ]
    }
  }
}"#;

fn relay_map() -> RelayMap {
    serde_json::from_str(RELAY_MAP_JSON).expect("relay map fixture parses")
}

#[test]
fn test_rewrite_embedded_relay_to_access_url() {
    let mut map = relay_map();
    let access = AccessUrl::parse("https://coconuts.org:44558").unwrap();
    map.rewrite_for_client(&access);

    let region = &map.regions[&1];
    assert!(region.embedded_relay);
    assert_eq!(region.nodes.len(), 1);
    assert_eq!(region.nodes[0].host_name, "coconuts.org");
    assert_eq!(region.nodes[0].relay_port, 44558);

    // Independent relays are untouched, node order included.
    assert_eq!(map.regions[&2], relay_map().regions[&2]);

    let mut again = map.clone();
    again.rewrite_for_client(&access);
    assert_eq!(again, map);
}

#[test]
fn test_served_maps_differ_per_client() {
    let plane = ControlPlane::from_config(&ControlPlaneConfig::default()).unwrap();
    plane.relays().replace(relay_map());

    let a = plane.relay_map_for(&AccessUrl::parse("https://a.example.com").unwrap());
    let b = plane.relay_map_for(&AccessUrl::parse("http://10.1.2.3:7080").unwrap());

    assert_eq!(a.regions[&1].nodes[0].host_name, "a.example.com");
    assert_eq!(a.regions[&1].nodes[0].relay_port, 443);
    assert!(!a.regions[&1].nodes[0].force_http);

    assert_eq!(b.regions[&1].nodes[0].host_name, "10.1.2.3");
    assert_eq!(b.regions[&1].nodes[0].relay_port, 7080);
    assert!(b.regions[&1].nodes[0].force_http);

    assert_eq!(*plane.relays().snapshot(), relay_map());
}

#[test]
fn test_rewritten_map_serializes_for_client() {
    let map = relay_map().rewritten_for(&AccessUrl::parse("https://coconuts.org:44558").unwrap());
    let json = serde_json::to_value(&map).unwrap();
    assert_eq!(json["regions"]["1"]["nodes"][0]["host_name"], "coconuts.org");
    assert_eq!(json["regions"]["1"]["nodes"][0]["relay_port"], 44558);
    assert_eq!(json["regions"]["2"]["nodes"][1]["host_name"], "fra2.relay.example");
}
