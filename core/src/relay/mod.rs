//! Relay discovery
//!
//! The relay map tells clients where NAT-traversal relays live. Maps are
//! cached once and rewritten per client so the embedded relay is reachable
//! at the address each client actually uses.

pub mod access;
pub mod cache;
pub mod map;

pub use access::{AccessUrl, AccessUrlError};
pub use cache::RelayMapCache;
pub use map::{RelayMap, RelayNode, RelayRegion};
