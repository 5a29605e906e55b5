// Reinitialization events pushed from the server to an agent

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Why an agent is being asked to reinitialize.
///
/// Decoding rejects any value not listed here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReinitializeReason {
    /// A prebuilt workspace was claimed by a user.
    #[serde(rename = "prebuild_claimed")]
    PrebuildClaimed,
}

impl ReinitializeReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReinitializeReason::PrebuildClaimed => "prebuild_claimed",
        }
    }
}

impl fmt::Display for ReinitializeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tells the agent serving `workspace_id` to reinitialize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReinitializationEvent {
    pub workspace_id: Uuid,
    pub reason: ReinitializeReason,
}

impl ReinitializationEvent {
    pub fn new(workspace_id: Uuid, reason: ReinitializeReason) -> Self {
        Self {
            workspace_id,
            reason,
        }
    }

    pub fn prebuild_claimed(workspace_id: Uuid) -> Self {
        Self::new(workspace_id, ReinitializeReason::PrebuildClaimed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_shape() {
        let id = Uuid::parse_str("8d3a6c39-3c52-4d1e-9f0a-0b1d2e3f4a5b").unwrap();
        let json = serde_json::to_string(&ReinitializationEvent::prebuild_claimed(id)).unwrap();
        assert_eq!(
            json,
            r#"{"workspace_id":"8d3a6c39-3c52-4d1e-9f0a-0b1d2e3f4a5b","reason":"prebuild_claimed"}"#
        );
    }

    #[test]
    fn test_unknown_reason_rejected() {
        let json = r#"{"workspace_id":"8d3a6c39-3c52-4d1e-9f0a-0b1d2e3f4a5b","reason":"moon_phase"}"#;
        assert!(serde_json::from_str::<ReinitializationEvent>(json).is_err());
    }

    #[test]
    fn test_bad_workspace_id_rejected() {
        let json = r#"{"workspace_id":"not-a-uuid","reason":"prebuild_claimed"}"#;
        assert!(serde_json::from_str::<ReinitializationEvent>(json).is_err());
    }
}
