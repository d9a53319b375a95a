//! World configuration.

use serde::{Deserialize, Serialize};
use world_types::Address;

use crate::registry::CollisionPolicy;

/// Default bound on nested `execute` calls.
pub const DEFAULT_MAX_CALL_DEPTH: usize = 64;

/// Configuration for a world instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Human-readable world name, reported in the spawn notification.
    pub name: String,
    /// The world's own address, reported in the spawn notification.
    pub address: Address,
    /// The first value `uuid()` returns.
    pub first_id: u64,
    /// What happens when a name is registered twice.
    pub collision_policy: CollisionPolicy,
    /// Maximum nesting of `execute` calls.
    pub max_call_depth: usize,
}

impl WorldConfig {
    /// Create a config with the given name and defaults for everything else.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Override the world address.
    #[must_use]
    pub fn with_address(mut self, address: Address) -> Self {
        self.address = address;
        self
    }

    /// Override the name collision policy.
    #[must_use]
    pub fn with_collision_policy(mut self, policy: CollisionPolicy) -> Self {
        self.collision_policy = policy;
        self
    }

    /// Override the call depth limit.
    #[must_use]
    pub fn with_max_call_depth(mut self, depth: usize) -> Self {
        self.max_call_depth = depth;
        self
    }

    /// Override the first identifier handed out by `uuid()`.
    #[must_use]
    pub fn with_first_id(mut self, first_id: u64) -> Self {
        self.first_id = first_id;
        self
    }
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            name: "world".to_string(),
            address: Address::ZERO,
            first_id: 0,
            collision_policy: CollisionPolicy::Upgrade,
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: WorldConfig =
            serde_json::from_str(r#"{ "name": "arena", "collision_policy": "reject" }"#).unwrap();
        assert_eq!(config.name, "arena");
        assert_eq!(config.collision_policy, CollisionPolicy::Reject);
        assert_eq!(config.max_call_depth, DEFAULT_MAX_CALL_DEPTH);
        assert_eq!(config.first_id, 0);
    }

    #[test]
    fn test_builders() {
        let config = WorldConfig::new("arena")
            .with_address(Address(9))
            .with_max_call_depth(4)
            .with_first_id(100);
        assert_eq!(config.address, Address(9));
        assert_eq!(config.max_call_depth, 4);
        assert_eq!(config.first_id, 100);
    }
}
