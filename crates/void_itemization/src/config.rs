//! Store configuration

use crate::error::{ItemizationError, Result};
use serde::{Deserialize, Serialize};

/// Which side of a client/server split a store lives on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetRole {
    /// May mutate entries directly
    #[default]
    Authority,
    /// Mirrors an authority through replicated snapshots
    Replica,
}

/// Itemization configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemizationConfig {
    /// Mutation authority of the store
    pub role: NetRole,
    /// Panic instead of logging when a replica is asked to mutate
    pub strict_authority: bool,
    /// Max stack size before policies run (0 = unlimited)
    pub default_max_stack_size: u32,
    /// Slot size before policies run
    pub default_slot_size: u32,
    /// Record a diagnostic when clear-all discards pending adds
    pub report_discarded_adds: bool,
}

impl Default for ItemizationConfig {
    fn default() -> Self {
        Self {
            role: NetRole::Authority,
            strict_authority: false,
            default_max_stack_size: 1,
            default_slot_size: 1,
            report_discarded_adds: true,
        }
    }
}

impl ItemizationConfig {
    /// Configuration for a replica store
    pub fn replica() -> Self {
        Self {
            role: NetRole::Replica,
            ..Self::default()
        }
    }

    /// Set role
    pub fn with_role(mut self, role: NetRole) -> Self {
        self.role = role;
        self
    }

    /// Enable or disable strict authority checks
    pub fn with_strict_authority(mut self, strict: bool) -> Self {
        self.strict_authority = strict;
        self
    }

    /// Set default max stack size
    pub fn with_default_max_stack_size(mut self, max: u32) -> Self {
        self.default_max_stack_size = max;
        self
    }

    /// Check if the store may mutate entries directly
    pub fn is_authority(&self) -> bool {
        self.role == NetRole::Authority
    }

    /// Parse from JSON. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| ItemizationError::Config(e.to_string()))
    }

    /// Serialize to pretty JSON
    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| ItemizationError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ItemizationConfig::default();
        assert!(config.is_authority());
        assert!(!config.strict_authority);
        assert_eq!(config.default_max_stack_size, 1);
        assert_eq!(config.default_slot_size, 1);
        assert!(config.report_discarded_adds);
    }

    #[test]
    fn test_partial_json() {
        let config = ItemizationConfig::from_json_str(r#"{ "role": "replica" }"#).unwrap();
        assert_eq!(config.role, NetRole::Replica);
        assert_eq!(config.default_max_stack_size, 1);
    }

    #[test]
    fn test_malformed_json() {
        let err = ItemizationConfig::from_json_str("{ role: ").unwrap_err();
        assert!(matches!(err, ItemizationError::Config(_)));
    }

    #[test]
    fn test_json_roundtrip() {
        let config = ItemizationConfig::replica().with_strict_authority(true);
        let json = config.to_json_string().unwrap();
        assert_eq!(ItemizationConfig::from_json_str(&json).unwrap(), config);
    }
}
