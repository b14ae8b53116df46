//! Equipment eligibility

use super::ComponentPolicy;
use crate::equipment::EquipmentSlot;
use serde::{Deserialize, Serialize};

/// A presentation object spawned while the item is equipped
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisualSpec {
    /// Asset path of the visual
    pub asset: String,
    /// Socket on the owner to attach to
    #[serde(default)]
    pub socket: Option<String>,
}

impl VisualSpec {
    pub fn new(asset: impl Into<String>) -> Self {
        Self {
            asset: asset.into(),
            socket: None,
        }
    }

    /// Set attach socket
    pub fn with_socket(mut self, socket: impl Into<String>) -> Self {
        self.socket = Some(socket.into());
        self
    }
}

fn default_true() -> bool {
    true
}

/// Makes a definition equippable
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquipmentPolicy {
    #[serde(default = "default_true")]
    pub can_be_equipped: bool,
    #[serde(default)]
    pub slot: Option<EquipmentSlot>,
    #[serde(default)]
    pub visuals: Vec<VisualSpec>,
}

impl EquipmentPolicy {
    pub fn new(slot: EquipmentSlot) -> Self {
        Self {
            can_be_equipped: true,
            slot: Some(slot),
            visuals: Vec::new(),
        }
    }

    /// Add a visual
    pub fn with_visual(mut self, visual: VisualSpec) -> Self {
        self.visuals.push(visual);
        self
    }
}

impl ComponentPolicy for EquipmentPolicy {
    fn name(&self) -> &'static str {
        "equipment"
    }
}
