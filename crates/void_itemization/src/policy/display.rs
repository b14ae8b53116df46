//! Display-only components

use super::ComponentPolicy;
use serde::{Deserialize, Serialize};

/// Icon shown by inventory UIs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IconPolicy {
    pub path: String,
}

impl ComponentPolicy for IconPolicy {
    fn name(&self) -> &'static str {
        "icon"
    }
}
