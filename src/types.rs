//! Shared types used across the codebase

use serde::{Deserialize, Serialize};

/// Write operations that are propagated from the system of record to the read store.
/// Used by the combined repository and by mirror observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MirrorOperation {
    Create,
    UpdateState,
}

impl MirrorOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            MirrorOperation::Create => "create",
            MirrorOperation::UpdateState => "update_state",
        }
    }
}

impl std::fmt::Display for MirrorOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
