//! Acting identity for authorization checks.

use serde::{Deserialize, Serialize};

/// Role granted by the identity system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Regular user; may act only on requests they created
    Requester,
    /// May act on any request
    Administrator,
}

/// The caller of a state-changing operation, passed explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: String,
    pub role: Role,
}

impl Actor {
    pub fn requester(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role: Role::Requester,
        }
    }

    pub fn administrator(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role: Role::Administrator,
        }
    }

    pub fn is_administrator(&self) -> bool {
        self.role == Role::Administrator
    }
}
