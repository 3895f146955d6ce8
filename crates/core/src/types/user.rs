//! User profile records.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::UserId;

/// The signed-in user's profile as reported by the backend.
///
/// Identity fields are opaque to the storefront: only `role` is consulted
/// (for route authorization), everything else is carried as-is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UserProfile {
    /// Whether this user's role equals `role` exactly.
    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.role.as_deref() == Some(role)
    }

    /// Shallow-merge `changes` into this profile, as a profile edit form does.
    ///
    /// Typed fields present in `changes` replace the current value; unknown
    /// keys are inserted into `extra`.
    pub fn merge(&mut self, changes: &Map<String, Value>) {
        for (key, value) in changes {
            match key.as_str() {
                "id" => self.id = serde_json::from_value(value.clone()).ok(),
                "name" => self.name = value.as_str().map(str::to_owned),
                "email" => self.email = value.as_str().map(str::to_owned),
                "role" => self.role = value.as_str().map(str::to_owned),
                _ => {
                    self.extra.insert(key.clone(), value.clone());
                }
            }
        }
    }
}
