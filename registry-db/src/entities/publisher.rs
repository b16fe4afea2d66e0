use super::EntityKey;
use serde::{Deserialize, Serialize};

/// A verified publisher, identified by its domain.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Publisher {
    pub id: String,
    pub contact_email: String,
    /// User ids allowed to act for the publisher
    #[serde(default)]
    pub members: Vec<String>,
}

impl Publisher {
    pub fn key(&self) -> EntityKey {
        EntityKey::Publisher(self.id.clone())
    }
}
