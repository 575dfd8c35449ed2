//! Viewer identity
//!
//! Every connection gets an opaque [`ViewerId`] when it is accepted. The
//! display name arrives later with `announce`; until then the connection is
//! unregistered and takes no part in broadcasts or consensus.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque, stable identifier for one viewer connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ViewerId(Uuid);

impl ViewerId {
    /// Generate a fresh random identifier
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse an identifier typed by an operator, as `kick <id>` does
    pub fn parse(s: &str) -> Option<Self> {
        Uuid::parse_str(s).ok().map(Self)
    }
}

impl Default for ViewerId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ViewerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A named viewer, as tracked by the registry and serialized to controllers
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Viewer {
    /// Connection identifier
    pub id: ViewerId,
    /// Display name from `announce`
    pub name: String,
}

impl Viewer {
    /// Create a new viewer
    pub fn new(id: ViewerId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

impl std::fmt::Display for Viewer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique() {
        assert_ne!(ViewerId::new(), ViewerId::new());
    }

    #[test]
    fn test_parse_display_roundtrip() {
        let id = ViewerId::new();
        assert_eq!(ViewerId::parse(&id.to_string()), Some(id));
        assert_eq!(ViewerId::parse("bob"), None);
    }

    #[test]
    fn test_viewer_serializes_as_id_name_pair() {
        let id = ViewerId::new();
        let json = serde_json::to_value(Viewer::new(id, "alice")).unwrap();

        assert_eq!(json["name"], "alice");
        assert_eq!(json["id"], id.to_string());
    }
}
