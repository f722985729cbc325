//! Resource representation and diffing tags

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Identifier of a resource within its class, as found in the instance data
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceId(String);

impl ResourceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ResourceId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ResourceId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for ResourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One addressable instance extracted from a document.
///
/// Owned by whichever artifact decomposed it; immutable once extracted and
/// replaced wholesale on update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    /// Identifier within the class (anchor identifier slot value)
    pub id: ResourceId,
    /// Schema class this instance belongs to
    pub class_name: String,
    /// The instance document
    pub content: Value,
}

impl Resource {
    pub fn new(id: impl Into<ResourceId>, class_name: impl Into<String>, content: Value) -> Self {
        Self {
            id: id.into(),
            class_name: class_name.into(),
            content,
        }
    }
}

/// Unique key for per-resource diffing: `(artifact, class, id)`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceTag {
    pub artifact: String,
    pub class_name: String,
    pub id: ResourceId,
}

impl ResourceTag {
    pub fn new(
        artifact: impl Into<String>,
        class_name: impl Into<String>,
        id: impl Into<ResourceId>,
    ) -> Self {
        Self {
            artifact: artifact.into(),
            class_name: class_name.into(),
            id: id.into(),
        }
    }
}

impl std::fmt::Display for ResourceTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.artifact, self.class_name, self.id)
    }
}

/// Key for whole-artifact (undecomposed) diffing: `(artifact, external_id)`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ArtifactTag {
    pub artifact: String,
    pub external_id: String,
}

impl ArtifactTag {
    pub fn new(artifact: impl Into<String>, external_id: impl Into<String>) -> Self {
        Self {
            artifact: artifact.into(),
            external_id: external_id.into(),
        }
    }
}

impl std::fmt::Display for ArtifactTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.artifact, self.external_id)
    }
}
