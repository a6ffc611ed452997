//! Node records: identifiers, the open attribute bag, and update patches.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Caller-supplied node identifier.
///
/// Integer and string ids never compare equal: `1` and `"1"` are different nodes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NodeId {
    Int(i64),
    Str(String),
}

impl NodeId {
    /// Parse a command-line token: integers when the token is one, strings otherwise.
    pub fn parse_lenient(token: &str) -> Self {
        token
            .trim()
            .parse::<i64>()
            .map(NodeId::Int)
            .unwrap_or_else(|_| NodeId::Str(token.to_string()))
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeId::Int(n) => write!(f, "{}", n),
            NodeId::Str(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for NodeId {
    fn from(n: i64) -> Self {
        NodeId::Int(n)
    }
}

impl From<i32> for NodeId {
    fn from(n: i32) -> Self {
        NodeId::Int(n.into())
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        NodeId::Str(s.to_string())
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        NodeId::Str(s)
    }
}

/// One record in the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    /// Parent id, `None` for root nodes. Never validated.
    #[serde(default)]
    pub parent: Option<NodeId>,
    pub label: String,
    /// Additional named fields, serialized next to the fixed ones
    #[serde(flatten)]
    pub fields: BTreeMap<String, Value>,
}

impl Node {
    pub fn new(id: impl Into<NodeId>, parent: Option<NodeId>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            parent,
            label: label.into(),
            fields: BTreeMap::new(),
        }
    }

    pub fn root(id: impl Into<NodeId>, label: impl Into<String>) -> Self {
        Self::new(id, None, label)
    }

    pub fn child(id: impl Into<NodeId>, parent: impl Into<NodeId>, label: impl Into<String>) -> Self {
        Self::new(id, Some(parent.into()), label)
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Shallow merge: every field present in `patch` overrides, everything else is kept.
    pub fn merged(&self, patch: &NodePatch) -> Node {
        let mut merged = self.clone();
        if let Some(parent) = &patch.parent {
            merged.parent = parent.clone();
        }
        if let Some(label) = &patch.label {
            merged.label = label.clone();
        }
        for (key, value) in &patch.fields {
            merged.fields.insert(key.clone(), value.clone());
        }
        merged
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.label, self.id)
    }
}

/// Partial node used by updates. `id` selects the target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodePatch {
    pub id: NodeId,
    /// `None`: keep parent, `Some(None)`: make root, `Some(Some(p))`: reparent
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "double_option"
    )]
    pub parent: Option<Option<NodeId>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(flatten)]
    pub fields: BTreeMap<String, Value>,
}

impl NodePatch {
    pub fn new(id: impl Into<NodeId>) -> Self {
        Self {
            id: id.into(),
            parent: None,
            label: None,
            fields: BTreeMap::new(),
        }
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn parent(mut self, parent: Option<NodeId>) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }
}

// Distinguishes an explicit `"parent": null` from an absent key.
fn double_option<'de, D, T>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(de).map(Some)
}
