use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque node identifier. New nodes get a UUID v4; any string is accepted
/// when loading a stored outline.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Allocate a fresh, globally unique id
    pub fn generate() -> Self {
        NodeId(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        NodeId(s.to_string())
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        NodeId(s)
    }
}

/// A node in its nested form: the shape written to the store and handed
/// across the public API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub collapsed: bool,
    #[serde(default)]
    pub children: Vec<Node>,
}

impl Node {
    /// Create a detached node with a fresh id, no children, expanded
    pub fn new(text: impl Into<String>) -> Self {
        Node {
            id: NodeId::generate(),
            text: text.into(),
            collapsed: false,
            children: Vec::new(),
        }
    }

    /// This node followed by all of its descendants, depth-first pre-order
    pub fn preorder(&self) -> Vec<&Node> {
        let mut out = Vec::new();
        collect_preorder(self, &mut out);
        out
    }
}

fn collect_preorder<'a>(node: &'a Node, out: &mut Vec<&'a Node>) {
    out.push(node);
    for child in &node.children {
        collect_preorder(child, out);
    }
}

/// Arena entry for a node. Children are held by id; `parent` is `None` for
/// roots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeRecord {
    pub text: String,
    pub collapsed: bool,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

impl NodeRecord {
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }
}

/// The ordered sibling list a node lives in
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Container {
    /// The forest's top-level list
    Root,
    /// The children of the given node
    Node(NodeId),
}
