use indexmap::IndexMap;

use super::forest::Forest;
use super::node::{Node, NodeId};

/// Free-text annotations keyed by node id, in insertion order
pub type Notes = IndexMap<NodeId, String>;

/// Everything the editor owns: the tree, the done list and the notes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outline {
    pub forest: Forest,
    /// Texts of completed nodes, oldest first
    pub done: Vec<String>,
    pub notes: Notes,
}

impl Outline {
    /// Assemble an outline from loaded parts. An empty forest is seeded with a
    /// single empty node so there is always something to focus.
    pub fn from_parts(forest: Vec<Node>, done: Vec<String>, notes: Notes) -> Self {
        let mut outline = Outline {
            forest: Forest::from_tree(forest),
            done,
            notes,
        };
        outline.ensure_seed();
        outline
    }

    /// Give an empty forest its single empty node. Returns the new node's id
    /// if one was added.
    pub fn ensure_seed(&mut self) -> Option<NodeId> {
        if !self.forest.is_empty() {
            return None;
        }
        let seed = Node::new("");
        let id = seed.id.clone();
        self.forest = Forest::from_tree(vec![seed]);
        Some(id)
    }

    pub fn note(&self, id: &NodeId) -> Option<&str> {
        self.notes.get(id).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_forest_gets_a_seed_node() {
        let outline = Outline::from_parts(Vec::new(), Vec::new(), Notes::new());
        assert_eq!(outline.forest.roots().len(), 1);
        let root = outline.forest.get(&outline.forest.roots()[0]).unwrap();
        assert_eq!(root.text, "");
        assert!(!root.collapsed);
        assert!(root.children.is_empty());
    }

    #[test]
    fn seed_only_fills_an_empty_forest() {
        let mut outline = Outline::from_parts(vec![Node::new("x")], Vec::new(), Notes::new());
        assert_eq!(outline.ensure_seed(), None);

        outline.forest = Forest::new();
        let seed = outline.ensure_seed().unwrap();
        assert_eq!(outline.forest.roots(), &[seed]);
        assert_eq!(outline.ensure_seed(), None);
    }

    #[test]
    fn loaded_forest_is_kept() {
        let node = Node::new("keep me");
        let id = node.id.clone();
        let outline = Outline::from_parts(vec![node], vec!["old".into()], Notes::new());
        assert_eq!(outline.forest.roots(), &[id]);
        assert_eq!(outline.done, vec!["old".to_string()]);
    }
}
