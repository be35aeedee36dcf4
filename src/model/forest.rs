use std::collections::HashMap;

use super::node::{Container, Node, NodeId, NodeRecord};

/// A node detached from the forest, with its whole subtree and the position
/// it was taken from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Removed {
    pub node: Node,
    pub from: Container,
    pub index: usize,
}

/// Arena storage for the outline tree.
///
/// Every node lives in a flat table keyed by id and is referenced exactly
/// once, either from `roots` or from its parent's `children`. Moves are
/// remove + insert of ids, so there are never dangling references.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Forest {
    nodes: HashMap<NodeId, NodeRecord>,
    roots: Vec<NodeId>,
}

impl Forest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the arena from the nested encoding.
    /// A later occurrence of an already-used id is given a fresh id.
    pub fn from_tree(roots: Vec<Node>) -> Self {
        let mut forest = Forest::new();
        for node in roots {
            let id = forest.attach(None, node);
            forest.roots.push(id);
        }
        forest
    }

    /// Convert back to the nested encoding, in display order
    pub fn to_tree(&self) -> Vec<Node> {
        self.roots.iter().filter_map(|id| self.build(id)).collect()
    }

    fn build(&self, id: &NodeId) -> Option<Node> {
        let rec = self.nodes.get(id)?;
        Some(Node {
            id: id.clone(),
            text: rec.text.clone(),
            collapsed: rec.collapsed,
            children: rec.children.iter().filter_map(|c| self.build(c)).collect(),
        })
    }

    /// Number of nodes in the whole forest
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn get(&self, id: &NodeId) -> Option<&NodeRecord> {
        self.nodes.get(id)
    }

    pub fn get_mut(&mut self, id: &NodeId) -> Option<&mut NodeRecord> {
        self.nodes.get_mut(id)
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// The ordered ids in a sibling list. `None` if the container node is gone.
    pub fn list(&self, container: &Container) -> Option<&[NodeId]> {
        match container {
            Container::Root => Some(&self.roots),
            Container::Node(id) => self.nodes.get(id).map(|r| r.children.as_slice()),
        }
    }

    fn list_mut(&mut self, container: &Container) -> Option<&mut Vec<NodeId>> {
        match container {
            Container::Root => Some(&mut self.roots),
            Container::Node(id) => self.nodes.get_mut(id).map(|r| &mut r.children),
        }
    }

    /// The sibling list that directly holds `id`
    pub fn find_containing_list(&self, id: &NodeId) -> Option<Container> {
        let rec = self.nodes.get(id)?;
        Some(match &rec.parent {
            None => Container::Root,
            Some(parent) => Container::Node(parent.clone()),
        })
    }

    /// The immediate parent of `id` (`None` for roots) and its sibling list
    pub fn find_parent(&self, id: &NodeId) -> Option<(Option<NodeId>, Container)> {
        let container = self.find_containing_list(id)?;
        let parent = match &container {
            Container::Root => None,
            Container::Node(p) => Some(p.clone()),
        };
        Some((parent, container))
    }

    /// Position of `id` within its sibling list
    pub fn sibling_index(&self, id: &NodeId) -> Option<usize> {
        let container = self.find_containing_list(id)?;
        self.list(&container)?.iter().position(|c| c == id)
    }

    /// Nesting depth (0 = root)
    pub fn depth(&self, id: &NodeId) -> Option<usize> {
        let mut rec = self.nodes.get(id)?;
        let mut depth = 0;
        while let Some(parent) = &rec.parent {
            depth += 1;
            rec = self.nodes.get(parent)?;
        }
        Some(depth)
    }

    /// Whether `ancestor` lies on the parent chain of `id`
    pub fn is_ancestor(&self, ancestor: &NodeId, id: &NodeId) -> bool {
        let mut current = self.nodes.get(id).and_then(|r| r.parent.as_ref());
        while let Some(parent) = current {
            if parent == ancestor {
                return true;
            }
            current = self.nodes.get(parent).and_then(|r| r.parent.as_ref());
        }
        false
    }

    /// `id` and all of its descendants, depth-first pre-order
    pub fn subtree_ids(&self, id: &NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.collect_subtree(id, &mut out);
        out
    }

    fn collect_subtree(&self, id: &NodeId, out: &mut Vec<NodeId>) {
        if let Some(rec) = self.nodes.get(id) {
            out.push(id.clone());
            for child in &rec.children {
                self.collect_subtree(child, out);
            }
        }
    }

    /// Detach `id` with its subtree, preserving the order of the remaining
    /// siblings. Returns `None` if the id is not in the forest.
    pub fn remove_node(&mut self, id: &NodeId) -> Option<Removed> {
        let from = self.find_containing_list(id)?;
        let list = self.list_mut(&from)?;
        let index = list.iter().position(|c| c == id)?;
        list.remove(index);
        let node = self.detach(id)?;
        Some(Removed { node, from, index })
    }

    /// Insert a node (with its subtree) into `container` at `index`, clamped
    /// to the list length. Returns the id it was stored under, or `None` if
    /// the container node does not exist.
    pub fn insert_node(&mut self, container: &Container, index: usize, node: Node) -> Option<NodeId> {
        self.list(container)?;
        let parent = match container {
            Container::Root => None,
            Container::Node(p) => Some(p.clone()),
        };
        let id = self.attach(parent, node);
        let list = self.list_mut(container)?;
        let at = index.min(list.len());
        list.insert(at, id.clone());
        Some(id)
    }

    /// Swap two entries of one sibling list. Out-of-range indices are ignored.
    pub fn swap_siblings(&mut self, container: &Container, a: usize, b: usize) -> bool {
        match self.list_mut(container) {
            Some(list) if a < list.len() && b < list.len() => {
                list.swap(a, b);
                true
            }
            _ => false,
        }
    }

    fn attach(&mut self, parent: Option<NodeId>, node: Node) -> NodeId {
        let Node {
            id,
            text,
            collapsed,
            children,
        } = node;
        let id = if self.nodes.contains_key(&id) {
            let fresh = NodeId::generate();
            tracing::warn!(duplicate = %id, replacement = %fresh, "duplicate node id, assigned a fresh one");
            fresh
        } else {
            id
        };
        // Reserve the id before the children so none of them can reuse it
        self.nodes.insert(
            id.clone(),
            NodeRecord {
                text,
                collapsed,
                parent,
                children: Vec::new(),
            },
        );
        let child_ids: Vec<NodeId> = children
            .into_iter()
            .map(|child| self.attach(Some(id.clone()), child))
            .collect();
        if let Some(rec) = self.nodes.get_mut(&id) {
            rec.children = child_ids;
        }
        id
    }

    fn detach(&mut self, id: &NodeId) -> Option<Node> {
        let rec = self.nodes.remove(id)?;
        let children = rec.children.iter().filter_map(|c| self.detach(c)).collect();
        Some(Node {
            id: id.clone(),
            text: rec.text,
            collapsed: rec.collapsed,
            children,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn node(id: &str, text: &str, children: Vec<Node>) -> Node {
        Node {
            id: NodeId::from(id),
            text: text.to_string(),
            collapsed: false,
            children,
        }
    }

    fn sample() -> Forest {
        Forest::from_tree(vec![
            node("a", "A", vec![node("a1", "A1", vec![node("a1x", "A1x", vec![])]), node("a2", "A2", vec![])]),
            node("b", "B", vec![]),
        ])
    }

    fn id(s: &str) -> NodeId {
        NodeId::from(s)
    }

    #[test]
    fn tree_round_trip_preserves_shape() {
        let tree = vec![
            node("a", "A", vec![node("a1", "A1", vec![])]),
            node("b", "B", vec![]),
        ];
        let forest = Forest::from_tree(tree.clone());
        assert_eq!(forest.to_tree(), tree);
        assert_eq!(forest.len(), 3);
    }

    #[test]
    fn containing_list_and_parent() {
        let forest = sample();
        assert_eq!(forest.find_containing_list(&id("b")), Some(Container::Root));
        assert_eq!(forest.find_containing_list(&id("a1x")), Some(Container::Node(id("a1"))));
        assert_eq!(forest.find_parent(&id("a")), Some((None, Container::Root)));
        assert_eq!(
            forest.find_parent(&id("a2")),
            Some((Some(id("a")), Container::Node(id("a"))))
        );
        assert_eq!(forest.find_parent(&id("nope")), None);
        assert_eq!(forest.find_containing_list(&id("nope")), None);
    }

    #[test]
    fn sibling_index_and_depth() {
        let forest = sample();
        assert_eq!(forest.sibling_index(&id("a2")), Some(1));
        assert_eq!(forest.sibling_index(&id("b")), Some(1));
        assert_eq!(forest.depth(&id("a1x")), Some(2));
        assert_eq!(forest.depth(&id("b")), Some(0));
    }

    #[test]
    fn remove_keeps_sibling_order_and_returns_subtree() {
        let mut forest = sample();
        let removed = forest.remove_node(&id("a1")).unwrap();
        assert_eq!(removed.from, Container::Node(id("a")));
        assert_eq!(removed.index, 0);
        assert_eq!(removed.node.children.len(), 1);
        assert_eq!(forest.list(&Container::Node(id("a"))).unwrap(), &[id("a2")]);
        assert!(!forest.contains(&id("a1x")));
        assert_eq!(forest.len(), 3);
    }

    #[test]
    fn remove_twice_is_none() {
        let mut forest = sample();
        assert!(forest.remove_node(&id("b")).is_some());
        assert!(forest.remove_node(&id("b")).is_none());
    }

    #[test]
    fn insert_clamps_index() {
        let mut forest = sample();
        let new_id = forest
            .insert_node(&Container::Root, 99, node("c", "C", vec![]))
            .unwrap();
        assert_eq!(new_id, id("c"));
        assert_eq!(forest.roots(), &[id("a"), id("b"), id("c")]);
        assert_eq!(forest.get(&id("c")).unwrap().parent, None);
    }

    #[test]
    fn insert_into_missing_container_is_none() {
        let mut forest = sample();
        let result = forest.insert_node(&Container::Node(id("ghost")), 0, node("c", "C", vec![]));
        assert!(result.is_none());
        assert!(!forest.contains(&id("c")));
    }

    #[test]
    fn duplicate_ids_are_reassigned() {
        let forest = Forest::from_tree(vec![
            node("x", "first", vec![node("x", "child", vec![])]),
            node("x", "second", vec![]),
        ]);
        assert_eq!(forest.len(), 3);
        let tree = forest.to_tree();
        assert_eq!(tree[0].id, id("x"));
        assert_ne!(tree[0].children[0].id, id("x"));
        assert_ne!(tree[1].id, id("x"));
        assert_eq!(tree[1].text, "second");
    }

    #[test]
    fn ancestry() {
        let forest = sample();
        assert!(forest.is_ancestor(&id("a"), &id("a1x")));
        assert!(forest.is_ancestor(&id("a1"), &id("a1x")));
        assert!(!forest.is_ancestor(&id("a1x"), &id("a")));
        assert!(!forest.is_ancestor(&id("a"), &id("a")));
        assert!(!forest.is_ancestor(&id("b"), &id("a1")));
    }

    #[test]
    fn subtree_ids_preorder() {
        let forest = sample();
        assert_eq!(forest.subtree_ids(&id("a")), vec![id("a"), id("a1"), id("a1x"), id("a2")]);
        assert!(forest.subtree_ids(&id("nope")).is_empty());
    }

    #[test]
    fn swap_out_of_range_is_ignored() {
        let mut forest = sample();
        assert!(!forest.swap_siblings(&Container::Root, 0, 5));
        assert!(forest.swap_siblings(&Container::Root, 0, 1));
        assert_eq!(forest.roots(), &[id("b"), id("a")]);
    }
}
