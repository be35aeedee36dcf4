use crate::model::{CompletePolicy, Container, Forest, Node, NodeId, Outline};

/// Error type for structural edits.
///
/// None of these are failures from the user's point of view: the editor
/// treats every variant as "this gesture does nothing here".
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EditError {
    #[error("node not found: {0}")]
    NotFound(NodeId),
    #[error("cannot {0} at the edge of the list")]
    Boundary(&'static str),
    #[error("cannot drop a node onto itself")]
    SelfDrop,
    #[error("cannot move {moved} under its own descendant {target}")]
    Cycle { moved: NodeId, target: NodeId },
    #[error("node {0} has children and cannot be completed")]
    Blocked(NodeId),
}

fn not_found(id: &NodeId) -> EditError {
    EditError::NotFound(id.clone())
}

// ---------------------------------------------------------------------------
// Creation and text
// ---------------------------------------------------------------------------

/// A fresh, detached node with a new id
pub fn create_node(text: impl Into<String>) -> Node {
    Node::new(text)
}

/// Insert a new empty node right after `id` in its sibling list.
/// Returns the new node's id.
pub fn add_sibling_after(forest: &mut Forest, id: &NodeId) -> Result<NodeId, EditError> {
    let container = forest.find_containing_list(id).ok_or_else(|| not_found(id))?;
    let index = forest.sibling_index(id).ok_or_else(|| not_found(id))?;
    forest
        .insert_node(&container, index + 1, create_node(""))
        .ok_or_else(|| not_found(id))
}

pub fn set_text(forest: &mut Forest, id: &NodeId, text: String) -> Result<(), EditError> {
    let rec = forest.get_mut(id).ok_or_else(|| not_found(id))?;
    rec.text = text;
    Ok(())
}

/// Set the note for a node. An empty note removes the entry.
pub fn set_note(outline: &mut Outline, id: &NodeId, text: String) -> Result<(), EditError> {
    if !outline.forest.contains(id) {
        return Err(not_found(id));
    }
    if text.is_empty() {
        outline.notes.shift_remove(id);
    } else {
        outline.notes.insert(id.clone(), text);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Indent / outdent / reorder
// ---------------------------------------------------------------------------

/// Make `id` the last child of the sibling above it.
/// The new parent is expanded so the moved node stays visible.
pub fn indent(forest: &mut Forest, id: &NodeId) -> Result<(), EditError> {
    let container = forest.find_containing_list(id).ok_or_else(|| not_found(id))?;
    let index = forest.sibling_index(id).ok_or_else(|| not_found(id))?;
    if index == 0 {
        return Err(EditError::Boundary("indent"));
    }
    let above = forest
        .list(&container)
        .and_then(|list| list.get(index - 1))
        .cloned()
        .ok_or_else(|| not_found(id))?;

    let removed = forest.remove_node(id).ok_or_else(|| not_found(id))?;
    let target = Container::Node(above.clone());
    let end = forest.list(&target).map_or(0, |l| l.len());
    forest
        .insert_node(&target, end, removed.node)
        .ok_or_else(|| not_found(&above))?;
    if let Some(rec) = forest.get_mut(&above) {
        rec.collapsed = false;
    }
    Ok(())
}

/// Move `id` out of its parent, placing it right after the parent.
pub fn outdent(forest: &mut Forest, id: &NodeId) -> Result<(), EditError> {
    let (parent, _) = forest.find_parent(id).ok_or_else(|| not_found(id))?;
    let parent = parent.ok_or(EditError::Boundary("outdent"))?;
    let parent_container = forest
        .find_containing_list(&parent)
        .ok_or_else(|| not_found(&parent))?;
    let parent_index = forest
        .sibling_index(&parent)
        .ok_or_else(|| not_found(&parent))?;

    let removed = forest.remove_node(id).ok_or_else(|| not_found(id))?;
    forest
        .insert_node(&parent_container, parent_index + 1, removed.node)
        .ok_or_else(|| not_found(&parent))?;
    Ok(())
}

/// Swap `id` with the sibling above it
pub fn move_up(forest: &mut Forest, id: &NodeId) -> Result<(), EditError> {
    shift(forest, id, -1)
}

/// Swap `id` with the sibling below it
pub fn move_down(forest: &mut Forest, id: &NodeId) -> Result<(), EditError> {
    shift(forest, id, 1)
}

fn shift(forest: &mut Forest, id: &NodeId, direction: isize) -> Result<(), EditError> {
    let container = forest.find_containing_list(id).ok_or_else(|| not_found(id))?;
    let index = forest.sibling_index(id).ok_or_else(|| not_found(id))?;
    let len = forest.list(&container).map_or(0, |l| l.len());
    let target = index
        .checked_add_signed(direction)
        .filter(|t| *t < len)
        .ok_or(EditError::Boundary(if direction < 0 { "move up" } else { "move down" }))?;
    forest.swap_siblings(&container, index, target);
    Ok(())
}

// ---------------------------------------------------------------------------
// Collapse
// ---------------------------------------------------------------------------

/// Flip the collapsed flag. Returns the new value.
pub fn toggle_collapsed(forest: &mut Forest, id: &NodeId) -> Result<bool, EditError> {
    let rec = forest.get_mut(id).ok_or_else(|| not_found(id))?;
    rec.collapsed = !rec.collapsed;
    Ok(rec.collapsed)
}

pub fn set_collapsed(forest: &mut Forest, id: &NodeId, collapsed: bool) -> Result<(), EditError> {
    let rec = forest.get_mut(id).ok_or_else(|| not_found(id))?;
    rec.collapsed = collapsed;
    Ok(())
}

// ---------------------------------------------------------------------------
// Completion and reparenting
// ---------------------------------------------------------------------------

/// Remove `id` from the tree and record it in the done list.
///
/// Returns the texts appended to the done list. Notes of every removed node
/// are dropped along with it.
pub fn complete(
    outline: &mut Outline,
    id: &NodeId,
    policy: CompletePolicy,
) -> Result<Vec<String>, EditError> {
    let rec = outline.forest.get(id).ok_or_else(|| not_found(id))?;
    if policy == CompletePolicy::Block && rec.has_children() {
        return Err(EditError::Blocked(id.clone()));
    }

    let removed = outline.forest.remove_node(id).ok_or_else(|| not_found(id))?;
    let subtree = removed.node.preorder();
    let texts: Vec<String> = match policy {
        CompletePolicy::Cascade => subtree.iter().map(|n| n.text.clone()).collect(),
        CompletePolicy::Discard | CompletePolicy::Block => vec![removed.node.text.clone()],
    };
    for gone in &subtree {
        outline.notes.shift_remove(&gone.id);
    }
    outline.done.extend(texts.iter().cloned());
    Ok(texts)
}

/// Drop `dragged` onto `target`: it becomes the last child of `target` and
/// is expanded. Dropping onto itself or onto one of its own descendants is
/// rejected.
pub fn reparent(forest: &mut Forest, dragged: &NodeId, target: &NodeId) -> Result<(), EditError> {
    if dragged == target {
        return Err(EditError::SelfDrop);
    }
    if !forest.contains(target) {
        return Err(not_found(target));
    }
    if !forest.contains(dragged) {
        return Err(not_found(dragged));
    }
    if forest.is_ancestor(dragged, target) {
        return Err(EditError::Cycle {
            moved: dragged.clone(),
            target: target.clone(),
        });
    }

    let mut node = forest.remove_node(dragged).ok_or_else(|| not_found(dragged))?.node;
    node.collapsed = false;
    let container = Container::Node(target.clone());
    let end = forest.list(&container).map_or(0, |l| l.len());
    forest
        .insert_node(&container, end, node)
        .ok_or_else(|| not_found(target))?;
    if let Some(rec) = forest.get_mut(target) {
        rec.collapsed = false;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
