use crate::model::{Forest, NodeId};

/// One line of the visible outline, top to bottom
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibleRow {
    pub id: NodeId,
    /// Nesting depth (0 = root)
    pub depth: usize,
    pub text: String,
    pub has_children: bool,
    pub collapsed: bool,
    pub is_last_sibling: bool,
}

/// Ids of every node the user can currently see, depth-first pre-order.
/// A collapsed node is included; its descendants are not.
pub fn list_visible(forest: &Forest) -> Vec<NodeId> {
    visible_rows(forest).into_iter().map(|row| row.id).collect()
}

/// The visible outline with everything a render surface needs per line
pub fn visible_rows(forest: &Forest) -> Vec<VisibleRow> {
    let mut rows = Vec::new();
    flatten(forest, forest.roots(), 0, &mut rows);
    rows
}

fn flatten(forest: &Forest, ids: &[NodeId], depth: usize, rows: &mut Vec<VisibleRow>) {
    let count = ids.len();
    for (i, id) in ids.iter().enumerate() {
        let Some(rec) = forest.get(id) else {
            continue;
        };
        rows.push(VisibleRow {
            id: id.clone(),
            depth,
            text: rec.text.clone(),
            has_children: rec.has_children(),
            collapsed: rec.collapsed,
            is_last_sibling: i == count - 1,
        });
        if !rec.collapsed {
            flatten(forest, &rec.children, depth + 1, rows);
        }
    }
}

/// The visible node `offset` lines away from `id`.
/// `None` at either end, or if `id` is not currently visible.
pub fn neighbour(forest: &Forest, id: &NodeId, offset: isize) -> Option<NodeId> {
    let visible = list_visible(forest);
    let pos = visible.iter().position(|v| v == id)?;
    let target = pos.checked_add_signed(offset)?;
    visible.get(target).cloned()
}
