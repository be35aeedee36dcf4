use crate::model::NodeId;
use crate::ops::VisibleRow;

/// The open detail panel: a node and its note
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailPanel {
    pub id: NodeId,
    pub note: String,
}

/// Everything a surface needs to draw the editor
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderFrame {
    /// Visible nodes, top to bottom
    pub rows: Vec<VisibleRow>,
    /// Completed texts, oldest first
    pub done: Vec<String>,
    pub focus: Option<NodeId>,
    pub detail: Option<DetailPanel>,
}

impl RenderFrame {
    /// Row index of the focused node, if it is visible
    pub fn focus_row(&self) -> Option<usize> {
        let focus = self.focus.as_ref()?;
        self.rows.iter().position(|r| &r.id == focus)
    }
}

/// Receives frames and focus directives from the editor
pub trait RenderSurface {
    fn render(&mut self, frame: &RenderFrame);
    /// Move input focus to `id`
    fn focus(&mut self, id: &NodeId);
}
