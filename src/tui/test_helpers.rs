use std::time::Instant;

use ratatui::Terminal;
use ratatui::backend::TestBackend;
use ratatui::layout::Rect;

use crate::io::persist::{self, PersistedState, SlotKeys};
use crate::io::store::MemoryStore;
use crate::model::{Node, NodeId, OutlinerConfig};
use crate::tui::app::App;

/// Render into an in-memory buffer and return plain text (no styles).
pub fn render_to_string<F>(w: u16, h: u16, f: F) -> String
where
    F: FnOnce(&mut ratatui::Frame, Rect),
{
    let backend = TestBackend::new(w, h);
    let mut terminal = Terminal::new(backend).unwrap();
    terminal
        .draw(|frame| {
            let area = frame.area();
            f(frame, area);
        })
        .unwrap();

    let buf = terminal.backend().buffer().clone();
    let w = buf.area.width as usize;
    let lines: Vec<String> = buf
        .content
        .chunks(w)
        .map(|row| {
            let s: String = row.iter().map(|cell| cell.symbol()).collect();
            s.trim_end().to_string()
        })
        .collect();

    let end = lines
        .iter()
        .rposition(|l| !l.is_empty())
        .map_or(0, |i| i + 1);
    lines[..end].join("\n")
}

/// Leaf node whose id is its text lowercased
pub fn leaf(text: &str) -> Node {
    branch(text, false, vec![])
}

pub fn branch(text: &str, collapsed: bool, children: Vec<Node>) -> Node {
    Node {
        id: NodeId::from(text.to_lowercase()),
        text: text.to_string(),
        collapsed,
        children,
    }
}

/// An App over a memory store seeded with `forest` and `done`
pub fn app_with_state(forest: Vec<Node>, done: &[&str]) -> App {
    let mut store = MemoryStore::new();
    let state = PersistedState {
        forest,
        done: done.iter().map(|s| s.to_string()).collect(),
        ..Default::default()
    };
    persist::save(&mut store, &SlotKeys::default(), &state).unwrap();
    App::new(Box::new(store), &OutlinerConfig::default(), Instant::now())
}

/// An App with one root per text
pub fn app_with(texts: &[&str]) -> App {
    app_with_state(texts.iter().map(|t| leaf(t)).collect(), &[])
}
