use std::time::Instant;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};

use crate::editor::{Gesture, Key, Modifiers};
use crate::model::NodeId;
use crate::util::unicode;

use super::app::{App, Mode};

/// Translate a terminal key into the editor's key vocabulary
pub fn editor_key(key: &KeyEvent) -> (Key, Modifiers) {
    let mut mods = Modifiers {
        ctrl: key.modifiers.contains(KeyModifiers::CONTROL),
        shift: key.modifiers.contains(KeyModifiers::SHIFT),
        alt: key.modifiers.contains(KeyModifiers::ALT),
    };
    let code = match key.code {
        KeyCode::Enter => Key::Enter,
        KeyCode::Tab => Key::Tab,
        KeyCode::BackTab => {
            mods.shift = true;
            Key::Tab
        }
        KeyCode::Char(' ') => Key::Space,
        KeyCode::Up => Key::Up,
        KeyCode::Down => Key::Down,
        KeyCode::Left => Key::Left,
        KeyCode::Right => Key::Right,
        KeyCode::Esc => Key::Escape,
        // Most terminals cannot report ctrl+Enter
        KeyCode::Char('d') if mods.ctrl => {
            mods = Modifiers::CTRL;
            Key::Enter
        }
        _ => Key::Other,
    };
    (code, mods)
}

/// A key that types text rather than driving the editor
fn typed_char(key: &KeyEvent) -> Option<char> {
    match key.code {
        KeyCode::Char(c)
            if !key
                .modifiers
                .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
        {
            Some(c)
        }
        _ => None,
    }
}

/// Handle a key event in the current mode
pub fn handle_key(app: &mut App, key: KeyEvent, now: Instant) {
    if matches!(key.code, KeyCode::Modifier(_)) {
        return;
    }

    if key.modifiers.contains(KeyModifiers::CONTROL) {
        match key.code {
            KeyCode::Char('q') => {
                app.quit();
                return;
            }
            KeyCode::Char('t') => {
                app.start_session(now);
                return;
            }
            KeyCode::Char('o') => {
                open_note(app, now);
                return;
            }
            _ => {}
        }
    }

    match app.mode {
        Mode::EditNote => handle_note_key(app, key, now),
        Mode::EditText => handle_edit_key(app, key, now),
        Mode::Navigate => handle_navigate_key(app, key, now),
    }
}

fn open_note(app: &mut App, now: Instant) {
    let Some(id) = app.screen.focus.clone() else {
        return;
    };
    app.send(Gesture::ShowDetail { id }, now);
    if app.screen.frame.detail.is_some() {
        app.mode = Mode::EditNote;
    }
}

fn handle_note_key(app: &mut App, key: KeyEvent, now: Instant) {
    match key.code {
        KeyCode::Esc | KeyCode::Enter => app.mode = Mode::Navigate,
        KeyCode::Backspace => app.edit_note(now, |note| {
            unicode::pop_grapheme(note);
        }),
        _ => {
            if let Some(c) = typed_char(&key) {
                app.edit_note(now, |note| note.push(c));
            }
        }
    }
}

fn handle_edit_key(app: &mut App, key: KeyEvent, now: Instant) {
    if let Some(c) = typed_char(&key) {
        app.edit_text(now, |text| text.push(c));
        return;
    }
    match key.code {
        KeyCode::Backspace => app.edit_text(now, |text| {
            unicode::pop_grapheme(text);
        }),
        KeyCode::Esc => app.mode = Mode::Navigate,
        // The insertion point stays at the end of the text
        KeyCode::Left | KeyCode::Right if key.modifiers.is_empty() => {}
        _ => {
            app.mode = Mode::Navigate;
            forward_key(app, &key, now);
        }
    }
}

fn handle_navigate_key(app: &mut App, key: KeyEvent, now: Instant) {
    match key.code {
        KeyCode::Char(' ') => forward_key(app, &key, now),
        KeyCode::Backspace if app.screen.focus.is_some() => {
            app.mode = Mode::EditText;
            app.edit_text(now, |text| {
                unicode::pop_grapheme(text);
            });
        }
        _ => match typed_char(&key) {
            Some(c) if app.screen.focus.is_some() => {
                app.mode = Mode::EditText;
                app.edit_text(now, |text| text.push(c));
            }
            _ => forward_key(app, &key, now),
        },
    }
}

/// Hand a key to the editor, targeted at the focused node. With nothing
/// focused, arrows pick up the first row.
fn forward_key(app: &mut App, key: &KeyEvent, now: Instant) {
    let (code, mods) = editor_key(key);
    let Some(id) = app.screen.focus.clone() else {
        if matches!(code, Key::Up | Key::Down) {
            if let Some(first) = app.screen.frame.rows.first().map(|r| r.id.clone()) {
                app.set_focus(first, now);
            }
        }
        return;
    };
    app.send(
        Gesture::Key {
            id,
            key: code,
            mods,
            composing: false,
        },
        now,
    );
}

/// What sits under a screen cell in the outline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowHit {
    pub id: NodeId,
    /// The collapse marker was hit
    pub on_marker: bool,
}

pub fn row_at(app: &App, column: u16, row: u16) -> Option<RowHit> {
    let area = app.outline_area;
    if row < area.y || row >= area.y + area.height || column < area.x {
        return None;
    }
    let index = app.scroll_offset + (row - area.y) as usize;
    let visible = app.screen.frame.rows.get(index)?;
    let marker_col = area.x as usize + visible.depth * 2;
    Some(RowHit {
        id: visible.id.clone(),
        on_marker: visible.has_children && column as usize == marker_col,
    })
}

/// Mouse down starts a drag, release over another row drops onto it, and
/// release over the same row is a click.
pub fn handle_mouse(app: &mut App, mouse: MouseEvent, now: Instant) {
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            let Some(hit) = row_at(app, mouse.column, mouse.row) else {
                return;
            };
            if hit.on_marker {
                app.send(Gesture::ToggleCollapse { id: hit.id }, now);
                return;
            }
            app.pressed = Some(hit.id.clone());
            app.send(Gesture::DragStart { id: hit.id }, now);
        }
        MouseEventKind::Up(MouseButton::Left) => {
            let Some(dragged) = app.pressed.take() else {
                return;
            };
            let Some(hit) = row_at(app, mouse.column, mouse.row) else {
                return;
            };
            app.mode = Mode::Navigate;
            if hit.id == dragged {
                app.set_focus(dragged, now);
            } else {
                app.send(
                    Gesture::Drop {
                        target: hit.id,
                        dragged,
                    },
                    now,
                );
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tui::test_helpers::{app_with, app_with_state, branch, leaf};
    use crossterm::event::KeyEventState;
    use pretty_assertions::assert_eq;
    use ratatui::layout::Rect;
    use std::time::Duration;

    fn press(code: KeyCode, mods: KeyModifiers) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: mods,
            kind: crossterm::event::KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    fn plain(code: KeyCode) -> KeyEvent {
        press(code, KeyModifiers::NONE)
    }

    /// Feed a key and let the debounce window pass
    fn key(app: &mut App, event: KeyEvent) {
        let now = Instant::now();
        handle_key(app, event, now);
        app.tick(now + Duration::from_millis(30));
    }

    fn mouse(kind: MouseEventKind, column: u16, row: u16) -> MouseEvent {
        MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        }
    }

    fn texts(app: &App) -> Vec<String> {
        app.screen.frame.rows.iter().map(|r| r.text.clone()).collect()
    }

    #[test]
    fn key_translation() {
        assert_eq!(
            editor_key(&plain(KeyCode::BackTab)),
            (Key::Tab, Modifiers::SHIFT)
        );
        assert_eq!(
            editor_key(&press(KeyCode::Char('d'), KeyModifiers::CONTROL)),
            (Key::Enter, Modifiers::CTRL)
        );
        assert_eq!(
            editor_key(&press(KeyCode::Up, KeyModifiers::CONTROL)),
            (Key::Up, Modifiers::CTRL)
        );
        assert_eq!(editor_key(&plain(KeyCode::Char(' '))).0, Key::Space);
        assert_eq!(editor_key(&plain(KeyCode::F(2))).0, Key::Other);
    }

    #[test]
    fn typing_edits_focused_node() {
        let mut app = app_with(&["A"]);
        key(&mut app, plain(KeyCode::Char('b')));
        assert_eq!(app.mode, Mode::EditText);
        key(&mut app, plain(KeyCode::Char(' ')));
        key(&mut app, plain(KeyCode::Char('c')));
        key(&mut app, plain(KeyCode::Backspace));
        assert_eq!(app.focused_text(), Some("Ab "));
        assert_eq!(app.editor.outline().forest.to_tree()[0].text, "Ab ");
    }

    #[test]
    fn typing_during_pending_move_keeps_every_char() {
        let mut app = app_with(&["A", "B"]);
        let t0 = Instant::now();
        handle_key(&mut app, press(KeyCode::Down, KeyModifiers::CONTROL), t0);
        handle_key(&mut app, plain(KeyCode::Char('x')), t0 + Duration::from_millis(5));
        handle_key(&mut app, plain(KeyCode::Char('y')), t0 + Duration::from_millis(10));
        app.tick(t0 + Duration::from_millis(100));

        assert_eq!(texts(&app), vec!["B", "Axy"]);
        let tree = app.editor.outline().forest.to_tree();
        assert_eq!(tree[1].text, "Axy");
    }

    #[test]
    fn completing_last_node_leaves_one_to_type_into() {
        let mut app = app_with(&["A"]);
        key(&mut app, press(KeyCode::Char('d'), KeyModifiers::CONTROL));
        assert_eq!(texts(&app), vec![""]);
        assert!(app.screen.focus.is_some());

        key(&mut app, plain(KeyCode::Char('z')));
        assert_eq!(texts(&app), vec!["z"]);
        key(&mut app, plain(KeyCode::Enter));
        assert_eq!(texts(&app), vec!["z", ""]);
        assert_eq!(app.editor.outline().done, vec!["A".to_string()]);
    }

    #[test]
    fn enter_while_editing_adds_sibling() {
        let mut app = app_with(&["A"]);
        key(&mut app, plain(KeyCode::Char('!')));
        key(&mut app, plain(KeyCode::Enter));
        assert_eq!(app.mode, Mode::Navigate);
        assert_eq!(texts(&app), vec!["A!", ""]);
        assert_eq!(app.focused_text(), Some(""));

        key(&mut app, plain(KeyCode::Char('B')));
        assert_eq!(texts(&app), vec!["A!", "B"]);
    }

    #[test]
    fn tab_and_space_drive_structure() {
        let mut app = app_with(&["A", "B"]);
        key(&mut app, plain(KeyCode::Down));
        key(&mut app, plain(KeyCode::Tab));
        assert_eq!(app.screen.frame.rows[1].depth, 1);

        key(&mut app, plain(KeyCode::Up));
        key(&mut app, plain(KeyCode::Char(' ')));
        assert_eq!(texts(&app), vec!["A"]);
        assert!(app.screen.frame.rows[0].collapsed);
    }

    #[test]
    fn ctrl_d_completes() {
        let mut app = app_with(&["A", "B"]);
        key(&mut app, press(KeyCode::Char('d'), KeyModifiers::CONTROL));
        assert_eq!(texts(&app), vec!["B"]);
        assert_eq!(app.screen.frame.done, vec!["A".to_string()]);
        assert_eq!(app.focused_text(), Some("B"));
    }

    #[test]
    fn escape_deselects_then_arrows_refocus() {
        let mut app = app_with(&["A", "B"]);
        key(&mut app, plain(KeyCode::Esc));
        assert_eq!(app.screen.focus, None);
        // Typing with nothing focused does nothing
        key(&mut app, plain(KeyCode::Char('x')));
        assert_eq!(texts(&app), vec!["A", "B"]);

        key(&mut app, plain(KeyCode::Down));
        assert_eq!(app.screen.focus, Some(NodeId::from("a")));
    }

    #[test]
    fn note_panel_edits_note() {
        let mut app = app_with(&["A"]);
        key(&mut app, press(KeyCode::Char('o'), KeyModifiers::CONTROL));
        assert_eq!(app.mode, Mode::EditNote);
        key(&mut app, plain(KeyCode::Char('h')));
        key(&mut app, plain(KeyCode::Char('i')));
        key(&mut app, plain(KeyCode::Enter));
        assert_eq!(app.mode, Mode::Navigate);
        assert_eq!(app.editor.outline().note(&NodeId::from("a")), Some("hi"));
    }

    #[test]
    fn ctrl_q_quits() {
        let mut app = app_with(&["A"]);
        key(&mut app, press(KeyCode::Char('q'), KeyModifiers::CONTROL));
        assert!(app.should_quit);
    }

    fn app_on_screen() -> App {
        let mut app = app_with_state(
            vec![branch("Plan", false, vec![leaf("Draft")]), leaf("Ship")],
            &[],
        );
        app.outline_area = Rect::new(0, 0, 40, 10);
        app
    }

    #[test]
    fn hit_testing() {
        let app = app_on_screen();
        assert_eq!(
            row_at(&app, 5, 1),
            Some(RowHit {
                id: NodeId::from("draft"),
                on_marker: false
            })
        );
        assert_eq!(row_at(&app, 0, 0).map(|h| h.on_marker), Some(true));
        assert_eq!(row_at(&app, 0, 2).map(|h| h.on_marker), Some(false));
        assert_eq!(row_at(&app, 0, 3), None);
        assert_eq!(row_at(&app, 0, 20), None);
    }

    #[test]
    fn drag_row_onto_another() {
        let mut app = app_on_screen();
        let now = Instant::now();
        handle_mouse(&mut app, mouse(MouseEventKind::Down(MouseButton::Left), 4, 2), now);
        assert_eq!(app.editor.dragging(), Some(&NodeId::from("ship")));
        handle_mouse(&mut app, mouse(MouseEventKind::Up(MouseButton::Left), 4, 1), now);

        assert_eq!(texts(&app), vec!["Plan", "Draft", "Ship"]);
        assert_eq!(app.screen.frame.rows[2].depth, 2);
        assert_eq!(app.screen.focus, Some(NodeId::from("ship")));
    }

    #[test]
    fn click_focuses_and_marker_toggles() {
        let mut app = app_on_screen();
        let now = Instant::now();
        handle_mouse(&mut app, mouse(MouseEventKind::Down(MouseButton::Left), 6, 2), now);
        handle_mouse(&mut app, mouse(MouseEventKind::Up(MouseButton::Left), 6, 2), now);
        assert_eq!(app.editor.focus(), Some(&NodeId::from("ship")));

        handle_mouse(&mut app, mouse(MouseEventKind::Down(MouseButton::Left), 0, 0), now);
        assert_eq!(texts(&app), vec!["Plan", "Ship"]);
        assert_eq!(app.pressed, None);
    }
}
