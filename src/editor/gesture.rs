use crate::model::NodeId;

/// Keys the editor reacts to. Everything else is `Other`; typed text reaches
/// the editor as `Gesture::TextChanged` instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Enter,
    Tab,
    Space,
    Up,
    Down,
    Left,
    Right,
    Escape,
    Other,
}

/// Modifier keys held during a key press
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        ctrl: false,
        shift: false,
        alt: false,
    };
    pub const CTRL: Modifiers = Modifiers {
        ctrl: true,
        shift: false,
        alt: false,
    };
    pub const SHIFT: Modifiers = Modifiers {
        ctrl: false,
        shift: true,
        alt: false,
    };

    /// No modifiers held
    pub fn is_plain(self) -> bool {
        self == Modifiers::NONE
    }
}

/// Input events from the render surface
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Gesture {
    /// The text of a node was edited
    TextChanged { id: NodeId, text: String },
    /// A key was pressed while `id` had focus. `composing` is set while an
    /// input method is mid-composition.
    Key {
        id: NodeId,
        key: Key,
        mods: Modifiers,
        composing: bool,
    },
    /// The collapse button of a node was activated
    ToggleCollapse { id: NodeId },
    DragStart { id: NodeId },
    /// `dragged` was dropped onto `target`
    Drop { target: NodeId, dragged: NodeId },
    FocusGained { id: NodeId },
    FocusLost { id: NodeId },
    /// Open the detail panel (note editor) for a node
    ShowDetail { id: NodeId },
    /// The note of a node was edited in the detail panel
    NoteChanged { id: NodeId, text: String },
}

/// What a key press means, independent of which node it targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    NewSibling,
    Indent,
    Outdent,
    MoveUp,
    MoveDown,
    Complete,
    ToggleCollapse,
    Collapse,
    Expand,
    FocusPrev,
    FocusNext,
    Deselect,
}

impl Command {
    /// Resolve a key press to a command. `None` for keys with no structural
    /// meaning.
    pub fn from_key(key: Key, mods: Modifiers, composing: bool) -> Option<Command> {
        let ctrl_only = mods == Modifiers::CTRL;
        match key {
            Key::Enter if mods.ctrl => Some(Command::Complete),
            Key::Enter => Some(Command::NewSibling),
            Key::Tab if mods.shift => Some(Command::Outdent),
            Key::Tab => Some(Command::Indent),
            Key::Right if ctrl_only => Some(Command::Indent),
            Key::Left if ctrl_only => Some(Command::Outdent),
            Key::Up if ctrl_only => Some(Command::MoveUp),
            Key::Down if ctrl_only => Some(Command::MoveDown),
            Key::Space if mods.is_plain() => Some(Command::ToggleCollapse),
            Key::Left if mods.is_plain() => Some(Command::Collapse),
            Key::Right if mods.is_plain() => Some(Command::Expand),
            Key::Up if mods.is_plain() && !composing => Some(Command::FocusPrev),
            Key::Down if mods.is_plain() && !composing => Some(Command::FocusNext),
            Key::Escape => Some(Command::Deselect),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cmd(key: Key, mods: Modifiers) -> Option<Command> {
        Command::from_key(key, mods, false)
    }

    #[test]
    fn enter_variants() {
        assert_eq!(cmd(Key::Enter, Modifiers::NONE), Some(Command::NewSibling));
        assert_eq!(cmd(Key::Enter, Modifiers::SHIFT), Some(Command::NewSibling));
        assert_eq!(cmd(Key::Enter, Modifiers::CTRL), Some(Command::Complete));
    }

    #[test]
    fn indent_and_outdent_bindings() {
        assert_eq!(cmd(Key::Tab, Modifiers::NONE), Some(Command::Indent));
        assert_eq!(cmd(Key::Right, Modifiers::CTRL), Some(Command::Indent));
        assert_eq!(cmd(Key::Tab, Modifiers::SHIFT), Some(Command::Outdent));
        assert_eq!(cmd(Key::Left, Modifiers::CTRL), Some(Command::Outdent));
    }

    #[test]
    fn arrows_plain_and_ctrl() {
        assert_eq!(cmd(Key::Up, Modifiers::CTRL), Some(Command::MoveUp));
        assert_eq!(cmd(Key::Down, Modifiers::CTRL), Some(Command::MoveDown));
        assert_eq!(cmd(Key::Up, Modifiers::NONE), Some(Command::FocusPrev));
        assert_eq!(cmd(Key::Down, Modifiers::NONE), Some(Command::FocusNext));
        assert_eq!(cmd(Key::Left, Modifiers::NONE), Some(Command::Collapse));
        assert_eq!(cmd(Key::Right, Modifiers::NONE), Some(Command::Expand));
        assert_eq!(cmd(Key::Up, Modifiers::SHIFT), None);
    }

    #[test]
    fn navigation_is_ignored_while_composing() {
        assert_eq!(Command::from_key(Key::Down, Modifiers::NONE, true), None);
        assert_eq!(Command::from_key(Key::Up, Modifiers::NONE, true), None);
        // Structural keys still work
        assert_eq!(
            Command::from_key(Key::Tab, Modifiers::NONE, true),
            Some(Command::Indent)
        );
    }

    #[test]
    fn space_escape_and_others() {
        assert_eq!(cmd(Key::Space, Modifiers::NONE), Some(Command::ToggleCollapse));
        assert_eq!(cmd(Key::Space, Modifiers::CTRL), None);
        assert_eq!(cmd(Key::Space, Modifiers::SHIFT), None);
        let alt = Modifiers {
            alt: true,
            ..Modifiers::NONE
        };
        assert_eq!(cmd(Key::Space, alt), None);
        assert_eq!(cmd(Key::Escape, Modifiers::NONE), Some(Command::Deselect));
        assert_eq!(cmd(Key::Other, Modifiers::NONE), None);
    }
}
