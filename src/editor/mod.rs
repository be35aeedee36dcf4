pub mod debounce;
pub mod gesture;
pub mod render;

use std::time::{Duration, Instant};

use tracing::{debug, info, trace};

use crate::io::persist::{self, PersistedState, SlotKeys};
use crate::io::store::KvStore;
use crate::model::{CompletePolicy, EditorConfig, NodeId, Outline};
use crate::ops::{tree_ops, visible};

pub use debounce::Debouncer;
pub use gesture::{Command, Gesture, Key, Modifiers};
pub use render::{DetailPanel, RenderFrame, RenderSurface};

/// A keystroke waiting for its burst to settle
#[derive(Debug, Clone, PartialEq, Eq)]
struct PendingKey {
    id: NodeId,
    command: Command,
}

/// What a handled gesture requires of the editor afterwards
#[derive(Debug, Clone, PartialEq, Eq)]
enum Effect {
    Nothing,
    /// Content changed in place; the surface already shows it
    Saved,
    /// Focus or panels changed, nothing to persist
    Rendered(Option<NodeId>),
    /// Structure changed: save, re-render, move focus
    Mutated(Option<NodeId>),
}

/// The command dispatcher. Owns the outline and the store it is saved to.
///
/// Lifecycle: `open` loads from the store, gestures mutate and save
/// synchronously, `close` applies any pending keystroke and hands the store
/// back.
pub struct Editor<S: KvStore> {
    outline: Outline,
    store: S,
    slots: SlotKeys,
    policy: CompletePolicy,
    focus: Option<NodeId>,
    dragging: Option<NodeId>,
    detail: Option<NodeId>,
    pending: Debouncer<PendingKey>,
}

impl<S: KvStore> Editor<S> {
    pub fn open(store: S, slots: SlotKeys, config: &EditorConfig) -> Self {
        let outline = persist::load(&store, &slots).into_outline();
        info!(
            nodes = outline.forest.len(),
            done = outline.done.len(),
            "outline loaded"
        );
        Editor {
            outline,
            store,
            slots,
            policy: config.complete,
            focus: None,
            dragging: None,
            detail: None,
            pending: Debouncer::new(Duration::from_millis(config.debounce_ms)),
        }
    }

    /// Apply any pending keystroke and release the store
    pub fn close(mut self, surface: &mut dyn RenderSurface) -> S {
        self.flush(surface);
        self.store
    }

    pub fn outline(&self) -> &Outline {
        &self.outline
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn focus(&self) -> Option<&NodeId> {
        self.focus.as_ref()
    }

    pub fn dragging(&self) -> Option<&NodeId> {
        self.dragging.as_ref()
    }

    /// When the pending keystroke will fire, if there is one
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.deadline()
    }

    /// Snapshot of everything a surface draws
    pub fn frame(&self) -> RenderFrame {
        let detail = self.detail.as_ref().and_then(|id| {
            self.outline.forest.contains(id).then(|| DetailPanel {
                id: id.clone(),
                note: self.outline.note(id).unwrap_or_default().to_string(),
            })
        });
        RenderFrame {
            rows: visible::visible_rows(&self.outline.forest),
            done: self.outline.done.clone(),
            focus: self.focus.clone(),
            detail,
        }
    }

    /// Feed one gesture from the surface.
    ///
    /// Keys are queued behind the debouncer and only run from `tick`/`flush`.
    /// Any other gesture ends the current burst: the pending key runs first,
    /// then the gesture itself.
    pub fn handle(&mut self, gesture: Gesture, now: Instant, surface: &mut dyn RenderSurface) {
        if let Gesture::Key {
            id,
            key,
            mods,
            composing,
        } = gesture
        {
            let Some(command) = Command::from_key(key, mods, composing) else {
                return;
            };
            if let Some(dropped) = self.pending.arm(now, PendingKey { id, command }) {
                trace!(command = ?dropped.command, "keystroke superseded within burst");
            }
            return;
        }

        self.flush(surface);
        let effect = self.apply(gesture);
        self.finish(effect, surface);
    }

    /// Run the pending keystroke if its burst has settled
    pub fn tick(&mut self, now: Instant, surface: &mut dyn RenderSurface) {
        if let Some(key) = self.pending.fire(now) {
            let effect = self.run(key);
            self.finish(effect, surface);
        }
    }

    /// Run the pending keystroke now
    pub fn flush(&mut self, surface: &mut dyn RenderSurface) {
        if let Some(key) = self.pending.flush() {
            let effect = self.run(key);
            self.finish(effect, surface);
        }
    }

    fn run(&mut self, key: PendingKey) -> Effect {
        let PendingKey { id, command } = key;
        let result = match command {
            Command::NewSibling => tree_ops::add_sibling_after(&mut self.outline.forest, &id).map(Some),
            Command::Indent => tree_ops::indent(&mut self.outline.forest, &id).map(|_| Some(id.clone())),
            Command::Outdent => tree_ops::outdent(&mut self.outline.forest, &id).map(|_| Some(id.clone())),
            Command::MoveUp => tree_ops::move_up(&mut self.outline.forest, &id).map(|_| Some(id.clone())),
            Command::MoveDown => tree_ops::move_down(&mut self.outline.forest, &id).map(|_| Some(id.clone())),
            Command::ToggleCollapse => {
                tree_ops::toggle_collapsed(&mut self.outline.forest, &id).map(|_| Some(id.clone()))
            }
            Command::Collapse => {
                tree_ops::set_collapsed(&mut self.outline.forest, &id, true).map(|_| Some(id.clone()))
            }
            Command::Expand => {
                tree_ops::set_collapsed(&mut self.outline.forest, &id, false).map(|_| Some(id.clone()))
            }
            Command::Complete => {
                let next = self.focus_after_removal(&id);
                tree_ops::complete(&mut self.outline, &id, self.policy).map(|texts| {
                    debug!(count = texts.len(), "moved to done list");
                    // The last node went: start over from a fresh empty one
                    self.outline.ensure_seed().or(next)
                })
            }
            Command::FocusPrev | Command::FocusNext => {
                let offset = if command == Command::FocusPrev { -1 } else { 1 };
                return match visible::neighbour(&self.outline.forest, &id, offset) {
                    Some(target) => Effect::Rendered(Some(target)),
                    None => Effect::Nothing,
                };
            }
            Command::Deselect => {
                self.detail = None;
                return Effect::Rendered(None);
            }
        };

        match result {
            Ok(focus) => {
                debug!(?command, node = %id, "command applied");
                Effect::Mutated(focus)
            }
            Err(e) => {
                debug!(?command, node = %id, reason = %e, "command skipped");
                Effect::Nothing
            }
        }
    }

    fn apply(&mut self, gesture: Gesture) -> Effect {
        match gesture {
            // Queued by `handle`, never applied directly
            Gesture::Key { .. } => Effect::Nothing,
            Gesture::TextChanged { id, text } => {
                match tree_ops::set_text(&mut self.outline.forest, &id, text) {
                    Ok(()) => Effect::Saved,
                    Err(e) => skipped("text change", e),
                }
            }
            Gesture::NoteChanged { id, text } => match tree_ops::set_note(&mut self.outline, &id, text) {
                Ok(()) => Effect::Saved,
                Err(e) => skipped("note change", e),
            },
            Gesture::ToggleCollapse { id } => {
                match tree_ops::toggle_collapsed(&mut self.outline.forest, &id) {
                    Ok(_) => Effect::Mutated(Some(id)),
                    Err(e) => skipped("toggle", e),
                }
            }
            Gesture::DragStart { id } => {
                if self.outline.forest.contains(&id) {
                    self.dragging = Some(id);
                }
                Effect::Nothing
            }
            Gesture::Drop { target, dragged } => {
                self.dragging = None;
                match tree_ops::reparent(&mut self.outline.forest, &dragged, &target) {
                    Ok(()) => Effect::Mutated(Some(dragged)),
                    Err(e) => skipped("drop", e),
                }
            }
            Gesture::FocusGained { id } => {
                if self.outline.forest.contains(&id) {
                    self.focus = Some(id);
                }
                Effect::Nothing
            }
            Gesture::FocusLost { id } => {
                if self.focus.as_ref() == Some(&id) {
                    self.focus = None;
                }
                Effect::Nothing
            }
            Gesture::ShowDetail { id } => {
                if !self.outline.forest.contains(&id) {
                    return Effect::Nothing;
                }
                self.detail = Some(id.clone());
                Effect::Rendered(Some(id))
            }
        }
    }

    fn finish(&mut self, effect: Effect, surface: &mut dyn RenderSurface) {
        match effect {
            Effect::Nothing => {}
            Effect::Saved => self.save(),
            Effect::Rendered(focus) => {
                self.focus = focus;
                self.present(surface);
            }
            Effect::Mutated(focus) => {
                self.focus = focus;
                if self
                    .detail
                    .as_ref()
                    .is_some_and(|id| !self.outline.forest.contains(id))
                {
                    self.detail = None;
                }
                self.save();
                self.present(surface);
            }
        }
    }

    fn present(&self, surface: &mut dyn RenderSurface) {
        surface.render(&self.frame());
        if let Some(id) = &self.focus {
            surface.focus(id);
        }
    }

    fn save(&mut self) {
        let state = PersistedState::from_outline(&self.outline);
        if let Err(e) = persist::save(&mut self.store, &self.slots, &state) {
            tracing::error!(error = %e, "could not save outline");
        }
    }

    /// Where focus goes when `id` disappears: the row above it, else the
    /// first row below its subtree.
    fn focus_after_removal(&self, id: &NodeId) -> Option<NodeId> {
        let forest = &self.outline.forest;
        let visible = visible::list_visible(forest);
        let pos = visible.iter().position(|v| v == id)?;
        if pos > 0 {
            return Some(visible[pos - 1].clone());
        }
        visible[pos + 1..]
            .iter()
            .find(|v| !forest.is_ancestor(id, v))
            .cloned()
    }
}

fn skipped(what: &str, e: tree_ops::EditError) -> Effect {
    debug!(reason = %e, "{} skipped", what);
    Effect::Nothing
}
