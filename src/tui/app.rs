use std::fs::{self, OpenOptions};
use std::io;
use std::path::Path;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crossterm::event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::Rect;
use tracing_subscriber::EnvFilter;

use crate::editor::{Editor, Gesture, RenderFrame, RenderSurface};
use crate::io::config_io::read_config;
use crate::io::persist::SlotKeys;
use crate::io::store::{FileStore, KvStore, MemoryStore};
use crate::model::{NodeId, OutlinerConfig};
use crate::timer::{AlertSink, PolledScheduler, SessionTimer};

use super::input;
use super::render;
use super::theme::Theme;

/// Longest the event loop sleeps without a pending deadline
const IDLE_POLL: Duration = Duration::from_millis(250);

pub const LOG_FILE: &str = "outliner.log";

/// Current interaction mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Navigate,
    /// Typing into the focused node
    EditText,
    /// Typing into the note of the node shown in the detail panel
    EditNote,
}

/// What the terminal currently shows. The editor pushes frames and focus
/// directives here; typed text is applied locally first, as any text
/// surface would.
#[derive(Debug, Default)]
pub struct Screen {
    pub frame: RenderFrame,
    pub focus: Option<NodeId>,
}

impl RenderSurface for Screen {
    fn render(&mut self, frame: &RenderFrame) {
        self.frame = frame.clone();
        self.focus = frame.focus.clone();
    }

    fn focus(&mut self, id: &NodeId) {
        self.focus = Some(id.clone());
    }
}

/// Alerts show up in the status row. A terminal needs no user prompt, so
/// asking for permission grants it.
#[derive(Debug, Default)]
pub struct StatusAlerts {
    pub granted: bool,
    pub message: Option<String>,
}

impl AlertSink for StatusAlerts {
    fn permitted(&self) -> bool {
        self.granted
    }

    fn request_permission(&mut self) {
        self.granted = true;
    }

    fn alert(&mut self, title: &str, body: &str) {
        self.message = Some(format!("{} {}", title, body));
    }
}

/// Main application state
pub struct App {
    pub editor: Editor<Box<dyn KvStore>>,
    pub screen: Screen,
    pub mode: Mode,
    pub theme: Theme,
    pub should_quit: bool,
    pub scheduler: PolledScheduler,
    pub alerts: StatusAlerts,
    pub session: Option<SessionTimer>,
    pub session_minutes: u64,
    /// Outline area from the last draw, for mouse hit testing
    pub outline_area: Rect,
    /// First outline row on screen
    pub scroll_offset: usize,
    /// Row under the mouse button since it went down
    pub pressed: Option<NodeId>,
}

impl App {
    pub fn new(store: Box<dyn KvStore>, config: &OutlinerConfig, now: Instant) -> Self {
        let editor = Editor::open(
            store,
            SlotKeys::with_prefix(&config.store.key_prefix),
            &config.editor,
        );
        let mut app = App {
            screen: Screen {
                frame: editor.frame(),
                focus: None,
            },
            editor,
            mode: Mode::Navigate,
            theme: Theme::default(),
            should_quit: false,
            scheduler: PolledScheduler::new(now),
            alerts: StatusAlerts::default(),
            session: None,
            session_minutes: config.session.minutes,
            outline_area: Rect::default(),
            scroll_offset: 0,
            pressed: None,
        };
        if let Some(first) = app.screen.frame.rows.first().map(|r| r.id.clone()) {
            app.set_focus(first, now);
        }
        app
    }

    pub fn send(&mut self, gesture: Gesture, now: Instant) {
        self.editor.handle(gesture, now, &mut self.screen);
    }

    /// Move focus to `id`, telling the editor which row lost it
    pub fn set_focus(&mut self, id: NodeId, now: Instant) {
        if let Some(old) = self.screen.focus.take() {
            if old == id {
                self.screen.focus = Some(old);
                return;
            }
            self.send(Gesture::FocusLost { id: old }, now);
        }
        self.screen.focus = Some(id.clone());
        self.send(Gesture::FocusGained { id }, now);
    }

    pub fn focused_text(&self) -> Option<&str> {
        let focus = self.screen.focus.as_ref()?;
        self.screen
            .frame
            .rows
            .iter()
            .find(|r| &r.id == focus)
            .map(|r| r.text.as_str())
    }

    /// Apply `edit` to the focused node's text and report the change. A
    /// pending keystroke runs first so the edit lands on the settled frame.
    pub fn edit_text(&mut self, now: Instant, edit: impl FnOnce(&mut String)) {
        self.editor.flush(&mut self.screen);
        let Some(focus) = self.screen.focus.clone() else {
            return;
        };
        let Some(row) = self.screen.frame.rows.iter_mut().find(|r| r.id == focus) else {
            return;
        };
        edit(&mut row.text);
        let text = row.text.clone();
        self.send(Gesture::TextChanged { id: focus, text }, now);
    }

    /// Apply `edit` to the note in the detail panel and report the change
    pub fn edit_note(&mut self, now: Instant, edit: impl FnOnce(&mut String)) {
        self.editor.flush(&mut self.screen);
        let Some(detail) = self.screen.frame.detail.as_mut() else {
            return;
        };
        edit(&mut detail.note);
        let gesture = Gesture::NoteChanged {
            id: detail.id.clone(),
            text: detail.note.clone(),
        };
        self.send(gesture, now);
    }

    /// Drive the debouncer and the session timer
    pub fn tick(&mut self, now: Instant) {
        self.editor.tick(now, &mut self.screen);
        self.scheduler.poll(now, &mut self.alerts);
    }

    /// How long the event loop may block before something is due
    pub fn poll_timeout(&self, now: Instant) -> Duration {
        [self.editor.next_deadline(), self.scheduler.next_deadline()]
            .into_iter()
            .flatten()
            .map(|at| at.saturating_duration_since(now))
            .fold(IDLE_POLL, Duration::min)
    }

    pub fn start_session(&mut self, now: Instant) {
        self.scheduler.poll(now, &mut self.alerts);
        self.alerts.message = None;
        self.session = Some(SessionTimer::start(
            self.session_minutes,
            &mut self.scheduler,
            &mut self.alerts,
        ));
    }

    /// Apply any pending keystroke and stop the loop
    pub fn quit(&mut self) {
        self.editor.flush(&mut self.screen);
        self.should_quit = true;
    }
}

/// Send tracing output to a file; the terminal belongs to the UI.
/// Level comes from `OUTLINER_LOG`, default `warn`.
fn init_logging(dir: &Path) {
    let filter = EnvFilter::try_from_env("OUTLINER_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    let file = match OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join(LOG_FILE))
    {
        Ok(f) => f,
        Err(_) => return,
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init();
}

/// Open the configured store, or keep the outline in memory if the data
/// directory is unusable.
fn open_store(config: &OutlinerConfig) -> Box<dyn KvStore> {
    match FileStore::open(Path::new(&config.store.dir)) {
        Ok(store) => Box::new(store),
        Err(e) => {
            tracing::error!(error = %e, "falling back to an in-memory store");
            Box::new(MemoryStore::new())
        }
    }
}

/// Run the TUI application
pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cwd = std::env::current_dir()?;
    let config = read_config(&cwd)?;
    if fs::create_dir_all(&config.store.dir).is_ok() {
        init_logging(Path::new(&config.store.dir));
    }

    let mut app = App::new(open_store(&config), &config, Instant::now());

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    // Restore the terminal on panic
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), DisableMouseCapture, LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    let result = run_event_loop(&mut terminal, &mut app);

    // Nothing typed in the last debounce window is lost
    app.editor.flush(&mut app.screen);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        DisableMouseCapture,
        LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;

    result
}

fn run_event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        terminal.draw(|frame| render::render(frame, app, Instant::now()))?;

        if event::poll(app.poll_timeout(Instant::now()))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    input::handle_key(app, key, Instant::now());
                }
                Event::Mouse(mouse) => input::handle_mouse(app, mouse, Instant::now()),
                _ => {}
            }
        }
        app.tick(Instant::now());

        if app.should_quit {
            break;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::persist;
    use crate::tui::test_helpers::app_with;

    #[test]
    fn starts_focused_on_first_row() {
        let app = app_with(&["A", "B"]);
        assert_eq!(app.screen.focus, Some(NodeId::from("a")));
        assert_eq!(app.editor.focus(), Some(&NodeId::from("a")));
        assert_eq!(app.focused_text(), Some("A"));
    }

    #[test]
    fn focus_moves_between_rows() {
        let mut app = app_with(&["A", "B"]);
        app.set_focus(NodeId::from("b"), Instant::now());
        assert_eq!(app.editor.focus(), Some(&NodeId::from("b")));
        assert_eq!(app.focused_text(), Some("B"));
    }

    #[test]
    fn text_edits_reach_the_store() {
        let mut app = app_with(&["A"]);
        app.edit_text(Instant::now(), |t| t.push_str("lpha"));
        assert_eq!(app.focused_text(), Some("Alpha"));
        let stored = persist::load(app.editor.store(), &SlotKeys::default());
        assert_eq!(stored.forest[0].text, "Alpha");
    }

    #[test]
    fn poll_timeout_follows_pending_key() {
        let now = Instant::now();
        let mut app = app_with(&["A"]);
        assert_eq!(app.poll_timeout(now), IDLE_POLL);
        app.send(
            Gesture::Key {
                id: NodeId::from("a"),
                key: crate::editor::Key::Enter,
                mods: crate::editor::Modifiers::NONE,
                composing: false,
            },
            now,
        );
        assert_eq!(app.poll_timeout(now), Duration::from_millis(30));
        app.tick(now + Duration::from_millis(30));
        assert_eq!(app.screen.frame.rows.len(), 2);
    }

    #[test]
    fn session_alert_lands_in_status() {
        let now = Instant::now();
        let mut app = app_with(&["A"]);
        app.start_session(now);
        assert!(app.alerts.granted);
        app.tick(now + Duration::from_secs(25 * 60));
        assert_eq!(
            app.alerts.message.as_deref(),
            Some("Time's up! Extend your session for another 25 minutes?")
        );
    }

    #[test]
    fn quit_flushes_pending_key() {
        let now = Instant::now();
        let mut app = app_with(&["A"]);
        app.send(
            Gesture::Key {
                id: NodeId::from("a"),
                key: crate::editor::Key::Enter,
                mods: crate::editor::Modifiers::NONE,
                composing: false,
            },
            now,
        );
        app.quit();
        assert!(app.should_quit);
        assert_eq!(app.editor.outline().forest.len(), 2);
    }
}
