use serde::{Deserialize, Serialize};

/// Configuration from outliner.toml
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutlinerConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub editor: EditorConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Directory holding one file per store slot
    #[serde(default = "default_store_dir")]
    pub dir: String,
    /// Slot names are `<prefix>-forest`, `<prefix>-done`, `<prefix>-notes`
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            dir: default_store_dir(),
            key_prefix: default_key_prefix(),
        }
    }
}

fn default_store_dir() -> String {
    ".outliner".to_string()
}

fn default_key_prefix() -> String {
    "outliner".to_string()
}

/// What happens to a node's children when the node is completed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompletePolicy {
    /// The node's text and then every descendant's text go to the done list
    #[default]
    Cascade,
    /// Only the node's own text is kept; the subtree is dropped
    Discard,
    /// Nodes with children cannot be completed
    Block,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditorConfig {
    /// Keystroke coalescing window in milliseconds
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    #[serde(default)]
    pub complete: CompletePolicy,
}

impl Default for EditorConfig {
    fn default() -> Self {
        EditorConfig {
            debounce_ms: default_debounce_ms(),
            complete: CompletePolicy::default(),
        }
    }
}

fn default_debounce_ms() -> u64 {
    30
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Length of a focus session in minutes
    #[serde(default = "default_session_minutes")]
    pub minutes: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            minutes: default_session_minutes(),
        }
    }
}

fn default_session_minutes() -> u64 {
    25
}
