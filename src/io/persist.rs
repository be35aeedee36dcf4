use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::io::store::{KvStore, StoreError};
use crate::model::{Node, Notes, Outline};

/// Error type for saving the outline
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("could not encode {slot}: {source}")]
    Encode {
        slot: String,
        source: serde_json::Error,
    },
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Names of the three store slots
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotKeys {
    pub forest: String,
    pub done: String,
    pub notes: String,
}

impl SlotKeys {
    pub fn with_prefix(prefix: &str) -> Self {
        SlotKeys {
            forest: format!("{}-forest", prefix),
            done: format!("{}-done", prefix),
            notes: format!("{}-notes", prefix),
        }
    }
}

impl Default for SlotKeys {
    fn default() -> Self {
        SlotKeys::with_prefix("outliner")
    }
}

/// The unit of persistence: always written in full
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedState {
    pub forest: Vec<Node>,
    pub done: Vec<String>,
    pub notes: Notes,
}

impl PersistedState {
    pub fn from_outline(outline: &Outline) -> Self {
        PersistedState {
            forest: outline.forest.to_tree(),
            done: outline.done.clone(),
            notes: outline.notes.clone(),
        }
    }

    pub fn into_outline(self) -> Outline {
        Outline::from_parts(self.forest, self.done, self.notes)
    }
}

/// Write all three slots. Every slot is attempted; the first failure is
/// returned.
pub fn save<S: KvStore + ?Sized>(
    store: &mut S,
    keys: &SlotKeys,
    state: &PersistedState,
) -> Result<(), PersistError> {
    let results = [
        write_slot(store, &keys.forest, &state.forest),
        write_slot(store, &keys.done, &state.done),
        write_slot(store, &keys.notes, &state.notes),
    ];
    results.into_iter().collect()
}

fn write_slot<S: KvStore + ?Sized, T: Serialize>(
    store: &mut S,
    key: &str,
    value: &T,
) -> Result<(), PersistError> {
    let bytes = serde_json::to_vec(value).map_err(|e| PersistError::Encode {
        slot: key.to_string(),
        source: e,
    })?;
    store.set(key, &bytes)?;
    Ok(())
}

/// Read all three slots independently. A missing slot or one that does not
/// parse falls back to that slot's empty default.
pub fn load<S: KvStore + ?Sized>(store: &S, keys: &SlotKeys) -> PersistedState {
    PersistedState {
        forest: read_slot(store, &keys.forest),
        done: read_slot(store, &keys.done),
        notes: read_slot(store, &keys.notes),
    }
}

fn read_slot<S: KvStore + ?Sized, T: DeserializeOwned + Default>(store: &S, key: &str) -> T {
    let Some(bytes) = store.get(key) else {
        return T::default();
    };
    match serde_json::from_slice(&bytes) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(slot = key, error = %e, "stored slot is corrupt, starting it empty");
            T::default()
        }
    }
}
