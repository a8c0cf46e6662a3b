// State management module
//
// This module provides the ConfigStore which wraps EditorState with thread-safe access
// using Arc<RwLock<T>> and emits change events to subscribers.

use crate::models::{EditorState, FileConfig, OptionRegistry, ParsedValue, Profile};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::broadcast;

/// Change events emitted when the store is modified
#[derive(Clone, Debug, PartialEq)]
pub enum StoreChange {
    /// The set of modified options changed
    ConfigChanged { modified: usize },

    /// A batch of values was imported
    ConfigImported { changed: usize },

    /// All modifications were discarded
    ConfigReset,

    /// A profile was added, removed, renamed or saved
    ProfilesChanged { count: usize },

    /// The active profile changed
    ActiveProfileChanged { id: Option<String> },
}

/// Receiver for imported configuration values.
///
/// The import pipeline only needs this capability; [`ConfigStore`] implements it.
#[cfg_attr(test, mockall::automock)]
pub trait ConfigSink: Send + Sync {
    /// Apply imported values and return how many stored keys changed.
    fn import_config(&self, values: &FileConfig) -> usize;
}

/// Thread-safe editor state with event emission
///
/// - Shares [`EditorState`] behind `Arc<RwLock<T>>` (cloning the store shares it)
/// - Keeps only non-default values, judged against the [`OptionRegistry`]
/// - Broadcasts [`StoreChange`] events through a tokio channel
///
/// # Related Types
///
/// - [`crate::models::EditorState`]: The underlying state structure
/// - [`crate::config::ConfigManager`]: Persists snapshots as YAML
/// - [`crate::services::ImportService`]: Feeds merged imports through [`ConfigSink`]
#[derive(Clone)]
pub struct ConfigStore {
    state: Arc<RwLock<EditorState>>,
    registry: &'static OptionRegistry,
    change_tx: broadcast::Sender<StoreChange>,
}

impl ConfigStore {
    /// Create an empty store backed by the built-in option catalog
    pub fn new() -> Self {
        Self::from_state(EditorState::default())
    }

    /// Create a store from previously persisted state
    pub fn from_state(state: EditorState) -> Self {
        Self::with_registry(state, OptionRegistry::builtin())
    }

    pub fn with_registry(state: EditorState, registry: &'static OptionRegistry) -> Self {
        let (change_tx, _) = broadcast::channel(100);
        Self {
            state: Arc::new(RwLock::new(state)),
            registry,
            change_tx,
        }
    }

    pub fn registry(&self) -> &'static OptionRegistry {
        self.registry
    }

    fn read_guard(&self) -> RwLockReadGuard<'_, EditorState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_guard(&self) -> RwLockWriteGuard<'_, EditorState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Clone of the current state, safe to hold without locks
    pub fn snapshot(&self) -> EditorState {
        self.read_guard().clone()
    }

    /// Execute a function with read access to the state
    pub fn read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&EditorState) -> R,
    {
        f(&self.read_guard())
    }

    /// Mutate the state and emit events for whatever changed
    ///
    /// # Returns
    /// The StoreChange events that were emitted
    pub fn update<F>(&self, update_fn: F) -> Vec<StoreChange>
    where
        F: FnOnce(&mut EditorState),
    {
        self.update_with(update_fn).1
    }

    /// Like [`update()`](Self::update), also returning the closure's result
    pub fn update_with<F, R>(&self, update_fn: F) -> (R, Vec<StoreChange>)
    where
        F: FnOnce(&mut EditorState) -> R,
    {
        let mut state = self.write_guard();
        let old_state = state.clone();

        let result = update_fn(&mut state);

        let changes = detect_changes(&old_state, &state);
        drop(state);

        for change in &changes {
            // No subscribers is fine
            let _ = self.change_tx.send(change.clone());
        }

        (result, changes)
    }

    /// Subscribe to store change events
    pub fn subscribe(&self) -> broadcast::Receiver<StoreChange> {
        self.change_tx.subscribe()
    }

    fn emit(&self, changes: &mut Vec<StoreChange>, event: StoreChange) {
        let _ = self.change_tx.send(event.clone());
        changes.push(event);
    }

    /// Modified value or the registry default
    pub fn value(&self, key: &str) -> Option<ParsedValue> {
        self.read(|state| state.value(key, self.registry))
    }

    pub fn is_modified(&self, key: &str) -> bool {
        self.read(|state| state.is_modified(key))
    }

    pub fn modified_count(&self) -> usize {
        self.read(EditorState::modified_count)
    }

    pub fn set_value(&self, key: &str, value: ParsedValue) -> Vec<StoreChange> {
        self.update(|state| {
            state.set_value(key, value, self.registry);
        })
    }

    pub fn reset_value(&self, key: &str) -> Vec<StoreChange> {
        self.update(|state| {
            state.config.shift_remove(key);
        })
    }

    pub fn reset_all(&self) -> Vec<StoreChange> {
        let mut changes = self.update(|state| state.config.clear());
        self.emit(&mut changes, StoreChange::ConfigReset);
        changes
    }

    /// Apply imported values on top of the current modifications
    ///
    /// Known options are stored only when they differ from their default, so
    /// importing a default never marks an option as modified. Keys the registry
    /// does not know are stored as given.
    pub fn import_values(&self, values: &FileConfig) -> (usize, Vec<StoreChange>) {
        let (changed, mut changes) = self.update_with(|state| {
            let mut changed = 0;
            for (key, value) in values {
                let is_default = self
                    .registry
                    .default_value(key)
                    .is_some_and(|default| default.canonical() == value.canonical());
                if is_default {
                    continue;
                }
                if state.config.insert(key.clone(), value.clone()).as_ref() != Some(value) {
                    changed += 1;
                }
            }
            changed
        });

        tracing::info!("Imported {} values ({} changed)", values.len(), changed);
        self.emit(&mut changes, StoreChange::ConfigImported { changed });
        (changed, changes)
    }

    /// Every known option with its effective value, followed by unknown keys
    pub fn export_config(&self) -> FileConfig {
        self.read(|state| {
            let mut full = self.registry.defaults();
            for (key, value) in &state.config {
                full.insert(key.clone(), value.clone());
            }
            full
        })
    }

    /// Snapshot the current modifications into a new, active profile
    pub fn create_profile(&self, name: &str) -> Profile {
        let now = now_millis();
        let (profile, _) = self.update_with(|state| {
            let profile = Profile {
                id: state.next_profile_id(),
                name: name.to_string(),
                config: state.config.clone(),
                created_at: now,
                updated_at: now,
            };
            state.active_profile_id = Some(profile.id.clone());
            state.profiles.push(profile.clone());
            profile
        });

        tracing::info!("Created profile {} ({})", profile.name, profile.id);
        profile
    }

    /// Overwrite a profile with the current modifications
    pub fn save_profile(&self, id: &str) -> Vec<StoreChange> {
        let now = now_millis();
        self.update(|state| {
            let config = state.config.clone();
            if let Some(profile) = state.profile_mut(id) {
                profile.config = config;
                profile.updated_at = now;
            }
        })
    }

    /// Load a profile's values and make it active
    ///
    /// Returns no events for an unknown id.
    pub fn switch_profile(&self, id: &str) -> Vec<StoreChange> {
        self.update(|state| {
            if let Some(config) = state.profile(id).map(|profile| profile.config.clone()) {
                state.config = config;
                state.active_profile_id = Some(id.to_string());
            }
        })
    }

    pub fn delete_profile(&self, id: &str) -> Vec<StoreChange> {
        self.update(|state| {
            state.profiles.retain(|profile| profile.id != id);
            if state.active_profile_id.as_deref() == Some(id) {
                state.active_profile_id = None;
            }
        })
    }

    pub fn rename_profile(&self, id: &str, name: &str) -> Vec<StoreChange> {
        let now = now_millis();
        self.update(|state| {
            if let Some(profile) = state.profile_mut(id) {
                profile.name = name.to_string();
                profile.updated_at = now;
            }
        })
    }

    /// Copy a profile under a new name without activating it
    pub fn duplicate_profile(&self, id: &str, new_name: &str) -> Option<Profile> {
        let now = now_millis();
        let (duplicated, _) = self.update_with(|state| {
            let profile = Profile {
                id: state.next_profile_id(),
                name: new_name.to_string(),
                config: state.profile(id)?.config.clone(),
                created_at: now,
                updated_at: now,
            };
            state.profiles.push(profile.clone());
            Some(profile)
        });
        duplicated
    }

    pub fn active_profile(&self) -> Option<Profile> {
        self.read(|state| state.active_profile().cloned())
    }
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigSink for ConfigStore {
    fn import_config(&self, values: &FileConfig) -> usize {
        self.import_values(values).0
    }
}

/// Detect what changed between two states and generate events
fn detect_changes(old: &EditorState, new: &EditorState) -> Vec<StoreChange> {
    let mut changes = Vec::new();

    if old.config != new.config {
        changes.push(StoreChange::ConfigChanged {
            modified: new.config.len(),
        });
    }

    if old.profiles != new.profiles {
        changes.push(StoreChange::ProfilesChanged {
            count: new.profiles.len(),
        });
    }

    if old.active_profile_id != new.active_profile_id {
        changes.push(StoreChange::ActiveProfileChanged {
            id: new.active_profile_id.clone(),
        });
    }

    changes
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or_default()
}
