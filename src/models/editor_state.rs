use crate::models::{FileConfig, OptionRegistry, ParsedValue};
use serde::{Deserialize, Serialize};

/// A named snapshot of the modified options.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub name: String,
    pub config: FileConfig,

    /// Unix timestamps in milliseconds
    pub created_at: u64,
    pub updated_at: u64,
}

/// Editor state persisted between sessions.
///
/// `config` holds only options whose value differs from the registry default,
/// plus any keys the registry does not know. Everything else reads through to
/// the default.
///
/// # Thread Safety
///
/// Wrapped in `Arc<RwLock<EditorState>>` by [`crate::state::ConfigStore`]; use the
/// store's methods rather than mutating a shared instance.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorState {
    pub config: FileConfig,
    pub profiles: Vec<Profile>,
    pub active_profile_id: Option<String>,
}

impl EditorState {
    /// Modified value, or the registry default for known keys.
    pub fn value(&self, key: &str, registry: &OptionRegistry) -> Option<ParsedValue> {
        self.config
            .get(key)
            .or_else(|| registry.default_value(key))
            .cloned()
    }

    pub fn is_modified(&self, key: &str) -> bool {
        self.config.contains_key(key)
    }

    pub fn modified_count(&self) -> usize {
        self.config.len()
    }

    pub fn profile(&self, id: &str) -> Option<&Profile> {
        self.profiles.iter().find(|profile| profile.id == id)
    }

    pub fn profile_mut(&mut self, id: &str) -> Option<&mut Profile> {
        self.profiles.iter_mut().find(|profile| profile.id == id)
    }

    pub fn active_profile(&self) -> Option<&Profile> {
        self.active_profile_id
            .as_deref()
            .and_then(|id| self.profile(id))
    }

    /// First unused `profile-<n>` id.
    pub fn next_profile_id(&self) -> String {
        (1..)
            .map(|n| format!("profile-{n}"))
            .find(|id| self.profile(id).is_none())
            .unwrap_or_default()
    }

    /// Store `value` for `key`, dropping the entry when it equals the default.
    ///
    /// Returns whether the stored config changed.
    pub fn set_value(&mut self, key: &str, value: ParsedValue, registry: &OptionRegistry) -> bool {
        let is_default = registry
            .default_value(key)
            .is_some_and(|default| default.canonical() == value.canonical());

        if is_default {
            return self.config.shift_remove(key).is_some();
        }
        let previous = self.config.insert(key.to_string(), value.clone());
        previous.as_ref() != Some(&value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_falls_back_to_default() {
        let registry = OptionRegistry::builtin();
        let state = EditorState::default();
        assert_eq!(
            state.value("font_size", registry),
            registry.default_value("font_size").cloned()
        );
        assert_eq!(state.value("not_an_option", registry), None);
    }

    #[test]
    fn test_set_default_value_removes_entry() {
        let registry = OptionRegistry::builtin();
        let mut state = EditorState::default();
        let default = registry.default_value("font_size").cloned().unwrap();

        assert!(state.set_value("font_size", ParsedValue::Number(99.0), registry));
        assert!(state.is_modified("font_size"));
        assert!(state.set_value("font_size", default, registry));
        assert!(!state.is_modified("font_size"));
    }

    #[test]
    fn test_setting_same_value_twice_reports_no_change() {
        let registry = OptionRegistry::builtin();
        let mut state = EditorState::default();
        assert!(state.set_value("term", "xterm".into(), registry));
        assert!(!state.set_value("term", "xterm".into(), registry));
    }

    #[test]
    fn test_next_profile_id_skips_taken() {
        let mut state = EditorState::default();
        assert_eq!(state.next_profile_id(), "profile-1");
        state.profiles.push(Profile {
            id: "profile-1".into(),
            name: "Work".into(),
            config: FileConfig::new(),
            created_at: 0,
            updated_at: 0,
        });
        assert_eq!(state.next_profile_id(), "profile-2");
    }
}
