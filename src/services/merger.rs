use crate::models::{Conflict, FileConfig, MergedConfig, OptionRegistry, ParsedValue, SourcedValue};
use indexmap::IndexMap;
use std::collections::HashSet;

/// Combine per-file configurations into one.
///
/// Files are applied entry first, then in resolved order. The first file to set
/// a key wins, except for list options (`keys`, `launch_menu`), whose values are
/// concatenated in file order. Keys set to different values by several files
/// are reported as conflicts without affecting the result.
pub fn merge(
    parsed_per_file: &IndexMap<String, FileConfig>,
    entry_path: Option<&str>,
    resolved: &[String],
    registry: &OptionRegistry,
) -> MergedConfig {
    let mut merged = MergedConfig::default();
    let mut history: IndexMap<&str, Vec<SourcedValue>> = IndexMap::new();

    for path in merge_order(entry_path, resolved) {
        let Some(file) = parsed_per_file.get(path) else {
            continue;
        };

        for (key, value) in file {
            history.entry(key.as_str()).or_default().push(SourcedValue {
                path: path.to_string(),
                value: value.clone(),
            });

            if registry.is_list(key)
                && let ParsedValue::List(items) = value
            {
                match merged.config.get_mut(key) {
                    Some(ParsedValue::List(existing)) => {
                        existing.extend(items.iter().cloned());
                        merged.sources.insert(key.clone(), path.to_string());
                    }
                    Some(_) => {}
                    None => {
                        merged.config.insert(key.clone(), value.clone());
                        merged.sources.insert(key.clone(), path.to_string());
                    }
                }
                continue;
            }

            if !merged.config.contains_key(key) {
                merged.config.insert(key.clone(), value.clone());
                merged.sources.insert(key.clone(), path.to_string());
            }
        }
    }

    merged.conflicts = history
        .into_iter()
        .filter(|(key, values)| values.len() > 1 && !registry.is_list(key))
        .filter(|(_, values)| {
            let distinct: HashSet<String> = values.iter().map(|v| v.value.canonical()).collect();
            distinct.len() > 1
        })
        .map(|(key, values)| Conflict {
            key: key.to_string(),
            values,
        })
        .collect();

    tracing::debug!(
        "Merged {} keys with {} conflicts",
        merged.config.len(),
        merged.conflicts.len()
    );

    merged
}

fn merge_order<'a>(entry_path: Option<&'a str>, resolved: &'a [String]) -> Vec<&'a str> {
    let mut order: Vec<&str> = entry_path.into_iter().collect();
    order.extend(
        resolved
            .iter()
            .map(String::as_str)
            .filter(|path| Some(*path) != entry_path),
    );
    order
}
