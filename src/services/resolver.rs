//! Entry point detection and `require` graph traversal over an archive.

use crate::models::{FileMap, ModuleGraph, ResolvedGraph};
use regex::Regex;
use std::collections::{HashSet, VecDeque};
use std::sync::LazyLock;

/// Entry locations, highest priority first.
pub const ENTRY_CANDIDATES: [&str; 4] = [
    "wezterm.lua",
    ".config/wezterm/wezterm.lua",
    "config/wezterm.lua",
    "wezterm/init.lua",
];

/// Suffixes used as traversal roots when no entry point exists.
const FALLBACK_ROOT_SUFFIXES: [&str; 3] = ["wezterm.lua", "init.lua", "config.lua"];

pub const NO_ENTRY_WARNING: &str = "No entry point (wezterm.lua) found in archive.";

static REQUIRE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"require\s*(?:\(\s*["']([^"')]+)["']\s*\)|["']([^"'\n]+)["'])"#)
        .expect("Invalid require regex")
});

/// Pick the entry script of an archive.
pub fn find_entry(file_map: &FileMap) -> Option<String> {
    ENTRY_CANDIDATES
        .iter()
        .find(|candidate| file_map.contains_key(**candidate))
        .map(|candidate| candidate.to_string())
        .or_else(|| {
            file_map
                .keys()
                .find(|path| path.ends_with("/wezterm.lua"))
                .cloned()
        })
}

/// `lua/Theme.LUA` -> `lua.Theme`
pub fn derive_module_name(path: &str) -> String {
    let stem = match path.len().checked_sub(4) {
        Some(cut) if path.is_char_boundary(cut) && path[cut..].eq_ignore_ascii_case(".lua") => {
            &path[..cut]
        }
        _ => path,
    };
    stem.replace('/', ".")
}

/// Map every path in the archive to its derived module name.
pub fn build_module_graph(file_map: &FileMap) -> ModuleGraph {
    let mut modules = ModuleGraph::new();
    for path in file_map.keys() {
        modules
            .entry(derive_module_name(path))
            .or_default()
            .push(path.clone());
    }
    modules
}

/// Module names passed to `require`, in textual order.
///
/// This is a plain text scan: calls inside comments or strings are reported
/// too, and so are identifiers that merely end in `require` (`myrequire("x")`).
pub fn extract_requires(text: &str) -> Vec<String> {
    REQUIRE_PATTERN
        .captures_iter(text)
        .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)))
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Find the entry point and every file reachable from it.
pub fn resolve_graph(file_map: &FileMap) -> ResolvedGraph {
    let entry_path = find_entry(file_map);
    let modules = build_module_graph(file_map);
    let mut walker = Walker::new(file_map, &modules);

    match &entry_path {
        Some(entry) => walker.walk_from(entry),
        None => {
            walker.warnings.push(NO_ENTRY_WARNING.to_string());
            for path in file_map.keys() {
                if FALLBACK_ROOT_SUFFIXES
                    .iter()
                    .any(|suffix| path.ends_with(suffix))
                {
                    walker.walk_from(path);
                }
            }
        }
    }

    tracing::debug!(
        "Resolved {} of {} files (entry: {:?})",
        walker.resolved.len(),
        file_map.len(),
        entry_path
    );

    let Walker {
        resolved, warnings, ..
    } = walker;

    ResolvedGraph {
        entry_path,
        resolved,
        modules,
        warnings,
    }
}

/// A file whose `require` calls are partway processed.
struct Frame<'a> {
    path: &'a str,
    requires: Vec<String>,
    next_require: usize,

    /// Targets of the current require not yet descended into.
    pending: VecDeque<&'a str>,
}

/// Depth-first pre-order traversal on an explicit stack.
///
/// Produces the same order as visiting each target recursively right after
/// resolving its `require`.
struct Walker<'a> {
    file_map: &'a FileMap,
    modules: &'a ModuleGraph,
    visited: HashSet<&'a str>,
    resolved: Vec<String>,
    warnings: Vec<String>,
}

impl<'a> Walker<'a> {
    fn new(file_map: &'a FileMap, modules: &'a ModuleGraph) -> Self {
        Self {
            file_map,
            modules,
            visited: HashSet::new(),
            resolved: Vec::new(),
            warnings: Vec::new(),
        }
    }

    fn walk_from(&mut self, root: &str) {
        let Some((root, _)) = self.file_map.get_key_value(root) else {
            return;
        };
        let mut stack: Vec<Frame<'a>> = Vec::new();
        if let Some(frame) = self.visit(root) {
            stack.push(frame);
        }

        while let Some(frame) = stack.last_mut() {
            if let Some(target) = frame.pending.pop_front() {
                if let Some(child) = self.visit(target) {
                    stack.push(child);
                }
                continue;
            }

            if frame.next_require < frame.requires.len() {
                let name = &frame.requires[frame.next_require];
                frame.next_require += 1;

                let targets = self.targets(name);
                if targets.is_empty() {
                    self.warnings.push(format!(
                        "Unresolved require('{}') referenced from {}",
                        name, frame.path
                    ));
                } else {
                    frame.pending.extend(targets);
                }
                continue;
            }

            stack.pop();
        }
    }

    /// Mark a path visited and open its frame, or `None` if already seen.
    fn visit(&mut self, path: &'a str) -> Option<Frame<'a>> {
        if !self.visited.insert(path) {
            return None;
        }
        self.resolved.push(path.to_string());

        let requires = self
            .file_map
            .get(path)
            .map(|text| extract_requires(text))
            .unwrap_or_default();

        Some(Frame {
            path,
            requires,
            next_require: 0,
            pending: VecDeque::new(),
        })
    }

    /// Archive paths a module name refers to.
    fn targets(&self, name: &str) -> Vec<&'a str> {
        let base = name.replace('.', "/");
        for candidate in [format!("{base}.lua"), format!("{base}/init.lua")] {
            if let Some((path, _)) = self.file_map.get_key_value(candidate.as_str()) {
                return vec![path.as_str()];
            }
        }

        self.modules
            .get(&name.replace('/', "."))
            .map(|paths| paths.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }
}
