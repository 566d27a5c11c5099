//! INCLUDE module resolver (spec §3, §4.10): path resolution, include-stack
//! tracking, circular-include and depth-cap detection.

use std::collections::HashSet;

use crate::error::{WhiskerError, WhiskerResult};

pub const DEFAULT_MAX_DEPTH: usize = 50;

/// A host-provided source loader, decoupling the resolver from file-system
/// I/O (spec §9 "Host-provided file loader").
pub trait Loader {
    fn load(&mut self, resolved_path: &str) -> WhiskerResult<String>;
}

#[derive(Debug)]
pub struct IncludeResult {
    pub original: String,
    pub resolved: String,
    pub content: String,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ModuleState {
    pub loaded: Vec<String>,
    pub include_stack: Vec<String>,
}

pub struct ModuleResolver {
    loaded: HashSet<String>,
    include_stack: Vec<String>,
    max_depth: usize,
}

impl Default for ModuleResolver {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DEPTH)
    }
}

impl ModuleResolver {
    pub fn new(max_depth: usize) -> Self {
        ModuleResolver {
            loaded: HashSet::new(),
            include_stack: Vec::new(),
            max_depth,
        }
    }

    /// Resolves `include_path` relative to `including_file`'s directory.
    /// Absolute paths pass through unchanged; `.`/`..` segments are
    /// normalized; `/` is the canonical separator regardless of platform.
    pub fn resolve_path(including_file: &str, include_path: &str) -> String {
        if include_path.starts_with('/') {
            return normalize(include_path);
        }
        let base_dir = match including_file.rfind('/') {
            Some(idx) => &including_file[..idx],
            None => "",
        };
        let joined = if base_dir.is_empty() {
            include_path.to_string()
        } else {
            format!("{base_dir}/{include_path}")
        };
        normalize(&joined)
    }

    pub fn load_include(
        &mut self,
        including_file: &str,
        include_path: &str,
        loader: &mut dyn Loader,
    ) -> WhiskerResult<IncludeResult> {
        let resolved = Self::resolve_path(including_file, include_path);

        if self.include_stack.contains(&resolved) {
            let mut chain = self.include_stack.clone();
            chain.push(resolved.clone());
            return Err(WhiskerError::CircularInclude { chain });
        }
        if self.include_stack.len() >= self.max_depth {
            return Err(WhiskerError::IncludeDepthExceeded { limit: self.max_depth });
        }

        self.include_stack.push(resolved.clone());
        let content = loader.load(&resolved);
        self.include_stack.pop();

        let content = content?;
        self.loaded.insert(resolved.clone());
        Ok(IncludeResult {
            original: include_path.to_string(),
            resolved,
            content,
        })
    }

    pub fn is_loaded(&self, resolved_path: &str) -> bool {
        self.loaded.contains(resolved_path)
    }

    pub fn include_depth(&self) -> usize {
        self.include_stack.len()
    }

    pub fn get_state(&self) -> ModuleState {
        ModuleState {
            loaded: self.loaded.iter().cloned().collect(),
            include_stack: self.include_stack.clone(),
        }
    }

    pub fn restore_state(&mut self, state: ModuleState) {
        self.loaded = state.loaded.into_iter().collect();
        self.include_stack = state.include_stack;
    }
}

/// Collapses `.` and `..` segments without touching the file system.
fn normalize(path: &str) -> String {
    let mut out: Vec<&str> = Vec::new();
    for seg in path.split('/') {
        match seg {
            "" | "." => {}
            ".." => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MapLoader(ahash::AHashMap<&'static str, &'static str>);
    impl Loader for MapLoader {
        fn load(&mut self, resolved_path: &str) -> WhiskerResult<String> {
            self.0
                .get(resolved_path)
                .map(|s| s.to_string())
                .ok_or_else(|| WhiskerError::Syntax(format!("no such module: {resolved_path}")))
        }
    }

    #[test]
    fn relative_path_resolves_against_including_file_dir() {
        assert_eq!(
            ModuleResolver::resolve_path("story/a.wsk", "./b.wsk"),
            "story/b.wsk"
        );
        assert_eq!(
            ModuleResolver::resolve_path("story/chapters/a.wsk", "../shared/b.wsk"),
            "story/shared/b.wsk"
        );
    }

    #[test]
    fn circular_include_reports_full_chain() {
        let mut loader = MapLoader(ahash::AHashMap::from_iter([
            ("a.wsk", "include b"),
            ("b.wsk", "include a"),
        ]));
        let mut resolver = ModuleResolver::default();
        resolver.include_stack.push("a.wsk".to_string());
        resolver.include_stack.push("b.wsk".to_string());
        let err = resolver
            .load_include("b.wsk", "a.wsk", &mut loader)
            .unwrap_err();
        match err {
            WhiskerError::CircularInclude { chain } => {
                assert_eq!(chain, vec!["a.wsk", "b.wsk", "a.wsk"]);
            }
            other => panic!("expected CircularInclude, got {other:?}"),
        }
    }

    #[test]
    fn load_include_never_grows_stack_past_entry_on_error() {
        let mut loader = MapLoader(ahash::AHashMap::new());
        let mut resolver = ModuleResolver::default();
        let before = resolver.include_depth();
        let _ = resolver.load_include("root.wsk", "missing.wsk", &mut loader);
        assert_eq!(resolver.include_depth(), before);
    }

    #[test]
    fn depth_cap_is_enforced() {
        let mut loader = MapLoader(ahash::AHashMap::new());
        let mut resolver = ModuleResolver::new(1);
        resolver.include_stack.push("a.wsk".to_string());
        let err = resolver
            .load_include("a.wsk", "b.wsk", &mut loader)
            .unwrap_err();
        assert!(matches!(err, WhiskerError::IncludeDepthExceeded { limit: 1 }));
    }
}
