//! Module loading
//!
//! Imports are resolved while the importer is being parsed: the loader reads
//! the file, lexes and parses it with the same shared cache, and stores the
//! result keyed by the user-supplied import name. A module that cannot be
//! opened is a soft failure: it is logged and cached as absent so the
//! importer keeps parsing.

use crate::ast::Program;
use crate::diagnostics;
use crate::lexer;
use crate::parser;
use crate::span::SourceFile;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Shared cache of parsed modules, keyed by import name
#[derive(Debug, Default)]
pub struct ModuleCache {
    modules: HashMap<String, Option<Program>>,
}

/// Resolve an import name to a filesystem path: append `.enki` when the
/// extension is missing, then resolve relative to the importing file's
/// directory when one is given.
pub fn resolve_path(name: &str, importer: Option<&str>) -> PathBuf {
    let mut path = PathBuf::from(name);
    if path.extension().is_none_or(|ext| ext != "enki") {
        path = PathBuf::from(format!("{}.enki", name));
    }
    match importer {
        Some(importer) if !importer.is_empty() => Path::new(importer)
            .parent()
            .map(|dir| dir.join(&path))
            .unwrap_or(path),
        _ => path,
    }
}

impl ModuleCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch an already-loaded module
    pub fn get(&self, name: &str) -> Option<&Program> {
        self.modules.get(name).and_then(|p| p.as_ref())
    }

    /// Load a module by import name, reusing the cached program when the
    /// name was seen before. Returns `None` when the module cannot be
    /// opened or does not parse; both are soft failures.
    pub fn load(&mut self, name: &str, importer: Option<&str>) -> Option<&Program> {
        if self.modules.contains_key(name) {
            tracing::debug!(module = name, "module cache hit");
            return self.get(name);
        }

        let path = resolve_path(name, importer);
        let source = match fs::read_to_string(&path) {
            Ok(source) => source,
            Err(err) => {
                tracing::error!(
                    module = name,
                    path = %path.display(),
                    importer = importer.unwrap_or(""),
                    %err,
                    "failed to open module"
                );
                self.modules.insert(name.to_string(), None);
                return None;
            }
        };

        // Reserve the cache slot before parsing so a module that imports
        // itself terminates instead of recursing forever.
        self.modules.insert(name.to_string(), None);

        let file = SourceFile::new(path.to_string_lossy(), source);
        let tokens = match lexer::lex(&file) {
            Ok(tokens) => tokens,
            Err(err) => {
                tracing::error!(
                    module = name,
                    "module failed to lex:\n{}",
                    diagnostics::render(&file, err.span(), &err.to_string())
                );
                return None;
            }
        };
        match parser::parse(&tokens, &file, self) {
            Ok(program) => {
                tracing::debug!(module = name, path = %path.display(), "module loaded");
                self.modules.insert(name.to_string(), Some(program));
                self.get(name)
            }
            Err(err) => {
                tracing::error!(
                    module = name,
                    "module failed to parse:\n{}",
                    diagnostics::render(&file, err.span(), &err.to_string())
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_appended_when_missing() {
        assert_eq!(resolve_path("utils", None), PathBuf::from("utils.enki"));
    }

    #[test]
    fn test_extension_not_doubled() {
        assert_eq!(
            resolve_path("utils.enki", None),
            PathBuf::from("utils.enki")
        );
    }

    #[test]
    fn test_resolution_relative_to_importer() {
        assert_eq!(
            resolve_path("utils", Some("project/main.enki")),
            PathBuf::from("project/utils.enki")
        );
    }

    #[test]
    fn test_importer_without_directory() {
        assert_eq!(
            resolve_path("utils", Some("main.enki")),
            PathBuf::from("utils.enki")
        );
    }

    #[test]
    fn test_missing_module_is_cached_as_absent() {
        let mut cache = ModuleCache::new();
        assert!(cache.load("no_such_module_anywhere", None).is_none());
        // Second lookup is served from the cache
        assert!(cache.load("no_such_module_anywhere", None).is_none());
        assert!(cache.modules.contains_key("no_such_module_anywhere"));
    }

    #[test]
    fn test_load_parses_module_file() {
        let dir = std::env::temp_dir().join("enki_module_test");
        std::fs::create_dir_all(&dir).expect("create temp dir");
        let module_path = dir.join("mathlib.enki");
        fs::write(&module_path, "define one() -> int { return 1 }").expect("write module");

        let mut cache = ModuleCache::new();
        let importer = dir.join("main.enki");
        let program = cache
            .load("mathlib", Some(importer.to_string_lossy().as_ref()))
            .expect("module should load");
        assert_eq!(program.body.statements.len(), 1);
    }

    #[test]
    fn test_cache_is_keyed_by_name() {
        let dir = std::env::temp_dir().join("enki_module_test_key");
        std::fs::create_dir_all(&dir).expect("create temp dir");
        fs::write(dir.join("a.enki"), "let x = 1").expect("write module");

        let mut cache = ModuleCache::new();
        let importer = dir.join("main.enki");
        assert!(cache
            .load("a", Some(importer.to_string_lossy().as_ref()))
            .is_some());
        // The same name resolves from the cache even without an importer
        assert!(cache.get("a").is_some());
    }
}
