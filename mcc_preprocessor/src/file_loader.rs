//! Include resolution, abstracted behind a trait so the preprocessor's
//! expansion logic never touches the filesystem directly.

use std::path::{Path, PathBuf};

/// Resolves `#include` directives to file contents.
///
/// `open` receives the included name, whether it was a `<...>` (system)
/// include, and the directory of the file performing the include (used for
/// step (a) of the three-step search order: the including file's own
/// directory, then configured search paths, then the literal name).
pub trait FileLoader {
    fn open(&mut self, name: &str, is_system: bool, from_dir: Option<&Path>) -> Option<(PathBuf, String)>;
}

/// A loader with nothing behind it; used by unit tests that exercise macro
/// expansion and directive handling without touching a real filesystem.
#[derive(Debug, Default)]
pub struct NullFileLoader;

impl FileLoader for NullFileLoader {
    fn open(&mut self, _name: &str, _is_system: bool, _from_dir: Option<&Path>) -> Option<(PathBuf, String)> {
        None
    }
}

/// An in-memory loader for tests that need `#include` to actually resolve,
/// keyed by the exact literal spelling used in the directive.
#[derive(Debug, Default)]
pub struct MapFileLoader {
    files: hashbrown::HashMap<String, String>,
}

impl MapFileLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, name: impl Into<String>, contents: impl Into<String>) -> Self {
        self.files.insert(name.into(), contents.into());
        self
    }
}

impl FileLoader for MapFileLoader {
    fn open(&mut self, name: &str, _is_system: bool, _from_dir: Option<&Path>) -> Option<(PathBuf, String)> {
        self.files.get(name).map(|contents| (PathBuf::from(name), contents.clone()))
    }
}
