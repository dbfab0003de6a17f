//! The real filesystem-backed [`FileLoader`] (the three-step search
//! order: the including file's own directory, then `-I` search paths in
//! order, then the literal name relative to the working directory).

use std::fs;
use std::path::{Path, PathBuf};

use mcc_preprocessor::FileLoader;

pub struct FsFileLoader {
    search_paths: Vec<PathBuf>,
}

impl FsFileLoader {
    pub fn new(search_paths: Vec<PathBuf>) -> Self {
        Self { search_paths }
    }

    fn try_read(path: &Path) -> Option<(PathBuf, String)> {
        fs::read_to_string(path).ok().map(|contents| (path.to_path_buf(), contents))
    }
}

impl FileLoader for FsFileLoader {
    fn open(&mut self, name: &str, is_system: bool, from_dir: Option<&Path>) -> Option<(PathBuf, String)> {
        if !is_system {
            if let Some(dir) = from_dir {
                if let Some(found) = Self::try_read(&dir.join(name)) {
                    return Some(found);
                }
            }
        }
        for dir in &self.search_paths {
            if let Some(found) = Self::try_read(&dir.join(name)) {
                return Some(found);
            }
        }
        Self::try_read(Path::new(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falls_back_to_search_paths_when_not_found_alongside_includer() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("greet.h"), "hi\n").unwrap();
        let mut loader = FsFileLoader::new(vec![dir.path().to_path_buf()]);
        let (path, contents) = loader.open("greet.h", false, None).expect("found via search path");
        assert_eq!(contents, "hi\n");
        assert!(path.starts_with(dir.path()));
    }
}
