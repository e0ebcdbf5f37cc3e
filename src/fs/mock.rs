// src/fs/mock.rs

//! In-memory [`FileSystem`] for tests.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{bail, Result};

use super::FileSystem;

#[derive(Debug, Clone)]
enum Entry {
    File(Vec<u8>),
    Dir,
}

/// Paths map to files or directories; writing a file creates its parents.
/// Clones share storage, so a test can hand one clone to the code under test
/// and inspect another.
#[derive(Debug, Clone)]
pub struct MockFileSystem {
    entries: Arc<Mutex<BTreeMap<PathBuf, Entry>>>,
}

impl Default for MockFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl MockFileSystem {
    pub fn new() -> Self {
        let mut entries = BTreeMap::new();
        entries.insert(PathBuf::from("/"), Entry::Dir);
        Self {
            entries: Arc::new(Mutex::new(entries)),
        }
    }

    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        let path = path.as_ref();
        let mut entries = self.lock();
        insert_parents(&mut entries, path);
        entries.insert(path.to_path_buf(), Entry::File(content.into()));
    }

    /// Raw contents of a file, if present.
    pub fn contents(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        match self.lock().get(path.as_ref()) {
            Some(Entry::File(bytes)) => Some(bytes.clone()),
            _ => None,
        }
    }

    /// Every file at or below `root`, sorted.
    pub fn files_under(&self, root: impl AsRef<Path>) -> Vec<PathBuf> {
        self.lock()
            .iter()
            .filter(|(p, e)| matches!(e, Entry::File(_)) && p.starts_with(root.as_ref()))
            .map(|(p, _)| p.clone())
            .collect()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<PathBuf, Entry>> {
        // A panic while holding the lock only happens inside a failing test.
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn insert_parents(entries: &mut BTreeMap<PathBuf, Entry>, path: &Path) {
    for ancestor in path.ancestors().skip(1) {
        if ancestor.as_os_str().is_empty() {
            break;
        }
        entries
            .entry(ancestor.to_path_buf())
            .or_insert(Entry::Dir);
    }
}

impl FileSystem for MockFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        match self.lock().get(path) {
            Some(Entry::File(bytes)) => Ok(String::from_utf8(bytes.clone())?),
            Some(Entry::Dir) => bail!("{path:?} is a directory"),
            None => bail!("{path:?} does not exist"),
        }
    }

    fn write(&self, path: &Path, contents: &[u8]) -> Result<()> {
        if self.is_dir(path) {
            bail!("{path:?} is a directory");
        }
        self.add_file(path, contents);
        Ok(())
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        let mut entries = self.lock();
        if let Some(Entry::File(_)) = entries.get(path) {
            bail!("{path:?} exists and is a file");
        }
        insert_parents(&mut entries, path);
        entries.insert(path.to_path_buf(), Entry::Dir);
        Ok(())
    }

    fn copy(&self, from: &Path, to: &Path) -> Result<()> {
        let Some(bytes) = self.contents(from) else {
            bail!("cannot copy {from:?}: no such file");
        };
        self.add_file(to, bytes);
        Ok(())
    }

    fn remove_file(&self, path: &Path) -> Result<()> {
        let mut entries = self.lock();
        match entries.get(path) {
            Some(Entry::File(_)) => {
                entries.remove(path);
                Ok(())
            }
            Some(Entry::Dir) => bail!("{path:?} is a directory"),
            None => bail!("{path:?} does not exist"),
        }
    }

    fn remove_dir_all(&self, path: &Path) -> Result<()> {
        let mut entries = self.lock();
        if !matches!(entries.get(path), Some(Entry::Dir)) {
            bail!("{path:?} is not a directory");
        }
        entries.retain(|p, _| !p.starts_with(path));
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.lock().contains_key(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        matches!(self.lock().get(path), Some(Entry::File(_)))
    }

    fn is_dir(&self, path: &Path) -> bool {
        matches!(self.lock().get(path), Some(Entry::Dir))
    }

    /// Paths are stored as given, so this is an existence check.
    fn canonicalize(&self, path: &Path) -> Result<PathBuf> {
        if !self.exists(path) {
            bail!("{path:?} does not exist");
        }
        Ok(path.to_path_buf())
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let entries = self.lock();
        if !matches!(entries.get(path), Some(Entry::Dir)) {
            bail!("{path:?} is not a directory");
        }
        Ok(entries
            .keys()
            .filter(|p| p.parent() == Some(path))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remove_dir_all_drops_children() {
        let fs = MockFileSystem::new();
        fs.add_file("/run/tasks/node0.sbatch", b"#!/usr/bin/env bash\n");
        fs.add_file("/run/pipeline.bash", b"");

        fs.remove_dir_all(Path::new("/run/tasks")).unwrap();

        assert!(!fs.exists(Path::new("/run/tasks")));
        assert!(!fs.exists(Path::new("/run/tasks/node0.sbatch")));
        assert_eq!(
            fs.read_dir(Path::new("/run")).unwrap(),
            vec![PathBuf::from("/run/pipeline.bash")]
        );
    }

    #[test]
    fn writes_create_parent_directories() {
        let fs = MockFileSystem::new();
        fs.write(Path::new("/a/b/c.payload"), b"x").unwrap();

        assert!(fs.is_dir(Path::new("/a")));
        assert!(fs.is_dir(Path::new("/a/b")));
        assert_eq!(fs.read_dir(Path::new("/")).unwrap(), vec![PathBuf::from("/a")]);
        assert!(fs.create_dir_all(Path::new("/a/b/c.payload")).is_err());
    }
}
