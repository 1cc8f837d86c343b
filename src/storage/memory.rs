use std::{
    collections::{BTreeMap, BTreeSet},
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use crate::{
    error::{Error, Result},
    storage::engine::Engine,
};

/// In-memory storage engine
///
/// Clones share the same files, so two sessions can work over one store the
/// way two processes would share a data directory.
#[derive(Clone, Default)]
pub struct MemoryEngine {
    inner: Arc<Mutex<MemoryFs>>,
}

#[derive(Default)]
struct MemoryFs {
    files: BTreeMap<PathBuf, Vec<String>>,
    dirs: BTreeSet<PathBuf>,
}

impl MemoryFs {
    fn check_parent(&self, path: &Path) -> Result<()> {
        match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() && !self.dirs.contains(parent) => {
                Err(Error::Io(format!("directory {} does not exist", parent.display())))
            }
            _ => Ok(()),
        }
    }
}

impl MemoryEngine {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Implements storage Engine trait (line-level operations)
impl Engine for MemoryEngine {
    fn read_lines(&mut self, path: &Path) -> Result<Option<Vec<String>>> {
        let fs = self.inner.lock()?;
        Ok(fs.files.get(path).cloned())
    }

    fn write_lines(&mut self, path: &Path, lines: &[String]) -> Result<()> {
        let mut fs = self.inner.lock()?;
        fs.check_parent(path)?;
        fs.files.insert(path.to_path_buf(), lines.to_vec());
        Ok(())
    }

    fn append_line(&mut self, path: &Path, line: &str) -> Result<()> {
        let mut fs = self.inner.lock()?;
        match fs.files.get_mut(path) {
            Some(lines) => {
                lines.push(line.to_string());
                Ok(())
            }
            None => Err(Error::Io(format!("file {} does not exist", path.display()))),
        }
    }

    fn create_file(&mut self, path: &Path) -> Result<bool> {
        let mut fs = self.inner.lock()?;
        fs.check_parent(path)?;
        if fs.files.contains_key(path) {
            return Ok(false);
        }
        fs.files.insert(path.to_path_buf(), Vec::new());
        Ok(true)
    }

    fn delete_file(&mut self, path: &Path) -> Result<bool> {
        let mut fs = self.inner.lock()?;
        Ok(fs.files.remove(path).is_some())
    }

    fn file_exists(&mut self, path: &Path) -> Result<bool> {
        let fs = self.inner.lock()?;
        Ok(fs.files.contains_key(path))
    }

    fn create_dir(&mut self, path: &Path) -> Result<bool> {
        let mut fs = self.inner.lock()?;
        if fs.dirs.contains(path) {
            return Ok(false);
        }
        // Register missing ancestors too, like create_dir_all
        for ancestor in path.ancestors().filter(|a| !a.as_os_str().is_empty()) {
            fs.dirs.insert(ancestor.to_path_buf());
        }
        Ok(true)
    }

    fn delete_dir(&mut self, path: &Path) -> Result<bool> {
        let mut fs = self.inner.lock()?;
        if !fs.dirs.contains(path) {
            return Ok(false);
        }
        fs.dirs.retain(|d| !d.starts_with(path));
        fs.files.retain(|f, _| !f.starts_with(path));
        Ok(true)
    }

    fn dir_exists(&mut self, path: &Path) -> Result<bool> {
        let fs = self.inner.lock()?;
        Ok(fs.dirs.contains(path))
    }
}
