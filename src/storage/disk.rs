use std::{
    fs::{self, OpenOptions},
    io::{ErrorKind, Write},
    path::Path,
};

use tempfile::NamedTempFile;

use crate::{error::Result, storage::engine::Engine};

/// Filesystem storage engine
///
/// Full rewrites go through a temporary file in the target's directory which is
/// then renamed over the target, so a crash mid-write leaves the old content.
#[derive(Debug, Clone, Default)]
pub struct DiskEngine;

impl DiskEngine {
    pub fn new() -> Self {
        Self
    }
}

impl Engine for DiskEngine {
    fn read_lines(&mut self, path: &Path) -> Result<Option<Vec<String>>> {
        match fs::read_to_string(path) {
            Ok(content) => Ok(Some(content.lines().map(str::to_string).collect())),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn write_lines(&mut self, path: &Path, lines: &[String]) -> Result<()> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir)?;
        for line in lines {
            writeln!(tmp, "{}", line)?;
        }
        tmp.as_file().sync_all()?;
        tmp.persist(path)?;
        Ok(())
    }

    fn append_line(&mut self, path: &Path, line: &str) -> Result<()> {
        let mut file = OpenOptions::new().append(true).open(path)?;
        writeln!(file, "{}", line)?;
        Ok(())
    }

    fn create_file(&mut self, path: &Path) -> Result<bool> {
        match OpenOptions::new().write(true).create_new(true).open(path) {
            Ok(_) => Ok(true),
            Err(err) if err.kind() == ErrorKind::AlreadyExists => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    fn delete_file(&mut self, path: &Path) -> Result<bool> {
        match fs::remove_file(path) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    fn file_exists(&mut self, path: &Path) -> Result<bool> {
        Ok(path.is_file())
    }

    fn create_dir(&mut self, path: &Path) -> Result<bool> {
        if path.is_dir() {
            return Ok(false);
        }
        fs::create_dir_all(path)?;
        Ok(true)
    }

    fn delete_dir(&mut self, path: &Path) -> Result<bool> {
        match fs::remove_dir_all(path) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    fn dir_exists(&mut self, path: &Path) -> Result<bool> {
        Ok(path.is_dir())
    }
}
