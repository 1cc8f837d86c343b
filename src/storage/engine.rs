use std::path::Path;

use crate::error::Result;

/// Abstract storage engine interface (line-level file operations)
///
/// Different from sql::engine::FileEngine which operates on tables. Every table
/// lives in one text file, so the primitives here deal in whole lines and
/// whole files rather than bytes.
pub trait Engine {
    /// Reads every line of a file, without line terminators. Returns None if
    /// the file does not exist.
    fn read_lines(&mut self, path: &Path) -> Result<Option<Vec<String>>>;

    /// Replaces the whole content of a file. Creates the file if needed.
    fn write_lines(&mut self, path: &Path, lines: &[String]) -> Result<()>;

    /// Appends one line to the end of an existing file.
    fn append_line(&mut self, path: &Path, line: &str) -> Result<()>;

    /// Creates an empty file. Returns false if it already exists.
    fn create_file(&mut self, path: &Path) -> Result<bool>;

    /// Returns false if the file did not exist.
    fn delete_file(&mut self, path: &Path) -> Result<bool>;

    fn file_exists(&mut self, path: &Path) -> Result<bool>;

    /// Creates a directory (and missing parents). Returns false if it already exists.
    fn create_dir(&mut self, path: &Path) -> Result<bool>;

    /// Deletes a directory and everything under it. Returns false if it did not exist.
    fn delete_dir(&mut self, path: &Path) -> Result<bool>;

    fn dir_exists(&mut self, path: &Path) -> Result<bool>;
}
