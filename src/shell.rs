//! Statement input and result rendering
//!
//! Scripts and the interactive prompt share the same line handling: `--`
//! comments are dropped and lines are joined until one ends with `;`. A line
//! reading `.EXIT` stops the run.

use std::{
    io::{BufRead, Write},
    path::Path,
};

use tracing::{debug, info, warn};

use crate::{
    error::Result,
    sql::{engine::Session, executor::ResultSet},
    storage::engine::Engine as StorageEngine,
};

const EXIT_COMMAND: &str = ".EXIT";

/// One unit of input
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Statement(String),
    Exit,
}

/// Joins input lines into complete statements
#[derive(Debug, Default)]
pub struct StatementSplitter {
    pending: String,
}

impl StatementSplitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one line, returning a command once one is complete
    pub fn push_line(&mut self, line: &str) -> Option<Command> {
        if line.trim().is_empty() || line.trim_start().starts_with("--") {
            return None;
        }
        let text = strip_comment(line).trim();
        if text.trim_end_matches(';').eq_ignore_ascii_case(EXIT_COMMAND) {
            if !self.pending.is_empty() {
                warn!("discarding unterminated statement: {}", self.pending);
                self.pending.clear();
            }
            return Some(Command::Exit);
        }
        if text.is_empty() {
            return None;
        }

        if !self.pending.is_empty() {
            self.pending.push(' ');
        }
        self.pending.push_str(text);
        if self.pending.ends_with(';') {
            return Some(Command::Statement(std::mem::take(&mut self.pending)));
        }
        None
    }

    /// Whatever is left once input ends, if anything
    pub fn finish(&mut self) -> Option<Command> {
        if self.pending.is_empty() {
            return None;
        }
        Some(Command::Statement(std::mem::take(&mut self.pending)))
    }
}

/// Cuts a trailing `--` comment. Dashes inside a quoted literal are kept.
fn strip_comment(line: &str) -> &str {
    let mut quoted = false;
    let mut dash = false;
    for (i, c) in line.char_indices() {
        match c {
            '\'' => quoted = !quoted,
            '-' if !quoted && dash => return &line[..i - 1],
            _ => {}
        }
        dash = c == '-' && !quoted;
    }
    line
}

/// Splits a whole script into commands. Input after `.EXIT` is ignored.
pub fn split_statements(text: &str) -> Vec<Command> {
    let mut splitter = StatementSplitter::new();
    let mut commands = Vec::new();
    for line in text.lines() {
        match splitter.push_line(line) {
            Some(Command::Exit) => {
                commands.push(Command::Exit);
                return commands;
            }
            Some(command) => commands.push(command),
            None => {}
        }
    }
    commands.extend(splitter.finish());
    commands
}

/// Runs commands against a session and writes their results
pub struct Shell<E: StorageEngine, W: Write> {
    session: Session<E>,
    out: W,
}

impl<E: StorageEngine + 'static, W: Write> Shell<E, W> {
    pub fn new(session: Session<E>, out: W) -> Self {
        Self { session, out }
    }

    pub fn session(&self) -> &Session<E> {
        &self.session
    }

    pub fn output(&self) -> &W {
        &self.out
    }

    /// Runs one command. Returns false once the input asked to exit.
    pub fn execute(&mut self, command: &Command) -> Result<bool> {
        let statement = match command {
            Command::Exit => return Ok(false),
            Command::Statement(statement) => statement,
        };
        debug!("executing {}", statement);
        match self.session.execute(statement) {
            Ok(result) => self.render(&result)?,
            Err(err) => writeln!(self.out, "!Failed: {}", err)?,
        }
        Ok(true)
    }

    fn render(&mut self, result: &ResultSet) -> Result<()> {
        match result.message() {
            Some(message) => writeln!(self.out, "{}", message)?,
            None => {
                writeln!(self.out, "{}", result.columns().join("|"))?;
                for row in result.rows() {
                    writeln!(self.out, "{}", row)?;
                }
            }
        }
        Ok(())
    }

    /// Runs a script file. Returns false if the script hit `.EXIT`.
    pub fn run_script(&mut self, path: &Path) -> Result<bool> {
        info!("running script {}", path.display());
        let text = std::fs::read_to_string(path)?;
        for command in split_statements(&text) {
            if !self.execute(&command)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Runs commands read line by line until `.EXIT` or end of input
    pub fn run<R: BufRead>(&mut self, reader: R) -> Result<bool> {
        let mut splitter = StatementSplitter::new();
        for line in reader.lines() {
            if let Some(command) = splitter.push_line(&line?) {
                if !self.execute(&command)? {
                    return Ok(false);
                }
            }
            self.out.flush()?;
        }
        if let Some(command) = splitter.finish() {
            self.execute(&command)?;
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::{Command, Shell, split_statements};
    use crate::{
        error::Result,
        sql::engine::{Session, file::FileEngine},
        storage::memory::MemoryEngine,
    };

    fn shell() -> Result<Shell<MemoryEngine, Vec<u8>>> {
        let session = Session::new(FileEngine::new(MemoryEngine::new(), "Databases", "tbl"))?;
        Ok(Shell::new(session, Vec::new()))
    }

    fn output(shell: &Shell<MemoryEngine, Vec<u8>>) -> String {
        String::from_utf8_lossy(shell.output()).into_owned()
    }

    #[test]
    fn test_split_statements() {
        let script = "-- header comment\n\
                      CREATE DATABASE db_1;\n\
                      \n\
                      create table Product (pid int,   -- trailing comment\n\
                        name varchar(20));\n\
                      .exit\n\
                      select * from Product;\n";
        assert_eq!(
            split_statements(script),
            vec![
                Command::Statement("CREATE DATABASE db_1;".into()),
                Command::Statement("create table Product (pid int, name varchar(20));".into()),
                Command::Exit,
            ]
        );
        assert_eq!(split_statements("use db"), vec![Command::Statement("use db".into())]);
        assert_eq!(
            split_statements("insert into t values (1, 'a--b'); -- note\nselect * from t;"),
            vec![
                Command::Statement("insert into t values (1, 'a--b');".into()),
                Command::Statement("select * from t;".into()),
            ]
        );
    }

    #[test]
    fn test_run() -> Result<()> {
        let mut shell = shell()?;
        let input = "CREATE DATABASE db;\n\
                     USE db;\n\
                     CREATE TABLE t (id int, name varchar(20));\n\
                     INSERT INTO t VALUES (1, 'Alice');\n\
                     SELECT * FROM t;\n\
                     SELECT COUNT(*) FROM t;\n\
                     DROP TABLE nope;\n\
                     .EXIT\n\
                     DROP DATABASE db;\n";
        assert!(!shell.run(Cursor::new(input))?);
        assert_eq!(
            output(&shell),
            "Database db created.\n\
             Using database db.\n\
             Table t created.\n\
             1 new record inserted.\n\
             id int|name varchar(20)\n\
             1|Alice\n\
             COUNT(*)\n\
             1\n\
             !Failed: table nope does not exist\n"
        );
        assert_eq!(shell.session().database(), Some("db"));
        Ok(())
    }

    #[test]
    fn test_run_script() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("script.sql");
        std::fs::write(&path, "create database s;\nuse s;\n")?;

        let mut shell = shell()?;
        assert!(shell.run_script(&path)?);
        assert_eq!(output(&shell), "Database s created.\nUsing database s.\n");
        Ok(())
    }
}
