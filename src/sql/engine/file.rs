use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::{
    error::{Error, Result},
    sql::{
        schema::{Field, Schema, Table, TableId},
        types::{Row, Value},
    },
    storage::{
        engine::Engine as StorageEngine,
        lock::{self, LOCK_SENTINEL, LockToken},
    },
};

/// Flat-file table store
///
/// Each database is a directory under `root` and each table one file in it:
/// an optional lock line, the schema line, then one line per record.
pub struct FileEngine<E: StorageEngine> {
    store: E,
    root: PathBuf,
    extension: String,
}

impl<E: StorageEngine> FileEngine<E> {
    pub fn new(store: E, root: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            store,
            root: root.into(),
            extension: extension.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Creates the data directory if it is missing
    pub fn init(&mut self) -> Result<()> {
        if self.store.create_dir(&self.root)? {
            info!("created data directory {}", self.root.display());
        }
        Ok(())
    }

    /// Deletes the data directory and every database in it
    pub fn reset(&mut self) -> Result<()> {
        if self.store.delete_dir(&self.root)? {
            info!("deleted data directory {}", self.root.display());
        }
        Ok(())
    }

    fn database_path(&self, database: &str) -> PathBuf {
        self.root.join(database.to_lowercase())
    }

    fn table_path(&self, id: &TableId) -> PathBuf {
        self.database_path(&id.database)
            .join(format!("{}.{}", id.name.to_lowercase(), self.extension))
    }

    pub fn database_exists(&mut self, database: &str) -> Result<bool> {
        let path = self.database_path(database);
        self.store.dir_exists(&path)
    }

    /// Returns false if the database already exists
    pub fn create_database(&mut self, database: &str) -> Result<bool> {
        let path = self.database_path(database);
        self.store.create_dir(&path)
    }

    /// Returns false if the database does not exist
    pub fn drop_database(&mut self, database: &str) -> Result<bool> {
        let path = self.database_path(database);
        self.store.delete_dir(&path)
    }

    pub fn table_exists(&mut self, id: &TableId) -> Result<bool> {
        let path = self.table_path(id);
        self.store.file_exists(&path)
    }

    /// Creates the table file holding only the schema line. Returns false if
    /// the table already exists.
    pub fn create_table(&mut self, id: &TableId, schema: &Schema) -> Result<bool> {
        let path = self.table_path(id);
        if !self.store.create_file(&path)? {
            return Ok(false);
        }
        self.store.write_lines(&path, &[schema.encode()])?;
        Ok(true)
    }

    /// Returns false if the table does not exist
    pub fn drop_table(&mut self, id: &TableId) -> Result<bool> {
        let path = self.table_path(id);
        self.store.delete_file(&path)
    }

    fn read_lines(&mut self, id: &TableId) -> Result<Vec<String>> {
        let path = self.table_path(id);
        self.store
            .read_lines(&path)?
            .ok_or_else(|| Error::TableNotFound(id.name.clone()))
    }

    /// Loads a whole table. The lock line, if any, is left out.
    pub fn load_table(&mut self, id: &TableId) -> Result<Table> {
        let lines = self.read_lines(id)?;
        let (_, table) = decode_table(id, &lines)?;
        debug!("loaded table {} with {} records", id, table.rows.len());
        Ok(table)
    }

    /// Reads only the lock line and the schema line
    pub fn load_header(&mut self, id: &TableId) -> Result<(Option<LockToken>, Schema)> {
        let lines = self.read_lines(id)?;
        let (token, rest) = split_marker(&lines);
        let schema_line = rest
            .first()
            .ok_or_else(|| Error::InvalidMetadata(format!("table {} has no schema line", id.name)))?;
        Ok((token, Schema::decode(schema_line)?))
    }

    /// Rewrites the whole table file. The lock line is dropped.
    pub fn persist_table(&mut self, table: &Table) -> Result<()> {
        let lines = encode_table(table)?;
        self.write_table(&table.id, &lines)
    }

    /// Rewrites a table file from lines already produced by `encode_table`
    pub fn write_table(&mut self, id: &TableId, lines: &[String]) -> Result<()> {
        let path = self.table_path(id);
        self.store.write_lines(&path, lines)?;
        debug!("persisted table {} with {} records", id, lines.len().saturating_sub(1));
        Ok(())
    }

    /// Appends one record line without decoding the table
    pub fn append_row(&mut self, id: &TableId, row: &Row) -> Result<()> {
        let line = encode_row(row)?;
        let path = self.table_path(id);
        if !self.store.file_exists(&path)? {
            return Err(Error::TableNotFound(id.name.clone()));
        }
        self.store.append_line(&path, &line)
    }

    /// Adds a field to the schema line, filling existing records with the
    /// type's zero value. A lock line is kept in place.
    pub fn alter_table(&mut self, id: &TableId, field: Field) -> Result<()> {
        let lines = self.read_lines(id)?;
        let (token, mut table) = decode_table(id, &lines)?;
        add_field(&mut table, field)?;

        let mut lines = encode_table(&table)?;
        if let Some(token) = token {
            lines.insert(0, lock::encode_marker(&token));
        }
        let path = self.table_path(id);
        self.store.write_lines(&path, &lines)
    }

    /// Token of the transaction currently holding the table, if any
    pub fn read_lock(&mut self, id: &TableId) -> Result<Option<LockToken>> {
        let lines = self.read_lines(id)?;
        Ok(lines.first().and_then(|line| lock::parse_marker(line)))
    }

    /// Puts the lock line for `token` at the top of the table file
    pub fn write_lock(&mut self, id: &TableId, token: &LockToken) -> Result<()> {
        let mut lines = self.read_lines(id)?;
        if lines.first().is_some_and(|line| line.starts_with(LOCK_SENTINEL)) {
            lines[0] = lock::encode_marker(token);
        } else {
            lines.insert(0, lock::encode_marker(token));
        }
        let path = self.table_path(id);
        self.store.write_lines(&path, &lines)
    }

    /// Removes the lock line, leaving the rest of the file untouched
    pub fn clear_lock(&mut self, id: &TableId) -> Result<()> {
        let mut lines = self.read_lines(id)?;
        if !lines.first().is_some_and(|line| line.starts_with(LOCK_SENTINEL)) {
            return Ok(());
        }
        lines.remove(0);
        let path = self.table_path(id);
        self.store.write_lines(&path, &lines)
    }
}

/// Appends a field to a table's schema and zero-fills its records
pub fn add_field(table: &mut Table, field: Field) -> Result<()> {
    let zero = field.datatype.zero();
    table.schema.add_field(field)?;
    for row in table.rows.iter_mut() {
        row.push(zero.clone());
    }
    Ok(())
}

fn split_marker(lines: &[String]) -> (Option<LockToken>, &[String]) {
    match lines.split_first() {
        Some((first, rest)) => match lock::parse_marker(first) {
            Some(token) => (Some(token), rest),
            None => (None, lines),
        },
        None => (None, lines),
    }
}

/// Decodes the lines of a table file into the lock token and the table.
/// Any record that does not convert fails the whole load.
pub fn decode_table(id: &TableId, lines: &[String]) -> Result<(Option<LockToken>, Table)> {
    let (token, rest) = split_marker(lines);
    let (schema_line, records) = rest
        .split_first()
        .ok_or_else(|| Error::InvalidMetadata(format!("table {} has no schema line", id.name)))?;

    let mut schema = Schema::decode(schema_line)?;
    schema.qualify(&id.name);
    let mut table = Table::new(id.clone(), schema);

    for line in records.iter().filter(|l| !l.starts_with(LOCK_SENTINEL)) {
        let raw = line.split('|').collect::<Vec<_>>();
        if raw.len() != table.schema.len() {
            return Err(Error::RecordConversion(format!(
                "record '{}' of table {} has {} values, expected {}",
                line,
                id.name,
                raw.len(),
                table.schema.len()
            )));
        }
        let row = table
            .schema
            .fields
            .iter()
            .zip(raw)
            .map(|(field, raw)| Value::parse(field.datatype, raw))
            .collect::<Result<Row>>()?;
        table.push(row)?;
    }
    Ok((token, table))
}

/// Encodes a table as its schema line followed by its record lines
pub fn encode_table(table: &Table) -> Result<Vec<String>> {
    let mut lines = Vec::with_capacity(table.rows.len() + 1);
    lines.push(table.schema.encode());
    for row in &table.rows {
        lines.push(encode_row(row)?);
    }
    Ok(lines)
}

/// Encodes one record line. Text that would break the line format is rejected.
pub fn encode_row(row: &Row) -> Result<String> {
    for (i, value) in row.iter().enumerate() {
        if let Value::Text(text) = value {
            if text.contains(['|', '\n', '\r']) {
                return Err(Error::RecordConversion(format!(
                    "text '{}' contains a field or line separator",
                    text.escape_default()
                )));
            }
            // A leading sentinel would read back as a lock line
            if i == 0 && text.starts_with(LOCK_SENTINEL) {
                return Err(Error::RecordConversion(format!(
                    "text '{}' cannot start a record",
                    text
                )));
            }
        }
    }
    Ok(row.iter().map(Value::to_string).collect::<Vec<_>>().join("|"))
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use proptest::prelude::*;

    use super::{FileEngine, decode_table, encode_row, encode_table};
    use crate::{
        error::{Error, Result},
        sql::{
            schema::{Field, Schema, Table, TableId},
            types::Value,
        },
        storage::{engine::Engine, lock::LockToken, memory::MemoryEngine},
    };

    fn setup() -> Result<(MemoryEngine, FileEngine<MemoryEngine>, TableId)> {
        let store = MemoryEngine::new();
        let mut files = FileEngine::new(store.clone(), "Databases", "tbl");
        files.init()?;
        files.create_database("Shop")?;
        let id = TableId::new("Shop", "Product");
        files.create_table(&id, &Schema::decode("pid int|name varchar(20)|price float")?)?;
        Ok((store, files, id))
    }

    #[test]
    fn test_create_and_load() -> Result<()> {
        let (mut store, mut files, id) = setup()?;
        files.append_row(&id, &vec![Value::Integer(1), Value::Text("Gizmo".into()), Value::Float(19.99)])?;
        files.append_row(&id, &vec![Value::Integer(2), Value::Text("Power".into()), Value::Float(20.0)])?;

        // Paths are lowercased, names inside the table are not
        let raw = store.read_lines(Path::new("Databases/shop/product.tbl"))?;
        assert_eq!(
            raw,
            Some(vec![
                "pid int|name varchar(20)|price float".to_string(),
                "1|Gizmo|19.99".to_string(),
                "2|Power|20.0".to_string(),
            ])
        );

        let table = files.load_table(&id)?;
        assert_eq!(table.schema.encode(), "pid int|name varchar(20)|price float");
        assert_eq!(table.schema.fields[0].source.as_deref(), Some("Product"));
        assert_eq!(table.rows[1], vec![Value::Integer(2), Value::Text("Power".into()), Value::Float(20.0)]);

        assert!(!files.create_table(&id, &Schema::decode("a int")?)?);
        assert!(matches!(
            files.load_table(&TableId::new("Shop", "Nope")),
            Err(Error::TableNotFound(_))
        ));
        Ok(())
    }

    #[test]
    fn test_lock_lines() -> Result<()> {
        let (mut store, mut files, id) = setup()?;
        files.append_row(&id, &vec![Value::Integer(1), Value::Text("Gizmo".into()), Value::Float(19.99)])?;
        let before = store.read_lines(Path::new("Databases/shop/product.tbl"))?;

        let token = LockToken::generate();
        assert_eq!(files.read_lock(&id)?, None);
        files.write_lock(&id, &token)?;
        assert_eq!(files.read_lock(&id)?, Some(token.clone()));

        // The lock line is out of band for loads and headers
        assert_eq!(files.load_table(&id)?.rows.len(), 1);
        let (header_token, schema) = files.load_header(&id)?;
        assert_eq!(header_token, Some(token));
        assert_eq!(schema.len(), 3);

        files.clear_lock(&id)?;
        assert_eq!(store.read_lines(Path::new("Databases/shop/product.tbl"))?, before);
        Ok(())
    }

    #[test]
    fn test_alter_keeps_lock() -> Result<()> {
        let (_, mut files, id) = setup()?;
        files.append_row(&id, &vec![Value::Integer(1), Value::Text("Gizmo".into()), Value::Float(19.99)])?;
        let token = LockToken::new("4242");
        files.write_lock(&id, &token)?;

        files.alter_table(&id, Field::from_descriptor("stock int")?)?;
        assert_eq!(files.read_lock(&id)?, Some(token));
        let table = files.load_table(&id)?;
        assert_eq!(table.schema.encode(), "pid int|name varchar(20)|price float|stock int");
        assert_eq!(table.rows[0][3], Value::Integer(0));

        assert_eq!(
            files.alter_table(&id, Field::from_descriptor("pid float")?),
            Err(Error::DuplicateField("pid".into()))
        );
        Ok(())
    }

    #[test]
    fn test_conversion_failure_is_fatal() -> Result<()> {
        let id = TableId::new("db", "t");
        let lines = vec!["a int|b float".to_string(), "1|2.5".to_string(), "x|1".to_string()];
        assert!(matches!(decode_table(&id, &lines), Err(Error::RecordConversion(_))));

        let lines = vec!["a int|b float".to_string(), "1".to_string()];
        assert!(matches!(decode_table(&id, &lines), Err(Error::RecordConversion(_))));

        assert!(matches!(decode_table(&id, &[]), Err(Error::InvalidMetadata(_))));
        Ok(())
    }

    #[test]
    fn test_encode_rejects_separators() {
        assert!(matches!(
            encode_row(&vec![Value::Integer(1), Value::Text("a|b".into())]),
            Err(Error::RecordConversion(_))
        ));
        assert!(matches!(
            encode_row(&vec![Value::Text("line\nbreak".into())]),
            Err(Error::RecordConversion(_))
        ));
        assert!(matches!(
            encode_row(&vec![Value::Text("&x".into())]),
            Err(Error::RecordConversion(_))
        ));
    }

    fn arb_value(column: usize) -> BoxedStrategy<Value> {
        match column % 3 {
            0 => any::<i64>().prop_map(Value::Integer).boxed(),
            1 => (-1.0e9..1.0e9f64).prop_map(Value::Float).boxed(),
            _ => "[a-zA-Z0-9 _.,']{0,12}".prop_map(Value::Text).boxed(),
        }
    }

    proptest! {
        #[test]
        fn test_persist_load_roundtrip(rows in prop::collection::vec(
            (arb_value(0), arb_value(1), arb_value(2)),
            0..20,
        )) {
            let id = TableId::new("db", "t");
            let mut schema = Schema::decode("a int|b float|c varchar(10)").unwrap();
            schema.qualify("t");
            let mut table = Table::new(id.clone(), schema);
            for (a, b, c) in rows {
                table.push(vec![a, b, c]).unwrap();
            }

            let lines = encode_table(&table).unwrap();
            let (token, loaded) = decode_table(&id, &lines).unwrap();
            prop_assert_eq!(token, None);
            prop_assert_eq!(loaded, table);
        }
    }
}
