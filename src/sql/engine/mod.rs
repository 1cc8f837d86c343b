use tracing::{info, warn};

use crate::{
    error::{Error, Result},
    sql::{
        executor::ResultSet,
        parser::Parser,
        plan::Plan,
        schema::{Field, Schema, Table, TableId},
        types::Row,
    },
    storage::engine::Engine as StorageEngine,
};

pub mod file;
pub mod txn;

use file::FileEngine;
use txn::{LockAcquisition, TransactionManager};

/// Operations the executors run against (DDL, DML and transaction control)
///
/// Table names are resolved against the database selected with USE.
pub trait Transaction {
    fn begin(&mut self) -> Result<()>;
    /// Returns the number of tables written
    fn commit(&mut self) -> Result<usize>;
    fn abort(&mut self) -> Result<()>;
    fn in_transaction(&self) -> bool;

    fn create_database(&mut self, name: &str) -> Result<()>;
    fn drop_database(&mut self, name: &str) -> Result<()>;
    fn use_database(&mut self, name: &str) -> Result<()>;

    fn create_table(&mut self, name: &str, schema: Schema) -> Result<()>;
    fn drop_table(&mut self, name: &str) -> Result<()>;
    /// Adds a field, filling existing records with the type's zero value
    fn alter_table(&mut self, name: &str, field: Field) -> Result<()>;

    /// Loads a table, preferring the copy staged by the active transaction
    fn get_table(&mut self, name: &str) -> Result<Option<Table>>;
    /// Returns table info, returns error if table doesn't exist
    fn must_get_table(&mut self, name: &str) -> Result<Table> {
        self.get_table(name)?
            .ok_or_else(|| Error::TableNotFound(name.to_string()))
    }
    /// Reads the schema without loading records
    fn get_schema(&mut self, name: &str) -> Result<(TableId, Schema)>;

    /// Adds records to a table. Either every record is written or none is.
    fn append_rows(&mut self, id: &TableId, rows: Vec<Row>) -> Result<()>;
    /// Locks a table for the active transaction. A table held by another
    /// transaction aborts the active one.
    fn lock_table(&mut self, id: &TableId) -> Result<LockAcquisition>;
    fn unlock_table(&mut self, id: &TableId) -> Result<()>;
    /// Keeps a modified table until commit
    fn stage_table(&mut self, table: Table) -> Result<()>;
}

/// Transaction handle over flat files, holding the session's state
pub struct FileTransaction<E: StorageEngine> {
    files: FileEngine<E>,
    manager: TransactionManager,
    database: Option<String>,
}

impl<E: StorageEngine> FileTransaction<E> {
    pub fn new(files: FileEngine<E>) -> Self {
        Self {
            files,
            manager: TransactionManager::new(),
            database: None,
        }
    }

    fn table_id(&self, name: &str) -> Result<TableId> {
        match &self.database {
            Some(database) => Ok(TableId::new(database.as_str(), name)),
            None => Err(Error::NoDatabaseSelected),
        }
    }

    /// Fails if another transaction holds the table
    fn check_not_foreign(&mut self, id: &TableId) -> Result<()> {
        match self.files.read_lock(id)? {
            Some(holder) if Some(&holder) != self.manager.token() => {
                warn!("table {} is locked by {}", id, holder);
                Err(Error::TableLocked(id.name.clone()))
            }
            _ => Ok(()),
        }
    }

    fn require_table(&mut self, id: &TableId) -> Result<()> {
        if !self.files.table_exists(id)? {
            return Err(Error::TableNotFound(id.name.clone()));
        }
        Ok(())
    }
}

impl<E: StorageEngine> Transaction for FileTransaction<E> {
    fn begin(&mut self) -> Result<()> {
        self.manager.begin()?;
        Ok(())
    }

    fn commit(&mut self) -> Result<usize> {
        self.manager.commit(&mut self.files)
    }

    fn abort(&mut self) -> Result<()> {
        self.manager.abort(&mut self.files)
    }

    fn in_transaction(&self) -> bool {
        self.manager.is_active()
    }

    fn create_database(&mut self, name: &str) -> Result<()> {
        if !self.files.create_database(name)? {
            return Err(Error::DatabaseAlreadyExists(name.to_string()));
        }
        info!("created database {}", name);
        Ok(())
    }

    fn drop_database(&mut self, name: &str) -> Result<()> {
        if !self.files.drop_database(name)? {
            return Err(Error::DatabaseNotFound(name.to_string()));
        }
        self.manager.discard_database(name);
        // Names differing only in case share a directory
        if self.database.as_deref().is_some_and(|used| used.eq_ignore_ascii_case(name)) {
            self.database = None;
        }
        info!("dropped database {}", name);
        Ok(())
    }

    fn use_database(&mut self, name: &str) -> Result<()> {
        if !self.files.database_exists(name)? {
            return Err(Error::DatabaseNotFound(name.to_string()));
        }
        self.database = Some(name.to_string());
        Ok(())
    }

    fn create_table(&mut self, name: &str, schema: Schema) -> Result<()> {
        let id = self.table_id(name)?;
        if !self.files.create_table(&id, &schema)? {
            return Err(Error::TableAlreadyExists(name.to_string()));
        }
        info!("created table {} ({})", id, schema);
        Ok(())
    }

    fn drop_table(&mut self, name: &str) -> Result<()> {
        let id = self.table_id(name)?;
        self.require_table(&id)?;
        self.check_not_foreign(&id)?;
        self.files.drop_table(&id)?;
        self.manager.discard_table(&id);
        info!("dropped table {}", id);
        Ok(())
    }

    fn alter_table(&mut self, name: &str, field: Field) -> Result<()> {
        let id = self.table_id(name)?;
        self.require_table(&id)?;
        self.check_not_foreign(&id)?;
        if let Some(staged) = self.manager.staged_mut(&id) {
            file::add_field(staged, field.clone())?;
        }
        self.files.alter_table(&id, field)?;
        info!("altered table {}", id);
        Ok(())
    }

    fn get_table(&mut self, name: &str) -> Result<Option<Table>> {
        let id = self.table_id(name)?;
        if let Some(table) = self.manager.staged(&id) {
            return Ok(Some(table.clone()));
        }
        if !self.files.table_exists(&id)? {
            return Ok(None);
        }
        self.files.load_table(&id).map(Some)
    }

    fn get_schema(&mut self, name: &str) -> Result<(TableId, Schema)> {
        let id = self.table_id(name)?;
        if let Some(table) = self.manager.staged(&id) {
            return Ok((id, table.schema.clone()));
        }
        let (_, schema) = self.files.load_header(&id)?;
        Ok((id, schema))
    }

    fn append_rows(&mut self, id: &TableId, rows: Vec<Row>) -> Result<()> {
        for row in &rows {
            file::encode_row(row)?;
        }
        // Rows for a staged table go to the staged copy, or commit would lose them
        if let Some(staged) = self.manager.staged_mut(id) {
            let mut updated = staged.clone();
            for row in rows {
                updated.push(row)?;
            }
            *staged = updated;
            return Ok(());
        }
        self.check_not_foreign(id)?;
        for row in &rows {
            self.files.append_row(id, row)?;
        }
        Ok(())
    }

    fn lock_table(&mut self, id: &TableId) -> Result<LockAcquisition> {
        match self.manager.acquire_lock(&mut self.files, id) {
            Err(Error::TableLocked(name)) => {
                warn!("aborting transaction, table {} is locked", id);
                self.manager.abort(&mut self.files)?;
                Err(Error::TableLocked(name))
            }
            result => result,
        }
    }

    fn unlock_table(&mut self, id: &TableId) -> Result<()> {
        self.manager.release_lock(&mut self.files, id)
    }

    fn stage_table(&mut self, table: Table) -> Result<()> {
        self.manager.stage(table)
    }
}

/// Session for executing statements against one data directory
pub struct Session<E: StorageEngine> {
    txn: FileTransaction<E>,
}

impl<E: StorageEngine + 'static> Session<E> {
    /// Opens a session, creating the data directory if needed
    pub fn new(mut files: FileEngine<E>) -> Result<Self> {
        files.init()?;
        Ok(Self { txn: FileTransaction::new(files) })
    }

    /// Executes a statement
    pub fn execute(&mut self, text: &str) -> Result<ResultSet> {
        let stmt = Parser::new(text).parse()?;
        Plan::build(stmt)?.execute(&mut self.txn)
    }

    pub fn in_transaction(&self) -> bool {
        self.txn.in_transaction()
    }

    pub fn database(&self) -> Option<&str> {
        self.txn.database.as_deref()
    }
}

impl<E: StorageEngine> Drop for Session<E> {
    /// An open transaction does not outlive its session
    fn drop(&mut self) {
        if self.txn.in_transaction() {
            warn!("session closed with an open transaction, aborting");
            if let Err(err) = self.txn.abort() {
                warn!("abort failed: {}", err);
            }
        }
    }
}
