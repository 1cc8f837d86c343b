use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, info, warn};

use crate::{
    error::{Error, Result},
    sql::schema::{Table, TableId},
    storage::{engine::Engine as StorageEngine, lock::LockToken},
};

use super::file::{FileEngine, encode_table};

/// Outcome of a successful lock request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockAcquisition {
    /// The lock line was written by this call
    Acquired,
    /// The table was already held by the active transaction
    AlreadyHeld,
}

/// State of an active transaction
#[derive(Debug)]
pub struct TransactionContext {
    pub token: LockToken,
    /// Modified tables waiting for commit
    pub staged: BTreeMap<TableId, Table>,
    /// Tables whose lock line this transaction wrote
    pub locked: BTreeSet<TableId>,
}

#[derive(Debug, Default)]
enum TransactionState {
    #[default]
    Idle,
    Active(TransactionContext),
}

/// Single-writer transaction bookkeeping for one session
///
/// Idle -> Active on begin, back to Idle on commit or abort. Locking is
/// advisory: a lock line at the top of the table file names the holder.
#[derive(Debug, Default)]
pub struct TransactionManager {
    state: TransactionState,
}

impl TransactionManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, TransactionState::Active(_))
    }

    pub fn token(&self) -> Option<&LockToken> {
        match &self.state {
            TransactionState::Active(ctx) => Some(&ctx.token),
            TransactionState::Idle => None,
        }
    }

    fn context_mut(&mut self) -> Result<&mut TransactionContext> {
        match &mut self.state {
            TransactionState::Active(ctx) => Ok(ctx),
            TransactionState::Idle => Err(Error::NoActiveTransaction),
        }
    }

    /// Starts a transaction with a fresh token
    pub fn begin(&mut self) -> Result<&LockToken> {
        if self.is_active() {
            return Err(Error::TransactionAlreadyActive);
        }
        let token = LockToken::generate();
        info!("transaction {} started", token);
        self.state = TransactionState::Active(TransactionContext {
            token,
            staged: BTreeMap::new(),
            locked: BTreeSet::new(),
        });
        Ok(&self.context_mut()?.token)
    }

    /// The staged copy of a table, if this transaction modified it
    pub fn staged(&self, id: &TableId) -> Option<&Table> {
        match &self.state {
            TransactionState::Active(ctx) => ctx.staged.get(id),
            TransactionState::Idle => None,
        }
    }

    pub fn staged_mut(&mut self, id: &TableId) -> Option<&mut Table> {
        match &mut self.state {
            TransactionState::Active(ctx) => ctx.staged.get_mut(id),
            TransactionState::Idle => None,
        }
    }

    /// Keeps a modified table until commit, replacing any earlier copy
    pub fn stage(&mut self, table: Table) -> Result<()> {
        let ctx = self.context_mut()?;
        debug!("staged table {} with {} records", table.id, table.rows.len());
        ctx.staged.insert(table.id.clone(), table);
        Ok(())
    }

    /// Forgets a table that no longer exists
    pub fn discard_table(&mut self, id: &TableId) {
        if let TransactionState::Active(ctx) = &mut self.state {
            ctx.staged.remove(id);
            ctx.locked.remove(id);
        }
    }

    /// Forgets every table of a database that no longer exists
    pub fn discard_database(&mut self, database: &str) {
        if let TransactionState::Active(ctx) = &mut self.state {
            ctx.staged.retain(|id, _| !id.database.eq_ignore_ascii_case(database));
            ctx.locked.retain(|id| !id.database.eq_ignore_ascii_case(database));
        }
    }

    /// Takes the lock on a table for the active transaction
    pub fn acquire_lock<E: StorageEngine>(
        &mut self,
        files: &mut FileEngine<E>,
        id: &TableId,
    ) -> Result<LockAcquisition> {
        let ctx = self.context_mut()?;
        match files.read_lock(id)? {
            Some(holder) if holder == ctx.token => {
                ctx.locked.insert(id.clone());
                Ok(LockAcquisition::AlreadyHeld)
            }
            Some(holder) => {
                warn!("table {} is locked by {}", id, holder);
                Err(Error::TableLocked(id.name.clone()))
            }
            None => {
                files.write_lock(id, &ctx.token)?;
                ctx.locked.insert(id.clone());
                debug!("transaction {} locked table {}", ctx.token, id);
                Ok(LockAcquisition::Acquired)
            }
        }
    }

    /// Removes the lock line if the active transaction wrote it
    pub fn release_lock<E: StorageEngine>(&mut self, files: &mut FileEngine<E>, id: &TableId) -> Result<()> {
        let ctx = self.context_mut()?;
        if files.read_lock(id)?.as_ref() == Some(&ctx.token) {
            files.clear_lock(id)?;
            debug!("transaction {} released table {}", ctx.token, id);
        }
        ctx.locked.remove(id);
        Ok(())
    }

    /// Writes every staged table back and releases all locks. Returns the
    /// number of tables written. The manager is Idle afterwards even if a
    /// write fails, and no lock line of this transaction is left behind.
    pub fn commit<E: StorageEngine>(&mut self, files: &mut FileEngine<E>) -> Result<usize> {
        let ctx = match std::mem::take(&mut self.state) {
            TransactionState::Active(ctx) => ctx,
            TransactionState::Idle => return Err(Error::NoActiveTransaction),
        };

        if let Err(err) = write_staged(files, &ctx) {
            warn!("commit of transaction {} failed: {}", ctx.token, err);
            for id in &ctx.locked {
                if let Err(release_err) = release_if_held(files, id, &ctx.token) {
                    warn!("could not release table {}: {}", id, release_err);
                }
            }
            return Err(err);
        }
        for id in ctx.locked.iter().filter(|id| !ctx.staged.contains_key(*id)) {
            release_if_held(files, id, &ctx.token)?;
        }
        info!("transaction {} committed {} tables", ctx.token, ctx.staged.len());
        Ok(ctx.staged.len())
    }

    /// Drops staged tables and releases the locks this transaction wrote
    pub fn abort<E: StorageEngine>(&mut self, files: &mut FileEngine<E>) -> Result<()> {
        let ctx = match std::mem::take(&mut self.state) {
            TransactionState::Active(ctx) => ctx,
            TransactionState::Idle => return Err(Error::NoActiveTransaction),
        };

        for id in &ctx.locked {
            release_if_held(files, id, &ctx.token)?;
        }
        info!("transaction {} aborted, {} staged tables discarded", ctx.token, ctx.staged.len());
        Ok(())
    }
}

/// Encodes every staged table before the first file is rewritten
fn write_staged<E: StorageEngine>(files: &mut FileEngine<E>, ctx: &TransactionContext) -> Result<()> {
    let encoded = ctx
        .staged
        .values()
        .map(|table| Ok((&table.id, encode_table(table)?)))
        .collect::<Result<Vec<_>>>()?;
    for (id, lines) in encoded {
        // The rewritten file has no lock line
        files.write_table(id, &lines)?;
    }
    Ok(())
}

/// Clears a lock line only when it carries the given token
fn release_if_held<E: StorageEngine>(files: &mut FileEngine<E>, id: &TableId, token: &LockToken) -> Result<()> {
    if !files.table_exists(id)? {
        return Ok(());
    }
    if files.read_lock(id)?.as_ref() == Some(token) {
        files.clear_lock(id)?;
    }
    Ok(())
}
