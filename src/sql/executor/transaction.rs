use crate::{
    error::Result,
    sql::{
        engine::Transaction,
        executor::{Executor, ResultSet},
    },
};

/// BEGIN executor
pub struct Begin;

impl Begin {
    pub fn new() -> Box<Self> {
        Box::new(Self {})
    }
}

impl<T: Transaction> Executor<T> for Begin {
    fn execute(self: Box<Self>, txn: &mut T) -> Result<ResultSet> {
        txn.begin()?;
        Ok(ResultSet::Begin)
    }
}

/// COMMIT executor
pub struct Commit;

impl Commit {
    pub fn new() -> Box<Self> {
        Box::new(Self {})
    }
}

impl<T: Transaction> Executor<T> for Commit {
    fn execute(self: Box<Self>, txn: &mut T) -> Result<ResultSet> {
        let tables = txn.commit()?;
        Ok(ResultSet::Commit { tables })
    }
}
