use crate::{
    error::Result,
    sql::{
        engine::Transaction,
        executor::{Executor, ResultSet},
        schema::{Field, Schema},
    },
};

/// CREATE DATABASE executor
pub struct CreateDatabase {
    name: String,
}

impl CreateDatabase {
    pub fn new(name: String) -> Box<Self> {
        Box::new(Self { name })
    }
}

impl<T: Transaction> Executor<T> for CreateDatabase {
    fn execute(self: Box<Self>, txn: &mut T) -> Result<ResultSet> {
        txn.create_database(&self.name)?;
        Ok(ResultSet::CreateDatabase { name: self.name })
    }
}

/// DROP DATABASE executor
pub struct DropDatabase {
    name: String,
}

impl DropDatabase {
    pub fn new(name: String) -> Box<Self> {
        Box::new(Self { name })
    }
}

impl<T: Transaction> Executor<T> for DropDatabase {
    fn execute(self: Box<Self>, txn: &mut T) -> Result<ResultSet> {
        txn.drop_database(&self.name)?;
        Ok(ResultSet::DropDatabase { name: self.name })
    }
}

/// USE executor
pub struct UseDatabase {
    name: String,
}

impl UseDatabase {
    pub fn new(name: String) -> Box<Self> {
        Box::new(Self { name })
    }
}

impl<T: Transaction> Executor<T> for UseDatabase {
    fn execute(self: Box<Self>, txn: &mut T) -> Result<ResultSet> {
        txn.use_database(&self.name)?;
        Ok(ResultSet::UseDatabase { name: self.name })
    }
}

/// CREATE TABLE executor
pub struct CreateTable {
    name: String,
    schema: Schema,
}

impl CreateTable {
    pub fn new(name: String, schema: Schema) -> Box<Self> {
        Box::new(Self { name, schema })
    }
}

impl<T: Transaction> Executor<T> for CreateTable {
    fn execute(self: Box<Self>, txn: &mut T) -> Result<ResultSet> {
        txn.create_table(&self.name, self.schema)?;
        Ok(ResultSet::CreateTable { table_name: self.name })
    }
}

/// DROP TABLE executor
pub struct DropTable {
    name: String,
}

impl DropTable {
    pub fn new(name: String) -> Box<Self> {
        Box::new(Self { name })
    }
}

impl<T: Transaction> Executor<T> for DropTable {
    fn execute(self: Box<Self>, txn: &mut T) -> Result<ResultSet> {
        txn.drop_table(&self.name)?;
        Ok(ResultSet::DropTable { table_name: self.name })
    }
}

/// ALTER TABLE ... ADD executor
pub struct AlterTable {
    name: String,
    field: Field,
}

impl AlterTable {
    pub fn new(name: String, field: Field) -> Box<Self> {
        Box::new(Self { name, field })
    }
}

impl<T: Transaction> Executor<T> for AlterTable {
    fn execute(self: Box<Self>, txn: &mut T) -> Result<ResultSet> {
        txn.alter_table(&self.name, self.field)?;
        Ok(ResultSet::AlterTable { table_name: self.name })
    }
}
