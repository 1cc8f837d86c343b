use std::collections::BTreeMap;

use tracing::debug;

use crate::{
    error::{Error, Result},
    sql::{
        engine::{Transaction, file, txn::LockAcquisition},
        eval::{Binding, apply_assignments, evaluate, evaluate_predicate},
        executor::ResultSet,
        parser::ast::Expression,
        schema::{Schema, Table},
        types::Row,
    },
};

use super::Executor;

/// INSERT executor
pub struct Insert {
    table_name: String,
    values: Vec<Vec<Expression>>,
}

impl Insert {
    pub fn new(table_name: String, values: Vec<Vec<Expression>>) -> Box<Self> {
        Box::new(Self { table_name, values })
    }
}

/// Evaluates one VALUES tuple into a record of the table's field types
fn make_row(schema: &Schema, values: &[Expression]) -> Result<Row> {
    if values.len() != schema.len() {
        return Err(Error::RecordConversion(format!(
            "expected {} values, got {}",
            schema.len(),
            values.len()
        )));
    }
    schema
        .fields
        .iter()
        .zip(values)
        .map(|(field, expr)| evaluate(expr, &Binding::empty())?.cast(field.datatype))
        .collect()
}

impl<T: Transaction> Executor<T> for Insert {
    fn execute(self: Box<Self>, txn: &mut T) -> Result<ResultSet> {
        let (id, schema) = txn.get_schema(&self.table_name)?;
        // Every tuple is checked before the first one is written
        let rows = self
            .values
            .iter()
            .map(|values| make_row(&schema, values))
            .collect::<Result<Vec<_>>>()?;

        let count = rows.len();
        txn.append_rows(&id, rows)?;
        Ok(ResultSet::Insert { count })
    }
}

/// UPDATE executor
pub struct Update {
    table_name: String,
    columns: BTreeMap<String, Expression>,
    predicate: Option<Expression>,
}

impl Update {
    pub fn new(
        table_name: String,
        columns: BTreeMap<String, Expression>,
        predicate: Option<Expression>,
    ) -> Box<Self> {
        Box::new(Self {
            table_name,
            columns,
            predicate,
        })
    }
}

impl<T: Transaction> Executor<T> for Update {
    fn execute(self: Box<Self>, txn: &mut T) -> Result<ResultSet> {
        if !txn.in_transaction() {
            return Err(Error::NoActiveTransaction);
        }
        let table = txn.must_get_table(&self.table_name)?;
        let assignments = self
            .columns
            .into_iter()
            .map(|(name, expr)| Ok((table.schema.resolve(None, &name)?, expr)))
            .collect::<Result<Vec<_>>>()?;

        let predicate = self.predicate;
        let count = with_lock(txn, table, |table| {
            let mut count = 0;
            let mut rows = Vec::with_capacity(table.rows.len());
            for row in table.rows.iter() {
                if accepts(predicate.as_ref(), &table.schema, row)? {
                    let updated = apply_assignments(&table.schema, row, &assignments)?;
                    // A record the file format cannot hold fails here, not at commit
                    file::encode_row(&updated)?;
                    rows.push(updated);
                    count += 1;
                } else {
                    rows.push(row.clone());
                }
            }
            table.rows = rows;
            Ok(count)
        })?;
        Ok(ResultSet::Update { count })
    }
}

/// DELETE executor
pub struct Delete {
    table_name: String,
    predicate: Option<Expression>,
}

impl Delete {
    pub fn new(table_name: String, predicate: Option<Expression>) -> Box<Self> {
        Box::new(Self { table_name, predicate })
    }
}

impl<T: Transaction> Executor<T> for Delete {
    fn execute(self: Box<Self>, txn: &mut T) -> Result<ResultSet> {
        if !txn.in_transaction() {
            return Err(Error::NoActiveTransaction);
        }
        let table = txn.must_get_table(&self.table_name)?;

        let predicate = self.predicate;
        let count = with_lock(txn, table, |table| {
            let mut kept = Vec::with_capacity(table.rows.len());
            for row in table.rows.iter() {
                if !accepts(predicate.as_ref(), &table.schema, row)? {
                    kept.push(row.clone());
                }
            }
            let count = table.rows.len() - kept.len();
            table.rows = kept;
            Ok(count)
        })?;
        Ok(ResultSet::Delete { count })
    }
}

fn accepts(predicate: Option<&Expression>, schema: &Schema, row: &Row) -> Result<bool> {
    match predicate {
        Some(predicate) => evaluate_predicate(predicate, &Binding::single(schema, row)),
        None => Ok(true),
    }
}

/// Runs a modification under the table lock and stages the result. A lock
/// taken by this call is given back when nothing changed or the modification
/// failed, so the file stays as it was.
fn with_lock<T, F>(txn: &mut T, mut table: Table, modify: F) -> Result<usize>
where
    T: Transaction,
    F: FnOnce(&mut Table) -> Result<usize>,
{
    let id = table.id.clone();
    let acquisition = txn.lock_table(&id)?;
    let count = match modify(&mut table) {
        Ok(count) => count,
        Err(err) => {
            if acquisition == LockAcquisition::Acquired {
                txn.unlock_table(&id)?;
            }
            return Err(err);
        }
    };

    if count > 0 {
        debug!("{} records changed in {}", count, id);
        txn.stage_table(table)?;
    } else if acquisition == LockAcquisition::Acquired {
        txn.unlock_table(&id)?;
    }
    Ok(count)
}
