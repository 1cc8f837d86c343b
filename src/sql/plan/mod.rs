use std::collections::BTreeMap;

use crate::{
    error::Result,
    sql::{
        engine::Transaction,
        executor::{Executor, ResultSet},
        parser::ast::{self, Expression, FieldRef, JoinType},
        schema::{Field, Schema},
    },
};

mod planner;

use planner::Planner;

/// Execution plan node
#[derive(Debug, PartialEq)]
pub enum Node {
    CreateDatabase {
        name: String,
    },
    DropDatabase {
        name: String,
    },
    UseDatabase {
        name: String,
    },
    CreateTable {
        name: String,
        schema: Schema,
    },
    DropTable {
        name: String,
    },
    AlterTable {
        name: String,
        field: Field,
    },
    Insert {
        table_name: String,
        values: Vec<Vec<Expression>>,
    },
    /// Full table read, fields qualified by alias or table name
    Scan {
        table_name: String,
        alias: Option<String>,
    },
    NestedLoopJoin {
        left: Box<Node>,
        right: Box<Node>,
        predicate: Option<Expression>,
        join_type: JoinType,
    },
    /// Filter and column selection. `fields` None keeps every field.
    Projection {
        source: Box<Node>,
        fields: Option<Vec<FieldRef>>,
        predicate: Option<Expression>,
    },
    Aggregate {
        source: Box<Node>,
        function: String,
        field: Option<FieldRef>,
    },
    Update {
        table_name: String,
        columns: BTreeMap<String, Expression>,
        predicate: Option<Expression>,
    },
    Delete {
        table_name: String,
        predicate: Option<Expression>,
    },
    Begin,
    Commit,
}

/// Execution plan wrapper
#[derive(Debug, PartialEq)]
pub struct Plan(pub Node);

impl Plan {
    pub fn build(stmt: ast::Statement) -> Result<Self> {
        Planner::new().build(stmt)
    }

    pub fn execute<T: Transaction + 'static>(self, txn: &mut T) -> Result<ResultSet> {
        <dyn Executor<T>>::build(self.0).execute(txn)
    }
}
