use crate::{
    error::Result,
    sql::{
        engine::Transaction,
        executor::{
            agg::Aggregate,
            join::NestedLoopJoin,
            mutation::{Delete, Insert, Update},
            query::{Projection, Scan},
            schema::{AlterTable, CreateDatabase, CreateTable, DropDatabase, DropTable, UseDatabase},
            transaction::{Begin, Commit},
        },
        plan::Node,
        schema::Table,
        types::Value,
    },
};

mod agg;
mod join;
mod mutation;
mod query;
mod schema;
mod transaction;

pub use agg::aggregate;
pub use join::join;
pub use query::project_filter;

/// Executor trait
pub trait Executor<T: Transaction> {
    fn execute(self: Box<Self>, txn: &mut T) -> Result<ResultSet>;
}

/// Builds an executor from a plan node
///
/// The `'static` bound is required for trait object usage in recursive executor building.
impl<T: Transaction + 'static> dyn Executor<T> {
    pub fn build(node: Node) -> Box<dyn Executor<T>> {
        match node {
            Node::CreateDatabase { name } => CreateDatabase::new(name),
            Node::DropDatabase { name } => DropDatabase::new(name),
            Node::UseDatabase { name } => UseDatabase::new(name),
            Node::CreateTable { name, schema } => CreateTable::new(name, schema),
            Node::DropTable { name } => DropTable::new(name),
            Node::AlterTable { name, field } => AlterTable::new(name, field),
            Node::Insert { table_name, values } => Insert::new(table_name, values),
            Node::Scan { table_name, alias } => Scan::new(table_name, alias),
            Node::NestedLoopJoin {
                left,
                right,
                predicate,
                join_type,
            } => NestedLoopJoin::new(Self::build(*left), Self::build(*right), predicate, join_type),
            Node::Projection {
                source,
                fields,
                predicate,
            } => Projection::new(Self::build(*source), fields, predicate),
            Node::Aggregate {
                source,
                function,
                field,
            } => Aggregate::new(Self::build(*source), function, field),
            Node::Update {
                table_name,
                columns,
                predicate,
            } => Update::new(table_name, columns, predicate),
            Node::Delete { table_name, predicate } => Delete::new(table_name, predicate),
            Node::Begin => Begin::new(),
            Node::Commit => Commit::new(),
        }
    }
}

/// Execution result set
#[derive(Debug, PartialEq)]
pub enum ResultSet {
    CreateDatabase { name: String },
    DropDatabase { name: String },
    UseDatabase { name: String },
    CreateTable { table_name: String },
    DropTable { table_name: String },
    AlterTable { table_name: String },
    Insert { count: usize },
    /// Retrieved (possibly derived) table
    Scan { table: Table },
    /// Single aggregate value with its column label, e.g. `COUNT(*)`
    Aggregate { column: String, value: Value },
    Update { count: usize },
    Delete { count: usize },
    Begin,
    Commit { tables: usize },
}

impl ResultSet {
    /// Field descriptors of a retrieval, or the label of an aggregate
    pub fn columns(&self) -> Vec<String> {
        match self {
            ResultSet::Scan { table } => table.schema.fields.iter().map(|f| f.descriptor()).collect(),
            ResultSet::Aggregate { column, .. } => vec![column.clone()],
            _ => Vec::new(),
        }
    }

    /// Records formatted as `v1|v2|...`
    pub fn rows(&self) -> Vec<String> {
        match self {
            ResultSet::Scan { table } => table
                .rows
                .iter()
                .map(|row| row.iter().map(Value::to_string).collect::<Vec<_>>().join("|"))
                .collect(),
            ResultSet::Aggregate { value, .. } => vec![value.to_string()],
            _ => Vec::new(),
        }
    }

    /// Status line of a command that changes something. None for retrievals.
    pub fn message(&self) -> Option<String> {
        Some(match self {
            ResultSet::CreateDatabase { name } => format!("Database {} created.", name),
            ResultSet::DropDatabase { name } => format!("Database {} deleted.", name),
            ResultSet::UseDatabase { name } => format!("Using database {}.", name),
            ResultSet::CreateTable { table_name } => format!("Table {} created.", table_name),
            ResultSet::DropTable { table_name } => format!("Table {} deleted.", table_name),
            ResultSet::AlterTable { table_name } => format!("Table {} modified.", table_name),
            ResultSet::Insert { count: 1 } => "1 new record inserted.".to_string(),
            ResultSet::Insert { count } => format!("{} new records inserted.", count),
            ResultSet::Update { count } => count_message(*count, "modified"),
            ResultSet::Delete { count } => count_message(*count, "deleted"),
            ResultSet::Begin => "Transaction starts.".to_string(),
            ResultSet::Commit { .. } => "Transaction committed.".to_string(),
            ResultSet::Scan { .. } | ResultSet::Aggregate { .. } => return None,
        })
    }

    /// Number of records a mutation touched
    pub fn modified(&self) -> usize {
        match self {
            ResultSet::Insert { count } | ResultSet::Update { count } | ResultSet::Delete { count } => *count,
            _ => 0,
        }
    }
}

fn count_message(count: usize, verb: &str) -> String {
    match count {
        0 => format!("No records {}.", verb),
        1 => format!("1 record {}.", verb),
        n => format!("{} records {}.", n, verb),
    }
}

#[cfg(test)]
mod tests {
    use super::ResultSet;

    #[test]
    fn test_messages() {
        assert_eq!(ResultSet::Update { count: 0 }.message().as_deref(), Some("No records modified."));
        assert_eq!(ResultSet::Update { count: 1 }.message().as_deref(), Some("1 record modified."));
        assert_eq!(ResultSet::Delete { count: 3 }.message().as_deref(), Some("3 records deleted."));
        assert_eq!(ResultSet::Insert { count: 1 }.message().as_deref(), Some("1 new record inserted."));
        assert_eq!(ResultSet::Delete { count: 3 }.modified(), 3);
        assert_eq!(ResultSet::Begin.message().as_deref(), Some("Transaction starts."));
    }
}
