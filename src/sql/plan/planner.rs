use crate::{
    error::{Error, Result},
    sql::{
        parser::ast::{self, Expression},
        plan::{Node, Plan},
        schema::{Field, Schema},
    },
};

/// Query planner - converts AST into execution plan nodes
pub struct Planner;

impl Planner {
    pub fn new() -> Self {
        Self {}
    }

    /// Builds an execution plan from an AST statement
    pub fn build(&mut self, stmt: ast::Statement) -> Result<Plan> {
        Ok(Plan(self.build_statement(stmt)?))
    }

    pub fn build_statement(&self, stmt: ast::Statement) -> Result<Node> {
        Ok(match stmt {
            ast::Statement::CreateDatabase { name } => Node::CreateDatabase { name },
            ast::Statement::DropDatabase { name } => Node::DropDatabase { name },
            ast::Statement::UseDatabase { name } => Node::UseDatabase { name },
            ast::Statement::CreateTable { name, columns } => Node::CreateTable {
                name,
                // Descriptor validation happens here, before any file is created
                schema: Schema::from_descriptors(columns)?,
            },
            ast::Statement::DropTable { name } => Node::DropTable { name },
            ast::Statement::AlterTable { name, column } => Node::AlterTable {
                name,
                field: Field::from_descriptor(&column)?,
            },
            ast::Statement::Insert { table_name, values } => Node::Insert { table_name, values },
            ast::Statement::Select {
                select,
                from,
                mut where_clause,
            } => {
                // Build scan node from FROM clause (single table or join result)
                let source = self.build_from_item(from, &mut where_clause)?;

                match select {
                    ast::SelectList::Aggregate { function, field } => {
                        let source = match where_clause {
                            Some(predicate) => Node::Projection {
                                source: Box::new(source),
                                fields: None,
                                predicate: Some(predicate),
                            },
                            None => source,
                        };
                        Node::Aggregate {
                            source: Box::new(source),
                            function,
                            field,
                        }
                    }
                    ast::SelectList::All => Node::Projection {
                        source: Box::new(source),
                        fields: None,
                        predicate: where_clause,
                    },
                    ast::SelectList::Fields(fields) => Node::Projection {
                        source: Box::new(source),
                        fields: Some(fields),
                        predicate: where_clause,
                    },
                }
            }
            ast::Statement::Update {
                table_name,
                columns,
                where_clause,
            } => Node::Update {
                table_name,
                columns,
                predicate: where_clause,
            },
            ast::Statement::Delete {
                table_name,
                where_clause,
            } => Node::Delete {
                table_name,
                predicate: where_clause,
            },
            ast::Statement::Begin => Node::Begin,
            ast::Statement::Commit => Node::Commit,
        })
    }

    /// A comma join has no ON condition and takes the WHERE condition instead,
    /// which is then consumed. A join is the last filter of a query, so WHERE
    /// after an ON condition is rejected.
    fn build_from_item(&self, item: ast::FromItem, where_clause: &mut Option<Expression>) -> Result<Node> {
        Ok(match item {
            ast::FromItem::Table { name, alias } => Node::Scan {
                table_name: name,
                alias,
            },
            ast::FromItem::Join {
                left,
                right,
                join_type,
                predicate,
            } => {
                let predicate = match (predicate, where_clause.take()) {
                    (Some(_), Some(_)) => {
                        return Err(Error::Parse("WHERE cannot follow a JOIN ... ON condition".into()));
                    }
                    (on, filter) => on.or(filter),
                };
                Node::NestedLoopJoin {
                    // Recursively build join nodes (base case: single table)
                    left: Box::new(self.build_from_item(*left, where_clause)?),
                    right: Box::new(self.build_from_item(*right, where_clause)?),
                    predicate,
                    join_type,
                }
            }
        })
    }
}
