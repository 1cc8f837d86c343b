use crate::{
    error::{Error, Result},
    sql::{
        engine::Transaction,
        eval::{Binding, evaluate_predicate},
        executor::ResultSet,
        parser::ast::{Expression, FieldRef},
        schema::{Schema, Table},
    },
};

use super::Executor;

/// Table scan executor (FROM)
pub struct Scan {
    table_name: String,
    alias: Option<String>,
}

impl Scan {
    pub fn new(table_name: String, alias: Option<String>) -> Box<Self> {
        Box::new(Self { table_name, alias })
    }
}

impl<T: Transaction> Executor<T> for Scan {
    fn execute(self: Box<Self>, txn: &mut T) -> Result<ResultSet> {
        let mut table = txn.must_get_table(&self.table_name)?;
        // Fields answer to the alias if one is given, to the table name otherwise
        table.schema.qualify(self.alias.as_deref().unwrap_or(&self.table_name));
        Ok(ResultSet::Scan { table })
    }
}

/// Filter and projection executor (WHERE and the SELECT list)
pub struct Projection<T: Transaction> {
    source: Box<dyn Executor<T>>,
    fields: Option<Vec<FieldRef>>,
    predicate: Option<Expression>,
}

impl<T: Transaction> Projection<T> {
    pub fn new(
        source: Box<dyn Executor<T>>,
        fields: Option<Vec<FieldRef>>,
        predicate: Option<Expression>,
    ) -> Box<Self> {
        Box::new(Self { source, fields, predicate })
    }
}

impl<T: Transaction> Executor<T> for Projection<T> {
    fn execute(self: Box<Self>, txn: &mut T) -> Result<ResultSet> {
        match self.source.execute(txn)? {
            ResultSet::Scan { table } => Ok(ResultSet::Scan {
                table: project_filter(table, self.fields.as_deref(), self.predicate.as_ref())?,
            }),
            _ => Err(Error::Internal("Unexpected result set".into())),
        }
    }
}

/// Keeps the records the predicate accepts, restricted to `fields` in the
/// order given. `None` keeps every field, an absent predicate every record.
pub fn project_filter(table: Table, fields: Option<&[FieldRef]>, predicate: Option<&Expression>) -> Result<Table> {
    // Resolve field positions up front so an unknown field fails even on an empty table
    let positions = match fields {
        Some(fields) => Some(
            fields
                .iter()
                .map(|f| table.schema.resolve(f.qualifier.as_deref(), &f.name))
                .collect::<Result<Vec<_>>>()?,
        ),
        None => None,
    };

    let schema = match &positions {
        Some(positions) => Schema {
            fields: positions.iter().map(|&pos| table.schema.fields[pos].clone()).collect(),
        },
        None => table.schema.clone(),
    };

    let mut derived = Table::new(table.id.clone(), schema);
    for row in table.rows.iter() {
        if let Some(predicate) = predicate {
            if !evaluate_predicate(predicate, &Binding::single(&table.schema, row))? {
                continue;
            }
        }
        derived.rows.push(match &positions {
            Some(positions) => positions.iter().map(|&pos| row[pos].clone()).collect(),
            None => row.clone(),
        });
    }
    Ok(derived)
}

#[cfg(test)]
mod tests {
    use super::project_filter;
    use crate::{
        error::{Error, Result},
        sql::{
            parser::{Parser, ast::FieldRef},
            schema::{Schema, Table, TableId},
            types::Value,
        },
    };

    fn employees() -> Result<Table> {
        let mut schema = Schema::decode("id int|name varchar(20)|age int")?;
        schema.qualify("Employee");
        let mut table = Table::new(TableId::new("db", "Employee"), schema);
        table.push(vec![Value::Integer(1), Value::Text("Ann".into()), Value::Integer(30)])?;
        table.push(vec![Value::Integer(2), Value::Text("Bob".into()), Value::Integer(25)])?;
        table.push(vec![Value::Integer(3), Value::Text("Cid".into()), Value::Integer(41)])?;
        Ok(table)
    }

    #[test]
    fn test_filter_all_fields() -> Result<()> {
        let predicate = Parser::parse_expression_str("age >= 30")?;
        let table = project_filter(employees()?, None, Some(&predicate))?;
        assert_eq!(table.schema.encode(), "id int|name varchar(20)|age int");
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[1][1], Value::Text("Cid".into()));
        Ok(())
    }

    #[test]
    fn test_project_in_given_order() -> Result<()> {
        let fields = [FieldRef::new(None, "age"), FieldRef::new(Some("Employee"), "id")];
        let table = project_filter(employees()?, Some(&fields), None)?;
        assert_eq!(table.schema.encode(), "age int|id int");
        assert_eq!(table.rows[0], vec![Value::Integer(30), Value::Integer(1)]);
        assert_eq!(table.rows.len(), 3);
        Ok(())
    }

    #[test]
    fn test_reprojection_is_stable() -> Result<()> {
        let fields = [FieldRef::new(None, "name"), FieldRef::new(None, "age")];
        let predicate = Parser::parse_expression_str("age < 40 or name = 'Cid'")?;
        let once = project_filter(employees()?, Some(&fields), Some(&predicate))?;
        let twice = project_filter(once.clone(), Some(&fields), None)?;
        assert_eq!(once, twice);
        Ok(())
    }

    #[test]
    fn test_unknown_field() -> Result<()> {
        let mut empty = employees()?;
        empty.rows.clear();
        let fields = [FieldRef::new(None, "salary")];
        assert!(matches!(project_filter(empty, Some(&fields), None), Err(Error::UnknownField(_))));

        let predicate = Parser::parse_expression_str("salary > 1")?;
        assert!(matches!(
            project_filter(employees()?, None, Some(&predicate)),
            Err(Error::UnknownField(_))
        ));
        Ok(())
    }

    #[test]
    fn test_predicate_must_be_boolean() -> Result<()> {
        let predicate = Parser::parse_expression_str("age + 1")?;
        assert!(matches!(
            project_filter(employees()?, None, Some(&predicate)),
            Err(Error::TypeMismatch(_))
        ));
        Ok(())
    }
}
