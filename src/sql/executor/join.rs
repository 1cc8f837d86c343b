use crate::{
    error::{Error, Result},
    sql::{
        engine::Transaction,
        eval::{Binding, evaluate_predicate},
        parser::ast::{Expression, JoinType},
        schema::Table,
        types::{Row, Value},
    },
};

use super::{Executor, ResultSet};

/// Nested Loop Join executor - pairs every left record with every right record
pub struct NestedLoopJoin<T: Transaction> {
    left: Box<dyn Executor<T>>,
    right: Box<dyn Executor<T>>,
    predicate: Option<Expression>,
    join_type: JoinType,
}

impl<T: Transaction> NestedLoopJoin<T> {
    pub fn new(
        left: Box<dyn Executor<T>>,
        right: Box<dyn Executor<T>>,
        predicate: Option<Expression>,
        join_type: JoinType,
    ) -> Box<Self> {
        Box::new(Self {
            left,
            right,
            predicate,
            join_type,
        })
    }
}

impl<T: Transaction> Executor<T> for NestedLoopJoin<T> {
    fn execute(self: Box<Self>, txn: &mut T) -> Result<ResultSet> {
        // Execute left side first
        let ResultSet::Scan { table: left } = self.left.execute(txn)? else {
            return Err(Error::Internal("Unexpected result set".into()));
        };
        let ResultSet::Scan { table: right } = self.right.execute(txn)? else {
            return Err(Error::Internal("Unexpected result set".into()));
        };
        Ok(ResultSet::Scan {
            table: join(left, right, self.predicate.as_ref(), self.join_type)?,
        })
    }
}

/// Joins two tables whose fields are already qualified by their alias.
///
/// Rows are `left ++ right`. Outer joins then add every record of the
/// preserved side whose values do not show up, at that side's positions, in
/// any row produced so far, padding the other side with empty text.
pub fn join(left: Table, right: Table, predicate: Option<&Expression>, join_type: JoinType) -> Result<Table> {
    let schema = left.schema.concat(&right.schema);
    let left_len = left.schema.len();
    let mut joined = Table::new(left.id.clone(), schema);

    // Nested loop: for each left row, iterate through all right rows
    for lrow in &left.rows {
        for rrow in &right.rows {
            let matched = match predicate {
                Some(expr) => evaluate_predicate(
                    expr,
                    &Binding::pair((&left.schema, lrow), (&right.schema, rrow)),
                )?,
                // No predicate means CROSS JOIN
                None => true,
            };
            if matched {
                joined.rows.push(concat(lrow, rrow));
            }
        }
    }

    match join_type {
        JoinType::Inner => {}
        JoinType::Left => {
            let padding = empty_row(right.schema.len());
            for lrow in &left.rows {
                if !joined.rows.iter().any(|row| row[..left_len] == lrow[..]) {
                    joined.rows.push(concat(lrow, &padding));
                }
            }
        }
        JoinType::Right => {
            let padding = empty_row(left_len);
            for rrow in &right.rows {
                if !joined.rows.iter().any(|row| row[left_len..] == rrow[..]) {
                    joined.rows.push(concat(&padding, rrow));
                }
            }
        }
    }
    Ok(joined)
}

fn concat(left: &Row, right: &Row) -> Row {
    let mut row = left.clone();
    row.extend(right.iter().cloned());
    row
}

fn empty_row(len: usize) -> Row {
    vec![Value::Text(String::new()); len]
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::join;
    use crate::{
        error::{Error, Result},
        sql::{
            parser::{Parser, ast::JoinType},
            schema::{Schema, Table, TableId},
            types::Value,
        },
    };

    fn table(name: &str, alias: &str, schema: &str, rows: Vec<Vec<Value>>) -> Result<Table> {
        let mut schema = Schema::decode(schema)?;
        schema.qualify(alias);
        let mut table = Table::new(TableId::new("db", name), schema);
        for row in rows {
            table.push(row)?;
        }
        Ok(table)
    }

    fn int(i: i64) -> Value {
        Value::Integer(i)
    }

    fn text(s: &str) -> Value {
        Value::Text(s.into())
    }

    fn employees() -> Result<Table> {
        table(
            "Employee",
            "E",
            "id int|name varchar(20)",
            vec![vec![int(1), text("Ann")], vec![int(5), text("Bob")], vec![int(7), text("Cid")]],
        )
    }

    fn sales() -> Result<Table> {
        table(
            "Sales",
            "S",
            "employeeID int|amount float",
            vec![vec![int(5), Value::Float(9.5)], vec![int(5), Value::Float(1.0)], vec![int(9), Value::Float(2.0)]],
        )
    }

    #[test]
    fn test_inner_join() -> Result<()> {
        let predicate = Parser::parse_expression_str("E.id = S.employeeID")?;
        let joined = join(employees()?, sales()?, Some(&predicate), JoinType::Inner)?;
        assert_eq!(joined.schema.encode(), "id int|name varchar(20)|employeeID int|amount float");
        assert_eq!(
            joined.rows,
            vec![
                vec![int(5), text("Bob"), int(5), Value::Float(9.5)],
                vec![int(5), text("Bob"), int(5), Value::Float(1.0)],
            ]
        );
        Ok(())
    }

    #[test]
    fn test_left_outer_join() -> Result<()> {
        let predicate = Parser::parse_expression_str("E.id = S.employeeID")?;
        let joined = join(employees()?, sales()?, Some(&predicate), JoinType::Left)?;
        assert_eq!(joined.rows.len(), 4);
        assert_eq!(joined.rows[2], vec![int(1), text("Ann"), text(""), text("")]);
        assert_eq!(joined.rows[3], vec![int(7), text("Cid"), text(""), text("")]);
        Ok(())
    }

    #[test]
    fn test_right_outer_join() -> Result<()> {
        let predicate = Parser::parse_expression_str("E.id = S.employeeID")?;
        let joined = join(employees()?, sales()?, Some(&predicate), JoinType::Right)?;
        assert_eq!(joined.rows.len(), 3);
        assert_eq!(joined.rows[2], vec![text(""), text(""), int(9), Value::Float(2.0)]);
        Ok(())
    }

    #[test]
    fn test_outer_join_dedups_by_value() -> Result<()> {
        // Two identical unmatched left records yield one padded row
        let left = table("a", "a", "x int", vec![vec![int(1)], vec![int(1)]])?;
        let right = table("b", "b", "y int", vec![vec![int(2)]])?;
        let predicate = Parser::parse_expression_str("a.x = b.y")?;
        let joined = join(left, right, Some(&predicate), JoinType::Left)?;
        assert_eq!(joined.rows, vec![vec![int(1), text("")]]);
        Ok(())
    }

    #[test]
    fn test_same_field_names() -> Result<()> {
        let left = table("t", "x", "id int", vec![vec![int(1)], vec![int(2)]])?;
        let right = table("t", "y", "id int", vec![vec![int(2)]])?;

        let predicate = Parser::parse_expression_str("x.id = y.id")?;
        let joined = join(left.clone(), right.clone(), Some(&predicate), JoinType::Inner)?;
        assert_eq!(joined.rows, vec![vec![int(2), int(2)]]);

        let ambiguous = Parser::parse_expression_str("id = 2")?;
        assert!(matches!(
            join(left, right, Some(&ambiguous), JoinType::Inner),
            Err(Error::UnknownField(_))
        ));
        Ok(())
    }

    #[test]
    fn test_cross_join() -> Result<()> {
        let joined = join(employees()?, sales()?, None, JoinType::Inner)?;
        assert_eq!(joined.rows.len(), 9);
        Ok(())
    }

    proptest! {
        #[test]
        fn prop_join_sizes(
            lvals in prop::collection::vec(0i64..5, 0..8),
            rvals in prop::collection::vec(0i64..5, 0..8),
        ) {
            let left = table("l", "l", "a int", lvals.iter().map(|&v| vec![int(v)]).collect()).unwrap();
            let right = table("r", "r", "b int", rvals.iter().map(|&v| vec![int(v)]).collect()).unwrap();
            let predicate = Parser::parse_expression_str("l.a = r.b").unwrap();

            let pairs = lvals.iter().map(|l| rvals.iter().filter(|r| *r == l).count()).sum::<usize>();
            let inner = join(left.clone(), right.clone(), Some(&predicate), JoinType::Inner).unwrap();
            prop_assert_eq!(inner.rows.len(), pairs);
            prop_assert!(inner.rows.len() <= lvals.len() * rvals.len());

            // Every left value shows up at least once in a left outer join
            let outer = join(left, right, Some(&predicate), JoinType::Left).unwrap();
            for v in &lvals {
                prop_assert!(outer.rows.iter().any(|row| row[0] == int(*v)));
            }
            prop_assert!(outer.rows.len() >= pairs);
        }
    }
}
