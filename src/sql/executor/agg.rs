use std::cmp::Ordering;

use crate::{
    error::{Error, Result},
    sql::{
        engine::Transaction,
        parser::ast::FieldRef,
        schema::Table,
        types::{DataType, Row, Value},
    },
};

use super::{Executor, ResultSet};

/// Aggregate executor - computes one aggregate function (COUNT, MAX, MIN, AVG)
pub struct Aggregate<T: Transaction> {
    source: Box<dyn Executor<T>>,
    function: String,
    field: Option<FieldRef>,
}

impl<T: Transaction> Aggregate<T> {
    pub fn new(source: Box<dyn Executor<T>>, function: String, field: Option<FieldRef>) -> Box<Self> {
        Box::new(Self { source, function, field })
    }
}

impl<T: Transaction> Executor<T> for Aggregate<T> {
    fn execute(self: Box<Self>, txn: &mut T) -> Result<ResultSet> {
        if let ResultSet::Scan { table } = self.source.execute(txn)? {
            let (column, value) = aggregate(&table, &self.function, self.field.as_ref())?;
            return Ok(ResultSet::Aggregate { column, value });
        }
        Err(Error::Internal("Unexpected result set".into()))
    }
}

/// Computes an aggregate over every record of a table. Returns the column
/// label, e.g. `AVG(price)`, along with the value.
pub fn aggregate(table: &Table, function: &str, field: Option<&FieldRef>) -> Result<(String, Value)> {
    let label = format!(
        "{}({})",
        function.to_uppercase(),
        field.map_or_else(|| "*".to_string(), FieldRef::to_string)
    );
    let calculator = <dyn Calculator>::build(function)?;
    let pos = match field {
        Some(f) => Some(table.schema.resolve(f.qualifier.as_deref(), &f.name)?),
        None => None,
    };
    // Checked against the schema so an empty table fails the same way
    if let Some(pos) = pos {
        let datatype = table.schema.fields[pos].datatype;
        if !calculator.accepts(datatype) {
            return Err(Error::TypeMismatch(format!("{} does not accept a {} field", label, datatype)));
        }
    }
    let value = calculator.calc(pos, &table.rows).map_err(|err| match err {
        Error::EmptyAggregate(_) => Error::EmptyAggregate(label.clone()),
        err => err,
    })?;
    Ok((label, value))
}

/// Trait for aggregate function calculations
pub trait Calculator {
    /// `pos` is the aggregated field, None for `*`
    fn calc(&self, pos: Option<usize>, rows: &[Row]) -> Result<Value>;

    /// Whether a field of this type can be aggregated
    fn accepts(&self, _datatype: DataType) -> bool {
        true
    }
}

impl dyn Calculator {
    /// Runtime dispatch to appropriate calculator based on function name
    pub fn build(func_name: &str) -> Result<Box<dyn Calculator>> {
        Ok(match func_name.to_uppercase().as_ref() {
            "COUNT" => Count::new(),
            "MIN" => Extreme::new(Ordering::Less),
            "MAX" => Extreme::new(Ordering::Greater),
            "AVG" => Avg::new(),
            _ => return Err(Error::Parse(format!("unknown aggregate function {}", func_name))),
        })
    }
}

fn field_values(pos: Option<usize>, rows: &[Row]) -> Result<impl Iterator<Item = &Value>> {
    let pos = pos.ok_or_else(|| Error::Parse("only COUNT accepts *".into()))?;
    Ok(rows.iter().map(move |row| &row[pos]))
}

/// COUNT - number of records, whatever the field
pub struct Count;

impl Count {
    fn new() -> Box<Self> {
        Box::new(Self {})
    }
}

impl Calculator for Count {
    fn calc(&self, _pos: Option<usize>, rows: &[Row]) -> Result<Value> {
        Ok(Value::Integer(rows.len() as i64))
    }
}

/// MIN and MAX - the value ordered first in the given direction
pub struct Extreme {
    wanted: Ordering,
}

impl Extreme {
    fn new(wanted: Ordering) -> Box<Self> {
        Box::new(Self { wanted })
    }
}

impl Calculator for Extreme {
    fn calc(&self, pos: Option<usize>, rows: &[Row]) -> Result<Value> {
        let mut best: Option<&Value> = None;
        for value in field_values(pos, rows)? {
            best = match best {
                None => Some(value),
                Some(current) => match value.partial_cmp(current) {
                    Some(o) if o == self.wanted => Some(value),
                    Some(_) => Some(current),
                    None => {
                        return Err(Error::TypeMismatch(format!("cannot compare {} with {}", value, current)));
                    }
                },
            };
        }
        best.cloned().ok_or_else(|| Error::EmptyAggregate(String::new()))
    }
}

/// AVG - mean of a numeric field, always a float
pub struct Avg;

impl Avg {
    fn new() -> Box<Self> {
        Box::new(Self {})
    }
}

impl Calculator for Avg {
    fn accepts(&self, datatype: DataType) -> bool {
        datatype != DataType::Text
    }

    fn calc(&self, pos: Option<usize>, rows: &[Row]) -> Result<Value> {
        let mut sum = 0.0;
        let mut count = 0usize;
        for value in field_values(pos, rows)? {
            sum += value
                .as_f64()
                .ok_or_else(|| Error::TypeMismatch(format!("cannot average text '{}'", value)))?;
            count += 1;
        }
        if count == 0 {
            return Err(Error::EmptyAggregate(String::new()));
        }
        Ok(Value::Float(sum / count as f64))
    }
}

#[cfg(test)]
mod tests {
    use super::aggregate;
    use crate::{
        error::{Error, Result},
        sql::{
            parser::ast::FieldRef,
            schema::{Schema, Table, TableId},
            types::Value,
        },
    };

    fn products() -> Result<Table> {
        let mut schema = Schema::decode("name text|price float|stock int")?;
        schema.qualify("Product");
        let mut table = Table::new(TableId::new("db", "Product"), schema);
        table.push(vec![Value::Text("pen".into()), Value::Float(1.5), Value::Integer(10)])?;
        table.push(vec![Value::Text("cup".into()), Value::Float(4.0), Value::Integer(3)])?;
        table.push(vec![Value::Text("mug".into()), Value::Float(3.5), Value::Integer(8)])?;
        Ok(table)
    }

    #[test]
    fn test_count() -> Result<()> {
        let table = products()?;
        assert_eq!(aggregate(&table, "count", None)?, ("COUNT(*)".to_string(), Value::Integer(3)));
        let (label, value) = aggregate(&table, "COUNT", Some(&FieldRef::new(None, "stock")))?;
        assert_eq!(label, "COUNT(stock)");
        assert_eq!(value, Value::Integer(3));
        Ok(())
    }

    #[test]
    fn test_min_max() -> Result<()> {
        let table = products()?;
        let price = FieldRef::new(None, "price");
        let name = FieldRef::new(Some("Product"), "name");
        assert_eq!(aggregate(&table, "max", Some(&price))?.1, Value::Float(4.0));
        assert_eq!(aggregate(&table, "min", Some(&price))?.1, Value::Float(1.5));
        // Text orders lexicographically
        assert_eq!(aggregate(&table, "max", Some(&name))?, ("MAX(Product.name)".into(), Value::Text("pen".into())));
        assert_eq!(aggregate(&table, "min", Some(&name))?.1, Value::Text("cup".into()));
        Ok(())
    }

    #[test]
    fn test_avg() -> Result<()> {
        let table = products()?;
        assert_eq!(aggregate(&table, "avg", Some(&FieldRef::new(None, "price")))?.1, Value::Float(3.0));
        // Integer fields still average to a float
        assert_eq!(aggregate(&table, "avg", Some(&FieldRef::new(None, "stock")))?.1, Value::Float(7.0));
        assert!(matches!(
            aggregate(&table, "avg", Some(&FieldRef::new(None, "name"))),
            Err(Error::TypeMismatch(_))
        ));
        Ok(())
    }

    #[test]
    fn test_empty() -> Result<()> {
        let mut table = products()?;
        table.rows.clear();
        let price = FieldRef::new(None, "price");
        assert_eq!(aggregate(&table, "count", None)?.1, Value::Integer(0));
        assert_eq!(
            aggregate(&table, "avg", Some(&price)),
            Err(Error::EmptyAggregate("AVG(price)".into()))
        );
        assert!(matches!(aggregate(&table, "max", Some(&price)), Err(Error::EmptyAggregate(_))));
        assert!(matches!(
            aggregate(&table, "avg", Some(&FieldRef::new(None, "weight"))),
            Err(Error::UnknownField(_))
        ));
        // A text field is refused even with no records to look at
        assert!(matches!(
            aggregate(&table, "avg", Some(&FieldRef::new(None, "name"))),
            Err(Error::TypeMismatch(_))
        ));
        assert!(matches!(aggregate(&table, "max", Some(&FieldRef::new(None, "name"))), Err(Error::EmptyAggregate(_))));
        Ok(())
    }
}
