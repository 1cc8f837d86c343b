//! Expression evaluation over bound records
//!
//! A closed tree-walking evaluator: field lookups, constants, arithmetic,
//! comparisons and boolean connectives. Predicates must produce a boolean,
//! assignments produce a value that is cast to the target field's type.

use std::cmp::Ordering;

use crate::{
    error::{Error, Result},
    sql::{
        parser::ast::{Consts, Expression, FieldRef, Operation},
        schema::Schema,
        types::{Row, Value},
    },
};

/// Records visible to an expression. A join condition binds two, a filter one,
/// and constant expressions none.
pub struct Binding<'a> {
    scopes: Vec<(&'a Schema, &'a Row)>,
}

impl<'a> Binding<'a> {
    pub fn empty() -> Self {
        Self { scopes: Vec::new() }
    }

    pub fn single(schema: &'a Schema, row: &'a Row) -> Self {
        Self { scopes: vec![(schema, row)] }
    }

    pub fn pair(left: (&'a Schema, &'a Row), right: (&'a Schema, &'a Row)) -> Self {
        Self { scopes: vec![left, right] }
    }

    /// Finds the one value a field reference names across all scopes
    fn lookup(&self, field: &FieldRef) -> Result<&'a Value> {
        let mut found = None;
        for &(schema, row) in &self.scopes {
            if let Some(pos) = schema.find(field.qualifier.as_deref(), &field.name)? {
                if found.is_some() {
                    return Err(Error::UnknownField(format!("{} is ambiguous", field)));
                }
                found = row.get(pos);
            }
        }
        found.ok_or_else(|| Error::UnknownField(field.to_string()))
    }
}

/// Intermediate result: either a stored value or the outcome of a comparison
#[derive(Debug, Clone, PartialEq)]
enum Datum {
    Value(Value),
    Boolean(bool),
}

/// Evaluates a predicate, which must produce a boolean
pub fn evaluate_predicate(expr: &Expression, binding: &Binding) -> Result<bool> {
    match evaluate_datum(expr, binding)? {
        Datum::Boolean(b) => Ok(b),
        Datum::Value(v) => Err(Error::TypeMismatch(format!("condition evaluates to {}, not a boolean", v))),
    }
}

/// Evaluates a value expression, e.g. the right-hand side of an assignment
pub fn evaluate(expr: &Expression, binding: &Binding) -> Result<Value> {
    match evaluate_datum(expr, binding)? {
        Datum::Value(v) => Ok(v),
        Datum::Boolean(_) => Err(Error::TypeMismatch("a condition cannot be stored as a value".into())),
    }
}

/// Applies `field = expression` assignments to a copy of a record. Every
/// right-hand side sees the record as it was before any assignment.
pub fn apply_assignments(schema: &Schema, row: &Row, assignments: &[(usize, Expression)]) -> Result<Row> {
    let binding = Binding::single(schema, row);
    let mut updated = row.clone();
    for (pos, expr) in assignments {
        let field = schema
            .fields
            .get(*pos)
            .ok_or_else(|| Error::Internal(format!("field position {} out of range", pos)))?;
        updated[*pos] = evaluate(expr, &binding)?.cast(field.datatype)?;
    }
    Ok(updated)
}

fn evaluate_datum(expr: &Expression, binding: &Binding) -> Result<Datum> {
    Ok(match expr {
        Expression::Consts(Consts::Integer(i)) => Datum::Value(Value::Integer(*i)),
        Expression::Consts(Consts::Float(f)) => Datum::Value(Value::Float(*f)),
        Expression::Consts(Consts::String(s)) => Datum::Value(Value::Text(s.clone())),
        Expression::Field(field) => Datum::Value(binding.lookup(field)?.clone()),
        Expression::Operation(op) => match op {
            // and/or short-circuit, so the right side may never be looked at
            Operation::And(lhs, rhs) => {
                Datum::Boolean(evaluate_predicate(lhs, binding)? && evaluate_predicate(rhs, binding)?)
            }
            Operation::Or(lhs, rhs) => {
                Datum::Boolean(evaluate_predicate(lhs, binding)? || evaluate_predicate(rhs, binding)?)
            }
            Operation::Equal(lhs, rhs) => compare(lhs, rhs, binding, |o| o == Ordering::Equal)?,
            Operation::NotEqual(lhs, rhs) => compare(lhs, rhs, binding, |o| o != Ordering::Equal)?,
            Operation::LessThan(lhs, rhs) => compare(lhs, rhs, binding, |o| o == Ordering::Less)?,
            Operation::LessThanOrEqual(lhs, rhs) => compare(lhs, rhs, binding, |o| o != Ordering::Greater)?,
            Operation::GreaterThan(lhs, rhs) => compare(lhs, rhs, binding, |o| o == Ordering::Greater)?,
            Operation::GreaterThanOrEqual(lhs, rhs) => compare(lhs, rhs, binding, |o| o != Ordering::Less)?,
            Operation::Add(lhs, rhs) => Datum::Value(add(evaluate(lhs, binding)?, evaluate(rhs, binding)?)?),
            Operation::Subtract(lhs, rhs) => Datum::Value(arithmetic(
                evaluate(lhs, binding)?,
                evaluate(rhs, binding)?,
                "-",
                i64::checked_sub,
                |a, b| a - b,
            )?),
            Operation::Multiply(lhs, rhs) => Datum::Value(arithmetic(
                evaluate(lhs, binding)?,
                evaluate(rhs, binding)?,
                "*",
                i64::checked_mul,
                |a, b| a * b,
            )?),
            Operation::Divide(lhs, rhs) => Datum::Value(divide(evaluate(lhs, binding)?, evaluate(rhs, binding)?)?),
            Operation::Negate(expr) => Datum::Value(match evaluate(expr, binding)? {
                Value::Integer(i) => Value::Integer(
                    i.checked_neg().ok_or_else(|| Error::TypeMismatch(format!("integer overflow in -{}", i)))?,
                ),
                Value::Float(f) => Value::Float(-f),
                Value::Text(s) => return Err(Error::TypeMismatch(format!("cannot negate text '{}'", s))),
            }),
        },
    })
}

fn compare(
    lhs: &Expression,
    rhs: &Expression,
    binding: &Binding,
    test: impl Fn(Ordering) -> bool,
) -> Result<Datum> {
    let (l, r) = (evaluate(lhs, binding)?, evaluate(rhs, binding)?);
    match l.partial_cmp(&r) {
        Some(ordering) => Ok(Datum::Boolean(test(ordering))),
        None => Err(Error::TypeMismatch(format!("cannot compare {} with {}", l, r))),
    }
}

fn add(lhs: Value, rhs: Value) -> Result<Value> {
    match (lhs, rhs) {
        (Value::Text(a), Value::Text(b)) => Ok(Value::Text(a + &b)),
        (lhs, rhs) => arithmetic(lhs, rhs, "+", i64::checked_add, |a, b| a + b),
    }
}

/// Integer op Integer stays an integer, any float operand makes the result a float
fn arithmetic(
    lhs: Value,
    rhs: Value,
    symbol: &str,
    int_op: fn(i64, i64) -> Option<i64>,
    float_op: fn(f64, f64) -> f64,
) -> Result<Value> {
    match (&lhs, &rhs) {
        (Value::Integer(a), Value::Integer(b)) => int_op(*a, *b)
            .map(Value::Integer)
            .ok_or_else(|| Error::TypeMismatch(format!("integer overflow in {} {} {}", a, symbol, b))),
        _ => match (lhs.as_f64(), rhs.as_f64()) {
            (Some(a), Some(b)) => Ok(Value::Float(float_op(a, b))),
            _ => Err(Error::TypeMismatch(format!("cannot compute {} {} {}", lhs, symbol, rhs))),
        },
    }
}

/// Division always produces a float
fn divide(lhs: Value, rhs: Value) -> Result<Value> {
    match (lhs.as_f64(), rhs.as_f64()) {
        (Some(_), Some(b)) if b == 0.0 => Err(Error::DivideByZero),
        (Some(a), Some(b)) => Ok(Value::Float(a / b)),
        _ => Err(Error::TypeMismatch(format!("cannot compute {} / {}", lhs, rhs))),
    }
}
