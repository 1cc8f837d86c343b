use std::{collections::BTreeMap, fmt::Display};

/// Abstract Syntax Tree (AST) node definitions for statements
#[derive(Debug, PartialEq)]
pub enum Statement {
    CreateDatabase {
        name: String,
    },
    DropDatabase {
        name: String,
    },
    /// USE statement, selects the current database
    UseDatabase {
        name: String,
    },
    /// CREATE TABLE statement. Columns are kept as `name type` descriptors and
    /// validated by the planner.
    CreateTable {
        name: String,
        columns: Vec<String>,
    },
    DropTable {
        name: String,
    },
    /// ALTER TABLE ... ADD statement
    AlterTable {
        name: String,
        column: String,
    },
    /// INSERT statement, one or more value rows
    Insert {
        table_name: String,
        values: Vec<Vec<Expression>>,
    },
    /// SELECT statement
    Select {
        select: SelectList,
        from: FromItem,
        where_clause: Option<Expression>,
    },
    /// UPDATE statement
    Update {
        table_name: String,
        columns: BTreeMap<String, Expression>,
        where_clause: Option<Expression>,
    },
    /// DELETE statement
    Delete {
        table_name: String,
        where_clause: Option<Expression>,
    },
    Begin,
    Commit,
}

/// What a SELECT returns
#[derive(Debug, PartialEq)]
pub enum SelectList {
    /// `*`
    All,
    Fields(Vec<FieldRef>),
    /// Aggregate function call, e.g. `avg(price)`. The field is None for `count(*)`.
    Aggregate {
        function: String,
        field: Option<FieldRef>,
    },
}

/// FROM clause item - represents a table or join expression
#[derive(Debug, PartialEq)]
pub enum FromItem {
    /// Single table reference
    Table {
        name: String,
        alias: Option<String>,
    },

    /// Join expression (two tables joined together)
    Join {
        left: Box<FromItem>,
        right: Box<FromItem>,
        join_type: JoinType,
        /// Join ON condition (None for a comma join, which takes the WHERE condition)
        predicate: Option<Expression>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum JoinType {
    Inner,
    Left,
    Right,
}

/// Field reference, optionally qualified by table name or alias (`o.id`)
#[derive(Debug, Clone, PartialEq)]
pub struct FieldRef {
    pub qualifier: Option<String>,
    pub name: String,
}

impl FieldRef {
    pub fn new(qualifier: Option<&str>, name: &str) -> Self {
        Self { qualifier: qualifier.map(str::to_string), name: name.to_string() }
    }
}

impl Display for FieldRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.qualifier {
            Some(q) => write!(f, "{}.{}", q, self.name),
            None => f.write_str(&self.name),
        }
    }
}

/// Expression types (field refs, constants, operations)
#[derive(Debug, PartialEq, Clone)]
pub enum Expression {
    /// Field reference
    Field(FieldRef),
    /// Constant value
    Consts(Consts),
    /// Unary or binary operation
    Operation(Operation),
}

/// Implements From trait to convert Consts into Expression
impl From<Consts> for Expression {
    fn from(value: Consts) -> Self {
        Self::Consts(value)
    }
}

impl From<Operation> for Expression {
    fn from(value: Operation) -> Self {
        Self::Operation(value)
    }
}

impl From<FieldRef> for Expression {
    fn from(value: FieldRef) -> Self {
        Self::Field(value)
    }
}

/// Constant values in expressions
#[derive(Debug, PartialEq, Clone)]
pub enum Consts {
    Integer(i64),
    Float(f64),
    String(String),
}

/// Operations, ordered by precedence group
#[derive(Debug, PartialEq, Clone)]
pub enum Operation {
    Or(Box<Expression>, Box<Expression>),
    And(Box<Expression>, Box<Expression>),

    Equal(Box<Expression>, Box<Expression>),
    NotEqual(Box<Expression>, Box<Expression>),
    LessThan(Box<Expression>, Box<Expression>),
    LessThanOrEqual(Box<Expression>, Box<Expression>),
    GreaterThan(Box<Expression>, Box<Expression>),
    GreaterThanOrEqual(Box<Expression>, Box<Expression>),

    Add(Box<Expression>, Box<Expression>),
    Subtract(Box<Expression>, Box<Expression>),
    Multiply(Box<Expression>, Box<Expression>),
    Divide(Box<Expression>, Box<Expression>),

    Negate(Box<Expression>),
}
