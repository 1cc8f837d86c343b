use std::collections::BTreeMap;
use std::iter::Peekable;

use crate::error::{Error, Result};
use crate::sql::parser::ast::{Consts, Expression, FieldRef, FromItem, JoinType, Operation, SelectList};
use crate::sql::parser::lexer::{Keyword, Lexer, Token};

pub mod ast;
mod lexer;

/// Aggregate functions a SELECT list may call
const AGGREGATES: [&str; 4] = ["count", "max", "min", "avg"];

/// Parser - Converts tokens into Abstract Syntax Tree (AST)
pub struct Parser<'a> {
    lexer: Peekable<Lexer<'a>>,
}

impl<'a> Parser<'a> {
    /// Creates a new parser for the given input
    pub fn new(input: &'a str) -> Self {
        Parser { lexer: Lexer::new(input).peekable() }
    }

    /// Parses the input statement into an AST. The trailing semicolon is optional.
    pub fn parse(&mut self) -> Result<ast::Statement> {
        let stmt = self.parse_statement()?;
        self.next_if_token(Token::Semicolon);
        // No tokens allowed after semicolon
        if let Some(token) = self.peek()? {
            return Err(Error::Parse(format!("[Parser] Unexpected token {}", token)));
        }
        Ok(stmt)
    }

    /// Parses a standalone expression, e.g. a predicate kept as text
    pub fn parse_expression_str(input: &str) -> Result<Expression> {
        let mut parser = Parser::new(input);
        let expr = parser.parse_expression()?;
        match parser.peek() {
            Ok(None) => Ok(expr),
            Ok(Some(token)) => Err(Error::MalformedExpression(format!("unexpected token {}", token))),
            Err(err) => Err(malformed(err)),
        }
    }

    /// Parses a statement based on the first token
    fn parse_statement(&mut self) -> Result<ast::Statement> {
        match self.peek()? {
            Some(Token::Keyword(Keyword::Create)) => self.parse_ddl(),
            Some(Token::Keyword(Keyword::Drop)) => self.parse_ddl(),
            Some(Token::Keyword(Keyword::Use)) => self.parse_use(),
            Some(Token::Keyword(Keyword::Alter)) => self.parse_alter(),
            Some(Token::Keyword(Keyword::Select)) => self.parse_select(),
            Some(Token::Keyword(Keyword::Insert)) => self.parse_insert(),
            Some(Token::Keyword(Keyword::Update)) => self.parse_update(),
            Some(Token::Keyword(Keyword::Delete)) => self.parse_delete(),
            Some(Token::Keyword(Keyword::Begin)) => self.parse_begin(),
            Some(Token::Keyword(Keyword::Commit)) => {
                self.next()?;
                Ok(ast::Statement::Commit)
            }
            Some(t) => Err(Error::Parse(format!("[Parser] Unexpected token {}", t))),
            None => Err(Error::Parse("[Parser] Unexpected end of input".into())),
        }
    }

    /// Parses CREATE/DROP for databases and tables
    fn parse_ddl(&mut self) -> Result<ast::Statement> {
        match self.next()? {
            Token::Keyword(Keyword::Create) => match self.next()? {
                Token::Keyword(Keyword::Database) => Ok(ast::Statement::CreateDatabase { name: self.next_ident()? }),
                Token::Keyword(Keyword::Table) => self.parse_ddl_create_table(),
                token => Err(Error::Parse(format!("[Parser] Unexpected token {}", token))),
            },
            Token::Keyword(Keyword::Drop) => match self.next()? {
                Token::Keyword(Keyword::Database) => Ok(ast::Statement::DropDatabase { name: self.next_ident()? }),
                Token::Keyword(Keyword::Table) => Ok(ast::Statement::DropTable { name: self.next_ident()? }),
                token => Err(Error::Parse(format!("[Parser] Unexpected token {}", token))),
            },
            token => Err(Error::Parse(format!("[Parser] Unexpected token {}", token))),
        }
    }

    /// Parses CREATE TABLE statement
    fn parse_ddl_create_table(&mut self) -> Result<ast::Statement> {
        let table_name = self.next_ident()?;
        self.next_expect(Token::OpenParen)?;

        let mut columns = Vec::new();
        loop {
            columns.push(self.parse_ddl_column().map_err(invalid_metadata)?);
            if self.next_if_token(Token::Comma).is_none() {
                break;
            }
        }
        self.next_expect(Token::CloseParen).map_err(invalid_metadata)?;
        Ok(ast::Statement::CreateTable { name: table_name, columns })
    }

    /// Parses a column definition into its `name type[(hint)]` descriptor
    fn parse_ddl_column(&mut self) -> Result<String> {
        let name = self.next_ident()?;
        let mut datatype = self.next_ident()?;
        // Size hints such as varchar(20) are kept verbatim
        while self.next_if_token(Token::OpenParen).is_some() {
            let hint = match self.next()? {
                Token::Number(n) => n,
                Token::Ident(i) => i,
                token => return Err(Error::Parse(format!("[Parser] Unexpected token {}", token))),
            };
            self.next_expect(Token::CloseParen)?;
            datatype = format!("{}({})", datatype, hint);
        }
        Ok(format!("{} {}", name, datatype))
    }

    fn parse_use(&mut self) -> Result<ast::Statement> {
        self.next_expect(Token::Keyword(Keyword::Use))?;
        Ok(ast::Statement::UseDatabase { name: self.next_ident()? })
    }

    /// Parses ALTER TABLE name ADD column
    fn parse_alter(&mut self) -> Result<ast::Statement> {
        self.next_expect(Token::Keyword(Keyword::Alter))?;
        self.next_expect(Token::Keyword(Keyword::Table))?;
        let name = self.next_ident()?;
        self.next_expect(Token::Keyword(Keyword::Add))?;
        let column = self.parse_ddl_column().map_err(invalid_metadata)?;
        Ok(ast::Statement::AlterTable { name, column })
    }

    /// Parses SELECT statement
    fn parse_select(&mut self) -> Result<ast::Statement> {
        self.next_expect(Token::Keyword(Keyword::Select))?;
        let select = self.parse_select_list()?;
        self.next_expect(Token::Keyword(Keyword::From))?;
        let from = self.parse_from_clause()?;
        Ok(ast::Statement::Select {
            select,
            from,
            where_clause: self.parse_where_clause()?,
        })
    }

    fn parse_select_list(&mut self) -> Result<SelectList> {
        if self.next_if_token(Token::Asterisk).is_some() {
            return Ok(SelectList::All);
        }

        let first = self.next_ident()?;
        if AGGREGATES.contains(&first.to_lowercase().as_str())
            && self.next_if_token(Token::OpenParen).is_some()
        {
            let field = if self.next_if_token(Token::Asterisk).is_some() {
                if !first.eq_ignore_ascii_case("count") {
                    return Err(Error::Parse(format!("[Parser] {}(*) is not supported", first)));
                }
                None
            } else {
                let name = self.next_ident()?;
                Some(self.parse_field_ref(name)?)
            };
            self.next_expect(Token::CloseParen)?;
            return Ok(SelectList::Aggregate { function: first, field });
        }

        let mut fields = vec![self.parse_field_ref(first)?];
        while self.next_if_token(Token::Comma).is_some() {
            let name = self.next_ident()?;
            fields.push(self.parse_field_ref(name)?);
        }
        Ok(SelectList::Fields(fields))
    }

    /// Finishes a field reference whose first identifier was already consumed
    fn parse_field_ref(&mut self, first: String) -> Result<FieldRef> {
        if self.next_if_token(Token::Period).is_some() {
            let name = self.next_ident()?;
            return Ok(FieldRef { qualifier: Some(first), name });
        }
        Ok(FieldRef { qualifier: None, name: first })
    }

    /// Parses the FROM clause: one table, or joins folded left to right
    fn parse_from_clause(&mut self) -> Result<FromItem> {
        let mut item = self.parse_from_table()?;
        while let Some(join_type) = self.parse_join_type()? {
            let right = self.parse_from_table()?;
            // A comma join takes its condition from WHERE
            let predicate = match join_type {
                None => None,
                Some(_) => {
                    self.next_expect(Token::Keyword(Keyword::On))?;
                    Some(self.parse_expression()?)
                }
            };
            item = FromItem::Join {
                left: Box::new(item),
                right: Box::new(right),
                join_type: join_type.unwrap_or(JoinType::Inner),
                predicate,
            };
        }
        Ok(item)
    }

    fn parse_from_table(&mut self) -> Result<FromItem> {
        let name = self.next_ident()?;
        let alias = match self.peek()? {
            Some(Token::Ident(_)) => Some(self.next_ident()?),
            _ => None,
        };
        Ok(FromItem::Table { name, alias })
    }

    /// Returns None when no join follows, Some(None) for a comma join and
    /// Some(Some(kind)) for an explicit JOIN.
    fn parse_join_type(&mut self) -> Result<Option<Option<JoinType>>> {
        if self.next_if_token(Token::Comma).is_some() {
            return Ok(Some(None));
        }
        let join_type = if self.next_if_token(Token::Keyword(Keyword::Join)).is_some() {
            return Ok(Some(Some(JoinType::Inner)));
        } else if self.next_if_token(Token::Keyword(Keyword::Inner)).is_some() {
            JoinType::Inner
        } else if self.next_if_token(Token::Keyword(Keyword::Left)).is_some() {
            self.next_if_token(Token::Keyword(Keyword::Outer));
            JoinType::Left
        } else if self.next_if_token(Token::Keyword(Keyword::Right)).is_some() {
            self.next_if_token(Token::Keyword(Keyword::Outer));
            JoinType::Right
        } else {
            return Ok(None);
        };
        self.next_expect(Token::Keyword(Keyword::Join))?;
        Ok(Some(Some(join_type)))
    }

    /// Parses INSERT statement
    fn parse_insert(&mut self) -> Result<ast::Statement> {
        self.next_expect(Token::Keyword(Keyword::Insert))?;
        self.next_expect(Token::Keyword(Keyword::Into))?;

        let table_name = self.next_ident()?;
        self.next_expect(Token::Keyword(Keyword::Values))?;
        // Parse multiple value rows: INSERT INTO tbl VALUES (1,2),(3,4);
        let mut values = Vec::new();
        loop {
            self.next_expect(Token::OpenParen)?;
            let mut expr = Vec::new();
            loop {
                expr.push(self.parse_expression()?);
                match self.next()? {
                    Token::CloseParen => break,
                    Token::Comma => {}
                    token => {
                        return Err(Error::Parse(format!("[Parser] Unexpected token {}", token)));
                    }
                }
            }
            values.push(expr);
            if self.next_if_token(Token::Comma).is_none() {
                break;
            }
        }
        Ok(ast::Statement::Insert { table_name, values })
    }

    /// Parses UPDATE statement
    fn parse_update(&mut self) -> Result<ast::Statement> {
        self.next_expect(Token::Keyword(Keyword::Update))?;
        let table_name = self.next_ident()?;
        self.next_expect(Token::Keyword(Keyword::Set))?;

        let mut columns = BTreeMap::new();
        loop {
            let col = self.next_ident()?;
            self.next_expect(Token::Equal)?;
            let value = self.parse_expression()?;
            // Assigning the same field twice in one statement is an error
            if columns.contains_key(&col) {
                return Err(Error::Parse(format!(
                    "[Parser] Duplicate column {} for update",
                    col
                )));
            }
            columns.insert(col, value);
            if self.next_if_token(Token::Comma).is_none() {
                break;
            }
        }
        Ok(ast::Statement::Update {
            table_name,
            columns,
            where_clause: self.parse_where_clause()?,
        })
    }

    /// Parses DELETE statement
    fn parse_delete(&mut self) -> Result<ast::Statement> {
        self.next_expect(Token::Keyword(Keyword::Delete))?;
        self.next_expect(Token::Keyword(Keyword::From))?;
        let table_name = self.next_ident()?;
        Ok(ast::Statement::Delete {
            table_name,
            where_clause: self.parse_where_clause()?,
        })
    }

    fn parse_begin(&mut self) -> Result<ast::Statement> {
        self.next_expect(Token::Keyword(Keyword::Begin))?;
        self.next_if_token(Token::Keyword(Keyword::Transaction));
        Ok(ast::Statement::Begin)
    }

    fn parse_where_clause(&mut self) -> Result<Option<Expression>> {
        if self.next_if_token(Token::Keyword(Keyword::Where)).is_none() {
            return Ok(None);
        }
        Ok(Some(self.parse_expression()?))
    }

    /// Parses an expression. Any failure inside it is a malformed expression.
    fn parse_expression(&mut self) -> Result<Expression> {
        self.parse_or().map_err(malformed)
    }

    fn parse_or(&mut self) -> Result<Expression> {
        let mut lhs = self.parse_and()?;
        while self.next_if_token(Token::Keyword(Keyword::Or)).is_some() {
            let rhs = self.parse_and()?;
            lhs = Operation::Or(Box::new(lhs), Box::new(rhs)).into();
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<Expression> {
        let mut lhs = self.parse_comparison()?;
        while self.next_if_token(Token::Keyword(Keyword::And)).is_some() {
            let rhs = self.parse_comparison()?;
            lhs = Operation::And(Box::new(lhs), Box::new(rhs)).into();
        }
        Ok(lhs)
    }

    /// Comparisons do not chain: `a < b < c` leaves `< c` unconsumed
    fn parse_comparison(&mut self) -> Result<Expression> {
        let lhs = self.parse_additive()?;
        let build: fn(Box<Expression>, Box<Expression>) -> Operation = match self.peek()? {
            Some(Token::Equal) => Operation::Equal,
            Some(Token::NotEqual) => Operation::NotEqual,
            Some(Token::LessThan) => Operation::LessThan,
            Some(Token::LessThanOrEqual) => Operation::LessThanOrEqual,
            Some(Token::GreaterThan) => Operation::GreaterThan,
            Some(Token::GreaterThanOrEqual) => Operation::GreaterThanOrEqual,
            _ => return Ok(lhs),
        };
        self.next()?;
        let rhs = self.parse_additive()?;
        Ok(build(Box::new(lhs), Box::new(rhs)).into())
    }

    fn parse_additive(&mut self) -> Result<Expression> {
        let mut lhs = self.parse_multiplicative()?;
        loop {
            let build: fn(Box<Expression>, Box<Expression>) -> Operation = match self.peek()? {
                Some(Token::Plus) => Operation::Add,
                Some(Token::Minus) => Operation::Subtract,
                _ => return Ok(lhs),
            };
            self.next()?;
            let rhs = self.parse_multiplicative()?;
            lhs = build(Box::new(lhs), Box::new(rhs)).into();
        }
    }

    fn parse_multiplicative(&mut self) -> Result<Expression> {
        let mut lhs = self.parse_unary()?;
        loop {
            let build: fn(Box<Expression>, Box<Expression>) -> Operation = match self.peek()? {
                Some(Token::Asterisk) => Operation::Multiply,
                Some(Token::Slash) => Operation::Divide,
                _ => return Ok(lhs),
            };
            self.next()?;
            let rhs = self.parse_unary()?;
            lhs = build(Box::new(lhs), Box::new(rhs)).into();
        }
    }

    fn parse_unary(&mut self) -> Result<Expression> {
        if self.next_if_token(Token::Minus).is_some() {
            return Ok(Operation::Negate(Box::new(self.parse_unary()?)).into());
        }
        if self.next_if_token(Token::Plus).is_some() {
            return self.parse_unary();
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Expression> {
        Ok(match self.next()? {
            Token::Number(n) => {
                // Lexer scans both 123 and 123.45 as Token::Number(String)
                if n.chars().all(|c| c.is_ascii_digit()) {
                    Consts::Integer(n.parse()?).into()
                } else {
                    Consts::Float(n.parse()?).into()
                }
            }
            Token::String(s) => Consts::String(s).into(),
            Token::Ident(ident) => self.parse_field_ref(ident)?.into(),
            Token::OpenParen => {
                let expr = self.parse_or()?;
                self.next_expect(Token::CloseParen)?;
                expr
            }
            t => {
                return Err(Error::Parse(format!(
                    "[Parser] Unexpected expression token {}",
                    t
                )));
            }
        })
    }

    /// Peeks at the next token
    fn peek(&mut self) -> Result<Option<Token>> {
        self.lexer.peek().cloned().transpose()
    }

    /// Consumes and returns the next token
    fn next(&mut self) -> Result<Token> {
        self.lexer.next().unwrap_or_else(|| Err(Error::Parse("[Parser] Unexpected end of input".into())))
    }

    /// Expects and consumes an identifier
    fn next_ident(&mut self) -> Result<String> {
        match self.next()? {
            Token::Ident(ident) => Ok(ident),
            token => Err(Error::Parse(format!(
                "[Parser] Expected ident, got token {}",
                token
            ))),
        }
    }

    /// Expects a specific token, returns error if different
    fn next_expect(&mut self, expect: Token) -> Result<()> {
        let token = self.next()?;
        if token != expect {
            return Err(Error::Parse(format!(
                "[Parser] Expected token {}, got {}",
                expect, token
            )));
        }
        Ok(())
    }

    /// Consumes next token if it satisfies the predicate
    fn next_if<F: Fn(&Token) -> bool>(&mut self, predicate: F) -> Option<Token> {
        self.peek().unwrap_or(None).filter(|t| predicate(t))?;
        self.next().ok()
    }

    /// Consumes next token if it matches the given token
    fn next_if_token(&mut self, token: Token) -> Option<Token> {
        self.next_if(|t| t == &token)
    }
}

fn malformed(err: Error) -> Error {
    match err {
        Error::Parse(msg) => Error::MalformedExpression(msg),
        err => err,
    }
}

fn invalid_metadata(err: Error) -> Error {
    match err {
        Error::Parse(msg) => Error::InvalidMetadata(msg),
        err => err,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use crate::{
        error::{Error, Result},
        sql::parser::ast::{self, Consts, Expression, FieldRef, FromItem, JoinType, Operation, SelectList},
    };

    use super::Parser;

    fn field(qualifier: Option<&str>, name: &str) -> Box<Expression> {
        Box::new(FieldRef::new(qualifier, name).into())
    }

    #[test]
    fn test_parser_create_table() -> Result<()> {
        let stmt1 = Parser::new("create table Product (pid int, name varchar(20), price float);").parse()?;
        let stmt2 = Parser::new("CREATE   TABLE Product(pid int,name varchar( 20 ),price float)").parse()?;
        assert_eq!(stmt1, stmt2);
        assert_eq!(
            stmt1,
            ast::Statement::CreateTable {
                name: "Product".into(),
                columns: vec!["pid int".into(), "name varchar(20)".into(), "price float".into()],
            }
        );

        assert!(matches!(
            Parser::new("create table t (id);").parse(),
            Err(Error::InvalidMetadata(_))
        ));
        assert!(matches!(
            Parser::new("create table t (id int extra);").parse(),
            Err(Error::InvalidMetadata(_))
        ));
        Ok(())
    }

    #[test]
    fn test_parser_database_commands() -> Result<()> {
        assert_eq!(
            Parser::new("CREATE DATABASE db_1;").parse()?,
            ast::Statement::CreateDatabase { name: "db_1".into() }
        );
        assert_eq!(Parser::new("use db_1").parse()?, ast::Statement::UseDatabase { name: "db_1".into() });
        assert_eq!(Parser::new("drop table t;").parse()?, ast::Statement::DropTable { name: "t".into() });
        assert_eq!(
            Parser::new("alter table t add c float;").parse()?,
            ast::Statement::AlterTable { name: "t".into(), column: "c float".into() }
        );
        assert_eq!(Parser::new("begin transaction;").parse()?, ast::Statement::Begin);
        assert_eq!(Parser::new("commit;").parse()?, ast::Statement::Commit);
        assert!(Parser::new("commit; commit;").parse().is_err());
        Ok(())
    }

    #[test]
    fn test_parser_insert() -> Result<()> {
        let stmt = Parser::new("insert into Product values(1, 'Gizmo', -19.99), (2, \"Power\", 3);").parse()?;
        assert_eq!(
            stmt,
            ast::Statement::Insert {
                table_name: "Product".into(),
                values: vec![
                    vec![
                        Consts::Integer(1).into(),
                        Consts::String("Gizmo".into()).into(),
                        Operation::Negate(Box::new(Consts::Float(19.99).into())).into(),
                    ],
                    vec![
                        Consts::Integer(2).into(),
                        Consts::String("Power".into()).into(),
                        Consts::Integer(3).into(),
                    ],
                ],
            }
        );
        Ok(())
    }

    #[test]
    fn test_parser_select() -> Result<()> {
        let stmt = Parser::new("select name, price from Product where pid != 2").parse()?;
        assert_eq!(
            stmt,
            ast::Statement::Select {
                select: SelectList::Fields(vec![FieldRef::new(None, "name"), FieldRef::new(None, "price")]),
                from: FromItem::Table { name: "Product".into(), alias: None },
                where_clause: Some(
                    Operation::NotEqual(field(None, "pid"), Box::new(Consts::Integer(2).into())).into()
                ),
            }
        );

        let stmt = Parser::new("select count(*) from Product;").parse()?;
        assert!(matches!(
            stmt,
            ast::Statement::Select { select: SelectList::Aggregate { field: None, .. }, .. }
        ));
        let stmt = Parser::new("select AVG(price) from Product;").parse()?;
        assert!(matches!(
            stmt,
            ast::Statement::Select { select: SelectList::Aggregate { field: Some(_), .. }, .. }
        ));
        assert!(Parser::new("select max(*) from Product;").parse().is_err());
        Ok(())
    }

    #[test]
    fn test_parser_joins() -> Result<()> {
        let stmt = Parser::new("select * from Employee E, Sales S where E.id = S.employeeID;").parse()?;
        assert_eq!(
            stmt,
            ast::Statement::Select {
                select: SelectList::All,
                from: FromItem::Join {
                    left: Box::new(FromItem::Table { name: "Employee".into(), alias: Some("E".into()) }),
                    right: Box::new(FromItem::Table { name: "Sales".into(), alias: Some("S".into()) }),
                    join_type: JoinType::Inner,
                    predicate: None,
                },
                where_clause: Some(
                    Operation::Equal(field(Some("E"), "id"), field(Some("S"), "employeeID")).into()
                ),
            }
        );

        let stmt = Parser::new("select * from Employee E left outer join Sales S on E.id = S.employeeID;").parse()?;
        let ast::Statement::Select { from: FromItem::Join { join_type, predicate, .. }, where_clause, .. } = stmt else {
            panic!("expected a join");
        };
        assert_eq!(join_type, JoinType::Left);
        assert!(predicate.is_some());
        assert!(where_clause.is_none());

        let stmt = Parser::new("select * from a right join b on a.x = b.y").parse()?;
        assert!(matches!(
            stmt,
            ast::Statement::Select { from: FromItem::Join { join_type: JoinType::Right, .. }, .. }
        ));
        assert!(Parser::new("select * from a join b").parse().is_err());
        Ok(())
    }

    #[test]
    fn test_parser_update_delete() -> Result<()> {
        let stmt = Parser::new("update Product set price = price * 2, name = 'x' where pid = 1;").parse()?;
        let mut columns = BTreeMap::new();
        columns.insert(
            "price".to_string(),
            Operation::Multiply(field(None, "price"), Box::new(Consts::Integer(2).into())).into(),
        );
        columns.insert("name".to_string(), Consts::String("x".into()).into());
        assert_eq!(
            stmt,
            ast::Statement::Update {
                table_name: "Product".into(),
                columns,
                where_clause: Some(Operation::Equal(field(None, "pid"), Box::new(Consts::Integer(1).into())).into()),
            }
        );
        assert!(Parser::new("update t set a = 1, a = 2").parse().is_err());

        assert_eq!(
            Parser::new("delete from Product").parse()?,
            ast::Statement::Delete { table_name: "Product".into(), where_clause: None }
        );
        Ok(())
    }

    #[test]
    fn test_parser_expression_precedence() -> Result<()> {
        let expr = Parser::parse_expression_str("a = 1 or b > 2 and -c * 3 + 1 <= 4")?;
        let expected: Expression = Operation::Or(
            Box::new(Operation::Equal(field(None, "a"), Box::new(Consts::Integer(1).into())).into()),
            Box::new(
                Operation::And(
                    Box::new(Operation::GreaterThan(field(None, "b"), Box::new(Consts::Integer(2).into())).into()),
                    Box::new(
                        Operation::LessThanOrEqual(
                            Box::new(
                                Operation::Add(
                                    Box::new(
                                        Operation::Multiply(
                                            Box::new(Operation::Negate(field(None, "c")).into()),
                                            Box::new(Consts::Integer(3).into()),
                                        )
                                        .into(),
                                    ),
                                    Box::new(Consts::Integer(1).into()),
                                )
                                .into(),
                            ),
                            Box::new(Consts::Integer(4).into()),
                        )
                        .into(),
                    ),
                )
                .into(),
            ),
        )
        .into();
        assert_eq!(expr, expected);

        for bad in ["a =", "(a = 1", "a = 1 )", "1 < 2 < 3", "'open"] {
            assert!(
                matches!(Parser::parse_expression_str(bad), Err(Error::MalformedExpression(_))),
                "{} should be malformed",
                bad
            );
        }
        Ok(())
    }
}
