//! Statement processing
//!
//! This module provides:
//! - `parser`: statement lexer and parser
//! - `types`: field types and values
//! - `schema`: schema catalog and in-memory tables
//! - `eval`: expression evaluation over records
//! - `plan`: execution plan generation
//! - `executor`: query and mutation execution
//! - `engine`: record store, transactions and sessions

pub mod engine;
pub mod eval;
pub mod executor;
pub mod parser;
pub mod plan;
pub mod schema;
pub mod types;
