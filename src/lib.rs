//! flatdb - a single-node relational data manager over flat-file tables
//!
//! This crate provides:
//! - Statement parsing (lexer, parser, AST) and a closed expression evaluator
//! - Query planning and execution (filter, join, aggregate)
//! - Transactions with advisory lock markers in the table files
//! - Pluggable storage engines (disk and memory)

pub mod config;
pub mod error;
pub mod shell;
pub mod sql;
pub mod storage;
