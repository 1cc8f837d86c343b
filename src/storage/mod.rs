//! Storage layer
//!
//! - `engine`: line-level file primitives every backend implements
//! - `disk`: the filesystem backend
//! - `memory`: an in-memory backend shared between clones
//! - `lock`: the advisory lock line written at the top of a table file

pub mod disk;
pub mod engine;
pub mod lock;
pub mod memory;
