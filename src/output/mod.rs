//! Result reporting: JSON serialization and terminal formatting.

pub mod json;
pub mod terminal;
