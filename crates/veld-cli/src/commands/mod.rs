//! Command implementations

pub mod common;
pub mod completions;
pub mod lead;
pub mod quote;
pub mod sync;
pub mod watch;
