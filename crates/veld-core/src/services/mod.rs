//! Application-facing services

mod sales;

pub use sales::{SalesRepository, SyncStatus};
