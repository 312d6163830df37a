//! Local store for Veld
//!
//! Durable on-device table storage for cached quotes and leads, including
//! their sync bookkeeping (`synced`, `deleted`, `remote_confirmed`).

mod connection;
mod leads;
mod migrations;
mod quotes;

pub use connection::Database;
pub use leads::{LeadStore, LibSqlLeadStore};
pub use quotes::{LibSqlQuoteStore, QuoteStore};
