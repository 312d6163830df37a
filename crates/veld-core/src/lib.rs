//! veld-core - Core library for Veld
//!
//! This crate contains the shared models, local store, remote store clients,
//! and the offline-first sync engine used by all Veld interfaces.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod net;
pub mod remote;
pub mod services;
pub mod session;
pub mod sync;
pub mod util;

pub use error::{Error, Result};
pub use models::{Lead, LeadId, LeadStatus, Quote, QuoteId};
pub use services::SalesRepository;
pub use session::Session;
