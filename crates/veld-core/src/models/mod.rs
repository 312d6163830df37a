//! Data models for Veld

mod lead;
mod quote;

pub use lead::{Lead, LeadId, LeadStatus};
pub use quote::{Quote, QuoteId};
