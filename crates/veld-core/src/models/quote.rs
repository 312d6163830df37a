//! Quote model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// A unique identifier for a quote, using UUID v7 (time-sortable)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QuoteId(Uuid);

impl QuoteId {
    /// Create a new unique quote ID using UUID v7
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Get the string representation of this ID
    #[must_use]
    pub fn as_str(&self) -> String {
        self.0.to_string()
    }
}

impl Default for QuoteId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for QuoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for QuoteId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// A solar-system quote captured in the field.
///
/// Business fields are opaque to the sync engine; it only cares about `id`,
/// `user_id`, the timestamps, and the sync bookkeeping flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    /// Unique identifier; locally generated until the remote assigns one
    pub id: QuoteId,
    /// Human-facing quote reference, e.g. `QUOTE-17`
    pub reference: String,
    /// Client name
    pub client_name: String,
    /// Site address
    pub address: String,
    /// Monthly consumption in kWh, when the client knows it
    pub usage_kwh: Option<f64>,
    /// Monthly bill in Rands, as an alternative sizing input
    pub bill_rands: Option<f64>,
    /// Tariff in R/kWh
    pub tariff: f64,
    /// Panel rating in watts
    pub panel_watt: i64,
    /// Site latitude
    pub latitude: Option<f64>,
    /// Site longitude
    pub longitude: Option<f64>,
    /// Annual irradiance at the site, kWh/m²
    pub irradiance: Option<f64>,
    /// Average daily sun hours
    pub sun_hours: Option<f64>,
    /// Sized system capacity in kWp
    pub system_kwp: f64,
    /// Estimated monthly generation in kWh
    pub estimated_generation: f64,
    /// Estimated monthly savings in Rands
    pub monthly_savings: f64,
    /// Payback period in months
    pub payback_months: f64,
    /// Installer company details shown on the quote
    pub company_name: String,
    pub company_phone: String,
    pub company_email: String,
    /// Consultant details shown on the quote
    pub consultant_name: String,
    pub consultant_phone: String,
    pub consultant_email: String,
    /// Owner; all queries and mutations are scoped by this field
    pub user_id: String,
    /// Creation timestamp (Unix ms); remote-authoritative when available
    pub created_at: i64,
    /// Last update timestamp (Unix ms)
    pub updated_at: i64,
    /// Whether the current content is confirmed persisted remotely
    pub synced: bool,
    /// Tombstone awaiting remote delete confirmation
    pub deleted: bool,
    /// Whether the remote store has acknowledged this id at least once
    pub remote_confirmed: bool,
}

impl Quote {
    /// Create a new local quote with the given reference, client, and owner.
    ///
    /// Starts dirty (`synced = false`); sizing fields default to zero until
    /// the calculation service fills them in.
    #[must_use]
    pub fn new(
        reference: impl Into<String>,
        client_name: impl Into<String>,
        user_id: impl Into<String>,
    ) -> Self {
        let now = chrono::Utc::now().timestamp_millis();
        Self {
            id: QuoteId::new(),
            reference: reference.into(),
            client_name: client_name.into(),
            address: String::new(),
            usage_kwh: None,
            bill_rands: None,
            tariff: 0.0,
            panel_watt: 0,
            latitude: None,
            longitude: None,
            irradiance: None,
            sun_hours: None,
            system_kwp: 0.0,
            estimated_generation: 0.0,
            monthly_savings: 0.0,
            payback_months: 0.0,
            company_name: String::new(),
            company_phone: String::new(),
            company_email: String::new(),
            consultant_name: String::new(),
            consultant_phone: String::new(),
            consultant_email: String::new(),
            user_id: user_id.into(),
            created_at: now,
            updated_at: now,
            synced: false,
            deleted: false,
            remote_confirmed: false,
        }
    }

    /// Record a local edit: bump `updated_at` and reset the synced flag.
    pub fn touch(&mut self) {
        self.updated_at = chrono::Utc::now().timestamp_millis();
        self.synced = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_id_unique() {
        let id1 = QuoteId::new();
        let id2 = QuoteId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_quote_id_parse() {
        let id = QuoteId::new();
        let parsed: QuoteId = id.as_str().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_quote_new_starts_dirty() {
        let quote = Quote::new("QUOTE-1", "A. Botha", "agent-1");
        assert_eq!(quote.reference, "QUOTE-1");
        assert_eq!(quote.client_name, "A. Botha");
        assert_eq!(quote.user_id, "agent-1");
        assert!(!quote.synced);
        assert!(!quote.deleted);
        assert!(!quote.remote_confirmed);
        assert!(quote.created_at > 0);
        assert_eq!(quote.created_at, quote.updated_at);
    }

    #[test]
    fn test_touch_resets_synced() {
        let mut quote = Quote::new("QUOTE-2", "B. Naidoo", "agent-1");
        quote.synced = true;
        let before = quote.updated_at;
        quote.touch();
        assert!(!quote.synced);
        assert!(quote.updated_at >= before);
    }
}
