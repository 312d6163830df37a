//! Lead model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::Error;
use crate::models::QuoteId;

/// A unique identifier for a lead, using UUID v7 (time-sortable)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LeadId(Uuid);

impl LeadId {
    /// Create a new unique lead ID using UUID v7
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

impl Default for LeadId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for LeadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for LeadId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Pipeline status of a lead
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LeadStatus {
    /// Freshly captured, not yet contacted
    #[default]
    New,
    /// Contact has been made
    Contacted,
    /// Interest confirmed, worth quoting
    Qualified,
    /// Signed up
    Converted,
    /// No longer pursued
    Lost,
}

impl LeadStatus {
    /// String form used on disk and on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Contacted => "contacted",
            Self::Qualified => "qualified",
            Self::Converted => "converted",
            Self::Lost => "lost",
        }
    }

    /// Lenient decoding for stored/wire values; unknown values fall back to
    /// `New` rather than failing the whole record.
    #[must_use]
    pub fn from_wire(value: &str) -> Self {
        value.trim().parse().unwrap_or_default()
    }
}

impl fmt::Display for LeadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LeadStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "new" => Ok(Self::New),
            "contacted" => Ok(Self::Contacted),
            "qualified" => Ok(Self::Qualified),
            "converted" => Ok(Self::Converted),
            "lost" => Ok(Self::Lost),
            other => Err(Error::InvalidInput(format!("Unknown lead status: {other}"))),
        }
    }
}

/// A customer lead captured in the field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lead {
    /// Unique identifier; locally generated until the remote assigns one
    pub id: LeadId,
    /// Contact name
    pub name: String,
    /// Contact email
    pub email: String,
    /// Contact phone
    pub phone: String,
    /// Pipeline status
    pub status: LeadStatus,
    /// Free-form notes
    pub notes: Option<String>,
    /// Quote this lead has been linked to, if any
    pub quote_id: Option<QuoteId>,
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

impl Lead {
    /// Create a new local lead for the given contact and owner.
    ///
    /// Starts dirty (`synced = false`) with status `New`.
    #[must_use]
    pub fn new(name: impl Into<String>, user_id: impl Into<String>) -> Self {
        let now = chrono::Utc::now().timestamp_millis();
        Self {
            id: LeadId::new(),
            name: name.into(),
            email: String::new(),
            phone: String::new(),
            status: LeadStatus::New,
            notes: None,
            quote_id: None,
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
