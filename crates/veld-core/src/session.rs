//! Owner identity for scoping reads and writes.

use crate::error::{Error, Result};
use crate::util::normalize_text_option;

/// The authenticated owner all queries and mutations are scoped by.
///
/// Credential exchange and token storage live outside this crate; callers
/// resolve an identity however their platform does and hand it in here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    user_id: String,
}

impl Session {
    /// Create a session for the given owner id.
    ///
    /// Returns [`Error::AuthRequired`] when the id is empty or whitespace.
    pub fn new(user_id: impl Into<String>) -> Result<Self> {
        let user_id = normalize_text_option(Some(user_id.into())).ok_or(Error::AuthRequired)?;
        Ok(Self { user_id })
    }

    /// The owner id attached to every local and remote operation.
    pub fn user_id(&self) -> &str {
        &self.user_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_rejects_empty_identity() {
        assert!(matches!(Session::new("  "), Err(Error::AuthRequired)));
        assert!(matches!(Session::new(""), Err(Error::AuthRequired)));
    }

    #[test]
    fn session_trims_identity() {
        let session = Session::new(" agent-7 ").unwrap();
        assert_eq!(session.user_id(), "agent-7");
    }
}
