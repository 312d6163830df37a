//! REST-preferred remote store with document API fallback
//!
//! The REST service is tried first; only network-class failures fall through
//! to the document API. Auth and validation failures surface immediately so
//! they are never retried against the wrong transport.

use async_trait::async_trait;

use super::{RemoteResult, RemoteStore};
use crate::models::{Lead, LeadId, Quote, QuoteId};

pub struct FallbackRemoteStore<P, S> {
    primary: P,
    secondary: S,
}

impl<P, S> FallbackRemoteStore<P, S>
where
    P: RemoteStore,
    S: RemoteStore,
{
    pub const fn new(primary: P, secondary: S) -> Self {
        Self { primary, secondary }
    }
}

macro_rules! with_fallback {
    ($self:ident, $operation:literal, $call:ident ( $($arg:expr),* )) => {
        match $self.primary.$call($($arg),*).await {
            Err(error) if error.is_network() => {
                tracing::warn!(
                    "REST {} failed ({error}); falling back to document API",
                    $operation
                );
                $self.secondary.$call($($arg),*).await
            }
            other => other,
        }
    };
}

#[async_trait]
impl<P, S> RemoteStore for FallbackRemoteStore<P, S>
where
    P: RemoteStore,
    S: RemoteStore,
{
    async fn create_quote(&self, quote: &Quote) -> RemoteResult<QuoteId> {
        with_fallback!(self, "create quote", create_quote(quote))
    }

    async fn update_quote(&self, quote: &Quote) -> RemoteResult<()> {
        with_fallback!(self, "update quote", update_quote(quote))
    }

    async fn get_quote(&self, id: &QuoteId, user_id: &str) -> RemoteResult<Option<Quote>> {
        with_fallback!(self, "get quote", get_quote(id, user_id))
    }

    async fn list_quotes(&self, user_id: &str) -> RemoteResult<Vec<Quote>> {
        with_fallback!(self, "list quotes", list_quotes(user_id))
    }

    async fn delete_quote(&self, id: &QuoteId, user_id: &str) -> RemoteResult<()> {
        with_fallback!(self, "delete quote", delete_quote(id, user_id))
    }

    async fn create_lead(&self, lead: &Lead) -> RemoteResult<LeadId> {
        with_fallback!(self, "create lead", create_lead(lead))
    }

    async fn update_lead(&self, lead: &Lead) -> RemoteResult<()> {
        with_fallback!(self, "update lead", update_lead(lead))
    }

    async fn get_lead(&self, id: &LeadId, user_id: &str) -> RemoteResult<Option<Lead>> {
        with_fallback!(self, "get lead", get_lead(id, user_id))
    }

    async fn list_leads(&self, user_id: &str) -> RemoteResult<Vec<Lead>> {
        with_fallback!(self, "list leads", list_leads(user_id))
    }

    async fn delete_lead(&self, id: &LeadId, user_id: &str) -> RemoteResult<()> {
        with_fallback!(self, "delete lead", delete_lead(id, user_id))
    }
}
