//! Document API client
//!
//! Document-store semantics: records live at
//! `/documents/{collection}/{id}`, ids are client-assigned, and `PUT` is an
//! upsert. Listing filters by owner server-side.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Client, Response, StatusCode};

use super::dto::{LeadDto, QuoteDto};
use super::{
    normalize_base_url, status_error, transport_error, RemoteError, RemoteResult, RemoteStore,
};
use crate::models::{Lead, LeadId, Quote, QuoteId};

const QUOTES_COLLECTION: &str = "quotes";
const LEADS_COLLECTION: &str = "leads";

#[derive(Clone)]
pub struct DocumentApiClient {
    base_url: String,
    client: Client,
}

impl DocumentApiClient {
    /// Build a client for the given document API base URL.
    pub fn new(
        base_url: impl Into<String>,
        auth_token: Option<String>,
        timeout: Duration,
    ) -> RemoteResult<Self> {
        let base_url = normalize_base_url(&base_url.into())?;

        let mut builder = Client::builder().timeout(timeout);
        if let Some(token) = auth_token {
            let mut headers = HeaderMap::new();
            let mut value =
                HeaderValue::from_str(&format!("Bearer {token}")).map_err(|_| {
                    RemoteError::InvalidConfiguration(
                        "auth token contains invalid header characters".to_string(),
                    )
                })?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
            builder = builder.default_headers(headers);
        }

        Ok(Self {
            base_url,
            client: builder
                .build()
                .map_err(|error| RemoteError::InvalidConfiguration(error.to_string()))?,
        })
    }

    fn document_url(&self, collection: &str, id: &str) -> String {
        format!("{}/documents/{collection}/{id}", self.base_url)
    }

    async fn put_document<T: serde::Serialize + Sync>(
        &self,
        collection: &str,
        id: &str,
        document: &T,
    ) -> RemoteResult<()> {
        let response = self
            .client
            .put(self.document_url(collection, id))
            .json(document)
            .send()
            .await
            .map_err(|error| transport_error(&error))?;
        check(response, Some(id)).await?;
        Ok(())
    }

    async fn delete_document(&self, collection: &str, id: &str) -> RemoteResult<()> {
        let response = self
            .client
            .delete(self.document_url(collection, id))
            .send()
            .await
            .map_err(|error| transport_error(&error))?;

        // Converge on repeated tombstone replay
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(());
        }
        check(response, Some(id)).await?;
        Ok(())
    }
}

async fn check(response: Response, id: Option<&str>) -> RemoteResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(status_error(status, &body, id))
}

async fn decode<T: serde::de::DeserializeOwned>(response: Response) -> RemoteResult<T> {
    response
        .json()
        .await
        .map_err(|error| RemoteError::Decode(error.to_string()))
}

#[async_trait]
impl RemoteStore for DocumentApiClient {
    async fn create_quote(&self, quote: &Quote) -> RemoteResult<QuoteId> {
        // The document store keeps client-assigned ids
        self.put_document(QUOTES_COLLECTION, &quote.id.as_str(), &QuoteDto::from(quote))
            .await?;
        Ok(quote.id)
    }

    async fn update_quote(&self, quote: &Quote) -> RemoteResult<()> {
        self.put_document(QUOTES_COLLECTION, &quote.id.as_str(), &QuoteDto::from(quote))
            .await
    }

    async fn get_quote(&self, id: &QuoteId, user_id: &str) -> RemoteResult<Option<Quote>> {
        let url = format!("{}?owner={user_id}", self.document_url(QUOTES_COLLECTION, &id.as_str()));
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|error| transport_error(&error))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = check(response, Some(&id.as_str())).await?;
        let dto: QuoteDto = decode(response).await?;
        Ok(Some(Quote::try_from(dto)?))
    }

    async fn list_quotes(&self, user_id: &str) -> RemoteResult<Vec<Quote>> {
        let url = format!("{}/documents/{QUOTES_COLLECTION}?owner={user_id}", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|error| transport_error(&error))?;
        let response = check(response, None).await?;

        let dtos: Vec<QuoteDto> = decode(response).await?;
        dtos.into_iter().map(Quote::try_from).collect()
    }

    async fn delete_quote(&self, id: &QuoteId, _user_id: &str) -> RemoteResult<()> {
        self.delete_document(QUOTES_COLLECTION, &id.as_str()).await
    }

    async fn create_lead(&self, lead: &Lead) -> RemoteResult<LeadId> {
        self.put_document(LEADS_COLLECTION, &lead.id.as_str(), &LeadDto::from(lead))
            .await?;
        Ok(lead.id)
    }

    async fn update_lead(&self, lead: &Lead) -> RemoteResult<()> {
        self.put_document(LEADS_COLLECTION, &lead.id.as_str(), &LeadDto::from(lead))
            .await
    }

    async fn get_lead(&self, id: &LeadId, user_id: &str) -> RemoteResult<Option<Lead>> {
        let url = format!("{}?owner={user_id}", self.document_url(LEADS_COLLECTION, &id.as_str()));
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|error| transport_error(&error))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = check(response, Some(&id.as_str())).await?;
        let dto: LeadDto = decode(response).await?;
        Ok(Some(Lead::try_from(dto)?))
    }

    async fn list_leads(&self, user_id: &str) -> RemoteResult<Vec<Lead>> {
        let url = format!("{}/documents/{LEADS_COLLECTION}?owner={user_id}", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|error| transport_error(&error))?;
        let response = check(response, None).await?;

        let dtos: Vec<LeadDto> = decode(response).await?;
        dtos.into_iter().map(Lead::try_from).collect()
    }

    async fn delete_lead(&self, id: &LeadId, _user_id: &str) -> RemoteResult<()> {
        self.delete_document(LEADS_COLLECTION, &id.as_str()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_urls_nest_collection_and_id() {
        let client =
            DocumentApiClient::new("https://docs.example.com/", None, Duration::from_secs(4))
                .unwrap();
        assert_eq!(
            client.document_url("quotes", "q1"),
            "https://docs.example.com/documents/quotes/q1"
        );
    }
}
