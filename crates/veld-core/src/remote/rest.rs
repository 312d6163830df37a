//! REST service client
//!
//! JSON CRUD for quotes and leads plus the server-side quote-calculation
//! endpoint, carried under `/v1/`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Client, Response, StatusCode};

use super::dto::{CreatedResponse, LeadDto, QuoteCalculation, QuoteCalculationRequest, QuoteDto};
use super::{
    normalize_base_url, status_error, transport_error, RemoteError, RemoteResult, RemoteStore,
};
use crate::models::{Lead, LeadId, Quote, QuoteId};

#[derive(Clone)]
pub struct RestApiClient {
    base_url: String,
    client: Client,
}

impl RestApiClient {
    /// Build a client for the given base URL.
    ///
    /// Every request carries the bearer token (when provided) and the
    /// configured timeout, so a hung remote can never stall a sync pass
    /// indefinitely.
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

    /// Server-side sizing for a quote's inputs.
    pub async fn calculate_quote(
        &self,
        request: &QuoteCalculationRequest,
    ) -> RemoteResult<QuoteCalculation> {
        let url = format!("{}/v1/quotes/calculate", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|error| transport_error(&error))?;
        let response = check(response, None).await?;
        decode(response).await
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
impl RemoteStore for RestApiClient {
    async fn create_quote(&self, quote: &Quote) -> RemoteResult<QuoteId> {
        let url = format!("{}/v1/quotes", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&QuoteDto::from(quote))
            .send()
            .await
            .map_err(|error| transport_error(&error))?;
        let response = check(response, None).await?;

        let created: CreatedResponse = decode(response).await?;
        created.id.parse().map_err(|_| {
            RemoteError::Decode(format!("invalid quote id in response: {}", created.id))
        })
    }

    async fn update_quote(&self, quote: &Quote) -> RemoteResult<()> {
        let url = format!("{}/v1/quotes/{}", self.base_url, quote.id);
        let response = self
            .client
            .put(&url)
            .json(&QuoteDto::from(quote))
            .send()
            .await
            .map_err(|error| transport_error(&error))?;
        check(response, Some(&quote.id.as_str())).await?;
        Ok(())
    }

    async fn get_quote(&self, id: &QuoteId, user_id: &str) -> RemoteResult<Option<Quote>> {
        let url = format!("{}/v1/quotes/{id}?owner={user_id}", self.base_url);
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
        let url = format!("{}/v1/quotes?owner={user_id}", self.base_url);
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

    async fn delete_quote(&self, id: &QuoteId, user_id: &str) -> RemoteResult<()> {
        let url = format!("{}/v1/quotes/{id}?owner={user_id}", self.base_url);
        let response = self
            .client
            .delete(&url)
            .send()
            .await
            .map_err(|error| transport_error(&error))?;

        // A record already gone remotely counts as deleted; tombstone replay
        // must converge rather than wedge on 404
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(());
        }
        check(response, Some(&id.as_str())).await?;
        Ok(())
    }

    async fn create_lead(&self, lead: &Lead) -> RemoteResult<LeadId> {
        let url = format!("{}/v1/leads", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&LeadDto::from(lead))
            .send()
            .await
            .map_err(|error| transport_error(&error))?;
        let response = check(response, None).await?;

        let created: CreatedResponse = decode(response).await?;
        created.id.parse().map_err(|_| {
            RemoteError::Decode(format!("invalid lead id in response: {}", created.id))
        })
    }

    async fn update_lead(&self, lead: &Lead) -> RemoteResult<()> {
        let url = format!("{}/v1/leads/{}", self.base_url, lead.id);
        let response = self
            .client
            .put(&url)
            .json(&LeadDto::from(lead))
            .send()
            .await
            .map_err(|error| transport_error(&error))?;
        check(response, Some(&lead.id.as_str())).await?;
        Ok(())
    }

    async fn get_lead(&self, id: &LeadId, user_id: &str) -> RemoteResult<Option<Lead>> {
        let url = format!("{}/v1/leads/{id}?owner={user_id}", self.base_url);
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
        let url = format!("{}/v1/leads?owner={user_id}", self.base_url);
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

    async fn delete_lead(&self, id: &LeadId, user_id: &str) -> RemoteResult<()> {
        let url = format!("{}/v1/leads/{id}?owner={user_id}", self.base_url);
        let response = self
            .client
            .delete(&url)
            .send()
            .await
            .map_err(|error| transport_error(&error))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(());
        }
        check(response, Some(&id.as_str())).await?;
        Ok(())
    }
}
