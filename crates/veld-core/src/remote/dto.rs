//! Wire types for the remote APIs
//!
//! Remote payloads are decoded into these fixed record types at the network
//! boundary. Missing fields become explicit defaults; malformed ids are typed
//! decode errors.

use serde::{Deserialize, Serialize};

use super::RemoteError;
use crate::models::{Lead, LeadStatus, Quote};
use crate::util::now_millis;

/// Quote as carried by the REST and document APIs (camelCase JSON)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteDto {
    pub id: String,
    #[serde(default)]
    pub reference: String,
    #[serde(default)]
    pub client_name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub usage_kwh: Option<f64>,
    #[serde(default)]
    pub bill_rands: Option<f64>,
    #[serde(default)]
    pub tariff: f64,
    #[serde(default)]
    pub panel_watt: i64,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub irradiance: Option<f64>,
    #[serde(default)]
    pub sun_hours: Option<f64>,
    #[serde(default)]
    pub system_kwp: f64,
    #[serde(default)]
    pub estimated_generation: f64,
    #[serde(default)]
    pub monthly_savings: f64,
    #[serde(default)]
    pub payback_months: f64,
    #[serde(default)]
    pub company_name: String,
    #[serde(default)]
    pub company_phone: String,
    #[serde(default)]
    pub company_email: String,
    #[serde(default)]
    pub consultant_name: String,
    #[serde(default)]
    pub consultant_phone: String,
    #[serde(default)]
    pub consultant_email: String,
    pub user_id: String,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: i64,
}

impl From<&Quote> for QuoteDto {
    fn from(quote: &Quote) -> Self {
        Self {
            id: quote.id.as_str(),
            reference: quote.reference.clone(),
            client_name: quote.client_name.clone(),
            address: quote.address.clone(),
            usage_kwh: quote.usage_kwh,
            bill_rands: quote.bill_rands,
            tariff: quote.tariff,
            panel_watt: quote.panel_watt,
            latitude: quote.latitude,
            longitude: quote.longitude,
            irradiance: quote.irradiance,
            sun_hours: quote.sun_hours,
            system_kwp: quote.system_kwp,
            estimated_generation: quote.estimated_generation,
            monthly_savings: quote.monthly_savings,
            payback_months: quote.payback_months,
            company_name: quote.company_name.clone(),
            company_phone: quote.company_phone.clone(),
            company_email: quote.company_email.clone(),
            consultant_name: quote.consultant_name.clone(),
            consultant_phone: quote.consultant_phone.clone(),
            consultant_email: quote.consultant_email.clone(),
            user_id: quote.user_id.clone(),
            created_at: quote.created_at,
            updated_at: quote.updated_at,
        }
    }
}

impl TryFrom<QuoteDto> for Quote {
    type Error = RemoteError;

    fn try_from(dto: QuoteDto) -> Result<Self, Self::Error> {
        let created_at = timestamp_or_now(dto.created_at);
        Ok(Self {
            id: dto
                .id
                .parse()
                .map_err(|_| RemoteError::Decode(format!("invalid quote id: {}", dto.id)))?,
            reference: dto.reference,
            client_name: dto.client_name,
            address: dto.address,
            usage_kwh: dto.usage_kwh,
            bill_rands: dto.bill_rands,
            tariff: dto.tariff,
            panel_watt: dto.panel_watt,
            latitude: dto.latitude,
            longitude: dto.longitude,
            irradiance: dto.irradiance,
            sun_hours: dto.sun_hours,
            system_kwp: dto.system_kwp,
            estimated_generation: dto.estimated_generation,
            monthly_savings: dto.monthly_savings,
            payback_months: dto.payback_months,
            company_name: dto.company_name,
            company_phone: dto.company_phone,
            company_email: dto.company_email,
            consultant_name: dto.consultant_name,
            consultant_phone: dto.consultant_phone,
            consultant_email: dto.consultant_email,
            user_id: dto.user_id,
            created_at,
            updated_at: if dto.updated_at > 0 {
                dto.updated_at
            } else {
                created_at
            },
            // A row decoded from the remote is, by definition, persisted there
            synced: true,
            deleted: false,
            remote_confirmed: true,
        })
    }
}

/// Lead as carried by the REST and document APIs (camelCase JSON)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadDto {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub quote_id: Option<String>,
    pub user_id: String,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: i64,
}

impl From<&Lead> for LeadDto {
    fn from(lead: &Lead) -> Self {
        Self {
            id: lead.id.as_str(),
            name: lead.name.clone(),
            email: lead.email.clone(),
            phone: lead.phone.clone(),
            status: lead.status.as_str().to_string(),
            notes: lead.notes.clone(),
            quote_id: lead.quote_id.map(|id| id.as_str()),
            user_id: lead.user_id.clone(),
            created_at: lead.created_at,
            updated_at: lead.updated_at,
        }
    }
}

impl TryFrom<LeadDto> for Lead {
    type Error = RemoteError;

    fn try_from(dto: LeadDto) -> Result<Self, Self::Error> {
        let created_at = timestamp_or_now(dto.created_at);
        Ok(Self {
            id: dto
                .id
                .parse()
                .map_err(|_| RemoteError::Decode(format!("invalid lead id: {}", dto.id)))?,
            name: dto.name,
            email: dto.email,
            phone: dto.phone,
            status: LeadStatus::from_wire(&dto.status),
            notes: dto.notes,
            quote_id: dto
                .quote_id
                .map(|raw| {
                    raw.parse()
                        .map_err(|_| RemoteError::Decode(format!("invalid quote id: {raw}")))
                })
                .transpose()?,
            user_id: dto.user_id,
            created_at,
            updated_at: if dto.updated_at > 0 {
                dto.updated_at
            } else {
                created_at
            },
            synced: true,
            deleted: false,
            remote_confirmed: true,
        })
    }
}

/// Acknowledgment returned by create endpoints
#[derive(Debug, Deserialize)]
pub(crate) struct CreatedResponse {
    pub id: String,
}

/// Inputs for the server-side quote-calculation endpoint
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteCalculationRequest {
    pub usage_kwh: Option<f64>,
    pub bill_rands: Option<f64>,
    pub tariff: f64,
    pub panel_watt: i64,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// Sizing outputs computed server-side
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteCalculation {
    #[serde(default)]
    pub system_kwp: f64,
    #[serde(default)]
    pub estimated_generation: f64,
    #[serde(default)]
    pub monthly_savings: f64,
    #[serde(default)]
    pub payback_months: f64,
    #[serde(default)]
    pub irradiance: Option<f64>,
    #[serde(default)]
    pub sun_hours: Option<f64>,
}

/// Authoritative timestamps come from the remote; fall back to the local
/// clock when the payload omits them.
fn timestamp_or_now(value: i64) -> i64 {
    if value > 0 {
        value
    } else {
        now_millis()
    }
}
