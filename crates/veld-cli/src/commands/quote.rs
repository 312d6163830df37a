//! Quote commands

use chrono::Utc;
use serde::Serialize;

use veld_core::models::{Quote, QuoteId};
use veld_core::remote::{QuoteCalculationRequest, RestApiClient};
use veld_core::SalesRepository;

use crate::cli::AddQuoteArgs;
use crate::commands::common::{format_relative_time, short_id, sync_marker};
use crate::error::CliError;

pub async fn run_add(
    repository: &SalesRepository,
    rest: Option<&RestApiClient>,
    args: AddQuoteArgs,
) -> Result<(), CliError> {
    let reference = args
        .reference
        .unwrap_or_else(|| format!("QUOTE-{}", Utc::now().timestamp()));

    let mut quote = Quote::new(reference, args.client, repository.session().user_id());
    quote.address = args.address.unwrap_or_default();
    quote.usage_kwh = args.usage_kwh;
    quote.bill_rands = args.bill_rands;
    quote.tariff = args.tariff;
    quote.panel_watt = args.panel_watt;
    quote.latitude = args.latitude;
    quote.longitude = args.longitude;

    // Sizing is computed server-side; offline it stays zeroed until a later
    // edit once connectivity returns
    if let Some(rest) = rest {
        let request = QuoteCalculationRequest {
            usage_kwh: quote.usage_kwh,
            bill_rands: quote.bill_rands,
            tariff: quote.tariff,
            panel_watt: quote.panel_watt,
            latitude: quote.latitude,
            longitude: quote.longitude,
        };
        match rest.calculate_quote(&request).await {
            Ok(calc) => {
                quote.system_kwp = calc.system_kwp;
                quote.estimated_generation = calc.estimated_generation;
                quote.monthly_savings = calc.monthly_savings;
                quote.payback_months = calc.payback_months;
                quote.irradiance = calc.irradiance;
                quote.sun_hours = calc.sun_hours;
            }
            Err(error) if error.is_network() => {
                tracing::warn!("Quote calculation unavailable offline; sizing left empty");
            }
            Err(error) => return Err(veld_core::Error::from(error).into()),
        }
    }

    let saved = repository.save_quote(quote).await?;
    if saved.synced {
        println!("{} (synced)", saved.id);
    } else {
        println!("{} (saved locally, will sync later)", saved.id);
    }
    Ok(())
}

#[derive(Debug, Serialize)]
struct QuoteListItem {
    id: String,
    reference: String,
    client_name: String,
    system_kwp: f64,
    monthly_savings: f64,
    synced: bool,
    updated_at: i64,
}

pub async fn run_list(repository: &SalesRepository, as_json: bool) -> Result<(), CliError> {
    let quotes = repository.list_quotes().await?;

    if as_json {
        let items = quotes
            .iter()
            .map(|quote| QuoteListItem {
                id: quote.id.to_string(),
                reference: quote.reference.clone(),
                client_name: quote.client_name.clone(),
                system_kwp: quote.system_kwp,
                monthly_savings: quote.monthly_savings,
                synced: quote.synced,
                updated_at: quote.updated_at,
            })
            .collect::<Vec<_>>();
        println!("{}", serde_json::to_string_pretty(&items)?);
    } else {
        for line in format_quote_lines(&quotes) {
            println!("{line}");
        }
    }

    Ok(())
}

pub async fn run_delete(repository: &SalesRepository, id: &str) -> Result<(), CliError> {
    let quote_id: QuoteId = id
        .trim()
        .parse()
        .map_err(|_| CliError::InvalidId(id.to_string()))?;

    repository.delete_quote(&quote_id).await?;
    println!("{quote_id}");
    Ok(())
}

fn format_quote_lines(quotes: &[Quote]) -> Vec<String> {
    let now_ms = Utc::now().timestamp_millis();
    quotes
        .iter()
        .map(|quote| {
            format!(
                "{:<13}  {:<14}  {:<24}  {:<8}  {}",
                short_id(&quote.id.to_string()),
                quote.reference,
                quote.client_name.chars().take(24).collect::<String>(),
                sync_marker(quote.synced),
                format_relative_time(quote.updated_at, now_ms)
            )
        })
        .collect()
}
