//! Lead commands

use chrono::Utc;
use serde::Serialize;

use veld_core::models::{Lead, LeadId, LeadStatus};
use veld_core::SalesRepository;

use crate::cli::AddLeadArgs;
use crate::commands::common::{format_relative_time, short_id, sync_marker};
use crate::error::CliError;

pub async fn run_add(repository: &SalesRepository, args: AddLeadArgs) -> Result<(), CliError> {
    let status: LeadStatus = args.status.parse().map_err(CliError::Core)?;
    let quote_id = args
        .quote_id
        .map(|raw| {
            raw.trim()
                .parse()
                .map_err(|_| CliError::InvalidId(raw.clone()))
        })
        .transpose()?;

    let mut lead = Lead::new(args.name, repository.session().user_id());
    lead.email = args.email.unwrap_or_default();
    lead.phone = args.phone.unwrap_or_default();
    lead.status = status;
    lead.notes = args.notes;
    lead.quote_id = quote_id;

    let saved = repository.save_lead(lead).await?;
    if saved.synced {
        println!("{} (synced)", saved.id);
    } else {
        println!("{} (saved locally, will sync later)", saved.id);
    }
    Ok(())
}

#[derive(Debug, Serialize)]
struct LeadListItem {
    id: String,
    name: String,
    phone: String,
    status: String,
    synced: bool,
    updated_at: i64,
}

pub async fn run_list(repository: &SalesRepository, as_json: bool) -> Result<(), CliError> {
    let leads = repository.list_leads().await?;

    if as_json {
        let items = leads
            .iter()
            .map(|lead| LeadListItem {
                id: lead.id.to_string(),
                name: lead.name.clone(),
                phone: lead.phone.clone(),
                status: lead.status.to_string(),
                synced: lead.synced,
                updated_at: lead.updated_at,
            })
            .collect::<Vec<_>>();
        println!("{}", serde_json::to_string_pretty(&items)?);
    } else {
        for line in format_lead_lines(&leads) {
            println!("{line}");
        }
    }

    Ok(())
}

pub async fn run_delete(repository: &SalesRepository, id: &str) -> Result<(), CliError> {
    let lead_id: LeadId = id
        .trim()
        .parse()
        .map_err(|_| CliError::InvalidId(id.to_string()))?;

    repository.delete_lead(&lead_id).await?;
    println!("{lead_id}");
    Ok(())
}

fn format_lead_lines(leads: &[Lead]) -> Vec<String> {
    let now_ms = Utc::now().timestamp_millis();
    leads
        .iter()
        .map(|lead| {
            format!(
                "{:<13}  {:<24}  {:<10}  {:<8}  {}",
                short_id(&lead.id.to_string()),
                lead.name.chars().take(24).collect::<String>(),
                lead.status,
                sync_marker(lead.synced),
                format_relative_time(lead.updated_at, now_ms)
            )
        })
        .collect()
}
