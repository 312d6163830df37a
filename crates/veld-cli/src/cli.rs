//! Command-line definitions for `veld`

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "veld")]
#[command(about = "Capture solar leads and quotes in the field, online or off")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Optional path to local database file
    #[arg(long, value_name = "PATH", global = true)]
    pub db_path: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Capture and list quotes
    #[command(subcommand)]
    Quote(QuoteCommands),
    /// Capture and list leads
    #[command(subcommand)]
    Lead(LeadCommands),
    /// Push unsynced rows to the remote store now
    Sync,
    /// Show how many rows are awaiting sync
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Watch connectivity and sync on every reconnect
    Watch {
        /// Probe URL used to validate internet reachability
        #[arg(long, value_name = "URL")]
        probe_url: Option<String>,
        /// Seconds between probes
        #[arg(long, default_value = "15")]
        interval: u64,
    },
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: CompletionShell,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum QuoteCommands {
    /// Create a new quote
    #[command(alias = "new")]
    Add(AddQuoteArgs),
    /// List quotes, newest first
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a quote
    Delete {
        /// Quote ID
        id: String,
    },
}

#[derive(Args)]
pub struct AddQuoteArgs {
    /// Client name
    #[arg(long)]
    pub client: String,
    /// Quote reference (generated when omitted)
    #[arg(long)]
    pub reference: Option<String>,
    /// Site address
    #[arg(long)]
    pub address: Option<String>,
    /// Monthly consumption in kWh
    #[arg(long)]
    pub usage_kwh: Option<f64>,
    /// Monthly bill in Rands
    #[arg(long)]
    pub bill_rands: Option<f64>,
    /// Tariff in R/kWh
    #[arg(long, default_value = "0")]
    pub tariff: f64,
    /// Panel rating in watts
    #[arg(long, default_value = "455")]
    pub panel_watt: i64,
    /// Site latitude
    #[arg(long)]
    pub latitude: Option<f64>,
    /// Site longitude
    #[arg(long)]
    pub longitude: Option<f64>,
}

#[derive(Subcommand)]
pub enum LeadCommands {
    /// Capture a new lead
    #[command(alias = "new")]
    Add(AddLeadArgs),
    /// List leads in capture order
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a lead
    Delete {
        /// Lead ID
        id: String,
    },
}

#[derive(Args)]
pub struct AddLeadArgs {
    /// Contact name
    #[arg(long)]
    pub name: String,
    /// Contact email
    #[arg(long)]
    pub email: Option<String>,
    /// Contact phone
    #[arg(long)]
    pub phone: Option<String>,
    /// Pipeline status (new, contacted, qualified, converted, lost)
    #[arg(long, default_value = "new")]
    pub status: String,
    /// Free-form notes
    #[arg(long)]
    pub notes: Option<String>,
    /// Quote to link this lead to
    #[arg(long, value_name = "ID")]
    pub quote_id: Option<String>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}
