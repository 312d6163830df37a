//! Error types for the Veld CLI

use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] veld_core::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("No owner identity configured. Set VELD_USER_ID to your agent id.")]
    MissingUser,
    #[error("Invalid id: {0}")]
    InvalidId(String),
    #[error(
        "No probe URL available. Pass --probe-url or configure VELD_API_URL so `veld watch` \
         can validate connectivity."
    )]
    MissingProbeUrl,
}
