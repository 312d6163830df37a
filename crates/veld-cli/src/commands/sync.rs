//! Sync and status commands

use veld_core::sync::SyncOutcome;
use veld_core::SalesRepository;

use crate::error::CliError;

pub async fn run_sync(repository: &SalesRepository) -> Result<(), CliError> {
    match repository.trigger_sync().await? {
        SyncOutcome::Completed(report) => {
            println!(
                "Pushed {} quotes and {} leads, replayed {} deletes, {} failures ({} ms)",
                report.pushed_quotes,
                report.pushed_leads,
                report.deleted,
                report.failed,
                report.duration_ms
            );
        }
        SyncOutcome::Skipped => println!("A sync pass is already running"),
    }
    Ok(())
}

pub async fn run_status(repository: &SalesRepository, as_json: bool) -> Result<(), CliError> {
    let status = repository.status().await?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    if status.is_clean() {
        println!("Everything synced");
    } else {
        println!(
            "{} quotes and {} leads awaiting sync",
            status.dirty_quotes, status.dirty_leads
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::common::testing::offline_repository;
    use veld_core::models::Quote;

    #[tokio::test(flavor = "multi_thread")]
    async fn sync_against_unconfigured_remote_leaves_rows_dirty() {
        let repository = offline_repository().await;
        repository
            .save_quote(Quote::new("QUOTE-1", "A. Botha", "tester"))
            .await
            .unwrap();

        run_sync(&repository).await.unwrap();

        let status = repository.status().await.unwrap();
        assert_eq!(status.dirty_quotes, 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn status_counts_dirty_rows() {
        let repository = offline_repository().await;
        assert!(repository.status().await.unwrap().is_clean());

        repository
            .save_quote(Quote::new("QUOTE-1", "A. Botha", "tester"))
            .await
            .unwrap();

        let status = repository.status().await.unwrap();
        assert_eq!(status.dirty_quotes, 1);
        assert_eq!(status.dirty_leads, 0);
    }
}
