// One-time catch-up at startup: re-run the daily and monthly rollups so a crash
// between cascade stages in a previous run is repaired.

use crate::history_repo::HistoryRepo;
use tracing::info;

pub async fn run_backfill(repo: &HistoryRepo) -> crate::error::Result<()> {
    repo.rollup().await?;
    info!("startup rollup complete");
    Ok(())
}
