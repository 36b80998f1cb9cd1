//! Sweep command - one-shot cleanup of expired verification codes

use tracing::info;

/// Delete every expired verification record, report the count and exit
pub async fn run() -> anyhow::Result<()> {
    let config = super::bootstrap()?;

    let state = crate::create_app_state_with_config(&config).await?;
    let deleted = state.verification.sweep().await?;

    info!(deleted, "Expired verification codes removed");
    println!("Removed {} expired verification code(s)", deleted);

    Ok(())
}
