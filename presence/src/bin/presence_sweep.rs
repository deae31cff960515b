use std::sync::Arc;

use wardboard_presence::{
    config::Config,
    services::{reaper::OrphanReaper, termination::TerminationService},
    store::{PgPresenceStore, PresenceStore},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let config = Config::load()?;
    let pool = sqlx::PgPool::connect(&config.store_url).await?;
    let store: Arc<dyn PresenceStore> = Arc::new(PgPresenceStore::connect(pool).await?);

    let termination = Arc::new(TerminationService::new(Arc::clone(&store)));
    let reaper = OrphanReaper::new(store, termination, config.abandoned_after());

    let reclaimed = reaper.sweep().await?;
    if reclaimed > 0 {
        tracing::info!("Reclaimed {} abandoned sessions", reclaimed);
    } else {
        tracing::info!("No abandoned sessions to reclaim");
    }

    Ok(())
}
