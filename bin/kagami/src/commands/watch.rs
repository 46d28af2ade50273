use std::{num::NonZeroU64, time::Duration};

use clap::Args;

use super::Settings;

#[derive(Args, Clone, Debug)]
pub struct WatchCommand {
    /// Seconds between two sweeps
    #[clap(long, default_value = "600")]
    pub interval: NonZeroU64,
}

impl WatchCommand {
    pub async fn run(self, settings: Settings) -> anyhow::Result<()> {
        let sweeper = settings.sweeper();
        log::info!(
            "Sweeping {} every {}s",
            settings.cache_dir.display(),
            self.interval
        );

        tokio::select! {
            _ = sweeper.run(Duration::from_secs(self.interval.get())) => {}
            result = tokio::signal::ctrl_c() => {
                result?;
                log::info!("Interrupted, stopping.");
            }
        }

        Ok(())
    }
}
