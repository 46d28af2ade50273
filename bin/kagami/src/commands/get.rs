use clap::Args;
use kagami::playlist::MASTER_PLAYLIST;

use super::Settings;

#[derive(Args, Clone, Debug)]
pub struct GetCommand {
    /// Video id
    pub video_id: String,

    /// File to print, eg. `v-137.m3u8`
    #[clap(default_value = MASTER_PLAYLIST)]
    pub path: String,

    /// Drop the cached playlists of the video first
    #[clap(long)]
    pub refresh: bool,
}

impl GetCommand {
    pub async fn run(self, settings: Settings) -> anyhow::Result<()> {
        let orchestrator = settings.orchestrator()?;
        if self.refresh {
            orchestrator.invalidate(&self.video_id).await?;
        }

        match orchestrator.fetch(&self.video_id, &self.path).await? {
            Some(content) => {
                println!("{content}");
                Ok(())
            }
            None => anyhow::bail!("{} has no file named {}", self.video_id, self.path),
        }
    }
}
