use std::{path::PathBuf, time::Duration};

use anyhow::Context;
use clap::{Args, Subcommand};
use kagami::{
    cache::KagamiCache, BuilderConfig, DefaultOrchestrator, ExpirySweeper, HttpClient,
    HttpFormatProvider, OrchestratorConfig, PlaylistBuilder, SegmentIndexExtractor, SweepConfig,
};
use reqwest::{ClientBuilder, Url};

use crate::config::Config;

mod get;
mod watch;

const DEFAULT_CACHE_DIR: &str = "playlists";

#[derive(Subcommand, Clone, Debug)]
pub enum KagamiCommand {
    /// Print one file of a video, generating the playlists if needed
    Get(get::GetCommand),
    /// Delete expired videos from the cache once
    Sweep,
    /// Delete expired videos periodically until interrupted
    Watch(watch::WatchCommand),
}

impl KagamiCommand {
    pub async fn run(self, settings: Settings) -> anyhow::Result<()> {
        match self {
            KagamiCommand::Get(command) => command.run(settings).await,
            KagamiCommand::Sweep => {
                let report = settings.sweeper().sweep().await?;
                log::info!(
                    "{} deleted, {} kept, {} failed",
                    report.deleted,
                    report.kept,
                    report.failed
                );
                Ok(())
            }
            KagamiCommand::Watch(command) => command.run(settings).await,
        }
    }
}

#[derive(Args, Clone, Debug)]
pub struct GlobalOptions {
    /// TOML file providing defaults for the options below
    #[clap(long, env = "KAGAMI_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Directory generated playlists are stored in [default: playlists]
    #[clap(long, env = "KAGAMI_CACHE_DIR", global = true)]
    cache_dir: Option<PathBuf>,

    /// Endpoint serving format sets as JSON at `<provider>/<video-id>`
    #[clap(long, env = "KAGAMI_PROVIDER", global = true)]
    provider: Option<String>,

    /// Treat cached playlists as stale this many minutes before they expire [default: 30]
    #[clap(long, env = "KAGAMI_GRACE_MINUTES", global = true)]
    grace_minutes: Option<u64>,

    /// Also sweep videos expiring within this many minutes [default: 0]
    #[clap(long, env = "KAGAMI_SWEEP_MARGIN_MINUTES", global = true)]
    sweep_margin_minutes: Option<u64>,

    /// Timeout of one segment index request, in seconds [default: 15]
    #[clap(long, env = "KAGAMI_INDEX_TIMEOUT", global = true)]
    index_timeout: Option<u64>,

    /// Cookie sent to the provider, eg. "name=value". Can be repeated.
    #[clap(long = "cookie", global = true)]
    cookies: Vec<String>,
}

impl GlobalOptions {
    /// Merge the command line with the config file.
    pub fn resolve(self) -> anyhow::Result<Settings> {
        let config = match &self.config {
            Some(file) => Config::load(file)
                .with_context(|| format!("Failed to load config from {}", file.display()))?,
            None => Config::default(),
        };

        let provider = self
            .provider
            .or(config.provider)
            .map(|provider| provider.parse::<Url>())
            .transpose()
            .context("Invalid provider URL")?;

        let mut cookies = config.cookies;
        cookies.extend(self.cookies);

        let mut orchestrator = OrchestratorConfig::default();
        if let Some(minutes) = self.grace_minutes.or(config.grace_minutes) {
            orchestrator.grace_margin = Duration::from_secs(minutes * 60);
        }

        let mut sweep = SweepConfig::default();
        if let Some(minutes) = self.sweep_margin_minutes.or(config.sweep_margin_minutes) {
            sweep.margin = Duration::from_secs(minutes * 60);
        }

        let mut builder = BuilderConfig::default();
        let playlist = config.playlist;
        if let Some(selection) = playlist.video_selection {
            builder.video_selection = selection;
        }
        if let Some(group_id) = playlist.audio_group_id {
            builder.audio_group_id = group_id;
        }
        if let Some(languages) = playlist.chapter_languages {
            builder.chapter_languages = languages;
        }

        Ok(Settings {
            cache_dir: self
                .cache_dir
                .or(config.cache_dir)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CACHE_DIR)),
            provider,
            cookies,
            index_timeout: self
                .index_timeout
                .or(config.index_timeout)
                .map(Duration::from_secs),
            orchestrator,
            sweep,
            builder,
        })
    }
}

pub struct Settings {
    pub cache_dir: PathBuf,
    pub provider: Option<Url>,
    pub cookies: Vec<String>,
    pub index_timeout: Option<Duration>,
    pub orchestrator: OrchestratorConfig,
    pub sweep: SweepConfig,
    pub builder: BuilderConfig,
}

impl Settings {
    fn cache(&self) -> KagamiCache {
        KagamiCache::file(&self.cache_dir)
    }

    fn client(&self, provider: &Url) -> anyhow::Result<HttpClient> {
        let client = HttpClient::new(ClientBuilder::new().timeout(Duration::from_secs(60)))?;
        if !self.cookies.is_empty() {
            client.add_cookies(self.cookies.clone(), provider.clone())?;
        }
        Ok(client)
    }

    pub fn orchestrator(self) -> anyhow::Result<DefaultOrchestrator<KagamiCache, HttpFormatProvider>> {
        let Some(provider) = self.provider.clone() else {
            anyhow::bail!("No provider configured, pass --provider or set it in the config file.");
        };
        let client = self.client(&provider)?;

        let mut index = SegmentIndexExtractor::new(client.clone());
        if let Some(timeout) = self.index_timeout {
            index = index.with_timeout(timeout);
        }

        Ok(DefaultOrchestrator::with_config(
            self.cache(),
            HttpFormatProvider::new(client, provider),
            PlaylistBuilder::with_config(index, self.builder),
            self.orchestrator,
        ))
    }

    pub fn sweeper(&self) -> ExpirySweeper<KagamiCache> {
        ExpirySweeper::with_config(self.cache(), self.sweep.clone())
    }
}
