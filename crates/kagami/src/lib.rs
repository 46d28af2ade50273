pub mod cache;
pub mod chapter;
pub mod error;
pub mod format;
pub mod index;
pub mod orchestrator;
pub mod playlist;
pub mod provider;
pub mod sweep;
mod util;

pub use error::{KagamiError, KagamiResult};
pub use format::FormatDescriptor;
pub use index::{SegmentDescriptor, SegmentIndex, SegmentIndexExtractor};
pub use orchestrator::{CacheMetadata, CacheOrchestrator, OrchestratorConfig};
pub use playlist::{BuilderConfig, PlaylistBuilder, PlaylistBundle, VideoSelection};
pub use provider::{FormatProvider, FormatSet, HttpFormatProvider};
pub use sweep::{ExpirySweeper, SweepConfig, SweepReport};
pub use util::{http::HttpClient, range::ByteRange};

/// Media type playlists are served with.
pub const HLS_MIME_TYPE: &str = "application/vnd.apple.mpegurl";

/// Orchestrator reading segment indexes over HTTP.
pub type DefaultOrchestrator<S, P> = CacheOrchestrator<S, P, SegmentIndexExtractor>;
