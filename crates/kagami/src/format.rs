use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::ByteRange;

static CODECS_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"codecs="([^"]*)""#).expect("valid codecs regex"));

/// One adaptive-bitrate variant reported by the upstream provider.
///
/// `url` is expected to be directly fetchable, any deciphering has already
/// been done by the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormatDescriptor {
    pub itag: u32,
    /// Container and codec string, eg. `video/mp4; codecs="avc1.64001f"`.
    pub mime_type: String,
    pub bitrate: u64,
    pub average_bitrate: Option<u64>,

    pub width: Option<u32>,
    pub height: Option<u32>,
    pub fps: Option<f64>,

    pub audio_quality: Option<String>,
    pub language: Option<String>,

    pub approx_duration_ms: Option<u64>,

    /// Initialization segment, `moov` and friends.
    pub init_range: Option<ByteRange>,
    /// The `sidx` box. Absent means the stream is not fragment-indexed.
    pub index_range: Option<ByteRange>,

    pub url: Url,
}

impl FormatDescriptor {
    pub fn new(itag: u32, mime_type: impl Into<String>, bitrate: u64, url: Url) -> Self {
        Self {
            itag,
            mime_type: mime_type.into(),
            bitrate,
            average_bitrate: None,
            width: None,
            height: None,
            fps: None,
            audio_quality: None,
            language: None,
            approx_duration_ms: None,
            init_range: None,
            index_range: None,
            url,
        }
    }

    pub fn has_video(&self) -> bool {
        self.mime_type.starts_with("video/")
    }

    pub fn has_audio(&self) -> bool {
        self.mime_type.starts_with("audio/")
    }

    /// Only fragmented MP4 can be addressed with `EXT-X-MAP` + byte ranges.
    pub fn is_fragmented_mp4(&self) -> bool {
        self.mime_type.starts_with("video/mp4") || self.mime_type.starts_with("audio/mp4")
    }

    /// The value of the `codecs` parameter of the MIME type.
    pub fn codecs(&self) -> Option<&str> {
        CODECS_REGEX
            .captures(&self.mime_type)
            .and_then(|captures| captures.get(1))
            .map(|m| m.as_str())
            .filter(|codecs| !codecs.is_empty())
    }

    pub fn approx_duration_secs(&self) -> Option<f64> {
        self.approx_duration_ms.map(|ms| ms as f64 / 1000.0)
    }

    /// Both ranges are needed to emit a byte-ranged playlist.
    pub fn fragment_ranges(&self) -> Option<(ByteRange, ByteRange)> {
        Some((self.init_range?, self.index_range?))
    }
}
