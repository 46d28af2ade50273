pub mod sidx;

use std::{future::Future, time::Duration};

use reqwest::header::RANGE;
use url::Url;

use crate::{
    error::{KagamiError, KagamiResult},
    util::{http::HttpClient, range::ByteRange},
};
use sidx::{find_sidx, SegmentIndexBox};

/// Upstream hosts may hang on partial-range requests, never wait longer than this.
pub const DEFAULT_INDEX_TIMEOUT: Duration = Duration::from_secs(15);

/// One addressable sub-segment of a fragmented MP4 file.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentDescriptor {
    /// Byte offset of the segment in the media file.
    pub start: u64,
    /// Length in bytes.
    pub length: u64,
    /// Duration in seconds.
    pub duration: f64,
}

impl SegmentDescriptor {
    /// Offset of the first byte after this segment.
    pub fn end(&self) -> u64 {
        self.start + self.length
    }
}

/// Source of segment descriptors for a fragment-indexed media URL.
///
/// Implementations never fail: an empty result means "no index available"
/// and callers fall back to a single segment.
pub trait SegmentIndex: Send + Sync {
    fn extract_segments(
        &self,
        url: &Url,
        index_end: u64,
    ) -> impl Future<Output = Vec<SegmentDescriptor>> + Send;
}

/// Fetches `0..=index_end` of a media file and reads its `sidx` box.
#[derive(Clone)]
pub struct SegmentIndexExtractor {
    client: HttpClient,
    timeout: Duration,
}

impl SegmentIndexExtractor {
    pub fn new(client: HttpClient) -> Self {
        Self {
            client,
            timeout: DEFAULT_INDEX_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub async fn fetch_sidx(&self, url: &Url, index_end: u64) -> KagamiResult<SegmentIndexBox> {
        let range = ByteRange::new(0, index_end);
        let response = self
            .client
            .get(url.clone())
            .header(RANGE, range.to_http_range())
            .timeout(self.timeout)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(KagamiError::HttpError(response.status()));
        }
        log::debug!("Segment index request: {}", response.status());

        let bytes = response.bytes().await?;
        let sidx = find_sidx(&bytes)?;
        log::debug!(
            "Timescale: {}, references: {}",
            sidx.timescale,
            sidx.references.len()
        );
        Ok(sidx)
    }
}

impl SegmentIndex for SegmentIndexExtractor {
    async fn extract_segments(&self, url: &Url, index_end: u64) -> Vec<SegmentDescriptor> {
        match self.fetch_sidx(url, index_end).await {
            Ok(sidx) => segments_from_sidx(&sidx, index_end),
            Err(error) => {
                log::warn!("Segment index unavailable for {url}: {error}");
                Vec::new()
            }
        }
    }
}

/// Lay the references of `sidx` out back to back, starting at `index_end`.
pub fn segments_from_sidx(sidx: &SegmentIndexBox, index_end: u64) -> Vec<SegmentDescriptor> {
    let timescale = sidx.timescale as f64;
    let mut start = index_end;

    sidx.references
        .iter()
        .map(|reference| {
            let segment = SegmentDescriptor {
                start,
                length: reference.referenced_size as u64,
                duration: reference.subsegment_duration as f64 / timescale,
            };
            start = segment.end();
            segment
        })
        .collect()
}
