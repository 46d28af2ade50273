use serde::{Deserialize, Serialize};

/// Inclusive byte range as reported by the upstream provider, `start..=end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    pub fn new(start: u64, end: u64) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> u64 {
        self.end.saturating_sub(self.start) + 1
    }

    pub fn is_empty(&self) -> bool {
        self.end < self.start
    }

    pub fn to_http_range(&self) -> String {
        format!("bytes={}-{}", self.start, self.end)
    }

    /// `<length>@<offset>`, as used by `EXT-X-MAP` and `EXT-X-BYTERANGE`.
    pub fn to_hls_byterange(&self) -> String {
        format!("{}@{}", self.len(), self.start)
    }
}
