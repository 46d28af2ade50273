use std::{future::Future, sync::Arc};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{
    chapter::Chapter,
    error::{KagamiError, KagamiResult},
    format::FormatDescriptor,
    util::http::HttpClient,
};

/// Everything the upstream provider knows about one video at a given time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormatSet {
    pub formats: Vec<FormatDescriptor>,
    /// When the media URLs in `formats` stop being valid.
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub chapters: Vec<Chapter>,
}

/// Acquires the current formats of a video.
///
/// Session handling and URL deciphering are internal to the implementation.
pub trait FormatProvider: Send + Sync + 'static {
    fn fetch_formats(&self, video_id: &str) -> impl Future<Output = KagamiResult<FormatSet>> + Send;
}

impl<P> FormatProvider for Arc<P>
where
    P: FormatProvider,
{
    fn fetch_formats(&self, video_id: &str) -> impl Future<Output = KagamiResult<FormatSet>> + Send {
        self.as_ref().fetch_formats(video_id)
    }
}

/// Reads format sets as JSON from `<endpoint>/<video_id>`.
#[derive(Clone)]
pub struct HttpFormatProvider {
    client: HttpClient,
    endpoint: Url,
}

impl HttpFormatProvider {
    pub fn new(client: HttpClient, endpoint: Url) -> Self {
        Self { client, endpoint }
    }

    fn video_url(&self, video_id: &str) -> KagamiResult<Url> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| KagamiError::Provider(format!("invalid endpoint: {}", self.endpoint)))?
            .pop_if_empty()
            .push(video_id);
        Ok(url)
    }
}

impl FormatProvider for HttpFormatProvider {
    async fn fetch_formats(&self, video_id: &str) -> KagamiResult<FormatSet> {
        let url = self.video_url(video_id)?;
        tracing::debug!("Fetching formats from {url}");

        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            let status = response.status();
            if let Ok(body) = response.text().await {
                tracing::warn!("Error body: {body}");
            }
            return Err(KagamiError::HttpError(status));
        }

        let formats: FormatSet = response.json().await?;
        tracing::info!(
            "{} formats received for {video_id}, expires at {:?}",
            formats.formats.len(),
            formats.expires_at
        );
        Ok(formats)
    }
}
