use serde::{Deserialize, Serialize};

use crate::format::FormatDescriptor;

/// Which video formats end up in the master playlist.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoSelection {
    /// Only the format with the highest bitrate. Ties go to the first one.
    #[default]
    Best,
    /// One rendition per video MIME type.
    All,
}

/// Formats sharing a grouping key, in input order.
#[derive(Debug, Clone, PartialEq)]
pub struct Rendition<'a, K> {
    pub key: K,
    pub formats: Vec<&'a FormatDescriptor>,
}

impl<'a, K> Rendition<'a, K> {
    /// The format the master playlist header is derived from.
    pub fn leader(&self) -> &'a FormatDescriptor {
        self.formats[0]
    }
}

/// Group `formats` by `key`, keeping first-seen order of both keys and members.
pub fn group_by<'a, K, F>(
    formats: impl IntoIterator<Item = &'a FormatDescriptor>,
    key: F,
) -> Vec<Rendition<'a, K>>
where
    K: PartialEq,
    F: Fn(&'a FormatDescriptor) -> K,
{
    let mut groups: Vec<Rendition<'a, K>> = Vec::new();
    for format in formats {
        let k = key(format);
        match groups.iter_mut().find(|group| group.key == k) {
            Some(group) => group.formats.push(format),
            None => groups.push(Rendition {
                key: k,
                formats: vec![format],
            }),
        }
    }
    groups
}

/// The renditions a bundle is built from.
#[derive(Debug, Clone, PartialEq)]
pub struct Renditions<'a> {
    /// Grouped by language.
    pub audio: Vec<Rendition<'a, Option<&'a str>>>,
    /// Grouped by MIME type.
    pub video: Vec<Rendition<'a, &'a str>>,
}

impl<'a> Renditions<'a> {
    /// Drop everything that is not fragmented MP4, then partition and group.
    pub fn select(formats: &'a [FormatDescriptor], selection: VideoSelection) -> Self {
        let formats: Vec<_> = formats.iter().filter(|f| f.is_fragmented_mp4()).collect();

        let audio = group_by(
            formats.iter().copied().filter(|f| f.has_audio()),
            |f| f.language.as_deref(),
        );

        let videos = formats.iter().copied().filter(|f| f.has_video());
        let video = match selection {
            VideoSelection::Best => {
                let best = videos.fold(None::<&FormatDescriptor>, |best, format| match best {
                    Some(best) if best.bitrate >= format.bitrate => Some(best),
                    _ => Some(format),
                });
                group_by(best, |f| f.mime_type.as_str())
            }
            VideoSelection::All => group_by(videos, |f| f.mime_type.as_str()),
        };

        Self { audio, video }
    }

    pub fn audio_formats(&self) -> impl Iterator<Item = &'a FormatDescriptor> + '_ {
        self.audio.iter().flat_map(|group| group.formats.iter().copied())
    }
}
