pub mod master;
pub mod media;
pub mod rendition;

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use futures::future::join_all;

use crate::{
    chapter::ChapterEncoder,
    error::KagamiResult,
    index::{SegmentIndex, SegmentIndexExtractor},
    provider::FormatSet,
};
use master::{audio_file_name, audio_media_line, stream_inf_line, video_file_name};
use media::media_playlist;
pub use rendition::{Rendition, Renditions, VideoSelection};

pub const MASTER_PLAYLIST: &str = "master.m3u8";
pub const DEFAULT_AUDIO_GROUP_ID: &str = "audio";

/// A master playlist together with every file it references.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlaylistBundle {
    pub master: String,
    /// File name as referenced from `master` => content.
    pub sub_files: BTreeMap<String, String>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl PlaylistBundle {
    /// Look up a file of the bundle by the name a player would request.
    pub fn file(&self, path: &str) -> Option<&str> {
        if path == MASTER_PLAYLIST {
            Some(&self.master)
        } else {
            self.sub_files.get(path).map(String::as_str)
        }
    }
}

#[derive(Debug, Clone)]
pub struct BuilderConfig {
    pub video_selection: VideoSelection,
    pub audio_group_id: String,
    pub chapter_languages: Vec<String>,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            video_selection: VideoSelection::default(),
            audio_group_id: DEFAULT_AUDIO_GROUP_ID.to_string(),
            chapter_languages: vec!["de".to_string(), "en".to_string()],
        }
    }
}

/// Turns a [`FormatSet`] into a [`PlaylistBundle`].
pub struct PlaylistBuilder<I = SegmentIndexExtractor> {
    index: I,
    video_selection: VideoSelection,
    audio_group_id: String,
    chapters: ChapterEncoder,
}

impl<I> PlaylistBuilder<I>
where
    I: SegmentIndex,
{
    pub fn new(index: I) -> Self {
        Self::with_config(index, BuilderConfig::default())
    }

    pub fn with_config(index: I, config: BuilderConfig) -> Self {
        Self {
            index,
            video_selection: config.video_selection,
            audio_group_id: config.audio_group_id,
            chapters: ChapterEncoder::new(config.chapter_languages),
        }
    }

    /// Build the bundle. Lines of the master playlist follow input order,
    /// independent of which index lookup finishes first.
    pub async fn build(&self, set: &FormatSet) -> KagamiResult<PlaylistBundle> {
        let renditions = Renditions::select(&set.formats, self.video_selection);

        let mut master = vec!["#EXTM3U".to_string()];
        let mut sub_files = BTreeMap::new();

        match self.chapters.encode(&set.chapters)? {
            Some(chapters) => {
                master.push(chapters.master_line);
                sub_files.insert(chapters.file_name.to_string(), chapters.json);
            }
            None => tracing::debug!("No chapters available"),
        }

        let audio: Vec<_> = renditions.audio_formats().collect();
        let audio_group = (!audio.is_empty()).then_some(self.audio_group_id.as_str());

        let video: Vec<_> = renditions
            .video
            .iter()
            .filter_map(|rendition| {
                let leader = rendition.leader();
                match stream_inf_line(leader, audio_group) {
                    Some(header) => Some((rendition, header, video_file_name(leader))),
                    None => {
                        tracing::warn!(
                            "No header generated for itag {} ({}), skipping rendition.",
                            leader.itag,
                            leader.mime_type
                        );
                        None
                    }
                }
            })
            .collect();

        let video_count = video.len();
        let (audio_playlists, video_playlists) = futures::join!(
            join_all(
                audio
                    .iter()
                    .map(|format| media_playlist(&self.index, std::slice::from_ref(format)))
            ),
            join_all(
                video
                    .iter()
                    .map(|(rendition, _, _)| media_playlist(&self.index, &rendition.formats))
            ),
        );

        for (format, playlist) in audio.iter().zip(audio_playlists) {
            let file_name = audio_file_name(format);
            master.push(audio_media_line(format, &self.audio_group_id, &file_name));
            sub_files.insert(file_name, playlist);
        }

        for ((_, header, file_name), playlist) in video.into_iter().zip(video_playlists) {
            master.push(header);
            master.push(file_name.clone());
            sub_files.insert(file_name, playlist);
        }

        tracing::info!(
            "Generated {} audio and {video_count} video rendition(s).",
            audio.len()
        );

        Ok(PlaylistBundle {
            master: master.join("\n"),
            sub_files,
            expires_at: set.expires_at,
        })
    }
}
