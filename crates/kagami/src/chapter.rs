use serde::{Deserialize, Serialize};

use crate::error::KagamiResult;

pub const CHAPTERS_FILE: &str = "chapters.json";
pub const CHAPTERS_DATA_ID: &str = "com.apple.hls.chapters";

/// Chapter marker as reported by the upstream provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chapter {
    pub title: String,
    pub start_ms: u64,
    #[serde(default)]
    pub thumbnails: Vec<Thumbnail>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thumbnail {
    pub url: String,
    pub width: u32,
    pub height: u32,
}

#[derive(Serialize)]
struct HlsChapter<'a> {
    chapter: usize,
    #[serde(rename = "start-time")]
    start_time: f64,
    titles: Vec<HlsChapterTitle<'a>>,
    images: Vec<HlsChapterImage<'a>>,
}

#[derive(Serialize)]
struct HlsChapterTitle<'a> {
    language: &'a str,
    title: &'a str,
}

#[derive(Serialize)]
struct HlsChapterImage<'a> {
    #[serde(rename = "image-category")]
    image_category: &'static str,
    #[serde(rename = "pixel-width")]
    pixel_width: u32,
    #[serde(rename = "pixel-height")]
    pixel_height: u32,
    url: &'a str,
}

/// Encoded chapter side-file together with the master playlist line pointing at it.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedChapters {
    pub file_name: &'static str,
    pub json: String,
    pub master_line: String,
}

/// Converts chapter markers into the HLS chapter JSON format.
///
/// The upstream provider only reports a single title per chapter, it is
/// repeated for every language in `languages`.
#[derive(Debug, Clone)]
pub struct ChapterEncoder {
    languages: Vec<String>,
}

impl Default for ChapterEncoder {
    fn default() -> Self {
        Self::new(["de", "en"])
    }
}

impl ChapterEncoder {
    pub fn new<I, S>(languages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            languages: languages.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns `None` when there is nothing to encode.
    pub fn encode(&self, chapters: &[Chapter]) -> KagamiResult<Option<EncodedChapters>> {
        if chapters.is_empty() {
            return Ok(None);
        }

        let hls_chapters: Vec<_> = chapters
            .iter()
            .enumerate()
            .map(|(index, chapter)| HlsChapter {
                chapter: index,
                start_time: chapter.start_ms as f64 / 1000.0,
                titles: self
                    .languages
                    .iter()
                    .map(|language| HlsChapterTitle {
                        language,
                        title: &chapter.title,
                    })
                    .collect(),
                images: chapter
                    .thumbnails
                    .iter()
                    .map(|image| HlsChapterImage {
                        image_category: "hd",
                        pixel_width: image.width,
                        pixel_height: image.height,
                        url: &image.url,
                    })
                    .collect(),
            })
            .collect();

        Ok(Some(EncodedChapters {
            file_name: CHAPTERS_FILE,
            json: serde_json::to_string(&hls_chapters)?,
            master_line: format!(
                r#"#EXT-X-SESSION-DATA:DATA-ID="{CHAPTERS_DATA_ID}",URI="{CHAPTERS_FILE}""#
            ),
        }))
    }
}
