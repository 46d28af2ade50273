//! Media playlist of one rendition.

use futures::future::join_all;

use crate::{format::FormatDescriptor, index::SegmentIndex};

/// Target duration when no format reports its duration, in seconds.
pub const DEFAULT_TARGET_DURATION: u64 = 10;

struct FormatSegments {
    /// `EXT-X-MAP` line, keyed by itag.
    map: Option<(u32, String)>,
    lines: Vec<String>,
}

/// Build the media playlist of `formats`.
///
/// Formats with both an init range and an index range are addressed with
/// `EXT-X-MAP` and one `EXT-X-BYTERANGE` per `sidx` reference. Everything else,
/// including formats whose index could not be read, becomes a single segment
/// spanning the whole file.
pub async fn media_playlist<I>(index: &I, formats: &[&FormatDescriptor]) -> String
where
    I: SegmentIndex,
{
    let parts = join_all(formats.iter().map(|format| format_segments(index, format))).await;

    let mut lines = vec![
        "#EXTM3U".to_string(),
        "#EXT-X-PLAYLIST-TYPE:VOD".to_string(),
        format!("#EXT-X-TARGETDURATION:{}", target_duration(formats)),
        "#EXT-X-VERSION:7".to_string(),
        "#EXT-X-MEDIA-SEQUENCE:0".to_string(),
    ];

    let mut maps: Vec<&(u32, String)> = Vec::new();
    for map in parts.iter().filter_map(|part| part.map.as_ref()) {
        if !maps.iter().any(|(itag, _)| *itag == map.0) {
            maps.push(map);
        }
    }
    lines.extend(maps.into_iter().map(|(_, line)| line.clone()));

    for part in parts {
        lines.extend(part.lines);
    }
    lines.push("#EXT-X-ENDLIST".to_string());

    lines.join("\n")
}

fn target_duration(formats: &[&FormatDescriptor]) -> u64 {
    formats
        .iter()
        .filter_map(|format| format.approx_duration_ms)
        .max()
        .map(|ms| ms.div_ceil(1000))
        .unwrap_or(DEFAULT_TARGET_DURATION)
}

async fn format_segments<I>(index: &I, format: &FormatDescriptor) -> FormatSegments
where
    I: SegmentIndex,
{
    let url = format.url.as_str();

    if let Some((init_range, index_range)) = format.fragment_ranges() {
        let segments = index.extract_segments(&format.url, index_range.end).await;
        if !segments.is_empty() {
            let map = format!(
                r#"#EXT-X-MAP:URI="{url}",BYTERANGE="{}""#,
                init_range.to_hls_byterange()
            );
            let lines = segments
                .iter()
                .flat_map(|segment| {
                    [
                        format!("#EXTINF:{},", segment.duration),
                        format!("#EXT-X-BYTERANGE:{}@{}", segment.length, segment.start),
                        url.to_string(),
                    ]
                })
                .collect();
            return FormatSegments {
                map: Some((format.itag, map)),
                lines,
            };
        }
    }

    log::info!("Returning only single segment for itag {}", format.itag);
    let duration = format
        .approx_duration_secs()
        .unwrap_or(DEFAULT_TARGET_DURATION as f64);
    FormatSegments {
        map: None,
        lines: vec![format!("#EXTINF:{duration},"), url.to_string()],
    }
}
