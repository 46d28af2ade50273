//! Master playlist header lines.

use crate::format::FormatDescriptor;

/// Used for audio formats without a language tag.
pub const DEFAULT_AUDIO_LANGUAGE: &str = "en";

pub fn audio_file_name(format: &FormatDescriptor) -> String {
    format!("{}.m3u8", format.itag)
}

pub fn video_file_name(format: &FormatDescriptor) -> String {
    format!("v-{}.m3u8", format.itag)
}

/// `#EXT-X-MEDIA` line of one audio format.
pub fn audio_media_line(format: &FormatDescriptor, group_id: &str, uri: &str) -> String {
    let language = format
        .language
        .as_deref()
        .unwrap_or(DEFAULT_AUDIO_LANGUAGE);
    let name = match &format.audio_quality {
        Some(quality) => quality.clone(),
        None => format.itag.to_string(),
    };
    format!(
        r#"#EXT-X-MEDIA:TYPE=AUDIO,GROUP-ID="{group_id}",LANGUAGE="{language}",NAME="{name}",AUTOSELECT=YES,DEFAULT=YES,URI="{uri}""#
    )
}

/// `#EXT-X-STREAM-INF` line of a video rendition.
///
/// Returns `None` when the format lacks a codec string or a resolution.
pub fn stream_inf_line(format: &FormatDescriptor, audio_group: Option<&str>) -> Option<String> {
    if !format.has_video() {
        return None;
    }
    let codecs = format.codecs()?;
    let width = format.width?;
    let height = format.height?;

    let mut attributes = vec![format!("BANDWIDTH={}", format.bitrate)];
    if let Some(average) = format.average_bitrate {
        attributes.push(format!("AVERAGE-BANDWIDTH={average}"));
    }
    if let Some(fps) = format.fps {
        attributes.push(format!("FRAME-RATE={fps}"));
    }
    attributes.push(format!("RESOLUTION={width}x{height}"));
    attributes.push(format!(r#"CODECS="{codecs}""#));
    if let Some(group) = audio_group {
        attributes.push(format!(r#"AUDIO="{group}""#));
    }

    Some(format!("#EXT-X-STREAM-INF:{}", attributes.join(",")))
}
