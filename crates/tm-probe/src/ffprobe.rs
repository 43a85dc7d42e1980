//! FFprobe-based metadata provider.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use tm_av::{ToolCommand, ToolRegistry};
use tm_core::{Error, Result};

use crate::types::{AudioStream, MediaInfo, SubtitleStream, VideoStream};

/// Probing should never take long; a stuck ffprobe means a broken file.
const PROBE_TIMEOUT: Duration = Duration::from_secs(120);

/// Subtitle codecs that are bitmap-based and can never be converted to text.
const BITMAP_SUBTITLE_CODECS: &[&str] = &[
    "hdmv_pgs_subtitle",
    "dvd_subtitle",
    "dvb_subtitle",
    "xsub",
];

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: FfprobeFormat,
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
    size: Option<String>,
    bit_rate: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: String,
    codec_name: Option<String>,
    profile: Option<String>,
    pix_fmt: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    channels: Option<u32>,
    sample_rate: Option<String>,
    bit_rate: Option<String>,
    field_order: Option<String>,
    color_transfer: Option<String>,
    color_primaries: Option<String>,
    color_space: Option<String>,
    #[serde(default)]
    disposition: FfprobeDisposition,
    #[serde(default)]
    tags: FfprobeTags,
}

#[derive(Debug, Default, Deserialize)]
struct FfprobeDisposition {
    #[serde(default)]
    default: u8,
}

#[derive(Debug, Default, Deserialize)]
struct FfprobeTags {
    language: Option<String>,
}

/// Probe a media file with ffprobe and parse the JSON result.
///
/// # Errors
///
/// Returns [`tm_core::Error::Tool`] if ffprobe is missing or fails, and
/// [`tm_core::Error::Probe`] if its output cannot be parsed.
pub async fn probe_file(tools: &ToolRegistry, path: &Path) -> Result<MediaInfo> {
    let ffprobe = tools.require("ffprobe")?;

    let mut cmd = ToolCommand::new(ffprobe.to_path_buf());
    cmd.timeout(PROBE_TIMEOUT);
    cmd.args([
        "-v",
        "quiet",
        "-print_format",
        "json",
        "-show_format",
        "-show_streams",
    ]);
    cmd.arg(path.to_string_lossy());

    let output = cmd.execute().await?;

    let raw: FfprobeOutput = serde_json::from_str(&output.stdout)
        .map_err(|e| Error::Probe(format!("unparseable ffprobe output: {e}")))?;

    Ok(parse_ffprobe_output(path, raw))
}

fn parse_ffprobe_output(path: &Path, raw: FfprobeOutput) -> MediaInfo {
    let mut info = MediaInfo {
        path: path.to_path_buf(),
        file_size: parse_num(&raw.format.size).unwrap_or(0),
        bitrate_kbps: parse_num(&raw.format.bit_rate).map(|b| b / 1000),
        duration_secs: raw.format.duration.as_deref().and_then(|s| s.parse().ok()),
        video: None,
        audio_streams: Vec::new(),
        subtitle_streams: Vec::new(),
        attachment_count: 0,
    };

    for stream in raw.streams {
        match stream.codec_type.as_str() {
            // Only the first video stream matters; later ones are usually
            // embedded cover art.
            "video" if info.video.is_none() => {
                info.video = Some(VideoStream {
                    codec: stream.codec_name.unwrap_or_default(),
                    profile: stream.profile,
                    pix_fmt: stream.pix_fmt,
                    width: stream.width.unwrap_or(0),
                    height: stream.height.unwrap_or(0),
                    bitrate_kbps: parse_num(&stream.bit_rate).map(|b| b / 1000),
                    field_order: stream.field_order,
                    color_transfer: stream.color_transfer,
                    color_primaries: stream.color_primaries,
                    color_space: stream.color_space,
                });
            }
            "video" => {
                tracing::debug!("Ignoring secondary video stream in {}", path.display());
            }
            "audio" => {
                info.audio_streams.push(AudioStream {
                    codec: stream.codec_name.unwrap_or_default(),
                    channels: stream.channels.unwrap_or(2),
                    sample_rate: stream.sample_rate.as_deref().and_then(|s| s.parse().ok()),
                    bitrate_kbps: parse_num(&stream.bit_rate).map(|b| b / 1000),
                    language: stream.tags.language,
                    default: stream.disposition.default == 1,
                });
            }
            "subtitle" => {
                let codec = stream.codec_name.unwrap_or_default();
                let bitmap = BITMAP_SUBTITLE_CODECS.contains(&codec.as_str());
                info.subtitle_streams.push(SubtitleStream { codec, bitmap });
            }
            "attachment" => {
                info.attachment_count += 1;
            }
            _ => {}
        }
    }

    info
}

fn parse_num(value: &Option<String>) -> Option<u64> {
    value.as_deref().and_then(|s| s.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn parse(json: &str) -> MediaInfo {
        let raw: FfprobeOutput = serde_json::from_str(json).unwrap();
        parse_ffprobe_output(&PathBuf::from("/test.mkv"), raw)
    }

    #[test]
    fn parses_typical_hevc_file() {
        let info = parse(
            r#"{
                "format": {"duration": "3600.5", "size": "4000000000", "bit_rate": "8888000"},
                "streams": [
                    {
                        "codec_type": "video", "codec_name": "hevc", "profile": "Main 10",
                        "pix_fmt": "yuv420p10le", "width": 3840, "height": 2160,
                        "bit_rate": "7500000", "field_order": "progressive",
                        "color_transfer": "smpte2084", "color_primaries": "bt2020",
                        "color_space": "bt2020nc"
                    },
                    {
                        "codec_type": "audio", "codec_name": "eac3", "channels": 6,
                        "sample_rate": "48000", "bit_rate": "640000",
                        "disposition": {"default": 1}, "tags": {"language": "eng"}
                    },
                    {"codec_type": "subtitle", "codec_name": "hdmv_pgs_subtitle"},
                    {"codec_type": "subtitle", "codec_name": "subrip"},
                    {"codec_type": "attachment", "codec_name": "ttf"}
                ]
            }"#,
        );

        let video = info.video.as_ref().unwrap();
        assert_eq!(video.codec, "hevc");
        assert_eq!(video.profile.as_deref(), Some("Main 10"));
        assert_eq!(video.bitrate_kbps, Some(7500));
        assert!(video.is_hdr());

        assert_eq!(info.bitrate_kbps, Some(8888));
        assert_eq!(info.duration_secs, Some(3600.5));
        assert_eq!(info.audio_streams.len(), 1);
        assert_eq!(info.audio_streams[0].bitrate_kbps, Some(640));
        assert!(info.audio_streams[0].default);

        assert_eq!(info.subtitle_streams.len(), 2);
        assert!(info.subtitle_streams[0].bitmap);
        assert!(!info.subtitle_streams[1].bitmap);
        assert_eq!(info.attachment_count, 1);
    }

    #[test]
    fn only_first_video_stream_is_kept() {
        let info = parse(
            r#"{
                "format": {},
                "streams": [
                    {"codec_type": "video", "codec_name": "h264", "width": 1920, "height": 1080},
                    {"codec_type": "video", "codec_name": "mjpeg", "width": 600, "height": 900}
                ]
            }"#,
        );
        assert_eq!(info.video.as_ref().unwrap().codec, "h264");
        assert_eq!(info.video.as_ref().unwrap().width, 1920);
    }

    #[test]
    fn file_without_video_has_none() {
        let info = parse(
            r#"{
                "format": {"size": "1000"},
                "streams": [
                    {"codec_type": "audio", "codec_name": "flac", "channels": 2}
                ]
            }"#,
        );
        assert!(info.video.is_none());
        assert_eq!(info.audio_streams.len(), 1);
    }

    #[test]
    fn missing_fields_default_gracefully() {
        let info = parse(r#"{"format": {}, "streams": []}"#);
        assert_eq!(info.file_size, 0);
        assert!(info.bitrate_kbps.is_none());
        assert!(info.duration_secs.is_none());
        assert!(info.video.is_none());
    }
}
