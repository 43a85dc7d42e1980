//! Core types for media probe results.
//!
//! Codec, profile, and pixel-format identifiers stay as strings because they
//! are compared against ffprobe's vocabulary, not an internal closed set.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Complete media file information extracted by probing.
///
/// Never mutated after creation; one instance per file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaInfo {
    /// Path to the probed file.
    pub path: PathBuf,
    /// File size in bytes.
    pub file_size: u64,
    /// Container-level bitrate in kbps, if reported.
    pub bitrate_kbps: Option<u64>,
    /// Total duration in seconds, if determinable.
    pub duration_secs: Option<f64>,
    /// The primary video stream, if any.
    pub video: Option<VideoStream>,
    /// Audio streams, in container order.
    pub audio_streams: Vec<AudioStream>,
    /// Subtitle streams, in container order.
    pub subtitle_streams: Vec<SubtitleStream>,
    /// Number of attachment streams (fonts etc.).
    pub attachment_count: u32,
}

impl MediaInfo {
    /// Effective source video bitrate for planning: the video stream's own
    /// bitrate when reported, otherwise the container-level bitrate.
    pub fn source_bitrate_kbps(&self) -> Option<u64> {
        self.video
            .as_ref()
            .and_then(|v| v.bitrate_kbps)
            .or(self.bitrate_kbps)
    }
}

/// The primary video stream of a media file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoStream {
    /// Codec name as reported by ffprobe (e.g. "hevc", "h264").
    pub codec: String,
    /// Codec profile string (e.g. "Main 10"), if reported.
    pub profile: Option<String>,
    /// Pixel format (e.g. "yuv420p10le"), if reported.
    pub pix_fmt: Option<String>,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Stream bitrate in kbps, if reported.
    pub bitrate_kbps: Option<u64>,
    /// Interlace field order (e.g. "tt", "bb", "progressive"), if reported.
    pub field_order: Option<String>,
    /// Color transfer characteristics (e.g. "smpte2084").
    pub color_transfer: Option<String>,
    /// Color primaries (e.g. "bt2020").
    pub color_primaries: Option<String>,
    /// Color space (e.g. "bt2020nc").
    pub color_space: Option<String>,
}

impl VideoStream {
    /// Total pixel count, the key into the resolution quality curve.
    pub fn pixels(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    /// Whether the stream is interlaced (field order other than progressive).
    pub fn interlaced(&self) -> bool {
        matches!(
            self.field_order.as_deref(),
            Some("tt") | Some("bb") | Some("tb") | Some("bt")
        )
    }

    /// Whether the stream carries an HDR transfer function.
    pub fn is_hdr(&self) -> bool {
        matches!(
            self.color_transfer.as_deref(),
            Some("smpte2084") | Some("arib-std-b67")
        )
    }
}

/// An audio stream within a media file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioStream {
    /// Codec name as reported by ffprobe (e.g. "aac", "dts").
    pub codec: String,
    /// Number of channels.
    pub channels: u32,
    /// Sample rate in Hz, if reported.
    pub sample_rate: Option<u32>,
    /// Stream bitrate in kbps, if reported.
    pub bitrate_kbps: Option<u64>,
    /// Language code (ISO 639-2 or IETF).
    pub language: Option<String>,
    /// Whether this is the default track.
    pub default: bool,
}

/// A subtitle stream within a media file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubtitleStream {
    /// Subtitle codec name (e.g. "subrip", "hdmv_pgs_subtitle").
    pub codec: String,
    /// Whether the format is bitmap-based (PGS, DVD) rather than text.
    pub bitmap: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn video(width: u32, height: u32) -> VideoStream {
        VideoStream {
            codec: "h264".into(),
            profile: None,
            pix_fmt: None,
            width,
            height,
            bitrate_kbps: None,
            field_order: None,
            color_transfer: None,
            color_primaries: None,
            color_space: None,
        }
    }

    #[test]
    fn pixels_multiplies_dimensions() {
        assert_eq!(video(1920, 1080).pixels(), 2_073_600);
        assert_eq!(video(640, 360).pixels(), 230_400);
    }

    #[test]
    fn interlaced_detection() {
        let mut v = video(720, 576);
        assert!(!v.interlaced());
        v.field_order = Some("progressive".into());
        assert!(!v.interlaced());
        v.field_order = Some("tt".into());
        assert!(v.interlaced());
        v.field_order = Some("bb".into());
        assert!(v.interlaced());
    }

    #[test]
    fn hdr_detection() {
        let mut v = video(3840, 2160);
        assert!(!v.is_hdr());
        v.color_transfer = Some("smpte2084".into());
        assert!(v.is_hdr());
        v.color_transfer = Some("arib-std-b67".into());
        assert!(v.is_hdr());
        v.color_transfer = Some("bt709".into());
        assert!(!v.is_hdr());
    }

    #[test]
    fn source_bitrate_prefers_video_stream() {
        let mut info = MediaInfo {
            path: PathBuf::from("/test.mkv"),
            file_size: 0,
            bitrate_kbps: Some(9000),
            duration_secs: None,
            video: Some(video(1920, 1080)),
            audio_streams: vec![],
            subtitle_streams: vec![],
            attachment_count: 0,
        };
        assert_eq!(info.source_bitrate_kbps(), Some(9000));

        info.video.as_mut().unwrap().bitrate_kbps = Some(7500);
        assert_eq!(info.source_bitrate_kbps(), Some(7500));
    }

    #[test]
    fn media_info_serde_roundtrip() {
        let info = MediaInfo {
            path: PathBuf::from("/test.mkv"),
            file_size: 42,
            bitrate_kbps: Some(8000),
            duration_secs: Some(120.5),
            video: Some(VideoStream {
                codec: "hevc".into(),
                profile: Some("Main 10".into()),
                pix_fmt: Some("yuv420p10le".into()),
                width: 3840,
                height: 2160,
                bitrate_kbps: Some(7200),
                field_order: Some("progressive".into()),
                color_transfer: Some("smpte2084".into()),
                color_primaries: Some("bt2020".into()),
                color_space: Some("bt2020nc".into()),
            }),
            audio_streams: vec![AudioStream {
                codec: "eac3".into(),
                channels: 6,
                sample_rate: Some(48000),
                bitrate_kbps: Some(640),
                language: Some("eng".into()),
                default: true,
            }],
            subtitle_streams: vec![SubtitleStream {
                codec: "hdmv_pgs_subtitle".into(),
                bitmap: true,
            }],
            attachment_count: 3,
        };

        let json = serde_json::to_string(&info).unwrap();
        let back: MediaInfo = serde_json::from_str(&json).unwrap();
        assert_eq!(back.file_size, 42);
        assert_eq!(back.video.unwrap().width, 3840);
        assert_eq!(back.audio_streams[0].channels, 6);
        assert!(back.subtitle_streams[0].bitmap);
    }
}
