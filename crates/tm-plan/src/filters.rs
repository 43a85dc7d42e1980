//! Video filter chain assembly and HDR color handling.

use serde::{Deserialize, Serialize};
use tm_core::{EncoderMode, HdrMode};
use tm_probe::VideoStream;

/// Send top-field-first output only for frames the deinterlacer flags.
const DEINTERLACE_FILTER: &str = "yadif=0:-1:0";

/// Hable tonemap via linear light, landing on 8-bit BT.709.
const TONEMAP_FILTER: &str = "zscale=t=linear:npl=100,tonemap=hable:desat=0,\
zscale=t=bt709:m=bt709:p=bt709,format=yuv420p";

/// Upload frames to the CUDA device after software filtering.
const HW_UPLOAD_FILTER: &str = "format=p010le,hwupload_cuda";

/// HDR color metadata carried through to the encoder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorMetadata {
    pub transfer: String,
    pub primaries: String,
    pub space: String,
}

/// Assemble the ordered filter chain for an encode.
///
/// Deinterlacing runs first so the tonemap sees progressive frames. When the
/// hardware encoder is active and any software filter is in the chain, frames
/// are uploaded to the device as the final step; with no software filters the
/// encoder takes its input directly.
pub fn video_filters(
    video: &VideoStream,
    encoder: EncoderMode,
    hdr: HdrMode,
    deinterlace: bool,
) -> Vec<String> {
    let mut chain = Vec::new();

    if deinterlace && video.interlaced() {
        chain.push(DEINTERLACE_FILTER.to_string());
    }

    if hdr == HdrMode::Tonemap && video.is_hdr() {
        chain.push(TONEMAP_FILTER.to_string());
    }

    if encoder == EncoderMode::Hardware && !chain.is_empty() {
        chain.push(HW_UPLOAD_FILTER.to_string());
    }

    chain
}

/// Color metadata to tag the output with, when HDR is preserved.
pub fn color_metadata(video: &VideoStream, hdr: HdrMode) -> Option<ColorMetadata> {
    if hdr != HdrMode::Preserve || !video.is_hdr() {
        return None;
    }

    Some(ColorMetadata {
        transfer: video.color_transfer.clone()?,
        primaries: video.color_primaries.clone().unwrap_or_else(|| "bt2020".into()),
        space: video.color_space.clone().unwrap_or_else(|| "bt2020nc".into()),
    })
}
