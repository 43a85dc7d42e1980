//! The per-file encode-vs-remux decision.

use tm_core::PlanAction;
use tm_probe::VideoStream;

/// The codec transmog normalizes to.
pub const TARGET_VIDEO_CODEC: &str = "hevc";

/// Profiles known to be universally decodable by target playback clients.
const EDGE_SAFE_PROFILES: &[&str] = &["main", "main 10"];

/// Pixel formats known to be universally decodable (8/10-bit 4:2:0).
const EDGE_SAFE_PIX_FMTS: &[&str] = &["yuv420p", "yuv420p10le"];

/// Outcome of the action decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionDecision {
    pub action: PlanAction,
    /// Explanatory note when a target-codec file still needs re-encoding.
    pub note: Option<String>,
}

/// Whether a target-codec stream can be passed through to any client.
pub fn edge_safe(video: &VideoStream) -> bool {
    let profile_ok = video
        .profile
        .as_deref()
        .map(|p| EDGE_SAFE_PROFILES.contains(&p.to_lowercase().as_str()))
        .unwrap_or(false);
    let pix_fmt_ok = video
        .pix_fmt
        .as_deref()
        .map(|p| EDGE_SAFE_PIX_FMTS.contains(&p))
        .unwrap_or(false);
    profile_ok && pix_fmt_ok
}

/// Decide between re-encoding and remuxing.
///
/// Files already in the target codec are remuxed when `skip_compatible` is
/// enabled and the stream is edge-safe; everything else is encoded. Skip
/// decisions (e.g. a missing video stream) are made by the caller before
/// planning and never originate here.
pub fn decide_action(video: &VideoStream, skip_compatible: bool) -> ActionDecision {
    if video.codec == TARGET_VIDEO_CODEC {
        if skip_compatible && edge_safe(video) {
            return ActionDecision {
                action: PlanAction::Remux,
                note: None,
            };
        }
        if skip_compatible {
            let profile = video.profile.as_deref().unwrap_or("unknown profile");
            return ActionDecision {
                action: PlanAction::Encode,
                note: Some(format!("{profile} not compatible; re-encoding")),
            };
        }
    }

    ActionDecision {
        action: PlanAction::Encode,
        note: None,
    }
}
