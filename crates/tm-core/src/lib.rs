//! Core types shared across the transmog workspace: the unified error type,
//! media-domain enums, quality scales, and run configuration.

pub mod config;
mod error;
mod media;
mod quality;

pub use error::{Error, Result};
pub use media::{Container, EncoderMode, HdrMode, PlanAction};
pub use quality::{QualityPair, NVENC_QUALITY_MAX, NVENC_QUALITY_MIN, X265_QUALITY_MAX, X265_QUALITY_MIN};
