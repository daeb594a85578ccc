//! Radargram loading.
//!
//! Radargrams come in two container formats which disagree on axis order.
//! Each format is a [FrameDecoder] returning a [RawFrame] tagged with its
//! [Layout]; [FrameLoader] tries a primary decoder, falls back to the
//! secondary one only when the primary reports [DecodingError::Unsupported],
//! and always hands a canonical [RadarFrame] to the core.
use log::{debug, warn};
use std::path::Path;
use thiserror::Error;

use crate::{
    error::Error,
    frame::{RadarFrame, RawFrame},
};

#[derive(Error, Debug)]
pub enum DecodingError {
    /// This decoder does not handle this container: another one may
    #[error("unsupported container: {0}")]
    Unsupported(String),
    /// Container recognized but content is invalid
    #[error("corrupt content: {0}")]
    Corrupt(String),
    #[error("missing variable \"{0}\"")]
    MissingVariable(String),
    #[error("i/o error")]
    Io(#[from] std::io::Error),
}

/// A radargram container decoder
pub trait FrameDecoder {
    /// Decoder name, for logging purposes
    fn name(&self) -> &str;
    /// Decodes the container at given path
    fn decode(&self, path: &Path) -> Result<RawFrame, DecodingError>;
}

/// Two step radargram loader: `primary`, then `fallback` on
/// [DecodingError::Unsupported] only.
pub struct FrameLoader<P: FrameDecoder, F: FrameDecoder> {
    primary: P,
    fallback: F,
}

impl<P: FrameDecoder, F: FrameDecoder> FrameLoader<P, F> {
    pub fn new(primary: P, fallback: F) -> Self {
        Self { primary, fallback }
    }

    /// Loads a canonical [RadarFrame]
    pub fn load(&self, path: &Path) -> Result<RadarFrame, Error> {
        let raw = match self.primary.decode(path) {
            Ok(raw) => raw,
            Err(DecodingError::Unsupported(reason)) => {
                debug!(
                    "{}: {} decoder: {} - trying {} decoder",
                    path.display(),
                    self.primary.name(),
                    reason,
                    self.fallback.name()
                );
                self.fallback.decode(path).map_err(|e| {
                    warn!("{}: {} decoder: {}", path.display(), self.fallback.name(), e);
                    Error::Format(format!(
                        "\"{}\": neither {} nor {} decoder succeeded: {}",
                        path.display(),
                        self.primary.name(),
                        self.fallback.name(),
                        e
                    ))
                })?
            },
            Err(e) => {
                return Err(Error::Format(format!(
                    "\"{}\": {} decoder: {}",
                    path.display(),
                    self.primary.name(),
                    e
                )));
            },
        };
        RadarFrame::from_raw(raw)
    }
}
