use hifitime::Duration;
use thiserror::Error;

/// Time axis that failed a sanity check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// Radargram fast-time (two way travel time) axis
    FastTime,
    /// Radargram slow-time (GPS time) axis
    SlowTime,
    /// Pick table time of day column
    Picks,
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::FastTime => write!(f, "fast-time"),
            Self::SlowTime => write!(f, "slow-time"),
            Self::Picks => write!(f, "pick table"),
        }
    }
}

/// Errors that abort one unit of work (one flight segment).
/// Sibling units are never affected.
#[derive(Error, Debug)]
pub enum Error {
    #[error("format error: {0}")]
    Format(String),
    #[error("{axis} time axis decreases at sample #{index}")]
    NonMonotonicTime { axis: Axis, index: usize },
    #[error("time span mismatch: radargram lasts {radar}, picks last {picks}")]
    TimeSpanMismatch { radar: Duration, picks: Duration },
    #[error("missing pair: \"{0}\"")]
    MissingPair(String),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("i/o error")]
    Io(#[from] std::io::Error),
}

#[cfg(feature = "csv")]
impl From<csv::Error> for Error {
    fn from(e: csv::Error) -> Self {
        if !e.is_io_error() {
            return Self::Format(e.to_string());
        }
        match e.into_kind() {
            csv::ErrorKind::Io(e) => Self::Io(e),
            kind => Self::Format(format!("{:?}", kind)),
        }
    }
}

/// Errors attached to a single pick. These are recovered locally:
/// the pick is dropped and processing carries on.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PickError {
    #[error("pick #{0} carries a sentinel value")]
    InvalidSentinel(usize),
    #[error("pick #{0} could not be matched to any radargram column")]
    NoMatch(usize),
    #[error("no peak found at slow-time #{along_track} around {twtt:e} s")]
    NoPeakFound { along_track: usize, twtt: f64 },
    #[error("snr computation failed: surface {surface:e}, bed {bed:e}")]
    SnrComputation { surface: f64, bed: f64 },
}
