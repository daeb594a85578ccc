#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod cfg;
pub mod compare;
pub mod constants;
pub mod error;
pub mod frame;
pub mod loader;
pub mod peak;
pub mod picks;
pub mod pipeline;
pub mod projection;
pub mod result;
pub mod snr;
pub mod spatial;
pub mod sync;

#[cfg(test)]
mod tests;

pub mod prelude {
    pub use crate::{
        cfg::{Config, MatchStrategy, TravelTimeModel},
        compare::{Comparer, Comparison, ComparisonStats, ComparisonTable},
        error::{Axis, Error, PickError},
        frame::{Layout, RadarFrame, RawFrame},
        loader::{DecodingError, FrameDecoder, FrameLoader},
        peak::{extract_peak, half_width_from_margin, Peak, PredictedTravelTime},
        picks::{PickRow, PickTable},
        pipeline::{pair_by_name, DropCounts, Pipeline, PipelineReport, Summary, UnitReport, WorkUnit},
        projection::{project, unproject, IceSheet, PlanarPoint},
        result::{Diagnostics, GridCell, SnrResult, SnrTable},
        snr::SnrComputer,
        spatial::{SpatialIndex, SpatialMatch},
        sync::{
            Association, SpatialSynchronizer, SurfaceSynchronizer, Synchronization, TimeSynchronizer,
        },
    };

    // pub re-export
    pub use hifitime::Duration;
}
