//! Pick to radargram slow-time synchronization.
//!
//! Picks and radargrams describe the same flight leg at different sample
//! densities. Two association strategies are supported:
//! - [TimeSynchronizer]: both time axes are reduced to elapsed time,
//!   picks are decimated to the radargram density, then each pick is
//!   associated to the closest slow-time sample in time.
//! - [SpatialSynchronizer]: each pick is associated to the closest
//!   slow-time sample in the projected plane.
//! - [SurfaceSynchronizer]: each pick is associated to the slow-time
//!   sample with the closest surface two way travel time.
use hifitime::Duration;
use log::{debug, trace};

use crate::{
    cfg::TravelTimeModel,
    constants::Defaults,
    error::{Axis, Error},
    frame::first_decrease,
    picks::PickTable,
    projection::{IceSheet, PlanarPoint},
    spatial::SpatialIndex,
};

/// Association of one pick to one slow-time sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Association {
    /// Pick row index
    pub pick: usize,
    /// Slow-time sample index
    pub along_track: usize,
    /// Residual offset: seconds for time synchronization,
    /// meters for spatial matching
    pub offset: f64,
}

/// Synchronization outcome
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Synchronization {
    /// Associated picks, in increasing pick order
    pub associations: Vec<Association>,
    /// Pick decimation factor that was applied
    pub decimation: usize,
    /// Number of retained picks dropped for carrying sentinel values
    pub invalid: usize,
    /// Number of valid picks that could not be associated
    pub unmatched: usize,
}

/// Seconds in a day
const DAY_S: f64 = 86_400.0;

/// Unwraps a UTC time of day axis across midnight: every drop larger than
/// half a day is treated as a day rollover. Other decreases are kept and
/// reported by [elapsed].
pub fn unwrap_time_of_day(axis: &[f64]) -> Vec<f64> {
    let mut days = 0.0;
    let mut previous: Option<f64> = None;
    axis.iter()
        .map(|t| {
            if let Some(previous) = previous {
                if previous - t > DAY_S / 2.0 {
                    days += 1.0;
                }
            }
            previous = Some(*t);
            t + days * DAY_S
        })
        .collect()
}

/// Converts a time axis to elapsed time since its first sample.
/// Fails on empty, non finite or decreasing axes.
pub fn elapsed(axis: &[f64], which: Axis) -> Result<Vec<f64>, Error> {
    let t0 = *axis
        .first()
        .ok_or_else(|| Error::Format(format!("empty {} time axis", which)))?;
    if axis.iter().any(|t| !t.is_finite()) {
        return Err(Error::Format(format!("non finite {} time axis", which)));
    }
    if let Some(index) = first_decrease(axis) {
        return Err(Error::NonMonotonicTime { axis: which, index });
    }
    Ok(axis.iter().map(|t| t - t0).collect())
}

/// Pick decimation factor: ceil(picks / radar samples), at least 1
pub fn decimation_factor(picks: usize, radar: usize) -> usize {
    if radar == 0 {
        return 1;
    }
    picks.div_ceil(radar).max(1)
}

/// Index of the sample closest to `t`, in a non decreasing axis (O(log n)).
/// Ties resolve to the lowest index.
pub fn nearest_sample(axis: &[f64], t: f64) -> Option<usize> {
    if axis.is_empty() || !t.is_finite() {
        return None;
    }
    let upper = axis.partition_point(|sample| *sample < t);
    if upper == 0 {
        return Some(0);
    }
    if upper < axis.len() && axis[upper] - t < t - axis[upper - 1] {
        // first sample >= t: already the first of its duplicates
        return Some(upper);
    }
    // rewind to the first duplicate of the sample below t
    let value = axis[upper - 1];
    Some(axis.partition_point(|sample| *sample < value))
}

/// Time based synchronizer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeSynchronizer {
    /// Maximal end time difference between both axes
    pub span_tolerance: Duration,
    /// Maximal pick to slow-time sample offset, if any
    pub max_offset: Option<Duration>,
}

impl Default for TimeSynchronizer {
    fn default() -> Self {
        Self {
            span_tolerance: Duration::from_seconds(Defaults::TIME_SPAN_TOLERANCE_S),
            max_offset: None,
        }
    }
}

impl TimeSynchronizer {
    /// Synchronizes picks to given radargram slow-time axis.
    /// The pick table must carry a time of day column, which may roll
    /// over at midnight (see [unwrap_time_of_day]).
    pub fn synchronize(&self, radar_time: &[f64], picks: &PickTable) -> Result<Synchronization, Error> {
        let pick_time = picks
            .time_of_day()
            .ok_or_else(|| Error::Format("pick table is not time tagged".to_string()))?;
        self.synchronize_axes(radar_time, &unwrap_time_of_day(&pick_time), picks)
    }

    fn synchronize_axes(
        &self,
        radar_time: &[f64],
        pick_time: &[f64],
        picks: &PickTable,
    ) -> Result<Synchronization, Error> {
        let radar = elapsed(radar_time, Axis::SlowTime)?;
        let pick_time = elapsed(pick_time, Axis::Picks)?;

        let radar_span = radar[radar.len() - 1];
        let pick_span = pick_time[pick_time.len() - 1];
        if (radar_span - pick_span).abs() > self.span_tolerance.to_seconds() {
            return Err(Error::TimeSpanMismatch {
                radar: Duration::from_seconds(radar_span),
                picks: Duration::from_seconds(pick_span),
            });
        }

        let decimation = decimation_factor(picks.len(), radar.len());
        debug!(
            "time synchronization: {} picks, {} slow-time samples, decimation {}",
            picks.len(),
            radar.len(),
            decimation
        );

        let mut sync = Synchronization {
            decimation,
            ..Default::default()
        };

        for (pick, row) in picks.rows().iter().enumerate().step_by(decimation) {
            if !row.is_valid() {
                sync.invalid += 1;
                continue;
            }
            let t = pick_time[pick];
            let along_track = match nearest_sample(&radar, t) {
                Some(index) => index,
                None => {
                    sync.unmatched += 1;
                    continue;
                },
            };
            let offset = (radar[along_track] - t).abs();
            if let Some(max_offset) = self.max_offset {
                if offset > max_offset.to_seconds() {
                    trace!("pick #{}: {}s away from closest slow-time sample", pick, offset);
                    sync.unmatched += 1;
                    continue;
                }
            }
            sync.associations.push(Association {
                pick,
                along_track,
                offset,
            });
        }

        Ok(sync)
    }
}

/// Position based synchronizer
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SpatialSynchronizer {
    /// Projection used for both datasets
    pub sheet: IceSheet,
    /// Associations at or beyond this distance (m) are rejected
    pub threshold: Option<f64>,
}

impl SpatialSynchronizer {
    /// Associates each valid pick to the closest slow-time sample position.
    pub fn synchronize(&self, radar: &[PlanarPoint], picks: &PickTable) -> Synchronization {
        let index = SpatialIndex::build(radar);
        self.synchronize_with(&index, picks)
    }

    /// Same as [Self::synchronize], with a prebuilt index
    /// over the slow-time sample positions.
    pub fn synchronize_with(&self, index: &SpatialIndex, picks: &PickTable) -> Synchronization {
        let mut sync = Synchronization {
            decimation: 1,
            ..Default::default()
        };
        for (pick, row) in picks.rows().iter().enumerate() {
            if !row.is_valid() {
                sync.invalid += 1;
                continue;
            }
            match index.nearest_point(&row.position(self.sheet)) {
                Some((along_track, distance))
                    if self.threshold.map_or(true, |threshold| distance < threshold) =>
                {
                    sync.associations.push(Association {
                        pick,
                        along_track,
                        offset: distance,
                    });
                },
                _ => {
                    trace!("pick #{}: no slow-time sample in range", pick);
                    sync.unmatched += 1;
                },
            }
        }
        debug!(
            "spatial synchronization: {}/{} picks associated",
            sync.associations.len(),
            picks.len()
        );
        sync
    }
}

/// Surface travel time based synchronizer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceSynchronizer {
    /// Pick to travel time conversion
    pub travel_time: TravelTimeModel,
    pub ice_relative_permittivity: f64,
}

impl Default for SurfaceSynchronizer {
    fn default() -> Self {
        Self {
            travel_time: TravelTimeModel::default(),
            ice_relative_permittivity: Defaults::ICE_RELATIVE_PERMITTIVITY,
        }
    }
}

impl SurfaceSynchronizer {
    /// Associates each valid pick to the slow-time sample whose surface
    /// two way travel time (s) is the closest to the predicted one.
    /// The surface axis is not required to be sorted: the search is linear,
    /// skips non finite samples, and ties resolve to the lowest index.
    pub fn synchronize(&self, surface: &[f64], picks: &PickTable) -> Synchronization {
        let mut sync = Synchronization {
            decimation: 1,
            ..Default::default()
        };
        for (pick, row) in picks.rows().iter().enumerate() {
            if !row.is_valid() {
                sync.invalid += 1;
                continue;
            }
            let predicted = self
                .travel_time
                .predict(row, self.ice_relative_permittivity)
                .surface;
            let closest = surface
                .iter()
                .enumerate()
                .filter(|(_, twtt)| twtt.is_finite())
                .map(|(index, twtt)| (index, (twtt - predicted).abs()))
                .fold(None, |best: Option<(usize, f64)>, (index, offset)| match best {
                    Some((_, min)) if offset >= min => best,
                    _ => Some((index, offset)),
                });
            match closest {
                Some((along_track, offset)) if offset.is_finite() => {
                    sync.associations.push(Association {
                        pick,
                        along_track,
                        offset,
                    });
                },
                _ => {
                    trace!("pick #{}: no surface travel time close to {}s", pick, predicted);
                    sync.unmatched += 1;
                },
            }
        }
        debug!(
            "surface synchronization: {}/{} picks associated",
            sync.associations.len(),
            picks.len()
        );
        sync
    }
}
