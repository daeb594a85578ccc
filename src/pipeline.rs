//! Processing pipeline.
//!
//! [Pipeline::process] turns one (radargram, picks) unit of work into an
//! [SnrTable]. Per pick failures are counted and the pick is dropped,
//! per unit failures abort that unit only. [Pipeline::run] processes many
//! units and never lets one failure abort its siblings.
use std::{
    borrow::Cow,
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use hifitime::Duration;
use log::{debug, info, trace, warn};

use crate::{
    cfg::{Config, MatchStrategy},
    error::{Error, PickError},
    frame::RadarFrame,
    peak::{extract_peak, half_width_from_margin},
    picks::PickTable,
    result::{Diagnostics, SnrResult, SnrTable},
    snr::SnrComputer,
    sync::{SpatialSynchronizer, SurfaceSynchronizer, Synchronization, TimeSynchronizer},
};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Number of picks dropped, per cause
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DropCounts {
    /// Picks carrying sentinel values
    pub invalid: usize,
    /// Picks that could not be associated to a slow-time sample
    pub unmatched: usize,
    /// Picks for which a layer peak could not be found
    pub no_peak: usize,
    /// Picks for which the SNR could not be computed
    pub snr: usize,
}

impl DropCounts {
    pub fn total(&self) -> usize {
        self.invalid + self.unmatched + self.no_peak + self.snr
    }

    fn count(&mut self, e: &PickError) {
        match e {
            PickError::InvalidSentinel(_) => self.invalid += 1,
            PickError::NoMatch(_) => self.unmatched += 1,
            PickError::NoPeakFound { .. } => self.no_peak += 1,
            PickError::SnrComputation { .. } => self.snr += 1,
        }
    }
}

/// Outcome of one unit of work
#[derive(Debug, Clone, PartialEq)]
pub struct UnitReport {
    pub table: SnrTable,
    /// Association strategy that was actually used
    pub strategy: MatchStrategy,
    /// Pick decimation factor
    pub decimation: usize,
    /// Peak search half width (fast-time samples)
    pub half_width: usize,
    pub dropped: DropCounts,
}

/// One unit of work, identified by name. A side is missing when
/// no file of that name was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkUnit {
    pub name: String,
    pub picks: Option<PathBuf>,
    pub frame: Option<PathBuf>,
}

impl WorkUnit {
    /// Verifies both sides exist
    pub fn paths(&self) -> Result<(&Path, &Path), Error> {
        match (&self.picks, &self.frame) {
            (Some(picks), Some(frame)) => Ok((picks.as_path(), frame.as_path())),
            (Some(_), None) => Err(Error::MissingPair(format!("no radargram named \"{}\"", self.name))),
            (None, _) => Err(Error::MissingPair(format!("no pick table named \"{}\"", self.name))),
        }
    }
}

/// Pairs pick tables and radargrams by file stem.
/// Units are sorted by name. Names found on a single side
/// produce a unit with a missing side.
pub fn pair_by_name<P: AsRef<Path>, F: AsRef<Path>>(picks: &[P], frames: &[F]) -> Vec<WorkUnit> {
    fn stem(path: &Path) -> String {
        path.file_stem()
            .map(|stem| stem.to_string_lossy().to_string())
            .unwrap_or_default()
    }

    let mut units = BTreeMap::<String, WorkUnit>::new();
    for path in picks.iter().map(|p| p.as_ref()) {
        let name = stem(path);
        let unit = units.entry(name.clone()).or_insert_with(|| WorkUnit {
            name,
            picks: None,
            frame: None,
        });
        if unit.picks.replace(path.to_path_buf()).is_some() {
            warn!("\"{}\": duplicated pick table name", unit.name);
        }
    }
    for path in frames.iter().map(|p| p.as_ref()) {
        let name = stem(path);
        let unit = units.entry(name.clone()).or_insert_with(|| WorkUnit {
            name,
            picks: None,
            frame: None,
        });
        if unit.frame.replace(path.to_path_buf()).is_some() {
            warn!("\"{}\": duplicated radargram name", unit.name);
        }
    }
    units.into_values().collect()
}

/// Per unit outcome counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub success: usize,
    pub missing_pair: usize,
    pub failed: usize,
}

/// Outcome of many units of work
#[derive(Debug, Default)]
pub struct PipelineReport {
    /// Aggregated results, in unit order
    pub table: SnrTable,
    pub summary: Summary,
    /// Failed units, as (name, error)
    pub failures: Vec<(String, Error)>,
    /// Picks dropped over all successful units
    pub dropped: DropCounts,
}

impl PipelineReport {
    fn record(&mut self, name: String, outcome: Result<UnitReport, Error>) {
        match outcome {
            Ok(mut report) => {
                self.summary.success += 1;
                self.dropped.invalid += report.dropped.invalid;
                self.dropped.unmatched += report.dropped.unmatched;
                self.dropped.no_peak += report.dropped.no_peak;
                self.dropped.snr += report.dropped.snr;
                self.table.append(&mut report.table);
            },
            Err(e) => {
                warn!("{}: {}", name, e);
                match e {
                    Error::MissingPair(_) => self.summary.missing_pair += 1,
                    _ => self.summary.failed += 1,
                }
                self.failures.push((name, e));
            },
        }
    }

    fn from_outcomes<I: IntoIterator<Item = (String, Result<UnitReport, Error>)>>(outcomes: I) -> Self {
        let mut s = Self::default();
        for (name, outcome) in outcomes {
            s.record(name, outcome);
        }
        info!(
            "{} units processed: {} success, {} missing pair, {} failure(s), {} measurements",
            s.summary.success + s.summary.missing_pair + s.summary.failed,
            s.summary.success,
            s.summary.missing_pair,
            s.summary.failed,
            s.table.len()
        );
        s
    }
}

/// SNR processing pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct Pipeline {
    cfg: Config,
}

impl Pipeline {
    /// Builds a new [Pipeline], verifying the [Config]
    pub fn new(cfg: Config) -> Result<Self, Error> {
        cfg.validate()?;
        Ok(Self { cfg })
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    fn strategy(&self, frame: &RadarFrame, picks: &PickTable) -> MatchStrategy {
        match self.cfg.matching {
            MatchStrategy::Auto => {
                if frame.gps_time().is_some() && picks.time_of_day().is_some() {
                    MatchStrategy::Time
                } else {
                    MatchStrategy::Spatial
                }
            },
            strategy => strategy,
        }
    }

    fn synchronize(
        &self,
        strategy: MatchStrategy,
        frame: &RadarFrame,
        picks: &PickTable,
    ) -> Result<Synchronization, Error> {
        match strategy {
            MatchStrategy::Spatial => {
                let radar = frame.planar_coordinates(self.cfg.ice_sheet).ok_or_else(|| {
                    Error::Format("spatial matching requires radargram coordinates".to_string())
                })?;
                Ok(SpatialSynchronizer {
                    sheet: self.cfg.ice_sheet,
                    threshold: self.cfg.spatial_match_threshold,
                }
                .synchronize(&radar, picks))
            },
            MatchStrategy::Surface => {
                let surface = frame.surface().ok_or_else(|| {
                    Error::Format("surface matching requires a surface travel time axis".to_string())
                })?;
                Ok(SurfaceSynchronizer {
                    travel_time: self.cfg.travel_time,
                    ice_relative_permittivity: self.cfg.ice_relative_permittivity,
                }
                .synchronize(surface, picks))
            },
            _ => {
                let radar = frame.gps_time().ok_or_else(|| {
                    Error::Format("time synchronization requires a GPS time axis".to_string())
                })?;
                TimeSynchronizer {
                    span_tolerance: Duration::from_seconds(self.cfg.time_span_tolerance_s),
                    max_offset: self.cfg.time_match_tolerance_s.map(Duration::from_seconds),
                }
                .synchronize(radar, picks)
            },
        }
    }

    /// Peak search half width, in fast-time samples
    pub fn half_width(&self, frame: &RadarFrame) -> usize {
        match self.cfg.half_width_samples {
            Some(samples) => samples,
            None => frame
                .fast_time_spacing()
                .map(|dt| {
                    half_width_from_margin(
                        self.cfg.layer_selection_margin_m,
                        self.cfg.ice_relative_permittivity,
                        dt,
                    )
                })
                .unwrap_or(0),
        }
    }

    /// Processes one unit of work
    pub fn process(&self, frame: &RadarFrame, picks: &PickTable) -> Result<UnitReport, Error> {
        let frame = match self.cfg.downsample_interval_s {
            Some(interval) => Cow::Owned(frame.downsample(interval)?),
            None => Cow::Borrowed(frame),
        };

        let strategy = self.strategy(&frame, picks);
        let sync = self.synchronize(strategy, &frame, picks)?;
        let half_width = self.half_width(&frame);
        let computer = SnrComputer::new(self.cfg.ice_relative_permittivity);

        debug!(
            "{:?} association: {} picks associated, half width {} samples",
            strategy,
            sync.associations.len(),
            half_width
        );

        let mut dropped = DropCounts {
            invalid: sync.invalid,
            unmatched: sync.unmatched,
            ..Default::default()
        };
        let mut table = SnrTable::new();

        for assoc in sync.associations.iter() {
            let row = match picks.get(assoc.pick) {
                Some(row) => row,
                None => {
                    dropped.count(&PickError::NoMatch(assoc.pick));
                    continue;
                },
            };
            let travel_time = self
                .cfg
                .travel_time
                .predict(row, self.cfg.ice_relative_permittivity);

            let measurement = extract_peak(&frame, assoc.along_track, travel_time.surface, half_width)
                .and_then(|surface| {
                    let bed = extract_peak(&frame, assoc.along_track, travel_time.bed, half_width)?;
                    Ok((surface, bed))
                })
                .and_then(|(surface, bed)| {
                    let snr = computer.compute(surface.power, bed.power, row.surface, row.thickness)?;
                    Ok((surface, bed, snr))
                })
                .and_then(|measurement| {
                    if row.position(self.cfg.ice_sheet).is_finite() {
                        Ok(measurement)
                    } else {
                        Err(PickError::NoMatch(assoc.pick))
                    }
                });

            match measurement {
                Ok((surface, bed, snr)) => {
                    let position = row.position(self.cfg.ice_sheet);
                    let mut result = SnrResult::new(position.x, position.y, snr);
                    if self.cfg.diagnostics {
                        result = result.with_diagnostics(Diagnostics {
                            pick: assoc.pick,
                            along_track: assoc.along_track,
                            offset: assoc.offset,
                            surface_index: surface.fast_time,
                            bed_index: bed.fast_time,
                            surface_twtt: surface.twtt,
                            bed_twtt: bed.twtt,
                            surface_power_db: surface.power_db(),
                            bed_power_db: bed.power_db(),
                        });
                    }
                    table.push(result);
                },
                Err(e) => {
                    trace!("pick #{}: {}", assoc.pick, e);
                    dropped.count(&e);
                },
            }
        }

        if dropped.total() > 0 {
            debug!(
                "dropped picks: {} invalid, {} unmatched, {} without peak, {} snr failure(s)",
                dropped.invalid, dropped.unmatched, dropped.no_peak, dropped.snr
            );
        }

        Ok(UnitReport {
            table,
            strategy,
            decimation: sync.decimation,
            half_width,
            dropped,
        })
    }

    /// Loads and processes one unit of work. The radargram only lives
    /// for the duration of this call.
    pub fn process_unit<L, T>(&self, unit: &WorkUnit, load_frame: L, load_picks: T) -> Result<UnitReport, Error>
    where
        L: Fn(&Path) -> Result<RadarFrame, Error>,
        T: Fn(&Path) -> Result<PickTable, Error>,
    {
        let (picks, frame) = unit.paths()?;
        let picks = load_picks(picks)?;
        let frame = load_frame(frame)?;
        let report = self.process(&frame, &picks)?;
        info!(
            "{}: {} measurements, {} picks dropped",
            unit.name,
            report.table.len(),
            report.dropped.total()
        );
        Ok(report)
    }

    /// Processes all units sequentially
    pub fn run<L, T>(&self, units: &[WorkUnit], load_frame: L, load_picks: T) -> PipelineReport
    where
        L: Fn(&Path) -> Result<RadarFrame, Error>,
        T: Fn(&Path) -> Result<PickTable, Error>,
    {
        PipelineReport::from_outcomes(units.iter().map(|unit| {
            (
                unit.name.clone(),
                self.process_unit(unit, &load_frame, &load_picks),
            )
        }))
    }

    /// Processes all units in parallel. Results are aggregated in unit order.
    #[cfg(feature = "parallel")]
    #[cfg_attr(docsrs, doc(cfg(feature = "parallel")))]
    pub fn par_run<L, T>(&self, units: &[WorkUnit], load_frame: L, load_picks: T) -> PipelineReport
    where
        L: Fn(&Path) -> Result<RadarFrame, Error> + Sync,
        T: Fn(&Path) -> Result<PickTable, Error> + Sync,
    {
        let outcomes = units
            .par_iter()
            .map(|unit| {
                (
                    unit.name.clone(),
                    self.process_unit(unit, &load_frame, &load_picks),
                )
            })
            .collect::<Vec<_>>();
        PipelineReport::from_outcomes(outcomes)
    }
}
