//! Radargram (radar frame) representation
use itertools::Itertools;
use log::debug;
use ndarray::{Array2, ArrayView1, Axis as NdAxis};

use crate::{
    error::{Axis, Error},
    projection::{project_all, IceSheet, PlanarPoint},
};

/// Storage order of a decoded echo power matrix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Layout {
    /// Rows are slow-time (along-track) samples: canonical orientation
    #[default]
    AlongTrackMajor,
    /// Rows are fast-time samples, as stored by the legacy matrix format
    FastTimeMajor,
}

/// Decoded radargram arrays, exactly as a decoder returns them
#[derive(Debug, Clone, Default)]
pub struct RawFrame {
    /// Echo power matrix, stored in `layout` order
    pub data: Array2<f64>,
    /// Storage order of `data`
    pub layout: Layout,
    /// Fast-time axis (s), two way travel time of each fast-time bin
    pub time: Vec<f64>,
    /// Latitude of each slow-time sample (ddeg)
    pub latitude: Option<Vec<f64>>,
    /// Longitude of each slow-time sample (ddeg)
    pub longitude: Option<Vec<f64>>,
    /// GPS time of each slow-time sample (s)
    pub gps_time: Option<Vec<f64>>,
    /// Surface two way travel time of each slow-time sample (s)
    pub surface: Option<Vec<f64>>,
}

/// One flight segment radargram, in canonical [slow, fast] orientation.
/// Read only once built: every derived quantity is computed per invocation.
#[derive(Debug, Clone)]
pub struct RadarFrame {
    data: Array2<f64>,
    time: Vec<f64>,
    latitude: Option<Vec<f64>>,
    longitude: Option<Vec<f64>>,
    gps_time: Option<Vec<f64>>,
    surface: Option<Vec<f64>>,
}

/// Returns index of the first sample that decreases, if any
pub(crate) fn first_decrease(axis: &[f64]) -> Option<usize> {
    axis.iter()
        .tuple_windows()
        .position(|(prev, next)| next < prev)
        .map(|i| i + 1)
}

impl RadarFrame {
    /// Builds a [RadarFrame] from canonical arrays: `data` rows are
    /// slow-time samples, `data` columns match `time`.
    pub fn new(data: Array2<f64>, time: Vec<f64>) -> Result<Self, Error> {
        Self::from_raw(RawFrame {
            data,
            time,
            ..Default::default()
        })
    }

    /// Normalizes decoded arrays to the canonical orientation and
    /// verifies shapes and axes.
    pub fn from_raw(raw: RawFrame) -> Result<Self, Error> {
        let data = match raw.layout {
            Layout::AlongTrackMajor => raw.data,
            Layout::FastTimeMajor => raw.data.reversed_axes().as_standard_layout().into_owned(),
        };
        let (slow, fast) = data.dim();

        if slow == 0 || fast == 0 {
            return Err(Error::Format(format!("empty radargram ({}x{})", slow, fast)));
        }
        if raw.time.len() != fast {
            return Err(Error::Format(format!(
                "fast-time axis length {} does not match {} data columns",
                raw.time.len(),
                fast
            )));
        }
        if raw.time.iter().any(|t| !t.is_finite()) {
            return Err(Error::Format("non finite fast-time axis".to_string()));
        }
        if let Some(index) = first_decrease(&raw.time) {
            return Err(Error::NonMonotonicTime {
                axis: Axis::FastTime,
                index,
            });
        }

        for (name, axis) in [
            ("latitude", &raw.latitude),
            ("longitude", &raw.longitude),
            ("gps time", &raw.gps_time),
            ("surface", &raw.surface),
        ] {
            if let Some(axis) = axis {
                if axis.len() != slow {
                    return Err(Error::Format(format!(
                        "{} axis length {} does not match {} slow-time samples",
                        name,
                        axis.len(),
                        slow
                    )));
                }
            }
        }
        if raw.latitude.is_some() != raw.longitude.is_some() {
            return Err(Error::Format(
                "latitude and longitude must be provided together".to_string(),
            ));
        }

        debug!("radargram: {} slow-time x {} fast-time samples", slow, fast);

        Ok(Self {
            data,
            time: raw.time,
            latitude: raw.latitude,
            longitude: raw.longitude,
            gps_time: raw.gps_time,
            surface: raw.surface,
        })
    }

    /// Copies and returns self with given geographic coordinates
    pub fn with_coordinates(&self, latitude: Vec<f64>, longitude: Vec<f64>) -> Result<Self, Error> {
        Self::from_raw(RawFrame {
            latitude: Some(latitude),
            longitude: Some(longitude),
            ..self.to_raw()
        })
    }

    /// Copies and returns self with given GPS time axis
    pub fn with_gps_time(&self, gps_time: Vec<f64>) -> Result<Self, Error> {
        Self::from_raw(RawFrame {
            gps_time: Some(gps_time),
            ..self.to_raw()
        })
    }

    /// Copies and returns self with given surface two way travel time axis
    pub fn with_surface(&self, surface: Vec<f64>) -> Result<Self, Error> {
        Self::from_raw(RawFrame {
            surface: Some(surface),
            ..self.to_raw()
        })
    }

    fn to_raw(&self) -> RawFrame {
        RawFrame {
            data: self.data.clone(),
            layout: Layout::AlongTrackMajor,
            time: self.time.clone(),
            latitude: self.latitude.clone(),
            longitude: self.longitude.clone(),
            gps_time: self.gps_time.clone(),
            surface: self.surface.clone(),
        }
    }

    /// Number of slow-time (along-track) samples
    pub fn slow_time_len(&self) -> usize {
        self.data.nrows()
    }

    /// Number of fast-time samples
    pub fn fast_time_len(&self) -> usize {
        self.data.ncols()
    }

    /// Echo power matrix, [slow, fast]
    pub fn data(&self) -> &Array2<f64> {
        &self.data
    }

    /// Echo samples of given slow-time sample
    pub fn trace(&self, along_track: usize) -> Option<ArrayView1<'_, f64>> {
        if along_track < self.slow_time_len() {
            Some(self.data.row(along_track))
        } else {
            None
        }
    }

    /// Fast-time axis (s)
    pub fn time(&self) -> &[f64] {
        &self.time
    }

    /// Averaged fast-time sampling period (s)
    pub fn fast_time_spacing(&self) -> Option<f64> {
        let n = self.time.len();
        if n < 2 {
            return None;
        }
        let dt = (self.time[n - 1] - self.time[0]) / (n - 1) as f64;
        if dt > 0.0 {
            Some(dt)
        } else {
            None
        }
    }

    pub fn latitude(&self) -> Option<&[f64]> {
        self.latitude.as_deref()
    }

    pub fn longitude(&self) -> Option<&[f64]> {
        self.longitude.as_deref()
    }

    /// GPS time of each slow-time sample (s)
    pub fn gps_time(&self) -> Option<&[f64]> {
        self.gps_time.as_deref()
    }

    /// Surface two way travel time of each slow-time sample (s)
    pub fn surface(&self) -> Option<&[f64]> {
        self.surface.as_deref()
    }

    /// Projects every slow-time sample position, if geographic
    /// coordinates are known.
    pub fn planar_coordinates(&self, sheet: IceSheet) -> Option<Vec<PlanarPoint>> {
        let lat = self.latitude.as_ref()?;
        let lon = self.longitude.as_ref()?;
        Some(project_all(lat, lon, sheet))
    }

    /// Consumes self and returns the echo matrix
    pub fn into_data(self) -> Array2<f64> {
        self.data
    }

    /// Stacks slow-time samples into `interval` seconds bins, using
    /// the GPS time axis. Echo samples and every per slow-time axis are
    /// averaged within each bin (circular mean for longitudes); empty
    /// bins are skipped.
    pub fn downsample(&self, interval: f64) -> Result<Self, Error> {
        if !(interval > 0.0) {
            return Err(Error::Config(format!(
                "invalid downsampling interval {}s",
                interval
            )));
        }
        let gps_time = self.gps_time.as_ref().ok_or_else(|| {
            Error::Format("downsampling requires a GPS time axis".to_string())
        })?;
        if gps_time.iter().any(|t| !t.is_finite()) {
            return Err(Error::Format("non finite GPS time axis".to_string()));
        }
        if let Some(index) = first_decrease(gps_time) {
            return Err(Error::NonMonotonicTime {
                axis: Axis::SlowTime,
                index,
            });
        }

        // bins are aligned to multiples of the interval, like a calendar resampling
        let bins = gps_time
            .iter()
            .enumerate()
            .chunk_by(|(_, t)| (*t / interval).floor() as i64)
            .into_iter()
            .map(|(_, samples)| samples.map(|(i, _)| i).collect::<Vec<_>>())
            .collect::<Vec<_>>();

        let fast = self.fast_time_len();
        let mut data = Array2::<f64>::zeros((bins.len(), fast));
        for (row, bin) in bins.iter().enumerate() {
            let stacked = self.data.select(NdAxis(0), bin);
            if let Some(mean) = stacked.mean_axis(NdAxis(0)) {
                data.row_mut(row).assign(&mean);
            }
        }

        let average = |axis: &Option<Vec<f64>>| -> Option<Vec<f64>> {
            axis.as_ref().map(|values| {
                bins.iter()
                    .map(|bin| bin.iter().map(|i| values[*i]).sum::<f64>() / bin.len() as f64)
                    .collect()
            })
        };

        // longitudes are averaged on the unit circle: bins crossing the
        // antimeridian stay close to +/-180°
        let longitude = self.longitude.as_ref().map(|values| {
            bins.iter()
                .map(|bin| {
                    let (sin, cos) = bin.iter().fold((0.0_f64, 0.0_f64), |(sin, cos), i| {
                        let lon = values[*i].to_radians();
                        (sin + lon.sin(), cos + lon.cos())
                    });
                    sin.atan2(cos).to_degrees()
                })
                .collect::<Vec<_>>()
        });

        debug!(
            "downsampling ({}s): {} -> {} slow-time samples",
            interval,
            self.slow_time_len(),
            bins.len()
        );

        Self::from_raw(RawFrame {
            data,
            layout: Layout::AlongTrackMajor,
            time: self.time.clone(),
            latitude: average(&self.latitude),
            longitude,
            gps_time: average(&self.gps_time),
            surface: average(&self.surface),
        })
    }
}
