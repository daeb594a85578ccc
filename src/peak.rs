//! Layer peak power extraction.
//!
//! A pick predicts a two way travel time (TWTT). The peak echo is searched
//! within `half_width` fast-time samples around the closest fast-time bin,
//! and its magnitude is returned along with its refined TWTT.
use crate::{
    cfg::TravelTimeModel,
    constants::{propagation_speed, SPEED_OF_LIGHT},
    error::PickError,
    frame::RadarFrame,
    picks::PickRow,
    sync::nearest_sample,
};

/// Peak echo found in a search window
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Peak {
    /// Slow-time sample index
    pub along_track: usize,
    /// Fast-time sample index
    pub fast_time: usize,
    /// Refined two way travel time (s)
    pub twtt: f64,
    /// Echo magnitude (linear)
    pub power: f64,
}

impl Peak {
    /// Echo magnitude (dB)
    pub fn power_db(&self) -> f64 {
        10.0 * self.power.log10()
    }
}

/// Predicted (surface, bed) two way travel times of a pick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PredictedTravelTime {
    pub surface: f64,
    pub bed: f64,
}

impl TravelTimeModel {
    /// Predicts the surface and bed two way travel times (s) of given pick
    pub fn predict(&self, pick: &PickRow, ice_relative_permittivity: f64) -> PredictedTravelTime {
        let v_ice = propagation_speed(ice_relative_permittivity);
        match self {
            Self::Range => {
                let surface = 2.0 * pick.surface / SPEED_OF_LIGHT;
                PredictedTravelTime {
                    surface,
                    bed: surface + 2.0 * (pick.bottom - pick.surface) / v_ice,
                }
            },
            Self::ElevationDifference => PredictedTravelTime {
                surface: (pick.elevation - pick.surface) / v_ice,
                bed: (pick.elevation - pick.bottom) / v_ice,
            },
        }
    }
}

/// Converts a margin expressed in meters of ice to a half width in
/// fast-time samples: the margin travel time in ice over the fast-time
/// sampling period, rounded to the closest integer.
pub fn half_width_from_margin(margin_m: f64, ice_relative_permittivity: f64, fast_time_spacing: f64) -> usize {
    if !(fast_time_spacing > 0.0) || !(margin_m > 0.0) {
        return 0;
    }
    let margin_twtt = margin_m / propagation_speed(ice_relative_permittivity);
    (margin_twtt / fast_time_spacing).round() as usize
}

/// Fast-time index closest to `twtt`. Travel times outside the fast-time
/// axis are extrapolated using the averaged sampling period, and may
/// therefore fall outside the radargram. Far away travel times saturate
/// at the `i64` bounds.
fn virtual_index(frame: &RadarFrame, twtt: f64) -> Option<i64> {
    let time = frame.time();
    let (first, last) = (*time.first()?, *time.last()?);
    if twtt >= first && twtt <= last {
        return nearest_sample(time, twtt).map(|i| i as i64);
    }
    let dt = frame.fast_time_spacing()?;
    if twtt < first {
        // float to int casts saturate
        Some(-(((first - twtt) / dt).round() as i64))
    } else {
        let last_index = (time.len() - 1) as i64;
        Some(last_index.saturating_add(((twtt - last) / dt).round() as i64))
    }
}

/// Searches the peak echo magnitude of slow-time sample `along_track`, within
/// `half_width` fast-time samples of the predicted travel time.
/// Fails with [PickError::NoPeakFound] when the window does not intersect
/// the radargram, or only contains non finite samples.
pub fn extract_peak(
    frame: &RadarFrame,
    along_track: usize,
    predicted_twtt: f64,
    half_width: usize,
) -> Result<Peak, PickError> {
    let no_peak = PickError::NoPeakFound {
        along_track,
        twtt: predicted_twtt,
    };

    let trace = frame.trace(along_track).ok_or_else(|| no_peak.clone())?;
    if !predicted_twtt.is_finite() {
        return Err(no_peak);
    }
    let center = virtual_index(frame, predicted_twtt).ok_or_else(|| no_peak.clone())?;

    let half_width = i64::try_from(half_width).unwrap_or(i64::MAX);
    let start = center.saturating_sub(half_width).max(0);
    let end = center.saturating_add(half_width).min(trace.len() as i64 - 1);
    if start > end {
        return Err(no_peak);
    }

    let (start, end) = (start as usize, end as usize);
    let mut peak: Option<(usize, f64)> = None;
    for (offset, sample) in trace.slice(ndarray::s![start..=end]).iter().enumerate() {
        let magnitude = sample.abs();
        if !magnitude.is_finite() {
            continue;
        }
        match peak {
            Some((_, max)) if magnitude <= max => {},
            _ => peak = Some((start + offset, magnitude)),
        }
    }

    let (fast_time, power) = peak.ok_or(no_peak)?;
    Ok(Peak {
        along_track,
        fast_time,
        twtt: frame.time()[fast_time],
        power,
    })
}
