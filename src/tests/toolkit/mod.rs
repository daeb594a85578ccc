//! Synthetic radargrams and picks
use ndarray::Array2;

use crate::{constants::SPEED_OF_LIGHT, frame::RadarFrame, picks::PickRow};

mod csv;
pub use self::csv::trace_csv;

/// Fast-time sampling period of the synthetic radargrams: the surface echo
/// of a pick with SURFACE = 1 m lands exactly on fast-time sample #1
pub const DT: f64 = 2.0 / SPEED_OF_LIGHT;

/// Fast-time axis of `n` samples spaced by [DT]
pub fn fast_time_axis(n: usize) -> Vec<f64> {
    (0..n).map(|i| i as f64 * DT).collect()
}

/// Builds a radargram from csv described traces, one per slow-time sample
pub fn synthetic_frame(traces: &[&str]) -> RadarFrame {
    let rows = traces.iter().map(|t| trace_csv(t)).collect::<Vec<_>>();
    let fast = rows[0].len();
    let data = Array2::from_shape_vec(
        (rows.len(), fast),
        rows.into_iter().flatten().collect(),
    )
    .unwrap();
    RadarFrame::new(data, fast_time_axis(fast)).unwrap()
}

/// Pick with SURFACE = 1 m and THICK = BOTTOM - 1 m, at given latitude
pub fn pick(bottom: f64, latitude: f64) -> PickRow {
    PickRow::new(1.0, bottom, 10.0, bottom - 1.0, latitude, 0.0)
}

/// Expected SNR of a surface echo of `surface` and bed echo of `bed`,
/// for a pick with SURFACE = 1 m and given thickness
pub fn expected_snr(surface: f64, bed: f64, thickness: f64, permittivity: f64) -> f64 {
    let corr_s = 1.0_f64;
    let corr_b = (1.0 + thickness / permittivity.sqrt()).powi(2);
    10.0 * ((surface * corr_s) / (bed * corr_b)).log10()
}
