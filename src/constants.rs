//! Physical constants and processing defaults

/// Speed of light in vacuum (m.s⁻¹)
pub const SPEED_OF_LIGHT: f64 = 299_792_458.0;

/// Pick tables mark missing data with this value
pub const SENTINEL: f64 = -9999.0;

/// WGS84 ellipsoid
pub(crate) struct Wgs84;

impl Wgs84 {
    /// Semi major axis (m)
    pub const A: f64 = 6_378_137.0;
    /// Flattening
    pub const F: f64 = 1.0 / 298.257_223_563;

    /// First eccentricity
    pub fn eccentricity() -> f64 {
        (Self::F * (2.0 - Self::F)).sqrt()
    }
}

/// Processing defaults
pub struct Defaults;

impl Defaults {
    /// Relative permittivity of glacier ice
    pub const ICE_RELATIVE_PERMITTIVITY: f64 = 3.15;
    /// Layer selection margin, in meters of ice
    pub const LAYER_SELECTION_MARGIN_M: f64 = 30.0;
    /// Maximal end time difference between a pick table and its radargram (s)
    pub const TIME_SPAN_TOLERANCE_S: f64 = 3.0;
    /// Distance threshold used when comparing two SNR datasets (m)
    pub const COMPARISON_THRESHOLD_M: f64 = 5000.0;
    /// Gridding cell size (m)
    pub const GRID_CELL_SIZE_M: f64 = 1000.0;
}

/// Propagation speed in a medium of given relative permittivity (m.s⁻¹)
pub fn propagation_speed(relative_permittivity: f64) -> f64 {
    SPEED_OF_LIGHT / relative_permittivity.sqrt()
}
