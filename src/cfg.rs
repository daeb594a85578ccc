//! Processing configuration
use crate::{constants::Defaults, error::Error, projection::IceSheet};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

fn default_permittivity() -> f64 {
    Defaults::ICE_RELATIVE_PERMITTIVITY
}

fn default_margin() -> f64 {
    Defaults::LAYER_SELECTION_MARGIN_M
}

fn default_time_span_tolerance() -> f64 {
    Defaults::TIME_SPAN_TOLERANCE_S
}

fn default_diagnostics() -> bool {
    true
}

/// How picks are associated to radargram slow-time samples
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum MatchStrategy {
    /// Time synchronization when both the radargram and the picks are
    /// time tagged, spatial matching otherwise
    #[default]
    Auto,
    /// GPS time / UTC time of day synchronization
    Time,
    /// Nearest slow-time sample in the projected plane
    Spatial,
    /// Slow-time sample whose surface two way travel time is the
    /// closest to the predicted surface travel time of the pick
    Surface,
}

/// How a pick is converted to a predicted two way travel time
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum TravelTimeModel {
    /// SURFACE and BOTTOM are ranges from the aircraft: the surface echo
    /// travels in air, the bed echo travels (BOTTOM - SURFACE) in ice.
    #[default]
    Range,
    /// Travel time is (ELEVATION - pick) at the speed of light in ice
    ElevationDifference,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Config {
    /// Ice sheet, selects the polar stereographic projection
    #[cfg_attr(feature = "serde", serde(default))]
    pub ice_sheet: IceSheet,
    /// Relative permittivity of ice
    #[cfg_attr(feature = "serde", serde(default = "default_permittivity"))]
    pub ice_relative_permittivity: f64,
    /// Peak search margin around predicted layers, in meters of ice
    #[cfg_attr(feature = "serde", serde(default = "default_margin"))]
    pub layer_selection_margin_m: f64,
    /// Peak search half width in fast-time samples.
    /// Overrides the margin derived half width when defined.
    #[cfg_attr(feature = "serde", serde(default))]
    pub half_width_samples: Option<usize>,
    /// Maximal distance (m) between a pick and its slow-time sample,
    /// when spatial matching is used
    #[cfg_attr(feature = "serde", serde(default))]
    pub spatial_match_threshold: Option<f64>,
    /// Radargram stacking interval (s), prior to extraction
    #[cfg_attr(feature = "serde", serde(default))]
    pub downsample_interval_s: Option<f64>,
    /// Maximal end time difference (s) between picks and radargram
    #[cfg_attr(feature = "serde", serde(default = "default_time_span_tolerance"))]
    pub time_span_tolerance_s: f64,
    /// Maximal time offset (s) between a pick and its slow-time sample
    #[cfg_attr(feature = "serde", serde(default))]
    pub time_match_tolerance_s: Option<f64>,
    /// Pick to slow-time association
    #[cfg_attr(feature = "serde", serde(default))]
    pub matching: MatchStrategy,
    /// Pick to travel time conversion
    #[cfg_attr(feature = "serde", serde(default))]
    pub travel_time: TravelTimeModel,
    /// Attach diagnostic columns to the results
    #[cfg_attr(feature = "serde", serde(default = "default_diagnostics"))]
    pub diagnostics: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ice_sheet: IceSheet::default(),
            ice_relative_permittivity: default_permittivity(),
            layer_selection_margin_m: default_margin(),
            half_width_samples: None,
            spatial_match_threshold: None,
            downsample_interval_s: None,
            time_span_tolerance_s: default_time_span_tolerance(),
            time_match_tolerance_s: None,
            matching: MatchStrategy::default(),
            travel_time: TravelTimeModel::default(),
            diagnostics: default_diagnostics(),
        }
    }
}

impl Config {
    /// Copies and returns self with given [IceSheet]
    pub fn with_ice_sheet(&self, sheet: IceSheet) -> Self {
        let mut s = self.clone();
        s.ice_sheet = sheet;
        s
    }

    /// Copies and returns self with given [MatchStrategy]
    pub fn with_matching(&self, matching: MatchStrategy) -> Self {
        let mut s = self.clone();
        s.matching = matching;
        s
    }

    /// Copies and returns self with a fixed peak search half width
    pub fn with_half_width(&self, samples: usize) -> Self {
        let mut s = self.clone();
        s.half_width_samples = Some(samples);
        s
    }

    /// Verifies this configuration
    pub fn validate(&self) -> Result<(), Error> {
        if !(self.ice_relative_permittivity >= 1.0) {
            return Err(Error::Config(format!(
                "ice relative permittivity {} < 1",
                self.ice_relative_permittivity
            )));
        }
        if !(self.layer_selection_margin_m >= 0.0) {
            return Err(Error::Config(format!(
                "negative layer selection margin {}m",
                self.layer_selection_margin_m
            )));
        }
        if !(self.time_span_tolerance_s >= 0.0) {
            return Err(Error::Config(format!(
                "negative time span tolerance {}s",
                self.time_span_tolerance_s
            )));
        }
        for (name, value) in [
            ("spatial match threshold", self.spatial_match_threshold),
            ("downsampling interval", self.downsample_interval_s),
            ("time match tolerance", self.time_match_tolerance_s),
        ] {
            if let Some(value) = value {
                if !(value > 0.0) {
                    return Err(Error::Config(format!("{} must be positive", name)));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    #[test]
    fn defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.ice_sheet, IceSheet::Antarctica);
        assert_eq!(cfg.ice_relative_permittivity, 3.15);
        assert_eq!(cfg.layer_selection_margin_m, 30.0);
        assert_eq!(cfg.time_span_tolerance_s, 3.0);
        assert_eq!(cfg.matching, MatchStrategy::Auto);
        assert_eq!(cfg.travel_time, TravelTimeModel::Range);
        assert!(cfg.diagnostics);
        assert!(cfg.validate().is_ok());
    }
    #[test]
    fn validation() {
        let mut cfg = Config::default();
        cfg.ice_relative_permittivity = 0.5;
        assert!(cfg.validate().is_err());
        let mut cfg = Config::default();
        cfg.spatial_match_threshold = Some(-1.0);
        assert!(cfg.validate().is_err());
        let mut cfg = Config::default();
        cfg.downsample_interval_s = Some(f64::NAN);
        assert!(cfg.validate().is_err());
    }
    #[test]
    #[cfg(feature = "serde")]
    fn deserialization() {
        let cfg: Config = serde_json::from_str(
            r#"{
                "ice_sheet": "greenland",
                "ice_relative_permittivity": 3.17,
                "downsample_interval_s": 1.0,
                "matching": "time",
                "travel_time": "elevation_difference"
            }"#,
        )
        .unwrap();
        assert_eq!(cfg.ice_sheet, IceSheet::Greenland);
        assert_eq!(cfg.ice_relative_permittivity, 3.17);
        assert_eq!(cfg.layer_selection_margin_m, 30.0);
        assert_eq!(cfg.downsample_interval_s, Some(1.0));
        assert_eq!(cfg.matching, MatchStrategy::Time);
        assert_eq!(cfg.travel_time, TravelTimeModel::ElevationDifference);
        assert!(cfg.diagnostics);

        let cfg: Config = serde_json::from_str(r#"{"matching": "surface"}"#).unwrap();
        assert_eq!(cfg.matching, MatchStrategy::Surface);

        let cfg: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg, Config::default());
    }
}
