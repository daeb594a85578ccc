//! Polar stereographic projection (ellipsoidal, WGS84).
//!
//! Both ice sheets use the variant "B" polar stereographic projection,
//! defined by a latitude of true scale and a central meridian:
//!
//! - Antarctica: EPSG:3031, true scale at 71°S, central meridian 0°
//! - Greenland : EPSG:3413, true scale at 70°N, central meridian 45°W
//!
//! Non finite coordinates are propagated as NaN, never rejected.
use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};
use std::str::FromStr;
use thiserror::Error;

use crate::constants::Wgs84;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParsingError {
    #[error("unknown ice sheet \"{0}\": use \"antarctica\" or \"greenland\"")]
    UnknownIceSheet(String),
}

/// Ice sheet, selects the projection parameters
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum IceSheet {
    /// South polar stereographic (EPSG:3031)
    #[default]
    Antarctica,
    /// North polar stereographic (EPSG:3413)
    Greenland,
}

impl std::fmt::Display for IceSheet {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Antarctica => write!(f, "antarctica"),
            Self::Greenland => write!(f, "greenland"),
        }
    }
}

impl FromStr for IceSheet {
    type Err = ParsingError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "antarctica" | "antarctic" | "epsg:3031" => Ok(Self::Antarctica),
            "greenland" | "epsg:3413" => Ok(Self::Greenland),
            _ => Err(ParsingError::UnknownIceSheet(s.to_string())),
        }
    }
}

impl IceSheet {
    /// Latitude of true scale, in decimal degrees
    pub const fn true_scale_latitude(&self) -> f64 {
        match self {
            Self::Antarctica => -71.0,
            Self::Greenland => 70.0,
        }
    }
    /// Central meridian, in decimal degrees
    pub const fn central_meridian(&self) -> f64 {
        match self {
            Self::Antarctica => 0.0,
            Self::Greenland => -45.0,
        }
    }
    /// EPSG code of the projected coordinate system
    pub const fn epsg(&self) -> u32 {
        match self {
            Self::Antarctica => 3031,
            Self::Greenland => 3413,
        }
    }
    fn is_south(&self) -> bool {
        self.true_scale_latitude() < 0.0
    }
    /// Projects (lat, lon) in decimal degrees
    pub fn project(&self, lat: f64, lon: f64) -> PlanarPoint {
        project(lat, lon, *self)
    }
    /// Inverse projection, returns (lat, lon) in decimal degrees
    pub fn unproject(&self, point: PlanarPoint) -> (f64, f64) {
        unproject(point, *self)
    }
}

/// (x, y) coordinates in a polar stereographic plane, in meters
#[derive(Default, Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PlanarPoint {
    pub x: f64,
    pub y: f64,
}

impl PlanarPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
    /// Returns true if both coordinates are finite
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
    /// Euclidean distance to rhs
    pub fn distance(&self, rhs: &Self) -> f64 {
        self.distance_squared(rhs).sqrt()
    }
    pub(crate) fn distance_squared(&self, rhs: &Self) -> f64 {
        let (dx, dy) = (self.x - rhs.x, self.y - rhs.y);
        dx * dx + dy * dy
    }
}

impl From<(f64, f64)> for PlanarPoint {
    fn from(xy: (f64, f64)) -> Self {
        Self::new(xy.0, xy.1)
    }
}

impl From<PlanarPoint> for (f64, f64) {
    fn from(p: PlanarPoint) -> Self {
        (p.x, p.y)
    }
}

impl std::fmt::Display for PlanarPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "({:.3}m, {:.3}m)", self.x, self.y)
    }
}

/// Isometric colatitude function "t" (Snyder 15-9), phi in radians
fn tsfn(phi: f64, e: f64) -> f64 {
    let esin = e * phi.sin();
    (FRAC_PI_4 - phi / 2.0).tan() / ((1.0 - esin) / (1.0 + esin)).powf(e / 2.0)
}

/// Radius scaling a.mc/tc, expressed for the north polar aspect
fn rho_scale(sheet: IceSheet) -> f64 {
    let e = Wgs84::eccentricity();
    let phi_c = sheet.true_scale_latitude().abs().to_radians();
    let mc = phi_c.cos() / (1.0 - (e * phi_c.sin()).powi(2)).sqrt();
    Wgs84::A * mc / tsfn(phi_c, e)
}

/// Projects geographic coordinates (decimal degrees) to the polar
/// stereographic plane of given [IceSheet].
pub fn project(lat: f64, lon: f64, sheet: IceSheet) -> PlanarPoint {
    let e = Wgs84::eccentricity();
    let lambda = (lon - sheet.central_meridian()).to_radians();
    if sheet.is_south() {
        // south aspect: mirror latitude and longitude, then (x, y)
        let rho = rho_scale(sheet) * tsfn((-lat).to_radians(), e);
        PlanarPoint::new(rho * lambda.sin(), rho * lambda.cos())
    } else {
        let rho = rho_scale(sheet) * tsfn(lat.to_radians(), e);
        PlanarPoint::new(rho * lambda.sin(), -rho * lambda.cos())
    }
}

/// Vectorized [project]. Both slices must have the same length,
/// the shortest one dictates the output length otherwise.
pub fn project_all(lat: &[f64], lon: &[f64], sheet: IceSheet) -> Vec<PlanarPoint> {
    lat.iter()
        .zip(lon.iter())
        .map(|(lat, lon)| project(*lat, *lon, sheet))
        .collect()
}

/// Inverse polar stereographic projection, returns (lat, lon)
/// in decimal degrees (Snyder 7-9 series).
pub fn unproject(point: PlanarPoint, sheet: IceSheet) -> (f64, f64) {
    let e = Wgs84::eccentricity();
    let e2 = e * e;
    let (e4, e6, e8) = (e2 * e2, e2 * e2 * e2, e2 * e2 * e2 * e2);

    let rho = (point.x * point.x + point.y * point.y).sqrt();
    let t = rho / rho_scale(sheet);
    let chi = FRAC_PI_2 - 2.0 * t.atan();

    let phi = chi
        + (e2 / 2.0 + 5.0 * e4 / 24.0 + e6 / 12.0 + 13.0 * e8 / 360.0) * (2.0 * chi).sin()
        + (7.0 * e4 / 48.0 + 29.0 * e6 / 240.0 + 811.0 * e8 / 11520.0) * (4.0 * chi).sin()
        + (7.0 * e6 / 120.0 + 81.0 * e8 / 1120.0) * (6.0 * chi).sin()
        + (4279.0 * e8 / 161280.0) * (8.0 * chi).sin();

    let (lat, lambda) = if sheet.is_south() {
        (-phi, point.x.atan2(point.y))
    } else {
        (phi, point.x.atan2(-point.y))
    };

    (lat.to_degrees(), normalize_longitude(lambda.to_degrees() + sheet.central_meridian()))
}

/// Wraps a longitude into [-180°, 180°[
fn normalize_longitude(lon: f64) -> f64 {
    (lon + 180.0).rem_euclid(360.0) - 180.0
}
