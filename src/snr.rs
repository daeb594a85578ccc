//! Surface to bed signal to noise ratio
use crate::{constants::Defaults, error::PickError};

/// Computes the spreading corrected surface to bed power ratio
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnrComputer {
    /// Relative permittivity of ice
    pub ice_relative_permittivity: f64,
}

impl Default for SnrComputer {
    fn default() -> Self {
        Self::new(Defaults::ICE_RELATIVE_PERMITTIVITY)
    }
}

impl SnrComputer {
    pub fn new(ice_relative_permittivity: f64) -> Self {
        Self {
            ice_relative_permittivity,
        }
    }

    /// Geometric spreading corrections (surface, bed) for a reflector
    /// `surface_depth` meters below the aircraft, under `thickness` meters of ice.
    pub fn geometric_spreading(&self, surface_depth: f64, thickness: f64) -> (f64, f64) {
        let surface = surface_depth.powi(2);
        let bed = (surface_depth + thickness / self.ice_relative_permittivity.sqrt()).powi(2);
        (surface, bed)
    }

    /// SNR (dB) from linear surface and bed peak powers.
    /// Fails when either corrected power is null, or the ratio is not finite.
    pub fn compute(
        &self,
        surface_power: f64,
        bed_power: f64,
        surface_depth: f64,
        thickness: f64,
    ) -> Result<f64, PickError> {
        let (corr_surface, corr_bed) = self.geometric_spreading(surface_depth, thickness);
        let surface = surface_power.abs() * corr_surface;
        let bed = bed_power.abs() * corr_bed;

        let err = PickError::SnrComputation { surface, bed };
        if surface == 0.0 || bed == 0.0 {
            return Err(err);
        }

        let snr = 10.0 * (surface / bed).log10();
        if snr.is_finite() {
            Ok(snr)
        } else {
            Err(err)
        }
    }
}
