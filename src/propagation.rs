//! Free-space propagation
//!
//! Transfer-function propagators advancing a [Wave] in place:
//!  - [AngularSpectrum]: `F⁻¹{F{u}·exp(i·k·z·√(1-(λνx)²-(λνy)²))}`
//!  - [BandLimitedAngularSpectrum]: zero-padded angular spectrum with the transfer
//!    function clipped to the alias-free pass-band
//!    (K. Matsushima & T. Shimobaba, Optics Express 17(22), 2009)
//!
//! [PropagationMethod] selects one of them from a configuration file.

use crate::{error::ErrorKind, grid::GridError, wave::Wave};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

mod angular_spectrum;
mod band_limited;
pub use angular_spectrum::AngularSpectrum;
pub use band_limited::BandLimitedAngularSpectrum;

#[derive(thiserror::Error, Debug)]
pub enum PropagationError {
    #[error("propagation distance must be finite, found {0}")]
    Distance(f64),
    #[error("field shape {0:?} does not match the grid shape {1:?}")]
    ShapeMismatch((usize, usize), (usize, usize)),
    #[error("{0} propagation is not supported")]
    Unsupported(PropagationMethod),
    #[error("failed to build the propagation grid")]
    Grid(#[from] GridError),
}
impl PropagationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PropagationError::Distance(_) | PropagationError::ShapeMismatch(..) => {
                ErrorKind::InvalidConfiguration
            }
            PropagationError::Unsupported(_) => ErrorKind::Unsupported,
            PropagationError::Grid(e) => e.kind(),
        }
    }
}
type Result<T> = std::result::Result<T, PropagationError>;

/// Propagation of a [Wave] over an axial distance
pub trait Propagator {
    /// Propagates `wave` in place by `z` [m] and advances its distance
    fn propagate<W: Wave + ?Sized>(&self, wave: &mut W, z: f64) -> Result<()>;
}

fn check<W: Wave + ?Sized>(wave: &W, z: f64) -> Result<()> {
    if !z.is_finite() {
        return Err(PropagationError::Distance(z));
    }
    let shape = wave.grid().shape();
    if wave.field().dim() != shape {
        return Err(PropagationError::ShapeMismatch(wave.field().dim(), shape));
    }
    Ok(())
}

/// Propagation methods
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, EnumIter, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PropagationMethod {
    #[default]
    AngularSpectrum,
    BandLimited,
    Fresnel,
}
impl Propagator for PropagationMethod {
    fn propagate<W: Wave + ?Sized>(&self, wave: &mut W, z: f64) -> Result<()> {
        match self {
            PropagationMethod::AngularSpectrum => AngularSpectrum::default().propagate(wave, z),
            PropagationMethod::BandLimited => BandLimitedAngularSpectrum.propagate(wave, z),
            PropagationMethod::Fresnel => Err(PropagationError::Unsupported(*self)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{grid::Grid, wave::SphericalWave};
    use ndarray::Array2;
    use num_complex::Complex64;
    use std::error::Error;

    fn wave(size: usize, gaussian_width: f64, focal_len: f64) -> SphericalWave {
        let grid = Grid::new(size, size, 5.04e-6).unwrap();
        SphericalWave::new(grid, focal_len, gaussian_width, 659.6e-9).unwrap()
    }
    fn max_diff(a: &Array2<Complex64>, b: &Array2<Complex64>) -> f64 {
        a.iter()
            .zip(b.iter())
            .map(|(a, b)| (a - b).norm())
            .fold(0f64, f64::max)
    }

    #[test]
    fn parseval() -> std::result::Result<(), Box<dyn Error>> {
        let mut wave = wave(64, 40., 0.1);
        let energy = wave.energy();
        wave.propagate(&AngularSpectrum::default(), 10e-3)?;
        assert!((wave.energy() - energy).abs() / energy < 1e-9);
        assert_eq!(wave.distance(), 10e-3);
        Ok(())
    }

    #[test]
    fn round_trip() -> std::result::Result<(), Box<dyn Error>> {
        let mut wave = wave(64, 40., 0.1);
        let field = wave.field().clone();
        let propagator = AngularSpectrum::default();
        wave.propagate(&propagator, 20e-3)?;
        wave.propagate(&propagator, -20e-3)?;
        assert!(max_diff(&field, wave.field()) < 1e-6);
        assert_eq!(wave.distance(), 0.);
        Ok(())
    }

    #[test]
    fn composition() -> std::result::Result<(), Box<dyn Error>> {
        let mut one_step = wave(64, 40., 0.1);
        let mut two_steps = one_step.clone();
        one_step.propagate(&PropagationMethod::AngularSpectrum, 30e-3)?;
        two_steps.propagate(&PropagationMethod::AngularSpectrum, 10e-3)?;
        two_steps.propagate(&PropagationMethod::AngularSpectrum, 20e-3)?;
        assert!(max_diff(one_step.field(), two_steps.field()) < 1e-8);
        assert!((one_step.distance() - two_steps.distance()).abs() < 1e-15);
        Ok(())
    }

    #[test]
    fn clipped_evanescent_waves() -> std::result::Result<(), Box<dyn Error>> {
        let mut wave = wave(32, 16., 0.1);
        let field = wave.field().clone();
        let propagator = AngularSpectrum::default().clip_evanescent(true);
        wave.propagate(&propagator, 0.)?;
        assert!(max_diff(&field, wave.field()) < 1e-12);
        Ok(())
    }

    #[test]
    fn backward_evanescent_waves_stay_finite() -> std::result::Result<(), Box<dyn Error>> {
        // pixels smaller than λ/2 sample evanescent frequencies
        let grid = Grid::new(32, 32, 0.2e-6)?;
        let mut wave = SphericalWave::new(grid, 0.1, 16., 500e-9)?;
        let energy = wave.energy();
        wave.propagate(&AngularSpectrum::default(), -1e-3)?;
        assert!(wave.field().iter().all(|u| u.re.is_finite() && u.im.is_finite()));
        assert!(wave.energy() > 0. && wave.energy() <= energy * (1. + 1e-9));
        Ok(())
    }

    #[test]
    fn band_limited_identity() -> std::result::Result<(), Box<dyn Error>> {
        let mut wave = wave(32, 16., 0.1);
        let field = wave.field().clone();
        wave.propagate(&BandLimitedAngularSpectrum, 0.)?;
        assert!(max_diff(&field, wave.field()) < 1e-12);
        Ok(())
    }

    #[test]
    fn band_limited_energy() -> std::result::Result<(), Box<dyn Error>> {
        let mut wave = wave(64, 40., 0.1);
        let energy = wave.energy();
        wave.propagate(&PropagationMethod::BandLimited, 50e-3)?;
        let ratio = wave.energy() / energy;
        assert!((ratio - 1.).abs() < 1e-3, "energy ratio: {ratio}");
        assert_eq!(wave.distance(), 50e-3);
        Ok(())
    }

    #[test]
    fn band_limited_near_field() -> std::result::Result<(), Box<dyn Error>> {
        // a narrow beam that stays well inside the grid propagates identically
        let mut angular = wave(64, 16., 1.);
        let mut band_limited = angular.clone();
        angular.propagate(&AngularSpectrum::default(), 1e-3)?;
        band_limited.propagate(&BandLimitedAngularSpectrum, 1e-3)?;
        assert!(max_diff(angular.field(), band_limited.field()) < 1e-4);
        Ok(())
    }

    #[test]
    fn invalid_distance() {
        let mut wave = wave(16, 8., 0.1);
        let err = wave
            .propagate(&AngularSpectrum::default(), f64::NAN)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidConfiguration);
        assert_eq!(wave.distance(), 0.);
    }

    #[test]
    fn fresnel_is_unsupported() {
        let mut wave = wave(16, 8., 0.1);
        let err = wave
            .propagate(&PropagationMethod::Fresnel, 1e-3)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unsupported);
    }

    #[test]
    fn method_from_str() -> std::result::Result<(), Box<dyn Error>> {
        assert_eq!(
            "band_limited".parse::<PropagationMethod>()?,
            PropagationMethod::BandLimited
        );
        assert_eq!(PropagationMethod::default().to_string(), "angular_spectrum");
        Ok(())
    }
}
