//! Wavefront radius of curvature
//!
//! The radius is derived from the sagitta of the unwrapped phase over the aperture:
//! `R = s/2 + l²/(8·s)` with `s` the sagitta and `l` the aperture diameter.

use crate::{
    aperture::{Aperture, ApertureError},
    error::ErrorKind,
    units::{m2mm, rad2mm},
    unwrap::{PhaseUnwrapper, QualityGuided},
    wave::{Wave, WaveError},
};
use ndarray::Array2;
use std::fmt::Display;

#[derive(thiserror::Error, Debug)]
pub enum WavefrontError {
    #[error("failed to refit the aperture")]
    Aperture(#[from] ApertureError),
    #[error("failed to mask the wave phase")]
    Wave(#[from] WaveError),
    #[error("sagitta must be non-zero and finite, found {0}mm")]
    Sagitta(f64),
    #[error("radius of curvature is not finite ({0})")]
    Radius(f64),
}
impl WavefrontError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            WavefrontError::Aperture(e) => e.kind(),
            WavefrontError::Wave(e) => e.kind(),
            WavefrontError::Sagitta(_) | WavefrontError::Radius(_) => {
                ErrorKind::NumericDegeneracy
            }
        }
    }
}
type Result<T> = std::result::Result<T, WavefrontError>;

/// Sagitta [mm] of an unwrapped phase [rad] at the wavelength [m]
pub fn sagitta(unwrapped_phase: &Array2<f64>, wavelength: f64) -> f64 {
    let (min, max) = unwrapped_phase
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), &x| {
            (min.min(x), max.max(x))
        });
    if min > max {
        return 0.;
    }
    rad2mm(max.abs() + min.abs(), wavelength)
}

/// Radius of the circle through an arc of sagitta `s` over a chord `l`
pub fn radius(sagitta: f64, chord: f64) -> Result<f64> {
    if sagitta == 0. || !sagitta.is_finite() {
        return Err(WavefrontError::Sagitta(sagitta));
    }
    let radius = sagitta / 2. + chord * chord / (8. * sagitta);
    if radius.is_finite() {
        Ok(radius)
    } else {
        Err(WavefrontError::Radius(radius))
    }
}

/// Radius of curvature estimate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WavefrontRadius {
    /// radius of curvature [mm]
    pub radius: f64,
    /// sagitta [mm]
    pub sagitta: f64,
    /// aperture diameter [mm]
    pub aperture_diameter: f64,
}
impl Display for WavefrontRadius {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "R={:.3}mm (sagitta: {:.3e}mm, aperture: {:.3}mm)",
            self.radius, self.sagitta, self.aperture_diameter
        )
    }
}

/// Unwraps the wave phase within a refitted aperture and converts the sagitta into a radius
#[derive(Debug, Default, Clone)]
pub struct WavefrontRadiusEstimator<U = QualityGuided> {
    unwrapper: U,
}
impl<U: PhaseUnwrapper> WavefrontRadiusEstimator<U> {
    pub fn new(unwrapper: U) -> Self {
        Self { unwrapper }
    }
    /// Refits `aperture` to the wave and returns the unwrapped phase within it
    pub fn unwrap<W: Wave + ?Sized>(
        &self,
        wave: &W,
        aperture: &mut Aperture,
    ) -> Result<Array2<f64>> {
        aperture.modify(wave, wave.distance())?;
        let wrapped = wave.masked_phase(aperture)?;
        Ok(self.unwrapper.unwrap(&wrapped))
    }
    /// Runs the unwrapping, sagitta and radius steps
    pub fn estimate<W: Wave + ?Sized>(
        &self,
        wave: &W,
        aperture: &mut Aperture,
    ) -> Result<WavefrontRadius> {
        let unwrapped = self.unwrap(wave, aperture)?;
        let sagitta = sagitta(&unwrapped, wave.wavelength());
        let aperture_diameter = m2mm(aperture.diameter_m());
        let radius = radius(sagitta, aperture_diameter)?;
        let estimate = WavefrontRadius {
            radius,
            sagitta,
            aperture_diameter,
        };
        log::info!("z={:.3}mm: {}", m2mm(wave.distance()), estimate);
        Ok(estimate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        aperture::widest_diameter,
        grid::Grid,
        propagation::AngularSpectrum,
        wave::SphericalWave,
    };
    use std::error::Error;

    #[test]
    fn radius_formula() -> std::result::Result<(), Box<dyn Error>> {
        assert_eq!(radius(1.0, 10.0)?, 13.0);
        Ok(())
    }

    #[test]
    fn zero_sagitta() {
        let err = radius(0., 10.).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NumericDegeneracy);
        assert!(radius(f64::NAN, 10.).is_err());
    }

    #[test]
    fn sagitta_of_a_wave() {
        let wavelength = 500e-9;
        let mut phase = Array2::zeros((4, 4));
        phase[[1, 1]] = -3. * std::f64::consts::PI;
        phase[[2, 2]] = std::f64::consts::PI;
        // two waves peak to valley
        assert!((sagitta(&phase, wavelength) - 1e-3).abs() < 1e-15);
    }

    #[test]
    fn end_to_end() -> std::result::Result<(), Box<dyn Error>> {
        let grid = Grid::new(512, 512, 5.04e-6)?;
        let mut wave = SphericalWave::new(grid, 100e-3, 247., 659.6e-9)?;
        let mut aperture = Aperture::new(grid.polar(), 2. * 247.)?;
        wave.apply_aperture(&aperture)?;
        let energy = wave.energy();

        wave.propagate(&AngularSpectrum::default(), 50e-3)?;
        assert!((wave.energy() - energy).abs() / energy < 1e-2);

        aperture.set_diameter(widest_diameter(&wave.intensity(), (-2f64).exp()) as f64)?;
        let estimate = WavefrontRadiusEstimator::<QualityGuided>::default()
            .estimate(&wave, &mut aperture)?;
        // the wave converges to the focus 50mm further
        let expected = 50.;
        assert!(
            (estimate.radius - expected).abs() / expected < 0.02,
            "R={}mm",
            estimate.radius
        );
        assert!(estimate.aperture_diameter > 0.);
        Ok(())
    }
}
