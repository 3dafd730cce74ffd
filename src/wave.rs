//! Coherent scalar waves
//!
//! A [Wave] owns its complex field, phase and intensity are projections of the field
//! and are recomputed on every call.

use crate::{
    aperture::{Aperture, PhaseSource},
    error::ErrorKind,
    grid::{CartesianGrid, Grid},
    propagation::{PropagationError, Propagator},
    units::px2m,
};
use ndarray::Array2;
use num_complex::Complex64;
use std::f64::consts::PI;

#[derive(thiserror::Error, Debug)]
pub enum WaveError {
    #[error("wavelength must be positive and finite, found {0}")]
    Wavelength(f64),
    #[error("focal length must be finite, found {0}")]
    FocalLength(f64),
    #[error("gaussian width parameter must be positive and finite, found {0}px")]
    GaussianWidth(f64),
    #[error("mask shape {0:?} does not match the field shape {1:?}")]
    ShapeMismatch((usize, usize), (usize, usize)),
}
impl WaveError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::InvalidConfiguration
    }
}
type Result<T> = std::result::Result<T, WaveError>;

/// Complex field sampled on a [Grid]
pub trait Wave: PhaseSource {
    fn field(&self) -> &Array2<Complex64>;
    fn field_mut(&mut self) -> &mut Array2<Complex64>;
    fn grid(&self) -> &Grid;
    /// Wavelength [m]
    fn wavelength(&self) -> f64;
    /// Width of the intensity envelope [px]
    fn gaussian_width_param(&self) -> f64;
    /// Propagation distance from the origin [m]
    fn distance(&self) -> f64;
    /// Adds `z` [m] to the propagation distance
    fn advance(&mut self, z: f64);

    /// Wave number [rad/m]
    fn wave_number(&self) -> f64 {
        2. * PI / self.wavelength()
    }
    /// Wrapped phase `arg(u)`
    fn phase(&self) -> Array2<f64> {
        self.field().mapv(|u| u.arg())
    }
    /// Intensity `|u|²`
    fn intensity(&self) -> Array2<f64> {
        self.field().mapv(|u| u.norm_sqr())
    }
    /// Total intensity `Σ|u|²`
    fn energy(&self) -> f64 {
        self.field().iter().map(|u| u.norm_sqr()).sum()
    }
    /// Wrapped phase multiplied by the aperture mask
    fn masked_phase(&self, aperture: &Aperture) -> Result<Array2<f64>> {
        let mask = aperture.mask();
        if mask.dim() != self.field().dim() {
            return Err(WaveError::ShapeMismatch(mask.dim(), self.field().dim()));
        }
        Ok(self.phase() * mask)
    }
    /// Multiplies the field by the aperture mask
    fn apply_aperture(&mut self, aperture: &Aperture) -> Result<()> {
        let mask = aperture.mask();
        if mask.dim() != self.field().dim() {
            return Err(WaveError::ShapeMismatch(mask.dim(), self.field().dim()));
        }
        self.field_mut().zip_mut_with(mask, |u, &m| *u *= m);
        Ok(())
    }
    /// Propagates the wave in place by `z` [m]
    fn propagate<P: Propagator>(
        &mut self,
        propagator: &P,
        z: f64,
    ) -> std::result::Result<(), PropagationError> {
        propagator.propagate(self, z)
    }
}

/// Converging spherical wave with a Gaussian intensity envelope
#[derive(Debug, Clone)]
pub struct SphericalWave {
    grid: Grid,
    field: Array2<Complex64>,
    wavelength: f64,
    focal_len: f64,
    gaussian_width_param: f64,
    distance: f64,
}
impl SphericalWave {
    /// Creates the wave at `z=0`
    ///
    /// The intensity is `exp(-(x²+y²)/(2w²))` with `w` a quarter of `gaussian_width_param`
    /// and the phase is `-k·√(x²+y²+f²)`.
    pub fn new(
        grid: Grid,
        focal_len: f64,
        gaussian_width_param: f64,
        wavelength: f64,
    ) -> Result<Self> {
        if !(wavelength.is_finite() && wavelength > 0.) {
            return Err(WaveError::Wavelength(wavelength));
        }
        if !focal_len.is_finite() {
            return Err(WaveError::FocalLength(focal_len));
        }
        if !(gaussian_width_param.is_finite() && gaussian_width_param > 0.) {
            return Err(WaveError::GaussianWidth(gaussian_width_param));
        }
        let CartesianGrid { y, x, .. } = grid.cartesian();
        let w = px2m(gaussian_width_param, grid.pixel_size()) / 4.;
        let two_w2 = 2. * w * w;
        let k = 2. * PI / wavelength;
        let f2 = focal_len * focal_len;
        let mut field = Array2::<Complex64>::zeros(grid.shape());
        ndarray::Zip::from(&mut field)
            .and(&y)
            .and(&x)
            .for_each(|u, &y, &x| {
                let r2 = x * x + y * y;
                let amplitude = (-r2 / two_w2).exp().sqrt();
                *u = Complex64::from_polar(amplitude, -k * (r2 + f2).sqrt());
            });
        log::debug!(
            "spherical wave: {}x{} grid, f={:.1}mm, λ={:.1}nm",
            grid.height(),
            grid.width(),
            focal_len * 1e3,
            wavelength * 1e9
        );
        Ok(Self {
            grid,
            field,
            wavelength,
            focal_len,
            gaussian_width_param,
            distance: 0.,
        })
    }
}
impl PhaseSource for SphericalWave {
    fn wrapped_phase(&self) -> Array2<f64> {
        self.phase()
    }
    fn focal_len(&self) -> f64 {
        self.focal_len
    }
}
impl Wave for SphericalWave {
    fn field(&self) -> &Array2<Complex64> {
        &self.field
    }
    fn field_mut(&mut self) -> &mut Array2<Complex64> {
        &mut self.field
    }
    fn grid(&self) -> &Grid {
        &self.grid
    }
    fn wavelength(&self) -> f64 {
        self.wavelength
    }
    fn gaussian_width_param(&self) -> f64 {
        self.gaussian_width_param
    }
    fn distance(&self) -> f64 {
        self.distance
    }
    fn advance(&mut self, z: f64) {
        self.distance += z;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::unwrap::wrap;
    use std::error::Error;

    #[test]
    fn initial_field() -> std::result::Result<(), Box<dyn Error>> {
        let grid = Grid::new(64, 64, 5.04e-6)?;
        let wave = SphericalWave::new(grid, 100e-3, 32., 659.6e-9)?;
        assert_eq!(wave.distance(), 0.);
        let intensity = wave.intensity();
        assert!((intensity[[32, 32]] - 1.).abs() < 1e-12);
        assert!(intensity[[0, 32]] < intensity[[16, 32]]);
        let expected = wrap(-wave.wave_number() * 100e-3);
        assert!((wave.phase()[[32, 32]] - expected).abs() < 1e-6);
        Ok(())
    }

    #[test]
    fn envelope_width() -> std::result::Result<(), Box<dyn Error>> {
        // the intensity drops to e⁻² a quarter of the width away from the center
        let grid = Grid::new(128, 128, 1e-6)?;
        let wave = SphericalWave::new(grid, 0.1, 80., 500e-9)?;
        let intensity = wave.intensity();
        assert!((intensity[[64, 64 + 40]] - (-2f64).exp()).abs() < 1e-12);
        Ok(())
    }

    #[test]
    fn invalid_parameters() -> std::result::Result<(), Box<dyn Error>> {
        let grid = Grid::new(8, 8, 1e-6)?;
        assert!(SphericalWave::new(grid, 0.1, 4., 0.).is_err());
        assert!(SphericalWave::new(grid, f64::INFINITY, 4., 500e-9).is_err());
        assert!(SphericalWave::new(grid, 0.1, -1., 500e-9).is_err());
        Ok(())
    }

    #[test]
    fn aperture_cuts_the_field() -> std::result::Result<(), Box<dyn Error>> {
        let grid = Grid::new(32, 32, 1e-6)?;
        let mut wave = SphericalWave::new(grid, 0.1, 32., 500e-9)?;
        let aperture = Aperture::new(grid.polar(), 10.)?;
        wave.apply_aperture(&aperture)?;
        assert_eq!(wave.intensity()[[0, 0]], 0.);
        assert!(wave.intensity()[[16, 16]] > 0.);
        let other = Aperture::new(Grid::new(16, 16, 1e-6)?.polar(), 10.)?;
        assert!(wave.apply_aperture(&other).is_err());
        Ok(())
    }
}
