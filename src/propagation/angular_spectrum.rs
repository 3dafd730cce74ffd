use super::{check, Propagator, Result};
use crate::{
    fourier::{fft2, ifft2},
    grid::Grid,
    wave::Wave,
};
use ndarray::{Array2, Zip};
use num_complex::Complex64;
use std::f64::consts::PI;

/// Angular spectrum propagator
///
/// The longitudinal frequency is `√(1-(λνx)²-(λνy)²)`; where it is imaginary the
/// evanescent components decay with `|z|` unless `clip_evanescent` removes them.
#[derive(Debug, Default, Clone, Copy)]
pub struct AngularSpectrum {
    clip_evanescent: bool,
}
impl AngularSpectrum {
    /// Zeroes the evanescent part of the spectrum
    pub fn clip_evanescent(self, clip_evanescent: bool) -> Self {
        Self { clip_evanescent }
    }
    /// Transfer function in FFT ordering
    pub fn transfer_function(&self, grid: &Grid, wavelength: f64, z: f64) -> Array2<Complex64> {
        let freq = grid.frequency();
        let k = 2. * PI / wavelength;
        let mut h = Array2::<Complex64>::zeros(grid.shape());
        Zip::from(&mut h)
            .and(&freq.nu_y)
            .and(&freq.nu_x)
            .for_each(|h, &nu_y, &nu_x| {
                let arg = 1. - (wavelength * nu_x).powi(2) - (wavelength * nu_y).powi(2);
                *h = if arg >= 0. {
                    Complex64::from_polar(1., k * z * arg.sqrt())
                } else if self.clip_evanescent {
                    Complex64::new(0., 0.)
                } else {
                    // evanescent waves decay away from the source plane in both directions
                    Complex64::new((-k * z.abs() * (-arg).sqrt()).exp(), 0.)
                };
            });
        h
    }
}
impl Propagator for AngularSpectrum {
    fn propagate<W: Wave + ?Sized>(&self, wave: &mut W, z: f64) -> Result<()> {
        check(wave, z)?;
        let h = self.transfer_function(wave.grid(), wave.wavelength(), z);
        let spectrum = fft2(wave.field()) * &h;
        *wave.field_mut() = ifft2(&spectrum);
        wave.advance(z);
        log::trace!("angular spectrum: propagated by {:.3}mm", z * 1e3);
        Ok(())
    }
}
