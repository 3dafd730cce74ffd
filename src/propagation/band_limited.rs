use super::{check, Propagator, Result};
use crate::{
    fourier::{fft2, ifft2},
    grid::{FrequencyGrid, Grid},
    wave::Wave,
};
use ndarray::{s, Array2, Zip};
use num_complex::Complex64;
use std::f64::consts::PI;

/// Band-limited angular spectrum propagator
///
/// The field is zero-padded to twice its size, the transfer function is restricted to
/// `|νx| < 1/(λ·√((2·Δνx·z)²+1))` (same along y) and the result is cropped back.
#[derive(Debug, Default, Clone, Copy)]
pub struct BandLimitedAngularSpectrum;

impl BandLimitedAngularSpectrum {
    /// Transfer function over the padded `grid`, in FFT ordering
    pub fn transfer_function(grid: &Grid, wavelength: f64, z: f64) -> Array2<Complex64> {
        let freq = FrequencyGrid::natural(&grid.cartesian());
        let px = grid.pixel_size();
        let inv_wavelength2 = wavelength.powi(-2);
        let limit = |n: usize| {
            let dnu = 1. / (n as f64 * px);
            1. / (((2. * dnu * z).powi(2) + 1.).sqrt() * wavelength)
        };
        let (nu_y_limit, nu_x_limit) = (limit(grid.height()), limit(grid.width()));
        let mut h = Array2::<Complex64>::zeros(grid.shape());
        Zip::from(&mut h)
            .and(&freq.nu_y)
            .and(&freq.nu_x)
            .for_each(|h, &nu_y, &nu_x| {
                if nu_x.abs() < nu_x_limit && nu_y.abs() < nu_y_limit {
                    let nu2 = nu_x * nu_x + nu_y * nu_y;
                    let nu_z = if nu2 > inv_wavelength2 {
                        0.
                    } else {
                        (inv_wavelength2 - nu2).sqrt()
                    };
                    *h = Complex64::from_polar(1., 2. * PI * nu_z * z);
                }
            });
        h
    }
}
impl Propagator for BandLimitedAngularSpectrum {
    fn propagate<W: Wave + ?Sized>(&self, wave: &mut W, z: f64) -> Result<()> {
        check(wave, z)?;
        let grid = *wave.grid();
        let (height, width) = grid.shape();
        let padded_grid = Grid::new(2 * height, 2 * width, grid.pixel_size())?;
        let (top, left) = (height / 2, width / 2);

        let mut padded = Array2::<Complex64>::zeros(padded_grid.shape());
        padded
            .slice_mut(s![top..top + height, left..left + width])
            .assign(wave.field());
        let h = Self::transfer_function(&padded_grid, wave.wavelength(), z);
        let propagated = ifft2(&(fft2(&padded) * &h));
        *wave.field_mut() = propagated
            .slice(s![top..top + height, left..left + width])
            .to_owned();
        wave.advance(z);
        log::trace!("band-limited angular spectrum: propagated by {:.3}mm", z * 1e3);
        Ok(())
    }
}
