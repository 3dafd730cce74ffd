/*!
# Fourier transforms

2-D FFT built on [rustfft] row and column passes, numpy-style spectrum shifts and the
pseudo-differential operators (gradient, regularized inverse Laplacian) used by the TIE
solver.

The forward transform is unnormalized and the inverse transform is scaled by `1/(h·w)`,
so that `ifft2(fft2(u)) == u` and a unit-modulus transfer function preserves `Σ|u|²`.
*/

use ndarray::Array2;
use num_complex::Complex64;
use rustfft::{Fft, FftDirection, FftPlanner};
use std::{cell::RefCell, sync::Arc};

thread_local! {
    // the planner keeps the plans of every (length, direction) it has seen
    static PLANNER: RefCell<FftPlanner<f64>> = RefCell::new(FftPlanner::new());
}

fn plan(len: usize, direction: FftDirection) -> Arc<dyn Fft<f64>> {
    PLANNER.with(|planner| planner.borrow_mut().plan_fft(len, direction))
}

fn transform(array: &Array2<Complex64>, direction: FftDirection) -> Array2<Complex64> {
    let (height, width) = array.dim();
    if height == 0 || width == 0 {
        return array.clone();
    }
    // rows are contiguous in logical order, rustfft processes them chunk by chunk
    let mut rows: Vec<Complex64> = array.iter().copied().collect();
    plan(width, direction).process(&mut rows);
    let rows = &rows;
    let mut columns: Vec<Complex64> = (0..width)
        .flat_map(|j| (0..height).map(move |i| rows[i * width + j]))
        .collect();
    plan(height, direction).process(&mut columns);
    Array2::from_shape_fn((height, width), |(i, j)| columns[j * height + i])
}

/// Forward 2-D discrete Fourier transform
pub fn fft2(array: &Array2<Complex64>) -> Array2<Complex64> {
    transform(array, FftDirection::Forward)
}
/// Inverse 2-D discrete Fourier transform, normalized by the number of samples
pub fn ifft2(spectrum: &Array2<Complex64>) -> Array2<Complex64> {
    let (height, width) = spectrum.dim();
    let scale = 1. / (height * width).max(1) as f64;
    let mut array = transform(spectrum, FftDirection::Inverse);
    array.mapv_inplace(|x| x * scale);
    array
}
/// Forward transform of a real array
pub fn rfft2(array: &Array2<f64>) -> Array2<Complex64> {
    fft2(&array.mapv(|x| Complex64::new(x, 0.)))
}

/// Cyclic roll by `(rows, columns)` samples, `out[i] = in[i - shift]`
pub fn roll<T: Clone>(array: &Array2<T>, rows: isize, columns: isize) -> Array2<T> {
    let (height, width) = array.dim();
    let (h, w) = (height as isize, width as isize);
    Array2::from_shape_fn((height, width), |(i, j)| {
        let src_i = (i as isize - rows).rem_euclid(h.max(1)) as usize;
        let src_j = (j as isize - columns).rem_euclid(w.max(1)) as usize;
        array[[src_i, src_j]].clone()
    })
}
/// Moves the zero-frequency sample to the centre (numpy `fftshift` over both axes)
pub fn fftshift<T: Clone>(array: &Array2<T>) -> Array2<T> {
    let (height, width) = array.dim();
    roll(array, (height / 2) as isize, (width / 2) as isize)
}
/// Inverse of [fftshift] (numpy `ifftshift` over both axes)
pub fn ifftshift<T: Clone>(array: &Array2<T>) -> Array2<T> {
    let (height, width) = array.dim();
    roll(array, -((height / 2) as isize), -((width / 2) as isize))
}

/// Spectral gradient: returns `(Re F⁻¹{fx·kx}, Re F⁻¹{fy·ky})`
///
/// `fx` and `fy` are spectra, `kx = i·2π·νx` and `ky = i·2π·νy` in FFT ordering.
/// (D. Paganin, Coherent X-Ray Imaging, 2006, pp. 299-300)
pub fn gradient_2d(
    fx: &Array2<Complex64>,
    fy: &Array2<Complex64>,
    kx: &Array2<Complex64>,
    ky: &Array2<Complex64>,
) -> (Array2<f64>, Array2<f64>) {
    (
        ifft2(&(fx * kx)).mapv(|x| x.re),
        ifft2(&(fy * ky)).mapv(|x| x.re),
    )
}

/// Regularized spectral inverse Laplacian `F·(kx²+ky²)/(ε + (kx²+ky²)²)`
///
/// Takes and returns a spectrum, `reg_param` keeps the DC sample finite.
pub fn ilaplacian_2d(
    spectrum: &Array2<Complex64>,
    kx: &Array2<Complex64>,
    ky: &Array2<Complex64>,
    reg_param: f64,
) -> Array2<Complex64> {
    let mut out = spectrum.clone();
    ndarray::Zip::from(&mut out)
        .and(kx)
        .and(ky)
        .for_each(|f, &kx, &ky| {
            let k2 = kx * kx + ky * ky;
            *f = *f * k2 / (k2 * k2 + reg_param);
        });
    out
}
