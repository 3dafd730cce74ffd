use super::{
    apply_volkov_scheme, central_difference, clip, BoundaryCondition, Result, Solver, TieError,
};
use crate::{
    fourier::{gradient_2d, ifft2, ilaplacian_2d, rfft2},
    grid::Grid,
    storage::Loader,
};
use ndarray::{Array2, Zip};
use num_complex::Complex64;
use std::{f64::consts::PI, path::Path};

/// Fourier-domain TIE solver
///
/// The phase is `∇⁻²∇·(I⁻¹∇∇⁻²(-k·∂I/∂z))`, the inverse Laplacian being regularized
/// by `ε/δ⁴` with `ε` the machine epsilon and `δ` the pixel size.
#[derive(Debug, Clone)]
pub struct FftSolver {
    intensities: [Array2<f64>; 2],
    dz: f64,
    wavelength: f64,
    pixel_size: f64,
    boundary_condition: BoundaryCondition,
    axial_derivative: Array2<f64>,
    kx: Array2<Complex64>,
    ky: Array2<Complex64>,
}
impl FftSolver {
    /// Creates a solver from the frames recorded at `-dz` and `+dz` [m]
    ///
    /// `wavelength` [m] is `None` for partially coherent illumination, which is not supported.
    pub fn new(
        frames: Vec<Array2<f64>>,
        dz: f64,
        wavelength: Option<f64>,
        pixel_size: f64,
        boundary_condition: BoundaryCondition,
    ) -> Result<Self> {
        let [first, second]: [Array2<f64>; 2] = frames
            .try_into()
            .map_err(|frames: Vec<Array2<f64>>| TieError::FrameCount(frames.len()))?;
        if first.dim() != second.dim() {
            return Err(TieError::ShapeMismatch(first.dim(), second.dim()));
        }
        if !(dz.is_finite() && dz > 0.) {
            return Err(TieError::Distance(dz));
        }
        if !(pixel_size.is_finite() && pixel_size > 0.) {
            return Err(TieError::PixelSize(pixel_size));
        }
        let wavelength = wavelength.ok_or(TieError::PartiallyCoherent)?;
        if !(wavelength.is_finite() && wavelength > 0.) {
            return Err(TieError::Wavelength(wavelength));
        }

        let intensities = [
            apply_volkov_scheme(&first, boundary_condition)?,
            apply_volkov_scheme(&second, boundary_condition)?,
        ];
        let axial_derivative = central_difference(&intensities[0], &intensities[1], dz);
        let (height, width) = intensities[0].dim();
        let freq = Grid::new(height, width, pixel_size)?.frequency();
        let coefficient = |nu: f64| Complex64::new(0., 2. * PI * nu);
        log::debug!(
            "TIE solver: {}x{} frames, dz={:.3}mm, {} boundary condition",
            height,
            width,
            dz * 1e3,
            boundary_condition
        );
        Ok(Self {
            kx: freq.nu_x.mapv(coefficient),
            ky: freq.nu_y.mapv(coefficient),
            intensities,
            dz,
            wavelength,
            pixel_size,
            boundary_condition,
            axial_derivative,
        })
    }
    /// Creates a solver from two frames read with a [Loader]
    pub fn from_paths<L: Loader + ?Sized, P: AsRef<Path>>(
        loader: &L,
        paths: &[P],
        dz: f64,
        wavelength: Option<f64>,
        pixel_size: f64,
        boundary_condition: BoundaryCondition,
    ) -> Result<Self> {
        if paths.len() != 2 {
            return Err(TieError::FrameCount(paths.len()));
        }
        let frames = loader.load_frames(paths)?;
        Self::new(frames, dz, wavelength, pixel_size, boundary_condition)
    }
    /// Reference (first) intensity frame, padded if a mirror boundary condition applies
    pub fn ref_intensity(&self) -> &Array2<f64> {
        &self.intensities[0]
    }
    pub fn axial_derivative(&self) -> &Array2<f64> {
        &self.axial_derivative
    }
    pub fn kx(&self) -> &Array2<Complex64> {
        &self.kx
    }
    pub fn ky(&self) -> &Array2<Complex64> {
        &self.ky
    }
    pub fn dz(&self) -> f64 {
        self.dz
    }
    pub fn wavelength(&self) -> f64 {
        self.wavelength
    }
    pub fn pixel_size(&self) -> f64 {
        self.pixel_size
    }
    pub fn boundary_condition(&self) -> BoundaryCondition {
        self.boundary_condition
    }
}
impl Solver for FftSolver {
    fn solve(&self, threshold: f64) -> Result<Array2<f64>> {
        if !(threshold > 0.) {
            return Err(TieError::Threshold(threshold));
        }
        let reference = self.ref_intensity();
        if reference.iter().all(|&i| i < threshold) {
            return Err(TieError::Underexposed(threshold));
        }
        let wave_number = 2. * PI / self.wavelength;
        let reg_param = f64::EPSILON / self.pixel_size.powi(4);
        let (kx, ky) = (&self.kx, &self.ky);

        let phase = self.axial_derivative.mapv(|x| -wave_number * x);
        let spectrum = ilaplacian_2d(&rfft2(&phase), kx, ky, reg_param);
        let (mut phase_x, mut phase_y) = gradient_2d(&spectrum, &spectrum, kx, ky);
        Zip::from(&mut phase_x)
            .and(&mut phase_y)
            .and(reference)
            .for_each(|x, y, &i| {
                if i < threshold {
                    *x = 0.;
                    *y = 0.;
                } else {
                    *x /= i;
                    *y /= i;
                }
            });
        let (phase_x, phase_y) = gradient_2d(&rfft2(&phase_x), &rfft2(&phase_y), kx, ky);
        let spectrum = ilaplacian_2d(&rfft2(&(phase_x + phase_y)), kx, ky, reg_param);
        let phase = ifft2(&spectrum).mapv(|x| x.re);
        Ok(clip(&phase, self.boundary_condition))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::error::Error;

    fn flat(shape: (usize, usize)) -> Vec<Array2<f64>> {
        vec![Array2::from_elem(shape, 0.5), Array2::from_elem(shape, 0.5)]
    }

    #[test]
    fn frame_count() {
        let frames = vec![Array2::from_elem((4, 4), 1.)];
        let err = FftSolver::new(frames, 1e-3, Some(500e-9), 1e-6, BoundaryCondition::None)
            .unwrap_err();
        assert!(matches!(err, TieError::FrameCount(1)));
        assert_eq!(err.kind(), ErrorKind::InvalidConfiguration);
    }

    #[test]
    fn invalid_configuration() {
        let frames = vec![Array2::zeros((4, 4)), Array2::zeros((4, 5))];
        assert!(matches!(
            FftSolver::new(frames, 1e-3, Some(500e-9), 1e-6, BoundaryCondition::None),
            Err(TieError::ShapeMismatch(..))
        ));
        assert!(matches!(
            FftSolver::new(flat((4, 4)), 0., Some(500e-9), 1e-6, BoundaryCondition::None),
            Err(TieError::Distance(_))
        ));
        assert!(matches!(
            FftSolver::new(flat((4, 4)), 1e-3, Some(500e-9), -1., BoundaryCondition::None),
            Err(TieError::PixelSize(_))
        ));
    }

    #[test]
    fn unsupported() {
        let err = FftSolver::new(flat((4, 4)), 1e-3, None, 1e-6, BoundaryCondition::None)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unsupported);
        let bc = BoundaryCondition::Periodic;
        let err = FftSolver::new(flat((4, 4)), 1e-3, Some(500e-9), 1e-6, bc).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unsupported);
    }

    #[test]
    fn threshold_rejection() -> std::result::Result<(), Box<dyn Error>> {
        let mut frames = flat((8, 8));
        frames[0][[3, 3]] = 0.;
        let solver = FftSolver::new(frames, 1e-3, Some(500e-9), 1e-6, BoundaryCondition::None)?;
        for threshold in [0., -1., f64::NAN] {
            let err = solver.solve(threshold).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::NumericDegeneracy);
        }
        assert!(matches!(solver.solve(0.9), Err(TieError::Underexposed(_))));
        Ok(())
    }

    #[test]
    fn zero_derivative() -> std::result::Result<(), Box<dyn Error>> {
        let bc = BoundaryCondition::Dirichlet;
        let solver = FftSolver::new(flat((8, 6)), 1e-3, Some(500e-9), 1e-6, bc)?;
        assert_eq!(solver.ref_intensity().dim(), (16, 12));
        let phase = solver.solve((-2f64).exp())?;
        assert_eq!(phase.dim(), (8, 6));
        assert!(phase.iter().all(|&x| x.abs() < 1e-12));
        Ok(())
    }

    #[test]
    fn repeatable() -> std::result::Result<(), Box<dyn Error>> {
        let mut frames = flat((8, 8));
        frames[0][[2, 2]] = 0.01;
        frames[1][[4, 4]] = 0.7;
        let bc = BoundaryCondition::Neumann;
        let solver = FftSolver::new(frames, 1e-3, Some(500e-9), 1e-6, bc)?;
        let reference = solver.ref_intensity().clone();
        let first = solver.solve(0.1)?;
        let second = solver.solve(0.1)?;
        assert_eq!(first, second);
        assert_eq!(solver.ref_intensity(), &reference);
        Ok(())
    }

    #[test]
    fn sinusoidal_phase() -> std::result::Result<(), Box<dyn Error>> {
        // uniform intensity: ∂I/∂z = -∇²φ/k
        let (height, width) = (16, 32);
        let (pixel_size, wavelength, dz) = (1e-6, 500e-9, 1e-9);
        let amplitude = 0.5;
        let nu = 2. / (width as f64 * pixel_size);
        let wave_number = 2. * PI / wavelength;
        let phase = Array2::from_shape_fn((height, width), |(_, j)| {
            amplitude * (2. * PI * 2. * j as f64 / width as f64).cos()
        });
        let didz = phase.mapv(|p| (2. * PI * nu).powi(2) * p / wave_number);
        let frames = vec![didz.mapv(|d| 1. - dz * d), didz.mapv(|d| 1. + dz * d)];
        let bc = BoundaryCondition::None;
        let solver = FftSolver::new(frames, dz, Some(wavelength), pixel_size, bc)?;
        let retrieved = solver.solve(0.1)?;
        let err = retrieved
            .iter()
            .zip(phase.iter())
            .map(|(r, p)| (r - p).abs())
            .fold(0f64, f64::max);
        assert!(err < 1e-4 * amplitude, "max error: {err}");
        Ok(())
    }
}
