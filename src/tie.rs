/*!
# Transport of intensity

Phase retrieval from two intensity frames recorded at `-dz` and `+dz` about a reference
plane, solved in the Fourier domain (D. Paganin & K. A. Nugent, Phys. Rev. Lett. 80, 1998).

The frames may be mirror-padded ([apply_volkov_scheme]) before solving to suppress the
periodic boundary artifacts of the FFT.
*/

use crate::{error::ErrorKind, grid::GridError, storage::StorageError};
use ndarray::Array2;

mod boundary;
mod fft_solver;
pub use boundary::{apply_volkov_scheme, clip, BoundaryCondition};
pub use fft_solver::FftSolver;

#[derive(thiserror::Error, Debug)]
pub enum TieError {
    #[error("expected 2 intensity frames, found {0}")]
    FrameCount(usize),
    #[error("intensity frames have different shapes: {0:?} and {1:?}")]
    ShapeMismatch((usize, usize), (usize, usize)),
    #[error("frame separation must be positive and finite, found {0}")]
    Distance(f64),
    #[error("pixel size must be positive and finite, found {0}")]
    PixelSize(f64),
    #[error("wavelength must be positive and finite, found {0}")]
    Wavelength(f64),
    #[error("partially coherent illumination (no wavelength) is not supported")]
    PartiallyCoherent,
    #[error("{0} boundary condition is not supported")]
    Unsupported(BoundaryCondition),
    #[error("intensity threshold must be positive, found {0}")]
    Threshold(f64),
    #[error("every reference intensity sample is below the threshold {0}")]
    Underexposed(f64),
    #[error("failed to load the intensity frames")]
    Storage(#[from] StorageError),
    #[error("failed to build the frequency grid")]
    Grid(#[from] GridError),
}
impl TieError {
    pub fn kind(&self) -> ErrorKind {
        use TieError::*;
        match self {
            FrameCount(_) | ShapeMismatch(..) | Distance(_) | PixelSize(_) | Wavelength(_) => {
                ErrorKind::InvalidConfiguration
            }
            PartiallyCoherent | Unsupported(_) => ErrorKind::Unsupported,
            Threshold(_) | Underexposed(_) => ErrorKind::NumericDegeneracy,
            Storage(e) => e.kind(),
            Grid(e) => e.kind(),
        }
    }
}
type Result<T> = std::result::Result<T, TieError>;

/// Axial intensity derivative `(I₂ - I₁)/(2·dz)` of frames recorded at `∓dz`
pub fn central_difference(first: &Array2<f64>, second: &Array2<f64>, dz: f64) -> Array2<f64> {
    (second - first) / (2. * dz)
}

/// TIE solver
pub trait Solver {
    /// Returns the retrieved phase [rad], reference intensities below `threshold` are ignored
    fn solve(&self, threshold: f64) -> Result<Array2<f64>>;
}
