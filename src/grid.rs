//! Sampling grids
//!
//! A [Grid] is the `height×width×pixel_size` sampling domain, the coordinate arrays are
//! derived from it on demand so they always agree with its dimensions.

use crate::{error::ErrorKind, fourier};
use ndarray::Array2;

#[derive(thiserror::Error, Debug)]
pub enum GridError {
    #[error("grid dimensions must be positive, found {0}x{1}")]
    Dimensions(usize, usize),
    #[error("pixel size must be positive and finite, found {0}")]
    PixelSize(f64),
}
impl GridError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::InvalidConfiguration
    }
}
type Result<T> = std::result::Result<T, GridError>;

/// Centered sampling domain
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Grid {
    height: usize,
    width: usize,
    pixel_size: f64,
}
impl Grid {
    /// Creates a `height×width` grid with a pixel size in meters
    pub fn new(height: usize, width: usize, pixel_size: f64) -> Result<Self> {
        if height == 0 || width == 0 {
            return Err(GridError::Dimensions(height, width));
        }
        if !(pixel_size.is_finite() && pixel_size > 0.) {
            return Err(GridError::PixelSize(pixel_size));
        }
        Ok(Self {
            height,
            width,
            pixel_size,
        })
    }
    /// Returns a copy of the grid with a new pixel size [m]
    pub fn with_pixel_size(self, pixel_size: f64) -> Result<Self> {
        Self::new(self.height, self.width, pixel_size)
    }
    pub fn height(&self) -> usize {
        self.height
    }
    pub fn width(&self) -> usize {
        self.width
    }
    /// Pixel size [m]
    pub fn pixel_size(&self) -> f64 {
        self.pixel_size
    }
    pub fn shape(&self) -> (usize, usize) {
        (self.height, self.width)
    }
    pub fn cartesian(&self) -> CartesianGrid {
        CartesianGrid::new(*self)
    }
    pub fn polar(&self) -> PolarGrid {
        PolarGrid::new(&self.cartesian())
    }
    pub fn frequency(&self) -> FrequencyGrid {
        FrequencyGrid::new(&self.cartesian())
    }
}

/// Cartesian coordinates [m], `y` along rows and `x` along columns
///
/// Sample `(i,j)` is at `((i - h/2)·δ, (j - w/2)·δ)` with `h/2` and `w/2` real valued.
#[derive(Debug, Clone)]
pub struct CartesianGrid {
    pub y: Array2<f64>,
    pub x: Array2<f64>,
    grid: Grid,
}
impl CartesianGrid {
    pub fn new(grid: Grid) -> Self {
        let (height, width) = grid.shape();
        let (h2, w2) = (height as f64 / 2., width as f64 / 2.);
        let px = grid.pixel_size();
        Self {
            y: Array2::from_shape_fn((height, width), |(i, _)| (i as f64 - h2) * px),
            x: Array2::from_shape_fn((height, width), |(_, j)| (j as f64 - w2) * px),
            grid,
        }
    }
    pub fn grid(&self) -> Grid {
        self.grid
    }
}

/// Radial distance [m] from the grid center
#[derive(Debug, Clone)]
pub struct PolarGrid {
    pub r: Array2<f64>,
    grid: Grid,
}
impl PolarGrid {
    pub fn new(cartesian: &CartesianGrid) -> Self {
        let mut r = cartesian.y.mapv(|y| y * y);
        r.zip_mut_with(&cartesian.x, |r, x| *r = (*r + x * x).sqrt());
        Self {
            r,
            grid: cartesian.grid(),
        }
    }
    pub fn grid(&self) -> Grid {
        self.grid
    }
}

/// Spatial frequencies [1/m]
#[derive(Debug, Clone)]
pub struct FrequencyGrid {
    pub nu_y: Array2<f64>,
    pub nu_x: Array2<f64>,
    grid: Grid,
}
impl FrequencyGrid {
    fn centered(cartesian: &CartesianGrid) -> (Array2<f64>, Array2<f64>) {
        let grid = cartesian.grid();
        let px = grid.pixel_size();
        let (height, width) = grid.shape();
        let y_span = height as f64 * px * px;
        let x_span = width as f64 * px * px;
        (
            cartesian.y.mapv(|y| y / y_span),
            cartesian.x.mapv(|x| x / x_span),
        )
    }
    /// Frequencies in FFT output ordering, obtained with `fftshift`
    pub fn new(cartesian: &CartesianGrid) -> Self {
        let (nu_y, nu_x) = Self::centered(cartesian);
        Self {
            nu_y: fourier::fftshift(&nu_y),
            nu_x: fourier::fftshift(&nu_x),
            grid: cartesian.grid(),
        }
    }
    /// Frequencies in FFT output ordering, obtained with `ifftshift`
    ///
    /// Identical to [FrequencyGrid::new] for even sizes.
    pub fn natural(cartesian: &CartesianGrid) -> Self {
        let (nu_y, nu_x) = Self::centered(cartesian);
        Self {
            nu_y: fourier::ifftshift(&nu_y),
            nu_x: fourier::ifftshift(&nu_x),
            grid: cartesian.grid(),
        }
    }
    pub fn grid(&self) -> Grid {
        self.grid
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn invalid_grid() {
        assert!(Grid::new(0, 10, 1e-6).is_err());
        assert!(Grid::new(10, 10, 0.).is_err());
        assert!(Grid::new(10, 10, f64::NAN).is_err());
        assert_eq!(
            Grid::new(10, 0, 1e-6).unwrap_err().kind(),
            ErrorKind::InvalidConfiguration
        );
    }

    #[test]
    fn antisymmetric_even() -> std::result::Result<(), Box<dyn Error>> {
        let grid = Grid::new(8, 6, 2e-6)?;
        let CartesianGrid { y, x, .. } = grid.cartesian();
        assert_eq!(y[[4, 0]], 0.);
        assert_eq!(x[[0, 3]], 0.);
        for i in 1..8 {
            assert!((y[[i, 2]] + y[[8 - i, 2]]).abs() < 1e-18);
        }
        for j in 1..6 {
            assert!((x[[5, j]] + x[[5, 6 - j]]).abs() < 1e-18);
        }
        assert!((y[[0, 0]] + 8e-6).abs() < 1e-18);
        Ok(())
    }

    #[test]
    fn odd_size_follows_mgrid() -> std::result::Result<(), Box<dyn Error>> {
        let grid = Grid::new(5, 5, 1.)?;
        let cartesian = grid.cartesian();
        let row: Vec<f64> = cartesian.x.row(0).to_vec();
        assert_eq!(row, vec![-2.5, -1.5, -0.5, 0.5, 1.5]);
        Ok(())
    }

    #[test]
    fn polar_radius() -> std::result::Result<(), Box<dyn Error>> {
        let grid = Grid::new(4, 4, 1.)?;
        let polar = grid.polar();
        assert_eq!(polar.r[[2, 2]], 0.);
        assert!((polar.r[[0, 0]] - 8f64.sqrt()).abs() < 1e-12);
        assert_eq!(polar.grid(), grid);
        Ok(())
    }

    #[test]
    fn frequencies() -> std::result::Result<(), Box<dyn Error>> {
        let grid = Grid::new(4, 8, 0.5)?;
        let freq = grid.frequency();
        assert_eq!(freq.nu_x[[0, 0]], 0.);
        assert_eq!(freq.nu_y[[0, 0]], 0.);
        // Δν = 1/(w·δ)
        assert!((freq.nu_x[[0, 1]] - 0.25).abs() < 1e-12);
        assert!((freq.nu_x[[0, 4]] + 1.).abs() < 1e-12);
        assert!((freq.nu_y[[1, 0]] - 0.5).abs() < 1e-12);
        let natural = FrequencyGrid::natural(&grid.cartesian());
        assert_eq!(natural.nu_x, freq.nu_x);
        Ok(())
    }

    #[test]
    fn pixel_size_reassignment() -> std::result::Result<(), Box<dyn Error>> {
        let grid = Grid::new(4, 4, 1.)?.with_pixel_size(2.)?;
        assert_eq!(grid.cartesian().x[[0, 0]], -4.);
        Ok(())
    }
}
