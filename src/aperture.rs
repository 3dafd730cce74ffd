//! Circular aperture
//!
//! The aperture diameter is kept in meters and exchanged in pixels.
//! [Aperture::modify] refits the diameter to the wrapped phase of a [PhaseSource]
//! so that the masked phase unwraps without crossing a branch cut at the rim.

use crate::{
    error::ErrorKind,
    grid::PolarGrid,
    units::{m2px, px2m},
};
use ndarray::Array2;

#[derive(thiserror::Error, Debug)]
pub enum ApertureError {
    #[error("aperture mask row {0} is empty")]
    EmptyAperture(usize),
    #[error("no positive-going zero crossing of the wrapped phase along row {0}")]
    NoZeroCrossing(usize),
    #[error("zero crossing at column {column} is past the grid center ({center})")]
    Degenerate { column: usize, center: usize },
    #[error("phase shape {0:?} does not match the aperture shape {1:?}")]
    ShapeMismatch((usize, usize), (usize, usize)),
    #[error("aperture diameter must be finite and non-negative, found {0}px")]
    Diameter(f64),
}
impl ApertureError {
    pub fn kind(&self) -> ErrorKind {
        use ApertureError::*;
        match self {
            EmptyAperture(_) | NoZeroCrossing(_) | Degenerate { .. } => {
                ErrorKind::NumericDegeneracy
            }
            ShapeMismatch(..) | Diameter(_) => ErrorKind::InvalidConfiguration,
        }
    }
}
type Result<T> = std::result::Result<T, ApertureError>;

/// Read-only view of a wrapped phase
pub trait PhaseSource {
    /// Wrapped phase in `(-π, π]`
    fn wrapped_phase(&self) -> Array2<f64>;
    /// Focal length [m]
    fn focal_len(&self) -> f64;
}

/// Binary mask: 1 where `r < diameter/2`, 0 elsewhere
pub fn circular_mask(polar: &PolarGrid, diameter: f64) -> Array2<f64> {
    let radius = 0.5 * diameter;
    polar.r.mapv(|r| if r < radius { 1. } else { 0. })
}

/// Largest number of samples, over all rows, with `intensity >= max(intensity)·threshold`
pub fn widest_diameter(intensity: &Array2<f64>, threshold: f64) -> usize {
    let level = intensity.fold(f64::NEG_INFINITY, |a, &b| a.max(b)) * threshold;
    intensity
        .rows()
        .into_iter()
        .map(|row| row.iter().filter(|&&x| x >= level).count())
        .max()
        .unwrap_or_default()
}

/// Circular aperture over a polar grid
#[derive(Debug, Clone)]
pub struct Aperture {
    polar: PolarGrid,
    diameter: f64,
    mask: Array2<f64>,
    convergence_correction: f64,
}
impl Aperture {
    /// Creates an aperture of `diameter` pixels
    pub fn new(polar: PolarGrid, diameter: f64) -> Result<Self> {
        if !(diameter.is_finite() && diameter >= 0.) {
            return Err(ApertureError::Diameter(diameter));
        }
        let diameter = px2m(diameter, polar.grid().pixel_size());
        let mask = circular_mask(&polar, diameter);
        Ok(Self {
            polar,
            diameter,
            mask,
            convergence_correction: 2.,
        })
    }
    /// Sets the number of pixels added to the refitted diameter of a converging wave
    pub fn convergence_correction(self, convergence_correction: f64) -> Self {
        Self {
            convergence_correction,
            ..self
        }
    }
    /// Diameter [px]
    pub fn diameter(&self) -> f64 {
        m2px(self.diameter, self.polar.grid().pixel_size())
    }
    /// Diameter [m]
    pub fn diameter_m(&self) -> f64 {
        self.diameter
    }
    /// Resizes the aperture to `diameter` pixels and rebuilds the mask
    pub fn set_diameter(&mut self, diameter: f64) -> Result<()> {
        if !(diameter.is_finite() && diameter >= 0.) {
            return Err(ApertureError::Diameter(diameter));
        }
        self.diameter = px2m(diameter, self.polar.grid().pixel_size());
        self.mask = circular_mask(&self.polar, self.diameter);
        Ok(())
    }
    pub fn mask(&self) -> &Array2<f64> {
        &self.mask
    }
    pub fn polar(&self) -> &PolarGrid {
        &self.polar
    }
    /// Refits the diameter to the wrapped phase of `source` at distance `z` [m]
    ///
    /// The new rim is set at the positive-going zero crossing of the wrapped phase,
    /// along the central row, that is closest to the current rim.
    /// Returns the new diameter [px]; on error the aperture is left untouched.
    pub fn modify<S: PhaseSource + ?Sized>(&mut self, source: &S, z: f64) -> Result<f64> {
        let phase = source.wrapped_phase();
        if phase.dim() != self.mask.dim() {
            return Err(ApertureError::ShapeMismatch(phase.dim(), self.mask.dim()));
        }
        let (height, width) = phase.dim();
        let row = height / 2;
        let phase_row = phase.row(row);
        let mask_row = self.mask.row(row);

        let jump = mask_row
            .iter()
            .position(|&v| v == 1.)
            .ok_or(ApertureError::EmptyAperture(row))?;
        let center = width / 2;
        let crossing = |i: &usize| *i > 0 && phase_row[*i] > 0. && phase_row[*i - 1] < 0.;
        let left = (1..=jump).rev().find(crossing);
        // crossings at or past the center cannot bound an aperture
        let right = (jump..center.max(jump)).find(crossing);
        let column = match (left, right) {
            (Some(l), Some(r)) if r - jump < jump - l => r,
            (Some(l), _) => l,
            (None, Some(r)) => r,
            (None, None) => return Err(ApertureError::NoZeroCrossing(row)),
        };
        if column >= center {
            return Err(ApertureError::Degenerate { column, center });
        }

        let mut diameter = ((center - column) * 2) as f64;
        if z < source.focal_len() {
            diameter += self.convergence_correction;
        }
        log::debug!(
            "aperture diameter: {:.1}px -> {:.1}px (z={:.3}mm)",
            self.diameter(),
            diameter,
            z * 1e3
        );
        self.set_diameter(diameter)?;
        Ok(diameter)
    }
}
