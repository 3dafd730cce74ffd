use super::{Result, TieError};
use ndarray::{s, Array2};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

/// Boundary conditions of the TIE solver
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, EnumIter, Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum BoundaryCondition {
    Dirichlet,
    Neumann,
    Periodic,
    #[default]
    None,
}
impl BoundaryCondition {
    /// Whether the frames are mirror-padded
    pub fn is_mirrored(&self) -> bool {
        matches!(self, BoundaryCondition::Dirichlet | BoundaryCondition::Neumann)
    }
}

/// Volkov mirror padding
///
/// Returns a `2h×2w` array with the original in the top-left quadrant, its left-right
/// flip in the top-right, its up-down flip in the bottom-left and both flips in the
/// bottom-right. The single flips are negated for [BoundaryCondition::Dirichlet].
/// (V. V. Volkov et al., Micron 33, 2002)
pub fn apply_volkov_scheme(
    array: &Array2<f64>,
    condition: BoundaryCondition,
) -> Result<Array2<f64>> {
    let sign = match condition {
        BoundaryCondition::Dirichlet => -1.,
        BoundaryCondition::Neumann => 1.,
        BoundaryCondition::Periodic => return Err(TieError::Unsupported(condition)),
        BoundaryCondition::None => return Ok(array.clone()),
    };
    let (height, width) = array.dim();
    Ok(Array2::from_shape_fn((2 * height, 2 * width), |(i, j)| {
        match (i < height, j < width) {
            (true, true) => array[[i, j]],
            (true, false) => sign * array[[i, 2 * width - 1 - j]],
            (false, true) => sign * array[[2 * height - 1 - i, j]],
            (false, false) => array[[2 * height - 1 - i, 2 * width - 1 - j]],
        }
    }))
}

/// Extracts the original array from a mirror-padded one
pub fn clip(array: &Array2<f64>, condition: BoundaryCondition) -> Array2<f64> {
    if condition.is_mirrored() {
        let (height, width) = array.dim();
        array.slice(s![..height / 2, ..width / 2]).to_owned()
    } else {
        array.clone()
    }
}
