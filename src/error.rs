use crate::{
    aperture::ApertureError, grid::GridError, propagation::PropagationError,
    simulation::ConfigError, storage::StorageError, tie::TieError, wave::WaveError,
    wavefront::WavefrontError,
};

/// Failure classes shared by every module
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Rejected input or configuration, nothing was computed
    InvalidConfiguration,
    /// The computation would have produced a division by zero or an undefined result
    NumericDegeneracy,
    /// The requested path exists in the model but is not implemented
    Unsupported,
    /// Reading or writing files failed
    Io,
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Error in the `grid` module")]
    Grid(#[from] GridError),
    #[error("Error in the `aperture` module")]
    Aperture(#[from] ApertureError),
    #[error("Error in the `wave` module")]
    Wave(#[from] WaveError),
    #[error("Error in the `propagation` module")]
    Propagation(#[from] PropagationError),
    #[error("Error in the `wavefront` module")]
    Wavefront(#[from] WavefrontError),
    #[error("Error in the `tie` module")]
    Tie(#[from] TieError),
    #[error("Error in the `storage` module")]
    Storage(#[from] StorageError),
    #[error("Error in the `simulation` module")]
    Config(#[from] ConfigError),
}
impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Grid(e) => e.kind(),
            Error::Aperture(e) => e.kind(),
            Error::Wave(e) => e.kind(),
            Error::Propagation(e) => e.kind(),
            Error::Wavefront(e) => e.kind(),
            Error::Tie(e) => e.kind(),
            Error::Storage(e) => e.kind(),
            Error::Config(e) => e.kind(),
        }
    }
}
pub type Result<T> = std::result::Result<T, Error>;
