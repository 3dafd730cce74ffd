/*!
# Array and image persistence

[Saver] and [Loader] are the persistence contracts of the crate, [FileSaver] and
[FileLoader] implement them over the file system:
 - arrays are written as `.npy` files (C order, `f64`),
 - images are written as PNG heatmaps with the CUBEHELIX colormap,
 - frames are read back from `.npy` files or from 8/16-bit grayscale images and
   normalized to `[0,1]`.
*/

use crate::error::ErrorKind;
use ndarray::Array2;
use std::{
    io,
    path::{Path, PathBuf},
};

mod loader;
mod saver;
pub use loader::FileLoader;
pub use saver::FileSaver;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("failed to create directory {1:?}")]
    CreateDir(#[source] io::Error, PathBuf),
    #[error("failed to create file {1:?}")]
    Create(#[source] io::Error, PathBuf),
    #[error("failed to open file {1:?}")]
    Open(#[source] io::Error, PathBuf),
    #[error("failed to read or write the npy file {1:?}")]
    Npy(#[source] io::Error, PathBuf),
    #[error("failed to read or write the image {1:?}")]
    Image(#[source] image::ImageError, PathBuf),
    #[error("failed to write the CSV table")]
    Csv(#[from] csv::Error),
    #[error("failed to create image buffer for {0:?}")]
    ImageBuffer(PathBuf),
    #[error("complex valued arrays cannot be normalized ({0:?})")]
    Complex(PathBuf),
    #[error("unsupported data type {0} in {1:?}")]
    DType(String, PathBuf),
    #[error("expected a 2D array, found {0} dimensions in {1:?}")]
    Dimensions(usize, PathBuf),
}
impl StorageError {
    pub fn kind(&self) -> ErrorKind {
        use StorageError::*;
        match self {
            CreateDir(..) | Create(..) | Open(..) | Npy(..) | Image(..) | Csv(_)
            | ImageBuffer(_) => ErrorKind::Io,
            Complex(_) | DType(..) | Dimensions(..) => ErrorKind::InvalidConfiguration,
        }
    }
}
pub type Result<T> = std::result::Result<T, StorageError>;

/// Artifacts handed to a [Saver]
#[derive(Debug, Clone, Copy)]
pub enum Artifact<'a> {
    /// raw samples
    Array(&'a Array2<f64>),
    /// samples rendered as a heatmap
    Image(&'a Array2<f64>),
}

/// Persists artifacts under a category and a name
pub trait Saver {
    /// Saves the artifact and returns the path it was written to
    fn save(&self, artifact: Artifact<'_>, category: &str, name: &str) -> Result<PathBuf>;
}

/// Samples read from a file and the sample range that maps to `[0,1]`
///
/// A `None` range means that the range of the data is used.
#[derive(Debug, Clone)]
pub struct RawFrame {
    pub data: Array2<f64>,
    pub range: Option<(f64, f64)>,
}

/// Reads normalized 2D arrays
pub trait Loader {
    fn read(&self, path: &Path) -> Result<RawFrame>;
    /// Loads a frame normalized to `[0,1]`
    fn load<P: AsRef<Path>>(&self, path: P) -> Result<Array2<f64>> {
        let RawFrame { data, range } = self.read(path.as_ref())?;
        let (min, max) = range.unwrap_or_else(|| find_extrema(&[&data]));
        Ok(normalize(&data, min, max))
    }
    /// Loads frames normalized with their global extrema
    fn load_frames<P: AsRef<Path>>(&self, paths: &[P]) -> Result<Vec<Array2<f64>>> {
        let frames = paths
            .iter()
            .map(|path| self.read(path.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        let raw: Vec<_> = frames
            .iter()
            .filter(|frame| frame.range.is_none())
            .map(|frame| &frame.data)
            .collect();
        let global = find_extrema(&raw);
        Ok(frames
            .iter()
            .map(|RawFrame { data, range }| {
                let (min, max) = range.unwrap_or(global);
                normalize(data, min, max)
            })
            .collect())
    }
}

/// Minimum and maximum values across all frames
pub fn find_extrema(frames: &[&Array2<f64>]) -> (f64, f64) {
    let global_max = frames
        .iter()
        .flat_map(|frame| frame.iter())
        .copied()
        .fold(f64::NEG_INFINITY, f64::max);
    let global_min = frames
        .iter()
        .flat_map(|frame| frame.iter())
        .copied()
        .fold(f64::INFINITY, f64::min);
    (global_min, global_max)
}

/// Maps `[min,max]` to `[0,1]`, a null range maps to zeros
pub fn normalize(array: &Array2<f64>, min: f64, max: f64) -> Array2<f64> {
    let range = max - min;
    if range > 0. {
        array.mapv(|x| (x - min) / range)
    } else {
        Array2::zeros(array.dim())
    }
}
