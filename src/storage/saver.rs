use super::{find_extrema, normalize, Artifact, Result, Saver, StorageError};
use crate::units::m2mm;
use image::{ImageBuffer, Rgb};
use ndarray::Array2;
use npyz::WriterBuilder;
use std::{
    fs::{create_dir_all, File},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

/// File system [Saver]
///
/// Artifacts are written to `<root>/<category>/<name>.npy` (arrays) or
/// `<root>/<category>/<name>.png` (images).
#[derive(Debug, Clone)]
pub struct FileSaver {
    root: PathBuf,
}
impl FileSaver {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }
    pub fn root(&self) -> &Path {
        &self.root
    }
    /// File stem for a propagation distance `z` [m]: `z_<mm>mm`
    pub fn filename(z: f64) -> String {
        format!("z_{:.3}mm", m2mm(z))
    }
    fn save_npy(array: &Array2<f64>, path: &Path) -> Result<()> {
        let file = File::create(path).map_err(|e| StorageError::Create(e, path.to_path_buf()))?;
        let mut buffer = BufWriter::new(file);
        let (height, width) = array.dim();
        let mut writer = npyz::WriteOptions::<f64>::new()
            .default_dtype()
            .shape(&[height as u64, width as u64])
            .writer(&mut buffer)
            .begin_nd()
            .map_err(|e| StorageError::Npy(e, path.to_path_buf()))?;
        // logical (row major) order regardless of the memory layout
        for value in array.iter() {
            writer
                .push(value)
                .map_err(|e| StorageError::Npy(e, path.to_path_buf()))?;
        }
        writer
            .finish()
            .and_then(|_| buffer.flush())
            .map_err(|e| StorageError::Npy(e, path.to_path_buf()))
    }
    fn save_png(array: &Array2<f64>, path: &Path) -> Result<()> {
        let (min, max) = find_extrema(&[array]);
        let rgb_data: Vec<u8> = normalize(array, min, max)
            .iter()
            .flat_map(|&value| {
                let color = colorous::CUBEHELIX.eval_continuous(value);
                [color.r, color.g, color.b]
            })
            .collect();
        let (height, width) = array.dim();
        let image =
            ImageBuffer::<Rgb<u8>, Vec<u8>>::from_raw(width as u32, height as u32, rgb_data)
                .ok_or_else(|| StorageError::ImageBuffer(path.to_path_buf()))?;
        image
            .save(path)
            .map_err(|e| StorageError::Image(e, path.to_path_buf()))
    }
}
impl Saver for FileSaver {
    fn save(&self, artifact: Artifact<'_>, category: &str, name: &str) -> Result<PathBuf> {
        let dir = self.root.join(category);
        create_dir_all(&dir).map_err(|e| StorageError::CreateDir(e, dir.clone()))?;
        let path = match artifact {
            Artifact::Array(array) => {
                let path = dir.join(format!("{name}.npy"));
                Self::save_npy(array, &path)?;
                path
            }
            Artifact::Image(array) => {
                let path = dir.join(format!("{name}.png"));
                Self::save_png(array, &path)?;
                path
            }
        };
        log::debug!("saved {:?}", path);
        Ok(path)
    }
}
