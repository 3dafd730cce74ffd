use super::{Loader, RawFrame, Result, StorageError};
use image::DynamicImage;
use ndarray::{Array2, ShapeBuilder};
use npyz::{DType, NpyFile, Order, TypeChar};
use std::{fs::File, io::BufReader, path::Path};

/// File system [Loader]
///
/// Files with the `.npy` extension are read as `float32` or `float64` 2D arrays (C or Fortran
/// order) and min-max normalized, anything else is opened as an image:
/// 8-bit grayscale is divided by 255, 16-bit grayscale by 65535 and color images are
/// converted to 8-bit grayscale first.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileLoader;

impl FileLoader {
    fn read_npy(path: &Path) -> Result<RawFrame> {
        let npy_err = |e| StorageError::Npy(e, path.to_path_buf());
        let file = File::open(path).map_err(|e| StorageError::Open(e, path.to_path_buf()))?;
        let npy = NpyFile::new(BufReader::new(file)).map_err(npy_err)?;
        let shape = npy.shape().to_vec();
        let &[height, width] = shape.as_slice() else {
            return Err(StorageError::Dimensions(shape.len(), path.to_path_buf()));
        };
        let (height, width) = (height as usize, width as usize);
        let order = npy.order();
        let data: Vec<f64> = match npy.dtype() {
            DType::Plain(ts) if ts.type_char() == TypeChar::Complex => {
                return Err(StorageError::Complex(path.to_path_buf()))
            }
            DType::Plain(ts) if ts.type_char() == TypeChar::Float && ts.size_field() == 4 => npy
                .into_vec::<f32>()
                .map_err(npy_err)?
                .into_iter()
                .map(f64::from)
                .collect(),
            DType::Plain(ts) if ts.type_char() == TypeChar::Float && ts.size_field() == 8 => {
                npy.into_vec::<f64>().map_err(npy_err)?
            }
            dtype => return Err(StorageError::DType(format!("{dtype:?}"), path.to_path_buf())),
        };
        let shape = (height, width);
        let data = match order {
            Order::C => Array2::from_shape_vec(shape, data),
            Order::Fortran => Array2::from_shape_vec(shape.f(), data),
        }
        .map_err(|_| StorageError::Dimensions(2, path.to_path_buf()))?;
        Ok(RawFrame { data, range: None })
    }
    fn read_image(path: &Path) -> Result<RawFrame> {
        let image = image::open(path).map_err(|e| StorageError::Image(e, path.to_path_buf()))?;
        let (width, height) = (image.width() as usize, image.height() as usize);
        let (samples, max): (Vec<f64>, f64) = match image {
            DynamicImage::ImageLuma8(buffer) => (
                buffer.into_raw().into_iter().map(f64::from).collect(),
                u8::MAX as f64,
            ),
            DynamicImage::ImageLuma16(buffer) => (
                buffer.into_raw().into_iter().map(f64::from).collect(),
                u16::MAX as f64,
            ),
            color => (
                color.to_luma8().into_raw().into_iter().map(f64::from).collect(),
                u8::MAX as f64,
            ),
        };
        let data = Array2::from_shape_vec((height, width), samples)
            .map_err(|_| StorageError::ImageBuffer(path.to_path_buf()))?;
        Ok(RawFrame {
            data,
            range: Some((0., max)),
        })
    }
}
impl Loader for FileLoader {
    fn read(&self, path: &Path) -> Result<RawFrame> {
        log::debug!("loading {:?}", path);
        let is_npy = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("npy"));
        if is_npy {
            Self::read_npy(path)
        } else {
            Self::read_image(path)
        }
    }
}
