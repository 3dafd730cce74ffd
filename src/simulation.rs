/*!
# Radius of curvature sweep

[SimulationConfig] is read from a TOML file:
```toml
wavelength_nm = 659.6
pixel_size_um = 5.04
focal_len_mm = 100.0
gaussian_width_param = 247.0
grid_sizes = [512, 1024]
method = "angular_spectrum"

[distances]
start_mm = 0.0
stop_mm = 200.0
step_mm = 10.0

[save]
intensity_npy = true
```
Each `(grid size, z)` case synthesizes a [SphericalWave], propagates it to `z` and
estimates the radius of curvature of the wavefront ([SimulationConfig::run_case]);
[SimulationConfig::sweep] runs all the cases in parallel.
*/

use crate::{
    aperture::{widest_diameter, Aperture},
    error::{ErrorKind, Result},
    grid::Grid,
    propagation::PropagationMethod,
    storage::{Artifact, FileSaver, Saver, StorageError},
    units::{m2mm, mm2m, nm2m, um2m},
    unwrap::QualityGuided,
    wave::{SphericalWave, Wave},
    wavefront::WavefrontRadiusEstimator,
};
use indicatif::{ParallelProgressIterator, ProgressBar, ProgressStyle};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::{
    fs, io,
    path::{Path, PathBuf},
    str::FromStr,
};

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("failed to read the configuration file {1:?}")]
    Read(#[source] io::Error, PathBuf),
    #[error("failed to parse the TOML configuration")]
    Parse(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}
impl ConfigError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ConfigError::Read(..) => ErrorKind::Io,
            ConfigError::Parse(_) | ConfigError::Invalid(_) => ErrorKind::InvalidConfiguration,
        }
    }
}

/// Propagation distances [mm], `stop` included
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct DistanceRange {
    pub start_mm: f64,
    pub stop_mm: f64,
    pub step_mm: f64,
}

/// Artifacts saved for each case
#[derive(Debug, Default, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct SaveConfig {
    #[serde(default)]
    pub intensity_npy: bool,
    #[serde(default)]
    pub intensity_png: bool,
    #[serde(default)]
    pub phase_png: bool,
}
impl SaveConfig {
    pub fn any(&self) -> bool {
        self.intensity_npy || self.intensity_png || self.phase_png
    }
}

/// Sweep configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SimulationConfig {
    pub wavelength_nm: f64,
    pub pixel_size_um: f64,
    pub focal_len_mm: f64,
    /// e⁻² intensity diameter of the Gaussian envelope [px]
    pub gaussian_width_param: f64,
    pub grid_sizes: Vec<usize>,
    pub distances: DistanceRange,
    /// relative intensity level of the aperture rim after propagation
    #[serde(default = "default_aperture_threshold")]
    pub aperture_threshold: f64,
    #[serde(default)]
    pub method: PropagationMethod,
    /// pixels added to the aperture diameter before the focus
    #[serde(default = "default_convergence_correction")]
    pub convergence_correction: f64,
    #[serde(default)]
    pub save: SaveConfig,
}
fn default_aperture_threshold() -> f64 {
    (-2f64).exp()
}
fn default_convergence_correction() -> f64 {
    2.
}

impl FromStr for SimulationConfig {
    type Err = ConfigError;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let config: SimulationConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }
}

/// One sample of the radius of curvature sweep
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RadiusRecord {
    #[serde(rename = "Grid size (px)")]
    pub grid_size: usize,
    #[serde(rename = "z (mm)")]
    pub z_mm: f64,
    #[serde(rename = "Aperture (px)")]
    pub aperture_px: f64,
    #[serde(rename = "Modified aperture (px)")]
    pub modified_aperture_px: f64,
    #[serde(rename = "Sagitta (mm)")]
    pub sagitta_mm: f64,
    #[serde(rename = "Radius (mm)")]
    pub radius_mm: f64,
}

/// Writes the records to a CSV file with a header
pub fn to_csv<P: AsRef<Path>>(
    records: &[RadiusRecord],
    path: P,
) -> std::result::Result<(), StorageError> {
    let mut wtr = csv::Writer::from_path(path)?;
    for record in records {
        wtr.serialize(record)?;
    }
    wtr.flush()
        .map_err(|e| StorageError::Csv(csv::Error::from(e)))?;
    Ok(())
}

impl SimulationConfig {
    /// Reads and validates a TOML configuration file
    pub fn from_toml<P: AsRef<Path>>(path: P) -> std::result::Result<Self, ConfigError> {
        let path = path.as_ref();
        log::info!("Loading {:?}...", path);
        let contents =
            fs::read_to_string(path).map_err(|e| ConfigError::Read(e, path.to_path_buf()))?;
        contents.parse()
    }
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        let positive = |name: &str, value: f64| {
            if value.is_finite() && value > 0. {
                Ok(())
            } else {
                Err(ConfigError::Invalid(format!(
                    "{name} must be positive, found {value}"
                )))
            }
        };
        positive("wavelength_nm", self.wavelength_nm)?;
        positive("pixel_size_um", self.pixel_size_um)?;
        positive("gaussian_width_param", self.gaussian_width_param)?;
        positive("distances.step_mm", self.distances.step_mm)?;
        if !self.focal_len_mm.is_finite() {
            return Err(ConfigError::Invalid(format!(
                "focal_len_mm must be finite, found {}",
                self.focal_len_mm
            )));
        }
        if self.grid_sizes.is_empty() || self.grid_sizes.contains(&0) {
            return Err(ConfigError::Invalid(format!(
                "grid_sizes must be a non-empty list of positive sizes, found {:?}",
                self.grid_sizes
            )));
        }
        let DistanceRange {
            start_mm, stop_mm, ..
        } = self.distances;
        if !(start_mm.is_finite() && stop_mm.is_finite() && stop_mm >= start_mm) {
            return Err(ConfigError::Invalid(format!(
                "distances must satisfy start_mm <= stop_mm, found [{start_mm}, {stop_mm}]"
            )));
        }
        if !(self.aperture_threshold > 0. && self.aperture_threshold <= 1.) {
            return Err(ConfigError::Invalid(format!(
                "aperture_threshold must be in (0, 1], found {}",
                self.aperture_threshold
            )));
        }
        if !self.convergence_correction.is_finite() {
            return Err(ConfigError::Invalid(format!(
                "convergence_correction must be finite, found {}",
                self.convergence_correction
            )));
        }
        Ok(())
    }
    pub fn wavelength(&self) -> f64 {
        nm2m(self.wavelength_nm)
    }
    pub fn pixel_size(&self) -> f64 {
        um2m(self.pixel_size_um)
    }
    pub fn focal_len(&self) -> f64 {
        mm2m(self.focal_len_mm)
    }
    /// Propagation distances [m]
    pub fn distances(&self) -> Vec<f64> {
        let DistanceRange {
            start_mm,
            stop_mm,
            step_mm,
        } = self.distances;
        let n = ((stop_mm - start_mm) / step_mm + 1e-9).floor() as usize;
        (0..=n)
            .map(|i| mm2m(start_mm + i as f64 * step_mm))
            .collect()
    }
    /// `(grid size, z)` pairs ordered by grid size then distance
    pub fn cases(&self) -> Vec<(usize, f64)> {
        let distances = self.distances();
        self.grid_sizes
            .iter()
            .flat_map(|&n| distances.iter().map(move |&z| (n, z)))
            .collect()
    }
    /// Propagates a fresh wave on a `grid_size²` grid to `z` [m] and estimates its radius
    pub fn run_case(
        &self,
        grid_size: usize,
        z: f64,
        saver: Option<&(dyn Saver + Sync)>,
    ) -> Result<RadiusRecord> {
        let grid = Grid::new(grid_size, grid_size, self.pixel_size())?;
        let mut wave = SphericalWave::new(
            grid,
            self.focal_len(),
            self.gaussian_width_param,
            self.wavelength(),
        )?;
        let mut aperture = Aperture::new(grid.polar(), 2. * self.gaussian_width_param)?
            .convergence_correction(self.convergence_correction);
        wave.apply_aperture(&aperture)?;

        wave.propagate(&self.method, z)?;
        let intensity = wave.intensity();
        aperture.set_diameter(widest_diameter(&intensity, self.aperture_threshold) as f64)?;
        let aperture_px = aperture.diameter();

        let estimate = WavefrontRadiusEstimator::<QualityGuided>::default()
            .estimate(&wave, &mut aperture)?;

        if let Some(saver) = saver {
            let name = FileSaver::filename(z);
            let category = |kind: &str| format!("{grid_size}/{kind}");
            if self.save.intensity_npy {
                saver.save(Artifact::Array(&intensity), &category("intensity npy"), &name)?;
            }
            if self.save.intensity_png {
                saver.save(Artifact::Image(&intensity), &category("intensity png"), &name)?;
            }
            if self.save.phase_png {
                let phase = wave.masked_phase(&aperture)?;
                saver.save(Artifact::Image(&phase), &category("phase png"), &name)?;
            }
        }

        Ok(RadiusRecord {
            grid_size,
            z_mm: m2mm(z),
            aperture_px,
            modified_aperture_px: aperture.diameter(),
            sagitta_mm: estimate.sagitta,
            radius_mm: estimate.radius,
        })
    }
    /// Runs all the cases in parallel
    ///
    /// Failed cases are logged and left out of the records.
    pub fn sweep(&self, saver: Option<&(dyn Saver + Sync)>) -> Vec<RadiusRecord> {
        let cases = self.cases();
        let pb = ProgressBar::new(cases.len() as u64);
        let template = "{msg} [{eta_precise}] {bar:40.cyan/blue} {pos:>4}/{len:4}";
        if let Ok(style) = ProgressStyle::with_template(template) {
            pb.set_style(style.progress_chars("##-"));
        }
        pb.set_message("Radius sweep");
        cases
            .par_iter()
            .progress_with(pb)
            .filter_map(|&(grid_size, z)| match self.run_case(grid_size, z, saver) {
                Ok(record) => Some(record),
                Err(e) => {
                    log::warn!(
                        "{}px grid at z={:.3}mm failed ({:?}): {}",
                        grid_size,
                        m2mm(z),
                        e.kind(),
                        report(&e)
                    );
                    None
                }
            })
            .collect()
    }
}

/// Error message followed by its sources
fn report(e: &dyn std::error::Error) -> String {
    let mut message = e.to_string();
    let mut source = e.source();
    while let Some(cause) = source {
        message.push_str(&format!(": {cause}"));
        source = cause.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    const CONFIG: &str = r#"
wavelength_nm = 659.6
pixel_size_um = 10.08
focal_len_mm = 100.0
gaussian_width_param = 123.5
grid_sizes = [256]

[distances]
start_mm = 40.0
stop_mm = 50.0
step_mm = 10.0
"#;

    #[test]
    fn defaults() -> std::result::Result<(), Box<dyn Error>> {
        let config: SimulationConfig = CONFIG.parse()?;
        assert_eq!(config.aperture_threshold, (-2f64).exp());
        assert_eq!(config.method, PropagationMethod::AngularSpectrum);
        assert_eq!(config.convergence_correction, 2.);
        assert!(!config.save.any());
        assert!((config.wavelength() - 659.6e-9).abs() < 1e-18);
        Ok(())
    }

    #[test]
    fn explicit_settings() -> std::result::Result<(), Box<dyn Error>> {
        let toml = format!(
            "method = \"band_limited\"\nconvergence_correction = 0.0\n{}\n[save]\nphase_png = true\n",
            CONFIG
        );
        let config: SimulationConfig = toml.parse()?;
        assert_eq!(config.method, PropagationMethod::BandLimited);
        assert_eq!(config.convergence_correction, 0.);
        assert!(config.save.phase_png && !config.save.intensity_npy);
        Ok(())
    }

    #[test]
    fn validation() {
        let invalid = [
            CONFIG.replace("pixel_size_um = 10.08", "pixel_size_um = -1.0"),
            CONFIG.replace("grid_sizes = [256]", "grid_sizes = []"),
            CONFIG.replace("step_mm = 10.0", "step_mm = 0.0"),
            CONFIG.replace("stop_mm = 50.0", "stop_mm = 10.0"),
            format!("aperture_threshold = 0.0\n{CONFIG}"),
        ];
        for toml in invalid {
            let err = toml.parse::<SimulationConfig>().unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidConfiguration, "{toml}");
        }
        assert!(matches!(
            "wavelength_nm = \"red\"".parse::<SimulationConfig>(),
            Err(ConfigError::Parse(_))
        ));
        assert_eq!(
            SimulationConfig::from_toml("no/such/config.toml")
                .unwrap_err()
                .kind(),
            ErrorKind::Io
        );
    }

    #[test]
    fn distances() -> std::result::Result<(), Box<dyn Error>> {
        let mut config: SimulationConfig = CONFIG.parse()?;
        config.distances = DistanceRange {
            start_mm: 0.,
            stop_mm: 200.,
            step_mm: 50.,
        };
        let expected = [0., 0.05, 0.1, 0.15, 0.2];
        let distances = config.distances();
        assert_eq!(distances.len(), expected.len());
        assert!(distances
            .iter()
            .zip(expected)
            .all(|(z, e)| (z - e).abs() < 1e-12));
        config.distances.step_mm = 40.;
        assert_eq!(config.distances().len(), 6);
        config.distances.step_mm = 30.;
        let last = config.distances().last().copied().unwrap_or_default();
        assert!((last - 0.18).abs() < 1e-12);
        config.grid_sizes = vec![128, 256];
        let cases = config.cases();
        assert_eq!(cases.len(), 14);
        assert_eq!(cases[0], (128, 0.));
        assert_eq!(cases[7], (256, 0.));
        Ok(())
    }

    #[test]
    fn run_case() -> std::result::Result<(), Box<dyn Error>> {
        let mut config: SimulationConfig = CONFIG.parse()?;
        config.save = SaveConfig {
            intensity_npy: true,
            intensity_png: false,
            phase_png: true,
        };
        let dir = tempfile::tempdir()?;
        let root = dir.path();
        let saver = FileSaver::new(root);
        let record = config.run_case(256, 50e-3, Some(&saver))?;
        assert_eq!(record.grid_size, 256);
        assert!((record.z_mm - 50.).abs() < 1e-9);
        assert!(record.aperture_px > 0.);
        assert!(record.radius_mm.is_finite() && record.radius_mm > 0.);
        assert!(root.join("256/intensity npy/z_50.000mm.npy").is_file());
        assert!(root.join("256/phase png/z_50.000mm.png").is_file());
        assert!(!root.join("256/intensity png").exists());
        Ok(())
    }

    #[test]
    fn sweep_and_csv() -> std::result::Result<(), Box<dyn Error>> {
        let config: SimulationConfig = CONFIG.parse()?;
        let records = config.sweep(None);
        assert_eq!(records.len(), 2);
        assert!(records[0].z_mm < records[1].z_mm);
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("radius.csv");
        to_csv(&records, &path)?;
        let table = fs::read_to_string(&path)?;
        let mut lines = table.lines();
        assert_eq!(
            lines.next(),
            Some(concat!(
                "Grid size (px),z (mm),Aperture (px),",
                "Modified aperture (px),Sagitta (mm),Radius (mm)"
            ))
        );
        assert_eq!(lines.count(), 2);
        Ok(())
    }
}
