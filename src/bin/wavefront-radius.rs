//! Radius of curvature sweep
//!
//! Propagates a spherical wave for every grid size and distance of a TOML
//! configuration file and estimates the radius of curvature of the wavefront.
//! The estimates are printed and optionally written to a CSV file,
//! intensity and phase maps are saved under `--data` if the configuration asks for them.

use std::{path::PathBuf, time::Instant};

use structopt::StructOpt;
use wavefront::{simulation::to_csv, FileSaver, Saver, SimulationConfig};

#[derive(Debug, StructOpt)]
#[structopt(
    name = "wavefront-radius",
    about = "Radius of curvature of a propagated spherical wavefront"
)]
struct Opt {
    /// Path to the TOML configuration file
    #[structopt(parse(from_os_str))]
    config: PathBuf,
    /// CSV file the estimates are written to
    #[structopt(long, parse(from_os_str))]
    csv: Option<PathBuf>,
    /// Root directory of the saved intensity and phase maps
    #[structopt(long, parse(from_os_str))]
    data: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let opt = Opt::from_args();

    let config = SimulationConfig::from_toml(&opt.config)?;
    let saver = match (&opt.data, config.save.any()) {
        (Some(root), true) => Some(FileSaver::new(root)),
        (None, true) => {
            log::warn!("no --data directory given, intensity and phase maps won't be saved");
            None
        }
        _ => None,
    };

    let now = Instant::now();
    let n_case = config.cases().len();
    let records = config.sweep(saver.as_ref().map(|s| s as &(dyn Saver + Sync)));
    println!(
        "{}/{} cases processed in: {}s",
        records.len(),
        n_case,
        now.elapsed().as_secs()
    );
    println!(
        "{:>10} {:>10} {:>10} {:>10} {:>12}",
        "N [px]", "z [mm]", "D [px]", "D' [px]", "R [mm]"
    );
    for record in &records {
        println!(
            "{:>10} {:>10.3} {:>10.1} {:>10.1} {:>12.3}",
            record.grid_size,
            record.z_mm,
            record.aperture_px,
            record.modified_aperture_px,
            record.radius_mm
        );
    }

    if let Some(path) = opt.csv {
        to_csv(&records, &path)?;
        log::info!("estimates written to {:?}", path);
    }

    Ok(())
}
