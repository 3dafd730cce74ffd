use std::path::PathBuf;

use structopt::StructOpt;
use wavefront::{
    units::{mm2m, nm2m, um2m},
    Artifact, BoundaryCondition, FftSolver, FileLoader, FileSaver, Saver, Solver,
};

#[derive(Debug, StructOpt)]
#[structopt(
    name = "phase-retrieval",
    about = "Phase retrieval with the transport of intensity equation"
)]
struct Opt {
    /// Intensity frame at -dz (npy or grayscale image)
    #[structopt(parse(from_os_str))]
    under_focus: PathBuf,
    /// Intensity frame at +dz (npy or grayscale image)
    #[structopt(parse(from_os_str))]
    over_focus: PathBuf,
    /// Distance between each frame and the reference plane [mm]
    #[structopt(long)]
    dz_mm: f64,
    /// Wavelength [nm]
    #[structopt(long)]
    wavelength_nm: f64,
    /// Detector pixel size [um]
    #[structopt(long)]
    pixel_size_um: f64,
    /// Boundary condition: dirichlet, neumann or none
    #[structopt(long, default_value = "none")]
    bc: BoundaryCondition,
    /// Normalized intensity below which the phase gradient is discarded
    #[structopt(long, default_value = "0.1353352832366127")]
    threshold: f64,
    /// Output directory
    #[structopt(short, long, default_value = "tie", parse(from_os_str))]
    output: PathBuf,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let opt = Opt::from_args();

    let solver = FftSolver::from_paths(
        &FileLoader,
        &[&opt.under_focus, &opt.over_focus],
        mm2m(opt.dz_mm),
        Some(nm2m(opt.wavelength_nm)),
        um2m(opt.pixel_size_um),
        opt.bc,
    )?;
    let phase = solver.solve(opt.threshold)?;
    let (height, width) = phase.dim();
    println!("Retrieved a {height}x{width} phase map");

    let saver = FileSaver::new(&opt.output);
    for artifact in [Artifact::Array(&phase), Artifact::Image(&phase)] {
        let path = saver.save(artifact, "phase", "tie")?;
        log::info!("phase saved to {:?}", path);
    }

    Ok(())
}
