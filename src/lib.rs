/*!
# Wavefront

Coherent free-space propagation of sampled scalar fields, estimation of the radius of
curvature of a propagated spherical wavefront and phase retrieval from two defocused
intensity frames with the transport-of-intensity equation (TIE).

The radius of curvature pipeline:
 1. a [SphericalWave] is synthesized on a square [Grid] and cut by an [Aperture],
 2. the wave is propagated with a [Propagator] ([AngularSpectrum] or
    [BandLimitedAngularSpectrum]),
 3. the aperture is refitted to the first phase wrap and the phase within is unwrapped
    ([QualityGuided]),
 4. the sagitta of the unwrapped phase gives the radius of curvature ([WavefrontRadiusEstimator]).

[SimulationConfig] sweeps the pipeline over grid sizes and propagation distances.

The TIE phase retrieval is performed with [FftSolver] from frames read by a [Loader].
*/

pub mod aperture;
pub mod error;
pub mod fourier;
pub mod grid;
pub mod propagation;
pub mod simulation;
pub mod storage;
pub mod tie;
pub mod units;
pub mod unwrap;
pub mod wave;
pub mod wavefront;

pub use aperture::{Aperture, PhaseSource};
pub use error::{Error, ErrorKind, Result};
pub use grid::Grid;
pub use propagation::{AngularSpectrum, BandLimitedAngularSpectrum, PropagationMethod, Propagator};
pub use simulation::{RadiusRecord, SimulationConfig};
pub use storage::{Artifact, FileLoader, FileSaver, Loader, Saver};
pub use tie::{BoundaryCondition, FftSolver, Solver};
pub use unwrap::{PhaseUnwrapper, QualityGuided};
pub use wave::{SphericalWave, Wave};
pub use wavefront::{WavefrontRadius, WavefrontRadiusEstimator};
