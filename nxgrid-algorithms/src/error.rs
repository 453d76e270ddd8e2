//! Mapper construction errors.
//!
//! Query outcomes never produce these: a Q vector that cannot be seen by a
//! detector is `None`, not an error.

use nxgrid_core::GridId;
use thiserror::Error;

/// Result type for mapper construction.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while setting up a mapper.
#[derive(Error, Debug)]
pub enum Error {
    /// The data set x axis is not time-of-flight.
    #[error("need a time-of-flight data set, x units are {0:?}")]
    NotTimeOfFlight(String),

    /// Fewer area detectors than the requested ordinal.
    #[error("area detector #{0} not found")]
    AreaDetectorNotFound(usize),

    /// The detector's spectra carry no initial flight path.
    #[error("initial flight path missing")]
    MissingInitialPath,

    /// The data set carries no sample orientation.
    #[error("sample orientation missing")]
    MissingOrientation,

    /// Some pixels of the grid have no spectrum.
    #[error("grid {0} has pixels without data")]
    IncompleteGrid(GridId),

    /// The detector center lies on the incident beam axis.
    #[error("detector center lies on the beam axis")]
    DetectorOnBeamAxis,

    /// Per-pixel spectrum table does not match the grid.
    #[error("expected {expected} pixel entries, found {found}")]
    PixelCountMismatch {
        /// Pixels in the grid.
        expected: usize,
        /// Entries supplied.
        found: usize,
    },

    /// Core library error.
    #[error("core error: {0}")]
    CoreError(#[from] nxgrid_core::Error),
}
