//! nxgrid-core: Detector grid geometry and data-set types.
//!
//! This crate provides the geometric model of uniform detector grids, the
//! arena that owns them, the index that binds grid pixels to measured
//! spectra, sample orientation and time-of-flight conversions.
//!

pub mod config;
pub mod error;
pub mod grid;
pub mod orientation;
pub mod spectrum;
pub mod store;
pub mod tof;

pub use config::InstrumentConfig;
pub use error::{Error, Result};
pub use grid::{round_half_up, DetectorGrid, GridGeometry, GridId};
pub use orientation::{GoniometerAngles, SampleOrientation};
pub use spectrum::{DataSet, PixelRef, Spectrum, SpectrumBlock, SpectrumId, TOF_UNITS};
pub use store::{GridStore, PixelIndex};
