//! Instrument configuration loaded from JSON.
//!
//! ```json
//! {
//!   "instrument": {
//!     "initial_path_m": 9.378,
//!     "t0_shift_us": 0.0,
//!     "goniometer": { "phi": 0.0, "chi": 0.0, "omega": 0.0 },
//!     "grids": [
//!       { "id": 17, "center": [0.0, 0.25, 0.0], "x_vector": [0, 0, 1], "y_vector": [1, 0, 0],
//!         "width": 0.15, "height": 0.15, "n_rows": 100, "n_cols": 100 }
//!     ]
//!   }
//! }
//! ```

use crate::grid::{DetectorGrid, GridGeometry};
use crate::orientation::{GoniometerAngles, SampleOrientation};
use crate::store::GridStore;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

#[derive(Deserialize)]
struct JsonConfig {
    instrument: InstrumentConfig,
}

/// Instrument geometry and calibration shared by all grids.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InstrumentConfig {
    /// Moderator-to-sample distance in meters.
    pub initial_path_m: f64,
    /// Calibrated time-zero shift in microseconds.
    #[serde(default)]
    pub t0_shift_us: f64,
    #[serde(default)]
    pub goniometer: GoniometerAngles,
    pub grids: Vec<GridGeometry>,
}

impl InstrumentConfig {
    /// Load configuration from a JSON file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let json_config: JsonConfig = serde_json::from_reader(reader)?;
        json_config.instrument.validated()
    }

    /// Load configuration from a JSON string.
    ///
    /// # Errors
    /// Returns an error if the string cannot be parsed or validated.
    pub fn from_json(json: &str) -> Result<Self> {
        let json_config: JsonConfig = serde_json::from_str(json)?;
        json_config.instrument.validated()
    }

    fn validated(self) -> Result<Self> {
        if self.initial_path_m.is_nan() || self.initial_path_m <= 0.0 {
            return Err(Error::ConfigError(format!(
                "initial_path_m must be > 0, got {}",
                self.initial_path_m
            )));
        }
        if self.grids.is_empty() {
            return Err(Error::ConfigError("no grids configured".to_string()));
        }
        // builds and discards the store so every grid is checked once at load time
        self.grid_store()?;
        Ok(self)
    }

    /// Builds a store holding every configured grid.
    ///
    /// # Errors
    /// Returns an error if a grid is invalid or two grids share an id.
    pub fn grid_store(&self) -> Result<GridStore> {
        let mut store = GridStore::new();
        for geometry in &self.grids {
            store.insert(DetectorGrid::from_geometry(geometry)?)?;
        }
        Ok(store)
    }

    #[must_use]
    pub fn orientation(&self) -> SampleOrientation {
        SampleOrientation::from_angles(self.goniometer)
    }
}
