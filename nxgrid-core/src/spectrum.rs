//! Measured spectra ("data blocks") and the data sets that hold them.

use crate::grid::GridId;
use crate::orientation::SampleOrientation;
use std::sync::Arc;

/// Index of a spectrum within its [`DataSet`].
pub type SpectrumId = usize;

/// X-axis label of a time-of-flight data set.
pub const TOF_UNITS: &str = "Time(us)";

/// Read-only view of one measured spectrum.
///
/// For a histogram, `x_values` holds `y_values.len() + 1` bin edges; for a
/// function, `x_values` and `y_values` have equal length and `x_values` are
/// the sample points.
pub trait SpectrumBlock: Send + Sync {
    /// Ordered time-bin boundaries (histogram) or sample points (function).
    fn x_values(&self) -> &[f64];

    /// Measured values, parallel to the bins or sample points.
    fn y_values(&self) -> &[f64];

    /// True for bin-edge semantics, false for sample-point semantics.
    fn is_histogram(&self) -> bool;
}

/// Reference from a spectrum to the detector pixel that recorded it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PixelRef {
    pub grid_id: GridId,
    /// 1-based row; may be fractional for interpolated positions.
    pub row: f64,
    /// 1-based column; may be fractional for interpolated positions.
    pub col: f64,
}

impl PixelRef {
    #[must_use]
    pub fn new(grid_id: GridId, row: f64, col: f64) -> Self {
        Self { grid_id, row, col }
    }
}

/// A measured spectrum with its pixel and instrument attributes.
#[derive(Clone, Debug)]
pub struct Spectrum {
    x: Arc<[f64]>,
    y: Vec<f64>,
    histogram: bool,
    pixels: Option<Vec<PixelRef>>,
    /// Moderator-to-sample distance in meters.
    pub initial_path: Option<f64>,
    /// Calibrated time-zero shift in microseconds.
    pub t0_shift: Option<f64>,
}

impl Spectrum {
    /// Creates a histogram spectrum. `edges` may be shared between spectra.
    #[must_use]
    pub fn histogram(edges: Arc<[f64]>, counts: Vec<f64>) -> Self {
        Self {
            x: edges,
            y: counts,
            histogram: true,
            pixels: None,
            initial_path: None,
            t0_shift: None,
        }
    }

    /// Creates a function spectrum sampled at `points`.
    #[must_use]
    pub fn function(points: Arc<[f64]>, values: Vec<f64>) -> Self {
        Self {
            x: points,
            y: values,
            histogram: false,
            pixels: None,
            initial_path: None,
            t0_shift: None,
        }
    }

    #[must_use]
    pub fn with_pixel(mut self, pixel: PixelRef) -> Self {
        self.pixels.get_or_insert_with(Vec::new).push(pixel);
        self
    }

    #[must_use]
    pub fn with_initial_path(mut self, initial_path: f64) -> Self {
        self.initial_path = Some(initial_path);
        self
    }

    #[must_use]
    pub fn with_t0_shift(mut self, t0_shift: f64) -> Self {
        self.t0_shift = Some(t0_shift);
        self
    }

    /// Pixel list attribute, if the spectrum carries one.
    #[must_use]
    pub fn pixels(&self) -> Option<&[PixelRef]> {
        self.pixels.as_deref()
    }

    /// Shared x-scale handle.
    #[must_use]
    pub fn x_scale(&self) -> &Arc<[f64]> {
        &self.x
    }
}

impl SpectrumBlock for Spectrum {
    fn x_values(&self) -> &[f64] {
        &self.x
    }

    fn y_values(&self) -> &[f64] {
        &self.y
    }

    fn is_histogram(&self) -> bool {
        self.histogram
    }
}

/// An ordered collection of spectra sharing one x-axis unit.
#[derive(Clone, Debug, Default)]
pub struct DataSet {
    pub x_units: String,
    pub spectra: Vec<Spectrum>,
    pub orientation: Option<SampleOrientation>,
}

impl DataSet {
    #[must_use]
    pub fn new(x_units: impl Into<String>) -> Self {
        Self {
            x_units: x_units.into(),
            spectra: Vec::new(),
            orientation: None,
        }
    }

    /// Appends a spectrum and returns its id.
    pub fn push(&mut self, spectrum: Spectrum) -> SpectrumId {
        self.spectra.push(spectrum);
        self.spectra.len() - 1
    }

    #[must_use]
    pub fn get(&self, id: SpectrumId) -> Option<&Spectrum> {
        self.spectra.get(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.spectra.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.spectra.is_empty()
    }

    /// True when the x axis is time-of-flight in microseconds.
    #[must_use]
    pub fn is_time_of_flight(&self) -> bool {
        self.x_units.eq_ignore_ascii_case(TOF_UNITS)
    }
}
