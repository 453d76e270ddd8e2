//! Momentum transfer to detector pixel and time-of-flight.
//!
//! A [`QMapper`] captures one detector grid, the goniometer rotation and the
//! instrument constants at construction. Queries take a Q vector in the
//! sample frame (before the goniometer rotation, `2 pi` included) and are
//! pure functions of that snapshot, so one mapper can be shared across
//! threads.

use crate::lab::{detector_center, scattering_angle, trace_to_grid};
use crate::lookup::{bin_index, fractional_index};
use crate::{Error, Result};
use log::debug;
use nalgebra::{Rotation3, Vector3};
use nxgrid_core::{
    round_half_up, tof, DataSet, DetectorGrid, GridStore, PixelIndex, SampleOrientation, Spectrum,
    SpectrumBlock,
};
use std::collections::HashSet;

/// Returned by [`QMapper::interpolated_intensity`] when no value exists.
pub const NO_INTENSITY: f64 = -1.0;

const SCALE_TOLERANCE: f64 = 1e-9;

/// Fractional pixel and time-of-flight for a Q vector.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RowColTof {
    /// Fractional row (1-based).
    pub row: f64,
    /// Fractional column (1-based).
    pub col: f64,
    /// Time-of-flight in microseconds, before the t0 shift.
    pub tof: f64,
}

/// Fractional pixel and time channel for a Q vector.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RowColChannel {
    /// Fractional row (1-based).
    pub row: f64,
    /// Fractional column (1-based).
    pub col: f64,
    /// Fractional channel index in the pixel's time bins.
    pub channel: f64,
}

/// Detector-plane offsets and wavelength for a Q vector.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct XyWavelength {
    /// Offset along the grid x axis from the center, in cm.
    pub x_cm: f64,
    /// Offset along the grid y axis from the center, in cm.
    pub y_cm: f64,
    /// Wavelength in Angstrom.
    pub wavelength: f64,
}

/// Maps Q vectors onto one detector grid.
#[derive(Clone, Debug)]
pub struct QMapper<'a, S = Spectrum> {
    grid: DetectorGrid,
    // row-major, (row - 1) * n_cols + (col - 1)
    pixels: Vec<Option<&'a S>>,
    shared_x: Option<&'a [f64]>,
    rotation: Rotation3<f64>,
    inverse: Rotation3<f64>,
    det_center: Vector3<f64>,
    initial_path: f64,
    t0_shift: f64,
    q_center: Vector3<f64>,
    min_q_dot: f64,
}

/// Unit Q direction, in the sample frame, for scattering toward `point`.
fn sample_q_direction(point: &Vector3<f64>, inverse: &Rotation3<f64>) -> Option<Vector3<f64>> {
    let direction = (point.try_normalize(0.0)? - Vector3::x()).try_normalize(0.0)?;
    Some(inverse * direction)
}

fn same_scale(a: &[f64], b: &[f64]) -> bool {
    std::ptr::eq(a, b)
        || (a.len() == b.len()
            && a.iter()
                .zip(b)
                .all(|(x, y)| (x - y).abs() <= SCALE_TOLERANCE * x.abs().max(1.0)))
}

impl<'a, S: SpectrumBlock> QMapper<'a, S> {
    /// Creates a mapper for `grid`.
    ///
    /// `pixels` holds the spectrum of every pixel in row-major order (row 1
    /// first); `None` marks a pixel without data. `initial_path` is the
    /// moderator-to-sample distance (m) and `t0_shift` the calibrated time
    /// zero (us).
    ///
    /// # Errors
    /// Returns an error if `pixels` does not match the grid size or the
    /// detector center lies on the beam axis.
    pub fn new(
        grid: &DetectorGrid,
        orientation: &SampleOrientation,
        initial_path: f64,
        t0_shift: f64,
        pixels: Vec<Option<&'a S>>,
    ) -> Result<Self> {
        if pixels.len() != grid.num_points() {
            return Err(Error::PixelCountMismatch {
                expected: grid.num_points(),
                found: pixels.len(),
            });
        }

        let rotation = *orientation.goniometer_rotation();
        let inverse = *orientation.goniometer_rotation_inverse();
        let det_center = detector_center(grid);
        #[allow(clippy::cast_precision_loss)]
        let far = grid.position(grid.num_rows() as f64, grid.num_cols() as f64);
        let corner = grid.position(1.0, 1.0);

        let q_center =
            sample_q_direction(&det_center, &inverse).ok_or(Error::DetectorOnBeamAxis)?;
        let dot_to = |p: &Vector3<f64>| {
            sample_q_direction(p, &inverse).map_or(-1.0, |q| q_center.dot(&q))
        };
        let min_q_dot = dot_to(&corner).min(dot_to(&far));

        let shared_x = match pixels.first() {
            Some(Some(first)) => {
                let x = first.x_values();
                pixels
                    .iter()
                    .all(|p| p.is_some_and(|s| same_scale(x, s.x_values())))
                    .then_some(x)
            }
            _ => None,
        };

        debug!(
            "mapper for grid {}: min_q_dot {min_q_dot:.6}, shared time scale {}",
            grid.id(),
            shared_x.is_some()
        );
        Ok(Self {
            grid: grid.clone(),
            pixels,
            shared_x,
            rotation,
            inverse,
            det_center,
            initial_path,
            t0_shift,
            q_center,
            min_q_dot,
        })
    }

    /// Creates a mapper with no spectra: pixel and time-of-flight queries
    /// work, channel and intensity queries find nothing.
    ///
    /// # Errors
    /// Returns an error if the detector center lies on the beam axis.
    pub fn geometry_only(
        grid: &DetectorGrid,
        orientation: &SampleOrientation,
        initial_path: f64,
        t0_shift: f64,
    ) -> Result<Self> {
        Self::new(
            grid,
            orientation,
            initial_path,
            t0_shift,
            vec![None; grid.num_points()],
        )
    }

    /// The grid captured at construction.
    #[must_use]
    pub fn grid(&self) -> &DetectorGrid {
        &self.grid
    }

    /// Sample-to-lab rotation.
    #[must_use]
    pub fn goniometer_rotation(&self) -> &Rotation3<f64> {
        &self.rotation
    }

    /// Lab-to-sample rotation.
    #[must_use]
    pub fn goniometer_rotation_inverse(&self) -> &Rotation3<f64> {
        &self.inverse
    }

    /// Unit Q direction of the detector center, in the sample frame.
    #[must_use]
    pub fn q_center(&self) -> &Vector3<f64> {
        &self.q_center
    }

    /// Smallest `q_center . q_hat` seen at the detector corners.
    #[must_use]
    pub fn min_q_dot(&self) -> f64 {
        self.min_q_dot
    }

    /// Moderator-to-sample distance in meters.
    #[must_use]
    pub fn initial_path(&self) -> f64 {
        self.initial_path
    }

    /// Calibrated time-zero shift in microseconds.
    #[must_use]
    pub fn t0_shift(&self) -> f64 {
        self.t0_shift
    }

    /// True when every pixel uses the same time bins.
    #[must_use]
    pub fn has_shared_time_scale(&self) -> bool {
        self.shared_x.is_some()
    }

    fn spectrum(&self, row: i64, col: i64) -> Option<&'a S> {
        if !self.grid.contains(row, col) {
            return None;
        }
        #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
        let slot = (row as usize - 1) * self.grid.num_cols() + (col as usize - 1);
        self.pixels[slot]
    }

    fn x_values(&self, row: i64, col: i64) -> Option<&'a [f64]> {
        match self.shared_x {
            Some(x) => Some(x),
            None => self.spectrum(row, col).map(S::x_values),
        }
    }

    /// Fractional row, column and time-of-flight at which `q` is recorded.
    ///
    /// `None` when `q` points away from this detector, has no elastic
    /// solution, or lands off the grid.
    #[must_use]
    pub fn map_q_to_row_col_tof(&self, q: &Vector3<f64>) -> Option<RowColTof> {
        let threshold = q.dot(&self.q_center);
        if threshold <= 0.0 {
            return None;
        }
        let mag_q = q.norm();
        if threshold / mag_q < self.min_q_dot {
            return None;
        }

        let q_lab = self.rotation * q;
        let hit = trace_to_grid(&q_lab, &self.grid, &self.det_center)?;
        let tof_us = tof::tof_of_diffractometer_q(
            scattering_angle(&hit.point),
            self.initial_path + hit.point.norm(),
            mag_q,
        );
        Some(RowColTof {
            row: hit.row,
            col: hit.col,
            tof: tof_us,
        })
    }

    /// Fractional row, column and time channel at which `q` is recorded.
    ///
    /// The t0 shift is removed before the channel lookup. `None` when there
    /// is no pixel solution, the pixel has no spectrum, or the time falls
    /// outside the pixel's bins.
    #[must_use]
    pub fn map_q_to_row_col_channel(&self, q: &Vector3<f64>) -> Option<RowColChannel> {
        let hit = self.map_q_to_row_col_tof(q)?;
        let x = self.x_values(round_half_up(hit.row), round_half_up(hit.col))?;
        let channel = fractional_index(hit.tof - self.t0_shift, x)?;
        Some(RowColChannel {
            row: hit.row,
            col: hit.col,
            channel,
        })
    }

    /// Detector-plane offsets (cm) and wavelength at which `q` is recorded.
    #[must_use]
    pub fn q_to_xcm_ycm_wl(&self, q: &Vector3<f64>) -> Option<XyWavelength> {
        let hit = self.map_q_to_row_col_tof(q)?;
        let path = self.initial_path + self.grid.position(hit.row, hit.col).norm();
        Some(XyWavelength {
            x_cm: self.grid.x(hit.row, hit.col) * 100.0,
            y_cm: self.grid.y(hit.row, hit.col) * 100.0,
            wavelength: tof::wavelength(path, hit.tof),
        })
    }

    /// Intensity at `q`, interpolated in time at the four pixels around the
    /// hit and then bilinearly over row and column.
    ///
    /// `None` when there is no pixel solution, the 2x2 block reaches past
    /// the grid edge, or one of its pixels has no spectrum.
    #[must_use]
    pub fn try_interpolated_intensity(&self, q: &Vector3<f64>) -> Option<f64> {
        let hit = self.map_q_to_row_col_tof(q)?;
        let first_row = straddle_start(hit.row);
        let first_col = straddle_start(hit.col);
        if !self.grid.contains(first_row, first_col)
            || !self.grid.contains(first_row + 1, first_col + 1)
        {
            return None;
        }

        let mag_q = q.norm();
        let mut val = [[0.0; 2]; 2];
        for (i, row_vals) in val.iter_mut().enumerate() {
            for (j, v) in row_vals.iter_mut().enumerate() {
                #[allow(clippy::cast_possible_wrap)]
                let (row, col) = (first_row + i as i64, first_col + j as i64);
                let spectrum = self.spectrum(row, col)?;
                #[allow(clippy::cast_precision_loss)]
                let pixel = self.grid.position(row as f64, col as f64);
                let tof_us = tof::tof_of_diffractometer_q(
                    scattering_angle(&pixel),
                    self.initial_path + pixel.norm(),
                    mag_q,
                ) - self.t0_shift;
                let x = self.shared_x.unwrap_or_else(|| spectrum.x_values());
                *v = time_interpolate(tof_us, x, spectrum.y_values(), spectrum.is_histogram())
                    .unwrap_or(0.0);
            }
        }

        #[allow(clippy::cast_precision_loss)]
        let row_frac = hit.row - first_row as f64;
        #[allow(clippy::cast_precision_loss)]
        let col_frac = hit.col - first_col as f64;
        let intensity_0 = (1.0 - row_frac) * val[0][0] + row_frac * val[1][0];
        let intensity_1 = (1.0 - row_frac) * val[0][1] + row_frac * val[1][1];
        Some((1.0 - col_frac) * intensity_0 + col_frac * intensity_1)
    }

    /// [`Self::try_interpolated_intensity`], with [`NO_INTENSITY`] for `None`.
    #[must_use]
    pub fn interpolated_intensity(&self, q: &Vector3<f64>) -> f64 {
        self.try_interpolated_intensity(q).unwrap_or(NO_INTENSITY)
    }
}

/// First index of the pair straddling a fractional row or column.
#[allow(clippy::cast_precision_loss)]
fn straddle_start(fractional: f64) -> i64 {
    let nearest = round_half_up(fractional);
    if fractional > nearest as f64 {
        nearest
    } else {
        nearest - 1
    }
}

/// Linear interpolation of `y` at time `t`.
///
/// `None` in the first and last bins, where no bracketing pair exists.
/// Histogram values sit at bin centers; the pair is chosen by comparing `t`
/// with the center of its own bin.
fn time_interpolate(t: f64, x: &[f64], y: &[f64], histogram: bool) -> Option<f64> {
    let index = bin_index(t, x)?;
    if index == 0 || index + 1 >= y.len() {
        return None;
    }
    let mid = |i: usize| -> Option<f64> { Some((x.get(i)? + x.get(i + 1)?) / 2.0) };

    let (first, last, first_mid, last_mid) = if histogram {
        let bin_mid = mid(index)?;
        if t > bin_mid {
            (index, index + 1, bin_mid, mid(index + 1)?)
        } else {
            (index - 1, index, mid(index - 1)?, bin_mid)
        }
    } else {
        (index, index + 1, *x.get(index)?, *x.get(index + 1)?)
    };
    let frac = (t - first_mid) / (last_mid - first_mid);
    Some((1.0 - frac) * y[first] + frac * y[last])
}

impl<'a> QMapper<'a, Spectrum> {
    /// Creates a mapper for the `det_num`-th (1-based) area detector of a
    /// time-of-flight data set.
    ///
    /// Area detectors are grids with more than one row and more than one
    /// column, counted in order of first appearance among the spectra;
    /// spectra without pixel information (monitors) are skipped. The grid is
    /// rebound in `index` against `data_set`, replacing any binding made
    /// from another data set. The initial path and t0
    /// shift come from the detector's first spectrum (t0 defaults to 0).
    ///
    /// # Errors
    /// Returns an error if the data set is not time-of-flight, the detector
    /// does not exist, its grid cannot be fully bound, or the initial path or
    /// sample orientation is missing.
    pub fn from_data_set(
        data_set: &'a DataSet,
        store: &GridStore,
        index: &mut PixelIndex,
        det_num: usize,
    ) -> Result<Self> {
        if !data_set.is_time_of_flight() {
            return Err(Error::NotTimeOfFlight(data_set.x_units.clone()));
        }

        let mut seen = HashSet::new();
        let mut found = None;
        for spectrum in &data_set.spectra {
            let Some(pixel) = spectrum.pixels().and_then(<[_]>::first) else {
                continue;
            };
            let grid = store
                .get(pixel.grid_id)
                .ok_or(nxgrid_core::Error::UnknownGrid(pixel.grid_id))?;
            let is_area = grid.num_rows() > 1 && grid.num_cols() > 1;
            if is_area && seen.insert(grid.id()) && seen.len() == det_num {
                found = Some((grid, spectrum));
                break;
            }
        }
        let (grid, first) = found.ok_or(Error::AreaDetectorNotFound(det_num))?;

        if !index.bind_grid(grid, data_set) {
            return Err(Error::IncompleteGrid(grid.id()));
        }
        let initial_path = first.initial_path.ok_or(Error::MissingInitialPath)?;
        let t0_shift = first.t0_shift.unwrap_or(0.0);
        let orientation = data_set
            .orientation
            .as_ref()
            .ok_or(Error::MissingOrientation)?;

        let mut pixels = Vec::with_capacity(grid.num_points());
        for row in 1..=grid.num_rows() {
            for col in 1..=grid.num_cols() {
                #[allow(clippy::cast_possible_wrap)]
                let id = index.entry(grid.id(), row as i64, col as i64);
                pixels.push(id.and_then(|id| data_set.get(id)));
            }
        }
        debug!("area detector #{det_num} is grid {}", grid.id());
        Self::new(grid, orientation, initial_path, t0_shift, pixels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lab::tests::{lab_q_for_pixel, side_grid};
    use approx::assert_relative_eq;
    use nxgrid_core::{PixelRef, TOF_UNITS};
    use std::sync::Arc;

    const L0: f64 = 9.0;

    fn orientation() -> SampleOrientation {
        SampleOrientation::ipns_scd(30.0, 45.0, 20.0)
    }

    /// Sample-frame Q that lands on `(row, col)`.
    fn q_for_pixel(grid: &DetectorGrid, row: f64, col: f64, mag_q: f64) -> Vector3<f64> {
        orientation().to_sample(&lab_q_for_pixel(grid, row, col, mag_q))
    }

    /// Every pixel holds a flat spectrum of value `10 * row + col`.
    fn flat_data_set(grid: &DetectorGrid, histogram: bool) -> DataSet {
        let x: Arc<[f64]> = (0..=100).map(|i| f64::from(i) * 200.0).collect();
        let mut ds = DataSet::new(TOF_UNITS);
        ds.orientation = Some(orientation());
        for row in 1..=grid.num_rows() {
            for col in 1..=grid.num_cols() {
                let value = 10.0 * row as f64 + col as f64;
                let n = if histogram { x.len() - 1 } else { x.len() };
                let spectrum = if histogram {
                    Spectrum::histogram(Arc::clone(&x), vec![value; n])
                } else {
                    Spectrum::function(Arc::clone(&x), vec![value; n])
                };
                ds.push(
                    spectrum
                        .with_pixel(PixelRef::new(grid.id(), row as f64, col as f64))
                        .with_initial_path(L0)
                        .with_t0_shift(5.0),
                );
            }
        }
        ds
    }

    fn mapper_for<'a>(ds: &'a DataSet, grid: &DetectorGrid) -> QMapper<'a> {
        let mut store = GridStore::new();
        store.insert(grid.clone()).unwrap();
        let mut index = PixelIndex::new();
        QMapper::from_data_set(ds, &store, &mut index, 1).unwrap()
    }

    #[test]
    fn test_kinematic_round_trip() {
        let grid = side_grid();
        let mapper = QMapper::<Spectrum>::geometry_only(&grid, &orientation(), L0, 0.0).unwrap();
        for &(row, col) in &[(1.5, 2.0), (20.0, 70.0), (50.5, 50.5), (99.7, 2.2), (99.5, 99.0)] {
            let q = q_for_pixel(&grid, row, col, 4.0);
            let hit = mapper.map_q_to_row_col_tof(&q).unwrap();
            assert!((hit.row - row).abs() < 1e-3, "row {row} -> {}", hit.row);
            assert!((hit.col - col).abs() < 1e-3, "col {col} -> {}", hit.col);

            let pixel = grid.position(row, col);
            let expected = tof::tof_of_diffractometer_q(
                scattering_angle(&pixel),
                L0 + pixel.norm(),
                4.0,
            );
            assert_relative_eq!(hit.tof, expected, max_relative = 1e-9);
        }
    }

    #[test]
    fn test_fast_reject() {
        let grid = side_grid();
        let mapper = QMapper::<Spectrum>::geometry_only(&grid, &orientation(), L0, 0.0).unwrap();
        let q = mapper.q_center() * -3.0;
        assert!(mapper.map_q_to_row_col_tof(&q).is_none());
        let perpendicular = mapper.q_center().cross(&Vector3::z());
        assert!(mapper.map_q_to_row_col_tof(&perpendicular).is_none());
        assert!(mapper.min_q_dot() < 1.0);
    }

    #[test]
    fn test_positive_lab_qx_has_no_solution() {
        let grid = side_grid();
        // identity goniometer: sample and lab frames coincide
        let mapper =
            QMapper::<Spectrum>::geometry_only(&grid, &SampleOrientation::default(), L0, 0.0)
                .unwrap();
        for q in [
            Vector3::new(0.0, 2.0, 0.0),
            Vector3::new(1e-6, 2.0, 0.1),
            Vector3::new(3.0, 1.0, 0.0),
        ] {
            assert!(mapper.map_q_to_row_col_tof(&q).is_none());
        }
    }

    #[test]
    fn test_channel_lookup() {
        let grid = side_grid();
        let ds = flat_data_set(&grid, true);
        let mapper = mapper_for(&ds, &grid);
        assert!(mapper.has_shared_time_scale());
        assert_eq!(mapper.t0_shift(), 5.0);

        let q = q_for_pixel(&grid, 30.0, 40.0, 4.0);
        let hit = mapper.map_q_to_row_col_tof(&q).unwrap();
        let chan = mapper.map_q_to_row_col_channel(&q).unwrap();
        assert_relative_eq!(chan.channel, (hit.tof - 5.0) / 200.0, epsilon = 1e-9);
        assert_eq!(chan.row, hit.row);

        // |Q| small enough that the time runs past the last edge
        let slow = q_for_pixel(&grid, 30.0, 40.0, 0.01);
        assert!(mapper.map_q_to_row_col_tof(&slow).is_some());
        assert!(mapper.map_q_to_row_col_channel(&slow).is_none());
    }

    #[test]
    fn test_bilinear_intensity() {
        let grid = side_grid();
        for histogram in [true, false] {
            let ds = flat_data_set(&grid, histogram);
            let mapper = mapper_for(&ds, &grid);
            let q = q_for_pixel(&grid, 30.3, 40.8, 4.0);
            let hit = mapper.map_q_to_row_col_tof(&q).unwrap();
            let intensity = mapper.interpolated_intensity(&q);
            assert_relative_eq!(intensity, 10.0 * hit.row + hit.col, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_intensity_sentinels() {
        let grid = side_grid();
        let ds = flat_data_set(&grid, true);
        let mapper = mapper_for(&ds, &grid);
        // rounds to row 1 but sits below it: no row 0 neighbor
        let edge = q_for_pixel(&grid, 0.8, 40.0, 4.0);
        assert!(mapper.map_q_to_row_col_tof(&edge).is_some());
        assert_eq!(mapper.interpolated_intensity(&edge), NO_INTENSITY);

        let away = mapper.q_center() * -1.0;
        assert_eq!(mapper.interpolated_intensity(&away), NO_INTENSITY);

        let bare = QMapper::<Spectrum>::geometry_only(&grid, &orientation(), L0, 0.0).unwrap();
        let q = q_for_pixel(&grid, 30.3, 40.8, 4.0);
        assert!(bare.try_interpolated_intensity(&q).is_none());
        assert!(bare.map_q_to_row_col_channel(&q).is_none());
    }

    #[test]
    fn test_time_interpolation_edges() {
        let x = [0.0, 10.0, 20.0, 30.0, 40.0];
        let y = [1.0, 2.0, 4.0, 8.0];
        // first and last bins give nothing
        assert_eq!(time_interpolate(5.0, &x, &y, true), None);
        assert_eq!(time_interpolate(35.0, &x, &y, true), None);
        // below the center of bin 1: pair (0, 1), centers 5 and 15
        assert_relative_eq!(time_interpolate(12.0, &x, &y, true).unwrap(), 1.7, epsilon = 1e-12);
        // above the center of bin 2: pair (2, 3), centers 25 and 35
        assert_relative_eq!(time_interpolate(27.0, &x, &y, true).unwrap(), 4.8, epsilon = 1e-12);
        // function: samples at x
        let yf = [1.0, 2.0, 4.0, 8.0, 16.0];
        assert_relative_eq!(time_interpolate(15.0, &x, &yf, false).unwrap(), 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_straddle_start() {
        assert_eq!(straddle_start(3.2), 3);
        assert_eq!(straddle_start(3.7), 3);
        assert_eq!(straddle_start(3.5), 3);
        assert_eq!(straddle_start(3.0), 2);
    }

    #[test]
    fn test_q_to_xcm_ycm_wl() {
        let grid = side_grid();
        let mapper = QMapper::<Spectrum>::geometry_only(&grid, &orientation(), L0, 0.0).unwrap();
        let q = q_for_pixel(&grid, 50.5, 50.5, 2.0 * std::f64::consts::PI);
        let result = mapper.q_to_xcm_ycm_wl(&q).unwrap();
        assert_relative_eq!(result.x_cm, 0.0, epsilon = 1e-6);
        assert_relative_eq!(result.y_cm, 0.0, epsilon = 1e-6);
        assert_relative_eq!(result.wavelength, std::f64::consts::SQRT_2, epsilon = 1e-9);
    }

    #[test]
    fn test_from_data_set_errors() {
        let grid = side_grid();
        let mut store = GridStore::new();
        store.insert(grid.clone()).unwrap();
        let mut index = PixelIndex::new();

        let mut ds = flat_data_set(&grid, true);
        assert!(matches!(
            QMapper::from_data_set(&ds, &store, &mut index, 2),
            Err(Error::AreaDetectorNotFound(2))
        ));

        ds.x_units = "Energy(meV)".to_string();
        assert!(matches!(
            QMapper::from_data_set(&ds, &store, &mut index, 1),
            Err(Error::NotTimeOfFlight(_))
        ));

        let mut ds = flat_data_set(&grid, true);
        ds.orientation = None;
        assert!(matches!(
            QMapper::from_data_set(&ds, &store, &mut index, 1),
            Err(Error::MissingOrientation)
        ));

        let mut ds = flat_data_set(&grid, true);
        ds.spectra[0].initial_path = None;
        assert!(matches!(
            QMapper::from_data_set(&ds, &store, &mut index, 1),
            Err(Error::MissingInitialPath)
        ));

        let mut ds = flat_data_set(&grid, true);
        ds.spectra.pop();
        index.clear_all();
        assert!(matches!(
            QMapper::from_data_set(&ds, &store, &mut index, 1),
            Err(Error::IncompleteGrid(17))
        ));
    }

    #[test]
    fn test_index_rebound_for_each_data_set() {
        let grid = side_grid();
        let mut store = GridStore::new();
        store.insert(grid.clone()).unwrap();
        let mut index = PixelIndex::new();

        let first = flat_data_set(&grid, true);
        QMapper::from_data_set(&first, &store, &mut index, 1).unwrap();
        assert_eq!(index.entry(grid.id(), 1, 1), Some(0));

        // same pixels behind a leading monitor: every id shifts by one
        let mut second = DataSet::new(TOF_UNITS);
        second.orientation = first.orientation;
        let x = Arc::clone(first.spectra[0].x_scale());
        second.push(Spectrum::histogram(Arc::clone(&x), vec![-999.0; x.len() - 1]));
        second.spectra.extend(first.spectra.iter().cloned());

        let mapper = QMapper::from_data_set(&second, &store, &mut index, 1).unwrap();
        assert_eq!(index.entry(grid.id(), 1, 1), Some(1));
        let q = q_for_pixel(&grid, 2.4, 2.3, 4.0);
        assert!(mapper.map_q_to_row_col_tof(&q).is_some());
        let intensity = mapper.interpolated_intensity(&q);
        let hit = mapper.map_q_to_row_col_tof(&q).unwrap();
        assert_relative_eq!(intensity, 10.0 * hit.row + hit.col, epsilon = 1e-6);
    }

    #[test]
    fn test_pixel_count_checked() {
        let grid = side_grid();
        let result = QMapper::<Spectrum>::new(&grid, &orientation(), L0, 0.0, vec![None; 3]);
        assert!(matches!(
            result,
            Err(Error::PixelCountMismatch { expected: 10_000, found: 3 })
        ));
    }
}
