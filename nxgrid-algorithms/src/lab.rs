//! Elastic scattering geometry in the lab frame.
//!
//! The incident beam travels along +x and the sample sits at the origin. For
//! elastic scattering `|k| = |k'|` and `Q = k' - k`, which gives
//! `|k| = -|Q|^2 / (2 Q.x)`; a solution exists only for `Q.x < 0`.
//!
//! The free functions here need only a grid: no goniometer, no data and no
//! fast reject.

use nalgebra::Vector3;
use nxgrid_core::{round_half_up, tof, DetectorGrid};

/// Average of the two opposite corner pixels.
#[must_use]
pub fn detector_center(grid: &DetectorGrid) -> Vector3<f64> {
    #[allow(clippy::cast_precision_loss)]
    let far = grid.position(grid.num_rows() as f64, grid.num_cols() as f64);
    (grid.position(1.0, 1.0) + far) * 0.5
}

/// Scattering angle (2-theta) of a point seen from the sample.
pub(crate) fn scattering_angle(point: &Vector3<f64>) -> f64 {
    let cos = point.x / point.norm();
    cos.clamp(-1.0, 1.0).acos()
}

/// Where a scattered ray crosses a grid.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct PlaneHit {
    pub row: f64,
    pub col: f64,
    pub point: Vector3<f64>,
}

/// Follows the scattered ray for `q_lab` onto the plane of `grid`.
///
/// `None` when `Q.x >= 0`, the ray misses the plane, or the rounded pixel
/// falls off the grid.
pub(crate) fn trace_to_grid(
    q_lab: &Vector3<f64>,
    grid: &DetectorGrid,
    center: &Vector3<f64>,
) -> Option<PlaneHit> {
    if q_lab.x >= 0.0 {
        return None;
    }
    let mag_k = -q_lab.norm_squared() / (2.0 * q_lab.x);
    let k_prime = Vector3::new(q_lab.x + mag_k, q_lab.y, q_lab.z);
    let normal = grid.z_vec();
    let t = center.dot(&normal) / k_prime.dot(&normal);
    if t.is_nan() || t <= 0.0 {
        return None;
    }

    let point = k_prime * t;
    let offset = point - center;
    let u = offset.dot(&grid.x_vec());
    let v = offset.dot(&grid.y_vec());
    let row = grid.row(u, v);
    let col = grid.col(u, v);
    if !grid.contains(round_half_up(row), round_half_up(col)) {
        return None;
    }
    Some(PlaneHit { row, col, point })
}

/// Fractional `(row, col)` hit by lab-frame `q_lab`.
#[must_use]
pub fn row_col_of_lab_q(q_lab: &Vector3<f64>, grid: &DetectorGrid) -> Option<(f64, f64)> {
    let hit = trace_to_grid(q_lab, grid, &detector_center(grid))?;
    Some((hit.row, hit.col))
}

/// In-plane offsets (cm) from the grid center of the pixel hit by `q_lab`.
#[must_use]
pub fn xcm_ycm_of_lab_q(q_lab: &Vector3<f64>, grid: &DetectorGrid) -> Option<(f64, f64)> {
    let (row, col) = row_col_of_lab_q(q_lab, grid)?;
    Some((grid.x(row, col) * 100.0, grid.y(row, col) * 100.0))
}

/// Time-of-flight (us) at which `q_lab` is recorded on `grid`.
///
/// Angle and flight path are taken at the fractional pixel position.
#[must_use]
pub fn tof_of_lab_q(q_lab: &Vector3<f64>, grid: &DetectorGrid, initial_path: f64) -> Option<f64> {
    let (row, col) = row_col_of_lab_q(q_lab, grid)?;
    let pixel = grid.position(row, col);
    Some(tof::tof_of_diffractometer_q(
        scattering_angle(&pixel),
        initial_path + pixel.norm(),
        q_lab.norm(),
    ))
}

/// Wavelength (Angstrom) at which `q_lab` is recorded on `grid`.
#[must_use]
pub fn wavelength_of_lab_q(
    q_lab: &Vector3<f64>,
    grid: &DetectorGrid,
    initial_path: f64,
) -> Option<f64> {
    let (row, col) = row_col_of_lab_q(q_lab, grid)?;
    let tof_us = tof_of_lab_q(q_lab, grid, initial_path)?;
    let path = initial_path + grid.position(row, col).norm();
    Some(tof::wavelength(path, tof_us))
}
