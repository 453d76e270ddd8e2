//! Time-of-flight conversions for elastic scattering.
//!
//! Units: paths in meters, times in microseconds, wavelengths in Angstroms,
//! `Q` in inverse Angstroms, angles in radians.

use std::f64::consts::PI;

/// h / m_n expressed in Angstrom * m / us.
pub const ANGST_PER_US_PER_M: f64 = 3.956_058e-3;

/// Wavelength of a neutron covering `path_m` in `tof_us`.
#[must_use]
pub fn wavelength(path_m: f64, tof_us: f64) -> f64 {
    ANGST_PER_US_PER_M * tof_us / path_m
}

/// Time for a neutron of the given wavelength to cover `path_m`.
#[must_use]
pub fn tof_of_wavelength(wavelength_a: f64, path_m: f64) -> f64 {
    wavelength_a * path_m / ANGST_PER_US_PER_M
}

/// |Q| for a diffractometer event at scattering angle `angle_rad` (2-theta).
#[must_use]
pub fn diffractometer_q(angle_rad: f64, path_m: f64, tof_us: f64) -> f64 {
    let theta = (angle_rad / 2.0).abs();
    4.0 * PI * theta.sin() / wavelength(path_m, tof_us)
}

/// Time-of-flight at which |Q| is observed at scattering angle `angle_rad`.
#[must_use]
pub fn tof_of_diffractometer_q(angle_rad: f64, path_m: f64, q_inv_a: f64) -> f64 {
    let theta = (angle_rad / 2.0).abs();
    let wavelength_a = 4.0 * PI * theta.sin() / q_inv_a;
    tof_of_wavelength(wavelength_a, path_m)
}
