//! Goniometer orientation of the sample.

use nalgebra::{Rotation3, Vector3};
use serde::{Deserialize, Serialize};

/// Goniometer setting angles in degrees.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GoniometerAngles {
    #[serde(default)]
    pub phi: f64,
    #[serde(default)]
    pub chi: f64,
    #[serde(default)]
    pub omega: f64,
}

/// Rotation taking sample-fixed vectors to lab-fixed vectors, with its inverse.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SampleOrientation {
    rotation: Rotation3<f64>,
    inverse: Rotation3<f64>,
}

impl Default for SampleOrientation {
    fn default() -> Self {
        Self::from_rotation(Rotation3::identity())
    }
}

impl SampleOrientation {
    #[must_use]
    pub fn from_rotation(rotation: Rotation3<f64>) -> Self {
        Self {
            rotation,
            inverse: rotation.inverse(),
        }
    }

    /// Euler rotation `Rz(omega) * Rx(chi) * Rz(phi)`, angles in degrees.
    #[must_use]
    pub fn euler(phi: f64, chi: f64, omega: f64) -> Self {
        let rz_omega = Rotation3::from_axis_angle(&Vector3::z_axis(), omega.to_radians());
        let rx_chi = Rotation3::from_axis_angle(&Vector3::x_axis(), chi.to_radians());
        let rz_phi = Rotation3::from_axis_angle(&Vector3::z_axis(), phi.to_radians());
        Self::from_rotation(rz_omega * rx_chi * rz_phi)
    }

    /// IPNS single-crystal diffractometer convention (omega turns the other way).
    #[must_use]
    pub fn ipns_scd(phi: f64, chi: f64, omega: f64) -> Self {
        Self::euler(phi, chi, -omega)
    }

    #[must_use]
    pub fn from_angles(angles: GoniometerAngles) -> Self {
        Self::ipns_scd(angles.phi, angles.chi, angles.omega)
    }

    /// Sample frame to lab frame.
    #[must_use]
    pub fn goniometer_rotation(&self) -> &Rotation3<f64> {
        &self.rotation
    }

    /// Lab frame to sample frame.
    #[must_use]
    pub fn goniometer_rotation_inverse(&self) -> &Rotation3<f64> {
        &self.inverse
    }

    #[must_use]
    pub fn to_lab(&self, v: &Vector3<f64>) -> Vector3<f64> {
        self.rotation * v
    }

    #[must_use]
    pub fn to_sample(&self, v: &Vector3<f64>) -> Vector3<f64> {
        self.inverse * v
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_inverse_roundtrip() {
        let orientation = SampleOrientation::euler(20.0, 30.0, 40.0);
        let v = Vector3::new(0.3, -1.2, 2.5);
        let back = orientation.to_sample(&orientation.to_lab(&v));
        assert_relative_eq!(back, v, epsilon = 1e-12);
    }

    #[test]
    fn test_pure_omega_rotation() {
        let orientation = SampleOrientation::euler(0.0, 0.0, 90.0);
        let lab = orientation.to_lab(&Vector3::x());
        assert_relative_eq!(lab, Vector3::y(), epsilon = 1e-12);

        let ipns = SampleOrientation::ipns_scd(0.0, 0.0, 90.0);
        assert_relative_eq!(ipns.to_lab(&Vector3::x()), -Vector3::y(), epsilon = 1e-12);
    }

    #[test]
    fn test_chi_rotates_about_x() {
        let orientation = SampleOrientation::euler(0.0, 90.0, 0.0);
        assert_relative_eq!(orientation.to_lab(&Vector3::y()), Vector3::z(), epsilon = 1e-12);
        assert_relative_eq!(orientation.to_lab(&Vector3::x()), Vector3::x(), epsilon = 1e-12);
    }
}
