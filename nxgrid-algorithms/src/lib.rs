//! nxgrid-algorithms: inverse kinematics for time-of-flight area detectors.
//!
//! Given a momentum-transfer vector Q in the sample frame, find where and
//! when an elastically scattered neutron is recorded:
//! - **Pixel and time-of-flight** by tracing the scattered ray onto a grid
//! - **Time channel** by bin lookup in the pixel's time scale
//! - **Intensity** by interpolating in time, then bilinearly over the pixels
//!
#![warn(missing_docs)]

mod batch;
mod error;
pub mod lab;
pub mod lookup;
mod mapper;

pub use batch::locate_q;
pub use error::{Error, Result};
pub use lookup::{bin_index, fractional_index};
pub use mapper::{QMapper, RowColChannel, RowColTof, XyWavelength, NO_INTENSITY};
