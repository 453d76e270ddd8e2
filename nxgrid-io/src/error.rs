//! I/O error types.

use crate::element::ElementType;
use thiserror::Error;

/// Result type for I/O operations.
pub type Result<T> = std::result::Result<T, Error>;

/// I/O error types.
#[derive(Error, Debug)]
pub enum Error {
    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HDF5 library error.
    #[cfg(feature = "hdf5")]
    #[error("HDF5 error: {0}")]
    Hdf5(#[from] hdf5::Error),

    /// The node holds no array data (scalar or empty shape).
    #[error("node holds no array data")]
    NoData,

    /// Element type the reader cannot represent.
    #[error("unsupported element type: {0}")]
    UnsupportedType(String),

    /// More dimensions than the reader supports.
    #[error("rank {0} exceeds the supported maximum of {max}", max = crate::plan::MAX_RANK)]
    RankTooLarge(usize),

    /// Buffer type does not match the dataset type.
    #[error("element type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: ElementType,
        found: ElementType,
    },

    /// Store delivered fewer elements than requested.
    #[error("short read: expected {expected} elements, found {found}")]
    ShortRead { expected: usize, found: usize },

    /// Slab request outside the dataset or the destination buffer.
    #[error("invalid slab: {0}")]
    InvalidSlab(String),

    /// Invalid reader configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Failure reported by a backing store.
    #[error("backend error: {0}")]
    Backend(String),

    /// Core library error.
    #[error("core error: {0}")]
    CoreError(#[from] nxgrid_core::Error),
}
