//! nxgrid-io: Chunked retrieval of N-dimensional NeXus arrays.
//!
//! Arrays are read from a [`SlabSource`] either in one request or in
//! hyperslabs bounded by a blob budget, then widened so unsigned integer data
//! keeps its full range. The HDF5 backend is behind the `hdf5` feature.
//!

pub mod config;
mod element;
mod error;
#[cfg(feature = "hdf5")]
pub mod hdf5;
pub mod plan;
mod reader;
pub mod source;
mod spectra;

pub use config::{BlobBudget, ReaderConfig, MIN_AUTO_BLOB_ELEMENTS, SLAB_SIZE_ENV};
pub use element::{ElementType, RawArray};
pub use error::{Error, Result};
#[cfg(feature = "hdf5")]
pub use hdf5::{dataset_paths, Hdf5Source};
pub use plan::{BlockingPlan, Slab, Slabs, MAX_RANK};
pub use reader::{read_chunked, read_whole, ChunkedReader, NodeValue};
pub use source::{DatasetInfo, MemorySource, ReadRequest, SlabSource};
pub use spectra::push_grid_spectra;
