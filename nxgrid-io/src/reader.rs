//! Chunked retrieval of whole N-dimensional arrays.

use crate::config::ReaderConfig;
use crate::element::{ElementType, RawArray};
use crate::plan::{BlockingPlan, MAX_RANK};
use crate::source::{DatasetInfo, SlabSource};
use crate::{Error, Result};
use log::{debug, trace};

/// A fully read array.
///
/// Unsigned integer data has already been widened (see
/// [`ElementType::widened`]); [`Self::stored_type`] keeps the type found in
/// the store.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeValue {
    dims: Vec<usize>,
    stored_type: ElementType,
    data: RawArray,
}

impl NodeValue {
    #[must_use]
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    #[must_use]
    pub fn stored_type(&self) -> ElementType {
        self.stored_type
    }

    #[must_use]
    pub fn data(&self) -> &RawArray {
        &self.data
    }

    #[must_use]
    pub fn into_data(self) -> RawArray {
        self.data
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Character data decoded as text, with trailing NULs removed.
    #[must_use]
    pub fn as_text(&self) -> Option<String> {
        match &self.data {
            RawArray::Char(bytes) => {
                let end = bytes.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
                Some(String::from_utf8_lossy(&bytes[..end]).into_owned())
            }
            _ => None,
        }
    }

    #[must_use]
    pub fn to_f64_vec(&self) -> Vec<f64> {
        self.data.to_f64_vec()
    }
}

fn checked_info<S: SlabSource + ?Sized>(source: &mut S) -> Result<DatasetInfo> {
    let info = source.info()?;
    if info.rank() == 0 {
        return Err(Error::NoData);
    }
    if info.rank() > MAX_RANK {
        return Err(Error::RankTooLarge(info.rank()));
    }
    Ok(info)
}

fn finish(info: DatasetInfo, data: RawArray) -> NodeValue {
    NodeValue {
        dims: info.dims,
        stored_type: info.element_type,
        data: data.widen(),
    }
}

/// Reads the whole array, in slabs of at most `max(dims[last], budget)`
/// elements when `blob_budget` is set.
///
/// Any failing request aborts the read; no partial array is returned.
///
/// # Errors
/// Returns [`Error::NoData`] for rank 0, [`Error::RankTooLarge`] above
/// [`MAX_RANK`], or the first error reported by the store.
pub fn read_chunked<S: SlabSource + ?Sized>(
    source: &mut S,
    blob_budget: Option<usize>,
) -> Result<NodeValue> {
    let info = checked_info(source)?;
    let total = info.len();
    let mut array = RawArray::zeros(info.element_type, total);

    let plan = blob_budget.and_then(|budget| BlockingPlan::for_budget(&info.dims, budget));
    match plan {
        None => {
            debug!("reading {:?} {} in one request", info.dims, info.element_type);
            source.read_all(&mut array)?;
        }
        Some(plan) => {
            debug!(
                "reading {:?} {} in slabs: split dim {:?}, step {}, buffer {}",
                info.dims,
                info.element_type,
                plan.split_dimension(),
                plan.step(),
                plan.buffer_len()
            );
            let mut buffer = RawArray::zeros(info.element_type, plan.buffer_len());
            for slab in plan.slabs() {
                trace!("slab start {:?} size {:?}", slab.start, slab.size);
                source.read_slab(&slab.start, &slab.size, &mut buffer)?;
                array.copy_from(slab.offset, &buffer, slab.len)?;
            }
        }
    }
    Ok(finish(info, array))
}

/// Reads the whole array in a single request.
///
/// # Errors
/// Same as [`read_chunked`].
pub fn read_whole<S: SlabSource + ?Sized>(source: &mut S) -> Result<NodeValue> {
    read_chunked(source, None)
}

/// A store paired with a resolved blob budget.
#[derive(Debug)]
pub struct ChunkedReader<S> {
    source: S,
    blob_budget: Option<usize>,
}

impl<S: SlabSource> ChunkedReader<S> {
    /// Resolves the budget from `config` once for all later reads.
    ///
    /// # Errors
    /// Returns an error if the budget cannot be resolved.
    pub fn new(source: S, config: &ReaderConfig) -> Result<Self> {
        let blob_budget = config.resolve_blob_budget()?;
        debug!("blob budget: {blob_budget:?}");
        Ok(Self {
            source,
            blob_budget,
        })
    }

    #[must_use]
    pub fn blob_budget(&self) -> Option<usize> {
        self.blob_budget
    }

    /// Describes the stored array.
    ///
    /// # Errors
    /// Returns an error if the store cannot describe the array.
    pub fn info(&mut self) -> Result<DatasetInfo> {
        self.source.info()
    }

    /// Slab plan the next [`Self::read`] would follow; `None` for a
    /// single whole-array request.
    ///
    /// # Errors
    /// Returns an error if the store cannot describe the array.
    pub fn plan(&mut self) -> Result<Option<BlockingPlan>> {
        let info = checked_info(&mut self.source)?;
        Ok(self
            .blob_budget
            .and_then(|budget| BlockingPlan::for_budget(&info.dims, budget)))
    }

    /// Reads the whole array under the resolved budget.
    ///
    /// # Errors
    /// See [`read_chunked`].
    pub fn read(&mut self) -> Result<NodeValue> {
        read_chunked(&mut self.source, self.blob_budget)
    }

    /// Reads the whole array in one request, ignoring the budget.
    ///
    /// # Errors
    /// See [`read_chunked`].
    pub fn read_whole(&mut self) -> Result<NodeValue> {
        read_whole(&mut self.source)
    }

    pub fn into_inner(self) -> S {
        self.source
    }
}
