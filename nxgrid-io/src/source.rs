//! Backing stores that serve whole arrays or rectangular slabs.

use crate::element::{with_vec_pair, ElementType, RawArray};
use crate::plan::MAX_RANK;
use crate::{Error, Result};

/// Shape and element type of a stored array.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DatasetInfo {
    pub dims: Vec<usize>,
    pub element_type: ElementType,
}

impl DatasetInfo {
    #[must_use]
    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    /// Total element count.
    #[must_use]
    pub fn len(&self) -> usize {
        self.dims.iter().product()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stored size of the array in bytes.
    #[must_use]
    pub fn size_bytes(&self) -> usize {
        self.len() * self.element_type.size_bytes()
    }
}

/// A store holding one N-dimensional array.
///
/// Methods take `&mut self`: a store is a stateful cursor and is read by one
/// caller at a time.
pub trait SlabSource {
    /// Shape and element type of the array.
    ///
    /// # Errors
    /// Returns an error if the store cannot describe the array.
    fn info(&mut self) -> Result<DatasetInfo>;

    /// Reads the entire array into `out`, which holds exactly
    /// `info().len()` elements.
    ///
    /// # Errors
    /// Returns an error if the store fails or `out` has the wrong type.
    fn read_all(&mut self, out: &mut RawArray) -> Result<()>;

    /// Reads the block starting at `start` with extents `size` into the
    /// first `product(size)` elements of `out`, in row-major order.
    ///
    /// # Errors
    /// Returns an error if the store fails, the block lies outside the
    /// array, or `out` is too short or of the wrong type.
    fn read_slab(&mut self, start: &[usize], size: &[usize], out: &mut RawArray) -> Result<()>;
}

impl<S: SlabSource + ?Sized> SlabSource for &mut S {
    fn info(&mut self) -> Result<DatasetInfo> {
        (**self).info()
    }

    fn read_all(&mut self, out: &mut RawArray) -> Result<()> {
        (**self).read_all(out)
    }

    fn read_slab(&mut self, start: &[usize], size: &[usize], out: &mut RawArray) -> Result<()> {
        (**self).read_slab(start, size, out)
    }
}

/// Checks a slab request against the array shape and returns its element count.
///
/// # Errors
/// Returns [`Error::NoData`] for a rank-0 array, and [`Error::InvalidSlab`] if
/// the request has the wrong rank or leaves the array.
pub fn check_slab(dims: &[usize], start: &[usize], size: &[usize]) -> Result<usize> {
    if dims.is_empty() {
        return Err(Error::NoData);
    }
    if start.len() != dims.len() || size.len() != dims.len() {
        return Err(Error::InvalidSlab(format!(
            "rank mismatch: array rank {}, start rank {}, size rank {}",
            dims.len(),
            start.len(),
            size.len()
        )));
    }
    for (axis, ((&s, &n), &d)) in start.iter().zip(size).zip(dims).enumerate() {
        if !matches!(s.checked_add(n), Some(end) if end <= d) {
            return Err(Error::InvalidSlab(format!(
                "axis {axis}: {s}+{n} exceeds extent {d}"
            )));
        }
    }
    Ok(size.iter().product())
}

/// Copies a row-major block of `src` (shape `dims`) into the front of `dst`.
fn copy_block<T: Copy>(src: &[T], dims: &[usize], start: &[usize], size: &[usize], dst: &mut [T]) {
    let rank = dims.len();
    let run = size[rank - 1];
    let rows: usize = size[..rank - 1].iter().product();
    let mut idx = vec![0usize; rank - 1];
    for r in 0..rows {
        let mut flat = 0;
        for d in 0..rank - 1 {
            flat = flat * dims[d] + start[d] + idx[d];
        }
        flat = flat * dims[rank - 1] + start[rank - 1];
        dst[r * run..(r + 1) * run].copy_from_slice(&src[flat..flat + run]);

        for d in (0..rank - 1).rev() {
            idx[d] += 1;
            if idx[d] < size[d] {
                break;
            }
            idx[d] = 0;
        }
    }
}

/// Request observed by a [`MemorySource`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReadRequest {
    Whole,
    Slab { start: Vec<usize>, size: Vec<usize> },
}

/// Array held in memory; records every request it serves.
#[derive(Clone, Debug)]
pub struct MemorySource {
    info: DatasetInfo,
    data: RawArray,
    requests: Vec<ReadRequest>,
    fail_after: Option<usize>,
}

impl MemorySource {
    /// Wraps `data` with shape `dims`.
    ///
    /// # Errors
    /// Returns an error if the element count does not match `dims`, or the
    /// rank is above [`MAX_RANK`].
    pub fn new(dims: Vec<usize>, data: RawArray) -> Result<Self> {
        if dims.len() > MAX_RANK {
            return Err(Error::RankTooLarge(dims.len()));
        }
        let info = DatasetInfo {
            dims,
            element_type: data.element_type(),
        };
        if info.len() != data.len() {
            return Err(Error::ShortRead {
                expected: info.len(),
                found: data.len(),
            });
        }
        Ok(Self {
            info,
            data,
            requests: Vec::new(),
            fail_after: None,
        })
    }

    /// Fails every request after the first `reads` succeed.
    #[must_use]
    pub fn with_failure_after(mut self, reads: usize) -> Self {
        self.fail_after = Some(reads);
        self
    }

    /// Requests served so far, in order.
    #[must_use]
    pub fn requests(&self) -> &[ReadRequest] {
        &self.requests
    }

    fn begin(&mut self, request: ReadRequest) -> Result<()> {
        if self.fail_after.is_some_and(|n| self.requests.len() >= n) {
            return Err(Error::Backend(format!(
                "read {} refused by store",
                self.requests.len() + 1
            )));
        }
        self.requests.push(request);
        Ok(())
    }
}

impl SlabSource for MemorySource {
    fn info(&mut self) -> Result<DatasetInfo> {
        Ok(self.info.clone())
    }

    fn read_all(&mut self, out: &mut RawArray) -> Result<()> {
        self.begin(ReadRequest::Whole)?;
        let len = self.data.len();
        if out.len() != len {
            return Err(Error::ShortRead {
                expected: len,
                found: out.len(),
            });
        }
        out.copy_from(0, &self.data, len)
    }

    fn read_slab(&mut self, start: &[usize], size: &[usize], out: &mut RawArray) -> Result<()> {
        let count = check_slab(&self.info.dims, start, size)?;
        self.begin(ReadRequest::Slab {
            start: start.to_vec(),
            size: size.to_vec(),
        })?;
        if out.len() < count {
            return Err(Error::ShortRead {
                expected: count,
                found: out.len(),
            });
        }
        if count == 0 {
            return Ok(());
        }
        let expected = self.info.element_type;
        let found = out.element_type();
        let dims = &self.info.dims;
        with_vec_pair!(&self.data, out, (src, dst) => {
            copy_block(src, dims, start, size, dst);
            Ok(())
        }, _ => Err(Error::TypeMismatch { expected, found }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cube() -> MemorySource {
        let data: Vec<i32> = (0..24).collect();
        MemorySource::new(vec![2, 3, 4], RawArray::Int32(data)).unwrap()
    }

    #[test]
    fn test_read_slab_inner_block() {
        let mut source = cube();
        let mut out = RawArray::zeros(ElementType::Int32, 8);
        source.read_slab(&[1, 1, 1], &[1, 2, 2], &mut out).unwrap();
        // (1,1,1)=17 (1,1,2)=18 (1,2,1)=21 (1,2,2)=22
        assert_eq!(out, RawArray::Int32(vec![17, 18, 21, 22, 0, 0, 0, 0]));
        assert_eq!(
            source.requests(),
            &[ReadRequest::Slab {
                start: vec![1, 1, 1],
                size: vec![1, 2, 2]
            }]
        );
    }

    #[test]
    fn test_read_slab_rejects_bad_requests() {
        let mut source = cube();
        let mut out = RawArray::zeros(ElementType::Int32, 24);
        assert!(matches!(
            source.read_slab(&[1, 2, 0], &[1, 2, 4], &mut out),
            Err(Error::InvalidSlab(_))
        ));
        assert!(matches!(
            source.read_slab(&[0, 0], &[1, 1], &mut out),
            Err(Error::InvalidSlab(_))
        ));
        let mut short = RawArray::zeros(ElementType::Int32, 3);
        assert!(matches!(
            source.read_slab(&[0, 0, 0], &[1, 1, 4], &mut short),
            Err(Error::ShortRead { expected: 4, found: 3 })
        ));
        let mut wrong = RawArray::zeros(ElementType::Float64, 24);
        assert!(matches!(
            source.read_all(&mut wrong),
            Err(Error::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_scalar_slab_has_no_data() {
        let mut scalar = MemorySource::new(vec![], RawArray::Float64(vec![1.5])).unwrap();
        let mut out = RawArray::zeros(ElementType::Float64, 1);
        assert!(matches!(
            scalar.read_slab(&[], &[], &mut out),
            Err(Error::NoData)
        ));
        assert!(scalar.requests().is_empty());
        assert!(matches!(check_slab(&[], &[], &[]), Err(Error::NoData)));
    }

    #[test]
    fn test_new_validates_length() {
        assert!(matches!(
            MemorySource::new(vec![2, 2], RawArray::Int8(vec![1, 2, 3])),
            Err(Error::ShortRead { expected: 4, found: 3 })
        ));
        assert!(matches!(
            MemorySource::new(vec![1; 8], RawArray::Int8(vec![1])),
            Err(Error::RankTooLarge(8))
        ));
    }

    #[test]
    fn test_info_size_bytes() {
        let mut source = cube();
        assert_eq!(source.info().unwrap().size_bytes(), 96);
        let info = DatasetInfo {
            dims: vec![3, 5],
            element_type: ElementType::UInt16,
        };
        assert_eq!(info.size_bytes(), 30);
        let info = DatasetInfo {
            dims: vec![2, 0],
            element_type: ElementType::Float64,
        };
        assert_eq!(info.size_bytes(), 0);
    }

    #[test]
    fn test_failure_after() {
        let mut source = cube().with_failure_after(1);
        let mut out = RawArray::zeros(ElementType::Int32, 24);
        source.read_all(&mut out).unwrap();
        assert!(matches!(source.read_all(&mut out), Err(Error::Backend(_))));
    }
}
