//! HDF5/NeXus datasets as slab stores.

use crate::element::{with_vec, ElementType, RawArray};
use crate::source::{check_slab, DatasetInfo, SlabSource};
use crate::{Error, Result};
use hdf5::types::{FloatSize, H5Type, IntSize, TypeDescriptor};
use hdf5::{Dataset, File, Group};
use ndarray::{IxDyn, SliceInfo, SliceInfoElem};
use std::path::Path;

/// One dataset of an open HDF5 file.
pub struct Hdf5Source {
    _file: File,
    dataset: Dataset,
    info: DatasetInfo,
}

impl Hdf5Source {
    /// Opens `dataset_path` (e.g. `/entry/bank17/data`) in the file at `path`.
    ///
    /// # Errors
    /// Returns an error if the file or dataset cannot be opened, or the
    /// element type is not supported.
    pub fn open<P: AsRef<Path>>(path: P, dataset_path: &str) -> Result<Self> {
        let file = File::open(path)?;
        let dataset = file.dataset(dataset_path)?;
        let info = DatasetInfo {
            dims: dataset.shape(),
            element_type: element_type(&dataset)?,
        };
        Ok(Self {
            _file: file,
            dataset,
            info,
        })
    }

    fn check_type(&self, out: &RawArray) -> Result<()> {
        if out.element_type() == self.info.element_type {
            Ok(())
        } else {
            Err(Error::TypeMismatch {
                expected: self.info.element_type,
                found: out.element_type(),
            })
        }
    }
}

impl SlabSource for Hdf5Source {
    fn info(&mut self) -> Result<DatasetInfo> {
        Ok(self.info.clone())
    }

    fn read_all(&mut self, out: &mut RawArray) -> Result<()> {
        self.check_type(out)?;
        let dataset = &self.dataset;
        with_vec!(out, v => read_all_into(dataset, v))
    }

    fn read_slab(&mut self, start: &[usize], size: &[usize], out: &mut RawArray) -> Result<()> {
        let count = check_slab(&self.info.dims, start, size)?;
        self.check_type(out)?;
        if out.len() < count {
            return Err(Error::ShortRead {
                expected: count,
                found: out.len(),
            });
        }
        let selection = hyperslab(start, size)?;
        let dataset = &self.dataset;
        with_vec!(out, v => read_slab_into(dataset, selection, v))
    }
}

fn element_type(dataset: &Dataset) -> Result<ElementType> {
    let descriptor = dataset.dtype()?.to_descriptor()?;
    let element_type = match descriptor {
        TypeDescriptor::Integer(IntSize::U1) => ElementType::Int8,
        TypeDescriptor::Integer(IntSize::U2) => ElementType::Int16,
        TypeDescriptor::Integer(IntSize::U4) => ElementType::Int32,
        TypeDescriptor::Integer(IntSize::U8) => ElementType::Int64,
        TypeDescriptor::Unsigned(IntSize::U1) => ElementType::UInt8,
        TypeDescriptor::Unsigned(IntSize::U2) => ElementType::UInt16,
        TypeDescriptor::Unsigned(IntSize::U4) => ElementType::UInt32,
        TypeDescriptor::Float(FloatSize::U4) => ElementType::Float32,
        TypeDescriptor::Float(FloatSize::U8) => ElementType::Float64,
        other => return Err(Error::UnsupportedType(format!("{other:?}"))),
    };
    Ok(element_type)
}

type SlabSelection = SliceInfo<Vec<SliceInfoElem>, IxDyn, IxDyn>;

fn hyperslab(start: &[usize], size: &[usize]) -> Result<SlabSelection> {
    let to_isize = |v: usize| {
        isize::try_from(v).map_err(|_| Error::InvalidSlab(format!("index {v} out of range")))
    };
    let elems = start
        .iter()
        .zip(size)
        .map(|(&s, &n)| {
            Ok(SliceInfoElem::Slice {
                start: to_isize(s)?,
                end: Some(to_isize(s + n)?),
                step: 1,
            })
        })
        .collect::<Result<Vec<_>>>()?;
    SliceInfo::try_from(elems).map_err(|e| Error::InvalidSlab(e.to_string()))
}

fn read_all_into<T: H5Type + Copy>(dataset: &Dataset, out: &mut [T]) -> Result<()> {
    let data = dataset.read_raw::<T>()?;
    if data.len() != out.len() {
        return Err(Error::ShortRead {
            expected: out.len(),
            found: data.len(),
        });
    }
    out.copy_from_slice(&data);
    Ok(())
}

fn read_slab_into<T: H5Type + Copy>(
    dataset: &Dataset,
    selection: SlabSelection,
    out: &mut [T],
) -> Result<()> {
    let block = dataset.read_slice::<T, _, IxDyn>(selection)?;
    if block.len() > out.len() {
        return Err(Error::ShortRead {
            expected: block.len(),
            found: out.len(),
        });
    }
    for (dst, &src) in out.iter_mut().zip(block.iter()) {
        *dst = src;
    }
    Ok(())
}

/// Absolute paths of every dataset in the file, depth first.
///
/// # Errors
/// Returns an error if the file cannot be opened or a group cannot be listed.
pub fn dataset_paths<P: AsRef<Path>>(path: P) -> Result<Vec<String>> {
    let file = File::open(path)?;
    let mut paths = Vec::new();
    collect_datasets(&file, "", &mut paths)?;
    Ok(paths)
}

fn collect_datasets(group: &Group, prefix: &str, paths: &mut Vec<String>) -> Result<()> {
    for name in group.member_names()? {
        let path = format!("{prefix}/{name}");
        if let Ok(child) = group.group(&name) {
            collect_datasets(&child, &path, paths)?;
        } else if group.dataset(&name).is_ok() {
            paths.push(path);
        }
    }
    Ok(())
}
