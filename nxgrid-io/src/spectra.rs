//! Per-pixel spectra from a detector counts array.

use crate::reader::NodeValue;
use crate::Result;
use nxgrid_core::{DataSet, DetectorGrid, Error as CoreError, PixelRef, Spectrum};
use std::sync::Arc;

/// Appends one spectrum per pixel of `grid` to `data_set`.
///
/// `counts` has shape `[n_rows, n_cols, n_tof]` and `tof` holds either
/// `n_tof + 1` bin edges (histograms) or `n_tof` sample points (functions).
/// All new spectra share one x scale. Returns the id of the first spectrum
/// pushed; pixel `(row, col)` (1-based) gets id
/// `first + (row - 1) * n_cols + (col - 1)`.
///
/// # Errors
/// Returns an error if the shapes do not match the grid or each other.
#[allow(clippy::cast_precision_loss)]
pub fn push_grid_spectra(
    data_set: &mut DataSet,
    grid: &DetectorGrid,
    counts: &NodeValue,
    tof: &NodeValue,
) -> Result<usize> {
    let dims = counts.dims();
    if dims.len() != 3 || dims[0] != grid.num_rows() || dims[1] != grid.num_cols() || dims[2] == 0 {
        return Err(CoreError::InvalidDataSet(format!(
            "counts shape {dims:?} does not match grid {} ({}x{}xN)",
            grid.id(),
            grid.num_rows(),
            grid.num_cols()
        ))
        .into());
    }
    let n_tof = dims[2];
    let x_values: Arc<[f64]> = Arc::from(tof.to_f64_vec());
    let histogram = if x_values.len() == n_tof + 1 {
        true
    } else if x_values.len() == n_tof {
        false
    } else {
        return Err(CoreError::InvalidDataSet(format!(
            "{} time-of-flight values for {n_tof} channels",
            x_values.len()
        ))
        .into());
    };

    let values = counts.to_f64_vec();
    let first = data_set.len();
    for (pixel, y) in values.chunks_exact(n_tof).enumerate() {
        let row = pixel / grid.num_cols() + 1;
        let col = pixel % grid.num_cols() + 1;
        let y = y.to_vec();
        let spectrum = if histogram {
            Spectrum::histogram(Arc::clone(&x_values), y)
        } else {
            Spectrum::function(Arc::clone(&x_values), y)
        };
        data_set.push(spectrum.with_pixel(PixelRef::new(grid.id(), row as f64, col as f64)));
    }
    Ok(first)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::RawArray;
    use crate::reader::read_whole;
    use crate::source::MemorySource;
    use nxgrid_core::{PixelIndex, SpectrumBlock, TOF_UNITS};

    fn node(dims: Vec<usize>, data: RawArray) -> NodeValue {
        read_whole(&mut MemorySource::new(dims, data).unwrap()).unwrap()
    }

    #[test]
    fn test_push_grid_spectra() {
        let grid = DetectorGrid::new(3, "m", 2, 3).unwrap();
        let counts = node(vec![2, 3, 2], RawArray::UInt32((0..12).collect()));
        let edges = node(vec![3], RawArray::Float64(vec![1000.0, 2000.0, 3000.0]));

        let mut ds = DataSet::new(TOF_UNITS);
        let first = push_grid_spectra(&mut ds, &grid, &counts, &edges).unwrap();
        assert_eq!(first, 0);
        assert_eq!(ds.len(), 6);

        let last = ds.get(5).unwrap();
        assert!(last.is_histogram());
        assert_eq!(last.y_values(), &[10.0, 11.0]);
        assert!(Arc::ptr_eq(ds.get(0).unwrap().x_scale(), last.x_scale()));

        let mut index = PixelIndex::new();
        assert!(index.bind_grid(&grid, &ds));
        assert_eq!(index.entry(3, 2, 1), Some(3));
    }

    #[test]
    fn test_shape_mismatch() {
        let grid = DetectorGrid::new(3, "m", 2, 2).unwrap();
        let counts = node(vec![2, 3, 2], RawArray::Int32(vec![0; 12]));
        let edges = node(vec![3], RawArray::Float64(vec![0.0, 1.0, 2.0]));
        let mut ds = DataSet::new(TOF_UNITS);
        assert!(push_grid_spectra(&mut ds, &grid, &counts, &edges).is_err());

        let grid = DetectorGrid::new(3, "m", 2, 3).unwrap();
        let points = node(vec![5], RawArray::Float64(vec![0.0; 5]));
        assert!(push_grid_spectra(&mut ds, &grid, &counts, &points).is_err());
        assert!(ds.is_empty());
    }
}
