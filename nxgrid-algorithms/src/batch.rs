//! Parallel queries over many Q vectors.
//!
//! A mapper is read-only after construction, so batches fan out with rayon
//! and results keep the input order.

use crate::mapper::{QMapper, RowColChannel, RowColTof};
use nalgebra::Vector3;
use nxgrid_core::SpectrumBlock;
use rayon::prelude::*;

impl<S: SpectrumBlock> QMapper<'_, S> {
    /// [`QMapper::map_q_to_row_col_tof`] for every vector in `qs`.
    #[must_use]
    pub fn map_batch(&self, qs: &[Vector3<f64>]) -> Vec<Option<RowColTof>> {
        qs.par_iter()
            .map(|q| self.map_q_to_row_col_tof(q))
            .collect()
    }

    /// [`QMapper::map_q_to_row_col_channel`] for every vector in `qs`.
    #[must_use]
    pub fn map_channel_batch(&self, qs: &[Vector3<f64>]) -> Vec<Option<RowColChannel>> {
        qs.par_iter()
            .map(|q| self.map_q_to_row_col_channel(q))
            .collect()
    }

    /// [`QMapper::interpolated_intensity`] for every vector in `qs`.
    #[must_use]
    pub fn intensities_batch(&self, qs: &[Vector3<f64>]) -> Vec<f64> {
        qs.par_iter()
            .map(|q| self.interpolated_intensity(q))
            .collect()
    }
}

/// First mapper (by position) that records `q`, with its pixel solution.
///
/// Detectors do not overlap in practice, so the first hit is the only one.
#[must_use]
pub fn locate_q<S: SpectrumBlock>(
    mappers: &[QMapper<'_, S>],
    q: &Vector3<f64>,
) -> Option<(usize, RowColTof)> {
    mappers
        .iter()
        .enumerate()
        .find_map(|(i, mapper)| mapper.map_q_to_row_col_tof(q).map(|hit| (i, hit)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lab::tests::{lab_q_for_pixel, side_grid};
    use nxgrid_core::{SampleOrientation, Spectrum};

    fn mirrored_grid() -> nxgrid_core::DetectorGrid {
        let mut grid = side_grid();
        grid.set_center(Vector3::new(0.0, -0.3, 0.0));
        grid
    }

    #[test]
    fn test_batch_matches_single_queries() {
        let grid = side_grid();
        let orientation = SampleOrientation::euler(10.0, 20.0, 30.0);
        let mapper = QMapper::<Spectrum>::geometry_only(&grid, &orientation, 9.0, 0.0).unwrap();
        let qs: Vec<_> = (1..40)
            .map(|i| {
                let row = f64::from(i) * 2.5;
                orientation.to_sample(&lab_q_for_pixel(&grid, row, 101.0 - row, 3.0))
            })
            .chain(std::iter::once(orientation.to_sample(&Vector3::new(5.0, 0.0, 0.0))))
            .collect();

        let batch = mapper.map_batch(&qs);
        assert_eq!(batch.len(), qs.len());
        for (q, result) in qs.iter().zip(&batch) {
            assert_eq!(*result, mapper.map_q_to_row_col_tof(q));
        }
        assert!(batch.last().unwrap().is_none());
        assert!(batch[..39].iter().all(Option::is_some));

        let intensities = mapper.intensities_batch(&qs);
        assert!(intensities.iter().all(|&v| v == crate::NO_INTENSITY));
        assert!(mapper.map_channel_batch(&qs).iter().all(Option::is_none));
    }

    #[test]
    fn test_locate_q_picks_the_detector_hit() {
        let orientation = SampleOrientation::default();
        let near = side_grid();
        let far = mirrored_grid();
        let mappers = vec![
            QMapper::<Spectrum>::geometry_only(&near, &orientation, 9.0, 0.0).unwrap(),
            QMapper::<Spectrum>::geometry_only(&far, &orientation, 9.0, 0.0).unwrap(),
        ];

        let q = lab_q_for_pixel(&far, 40.0, 60.0, 2.0);
        let (which, hit) = locate_q(&mappers, &q).unwrap();
        assert_eq!(which, 1);
        assert!((hit.row - 40.0).abs() < 1e-6);

        let q = lab_q_for_pixel(&near, 10.0, 10.0, 2.0);
        assert_eq!(locate_q(&mappers, &q).map(|(i, _)| i), Some(0));

        assert!(locate_q(&mappers, &Vector3::new(1.0, 0.0, 0.0)).is_none());
    }
}
