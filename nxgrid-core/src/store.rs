//! Grid arena and the pixel-to-spectrum index.
//!
//! Grids never point at spectra directly. A [`GridStore`] owns the grids by
//! id, and a [`PixelIndex`] records which spectrum of a [`DataSet`] was
//! measured by each `(grid, row, col)` cell. The index is built by an explicit
//! bind pass and is read-only afterwards.

use crate::grid::{round_half_up, DetectorGrid, GridId};
use crate::spectrum::{DataSet, SpectrumId};
use crate::{Error, Result};
use log::{debug, warn};
use std::collections::{BTreeMap, HashMap};

/// Owns detector grids keyed by id.
#[derive(Clone, Debug, Default)]
pub struct GridStore {
    grids: BTreeMap<GridId, DetectorGrid>,
}

impl GridStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a grid.
    ///
    /// # Errors
    /// Returns [`Error::DuplicateGrid`] if the id is already taken.
    pub fn insert(&mut self, grid: DetectorGrid) -> Result<()> {
        let id = grid.id();
        if self.grids.contains_key(&id) {
            return Err(Error::DuplicateGrid(id));
        }
        self.grids.insert(id, grid);
        Ok(())
    }

    #[must_use]
    pub fn get(&self, id: GridId) -> Option<&DetectorGrid> {
        self.grids.get(&id)
    }

    /// Mutable access for in-place geometry changes.
    pub fn get_mut(&mut self, id: GridId) -> Option<&mut DetectorGrid> {
        self.grids.get_mut(&id)
    }

    pub fn remove(&mut self, id: GridId) -> Option<DetectorGrid> {
        self.grids.remove(&id)
    }

    /// Grids in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = &DetectorGrid> {
        self.grids.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.grids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.grids.is_empty()
    }
}

#[derive(Clone, Debug)]
struct GridBinding {
    n_rows: usize,
    n_cols: usize,
    // row-major, (row - 1) * n_cols + (col - 1)
    cells: Vec<Option<SpectrumId>>,
    loaded: bool,
}

impl GridBinding {
    fn new(grid: &DetectorGrid) -> Self {
        Self {
            n_rows: grid.num_rows(),
            n_cols: grid.num_cols(),
            cells: vec![None; grid.num_points()],
            loaded: false,
        }
    }

    #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
    fn slot(&self, row: i64, col: i64) -> Option<usize> {
        if row < 1 || col < 1 {
            return None;
        }
        let (row, col) = (row as usize, col as usize);
        if row > self.n_rows || col > self.n_cols {
            return None;
        }
        Some((row - 1) * self.n_cols + (col - 1))
    }

    fn refresh_loaded(&mut self) -> bool {
        self.loaded = self.cells.iter().all(Option::is_some);
        self.loaded
    }
}

/// Maps `(grid id, row, col)` to the spectrum recorded at that pixel.
#[derive(Clone, Debug, Default)]
pub struct PixelIndex {
    bindings: HashMap<GridId, GridBinding>,
}

impl PixelIndex {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds the pixels of one grid to the spectra of `data_set`.
    ///
    /// Pixel references to other grids, and references whose rounded row or
    /// column fall outside the grid, are ignored. Any previous binding of this
    /// grid is replaced. Returns true when every cell of the grid received a
    /// spectrum. An empty data set binds nothing and returns false.
    pub fn bind_grid(&mut self, grid: &DetectorGrid, data_set: &DataSet) -> bool {
        if data_set.is_empty() {
            return false;
        }
        let mut binding = GridBinding::new(grid);
        for (id, spectrum) in data_set.spectra.iter().enumerate() {
            let Some(pixels) = spectrum.pixels() else {
                continue;
            };
            for pixel in pixels.iter().filter(|p| p.grid_id == grid.id()) {
                let row = round_half_up(pixel.row);
                let col = round_half_up(pixel.col);
                if let Some(slot) = binding.slot(row, col) {
                    binding.cells[slot] = Some(id);
                }
            }
        }
        let loaded = binding.refresh_loaded();
        if !loaded {
            let missing = binding.cells.iter().filter(|c| c.is_none()).count();
            warn!("grid {} bound with {missing} unassigned pixels", grid.id());
        }
        self.bindings.insert(grid.id(), binding);
        loaded
    }

    /// Binds every pixel reference of every spectrum, across all grids.
    ///
    /// Existing bindings are discarded first. Returns false if some spectrum
    /// carries no pixel list (those spectra cannot be placed on any grid).
    ///
    /// # Errors
    /// Returns an error if a pixel names a grid missing from `store`, or a
    /// row/column outside its grid.
    pub fn bind_all(&mut self, store: &GridStore, data_set: &DataSet) -> Result<bool> {
        self.bindings.clear();
        if data_set.is_empty() {
            return Ok(false);
        }

        let mut complete = true;
        for (id, spectrum) in data_set.spectra.iter().enumerate() {
            let Some(pixels) = spectrum.pixels() else {
                complete = false;
                continue;
            };
            for pixel in pixels {
                let grid = store
                    .get(pixel.grid_id)
                    .ok_or(Error::UnknownGrid(pixel.grid_id))?;
                let binding = self
                    .bindings
                    .entry(grid.id())
                    .or_insert_with(|| GridBinding::new(grid));
                let row = round_half_up(pixel.row);
                let col = round_half_up(pixel.col);
                let slot = binding.slot(row, col).ok_or(Error::PixelOutOfRange {
                    grid: grid.id(),
                    row,
                    col,
                })?;
                binding.cells[slot] = Some(id);
            }
        }

        for (grid_id, binding) in &mut self.bindings {
            if !binding.refresh_loaded() {
                warn!("grid {grid_id} is not fully covered by the data set");
            }
        }
        debug!("bound {} grids", self.bindings.len());
        Ok(complete)
    }

    /// Spectrum recorded at an integer pixel, if bound.
    #[must_use]
    pub fn entry(&self, grid_id: GridId, row: i64, col: i64) -> Option<SpectrumId> {
        let binding = self.bindings.get(&grid_id)?;
        binding.cells[binding.slot(row, col)?]
    }

    /// True when every cell of the grid is bound to a spectrum.
    #[must_use]
    pub fn is_loaded(&self, grid_id: GridId) -> bool {
        self.bindings.get(&grid_id).is_some_and(|b| b.loaded)
    }

    /// Drops the binding of one grid.
    pub fn clear(&mut self, grid_id: GridId) {
        self.bindings.remove(&grid_id);
    }

    pub fn clear_all(&mut self) {
        self.bindings.clear();
    }
}
