//! Uniform rectangular detector grids.
//!
//! A [`DetectorGrid`] is a flat rectangle of `n_rows x n_cols` equally sized
//! pixels with its own orthonormal frame (`x_vec`, `y_vec`, `z_vec`). Rows and
//! columns are 1-based: row 1, col 1 is a corner pixel, and the pixel centers
//! are arranged symmetrically about the grid center.

use crate::{Error, Result};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a detector grid.
pub type GridId = i32;

/// Rounds to the nearest integer, ties toward positive infinity.
#[inline]
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

/// Plain description of a grid, as stored in configuration files.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridGeometry {
    pub id: GridId,
    #[serde(default = "default_units")]
    pub units: String,
    pub center: [f64; 3],
    #[serde(default = "default_x_vector")]
    pub x_vector: [f64; 3],
    #[serde(default = "default_y_vector")]
    pub y_vector: [f64; 3],
    pub width: f64,
    pub height: f64,
    #[serde(default = "default_depth")]
    pub depth: f64,
    pub n_rows: usize,
    pub n_cols: usize,
}

fn default_units() -> String {
    "m".to_string()
}

fn default_x_vector() -> [f64; 3] {
    [1.0, 0.0, 0.0]
}

fn default_y_vector() -> [f64; 3] {
    [0.0, 1.0, 0.0]
}

fn default_depth() -> f64 {
    0.001
}

/// A uniform grid of detector pixels.
#[derive(Clone, Debug, PartialEq)]
pub struct DetectorGrid {
    id: GridId,
    units: String,
    center: Vector3<f64>,
    x_vec: Vector3<f64>,
    y_vec: Vector3<f64>,
    z_vec: Vector3<f64>,
    width: f64,
    height: f64,
    depth: f64,
    n_rows: usize,
    n_cols: usize,
    // per-pixel pitch
    dx: f64,
    dy: f64,
    // offsets from the center to the center of column 1 / row 1
    col_x_offset: f64,
    row_y_offset: f64,
}

impl DetectorGrid {
    /// Creates a unit-sized grid centered at the origin, facing +z.
    ///
    /// # Errors
    /// Returns an error if `n_rows` or `n_cols` is zero.
    pub fn new(id: GridId, units: impl Into<String>, n_rows: usize, n_cols: usize) -> Result<Self> {
        if n_rows == 0 || n_cols == 0 {
            return Err(Error::InvalidGridSize {
                rows: n_rows,
                cols: n_cols,
            });
        }
        let mut grid = Self {
            id,
            units: units.into(),
            center: Vector3::zeros(),
            x_vec: Vector3::x(),
            y_vec: Vector3::y(),
            z_vec: Vector3::z(),
            width: 1.0,
            height: 1.0,
            depth: 1.0,
            n_rows,
            n_cols,
            dx: 0.0,
            dy: 0.0,
            col_x_offset: 0.0,
            row_y_offset: 0.0,
        };
        grid.set_width(1.0)?;
        grid.set_height(1.0)?;
        Ok(grid)
    }

    /// Builds a grid from a stored description.
    ///
    /// # Errors
    /// Returns an error if the size, a dimension or the orientation is invalid.
    pub fn from_geometry(geometry: &GridGeometry) -> Result<Self> {
        let mut grid = Self::new(
            geometry.id,
            geometry.units.clone(),
            geometry.n_rows,
            geometry.n_cols,
        )?;
        grid.set_width(geometry.width)?;
        grid.set_height(geometry.height)?;
        grid.set_depth(geometry.depth)?;
        grid.set_center(Vector3::from(geometry.center));
        grid.set_orientation(
            &Vector3::from(geometry.x_vector),
            &Vector3::from(geometry.y_vector),
        )?;
        Ok(grid)
    }

    /// Returns the stored description of this grid.
    #[must_use]
    pub fn geometry(&self) -> GridGeometry {
        GridGeometry {
            id: self.id,
            units: self.units.clone(),
            center: self.center.into(),
            x_vector: self.x_vec.into(),
            y_vector: self.y_vec.into(),
            width: self.width,
            height: self.height,
            depth: self.depth,
            n_rows: self.n_rows,
            n_cols: self.n_cols,
        }
    }

    #[must_use]
    pub fn id(&self) -> GridId {
        self.id
    }

    #[must_use]
    pub fn units(&self) -> &str {
        &self.units
    }

    #[must_use]
    pub fn num_rows(&self) -> usize {
        self.n_rows
    }

    #[must_use]
    pub fn num_cols(&self) -> usize {
        self.n_cols
    }

    /// Total number of pixels.
    #[must_use]
    pub fn num_points(&self) -> usize {
        self.n_rows * self.n_cols
    }

    /// Center of the grid.
    #[must_use]
    pub fn center(&self) -> Vector3<f64> {
        self.center
    }

    #[must_use]
    pub fn x_vec(&self) -> Vector3<f64> {
        self.x_vec
    }

    #[must_use]
    pub fn y_vec(&self) -> Vector3<f64> {
        self.y_vec
    }

    /// Face normal of the grid.
    #[must_use]
    pub fn z_vec(&self) -> Vector3<f64> {
        self.z_vec
    }

    #[must_use]
    pub fn width(&self) -> f64 {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> f64 {
        self.height
    }

    #[must_use]
    pub fn depth(&self) -> f64 {
        self.depth
    }

    /// Width of one column.
    #[must_use]
    pub fn pixel_width(&self) -> f64 {
        self.dx
    }

    /// Height of one row.
    #[must_use]
    pub fn pixel_height(&self) -> f64 {
        self.dy
    }

    /// Depth of one pixel (the same as the grid depth).
    #[must_use]
    pub fn pixel_depth(&self) -> f64 {
        self.depth
    }

    /// Offset along `x_vec` from the grid center to a (fractional) pixel.
    #[inline]
    #[must_use]
    pub fn x(&self, _row: f64, col: f64) -> f64 {
        (col - 1.0) * self.dx + self.col_x_offset
    }

    /// Offset along `y_vec` from the grid center to a (fractional) pixel.
    #[inline]
    #[must_use]
    pub fn y(&self, row: f64, _col: f64) -> f64 {
        (row - 1.0) * self.dy + self.row_y_offset
    }

    /// Fractional row at the in-plane offset `(x, y)`.
    #[inline]
    #[must_use]
    pub fn row(&self, _x: f64, y: f64) -> f64 {
        (y - self.row_y_offset) / self.dy + 1.0
    }

    /// Fractional column at the in-plane offset `(x, y)`.
    #[inline]
    #[must_use]
    pub fn col(&self, x: f64, _y: f64) -> f64 {
        (x - self.col_x_offset) / self.dx + 1.0
    }

    /// Position of a (fractional) pixel center in the grid's coordinate system.
    #[must_use]
    pub fn position(&self, row: f64, col: f64) -> Vector3<f64> {
        self.center + self.x_vec * self.x(row, col) + self.y_vec * self.y(row, col)
    }

    /// True when integer `(row, col)` addresses a pixel of this grid.
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub fn contains(&self, row: i64, col: i64) -> bool {
        row >= 1 && row <= self.n_rows as i64 && col >= 1 && col <= self.n_cols as i64
    }

    /// Solid angle subtended by the pixel nearest `(row, col)`, seen from the origin.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn solid_angle(&self, row: f64, col: f64) -> f64 {
        let row = round_half_up(row) as f64;
        let col = round_half_up(col) as f64;
        let pos = self.position(row, col);
        let r = pos.norm();
        if r == 0.0 {
            return 0.0;
        }
        let cos_theta = (self.z_vec.dot(&pos) / r).abs();
        cos_theta * self.dx * self.dy / (r * r)
    }

    /// Angular extent (degrees) of the pixel diagonal, seen from the origin.
    #[must_use]
    pub fn delta_2theta(&self, row: f64, col: f64) -> f64 {
        let r = self.position(row, col).norm();
        if r == 0.0 {
            return 180.0;
        }
        let diagonal = self.dx.hypot(self.dy);
        (2.0 * (diagonal / 2.0 / r).atan()).to_degrees()
    }

    pub fn set_center(&mut self, center: Vector3<f64>) {
        self.center = center;
    }

    /// Sets the in-plane axes. `z_vec` becomes `normalize(x cross y)` and
    /// `y_vec` is re-derived as `z cross x`, so the stored frame is exactly
    /// orthonormal even when `x_vector` and `y_vector` are only roughly
    /// perpendicular.
    ///
    /// # Errors
    /// Returns [`Error::DegenerateOrientation`] if either vector is zero or
    /// they are parallel. The grid is left unchanged.
    pub fn set_orientation(&mut self, x_vector: &Vector3<f64>, y_vector: &Vector3<f64>) -> Result<()> {
        let x = x_vector
            .try_normalize(0.0)
            .ok_or(Error::DegenerateOrientation)?;
        let y = y_vector
            .try_normalize(0.0)
            .ok_or(Error::DegenerateOrientation)?;
        let z = x.cross(&y).try_normalize(0.0).ok_or(Error::DegenerateOrientation)?;
        let y = z.cross(&x).normalize();

        self.x_vec = x;
        self.y_vec = y;
        self.z_vec = z;
        Ok(())
    }

    /// # Errors
    /// Returns an error if `width <= 0`; the grid is left unchanged.
    #[allow(clippy::cast_precision_loss)]
    pub fn set_width(&mut self, width: f64) -> Result<()> {
        check_positive("width", width)?;
        self.width = width;
        self.dx = width / self.n_cols as f64;
        self.col_x_offset = -self.dx * (self.n_cols as f64 - 1.0) / 2.0;
        Ok(())
    }

    /// # Errors
    /// Returns an error if `height <= 0`; the grid is left unchanged.
    #[allow(clippy::cast_precision_loss)]
    pub fn set_height(&mut self, height: f64) -> Result<()> {
        check_positive("height", height)?;
        self.height = height;
        self.dy = height / self.n_rows as f64;
        self.row_y_offset = -self.dy * (self.n_rows as f64 - 1.0) / 2.0;
        Ok(())
    }

    /// # Errors
    /// Returns an error if `depth <= 0`; the grid is left unchanged.
    pub fn set_depth(&mut self, depth: f64) -> Result<()> {
        check_positive("depth", depth)?;
        self.depth = depth;
        Ok(())
    }
}

fn check_positive(name: &'static str, value: f64) -> Result<()> {
    // NaN fails this check as well
    if value > 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidDimension { name, value })
    }
}

impl fmt::Display for DetectorGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let v = |v: &Vector3<f64>| format!("[{}, {}, {}]", v.x, v.y, v.z);
        writeln!(f, "ID:{}", self.id)?;
        writeln!(f, "Nrows:{}", self.n_rows)?;
        writeln!(f, "Ncols:{}", self.n_cols)?;
        writeln!(f, "Cen:{}", v(&self.center))?;
        writeln!(f, "Width:{}", self.width)?;
        writeln!(f, "Height:{}", self.height)?;
        writeln!(f, "Depth:{}", self.depth)?;
        writeln!(f, "x_vec:{}", v(&self.x_vec))?;
        writeln!(f, "y_vec:{}", v(&self.y_vec))?;
        writeln!(f, "z_vec:{}", v(&self.z_vec))?;
        write!(f, "Units:{}", self.units)
    }
}
