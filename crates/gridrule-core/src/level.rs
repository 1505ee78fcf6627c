//! The tile grid.
//!
//! A [`Level`] is a dense row-major grid of [`CellKey`]s with O(1) lookup
//! by `(x, y)`. Cells are never interpreted here; the tile scanner looks a
//! cell's key up in a rulesheet's dispatch table and the loader spawns
//! entities for keys that name a rulesheet.

use serde::{Deserialize, Serialize};

use crate::key::CellKey;

/// Level shape failures.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum LevelError {
    /// A row whose length differs from the first row.
    #[error("row {row} has {found} cells, expected {expected}")]
    Ragged {
        row: usize,
        expected: usize,
        found: usize,
    },

    /// Cell count does not match `width * height`.
    #[error("{len} cells cannot fill a {width}x{height} level")]
    SizeMismatch {
        width: usize,
        height: usize,
        len: usize,
    },

    /// Rows were given but the first one is empty, or a width of zero was
    /// requested for non-empty data.
    #[error("level width must be at least 1")]
    ZeroWidth,
}

/// A rectangular grid of cell keys.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Level {
    width: usize,
    height: usize,
    cells: Vec<CellKey>,
}

impl Level {
    /// Build from rows. All rows must have the same non-zero length.
    pub fn from_rows(rows: Vec<Vec<CellKey>>) -> Result<Self, LevelError> {
        let height = rows.len();
        let width = rows.first().map_or(0, Vec::len);
        if height > 0 && width == 0 {
            return Err(LevelError::ZeroWidth);
        }
        let mut cells = Vec::with_capacity(width * height);
        for (row, r) in rows.into_iter().enumerate() {
            if r.len() != width {
                return Err(LevelError::Ragged {
                    row,
                    expected: width,
                    found: r.len(),
                });
            }
            cells.extend(r);
        }
        Ok(Self { width, height, cells })
    }

    /// Build from a flat row-major cell list.
    pub fn from_cells(width: usize, height: usize, cells: Vec<CellKey>) -> Result<Self, LevelError> {
        if width == 0 && !cells.is_empty() {
            return Err(LevelError::ZeroWidth);
        }
        if cells.len() != width * height {
            return Err(LevelError::SizeMismatch {
                width,
                height,
                len: cells.len(),
            });
        }
        Ok(Self { width, height, cells })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> Option<&CellKey> {
        if x < self.width && y < self.height {
            self.cells.get(y * self.width + x)
        } else {
            None
        }
    }

    /// Overwrite a cell. Returns the previous key, or `None` when out of
    /// bounds.
    pub fn set(&mut self, x: usize, y: usize, key: CellKey) -> Option<CellKey> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let slot = &mut self.cells[y * self.width + x];
        Some(std::mem::replace(slot, key))
    }

    /// All cells as `(x, y, key)`, row-major.
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize, &CellKey)> + '_ {
        let width = self.width.max(1);
        self.cells
            .iter()
            .enumerate()
            .map(move |(i, key)| (i % width, i / width, key))
    }

    /// The grid as owned rows.
    pub fn rows(&self) -> Vec<Vec<CellKey>> {
        if self.width == 0 {
            return Vec::new();
        }
        self.cells.chunks(self.width).map(<[CellKey]>::to_vec).collect()
    }
}
