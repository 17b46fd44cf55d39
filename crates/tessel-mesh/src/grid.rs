use std::error::Error;
use std::fmt;

use rand::Rng;
use tessel_tile::{IdRangePolicy, Tile, TileError, TileRotation};

/// Row-major grid of packed tiles defining one chunk's layout.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TileGrid {
    rows: usize,
    cols: usize,
    tiles: Vec<Tile>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GridError {
    OutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },
}

impl fmt::Display for GridError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            GridError::OutOfBounds {
                row,
                col,
                rows,
                cols,
            } => write!(f, "cell ({}, {}) outside {}x{} grid", row, col, rows, cols),
        }
    }
}

impl Error for GridError {}

impl TileGrid {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            tiles: vec![Tile::default(); rows * cols],
        }
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn idx(&self, row: usize, col: usize) -> usize {
        row * self.cols + col
    }

    #[inline]
    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    fn check(&self, row: usize, col: usize) -> Result<(), GridError> {
        if row >= self.rows || col >= self.cols {
            return Err(GridError::OutOfBounds {
                row,
                col,
                rows: self.rows,
                cols: self.cols,
            });
        }
        Ok(())
    }

    pub fn get(&self, row: usize, col: usize) -> Result<Tile, GridError> {
        self.check(row, col)?;
        Ok(self.tiles[self.idx(row, col)])
    }

    /// Replaces one cell; the grid is unchanged on out-of-bounds coordinates.
    pub fn set(&mut self, row: usize, col: usize, tile: Tile) -> Result<(), GridError> {
        self.check(row, col)?;
        let i = self.idx(row, col);
        self.tiles[i] = tile;
        Ok(())
    }

    /// Fills every cell with a uniformly random prototype id in
    /// `[0, prototype_count)`, a random quarter-turn rotation, and coin-flip
    /// flip flags. Collision bits stay clear. Built into a fresh buffer and
    /// swapped in at the end, so a strict-mode id failure leaves the grid
    /// untouched.
    pub fn randomize<R: Rng>(
        &mut self,
        rng: &mut R,
        prototype_count: u32,
        policy: IdRangePolicy,
    ) -> Result<(), TileError> {
        let max = prototype_count.max(1);
        let mut fresh = Vec::with_capacity(self.tiles.len());
        for _ in 0..self.tiles.len() {
            let mut tile = Tile::default();
            tile.set_id_with(rng.gen_range(0..max), policy)?;
            tile.set_rotation(TileRotation::ALL[rng.gen_range(0..TileRotation::ALL.len())]);
            tile.set_flip_x(rng.gen_bool(0.5));
            tile.set_flip_y(rng.gen_bool(0.5));
            fresh.push(tile);
        }
        self.tiles = fresh;
        Ok(())
    }
}
