#![deny(clippy::all)]
#![forbid(unsafe_code)]

use rand::distr::uniform::{SampleRange, SampleUniform};
use rand::prelude::*;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use rayon::prelude::*;
use std::ops::{Index, IndexMut};
use thiserror::Error;

#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum GridError {
    #[error("grid dimensions {width}x{height} must both be positive")]
    InvalidDimension { width: u32, height: u32 },
    #[error("cell buffer holds {len} cells, expected {expected} for {width}x{height}")]
    InvalidGrid {
        len: usize,
        expected: usize,
        width: u32,
        height: u32,
    },
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum CellState {
    #[default]
    Dead,
    Alive,
}

impl CellState {
    pub fn is_alive(self) -> bool {
        self == CellState::Alive
    }

    fn as_bit(self) -> u32 {
        match self {
            CellState::Dead => 0,
            CellState::Alive => 1,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Loc {
    pub x: u32,
    pub y: u32,
}

impl Loc {
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    pub fn grid_index(&self, width: u32, height: u32) -> Option<usize> {
        if self.x < width && self.y < height {
            Some(self.x as usize + self.y as usize * width as usize)
        } else {
            None
        }
    }
}

//
//   |----------------|---------------|----------------|
//   | [1]  (x-1,y-1) | [2]  (x,y-1)  | [3] (x+1,y-1)  |
//   |----------------|---------------|----------------|
//   | [4]  (x-1,y)   |  cell  (x,y)  |  [5] (x+1,y)   |
//   |----------------|---------------|----------------|
//   | [6] (x-1,y+1)  | [7] (x,y+1)   |  [8] (x+1,y+1) |
//   |----------------|---------------|----------------|
//
const NEIGHBOR_OFFSETS: [(i64, i64); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Grid {
    width: u32,
    height: u32,
    pub cells: Vec<CellState>,
}

impl Grid {
    pub fn new(width: u32, height: u32) -> Result<Self, GridError> {
        Self::check_dimensions(width, height)?;
        Ok(Self {
            width,
            height,
            cells: vec![CellState::Dead; width as usize * height as usize],
        })
    }

    pub fn from_cells(width: u32, height: u32, cells: Vec<CellState>) -> Result<Self, GridError> {
        Self::check_dimensions(width, height)?;
        let grid = Self {
            width,
            height,
            cells,
        };
        grid.check_cells()?;
        Ok(grid)
    }

    pub fn random(
        width: u32,
        height: u32,
        live_count: usize,
        rand: &mut Random,
    ) -> Result<Self, GridError> {
        let mut grid = Self::new(width, height)?;
        let count = effective_seed_count(live_count, grid.num_cells());
        for _ in 0..count {
            let x = rand.next_in_range(0..width);
            let y = rand.next_in_range(0..height);
            grid[Loc::new(x, y)] = CellState::Alive;
        }
        Ok(grid)
    }

    fn check_dimensions(width: u32, height: u32) -> Result<(), GridError> {
        if width == 0 || height == 0 {
            return Err(GridError::InvalidDimension { width, height });
        }
        Ok(())
    }

    fn check_cells(&self) -> Result<(), GridError> {
        let expected = self.width as usize * self.height as usize;
        if self.cells.len() != expected {
            return Err(GridError::InvalidGrid {
                len: self.cells.len(),
                expected,
                width: self.width,
                height: self.height,
            });
        }
        Ok(())
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn num_cells(&self) -> usize {
        self.cells.len()
    }

    pub fn cells_iter(&self) -> impl DoubleEndedIterator<Item = &CellState> + Clone {
        self.cells.iter()
    }

    pub fn population(&self) -> usize {
        self.cells.iter().filter(|cell| cell.is_alive()).count()
    }

    // Column-major emission: x ascending, y ascending within each column.
    pub fn live_cells(&self) -> Vec<Loc> {
        let mut result = vec![];
        for x in 0..self.width {
            for y in 0..self.height {
                let loc = Loc::new(x, y);
                if self[loc].is_alive() {
                    result.push(loc);
                }
            }
        }
        result
    }

    /// Computes the next generation. The outermost ring of cells is never
    /// evaluated and always comes out dead.
    pub fn step(&self) -> Result<Generation, GridError> {
        self.check_cells()?;

        let mut next = Self {
            width: self.width,
            height: self.height,
            cells: vec![CellState::Dead; self.cells.len()],
        };
        next.cells
            .par_chunks_mut(self.width as usize)
            .enumerate()
            .for_each(|(y, row)| self.step_row(y as u32, row));

        let live_cells = next.live_cells();
        Ok(Generation {
            grid: next,
            live_cells,
        })
    }

    fn step_row(&self, y: u32, row: &mut [CellState]) {
        if y == 0 || y == self.height - 1 {
            return;
        }
        for x in 1..self.width - 1 {
            let cell = self[Loc::new(x, y)];
            row[x as usize] = next_state(cell, self.live_neighbors(x, y));
        }
    }

    // Neighbor lookups use flat-index arithmetic; any index outside the
    // cell buffer counts as dead.
    fn live_neighbors(&self, x: u32, y: u32) -> u32 {
        NEIGHBOR_OFFSETS
            .iter()
            .map(|&(dx, dy)| self.bit_at(x as i64 + dx + (y as i64 + dy) * self.width as i64))
            .sum()
    }

    fn bit_at(&self, index: i64) -> u32 {
        if index < 0 {
            return 0;
        }
        self.cells
            .get(index as usize)
            .map_or(0, |cell| cell.as_bit())
    }

    fn cell(&self, loc: Loc) -> Option<&CellState> {
        loc.grid_index(self.width, self.height)
            .map(|index| &self.cells[index])
    }

    fn cell_mut(&mut self, loc: Loc) -> Option<&mut CellState> {
        loc.grid_index(self.width, self.height)
            .map(|index| &mut self.cells[index])
    }
}

impl Index<Loc> for Grid {
    type Output = CellState;

    fn index(&self, loc: Loc) -> &Self::Output {
        self.cell(loc)
            .unwrap_or_else(|| panic!("Index indices {}, {} out of bounds", loc.x, loc.y))
    }
}

impl IndexMut<Loc> for Grid {
    fn index_mut(&mut self, loc: Loc) -> &mut Self::Output {
        self.cell_mut(loc)
            .unwrap_or_else(|| panic!("Index_mut indices {}, {} out of bounds", loc.x, loc.y))
    }
}

fn next_state(cell: CellState, neighbors: u32) -> CellState {
    match cell {
        // Loneliness
        CellState::Alive if neighbors < 2 => CellState::Dead,
        // Overpopulation
        CellState::Alive if neighbors > 3 => CellState::Dead,
        // Birth
        CellState::Dead if neighbors == 3 => CellState::Alive,
        // Stasis
        state => state,
    }
}

// Requests under 10% of the grid pass through unchanged and anything past
// 100% fills the grid; everything in between collapses to a flat 10%.
fn effective_seed_count(requested: usize, total: usize) -> usize {
    if requested.saturating_mul(10) < total {
        requested
    } else if requested > total {
        total
    } else {
        total / 10
    }
}

/// A freshly computed generation: the next grid plus the ordered list of
/// its live cells.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Generation {
    pub grid: Grid,
    pub live_cells: Vec<Loc>,
}

#[derive(Debug)]
pub struct LifeWorld {
    grid: Grid,
    live_cells: Vec<Loc>,
}

impl LifeWorld {
    pub fn new(
        width: u32,
        height: u32,
        live_count: usize,
        rand: &mut Random,
    ) -> Result<Self, GridError> {
        let grid = Grid::random(width, height, live_count, rand)?;
        let live_cells = grid.live_cells();
        Ok(Self { grid, live_cells })
    }

    pub fn empty(width: u32, height: u32) -> Result<Self, GridError> {
        Ok(Self {
            grid: Grid::new(width, height)?,
            live_cells: vec![],
        })
    }

    pub fn width(&self) -> u32 {
        self.grid.width()
    }

    pub fn height(&self) -> u32 {
        self.grid.height()
    }

    pub fn num_cells(&self) -> usize {
        self.grid.num_cells()
    }

    pub fn cells_iter(&self) -> impl DoubleEndedIterator<Item = &CellState> + Clone {
        self.grid.cells_iter()
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn live_cells(&self) -> &[Loc] {
        &self.live_cells
    }

    /// Steps the grid and swaps in the result; the previous generation is
    /// discarded.
    pub fn update(&mut self) -> Result<(), GridError> {
        let Generation { grid, live_cells } = self.grid.step()?;
        self.grid = grid;
        self.live_cells = live_cells;
        Ok(())
    }
}

#[derive(Debug)]
pub struct Random {
    rng: SmallRng,
}

impl Random {
    pub fn new() -> Self {
        Self {
            rng: SmallRng::from_rng(&mut rand::rng()),
        }
    }

    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    pub fn next_in_range<T, R>(&mut self, range: R) -> T
    where
        T: SampleUniform,
        R: SampleRange<T>,
    {
        self.rng.random_range(range)
    }
}

impl Default for Random {
    fn default() -> Self {
        Self::new()
    }
}
