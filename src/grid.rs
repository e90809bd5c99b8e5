//! Rectangular lattice of cells and the two passage matrices carved into it.

use std::collections::VecDeque;

use crate::error::{Error, Result};

/// Grid size in cells. Both sides are at least 1.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Dimensions {
    rows: usize,
    cols: usize,
}

impl Dimensions {
    pub fn new(rows: usize, cols: usize) -> Result<Self> {
        if rows == 0 || cols == 0 {
            return Err(Error::InvalidDimensions { rows, cols });
        }
        Ok(Self { rows, cols })
    }

    pub fn rows(self) -> usize {
        self.rows
    }

    pub fn cols(self) -> usize {
        self.cols
    }

    pub fn cell_count(self) -> usize {
        self.rows * self.cols
    }

    /// Number of internal boundaries between adjacent cells, open or closed.
    pub fn boundary_count(self) -> usize {
        self.rows * (self.cols - 1) + (self.rows - 1) * self.cols
    }

    /// The neighbour of `pos` in direction `dir`, or `None` past the edge.
    pub fn step(self, pos: Pos, dir: Dir) -> Option<Pos> {
        let (dr, dc) = dir.delta();
        let row = pos.row as isize + dr;
        let col = pos.col as isize + dc;
        if row < 0 || col < 0 || row >= self.rows as isize || col >= self.cols as isize {
            return None;
        }
        Some(Pos::new(row as usize, col as usize))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Pos {
    pub row: usize,
    pub col: usize,
}

impl Pos {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Dir {
    Up,
    Down,
    Left,
    Right,
}

impl Dir {
    /// Candidate order used when a cell is entered, before shuffling.
    pub const ALL: [Dir; 4] = [Dir::Right, Dir::Left, Dir::Down, Dir::Up];

    /// `(row, col)` offset of one step.
    pub fn delta(self) -> (isize, isize) {
        match self {
            Dir::Up => (-1, 0),
            Dir::Down => (1, 0),
            Dir::Left => (0, -1),
            Dir::Right => (0, 1),
        }
    }
}

/// Visited flags, one per cell.
#[derive(Clone, Debug)]
pub struct Grid {
    dims: Dimensions,
    visited: Vec<Vec<bool>>,
}

impl Grid {
    pub fn new(dims: Dimensions) -> Self {
        Self {
            dims,
            visited: vec![vec![false; dims.cols]; dims.rows],
        }
    }

    pub fn dims(&self) -> Dimensions {
        self.dims
    }

    pub fn is_visited(&self, pos: Pos) -> bool {
        self.visited[pos.row][pos.col]
    }

    /// Marks `pos` visited. Returns `false` if it already was.
    pub fn visit(&mut self, pos: Pos) -> bool {
        let cell = &mut self.visited[pos.row][pos.col];
        if *cell {
            return false;
        }
        *cell = true;
        true
    }

    pub fn visited_count(&self) -> usize {
        self.visited.iter().flatten().filter(|v| **v).count()
    }
}

/// Open boundaries between adjacent cells.
///
/// `vertical[r][c]` is the boundary between `(r, c)` and `(r, c + 1)`, shape
/// `rows x (cols - 1)`. `horizontal[r][c]` is the boundary between `(r, c)` and
/// `(r + 1, c)`, shape `(rows - 1) x cols`. `true` means open.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Passages {
    dims: Dimensions,
    vertical: Vec<Vec<bool>>,
    horizontal: Vec<Vec<bool>>,
}

impl Passages {
    /// Both matrices fully closed.
    pub fn new(dims: Dimensions) -> Self {
        Self {
            dims,
            vertical: vec![vec![false; dims.cols - 1]; dims.rows],
            horizontal: vec![vec![false; dims.cols]; dims.rows - 1],
        }
    }

    pub fn dims(&self) -> Dimensions {
        self.dims
    }

    pub fn vertical(&self) -> &[Vec<bool>] {
        &self.vertical
    }

    pub fn horizontal(&self) -> &[Vec<bool>] {
        &self.horizontal
    }

    /// Opens the boundary between `pos` and its neighbour in `dir`.
    ///
    /// Panics if that neighbour lies outside the grid.
    pub fn open(&mut self, pos: Pos, dir: Dir) {
        let dims = self.dims;
        *self.entry_mut(pos, dir).unwrap_or_else(|| {
            panic!("no boundary {:?} of {:?} in a {:?} grid", dir, pos, dims)
        }) = true;
    }

    pub fn is_open(&self, pos: Pos, dir: Dir) -> bool {
        self.dims.step(pos, dir).is_some() && self.entry(pos, dir)
    }

    pub fn open_count(&self) -> usize {
        self.vertical
            .iter()
            .chain(self.horizontal.iter())
            .flatten()
            .filter(|open| **open)
            .count()
    }

    /// Cells reachable from `pos` through one open boundary.
    pub fn open_neighbours(&self, pos: Pos) -> impl Iterator<Item = Pos> + '_ {
        Dir::ALL
            .into_iter()
            .filter(move |dir| self.is_open(pos, *dir))
            .filter_map(move |dir| self.dims.step(pos, dir))
    }

    /// Breadth-first path lengths from `start` over open boundaries.
    /// Unreachable cells are `None`.
    pub fn distances(&self, start: Pos) -> Vec<Vec<Option<usize>>> {
        let mut dist = vec![vec![None; self.dims.cols]; self.dims.rows];
        let mut q = VecDeque::new();
        dist[start.row][start.col] = Some(0);
        q.push_back(start);

        while let Some(pos) = q.pop_front() {
            let base = dist[pos.row][pos.col].unwrap_or(0);
            for next in self.open_neighbours(pos) {
                if dist[next.row][next.col].is_none() {
                    dist[next.row][next.col] = Some(base + 1);
                    q.push_back(next);
                }
            }
        }
        dist
    }

    fn entry(&self, pos: Pos, dir: Dir) -> bool {
        match dir {
            Dir::Right => self.vertical[pos.row][pos.col],
            Dir::Left => self.vertical[pos.row][pos.col - 1],
            Dir::Down => self.horizontal[pos.row][pos.col],
            Dir::Up => self.horizontal[pos.row - 1][pos.col],
        }
    }

    fn entry_mut(&mut self, pos: Pos, dir: Dir) -> Option<&mut bool> {
        self.dims.step(pos, dir)?;
        Some(match dir {
            Dir::Right => &mut self.vertical[pos.row][pos.col],
            Dir::Left => &mut self.vertical[pos.row][pos.col - 1],
            Dir::Down => &mut self.horizontal[pos.row][pos.col],
            Dir::Up => &mut self.horizontal[pos.row - 1][pos.col],
        })
    }
}
