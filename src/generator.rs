//! Randomised depth-first maze carving (the "recursive backtracker").
//!
//! The carve visits cells in exactly the order the textbook recursive version does,
//! but keeps its frames on a heap-allocated stack so large grids cannot overflow
//! the call stack. Each frame remembers the cell it was entered at, its shuffled
//! candidate directions and how many of them it has already tried.

use std::fmt;

use log::debug;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::grid::{Dimensions, Dir, Grid, Passages, Pos};

/// A fully carved maze: every cell visited, open passages forming a spanning tree.
#[derive(Clone, Debug)]
pub struct Maze {
    grid: Grid,
    passages: Passages,
    start: Pos,
}

impl Maze {
    pub fn dims(&self) -> Dimensions {
        self.passages.dims()
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn passages(&self) -> &Passages {
        &self.passages
    }

    /// The cell the carve began at.
    pub fn start(&self) -> Pos {
        self.start
    }
}

struct Frame {
    pos: Pos,
    candidates: [Dir; 4],
    next: usize,
}

/// Carves a perfect maze over a `dims` grid using `rng` for every random choice.
///
/// The same sequence of draws from `rng` always yields the same maze.
pub fn generate<R: Rng + ?Sized>(dims: Dimensions, rng: &mut R) -> Maze {
    let mut grid = Grid::new(dims);
    let mut passages = Passages::new(dims);

    let start = Pos::new(rng.gen_range(0..dims.rows()), rng.gen_range(0..dims.cols()));
    carve(&mut grid, &mut passages, start, rng);

    assert_eq!(
        grid.visited_count(),
        dims.cell_count(),
        "carve left cells unvisited"
    );
    debug!(
        "carved {}x{} maze from {:?}: {} open passages of {}",
        dims.rows(),
        dims.cols(),
        start,
        passages.open_count(),
        dims.boundary_count()
    );

    Maze {
        grid,
        passages,
        start,
    }
}

fn carve<R: Rng + ?Sized>(grid: &mut Grid, passages: &mut Passages, start: Pos, rng: &mut R) {
    let dims = grid.dims();
    let mut stack: Vec<Frame> = Vec::with_capacity(dims.cell_count());
    stack.extend(enter(grid, start, rng));

    while let Some(frame) = stack.last_mut() {
        if frame.next == frame.candidates.len() {
            stack.pop();
            continue;
        }
        let dir = frame.candidates[frame.next];
        frame.next += 1;
        let from = frame.pos;

        let Some(to) = dims.step(from, dir) else {
            continue;
        };
        if grid.is_visited(to) {
            continue;
        }
        passages.open(from, dir);
        stack.extend(enter(grid, to, rng));
    }
}

/// Marks `pos` visited and prepares its frame. Entering an already visited cell
/// yields no frame.
fn enter<R: Rng + ?Sized>(grid: &mut Grid, pos: Pos, rng: &mut R) -> Option<Frame> {
    if !grid.visit(pos) {
        return None;
    }
    let mut candidates = Dir::ALL;
    candidates.shuffle(rng);
    Some(Frame {
        pos,
        candidates,
        next: 0,
    })
}

impl fmt::Display for Maze {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dims = self.dims();
        let vertical = self.passages.vertical();
        let horizontal = self.passages.horizontal();

        write!(f, "+")?;
        for _ in 0..dims.cols() {
            write!(f, "---+")?;
        }
        writeln!(f)?;

        for r in 0..dims.rows() {
            write!(f, "|")?;
            for c in 0..dims.cols() {
                let open = c + 1 < dims.cols() && vertical[r][c];
                write!(f, "   {}", if open { ' ' } else { '|' })?;
            }
            writeln!(f)?;

            write!(f, "+")?;
            for c in 0..dims.cols() {
                let open = r + 1 < dims.rows() && horizontal[r][c];
                write!(f, "{}+", if open { "   " } else { "---" })?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn dims(rows: usize, cols: usize) -> Dimensions {
        Dimensions::new(rows, cols).unwrap()
    }

    // Straightforward recursive carve, used as the reference visiting order.
    fn recursive_carve(grid: &mut Grid, passages: &mut Passages, pos: Pos, rng: &mut ChaCha8Rng) {
        if !grid.visit(pos) {
            return;
        }
        let mut candidates = Dir::ALL;
        candidates.shuffle(rng);
        for dir in candidates {
            let Some(next) = grid.dims().step(pos, dir) else {
                continue;
            };
            if grid.is_visited(next) {
                continue;
            }
            passages.open(pos, dir);
            recursive_carve(grid, passages, next, rng);
        }
    }

    #[test]
    fn two_by_two_opens_three_of_four() {
        for seed in 0..32 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let maze = generate(dims(2, 2), &mut rng);
            assert_eq!(maze.passages().open_count(), 3);
            assert_eq!(maze.grid().visited_count(), 4);
        }
    }

    #[test]
    fn single_cell_maze() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let maze = generate(dims(1, 1), &mut rng);
        assert_eq!(maze.start(), Pos::new(0, 0));
        assert_eq!(maze.passages().open_count(), 0);
        assert_eq!(maze.grid().visited_count(), 1);
    }

    #[test]
    fn corridor_is_fully_open() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let maze = generate(dims(1, 6), &mut rng);
        assert!(maze.passages().vertical()[0].iter().all(|open| *open));

        let maze = generate(dims(5, 1), &mut rng);
        assert!(maze.passages().horizontal().iter().all(|row| row[0]));
    }

    #[test]
    fn same_seed_same_maze() {
        let a = generate(dims(9, 12), &mut ChaCha8Rng::seed_from_u64(42));
        let b = generate(dims(9, 12), &mut ChaCha8Rng::seed_from_u64(42));
        assert_eq!(a.passages(), b.passages());
        assert_eq!(a.start(), b.start());
    }

    #[test]
    fn matches_recursive_visiting_order() {
        for seed in 0..16 {
            let d = dims(7, 11);
            let maze = generate(d, &mut ChaCha8Rng::seed_from_u64(seed));

            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let start = Pos::new(rng.gen_range(0..d.rows()), rng.gen_range(0..d.cols()));
            let mut grid = Grid::new(d);
            let mut passages = Passages::new(d);
            recursive_carve(&mut grid, &mut passages, start, &mut rng);

            assert_eq!(maze.passages(), &passages, "seed {}", seed);
        }
    }

    #[test]
    fn entering_a_visited_cell_is_a_no_op() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut grid = Grid::new(dims(2, 2));
        assert!(enter(&mut grid, Pos::new(0, 0), &mut rng).is_some());
        assert!(enter(&mut grid, Pos::new(0, 0), &mut rng).is_none());
        assert_eq!(grid.visited_count(), 1);
    }

    #[test]
    fn large_grid_does_not_overflow() {
        let d = dims(400, 400);
        let maze = generate(d, &mut ChaCha8Rng::seed_from_u64(9));
        assert_eq!(maze.passages().open_count(), d.cell_count() - 1);
    }

    #[test]
    fn display_draws_closed_boundaries() {
        let d = dims(1, 2);
        let maze = generate(d, &mut ChaCha8Rng::seed_from_u64(0));
        assert_eq!(maze.to_string(), "+---+---+\n|       |\n+---+---+\n");
    }
}
