//! Grid map representation and builder.
//!
//! # Data layout
//!
//! Locations are row-major cell indices: `LocationId(row * cols + col)`.
//! Adjacency uses **Compressed Sparse Row (CSR)** format.  Given a
//! `LocationId l`, its traversable 4-neighbours occupy the slice:
//!
//! ```text
//! neighbors[ adj_start[l] .. adj_start[l+1] ]
//! ```
//!
//! Blocked cells keep their location id (so ids stay row-major) but have no
//! neighbours and appear in nobody's neighbour list.  Iteration over a
//! location's neighbours is a contiguous memory scan, which is what the
//! search driver's expansion loop wants.

use sipp_core::LocationId;

use crate::{MapError, MapResult};

// ── Graph contract ────────────────────────────────────────────────────────────

/// What the search driver needs from a map.
///
/// Implementations must be `Sync` so a single map can back parallel
/// single-agent searches.
pub trait Graph: Sync {
    /// Total number of locations (the `map_size` of the reservation table).
    fn location_count(&self) -> usize;

    /// Locations reachable from `location` in one move.  Waiting in place is
    /// implicit and must not be listed.
    fn neighbors(&self, location: LocationId) -> &[LocationId];
}

// ── GridMap ───────────────────────────────────────────────────────────────────

/// 4-connected grid with obstacles, in CSR form.
///
/// Do not construct directly; use [`GridMapBuilder`] or
/// [`GridMap::from_ascii`].
#[derive(Clone, Debug)]
pub struct GridMap {
    rows: usize,
    cols: usize,
    /// `true` for obstacle cells.  Indexed by `LocationId`.
    blocked: Vec<bool>,
    /// CSR row pointer.  Length = `rows * cols + 1`.
    adj_start: Vec<u32>,
    /// Concatenated neighbour lists.
    adj: Vec<LocationId>,
}

impl GridMap {
    /// Parse a map from text rows.
    ///
    /// `.` is free; `@`, `#`, `T`, and `O` are obstacles.  Blank lines and
    /// surrounding whitespace are ignored.
    ///
    /// ```
    /// use sipp_map::{Graph, GridMap};
    ///
    /// let map = GridMap::from_ascii("...\n.@.").unwrap();
    /// assert_eq!(map.location_count(), 6);
    /// let centre_top = map.location(0, 1).unwrap();
    /// assert_eq!(map.neighbors(centre_top).len(), 2); // below is blocked
    /// ```
    pub fn from_ascii(text: &str) -> MapResult<GridMap> {
        let lines: Vec<&str> = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect();
        let rows = lines.len();
        let cols = lines.first().map_or(0, |l| l.chars().count());

        let mut builder = GridMapBuilder::new(rows, cols);
        for (row, line) in lines.iter().enumerate() {
            let got = line.chars().count();
            if got != cols {
                return Err(MapError::RaggedRow { row, expected: cols, got });
            }
            for (col, symbol) in line.chars().enumerate() {
                match symbol {
                    '.' => {}
                    '@' | '#' | 'T' | 'O' => builder.block(row, col)?,
                    _ => return Err(MapError::UnknownSymbol { row, col, symbol }),
                }
            }
        }
        builder.build()
    }

    // ── Dimensions ────────────────────────────────────────────────────────

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Number of traversable cells.
    pub fn free_count(&self) -> usize {
        self.blocked.iter().filter(|b| !**b).count()
    }

    // ── Coordinates ───────────────────────────────────────────────────────

    /// Location of cell `(row, col)`, or `None` outside the grid.
    pub fn location(&self, row: usize, col: usize) -> Option<LocationId> {
        (row < self.rows && col < self.cols).then(|| LocationId((row * self.cols + col) as u32))
    }

    /// `(row, col)` of a location.
    #[inline]
    pub fn coords(&self, location: LocationId) -> (usize, usize) {
        (location.index() / self.cols, location.index() % self.cols)
    }

    pub fn is_blocked(&self, location: LocationId) -> bool {
        self.blocked[location.index()]
    }

    /// Grid (L1) distance, ignoring obstacles.
    pub fn manhattan(&self, a: LocationId, b: LocationId) -> u32 {
        let (ar, ac) = self.coords(a);
        let (br, bc) = self.coords(b);
        (ar.abs_diff(br) + ac.abs_diff(bc)) as u32
    }

    /// Number of traversable neighbours.
    #[inline]
    pub fn degree(&self, location: LocationId) -> usize {
        let start = self.adj_start[location.index()] as usize;
        let end   = self.adj_start[location.index() + 1] as usize;
        end - start
    }
}

impl Graph for GridMap {
    fn location_count(&self) -> usize {
        self.rows * self.cols
    }

    #[inline]
    fn neighbors(&self, location: LocationId) -> &[LocationId] {
        let start = self.adj_start[location.index()] as usize;
        let end   = self.adj_start[location.index() + 1] as usize;
        &self.adj[start..end]
    }
}

// ── GridMapBuilder ────────────────────────────────────────────────────────────

/// Construct a [`GridMap`] incrementally, then call [`build`](Self::build).
///
/// # Example
///
/// ```
/// use sipp_map::{Graph, GridMapBuilder};
///
/// let mut b = GridMapBuilder::new(1, 3);
/// b.block(0, 1).unwrap();
/// let map = b.build().unwrap();
/// assert!(map.neighbors(map.location(0, 0).unwrap()).is_empty());
/// ```
pub struct GridMapBuilder {
    rows:    usize,
    cols:    usize,
    blocked: Vec<bool>,
}

impl GridMapBuilder {
    /// All cells free.
    pub fn new(rows: usize, cols: usize) -> Self {
        Self { rows, cols, blocked: vec![false; rows * cols] }
    }

    /// Mark `(row, col)` as an obstacle.
    pub fn block(&mut self, row: usize, col: usize) -> MapResult<()> {
        if row >= self.rows || col >= self.cols {
            return Err(MapError::OutOfBounds { row, col, rows: self.rows, cols: self.cols });
        }
        self.blocked[row * self.cols + col] = true;
        Ok(())
    }

    /// Consume the builder and produce a [`GridMap`].
    ///
    /// Neighbour order is fixed (up, left, right, down) so searches are
    /// reproducible.  Time complexity: O(rows * cols).
    pub fn build(self) -> MapResult<GridMap> {
        let cells = self.rows * self.cols;
        if cells == 0 {
            return Err(MapError::Empty);
        }
        if cells >= u32::MAX as usize {
            return Err(MapError::TooLarge { cells });
        }

        let mut adj_start = Vec::with_capacity(cells + 1);
        let mut adj = Vec::with_capacity(cells * 4);
        adj_start.push(0u32);

        for cell in 0..cells {
            if !self.blocked[cell] {
                let (row, col) = (cell / self.cols, cell % self.cols);
                let candidates = [
                    (row > 0).then(|| cell - self.cols),
                    (col > 0).then(|| cell - 1),
                    (col + 1 < self.cols).then(|| cell + 1),
                    (row + 1 < self.rows).then(|| cell + self.cols),
                ];
                for n in candidates.into_iter().flatten() {
                    if !self.blocked[n] {
                        adj.push(LocationId(n as u32));
                    }
                }
            }
            adj_start.push(adj.len() as u32);
        }
        debug_assert_eq!(adj_start.len(), cells + 1);

        tracing::debug!(rows = self.rows, cols = self.cols, edges = adj.len(), "grid map built");

        Ok(GridMap {
            rows: self.rows,
            cols: self.cols,
            blocked: self.blocked,
            adj_start,
            adj,
        })
    }
}
