use lifecanvas_shared::Point;
use serde::Serialize;
use std::collections::HashSet;

/// How coordinates behave at the edges of the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topology {
    /// Both axes wrap around, so the board has no edges.
    Toroidal { width: u32, height: u32 },
    /// No wrapping; coordinates are only limited by `i64`.
    Unbounded,
}

impl Topology {
    /// Maps a point onto the board. Wrapping uses the euclidean remainder, so
    /// `-1` lands on the last column.
    pub fn normalize(&self, point: Point) -> Point {
        match *self {
            Topology::Toroidal { width, height } => Point::new(
                point.x.rem_euclid(i64::from(width)),
                point.y.rem_euclid(i64::from(height)),
            ),
            Topology::Unbounded => point,
        }
    }

    /// The eight surrounding cells, row by row from the top left.
    pub fn neighbors(&self, point: Point) -> [Point; 8] {
        let mut neighbors = [point; 8];
        let offsets = (-1..=1)
            .flat_map(|dy| (-1..=1).map(move |dx| (dx, dy)))
            .filter(|&offset| offset != (0, 0));
        for (slot, (dx, dy)) in neighbors.iter_mut().zip(offsets) {
            *slot = self.normalize(Point::new(
                point.x.saturating_add(dx),
                point.y.saturating_add(dy),
            ));
        }
        neighbors
    }

    pub fn dimensions(&self) -> Option<(u32, u32)> {
        match *self {
            Topology::Toroidal { width, height } => Some((width, height)),
            Topology::Unbounded => None,
        }
    }
}

/// Every live cell at one generation, sorted top to bottom, left to right.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Frame {
    pub generation: u64,
    pub points: Vec<Point>,
}

/// A Conway's Game of Life board stored as the set of live cells.
#[derive(Debug, Clone)]
pub struct Board {
    topology: Topology,
    cells: HashSet<Point>,
    generation: u64,
}

impl Board {
    pub fn new(topology: Topology) -> Self {
        Self {
            topology,
            cells: HashSet::new(),
            generation: 0,
        }
    }

    pub fn topology(&self) -> Topology {
        self.topology
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn is_alive(&self, point: Point) -> bool {
        self.cells.contains(&self.topology.normalize(point))
    }

    /// Brings the given cells to life. Returns how many were not alive yet.
    pub fn add_cells<I>(&mut self, points: I) -> usize
    where
        I: IntoIterator<Item = Point>,
    {
        let topology = self.topology;
        points
            .into_iter()
            .filter(|&point| self.cells.insert(topology.normalize(point)))
            .count()
    }

    /// Scatters `count` random cells over the `spread` x `spread` square at
    /// the origin. Collisions are not retried, so fewer cells may come alive.
    /// An empty square (`spread == 0`) places nothing.
    pub fn seed(&mut self, count: usize, spread: u32, rng: &mut fastrand::Rng) -> usize {
        if spread == 0 {
            return 0;
        }
        let points: Vec<Point> = (0..count)
            .map(|_| Point::new(i64::from(rng.u32(..spread)), i64::from(rng.u32(..spread))))
            .collect();
        self.add_cells(points)
    }

    /// Advances the board by one generation.
    ///
    /// Only live cells and their neighbours can be alive next, so those are
    /// the only candidates examined.
    pub fn step(&mut self) {
        let mut next = HashSet::with_capacity(self.cells.len());
        for &cell in &self.cells {
            let candidates = std::iter::once(cell).chain(self.topology.neighbors(cell));
            for candidate in candidates {
                if !next.contains(&candidate) && self.will_live(candidate) {
                    next.insert(candidate);
                }
            }
        }
        self.cells = next;
        self.generation += 1;
    }

    pub fn frame(&self) -> Frame {
        let mut points: Vec<Point> = self.cells.iter().copied().collect();
        points.sort_unstable_by_key(|p| (p.y, p.x));
        Frame {
            generation: self.generation,
            points,
        }
    }

    fn will_live(&self, point: Point) -> bool {
        let alive_neighbors = self
            .topology
            .neighbors(point)
            .iter()
            .filter(|&neighbor| self.cells.contains(neighbor))
            .count();
        alive_neighbors == 3 || (alive_neighbors == 2 && self.cells.contains(&point))
    }
}
