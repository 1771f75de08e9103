//! Board geometries: square grids and triangle grids shaped as a hexagon.
//!
//! Every cell is described by the lattice vertices of its corners. Two cells
//! are *adjacent* if they share an edge (two vertices) and *diagonal* if they
//! share exactly one vertex. This single rule gives the neighbourhoods of
//! both geometries, and transforming the vertices gives rotations,
//! reflections and the point reflection used for symmetry detection.
//!
//! Triangle cells use the coordinates `(x, y)` where the cell points up if
//! `x + y` is even. Their vertices are stored in axial lattice coordinates
//! `(a, b)` with basis vectors at 60 degrees.

use std::fmt;

use smallvec::SmallVec;

/// A cell of a board grid, as an index `y * width + x`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Point(u16);

impl Point {
    /// Sentinel for "no point".
    pub const NULL: Point = Point(u16::MAX);

    #[inline]
    pub fn new(index: usize) -> Self {
        debug_assert!(index < u16::MAX as usize);
        Point(index as u16)
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub fn is_null(self) -> bool {
        self == Point::NULL
    }

    #[inline]
    pub fn x(self, width: usize) -> usize {
        self.index() % width
    }

    #[inline]
    pub fn y(self, width: usize) -> usize {
        self.index() / width
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GeometryKind {
    Square,
    Trigon,
}

/// Vertex of a cell in lattice coordinates.
pub(crate) type Vertex = (i32, i32);

pub(crate) type Vertices = SmallVec<[Vertex; 4]>;

// =============================================================================
// Lattice Helpers
// =============================================================================

impl GeometryKind {
    /// Number of rotations and reflections of the lattice.
    pub(crate) fn nu_transforms(self) -> usize {
        match self {
            GeometryKind::Square => 8,
            GeometryKind::Trigon => 12,
        }
    }

    fn nu_rotations(self) -> usize {
        self.nu_transforms() / 2
    }

    /// Whether the triangle at `(x, y)` points up.
    #[inline]
    pub(crate) fn is_up(x: i32, y: i32) -> bool {
        (x + y).rem_euclid(2) == 0
    }

    pub(crate) fn vertices(self, x: i32, y: i32) -> Vertices {
        match self {
            GeometryKind::Square => {
                SmallVec::from_slice(&[(x, y), (x + 1, y), (x, y + 1), (x + 1, y + 1)])
            }
            GeometryKind::Trigon => {
                // (h, line) with h counted in half cell widths
                let hv: [(i32, i32); 3] = if Self::is_up(x, y) {
                    [(x + 1, y), (x, y + 1), (x + 2, y + 1)]
                } else {
                    [(x, y), (x + 2, y), (x + 1, y + 1)]
                };
                hv.iter()
                    .map(|&(h, line)| ((h - line - 1).div_euclid(2), line))
                    .collect()
            }
        }
    }

    /// Inverse of [`GeometryKind::vertices`].
    pub(crate) fn cell_from_vertices(self, vs: &[Vertex]) -> (i32, i32) {
        match self {
            GeometryKind::Square => {
                let x = vs.iter().map(|v| v.0).min().unwrap_or(0);
                let y = vs.iter().map(|v| v.1).min().unwrap_or(0);
                (x, y)
            }
            GeometryKind::Trigon => {
                let hv: SmallVec<[(i32, i32); 3]> =
                    vs.iter().map(|&(a, b)| (2 * a + b + 1, b)).collect();
                let top = hv.iter().map(|v| v.1).min().unwrap_or(0);
                let mut on_top = hv.iter().filter(|v| v.1 == top);
                let first = on_top.next().map(|v| v.0).unwrap_or(0);
                match on_top.next() {
                    // Two vertices on the top line: the triangle points down
                    Some(second) => (first.min(second.0), top),
                    None => (first - 1, top),
                }
            }
        }
    }

    pub(crate) fn transform_vertex(self, t: usize, v: Vertex) -> Vertex {
        let (mut a, mut b) = v;
        if t >= self.nu_rotations() {
            std::mem::swap(&mut a, &mut b);
        }
        for _ in 0..(t % self.nu_rotations()) {
            (a, b) = match self {
                GeometryKind::Square => (-b, a),
                GeometryKind::Trigon => (-b, a + b),
            };
        }
        (a, b)
    }

    pub(crate) fn transform_cell(self, t: usize, x: i32, y: i32) -> (i32, i32) {
        let vs: Vertices = self
            .vertices(x, y)
            .into_iter()
            .map(|v| self.transform_vertex(t, v))
            .collect();
        self.cell_from_vertices(&vs)
    }

    /// Edge neighbours on the unbounded lattice.
    pub(crate) fn lattice_adj(self, x: i32, y: i32) -> SmallVec<[(i32, i32); 4]> {
        match self {
            GeometryKind::Square => {
                SmallVec::from_slice(&[(x - 1, y), (x + 1, y), (x, y - 1), (x, y + 1)])
            }
            GeometryKind::Trigon => {
                let vertical = if Self::is_up(x, y) { y + 1 } else { y - 1 };
                SmallVec::from_slice(&[(x - 1, y), (x + 1, y), (x, vertical)])
            }
        }
    }

    /// Corner-only neighbours on the unbounded lattice.
    pub(crate) fn lattice_diag(self, x: i32, y: i32) -> SmallVec<[(i32, i32); 12]> {
        let own = self.vertices(x, y);
        let mut result = SmallVec::new();
        for dy in -2..=2 {
            for dx in -3..=3 {
                if dx == 0 && dy == 0 {
                    continue;
                }
                let shared = self
                    .vertices(x + dx, y + dy)
                    .iter()
                    .filter(|v| own.contains(v))
                    .count();
                if shared == 1 {
                    result.push((x + dx, y + dy));
                }
            }
        }
        result
    }

    /// Cell centre in Euclidean coordinates.
    pub(crate) fn centroid(self, x: i32, y: i32) -> (f64, f64) {
        let vs = self.vertices(x, y);
        let n = vs.len() as f64;
        let (sx, sy) = vs.iter().fold((0.0, 0.0), |(sx, sy), &(a, b)| {
            let (rx, ry) = self.vertex_to_real((a, b));
            (sx + rx, sy + ry)
        });
        (sx / n, sy / n)
    }

    fn vertex_to_real(self, v: Vertex) -> (f64, f64) {
        match self {
            GeometryKind::Square => (v.0 as f64, v.1 as f64),
            GeometryKind::Trigon => (
                v.0 as f64 + 0.5 * v.1 as f64,
                v.1 as f64 * 3f64.sqrt() / 2.0,
            ),
        }
    }
}

// =============================================================================
// Geometry
// =============================================================================

/// Shape of a board with precomputed neighbourhoods.
pub struct Geometry {
    kind: GeometryKind,
    width: usize,
    height: usize,
    on_board: Vec<bool>,
    points: Vec<Point>,
    adj: Vec<SmallVec<[Point; 4]>>,
    diag: Vec<SmallVec<[Point; 12]>>,
    /// Point reflection through the board centre.
    symmetric: Vec<Point>,
    centroid: Vec<(f64, f64)>,
    center: (f64, f64),
    /// Twice the centre vertex in lattice coordinates.
    center2: Vertex,
}

impl Geometry {
    /// A rectangular board of squares.
    pub fn square(width: usize, height: usize) -> Self {
        let cells = (0..height as i32)
            .flat_map(|y| (0..width as i32).map(move |x| (x, y)))
            .collect::<Vec<_>>();
        let center = (width as i32, height as i32);
        Self::build(GeometryKind::Square, width, height, &cells, center)
    }

    /// A hexagon of triangles with `edge` triangles per side.
    pub fn trigon(edge: usize) -> Self {
        let kind = GeometryKind::Trigon;
        let s = edge as i32;
        // Centre vertex at lattice (0, s); collect all cells inside the hexagon.
        let in_hex = |(a, b): Vertex| {
            let (da, db) = (a, b - s);
            da.abs().max(db.abs()).max((da + db).abs()) <= s
        };
        let mut cells = Vec::new();
        for y in 0..2 * s {
            for x in -(4 * s + 4)..(4 * s + 4) {
                if kind.vertices(x, y).into_iter().all(in_hex) {
                    cells.push((x, y));
                }
            }
        }
        let min_x = cells.iter().map(|c| c.0).min().unwrap_or(0);
        // Shift by an even amount so that the orientation of cells is kept.
        let shift = min_x - min_x.rem_euclid(2);
        for c in &mut cells {
            c.0 -= shift;
        }
        let width = cells.iter().map(|c| c.0).max().unwrap_or(0) as usize + 1;
        let height = 2 * edge;
        // The lattice coordinate a moves by half the shift of x.
        let center = (-shift, 2 * s);
        Self::build(kind, width, height, &cells, center)
    }

    /// `center2` is twice the centre vertex, so that the point reflection of
    /// vertex `v` is `center2 - v`.
    fn build(
        kind: GeometryKind,
        width: usize,
        height: usize,
        cells: &[(i32, i32)],
        center2: Vertex,
    ) -> Self {
        let range = width * height;
        let mut on_board = vec![false; range];
        for &(x, y) in cells {
            on_board[y as usize * width + x as usize] = true;
        }
        let lookup = |x: i32, y: i32| -> Option<Point> {
            if x < 0 || y < 0 || x as usize >= width || y as usize >= height {
                return None;
            }
            let i = y as usize * width + x as usize;
            on_board[i].then(|| Point::new(i))
        };
        let mut adj = vec![SmallVec::new(); range];
        let mut diag = vec![SmallVec::new(); range];
        let mut symmetric = vec![Point::NULL; range];
        let mut centroid = vec![(0.0, 0.0); range];
        let mut points = Vec::with_capacity(cells.len());
        for &(x, y) in cells {
            let p = lookup(x, y).unwrap_or(Point::NULL);
            points.push(p);
            adj[p.index()] = kind
                .lattice_adj(x, y)
                .into_iter()
                .filter_map(|(nx, ny)| lookup(nx, ny))
                .collect();
            diag[p.index()] = kind
                .lattice_diag(x, y)
                .into_iter()
                .filter_map(|(nx, ny)| lookup(nx, ny))
                .collect();
            let mirrored: Vertices = kind
                .vertices(x, y)
                .into_iter()
                .map(|(a, b)| (center2.0 - a, center2.1 - b))
                .collect();
            let (mx, my) = kind.cell_from_vertices(&mirrored);
            symmetric[p.index()] = lookup(mx, my).unwrap_or(Point::NULL);
            centroid[p.index()] = kind.centroid(x, y);
        }
        points.sort();
        let n = points.len() as f64;
        let center = points.iter().fold((0.0, 0.0), |(cx, cy), p| {
            let (x, y) = centroid[p.index()];
            (cx + x / n, cy + y / n)
        });
        Self {
            kind,
            width,
            height,
            on_board,
            points,
            adj,
            diag,
            symmetric,
            centroid,
            center,
            center2,
        }
    }

    #[inline]
    pub fn kind(&self) -> GeometryKind {
        self.kind
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Size of per-point arrays (includes cells outside the board shape).
    #[inline]
    pub fn range(&self) -> usize {
        self.width * self.height
    }

    /// All on-board points in increasing order.
    #[inline]
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn point(&self, x: usize, y: usize) -> Option<Point> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = y * self.width + x;
        self.on_board[i].then(|| Point::new(i))
    }

    #[inline]
    pub fn adj(&self, p: Point) -> &[Point] {
        &self.adj[p.index()]
    }

    #[inline]
    pub fn diag(&self, p: Point) -> &[Point] {
        &self.diag[p.index()]
    }

    /// Mirror point under the point reflection through the board centre.
    #[inline]
    pub fn symmetric_point(&self, p: Point) -> Point {
        self.symmetric[p.index()]
    }

    /// Rotate a point about the board centre by `t` elementary rotations.
    /// Returns `Point::NULL` if the image is not on the board.
    pub fn rotate_point(&self, p: Point, t: usize) -> Point {
        let (x, y) = (p.x(self.width) as i32, p.y(self.width) as i32);
        let (cx, cy) = self.center2;
        let rotated: Vertices = self
            .kind
            .vertices(x, y)
            .into_iter()
            .map(|(a, b)| {
                let (ra, rb) = self.kind.transform_vertex(t, (2 * a - cx, 2 * b - cy));
                ((ra + cx) / 2, (rb + cy) / 2)
            })
            .collect();
        let (rx, ry) = self.kind.cell_from_vertices(&rotated);
        if rx < 0 || ry < 0 {
            return Point::NULL;
        }
        self.point(rx as usize, ry as usize).unwrap_or(Point::NULL)
    }

    /// On-board point whose centre is closest to the Euclidean position.
    pub fn nearest_point(&self, x: f64, y: f64) -> Option<Point> {
        self.points.iter().copied().min_by(|&p, &q| {
            let dp = (self.centroid[p.index()].0 - x).powi(2) + (self.centroid[p.index()].1 - y).powi(2);
            let dq = (self.centroid[q.index()].0 - x).powi(2) + (self.centroid[q.index()].1 - y).powi(2);
            dp.total_cmp(&dq)
        })
    }

    /// Board centre in Euclidean coordinates.
    pub fn center(&self) -> (f64, f64) {
        self.center
    }

    /// Whether the board shape is invariant under the point reflection.
    pub fn is_point_symmetric(&self) -> bool {
        self.points.iter().all(|&p| !self.symmetric[p.index()].is_null())
    }

    /// Euclidean distance of a cell centre to the board centre.
    pub fn center_distance(&self, p: Point) -> f64 {
        let (x, y) = self.centroid[p.index()];
        ((x - self.center.0).powi(2) + (y - self.center.1).powi(2)).sqrt()
    }

    /// Euclidean distance between two cell centres.
    pub fn distance(&self, p: Point, q: Point) -> f64 {
        let (px, py) = self.centroid[p.index()];
        let (qx, qy) = self.centroid[q.index()];
        ((px - qx).powi(2) + (py - qy).powi(2)).sqrt()
    }

    /// Convert a point to a string like `a1` (column letters, rows counted
    /// from the bottom).
    pub fn point_to_string(&self, p: Point) -> String {
        let x = p.x(self.width);
        let y = p.y(self.width);
        format!("{}{}", column_label(x), self.height - y)
    }

    /// Parse a point string. Returns `None` for malformed or off-board input.
    pub fn parse_point(&self, s: &str) -> Option<Point> {
        let s = s.trim();
        let split = s.find(|c: char| c.is_ascii_digit())?;
        let (col, row) = s.split_at(split);
        if col.is_empty() || col.len() > 3 || !col.chars().all(|c| c.is_ascii_lowercase()) {
            return None;
        }
        let x = col
            .bytes()
            .fold(0usize, |acc, b| acc * 26 + (b - b'a') as usize + 1)
            - 1;
        let row: usize = row.parse().ok()?;
        if row == 0 || row > self.height {
            return None;
        }
        self.point(x, self.height - row)
    }
}

/// Column letters: a..z, aa, ab, ...
fn column_label(mut x: usize) -> String {
    let mut label = Vec::new();
    loop {
        label.push(b'a' + (x % 26) as u8);
        if x < 26 {
            break;
        }
        x = x / 26 - 1;
    }
    label.reverse();
    String::from_utf8(label).unwrap_or_default()
}

impl fmt::Debug for Geometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Geometry")
            .field("kind", &self.kind)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("points", &self.points.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_square_neighbours() {
        let geo = Geometry::square(14, 14);
        assert_eq!(geo.points().len(), 196);
        let corner = geo.point(0, 0).unwrap();
        assert_eq!(geo.adj(corner).len(), 2);
        assert_eq!(geo.diag(corner).len(), 1);
        let inner = geo.point(5, 5).unwrap();
        assert_eq!(geo.adj(inner).len(), 4);
        assert_eq!(geo.diag(inner).len(), 4);
    }

    #[test]
    fn test_trigon_cell_count() {
        assert_eq!(Geometry::trigon(9).points().len(), 486);
        assert_eq!(Geometry::trigon(8).points().len(), 384);
    }

    #[test]
    fn test_trigon_neighbours() {
        let geo = Geometry::trigon(9);
        // Inner triangles have 3 edge neighbours and 9 corner neighbours.
        let max_adj = geo.points().iter().map(|&p| geo.adj(p).len()).max();
        let max_diag = geo.points().iter().map(|&p| geo.diag(p).len()).max();
        assert_eq!(max_adj, Some(3));
        assert_eq!(max_diag, Some(9));
    }

    #[test]
    fn test_adjacency_is_symmetric() {
        for geo in [Geometry::square(5, 5), Geometry::trigon(3)] {
            for &p in geo.points() {
                for &q in geo.adj(p) {
                    assert!(geo.adj(q).contains(&p));
                }
                for &q in geo.diag(p) {
                    assert!(geo.diag(q).contains(&p));
                    assert!(!geo.adj(p).contains(&q));
                }
            }
        }
    }

    #[test]
    fn test_point_reflection() {
        let geo = Geometry::square(14, 14);
        let p = geo.point(4, 4).unwrap();
        assert_eq!(geo.symmetric_point(p), geo.point(9, 9).unwrap());
        for geo in [Geometry::square(14, 14), Geometry::trigon(9)] {
            assert!(geo.is_point_symmetric());
            for &p in geo.points() {
                let q = geo.symmetric_point(p);
                assert_eq!(geo.symmetric_point(q), p);
            }
        }
    }

    #[test]
    fn test_point_string_roundtrip() {
        let geo = Geometry::trigon(9);
        for &p in geo.points() {
            let s = geo.point_to_string(p);
            assert_eq!(geo.parse_point(&s), Some(p), "roundtrip of {s}");
        }
        assert_eq!(column_label(26), "aa");
        assert_eq!(geo.parse_point("zz0"), None);
        assert_eq!(geo.parse_point("pass"), None);
    }
}
