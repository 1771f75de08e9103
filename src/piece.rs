//! Piece catalogs generated by enumerating free polyforms.
//!
//! The square variants use all free polyominoes up to size 5 (21 pieces) and
//! the triangle variants all free polyiamonds up to size 6 (22 pieces).
//! Each piece keeps the list of its distinct orientations, normalized so that
//! the smallest row is 0 and the cells keep their up/down orientation.

use std::collections::{BTreeMap, BTreeSet};

use crate::geometry::GeometryKind;

/// Cell coordinates of a piece orientation, sorted.
pub type Shape = Vec<(i32, i32)>;

/// Identifier of a piece within a [`Pieces`] catalog.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Piece(pub u8);

impl Piece {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

pub struct PieceInfo {
    size: usize,
    nu_attach_points: usize,
    orientations: Vec<Shape>,
}

impl PieceInfo {
    /// Number of cells.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of corner-only neighbours of the piece on an unbounded grid.
    pub fn nu_attach_points(&self) -> usize {
        self.nu_attach_points
    }

    pub fn orientations(&self) -> &[Shape] {
        &self.orientations
    }
}

/// The fixed piece catalog of a geometry.
pub struct Pieces {
    infos: Vec<PieceInfo>,
}

impl Pieces {
    /// All free polyforms of size `1..=max_size` on the lattice of `kind`,
    /// ordered by size.
    pub fn polyforms(kind: GeometryKind, max_size: usize) -> Self {
        let mut fixed: BTreeSet<Shape> = BTreeSet::new();
        let mut level: BTreeSet<Shape> = match kind {
            GeometryKind::Square => [vec![(0, 0)]].into(),
            GeometryKind::Trigon => [vec![(0, 0)], vec![(1, 0)]].into(),
        };
        for size in 1..=max_size {
            fixed.extend(level.iter().cloned());
            if size == max_size {
                break;
            }
            let mut next = BTreeSet::new();
            for shape in &level {
                for &(x, y) in shape {
                    for n in kind.lattice_adj(x, y) {
                        if shape.contains(&n) {
                            continue;
                        }
                        let mut grown = shape.clone();
                        grown.push(n);
                        next.insert(normalize(kind, &grown));
                    }
                }
            }
            level = next;
        }

        // Group fixed shapes by their canonical free shape.
        let mut free: BTreeMap<(usize, Shape), BTreeSet<Shape>> = BTreeMap::new();
        for shape in fixed {
            let orientations: BTreeSet<Shape> = (0..kind.nu_transforms())
                .map(|t| transform(kind, t, &shape))
                .collect();
            let canonical = orientations.iter().next().cloned().unwrap_or_default();
            free.entry((shape.len(), canonical))
                .or_default()
                .extend(orientations);
        }

        let mut infos = Vec::with_capacity(free.len());
        for ((size, canonical), orientations) in free {
            infos.push(PieceInfo {
                size,
                nu_attach_points: count_attach_points(kind, &canonical),
                orientations: orientations.into_iter().collect(),
            });
        }
        Self { infos }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.infos.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.infos.is_empty()
    }

    #[inline]
    pub fn info(&self, piece: Piece) -> &PieceInfo {
        &self.infos[piece.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = Piece> + '_ {
        (0..self.infos.len()).map(|i| Piece(i as u8))
    }

    pub fn max_size(&self) -> usize {
        self.infos.iter().map(|i| i.size).max().unwrap_or(0)
    }

    /// The single-cell piece, if the catalog has one.
    pub fn one_cell_piece(&self) -> Option<Piece> {
        self.iter().find(|&p| self.info(p).size == 1)
    }

    pub fn all(&self) -> PieceMask {
        PieceMask((1u32 << self.infos.len()) - 1)
    }
}

/// Translate a shape so that its smallest row and column are 0, keeping the
/// orientation of triangles.
fn normalize(kind: GeometryKind, cells: &[(i32, i32)]) -> Shape {
    let min_x = cells.iter().map(|c| c.0).min().unwrap_or(0);
    let min_y = cells.iter().map(|c| c.1).min().unwrap_or(0);
    let mut dx = -min_x;
    let dy = -min_y;
    if kind == GeometryKind::Trigon && (dx + dy).rem_euclid(2) != 0 {
        dx += 1;
    }
    let mut shape: Shape = cells.iter().map(|&(x, y)| (x + dx, y + dy)).collect();
    shape.sort_unstable();
    shape
}

fn transform(kind: GeometryKind, t: usize, shape: &[(i32, i32)]) -> Shape {
    let cells: Vec<_> = shape
        .iter()
        .map(|&(x, y)| kind.transform_cell(t, x, y))
        .collect();
    normalize(kind, &cells)
}

fn count_attach_points(kind: GeometryKind, shape: &[(i32, i32)]) -> usize {
    let mut adj = BTreeSet::new();
    let mut diag = BTreeSet::new();
    for &(x, y) in shape {
        adj.extend(kind.lattice_adj(x, y));
        diag.extend(kind.lattice_diag(x, y));
    }
    diag.iter()
        .filter(|c| !shape.contains(c) && !adj.contains(c))
        .count()
}

// =============================================================================
// Piece Masks
// =============================================================================

/// Set of pieces as a bit mask (catalogs have at most 32 pieces).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct PieceMask(u32);

impl PieceMask {
    pub const EMPTY: PieceMask = PieceMask(0);

    #[inline]
    pub fn contains(self, piece: Piece) -> bool {
        self.0 & (1 << piece.0) != 0
    }

    #[inline]
    pub fn insert(&mut self, piece: Piece) {
        self.0 |= 1 << piece.0;
    }

    #[inline]
    pub fn remove(&mut self, piece: Piece) {
        self.0 &= !(1 << piece.0);
    }

    #[inline]
    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub fn intersect(self, other: PieceMask) -> PieceMask {
        PieceMask(self.0 & other.0)
    }

    #[inline]
    pub fn difference(self, other: PieceMask) -> PieceMask {
        PieceMask(self.0 & !other.0)
    }

    pub fn iter(self) -> impl Iterator<Item = Piece> {
        let mut bits = self.0;
        std::iter::from_fn(move || {
            if bits == 0 {
                return None;
            }
            let i = bits.trailing_zeros();
            bits &= bits - 1;
            Some(Piece(i as u8))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_polyomino_catalog() {
        let pieces = Pieces::polyforms(GeometryKind::Square, 5);
        assert_eq!(pieces.len(), 21);
        let sizes: Vec<usize> = pieces.iter().map(|p| pieces.info(p).size()).collect();
        let count = |s| sizes.iter().filter(|&&x| x == s).count();
        assert_eq!([count(1), count(2), count(3), count(4), count(5)], [1, 1, 2, 5, 12]);
        // Fixed pentominoes: 63
        let fixed5: usize = pieces
            .iter()
            .filter(|&p| pieces.info(p).size() == 5)
            .map(|p| pieces.info(p).orientations().len())
            .sum();
        assert_eq!(fixed5, 63);
    }

    #[test]
    fn test_polyiamond_catalog() {
        let pieces = Pieces::polyforms(GeometryKind::Trigon, 6);
        assert_eq!(pieces.len(), 22);
        let sizes: Vec<usize> = pieces.iter().map(|p| pieces.info(p).size()).collect();
        let count = |s| sizes.iter().filter(|&&x| x == s).count();
        assert_eq!(
            [count(1), count(2), count(3), count(4), count(5), count(6)],
            [1, 1, 1, 3, 4, 12]
        );
        let one = pieces.one_cell_piece().unwrap();
        assert_eq!(pieces.info(one).orientations().len(), 2);
    }

    #[test]
    fn test_attach_points_of_monomino() {
        let pieces = Pieces::polyforms(GeometryKind::Square, 5);
        let one = pieces.one_cell_piece().unwrap();
        assert_eq!(pieces.info(one).nu_attach_points(), 4);
        let tri = Pieces::polyforms(GeometryKind::Trigon, 6);
        let one = tri.one_cell_piece().unwrap();
        assert_eq!(tri.info(one).nu_attach_points(), 9);
    }

    #[test]
    fn test_piece_mask() {
        let mut mask = PieceMask::EMPTY;
        mask.insert(Piece(3));
        mask.insert(Piece(7));
        assert_eq!(mask.len(), 2);
        assert!(mask.contains(Piece(3)));
        mask.remove(Piece(3));
        assert_eq!(mask.iter().collect::<Vec<_>>(), vec![Piece(7)]);
    }
}
