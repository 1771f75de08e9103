//! Precomputed move tables (the move catalog) of a board type.
//!
//! A move is an index into the table of all placements of all piece
//! orientations that fit on the board. For every point and piece the catalog
//! knows the moves covering that point; these lists are further split by the
//! *adjacency status* of the point (which of its edge neighbours are
//! forbidden for the color to move), so that move generation at an attach
//! point can skip candidates that would cover a forbidden neighbour.
//!
//! The filtered lists are instantiated lazily and the whole catalog is
//! shared between all boards of a board type.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use smallvec::SmallVec;
use tracing::debug;

use crate::constants::{MAX_COLORS, MAX_PIECE_SIZE};
use crate::error::MoveParseError;
use crate::geometry::{Geometry, GeometryKind, Point};
use crate::piece::{Piece, Pieces};
use crate::variant::{BoardType, Color};

/// Maximum number of edge neighbours encoded in an adjacency status.
pub const ADJ_STATUS_BITS: usize = 4;

const NU_ADJ_STATUS: usize = 1 << ADJ_STATUS_BITS;

// =============================================================================
// Moves
// =============================================================================

/// A placement of a piece, or a pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Move(u32);

impl Move {
    pub const PASS: Move = Move(u32::MAX);

    #[inline]
    pub fn new(index: usize) -> Self {
        Move(index as u32)
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub fn is_pass(self) -> bool {
        self == Move::PASS
    }

    #[inline]
    pub fn is_regular(self) -> bool {
        !self.is_pass()
    }
}

pub type MovePoints = SmallVec<[Point; MAX_PIECE_SIZE]>;

/// Piece and covered points of a move.
pub struct MoveInfo {
    piece: Piece,
    points: MovePoints,
}

impl MoveInfo {
    #[inline]
    pub fn piece(&self) -> Piece {
        self.piece
    }

    /// Covered points in increasing order.
    #[inline]
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.points.len()
    }
}

/// Neighbourhood of a move.
pub struct MoveInfoExt {
    /// Points that become attach points for the mover.
    attach_points: SmallVec<[Point; 16]>,
    /// Points that share an edge with the move.
    adj_points: SmallVec<[Point; 16]>,
}

impl MoveInfoExt {
    #[inline]
    pub fn attach_points(&self) -> &[Point] {
        &self.attach_points
    }

    #[inline]
    pub fn adj_points(&self) -> &[Point] {
        &self.adj_points
    }
}

// =============================================================================
// Board Constants
// =============================================================================

/// Geometry, pieces, starting points and move tables of a board type.
pub struct BoardConst {
    board_type: BoardType,
    geometry: Geometry,
    pieces: Pieces,
    starting_points: [Vec<Point>; MAX_COLORS],
    infos: Vec<MoveInfo>,
    ext: Vec<MoveInfoExt>,
    /// Moves of a piece covering a point, indexed by `point * nu_pieces + piece`.
    by_point: Vec<Box<[Move]>>,
    /// Lazily filtered copies of `by_point`, one per adjacency status.
    by_adj_status: Vec<OnceLock<Box<[Move]>>>,
    lookup: HashMap<MovePoints, Move>,
}

impl BoardConst {
    /// Shared instance for a board type, built on first use.
    pub fn get(board_type: BoardType) -> Arc<BoardConst> {
        static INSTANCES: [OnceLock<Arc<BoardConst>>; 4] =
            [OnceLock::new(), OnceLock::new(), OnceLock::new(), OnceLock::new()];
        INSTANCES[board_type.index()]
            .get_or_init(|| Arc::new(BoardConst::new(board_type)))
            .clone()
    }

    fn new(board_type: BoardType) -> Self {
        let (geometry, max_size) = match board_type {
            BoardType::Duo => (Geometry::square(14, 14), 5),
            BoardType::Classic => (Geometry::square(20, 20), 5),
            BoardType::Trigon => (Geometry::trigon(9), 6),
            BoardType::Trigon3 => (Geometry::trigon(8), 6),
        };
        let pieces = Pieces::polyforms(board_type.geometry_kind(), max_size);
        let starting_points = starting_points(board_type, &geometry);

        let mut infos = Vec::new();
        for piece in pieces.iter() {
            for shape in pieces.info(piece).orientations() {
                let max_x = shape.iter().map(|c| c.0).max().unwrap_or(0);
                let max_y = shape.iter().map(|c| c.1).max().unwrap_or(0);
                for dy in 0..(geometry.height() as i32 - max_y) {
                    for dx in 0..(geometry.width() as i32 - max_x) {
                        // Translations of triangles must keep their orientation.
                        if geometry.kind() == GeometryKind::Trigon && (dx + dy) % 2 != 0 {
                            continue;
                        }
                        let points: Option<MovePoints> = shape
                            .iter()
                            .map(|&(x, y)| geometry.point((x + dx) as usize, (y + dy) as usize))
                            .collect();
                        if let Some(mut points) = points {
                            points.sort_unstable();
                            infos.push(MoveInfo { piece, points });
                        }
                    }
                }
            }
        }

        let ext = infos.iter().map(|info| move_info_ext(&geometry, info)).collect();
        let nu_pieces = pieces.len();
        let mut by_point_vec: Vec<Vec<Move>> = vec![Vec::new(); geometry.range() * nu_pieces];
        let mut lookup = HashMap::with_capacity(infos.len());
        for (i, info) in infos.iter().enumerate() {
            let mv = Move::new(i);
            for &p in info.points() {
                by_point_vec[p.index() * nu_pieces + info.piece.index()].push(mv);
            }
            lookup.insert(info.points.clone(), mv);
        }
        let by_point: Vec<Box<[Move]>> =
            by_point_vec.into_iter().map(Vec::into_boxed_slice).collect();
        let by_adj_status = (0..by_point.len() * NU_ADJ_STATUS).map(|_| OnceLock::new()).collect();
        debug!(
            ?board_type,
            points = geometry.points().len(),
            pieces = nu_pieces,
            moves = infos.len(),
            "built move catalog"
        );
        Self {
            board_type,
            geometry,
            pieces,
            starting_points,
            infos,
            ext,
            by_point,
            by_adj_status,
            lookup,
        }
    }

    #[inline]
    pub fn board_type(&self) -> BoardType {
        self.board_type
    }

    #[inline]
    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    #[inline]
    pub fn pieces(&self) -> &Pieces {
        &self.pieces
    }

    #[inline]
    pub fn nu_moves(&self) -> usize {
        self.infos.len()
    }

    #[inline]
    pub fn move_info(&self, mv: Move) -> &MoveInfo {
        &self.infos[mv.index()]
    }

    #[inline]
    pub fn move_info_ext(&self, mv: Move) -> &MoveInfoExt {
        &self.ext[mv.index()]
    }

    /// Starting points of a color. In Trigon all colors share the list.
    #[inline]
    pub fn starting_points(&self, c: Color) -> &[Point] {
        &self.starting_points[c.index()]
    }

    /// All moves of `piece` covering `p`.
    #[inline]
    pub fn moves_at(&self, piece: Piece, p: Point) -> &[Move] {
        &self.by_point[p.index() * self.pieces.len() + piece.index()]
    }

    /// Moves of `piece` covering `p` that avoid every edge neighbour of `p`
    /// flagged in `adj_status` (bit `i` = `geometry.adj(p)[i]`).
    pub fn moves(&self, piece: Piece, p: Point, adj_status: u32) -> &[Move] {
        let slot = p.index() * self.pieces.len() + piece.index();
        if adj_status == 0 {
            return &self.by_point[slot];
        }
        self.by_adj_status[slot * NU_ADJ_STATUS + adj_status as usize].get_or_init(|| {
            let blocked: SmallVec<[Point; ADJ_STATUS_BITS]> = self
                .geometry
                .adj(p)
                .iter()
                .take(ADJ_STATUS_BITS)
                .enumerate()
                .filter(|(i, _)| adj_status & (1 << i) != 0)
                .map(|(_, &q)| q)
                .collect();
            self.by_point[slot]
                .iter()
                .copied()
                .filter(|&mv| {
                    let points = self.infos[mv.index()].points();
                    !blocked.iter().any(|q| points.contains(q))
                })
                .collect()
        })
    }

    /// Find the move covering exactly the given points.
    pub fn find_move(&self, points: &[Point]) -> Option<Move> {
        let mut key: MovePoints = points.iter().copied().collect();
        key.sort_unstable();
        self.lookup.get(&key).copied()
    }

    /// Move covering the point reflections of the points of `mv`.
    pub fn symmetric_move(&self, mv: Move) -> Option<Move> {
        if mv.is_pass() {
            return Some(Move::PASS);
        }
        let points: Option<MovePoints> = self
            .move_info(mv)
            .points()
            .iter()
            .map(|&p| Some(self.geometry.symmetric_point(p)).filter(|q| !q.is_null()))
            .collect();
        self.find_move(&points?)
    }

    /// Comma separated list of covered points, or `pass`.
    pub fn move_to_string(&self, mv: Move) -> String {
        if mv.is_pass() {
            return "pass".to_string();
        }
        self.move_info(mv)
            .points()
            .iter()
            .map(|&p| self.geometry.point_to_string(p))
            .collect::<Vec<_>>()
            .join(",")
    }

    pub fn move_from_string(&self, s: &str) -> Result<Move, MoveParseError> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("pass") {
            return Ok(Move::PASS);
        }
        let points = s
            .split(',')
            .map(|t| {
                self.geometry
                    .parse_point(t)
                    .ok_or_else(|| MoveParseError::InvalidPoint(t.to_string()))
            })
            .collect::<Result<MovePoints, _>>()?;
        self.find_move(&points)
            .ok_or_else(|| MoveParseError::NoSuchMove(s.to_string()))
    }
}

fn move_info_ext(geometry: &Geometry, info: &MoveInfo) -> MoveInfoExt {
    let points = info.points();
    let mut adj_points: SmallVec<[Point; 16]> = SmallVec::new();
    for &p in points {
        for &q in geometry.adj(p) {
            if !points.contains(&q) && !adj_points.contains(&q) {
                adj_points.push(q);
            }
        }
    }
    let mut attach_points: SmallVec<[Point; 16]> = SmallVec::new();
    for &p in points {
        for &q in geometry.diag(p) {
            if !points.contains(&q) && !adj_points.contains(&q) && !attach_points.contains(&q) {
                attach_points.push(q);
            }
        }
    }
    MoveInfoExt {
        attach_points,
        adj_points,
    }
}

fn starting_points(board_type: BoardType, geometry: &Geometry) -> [Vec<Point>; MAX_COLORS] {
    let at = |x: usize, y: usize| geometry.point(x, y).into_iter().collect::<Vec<_>>();
    match board_type {
        BoardType::Duo => [at(4, 4), at(9, 9), Vec::new(), Vec::new()],
        BoardType::Classic => [at(0, 0), at(19, 0), at(19, 19), at(0, 19)],
        BoardType::Trigon | BoardType::Trigon3 => {
            // Six points shared by all colors, rotations of a point straight
            // above the centre.
            let edge = geometry.height() / 2;
            let (cx, cy) = geometry.center();
            let rows = (edge - 4) as f64 * 3f64.sqrt() / 2.0;
            let mut points = Vec::new();
            if let Some(p) = geometry.nearest_point(cx, cy - rows) {
                for t in 0..6 {
                    let q = geometry.rotate_point(p, t);
                    if !q.is_null() && !points.contains(&q) {
                        points.push(q);
                    }
                }
            }
            points.sort_unstable();
            std::array::from_fn(|_| points.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variant::Variant;

    #[test]
    fn test_duo_catalog() {
        let bc = BoardConst::get(BoardType::Duo);
        assert_eq!(bc.pieces().len(), 21);
        assert!(bc.nu_moves() > 10_000);
        assert_eq!(bc.starting_points(Color(0)).len(), 1);
        let p = bc.starting_points(Color(0))[0];
        assert_eq!(bc.geometry().symmetric_point(p), bc.starting_points(Color(1))[0]);
    }

    #[test]
    fn test_geometry_matches_board_type() {
        for variant in Variant::ALL {
            let bt = variant.board_type();
            assert_eq!(BoardConst::get(bt).geometry().kind(), bt.geometry_kind());
        }
    }

    #[test]
    fn test_trigon_starting_points() {
        let bc = BoardConst::get(BoardType::Trigon);
        assert_eq!(bc.starting_points(Color(0)).len(), 6);
        assert_eq!(bc.starting_points(Color(0)), bc.starting_points(Color(3)));
    }

    #[test]
    fn test_adj_status_filter() {
        let bc = BoardConst::get(BoardType::Duo);
        let geo = bc.geometry();
        let p = geo.point(6, 6).unwrap();
        for piece in bc.pieces().iter() {
            let all = bc.moves(piece, p, 0);
            for status in 1..16u32 {
                let filtered = bc.moves(piece, p, status);
                assert!(filtered.len() <= all.len());
                for &mv in filtered {
                    for (i, q) in geo.adj(p).iter().enumerate() {
                        if status & (1 << i) != 0 {
                            assert!(!bc.move_info(mv).points().contains(q));
                        }
                    }
                }
            }
            // A fully blocked neighbourhood only leaves the single-cell piece.
            let blocked = bc.moves(piece, p, 15);
            if bc.pieces().info(piece).size() > 1 {
                assert!(blocked.is_empty());
            } else {
                assert_eq!(blocked.len(), 1);
            }
        }
    }

    #[test]
    fn test_move_string_roundtrip() {
        let bc = BoardConst::get(BoardType::Trigon);
        for i in (0..bc.nu_moves()).step_by(97) {
            let mv = Move::new(i);
            let s = bc.move_to_string(mv);
            assert_eq!(bc.move_from_string(&s), Ok(mv));
        }
        assert_eq!(bc.move_from_string("pass"), Ok(Move::PASS));
        assert!(bc.move_from_string("a1,zz99").is_err());
    }

    #[test]
    fn test_symmetric_move() {
        let bc = BoardConst::get(BoardType::Duo);
        for i in (0..bc.nu_moves()).step_by(31) {
            let mv = Move::new(i);
            let sym = bc.symmetric_move(mv).unwrap();
            assert_eq!(bc.symmetric_move(sym), Some(mv));
            assert_eq!(bc.move_info(sym).piece(), bc.move_info(mv).piece());
        }
    }
}
