//! Board state and move execution.
//!
//! This module provides the core game logic, including:
//! - Per-cell occupancy and per-color pieces left and points
//! - Incrementally maintained *forbidden* bitmaps: a point is forbidden for a
//!   color if it is occupied or shares an edge with a cell of that color
//! - Attach point lists (corner neighbours of a color's pieces)
//! - A snapshot that simulations restore instead of copying the source board
//!
//! Playing a move only touches the covered points and their neighbours; the
//! board is never rescanned.

use std::fmt;
use std::sync::Arc;

use crate::catalog::{BoardConst, Move};
use crate::constants::{BONUS_ALL_PIECES, BONUS_ONE_PIECE_LAST, MAX_COLORS, MAX_GAME_LEN};
use crate::error::MoveParseError;
use crate::geometry::{Geometry, Point};
use crate::piece::{Piece, PieceMask};
use crate::variant::{Color, Variant};

/// A move together with the color that played it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ColorMove {
    pub color: Color,
    pub mv: Move,
}

impl ColorMove {
    pub fn new(color: Color, mv: Move) -> Self {
        Self { color, mv }
    }
}

/// The fields restored by `restore_snapshot`.
#[derive(Clone, PartialEq)]
struct BoardState {
    to_play: Color,
    point_state: Vec<Option<Color>>,
    forbidden: [Vec<bool>; MAX_COLORS],
    is_attach_point: [Vec<bool>; MAX_COLORS],
    attach_points: [Vec<Point>; MAX_COLORS],
    pieces_left: [PieceMask; MAX_COLORS],
    nu_onboard: [u32; MAX_COLORS],
    points: [u32; MAX_COLORS],
    bonus: [u32; MAX_COLORS],
    nu_onboard_pieces: u32,
    moves: Vec<ColorMove>,
}

impl BoardState {
    fn new(range: usize, all_pieces: PieceMask) -> Self {
        Self {
            to_play: Color(0),
            point_state: vec![None; range],
            forbidden: std::array::from_fn(|_| vec![false; range]),
            is_attach_point: std::array::from_fn(|_| vec![false; range]),
            attach_points: std::array::from_fn(|_| Vec::new()),
            pieces_left: [all_pieces; MAX_COLORS],
            nu_onboard: [0; MAX_COLORS],
            points: [0; MAX_COLORS],
            bonus: [0; MAX_COLORS],
            nu_onboard_pieces: 0,
            moves: Vec::with_capacity(MAX_GAME_LEN),
        }
    }

    /// Copy from `other` reusing the allocated storage.
    fn assign(&mut self, other: &BoardState) {
        self.to_play = other.to_play;
        self.point_state.clone_from(&other.point_state);
        for i in 0..MAX_COLORS {
            self.forbidden[i].clone_from(&other.forbidden[i]);
            self.is_attach_point[i].clone_from(&other.is_attach_point[i]);
            self.attach_points[i].clone_from(&other.attach_points[i]);
        }
        self.pieces_left = other.pieces_left;
        self.nu_onboard = other.nu_onboard;
        self.points = other.points;
        self.bonus = other.bonus;
        self.nu_onboard_pieces = other.nu_onboard_pieces;
        self.moves.clone_from(&other.moves);
    }
}

/// A game position.
pub struct Board {
    variant: Variant,
    bc: Arc<BoardConst>,
    state: BoardState,
    snapshot: Option<BoardState>,
}

impl Clone for Board {
    fn clone(&self) -> Self {
        Self {
            variant: self.variant,
            bc: self.bc.clone(),
            state: self.state.clone(),
            snapshot: None,
        }
    }
}

impl PartialEq for Board {
    fn eq(&self, other: &Self) -> bool {
        self.variant == other.variant && self.state == other.state
    }
}

impl Board {
    /// An empty board of the given variant.
    pub fn new(variant: Variant) -> Self {
        let bc = BoardConst::get(variant.board_type());
        let state = BoardState::new(bc.geometry().range(), bc.pieces().all());
        Self {
            variant,
            bc,
            state,
            snapshot: None,
        }
    }

    /// Set up a board by playing a sequence of moves with explicit colors.
    pub fn from_moves(variant: Variant, moves: &[ColorMove]) -> Self {
        let mut bd = Self::new(variant);
        for cm in moves {
            bd.play(cm.color, cm.mv);
        }
        bd
    }

    /// Make this board equal to `other` (snapshot excluded).
    pub fn copy_from(&mut self, other: &Board) {
        if self.variant != other.variant {
            *self = other.clone();
            return;
        }
        self.state.assign(&other.state);
    }

    // =========================================================================
    // Snapshot
    // =========================================================================

    pub fn take_snapshot(&mut self) {
        match &mut self.snapshot {
            Some(s) => s.assign(&self.state),
            None => self.snapshot = Some(self.state.clone()),
        }
    }

    /// Return to the state of the last `take_snapshot`. Does nothing if no
    /// snapshot was taken.
    pub fn restore_snapshot(&mut self) {
        if let Some(s) = &self.snapshot {
            self.state.assign(s);
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    #[inline]
    pub fn variant(&self) -> Variant {
        self.variant
    }

    #[inline]
    pub fn board_const(&self) -> &Arc<BoardConst> {
        &self.bc
    }

    #[inline]
    pub fn geometry(&self) -> &Geometry {
        self.bc.geometry()
    }

    #[inline]
    pub fn nu_colors(&self) -> u8 {
        self.variant.nu_colors()
    }

    #[inline]
    pub fn nu_players(&self) -> u8 {
        self.variant.nu_players()
    }

    #[inline]
    pub fn to_play(&self) -> Color {
        self.state.to_play
    }

    #[inline]
    pub fn set_to_play(&mut self, c: Color) {
        self.state.to_play = c;
    }

    #[inline]
    pub fn next(&self, c: Color) -> Color {
        self.variant.next(c)
    }

    #[inline]
    pub fn second_color(&self, c: Color) -> Color {
        self.variant.second_color(c)
    }

    #[inline]
    pub fn point_state(&self, p: Point) -> Option<Color> {
        self.state.point_state[p.index()]
    }

    #[inline]
    pub fn is_forbidden(&self, p: Point, c: Color) -> bool {
        self.state.forbidden[c.index()][p.index()]
    }

    /// Forbidden bitmap of a color, indexed by point.
    #[inline]
    pub fn forbidden(&self, c: Color) -> &[bool] {
        &self.state.forbidden[c.index()]
    }

    /// Attach points of a color. May contain points that became forbidden.
    #[inline]
    pub fn attach_points(&self, c: Color) -> &[Point] {
        &self.state.attach_points[c.index()]
    }

    #[inline]
    pub fn is_attach_point(&self, p: Point, c: Color) -> bool {
        self.state.is_attach_point[c.index()][p.index()]
    }

    #[inline]
    pub fn pieces_left(&self, c: Color) -> PieceMask {
        self.state.pieces_left[c.index()]
    }

    #[inline]
    pub fn is_piece_left(&self, c: Color, piece: Piece) -> bool {
        self.state.pieces_left[c.index()].contains(piece)
    }

    #[inline]
    pub fn is_first_piece(&self, c: Color) -> bool {
        self.state.nu_onboard[c.index()] == 0
    }

    #[inline]
    pub fn nu_onboard_pieces(&self) -> u32 {
        self.state.nu_onboard_pieces
    }

    #[inline]
    pub fn nu_onboard_pieces_of(&self, c: Color) -> u32 {
        self.state.nu_onboard[c.index()]
    }

    /// Number of moves (including passes) played.
    #[inline]
    pub fn nu_moves(&self) -> usize {
        self.state.moves.len()
    }

    #[inline]
    pub fn moves(&self) -> &[ColorMove] {
        &self.state.moves
    }

    #[inline]
    pub fn starting_points(&self, c: Color) -> &[Point] {
        self.bc.starting_points(c)
    }

    /// Cells on board plus bonus.
    #[inline]
    pub fn points(&self, c: Color) -> u32 {
        self.state.points[c.index()] + self.state.bonus[c.index()]
    }

    /// Score of color `c`: team points difference in two-player variants,
    /// otherwise own points minus the best points of the other colors.
    pub fn score(&self, c: Color) -> i32 {
        if self.nu_players() == 2 {
            let team = |c: Color| {
                let second = self.second_color(c);
                let mut pts = self.points(c) as i32;
                if second != c {
                    pts += self.points(second) as i32;
                }
                pts
            };
            team(c) - team(self.next(c))
        } else {
            let best_other = self
                .variant
                .colors()
                .filter(|&o| o != c)
                .map(|o| self.points(o) as i32)
                .max()
                .unwrap_or(0);
            self.points(c) as i32 - best_other
        }
    }

    /// Bit `i` is set if the `i`-th edge neighbour of `p` is forbidden for `c`.
    #[inline]
    pub fn adj_status(&self, p: Point, c: Color) -> u32 {
        let forbidden = &self.state.forbidden[c.index()];
        self.geometry()
            .adj(p)
            .iter()
            .take(crate::catalog::ADJ_STATUS_BITS)
            .enumerate()
            .fold(0, |status, (i, q)| {
                status | ((forbidden[q.index()] as u32) << i)
            })
    }

    // =========================================================================
    // Legality
    // =========================================================================

    /// Check if `c` may play `mv`. Passing is always legal.
    pub fn is_legal(&self, c: Color, mv: Move) -> bool {
        if mv.is_pass() {
            return true;
        }
        let info = self.bc.move_info(mv);
        if !self.is_piece_left(c, info.piece()) {
            return false;
        }
        let forbidden = &self.state.forbidden[c.index()];
        if info.points().iter().any(|p| forbidden[p.index()]) {
            return false;
        }
        if self.is_first_piece(c) {
            let starting = self.starting_points(c);
            info.points().iter().any(|p| starting.contains(p))
        } else {
            let attach = &self.state.is_attach_point[c.index()];
            info.points().iter().any(|p| attach[p.index()])
        }
    }

    /// Legality of a move for the color to play.
    #[inline]
    pub fn is_legal_nonpass(&self, mv: Move) -> bool {
        mv.is_regular() && self.is_legal(self.to_play(), mv)
    }

    /// Generate all legal moves of `c` (without pass) into `moves`.
    pub fn gen_moves(&self, c: Color, moves: &mut Vec<Move>) {
        moves.clear();
        let pieces_left = self.pieces_left(c);
        let forbidden = &self.state.forbidden[c.index()];
        let fits = |mv: &Move| {
            self.bc
                .move_info(*mv)
                .points()
                .iter()
                .all(|p| !forbidden[p.index()])
        };
        if self.is_first_piece(c) {
            for &p in self.starting_points(c) {
                if forbidden[p.index()] {
                    continue;
                }
                for piece in pieces_left.iter() {
                    moves.extend(self.bc.moves_at(piece, p).iter().filter(|mv| fits(mv)));
                }
            }
        } else {
            for &p in self.attach_points(c) {
                if forbidden[p.index()] {
                    continue;
                }
                let adj_status = self.adj_status(p, c);
                for piece in pieces_left.iter() {
                    moves.extend(
                        self.bc
                            .moves(piece, p, adj_status)
                            .iter()
                            .filter(|mv| fits(mv)),
                    );
                }
            }
        }
        moves.sort_unstable();
        moves.dedup();
    }

    pub fn has_moves(&self, c: Color) -> bool {
        let mut moves = Vec::new();
        self.gen_moves(c, &mut moves);
        !moves.is_empty()
    }

    /// The game is over when no color can place a piece.
    pub fn is_game_over(&self) -> bool {
        self.variant.colors().all(|c| !self.has_moves(c))
    }

    // =========================================================================
    // Playing Moves
    // =========================================================================

    /// Play a move for color `c` and give the turn to the next color.
    pub fn play(&mut self, c: Color, mv: Move) {
        if mv.is_pass() {
            self.state.to_play = c;
            self.play_pass();
            return;
        }
        self.state.to_play = c;
        self.play_nonpass(mv);
    }

    /// Play a piece placement for the color to play.
    ///
    /// Updates occupancy, points and pieces left, marks the covered points
    /// forbidden for all colors and their edge neighbours forbidden for the
    /// mover, and records new attach points.
    pub fn play_nonpass(&mut self, mv: Move) {
        debug_assert!(mv.is_regular());
        let c = self.state.to_play;
        let ci = c.index();
        let bc = Arc::clone(&self.bc);
        let info = bc.move_info(mv);
        let ext = bc.move_info_ext(mv);
        let nu_colors = self.nu_colors() as usize;
        for &p in info.points() {
            self.state.point_state[p.index()] = Some(c);
            for forbidden in &mut self.state.forbidden[..nu_colors] {
                forbidden[p.index()] = true;
            }
        }
        for &q in ext.adj_points() {
            self.state.forbidden[ci][q.index()] = true;
        }
        for &q in ext.attach_points() {
            if !self.state.forbidden[ci][q.index()] && !self.state.is_attach_point[ci][q.index()] {
                self.state.is_attach_point[ci][q.index()] = true;
                self.state.attach_points[ci].push(q);
            }
        }
        let piece = info.piece();
        self.state.pieces_left[ci].remove(piece);
        self.state.nu_onboard[ci] += 1;
        self.state.nu_onboard_pieces += 1;
        self.state.points[ci] += info.size() as u32;
        if self.state.pieces_left[ci].is_empty() {
            self.state.bonus[ci] = BONUS_ALL_PIECES;
            if info.size() == 1 {
                self.state.bonus[ci] += BONUS_ONE_PIECE_LAST;
            }
        }
        self.state.moves.push(ColorMove::new(c, mv));
        self.state.to_play = self.next(c);
    }

    /// Record a pass of the color to play.
    pub fn play_pass(&mut self) {
        let c = self.state.to_play;
        self.state.moves.push(ColorMove::new(c, Move::PASS));
        self.state.to_play = self.next(c);
    }

    // =========================================================================
    // Move Strings
    // =========================================================================

    pub fn move_to_string(&self, mv: Move) -> String {
        self.bc.move_to_string(mv)
    }

    pub fn move_from_string(&self, s: &str) -> Result<Move, MoveParseError> {
        self.bc.move_from_string(s)
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const SYMBOLS: [char; MAX_COLORS] = ['X', 'O', '#', '@'];
        let geo = self.geometry();
        for y in 0..geo.height() {
            for x in 0..geo.width() {
                let ch = match geo.point(x, y) {
                    None => ' ',
                    Some(p) => match self.point_state(p) {
                        Some(c) => SYMBOLS[c.index()],
                        None if self.starting_points(self.to_play()).contains(&p) => '+',
                        None => '.',
                    },
                };
                write!(f, "{ch}")?;
                if geo.kind() == crate::geometry::GeometryKind::Square {
                    write!(f, " ")?;
                }
            }
            writeln!(f)?;
        }
        for c in self.variant.colors() {
            writeln!(
                f,
                "{} {}: {} points, {} pieces left",
                SYMBOLS[c.index()],
                c,
                self.points(c),
                self.pieces_left(c).len()
            )?;
        }
        Ok(())
    }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Board")
            .field("variant", &self.variant)
            .field("to_play", &self.state.to_play)
            .field("nu_moves", &self.nu_moves())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first_legal(bd: &Board) -> Move {
        let mut moves = Vec::new();
        bd.gen_moves(bd.to_play(), &mut moves);
        moves[0]
    }

    #[test]
    fn test_empty_board() {
        let bd = Board::new(Variant::Duo);
        assert_eq!(bd.nu_moves(), 0);
        assert_eq!(bd.to_play(), Color(0));
        assert!(bd.is_first_piece(Color(0)));
        assert_eq!(bd.pieces_left(Color(1)).len(), 21);
        assert_eq!(bd.score(Color(0)), 0);
    }

    #[test]
    fn test_first_move_must_cover_starting_point() {
        let bd = Board::new(Variant::Duo);
        let mut moves = Vec::new();
        bd.gen_moves(Color(0), &mut moves);
        assert!(!moves.is_empty());
        let start = bd.starting_points(Color(0))[0];
        for &mv in &moves {
            assert!(bd.board_const().move_info(mv).points().contains(&start));
            assert!(bd.is_legal(Color(0), mv));
        }
    }

    #[test]
    fn test_play_updates_forbidden() {
        let mut bd = Board::new(Variant::Duo);
        let mv = first_legal(&bd);
        bd.play(Color(0), mv);
        let bc = bd.board_const().clone();
        for &p in bc.move_info(mv).points() {
            assert_eq!(bd.point_state(p), Some(Color(0)));
            assert!(bd.is_forbidden(p, Color(0)));
            assert!(bd.is_forbidden(p, Color(1)));
        }
        for &q in bc.move_info_ext(mv).adj_points() {
            assert!(bd.is_forbidden(q, Color(0)));
        }
        assert_eq!(bd.to_play(), Color(1));
        assert!(!bd.is_legal(Color(0), mv));
        assert_eq!(bd.points(Color(0)), bc.move_info(mv).size() as u32);
    }

    #[test]
    fn test_snapshot_restore() {
        let mut bd = Board::new(Variant::Classic);
        let mv = first_legal(&bd);
        bd.play(Color(0), mv);
        let before = bd.clone();
        bd.take_snapshot();
        let mv = first_legal(&bd);
        bd.play_nonpass(mv);
        bd.play_pass();
        assert!(bd != before);
        bd.restore_snapshot();
        assert!(bd == before);
    }

    #[test]
    fn test_score_two_players() {
        let mut bd = Board::new(Variant::Classic2);
        let mv = first_legal(&bd);
        bd.play(Color(0), mv);
        let size = bd.board_const().move_info(mv).size() as i32;
        assert_eq!(bd.score(Color(0)), size);
        assert_eq!(bd.score(Color(2)), size);
        assert_eq!(bd.score(Color(1)), -size);
    }

    #[test]
    fn test_move_string() {
        let mut bd = Board::new(Variant::Trigon);
        let mv = first_legal(&bd);
        let s = bd.move_to_string(mv);
        assert_eq!(bd.move_from_string(&s), Ok(mv));
        bd.play(Color(0), mv);
        assert!(format!("{bd}").contains('X'));
    }
}
