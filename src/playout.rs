//! Simulation state of one search worker: playouts and their evaluation.
//!
//! A playout completes the game from a node of the tree by sampling moves
//! from a weighted list of the legal moves of the color to play. The lists
//! are kept per color and updated incrementally: a move in the list stays
//! legal as long as none of its points became forbidden, and new moves can
//! only appear at the attach points of the mover's own new pieces.
//!
//! The weight (gamma) of a move prefers large pieces with many attach
//! points and, much more strongly, moves that occupy attach points that the
//! opponents gained with their last moves.

use std::sync::Arc;

use fastrand::Rng;
use tracing::trace;

use crate::board::{Board, ColorMove};
use crate::catalog::{BoardConst, Move, MoveInfo};
use crate::constants::{
    GAMMA_ADJ_ATTACH, GAMMA_LOCAL_ATTACH, LENGTH_MODIFICATION, LGR_HASH_SIZE, MAX_COLORS,
    MAX_PIECE_SIZE, SIGMOID_STEEPNESS,
};
use crate::geometry::Point;
use crate::piece::PieceMask;
use crate::shared::SharedConst;
use crate::stats::Statistics;
use crate::symmetry::mirror_color;
use crate::variant::Color;

/// Evaluation of a finished playout, indexed by color.
pub type Eval = [f32; MAX_COLORS];

/// Weight of a piece independent of the position.
pub fn piece_gamma(size_factor: f64, attach_factor: f64, size: usize, nu_attach: usize) -> f64 {
    size_factor.powi(size as i32 - 1) * attach_factor.powi(nu_attach as i32 - 1)
}

#[inline]
fn sigmoid(steepness: f32, x: f32) -> f32 {
    -1.0 + 2.0 / (1.0 + (-steepness * x).exp())
}

/// Game result of each color in a game with more than two players.
///
/// The points are ranked in ascending order and rank `r` of `n` gets the
/// result `r / (n - 1)`. Equal points share the average of their ranks.
pub fn game_results(points: &[f32]) -> Eval {
    let n = points.len();
    let mut sorted = [0f32; MAX_COLORS];
    sorted[..n].copy_from_slice(points);
    sorted[..n].sort_by(f32::total_cmp);
    let mut result = [0f32; MAX_COLORS];
    for (i, &p) in points.iter().enumerate() {
        let (sum, count) = sorted[..n]
            .iter()
            .enumerate()
            .filter(|&(_, &q)| q == p)
            .fold((0f32, 0f32), |(sum, count), (j, _)| {
                (sum + j as f32 / (n - 1) as f32, count + 1.0)
            });
        result[i] = sum / count;
    }
    result
}

// =============================================================================
// Local Value
// =============================================================================

const LOCAL_ATTACH: u8 = 1;
const LOCAL_ADJ: u8 = 2;

/// Marks the attach points that the opponents gained with their last moves
/// and the edge neighbours of those points.
struct LocalValue {
    marks: Vec<u8>,
    marked: Vec<Point>,
}

impl LocalValue {
    fn new(range: usize) -> Self {
        Self {
            marks: vec![0; range],
            marked: Vec::new(),
        }
    }

    fn resize(&mut self, range: usize) {
        self.marks.clear();
        self.marks.resize(range, 0);
        self.marked.clear();
    }

    fn init(&mut self, bd: &Board) {
        for p in self.marked.drain(..) {
            self.marks[p.index()] = 0;
        }
        let c = bd.to_play();
        let second = bd.second_color(c);
        let bc = bd.board_const();
        let geo = bd.geometry();
        for cm in bd.moves().iter().rev().take(bd.nu_colors() as usize - 1) {
            if cm.color == c || cm.color == second {
                break;
            }
            if cm.mv.is_pass() {
                continue;
            }
            for &p in bc.move_info_ext(cm.mv).attach_points() {
                if bd.is_forbidden(p, cm.color) {
                    continue;
                }
                self.mark(p, LOCAL_ATTACH);
                for &q in geo.adj(p) {
                    self.mark(q, LOCAL_ADJ);
                }
            }
        }
    }

    #[inline]
    fn mark(&mut self, p: Point, flag: u8) {
        let m = &mut self.marks[p.index()];
        if *m == 0 {
            self.marked.push(p);
        }
        *m |= flag;
    }
}

// =============================================================================
// Gamma
// =============================================================================

struct GammaTable {
    piece: Vec<f64>,
    nu_attach: [f64; MAX_PIECE_SIZE + 1],
}

impl GammaTable {
    fn new(bc: &BoardConst, size_factor: f64, attach_factor: f64) -> Self {
        let pieces = bc.pieces();
        let piece = pieces
            .iter()
            .map(|piece| {
                let info = pieces.info(piece);
                piece_gamma(size_factor, attach_factor, info.size(), info.nu_attach_points())
            })
            .collect();
        Self {
            piece,
            nu_attach: std::array::from_fn(|i| GAMMA_LOCAL_ATTACH.powi(i as i32)),
        }
    }

    /// Gamma of a move, or `None` if one of its points is forbidden.
    #[inline]
    fn check_move(&self, forbidden: &[bool], info: &MoveInfo, local: &LocalValue) -> Option<f64> {
        let mut nu_attach = 0;
        let mut has_adj = false;
        for &p in info.points() {
            if forbidden[p.index()] {
                return None;
            }
            let m = local.marks[p.index()];
            nu_attach += (m & LOCAL_ATTACH != 0) as usize;
            has_adj |= m & LOCAL_ADJ != 0;
        }
        let mut gamma = self.piece[info.piece().index()];
        if nu_attach > 0 || has_adj {
            gamma *= self.nu_attach[nu_attach];
            if has_adj {
                gamma *= GAMMA_ADJ_ATTACH;
            }
        }
        Some(gamma)
    }
}

/// Cumulative gamma of the move list that was built last.
#[derive(Default)]
struct CumulativeGamma {
    total: f64,
    cumulative: Vec<f64>,
}

impl CumulativeGamma {
    #[inline]
    fn clear(&mut self) {
        self.total = 0.0;
        self.cumulative.clear();
    }

    #[inline]
    fn add(&mut self, gamma: f64) {
        self.total += gamma;
        self.cumulative.push(self.total);
    }

    /// Inverse CDF sampling.
    fn sample(&self, rng: &mut Rng) -> usize {
        let r = self.total * rng.f64();
        self.cumulative
            .partition_point(|&g| g < r)
            .min(self.cumulative.len().saturating_sub(1))
    }
}

// =============================================================================
// Last Good Reply
// =============================================================================

/// Replies that won the last playout in which their context occurred, for
/// the context of the last move (LGR1) and of the last two moves (LGR2).
#[derive(Default)]
struct LastGoodReply {
    nu_moves: usize,
    lgr1: Vec<Move>,
    lgr2: Vec<(Move, Move, Move)>,
}

impl LastGoodReply {
    fn init(&mut self, nu_moves: usize) {
        self.nu_moves = nu_moves;
        self.lgr1.clear();
        self.lgr1.resize(MAX_COLORS * nu_moves, Move::PASS);
        self.lgr2.clear();
        self.lgr2
            .resize(MAX_COLORS * LGR_HASH_SIZE, (Move::PASS, Move::PASS, Move::PASS));
    }

    #[inline]
    fn index1(&self, c: Color, last: Move) -> usize {
        c.index() * self.nu_moves + last.index()
    }

    #[inline]
    fn index2(&self, c: Color, last2: Move, last: Move) -> usize {
        let h = (last2.index() as u64)
            .wrapping_mul(0x9e37_79b9_7f4a_7c15)
            .wrapping_add(last.index() as u64);
        c.index() * LGR_HASH_SIZE + (h as usize & (LGR_HASH_SIZE - 1))
    }

    /// `(lgr1, lgr2)` replies of `c` after `last2`, `last`.
    fn get(&self, c: Color, last2: Move, last: Move) -> (Move, Move) {
        if last.is_pass() {
            return (Move::PASS, Move::PASS);
        }
        let lgr1 = self.lgr1[self.index1(c, last)];
        let lgr2 = if last2.is_pass() {
            Move::PASS
        } else {
            let (a, b, reply) = self.lgr2[self.index2(c, last2, last)];
            if a == last2 && b == last { reply } else { Move::PASS }
        };
        (lgr1, lgr2)
    }

    fn store(&mut self, c: Color, last2: Move, last: Move, reply: Move) {
        let i = self.index1(c, last);
        self.lgr1[i] = reply;
        if last2.is_regular() {
            let i = self.index2(c, last2, last);
            self.lgr2[i] = (last2, last, reply);
        }
    }

    fn forget(&mut self, c: Color, last2: Move, last: Move, reply: Move) {
        let i = self.index1(c, last);
        if self.lgr1[i] == reply {
            self.lgr1[i] = Move::PASS;
        }
        if last2.is_regular() {
            let i = self.index2(c, last2, last);
            if self.lgr2[i] == (last2, last, reply) {
                self.lgr2[i] = (Move::PASS, Move::PASS, Move::PASS);
            }
        }
    }
}

// =============================================================================
// Simulation State
// =============================================================================

/// Per-worker state for running simulations from the search root.
pub struct SimulationState {
    shared: Arc<SharedConst>,
    bd: Board,
    bc: Arc<BoardConst>,
    rng: Rng,
    nu_colors: usize,
    nu_moves_initial: usize,

    moves: [Vec<Move>; MAX_COLORS],
    marker: [Vec<bool>; MAX_COLORS],
    new_moves: [Vec<Move>; MAX_COLORS],
    moves_added_at: [Vec<bool>; MAX_COLORS],
    is_move_list_initialized: [bool; MAX_COLORS],
    has_moves: [bool; MAX_COLORS],
    is_piece_considered: [PieceMask; MAX_COLORS],
    force_consider_all_pieces: bool,
    gamma: GammaTable,
    cumulative: CumulativeGamma,
    local_value: LocalValue,

    nu_passes: usize,
    is_symmetry_broken: bool,
    check_symmetric_draw: bool,
    symmetry_min_nu_pieces: u32,
    check_terminate_early: bool,

    stat_score: [Statistics; MAX_COLORS],
    stat_len: Statistics,
    lgr: LastGoodReply,

    nu_simulations: u64,
    nu_playout_moves: u64,
    nu_last_good_reply_moves: u64,
}

impl SimulationState {
    pub fn new(shared: Arc<SharedConst>, seed: u64) -> Self {
        let bd = shared.board().clone();
        let bc = Arc::clone(bd.board_const());
        let range = bc.geometry().range();
        let mut state = Self {
            gamma: GammaTable::new(&bc, 1.0, 1.0),
            local_value: LocalValue::new(range),
            shared,
            bd,
            bc,
            rng: Rng::with_seed(seed),
            nu_colors: 0,
            nu_moves_initial: 0,
            moves: Default::default(),
            marker: Default::default(),
            new_moves: Default::default(),
            moves_added_at: Default::default(),
            is_move_list_initialized: [false; MAX_COLORS],
            has_moves: [true; MAX_COLORS],
            is_piece_considered: [PieceMask::EMPTY; MAX_COLORS],
            force_consider_all_pieces: false,
            cumulative: CumulativeGamma::default(),
            nu_passes: 0,
            is_symmetry_broken: true,
            check_symmetric_draw: false,
            symmetry_min_nu_pieces: 0,
            check_terminate_early: false,
            stat_score: Default::default(),
            stat_len: Statistics::new(),
            lgr: LastGoodReply::default(),
            nu_simulations: 0,
            nu_playout_moves: 0,
            nu_last_good_reply_moves: 0,
        };
        let shared = Arc::clone(&state.shared);
        state.start_search(shared);
        state
    }

    /// Prepare for a new search from the root in `shared`.
    pub fn start_search(&mut self, shared: Arc<SharedConst>) {
        self.shared = shared;
        let root = self.shared.board();
        self.bd.copy_from(root);
        self.bd.set_to_play(self.shared.to_play());
        self.bd.take_snapshot();
        let board_type_changed = self.bc.board_type() != root.board_const().board_type();
        self.bc = Arc::clone(root.board_const());
        let variant = root.variant();
        let nu_moves = self.bc.nu_moves();
        let range = self.bc.geometry().range();
        self.nu_colors = variant.nu_colors() as usize;
        self.nu_moves_initial = root.nu_moves();
        self.check_terminate_early =
            self.nu_moves_initial < 10 * self.nu_colors && variant.nu_players() == 2;
        let params = self.shared.params();
        self.check_symmetric_draw = variant.is_symmetric()
            && params.detect_symmetry
            && !(!self.shared.to_play().is_first_of_pair() && params.avoid_symmetric_draw)
            && !self.shared.is_symmetry_broken();
        self.symmetry_min_nu_pieces = variant.symmetry_min_nu_pieces();

        if board_type_changed || self.marker[0].len() != nu_moves {
            for c in 0..MAX_COLORS {
                self.moves[c].clear();
                self.marker[c].clear();
                self.marker[c].resize(nu_moves, false);
                self.moves_added_at[c].clear();
                self.moves_added_at[c].resize(range, false);
                self.new_moves[c].clear();
            }
            self.local_value.resize(range);
        }
        let (size_factor, attach_factor) = variant.gamma_factors();
        self.gamma = GammaTable::new(&self.bc, size_factor, attach_factor);
        self.lgr.init(nu_moves);
        for stat in &mut self.stat_score {
            stat.clear();
        }
        self.stat_len.clear();
        self.nu_simulations = 0;
        self.nu_playout_moves = 0;
        self.nu_last_good_reply_moves = 0;
    }

    /// Return to the root position for simulation number `n`.
    pub fn start_simulation(&mut self, n: u64) {
        trace!(n, "start simulation");
        self.nu_simulations += 1;
        self.bd.restore_snapshot();
        self.force_consider_all_pieces = false;
        for c in 0..self.nu_colors {
            self.has_moves[c] = true;
            self.is_move_list_initialized[c] = false;
            self.new_moves[c].clear();
            self.moves_added_at[c].fill(false);
        }
        self.nu_passes = self
            .bd
            .moves()
            .iter()
            .rev()
            .take_while(|cm| cm.mv.is_pass())
            .count();
        self.is_symmetry_broken = !self.check_symmetric_draw;
    }

    /// Reseed the random generator.
    pub fn seed(&mut self, seed: u64) {
        self.rng.seed(seed);
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    #[inline]
    pub fn board(&self) -> &Board {
        &self.bd
    }

    #[inline]
    pub fn shared(&self) -> &SharedConst {
        &self.shared
    }

    /// Current move list of a color.
    #[inline]
    pub fn moves(&self, c: Color) -> &[Move] {
        &self.moves[c.index()]
    }

    #[inline]
    pub fn is_symmetry_broken(&self) -> bool {
        self.is_symmetry_broken
    }

    /// All colors passed in a row.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        self.nu_passes >= self.nu_colors
    }

    #[inline]
    pub fn nu_simulations(&self) -> u64 {
        self.nu_simulations
    }

    // =========================================================================
    // Move Lists
    // =========================================================================

    fn pieces_considered(&self) -> PieceMask {
        self.shared
            .pieces_considered(self.bd.nu_onboard_pieces(), self.force_consider_all_pieces)
    }

    /// Rebuild the move list of `c` with gamma values.
    pub fn init_moves_with_gamma(&mut self, c: Color) {
        self.init_moves(c, true);
    }

    /// Rebuild the move list of `c` without computing the local values.
    pub fn init_moves_without_gamma(&mut self, c: Color) {
        self.init_moves(c, false);
    }

    fn init_moves(&mut self, c: Color, with_gamma: bool) {
        let ci = c.index();
        self.is_piece_considered[ci] = self.pieces_considered();
        if with_gamma {
            self.local_value.init(&self.bd);
        }
        self.cumulative.clear();
        for mv in &self.moves[ci] {
            self.marker[ci][mv.index()] = false;
        }
        self.moves[ci].clear();
        let pieces = self.bd.pieces_left(c).intersect(self.is_piece_considered[ci]);
        if self.bd.is_first_piece(c) {
            self.add_starting_moves(c, pieces, with_gamma);
        } else {
            for i in 0..self.bd.attach_points(c).len() {
                let p = self.bd.attach_points(c)[i];
                if !self.bd.is_forbidden(p, c) {
                    self.add_moves(p, c, pieces, with_gamma);
                }
            }
        }
        self.is_move_list_initialized[ci] = true;
        self.new_moves[ci].clear();
        if self.moves[ci].is_empty() && !self.force_consider_all_pieces {
            self.force_consider_all_pieces = true;
            self.init_moves(c, with_gamma);
        }
    }

    /// Incrementally update the move list of `c` to the current position.
    pub fn update_moves(&mut self, c: Color) {
        let ci = c.index();
        let bc = Arc::clone(&self.bc);
        self.local_value.init(&self.bd);
        self.cumulative.clear();
        let pieces_left = self.bd.pieces_left(c);

        // Old moves that are still legal
        {
            let forbidden = self.bd.forbidden(c);
            let moves = &mut self.moves[ci];
            let marker = &mut self.marker[ci];
            let mut kept = 0;
            for i in 0..moves.len() {
                let mv = moves[i];
                let info = bc.move_info(mv);
                let gamma = if pieces_left.contains(info.piece()) {
                    self.gamma.check_move(forbidden, info, &self.local_value)
                } else {
                    None
                };
                match gamma {
                    Some(gamma) => {
                        moves[kept] = mv;
                        kept += 1;
                        self.cumulative.add(gamma);
                    }
                    None => marker[mv.index()] = false,
                }
            }
            moves.truncate(kept);
        }

        // New moves at the attach points of the pieces played by this color
        let considered = pieces_left.intersect(self.is_piece_considered[ci]);
        let mut new_moves = std::mem::take(&mut self.new_moves[ci]);
        for &mv in &new_moves {
            for &p in bc.move_info_ext(mv).attach_points() {
                if !self.bd.is_forbidden(p, c) && !self.moves_added_at[ci][p.index()] {
                    self.add_moves(p, c, considered, true);
                }
            }
        }
        new_moves.clear();
        self.new_moves[ci] = new_moves;

        // Pieces that were not considered in the last position
        let old = self.is_piece_considered[ci];
        if old != self.shared.all_pieces() {
            if self.moves[ci].is_empty() {
                self.force_consider_all_pieces = true;
            }
            let new = self.pieces_considered();
            if new != old {
                let pieces = pieces_left.intersect(new).difference(old);
                for i in 0..self.bd.attach_points(c).len() {
                    let p = self.bd.attach_points(c)[i];
                    if !self.bd.is_forbidden(p, c) {
                        self.add_moves(p, c, pieces, true);
                    }
                }
                self.is_piece_considered[ci] = new;
            }
        }
    }

    fn add_moves(&mut self, p: Point, c: Color, pieces: PieceMask, with_gamma: bool) {
        let ci = c.index();
        let bc = Arc::clone(&self.bc);
        let adj_status = self.bd.adj_status(p, c);
        let forbidden = self.bd.forbidden(c);
        for piece in pieces.iter() {
            for &mv in bc.moves(piece, p, adj_status) {
                if self.marker[ci][mv.index()] {
                    continue;
                }
                let info = bc.move_info(mv);
                let gamma = if with_gamma {
                    self.gamma.check_move(forbidden, info, &self.local_value)
                } else {
                    is_free(forbidden, info).then_some(1.0)
                };
                if let Some(gamma) = gamma {
                    self.marker[ci][mv.index()] = true;
                    self.moves[ci].push(mv);
                    self.cumulative.add(gamma);
                }
            }
        }
        self.moves_added_at[ci][p.index()] = true;
    }

    /// Moves at a single starting point. Using only one point keeps the
    /// incremental update valid: all starting moves cover it, so they all
    /// become illegal once it is occupied.
    fn add_starting_moves(&mut self, c: Color, pieces: PieceMask, with_gamma: bool) {
        let Some(p) = self.find_best_starting_point(c) else {
            return;
        };
        let ci = c.index();
        let bc = Arc::clone(&self.bc);
        let forbidden = self.bd.forbidden(c);
        for piece in pieces.iter() {
            for &mv in bc.moves(piece, p, 0) {
                debug_assert!(!self.marker[ci][mv.index()]);
                if is_free(forbidden, bc.move_info(mv)) {
                    self.marker[ci][mv.index()] = true;
                    self.moves[ci].push(mv);
                    let gamma = if with_gamma { self.gamma.piece[piece.index()] } else { 1.0 };
                    self.cumulative.add(gamma);
                }
            }
        }
    }

    /// The free starting point with the largest distance to the occupied
    /// starting points, counting the color's own ones twice.
    fn find_best_starting_point(&self, c: Color) -> Option<Point> {
        let geo = self.bd.geometry();
        let second = self.bd.second_color(c);
        let mut best = None;
        let mut max_distance = -1.0;
        for &p in self.bd.starting_points(c) {
            if self.bd.is_forbidden(p, c) {
                continue;
            }
            let mut d = 0.0;
            for other in self.bd.variant().colors() {
                for &pp in self.bd.starting_points(other) {
                    if let Some(s) = self.bd.point_state(pp) {
                        let weight = if s == c || s == second { 2.0 } else { 1.0 };
                        d += weight * geo.distance(p, pp);
                    }
                }
            }
            if d > max_distance {
                best = Some(p);
                max_distance = d;
            }
        }
        best
    }

    // =========================================================================
    // Playing
    // =========================================================================

    /// Generate the next playout move, or `None` if the playout is over.
    pub fn gen_playout_move(&mut self) -> Option<Move> {
        if self.nu_passes == self.nu_colors {
            return None;
        }
        if !self.is_symmetry_broken && self.bd.nu_onboard_pieces() >= self.symmetry_min_nu_pieces {
            trace!("terminate playout, symmetry not broken");
            return None;
        }
        self.nu_playout_moves += 1;

        // First pieces come from the move list only, it relies on all of
        // them covering the same starting point.
        if !self.bd.is_first_piece(self.bd.to_play()) {
            let (last2, last) = last_two_moves(self.bd.moves());
            let (lgr1, lgr2) = self.lgr.get(self.bd.to_play(), last2, last);
            if self.bd.is_legal_nonpass(lgr2) {
                self.nu_last_good_reply_moves += 1;
                return Some(lgr2);
            }
            if self.bd.is_legal_nonpass(lgr1) {
                self.nu_last_good_reply_moves += 1;
                return Some(lgr1);
            }
        }

        let to_play = loop {
            let to_play = self.bd.to_play();
            let ci = to_play.index();
            if !self.is_move_list_initialized[ci] {
                self.init_moves_with_gamma(to_play);
            } else if self.has_moves[ci] {
                self.update_moves(to_play);
            }
            self.has_moves[ci] = !self.moves[ci].is_empty();
            if self.has_moves[ci] {
                break to_play;
            }
            if self.nu_passes + 1 == self.nu_colors {
                return None;
            }
            if self.check_terminate_early
                && self.bd.score(to_play) < 0
                && !self.has_moves[self.bd.second_color(to_play).index()]
            {
                trace!("terminate early, no moves and negative score");
                return None;
            }
            self.nu_passes += 1;
            self.bd.set_to_play(self.bd.next(to_play));
            self.is_symmetry_broken = true;
        };

        let i = self.cumulative.sample(&mut self.rng);
        Some(self.moves[to_play.index()][i])
    }

    /// Play a move generated by `gen_playout_move`.
    pub fn play_playout(&mut self, mv: Move) {
        debug_assert!(self.bd.is_legal_nonpass(mv));
        let c = self.bd.to_play();
        self.new_moves[c.index()].push(mv);
        self.bd.play_nonpass(mv);
        self.nu_passes = 0;
        if !self.is_symmetry_broken {
            self.update_symmetry_broken(ColorMove::new(c, mv));
        }
    }

    /// Play the move of a tree node.
    pub fn play_expanded_child(&mut self, mv: Move) {
        if mv.is_regular() {
            self.play_playout(mv);
        } else {
            self.bd.play_pass();
            self.nu_passes += 1;
            self.is_symmetry_broken = true;
        }
    }

    /// Finish the game from the current position.
    pub fn playout(&mut self) {
        while let Some(mv) = self.gen_playout_move() {
            self.play_playout(mv);
        }
    }

    fn update_symmetry_broken(&mut self, last: ColorMove) {
        let geo = self.bd.geometry();
        let points = self.bc.move_info(last.mv).points();
        let broken = if self.bd.to_play().is_first_of_pair() {
            // The last move must mirror the previous move of the first color.
            let mirror = mirror_color(last.color);
            points
                .iter()
                .any(|&p| self.bd.point_state(geo.symmetric_point(p)) != Some(mirror))
        } else {
            // The mirror of the last move must still be available.
            points
                .iter()
                .any(|&p| self.bd.point_state(geo.symmetric_point(p)).is_some())
        };
        if broken {
            self.is_symmetry_broken = true;
        }
    }

    // =========================================================================
    // Evaluation
    // =========================================================================

    /// Result of the finished playout for every color.
    ///
    /// The base result is 1/0.5/0 for win/draw/loss with two players and
    /// the rank result of `game_results` otherwise. A bonus shaped by the
    /// running statistics of the score and the game length favours high
    /// scores and short wins, so the values may leave [0, 1] slightly.
    pub fn evaluate_playout(&mut self) -> Eval {
        if !self.is_symmetry_broken && self.bd.nu_onboard_pieces() >= self.symmetry_min_nu_pieces {
            trace!("result 0.5 (symmetry)");
            return [0.5; MAX_COLORS];
        }
        let variant = self.bd.variant();
        let nu_players = variant.nu_players() as usize;
        let nu_colors = self.nu_colors;
        let mut points = [0f32; MAX_COLORS];
        for c in variant.colors() {
            points[c.index()] = self.bd.points(c) as f32;
        }
        let ranks = if nu_players > 2 {
            game_results(&points[..nu_colors])
        } else {
            [0.0; MAX_COLORS]
        };
        let score_modification = self.shared.params().score_modification;
        let length = self.bd.nu_moves() as f32;

        let mut result = [0f32; MAX_COLORS];
        for i in 0..nu_players {
            let c = Color(i as u8);
            if nu_players == 2 && i == 1 {
                result[1] = 1.0 - result[0];
                break;
            }
            let s = self.bd.score(c) as f32;
            let game_result = if nu_players == 2 {
                match s.partial_cmp(&0.0) {
                    Some(std::cmp::Ordering::Greater) => 1.0,
                    Some(std::cmp::Ordering::Less) => 0.0,
                    _ => 0.5,
                }
            } else {
                ranks[i]
            };
            let mut res = game_result;
            let stat = &mut self.stat_score[i];
            stat.add(s);
            let dev = stat.deviation();
            if dev > 0.0 {
                res += score_modification * sigmoid(SIGMOID_STEEPNESS, (s - stat.mean()) / dev);
            }
            self.stat_len.add(length);
            let dev = self.stat_len.deviation();
            if dev > 0.0 {
                let bonus = LENGTH_MODIFICATION
                    * sigmoid(SIGMOID_STEEPNESS, (length - self.stat_len.mean()) / dev);
                if game_result == 1.0 {
                    res -= bonus;
                } else if game_result == 0.0 {
                    res += bonus;
                }
            }
            trace!(color = %c, score = s, game_result, res, "playout result");
            result[i] = res;
        }
        if nu_colors > nu_players {
            result[2] = result[0];
            result[3] = result[1];
        }
        result
    }

    /// Remember the replies of the colors that won the playout and forget
    /// those of the colors that lost it.
    pub fn update_lgr(&mut self, eval: &Eval) {
        let max = eval[..self.nu_colors]
            .iter()
            .copied()
            .fold(f32::MIN, f32::max);
        let moves = self.bd.moves();
        for i in self.nu_moves_initial.max(1)..moves.len() {
            let ColorMove { color, mv } = moves[i];
            let last = moves[i - 1].mv;
            if mv.is_pass() || last.is_pass() {
                continue;
            }
            let last2 = if i >= 2 { moves[i - 2].mv } else { Move::PASS };
            if eval[color.index()] >= max {
                self.lgr.store(color, last2, last, mv);
            } else {
                self.lgr.forget(color, last2, last, mv);
            }
        }
    }

    /// One line of statistics of the current search.
    pub fn write_info(&self) -> String {
        let mut s = String::new();
        if self.nu_playout_moves > 0 {
            s.push_str(&format!(
                "LGR: {:.1}%, ",
                100.0 * self.nu_last_good_reply_moves as f64 / self.nu_playout_moves as f64
            ));
        }
        if self.bd.nu_players() == 2 {
            s.push_str(&format!("Sco: {}", self.stat_score[0]));
        }
        s
    }
}

#[inline]
fn is_free(forbidden: &[bool], info: &MoveInfo) -> bool {
    info.points().iter().all(|p| !forbidden[p.index()])
}

fn last_two_moves(moves: &[ColorMove]) -> (Move, Move) {
    match moves {
        [.., a, b] => (a.mv, b.mv),
        [b] => (Move::PASS, b.mv),
        [] => (Move::PASS, Move::PASS),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::SharedParams;
    use crate::variant::Variant;

    fn state(variant: Variant, seed: u64) -> SimulationState {
        let bd = Board::new(variant);
        let shared = Arc::new(SharedConst::new(&bd, Color(0), SharedParams::default()));
        SimulationState::new(shared, seed)
    }

    #[test]
    fn test_game_results_ranks() {
        let r = game_results(&[10.0, 10.0, 5.0, 0.0]);
        assert!((r[0] - 2.5 / 3.0).abs() < 1e-6);
        assert_eq!(r[0], r[1]);
        assert!((r[2] - 1.0 / 3.0).abs() < 1e-6);
        assert_eq!(r[3], 0.0);
        let r = game_results(&[1.0, 7.0, 3.0]);
        assert_eq!(&r[..3], &[0.0, 1.0, 0.5]);
    }

    #[test]
    fn test_piece_gamma() {
        assert_eq!(piece_gamma(5.0, 1.0, 1, 4), 1.0);
        assert_eq!(piece_gamma(5.0, 1.0, 3, 4), 25.0);
        assert!(piece_gamma(3.0, 1.8, 5, 8) > piece_gamma(3.0, 1.8, 5, 6));
    }

    #[test]
    fn test_sigmoid() {
        assert_eq!(sigmoid(2.0, 0.0), 0.0);
        assert!(sigmoid(2.0, 1.0) < 1.0);
        assert!(sigmoid(2.0, -1.0) > -1.0);
        assert!(sigmoid(2.0, 1.0) > sigmoid(2.0, 0.5));
        // Saturates in f32 but never leaves the interval.
        assert!(sigmoid(2.0, 10.0) <= 1.0);
        assert!(sigmoid(2.0, -10.0) >= -1.0);
    }

    #[test]
    fn test_playout_ends_with_legal_moves() {
        let mut st = state(Variant::Classic, 7);
        st.start_simulation(0);
        let mut check = Board::new(Variant::Classic);
        while let Some(mv) = st.gen_playout_move() {
            let c = st.board().to_play();
            assert!(st.board().is_legal(c, mv));
            st.play_playout(mv);
            check.play(c, mv);
        }
        assert!(st.board().nu_onboard_pieces() > 20);
        for c in Variant::Classic.colors() {
            assert_eq!(st.board().points(c), check.points(c));
        }
        let eval = st.evaluate_playout();
        for &v in &eval {
            assert!((-0.5..=1.5).contains(&v));
        }
    }

    #[test]
    fn test_start_simulation_restores_root() {
        let mut st = state(Variant::Duo, 1);
        st.start_simulation(0);
        st.playout();
        assert!(st.board().nu_moves() > 0);
        st.start_simulation(1);
        assert_eq!(st.board().nu_moves(), 0);
        assert_eq!(st.board().to_play(), Color(0));
    }

    #[test]
    fn test_two_player_results_sum_to_one() {
        let mut st = state(Variant::Classic2, 3);
        for n in 0..4 {
            st.start_simulation(n);
            st.playout();
            let eval = st.evaluate_playout();
            assert!((eval[0] + eval[1] - 1.0).abs() < 1e-5);
            assert_eq!(eval[0], eval[2]);
            assert_eq!(eval[1], eval[3]);
            st.update_lgr(&eval);
        }
        assert!(st.write_info().contains("LGR"));
    }

    #[test]
    fn test_incremental_update_matches_rebuild() {
        let mut st = state(Variant::Duo, 11);
        st.start_simulation(0);
        for _ in 0..6 {
            let Some(mv) = st.gen_playout_move() else { break };
            st.play_playout(mv);
        }
        let c = st.board().to_play();
        st.update_moves(c);
        let mut incremental = st.moves(c).to_vec();
        st.init_moves_with_gamma(c);
        let mut rebuilt = st.moves(c).to_vec();
        incremental.sort_unstable();
        rebuilt.sort_unstable();
        assert_eq!(incremental, rebuilt);
    }

    #[test]
    fn test_mirrored_moves_keep_symmetry() {
        let mut st = state(Variant::Duo, 5);
        st.start_simulation(0);
        assert!(!st.is_symmetry_broken());
        let mut moves = Vec::new();
        st.board().gen_moves(Color(0), &mut moves);
        let mv = moves[0];
        let symm = st.board().board_const().symmetric_move(mv).unwrap();
        st.play_expanded_child(mv);
        st.play_expanded_child(symm);
        assert!(!st.is_symmetry_broken());
        st.play_expanded_child(Move::PASS);
        assert!(st.is_symmetry_broken());
    }
}
