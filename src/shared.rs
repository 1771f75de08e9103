//! Read-only data shared by all simulation states of one search.

use crate::board::Board;
use crate::piece::PieceMask;
use crate::symmetry::is_symmetry_broken;
use crate::variant::Color;

/// Search parameters that the simulation states read.
#[derive(Clone, Debug)]
pub struct SharedParams {
    /// Score still symmetric positions of the symmetric variants as a draw.
    pub detect_symmetry: bool,
    /// Let the second player avoid a symmetric draw instead of aiming for it.
    pub avoid_symmetric_draw: bool,
    /// Weight of the score and length bonuses in the playout result.
    pub score_modification: f32,
}

impl Default for SharedParams {
    fn default() -> Self {
        Self {
            detect_symmetry: true,
            avoid_symmetric_draw: true,
            score_modification: crate::constants::SCORE_MODIFICATION,
        }
    }
}

/// The search root and the tables derived from it.
pub struct SharedConst {
    board: Board,
    to_play: Color,
    params: SharedParams,
    /// Pieces considered in move generation, indexed by the number of pieces
    /// on board (saturated at the last entry).
    considered: Vec<PieceMask>,
    considered_all: PieceMask,
    is_symmetry_broken: bool,
}

impl SharedConst {
    pub fn new(bd: &Board, to_play: Color, params: SharedParams) -> Self {
        let mut board = bd.clone();
        board.set_to_play(to_play);
        let variant = board.variant();
        let pieces = board.board_const().pieces();
        let max_size = pieces.max_size();
        let considered_all = pieces.all();
        let considered = (0..=variant.min_move_all_considered())
            .map(|n| {
                let min_size = variant.min_considered_size(n, max_size);
                let mut mask = PieceMask::EMPTY;
                for piece in pieces.iter() {
                    if pieces.info(piece).size() >= min_size {
                        mask.insert(piece);
                    }
                }
                mask
            })
            .collect();
        let is_symmetry_broken = is_symmetry_broken(&board);
        Self {
            board,
            to_play,
            params,
            considered,
            considered_all,
            is_symmetry_broken,
        }
    }

    #[inline]
    pub fn board(&self) -> &Board {
        &self.board
    }

    #[inline]
    pub fn to_play(&self) -> Color {
        self.to_play
    }

    #[inline]
    pub fn params(&self) -> &SharedParams {
        &self.params
    }

    /// Whether the root position is no longer symmetric.
    #[inline]
    pub fn is_symmetry_broken(&self) -> bool {
        self.is_symmetry_broken
    }

    /// Pieces considered with `nu_onboard` pieces on board. Early in the
    /// game only the large pieces are generated.
    pub fn pieces_considered(&self, nu_onboard: u32, force_all: bool) -> PieceMask {
        if force_all {
            return self.considered_all;
        }
        let i = (nu_onboard as usize).min(self.considered.len() - 1);
        self.considered[i]
    }

    #[inline]
    pub fn all_pieces(&self) -> PieceMask {
        self.considered_all
    }

    /// Prune mirrored root moves: the first player of a still symmetric
    /// position gains nothing from choosing between a move and its mirror.
    pub fn prune_symmetric_root(&self) -> bool {
        self.params.detect_symmetry
            && self.board.variant().is_symmetric()
            && self.to_play.is_first_of_pair()
            && !self.is_symmetry_broken
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variant::Variant;

    #[test]
    fn test_pieces_considered() {
        let bd = Board::new(Variant::Classic);
        let shared = SharedConst::new(&bd, Color(0), SharedParams::default());
        let pieces = bd.board_const().pieces();
        let early = shared.pieces_considered(0, false);
        assert!(early.iter().all(|p| pieces.info(p).size() == 5));
        assert_eq!(early.len(), 12);
        let mid = shared.pieces_considered(9, false);
        assert!(mid.iter().all(|p| pieces.info(p).size() >= 4));
        assert_eq!(shared.pieces_considered(100, false), pieces.all());
        assert_eq!(shared.pieces_considered(0, true), pieces.all());
    }

    #[test]
    fn test_symmetric_root() {
        let bd = Board::new(Variant::Duo);
        assert!(SharedConst::new(&bd, Color(0), SharedParams::default()).prune_symmetric_root());
        let params = SharedParams {
            detect_symmetry: false,
            ..SharedParams::default()
        };
        assert!(!SharedConst::new(&bd, Color(0), params).prune_symmetric_root());
        let bd = Board::new(Variant::Classic2);
        assert!(!SharedConst::new(&bd, Color(0), SharedParams::default()).prune_symmetric_root());
    }
}
