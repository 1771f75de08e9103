//! Prior knowledge for newly expanded nodes.
//!
//! Every child gets a virtual count and a value from a static heuristic of
//! the placement: larger pieces, more new attach points and blocked opponent
//! attach points are better, and early in the game pieces closer to the
//! centre are preferred. The best move of a node gets `PRIOR_VALUE_MAX`,
//! the others decay exponentially with their heuristic distance to it.

use crate::board::Board;
use crate::catalog::Move;
use crate::constants::{
    PRIOR_ATTACH_WEIGHT, PRIOR_CENTER_PIECES, PRIOR_CENTER_WEIGHT, PRIOR_COUNT, PRIOR_DECAY,
    PRIOR_VALUE_MAX, PRIOR_VALUE_MIN,
};
use crate::shared::SharedConst;

/// Initial statistics of a new child node.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChildInit {
    pub mv: Move,
    pub value: f32,
    pub count: u32,
}

/// Generator of the children of a node. Owns scratch buffers, so each worker
/// keeps its own instance.
#[derive(Default)]
pub struct PriorKnowledge {
    moves: Vec<Move>,
    heuristic: Vec<f64>,
}

impl PriorKnowledge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generate the children for the color to play on `bd`.
    ///
    /// With `prune_symmetric` only one move of each pair of mirrored moves is
    /// generated. If the color to play has no move, a single pass child is
    /// generated.
    pub fn gen_children(
        &mut self,
        bd: &Board,
        shared: &SharedConst,
        prune_symmetric: bool,
        children: &mut Vec<ChildInit>,
    ) {
        children.clear();
        let c = bd.to_play();
        let bc = bd.board_const();
        bd.gen_moves(c, &mut self.moves);

        let considered = shared.pieces_considered(bd.nu_onboard_pieces(), false);
        if self
            .moves
            .iter()
            .any(|&mv| considered.contains(bc.move_info(mv).piece()))
        {
            self.moves
                .retain(|&mv| considered.contains(bc.move_info(mv).piece()));
        }
        if prune_symmetric {
            let all = std::mem::take(&mut self.moves);
            self.moves.extend(all.iter().copied().filter(|&mv| {
                match bc.symmetric_move(mv) {
                    Some(symm) => symm >= mv || all.binary_search(&symm).is_err(),
                    None => true,
                }
            }));
        }
        if self.moves.is_empty() {
            children.push(ChildInit {
                mv: Move::PASS,
                value: 0.5,
                count: 0,
            });
            return;
        }

        self.heuristic.clear();
        let mut max_h = f64::MIN;
        for &mv in &self.moves {
            let h = heuristic(bd, mv);
            max_h = max_h.max(h);
            self.heuristic.push(h);
        }
        children.extend(self.moves.iter().zip(&self.heuristic).map(|(&mv, &h)| {
            let value = PRIOR_VALUE_MIN
                + (PRIOR_VALUE_MAX - PRIOR_VALUE_MIN) * (-PRIOR_DECAY * (max_h - h)).exp();
            ChildInit {
                mv,
                value: value as f32,
                count: PRIOR_COUNT,
            }
        }));
    }
}

/// Static evaluation of a move of the color to play.
fn heuristic(bd: &Board, mv: Move) -> f64 {
    let c = bd.to_play();
    let bc = bd.board_const();
    let geo = bd.geometry();
    let info = bc.move_info(mv);
    let ext = bc.move_info_ext(mv);

    let new_attach = ext
        .attach_points()
        .iter()
        .filter(|&&p| !bd.is_forbidden(p, c) && !bd.is_attach_point(p, c))
        .count();
    let second = bd.second_color(c);
    let blocked = info
        .points()
        .iter()
        .filter(|&&p| {
            bd.variant()
                .colors()
                .filter(|&o| o != c && o != second)
                .any(|o| bd.is_attach_point(p, o) && !bd.is_forbidden(p, o))
        })
        .count();

    let mut h = info.size() as f64 + PRIOR_ATTACH_WEIGHT * (new_attach + blocked) as f64;
    if bd.nu_onboard_pieces_of(c) < PRIOR_CENTER_PIECES {
        let d = info
            .points()
            .iter()
            .map(|&p| geo.center_distance(p))
            .fold(f64::MAX, f64::min);
        h -= PRIOR_CENTER_WEIGHT * d;
    }
    h
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::SharedParams;
    use crate::variant::Variant;

    fn children(bd: &Board, prune: bool) -> Vec<ChildInit> {
        let shared = SharedConst::new(bd, bd.to_play(), SharedParams::default());
        let mut prior = PriorKnowledge::new();
        let mut out = Vec::new();
        prior.gen_children(bd, &shared, prune, &mut out);
        out
    }

    #[test]
    fn test_values_in_range() {
        let bd = Board::new(Variant::Classic);
        let out = children(&bd, false);
        assert!(!out.is_empty());
        for child in &out {
            assert!(child.value >= PRIOR_VALUE_MIN as f32 - 1e-6);
            assert!(child.value <= PRIOR_VALUE_MAX as f32 + 1e-6);
            assert_eq!(child.count, PRIOR_COUNT);
            // Early in the game only the largest pieces are considered.
            assert_eq!(bd.board_const().move_info(child.mv).size(), 5);
        }
        let best = out.iter().map(|c| c.value).fold(0.0, f32::max);
        assert!((best - PRIOR_VALUE_MAX as f32).abs() < 1e-6);
    }

    #[test]
    fn test_symmetric_pruning() {
        let bd = Board::new(Variant::Duo);
        let all = children(&bd, false);
        let pruned = children(&bd, true);
        assert!(pruned.len() <= all.len());
        let bc = bd.board_const();
        for child in &pruned {
            let symm = bc.symmetric_move(child.mv).unwrap();
            assert!(symm == child.mv || !pruned.iter().any(|c| c.mv == symm));
        }
    }
}
