//! Analysis of a finished game: the search value of every move position.

use tracing::{debug, info};

use crate::board::{Board, ColorMove};
use crate::catalog::BoardConst;
use crate::error::ReplayError;
use crate::mcts::{Budget, CancelToken, Search, SearchStatus};
use crate::variant::{Color, Variant};

/// Values of the positions before each move of a game, from the point of
/// view of the color that played the move.
#[derive(Clone, Debug)]
pub struct AnalyzeGame {
    variant: Variant,
    moves: Vec<ColorMove>,
    values: Vec<f64>,
}

impl AnalyzeGame {
    pub fn new(variant: Variant) -> Self {
        Self {
            variant,
            moves: Vec::new(),
            values: Vec::new(),
        }
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    pub fn nu_moves(&self) -> usize {
        self.moves.len()
    }

    pub fn get_move(&self, i: usize) -> ColorMove {
        self.moves[i]
    }

    /// Value of move `i` clamped to [0, 1].
    pub fn value(&self, i: usize) -> f64 {
        self.values[i].clamp(0.0, 1.0)
    }

    pub fn clear(&mut self) {
        self.moves.clear();
        self.values.clear();
    }

    /// Search the position before each move of `moves`. Stops at the first
    /// illegal move or when `token` is cancelled. `progress` is called with
    /// the number of analyzed moves and the total after each move.
    pub fn run(
        &mut self,
        variant: Variant,
        moves: &[ColorMove],
        search: &mut Search,
        budget: Budget,
        token: &CancelToken,
        mut progress: impl FnMut(usize, usize),
    ) {
        self.variant = variant;
        self.clear();
        let mut bd = Board::new(variant);
        for (i, cm) in moves.iter().enumerate() {
            if !bd.is_legal(cm.color, cm.mv) {
                debug!(move_number = i, "illegal move in game, analysis stopped");
                break;
            }
            let result = search.search(&bd, cm.color, budget, token);
            if result.status == SearchStatus::Cancelled {
                break;
            }
            self.moves.push(*cm);
            self.values.push(result.value);
            progress(i + 1, moves.len());
            bd.play(cm.color, cm.mv);
        }
        info!(%variant, moves = self.moves.len(), total = moves.len(), "game analyzed");
    }

    /// Replace the analysis by supplied moves and values.
    pub fn set(
        &mut self,
        variant: Variant,
        moves: &[ColorMove],
        values: &[f64],
    ) -> Result<(), ReplayError> {
        if moves.len() != values.len() {
            return Err(ReplayError::LengthMismatch {
                moves: moves.len(),
                values: values.len(),
            });
        }
        if let Some(cm) = moves.iter().find(|cm| cm.color.0 >= variant.nu_colors()) {
            return Err(ReplayError::ColorOutOfRange(cm.color.0 as u32));
        }
        self.variant = variant;
        self.moves = moves.to_vec();
        self.values = values.to_vec();
        Ok(())
    }

    /// Restore an analysis from (color, move, value) entries as written by
    /// `entries`. The analysis is left unchanged if any entry is rejected.
    pub fn restore(
        &mut self,
        expected: Variant,
        found: &str,
        entries: &[(u32, String, f64)],
    ) -> Result<(), ReplayError> {
        let wrong_variant = || ReplayError::WrongVariant {
            expected: expected.to_string(),
            found: found.to_string(),
        };
        let variant: Variant = found.parse().map_err(|_| wrong_variant())?;
        if variant != expected {
            return Err(wrong_variant());
        }
        let bc = BoardConst::get(variant.board_type());
        let mut moves = Vec::with_capacity(entries.len());
        let mut values = Vec::with_capacity(entries.len());
        for (color, mv, value) in entries {
            if *color >= variant.nu_colors() as u32 {
                return Err(ReplayError::ColorOutOfRange(*color));
            }
            let mv = bc.move_from_string(mv)?;
            moves.push(ColorMove::new(Color(*color as u8), mv));
            values.push(*value);
        }
        self.set(variant, &moves, &values)
    }

    /// Entries for serialization. Values are not clamped.
    pub fn entries(&self) -> Vec<(u32, String, f64)> {
        let bc = BoardConst::get(self.variant.board_type());
        self.moves
            .iter()
            .zip(&self.values)
            .map(|(cm, &v)| (cm.color.0 as u32, bc.move_to_string(cm.mv), v))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcts::SearchParams;

    fn game(variant: Variant, n: usize) -> Vec<ColorMove> {
        let mut bd = Board::new(variant);
        let mut moves = Vec::new();
        let mut history = Vec::new();
        for _ in 0..n {
            let c = bd.to_play();
            bd.gen_moves(c, &mut moves);
            let mv = moves[moves.len() / 2];
            history.push(ColorMove::new(c, mv));
            bd.play(c, mv);
        }
        history
    }

    #[test]
    fn test_run() {
        let moves = game(Variant::Duo, 3);
        let mut search = Search::new(SearchParams {
            seed: Some(3),
            memory: 8 << 20,
            ..SearchParams::default()
        });
        let mut analyze = AnalyzeGame::new(Variant::Classic);
        let mut reported = Vec::new();
        analyze.run(
            Variant::Duo,
            &moves,
            &mut search,
            Budget::Simulations(30),
            &CancelToken::new(),
            |i, n| reported.push((i, n)),
        );
        assert_eq!(analyze.variant(), Variant::Duo);
        assert_eq!(analyze.nu_moves(), 3);
        assert_eq!(reported, vec![(1, 3), (2, 3), (3, 3)]);
        for i in 0..3 {
            assert_eq!(analyze.get_move(i), moves[i]);
            assert!((0.0..=1.0).contains(&analyze.value(i)));
        }
    }

    #[test]
    fn test_clamp_on_read() {
        let moves = game(Variant::Duo, 2);
        let mut analyze = AnalyzeGame::new(Variant::Duo);
        analyze.set(Variant::Duo, &moves, &[1.04, -0.02]).unwrap();
        assert_eq!(analyze.value(0), 1.0);
        assert_eq!(analyze.value(1), 0.0);
        assert_eq!(analyze.entries()[0].2, 1.04);
    }

    #[test]
    fn test_restore_roundtrip() {
        let moves = game(Variant::Trigon3, 4);
        let mut analyze = AnalyzeGame::new(Variant::Trigon3);
        analyze
            .set(Variant::Trigon3, &moves, &[0.1, 0.2, 0.3, 0.4])
            .unwrap();
        let entries = analyze.entries();
        let mut restored = AnalyzeGame::new(Variant::Duo);
        restored.restore(Variant::Trigon3, "trigon_3", &entries).unwrap();
        assert_eq!(restored.nu_moves(), 4);
        assert_eq!(restored.get_move(3), moves[3]);
        assert_eq!(restored.value(2), 0.3);
    }

    #[test]
    fn test_set_length_mismatch() {
        let moves = game(Variant::Duo, 2);
        let mut analyze = AnalyzeGame::new(Variant::Duo);
        assert_eq!(
            analyze.set(Variant::Duo, &moves, &[0.5]),
            Err(ReplayError::LengthMismatch { moves: 2, values: 1 })
        );
        assert_eq!(analyze.nu_moves(), 0);
    }
}
