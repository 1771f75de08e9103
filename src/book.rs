//! Opening book lookup.
//!
//! Books are external collaborators: the engine only asks for a move in the
//! current position. `HistoryBook` is an in-memory book keyed by the exact
//! move history.

use std::collections::HashMap;

use crate::board::{Board, ColorMove};
use crate::catalog::Move;
use crate::variant::Variant;

pub trait Book: Send {
    /// Book move for the color to play on `bd`, if the position is known.
    fn lookup(&self, bd: &Board) -> Option<Move>;
}

/// Book of replies to exact move sequences.
#[derive(Default)]
pub struct HistoryBook {
    entries: HashMap<(Variant, Vec<ColorMove>), Move>,
}

impl HistoryBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, variant: Variant, history: &[ColorMove], reply: Move) {
        self.entries.insert((variant, history.to_vec()), reply);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Book for HistoryBook {
    fn lookup(&self, bd: &Board) -> Option<Move> {
        self.entries
            .get(&(bd.variant(), bd.moves().to_vec()))
            .copied()
            .filter(|&mv| bd.is_legal(bd.to_play(), mv))
    }
}
