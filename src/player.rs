//! Move generation with playing levels and an optional opening book.

use std::time::Duration;

use tracing::debug;

use crate::board::Board;
use crate::book::Book;
use crate::catalog::Move;
use crate::constants::{LEVEL_FACTOR_TWO_COLORS, LEVEL_SIMULATIONS, MAX_LEVEL};
use crate::mcts::{Budget, CancelToken, Search, SearchParams, SearchResult, SearchStatus};
use crate::variant::{Color, Variant};

pub struct Player {
    search: Search,
    level: u32,
    fixed_simulations: Option<u64>,
    fixed_time: Option<Duration>,
    use_book: bool,
    book: Option<Box<dyn Book>>,
}

impl Player {
    pub fn new(params: SearchParams) -> Self {
        Self {
            search: Search::new(params),
            level: 4,
            fixed_simulations: None,
            fixed_time: None,
            use_book: true,
            book: None,
        }
    }

    pub fn search(&self) -> &Search {
        &self.search
    }

    pub fn search_mut(&mut self) -> &mut Search {
        &mut self.search
    }

    // =========================================================================
    // Levels and Budgets
    // =========================================================================

    pub fn level(&self) -> u32 {
        self.level
    }

    /// Set the level (clamped to 1..=MAX_LEVEL). Clears the fixed
    /// simulations and fixed time.
    pub fn set_level(&mut self, level: u32) {
        self.level = level.clamp(1, MAX_LEVEL);
        self.fixed_simulations = None;
        self.fixed_time = None;
    }

    pub fn fixed_simulations(&self) -> Option<u64> {
        self.fixed_simulations
    }

    /// Use a fixed number of simulations instead of the level. Clears the
    /// fixed time.
    pub fn set_fixed_simulations(&mut self, n: Option<u64>) {
        self.fixed_simulations = n;
        if n.is_some() {
            self.fixed_time = None;
        }
    }

    pub fn fixed_time(&self) -> Option<Duration> {
        self.fixed_time
    }

    /// Use a fixed time instead of the level. Clears the fixed simulations.
    pub fn set_fixed_time(&mut self, time: Option<Duration>) {
        self.fixed_time = time;
        if time.is_some() {
            self.fixed_simulations = None;
        }
    }

    /// Simulations of a level in a variant. Playouts of two-color variants
    /// are shorter, so they get more simulations.
    pub fn level_simulations(variant: Variant, level: u32) -> u64 {
        let n = LEVEL_SIMULATIONS[(level.clamp(1, MAX_LEVEL) - 1) as usize];
        if variant.nu_colors() == 2 {
            n * LEVEL_FACTOR_TWO_COLORS
        } else {
            n
        }
    }

    pub fn budget(&self, variant: Variant) -> Budget {
        if let Some(n) = self.fixed_simulations {
            Budget::Simulations(n)
        } else if let Some(t) = self.fixed_time {
            Budget::Time(t)
        } else {
            Budget::Simulations(Self::level_simulations(variant, self.level))
        }
    }

    // =========================================================================
    // Book
    // =========================================================================

    pub fn use_book(&self) -> bool {
        self.use_book
    }

    pub fn set_use_book(&mut self, enable: bool) {
        self.use_book = enable;
    }

    pub fn set_book(&mut self, book: Option<Box<dyn Book>>) {
        self.book = book;
    }

    // =========================================================================
    // Search Settings
    // =========================================================================

    pub fn detect_symmetry(&self) -> bool {
        self.search.detect_symmetry()
    }

    pub fn set_detect_symmetry(&mut self, enable: bool) {
        self.search.set_detect_symmetry(enable);
    }

    pub fn avoid_symmetric_draw(&self) -> bool {
        self.search.avoid_symmetric_draw()
    }

    pub fn set_avoid_symmetric_draw(&mut self, enable: bool) {
        self.search.set_avoid_symmetric_draw(enable);
    }

    pub fn auto_param(&self) -> bool {
        self.search.auto_param()
    }

    pub fn set_auto_param(&mut self, enable: bool) {
        self.search.set_auto_param(enable);
    }

    pub fn threads(&self) -> usize {
        self.search.params().threads
    }

    pub fn set_threads(&mut self, threads: usize) {
        self.search.set_threads(threads);
    }

    pub fn set_seed(&mut self, seed: Option<u64>) {
        self.search.set_seed(seed);
    }

    // =========================================================================
    // Move Generation
    // =========================================================================

    /// Generate a move for `c`.
    pub fn genmove(&mut self, bd: &Board, c: Color) -> Move {
        self.genmove_cancellable(bd, c, &CancelToken::new()).mv
    }

    /// Generate a move for `c`, returning the book move if there is one.
    pub fn genmove_cancellable(&mut self, bd: &Board, c: Color, token: &CancelToken) -> SearchResult {
        if self.use_book
            && let Some(book) = &self.book
        {
            let mut pos = bd.clone();
            pos.set_to_play(c);
            if let Some(mv) = book.lookup(&pos).filter(|&mv| pos.is_legal(c, mv)) {
                debug!(mv = %bd.move_to_string(mv), "book move");
                return SearchResult {
                    mv,
                    status: SearchStatus::Finished,
                    simulations: 0,
                    value: 0.5,
                    pv: vec![mv],
                    elapsed: Duration::ZERO,
                };
            }
        }
        let budget = self.budget(bd.variant());
        self.search.search(bd, c, budget, token)
    }
}
