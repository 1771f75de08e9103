//! Monte Carlo Tree Search (MCTS) over a shared node arena.
//!
//! This module implements the search driver:
//! - UCT selection on the mean value, with prior knowledge as virtual counts
//! - Expansion of a node once it has `EXPAND_THRESHOLD` real visits
//! - Playouts by one `SimulationState` per worker thread
//! - Reuse of the subtree of the last search if the new position follows it
//!
//! A search runs `threads` workers against one `Tree`. Workers stop when the
//! budget is used up or the `CancelToken` is cancelled.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::SyncSender;
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::board::{Board, ColorMove};
use crate::catalog::Move;
use crate::constants::{
    DEFAULT_MEMORY, EXPAND_THRESHOLD, EXPLORATION, INFO_CHILDREN, MAX_PV_LEN, REPORT_PERIOD,
    SCORE_MODIFICATION,
};
use crate::playout::SimulationState;
use crate::prior::{ChildInit, PriorKnowledge};
use crate::shared::{SharedConst, SharedParams};
use crate::tree::{Node, NodeIdx, Tree};
use crate::variant::{Color, Variant};

// =============================================================================
// Parameters and Results
// =============================================================================

/// Parameters of the search driver.
#[derive(Clone, Debug)]
pub struct SearchParams {
    /// Number of worker threads.
    pub threads: usize,
    /// Seed of the worker random generators. Worker `i` uses `seed + i`.
    pub seed: Option<u64>,
    /// Memory for the two node arenas in bytes.
    pub memory: usize,
    /// Exploration constant of the UCT formula.
    pub exploration: f64,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            threads: 1,
            seed: None,
            memory: DEFAULT_MEMORY,
            exploration: EXPLORATION,
        }
    }
}

/// Resources of one search.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Budget {
    Simulations(u64),
    Time(Duration),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SearchStatus {
    Idle,
    Running,
    Finished,
    Cancelled,
}

#[derive(Clone, Debug)]
pub struct SearchResult {
    pub mv: Move,
    pub status: SearchStatus,
    pub simulations: u64,
    /// Mean value of the chosen move for the color to play. Not clamped.
    pub value: f64,
    /// Principal variation starting with `mv`.
    pub pv: Vec<Move>,
    pub elapsed: Duration,
}

/// Periodic report of a running search.
#[derive(Clone, Debug)]
pub struct Progress {
    pub simulations: u64,
    pub elapsed: Duration,
    pub mv: Move,
    pub value: f64,
}

// =============================================================================
// Cancellation
// =============================================================================

/// Cooperative cancellation of a search.
///
/// Workers check the token between simulations. `cancel` blocks until the
/// search using the token has returned, so it must be called from another
/// thread than the one running the search.
#[derive(Clone, Default)]
pub struct CancelToken {
    inner: Arc<CancelState>,
}

#[derive(Default)]
struct CancelState {
    abort: AtomicBool,
    running: Mutex<bool>,
    idle: Condvar,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.inner.abort.store(true, Ordering::SeqCst);
        let mut running = self
            .inner
            .running
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        while *running {
            running = self
                .inner
                .idle
                .wait(running)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.inner.abort.load(Ordering::Relaxed)
    }

    /// A search using this token has started and not yet returned.
    pub fn is_running(&self) -> bool {
        *self
            .inner
            .running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn start_running(&self) -> RunningGuard<'_> {
        self.set_running(true);
        RunningGuard(self)
    }

    fn set_running(&self, value: bool) {
        let mut running = self
            .inner
            .running
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *running = value;
        if !value {
            self.inner.idle.notify_all();
        }
    }
}

/// Marks the token as running until dropped.
struct RunningGuard<'a>(&'a CancelToken);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.set_running(false);
    }
}

// =============================================================================
// Search
// =============================================================================

struct LastSearch {
    variant: Variant,
    moves: Vec<ColorMove>,
    to_play: Color,
}

/// The search driver. Keeps the tree between searches for follow-up reuse.
pub struct Search {
    params: SearchParams,
    shared_params: SharedParams,
    auto_param: bool,
    tree: Tree,
    tmp_tree: Tree,
    states: Vec<SimulationState>,
    shared: Option<Arc<SharedConst>>,
    last: Option<LastSearch>,
    last_variant: Option<Variant>,
    status: SearchStatus,
    budget: Budget,
    forced_move: Option<(Move, f64)>,
    root_children: Vec<ChildInit>,
    progress: Option<SyncSender<Progress>>,
    nu_simulations: u64,
}

impl Search {
    pub fn new(params: SearchParams) -> Self {
        let capacity = Tree::capacity_for_memory(params.memory / 2);
        Self {
            params,
            shared_params: SharedParams::default(),
            auto_param: true,
            tree: Tree::with_capacity(capacity),
            tmp_tree: Tree::with_capacity(capacity),
            states: Vec::new(),
            shared: None,
            last: None,
            last_variant: None,
            status: SearchStatus::Idle,
            budget: Budget::Simulations(0),
            forced_move: None,
            root_children: Vec::new(),
            progress: None,
            nu_simulations: 0,
        }
    }

    // =========================================================================
    // Settings
    // =========================================================================

    pub fn params(&self) -> &SearchParams {
        &self.params
    }

    pub fn set_threads(&mut self, threads: usize) {
        self.params.threads = threads.max(1);
    }

    pub fn set_seed(&mut self, seed: Option<u64>) {
        self.params.seed = seed;
    }

    pub fn detect_symmetry(&self) -> bool {
        self.shared_params.detect_symmetry
    }

    pub fn set_detect_symmetry(&mut self, enable: bool) {
        self.shared_params.detect_symmetry = enable;
    }

    pub fn avoid_symmetric_draw(&self) -> bool {
        self.shared_params.avoid_symmetric_draw
    }

    pub fn set_avoid_symmetric_draw(&mut self, enable: bool) {
        self.shared_params.avoid_symmetric_draw = enable;
    }

    pub fn score_modification(&self) -> f32 {
        self.shared_params.score_modification
    }

    pub fn set_score_modification(&mut self, value: f32) {
        self.shared_params.score_modification = value;
    }

    /// Reset the tunables to their defaults whenever the variant changes.
    pub fn auto_param(&self) -> bool {
        self.auto_param
    }

    pub fn set_auto_param(&mut self, enable: bool) {
        self.auto_param = enable;
    }

    /// Receive `Progress` reports while searching. Reports are dropped if
    /// the channel is full.
    pub fn set_progress_sender(&mut self, sender: Option<SyncSender<Progress>>) {
        self.progress = sender;
    }

    fn set_default_param(&mut self, variant: Variant) {
        debug!(%variant, "setting default parameters");
        self.shared_params = SharedParams {
            detect_symmetry: variant.is_symmetric(),
            avoid_symmetric_draw: true,
            score_modification: SCORE_MODIFICATION,
        };
        self.params.exploration = EXPLORATION;
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn status(&self) -> SearchStatus {
        self.status
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    /// Simulations of the last search.
    pub fn nu_simulations(&self) -> u64 {
        self.nu_simulations
    }

    // =========================================================================
    // Searching
    // =========================================================================

    /// Search `bd` for `to_play` and return the chosen move.
    pub fn search(
        &mut self,
        bd: &Board,
        to_play: Color,
        budget: Budget,
        token: &CancelToken,
    ) -> SearchResult {
        let _running = token.start_running();
        self.start_search(bd, to_play, budget);
        self.run_workers(token)
    }

    /// Prepare a search: set up the shared constants and the workers, reuse
    /// the subtree of the last search if possible and expand the root.
    pub fn start_search(&mut self, bd: &Board, to_play: Color, budget: Budget) {
        let variant = bd.variant();
        if self.auto_param && self.last_variant != Some(variant) {
            self.set_default_param(variant);
        }
        self.last_variant = Some(variant);
        self.status = SearchStatus::Running;
        self.budget = budget;
        self.nu_simulations = 0;

        let shared = Arc::new(SharedConst::new(bd, to_play, self.shared_params.clone()));
        if !self.check_followup(bd, to_play) {
            self.tree.clear();
        }
        self.last = Some(LastSearch {
            variant,
            moves: bd.moves().to_vec(),
            to_play,
        });

        let threads = self.params.threads.max(1);
        let seed = self.params.seed.unwrap_or_else(|| fastrand::u64(..));
        self.states.truncate(threads);
        for state in &mut self.states {
            state.start_search(Arc::clone(&shared));
        }
        while self.states.len() < threads {
            self.states
                .push(SimulationState::new(Arc::clone(&shared), 0));
        }
        for (i, state) in self.states.iter_mut().enumerate() {
            state.seed(seed.wrapping_add(i as u64));
        }

        // The root is expanded here, so that a move is available even if the
        // search is cancelled before the first simulation.
        let mut prior = PriorKnowledge::new();
        let state = &mut self.states[0];
        state.start_simulation(0);
        prior.gen_children(
            state.board(),
            &shared,
            shared.prune_symmetric_root(),
            &mut self.root_children,
        );
        if !self.tree.root().is_expanded() {
            self.tree.try_expand(Tree::ROOT, &self.root_children);
        }
        let nu_children = self.tree.children(Tree::ROOT).len();
        self.forced_move = forced_move(&self.tree, &self.root_children);
        debug!(
            %variant,
            color = %to_play,
            ?budget,
            threads,
            children = nu_children,
            "start search"
        );
        self.shared = Some(shared);
    }

    /// Run the search prepared by `start_search`.
    pub fn run(&mut self, token: &CancelToken) -> SearchResult {
        let _running = token.start_running();
        self.run_workers(token)
    }

    fn run_workers(&mut self, token: &CancelToken) -> SearchResult {
        let start = Instant::now();
        if let Some((mv, value)) = self.forced_move {
            self.status = SearchStatus::Finished;
            debug!(mv = mv.index(), value, "forced move");
            return SearchResult {
                mv,
                status: self.status,
                simulations: 0,
                value,
                pv: vec![mv],
                elapsed: start.elapsed(),
            };
        }
        let Some(shared) = self.shared.clone() else {
            self.status = SearchStatus::Idle;
            return SearchResult {
                mv: Move::PASS,
                status: SearchStatus::Idle,
                simulations: 0,
                value: 0.5,
                pv: Vec::new(),
                elapsed: start.elapsed(),
            };
        };

        let (max_simulations, deadline) = match self.budget {
            Budget::Simulations(n) => (n, None),
            Budget::Time(d) => (u64::MAX, Some(start + d)),
        };
        let started = AtomicU64::new(0);
        let finished = AtomicU64::new(0);
        let worker = Worker {
            tree: &self.tree,
            shared: &shared,
            exploration: self.params.exploration,
            token,
            started: &started,
            finished: &finished,
            max_simulations,
            deadline,
            start,
        };
        thread::scope(|s| {
            for state in &mut self.states {
                let worker = &worker;
                let progress = self.progress.clone();
                s.spawn(move || worker.run(state, progress));
            }
        });

        self.nu_simulations = finished.load(Ordering::Relaxed);
        self.status = if token.is_cancelled() {
            SearchStatus::Cancelled
        } else {
            SearchStatus::Finished
        };
        let (mv, value) = best_move(&self.tree, Tree::ROOT)
            .map(|i| {
                let node = self.tree.node(i);
                (node.mv(), node.mean().unwrap_or(0.5))
            })
            .unwrap_or((Move::PASS, 0.5));
        let result = SearchResult {
            mv,
            status: self.status,
            simulations: self.nu_simulations,
            value,
            pv: self.principal_variation(),
            elapsed: start.elapsed(),
        };
        info!(
            simulations = result.simulations,
            nodes = self.tree.nu_nodes(),
            value = format_args!("{:.3}", value),
            elapsed_ms = result.elapsed.as_millis() as u64,
            status = ?result.status,
            "search finished"
        );
        result
    }

    /// Keep the subtree of the last search if the position follows the last
    /// searched one by moves that exist in the tree.
    fn check_followup(&mut self, bd: &Board, to_play: Color) -> bool {
        let Some(last) = &self.last else {
            return false;
        };
        let moves = bd.moves();
        if last.variant != bd.variant()
            || moves.len() < last.moves.len()
            || moves[..last.moves.len()] != last.moves[..]
        {
            return false;
        }
        let mut node = Tree::ROOT;
        let mut expected = last.to_play;
        for cm in &moves[last.moves.len()..] {
            if cm.color != expected {
                return false;
            }
            match self.tree.find_child(node, cm.mv) {
                Some(child) => node = child,
                None => return false,
            }
            expected = bd.next(cm.color);
        }
        if expected != to_play {
            return false;
        }
        if node != Tree::ROOT {
            self.tmp_tree.copy_subtree(&self.tree, node);
            std::mem::swap(&mut self.tree, &mut self.tmp_tree);
        }
        debug!(
            moves = moves.len() - last.moves.len(),
            nodes = self.tree.nu_nodes(),
            "reusing subtree of last search"
        );
        true
    }

    fn principal_variation(&self) -> Vec<Move> {
        let mut pv = Vec::new();
        let mut node = Tree::ROOT;
        while pv.len() < MAX_PV_LEN {
            let Some(child) = best_move(&self.tree, node) else {
                break;
            };
            pv.push(self.tree.node(child).mv());
            node = child;
        }
        pv
    }

    /// Text summary of the last search.
    pub fn write_info(&self) -> String {
        let Some(shared) = &self.shared else {
            return String::new();
        };
        let bd = shared.board();
        let root = self.tree.root();
        let mut s = format!(
            "Sim: {}, Nds: {}, Val: {:.2}\n",
            self.nu_simulations,
            self.tree.nu_nodes(),
            clamped_mean(root)
        );
        let mut children: Vec<NodeIdx> = self.tree.children(Tree::ROOT).collect();
        children.sort_by_key(|&i| std::cmp::Reverse(self.tree.node(i).count()));
        for &i in children.iter().take(INFO_CHILDREN) {
            let node = self.tree.node(i);
            s.push_str(&format!(
                "{} {} {:.3}\n",
                bd.move_to_string(node.mv()),
                node.count(),
                clamped_mean(node)
            ));
        }
        let pv: Vec<String> = self
            .principal_variation()
            .into_iter()
            .map(|mv| bd.move_to_string(mv))
            .collect();
        s.push_str(&format!("PV: {}\n", pv.join(" ")));
        if let Some(state) = self.states.first() {
            s.push_str(&state.write_info());
            s.push('\n');
        }
        s
    }
}

// =============================================================================
// Workers
// =============================================================================

struct Worker<'a> {
    tree: &'a Tree,
    shared: &'a SharedConst,
    exploration: f64,
    token: &'a CancelToken,
    started: &'a AtomicU64,
    finished: &'a AtomicU64,
    max_simulations: u64,
    deadline: Option<Instant>,
    start: Instant,
}

impl Worker<'_> {
    fn run(&self, state: &mut SimulationState, progress: Option<SyncSender<Progress>>) {
        let mut prior = PriorKnowledge::new();
        let mut children = Vec::new();
        let mut path = Vec::new();
        loop {
            if self.token.is_cancelled() {
                break;
            }
            if self.deadline.is_some_and(|d| Instant::now() >= d) {
                break;
            }
            let n = self.started.fetch_add(1, Ordering::Relaxed);
            if n >= self.max_simulations {
                break;
            }
            state.start_simulation(n);
            self.tree_descend(state, &mut prior, &mut children, &mut path);
            state.playout();
            let eval = state.evaluate_playout();
            state.update_lgr(&eval);
            for &(idx, c) in &path {
                self.tree.add_value(idx, eval[c.index()] as f64);
            }
            let done = self.finished.fetch_add(1, Ordering::Relaxed) + 1;
            if let Some(sender) = &progress
                && done % REPORT_PERIOD as u64 == 0
            {
                self.report(sender, done);
            }
        }
    }

    /// Select a path to a leaf, expanding it if it has enough visits, and
    /// play the moves of the path on `state`. Each entry of `path` holds a
    /// node and the color whose value it accumulates.
    fn tree_descend(
        &self,
        state: &mut SimulationState,
        prior: &mut PriorKnowledge,
        children: &mut Vec<ChildInit>,
        path: &mut Vec<(NodeIdx, Color)>,
    ) {
        path.clear();
        let mut node = Tree::ROOT;
        self.tree.add_visit(node);
        path.push((node, state.board().to_play()));
        loop {
            if !self.tree.node(node).is_expanded() {
                if state.is_terminal()
                    || self.tree.is_full()
                    || self.tree.node(node).visits() <= EXPAND_THRESHOLD
                {
                    return;
                }
                prior.gen_children(state.board(), self.shared, false, children);
                if !self.tree.try_expand(node, children) {
                    return;
                }
            }
            let Some(child) = most_urgent(self.tree, node, self.exploration) else {
                return;
            };
            let c = state.board().to_play();
            self.tree.add_visit(child);
            path.push((child, c));
            state.play_expanded_child(self.tree.node(child).mv());
            node = child;
        }
    }

    fn report(&self, sender: &SyncSender<Progress>, simulations: u64) {
        if let Some(i) = best_move(self.tree, Tree::ROOT) {
            let node = self.tree.node(i);
            let _ = sender.try_send(Progress {
                simulations,
                elapsed: self.start.elapsed(),
                mv: node.mv(),
                value: node.mean().unwrap_or(0.5),
            });
        }
    }
}

/// Child with the highest UCT value. Children without count are selected
/// first.
fn most_urgent(tree: &Tree, idx: NodeIdx, exploration: f64) -> Option<NodeIdx> {
    let log_n = (tree.node(idx).count().max(1) as f64).ln();
    let mut best = None;
    let mut best_value = f64::MIN;
    for i in tree.children(idx) {
        let node = tree.node(i);
        let count = node.count();
        if count == 0 {
            return Some(i);
        }
        let count = count as f64;
        let value = node.value_sum() / count + exploration * (log_n / count).sqrt();
        if value > best_value {
            best = Some(i);
            best_value = value;
        }
    }
    best
}

/// Mean value for display, clamped to [0, 1].
fn clamped_mean(node: &Node) -> f64 {
    node.mean().unwrap_or(0.5).clamp(0.0, 1.0)
}

/// Move that needs no search: the only child of the root, or the best prior
/// move if the root could not be expanded. Returns the move with its value.
fn forced_move(tree: &Tree, root_children: &[ChildInit]) -> Option<(Move, f64)> {
    let children = tree.children(Tree::ROOT);
    match children.len() {
        0 => root_children
            .iter()
            .max_by(|a, b| a.value.total_cmp(&b.value))
            .map(|c| (c.mv, c.value as f64)),
        1 => {
            let node = tree.node(children.start);
            Some((node.mv(), node.mean().unwrap_or(0.5)))
        }
        _ => None,
    }
}

/// Child with the highest count, ties broken by the mean value.
fn best_move(tree: &Tree, idx: NodeIdx) -> Option<NodeIdx> {
    tree.children(idx).max_by(|&a, &b| {
        let (a, b) = (tree.node(a), tree.node(b));
        a.count().cmp(&b.count()).then_with(|| {
            a.mean()
                .unwrap_or(0.0)
                .total_cmp(&b.mean().unwrap_or(0.0))
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(seed: u64) -> SearchParams {
        SearchParams {
            threads: 1,
            seed: Some(seed),
            memory: 8 << 20,
            exploration: EXPLORATION,
        }
    }

    #[test]
    fn test_search_returns_legal_move() {
        let bd = Board::new(Variant::Duo);
        let mut search = Search::new(params(1));
        let result = search.search(&bd, Color(0), Budget::Simulations(200), &CancelToken::new());
        assert_eq!(result.status, SearchStatus::Finished);
        assert_eq!(result.simulations, 200);
        assert!(bd.is_legal(Color(0), result.mv));
        assert_eq!(result.pv.first(), Some(&result.mv));
        assert!(search.write_info().contains("Sim: 200"));
    }

    #[test]
    fn test_cancelled_before_start() {
        let bd = Board::new(Variant::Classic);
        let mut search = Search::new(params(2));
        let token = CancelToken::new();
        search.start_search(&bd, Color(0), Budget::Simulations(u64::MAX));
        token.cancel();
        let result = search.run(&token);
        assert_eq!(result.status, SearchStatus::Cancelled);
        assert_eq!(result.simulations, 0);
        assert!(bd.is_legal(Color(0), result.mv));
    }

    #[test]
    fn test_followup_reuses_subtree() {
        let mut bd = Board::new(Variant::Duo);
        let mut search = Search::new(params(3));
        let token = CancelToken::new();
        let result = search.search(&bd, Color(0), Budget::Simulations(300), &token);
        let child = search.tree().find_child(Tree::ROOT, result.mv).unwrap();
        let nu_children = search.tree().children(child).len();
        assert!(nu_children > 0);
        bd.play(Color(0), result.mv);
        search.start_search(&bd, Color(1), Budget::Simulations(0));
        let root = search.tree().root();
        assert!(root.is_expanded());
        assert_eq!(search.tree().children(Tree::ROOT).len(), nu_children);
        assert_eq!(root.count(), 0);
        assert_eq!(root.value_sum(), 0.0);
    }

    #[test]
    fn test_token_running_while_searching() {
        let token = CancelToken::new();
        assert!(!token.is_running());
        {
            let _running = token.start_running();
            assert!(token.is_running());
        }
        assert!(!token.is_running());
    }

    #[test]
    fn test_cancel_waits_for_search() {
        let bd = Board::new(Variant::Trigon);
        let mut search = Search::new(SearchParams {
            threads: 2,
            ..params(4)
        });
        let token = CancelToken::new();
        let result = thread::scope(|s| {
            let handle =
                s.spawn(|| search.search(&bd, Color(0), Budget::Simulations(u64::MAX), &token));
            while !token.is_running() {
                thread::yield_now();
            }
            token.cancel();
            assert!(!token.is_running());
            handle.join().unwrap()
        });
        assert_eq!(result.status, SearchStatus::Cancelled);
        assert!(bd.is_legal(Color(0), result.mv));
    }

    #[test]
    fn test_progress_from_all_workers() {
        let bd = Board::new(Variant::Duo);
        let mut search = Search::new(SearchParams {
            threads: 4,
            ..params(6)
        });
        let (tx, rx) = std::sync::mpsc::sync_channel(64);
        search.set_progress_sender(Some(tx));
        let n = 4 * REPORT_PERIOD as u64;
        let result = search.search(&bd, Color(0), Budget::Simulations(n), &CancelToken::new());
        assert_eq!(result.simulations, n);
        let mut reported: Vec<u64> = rx.try_iter().map(|p| p.simulations).collect();
        reported.sort_unstable();
        let expected: Vec<u64> = (1..=4).map(|i| i * REPORT_PERIOD as u64).collect();
        assert_eq!(reported, expected);
    }

    #[test]
    fn test_full_tree_keeps_simulating() {
        let bd = Board::new(Variant::Classic);
        let mut search = Search::new(SearchParams {
            memory: 2 * 2000 * std::mem::size_of::<Node>(),
            ..params(7)
        });
        let result = search.search(&bd, Color(0), Budget::Simulations(3000), &CancelToken::new());
        assert_eq!(result.simulations, 3000);
        assert!(search.tree().is_full());
        assert!(search.tree().nu_nodes() <= 2000);
        assert_eq!(search.tree().root().visits(), 3000);
        assert!(bd.is_legal(Color(0), result.mv));
    }

    #[test]
    fn test_forced_move_value() {
        let tree = Tree::with_capacity(8);
        let children = [ChildInit { mv: Move::new(4), value: 0.3, count: 3 }];
        assert_eq!(forced_move(&tree, &children), Some((Move::new(4), 0.3f32 as f64)));
        tree.try_expand(Tree::ROOT, &children);
        let (mv, value) = forced_move(&tree, &children).unwrap();
        assert_eq!(mv, Move::new(4));
        assert!((value - 0.3).abs() < 1e-6);
        let two = Tree::with_capacity(8);
        two.try_expand(Tree::ROOT, &[children[0], ChildInit { mv: Move::PASS, value: 0.5, count: 0 }]);
        assert_eq!(forced_move(&two, &children), None);
    }

    #[test]
    fn test_most_urgent_prefers_unvisited() {
        let tree = Tree::with_capacity(8);
        let children = [
            ChildInit { mv: Move::new(0), value: 0.6, count: 3 },
            ChildInit { mv: Move::PASS, value: 0.5, count: 0 },
        ];
        tree.try_expand(Tree::ROOT, &children);
        let i = most_urgent(&tree, Tree::ROOT, EXPLORATION).unwrap();
        assert_eq!(tree.node(i).mv(), Move::PASS);
        let best = best_move(&tree, Tree::ROOT).unwrap();
        assert_eq!(tree.node(best).mv(), Move::new(0));
    }
}
