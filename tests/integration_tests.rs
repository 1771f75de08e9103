//! Integration tests for polyform-mcts
//!
//! These tests drive the public API the way a front end would: set up a
//! position from a move history, search it, and check the engine contracts
//! across modules.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use proptest::prelude::*;

use polyform_mcts::analyze::AnalyzeGame;
use polyform_mcts::board::{Board, ColorMove};
use polyform_mcts::book::Book;
use polyform_mcts::catalog::Move;
use polyform_mcts::error::ReplayError;
use polyform_mcts::mcts::{Budget, CancelToken, Search, SearchParams, SearchStatus};
use polyform_mcts::player::Player;
use polyform_mcts::playout::{SimulationState, game_results, piece_gamma};
use polyform_mcts::prior::PriorKnowledge;
use polyform_mcts::shared::{SharedConst, SharedParams};
use polyform_mcts::symmetry::is_symmetry_broken;
use polyform_mcts::variant::{Color, Variant};

// =============================================================================
// Helper functions for setting up test positions
// =============================================================================

fn params(seed: u64) -> SearchParams {
    SearchParams {
        threads: 1,
        seed: Some(seed),
        memory: 8 << 20,
        ..SearchParams::default()
    }
}

/// Play up to `n` random legal moves. Colors without moves pass.
fn random_game(variant: Variant, n: usize, seed: u64) -> Board {
    let mut rng = fastrand::Rng::with_seed(seed);
    let mut bd = Board::new(variant);
    let mut moves = Vec::new();
    for _ in 0..n {
        if bd.is_game_over() {
            break;
        }
        let c = bd.to_play();
        bd.gen_moves(c, &mut moves);
        let mv = if moves.is_empty() {
            Move::PASS
        } else {
            moves[rng.usize(..moves.len())]
        };
        bd.play(c, mv);
    }
    bd
}

fn simulation_state(bd: &Board, seed: u64) -> SimulationState {
    let shared = Arc::new(SharedConst::new(bd, bd.to_play(), SharedParams::default()));
    SimulationState::new(shared, seed)
}

fn variant_strategy() -> impl Strategy<Value = Variant> {
    prop::sample::select(Variant::ALL.to_vec())
}

// =============================================================================
// Board and move generation
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn generated_moves_are_legal_and_unique(
        variant in variant_strategy(),
        n in 0usize..40,
        seed in any::<u64>(),
    ) {
        let bd = random_game(variant, n, seed);
        for c in variant.colors() {
            let mut moves = Vec::new();
            bd.gen_moves(c, &mut moves);
            prop_assert!(moves.windows(2).all(|w| w[0] < w[1]));
            prop_assert!(moves.iter().all(|&mv| bd.is_legal(c, mv)));
            prop_assert_eq!(!moves.is_empty(), bd.has_moves(c));
        }
    }

    #[test]
    fn snapshot_restores_position(
        variant in variant_strategy(),
        n in 0usize..20,
        extra in 1usize..20,
        seed in any::<u64>(),
    ) {
        let mut bd = random_game(variant, n, seed);
        let saved = bd.clone();
        bd.take_snapshot();
        let mut rng = fastrand::Rng::with_seed(seed ^ 1);
        let mut moves = Vec::new();
        for _ in 0..extra {
            let c = bd.to_play();
            bd.gen_moves(c, &mut moves);
            match moves.len() {
                0 => bd.play_pass(),
                len => bd.play_nonpass(moves[rng.usize(..len)]),
            }
        }
        bd.restore_snapshot();
        prop_assert_eq!(&bd, &saved);
    }

    #[test]
    fn piece_gamma_grows_with_size(
        size in 1usize..6,
        nu_attach in 1usize..12,
        size_factor in 1.0f64..6.0,
        attach_factor in 1.0f64..2.0,
    ) {
        let small = piece_gamma(size_factor, attach_factor, size, nu_attach);
        prop_assert!(piece_gamma(size_factor, attach_factor, size + 1, nu_attach) >= small);
        prop_assert!(piece_gamma(size_factor, attach_factor, size, nu_attach + 1) >= small);
    }
}

// =============================================================================
// Simulation state
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn incremental_move_list_matches_rebuild(
        variant in variant_strategy(),
        n in 4usize..30,
        seed in any::<u64>(),
    ) {
        let bd = Board::new(variant);
        let mut st = simulation_state(&bd, seed);
        st.start_simulation(0);
        for _ in 0..n {
            let Some(mv) = st.gen_playout_move() else {
                return Ok(());
            };
            st.play_playout(mv);
        }
        let c = st.board().to_play();
        st.update_moves(c);
        let mut incremental = st.moves(c).to_vec();
        st.init_moves_with_gamma(c);
        let mut rebuilt = st.moves(c).to_vec();
        st.init_moves_without_gamma(c);
        let mut unweighted = st.moves(c).to_vec();
        incremental.sort_unstable();
        rebuilt.sort_unstable();
        unweighted.sort_unstable();
        prop_assert_eq!(&incremental, &rebuilt);
        prop_assert_eq!(&unweighted, &rebuilt);
    }
}

#[test]
fn test_rank_results_with_ties() {
    let r = game_results(&[10.0, 10.0, 5.0, 0.0]);
    assert!((r[0] - 0.8333).abs() < 1e-3);
    assert!((r[1] - 0.8333).abs() < 1e-3);
    assert!((r[2] - 0.3333).abs() < 1e-3);
    assert_eq!(r[3], 0.0);
}

#[test]
fn test_pass_child_at_end_of_playout() {
    let bd = Board::new(Variant::Classic);
    let mut st = simulation_state(&bd, 17);
    st.start_simulation(0);
    st.playout();
    let end = st.board();
    assert!(!end.has_moves(end.to_play()));
    let mut prior = PriorKnowledge::new();
    let mut children = Vec::new();
    prior.gen_children(end, st.shared(), false, &mut children);
    assert_eq!(children.len(), 1);
    assert!(children[0].mv.is_pass());
}

// =============================================================================
// Symmetry
// =============================================================================

#[test]
fn test_symmetry_detection_follows_replies() {
    let mut bd = Board::new(Variant::Duo);
    assert!(!is_symmetry_broken(&bd));
    let mut moves = Vec::new();
    for i in 0..3 {
        bd.gen_moves(Color(0), &mut moves);
        // A piece crossing the centre cannot be mirrored.
        let mirrored = |mv: Move| {
            let mut after = bd.clone();
            after.play(Color(0), mv);
            let reply = bd.board_const().symmetric_move(mv).unwrap();
            after.is_legal(Color(1), reply).then_some((mv, reply))
        };
        let (mv, reply) = moves[i * 7 % moves.len()..]
            .iter()
            .chain(&moves)
            .find_map(|&mv| mirrored(mv))
            .unwrap();
        bd.play(Color(0), mv);
        assert!(!is_symmetry_broken(&bd));
        bd.play(Color(1), reply);
        assert!(!is_symmetry_broken(&bd));
    }
    bd.gen_moves(Color(0), &mut moves);
    let mv = moves[0];
    bd.play(Color(0), mv);
    let symm = bd.board_const().symmetric_move(mv).unwrap();
    bd.gen_moves(Color(1), &mut moves);
    let other = moves.iter().copied().find(|&m| m != symm).unwrap();
    bd.play(Color(1), other);
    assert!(is_symmetry_broken(&bd));
}

// =============================================================================
// Search
// =============================================================================

#[test]
fn test_fixed_seed_is_deterministic() {
    let bd = random_game(Variant::Duo, 4, 9);
    let c = bd.to_play();
    let run = || {
        let mut search = Search::new(params(42));
        search.search(&bd, c, Budget::Simulations(300), &CancelToken::new())
    };
    let a = run();
    let b = run();
    assert_eq!(a.mv, b.mv);
    assert_eq!(a.pv, b.pv);
    assert_eq!(a.value, b.value);
}

#[test]
fn test_cancel_from_other_thread() {
    let bd = Board::new(Variant::Classic);
    let mut search = Search::new(SearchParams {
        threads: 2,
        ..params(5)
    });
    let token = CancelToken::new();
    let result = thread::scope(|s| {
        let handle = s.spawn(|| {
            search.search(&bd, Color(0), Budget::Simulations(u64::MAX), &token)
        });
        thread::sleep(Duration::from_millis(100));
        token.cancel();
        assert!(token.is_cancelled());
        handle.join().unwrap()
    });
    assert_eq!(result.status, SearchStatus::Cancelled);
    assert!(bd.is_legal(Color(0), result.mv));
    assert!(!result.mv.is_pass());
}

#[test]
fn test_time_budget() {
    let bd = Board::new(Variant::Trigon3);
    let mut search = Search::new(params(8));
    let result = search.search(
        &bd,
        Color(0),
        Budget::Time(Duration::from_millis(50)),
        &CancelToken::new(),
    );
    assert_eq!(result.status, SearchStatus::Finished);
    assert!(result.simulations > 0);
    assert!(bd.is_legal(Color(0), result.mv));
}

// =============================================================================
// Analysis replay
// =============================================================================

#[test]
fn test_rejected_restore_leaves_analysis_unchanged() {
    let bd = random_game(Variant::Classic2, 6, 3);
    let values = [0.4, 0.5, 0.6, 0.5, 0.45, 0.55];
    let mut analyze = AnalyzeGame::new(Variant::Classic2);
    analyze
        .set(Variant::Classic2, bd.moves(), &values)
        .unwrap();
    let before = analyze.entries();

    let mut bad_color = before.clone();
    bad_color[2].0 = 4;
    assert_eq!(
        analyze.restore(Variant::Classic2, "classic_2", &bad_color),
        Err(ReplayError::ColorOutOfRange(4))
    );

    let mut bad_move = before.clone();
    bad_move[5].1 = "zz99".to_string();
    assert!(matches!(
        analyze.restore(Variant::Classic2, "classic_2", &bad_move),
        Err(ReplayError::Move(_))
    ));

    assert!(matches!(
        analyze.restore(Variant::Classic2, "duo", &before),
        Err(ReplayError::WrongVariant { .. })
    ));
    assert!(matches!(
        analyze.restore(Variant::Classic2, "blokus", &before),
        Err(ReplayError::WrongVariant { .. })
    ));

    assert_eq!(analyze.variant(), Variant::Classic2);
    assert_eq!(analyze.entries(), before);
    let moves: Vec<ColorMove> = (0..analyze.nu_moves()).map(|i| analyze.get_move(i)).collect();
    assert_eq!(moves, bd.moves());
}

// =============================================================================
// Player
// =============================================================================

struct FixedBook(Move);

impl Book for FixedBook {
    fn lookup(&self, bd: &Board) -> Option<Move> {
        (bd.nu_moves() == 0).then_some(self.0)
    }
}

#[test]
fn test_player_uses_book_only_when_known() {
    let bd = Board::new(Variant::Duo);
    let mut moves = Vec::new();
    bd.gen_moves(Color(0), &mut moves);
    let book_move = moves[moves.len() - 1];
    let mut player = Player::new(params(1));
    player.set_book(Some(Box::new(FixedBook(book_move))));
    player.set_fixed_simulations(Some(10));
    assert_eq!(player.genmove(&bd, Color(0)), book_move);

    let next = random_game(Variant::Duo, 1, 4);
    let result = player.genmove_cancellable(&next, Color(1), &CancelToken::new());
    assert_eq!(result.simulations, 10);
    assert!(next.is_legal(Color(1), result.mv));
}

#[test]
fn test_player_settings_forward_to_search() {
    let mut player = Player::new(params(1));
    player.set_threads(0);
    assert_eq!(player.threads(), 1);
    player.set_auto_param(false);
    player.set_detect_symmetry(false);
    player.set_avoid_symmetric_draw(false);
    assert!(!player.auto_param());
    assert!(!player.search().detect_symmetry());
    assert!(!player.avoid_symmetric_draw());
    player.set_level(0);
    assert_eq!(player.level(), 1);
}
