//! Constants for board limits, MCTS parameters, priors and playout gammas.
//!
//! This module contains all the compile-time tunables of the engine.
//! Values that differ between game variants are selected at search start
//! from the tables below (see [`crate::variant::Variant`]).

// =============================================================================
// Board Limits
// =============================================================================

/// Maximum number of colors in any variant.
pub const MAX_COLORS: usize = 4;

/// Maximum number of cells of a single piece (polyiamonds go up to 6).
pub const MAX_PIECE_SIZE: usize = 6;

/// Maximum number of pieces per color in any variant.
pub const MAX_PIECES: usize = 22;

/// Upper bound on the number of moves in a game (every color places every
/// piece, plus one pass per color per round).
pub const MAX_GAME_LEN: usize = 2 * MAX_COLORS * MAX_PIECES;

/// Bonus points for placing all pieces.
pub const BONUS_ALL_PIECES: u32 = 15;

/// Extra bonus if the last placed piece was the single-cell piece.
pub const BONUS_ONE_PIECE_LAST: u32 = 5;

// =============================================================================
// MCTS (Monte Carlo Tree Search) Parameters
// =============================================================================

/// Exploration constant of the UCT bias term.
pub const EXPLORATION: f64 = 0.1;

/// Real visits a node needs before its children are created.
pub const EXPAND_THRESHOLD: u32 = 1;

/// Default memory ceiling for the node arena, in bytes.
pub const DEFAULT_MEMORY: usize = 256 * 1024 * 1024;

/// Simulations between progress reports.
pub const REPORT_PERIOD: usize = 1000;

/// Number of root children listed by `Search::write_info`.
pub const INFO_CHILDREN: usize = 5;

/// Maximum number of moves in a reported principal variation.
pub const MAX_PV_LEN: usize = 10;

// =============================================================================
// Prior Values (for MCTS node initialization)
// =============================================================================

/// Virtual visit count given to every new child.
pub const PRIOR_COUNT: u32 = 3;

/// Value of the heuristically best child.
pub const PRIOR_VALUE_MAX: f64 = 0.6;

/// Lower bound of the prior value.
pub const PRIOR_VALUE_MIN: f64 = 0.1;

/// Decay of the prior value per heuristic unit below the best move.
pub const PRIOR_DECAY: f64 = 0.3;

/// Heuristic weight of one newly created attach point.
pub const PRIOR_ATTACH_WEIGHT: f64 = 0.5;

/// Heuristic weight of the distance to the board centre early in the game.
pub const PRIOR_CENTER_WEIGHT: f64 = 0.2;

/// The centre heuristic is used while fewer pieces than this are on board
/// per color.
pub const PRIOR_CENTER_PIECES: u32 = 3;

// =============================================================================
// Playout Gammas
// =============================================================================

/// Gamma multiplier per locally created attach point.
pub const GAMMA_LOCAL_ATTACH: f64 = 1e10;

/// Gamma multiplier for moves adjacent to an opponent attach point.
pub const GAMMA_ADJ_ATTACH: f64 = 1e5;

/// Size of the hashed last-good-reply table (per color).
pub const LGR_HASH_SIZE: usize = 1 << 16;

// =============================================================================
// Evaluation Shaping
// =============================================================================

/// Default coefficient of the score bonus in playout results.
pub const SCORE_MODIFICATION: f32 = 0.2;

/// Coefficient of the game length bonus in playout results.
pub const LENGTH_MODIFICATION: f32 = 0.12;

/// Steepness of the sigmoid used for the bonuses.
pub const SIGMOID_STEEPNESS: f32 = 2.0;

// =============================================================================
// Player Levels
// =============================================================================

/// Highest playing level.
pub const MAX_LEVEL: u32 = 9;

/// Simulations per level for 4-color variants.
pub const LEVEL_SIMULATIONS: [u64; MAX_LEVEL as usize] =
    [3, 24, 87, 213, 667, 1989, 5000, 12000, 24000];

/// Multiplier applied to the level table in 2-color variants, whose
/// playouts are shorter.
pub const LEVEL_FACTOR_TWO_COLORS: u64 = 3;
