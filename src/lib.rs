//! Polyform-MCTS: a Monte Carlo Tree Search engine for polyomino and
//! polyiamond placement games (Blokus Duo, Classic and Trigon variants).
//!
//! ## Modules
//!
//! - [`constants`] - Engine parameters and playing levels
//! - [`geometry`] - Square and triangle grids, adjacency and symmetry
//! - [`piece`] - Piece sets and their orientations
//! - [`variant`] - Game variants and colors
//! - [`catalog`] - Precomputed move catalog per board type
//! - [`board`] - Incremental board state with legality and scoring
//! - [`symmetry`] - Detection of point-symmetric positions
//! - [`shared`] - Per-search constants shared by the workers
//! - [`prior`] - Prior knowledge for new tree nodes
//! - [`playout`] - Per-thread simulation state and playout policy
//! - [`tree`] - Lock-free search tree arena
//! - [`mcts`] - Parallel search driver
//! - [`player`] - Playing levels and opening book
//! - [`analyze`] - Game analysis
//!
//! ## Example
//!
//! ```no_run
//! use polyform_mcts::board::Board;
//! use polyform_mcts::mcts::SearchParams;
//! use polyform_mcts::player::Player;
//! use polyform_mcts::variant::{Color, Variant};
//!
//! let bd = Board::new(Variant::Duo);
//! let mut player = Player::new(SearchParams::default());
//! player.set_level(3);
//! let mv = player.genmove(&bd, Color(0));
//! println!("Best move: {}", bd.move_to_string(mv));
//! ```

pub mod analyze;
pub mod board;
pub mod book;
pub mod catalog;
pub mod constants;
pub mod error;
pub mod geometry;
pub mod mcts;
pub mod piece;
pub mod player;
pub mod playout;
pub mod prior;
pub mod shared;
pub mod stats;
pub mod symmetry;
pub mod tree;
pub mod variant;
