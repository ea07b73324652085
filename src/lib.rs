//! Rectangular panel cutting optimizer.
//!
//! Places rectangular pieces on as few stock boards as possible, keeping one
//! saw kerf between pieces and an edge margin on every board. Three placement
//! heuristics are available (Bottom-Left-Fill, Best-Fit-Decreasing-Height and
//! Guillotine), plus a hybrid that races them and a genetic search over piece
//! orderings. [`solver::Optimizer`] is the entry point.

pub mod api;
pub mod bfdh;
pub mod blf;
pub mod board;
pub mod cancel;
pub mod error;
pub mod free_space;
pub mod genetic;
pub mod guillotine;
pub mod hybrid;
pub mod scoring;
pub mod solver;
pub mod strategy;
pub mod types;

pub use cancel::CancelToken;
pub use error::{OptimizeError, Result};
pub use solver::Optimizer;
pub use strategy::Solution;
pub use types::{Algorithm, BoardConfig, Options, PieceSpec};
