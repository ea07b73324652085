use crate::board::{Board, SpaceKind};
use crate::cancel::CancelToken;
use crate::error::Result;
use crate::scoring::{Stats, solution_score};
use crate::types::{Algorithm, BoardConfig, Options, Piece, Placement, Verbosity};

/// Per-run settings shared by every strategy invoked during one optimization.
#[derive(Debug, Clone)]
pub struct RunContext<'a> {
    pub board: BoardConfig,
    pub allow_rotation: bool,
    pub max_scan_steps: u32,
    pub verbosity: Verbosity,
    pub cancel: &'a CancelToken,
}

impl<'a> RunContext<'a> {
    pub fn new(board: BoardConfig, options: &Options, cancel: &'a CancelToken) -> Self {
        Self {
            board,
            allow_rotation: options.allow_rotation,
            max_scan_steps: options.max_scan_steps.max(1),
            verbosity: options.verbosity,
            cancel,
        }
    }

    #[cfg(test)]
    pub fn for_test(board: BoardConfig, cancel: &'a CancelToken) -> Self {
        Self::new(
            board,
            &Options {
                verbosity: Verbosity::Quiet,
                ..Options::default()
            },
            cancel,
        )
    }

    pub fn new_board(&self, id: usize, kind: SpaceKind) -> Result<Board> {
        Board::new(id, &self.board, kind)
    }

    pub fn summaries(&self) -> bool {
        self.verbosity >= Verbosity::Summary
    }

    pub fn trace_placement(
        &self,
        algorithm: Algorithm,
        board: usize,
        placement: &Placement,
        score: Option<f64>,
    ) {
        if self.verbosity >= Verbosity::Trace {
            tracing::debug!(
                %algorithm,
                board,
                x = placement.x,
                y = placement.y,
                size = %placement.rect,
                rotated = placement.rotated,
                score,
                "placed"
            );
        }
    }

    pub fn report_unplaced(&self, algorithm: Algorithm, piece: &Piece) {
        if self.summaries() {
            tracing::warn!(%algorithm, piece = %piece.name, size = %piece.size, "could not place piece");
        }
    }
}

/// A heuristic that lays an ordered piece list out on as many boards as it needs.
pub trait PlacementStrategy {
    fn algorithm(&self) -> Algorithm;

    fn pack(&self, pieces: &[Piece], ctx: &RunContext<'_>) -> Result<Solution>;
}

/// Copy of `pieces` ordered by descending area; equal areas keep input order.
pub fn sort_by_area(pieces: &[Piece]) -> Vec<Piece> {
    let mut sorted = pieces.to_vec();
    sorted.sort_by(|a, b| b.area().cmp(&a.area()));
    sorted
}

#[derive(Debug, Clone)]
pub struct Solution {
    pub boards: Vec<Board>,
    pub unplaced: Vec<Piece>,
    pub algorithm: Algorithm,
    pub stats: Stats,
    /// Set by the selectors that rank whole layouts.
    pub score: Option<f64>,
}

impl Solution {
    pub fn new(algorithm: Algorithm, boards: Vec<Board>, unplaced: Vec<Piece>) -> Self {
        let stats = Stats::from_boards(&boards);
        Self {
            boards,
            unplaced,
            algorithm,
            stats,
            score: None,
        }
    }

    pub fn empty(algorithm: Algorithm) -> Self {
        Self::new(algorithm, Vec::new(), Vec::new())
    }

    pub fn board_count(&self) -> usize {
        self.boards.len()
    }

    pub fn placed_count(&self) -> usize {
        self.stats.pieces_placed
    }

    pub fn total_pieces(&self) -> usize {
        self.placed_count() + self.unplaced.len()
    }

    pub fn score(&self) -> f64 {
        solution_score(&self.boards)
    }

    pub fn with_score(mut self, score: f64) -> Self {
        self.score = Some(score);
        self
    }

    pub fn waste_percent(&self) -> f64 {
        if self.stats.total_area == 0 {
            return 0.0;
        }
        100.0 - self.stats.utilization
    }
}
