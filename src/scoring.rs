use serde::Serialize;

use crate::board::Board;
use crate::types::Rect;

/// Free rectangles below this area count as pockets too small to reuse.
pub const SMALL_FRAGMENT_AREA: u64 = 100 * 100;

const CORNER_WEIGHT: f64 = 0.1;
const ADJACENCY_BONUS: f64 = 10.0;
const FRAGMENT_PENALTY: f64 = 5.0;
const BOARD_PENALTY: f64 = 5.0;

/// Desirability of putting `rect` at (x, y): pulls toward the bottom-left
/// corner, rewards snug neighbours and punishes eating into small pockets.
pub fn position_score(board: &Board, rect: Rect, x: u32, y: u32) -> f64 {
    let corner = CORNER_WEIGHT * board.usable.w.saturating_sub(x) as f64
        + CORNER_WEIGHT * board.usable.h.saturating_sub(y) as f64;
    let adjacency = ADJACENCY_BONUS * board.adjacent_count(rect, x, y) as f64;
    let pockets = FRAGMENT_PENALTY * board.small_fragments(rect, x, y) as f64;
    corner + adjacency - pockets
}

/// Ranks whole layouts: dense boards score high, every extra board costs a
/// flat penalty and global utilization is added on top. Never negative.
pub fn solution_score(boards: &[Board]) -> f64 {
    if boards.is_empty() {
        return 0.0;
    }
    let per_board: f64 = boards.iter().map(|b| b.utilization() * 100.0).sum();
    let stats = Stats::from_boards(boards);
    let score = per_board - BOARD_PENALTY * boards.len() as f64 + stats.utilization;
    score.max(0.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub board_count: usize,
    pub total_area: u64,
    pub used_area: u64,
    pub utilization: f64,
    pub pieces_placed: usize,
    pub waste_area: u64,
}

impl Stats {
    pub fn from_boards(boards: &[Board]) -> Self {
        let total_area: u64 = boards.iter().map(Board::usable_area).sum();
        let used_area: u64 = boards.iter().map(Board::used_area).sum();
        let utilization = if total_area > 0 {
            used_area as f64 / total_area as f64 * 100.0
        } else {
            0.0
        };
        Self {
            board_count: boards.len(),
            total_area,
            used_area,
            utilization,
            pieces_placed: boards.iter().map(|b| b.pieces.len()).sum(),
            waste_area: total_area.saturating_sub(used_area),
        }
    }
}
