use crate::board::{Board, SpaceKind};
use crate::error::Result;
use crate::scoring::position_score;
use crate::strategy::{PlacementStrategy, RunContext, Solution, sort_by_area};
use crate::types::{Algorithm, Piece, Rect};

/// A feasible spot for one orientation of a piece.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub x: u32,
    pub y: u32,
    pub rotated: bool,
    pub score: f64,
}

/// Bottom-Left-Fill: largest pieces first, each at the lowest, then leftmost,
/// grid position that clears every placed piece by one kerf.
#[derive(Debug, Clone, Copy, Default)]
pub struct BottomLeftFill;

impl BottomLeftFill {
    /// Places pieces in exactly the given order. The genetic search uses this
    /// to evaluate its orderings.
    pub fn pack_in_order(pieces: Vec<Piece>, ctx: &RunContext<'_>) -> Result<Solution> {
        let mut boards: Vec<Board> = Vec::new();
        let mut unplaced = Vec::new();

        for piece in pieces {
            ctx.cancel.check()?;

            let existing = boards
                .iter()
                .enumerate()
                .find_map(|(bi, board)| Self::locate(board, &piece, ctx).map(|c| (bi, c)));
            if let Some((bi, c)) = existing {
                let placement = boards[bi].commit(piece, c.x, c.y, c.rotated);
                ctx.trace_placement(Algorithm::Blf, boards[bi].id, &placement, Some(c.score));
                continue;
            }

            let mut board = ctx.new_board(boards.len() + 1, SpaceKind::FreeRects)?;
            match Self::locate(&board, &piece, ctx) {
                Some(c) => {
                    let placement = board.commit(piece, c.x, c.y, c.rotated);
                    ctx.trace_placement(Algorithm::Blf, board.id, &placement, Some(c.score));
                    boards.push(board);
                }
                None => {
                    ctx.report_unplaced(Algorithm::Blf, &piece);
                    unplaced.push(piece);
                }
            }
        }

        Ok(Solution::new(Algorithm::Blf, boards, unplaced))
    }

    /// Tries the piece unrotated, then rotated when allowed.
    pub fn locate(board: &Board, piece: &Piece, ctx: &RunContext<'_>) -> Option<Candidate> {
        piece
            .orientations(ctx.allow_rotation)
            .iter()
            .find_map(|&rotated| {
                Self::find_position(board, piece.oriented(rotated), ctx.max_scan_steps).map(
                    |(x, y, score)| Candidate {
                        x,
                        y,
                        rotated,
                        score,
                    },
                )
            })
    }

    /// Row-major grid scan from the bottom-left corner.
    ///
    /// Candidates are ordered by y, then x, so the first feasible one wins and
    /// the position score only ever ranks it. A collision lets the scan jump
    /// straight past the blocking piece: every grid point before its
    /// kerf-inflated right edge collides with it too.
    pub fn find_position(board: &Board, rect: Rect, max_scan_steps: u32) -> Option<(u32, u32, f64)> {
        if rect.is_degenerate() || !rect.fits_in(&board.usable) {
            return None;
        }
        let step = scan_step(board.usable, board.kerf(), max_scan_steps);
        let kerf = board.kerf();

        let mut y = 0;
        while y + rect.h <= board.usable.h {
            let mut x = 0;
            while x + rect.w <= board.usable.w {
                match board.blocker(rect, x, y) {
                    None => return Some((x, y, position_score(board, rect, x, y))),
                    Some(blocker) => x = align_up(blocker.right() + kerf, step),
                }
            }
            y += step;
        }
        None
    }
}

impl PlacementStrategy for BottomLeftFill {
    fn algorithm(&self) -> Algorithm {
        Algorithm::Blf
    }

    fn pack(&self, pieces: &[Piece], ctx: &RunContext<'_>) -> Result<Solution> {
        Self::pack_in_order(sort_by_area(pieces), ctx)
    }
}

/// Grid pitch: the kerf (at least 1mm), coarsened so neither axis has more
/// than `max_steps` positions.
pub fn scan_step(usable: Rect, kerf: u32, max_steps: u32) -> u32 {
    let longest = usable.w.max(usable.h);
    let bounded = longest.div_ceil(max_steps.max(1));
    kerf.max(1).max(bounded)
}

fn align_up(value: u32, step: u32) -> u32 {
    value.div_ceil(step) * step
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancel::CancelToken;
    use crate::strategy::testing::assert_solution_valid;
    use crate::types::BoardConfig;

    fn pieces(specs: &[(u32, u32, u32, bool)]) -> Vec<Piece> {
        let mut out = Vec::new();
        for (g, &(w, h, qty, rot)) in specs.iter().enumerate() {
            for i in 0..qty {
                out.push(Piece::new(format!("p{g}_{}", i + 1), g, Rect::new(w, h), rot));
            }
        }
        out
    }

    #[test]
    fn test_scan_step() {
        assert_eq!(scan_step(Rect::new(1000, 1000), 0, 1000), 1);
        assert_eq!(scan_step(Rect::new(1000, 1000), 3, 1000), 3);
        assert_eq!(scan_step(Rect::new(2440, 1220), 0, 1000), 3);
        assert_eq!(scan_step(Rect::new(2440, 1220), 5, 1000), 5);
    }

    #[test]
    fn test_first_piece_goes_to_origin() {
        let cancel = CancelToken::new();
        let ctx = RunContext::for_test(BoardConfig::new(1000, 1000), &cancel);
        let sol = BottomLeftFill.pack(&pieces(&[(300, 200, 1, true)]), &ctx).unwrap();
        let p = sol.boards[0].pieces[0].placement.unwrap();
        assert_eq!((p.x, p.y, p.rotated), (0, 0, false));
    }

    #[test]
    fn test_fills_row_before_rising() {
        let cancel = CancelToken::new();
        let cfg = BoardConfig::new(1000, 1000).with_margin(0).with_kerf(0);
        let ctx = RunContext::for_test(cfg, &cancel);
        let sol = BottomLeftFill.pack(&pieces(&[(500, 500, 4, false)]), &ctx).unwrap();
        assert_solution_valid(&sol, 4);
        assert_eq!(sol.board_count(), 1);
        let spots: Vec<(u32, u32)> = sol.boards[0]
            .placements()
            .map(|p| (p.x, p.y))
            .collect();
        assert_eq!(spots, vec![(0, 0), (500, 0), (0, 500), (500, 500)]);
    }

    #[test]
    fn test_kerf_gap_between_neighbours() {
        let cancel = CancelToken::new();
        let cfg = BoardConfig::new(1000, 500).with_margin(0).with_kerf(3);
        let ctx = RunContext::for_test(cfg, &cancel);
        let sol = BottomLeftFill.pack(&pieces(&[(300, 500, 3, false)]), &ctx).unwrap();
        assert_solution_valid(&sol, 3);
        let xs: Vec<u32> = sol.boards[0].placements().map(|p| p.x).collect();
        assert_eq!(xs, vec![0, 303, 606]);
    }

    #[test]
    fn test_rotation_used_when_needed() {
        let cancel = CancelToken::new();
        let cfg = BoardConfig::new(1000, 500).with_margin(0).with_kerf(0);
        let ctx = RunContext::for_test(cfg, &cancel);
        let sol = BottomLeftFill.pack(&pieces(&[(500, 1000, 1, true)]), &ctx).unwrap();
        assert_solution_valid(&sol, 1);
        assert!(sol.boards[0].pieces[0].placement.unwrap().rotated);

        let fixed = BottomLeftFill.pack(&pieces(&[(500, 1000, 1, false)]), &ctx).unwrap();
        assert_solution_valid(&fixed, 1);
        assert_eq!(fixed.board_count(), 0);
        assert_eq!(fixed.unplaced.len(), 1);
    }

    #[test]
    fn test_pack_in_order_respects_order() {
        let cancel = CancelToken::new();
        let cfg = BoardConfig::new(1000, 1000).with_margin(0).with_kerf(0);
        let ctx = RunContext::for_test(cfg, &cancel);
        let ordered = pieces(&[(100, 100, 1, false), (900, 900, 1, false)]);
        let sol = BottomLeftFill::pack_in_order(ordered, &ctx).unwrap();
        assert_solution_valid(&sol, 2);
        let first = sol.boards[0].pieces[0].placement.unwrap();
        assert_eq!(sol.boards[0].pieces[0].size, Rect::new(100, 100));
        assert_eq!((first.x, first.y), (0, 0));
        // The big piece lands beside the small one's row, not at the origin.
        let second = sol.boards[0].pieces[1].placement.unwrap();
        assert_eq!((second.x, second.y), (100, 0));
    }

    #[test]
    fn test_cancelled_run_stops() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let ctx = RunContext::for_test(BoardConfig::new(1000, 1000), &cancel);
        let err = BottomLeftFill.pack(&pieces(&[(100, 100, 2, true)]), &ctx).unwrap_err();
        assert!(err.is_abort());
    }

    #[test]
    fn test_mixed_sizes_with_kerf() {
        let cancel = CancelToken::new();
        let ctx = RunContext::for_test(BoardConfig::new(2440, 1220), &cancel);
        let list = pieces(&[
            (700, 500, 6, true),
            (350, 250, 5, true),
            (1000, 400, 3, true),
            (450, 450, 4, false),
            (600, 300, 7, true),
        ]);
        let sol = BottomLeftFill.pack(&list, &ctx).unwrap();
        assert_solution_valid(&sol, 25);
        assert!(sol.unplaced.is_empty());
    }
}
