use crate::board::{Board, SpaceKind};
use crate::error::Result;
use crate::strategy::{PlacementStrategy, RunContext, Solution};
use crate::types::{Algorithm, Piece, Rect};

/// A horizontal level on a board. Pieces sit on its floor left to right and
/// may not be taller than the first piece that opened it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shelf {
    pub y: u32,
    pub height: u32,
    /// Right edge of the last piece on the shelf.
    pub used: u32,
}

/// Where a piece would go on a shelf board.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Level {
    /// `None` opens a new shelf on top.
    pub shelf: Option<usize>,
    pub x: u32,
    pub y: u32,
    pub score: f64,
}

#[derive(Debug, Clone)]
pub struct ShelfBoard {
    pub board: Board,
    pub shelves: Vec<Shelf>,
}

impl ShelfBoard {
    pub fn new(board: Board) -> Self {
        Self {
            board,
            shelves: Vec::new(),
        }
    }

    fn next_shelf_y(&self) -> u32 {
        self.shelves
            .last()
            .map(|s| s.y + s.height + self.board.kerf())
            .unwrap_or(0)
    }

    /// Existing shelf with the least height slack (earliest wins ties),
    /// otherwise a new shelf above the last one.
    pub fn best_level(&self, rect: Rect) -> Option<Level> {
        let kerf = self.board.kerf();
        let usable = self.board.usable;
        if rect.is_degenerate() || !rect.fits_in(&usable) {
            return None;
        }

        let mut best: Option<(usize, u32)> = None;
        for (idx, shelf) in self.shelves.iter().enumerate() {
            let x = if shelf.used == 0 { 0 } else { shelf.used + kerf };
            if rect.h > shelf.height || x + rect.w > usable.w {
                continue;
            }
            let slack = shelf.height - rect.h;
            if best.is_none_or(|(_, s)| slack < s) {
                best = Some((idx, slack));
            }
        }
        if let Some((idx, _)) = best {
            let shelf = self.shelves[idx];
            return Some(Level {
                shelf: Some(idx),
                x: if shelf.used == 0 { 0 } else { shelf.used + kerf },
                y: shelf.y,
                score: 100.0 + 100.0 * rect.h as f64 / shelf.height as f64,
            });
        }

        let y = self.next_shelf_y();
        if rect.w > usable.w || y + rect.h > usable.h {
            return None;
        }
        Some(Level {
            shelf: None,
            x: 0,
            y,
            score: 100.0 * (y + rect.h) as f64 / usable.h as f64,
        })
    }

    /// Shelf-fit quality of this board for the piece in any allowed
    /// orientation; 0 when it does not fit at all.
    pub fn fit_score(&self, piece: &Piece, allow_rotation: bool) -> f64 {
        piece
            .orientations(allow_rotation)
            .iter()
            .filter_map(|&rotated| self.best_level(piece.oriented(rotated)))
            .map(|level| level.score)
            .fold(0.0, f64::max)
    }

    /// Tries unrotated then rotated; hands the piece back if neither fits.
    pub fn place(&mut self, piece: Piece, ctx: &RunContext<'_>) -> std::result::Result<(), Piece> {
        for &rotated in piece.orientations(ctx.allow_rotation) {
            let rect = piece.oriented(rotated);
            let Some(level) = self.best_level(rect) else {
                continue;
            };
            if !self.board.can_place(rect, level.x, level.y) {
                continue;
            }
            match level.shelf {
                Some(idx) => self.shelves[idx].used = level.x + rect.w,
                None => self.shelves.push(Shelf {
                    y: level.y,
                    height: rect.h,
                    used: rect.w,
                }),
            }
            let placement = self.board.commit(piece, level.x, level.y, rotated);
            ctx.trace_placement(Algorithm::Bfdh, self.board.id, &placement, Some(level.score));
            return Ok(());
        }
        Err(piece)
    }
}

/// Best-Fit-Decreasing-Height: tallest pieces first, each onto the board
/// whose shelves fit it best.
#[derive(Debug, Clone, Copy, Default)]
pub struct BestFitDecreasingHeight;

impl BestFitDecreasingHeight {
    /// Copy of `pieces` ordered by descending height; ties keep input order.
    pub fn sort(pieces: &[Piece]) -> Vec<Piece> {
        let mut sorted = pieces.to_vec();
        sorted.sort_by(|a, b| b.size.h.cmp(&a.size.h));
        sorted
    }
}

impl PlacementStrategy for BestFitDecreasingHeight {
    fn algorithm(&self) -> Algorithm {
        Algorithm::Bfdh
    }

    fn pack(&self, pieces: &[Piece], ctx: &RunContext<'_>) -> Result<Solution> {
        let mut boards: Vec<ShelfBoard> = Vec::new();
        let mut unplaced = Vec::new();

        for mut piece in Self::sort(pieces) {
            ctx.cancel.check()?;

            let mut best: Option<(usize, f64)> = None;
            for (bi, board) in boards.iter().enumerate() {
                let score = board.fit_score(&piece, ctx.allow_rotation);
                if score > 0.0 && best.is_none_or(|(_, s)| score > s) {
                    best = Some((bi, score));
                }
            }

            if let Some((bi, _)) = best {
                match boards[bi].place(piece, ctx) {
                    Ok(()) => continue,
                    Err(back) => piece = back,
                }
            }

            let board = ctx.new_board(boards.len() + 1, SpaceKind::FreeRects)?;
            let mut shelf_board = ShelfBoard::new(board);
            match shelf_board.place(piece, ctx) {
                Ok(()) => boards.push(shelf_board),
                Err(back) => {
                    ctx.report_unplaced(Algorithm::Bfdh, &back);
                    unplaced.push(back);
                }
            }
        }

        let boards = boards.into_iter().map(|sb| sb.board).collect();
        Ok(Solution::new(Algorithm::Bfdh, boards, unplaced))
    }
}
