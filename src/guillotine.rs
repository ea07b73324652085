use serde::Serialize;

use crate::board::{Board, FreeSpace, SpaceKind};
use crate::error::Result;
use crate::free_space::FreeRect;
use crate::strategy::{PlacementStrategy, RunContext, Solution, sort_by_area};
use crate::types::{Algorithm, Piece, Placement, Rect};

/// Base of the guillotine fit score; the leftover area is subtracted from it.
const FIT_BASE: i64 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    pub area: FreeRect,
    pub free: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CutDirection {
    Vertical,
    Horizontal,
}

/// One entry of a board's cut history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Cut {
    pub direction: CutDirection,
    pub x: u32,
    pub y: u32,
    pub piece: String,
}

/// Partition of a board into rectangles produced only by straight,
/// edge-to-edge cuts. Occupied slots are kept so the layout can be traced.
#[derive(Debug, Clone)]
pub struct GuillotinePartition {
    pub slots: Vec<Slot>,
    pub cuts: Vec<Cut>,
}

impl GuillotinePartition {
    pub fn new(usable: Rect) -> Self {
        Self {
            slots: vec![Slot {
                area: FreeRect {
                    x: 0,
                    y: 0,
                    rect: usable,
                },
                free: true,
            }],
            cuts: Vec::new(),
        }
    }

    pub fn free_slots(&self) -> impl Iterator<Item = &FreeRect> {
        self.slots.iter().filter(|s| s.free).map(|s| &s.area)
    }

    /// Higher is better: penalizes the strip left beside the piece and the
    /// strip left above it.
    pub fn fit_score(slot: Rect, piece: Rect) -> i64 {
        let leftover_w = (slot.w - piece.w) as i64;
        let leftover_h = (slot.h - piece.h) as i64;
        FIT_BASE - (leftover_w * slot.h as i64 + leftover_h * piece.w as i64)
    }

    pub fn find_best(&self, piece: Rect) -> Option<usize> {
        if piece.is_degenerate() {
            return None;
        }
        let mut best: Option<(usize, i64)> = None;
        for (idx, slot) in self.slots.iter().enumerate() {
            if !slot.free || !piece.fits_in(&slot.area.rect) {
                continue;
            }
            let score = Self::fit_score(slot.area.rect, piece);
            if best.is_none_or(|(_, s)| score > s) {
                best = Some((idx, score));
            }
        }
        best.map(|(idx, _)| idx)
    }

    /// Occupies the slot's bottom-left corner and performs a single cut across
    /// the remainder. Returns the piece origin.
    pub fn split(&mut self, idx: usize, piece: Rect, kerf: u32, name: &str) -> (u32, u32) {
        let slot = self.slots[idx].area;
        self.slots[idx].free = false;

        let leftover_w = slot.rect.w - piece.w;
        let leftover_h = slot.rect.h - piece.h;
        let right_x = slot.x + piece.w + kerf;
        let top_y = slot.y + piece.h + kerf;
        let right_w = leftover_w.saturating_sub(kerf);
        let top_h = leftover_h.saturating_sub(kerf);

        if leftover_w > 0 && leftover_h > 0 {
            if leftover_w >= leftover_h {
                // Vertical cut: the right strip spans the full slot height
                self.push_free(right_x, slot.y, right_w, slot.rect.h);
                self.push_free(slot.x, top_y, piece.w, top_h);
            } else {
                // Horizontal cut: the top strip spans the full slot width
                self.push_free(slot.x, top_y, slot.rect.w, top_h);
                self.push_free(right_x, slot.y, right_w, piece.h);
            }
        } else if leftover_w > 0 {
            self.push_free(right_x, slot.y, right_w, slot.rect.h);
        } else if leftover_h > 0 {
            self.push_free(slot.x, top_y, slot.rect.w, top_h);
        }

        self.cuts.push(Cut {
            direction: if leftover_w >= leftover_h {
                CutDirection::Vertical
            } else {
                CutDirection::Horizontal
            },
            x: slot.x,
            y: slot.y,
            piece: name.to_string(),
        });

        (slot.x, slot.y)
    }

    // Strips narrower than the kerf vanish entirely.
    fn push_free(&mut self, x: u32, y: u32, w: u32, h: u32) {
        if w == 0 || h == 0 {
            return;
        }
        self.slots.push(Slot {
            area: FreeRect::new(x, y, w, h),
            free: true,
        });
    }
}

impl Board {
    /// Places the piece unrotated into the best-fitting free slot, if any.
    pub fn place_guillotine(&mut self, piece: Piece) -> std::result::Result<Placement, Piece> {
        let rect = piece.oriented(false);
        let kerf = self.kerf();
        let FreeSpace::Guillotine(partition) = &mut self.space else {
            return Err(piece);
        };
        let Some(idx) = partition.find_best(rect) else {
            return Err(piece);
        };
        let (x, y) = partition.split(idx, rect, kerf, &piece.name);
        Ok(self.commit(piece, x, y, false))
    }
}

/// Fills boards slot by slot so every layout can be cut with straight
/// through-cuts. Pieces are not rotated.
#[derive(Debug, Clone, Copy, Default)]
pub struct Guillotine;

impl PlacementStrategy for Guillotine {
    fn algorithm(&self) -> Algorithm {
        Algorithm::Guillotine
    }

    fn pack(&self, pieces: &[Piece], ctx: &RunContext<'_>) -> Result<Solution> {
        let mut boards: Vec<Board> = Vec::new();
        let mut unplaced = Vec::new();

        'pieces: for mut piece in sort_by_area(pieces) {
            ctx.cancel.check()?;

            for board in boards.iter_mut() {
                match board.place_guillotine(piece) {
                    Ok(p) => {
                        ctx.trace_placement(Algorithm::Guillotine, board.id, &p, None);
                        continue 'pieces;
                    }
                    Err(back) => piece = back,
                }
            }

            let mut board = ctx.new_board(boards.len() + 1, SpaceKind::Guillotine)?;
            match board.place_guillotine(piece) {
                Ok(p) => {
                    ctx.trace_placement(Algorithm::Guillotine, board.id, &p, None);
                    boards.push(board);
                }
                Err(back) => {
                    ctx.report_unplaced(Algorithm::Guillotine, &back);
                    unplaced.push(back);
                }
            }
        }

        Ok(Solution::new(Algorithm::Guillotine, boards, unplaced))
    }
}
