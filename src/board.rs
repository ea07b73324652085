use crate::error::Result;
use crate::free_space::FreeRectList;
use crate::guillotine::{Cut, GuillotinePartition};
use crate::scoring::SMALL_FRAGMENT_AREA;
use crate::types::{BoardConfig, Piece, Placement, Rect};

/// Which free-space bookkeeping a board carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpaceKind {
    FreeRects,
    Guillotine,
}

#[derive(Debug, Clone)]
pub enum FreeSpace {
    Rects(FreeRectList),
    Guillotine(GuillotinePartition),
}

/// One stock board. Coordinates are relative to the usable area, i.e. the
/// margin is already removed.
#[derive(Debug, Clone)]
pub struct Board {
    pub id: usize,
    pub config: BoardConfig,
    pub usable: Rect,
    pub pieces: Vec<Piece>,
    pub space: FreeSpace,
}

impl Board {
    pub fn new(id: usize, config: &BoardConfig, kind: SpaceKind) -> Result<Self> {
        let usable = config.check()?;
        let space = match kind {
            SpaceKind::FreeRects => FreeSpace::Rects(FreeRectList::new(usable)),
            SpaceKind::Guillotine => FreeSpace::Guillotine(GuillotinePartition::new(usable)),
        };
        Ok(Self {
            id,
            config: *config,
            usable,
            pieces: Vec::new(),
            space,
        })
    }

    pub fn kerf(&self) -> u32 {
        self.config.kerf
    }

    pub fn placements(&self) -> impl Iterator<Item = &Placement> {
        self.pieces.iter().filter_map(|p| p.placement.as_ref())
    }

    pub fn contains(&self, rect: Rect, x: u32, y: u32) -> bool {
        !rect.is_degenerate()
            && x as u64 + rect.w as u64 <= self.usable.w as u64
            && y as u64 + rect.h as u64 <= self.usable.h as u64
    }

    /// First placed piece closer than one kerf to the candidate rectangle.
    pub fn blocker(&self, rect: Rect, x: u32, y: u32) -> Option<&Placement> {
        let k = self.kerf() as u64;
        let (x, y) = (x as u64, y as u64);
        let (right, top) = (x + rect.w as u64, y + rect.h as u64);
        self.placements().find(|p| {
            x < p.right() as u64 + k
                && (p.x as u64) < right + k
                && y < p.top() as u64 + k
                && (p.y as u64) < top + k
        })
    }

    pub fn can_place(&self, rect: Rect, x: u32, y: u32) -> bool {
        self.contains(rect, x, y) && self.blocker(rect, x, y).is_none()
    }

    /// Placed pieces sitting exactly one kerf away along a shared edge span.
    pub fn adjacent_count(&self, rect: Rect, x: u32, y: u32) -> usize {
        let k = self.kerf();
        let (right, top) = (x + rect.w, y + rect.h);
        self.placements()
            .filter(|p| {
                let side = (p.right() + k == x || right + k == p.x)
                    && spans_overlap(p.y, p.top(), y, top);
                let end = (p.top() + k == y || top + k == p.y)
                    && spans_overlap(p.x, p.right(), x, right);
                side || end
            })
            .count()
    }

    /// Small free rectangles the candidate would eat into. Guillotine boards
    /// report none.
    pub fn small_fragments(&self, rect: Rect, x: u32, y: u32) -> usize {
        match &self.space {
            FreeSpace::Rects(list) => list.count_small_overlapping(x, y, rect, SMALL_FRAGMENT_AREA),
            FreeSpace::Guillotine(_) => 0,
        }
    }

    /// Records the piece at the given position. Callers check feasibility first.
    pub fn commit(&mut self, mut piece: Piece, x: u32, y: u32, rotated: bool) -> Placement {
        let placement = piece.place(x, y, rotated);
        if let FreeSpace::Rects(list) = &mut self.space {
            list.carve(&placement);
        }
        self.pieces.push(piece);
        placement
    }

    pub fn used_area(&self) -> u64 {
        self.placements().map(|p| p.rect.area()).sum()
    }

    pub fn usable_area(&self) -> u64 {
        self.usable.area()
    }

    pub fn waste_area(&self) -> u64 {
        self.usable_area().saturating_sub(self.used_area())
    }

    pub fn utilization(&self) -> f64 {
        let total = self.usable_area();
        if total == 0 {
            return 0.0;
        }
        self.used_area() as f64 / total as f64 * 100.0
    }

    pub fn cuts(&self) -> &[Cut] {
        match &self.space {
            FreeSpace::Guillotine(partition) => &partition.cuts,
            FreeSpace::Rects(_) => &[],
        }
    }
}

fn spans_overlap(a1: u32, a2: u32, b1: u32, b2: u32) -> bool {
    a1.max(b1) < a2.min(b2)
}
