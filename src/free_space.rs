use crate::types::{Placement, Rect};

/// Fragments must be wider and taller than this to be kept.
pub const MIN_FRAGMENT: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreeRect {
    pub x: u32,
    pub y: u32,
    pub rect: Rect,
}

impl FreeRect {
    pub fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self {
            x,
            y,
            rect: Rect::new(w, h),
        }
    }

    pub fn right(&self) -> u32 {
        self.x + self.rect.w
    }

    pub fn top(&self) -> u32 {
        self.y + self.rect.h
    }

    /// Strict interior overlap; shared edges do not count.
    pub fn overlaps(&self, x: u32, y: u32, rect: Rect) -> bool {
        !(x >= self.right()
            || x + rect.w <= self.x
            || y >= self.top()
            || y + rect.h <= self.y)
    }
}

/// Free space of a BLF/BFDH board as a loose list of rectangles.
///
/// Each commit slices every overlapped rectangle into up to four remainders
/// (left, right, below, above the piece). Remainders may overlap each other
/// and are never merged; only slivers are discarded.
#[derive(Debug, Clone)]
pub struct FreeRectList {
    pub rects: Vec<FreeRect>,
}

impl FreeRectList {
    pub fn new(usable: Rect) -> Self {
        Self {
            rects: vec![FreeRect {
                x: 0,
                y: 0,
                rect: usable,
            }],
        }
    }

    pub fn carve(&mut self, placed: &Placement) {
        let mut next = Vec::with_capacity(self.rects.len() + 4);
        for free in &self.rects {
            if free.overlaps(placed.x, placed.y, placed.rect) {
                Self::split(free, placed, &mut next);
            } else {
                next.push(*free);
            }
        }
        next.retain(|f| f.rect.w > MIN_FRAGMENT && f.rect.h > MIN_FRAGMENT);
        self.rects = next;
    }

    fn split(free: &FreeRect, placed: &Placement, out: &mut Vec<FreeRect>) {
        // Left
        if placed.x > free.x {
            out.push(FreeRect::new(free.x, free.y, placed.x - free.x, free.rect.h));
        }
        // Right
        if placed.right() < free.right() {
            out.push(FreeRect::new(
                placed.right(),
                free.y,
                free.right() - placed.right(),
                free.rect.h,
            ));
        }
        // Below
        if placed.y > free.y {
            out.push(FreeRect::new(free.x, free.y, free.rect.w, placed.y - free.y));
        }
        // Above
        if placed.top() < free.top() {
            out.push(FreeRect::new(
                free.x,
                placed.top(),
                free.rect.w,
                free.top() - placed.top(),
            ));
        }
    }

    /// Number of free rectangles under `max_area` that the candidate overlaps.
    pub fn count_small_overlapping(&self, x: u32, y: u32, rect: Rect, max_area: u64) -> usize {
        self.rects
            .iter()
            .filter(|f| f.overlaps(x, y, rect) && f.rect.area() < max_area)
            .count()
    }

    pub fn len(&self) -> usize {
        self.rects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn placed(x: u32, y: u32, w: u32, h: u32) -> Placement {
        Placement {
            rect: Rect::new(w, h),
            x,
            y,
            rotated: false,
        }
    }

    #[test]
    fn test_corner_piece_leaves_two_slices() {
        let mut list = FreeRectList::new(Rect::new(1000, 500));
        list.carve(&placed(0, 0, 400, 200));
        assert_eq!(list.len(), 2);
        assert!(list.rects.contains(&FreeRect::new(400, 0, 600, 500)));
        assert!(list.rects.contains(&FreeRect::new(0, 200, 1000, 300)));
    }

    #[test]
    fn test_centre_piece_leaves_four_slices() {
        let mut list = FreeRectList::new(Rect::new(1000, 1000));
        list.carve(&placed(300, 300, 100, 100));
        assert_eq!(list.len(), 4);
    }

    #[test]
    fn test_slivers_are_dropped() {
        let mut list = FreeRectList::new(Rect::new(401, 200));
        list.carve(&placed(0, 0, 400, 200));
        assert!(list.is_empty());
    }

    #[test]
    fn test_untouched_rects_survive() {
        let mut list = FreeRectList::new(Rect::new(1000, 1000));
        list.carve(&placed(0, 0, 500, 1000));
        assert_eq!(list.rects, vec![FreeRect::new(500, 0, 500, 1000)]);
        list.carve(&placed(500, 0, 500, 200));
        assert_eq!(list.rects, vec![FreeRect::new(500, 200, 500, 800)]);
    }

    #[test]
    fn test_small_overlap_count() {
        let mut list = FreeRectList::new(Rect::new(1000, 1000));
        list.carve(&placed(0, 0, 950, 950));
        // Two 50-wide strips remain, each far larger than 100x100 in area.
        assert_eq!(list.count_small_overlapping(950, 0, Rect::new(50, 50), 10_000), 0);
        assert_eq!(
            list.count_small_overlapping(950, 0, Rect::new(50, 50), 1_000_000),
            1
        );
    }
}
