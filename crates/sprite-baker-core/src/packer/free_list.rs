use super::SpaceAllocator;
use crate::error::{BuildError, Result};
use crate::model::Rect;

/// Greedy first-fit allocator over a list of free rectangles.
///
/// Each placement consumes the first free rect that can hold the request and
/// splits the leftover L-shape into a right strip, a bottom strip and the
/// bottom-right remainder. Not optimal; feed it largest items first.
pub struct FreeListAllocator {
    max_width: u32,
    max_height: u32,
    free: Vec<Rect>,
    used_w: u32,
    used_h: u32,
    placed: usize,
}

impl FreeListAllocator {
    /// Both bounds must be non-zero powers of two.
    pub fn new(max_width: u32, max_height: u32) -> Result<Self> {
        if !max_width.is_power_of_two() || !max_height.is_power_of_two() {
            return Err(BuildError::InvalidConfig(format!(
                "sheet size must be a power of two (got {}x{})",
                max_width, max_height
            )));
        }
        Ok(Self {
            max_width,
            max_height,
            free: vec![Rect::new(0, 0, max_width, max_height)],
            used_w: 0,
            used_h: 0,
            placed: 0,
        })
    }

    /// Current free list, in scan order.
    pub fn free_rects(&self) -> &[Rect] {
        &self.free
    }

    fn split(node: &Rect, placed: &Rect) -> [Rect; 3] {
        let r = placed.right();
        let b = placed.bottom();
        [
            Rect::new(r, node.y, node.right() - r, placed.h),
            Rect::new(node.x, b, placed.w, node.bottom() - b),
            Rect::new(r, b, node.right() - r, node.bottom() - b),
        ]
    }
}

impl SpaceAllocator for FreeListAllocator {
    fn pack(&mut self, w: u32, h: u32) -> Result<(u32, u32)> {
        let Some(idx) = self.free.iter().position(|n| w <= n.w && h <= n.h) else {
            return Err(BuildError::OutOfSpace {
                max_width: self.max_width,
                max_height: self.max_height,
                placed: self.placed,
                total: self.placed + 1,
            });
        };
        let node = self.free.remove(idx);
        let placed = Rect::new(node.x, node.y, w, h);
        debug_assert!(node.contains(&placed));
        for piece in Self::split(&node, &placed) {
            if !piece.is_empty() {
                self.free.push(piece);
            }
        }
        self.used_w = self.used_w.max(placed.right());
        self.used_h = self.used_h.max(placed.bottom());
        self.placed += 1;
        Ok((placed.x, placed.y))
    }

    fn used_extent(&self) -> (u32, u32) {
        (self.used_w, self.used_h)
    }

    fn capacity(&self) -> (u32, u32) {
        (self.max_width, self.max_height)
    }
}
