use crate::error::Result;

pub mod free_list;

/// A space allocator places rectangles into a bounded canvas.
///
/// Implementations must ensure no overlaps and that `used_extent` bounds every
/// placement. `pack` fails with `BuildError::OutOfSpace` instead of clipping.
pub trait SpaceAllocator {
    /// Reserves a `w`x`h` box and returns its top-left corner.
    fn pack(&mut self, w: u32, h: u32) -> Result<(u32, u32)>;
    /// Far edges of everything placed so far.
    fn used_extent(&self) -> (u32, u32);
    /// Canvas bounds the allocator was created with.
    fn capacity(&self) -> (u32, u32);
}
