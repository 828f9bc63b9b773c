use crate::model::Rect;
use image::{Rgba, RgbaImage};

/// Tight bounding box of the pixels whose alpha is non-zero.
///
/// Returns `None` when the image is fully transparent.
pub fn compute_trim_rect(rgba: &RgbaImage) -> Option<Rect> {
    let (w, h) = rgba.dimensions();
    let opaque_col = |x: u32, ys: std::ops::Range<u32>| ys.into_iter().any(|y| rgba.get_pixel(x, y)[3] != 0);
    let opaque_row = |y: u32, xs: std::ops::Range<u32>| xs.into_iter().any(|x| rgba.get_pixel(x, y)[3] != 0);

    // left
    let x1 = (0..w).find(|&x| opaque_col(x, 0..h))?;
    // right
    let x2 = (x1..w).rev().find(|&x| opaque_col(x, 0..h)).unwrap_or(x1);
    // top
    let y1 = (0..h).find(|&y| opaque_row(y, x1..x2 + 1)).unwrap_or(0);
    // bottom
    let y2 = (y1..h).rev().find(|&y| opaque_row(y, x1..x2 + 1)).unwrap_or(y1);
    Some(Rect::new(x1, y1, x2 - x1 + 1, y2 - y1 + 1))
}

/// Smallest power of two `>= v` (1 for 0).
pub fn next_pow2(v: u32) -> u32 {
    v.max(1).next_power_of_two()
}

/// Copy `src_rect` of `src` into `canvas` with its top-left at `(dx, dy)`.
/// Pixels falling outside the canvas are dropped.
pub fn blit_rgba(src: &RgbaImage, src_rect: Rect, canvas: &mut RgbaImage, dx: u32, dy: u32, premultiply: bool) {
    let (cw, ch) = canvas.dimensions();
    for yy in 0..src_rect.h {
        for xx in 0..src_rect.w {
            if dx + xx >= cw || dy + yy >= ch {
                continue;
            }
            let mut px = *src.get_pixel(src_rect.x + xx, src_rect.y + yy);
            if premultiply {
                px = premultiply_pixel(px);
            }
            canvas.put_pixel(dx + xx, dy + yy, px);
        }
    }
}

/// Scale color channels by alpha (rounded).
pub fn premultiply_pixel(px: Rgba<u8>) -> Rgba<u8> {
    let a = px[3] as u16;
    let mul = |c: u8| ((c as u16 * a + 127) / 255) as u8;
    Rgba([mul(px[0]), mul(px[1]), mul(px[2]), px[3]])
}
