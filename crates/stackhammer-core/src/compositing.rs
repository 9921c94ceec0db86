use image::RgbaImage;

/// Blit all of `src` into `canvas` with its top-left at (dx, dy).
///
/// Scanlines are copied as byte slices; anything falling outside `canvas` is
/// clipped.
pub fn blit_rgba(src: &RgbaImage, canvas: &mut RgbaImage, dx: u32, dy: u32) {
    let (cw, ch) = canvas.dimensions();
    if dx >= cw || dy >= ch {
        return;
    }
    let w = src.width().min(cw - dx) as usize;
    let h = src.height().min(ch - dy);
    let src_stride = src.width() as usize * 4;
    let dst_stride = cw as usize * 4;
    let src_raw = src.as_raw();
    let dst_raw: &mut [u8] = canvas;
    for yy in 0..h as usize {
        let s = yy * src_stride;
        let d = (dy as usize + yy) * dst_stride + dx as usize * 4;
        dst_raw[d..d + w * 4].copy_from_slice(&src_raw[s..s + w * 4]);
    }
}
