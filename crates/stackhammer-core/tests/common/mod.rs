use image::{GenericImageView, RgbaImage};

/// True when the `w`x`h` region of `a` at (ax, ay) has the same pixels as the
/// region of `b` at (bx, by). Out-of-bounds regions never match.
#[allow(clippy::too_many_arguments)]
pub fn regions_equal(
    a: &RgbaImage,
    ax: u32,
    ay: u32,
    b: &RgbaImage,
    bx: u32,
    by: u32,
    w: u32,
    h: u32,
) -> bool {
    if ax + w > a.width() || ay + h > a.height() || bx + w > b.width() || by + h > b.height() {
        return false;
    }
    let va = a.view(ax, ay, w, h);
    let vb = b.view(bx, by, w, h);
    va.pixels().zip(vb.pixels()).all(|(pa, pb)| pa.2 == pb.2)
}
