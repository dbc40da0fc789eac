use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_line_segment_mut};
use imageproc::rect::Rect;

/// Order two corners into `(left, top, right, bottom)`.
fn ordered(a: (i32, i32), b: (i32, i32)) -> (i32, i32, i32, i32) {
    (a.0.min(b.0), a.1.min(b.1), a.0.max(b.0), a.1.max(b.1))
}

/// Pull the corners of an ordered rect to at most `margin` pixels outside the image.
fn clamp_to_image(
    img: &RgbImage,
    (x0, y0, x1, y1): (i32, i32, i32, i32),
    margin: i32,
) -> (i32, i32, i32, i32) {
    let max_x = i32::try_from(img.width()).unwrap_or(i32::MAX).saturating_add(margin);
    let max_y = i32::try_from(img.height()).unwrap_or(i32::MAX).saturating_add(margin);
    (
        x0.clamp(-margin, max_x),
        y0.clamp(-margin, max_y),
        x1.clamp(-margin, max_x),
        y1.clamp(-margin, max_y),
    )
}

fn rect_between(x0: i32, y0: i32, x1: i32, y1: i32) -> Rect {
    let span =
        |a: i32, b: i32| (i64::from(b) - i64::from(a) + 1).clamp(1, i64::from(u32::MAX)) as u32;
    Rect::at(x0, y0).of_size(span(x0, x1), span(y0, y1))
}

/// Draw a rectangle border with given thickness, growing inward; clipped to the image.
pub fn draw_rect(
    img: &mut RgbImage,
    top_left: (i32, i32),
    bottom_right: (i32, i32),
    color: Rgb<u8>,
    thickness: u32,
) {
    let thickness = i32::try_from(thickness).unwrap_or(i32::MAX);
    // Inset borders of a clamped side must stay off-image too.
    let margin = thickness.saturating_add(1);
    let (x0, y0, x1, y1) = clamp_to_image(img, ordered(top_left, bottom_right), margin);
    for t in 0..thickness {
        let (xx0, yy0, xx1, yy1) = (x0 + t, y0 + t, x1 - t, y1 - t);
        if xx0 > xx1 || yy0 > yy1 {
            break;
        }
        draw_hollow_rect_mut(img, rect_between(xx0, yy0, xx1, yy1), color);
    }
}

/// Fill the rectangle spanned by two corners (inclusive).
pub fn fill_rect(img: &mut RgbImage, top_left: (i32, i32), bottom_right: (i32, i32), color: Rgb<u8>) {
    let (x0, y0, x1, y1) = clamp_to_image(img, ordered(top_left, bottom_right), 1);
    draw_filled_rect_mut(img, rect_between(x0, y0, x1, y1), color);
}

/// Clip segment `a -> b` to `[lo, hi]` on both axes (Liang-Barsky).
fn clip_segment(
    a: (f32, f32),
    b: (f32, f32),
    lo: f32,
    hi: (f32, f32),
) -> Option<((f32, f32), (f32, f32))> {
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    let mut t0 = 0.0_f32;
    let mut t1 = 1.0_f32;
    for (p, q) in [
        (-dx, a.0 - lo),
        (dx, hi.0 - a.0),
        (-dy, a.1 - lo),
        (dy, hi.1 - a.1),
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            t0 = t0.max(r);
        } else {
            t1 = t1.min(r);
        }
        if t0 > t1 {
            return None;
        }
    }
    Some((
        (a.0 + t0 * dx, a.1 + t0 * dy),
        (a.0 + t1 * dx, a.1 + t1 * dy),
    ))
}

/// Draw a segment `thickness` pixels wide, offset along the minor axis; clipped to the image.
pub fn draw_line(
    img: &mut RgbImage,
    from: (i32, i32),
    to: (i32, i32),
    color: Rgb<u8>,
    thickness: u32,
) {
    let (fx, fy) = (i64::from(from.0), i64::from(from.1));
    let (tx, ty) = (i64::from(to.0), i64::from(to.1));
    let steep = (ty - fy).abs() > (tx - fx).abs();
    let margin = thickness.max(1) as f32;
    let hi = (img.width() as f32 + margin, img.height() as f32 + margin);
    for t in 0..i64::from(thickness.max(1)) {
        let (dx, dy) = if steep { (t, 0) } else { (0, t) };
        let a = ((fx + dx) as f32, (fy + dy) as f32);
        let b = ((tx + dx) as f32, (ty + dy) as f32);
        if let Some((a, b)) = clip_segment(a, b, -margin, hi) {
            draw_line_segment_mut(img, a, b, color);
        }
    }
}
