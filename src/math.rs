/// Width keeping aspect ratio when a `width x height` patch is scaled to `target_height`.
#[inline]
pub fn scaled_width(width: f64, height: f64, target_height: i32) -> i32 {
    (width * target_height as f64 / height).round() as i32
}
