//! Easing curve for joint interpolation

/// Quadratic ease-in/ease-out
///
/// Accelerates over the first half and decelerates over the second.
/// Input is clamped to `[0, 1]`; `ease(0) = 0`, `ease(0.5) = 0.5`,
/// `ease(1) = 1`.
pub fn ease_in_out(progress: f32) -> f32 {
    let p = progress.clamp(0.0, 1.0);
    if p < 0.5 {
        2.0 * p * p
    } else {
        let t = 1.0 - p;
        1.0 - 2.0 * t * t
    }
}
