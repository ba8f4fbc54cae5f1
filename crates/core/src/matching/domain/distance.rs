/// Cosine distance `1 - a·b / (|a| |b|)`, accumulated in `f64`.
///
/// Range is `[0, 2]`; rounding noise is clamped into it so that a vector
/// compared with itself yields exactly zero or a tiny positive value. A
/// zero-norm input has no direction and is treated as orthogonal to
/// everything (distance 1). Callers guarantee equal lengths.
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f64 {
    debug_assert_eq!(a.len(), b.len(), "embedding dimensions must match");

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (x, y) in a.iter().zip(b.iter()) {
        let (x, y) = (*x as f64, *y as f64);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 1.0;
    }
    (1.0 - dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(0.0, 2.0)
}
