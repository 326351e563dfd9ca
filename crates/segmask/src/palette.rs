//! Deterministic region coloring.

/// Sample `n` RGBA colors from the viridis colormap at equally spaced
/// parameters over `[0, 1]`. Same `n` always yields the same colors, so a
/// regenerated mask keeps its visual correspondence. A single region gets
/// the colormap's value at 0.0.
pub fn region_colors(n: usize) -> Vec<[f64; 4]> {
    (0..n)
        .map(|i| {
            let t = if n == 1 {
                0.0
            } else {
                i as f64 / (n - 1) as f64
            };
            let color = colorous::VIRIDIS.eval_continuous(t);
            [
                f64::from(color.r) / 255.0,
                f64::from(color.g) / 255.0,
                f64::from(color.b) / 255.0,
                1.0,
            ]
        })
        .collect()
}
