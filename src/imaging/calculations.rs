//! Pure calculation functions for thumbnail dimensions.
//!
//! All functions here are pure and testable without any I/O or images.
//! Width and height travel as arguments and return values only, so any number
//! of resizes can be planned concurrently.

/// Fit `(width, height)` into a square box of `side` pixels.
///
/// The longer axis becomes `side` (or stays as-is if it already fits) and the
/// shorter axis is scaled by the original aspect ratio, truncated toward zero.
/// Images that already fit on both axes are returned unchanged: never upscale.
///
/// # Examples
/// ```
/// # use thumbfit::imaging::fit_to_box;
/// assert_eq!(fit_to_box(4000, 3000, 256), (256, 192));
/// assert_eq!(fit_to_box(3000, 4000, 256), (192, 256));
/// assert_eq!(fit_to_box(100, 100, 256), (100, 100));
/// ```
pub fn fit_to_box(width: u32, height: u32, side: u32) -> (u32, u32) {
    if height <= side && width <= side {
        return (width, height);
    }

    if height > width {
        // Portrait: height is the long axis
        let (h, w) = scale_long_edge(height, width, side);
        (w, h)
    } else {
        // Landscape or square: width is the long axis
        scale_long_edge(width, height, side)
    }
}

/// Scale a `(long, short)` pair so that `long` becomes at most `side`.
///
/// When `long` already fits, the edge is clamped to `long` itself and the
/// short axis comes out unchanged. [`fit_to_box`] never reaches that branch
/// (it returns early when both axes fit), but callers planning a single axis
/// can.
///
/// # Returns
/// * `(new_long, new_short)`, both at least 1
pub fn scale_long_edge(long: u32, short: u32, side: u32) -> (u32, u32) {
    if long == 0 {
        return (short.max(1), short.max(1));
    }
    let edge = long.min(side);
    let ratio = short as f64 / long as f64;
    let scaled = (edge as f64 * ratio) as u32;
    (edge.max(1), scaled.max(1))
}
