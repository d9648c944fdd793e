//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// Calculate thumbnail dimensions from aspect ratio and short edge size.
///
/// # Arguments
/// * `aspect` - Target aspect ratio as (width, height)
/// * `short_edge` - Size of the shorter edge in pixels
///
/// # Returns
/// * `(width, height)` - Final thumbnail dimensions
///
/// ```text
/// (3, 2) at short edge 200 → 300x200   (listing card thumbnail)
/// (4, 5) at short edge 400 → 400x500
/// ```
pub fn calculate_thumbnail_dimensions(aspect: (u32, u32), short_edge: u32) -> (u32, u32) {
    let (aspect_w, aspect_h) = aspect;

    if aspect_w <= aspect_h {
        // Portrait or square: width is the short edge
        let w = short_edge;
        let h = (w as f64 * aspect_h as f64 / aspect_w as f64).round() as u32;
        (w, h)
    } else {
        // Landscape: height is the short edge
        let h = short_edge;
        let w = (h as f64 * aspect_w as f64 / aspect_h as f64).round() as u32;
        (w, h)
    }
}

/// Whether an image is larger than a bounding box on either axis.
pub fn exceeds_bounds(original: (u32, u32), bounds: (u32, u32)) -> bool {
    original.0 > bounds.0 || original.1 > bounds.1
}

/// Fit an image inside a bounding box, preserving aspect ratio.
///
/// Never upscales: an image already inside the box keeps its dimensions.
/// Neither output edge is allowed to collapse to zero.
///
/// ```text
/// 4000x3000 into 800x600  → 800x600
/// 3000x4000 into 800x600  → 450x600
/// 640x480   into 1200x900 → 640x480
/// ```
pub fn fit_within(original: (u32, u32), bounds: (u32, u32)) -> (u32, u32) {
    let (orig_w, orig_h) = original;
    if !exceeds_bounds(original, bounds) || orig_w == 0 || orig_h == 0 {
        return original;
    }

    let scale_w = bounds.0 as f64 / orig_w as f64;
    let scale_h = bounds.1 as f64 / orig_h as f64;
    let scale = scale_w.min(scale_h);

    let w = ((orig_w as f64 * scale).round() as u32).clamp(1, bounds.0);
    let h = ((orig_h as f64 * scale).round() as u32).clamp(1, bounds.1);
    (w, h)
}
