//! Mapping a display target's logical size to surface pixels.

use winit::dpi::LogicalSize;
use winit::window::Window;

/// Anything the engine can render into: reports its logical size and the
/// device pixel ratio.
pub trait DisplayTarget {
    /// Logical (CSS-like) width and height.
    fn logical_size(&self) -> (f64, f64);

    fn device_pixel_ratio(&self) -> f64;

    /// Surface size in physical pixels. Never zero on either axis.
    fn backing_size(&self) -> (u32, u32) {
        backing_size(self.logical_size(), self.device_pixel_ratio())
    }
}

impl DisplayTarget for Window {
    fn logical_size(&self) -> (f64, f64) {
        let size: LogicalSize<f64> = self.inner_size().to_logical(self.scale_factor());
        (size.width, size.height)
    }

    fn device_pixel_ratio(&self) -> f64 {
        self.scale_factor()
    }

    /// The physical inner size, so the surface matches `Resized` events exactly.
    fn backing_size(&self) -> (u32, u32) {
        let size = self.inner_size();
        (size.width.max(1), size.height.max(1))
    }
}

/// Absorbs the error of a physical to logical to physical round trip.
const ROUND_TRIP_EPSILON: f64 = 1e-6;

/// `floor(logical * dpr)` per axis, with at least one pixel.
///
/// Products within a hair of an integer snap up to it, so a logical size
/// derived from a physical one maps back to the same pixel count.
///
/// A ratio below 1 or non-finite is treated as 1.
pub fn backing_size(logical: (f64, f64), device_pixel_ratio: f64) -> (u32, u32) {
    let dpr = if device_pixel_ratio.is_finite() {
        device_pixel_ratio.max(1.0)
    } else {
        1.0
    };
    let axis = |v: f64| {
        if v.is_finite() {
            (v * dpr + ROUND_TRIP_EPSILON).floor().clamp(1.0, u32::MAX as f64) as u32
        } else {
            1
        }
    };
    (axis(logical.0), axis(logical.1))
}
