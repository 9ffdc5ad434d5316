use super::{Annotation, RenderError};

/// Largest pixel offset, in either direction, a coordinate may resolve to.
pub const MAX_COORDINATE: i64 = i32::MAX as i64;

/// Converts a percentage of `total` into whole pixels, truncating toward zero.
/// `None` when the result is not finite or lies beyond [`MAX_COORDINATE`].
pub fn percent(value: f64, total: u32) -> Option<i64> {
    let pixels = (value / 100.0) * f64::from(total);
    if !pixels.is_finite() || pixels.abs() >= (MAX_COORDINATE as f64) + 1.0 {
        return None;
    }
    Some(pixels as i64)
}

/// Pixel rectangle with inclusive corners.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelBox {
    pub x0: i64,
    pub y0: i64,
    pub x1: i64,
    pub y1: i64,
}

impl PixelBox {
    pub fn from_annotation(
        index: usize,
        annotation: &Annotation,
        width: u32,
        height: u32,
    ) -> Result<Self, RenderError> {
        let resolve = |name: &str, value: f64, total: u32| {
            percent(value, total).ok_or_else(|| RenderError::InvalidAnnotation {
                index,
                reason: format!("{name} does not resolve to a pixel offset within ±{MAX_COORDINATE}"),
            })
        };

        let x0 = resolve("x", annotation.x, width)?;
        let y0 = resolve("y", annotation.y, height)?;
        let w = resolve("w", annotation.w, width)?;
        let h = resolve("h", annotation.h, height)?;

        // Both operands are bounded by MAX_COORDINATE, so the sums cannot overflow.
        let x1 = x0 + w;
        let y1 = y0 + h;

        if x1 < x0 {
            return Err(RenderError::InvalidAnnotation {
                index,
                reason: "x1 must be greater than or equal to x0".to_string(),
            });
        }
        if y1 < y0 {
            return Err(RenderError::InvalidAnnotation {
                index,
                reason: "y1 must be greater than or equal to y0".to_string(),
            });
        }

        Ok(PixelBox { x0, y0, x1, y1 })
    }

    pub fn width(&self) -> i64 {
        self.x1.saturating_sub(self.x0).saturating_add(1)
    }

    pub fn height(&self) -> i64 {
        self.y1.saturating_sub(self.y0).saturating_add(1)
    }

    /// Where the label's top-left corner goes: `offset` pixels above the box.
    pub fn label_origin(&self, offset: i64) -> (i64, i64) {
        (self.x0, self.y0.saturating_sub(offset))
    }

    /// Clamps the box to a `width` x `height` canvas. `None` when nothing of it is visible.
    pub fn clip(&self, width: u32, height: u32) -> Option<PixelBox> {
        if width == 0 || height == 0 {
            return None;
        }
        let max_x = i64::from(width) - 1;
        let max_y = i64::from(height) - 1;
        if self.x1 < 0 || self.y1 < 0 || self.x0 > max_x || self.y0 > max_y {
            return None;
        }
        Some(PixelBox {
            x0: self.x0.max(0),
            y0: self.y0.max(0),
            x1: self.x1.min(max_x),
            y1: self.y1.min(max_y),
        })
    }
}
