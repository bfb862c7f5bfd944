//! Shared geometric primitives used across editor, mask and asset modules.

/// A point in natural image pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolPoint {
    pub x: i32,
    pub y: i32,
}

impl ToolPoint {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// A point on the on-screen paint surface, in displayed (CSS) pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfacePoint {
    pub x: f32,
    pub y: f32,
}

impl SurfacePoint {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance_to(self, other: Self) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelSize {
    pub width: u32,
    pub height: u32,
}

impl PixelSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub const fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn contains(self, point: SurfacePoint) -> bool {
        point.x >= 0.0
            && point.y >= 0.0
            && point.x < self.width as f32
            && point.y < self.height as f32
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolBounds {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl ToolBounds {
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// Maps a point on a surface of `displayed` size onto the `natural` pixel grid.
///
/// The result is rounded down and clamped to the last addressable pixel, so a
/// click on the far edge of the surface still lands inside the image.
pub fn surface_to_natural(
    point: SurfacePoint,
    displayed: PixelSize,
    natural: PixelSize,
) -> Option<ToolPoint> {
    if displayed.is_empty() || natural.is_empty() {
        return None;
    }

    let scale_x = natural.width as f32 / displayed.width as f32;
    let scale_y = natural.height as f32 / displayed.height as f32;
    let max_x = i32::try_from(natural.width - 1).unwrap_or(i32::MAX);
    let max_y = i32::try_from(natural.height - 1).unwrap_or(i32::MAX);

    let x = ((point.x * scale_x).floor() as i32).clamp(0, max_x);
    let y = ((point.y * scale_y).floor() as i32).clamp(0, max_y);
    Some(ToolPoint::new(x, y))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn surface_to_natural_scales_by_display_ratio() {
        let point = surface_to_natural(
            SurfacePoint::new(50.0, 25.0),
            PixelSize::new(100, 50),
            PixelSize::new(400, 200),
        );
        assert_eq!(point, Some(ToolPoint::new(200, 100)));
    }

    #[test]
    fn surface_to_natural_clamps_edge_clicks_into_image() {
        let point = surface_to_natural(
            SurfacePoint::new(100.0, 60.0),
            PixelSize::new(100, 50),
            PixelSize::new(400, 200),
        );
        assert_eq!(point, Some(ToolPoint::new(399, 199)));
    }

    #[test]
    fn surface_to_natural_rejects_empty_surfaces() {
        assert!(surface_to_natural(
            SurfacePoint::new(1.0, 1.0),
            PixelSize::new(0, 50),
            PixelSize::new(400, 200),
        )
        .is_none());
    }

    #[test]
    fn pixel_size_contains_is_half_open() {
        let size = PixelSize::new(10, 10);
        assert!(size.contains(SurfacePoint::new(0.0, 9.5)));
        assert!(!size.contains(SurfacePoint::new(10.0, 0.0)));
        assert!(!size.contains(SurfacePoint::new(-0.1, 0.0)));
    }
}
