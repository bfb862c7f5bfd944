use image::{imageops, DynamicImage, GrayImage, Luma};

use crate::asset::{encode_png, AssetError, AssetResult, MaskAsset};
use crate::geometry::{PixelSize, SurfacePoint};

const PAINTED: Luma<u8> = Luma([255]);
const BACKGROUND: Luma<u8> = Luma([0]);
const PAINTED_THRESHOLD: u8 = 128;
const MASK_ASSET_NAME: &str = "mask.png";

/// Two-tone paint surface. Painting always writes the same opaque value, so
/// overlapping strokes form a plain union.
#[derive(Debug, Clone)]
pub struct MaskRaster {
    pixels: GrayImage,
}

impl MaskRaster {
    pub fn new(size: PixelSize) -> Self {
        Self {
            pixels: GrayImage::from_pixel(size.width, size.height, BACKGROUND),
        }
    }

    pub fn size(&self) -> PixelSize {
        PixelSize::new(self.pixels.width(), self.pixels.height())
    }

    pub fn clear(&mut self) {
        for pixel in self.pixels.pixels_mut() {
            *pixel = BACKGROUND;
        }
    }

    pub fn is_painted(&self, x: u32, y: u32) -> bool {
        self.pixels
            .get_pixel_checked(x, y)
            .is_some_and(|pixel| pixel.0[0] >= PAINTED_THRESHOLD)
    }

    pub fn painted_pixels(&self) -> u64 {
        count_painted(&self.pixels)
    }

    /// Fills a disc of the given diameter centred on `center`.
    pub fn stamp_circle(&mut self, center: SurfacePoint, diameter: f32) {
        self.paint_capsule(center, center, diameter);
    }

    /// Paints a segment with round caps; thickness equals `diameter`.
    pub fn draw_segment(&mut self, from: SurfacePoint, to: SurfacePoint, diameter: f32) {
        self.paint_capsule(from, to, diameter);
    }

    fn paint_capsule(&mut self, from: SurfacePoint, to: SurfacePoint, diameter: f32) {
        let (width, height) = self.pixels.dimensions();
        if width == 0 || height == 0 {
            return;
        }
        let radius = (diameter / 2.0).max(0.5);

        let min_x = (from.x.min(to.x) - radius).floor().max(0.0) as u32;
        let min_y = (from.y.min(to.y) - radius).floor().max(0.0) as u32;
        let max_x = ((from.x.max(to.x) + radius).ceil().max(0.0) as u32).min(width);
        let max_y = ((from.y.max(to.y) + radius).ceil().max(0.0) as u32).min(height);

        for y in min_y..max_y {
            for x in min_x..max_x {
                let sample = SurfacePoint::new(x as f32 + 0.5, y as f32 + 0.5);
                if distance_to_segment(sample, from, to) <= radius {
                    self.pixels.put_pixel(x, y, PAINTED);
                }
            }
        }

        // The pixel under the pointer is always part of the stroke, even for
        // brushes narrower than one pixel.
        for point in [from, to] {
            if point.x >= 0.0 && point.y >= 0.0 {
                let (x, y) = (point.x as u32, point.y as u32);
                if x < width && y < height {
                    self.pixels.put_pixel(x, y, PAINTED);
                }
            }
        }
    }

    /// Encodes the current raster as an opaque black/white PNG.
    pub fn export(&self) -> AssetResult<MaskAsset> {
        let painted_pixels = self.painted_pixels();
        let png = encode_png(&DynamicImage::ImageLuma8(self.pixels.clone()), MASK_ASSET_NAME)?;
        Ok(MaskAsset {
            png,
            size: self.size(),
            painted_pixels,
        })
    }
}

/// Resamples an exported mask onto the natural resolution of the image it
/// will be submitted with. Nearest-neighbour keeps the output two-tone.
pub fn resample_mask(mask: &MaskAsset, natural: PixelSize) -> AssetResult<MaskAsset> {
    if mask.size == natural {
        return Ok(mask.clone());
    }

    let decoded = image::load_from_memory(&mask.png)
        .map_err(|source| AssetError::Decode {
            name: MASK_ASSET_NAME.to_string(),
            source,
        })?
        .to_luma8();
    let resized = imageops::resize(
        &decoded,
        natural.width,
        natural.height,
        imageops::FilterType::Nearest,
    );
    let painted_pixels = count_painted(&resized);
    let png = encode_png(&DynamicImage::ImageLuma8(resized), MASK_ASSET_NAME)?;
    tracing::debug!(
        from_width = mask.size.width,
        from_height = mask.size.height,
        to_width = natural.width,
        to_height = natural.height,
        "resampled mask to natural resolution"
    );
    Ok(MaskAsset {
        png,
        size: natural,
        painted_pixels,
    })
}

fn count_painted(pixels: &GrayImage) -> u64 {
    pixels
        .pixels()
        .filter(|pixel| pixel.0[0] >= PAINTED_THRESHOLD)
        .count() as u64
}

fn distance_to_segment(point: SurfacePoint, from: SurfacePoint, to: SurfacePoint) -> f32 {
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    let length_sq = dx * dx + dy * dy;
    if length_sq <= f32::EPSILON {
        return point.distance_to(from);
    }
    let t = (((point.x - from.x) * dx + (point.y - from.y) * dy) / length_sq).clamp(0.0, 1.0);
    point.distance_to(SurfacePoint::new(from.x + t * dx, from.y + t * dy))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(mask: &MaskAsset) -> GrayImage {
        let decoded = image::load_from_memory(&mask.png).expect("mask png should decode");
        assert!(!decoded.color().has_alpha());
        decoded.to_luma8()
    }

    #[test]
    fn stamp_circle_paints_a_disc_of_brush_diameter() {
        let mut raster = MaskRaster::new(PixelSize::new(40, 40));
        raster.stamp_circle(SurfacePoint::new(20.0, 20.0), 10.0);

        assert!(raster.is_painted(20, 20));
        assert!(raster.is_painted(16, 20));
        assert!(!raster.is_painted(26, 20));
        assert!(!raster.is_painted(20, 26));
        // area of a radius-5 disc is ~78.5
        let painted = raster.painted_pixels();
        assert!((70..=90).contains(&painted), "painted={painted}");
    }

    #[test]
    fn overlapping_circles_form_an_opaque_union_without_seams() {
        let mut raster = MaskRaster::new(PixelSize::new(60, 40));
        raster.stamp_circle(SurfacePoint::new(20.0, 20.0), 16.0);
        let single = raster.painted_pixels();
        raster.stamp_circle(SurfacePoint::new(28.0, 20.0), 16.0);
        let union = raster.painted_pixels();
        assert!(union > single);
        assert!(union < single * 2);

        let exported = raster.export().unwrap();
        let pixels = decode(&exported);
        assert!(pixels.pixels().all(|p| p.0[0] == 0 || p.0[0] == 255));
        // the overlap region has the same value as non-overlapping paint
        assert_eq!(pixels.get_pixel(24, 20).0[0], 255);
        assert_eq!(pixels.get_pixel(14, 20).0[0], 255);
        assert_eq!(pixels.get_pixel(34, 20).0[0], 255);
    }

    #[test]
    fn repainting_the_same_area_is_idempotent() {
        let mut raster = MaskRaster::new(PixelSize::new(30, 30));
        raster.stamp_circle(SurfacePoint::new(15.0, 15.0), 8.0);
        let first = raster.export().unwrap();
        raster.stamp_circle(SurfacePoint::new(15.0, 15.0), 8.0);
        raster.draw_segment(SurfacePoint::new(15.0, 15.0), SurfacePoint::new(15.0, 15.0), 8.0);
        let second = raster.export().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn segment_uses_brush_thickness_and_round_caps() {
        let mut raster = MaskRaster::new(PixelSize::new(50, 20));
        raster.draw_segment(SurfacePoint::new(10.0, 10.0), SurfacePoint::new(40.0, 10.0), 6.0);

        for x in 10..40 {
            assert!(raster.is_painted(x, 10));
        }
        assert!(raster.is_painted(25, 12));
        assert!(!raster.is_painted(25, 14));
        // round cap extends beyond the end point
        assert!(raster.is_painted(41, 10));
        assert!(!raster.is_painted(44, 10));
    }

    #[test]
    fn strokes_are_clipped_to_the_surface() {
        let mut raster = MaskRaster::new(PixelSize::new(10, 10));
        raster.stamp_circle(SurfacePoint::new(0.0, 0.0), 6.0);
        raster.stamp_circle(SurfacePoint::new(-50.0, -50.0), 6.0);
        assert!(raster.is_painted(0, 0));
        assert!(raster.painted_pixels() < 20);
    }

    #[test]
    fn clear_blanks_the_raster() {
        let mut raster = MaskRaster::new(PixelSize::new(10, 10));
        raster.stamp_circle(SurfacePoint::new(5.0, 5.0), 4.0);
        raster.clear();
        assert_eq!(raster.painted_pixels(), 0);
    }

    #[test]
    fn resample_scales_to_natural_size_and_stays_two_tone() {
        let mut raster = MaskRaster::new(PixelSize::new(20, 10));
        raster.stamp_circle(SurfacePoint::new(5.0, 5.0), 6.0);
        let exported = raster.export().unwrap();

        let resampled = resample_mask(&exported, PixelSize::new(80, 40)).unwrap();
        assert_eq!(resampled.size, PixelSize::new(80, 40));
        let pixels = decode(&resampled);
        assert_eq!(pixels.dimensions(), (80, 40));
        assert!(pixels.pixels().all(|p| p.0[0] == 0 || p.0[0] == 255));
        assert_eq!(pixels.get_pixel(20, 20).0[0], 255);
        assert_eq!(pixels.get_pixel(70, 5).0[0], 0);
        let expected = exported.painted_pixels * 16;
        assert!(resampled.painted_pixels.abs_diff(expected) <= expected / 10);
    }

    #[test]
    fn resample_is_identity_when_sizes_match() {
        let raster = MaskRaster::new(PixelSize::new(8, 8));
        let exported = raster.export().unwrap();
        let same = resample_mask(&exported, PixelSize::new(8, 8)).unwrap();
        assert_eq!(same, exported);
        assert!(same.is_blank());
    }
}
