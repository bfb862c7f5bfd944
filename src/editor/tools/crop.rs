use super::ToolError;
use crate::geometry::{PixelSize, ToolBounds, ToolPoint};

pub const CROP_MIN_SIZE: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CropPreset {
    #[default]
    Free,
    Ratio16x9,
    Ratio4x3,
    Ratio1x1,
    Ratio9x16,
}

impl CropPreset {
    pub const ALL: [CropPreset; 5] = [
        Self::Free,
        Self::Ratio16x9,
        Self::Ratio4x3,
        Self::Ratio1x1,
        Self::Ratio9x16,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Free => "Free",
            Self::Ratio16x9 => "16:9",
            Self::Ratio4x3 => "4:3",
            Self::Ratio1x1 => "1:1",
            Self::Ratio9x16 => "9:16",
        }
    }

    pub const fn ratio(self) -> Option<(u32, u32)> {
        match self {
            Self::Free => None,
            Self::Ratio16x9 => Some((16, 9)),
            Self::Ratio4x3 => Some((4, 3)),
            Self::Ratio1x1 => Some((1, 1)),
            Self::Ratio9x16 => Some((9, 16)),
        }
    }
}

/// Turns a drag from `start` to `end` (natural pixels) into a crop rectangle
/// inside `image`, shrunk to the preset aspect ratio when one is set.
pub fn crop_selection(
    start: ToolPoint,
    end: ToolPoint,
    image: PixelSize,
    preset: CropPreset,
) -> Result<ToolBounds, ToolError> {
    let (x, y, mut width, mut height) = normalize_crop_box(start, end, image)?;

    if let Some((ratio_x, ratio_y)) = preset.ratio() {
        (width, height) = adjust_ratio_to_fit(width, height, ratio_x, ratio_y);
    }

    if width < CROP_MIN_SIZE || height < CROP_MIN_SIZE {
        return Err(ToolError::InvalidCropGeometry);
    }

    Ok(ToolBounds::new(x, y, width, height))
}

fn normalize_crop_box(
    start: ToolPoint,
    end: ToolPoint,
    image: PixelSize,
) -> Result<(i32, i32, u32, u32), ToolError> {
    if image.is_empty() {
        return Err(ToolError::InvalidCropGeometry);
    }

    let max_x = i64::from(image.width);
    let max_y = i64::from(image.height);
    let left = i64::from(start.x.min(end.x)).clamp(0, max_x);
    let right = i64::from(start.x.max(end.x)).clamp(0, max_x);
    let top = i64::from(start.y.min(end.y)).clamp(0, max_y);
    let bottom = i64::from(start.y.max(end.y)).clamp(0, max_y);

    if right <= left || bottom <= top {
        return Err(ToolError::InvalidCropGeometry);
    }

    let width = u32::try_from(right - left).map_err(|_| ToolError::InvalidCropGeometry)?;
    let height = u32::try_from(bottom - top).map_err(|_| ToolError::InvalidCropGeometry)?;

    Ok((
        i32::try_from(left).map_err(|_| ToolError::InvalidCropGeometry)?,
        i32::try_from(top).map_err(|_| ToolError::InvalidCropGeometry)?,
        width,
        height,
    ))
}

pub(crate) fn adjust_ratio_to_fit(
    width: u32,
    height: u32,
    ratio_x: u32,
    ratio_y: u32,
) -> (u32, u32) {
    let target_w = scale_ratio_dimension(height, ratio_x, ratio_y);
    let target_h = scale_ratio_dimension(width, ratio_y, ratio_x);

    if target_w <= width {
        (target_w, height)
    } else {
        (width, target_h)
    }
}

fn scale_ratio_dimension(base: u32, numerator: u32, denominator: u32) -> u32 {
    if denominator == 0 {
        0
    } else {
        let scaled = (u64::from(base) * u64::from(numerator)) / u64::from(denominator);
        u32::try_from(scaled).unwrap_or(u32::MAX)
    }
}
