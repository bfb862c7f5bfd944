mod crop;
mod presets;

pub use crop::{crop_selection, CropPreset, CROP_MIN_SIZE};
pub use presets::{
    find_preset, presets, StyleKind, StylePreset, ADJUSTMENT_PRESETS, FILTER_PRESETS,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToolKind {
    #[default]
    Retouch,
    Crop,
    Adjust,
    Filter,
    Fill,
    Erase,
    Generate,
    Analyze,
    Animate,
}

impl ToolKind {
    pub const ALL: [ToolKind; 9] = [
        Self::Retouch,
        Self::Crop,
        Self::Adjust,
        Self::Filter,
        Self::Fill,
        Self::Erase,
        Self::Generate,
        Self::Analyze,
        Self::Animate,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Retouch => "Retouch",
            Self::Crop => "Crop",
            Self::Adjust => "Adjust",
            Self::Filter => "Filters",
            Self::Fill => "Generative Fill",
            Self::Erase => "Remove Background",
            Self::Generate => "Generate",
            Self::Analyze => "Analyze",
            Self::Animate => "Animate",
        }
    }

    /// Tools that paint a mask on top of the image.
    pub const fn uses_mask(self) -> bool {
        matches!(self, Self::Fill)
    }

    /// Tools that cannot run without a current image.
    pub const fn requires_image(self) -> bool {
        !matches!(self, Self::Generate | Self::Animate)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolError {
    InvalidCropGeometry,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_fill_uses_the_mask() {
        let masking: Vec<_> = ToolKind::ALL
            .iter()
            .copied()
            .filter(|tool| tool.uses_mask())
            .collect();
        assert_eq!(masking, [ToolKind::Fill]);
    }

    #[test]
    fn generation_tools_work_without_an_image() {
        assert!(!ToolKind::Generate.requires_image());
        assert!(!ToolKind::Animate.requires_image());
        assert!(ToolKind::Retouch.requires_image());
        assert!(ToolKind::Fill.requires_image());
    }
}
