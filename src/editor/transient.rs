use crate::asset::VideoAsset;
use crate::geometry::{ToolBounds, ToolPoint};
use crate::remote::AnalysisResult;

/// Every piece of tool state that is only meaningful for the snapshot that
/// was current when it was created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransientField {
    Hotspot,
    Crop,
    Mask,
    Analysis,
    VideoAnalysis,
    Video,
}

impl TransientField {
    pub const ALL: [TransientField; 6] = [
        Self::Hotspot,
        Self::Crop,
        Self::Mask,
        Self::Analysis,
        Self::VideoAnalysis,
        Self::Video,
    ];
}

/// Snapshot-scoped values other than the mask, which the mask pipeline owns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SnapshotScoped {
    pub hotspot: Option<ToolPoint>,
    pub crop: Option<ToolBounds>,
    pub analysis: Option<AnalysisResult>,
    pub video_analysis: Option<String>,
    pub video: Option<VideoAsset>,
}

impl SnapshotScoped {
    pub fn clear(&mut self, field: TransientField) {
        match field {
            TransientField::Hotspot => self.hotspot = None,
            TransientField::Crop => self.crop = None,
            TransientField::Analysis => self.analysis = None,
            TransientField::VideoAnalysis => self.video_analysis = None,
            TransientField::Video => self.video = None,
            TransientField::Mask => {}
        }
    }

    pub fn is_clear(&self) -> bool {
        *self == Self::default()
    }
}
