//! Contract for the remote generative service that performs every actual
//! image edit, synthesis and analysis.

mod cancel;
mod poll;

pub use cancel::{CancellationSource, CancellationToken};
pub use poll::{animate, poll_until_done, PollPolicy, PollStatus, DEFAULT_POLL_INTERVAL};

use crate::asset::{MaskAsset, Snapshot, VideoAsset};
use crate::geometry::ToolPoint;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("{operation} was blocked by the service: {reason}")]
    Blocked {
        operation: &'static str,
        reason: String,
    },
    #[error("{operation} returned no usable result")]
    EmptyResponse { operation: &'static str },
    #[error("{operation} failed: {source}")]
    Remote {
        operation: &'static str,
        #[source]
        source: anyhow::Error,
    },
    #[error("{operation} was cancelled")]
    Cancelled { operation: &'static str },
    #[error("{operation} did not finish after {attempts} polls")]
    TimedOut {
        operation: &'static str,
        attempts: u32,
    },
}

pub type GenerationResult<T> = std::result::Result<T, GenerationError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AspectRatio {
    #[default]
    Square,
    Landscape16x9,
    Portrait9x16,
    Landscape4x3,
    Portrait3x4,
}

impl AspectRatio {
    pub const ALL: [AspectRatio; 5] = [
        Self::Square,
        Self::Landscape16x9,
        Self::Portrait9x16,
        Self::Landscape4x3,
        Self::Portrait3x4,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Square => "1:1",
            Self::Landscape16x9 => "16:9",
            Self::Portrait9x16 => "9:16",
            Self::Landscape4x3 => "4:3",
            Self::Portrait3x4 => "3:4",
        }
    }

    pub const fn ratio(self) -> (u32, u32) {
        match self {
            Self::Square => (1, 1),
            Self::Landscape16x9 => (16, 9),
            Self::Portrait9x16 => (9, 16),
            Self::Landscape4x3 => (4, 3),
            Self::Portrait3x4 => (3, 4),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResolutionTier {
    #[default]
    Standard,
    High,
    Ultra,
}

impl ResolutionTier {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Standard => "1K",
            Self::High => "2K",
            Self::Ultra => "4K",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AnalysisOptions {
    pub deep_reasoning: bool,
    pub web_grounding: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Citation {
    pub title: String,
    pub uri: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisResult {
    pub text: String,
    pub citations: Vec<Citation>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnimationRequest {
    pub instruction: String,
    pub aspect_ratio: AspectRatio,
    pub source: Option<Snapshot>,
}

/// Opaque handle for a submitted long-running operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationHandle(pub String);

/// Remote generative service. Every call is an atomic request/response; the
/// animation flow is split into submit and poll so the caller owns the loop.
pub trait RemoteCollaborator: Send + Sync {
    fn edit_at(
        &self,
        image: &Snapshot,
        instruction: &str,
        point: ToolPoint,
    ) -> GenerationResult<Snapshot>;

    /// Shared by filter and adjustment presets; only the instruction differs.
    fn apply_style(&self, image: &Snapshot, instruction: &str) -> GenerationResult<Snapshot>;

    fn remove_background(&self, image: &Snapshot) -> GenerationResult<Snapshot>;

    fn fill_masked(
        &self,
        image: &Snapshot,
        mask: &MaskAsset,
        instruction: &str,
    ) -> GenerationResult<Snapshot>;

    fn synthesize(
        &self,
        instruction: &str,
        aspect_ratio: AspectRatio,
        resolution: ResolutionTier,
    ) -> GenerationResult<Snapshot>;

    fn analyze_image(
        &self,
        image: &Snapshot,
        instruction: &str,
        options: AnalysisOptions,
    ) -> GenerationResult<AnalysisResult>;

    fn analyze_video(&self, video: &VideoAsset, instruction: &str) -> GenerationResult<String>;

    fn submit_animation(&self, request: &AnimationRequest) -> GenerationResult<OperationHandle>;

    fn poll_animation(&self, handle: &OperationHandle) -> GenerationResult<PollStatus<VideoAsset>>;
}
