use thiserror::Error;

use crate::remote::GenerationError;

/// A precondition the user has to fix before an action can run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("upload an image first")]
    NoImage,
    #[error("describe the change you want")]
    EmptyInstruction,
    #[error("click the image to choose the spot to edit")]
    NoPointSelected,
    #[error("paint over the area to fill first")]
    NoMask,
    #[error("the painted mask is empty")]
    EmptyMask,
    #[error("drag on the image to choose a crop area")]
    NoCropSelection,
    #[error("the crop area is too small")]
    InvalidCrop,
    #[error("choose a video to analyze")]
    NoVideo,
    #[error("the current image could not be read: {message}")]
    UnreadableImage { message: String },
}

/// Result of a user action at the editor boundary.
#[derive(Debug, PartialEq, Eq)]
pub enum ActionOutcome {
    /// Local state changed.
    Applied,
    /// A remote job is running; its result arrives through `pump`/`wait`.
    Dispatched,
    /// Valid action with nothing to do.
    Unchanged,
    Rejected(InputError),
    /// Another remote job is still pending.
    Busy,
}

/// What a finished remote job did to the editor.
#[derive(Debug)]
pub enum JobCompletion {
    Appended,
    AnalysisReady,
    VideoAnalysisReady,
    VideoReady,
    Failed(GenerationError),
}

impl JobCompletion {
    pub const fn is_success(&self) -> bool {
        !matches!(self, Self::Failed(_))
    }
}
