//! Editor controller: turns user actions into history changes, remote jobs
//! and persistence commands.

mod error;
pub mod tools;
mod transient;
mod worker;

pub use error::{ActionOutcome, InputError, JobCompletion};
pub use tools::{CropPreset, StyleKind, StylePreset, ToolKind};
pub use transient::{SnapshotScoped, TransientField};

use std::sync::Arc;

use self::worker::{JobOutput, PendingJob};
use crate::asset::{MaskAsset, Snapshot, VideoAsset};
use crate::config::AppConfig;
use crate::geometry::{surface_to_natural, PixelSize, SurfacePoint, ToolPoint};
use crate::history::HistoryState;
use crate::mask::{resample_mask, MaskPipeline};
use crate::notification::{NoticeLevel, Notifier};
use crate::remote::{
    AnalysisOptions, AnimationRequest, AspectRatio, CancellationToken, GenerationResult,
    PollPolicy, RemoteCollaborator, ResolutionTier,
};
use crate::storage::{SessionMirror, SessionRecord, SessionStore};

const SESSION_RESTORED_NOTICE: &str = "Restored your previous editing session.";

pub struct Editor<R: RemoteCollaborator + 'static, N: Notifier> {
    remote: Arc<R>,
    notifier: N,
    history: HistoryState,
    scoped: SnapshotScoped,
    mask: MaskPipeline,
    active_tool: ToolKind,
    crop_preset: CropPreset,
    display_size: Option<PixelSize>,
    pending: Option<PendingJob>,
    mirror: SessionMirror,
    poll_policy: PollPolicy,
}

impl<R: RemoteCollaborator + 'static, N: Notifier> Editor<R, N> {
    /// Editor without persistence.
    pub fn new(remote: R, notifier: N, config: &AppConfig) -> Self {
        Self::assemble(
            remote,
            notifier,
            config,
            HistoryState::new(),
            SessionMirror::disabled(),
        )
    }

    /// Rehydrates from `store` (the only blocking read) and then mirrors
    /// every history change back to it in the background.
    pub fn open<S: SessionStore + 'static>(
        remote: R,
        notifier: N,
        config: &AppConfig,
        store: S,
    ) -> Self {
        let history = match store.load() {
            Ok(Some(record)) => {
                let history = record.into_history();
                tracing::info!(
                    snapshots = history.len(),
                    cursor = ?history.cursor(),
                    "restored persisted session"
                );
                history
            }
            Ok(None) => HistoryState::new(),
            Err(err) => {
                tracing::warn!(?err, "failed to load persisted session; starting fresh");
                HistoryState::new()
            }
        };

        let restored = !history.is_empty();
        let editor = Self::assemble(
            remote,
            notifier,
            config,
            history,
            SessionMirror::spawn(store),
        );
        if restored {
            editor
                .notifier
                .notify(NoticeLevel::Info, SESSION_RESTORED_NOTICE);
        }
        editor
    }

    fn assemble(
        remote: R,
        notifier: N,
        config: &AppConfig,
        history: HistoryState,
        mirror: SessionMirror,
    ) -> Self {
        Self {
            remote: Arc::new(remote),
            notifier,
            history,
            scoped: SnapshotScoped::default(),
            mask: MaskPipeline::new(config.brush()),
            active_tool: ToolKind::default(),
            crop_preset: CropPreset::default(),
            display_size: None,
            pending: None,
            mirror,
            poll_policy: config.poll_policy(),
        }
    }

    pub fn history(&self) -> &HistoryState {
        &self.history
    }

    pub fn current(&self) -> Option<&Snapshot> {
        self.history.current()
    }

    pub fn original(&self) -> Option<&Snapshot> {
        self.history.original()
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn is_busy(&self) -> bool {
        self.pending.is_some()
    }

    pub fn active_tool(&self) -> ToolKind {
        self.active_tool
    }

    pub fn transient(&self) -> &SnapshotScoped {
        &self.scoped
    }

    pub fn mask(&self) -> &MaskPipeline {
        &self.mask
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Blocks until queued persistence writes have been applied.
    pub fn flush_persistence(&self) {
        self.mirror.flush();
    }

    /// Starts a new session with `snapshot` as the original.
    pub fn upload(&mut self, snapshot: Snapshot) -> ActionOutcome {
        if self.is_busy() {
            return ActionOutcome::Busy;
        }
        tracing::info!(name = snapshot.name(), "image uploaded");
        self.history.reset();
        self.commit(snapshot);
        ActionOutcome::Applied
    }

    pub fn append(&mut self, snapshot: Snapshot) -> ActionOutcome {
        if self.is_busy() {
            return ActionOutcome::Busy;
        }
        self.commit(snapshot);
        ActionOutcome::Applied
    }

    pub fn undo(&mut self) -> ActionOutcome {
        if self.is_busy() {
            return ActionOutcome::Busy;
        }
        if !self.history.undo() {
            return ActionOutcome::Unchanged;
        }
        self.persist();
        ActionOutcome::Applied
    }

    pub fn redo(&mut self) -> ActionOutcome {
        if self.is_busy() {
            return ActionOutcome::Busy;
        }
        if !self.history.redo() {
            return ActionOutcome::Unchanged;
        }
        self.persist();
        ActionOutcome::Applied
    }

    /// Drops the whole history and the persisted session.
    pub fn reset(&mut self) -> ActionOutcome {
        if self.is_busy() {
            return ActionOutcome::Busy;
        }
        self.history.reset();
        self.invalidate_transient();
        if self.active_tool.uses_mask() {
            self.mask.exit();
        }
        self.active_tool = ToolKind::default();
        self.mirror.clear();
        tracing::info!("editing session reset");
        ActionOutcome::Applied
    }

    fn commit(&mut self, snapshot: Snapshot) {
        self.history.append(snapshot);
        self.invalidate_transient();
        self.persist();
    }

    fn invalidate_transient(&mut self) {
        for field in TransientField::ALL {
            match field {
                TransientField::Mask => self.mask.discard_mask(),
                other => self.scoped.clear(other),
            }
        }
    }

    fn persist(&self) {
        if !self.history.is_empty() {
            self.mirror.save(SessionRecord::from_history(&self.history));
        }
    }

    pub fn select_tool(&mut self, tool: ToolKind) -> ActionOutcome {
        if self.is_busy() {
            return ActionOutcome::Busy;
        }
        if tool == self.active_tool {
            return ActionOutcome::Unchanged;
        }
        if tool.requires_image() && self.history.is_empty() {
            return self.reject("select tool", InputError::NoImage);
        }

        if self.active_tool.uses_mask() {
            self.mask.exit();
        }
        if tool.uses_mask() {
            self.mask
                .enter(self.display_size.unwrap_or(PixelSize::new(0, 0)));
        }
        tracing::debug!(from = ?self.active_tool, to = ?tool, "tool switched");
        self.active_tool = tool;
        ActionOutcome::Applied
    }

    /// Records the on-screen size of the current image. A masking session on
    /// a differently sized surface restarts blank, but not while a job is
    /// pending: the mask it was given must survive a failure.
    pub fn set_display_size(&mut self, size: PixelSize) {
        self.display_size = Some(size);
        if !self.is_busy() {
            self.sync_mask_surface();
        }
    }

    fn sync_mask_surface(&mut self) {
        let Some(size) = self.display_size else {
            return;
        };
        if self.active_tool.uses_mask() && self.mask.surface_size() != Some(size) {
            tracing::debug!(width = size.width, height = size.height, "mask surface resized");
            self.mask.enter(size);
        }
    }

    pub fn set_brush_size(&mut self, size: u16) {
        self.mask.set_brush_size(size);
    }

    pub fn set_crop_preset(&mut self, preset: CropPreset) {
        self.crop_preset = preset;
    }

    /// Chooses the point targeted by `edit_at`, from a click on the displayed image.
    pub fn select_point(&mut self, point: SurfacePoint) -> ActionOutcome {
        if self.is_busy() {
            return ActionOutcome::Busy;
        }
        match self.map_to_natural(point) {
            Ok(Some(natural)) => {
                self.scoped.hotspot = Some(natural);
                ActionOutcome::Applied
            }
            Ok(None) => ActionOutcome::Unchanged,
            Err(err) => self.reject("select point", err),
        }
    }

    pub fn select_crop(&mut self, start: SurfacePoint, end: SurfacePoint) -> ActionOutcome {
        if self.is_busy() {
            return ActionOutcome::Busy;
        }
        let selection = self.map_to_natural(start).and_then(|start| {
            let end = self.map_to_natural(end)?;
            let natural = self.natural_size()?;
            Ok(start.zip(end).map(|(start, end)| (start, end, natural)))
        });
        match selection {
            Ok(Some((start, end, natural))) => {
                match tools::crop_selection(start, end, natural, self.crop_preset) {
                    Ok(bounds) => {
                        self.scoped.crop = Some(bounds);
                        ActionOutcome::Applied
                    }
                    Err(_) => self.reject("select crop", InputError::InvalidCrop),
                }
            }
            Ok(None) => ActionOutcome::Unchanged,
            Err(err) => self.reject("select crop", err),
        }
    }

    /// Renders the crop selection locally and appends it as a new snapshot.
    pub fn apply_crop(&mut self) -> ActionOutcome {
        if self.is_busy() {
            return ActionOutcome::Busy;
        }
        match self.render_crop() {
            Ok(snapshot) => {
                self.commit(snapshot);
                ActionOutcome::Applied
            }
            Err(err) => self.reject("crop", err),
        }
    }

    fn render_crop(&self) -> Result<Snapshot, InputError> {
        let image = self.require_image()?;
        let bounds = self.scoped.crop.ok_or(InputError::NoCropSelection)?;
        let natural = image.natural_size().map_err(unreadable)?;
        let x = u32::try_from(bounds.x).map_err(|_| InputError::InvalidCrop)?;
        let y = u32::try_from(bounds.y).map_err(|_| InputError::InvalidCrop)?;
        // selections survive undo/redo and may belong to a differently sized snapshot
        let fits = u64::from(x) + u64::from(bounds.width) <= u64::from(natural.width)
            && u64::from(y) + u64::from(bounds.height) <= u64::from(natural.height);
        if !fits {
            return Err(InputError::InvalidCrop);
        }
        let decoded = image.decode().map_err(unreadable)?;
        let cropped = decoded.crop_imm(x, y, bounds.width, bounds.height);
        Snapshot::from_image(&cropped, format!("cropped-{}", image.name())).map_err(unreadable)
    }

    fn map_to_natural(&self, point: SurfacePoint) -> Result<Option<ToolPoint>, InputError> {
        let natural = self.natural_size()?;
        let Some(displayed) = self.display_size else {
            return Ok(None);
        };
        Ok(surface_to_natural(point, displayed, natural))
    }

    fn natural_size(&self) -> Result<PixelSize, InputError> {
        self.require_image()?.natural_size().map_err(unreadable)
    }

    fn painting_enabled(&self) -> bool {
        !self.is_busy() && self.active_tool.uses_mask()
    }

    pub fn pointer_down(&mut self, point: SurfacePoint) {
        if self.painting_enabled() {
            self.sync_mask_surface();
            self.mask.pointer_down(point);
        }
    }

    pub fn pointer_move(&mut self, point: SurfacePoint) {
        if self.painting_enabled() {
            self.mask.pointer_move(point);
        }
    }

    pub fn pointer_up(&mut self) {
        if self.painting_enabled() {
            self.mask.pointer_up();
        }
    }

    pub fn pointer_leave(&mut self) {
        if self.painting_enabled() {
            self.mask.pointer_leave();
        }
    }

    pub fn clear_mask(&mut self) {
        if self.painting_enabled() {
            self.mask.clear();
        }
    }

    pub fn edit_at(&mut self, instruction: &str) -> ActionOutcome {
        let inputs = self.require_image().and_then(|image| {
            let instruction = require_instruction(instruction)?;
            let point = self.scoped.hotspot.ok_or(InputError::NoPointSelected)?;
            let natural = image.natural_size().map_err(unreadable)?;
            let inside = u32::try_from(point.x).is_ok_and(|x| x < natural.width)
                && u32::try_from(point.y).is_ok_and(|y| y < natural.height);
            if !inside {
                return Err(InputError::NoPointSelected);
            }
            Ok((image, instruction, point))
        });
        self.dispatch("edit", inputs, |remote, _, (image, instruction, point)| {
            remote
                .edit_at(&image, &instruction, point)
                .map(JobOutput::Image)
        })
    }

    /// Filters and adjustments share this path; only the instruction differs.
    pub fn apply_style(&mut self, instruction: &str) -> ActionOutcome {
        let inputs = self
            .require_image()
            .and_then(|image| Ok((image, require_instruction(instruction)?)));
        self.dispatch("style", inputs, |remote, _, (image, instruction)| {
            remote
                .apply_style(&image, &instruction)
                .map(JobOutput::Image)
        })
    }

    pub fn apply_preset(&mut self, preset: &StylePreset) -> ActionOutcome {
        tracing::debug!(kind = ?preset.kind, name = preset.name, "style preset chosen");
        self.apply_style(preset.instruction)
    }

    pub fn remove_background(&mut self) -> ActionOutcome {
        let inputs = self.require_image();
        self.dispatch("remove background", inputs, |remote, _, image| {
            remote.remove_background(&image).map(JobOutput::Image)
        })
    }

    /// Fills the painted region. The mask is resampled to the natural size
    /// of the current image before it is handed over.
    pub fn fill(&mut self, instruction: &str) -> ActionOutcome {
        let inputs = self.fill_inputs(instruction);
        self.dispatch("fill", inputs, |remote, _, (image, mask, instruction)| {
            remote
                .fill_masked(&image, &mask, &instruction)
                .map(JobOutput::Image)
        })
    }

    fn fill_inputs(&self, instruction: &str) -> Result<(Snapshot, MaskAsset, String), InputError> {
        let image = self.require_image()?;
        let exported = self.mask.exported().ok_or(InputError::NoMask)?;
        if exported.is_blank() {
            return Err(InputError::EmptyMask);
        }
        let instruction = require_instruction(instruction)?;
        let natural = image.natural_size().map_err(unreadable)?;
        let mask = resample_mask(exported, natural).map_err(unreadable)?;
        if mask.is_blank() {
            return Err(InputError::EmptyMask);
        }
        Ok((image, mask, instruction))
    }

    /// Generates a new image from text; it is appended like any other edit.
    pub fn synthesize(
        &mut self,
        instruction: &str,
        aspect_ratio: AspectRatio,
        resolution: ResolutionTier,
    ) -> ActionOutcome {
        let inputs = require_instruction(instruction);
        self.dispatch("synthesize", inputs, move |remote, _, instruction| {
            remote
                .synthesize(&instruction, aspect_ratio, resolution)
                .map(JobOutput::Image)
        })
    }

    pub fn analyze_image(&mut self, instruction: &str, options: AnalysisOptions) -> ActionOutcome {
        let inputs = self
            .require_image()
            .and_then(|image| Ok((image, require_instruction(instruction)?)));
        self.dispatch("analyze image", inputs, move |remote, _, (image, instruction)| {
            remote
                .analyze_image(&image, &instruction, options)
                .map(JobOutput::Analysis)
        })
    }

    pub fn analyze_video(&mut self, video: VideoAsset, instruction: &str) -> ActionOutcome {
        let inputs = if video.bytes.is_empty() {
            Err(InputError::NoVideo)
        } else {
            require_instruction(instruction).map(|instruction| (video, instruction))
        };
        self.dispatch("analyze video", inputs, |remote, _, (video, instruction)| {
            remote
                .analyze_video(&video, &instruction)
                .map(JobOutput::VideoAnalysis)
        })
    }

    /// Submits an animation and polls it on the worker thread until done,
    /// cancelled, or the configured ceiling is hit.
    pub fn animate(
        &mut self,
        instruction: &str,
        aspect_ratio: AspectRatio,
        from_current_image: bool,
    ) -> ActionOutcome {
        let inputs = require_instruction(instruction).and_then(|instruction| {
            let source = if from_current_image {
                Some(self.require_image()?)
            } else {
                None
            };
            Ok(AnimationRequest {
                instruction,
                aspect_ratio,
                source,
            })
        });
        let policy = self.poll_policy;
        self.dispatch("animate", inputs, move |remote, token, request| {
            crate::remote::animate(remote, &request, &policy, token).map(JobOutput::Video)
        })
    }

    fn dispatch<T, W>(
        &mut self,
        operation: &'static str,
        inputs: Result<T, InputError>,
        work: W,
    ) -> ActionOutcome
    where
        T: Send + 'static,
        W: FnOnce(&R, &CancellationToken, T) -> GenerationResult<JobOutput> + Send + 'static,
    {
        if self.is_busy() {
            return ActionOutcome::Busy;
        }
        let inputs = match inputs {
            Ok(inputs) => inputs,
            Err(err) => return self.reject(operation, err),
        };
        tracing::info!(operation, "remote operation started");
        self.pending = Some(PendingJob::spawn(
            operation,
            Arc::clone(&self.remote),
            move |remote, token| work(remote, token, inputs),
        ));
        ActionOutcome::Dispatched
    }

    /// Applies the pending job's result if it has arrived. Never blocks.
    pub fn pump(&mut self) -> Option<JobCompletion> {
        let result = self.pending.as_ref()?.try_result()?;
        Some(self.finish(result))
    }

    /// Blocks until the pending job reports, then applies its result.
    pub fn wait(&mut self) -> Option<JobCompletion> {
        let result = self.pending.as_ref()?.wait_result();
        Some(self.finish(result))
    }

    /// Asks the pending job to stop. Only polling operations observe this.
    pub fn cancel_pending(&self) -> bool {
        match self.pending.as_ref() {
            Some(job) => {
                tracing::info!(operation = job.operation(), "cancellation requested");
                job.cancel();
                true
            }
            None => false,
        }
    }

    fn finish(&mut self, result: GenerationResult<JobOutput>) -> JobCompletion {
        let operation = self
            .pending
            .take()
            .map_or("remote operation", |job| job.operation());
        match result {
            Ok(JobOutput::Image(snapshot)) => {
                tracing::info!(
                    operation,
                    name = snapshot.name(),
                    "remote operation produced an image"
                );
                self.commit(snapshot);
                JobCompletion::Appended
            }
            Ok(JobOutput::Analysis(analysis)) => {
                tracing::info!(operation, citations = analysis.citations.len(), "analysis ready");
                self.scoped.analysis = Some(analysis);
                JobCompletion::AnalysisReady
            }
            Ok(JobOutput::VideoAnalysis(text)) => {
                tracing::info!(operation, "video analysis ready");
                self.scoped.video_analysis = Some(text);
                JobCompletion::VideoAnalysisReady
            }
            Ok(JobOutput::Video(video)) => {
                tracing::info!(operation, bytes = video.bytes.len(), "video ready");
                self.scoped.video = Some(video);
                JobCompletion::VideoReady
            }
            Err(err) => {
                tracing::warn!(operation, %err, "remote operation failed");
                self.notifier.notify(NoticeLevel::Error, &err.to_string());
                JobCompletion::Failed(err)
            }
        }
    }

    fn require_image(&self) -> Result<Snapshot, InputError> {
        self.history.current().cloned().ok_or(InputError::NoImage)
    }

    fn reject(&self, operation: &'static str, err: InputError) -> ActionOutcome {
        tracing::debug!(operation, %err, "action rejected");
        self.notifier.notify(NoticeLevel::Error, &err.to_string());
        ActionOutcome::Rejected(err)
    }
}

fn require_instruction(instruction: &str) -> Result<String, InputError> {
    let trimmed = instruction.trim();
    if trimmed.is_empty() {
        return Err(InputError::EmptyInstruction);
    }
    Ok(trimmed.to_string())
}

fn unreadable(err: crate::asset::AssetError) -> InputError {
    InputError::UnreadableImage {
        message: err.to_string(),
    }
}
