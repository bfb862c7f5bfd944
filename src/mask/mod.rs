//! Freehand mask painting: pointer gestures in, a two-tone mask image out.

mod raster;
mod state;

pub use raster::{resample_mask, MaskRaster};
pub use state::{StrokeEvent, StrokeMachine, StrokeState};

use crate::asset::MaskAsset;
use crate::geometry::{PixelSize, SurfacePoint};

pub const BRUSH_SIZE_MIN: u16 = 1;
pub const BRUSH_SIZE_MAX: u16 = 200;
pub const BRUSH_SIZE_DEFAULT: u16 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BrushOptions {
    size: u16,
}

impl Default for BrushOptions {
    fn default() -> Self {
        Self {
            size: BRUSH_SIZE_DEFAULT,
        }
    }
}

impl BrushOptions {
    pub fn new(size: u16) -> Self {
        let mut options = Self::default();
        options.set_size(size);
        options
    }

    pub const fn size(self) -> u16 {
        self.size
    }

    pub fn set_size(&mut self, size: u16) {
        self.size = size.clamp(BRUSH_SIZE_MIN, BRUSH_SIZE_MAX);
    }

    fn diameter(self) -> f32 {
        f32::from(self.size)
    }
}

/// One masking session at a time: the raster sized to the displayed image,
/// the stroke state machine, and the last finalized export.
#[derive(Debug, Default)]
pub struct MaskPipeline {
    machine: StrokeMachine,
    raster: Option<MaskRaster>,
    brush: BrushOptions,
    last_point: Option<SurfacePoint>,
    exported: Option<MaskAsset>,
}

impl MaskPipeline {
    pub fn new(brush: BrushOptions) -> Self {
        Self {
            brush,
            ..Self::default()
        }
    }

    pub fn state(&self) -> StrokeState {
        self.machine.state()
    }

    pub fn brush(&self) -> BrushOptions {
        self.brush
    }

    pub fn set_brush_size(&mut self, size: u16) {
        self.brush.set_size(size);
    }

    pub fn surface_size(&self) -> Option<PixelSize> {
        self.raster.as_ref().map(MaskRaster::size)
    }

    pub fn raster(&self) -> Option<&MaskRaster> {
        self.raster.as_ref()
    }

    /// Starts a fresh session on a surface of the displayed image size.
    pub fn enter(&mut self, displayed: PixelSize) {
        self.machine.transition(StrokeEvent::Enter);
        self.raster = (!displayed.is_empty()).then(|| MaskRaster::new(displayed));
        self.last_point = None;
        self.exported = None;
    }

    pub fn pointer_down(&mut self, point: SurfacePoint) {
        let Some(raster) = self.raster.as_mut() else {
            return;
        };
        if !raster.size().contains(point) || !self.machine.can_transition(StrokeEvent::PointerDown)
        {
            return;
        }
        self.machine.transition(StrokeEvent::PointerDown);
        raster.stamp_circle(point, self.brush.diameter());
        self.last_point = Some(point);
    }

    pub fn pointer_move(&mut self, point: SurfacePoint) {
        if self.machine.state() != StrokeState::Stroking {
            return;
        }
        let (Some(raster), Some(last)) = (self.raster.as_mut(), self.last_point) else {
            return;
        };
        self.machine.transition(StrokeEvent::PointerMove);
        raster.draw_segment(last, point, self.brush.diameter());
        self.last_point = Some(point);
    }

    pub fn pointer_up(&mut self) {
        self.finish_stroke(StrokeEvent::PointerUp);
    }

    pub fn pointer_leave(&mut self) {
        self.finish_stroke(StrokeEvent::PointerLeave);
    }

    fn finish_stroke(&mut self, event: StrokeEvent) {
        if self.machine.transition(event).is_none() {
            return;
        }
        self.last_point = None;
        let Some(raster) = self.raster.as_ref() else {
            return;
        };
        match raster.export() {
            Ok(mask) => {
                tracing::debug!(painted = mask.painted_pixels, "mask exported");
                self.exported = Some(mask);
            }
            Err(err) => {
                tracing::debug!(?err, "mask export skipped");
            }
        }
    }

    /// Blanks the raster and drops the exported mask; the session stays open.
    pub fn clear(&mut self) {
        if self.machine.transition(StrokeEvent::Clear).is_none() {
            return;
        }
        if let Some(raster) = self.raster.as_mut() {
            raster.clear();
        }
        self.last_point = None;
        self.exported = None;
    }

    /// Discards the session entirely.
    pub fn exit(&mut self) {
        self.machine.transition(StrokeEvent::Exit);
        self.raster = None;
        self.last_point = None;
        self.exported = None;
    }

    /// Drops any painted or exported mask while keeping an open session ready
    /// for new strokes on a surface of the same size.
    pub fn discard_mask(&mut self) {
        match self.raster.as_ref().map(MaskRaster::size) {
            Some(size) if self.machine.state() != StrokeState::Inactive => self.enter(size),
            _ => self.exit(),
        }
    }

    pub fn exported(&self) -> Option<&MaskAsset> {
        self.exported.as_ref()
    }
}
