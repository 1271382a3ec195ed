use crate::pipeline::PredictionResult;
use crate::surface::{RawTile, Surface};
use image::Rgba;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

const DEFAULT_PEN_COLOR: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// Pen state for the current gesture.
///
/// `last` is the previous pointer position within a contiguous gesture, or
/// None between gestures. The first pointer-move of a gesture only records a
/// position; drawing starts from the second event, so a gesture never leaves
/// a stray mark at its starting point.
struct PenState {
    last: Option<(f32, f32)>,
    width: u32,
    color: Rgba<u8>,
}

/// Surface and dirty flag, guarded together so a tick's
/// read-dirty/snapshot/clear-dirty sequence is atomic with respect to
/// stroke writes.
struct CanvasState {
    surface: Surface,
    pen: PenState,
    dirty: bool,
}

/// Shared context for one drawing session.
///
/// Owns the stroke surface, its dirty flag, the pen, and the last published
/// prediction. Shared between the input handler and the inference cycle
/// controller; all mutable state sits behind explicit locks, with the canvas
/// lock held only for stroke writes and snapshots, never across inference.
pub struct Session {
    canvas: Mutex<CanvasState>,
    last_result: Mutex<Option<PredictionResult>>,
    display_stale: AtomicBool,
    running: AtomicBool,
}

impl Session {
    pub fn new(width: u32, height: u32, pen_width: u32) -> Self {
        Self {
            canvas: Mutex::new(CanvasState {
                surface: Surface::new(width, height),
                pen: PenState {
                    last: None,
                    width: pen_width,
                    color: DEFAULT_PEN_COLOR,
                },
                dirty: false,
            }),
            last_result: Mutex::new(None),
            // Render the neutral display on the first tick.
            display_stale: AtomicBool::new(true),
            running: AtomicBool::new(true),
        }
    }

    fn canvas(&self) -> MutexGuard<'_, CanvasState> {
        self.canvas.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Handle a pointer-move event. The first event of a gesture positions
    /// the pen without drawing; subsequent events draw a segment from the
    /// previous position and mark the surface dirty.
    pub fn pointer_moved(&self, x: f32, y: f32) {
        let mut canvas = self.canvas();
        if let Some(last) = canvas.pen.last {
            let (width, color) = (canvas.pen.width, canvas.pen.color);
            canvas.surface.write_stroke(last, (x, y), width, color);
            canvas.dirty = true;
        }
        canvas.pen.last = Some((x, y));
    }

    /// Handle a pointer-release event, ending the current gesture.
    pub fn pointer_released(&self) {
        self.canvas().pen.last = None;
    }

    pub fn set_pen_color(&self, color: Rgba<u8>) {
        self.canvas().pen.color = color;
    }

    /// Reset the surface to its initial blank state. Clears the dirty flag
    /// (a blank canvas is clean, so the next tick stays idle) and resets the
    /// published prediction to neutral.
    pub fn reset(&self) {
        {
            let mut canvas = self.canvas();
            canvas.surface.reset();
            canvas.pen.last = None;
            canvas.dirty = false;
        }
        *self
            .last_result
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = None;
        self.display_stale.store(true, Ordering::SeqCst);
    }

    pub fn is_dirty(&self) -> bool {
        self.canvas().dirty
    }

    /// If the surface changed since the last consumed snapshot, copy it out
    /// and clear the dirty flag in the same critical section. Strokes that
    /// land after the copy re-set the flag, so the next tick sees them.
    pub(crate) fn take_pending_snapshot(&self) -> Option<RawTile> {
        let mut canvas = self.canvas();
        if !canvas.dirty {
            return None;
        }
        let tile = canvas.surface.snapshot();
        canvas.dirty = false;
        Some(tile)
    }

    /// Re-arm the dirty flag after an aborted cycle so the next tick retries.
    pub(crate) fn mark_dirty(&self) {
        self.canvas().dirty = true;
    }

    pub fn last_result(&self) -> Option<PredictionResult> {
        self.last_result
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn store_result(&self, result: PredictionResult) {
        *self
            .last_result
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(result);
    }

    /// Consume the pending "display needs its neutral state" marker.
    pub(crate) fn take_display_stale(&self) -> bool {
        self.display_stale.swap(false, Ordering::SeqCst)
    }

    pub fn shutdown(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}
