use winit::window::Window;

use crate::backend::webgpu::WgpuBackend;
use crate::canvas::Canvas;
use crate::error::CanvasError;
use crate::paint::ClearColor;
use crate::time::FrameTime;
use crate::window::RuntimeCtx;

use super::app::AppControl;

/// Canvas bound to a window surface.
pub type WindowCanvas<'w> = Canvas<WgpuBackend<'w>>;

/// Per-frame context passed to [`App::on_frame`](super::App::on_frame).
///
/// `'a` is the callback invocation; `'w` is the window borrow carried by the
/// backend's surface.
pub struct FrameCtx<'a, 'w> {
    pub window: &'a Window,
    pub canvas: &'a mut WindowCanvas<'w>,
    pub time: FrameTime,
    pub runtime: &'a mut RuntimeCtx,
}

impl<'w> FrameCtx<'_, 'w> {
    /// Runs one canvas frame: begin with `clear`, call `draw`, end and present.
    ///
    /// A lost or timed-out surface skips the frame and keeps running; any
    /// other error asks the runtime to exit.
    pub fn render<F>(&mut self, clear: ClearColor, draw: F) -> AppControl
    where
        F: FnOnce(&mut WindowCanvas<'w>),
    {
        if let Err(err) = self.canvas.begin_frame(clear) {
            log::error!("begin_frame failed: {err}");
            return AppControl::Exit;
        }

        draw(&mut *self.canvas);

        let submitted = self.canvas.end_frame();
        if submitted.is_ok() {
            self.window.pre_present_notify();
        }
        // Present even after a failed submit so the frame slot advances.
        let presented = self.canvas.present();

        match submitted.and(presented) {
            Ok(()) => AppControl::Continue,
            Err(CanvasError::Backend(err)) if err.is_recoverable() => {
                log::debug!("frame {} skipped: {err}", self.canvas.frame_counter() - 1);
                AppControl::Continue
            }
            Err(err) => {
                log::error!("frame failed: {err}");
                AppControl::Exit
            }
        }
    }
}
