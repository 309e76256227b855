use crate::error::EngineResult;
use crate::render::{RenderFrame, Renderer};

/// No-op renderer used by tests and headless engine usage.
///
/// It still validates frame content so tests can catch invalid output before
/// a real backend is attached.
#[derive(Debug, Default)]
pub struct NullRenderer {
    pub frames_rendered: usize,
    pub last_event_count: usize,
    pub last_expanded_count: usize,
}

impl Renderer for NullRenderer {
    fn render(&mut self, frame: &RenderFrame) -> EngineResult<()> {
        frame.validate()?;
        self.frames_rendered += 1;
        self.last_event_count = frame.renderable.len();
        self.last_expanded_count = frame.expanded_count();
        Ok(())
    }
}
