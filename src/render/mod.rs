mod frame;
mod null_renderer;
mod projection;

pub use frame::{RenderFrame, RenderableEvent};
pub use null_renderer::NullRenderer;
pub use projection::{EquirectangularProjection, MapProjection, ScreenPoint};

use crate::error::EngineResult;

/// Contract implemented by any presentation backend.
///
/// Backends receive a fully materialized `RenderFrame`, so drawing code
/// stays isolated from filtering, focus and playback logic.
pub trait Renderer {
    fn render(&mut self, frame: &RenderFrame) -> EngineResult<()>;
}
