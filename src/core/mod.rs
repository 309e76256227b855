pub mod chronos_time;
pub mod composition;
pub mod density;
pub mod geo;
pub mod lod;
pub mod types;
pub mod zoom_scale;

pub use chronos_time::{ChronosTime, TimePrecision, is_leap_astro_year};
pub use composition::{
    Composition, CompositionConfig, CompositionContext, LodOverrides, compose_events,
};
pub use density::{
    DensityHistogram, DensitySamples, HistogramConfig, gaussian_kernel, log_normalize, smooth,
};
pub use geo::{bounds_for_points, is_in_bounds};
pub use lod::{LodConfig, lod_threshold};
pub use types::{
    Event, EventId, EventLocation, LocationGranularity, SourceId, ViewRange, Viewport,
};
pub use zoom_scale::ZoomScale;
