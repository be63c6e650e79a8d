//! camera-filters library crate.
//!
//! Named frame filters, key-triggered zoom-in snapshot overlays and the per-stream
//! pipeline that runs them. Capture devices and output sinks live outside this crate
//! and talk to it through [`pipeline::FilterPipeline`].

pub mod config;
pub mod events;
pub mod filters;
pub mod frame;
pub mod hotkeys;
pub mod pipeline;
pub mod registry;
pub mod snapshot;
pub mod source;

pub use config::{ConfigError, FilterConfig};
pub use events::{EventSink, EventState};
pub use frame::Frame;
pub use pipeline::FilterPipeline;
pub use registry::{FilterContext, FilterError, FilterRegistry, Transform};
