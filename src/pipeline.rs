//! Per-stream filter pipeline.
//!
//! A [`FilterPipeline`] owns everything with per-stream state (latched input and the
//! snapshot engine) and shares the registry and config with other streams. The capture
//! side calls [`FilterPipeline::process_frame`] once per frame; input sources push key
//! events through an [`EventSink`] from any thread.

use std::collections::HashSet;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use crate::config::FilterConfig;
use crate::events::{EventSink, EventState, DEFAULT_QUEUE_CAPACITY};
use crate::filters::ZOOM_IN_EFFECT;
use crate::frame::Frame;
use crate::registry::{FilterContext, FilterError, FilterRegistry, Transform};
use crate::snapshot::{SnapshotEngine, SnapshotSettings};

/// Runs the configured filter chain over a stream of frames.
pub struct FilterPipeline {
    registry: Arc<FilterRegistry>,
    config: Arc<FilterConfig>,
    chain: Arc<[Transform]>,
    events: EventState,
    sink: EventSink,
    snapshots: SnapshotEngine,
    frame_index: u64,
    /// Filters whose last run failed; repeat failures are logged quietly.
    failing: HashSet<String>,
}

impl std::fmt::Debug for FilterPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterPipeline")
            .field("chain", &self.list_filters())
            .field("frame_index", &self.frame_index)
            .field("live_snapshots", &self.snapshots.len())
            .finish_non_exhaustive()
    }
}

impl FilterPipeline {
    /// Pipeline running every enabled registered filter, in registration order.
    pub fn new(registry: Arc<FilterRegistry>, config: Arc<FilterConfig>) -> Self {
        let chain = registry.enabled_filters(&config);
        Self::with_chain(registry, config, chain)
    }

    /// Pipeline running only the named filters, in the given order.
    ///
    /// Unknown names are reported once and skipped; filters disabled in the config
    /// stay in the chain but pass frames through.
    pub fn with_filters<S: AsRef<str>>(
        registry: Arc<FilterRegistry>,
        config: Arc<FilterConfig>,
        names: &[S],
    ) -> Self {
        let chain = registry.lookup_list(names);
        Self::with_chain(registry, config, chain)
    }

    fn with_chain(
        registry: Arc<FilterRegistry>,
        config: Arc<FilterConfig>,
        chain: Vec<Transform>,
    ) -> Self {
        let settings = SnapshotSettings::from_params(config.parameters_of(ZOOM_IN_EFFECT));
        let (events, sink) = EventState::with_queue(DEFAULT_QUEUE_CAPACITY);
        log::info!(
            "filter chain: [{}]",
            chain.iter().map(Transform::name).collect::<Vec<_>>().join(", ")
        );
        Self {
            registry,
            config,
            chain: chain.into(),
            events,
            sink,
            snapshots: SnapshotEngine::new(settings),
            frame_index: 0,
            failing: HashSet::new(),
        }
    }

    /// Handle for input sources; clone freely and move to other threads.
    pub fn event_sink(&self) -> EventSink {
        self.sink.clone()
    }

    /// Queue a press; applied at the start of the next frame.
    pub fn notify_press(&self, id: &str) {
        self.sink.notify_press(id);
    }

    /// Queue a release; applied at the start of the next frame.
    pub fn notify_release(&self, id: &str) {
        self.sink.notify_release(id);
    }

    pub fn events(&self) -> &EventState {
        &self.events
    }

    pub fn snapshots(&self) -> &SnapshotEngine {
        &self.snapshots
    }

    pub fn registry(&self) -> &FilterRegistry {
        &self.registry
    }

    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    /// Number of frames processed so far.
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    /// Names of the enabled filters in the chain, in order.
    pub fn list_filters(&self) -> Vec<String> {
        self.chain
            .iter()
            .filter(|t| self.config.is_enabled(t.name()))
            .map(|t| t.name().to_string())
            .collect()
    }

    /// Drop live snapshots and latched keys; the chain is kept.
    pub fn reset(&mut self) {
        self.events.drain();
        self.events.reset();
        self.snapshots.clear();
        self.failing.clear();
    }

    /// Process one frame through the chain.
    pub fn process_frame(&mut self, raw: Frame) -> Frame {
        self.events.drain();
        let chain = Arc::clone(&self.chain);
        let output = self.apply(raw, &chain);
        self.frame_index += 1;
        output
    }

    /// Feed `frame` through `filters` in order.
    ///
    /// Disabled filters are skipped. A filter that errors or panics is skipped for
    /// this frame only: the frame it received is passed on unchanged.
    pub fn apply(&mut self, frame: Frame, filters: &[Transform]) -> Frame {
        let mut frame = frame;
        for transform in filters {
            let name = transform.name();
            if !self.config.is_enabled(name) {
                continue;
            }

            let mut ctx = FilterContext {
                name,
                config: &self.config,
                events: &self.events,
                snapshots: &mut self.snapshots,
                frame_index: self.frame_index,
            };
            let result = panic::catch_unwind(AssertUnwindSafe(|| transform.apply(&frame, &mut ctx)))
                .unwrap_or_else(|payload| Err(FilterError::Failed(panic_message(payload.as_ref()))));

            match result {
                Ok(next) => {
                    if self.failing.remove(name) {
                        log::info!("filter '{}' recovered at frame {}", name, self.frame_index);
                    }
                    frame = next;
                }
                Err(e) => self.report_failure(name, &e),
            }
        }
        frame
    }

    fn report_failure(&mut self, name: &str, error: &FilterError) {
        if self.failing.insert(name.to_string()) {
            log::warn!(
                "filter '{}' failed at frame {}: {} (passing frame through)",
                name,
                self.frame_index,
                error
            );
        } else {
            log::debug!("filter '{}' failed at frame {}: {}", name, self.frame_index, error);
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panicked: {}", s)
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {}", s)
    } else {
        "panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::builtin_registry;

    fn pipeline(config: &str) -> FilterPipeline {
        FilterPipeline::new(
            Arc::new(builtin_registry()),
            Arc::new(FilterConfig::parse(config).unwrap()),
        )
    }

    #[test]
    fn test_list_filters_skips_disabled() {
        let p = pipeline("[filters.triangulate_effect]\nenabled = false\n");
        assert_eq!(
            p.list_filters(),
            vec!["horizontal_flip", "minimize_colors", "zoom_in_effect"]
        );
    }

    #[test]
    fn test_with_filters_keeps_given_order() {
        let p = FilterPipeline::with_filters(
            Arc::new(builtin_registry()),
            Arc::new(FilterConfig::default()),
            &["zoom_in_effect", "horizontal_flip", "does_not_exist"],
        );
        assert_eq!(p.list_filters(), vec!["zoom_in_effect", "horizontal_flip"]);
    }

    #[test]
    fn test_disabled_filter_is_identity() {
        let mut registry = FilterRegistry::new();
        registry.register("blackout", |f: &Frame, _: &mut FilterContext<'_>| {
            Ok(Frame::filled(f.width, f.height, [0, 0, 0]))
        });
        let config = FilterConfig::parse("[filters.blackout]\nenabled = false\n").unwrap();
        let registry = Arc::new(registry);
        let mut p = FilterPipeline::with_filters(registry.clone(), Arc::new(config), &["blackout"]);

        let frame = Frame::filled(3, 3, [9, 9, 9]);
        let chain = vec![registry.lookup("blackout")];
        assert_eq!(p.apply(frame.clone(), &chain), frame);
        assert_eq!(p.process_frame(frame.clone()), frame);
    }

    #[test]
    fn test_failing_filter_passes_frame_through() {
        let mut registry = FilterRegistry::new();
        registry.register("broken", |_: &Frame, _: &mut FilterContext<'_>| {
            Err(FilterError::Failed("boom".to_string()))
        });
        registry.register("brighten", |f: &Frame, _: &mut FilterContext<'_>| {
            Ok(Frame {
                data: f.data.iter().map(|v| v.saturating_add(1)).collect(),
                width: f.width,
                height: f.height,
            })
        });
        let mut p = FilterPipeline::new(Arc::new(registry), Arc::new(FilterConfig::default()));

        let out = p.process_frame(Frame::filled(2, 2, [10, 10, 10]));
        assert_eq!(out, Frame::filled(2, 2, [11, 11, 11]));
        assert!(p.failing.contains("broken"));
    }

    #[test]
    fn test_panicking_filter_is_contained() {
        let mut registry = FilterRegistry::new();
        registry.register("panics", |_: &Frame, _: &mut FilterContext<'_>| -> Result<Frame, FilterError> {
            panic!("filter bug")
        });
        let mut p = FilterPipeline::new(Arc::new(registry), Arc::new(FilterConfig::default()));

        let frame = Frame::filled(2, 2, [5, 6, 7]);
        assert_eq!(p.process_frame(frame.clone()), frame);
        assert_eq!(p.process_frame(frame.clone()), frame);
        assert_eq!(p.frame_index(), 2);
    }

    #[test]
    fn test_events_reach_zoom_filter_next_frame() {
        let mut p = pipeline("");
        let frame = Frame::filled(8, 8, [50, 50, 50]);

        p.notify_press("space");
        p.process_frame(frame.clone());
        assert!(p.events().is_active("space"));
        assert_eq!(p.snapshots().len(), 1);

        p.notify_release("space");
        p.process_frame(frame);
        assert!(!p.events().is_active("space"));
        assert_eq!(p.snapshots().len(), 1);
    }

    #[test]
    fn test_reset_clears_state() {
        let mut p = pipeline("");
        p.notify_press("space");
        p.process_frame(Frame::filled(4, 4, [1, 1, 1]));
        p.reset();
        assert!(p.snapshots().is_empty());
        assert!(!p.events().is_active("space"));
    }

    #[test]
    fn test_zoom_settings_come_from_config() {
        let p = pipeline("[filters.zoom_in_effect.parameters]\nmax_snapshots = 4\ntrigger_key = \"z\"\n");
        assert_eq!(p.snapshots().settings().max_snapshots, 4);
        assert_eq!(p.snapshots().settings().trigger_key, "z");
    }
}
