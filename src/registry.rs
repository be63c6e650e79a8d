//! Named frame transforms and the registry that holds them.
//!
//! Filters are registered explicitly at startup (see
//! [`crate::filters::register_builtin_filters`]). The registry is read-only once built
//! and is shared between streams behind an `Arc`.

use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Mutex};

use crate::config::{FilterConfig, FilterParams};
use crate::events::EventState;
use crate::frame::Frame;
use crate::snapshot::SnapshotEngine;

/// Per-tick view handed to a transform.
///
/// Everything a filter may read or touch lives here; filters keep no state of
/// their own between frames.
pub struct FilterContext<'a> {
    /// Name the transform was registered under
    pub name: &'a str,
    pub config: &'a FilterConfig,
    pub events: &'a EventState,
    /// Snapshot engine owned by the running pipeline
    pub snapshots: &'a mut SnapshotEngine,
    /// Index of the frame being processed
    pub frame_index: u64,
}

impl<'a> FilterContext<'a> {
    /// Parameters configured for this filter.
    pub fn params(&self) -> FilterParams<'a> {
        self.config.parameters_of(self.name)
    }
}

/// Failure reported by a transform. The pipeline treats it as identity for that tick.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FilterError {
    #[error("invalid parameter '{key}': {reason}")]
    InvalidParameter { key: String, reason: String },

    #[error("unsupported frame {width}x{height}: {reason}")]
    UnsupportedFrame {
        width: u32,
        height: u32,
        reason: String,
    },

    #[error("{0}")]
    Failed(String),
}

/// Signature of a frame transform.
pub type TransformFn =
    dyn Fn(&Frame, &mut FilterContext<'_>) -> Result<Frame, FilterError> + Send + Sync;

/// A named, cheaply cloneable transform.
#[derive(Clone)]
pub struct Transform {
    name: Arc<str>,
    func: Arc<TransformFn>,
}

impl fmt::Debug for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transform").field("name", &self.name).finish_non_exhaustive()
    }
}

impl Transform {
    pub fn new<F>(name: &str, func: F) -> Self
    where
        F: Fn(&Frame, &mut FilterContext<'_>) -> Result<Frame, FilterError> + Send + Sync + 'static,
    {
        Self {
            name: Arc::from(name),
            func: Arc::new(func),
        }
    }

    /// Pass-through transform used in place of unknown filters.
    pub fn identity(name: &str) -> Self {
        Self::new(name, |frame, _| Ok(frame.clone()))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run the transform.
    pub fn apply(&self, frame: &Frame, ctx: &mut FilterContext<'_>) -> Result<Frame, FilterError> {
        (self.func)(frame, ctx)
    }
}

/// Ordered name → transform mapping.
#[derive(Debug, Default)]
pub struct FilterRegistry {
    entries: Vec<Transform>,
    /// Unknown names already reported, so each is logged once per run.
    reported_missing: Mutex<HashSet<String>>,
}

impl FilterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `func` under `name`.
    ///
    /// Re-registering a name replaces its transform (last registration wins) but
    /// keeps its original position in the chain.
    pub fn register<F>(&mut self, name: &str, func: F)
    where
        F: Fn(&Frame, &mut FilterContext<'_>) -> Result<Frame, FilterError> + Send + Sync + 'static,
    {
        let transform = Transform::new(name, func);
        match self.entries.iter_mut().find(|t| t.name() == name) {
            Some(existing) => {
                log::debug!("filter '{}' re-registered, replacing previous transform", name);
                *existing = transform;
            }
            None => self.entries.push(transform),
        }
    }

    /// Exact lookup without fallback.
    pub fn get(&self, name: &str) -> Option<&Transform> {
        self.entries.iter().find(|t| t.name() == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Look up a filter, substituting identity when it is not registered.
    pub fn lookup(&self, name: &str) -> Transform {
        match self.get(name) {
            Some(t) => t.clone(),
            None => {
                self.report_missing(name);
                Transform::identity(name)
            }
        }
    }

    /// Resolve a list of names in the given order, skipping unknown ones.
    pub fn lookup_list<S: AsRef<str>>(&self, names: &[S]) -> Vec<Transform> {
        names
            .iter()
            .filter_map(|name| {
                let name = name.as_ref();
                let found = self.get(name).cloned();
                if found.is_none() {
                    self.report_missing(name);
                }
                found
            })
            .collect()
    }

    /// Registered filters the config leaves enabled, in registration order.
    pub fn enabled_filters(&self, config: &FilterConfig) -> Vec<Transform> {
        self.entries
            .iter()
            .filter(|t| config.is_enabled(t.name()))
            .cloned()
            .collect()
    }

    /// All registered names, in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(Transform::name).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Log a `FilterNotFound` warning the first time `name` is seen.
    /// Returns whether this call logged.
    fn report_missing(&self, name: &str) -> bool {
        let first = match self.reported_missing.lock() {
            Ok(mut seen) => seen.insert(name.to_string()),
            // A poisoned set only costs us the dedup.
            Err(poisoned) => poisoned.into_inner().insert(name.to_string()),
        };
        if first {
            log::warn!("Filter '{}' not found, passing frames through unchanged", name);
        }
        first
    }
}
