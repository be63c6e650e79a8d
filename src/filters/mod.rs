//! Built-in filters.
//!
//! Each filter is a plain function registered under a fixed name by
//! [`register_builtin_filters`]. Per-filter tuning comes from the `parameters`
//! table of the filter's config entry.

mod basic;
mod triangulate;
mod zoom;

pub use basic::{horizontal_flip, minimize_colors};
pub use triangulate::triangulate_effect;
pub use zoom::zoom_in_effect;

use crate::registry::FilterRegistry;

pub const HORIZONTAL_FLIP: &str = "horizontal_flip";
pub const MINIMIZE_COLORS: &str = "minimize_colors";
pub const TRIANGULATE_EFFECT: &str = "triangulate_effect";
pub const ZOOM_IN_EFFECT: &str = "zoom_in_effect";

/// Register every built-in filter, in chain order.
pub fn register_builtin_filters(registry: &mut FilterRegistry) {
    registry.register(HORIZONTAL_FLIP, horizontal_flip);
    registry.register(MINIMIZE_COLORS, minimize_colors);
    registry.register(TRIANGULATE_EFFECT, triangulate_effect);
    registry.register(ZOOM_IN_EFFECT, zoom_in_effect);
}

/// A registry holding just the built-in filters.
pub fn builtin_registry() -> FilterRegistry {
    let mut registry = FilterRegistry::new();
    register_builtin_filters(&mut registry);
    registry
}
