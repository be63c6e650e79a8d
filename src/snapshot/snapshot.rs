//! A single animated overlay and its tuning knobs.

use crate::config::FilterParams;
use crate::frame::Frame;

/// Largest accepted `max_scale`. Every live snapshot resamples the whole frame at its
/// current scale each tick, so memory grows with the square of this.
pub const MAX_SCALE_LIMIT: f64 = 8.0;

/// Largest accepted `max_snapshots`.
pub const MAX_SNAPSHOTS_LIMIT: usize = 32;

/// Tuning for snapshots, read from the `zoom_in_effect` parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotSettings {
    /// Identifier that spawns snapshots while held
    pub trigger_key: String,
    /// Upper bound on live snapshots
    pub max_snapshots: usize,
    /// Animation time added per tick
    pub scale_speed: f64,
    /// Animation time at which a snapshot is fully faded
    pub total_duration: f64,
    /// Scale reached at the end of the animation
    pub max_scale: f64,
    /// Minimum ticks between spawns while the trigger stays held
    pub spawn_interval: u32,
}

impl Default for SnapshotSettings {
    fn default() -> Self {
        Self {
            trigger_key: "space".to_string(),
            max_snapshots: 10,
            scale_speed: 0.05,
            total_duration: 1.0,
            max_scale: 3.0,
            spawn_interval: 1,
        }
    }
}

impl SnapshotSettings {
    /// Build settings from filter parameters, replacing nonsensical values with defaults.
    pub fn from_params(params: FilterParams<'_>) -> Self {
        let defaults = Self::default();
        let positive = |key: &str, default: f64| {
            let v = params.f64(key, default);
            if v.is_finite() && v > 0.0 {
                v
            } else {
                log::warn!("zoom_in_effect: '{}' must be positive, using {}", key, default);
                default
            }
        };

        let mut max_scale = positive("max_scale", defaults.max_scale).max(1.0);
        if max_scale > MAX_SCALE_LIMIT {
            log::warn!(
                "zoom_in_effect: max_scale {} is above {}, clamping",
                max_scale,
                MAX_SCALE_LIMIT
            );
            max_scale = MAX_SCALE_LIMIT;
        }

        let mut max_snapshots = params.u32("max_snapshots", defaults.max_snapshots as u32) as usize;
        if max_snapshots > MAX_SNAPSHOTS_LIMIT {
            log::warn!(
                "zoom_in_effect: max_snapshots {} is above {}, clamping",
                max_snapshots,
                MAX_SNAPSHOTS_LIMIT
            );
            max_snapshots = MAX_SNAPSHOTS_LIMIT;
        }

        Self {
            trigger_key: params.string("trigger_key", &defaults.trigger_key),
            max_snapshots,
            scale_speed: positive("scale_speed", defaults.scale_speed),
            total_duration: positive("total_duration", defaults.total_duration),
            max_scale,
            spawn_interval: params.u32("spawn_interval", defaults.spawn_interval).max(1),
        }
    }

    /// Number of ticks a snapshot lives: `ceil(total_duration / scale_speed)`.
    pub fn lifetime_ticks(&self) -> u32 {
        ((self.total_duration / self.scale_speed).ceil() as u32).max(1)
    }
}

/// Lifecycle of a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotState {
    /// Spawned, not updated yet
    Created,
    /// Updated at least once and still visible
    Animating,
    /// Fully faded or grown past `max_scale`; terminal
    Expired,
}

/// One zoom-in overlay.
#[derive(Debug, Clone)]
pub struct Snapshot {
    captured_image: Frame,
    scale: f64,
    opacity: f64,
    animation_time: f64,
    total_duration: f64,
    max_scale: f64,
    scale_speed: f64,
    ticks: u32,
    lifetime_ticks: u32,
    state: SnapshotState,
}

impl Snapshot {
    /// Spawn a snapshot of `frame` at scale 1.
    pub fn new(frame: &Frame, settings: &SnapshotSettings) -> Self {
        Self {
            captured_image: frame.clone(),
            scale: 1.0,
            opacity: 1.0,
            animation_time: 0.0,
            total_duration: settings.total_duration,
            max_scale: settings.max_scale,
            scale_speed: settings.scale_speed,
            ticks: 0,
            lifetime_ticks: settings.lifetime_ticks(),
            state: SnapshotState::Created,
        }
    }

    /// Advance one tick and re-sample the live frame at the new scale.
    ///
    /// Returns `false` once the snapshot has expired; an expired snapshot keeps
    /// its last image but must not be drawn.
    pub fn update(&mut self, frame: &Frame) -> bool {
        if self.state == SnapshotState::Expired {
            return false;
        }

        self.ticks += 1;
        self.animation_time = self.ticks as f64 * self.scale_speed;

        let progress = self.progress();
        self.scale = 1.0 + (self.max_scale - 1.0) * progress;
        self.opacity = (1.0 - progress).max(0.0);

        if self.opacity <= 0.0 || self.scale > self.max_scale {
            self.state = SnapshotState::Expired;
            return false;
        }

        self.state = SnapshotState::Animating;
        self.captured_image = frame.scaled(self.scale);
        true
    }

    /// `min(animation_time / total_duration, 1)`.
    ///
    /// Reaches exactly 1 on tick `ceil(total_duration / scale_speed)` and stays below
    /// 1 before it, whatever rounding the float ratio picks up.
    pub fn progress(&self) -> f64 {
        if self.ticks >= self.lifetime_ticks {
            return 1.0;
        }
        (self.animation_time / self.total_duration).clamp(0.0, 1.0 - f64::EPSILON)
    }

    /// Ticks advanced so far.
    pub fn ticks(&self) -> u32 {
        self.ticks
    }

    pub fn captured_image(&self) -> &Frame {
        &self.captured_image
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn opacity(&self) -> f64 {
        self.opacity
    }

    pub fn animation_time(&self) -> f64 {
        self.animation_time
    }

    pub fn state(&self) -> SnapshotState {
        self.state
    }

    pub fn is_expired(&self) -> bool {
        self.state == SnapshotState::Expired
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FilterConfig;

    fn settings(scale_speed: f64, total_duration: f64) -> SnapshotSettings {
        SnapshotSettings {
            scale_speed,
            total_duration,
            ..SnapshotSettings::default()
        }
    }

    #[test]
    fn test_new_snapshot_starts_created_and_opaque() {
        let frame = Frame::filled(4, 4, [10, 10, 10]);
        let snap = Snapshot::new(&frame, &SnapshotSettings::default());
        assert_eq!(snap.state(), SnapshotState::Created);
        assert_eq!(snap.scale(), 1.0);
        assert_eq!(snap.opacity(), 1.0);
        assert_eq!(snap.animation_time(), 0.0);
        assert_eq!(snap.captured_image(), &frame);
    }

    #[test]
    fn test_expires_after_ceil_duration_over_speed_ticks() {
        let frame = Frame::filled(4, 4, [0, 0, 0]);
        let cases = [
            (0.1, 1.0),
            (0.05, 1.0),
            (0.3, 1.0),
            (0.07, 2.5),
            (1.0, 1.0),
            (0.1, 0.3),
            // Ratio just above an integer: 4 ticks, not 3.
            (1.0 / (3.0 + 1e-9), 1.0),
        ];
        for (speed, duration) in cases {
            let s = settings(speed, duration);
            let mut snap = Snapshot::new(&frame, &s);
            let ticks = s.lifetime_ticks();

            for i in 1..ticks {
                assert!(snap.update(&frame), "expired early at tick {} ({}, {})", i, speed, duration);
                assert!(snap.opacity() > 0.0);
            }
            assert!(!snap.update(&frame), "still alive after {} ticks", ticks);
            assert_eq!(snap.ticks(), ticks);
            assert_eq!(snap.opacity(), 0.0);
            assert_eq!(snap.state(), SnapshotState::Expired);
        }
    }

    #[test]
    fn test_scale_is_monotonic_until_expiry() {
        let frame = Frame::filled(4, 4, [0, 0, 0]);
        let mut snap = Snapshot::new(&frame, &settings(0.13, 1.0));
        let mut last = snap.scale();
        while snap.update(&frame) {
            assert!(snap.scale() >= last);
            assert!(snap.scale() <= 3.0);
            last = snap.scale();
        }
    }

    #[test]
    fn test_formulas_follow_progress() {
        let frame = Frame::filled(10, 10, [0, 0, 0]);
        let mut snap = Snapshot::new(&frame, &settings(0.25, 1.0));
        assert!(snap.update(&frame));
        assert!((snap.progress() - 0.25).abs() < 1e-12);
        assert!((snap.scale() - 1.5).abs() < 1e-12);
        assert!((snap.opacity() - 0.75).abs() < 1e-12);
        assert_eq!(snap.state(), SnapshotState::Animating);
        // Re-sampled at scale 1.5
        assert_eq!(snap.captured_image().width, 15);
        assert_eq!(snap.captured_image().height, 15);
    }

    #[test]
    fn test_captured_image_tracks_live_frame() {
        let first = Frame::filled(4, 4, [10, 10, 10]);
        let second = Frame::filled(4, 4, [90, 90, 90]);
        let mut snap = Snapshot::new(&first, &settings(0.1, 1.0));
        snap.update(&second);
        assert!(snap.captured_image().data.iter().all(|&b| b == 90));
    }

    #[test]
    fn test_expired_snapshot_stays_expired() {
        let frame = Frame::filled(2, 2, [0, 0, 0]);
        let mut snap = Snapshot::new(&frame, &settings(1.0, 1.0));
        assert!(!snap.update(&frame));
        assert!(!snap.update(&frame));
        assert!(snap.is_expired());
    }

    #[test]
    fn test_settings_from_params() {
        let config = FilterConfig::parse(
            r#"
            [filters.zoom_in_effect.parameters]
            trigger_key = "enter"
            max_snapshots = 2
            scale_speed = 0.2
            max_scale = 0.5
            total_duration = -1
            "#,
        )
        .unwrap();
        let s = SnapshotSettings::from_params(config.parameters_of("zoom_in_effect"));
        assert_eq!(s.trigger_key, "enter");
        assert_eq!(s.max_snapshots, 2);
        assert_eq!(s.scale_speed, 0.2);
        // A shrinking animation is clamped to no growth.
        assert_eq!(s.max_scale, 1.0);
        assert_eq!(s.total_duration, 1.0);
        assert_eq!(s.lifetime_ticks(), 5);
    }

    #[test]
    fn test_near_integer_ratio_lives_four_ticks() {
        let s = settings(1.0 / (3.0 + 1e-9), 1.0);
        assert_eq!(s.lifetime_ticks(), 4);
        let frame = Frame::filled(2, 2, [0, 0, 0]);
        let mut snap = Snapshot::new(&frame, &s);
        for _ in 0..3 {
            assert!(snap.update(&frame));
        }
        assert!(snap.opacity() > 0.0);
        assert!(!snap.update(&frame));
        assert_eq!(snap.opacity(), 0.0);
    }

    #[test]
    fn test_huge_max_scale_is_clamped() {
        let config = FilterConfig::parse(
            "[filters.zoom_in_effect.parameters]\nmax_scale = 500\nmax_snapshots = 10000\n",
        )
        .unwrap();
        let s = SnapshotSettings::from_params(config.parameters_of("zoom_in_effect"));
        assert_eq!(s.max_scale, MAX_SCALE_LIMIT);
        assert_eq!(s.max_snapshots, MAX_SNAPSHOTS_LIMIT);

        // The largest resample any snapshot asks for is bounded by the clamp.
        let frame = Frame::filled(64, 48, [1, 2, 3]);
        let mut snap = Snapshot::new(&frame, &s);
        let mut largest = 0;
        while snap.update(&frame) {
            largest = largest.max(snap.captured_image().data.len());
        }
        let limit = (64.0 * MAX_SCALE_LIMIT) as usize * (48.0 * MAX_SCALE_LIMIT) as usize * 3;
        assert!(largest > 0 && largest <= limit);
    }

    #[test]
    fn test_first_update_grows_from_unit_scale() {
        let frame = Frame::filled(10, 10, [7, 7, 7]);
        let s = settings(0.1, 1.0);
        let mut snap = Snapshot::new(&frame, &s);
        assert_eq!(snap.captured_image(), &frame);
        assert!(snap.update(&frame));
        assert!((snap.scale() - 1.2).abs() < 1e-12);
        assert_eq!(snap.captured_image().width, 12);
    }
}
