//! Latched input state (keys currently held down).
//!
//! The input hook runs on its own thread and must never block on the frame
//! thread, so it only pushes [`InputEvent`]s into a bounded queue through an
//! [`EventSink`]. The pipeline owns the [`EventState`] and drains the channel once
//! per tick before any filter runs; filters then read a consistent set for the
//! whole tick.

use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

/// Default capacity of the input queue between the hook thread and the pipeline.
pub const DEFAULT_QUEUE_CAPACITY: usize = 256;

/// A discrete input notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    /// Identifier went down
    Press(String),
    /// Identifier went up
    Release(String),
    /// Forget every held identifier
    Reset,
}

/// Pending events plus the sink-side view of which identifiers are down.
#[derive(Debug)]
struct Queue {
    events: VecDeque<InputEvent>,
    capacity: usize,
    /// Identifiers whose press was queued and whose release was not.
    held: HashSet<String>,
}

impl Queue {
    fn new(capacity: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(capacity),
            capacity,
            held: HashSet::new(),
        }
    }

    fn is_full(&self) -> bool {
        self.events.len() >= self.capacity
    }

    /// Presses of an identifier already down are coalesced (key autorepeat) and are
    /// the only events ever dropped. Releases and resets always get queued.
    fn push(&mut self, event: InputEvent) {
        match event {
            InputEvent::Press(id) => {
                if self.held.contains(&id) {
                    return;
                }
                if self.is_full() {
                    log::warn!("input queue full, dropping press of '{}'", id);
                    return;
                }
                self.held.insert(id.clone());
                self.events.push_back(InputEvent::Press(id));
            }
            InputEvent::Release(id) => {
                // A release without a queued press has nothing to undo.
                if !self.held.remove(&id) {
                    return;
                }
                if self.is_full() {
                    self.evict_oldest_press();
                }
                self.events.push_back(InputEvent::Release(id));
            }
            InputEvent::Reset => {
                self.events.clear();
                self.held.clear();
                self.events.push_back(InputEvent::Reset);
            }
        }
    }

    /// Make room for a release by giving up the oldest pending press.
    fn evict_oldest_press(&mut self) {
        let pos = self
            .events
            .iter()
            .position(|e| matches!(e, InputEvent::Press(_)));
        if let Some(InputEvent::Press(id)) = pos.and_then(|p| self.events.remove(p)) {
            log::warn!("input queue full, dropping press of '{}'", id);
            self.held.remove(&id);
        }
    }
}

fn lock(queue: &Mutex<Queue>) -> MutexGuard<'_, Queue> {
    queue.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Cloneable, non-blocking handle used by input sources.
#[derive(Debug, Clone)]
pub struct EventSink {
    queue: Weak<Mutex<Queue>>,
}

impl EventSink {
    /// Report that `id` went down.
    pub fn notify_press(&self, id: impl Into<String>) {
        self.send(InputEvent::Press(id.into()));
    }

    /// Report that `id` went up.
    pub fn notify_release(&self, id: impl Into<String>) {
        self.send(InputEvent::Release(id.into()));
    }

    /// Ask the owner to clear all held identifiers.
    pub fn notify_reset(&self) {
        self.send(InputEvent::Reset);
    }

    /// Fire-and-forget. Once the owning state is dropped events have nobody to go to.
    fn send(&self, event: InputEvent) {
        if let Some(queue) = self.queue.upgrade() {
            lock(&queue).push(event);
        }
    }
}

/// Set of identifiers currently held down.
#[derive(Debug, Default)]
pub struct EventState {
    active: HashSet<String>,
    queue: Option<Arc<Mutex<Queue>>>,
}

impl EventState {
    /// Standalone state with no input queue attached.
    pub fn new() -> Self {
        Self::default()
    }

    /// State fed by a bounded queue; the returned sink is handed to input sources.
    pub fn with_queue(capacity: usize) -> (Self, EventSink) {
        let queue = Arc::new(Mutex::new(Queue::new(capacity.max(1))));
        let sink = EventSink {
            queue: Arc::downgrade(&queue),
        };
        let state = Self {
            active: HashSet::new(),
            queue: Some(queue),
        };
        (state, sink)
    }

    /// Mark `id` as held. Idempotent.
    pub fn on_press(&mut self, id: &str) {
        if !self.active.contains(id) {
            self.active.insert(id.to_string());
        }
    }

    /// Mark `id` as released. No-op if it was not held.
    pub fn on_release(&mut self, id: &str) {
        self.active.remove(id);
    }

    /// Whether `id` is currently held.
    pub fn is_active(&self, id: &str) -> bool {
        self.active.contains(id)
    }

    /// Release everything, including events still waiting in the queue.
    pub fn reset(&mut self) {
        self.active.clear();
        if let Some(queue) = &self.queue {
            let mut queue = lock(queue);
            queue.events.clear();
            queue.held.clear();
        }
    }

    /// Currently held identifiers, sorted.
    pub fn active(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.active.iter().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Apply a single event.
    pub fn apply(&mut self, event: &InputEvent) {
        match event {
            InputEvent::Press(id) => self.on_press(id),
            InputEvent::Release(id) => self.on_release(id),
            // The queue already forgot its held set when the reset was pushed.
            InputEvent::Reset => self.active.clear(),
        }
    }

    /// Apply every queued event in arrival order. Returns how many were applied.
    pub fn drain(&mut self) -> usize {
        let events = match &self.queue {
            Some(queue) => std::mem::take(&mut lock(queue).events),
            None => return 0,
        };
        for event in &events {
            self.apply(event);
        }
        events.len()
    }
}
