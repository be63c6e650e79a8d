//! Global key listener feeding press/release events into a pipeline.
//!
//! Uses rdev for cross-platform global key listening. On macOS the process needs
//! Accessibility permission, otherwise the listener thread logs an error and exits.

use rdev::{listen, Event, EventType, Key};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::events::EventSink;

/// Errors from the key listener.
#[derive(Debug, thiserror::Error)]
pub enum HotkeyError {
    #[error("key listener already running")]
    AlreadyRunning,

    #[error("key listener was stopped and cannot be restarted")]
    Stopped,

    #[error("failed to spawn key listener thread: {0}")]
    SpawnFailed(#[from] std::io::Error),
}

/// Forwards global key presses and releases to an [`EventSink`].
pub struct KeyListener {
    sink: EventSink,
    /// Flag to stop forwarding events
    stop_flag: Arc<AtomicBool>,
    /// Handle to the listener thread
    listener_thread: Option<JoinHandle<()>>,
    /// Set once a started listener is stopped; its hook thread stays parked
    stopped: bool,
}

impl KeyListener {
    pub fn new(sink: EventSink) -> Self {
        KeyListener {
            sink,
            stop_flag: Arc::new(AtomicBool::new(false)),
            listener_thread: None,
            stopped: false,
        }
    }

    /// Start listening for global key events on a background thread.
    ///
    /// A listener can only be started once. After [`KeyListener::stop`] the old hook
    /// thread is still parked in the OS and would resume forwarding if restarted.
    pub fn start(&mut self) -> Result<(), HotkeyError> {
        if self.listener_thread.is_some() {
            return Err(HotkeyError::AlreadyRunning);
        }
        if self.stopped {
            return Err(HotkeyError::Stopped);
        }

        let sink = self.sink.clone();
        let stop_flag = self.stop_flag.clone();

        let handle = thread::Builder::new()
            .name("key-listener".to_string())
            .spawn(move || {
                let callback = move |event: Event| {
                    if stop_flag.load(Ordering::SeqCst) {
                        return;
                    }
                    forward(&sink, &event.event_type);
                };

                // Blocks for the lifetime of the process unless the hook fails.
                if let Err(e) = listen(callback) {
                    log::error!("key listener error: {:?}", e);
                }
            })?;

        self.listener_thread = Some(handle);
        log::info!("key listener started");
        Ok(())
    }

    /// Stop forwarding events.
    pub fn stop(&mut self) {
        self.stop_flag.store(true, Ordering::SeqCst);
        // rdev's listen() can't be interrupted; the thread stays parked in the OS hook
        // until the process exits, it just stops forwarding.
        if self.listener_thread.take().is_some() {
            self.stopped = true;
            self.sink.notify_reset();
        }
    }

    pub fn is_running(&self) -> bool {
        self.listener_thread.is_some()
    }
}

impl Drop for KeyListener {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Translate one rdev event into sink calls. Mouse and wheel events are ignored.
fn forward(sink: &EventSink, event_type: &EventType) {
    match event_type {
        EventType::KeyPress(key) => sink.notify_press(key_name(*key)),
        EventType::KeyRelease(key) => sink.notify_release(key_name(*key)),
        _ => {}
    }
}

/// Stable identifier for a key, as used for `trigger_key` in the config.
pub fn key_name(key: Key) -> String {
    let name = match key {
        Key::Space => "space",
        Key::Return => "enter",
        Key::KpReturn => "kp_enter",
        Key::Escape => "esc",
        Key::Tab => "tab",
        Key::Backspace => "backspace",
        Key::ShiftLeft => "shift_left",
        Key::ShiftRight => "shift_right",
        Key::ControlLeft => "ctrl_left",
        Key::ControlRight => "ctrl_right",
        Key::Alt => "alt",
        Key::AltGr => "alt_gr",
        Key::MetaLeft => "meta_left",
        Key::MetaRight => "meta_right",
        Key::UpArrow => "up",
        Key::DownArrow => "down",
        Key::LeftArrow => "left",
        Key::RightArrow => "right",
        Key::KeyA => "a",
        Key::KeyB => "b",
        Key::KeyC => "c",
        Key::KeyD => "d",
        Key::KeyE => "e",
        Key::KeyF => "f",
        Key::KeyG => "g",
        Key::KeyH => "h",
        Key::KeyI => "i",
        Key::KeyJ => "j",
        Key::KeyK => "k",
        Key::KeyL => "l",
        Key::KeyM => "m",
        Key::KeyN => "n",
        Key::KeyO => "o",
        Key::KeyP => "p",
        Key::KeyQ => "q",
        Key::KeyR => "r",
        Key::KeyS => "s",
        Key::KeyT => "t",
        Key::KeyU => "u",
        Key::KeyV => "v",
        Key::KeyW => "w",
        Key::KeyX => "x",
        Key::KeyY => "y",
        Key::KeyZ => "z",
        Key::Num0 => "0",
        Key::Num1 => "1",
        Key::Num2 => "2",
        Key::Num3 => "3",
        Key::Num4 => "4",
        Key::Num5 => "5",
        Key::Num6 => "6",
        Key::Num7 => "7",
        Key::Num8 => "8",
        Key::Num9 => "9",
        Key::Unknown(code) => return format!("unknown_{}", code),
        other => return format!("{:?}", other).to_lowercase(),
    };
    name.to_string()
}
