//! Reload trigger: bring the target app forward and send the reload shortcut.

use std::thread;
use std::time::Duration;

use crate::config::WatchConfig;
use crate::error::TriggerError;
use crate::logger::{log, verbose_log, LogLevel};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Modifier {
    Command,
    Control,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Key {
    Modifier(Modifier),
    Char(char),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyAction {
    Down,
    Up,
}

/// A modifier plus one character key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeyChord {
    pub modifier: Modifier,
    pub key: char,
}

impl KeyChord {
    /// Cmd+R on macOS, Ctrl+R everywhere else.
    pub fn reload() -> Self {
        let modifier = if cfg!(target_os = "macos") {
            Modifier::Command
        } else {
            Modifier::Control
        };
        Self { modifier, key: 'r' }
    }
}

/// Brings an application window to the foreground.
pub trait Activator {
    fn activate(&mut self, app: &str) -> Result<(), TriggerError>;
}

/// Emits one synthetic key transition.
pub trait KeyEventSink {
    fn key_event(&mut self, key: Key, action: KeyAction) -> Result<(), TriggerError>;
}

/// What the watch loop calls when a change qualifies for a reload.
pub trait ReloadTrigger {
    fn reload(&mut self) -> Result<(), TriggerError>;
}

/// Sends `chord` as four discrete transitions with `delay` between them.
///
/// If anything fails once the modifier is down, the modifier is released
/// before the error is returned.
pub fn send_chord<K: KeyEventSink + ?Sized>(
    sink: &mut K,
    chord: KeyChord,
    delay: Duration,
) -> Result<(), TriggerError> {
    let modifier = Key::Modifier(chord.modifier);
    let key = Key::Char(chord.key);

    sink.key_event(modifier, KeyAction::Down)?;
    let rest = [(key, KeyAction::Down), (key, KeyAction::Up)];
    for (k, action) in rest {
        thread::sleep(delay);
        if let Err(e) = sink.key_event(k, action) {
            let _ = sink.key_event(modifier, KeyAction::Up);
            return Err(e);
        }
    }
    thread::sleep(delay);
    sink.key_event(modifier, KeyAction::Up)
}

/// Activates the target app, waits for it to settle, then sends the chord.
pub struct Reloader<A, K> {
    activator: A,
    keys: K,
    app_name: String,
    chord: KeyChord,
    settle_delay: Duration,
    key_delay: Duration,
    verbose: bool,
}

impl<A: Activator, K: KeyEventSink> Reloader<A, K> {
    pub fn new(activator: A, keys: K, config: &WatchConfig) -> Self {
        Self {
            activator,
            keys,
            app_name: config.app_name.clone(),
            chord: KeyChord::reload(),
            settle_delay: config.settle_delay,
            key_delay: config.key_delay,
            verbose: config.verbose,
        }
    }
}

impl<A: Activator, K: KeyEventSink> ReloadTrigger for Reloader<A, K> {
    fn reload(&mut self) -> Result<(), TriggerError> {
        // The app may already be frontmost, so keep going on failure.
        match self.activator.activate(&self.app_name) {
            Ok(()) => verbose_log(
                LogLevel::Debug,
                &format!("Activated {}", self.app_name),
                self.verbose,
            ),
            Err(e) => log(LogLevel::Error, &e.to_string()),
        }
        thread::sleep(self.settle_delay);
        send_chord(&mut self.keys, self.chord, self.key_delay)
    }
}
