use std::time::Duration;

/// Poll cadence in milliseconds
pub const POLL_INTERVAL_MS: u64 = 50;
/// Minimum gap between two reloads in milliseconds
pub const DEBOUNCE_MS: u64 = 100;
/// Pause after activation before sending keys, in milliseconds
pub const SETTLE_DELAY_MS: u64 = 700;
/// Pause between individual key transitions, in milliseconds
pub const KEY_DELAY_MS: u64 = 30;

/// Application that receives the reload shortcut.
pub const TARGET_APP: &str = "PICO-8";

/// Extensions picked up in directory mode. Matched case-sensitively.
pub const WATCHED_EXTENSIONS: [&str; 2] = ["lua", "p8"];

/// Timing and target settings for a watch session.
///
/// There is no config file; `main` uses [`WatchConfig::default`] and tests
/// override individual fields. `verbose` is off in the shipped binary since
/// there are no flags; it only turns on `DEBUG` lines for embedders and
/// tests that construct their own config.
#[derive(Clone, Debug)]
pub struct WatchConfig {
    pub poll_interval: Duration,
    pub debounce: Duration,
    pub settle_delay: Duration,
    pub key_delay: Duration,
    pub app_name: String,
    pub verbose: bool,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(POLL_INTERVAL_MS),
            debounce: Duration::from_millis(DEBOUNCE_MS),
            settle_delay: Duration::from_millis(SETTLE_DELAY_MS),
            key_delay: Duration::from_millis(KEY_DELAY_MS),
            app_name: TARGET_APP.to_string(),
            verbose: false,
        }
    }
}
