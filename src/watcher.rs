use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

use crate::config::WatchConfig;
use crate::error::{TriggerError, WatchError};
use crate::logger::{log, verbose_log, LogLevel};
use crate::tracker::{self, FileSet, Observation, WatchMode, WatchTarget};
use crate::trigger::ReloadTrigger;

/// What happened during one poll cycle.
#[derive(Debug, Default)]
pub struct CycleReport {
    /// Files added to the tracked set by this cycle's rescan
    pub discovered: Vec<PathBuf>,
    /// Files with a strictly newer timestamp
    pub changed: Vec<PathBuf>,
    /// Changed files whose reload was swallowed by the debounce window
    pub suppressed: Vec<PathBuf>,
    /// Files that could not be polled this cycle
    pub skipped: Vec<PathBuf>,
    /// Reloads fired (at most one per debounce window)
    pub reloads: usize,
}

impl CycleReport {
    pub fn is_quiet(&self) -> bool {
        self.discovered.is_empty() && self.changed.is_empty() && self.skipped.is_empty()
    }
}

/// Polls the watch target and fires the reload trigger on changes.
pub struct WatchLoop<T> {
    target: WatchTarget,
    files: FileSet,
    config: WatchConfig,
    trigger: T,
    last_reload: Option<Instant>,
    /// Set when the directory started out with no matching files.
    startup_warning: Option<WatchError>,
    /// False while the last rescan failed.
    dir_available: bool,
}

impl<T: ReloadTrigger> WatchLoop<T> {
    /// Scans the target. A directory without matching files only warns.
    pub fn new(target: WatchTarget, config: WatchConfig, trigger: T) -> Result<Self, WatchError> {
        let files = FileSet::new(tracker::initialize(&target)?);
        let mut startup_warning = None;

        match target.mode() {
            WatchMode::SingleFile => log(
                LogLevel::Info,
                &format!("Watching file: {}", target.path().display()),
            ),
            WatchMode::Directory if files.is_empty() => {
                let warning = WatchError::EmptyDirectory {
                    path: target.path().to_path_buf(),
                };
                log_watch_error(&warning);
                startup_warning = Some(warning);
            }
            WatchMode::Directory => {
                log(
                    LogLevel::Info,
                    &format!(
                        "Watching {} file(s) in {}",
                        files.len(),
                        target.path().display()
                    ),
                );
                for file in files.files() {
                    verbose_log(
                        LogLevel::Debug,
                        &format!("Tracking {}", file.path.display()),
                        config.verbose,
                    );
                }
            }
        }

        Ok(Self {
            target,
            files,
            config,
            trigger,
            last_reload: None,
            startup_warning,
            dir_available: true,
        })
    }

    /// The non-fatal condition found while scanning at startup, if any.
    pub fn startup_warning(&self) -> Option<&WatchError> {
        self.startup_warning.as_ref()
    }

    pub fn files(&self) -> &FileSet {
        &self.files
    }

    #[cfg(test)]
    pub fn trigger(&self) -> &T {
        &self.trigger
    }

    /// Polls forever. Stops only when the process is terminated.
    pub fn run(&mut self) {
        loop {
            thread::sleep(self.config.poll_interval);
            let report = self.poll_cycle(Instant::now());
            if report.is_quiet() {
                continue;
            }
            verbose_log(
                LogLevel::Debug,
                &format!(
                    "Cycle: {} new, {} changed, {} suppressed, {} skipped, {} reload(s), {} tracked",
                    report.discovered.len(),
                    report.changed.len(),
                    report.suppressed.len(),
                    report.skipped.len(),
                    report.reloads,
                    self.files().len(),
                ),
                self.config.verbose,
            );
        }
    }

    /// One pass: rescan (directory mode), poll every file, reload if due.
    pub fn poll_cycle(&mut self, now: Instant) -> CycleReport {
        let mut report = CycleReport::default();
        let verbose = self.config.verbose;

        if self.target.mode() == WatchMode::Directory {
            match tracker::rescan(self.target.path()) {
                Ok(scanned) => {
                    if !self.dir_available {
                        self.dir_available = true;
                        log(
                            LogLevel::Info,
                            &format!("{} is available again", self.target.path().display()),
                        );
                    }
                    for path in self.files.merge(scanned) {
                        log(
                            LogLevel::Info,
                            &format!("New file detected: {}", path.display()),
                        );
                        report.discovered.push(path);
                    }
                }
                Err(e) => {
                    if self.dir_available {
                        self.dir_available = false;
                        log_watch_error(&e);
                    } else {
                        verbose_log(LogLevel::Debug, &e.to_string(), verbose);
                    }
                    report.skipped.push(self.target.path().to_path_buf());
                }
            }
        }

        for file in self.files.files_mut() {
            let current = match tracker::poll_one(file) {
                Ok(current) => current,
                Err(e) => {
                    if file.available {
                        file.available = false;
                        log(
                            LogLevel::Error,
                            &format!("{}; skipping until it is readable again", e),
                        );
                    } else {
                        verbose_log(LogLevel::Debug, &e.to_string(), verbose);
                    }
                    report.skipped.push(file.path.clone());
                    continue;
                }
            };
            if !file.available {
                file.available = true;
                log(
                    LogLevel::Info,
                    &format!("{} is available again", file.path.display()),
                );
            }

            if tracker::observe(file, current) == Observation::Unchanged {
                continue;
            }
            let path = file.path.clone();
            verbose_log(
                LogLevel::Debug,
                &format!("Modified: {}", path.display()),
                verbose,
            );

            if reload_due(self.last_reload, now, self.config.debounce) {
                self.last_reload = Some(now);
                report.reloads += 1;
                log(
                    LogLevel::Info,
                    &format!("{} changed, reloading {}", path.display(), self.config.app_name),
                );
                if let Err(e) = self.trigger.reload() {
                    report_trigger_error(&e);
                }
            } else {
                verbose_log(
                    LogLevel::Debug,
                    &format!("Ignoring change to {} due to debounce", path.display()),
                    verbose,
                );
                report.suppressed.push(path.clone());
            }
            report.changed.push(path);
        }

        report
    }
}

/// Due when nothing has fired yet or the window has strictly elapsed.
fn reload_due(last: Option<Instant>, now: Instant, debounce: Duration) -> bool {
    last.map(|last| now.duration_since(last) > debounce)
        .unwrap_or(true)
}

fn log_watch_error(err: &WatchError) {
    let level = if err.is_fatal() {
        LogLevel::Error
    } else {
        LogLevel::Warn
    };
    log(level, &err.to_string());
}

fn report_trigger_error(err: &TriggerError) {
    log(LogLevel::Error, &err.to_string());
    if let Some(hint) = err.guidance() {
        log(LogLevel::Error, hint);
    }
}
