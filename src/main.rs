use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use config::WatchConfig;
use platform::SystemDesktop;
use tracker::WatchTarget;
use trigger::Reloader;
use watcher::WatchLoop;

mod config;
mod error;
mod logger;
mod platform;
mod tracker;
mod trigger;
mod watcher;

/// Reload PICO-8 whenever a watched cart or Lua file changes
#[derive(Parser, Debug)]
#[command(name = "p8watch", version, about, long_about = None)]
#[command(disable_help_flag = true, disable_version_flag = true)]
struct Cli {
    /// A single file, or a directory whose .lua and .p8 files are watched
    path: Option<PathBuf>,
}

fn usage() -> String {
    let name = Cli::command().get_name().to_string();
    format!(
        "Usage: {name} <path>\n\n\
         Examples:\n  \
         {name} game.p8      watch a single cart\n  \
         {name} ./src        watch every .lua and .p8 file in a directory"
    )
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let Some(path) = cli.path else {
        eprintln!("{}", usage());
        std::process::exit(1);
    };

    let config = WatchConfig::default();
    let target = WatchTarget::inspect(&path)?;
    let reloader = Reloader::new(SystemDesktop::detect(), SystemDesktop::detect(), &config);
    let mut watch = WatchLoop::new(target, config, reloader)
        .with_context(|| format!("Failed to start watching {}", path.display()))?;

    watch.run();
    Ok(())
}
