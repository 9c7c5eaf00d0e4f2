// SPDX-License-Identifier: MIT OR Apache-2.0
//! Glyphmotion - keyframed particle typography
//!
//! A headless player and capture tool for particle text animations:
//! - Keyframe timeline with transition triggers
//! - Procedural particle deformation and staggered transitions
//! - Effect presets from config
//! - Hot reload of the animation document
//! - Deterministic frame capture to JSON lines
//!
//! ## Architecture
//!
//! The binary owns a [`host::Host`] that ticks the timeline, forwards its
//! events to the particle field and updates the field once per frame. The
//! file watcher is the only other thread; it talks to the frame loop over a
//! channel.

mod app;
mod capture;
mod cli;
mod config;
mod glyphs;
mod host;
mod watcher;

use clap::Parser;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

fn main() {
    let env_filter = tracing_subscriber::EnvFilter::builder()
        .with_default_directive(
            "glyphmotion_app=debug"
                .parse()
                .unwrap_or_else(|_| tracing_subscriber::filter::LevelFilter::INFO.into()),
        )
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!("Starting glyphmotion v{}", env!("CARGO_PKG_VERSION"));

    let cli = cli::Cli::parse();
    if let Err(e) = app::run(cli) {
        tracing::error!("glyphmotion failed: {e}");
        std::process::exit(1);
    }
}
