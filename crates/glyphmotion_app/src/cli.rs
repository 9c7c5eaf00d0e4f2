// SPDX-License-Identifier: MIT OR Apache-2.0
//! Command-line interface.

use crate::capture::CaptureMode;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "glyphmotion")]
#[command(about = "Keyframed particle typography player", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (defaults to ./glyphmotion.ron when present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Text to render, overrides the config
    #[arg(short, long, global = true)]
    pub text: Option<String>,

    /// Effect preset to apply at startup, overrides the config
    #[arg(short, long, global = true)]
    pub preset: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Play an animation in real time, reloading it when the file changes
    Play {
        /// Animation document (JSON)
        animation: Option<PathBuf>,

        /// Stop after this many frames
        #[arg(long)]
        frames: Option<u64>,

        /// Disable reloading on file changes
        #[arg(long)]
        no_watch: bool,
    },

    /// Capture frames deterministically as JSON lines
    Capture {
        /// Animation document (JSON)
        animation: Option<PathBuf>,

        /// Output file, stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Frames per second, overrides the config
        #[arg(long)]
        fps: Option<f64>,

        /// Seconds to capture, the timeline duration when omitted
        #[arg(long)]
        duration: Option<f64>,

        /// How the timeline is advanced
        #[arg(long, value_enum, default_value_t = CaptureMode::Seek)]
        mode: CaptureMode,
    },

    /// List built-in and configured presets
    Presets,

    /// Write a config file with default settings
    Init {
        /// Destination (defaults to ./glyphmotion.ron)
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}
