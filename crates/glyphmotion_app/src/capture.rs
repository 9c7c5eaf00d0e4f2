// SPDX-License-Identifier: MIT OR Apache-2.0
//! Deterministic frame capture to JSON lines.

use crate::host::Host;
use glyphmotion_field::Noise3;
use serde::Serialize;
use std::io::Write;
use std::time::{Duration, Instant};

/// How capture advances the timeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum CaptureMode {
    /// Seek to each frame time; transition keyframes do not fire
    #[default]
    Seek,
    /// Play with synthetic frame instants so transitions fire as in playback
    Playback,
}

/// Capture settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CaptureOptions {
    /// Frames per second
    pub fps: f64,
    /// Seconds to capture, the timeline duration when `None`
    pub duration: Option<f64>,
    /// Timeline driving mode
    pub mode: CaptureMode,
}

/// One captured frame
#[derive(Debug, Serialize)]
pub struct CapturedFrame<'a> {
    /// Frame number from 0
    pub frame: u32,
    /// Timeline time of the frame
    pub time: f64,
    /// Particles not parked out of view
    pub visible: usize,
    /// Display positions
    pub positions: &'a [[f32; 3]],
}

/// Errors during capture
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    /// Writing output failed
    #[error("Failed to write frame: {0}")]
    Io(#[from] std::io::Error),

    /// Encoding a frame failed
    #[error("Failed to encode frame: {0}")]
    Json(#[from] serde_json::Error),
}

/// Number of frames covering `duration` seconds
pub fn frame_count(duration: f64, fps: f64) -> u32 {
    (duration * fps).ceil().max(0.0) as u32
}

/// Capture frames from the start of the timeline, one JSON object per line.
/// Returns the number of frames written.
pub fn capture<N: Noise3, W: Write>(
    host: &mut Host<N>,
    options: CaptureOptions,
    out: &mut W,
) -> Result<u32, CaptureError> {
    let duration = options
        .duration
        .unwrap_or_else(|| f64::from(host.timeline().duration()));
    let total = frame_count(duration, options.fps);
    let step = 1.0 / options.fps;

    tracing::info!(
        "Capturing {total} frames at {} fps ({:?})",
        options.fps,
        options.mode
    );

    host.timeline_mut().stop();
    let base = Instant::now();
    if options.mode == CaptureMode::Playback {
        host.timeline_mut().play();
        host.frame_at(base);
    }

    for frame in 0..total {
        let time = f64::from(frame) * step;
        let report = match options.mode {
            CaptureMode::Seek => host.capture_frame(time),
            CaptureMode::Playback => host.frame_at(base + Duration::from_secs_f64(time)),
        };

        let positions = host.field().positions();
        let visible = positions
            .iter()
            .filter(|p| **p != glyphmotion_field::HIDDEN_POSITION)
            .count();
        let record = CapturedFrame {
            frame,
            time: report.time,
            visible,
            positions,
        };
        serde_json::to_writer(&mut *out, &record)?;
        out.write_all(b"\n")?;
        host.field_mut().clear_dirty();

        if frame % 60 == 0 {
            tracing::debug!("Captured frame {frame}/{total}");
        }
    }

    out.flush()?;
    Ok(total)
}
