// SPDX-License-Identifier: MIT OR Apache-2.0
//! Command dispatch.

use crate::capture::{self, CaptureError, CaptureMode, CaptureOptions};
use crate::cli::{Cli, Commands};
use crate::config::{validate_fps, AppConfig, ConfigError, CONFIG_FILE_NAME};
use crate::glyphs::{FontError, GridFont};
use crate::host::Host;
use crate::watcher::AnimationWatcher;
use glyphmotion_field::builtin_presets;
use glyphmotion_sequencer::DocumentError;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Errors that end the program
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Configuration could not be loaded
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Font could not be loaded
    #[error(transparent)]
    Font(#[from] FontError),

    /// Animation document could not be read
    #[error("Failed to read animation {path}: {source}")]
    Io {
        /// Document path
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// Animation document is malformed
    #[error("Invalid animation {path}: {source}")]
    Document {
        /// Document path
        path: PathBuf,
        /// Underlying error
        source: DocumentError,
    },

    /// File watching could not start
    #[error("File watcher error: {0}")]
    Watch(#[from] notify::Error),

    /// Capture failed
    #[error(transparent)]
    Capture(#[from] CaptureError),

    /// Refusing to overwrite a file
    #[error("{0} already exists, use --force to overwrite")]
    AlreadyExists(PathBuf),

    /// Preset name not found
    #[error("Unknown preset: {0}")]
    UnknownPreset(String),

    /// Writing command output failed
    #[error("Output error: {0}")]
    Output(#[from] std::io::Error),
}

/// Run the parsed command line
pub fn run(cli: Cli) -> Result<(), AppError> {
    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;
    if let Some(text) = cli.text {
        config.text = text;
    }
    if let Some(preset) = cli.preset {
        config.preset = Some(preset);
    }

    match cli.command {
        Commands::Play {
            animation,
            frames,
            no_watch,
        } => play(&config, animation.as_deref(), frames, !no_watch),
        Commands::Capture {
            animation,
            output,
            fps,
            duration,
            mode,
        } => {
            let options = capture_options(&config, fps, duration, mode)?;
            run_capture(&config, animation.as_deref(), output.as_deref(), options)
        }
        Commands::Presets => list_presets(&config),
        Commands::Init { path, force } => {
            init_config(path.as_deref().unwrap_or(Path::new(CONFIG_FILE_NAME)), force)
        }
    }
}

/// Build a host with text, font and startup preset from the config
fn build_host(config: &AppConfig) -> Result<Host, AppError> {
    let font = match &config.font {
        Some(path) => GridFont::load(path)?,
        None => GridFont::block(),
    };
    tracing::debug!("Using font {}", font.name());
    let mut host = Host::new(config);
    host.load_text(&font, &config.text);

    if let Some(name) = &config.preset {
        let preset = config
            .find_preset(name)
            .ok_or_else(|| AppError::UnknownPreset(name.clone()))?;
        host.apply_preset(name, &preset);
    }
    Ok(host)
}

fn load_animation(host: &mut Host, path: &Path) -> Result<(), AppError> {
    let json = std::fs::read_to_string(path).map_err(|source| AppError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    host.load_animation(&json)
        .map_err(|source| AppError::Document {
            path: path.to_path_buf(),
            source,
        })?;
    tracing::info!("Loaded animation {}", path.display());
    Ok(())
}

fn play(
    config: &AppConfig,
    animation: Option<&Path>,
    max_frames: Option<u64>,
    watch: bool,
) -> Result<(), AppError> {
    let mut host = build_host(config)?;
    if let Some(path) = animation {
        load_animation(&mut host, path)?;
    }

    let watcher = match animation {
        Some(path) if watch => Some(AnimationWatcher::new(path, config.reload_debounce())?),
        _ => None,
    };

    let interval = config.frame_interval();
    host.timeline_mut().play();
    tracing::info!(
        "Playing {}s timeline at {} fps",
        host.timeline().duration(),
        config.fps
    );

    let mut frame: u64 = 0;
    let mut last_second = None;
    loop {
        let started = Instant::now();

        if let Some(watcher) = &watcher {
            if watcher.take_changed() {
                reload(&mut host, watcher.path());
            }
        }

        let report = host.frame();
        host.field_mut().clear_dirty();
        frame += 1;

        let second = report.time.floor() as u64;
        if last_second != Some(second) {
            last_second = Some(second);
            tracing::debug!(
                "t={:.2}s visible={} transitioning={}",
                report.time,
                host.field().default_visible(),
                host.field().is_transitioning()
            );
        }

        if report.ended || max_frames.is_some_and(|max| frame >= max) {
            break;
        }

        let elapsed = started.elapsed();
        if elapsed < interval {
            std::thread::sleep(interval - elapsed);
        }
    }

    tracing::info!("Played {frame} frames");
    Ok(())
}

/// Re-import the animation, keeping the current one on failure
fn reload(host: &mut Host, path: &Path) {
    match load_animation(host, path) {
        Ok(()) => host.timeline_mut().play(),
        Err(e) => tracing::error!("Reload failed, keeping current animation: {e}"),
    }
}

/// Resolve capture settings, checking the frame rate override
fn capture_options(
    config: &AppConfig,
    fps: Option<f64>,
    duration: Option<f64>,
    mode: CaptureMode,
) -> Result<CaptureOptions, AppError> {
    let fps = fps.unwrap_or(config.fps);
    validate_fps(fps)?;
    Ok(CaptureOptions {
        fps,
        duration,
        mode,
    })
}

fn run_capture(
    config: &AppConfig,
    animation: Option<&Path>,
    output: Option<&Path>,
    options: CaptureOptions,
) -> Result<(), AppError> {
    let mut host = build_host(config)?;
    if let Some(path) = animation {
        load_animation(&mut host, path)?;
    }
    if options.mode == CaptureMode::Playback && host.timeline().is_looping() {
        host.timeline_mut().set_looping(false);
    }

    let frames = match output {
        Some(path) => {
            let file = std::fs::File::create(path).map_err(|source| AppError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            capture::capture(&mut host, options, &mut BufWriter::new(file))?
        }
        None => capture::capture(&mut host, options, &mut std::io::stdout().lock())?,
    };

    tracing::info!("Wrote {frames} frames");
    Ok(())
}

fn list_presets(config: &AppConfig) -> Result<(), AppError> {
    let mut out = std::io::stdout().lock();
    writeln!(out, "Built-in presets:")?;
    for (name, _) in builtin_presets() {
        writeln!(out, "  {name}")?;
    }
    if !config.presets.is_empty() {
        writeln!(out, "Configured presets:")?;
        for name in config.presets.keys() {
            writeln!(out, "  {name}")?;
        }
    }
    Ok(())
}

fn init_config(path: &Path, force: bool) -> Result<(), AppError> {
    if path.exists() && !force {
        return Err(AppError::AlreadyExists(path.to_path_buf()));
    }
    AppConfig::default().save(path)?;
    tracing::info!("Wrote default config to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_preset_is_an_error() {
        let config = AppConfig {
            preset: Some("Sparkle".to_string()),
            ..AppConfig::default()
        };
        assert!(matches!(build_host(&config), Err(AppError::UnknownPreset(_))));
    }

    #[test]
    fn test_capture_fps_override_is_validated() {
        let config = AppConfig::default();
        let options = capture_options(&config, None, Some(2.0), CaptureMode::Seek).unwrap();
        assert_eq!(options.fps, config.fps);
        let options = capture_options(&config, Some(30.0), None, CaptureMode::Playback).unwrap();
        assert_eq!(options.fps, 30.0);

        for fps in [0.0, -1.0, f64::INFINITY, f64::NAN] {
            assert!(matches!(
                capture_options(&config, Some(fps), None, CaptureMode::Seek),
                Err(AppError::Config(ConfigError::InvalidFps(_)))
            ));
        }
    }

    #[test]
    fn test_init_config_refuses_overwrite() {
        let dir = std::env::temp_dir().join(format!("glyphmotion-init-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(CONFIG_FILE_NAME);

        init_config(&path, false).unwrap();
        assert_eq!(AppConfig::load(&path).unwrap(), AppConfig::default());
        assert!(matches!(init_config(&path, false), Err(AppError::AlreadyExists(_))));
        init_config(&path, true).unwrap();
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_missing_animation_file() {
        let mut host = build_host(&AppConfig::default()).unwrap();
        let err = load_animation(&mut host, Path::new("/nonexistent/animation.json")).unwrap_err();
        assert!(matches!(err, AppError::Io { .. }));
    }

    #[test]
    fn test_reload_keeps_state_on_bad_document() {
        let dir = std::env::temp_dir().join(format!("glyphmotion-reload-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("animation.json");

        let mut host = build_host(&AppConfig::default()).unwrap();
        std::fs::write(
            &path,
            r#"{"duration": 7, "animationKeyframes": [], "transitionKeyframes": []}"#,
        )
        .unwrap();
        reload(&mut host, &path);
        assert_eq!(host.timeline().duration(), 7);
        assert!(host.timeline().is_playing());

        std::fs::write(&path, "not json").unwrap();
        reload(&mut host, &path);
        assert_eq!(host.timeline().duration(), 7);
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
