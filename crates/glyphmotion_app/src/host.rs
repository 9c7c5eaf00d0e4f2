// SPDX-License-Identifier: MIT OR Apache-2.0
//! Frame host wiring the timeline to the particle field.

use crate::config::AppConfig;
use glyphmotion_field::{EffectPreset, GeometrySource, Noise3, ParticleField, PerlinNoise};
use glyphmotion_sequencer::{DocumentError, TimelineEngine, TimelineEvent};
use std::time::Instant;

/// What happened during one frame
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameReport {
    /// Playback time after the frame
    pub time: f64,
    /// Transitions started this frame
    pub transitions_started: u32,
    /// Non-looping playback reached the end this frame
    pub ended: bool,
    /// Display positions were recomputed
    pub positions_updated: bool,
}

/// Owns the timeline and the field and runs them frame by frame
pub struct Host<N = PerlinNoise> {
    timeline: TimelineEngine,
    field: ParticleField<N>,
}

impl Host<PerlinNoise> {
    /// Create a host from configuration
    pub fn new(config: &AppConfig) -> Self {
        Self::with_field(config, ParticleField::new())
    }
}

impl<N: Noise3> Host<N> {
    /// Create a host around an existing field
    pub fn with_field(config: &AppConfig, mut field: ParticleField<N>) -> Self {
        let mut timeline = TimelineEngine::new();
        timeline.set_looping(config.looping);
        field.set_lerp_rate(config.lerp_rate);
        field.set_speeds(config.speeds);
        Self { timeline, field }
    }

    /// Replace the particles with geometry generated for `text`
    pub fn load_text(&mut self, source: &impl GeometrySource, text: &str) {
        let geometry = source.generate(text);
        tracing::info!("Text {:?} produced {} particles", text, geometry.len());
        self.field.set_geometry(&geometry);
    }

    /// Import an animation document, leaving state untouched on failure
    pub fn load_animation(&mut self, json: &str) -> Result<(), DocumentError> {
        self.timeline.import_json(json)?;
        self.timeline.stop();
        self.dispatch_events();
        Ok(())
    }

    /// Apply an effect preset to the field
    pub fn apply_preset(&mut self, name: &str, preset: &EffectPreset) {
        self.field.apply_preset(preset);
        tracing::info!("Applied preset {name}");
    }

    /// Run one real-time frame
    pub fn frame(&mut self) -> FrameReport {
        self.frame_at(Instant::now())
    }

    /// Run one frame at the given instant
    pub fn frame_at(&mut self, now: Instant) -> FrameReport {
        self.timeline.tick_at(now);
        self.finish_frame()
    }

    /// Jump the timeline to `time` and render one frame there
    pub fn capture_frame(&mut self, time: f64) -> FrameReport {
        self.timeline.seek(time);
        self.finish_frame()
    }

    fn finish_frame(&mut self) -> FrameReport {
        let mut report = self.dispatch_events();
        report.positions_updated = self.field.update();
        report.time = self.timeline.current_time();
        report
    }

    /// Forward queued timeline events to the field
    fn dispatch_events(&mut self) -> FrameReport {
        let mut report = FrameReport::default();
        for event in self.timeline.take_events() {
            match event {
                TimelineEvent::TransitionTriggered { time, keyframe } => {
                    tracing::debug!(
                        "Transition {:?} {:?} at {time}s",
                        keyframe.direction,
                        keyframe.shape
                    );
                    self.field.trigger_transition(&keyframe);
                    report.transitions_started += 1;
                }
                TimelineEvent::PlaybackEnded => {
                    tracing::info!("Playback ended");
                    report.ended = true;
                }
                TimelineEvent::Snapshot(values) => self.field.apply_snapshot(&values),
                TimelineEvent::TimeUpdated(time) => report.time = time,
            }
        }
        report
    }

    /// The timeline
    pub fn timeline(&self) -> &TimelineEngine {
        &self.timeline
    }

    /// The timeline, for editing and playback control
    pub fn timeline_mut(&mut self) -> &mut TimelineEngine {
        &mut self.timeline
    }

    /// The particle field
    pub fn field(&self) -> &ParticleField<N> {
        &self.field
    }

    /// The particle field, for direct control
    pub fn field_mut(&mut self) -> &mut ParticleField<N> {
        &mut self.field
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::glyphs::GridFont;
    use glyphmotion_field::HIDDEN_POSITION;
    use glyphmotion_sequencer::{
        AnimationKeyframe, ParamName, TransitionDirection, TransitionKeyframe, TransitionShape,
        TransitionUnit,
    };
    use std::time::Duration;

    fn host_with_text(text: &str) -> Host {
        let config = AppConfig {
            looping: false,
            ..AppConfig::default()
        };
        let mut host = Host::new(&config);
        host.load_text(&GridFont::block(), text);
        host
    }

    fn fade(direction: TransitionDirection) -> TransitionKeyframe {
        TransitionKeyframe::new(direction, TransitionShape::Fade, TransitionUnit::PerLetter)
            .with_timing(0.05, 0.0)
    }

    #[test]
    fn test_snapshot_reaches_field() {
        let mut host = host_with_text("AB");
        host.timeline_mut()
            .add_animation_keyframe(
                0,
                AnimationKeyframe::default().with_param(ParamName::Opacity, 0.0),
            )
            .unwrap();
        host.timeline_mut()
            .add_animation_keyframe(
                2,
                AnimationKeyframe::default().with_param(ParamName::Opacity, 1.0),
            )
            .unwrap();

        let report = host.capture_frame(1.0);
        assert_eq!(report.time, 1.0);
        assert_eq!(host.field().appearance().opacity, 0.5);

        host.capture_frame(5.0);
        assert_eq!(host.field().appearance().opacity, 1.0);
    }

    #[test]
    fn test_playback_fires_transition_and_ends() {
        let mut host = host_with_text("HI");
        host.timeline_mut().set_duration(2);
        host.timeline_mut()
            .add_transition_keyframe(1, fade(TransitionDirection::Out))
            .unwrap();

        let start = Instant::now();
        host.timeline_mut().play();
        host.frame_at(start);

        let report = host.frame_at(start + Duration::from_millis(1200));
        assert_eq!(report.transitions_started, 1);
        assert!(host.field().is_transitioning());

        // Field time advances 0.016 per frame, 0.05s needs four frames
        for i in 0..4 {
            host.frame_at(start + Duration::from_millis(1300 + i * 100));
        }
        assert!(!host.field().is_transitioning());
        assert!(!host.field().default_visible());
        assert!(host.field().positions().iter().all(|p| *p == HIDDEN_POSITION));

        let report = host.frame_at(start + Duration::from_millis(2500));
        assert!(report.ended);
        assert_eq!(report.time, 2.0);
        assert_eq!(report.transitions_started, 0);
    }

    #[test]
    fn test_looping_refires_transition() {
        let mut host = host_with_text("A");
        host.timeline_mut().set_looping(true);
        host.timeline_mut().set_duration(3);
        host.timeline_mut()
            .add_transition_keyframe(1, fade(TransitionDirection::In))
            .unwrap();

        let start = Instant::now();
        host.timeline_mut().play();
        host.frame_at(start);
        assert_eq!(host.frame_at(start + Duration::from_millis(1500)).transitions_started, 1);

        // 1.5 + 3.0 = 4.5 wraps to 1.5 and re-checks [0, 1.5]
        let report = host.frame_at(start + Duration::from_millis(4500));
        assert_eq!(report.transitions_started, 1);
        assert!((report.time - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_failed_import_keeps_animation() {
        let mut host = host_with_text("A");
        host.timeline_mut().set_duration(4);
        assert!(host.load_animation("{ not json").is_err());
        assert_eq!(host.timeline().duration(), 4);

        host.load_animation(
            r#"{"duration": 6, "animationKeyframes": [], "transitionKeyframes": []}"#,
        )
        .unwrap();
        assert_eq!(host.timeline().duration(), 6);
    }

    #[test]
    fn test_preset_drives_motion() {
        let mut host = host_with_text("A");
        let preset = EffectPreset {
            bounce_amount: 1.0,
            ..EffectPreset::default()
        };
        host.apply_preset("Bouncy", &preset);
        assert!(host.field_mut().update());
        assert!(host.field().is_lerping());

        // Timeline snapshots take over smoothed values on the next frame
        let report = host.capture_frame(0.0);
        assert!(!report.positions_updated);
        assert_eq!(host.field().param(ParamName::BounceAmount), 0.0);
    }
}
