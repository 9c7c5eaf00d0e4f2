// SPDX-License-Identifier: MIT OR Apache-2.0
//! Staggered letter/word transitions.
//!
//! The controller is either inactive, where every particle shares the
//! resting visibility, or running one transition that starts each unit
//! (letter or word) `stagger_delay` seconds after the previous one.

use crate::geometry::ParticleMeta;
use glyphmotion_sequencer::{
    ease_in_out_cubic, SlideDirection, TransitionDirection, TransitionKeyframe, TransitionShape,
    TransitionUnit,
};
use std::collections::HashMap;
use std::f64::consts::PI;

/// Depth a fading unit starts from
const FADE_DEPTH: f64 = -8.0;
/// Distance a sliding unit travels
const SLIDE_DISTANCE: f64 = 30.0;
/// Radial distance for explode/implode
const BURST_DISTANCE: f64 = 20.0;
/// Depth offset for explode/implode
const BURST_DEPTH: f64 = 10.0;
/// Starting radius of a spiral
const SPIRAL_RADIUS: f64 = 15.0;
/// Depth offset of a spiral
const SPIRAL_DEPTH: f64 = 8.0;

/// Offset and opacity a transition adds to one particle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransitionContribution {
    /// Positional offset (x, y, z)
    pub offset: [f64; 3],
    /// Opacity in `[0, 1]`
    pub opacity: f64,
}

impl TransitionContribution {
    /// No offset, with the given resting visibility
    pub fn at_rest(visible: bool) -> Self {
        Self {
            offset: [0.0; 3],
            opacity: if visible { 1.0 } else { 0.0 },
        }
    }
}

/// A running transition
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActiveTransition {
    /// In or out
    pub direction: TransitionDirection,
    /// Motion shape
    pub shape: TransitionShape,
    /// Stagger granularity
    pub unit: TransitionUnit,
    /// Phase time the first unit started
    pub start_time: f64,
    /// Number of letters or words
    pub total_units: u32,
}

/// Transition state machine owned by the particle field
#[derive(Debug, Clone)]
pub struct TransitionController {
    /// Running transition, `None` while inactive
    active: Option<ActiveTransition>,
    /// Opacity source while inactive
    default_visible: bool,
    /// Seconds each unit takes
    duration: f64,
    /// Seconds between consecutive unit starts
    stagger_delay: f64,
    /// Entry edge for slide transitions
    slide_direction: SlideDirection,
    /// Oriented progress per unit for `cache_time` (`None` = not started)
    progress_cache: HashMap<u32, Option<f64>>,
    /// Time the cache was filled for
    cache_time: Option<f64>,
}

impl TransitionController {
    /// Create an inactive controller with visible text
    pub fn new() -> Self {
        Self {
            active: None,
            default_visible: true,
            duration: TransitionKeyframe::DEFAULT_DURATION,
            stagger_delay: TransitionKeyframe::DEFAULT_STAGGER,
            slide_direction: SlideDirection::default(),
            progress_cache: HashMap::new(),
            cache_time: None,
        }
    }

    /// Begin a transition at phase time `now`
    pub fn start(
        &mut self,
        direction: TransitionDirection,
        shape: TransitionShape,
        unit: TransitionUnit,
        now: f64,
        total_units: u32,
    ) {
        self.clear_cache();
        self.active = Some(ActiveTransition {
            direction,
            shape,
            unit,
            start_time: now,
            total_units,
        });
        tracing::debug!(
            "Transition {direction:?} {shape:?} started at {now:.3} over {total_units} units"
        );
    }

    /// End the running transition. Text stays visible after an `in`
    /// transition and hidden after an `out` one.
    pub fn stop(&mut self) {
        self.clear_cache();
        if let Some(active) = self.active.take() {
            self.default_visible = active.direction == TransitionDirection::In;
            tracing::debug!("Transition stopped, text visible: {}", self.default_visible);
        }
    }

    /// Whether the last unit has finished (always true while inactive)
    pub fn is_complete(&self, now: f64) -> bool {
        let Some(active) = &self.active else {
            return true;
        };
        let last_unit_start =
            active.start_time + (f64::from(active.total_units) - 1.0) * self.stagger_delay;
        now >= last_unit_start + self.duration
    }

    /// Offset and opacity for a particle at phase time `now`
    pub fn contribution(
        &mut self,
        meta: Option<&ParticleMeta>,
        now: f64,
    ) -> TransitionContribution {
        let resting = TransitionContribution::at_rest(self.default_visible);
        let (Some(active), Some(meta)) = (self.active, meta) else {
            return resting;
        };

        let unit_index = match active.unit {
            TransitionUnit::PerLetter => meta.char_index,
            TransitionUnit::PerWord => meta.word_index,
        };

        let Some(progress) = self.unit_progress(&active, unit_index, now) else {
            return TransitionContribution::at_rest(active.direction == TransitionDirection::Out);
        };

        TransitionContribution {
            offset: self.shape_offset(active.shape, progress, meta, unit_index),
            opacity: progress,
        }
    }

    /// Eased progress of a unit, inverted for `out`. `None` before the unit starts.
    fn unit_progress(
        &mut self,
        active: &ActiveTransition,
        unit_index: u32,
        now: f64,
    ) -> Option<f64> {
        if self.cache_time != Some(now) {
            self.progress_cache.clear();
            self.cache_time = Some(now);
        }

        let duration = self.duration;
        let unit_start = active.start_time + f64::from(unit_index) * self.stagger_delay;
        *self.progress_cache.entry(unit_index).or_insert_with(|| {
            let elapsed = now - unit_start;
            if elapsed < 0.0 {
                return None;
            }
            let linear = if duration > 0.0 {
                (elapsed / duration).clamp(0.0, 1.0)
            } else {
                1.0
            };
            let eased = ease_in_out_cubic(linear);
            Some(match active.direction {
                TransitionDirection::In => eased,
                TransitionDirection::Out => 1.0 - eased,
            })
        })
    }

    fn shape_offset(
        &self,
        shape: TransitionShape,
        progress: f64,
        meta: &ParticleMeta,
        unit_index: u32,
    ) -> [f64; 3] {
        let remaining = 1.0 - progress;
        match shape {
            TransitionShape::Fade => [0.0, 0.0, remaining * FADE_DEPTH],
            TransitionShape::Slide => {
                let d = remaining * SLIDE_DISTANCE;
                match self.slide_direction {
                    SlideDirection::Top => [0.0, d, 0.0],
                    SlideDirection::Bottom => [0.0, -d, 0.0],
                    SlideDirection::Left => [-d, 0.0, 0.0],
                    SlideDirection::Right => [d, 0.0, 0.0],
                }
            }
            TransitionShape::Explode | TransitionShape::Implode => {
                let sign = if shape == TransitionShape::Explode { 1.0 } else { -1.0 };
                let angle = f64::from(meta.particle_in_char) * 0.5;
                let d = remaining * BURST_DISTANCE;
                [
                    sign * angle.cos() * d,
                    sign * angle.sin() * d,
                    sign * remaining * BURST_DEPTH,
                ]
            }
            TransitionShape::Spiral => {
                let radius = remaining * SPIRAL_RADIUS;
                let angle = remaining * PI * 4.0 + f64::from(unit_index) * 0.3;
                [angle.cos() * radius, angle.sin() * radius, remaining * SPIRAL_DEPTH]
            }
        }
    }

    fn clear_cache(&mut self) {
        self.progress_cache.clear();
        self.cache_time = None;
    }

    /// Running transition, if any
    pub fn active(&self) -> Option<&ActiveTransition> {
        self.active.as_ref()
    }

    /// Whether a transition is running
    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Resting visibility
    pub fn default_visible(&self) -> bool {
        self.default_visible
    }

    /// Seconds each unit takes
    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// Set seconds each unit takes
    pub fn set_duration(&mut self, duration: f64) {
        self.duration = duration.max(0.0);
    }

    /// Seconds between consecutive unit starts
    pub fn stagger_delay(&self) -> f64 {
        self.stagger_delay
    }

    /// Set seconds between consecutive unit starts
    pub fn set_stagger_delay(&mut self, delay: f64) {
        self.stagger_delay = delay.max(0.0);
    }

    /// Entry edge for slide transitions
    pub fn slide_direction(&self) -> SlideDirection {
        self.slide_direction
    }

    /// Set the entry edge for slide transitions
    pub fn set_slide_direction(&mut self, direction: SlideDirection) {
        self.slide_direction = direction;
    }
}

impl Default for TransitionController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn letter(char_index: u32) -> ParticleMeta {
        ParticleMeta::new(char_index, 0, 0)
    }

    fn started(direction: TransitionDirection, shape: TransitionShape) -> TransitionController {
        let mut controller = TransitionController::new();
        controller.set_duration(1.0);
        controller.set_stagger_delay(0.5);
        controller.start(direction, shape, TransitionUnit::PerLetter, 10.0, 3);
        controller
    }

    #[test]
    fn test_inactive_uses_default_visibility() {
        let mut controller = TransitionController::new();
        assert_eq!(
            controller.contribution(Some(&letter(0)), 0.0),
            TransitionContribution::at_rest(true)
        );
        assert!(controller.is_complete(0.0));
    }

    #[test]
    fn test_fade_in_boundaries() {
        let mut controller = started(TransitionDirection::In, TransitionShape::Fade);

        let begin = controller.contribution(Some(&letter(0)), 10.0);
        assert_eq!(begin.offset, [0.0, 0.0, -8.0]);
        assert_eq!(begin.opacity, 0.0);

        let end = controller.contribution(Some(&letter(0)), 11.0);
        assert_eq!(end.offset[2], 0.0);
        assert_eq!(end.opacity, 1.0);

        let mid = controller.contribution(Some(&letter(0)), 10.5);
        assert_eq!(mid.opacity, 0.5);
        assert_eq!(mid.offset[2], -4.0);
    }

    #[test]
    fn test_fade_out_inverts() {
        let mut controller = started(TransitionDirection::Out, TransitionShape::Fade);

        let begin = controller.contribution(Some(&letter(0)), 10.0);
        assert_eq!(begin.offset[2], 0.0);
        assert_eq!(begin.opacity, 1.0);

        let end = controller.contribution(Some(&letter(0)), 12.0);
        assert_eq!(end.offset[2], -8.0);
        assert_eq!(end.opacity, 0.0);
    }

    #[test]
    fn test_units_not_started_hold_pre_state() {
        let mut controller = started(TransitionDirection::In, TransitionShape::Slide);
        // Unit 2 starts at 11.0
        let waiting = controller.contribution(Some(&letter(2)), 10.9);
        assert_eq!(waiting, TransitionContribution::at_rest(false));

        let mut out = started(TransitionDirection::Out, TransitionShape::Slide);
        assert_eq!(
            out.contribution(Some(&letter(2)), 10.9),
            TransitionContribution::at_rest(true)
        );
    }

    #[test]
    fn test_missing_metadata_falls_back() {
        let mut controller = started(TransitionDirection::In, TransitionShape::Spiral);
        assert_eq!(controller.contribution(None, 10.2), TransitionContribution::at_rest(true));
    }

    #[test]
    fn test_slide_directions() {
        let mut controller = started(TransitionDirection::In, TransitionShape::Slide);
        assert_eq!(controller.contribution(Some(&letter(0)), 10.0).offset, [0.0, -30.0, 0.0]);

        controller.set_slide_direction(SlideDirection::Left);
        assert_eq!(controller.contribution(Some(&letter(0)), 10.0).offset, [-30.0, 0.0, 0.0]);

        controller.set_slide_direction(SlideDirection::Top);
        assert_eq!(controller.contribution(Some(&letter(0)), 10.0).offset, [0.0, 30.0, 0.0]);
    }

    #[test]
    fn test_explode_and_implode_mirror() {
        let meta = ParticleMeta::new(0, 0, 3);
        let mut explode = started(TransitionDirection::In, TransitionShape::Explode);
        let mut implode = started(TransitionDirection::In, TransitionShape::Implode);

        let e = explode.contribution(Some(&meta), 10.0).offset;
        let i = implode.contribution(Some(&meta), 10.0).offset;
        assert!(approx_eq(e[0], 1.5f64.cos() * 20.0));
        assert!(approx_eq(e[1], 1.5f64.sin() * 20.0));
        assert_eq!(e[2], 10.0);
        for axis in 0..3 {
            assert!(approx_eq(e[axis], -i[axis]));
        }
    }

    #[test]
    fn test_spiral_start() {
        let mut controller = started(TransitionDirection::In, TransitionShape::Spiral);
        let offset = controller.contribution(Some(&letter(0)), 10.0).offset;
        // angle = 4π at progress 0, so the unit starts on the +X axis
        assert!(approx_eq(offset[0], 15.0));
        assert!(approx_eq(offset[1], 0.0));
        assert_eq!(offset[2], 8.0);
    }

    #[test]
    fn test_word_units() {
        let mut controller = TransitionController::new();
        controller.set_duration(1.0);
        controller.set_stagger_delay(1.0);
        controller.start(
            TransitionDirection::In,
            TransitionShape::Fade,
            TransitionUnit::PerWord,
            0.0,
            2,
        );
        let second_word = ParticleMeta::new(0, 1, 0);
        assert_eq!(controller.contribution(Some(&second_word), 0.5).opacity, 0.0);
        assert_eq!(controller.contribution(Some(&second_word), 2.0).opacity, 1.0);
    }

    #[test]
    fn test_completion_and_stop() {
        let mut controller = started(TransitionDirection::Out, TransitionShape::Fade);
        // Last unit (index 2) starts at 11.0 and ends at 12.0
        assert!(!controller.is_complete(11.99));
        assert!(controller.is_complete(12.0));

        controller.stop();
        assert!(!controller.is_active());
        assert!(!controller.default_visible());
        assert_eq!(
            controller.contribution(Some(&letter(0)), 13.0),
            TransitionContribution::at_rest(false)
        );

        controller.start(
            TransitionDirection::In,
            TransitionShape::Fade,
            TransitionUnit::PerLetter,
            20.0,
            1,
        );
        controller.stop();
        assert!(controller.default_visible());
    }
}
