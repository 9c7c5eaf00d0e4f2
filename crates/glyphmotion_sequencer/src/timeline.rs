// SPDX-License-Identifier: MIT OR Apache-2.0
//! Timeline engine: keyframe stores, playback clock and parameter evaluation.

use crate::keyframe::{AnimationKeyframe, Easing, Interpolation};
use crate::param::{ParamName, ParamValues};
use crate::transition::TransitionKeyframe;
use std::collections::BTreeMap;
use std::time::Instant;

/// Default timeline length in seconds
pub const DEFAULT_DURATION: u32 = 10;

/// Playback state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    /// Stopped (or never started)
    #[default]
    Stopped,
    /// Advancing on every tick
    Playing,
    /// Paused mid-timeline
    Paused,
    /// Non-looping playback reached the end
    Ended,
}

/// Notification emitted by the engine, drained by the host with
/// [`TimelineEngine::take_events`].
#[derive(Debug, Clone, PartialEq)]
pub enum TimelineEvent {
    /// A transition keyframe was crossed
    TransitionTriggered {
        /// Keyframe time in seconds
        time: u32,
        /// Keyframe payload
        keyframe: TransitionKeyframe,
    },
    /// Non-looping playback reached the end
    PlaybackEnded,
    /// Interpolated parameters for the current time
    Snapshot(ParamValues),
    /// The playback clock moved
    TimeUpdated(f64),
}

/// Errors raised by timeline edits
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimelineError {
    /// The timeline is already one second long
    #[error("Timeline cannot be shorter than one second")]
    DurationAtMinimum,

    /// The last second still holds keyframes
    #[error("Last second ({0}s) still holds keyframes")]
    LastSecondOccupied(u32),

    /// Keyframe time does not fit the timeline
    #[error("Keyframe time {time}s is outside the {duration}s timeline")]
    OutOfRange {
        /// Requested time
        time: u32,
        /// Current duration
        duration: u32,
    },

    /// No animation keyframe at the requested time
    #[error("No animation keyframe at {0}s")]
    KeyframeNotFound(u32),
}

/// Keyframe timeline with a wall-clock playback controller
#[derive(Debug, Clone)]
pub struct TimelineEngine {
    /// Length in whole seconds
    duration: u32,
    /// Parameter keyframes keyed by second
    animation_keyframes: BTreeMap<u32, AnimationKeyframe>,
    /// Transition triggers keyed by second
    transition_keyframes: BTreeMap<u32, TransitionKeyframe>,
    /// Playback state
    state: PlaybackState,
    /// Wrap around at the end instead of stopping
    looping: bool,
    /// Playback clock in seconds
    current_time: f64,
    /// Instant of the previous tick, `None` until primed
    last_frame: Option<Instant>,
    /// Most recently fired transition time
    last_fired_transition: Option<u32>,
    /// Events waiting for the host
    pending_events: Vec<TimelineEvent>,
}

impl TimelineEngine {
    /// Create an empty timeline of [`DEFAULT_DURATION`] seconds
    pub fn new() -> Self {
        Self {
            duration: DEFAULT_DURATION,
            animation_keyframes: BTreeMap::new(),
            transition_keyframes: BTreeMap::new(),
            state: PlaybackState::Stopped,
            looping: false,
            current_time: 0.0,
            last_frame: None,
            last_fired_transition: None,
            pending_events: Vec::new(),
        }
    }

    // --- Evaluation ---

    /// Interpolated value of every parameter at `time`.
    ///
    /// Each parameter only considers keyframes that author it, so two
    /// parameters can be bracketed by different keyframe pairs. Before the
    /// first authoring keyframe the default holds, after the last one its
    /// value holds. This never touches playback or transition state.
    pub fn evaluate_params_at_time(&self, time: f64) -> ParamValues {
        let mut result = ParamValues::defaults();

        for name in ParamName::ALL {
            if let Some(value) = self.evaluate_param(name, time) {
                result.set(name, value);
            }
        }

        result
    }

    /// Interpolated value of one parameter, `None` while the default holds
    fn evaluate_param(&self, name: ParamName, time: f64) -> Option<f64> {
        let relevant: Vec<(f64, f64, Easing)> = self
            .animation_keyframes
            .iter()
            .filter_map(|(t, kf)| kf.params.get(name).map(|v| (f64::from(*t), v, kf.easing)))
            .collect();

        let (first_time, _, _) = *relevant.first()?;
        if time <= first_time {
            return None;
        }

        let (last_time, last_value, _) = *relevant.last()?;
        if time >= last_time {
            return Some(last_value);
        }

        relevant.windows(2).find_map(|pair| {
            let (t0, v0, easing) = pair[0];
            let (t1, v1, _) = pair[1];
            (time >= t0 && time < t1)
                .then(|| Interpolation::eased(v0, v1, (time - t0) / (t1 - t0), easing))
        })
    }

    // --- Playback ---

    /// Advance the playback clock using the wall clock
    pub fn tick(&mut self) {
        self.tick_at(Instant::now());
    }

    /// Advance the playback clock to the frame instant `now`.
    ///
    /// The first tick after [`play`](Self::play) only records the baseline.
    pub fn tick_at(&mut self, now: Instant) {
        if self.state != PlaybackState::Playing {
            return;
        }

        let Some(last) = self.last_frame.replace(now) else {
            return;
        };

        let delta = now.saturating_duration_since(last).as_secs_f64();
        let prev_time = self.current_time;
        self.current_time += delta;

        self.check_transitions(prev_time, self.current_time);

        let duration = f64::from(self.duration);
        if self.current_time >= duration {
            if self.looping {
                self.current_time %= duration;
                self.last_fired_transition = None;
                self.check_transitions(0.0, self.current_time);
            } else {
                self.current_time = duration;
                self.state = PlaybackState::Ended;
                self.last_frame = None;
                tracing::debug!("Timeline playback ended at {duration}s");
                self.pending_events.push(TimelineEvent::PlaybackEnded);
            }
        }

        self.emit_snapshot();
    }

    /// Fire transition keyframes whose time lies in `[prev_time, curr_time]`.
    ///
    /// Only the most recently fired time is remembered.
    fn check_transitions(&mut self, prev_time: f64, curr_time: f64) {
        for (&time, keyframe) in &self.transition_keyframes {
            let t = f64::from(time);
            if prev_time <= t && curr_time >= t && self.last_fired_transition != Some(time) {
                self.last_fired_transition = Some(time);
                tracing::debug!("Transition keyframe at {time}s fired");
                self.pending_events.push(TimelineEvent::TransitionTriggered {
                    time,
                    keyframe: *keyframe,
                });
            }
        }
    }

    /// Queue the snapshot and time update for the current time
    fn emit_snapshot(&mut self) {
        let values = self.evaluate_params_at_time(self.current_time);
        self.pending_events.push(TimelineEvent::Snapshot(values));
        self.pending_events.push(TimelineEvent::TimeUpdated(self.current_time));
    }

    /// Get pending events and clear them
    pub fn take_events(&mut self) -> Vec<TimelineEvent> {
        std::mem::take(&mut self.pending_events)
    }

    /// Play from the current position
    pub fn play(&mut self) {
        self.state = PlaybackState::Playing;
        self.last_frame = None;
        tracing::debug!("Timeline playing from {:.3}s", self.current_time);
    }

    /// Pause playback
    pub fn pause(&mut self) {
        if self.state == PlaybackState::Playing {
            self.state = PlaybackState::Paused;
        }
        self.last_frame = None;
        tracing::debug!("Timeline paused at {:.3}s", self.current_time);
    }

    /// Stop and reset to the beginning
    pub fn stop(&mut self) {
        self.state = PlaybackState::Stopped;
        self.last_frame = None;
        self.current_time = 0.0;
        self.last_fired_transition = None;
        tracing::debug!("Timeline stopped");
        self.emit_snapshot();
    }

    /// Jump to `time`, clamped to the timeline. Crossed transitions do not fire.
    pub fn seek(&mut self, time: f64) {
        self.current_time = time.clamp(0.0, f64::from(self.duration));
        self.last_fired_transition = None;
        self.emit_snapshot();
    }

    /// Playback state
    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Is currently playing
    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    /// Whether playback wraps at the end
    pub fn is_looping(&self) -> bool {
        self.looping
    }

    /// Enable or disable wrapping at the end
    pub fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
    }

    /// Playback clock in seconds
    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    // --- Keyframe CRUD ---

    fn check_range(&self, time: u32) -> Result<(), TimelineError> {
        if time >= self.duration {
            return Err(TimelineError::OutOfRange {
                time,
                duration: self.duration,
            });
        }
        Ok(())
    }

    /// Insert or replace the animation keyframe at `time`
    pub fn add_animation_keyframe(
        &mut self,
        time: u32,
        keyframe: AnimationKeyframe,
    ) -> Result<(), TimelineError> {
        self.check_range(time)?;
        self.animation_keyframes.insert(time, keyframe);
        Ok(())
    }

    /// Insert or replace the transition keyframe at `time`
    pub fn add_transition_keyframe(
        &mut self,
        time: u32,
        keyframe: TransitionKeyframe,
    ) -> Result<(), TimelineError> {
        self.check_range(time)?;
        self.transition_keyframes.insert(time, keyframe);
        Ok(())
    }

    /// Author one parameter, creating the keyframe if needed
    pub fn set_animation_param(
        &mut self,
        time: u32,
        name: ParamName,
        value: f64,
    ) -> Result<(), TimelineError> {
        self.check_range(time)?;
        self.animation_keyframes
            .entry(time)
            .or_default()
            .params
            .set(name, value);
        Ok(())
    }

    /// Remove one parameter from the keyframe at `time`. The keyframe stays.
    pub fn clear_animation_param(
        &mut self,
        time: u32,
        name: ParamName,
    ) -> Result<Option<f64>, TimelineError> {
        let keyframe = self
            .animation_keyframes
            .get_mut(&time)
            .ok_or(TimelineError::KeyframeNotFound(time))?;
        Ok(keyframe.params.remove(name))
    }

    /// Change the easing of the keyframe at `time`
    pub fn set_keyframe_easing(&mut self, time: u32, easing: Easing) -> Result<(), TimelineError> {
        let keyframe = self
            .animation_keyframes
            .get_mut(&time)
            .ok_or(TimelineError::KeyframeNotFound(time))?;
        keyframe.easing = easing;
        Ok(())
    }

    /// Remove the animation keyframe at `time`
    pub fn remove_animation_keyframe(&mut self, time: u32) -> Option<AnimationKeyframe> {
        self.animation_keyframes.remove(&time)
    }

    /// Remove the transition keyframe at `time`
    pub fn remove_transition_keyframe(&mut self, time: u32) -> Option<TransitionKeyframe> {
        self.transition_keyframes.remove(&time)
    }

    /// Get the animation keyframe at `time`
    pub fn animation_keyframe(&self, time: u32) -> Option<&AnimationKeyframe> {
        self.animation_keyframes.get(&time)
    }

    /// Get the transition keyframe at `time`
    pub fn transition_keyframe(&self, time: u32) -> Option<&TransitionKeyframe> {
        self.transition_keyframes.get(&time)
    }

    /// Whether an animation keyframe exists at `time`
    pub fn has_animation_keyframe(&self, time: u32) -> bool {
        self.animation_keyframes.contains_key(&time)
    }

    /// Whether a transition keyframe exists at `time`
    pub fn has_transition_keyframe(&self, time: u32) -> bool {
        self.transition_keyframes.contains_key(&time)
    }

    /// Animation keyframes in time order
    pub fn animation_keyframes(&self) -> impl Iterator<Item = (u32, &AnimationKeyframe)> {
        self.animation_keyframes.iter().map(|(t, kf)| (*t, kf))
    }

    /// Transition keyframes in time order
    pub fn transition_keyframes(&self) -> impl Iterator<Item = (u32, &TransitionKeyframe)> {
        self.transition_keyframes.iter().map(|(t, kf)| (*t, kf))
    }

    /// Remove every keyframe and rewind
    pub fn clear(&mut self) {
        self.animation_keyframes.clear();
        self.transition_keyframes.clear();
        self.state = PlaybackState::Stopped;
        self.last_frame = None;
        self.current_time = 0.0;
        self.last_fired_transition = None;
    }

    // --- Duration ---

    /// Timeline length in seconds
    pub fn duration(&self) -> u32 {
        self.duration
    }

    /// Resize the timeline, deleting keyframes that no longer fit.
    /// Durations below one second are raised to one.
    pub fn set_duration(&mut self, duration: u32) {
        let duration = duration.max(1);
        self.animation_keyframes.retain(|t, _| *t < duration);
        self.transition_keyframes.retain(|t, _| *t < duration);
        self.duration = duration;
        if self.current_time > f64::from(duration) {
            self.current_time = f64::from(duration);
        }
        tracing::info!("Timeline duration set to {duration}s");
    }

    /// Append one second
    pub fn add_second(&mut self) {
        self.duration += 1;
    }

    /// Remove the last second if it holds no keyframes
    pub fn remove_last_second(&mut self) -> Result<(), TimelineError> {
        if self.duration <= 1 {
            return Err(TimelineError::DurationAtMinimum);
        }
        let last_second = self.duration - 1;
        if self.has_animation_keyframe(last_second) || self.has_transition_keyframe(last_second) {
            return Err(TimelineError::LastSecondOccupied(last_second));
        }
        self.duration -= 1;
        if self.current_time > f64::from(self.duration) {
            self.current_time = f64::from(self.duration);
        }
        Ok(())
    }

    // --- Document support ---

    /// Replace both keyframe stores and the duration in one step
    pub(crate) fn replace_contents(
        &mut self,
        duration: u32,
        animation: BTreeMap<u32, AnimationKeyframe>,
        transitions: BTreeMap<u32, TransitionKeyframe>,
    ) {
        self.duration = duration.max(1);
        self.animation_keyframes = animation;
        self.transition_keyframes = transitions;
        if self.current_time > f64::from(self.duration) {
            self.current_time = f64::from(self.duration);
        }
    }
}

impl Default for TimelineEngine {
    fn default() -> Self {
        Self::new()
    }
}
