// SPDX-License-Identifier: MIT OR Apache-2.0
//! Keyframe timeline for glyphmotion.
//!
//! This crate provides the discrete-time side of the animation:
//! - Parameter catalogue with defaults and editor ranges
//! - Sparse animation keyframes with per-keyframe easing
//! - Transition trigger keyframes
//! - Playback clock with crossing detection and looping
//! - JSON document import/export
//!
//! ## Architecture
//!
//! [`TimelineEngine`] owns two independent keyframe stores keyed by whole
//! seconds. Evaluating the timeline is pure; everything the engine wants the
//! host to know (snapshots, time updates, transition triggers, end of
//! playback) is queued as a [`TimelineEvent`] and drained once per frame.

pub mod document;
pub mod keyframe;
pub mod param;
pub mod timeline;
pub mod transition;

pub use document::{
    AnimationDocument, AnimationKeyframeEntry, DocumentError, TransitionKeyframeEntry,
};
pub use keyframe::{ease_in_out_cubic, AnimationKeyframe, Easing, Interpolation};
pub use param::{ParamName, ParamRange, ParamSet, ParamValues, UnknownParam};
pub use timeline::{PlaybackState, TimelineEngine, TimelineError, TimelineEvent, DEFAULT_DURATION};
pub use transition::{
    SlideDirection, TransitionDirection, TransitionKeyframe, TransitionShape, TransitionUnit,
};
