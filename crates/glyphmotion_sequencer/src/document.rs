// SPDX-License-Identifier: MIT OR Apache-2.0
//! Persisted animation documents.
//!
//! The current format keeps the two keyframe stores in separate lists:
//!
//! ```json
//! {
//!   "duration": 10,
//!   "animationKeyframes": [{ "time": 0, "params": { "opacity": 0 }, "easing": "linear" }],
//!   "transitionKeyframes": [{ "time": 2, "direction": "in", "transitionType": "fade",
//!                             "mode": "per-letter", "duration": 3, "stagger": 0.1,
//!                             "slideDirection": "bottom" }]
//! }
//! ```
//!
//! Older files used a single `keyframes` list where every entry carries a
//! `type` of `animation` or `transition`. Those are still accepted on import.

use crate::keyframe::AnimationKeyframe;
use crate::timeline::{TimelineEngine, DEFAULT_DURATION};
use crate::transition::TransitionKeyframe;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Errors raised while reading an animation document
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    /// Payload is not valid document JSON
    #[error("Invalid animation document: {0}")]
    Json(#[from] serde_json::Error),

    /// Payload is empty or null
    #[error("Animation document has no data")]
    MissingData,
}

/// Animation keyframe together with its time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationKeyframeEntry {
    /// Time in seconds
    pub time: u32,
    /// Keyframe payload
    #[serde(flatten)]
    pub keyframe: AnimationKeyframe,
}

/// Transition keyframe together with its time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionKeyframeEntry {
    /// Time in seconds
    pub time: u32,
    /// Keyframe payload
    #[serde(flatten)]
    pub keyframe: TransitionKeyframe,
}

/// Serializable snapshot of a timeline's content
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimationDocument {
    /// Timeline length in seconds
    pub duration: u32,
    /// Parameter keyframes in time order
    pub animation_keyframes: Vec<AnimationKeyframeEntry>,
    /// Transition keyframes in time order
    pub transition_keyframes: Vec<TransitionKeyframeEntry>,
}

/// Entry of the legacy single-list format
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum LegacyKeyframe {
    Animation(AnimationKeyframeEntry),
    Transition(TransitionKeyframeEntry),
    #[serde(other)]
    Unknown,
}

/// Wire shape accepting both the current and the legacy layout
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDocument {
    #[serde(default)]
    duration: Option<u32>,
    #[serde(default)]
    animation_keyframes: Option<Vec<AnimationKeyframeEntry>>,
    #[serde(default)]
    transition_keyframes: Option<Vec<TransitionKeyframeEntry>>,
    #[serde(default)]
    keyframes: Option<Vec<LegacyKeyframe>>,
}

impl From<RawDocument> for AnimationDocument {
    fn from(raw: RawDocument) -> Self {
        let duration = raw.duration.filter(|d| *d > 0).unwrap_or(DEFAULT_DURATION);
        let is_legacy = raw.animation_keyframes.is_none() && raw.transition_keyframes.is_none();

        let mut animation_keyframes = raw.animation_keyframes.unwrap_or_default();
        let mut transition_keyframes = raw.transition_keyframes.unwrap_or_default();

        if is_legacy {
            for entry in raw.keyframes.unwrap_or_default() {
                match entry {
                    LegacyKeyframe::Animation(kf) => animation_keyframes.push(kf),
                    LegacyKeyframe::Transition(kf) => transition_keyframes.push(kf),
                    LegacyKeyframe::Unknown => {
                        tracing::warn!("Skipping legacy keyframe with unknown type");
                    }
                }
            }
        }

        Self {
            duration,
            animation_keyframes,
            transition_keyframes,
        }
    }
}

impl AnimationDocument {
    /// Parse a document from JSON text
    pub fn from_json(json: &str) -> Result<Self, DocumentError> {
        Self::from_value(serde_json::from_str(json)?)
    }

    /// Parse a document from a JSON value
    pub fn from_value(value: serde_json::Value) -> Result<Self, DocumentError> {
        if value.is_null() {
            return Err(DocumentError::MissingData);
        }
        let raw: RawDocument = serde_json::from_value(value)?;
        Ok(raw.into())
    }

    /// Serialize as pretty-printed JSON
    pub fn to_json_pretty(&self) -> Result<String, DocumentError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl TimelineEngine {
    /// Snapshot the timeline content as a document
    pub fn export_animation(&self) -> AnimationDocument {
        AnimationDocument {
            duration: self.duration(),
            animation_keyframes: self
                .animation_keyframes()
                .map(|(time, kf)| AnimationKeyframeEntry {
                    time,
                    keyframe: kf.clone(),
                })
                .collect(),
            transition_keyframes: self
                .transition_keyframes()
                .map(|(time, kf)| TransitionKeyframeEntry {
                    time,
                    keyframe: *kf,
                })
                .collect(),
        }
    }

    /// Replace the timeline content with a parsed document.
    ///
    /// Keyframes at or beyond the document's duration are dropped.
    pub fn import_animation(&mut self, document: AnimationDocument) {
        let duration = document.duration.max(1);

        let mut animation = BTreeMap::new();
        for entry in document.animation_keyframes {
            if entry.time < duration {
                animation.insert(entry.time, entry.keyframe);
            } else {
                tracing::warn!("Dropping animation keyframe at {}s beyond {duration}s", entry.time);
            }
        }

        let mut transitions = BTreeMap::new();
        for entry in document.transition_keyframes {
            if entry.time < duration {
                transitions.insert(entry.time, entry.keyframe);
            } else {
                tracing::warn!(
                    "Dropping transition keyframe at {}s beyond {duration}s",
                    entry.time
                );
            }
        }

        tracing::info!(
            "Imported animation: {duration}s, {} animation keyframes, {} transition keyframes",
            animation.len(),
            transitions.len()
        );
        self.replace_contents(duration, animation, transitions);
    }

    /// Parse and import JSON text. On error the timeline is left untouched.
    pub fn import_json(&mut self, json: &str) -> Result<(), DocumentError> {
        let document = AnimationDocument::from_json(json)?;
        self.import_animation(document);
        Ok(())
    }

    /// Export the timeline as pretty-printed JSON
    pub fn export_json(&self) -> Result<String, DocumentError> {
        self.export_animation().to_json_pretty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyframe::Easing;
    use crate::param::ParamName;
    use crate::transition::{SlideDirection, TransitionDirection, TransitionShape, TransitionUnit};

    fn sample_engine() -> TimelineEngine {
        let mut engine = TimelineEngine::new();
        engine.set_duration(8);
        engine.set_animation_param(0, ParamName::Opacity, 0.0).unwrap();
        engine.set_animation_param(2, ParamName::Opacity, 1.0).unwrap();
        engine.set_animation_param(2, ParamName::Stagger, 0.25).unwrap();
        engine.set_keyframe_easing(2, Easing::EaseInOut).unwrap();
        engine
            .add_transition_keyframe(
                1,
                TransitionKeyframe::new(
                    TransitionDirection::Out,
                    TransitionShape::Slide,
                    TransitionUnit::PerWord,
                )
                .with_timing(1.5, 0.25)
                .with_slide_direction(SlideDirection::Right),
            )
            .unwrap();
        engine
    }

    #[test]
    fn test_export_import_round_trip() {
        let engine = sample_engine();
        let json = engine.export_json().unwrap();

        let mut restored = TimelineEngine::new();
        restored.import_json(&json).unwrap();

        assert_eq!(restored.duration(), 8);
        assert_eq!(restored.export_animation(), engine.export_animation());
    }

    #[test]
    fn test_export_field_names() {
        let value = serde_json::to_value(sample_engine().export_animation()).unwrap();
        assert_eq!(value["duration"], 8);
        assert_eq!(value["animationKeyframes"][1]["time"], 2);
        assert_eq!(value["animationKeyframes"][1]["easing"], "ease-in-out");
        assert_eq!(value["animationKeyframes"][1]["params"]["stagger"], 0.25);
        assert_eq!(value["transitionKeyframes"][0]["transitionType"], "slide");
        assert_eq!(value["transitionKeyframes"][0]["mode"], "per-word");
        assert_eq!(value["transitionKeyframes"][0]["stagger"], 0.25);
    }

    #[test]
    fn test_legacy_format() {
        let json = r#"{
            "duration": 6,
            "keyframes": [
                { "time": 0, "type": "animation", "params": { "bounceAmount": 1.0 } },
                {
                    "time": 3,
                    "type": "transition",
                    "direction": "out",
                    "transitionType": "explode"
                },
                { "time": 4, "type": "marker" }
            ]
        }"#;
        let mut engine = TimelineEngine::new();
        engine.import_json(json).unwrap();

        assert_eq!(engine.duration(), 6);
        let anim = engine.animation_keyframe(0).unwrap();
        assert_eq!(anim.params.get(ParamName::BounceAmount), Some(1.0));
        assert_eq!(anim.easing, Easing::Linear);
        let trans = engine.transition_keyframe(3).unwrap();
        assert_eq!(trans.shape, TransitionShape::Explode);
        assert_eq!(trans.duration, 3.0);
    }

    #[test]
    fn test_modern_lists_take_precedence_over_legacy() {
        let json = r#"{
            "duration": 5,
            "animationKeyframes": [],
            "keyframes": [{ "time": 1, "type": "animation", "params": { "spread": 1 } }]
        }"#;
        let mut engine = TimelineEngine::new();
        engine.import_json(json).unwrap();
        assert!(!engine.has_animation_keyframe(1));
    }

    #[test]
    fn test_malformed_import_leaves_state() {
        let mut engine = sample_engine();
        let before = engine.export_animation();

        assert!(matches!(engine.import_json("null"), Err(DocumentError::MissingData)));
        assert!(engine.import_json("{ not json").is_err());
        assert!(engine
            .import_json(r#"{"animationKeyframes": [{"params": {}}]}"#)
            .is_err());

        assert_eq!(engine.export_animation(), before);
    }

    #[test]
    fn test_missing_duration_defaults_and_prunes() {
        let json = r#"{
            "animationKeyframes": [
                { "time": 3, "params": { "opacity": 0.5 } },
                { "time": 12, "params": { "opacity": 1 } }
            ]
        }"#;
        let mut engine = TimelineEngine::new();
        engine.import_json(json).unwrap();
        assert_eq!(engine.duration(), 10);
        assert!(engine.has_animation_keyframe(3));
        assert!(!engine.has_animation_keyframe(12));
    }
}
