// SPDX-License-Identifier: MIT OR Apache-2.0
//! Transition trigger keyframes.
//!
//! A transition keyframe does not interpolate. It fires once when the
//! playback clock crosses its time and tells the particle field to animate
//! letters or words into or out of view.

use serde::{Deserialize, Serialize};

/// Whether a transition reveals or hides the text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransitionDirection {
    /// Particles become visible
    #[default]
    In,
    /// Particles become hidden
    Out,
}

/// Motion used while a unit transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransitionShape {
    /// Emerge from depth
    #[default]
    Fade,
    /// Slide along an axis
    Slide,
    /// Scatter outward
    Explode,
    /// Converge inward
    Implode,
    /// Wind in along a spiral
    Spiral,
}

impl TransitionShape {
    /// All shapes
    pub const ALL: [TransitionShape; 5] = [
        TransitionShape::Fade,
        TransitionShape::Slide,
        TransitionShape::Explode,
        TransitionShape::Implode,
        TransitionShape::Spiral,
    ];
}

/// Granularity at which a transition staggers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransitionUnit {
    /// One unit per character
    #[default]
    PerLetter,
    /// One unit per word
    PerWord,
}

/// Edge a slide transition enters from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlideDirection {
    /// From above
    Top,
    /// From below
    #[default]
    Bottom,
    /// From the left
    Left,
    /// From the right
    Right,
}

/// A transition trigger. Its time is the key it is stored under.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TransitionKeyframe {
    /// In or out
    pub direction: TransitionDirection,
    /// Motion shape
    #[serde(rename = "transitionType")]
    pub shape: TransitionShape,
    /// Stagger granularity
    #[serde(rename = "mode")]
    pub unit: TransitionUnit,
    /// Seconds each unit takes to complete
    pub duration: f64,
    /// Seconds between consecutive units starting
    #[serde(rename = "stagger")]
    pub stagger_delay: f64,
    /// Entry edge for slide transitions
    pub slide_direction: SlideDirection,
}

impl TransitionKeyframe {
    /// Default seconds per unit
    pub const DEFAULT_DURATION: f64 = 3.0;
    /// Default seconds between units
    pub const DEFAULT_STAGGER: f64 = 0.1;

    /// Create a trigger with default timing
    pub fn new(
        direction: TransitionDirection,
        shape: TransitionShape,
        unit: TransitionUnit,
    ) -> Self {
        Self {
            direction,
            shape,
            unit,
            ..Self::default()
        }
    }

    /// Set per-unit duration and stagger delay
    pub fn with_timing(mut self, duration: f64, stagger_delay: f64) -> Self {
        self.duration = duration;
        self.stagger_delay = stagger_delay;
        self
    }

    /// Set slide entry edge
    pub fn with_slide_direction(mut self, slide_direction: SlideDirection) -> Self {
        self.slide_direction = slide_direction;
        self
    }
}

impl Default for TransitionKeyframe {
    fn default() -> Self {
        Self {
            direction: TransitionDirection::In,
            shape: TransitionShape::Fade,
            unit: TransitionUnit::PerLetter,
            duration: Self::DEFAULT_DURATION,
            stagger_delay: Self::DEFAULT_STAGGER,
            slide_direction: SlideDirection::Bottom,
        }
    }
}
