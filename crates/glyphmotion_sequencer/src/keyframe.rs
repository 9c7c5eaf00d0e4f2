// SPDX-License-Identifier: MIT OR Apache-2.0
//! Animation keyframe definitions for the sequencer.

use crate::param::{ParamName, ParamSet};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Easing curve applied between a keyframe and the next one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Easing {
    /// `t`
    #[default]
    Linear,
    /// Cubic ease-in, `t³`
    EaseIn,
    /// Cubic ease-out, `1 - (1 - t)³`
    EaseOut,
    /// Symmetric cubic ease-in-out
    EaseInOut,
}

impl Easing {
    /// All easing curves, in editor order
    pub const ALL: [Easing; 4] = [
        Easing::Linear,
        Easing::EaseIn,
        Easing::EaseOut,
        Easing::EaseInOut,
    ];

    /// Resolve a document name. Unknown names fall back to linear.
    pub fn from_name(name: &str) -> Self {
        match name {
            "ease-in" => Self::EaseIn,
            "ease-out" => Self::EaseOut,
            "ease-in-out" => Self::EaseInOut,
            _ => Self::Linear,
        }
    }

    /// Name used in persisted documents
    pub fn name(self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::EaseIn => "ease-in",
            Self::EaseOut => "ease-out",
            Self::EaseInOut => "ease-in-out",
        }
    }

    /// Apply the curve to a progress value in `[0, 1]`
    pub fn apply(self, t: f64) -> f64 {
        match self {
            Self::Linear => t,
            Self::EaseIn => t * t * t,
            Self::EaseOut => 1.0 - (1.0 - t).powi(3),
            Self::EaseInOut => ease_in_out_cubic(t),
        }
    }
}

/// Symmetric cubic ease-in-out, crossing over at `t = 0.5`
pub fn ease_in_out_cubic(t: f64) -> f64 {
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}

impl fmt::Display for Easing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<String> for Easing {
    fn from(name: String) -> Self {
        Self::from_name(&name)
    }
}

impl From<Easing> for String {
    fn from(easing: Easing) -> Self {
        easing.name().to_string()
    }
}

/// A parameter keyframe. Its time is the key it is stored under.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnimationKeyframe {
    /// Parameters authored at this time
    #[serde(default)]
    pub params: ParamSet,
    /// Easing toward the next keyframe defining the same parameter
    #[serde(default)]
    pub easing: Easing,
}

impl AnimationKeyframe {
    /// Create a keyframe with linear easing
    pub fn new(params: ParamSet) -> Self {
        Self {
            params,
            easing: Easing::Linear,
        }
    }

    /// Set easing
    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    /// Builder-style parameter insert
    pub fn with_param(mut self, name: ParamName, value: f64) -> Self {
        self.params.set(name, value);
        self
    }
}

/// Interpolation utilities
pub struct Interpolation;

impl Interpolation {
    /// Linear interpolation between two values
    pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
        a + (b - a) * t
    }

    /// Eased interpolation between two keyframe values
    pub fn eased(a: f64, b: f64, t: f64, easing: Easing) -> f64 {
        Self::lerp(a, b, easing.apply(t))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_easing_curves() {
        assert_eq!(Easing::Linear.apply(0.25), 0.25);
        assert_eq!(Easing::EaseIn.apply(0.5), 0.125);
        assert_eq!(Easing::EaseOut.apply(0.5), 0.875);
        assert_eq!(Easing::EaseInOut.apply(0.5), 0.5);
        for easing in Easing::ALL {
            assert_eq!(easing.apply(0.0), 0.0);
            assert_eq!(easing.apply(1.0), 1.0);
        }
    }

    #[test]
    fn test_unknown_easing_is_linear() {
        assert_eq!(Easing::from_name("bounce"), Easing::Linear);
        let easing: Easing = serde_json::from_str("\"elastic\"").unwrap();
        assert_eq!(easing, Easing::Linear);
    }

    #[test]
    fn test_easing_names() {
        for easing in Easing::ALL {
            assert_eq!(Easing::from_name(easing.name()), easing);
        }
        assert_eq!(serde_json::to_string(&Easing::EaseInOut).unwrap(), "\"ease-in-out\"");
    }

    #[test]
    fn test_keyframe_defaults_on_deserialize() {
        let kf: AnimationKeyframe = serde_json::from_str(r#"{"params": {"spread": 0.5}}"#).unwrap();
        assert_eq!(kf.easing, Easing::Linear);
        assert_eq!(kf.params.get(ParamName::Spread), Some(0.5));
    }

    #[test]
    fn test_eased_interpolation() {
        assert_eq!(Interpolation::eased(0.0, 10.0, 0.5, Easing::Linear), 5.0);
        assert_eq!(Interpolation::eased(0.0, 10.0, 0.5, Easing::EaseIn), 1.25);
    }
}
