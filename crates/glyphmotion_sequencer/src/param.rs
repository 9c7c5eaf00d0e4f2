// SPDX-License-Identifier: MIT OR Apache-2.0
//! Animatable parameter catalogue.
//!
//! Every value the timeline can drive is named by [`ParamName`]. Keyframes
//! store a sparse [`ParamSet`] (only authored parameters are present), while
//! evaluation always produces a dense [`ParamValues`] snapshot.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Name of an animatable parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ParamName {
    /// Per-character phase delay, also drives the global/per-character blend
    Stagger,
    /// Phase spread between particles of one character
    Spread,
    /// Vertical bounce amplitude
    BounceAmount,
    /// Rotation amplitude (radians)
    RotationAmount,
    /// Scale pulse amplitude
    ScaleAmount,
    /// Depth wave amplitude
    WaveAmount,
    /// Noise displacement amplitude
    NoiseAmount,
    /// Whole-field rotation in degrees
    MeshRotation,
    /// Rendered point size
    ParticleSize,
    /// Material opacity
    Opacity,
}

/// Value range and editor step of a parameter
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamRange {
    /// Value before any keyframe defines the parameter
    pub default: f64,
    /// Minimum editor value
    pub min: f64,
    /// Maximum editor value
    pub max: f64,
    /// Editor step
    pub step: f64,
}

impl ParamName {
    /// Number of parameters
    pub const COUNT: usize = 10;

    /// All parameters in catalogue order
    pub const ALL: [ParamName; Self::COUNT] = [
        ParamName::Stagger,
        ParamName::Spread,
        ParamName::BounceAmount,
        ParamName::RotationAmount,
        ParamName::ScaleAmount,
        ParamName::WaveAmount,
        ParamName::NoiseAmount,
        ParamName::MeshRotation,
        ParamName::ParticleSize,
        ParamName::Opacity,
    ];

    /// Parameters that the particle field eases toward their target
    pub const SMOOTHED: [ParamName; 7] = [
        ParamName::Stagger,
        ParamName::Spread,
        ParamName::BounceAmount,
        ParamName::RotationAmount,
        ParamName::ScaleAmount,
        ParamName::WaveAmount,
        ParamName::NoiseAmount,
    ];

    /// Position in [`ParamName::ALL`]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Position in [`ParamName::SMOOTHED`], `None` for immediate parameters
    pub fn smoothed_index(self) -> Option<usize> {
        Self::SMOOTHED.iter().position(|p| *p == self)
    }

    /// Whether the particle field smooths this parameter
    pub fn is_smoothed(self) -> bool {
        self.smoothed_index().is_some()
    }

    /// Key used in persisted documents
    pub fn key(self) -> &'static str {
        match self {
            Self::Stagger => "stagger",
            Self::Spread => "spread",
            Self::BounceAmount => "bounceAmount",
            Self::RotationAmount => "rotationAmount",
            Self::ScaleAmount => "scaleAmount",
            Self::WaveAmount => "waveAmount",
            Self::NoiseAmount => "noiseAmount",
            Self::MeshRotation => "meshRotation",
            Self::ParticleSize => "particleSize",
            Self::Opacity => "opacity",
        }
    }

    /// Look up a parameter by its document key
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.key() == key)
    }

    /// Range, default and step of this parameter
    pub fn range(self) -> ParamRange {
        let (default, min, max, step) = match self {
            Self::Stagger => (0.0, 0.0, 0.5, 0.01),
            Self::Spread => (0.0, 0.0, 1.0, 0.05),
            Self::BounceAmount => (0.0, 0.0, 3.0, 0.1),
            Self::RotationAmount => (0.0, 0.0, 1.0, 0.05),
            Self::ScaleAmount => (0.0, 0.0, 0.5, 0.05),
            Self::WaveAmount => (0.0, 0.0, 5.0, 0.1),
            Self::NoiseAmount => (0.0, 0.0, 3.0, 0.1),
            Self::MeshRotation => (0.0, -360.0, 360.0, 1.0),
            Self::ParticleSize => (0.3, 0.1, 2.0, 0.1),
            Self::Opacity => (1.0, 0.0, 1.0, 0.05),
        };
        ParamRange { default, min, max, step }
    }

    /// Default value of this parameter
    pub fn default_value(self) -> f64 {
        self.range().default
    }
}

impl fmt::Display for ParamName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Error returned when parsing an unknown parameter key
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown parameter: {0}")]
pub struct UnknownParam(pub String);

impl FromStr for ParamName {
    type Err = UnknownParam;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_key(s).ok_or_else(|| UnknownParam(s.to_string()))
    }
}

/// Sparse parameter values authored on a keyframe
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, f64>", into = "BTreeMap<String, f64>")]
pub struct ParamSet {
    values: [Option<f64>; ParamName::COUNT],
}

impl ParamSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, name: ParamName, value: f64) -> Self {
        self.set(name, value);
        self
    }

    /// Value of a parameter, if authored
    pub fn get(&self, name: ParamName) -> Option<f64> {
        self.values[name.index()]
    }

    /// Whether the parameter is authored
    pub fn contains(&self, name: ParamName) -> bool {
        self.values[name.index()].is_some()
    }

    /// Author a parameter
    pub fn set(&mut self, name: ParamName, value: f64) {
        self.values[name.index()] = Some(value);
    }

    /// Remove a parameter, returning its previous value
    pub fn remove(&mut self, name: ParamName) -> Option<f64> {
        self.values[name.index()].take()
    }

    /// Number of authored parameters
    pub fn len(&self) -> usize {
        self.values.iter().filter(|v| v.is_some()).count()
    }

    /// Whether no parameter is authored
    pub fn is_empty(&self) -> bool {
        self.values.iter().all(Option::is_none)
    }

    /// Authored parameters in catalogue order
    pub fn iter(&self) -> impl Iterator<Item = (ParamName, f64)> + '_ {
        ParamName::ALL
            .into_iter()
            .filter_map(|name| self.get(name).map(|v| (name, v)))
    }
}

impl FromIterator<(ParamName, f64)> for ParamSet {
    fn from_iter<I: IntoIterator<Item = (ParamName, f64)>>(iter: I) -> Self {
        let mut set = ParamSet::new();
        for (name, value) in iter {
            set.set(name, value);
        }
        set
    }
}

// Unknown keys are dropped so documents from newer editors still load.
impl From<BTreeMap<String, f64>> for ParamSet {
    fn from(map: BTreeMap<String, f64>) -> Self {
        map.into_iter()
            .filter_map(|(key, value)| ParamName::from_key(&key).map(|name| (name, value)))
            .collect()
    }
}

impl From<ParamSet> for BTreeMap<String, f64> {
    fn from(set: ParamSet) -> Self {
        set.iter().map(|(name, value)| (name.key().to_string(), value)).collect()
    }
}

/// Dense snapshot holding a value for every parameter
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamValues {
    values: [f64; ParamName::COUNT],
}

impl ParamValues {
    /// Snapshot holding every parameter's default
    pub fn defaults() -> Self {
        let mut values = [0.0; ParamName::COUNT];
        for name in ParamName::ALL {
            values[name.index()] = name.default_value();
        }
        Self { values }
    }

    /// Value of a parameter
    pub fn get(&self, name: ParamName) -> f64 {
        self.values[name.index()]
    }

    /// Overwrite a parameter
    pub fn set(&mut self, name: ParamName, value: f64) {
        self.values[name.index()] = value;
    }

    /// All values in catalogue order
    pub fn iter(&self) -> impl Iterator<Item = (ParamName, f64)> + '_ {
        ParamName::ALL.into_iter().map(|name| (name, self.get(name)))
    }
}

impl Default for ParamValues {
    fn default() -> Self {
        Self::defaults()
    }
}
