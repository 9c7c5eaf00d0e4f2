// SPDX-License-Identifier: MIT OR Apache-2.0
//! Named effect presets.

use crate::field::{AppearanceUpdate, FieldKey, ParticleField, SpeedKnob};
use crate::noise::Noise3;
use glyphmotion_sequencer::ParamName;
use serde::{Deserialize, Serialize};

/// A full set of effect controls
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EffectPreset {
    /// Point size
    pub particle_size: f64,
    /// Phase clock multiplier
    pub animation_speed: f64,
    /// Whole-field rotation in degrees
    pub mesh_rotation: f64,
    /// Per-character delay
    pub stagger: f64,
    /// Phase spread within a character
    pub spread: f64,
    /// Bounce amplitude
    pub bounce_amount: f64,
    /// Bounce frequency
    pub bounce_speed: f64,
    /// Rotation amplitude
    pub rotation_amount: f64,
    /// Rotation frequency
    pub rotation_speed: f64,
    /// Scale pulse amplitude
    pub scale_amount: f64,
    /// Scale pulse frequency
    pub scale_speed: f64,
    /// Wave amplitude
    pub wave_amount: f64,
    /// Wave frequency
    pub wave_speed: f64,
    /// Noise amplitude
    pub noise_amount: f64,
    /// Noise drift speed
    pub noise_speed: f64,
}

impl Default for EffectPreset {
    fn default() -> Self {
        Self {
            particle_size: 0.3,
            animation_speed: 1.0,
            mesh_rotation: 0.0,
            stagger: 0.0,
            spread: 0.0,
            bounce_amount: 0.0,
            bounce_speed: 1.0,
            rotation_amount: 0.0,
            rotation_speed: 1.0,
            scale_amount: 0.0,
            scale_speed: 1.0,
            wave_amount: 0.0,
            wave_speed: 1.0,
            noise_amount: 0.0,
            noise_speed: 0.5,
        }
    }
}

impl EffectPreset {
    /// Every control except particle size, as field keys
    fn targets(&self) -> [(FieldKey, f64); 14] {
        use FieldKey::{Param, Speed};
        [
            (Speed(SpeedKnob::AnimationSpeed), self.animation_speed),
            (Param(ParamName::MeshRotation), self.mesh_rotation),
            (Param(ParamName::Stagger), self.stagger),
            (Param(ParamName::Spread), self.spread),
            (Param(ParamName::BounceAmount), self.bounce_amount),
            (Speed(SpeedKnob::BounceSpeed), self.bounce_speed),
            (Param(ParamName::RotationAmount), self.rotation_amount),
            (Speed(SpeedKnob::RotationSpeed), self.rotation_speed),
            (Param(ParamName::ScaleAmount), self.scale_amount),
            (Speed(SpeedKnob::ScaleSpeed), self.scale_speed),
            (Param(ParamName::WaveAmount), self.wave_amount),
            (Speed(SpeedKnob::WaveSpeed), self.wave_speed),
            (Param(ParamName::NoiseAmount), self.noise_amount),
            (Speed(SpeedKnob::NoiseSpeed), self.noise_speed),
        ]
    }
}

/// Presets shipped with the application, in menu order
pub fn builtin_presets() -> Vec<(&'static str, EffectPreset)> {
    let base = EffectPreset::default();
    vec![
        ("Default", base),
        (
            "Matrix Rain",
            EffectPreset {
                particle_size: 0.2,
                animation_speed: 1.5,
                scale_amount: 0.3,
                scale_speed: 2.0,
                wave_amount: 2.0,
                wave_speed: 1.5,
                ..base
            },
        ),
        (
            "Pulse",
            EffectPreset {
                particle_size: 0.4,
                animation_speed: 1.2,
                scale_amount: 0.5,
                scale_speed: 1.5,
                ..base
            },
        ),
        (
            "Wave",
            EffectPreset {
                wave_amount: 3.0,
                wave_speed: 1.0,
                ..base
            },
        ),
        (
            "Chaos",
            EffectPreset {
                particle_size: 0.25,
                animation_speed: 2.0,
                scale_amount: 0.5,
                scale_speed: 2.5,
                wave_amount: 2.0,
                wave_speed: 2.0,
                noise_amount: 2.0,
                noise_speed: 1.5,
                ..base
            },
        ),
        (
            "Subtle",
            EffectPreset {
                animation_speed: 0.5,
                scale_amount: 0.1,
                scale_speed: 0.5,
                wave_amount: 0.5,
                wave_speed: 0.5,
                ..base
            },
        ),
        (
            "Typewriter",
            EffectPreset {
                stagger: 0.2,
                spread: 0.3,
                bounce_amount: 1.0,
                bounce_speed: 3.0,
                scale_amount: 0.2,
                scale_speed: 2.0,
                ..base
            },
        ),
        (
            "Dancing Letters",
            EffectPreset {
                stagger: 0.15,
                spread: 0.7,
                bounce_amount: 2.0,
                bounce_speed: 1.5,
                rotation_amount: 0.3,
                rotation_speed: 1.0,
                ..base
            },
        ),
        (
            "Breathing Text",
            EffectPreset {
                animation_speed: 0.8,
                stagger: 0.08,
                spread: 0.4,
                bounce_amount: 0.5,
                bounce_speed: 0.8,
                scale_amount: 0.3,
                scale_speed: 1.0,
                ..base
            },
        ),
    ]
}

/// Look up a built-in preset by name
pub fn builtin_preset(name: &str) -> Option<EffectPreset> {
    builtin_presets()
        .into_iter()
        .find(|(n, _)| *n == name)
        .map(|(_, preset)| preset)
}

impl<N: Noise3> ParticleField<N> {
    /// Apply a preset: size immediately, the rest through [`ParticleField::set_target`]
    pub fn apply_preset(&mut self, preset: &EffectPreset) {
        self.update_params(AppearanceUpdate {
            particle_size: Some(preset.particle_size),
            ..Default::default()
        });
        for (key, value) in preset.targets() {
            self.set_target(key, value);
        }
    }
}
