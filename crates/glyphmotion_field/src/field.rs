// SPDX-License-Identifier: MIT OR Apache-2.0
//! Procedural particle deformation field.
//!
//! The field keeps each particle's original position and recomputes a
//! display position every frame from layered effects (bounce, rotation,
//! scale, wave, noise) plus the running transition. It owns a phase clock
//! that only moves forward; seeking or looping the timeline never resets it.

use crate::geometry::{Geometry, ParticleMeta};
use crate::noise::{Noise3, PerlinNoise};
use crate::transition::TransitionController;
use glyphmotion_sequencer::{
    ParamName, ParamValues, TransitionDirection, TransitionKeyframe, TransitionShape,
    TransitionUnit,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Phase advance per update at animation speed 1.0
pub const PHASE_STEP: f64 = 0.016;
/// Fraction of the remaining distance covered per update
pub const DEFAULT_LERP_RATE: f64 = 0.08;
/// Smoothed values this close to their target snap onto it
pub const SNAP_EPSILON: f64 = 0.001;
/// Particles below this opacity are moved out of view
pub const HIDE_OPACITY: f64 = 0.01;
/// Where hidden particles are parked
pub const HIDDEN_POSITION: [f32; 3] = [0.0, 0.0, -9999.0];

/// Blend between whole-text motion (0) and per-character motion (1)
pub fn stagger_blend(stagger: f64) -> f64 {
    (stagger * 10.0).clamp(0.0, 1.0)
}

/// Active and target value of a smoothed parameter
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ParamState {
    /// Value used this frame
    pub active: f64,
    /// Value being eased toward
    pub target: f64,
}

/// Effect speed knobs, applied immediately
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EffectSpeeds {
    /// Phase clock multiplier
    pub animation_speed: f64,
    /// Bounce frequency
    pub bounce_speed: f64,
    /// Rotation frequency
    pub rotation_speed: f64,
    /// Scale pulse frequency
    pub scale_speed: f64,
    /// Wave frequency
    pub wave_speed: f64,
    /// Noise drift speed
    pub noise_speed: f64,
}

impl Default for EffectSpeeds {
    fn default() -> Self {
        Self {
            animation_speed: 1.0,
            bounce_speed: 1.0,
            rotation_speed: 1.0,
            scale_speed: 1.0,
            wave_speed: 1.0,
            noise_speed: 0.5,
        }
    }
}

/// Renderer-facing material settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Appearance {
    /// Point size
    pub particle_size: f64,
    /// RGB color as `0xRRGGBB`
    pub color: u32,
    /// Material opacity
    pub opacity: f64,
}

impl Default for Appearance {
    fn default() -> Self {
        Self {
            particle_size: 0.3,
            color: 0xFF_FF_FF,
            opacity: 1.0,
        }
    }
}

/// Partial appearance change; `None` fields are left as they are
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AppearanceUpdate {
    /// New point size
    pub particle_size: Option<f64>,
    /// New color
    pub color: Option<u32>,
    /// New opacity
    pub opacity: Option<f64>,
}

/// Effect speed knob
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpeedKnob {
    /// Phase clock multiplier
    AnimationSpeed,
    /// Bounce frequency
    BounceSpeed,
    /// Rotation frequency
    RotationSpeed,
    /// Scale pulse frequency
    ScaleSpeed,
    /// Wave frequency
    WaveSpeed,
    /// Noise drift speed
    NoiseSpeed,
}

impl SpeedKnob {
    /// All knobs
    pub const ALL: [SpeedKnob; 6] = [
        SpeedKnob::AnimationSpeed,
        SpeedKnob::BounceSpeed,
        SpeedKnob::RotationSpeed,
        SpeedKnob::ScaleSpeed,
        SpeedKnob::WaveSpeed,
        SpeedKnob::NoiseSpeed,
    ];

    /// Control key
    pub fn key(self) -> &'static str {
        match self {
            Self::AnimationSpeed => "animationSpeed",
            Self::BounceSpeed => "bounceSpeed",
            Self::RotationSpeed => "rotationSpeed",
            Self::ScaleSpeed => "scaleSpeed",
            Self::WaveSpeed => "waveSpeed",
            Self::NoiseSpeed => "noiseSpeed",
        }
    }
}

impl EffectSpeeds {
    /// Read one knob
    pub fn get(&self, knob: SpeedKnob) -> f64 {
        match knob {
            SpeedKnob::AnimationSpeed => self.animation_speed,
            SpeedKnob::BounceSpeed => self.bounce_speed,
            SpeedKnob::RotationSpeed => self.rotation_speed,
            SpeedKnob::ScaleSpeed => self.scale_speed,
            SpeedKnob::WaveSpeed => self.wave_speed,
            SpeedKnob::NoiseSpeed => self.noise_speed,
        }
    }

    /// Write one knob
    pub fn set(&mut self, knob: SpeedKnob, value: f64) {
        let slot = match knob {
            SpeedKnob::AnimationSpeed => &mut self.animation_speed,
            SpeedKnob::BounceSpeed => &mut self.bounce_speed,
            SpeedKnob::RotationSpeed => &mut self.rotation_speed,
            SpeedKnob::ScaleSpeed => &mut self.scale_speed,
            SpeedKnob::WaveSpeed => &mut self.wave_speed,
            SpeedKnob::NoiseSpeed => &mut self.noise_speed,
        };
        *slot = value;
    }
}

/// Anything the field accepts through [`ParticleField::set_target`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKey {
    /// Timeline parameter
    Param(ParamName),
    /// Effect speed
    Speed(SpeedKnob),
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Param(name) => f.write_str(name.key()),
            Self::Speed(knob) => f.write_str(knob.key()),
        }
    }
}

/// Key that names neither a parameter nor a speed knob
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown field key: {0}")]
pub struct UnknownFieldKey(pub String);

impl FromStr for FieldKey {
    type Err = UnknownFieldKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(name) = ParamName::from_key(s) {
            return Ok(Self::Param(name));
        }
        SpeedKnob::ALL
            .into_iter()
            .find(|k| k.key() == s)
            .map(Self::Speed)
            .ok_or_else(|| UnknownFieldKey(s.to_string()))
    }
}

/// One particle's immutable input
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    /// Original position
    pub origin: [f64; 3],
    /// Grouping metadata, absent when the source supplied none
    pub meta: Option<ParticleMeta>,
}

/// Values shared by every particle in one frame
#[derive(Debug, Clone, Copy)]
struct FrameParams {
    time: f64,
    blend: f64,
    stagger: f64,
    spread: f64,
    bounce: f64,
    rotation: f64,
    scale: f64,
    wave: f64,
    noise: f64,
    speeds: EffectSpeeds,
}

/// Particle deformation field driven by smoothed effect parameters
pub struct ParticleField<N = PerlinNoise> {
    particles: Vec<Particle>,
    char_centers: HashMap<u32, [f64; 2]>,
    /// Display positions, one per particle
    positions: Vec<[f32; 3]>,
    dirty: bool,
    /// Phase clock
    time: f64,
    lerp_rate: f64,
    /// Indexed by [`ParamName::smoothed_index`]
    smoothed: [ParamState; ParamName::SMOOTHED.len()],
    is_lerping: bool,
    mesh_rotation: f64,
    speeds: EffectSpeeds,
    appearance: Appearance,
    transition: TransitionController,
    noise: N,
}

impl ParticleField<PerlinNoise> {
    /// Create an empty field with the default noise source
    pub fn new() -> Self {
        Self::with_noise(PerlinNoise::default())
    }
}

impl Default for ParticleField<PerlinNoise> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N: Noise3> ParticleField<N> {
    /// Create an empty field sampling `noise`
    pub fn with_noise(noise: N) -> Self {
        Self {
            particles: Vec::new(),
            char_centers: HashMap::new(),
            positions: Vec::new(),
            dirty: false,
            time: 0.0,
            lerp_rate: DEFAULT_LERP_RATE,
            smoothed: [ParamState::default(); ParamName::SMOOTHED.len()],
            is_lerping: false,
            mesh_rotation: ParamName::MeshRotation.default_value(),
            speeds: EffectSpeeds::default(),
            appearance: Appearance::default(),
            transition: TransitionController::new(),
            noise,
        }
    }

    // ========== Geometry ==========

    /// Replace all particles. Missing metadata entries leave those
    /// particles ungrouped.
    pub fn update_particles(&mut self, positions: &[[f64; 3]], metadata: &[ParticleMeta]) {
        if !metadata.is_empty() && metadata.len() != positions.len() {
            tracing::warn!(
                "Particle metadata length {} does not match {} positions",
                metadata.len(),
                positions.len()
            );
        }

        self.particles = positions
            .iter()
            .enumerate()
            .map(|(i, origin)| Particle {
                origin: *origin,
                meta: metadata.get(i).copied(),
            })
            .collect();

        let mut sums: HashMap<u32, (f64, f64, u32)> = HashMap::new();
        for particle in &self.particles {
            if let Some(meta) = particle.meta {
                let acc = sums.entry(meta.char_index).or_insert((0.0, 0.0, 0));
                acc.0 += particle.origin[0];
                acc.1 += particle.origin[1];
                acc.2 += 1;
            }
        }
        self.char_centers = sums
            .into_iter()
            .map(|(index, (sx, sy, n))| (index, [sx / f64::from(n), sy / f64::from(n)]))
            .collect();

        self.positions = self
            .particles
            .iter()
            .map(|p| p.origin.map(|v| v as f32))
            .collect();
        self.dirty = true;

        tracing::debug!(
            "Geometry replaced: {} particles, {} characters",
            self.particles.len(),
            self.char_centers.len()
        );
    }

    /// Replace all particles from generated geometry
    pub fn set_geometry(&mut self, geometry: &Geometry) {
        self.update_particles(&geometry.positions, &geometry.metadata);
    }

    /// Number of particles
    pub fn particle_count(&self) -> usize {
        self.particles.len()
    }

    /// Particles in input order
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Centroid of a character's original positions
    pub fn char_center(&self, char_index: u32) -> Option<[f64; 2]> {
        self.char_centers.get(&char_index).copied()
    }

    /// Number of characters (highest character index + 1)
    pub fn total_chars(&self) -> u32 {
        self.max_meta_index(|m| m.char_index)
    }

    /// Number of words (highest word index + 1)
    pub fn total_words(&self) -> u32 {
        self.max_meta_index(|m| m.word_index)
    }

    fn max_meta_index(&self, index: impl Fn(&ParticleMeta) -> u32) -> u32 {
        self.particles
            .iter()
            .filter_map(|p| p.meta.as_ref().map(&index))
            .max()
            .map_or(0, |max| max + 1)
    }

    // ========== Frame update ==========

    /// Advance one frame. Returns whether display positions were recomputed.
    pub fn update(&mut self) -> bool {
        if self.particles.is_empty() {
            return false;
        }

        self.time += PHASE_STEP * self.speeds.animation_speed;

        self.is_lerping = false;
        for state in &mut self.smoothed {
            let diff = state.target - state.active;
            if diff.abs() > SNAP_EPSILON {
                state.active += diff * self.lerp_rate;
                self.is_lerping = true;
            } else {
                state.active = state.target;
            }
        }

        if self.transition.is_active() && self.transition.is_complete(self.time) {
            self.transition.stop();
        }

        let has_metadata = self.particles.iter().any(|p| p.meta.is_some());
        let needs_update = self.effects_active()
            || self.is_lerping
            || self.transition.is_active()
            || (!self.transition.default_visible() && has_metadata);

        if needs_update {
            self.update_positions();
        }
        needs_update
    }

    fn effects_active(&self) -> bool {
        [
            ParamName::BounceAmount,
            ParamName::RotationAmount,
            ParamName::ScaleAmount,
            ParamName::WaveAmount,
            ParamName::NoiseAmount,
        ]
        .into_iter()
        .any(|name| self.param(name) > 0.0)
    }

    fn frame_params(&self) -> FrameParams {
        let stagger = self.param(ParamName::Stagger);
        FrameParams {
            time: self.time,
            blend: stagger_blend(stagger),
            stagger,
            spread: self.param(ParamName::Spread),
            bounce: self.param(ParamName::BounceAmount),
            rotation: self.param(ParamName::RotationAmount),
            scale: self.param(ParamName::ScaleAmount),
            wave: self.param(ParamName::WaveAmount),
            noise: self.param(ParamName::NoiseAmount),
            speeds: self.speeds,
        }
    }

    fn update_positions(&mut self) {
        let f = self.frame_params();

        for (i, particle) in self.particles.iter().enumerate() {
            let [ox, oy, oz] = particle.origin;
            let (mut x, mut y, mut z) = (ox, oy, oz);

            let meta = particle.meta.unwrap_or_default();
            let char_index = f64::from(meta.char_index);
            let char_delay = char_index * f.stagger;
            let phase_offset = f.spread * f64::from(meta.particle_in_char) * 0.15;
            let effect_time = f.time - char_delay + phase_offset;

            let [cx, cy] = self
                .char_centers
                .get(&meta.char_index)
                .copied()
                .unwrap_or([0.0, 0.0]);
            let (pivot_x, pivot_y) = (f.blend * cx, f.blend * cy);

            if f.bounce > 0.0 {
                y += (effect_time * f.speeds.bounce_speed).sin() * f.bounce;
            }

            if f.rotation > 0.0 {
                let angle = (effect_time * f.speeds.rotation_speed * 2.0).sin() * f.rotation;
                let (sin, cos) = angle.sin_cos();
                let (rx, ry) = (x - pivot_x, y - pivot_y);
                x = pivot_x + rx * cos - ry * sin;
                y = pivot_y + rx * sin + ry * cos;
            }

            if f.scale > 0.0 {
                let phase = effect_time * f.speeds.scale_speed * 2.0;
                let factor = 1.0 + phase.sin() * f.scale;
                x = pivot_x + (x - pivot_x) * factor;
                y = pivot_y + (y - pivot_y) * factor;
                z += (phase + i as f64 * 0.1).sin() * f.scale * 2.0 * (1.0 - f.blend);
            }

            if f.wave > 0.0 {
                let spatial_phase = f.time * f.speeds.wave_speed;
                let spatial = (ox * 0.5 + spatial_phase).sin() * f.wave
                    + (oy * 0.5 + spatial_phase * 0.7).cos() * f.wave * 0.5;
                let index_phase = effect_time * f.speeds.wave_speed;
                let indexed =
                    index_phase.sin() * f.wave + (index_phase * 0.7).cos() * f.wave * 0.5;
                z += spatial * (1.0 - f.blend) + indexed * f.blend;
            }

            if f.noise > 0.0 {
                let noise_time = f.time * f.speeds.noise_speed;
                let (sx, sy) = (ox * 0.1, oy * 0.1);
                let spatial = [
                    self.noise.noise3(sx, sy, noise_time),
                    self.noise.noise3(sx + 100.0, sy, noise_time),
                    self.noise.noise3(sx, sy + 100.0, noise_time),
                ];
                let char_time = noise_time - char_delay + phase_offset;
                let cn = char_index * 1.7;
                let grouped = [
                    self.noise.noise3(cn, 0.0, char_time),
                    self.noise.noise3(cn + 100.0, 0.0, char_time),
                    self.noise.noise3(cn, 100.0, char_time),
                ];
                let mix = |axis: usize| {
                    (spatial[axis] * (1.0 - f.blend) + grouped[axis] * f.blend) * f.noise
                };
                x += mix(0);
                y += mix(1);
                z += mix(2);
            }

            let contribution = self.transition.contribution(particle.meta.as_ref(), f.time);
            x += contribution.offset[0];
            y += contribution.offset[1];
            z += contribution.offset[2];

            self.positions[i] = if contribution.opacity < HIDE_OPACITY {
                HIDDEN_POSITION
            } else {
                [x as f32, y as f32, z as f32]
            };
        }

        self.dirty = true;
    }

    /// Display positions from the last update
    pub fn positions(&self) -> &[[f32; 3]] {
        &self.positions
    }

    /// Whether positions changed since the renderer last uploaded them
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Mark positions as uploaded
    pub fn clear_dirty(&mut self) {
        self.dirty = false;
    }

    /// Phase clock value
    pub fn phase_time(&self) -> f64 {
        self.time
    }

    // ========== Parameters ==========

    /// Current value of a parameter (active value for smoothed ones)
    pub fn param(&self, name: ParamName) -> f64 {
        match name.smoothed_index() {
            Some(i) => self.smoothed[i].active,
            None => match name {
                ParamName::MeshRotation => self.mesh_rotation,
                ParamName::ParticleSize => self.appearance.particle_size,
                _ => self.appearance.opacity,
            },
        }
    }

    /// Active/target pair of a smoothed parameter
    pub fn param_state(&self, name: ParamName) -> Option<ParamState> {
        name.smoothed_index().map(|i| self.smoothed[i])
    }

    /// Whether any smoothed parameter moved toward its target last update
    pub fn is_lerping(&self) -> bool {
        self.is_lerping
    }

    /// Set a target. Smoothed parameters ease toward it, everything else
    /// applies immediately.
    pub fn set_target(&mut self, key: FieldKey, value: f64) {
        match key {
            FieldKey::Param(name) => match name.smoothed_index() {
                Some(i) => self.smoothed[i].target = value,
                None => self.set_immediate(name, value),
            },
            FieldKey::Speed(knob) => self.speeds.set(knob, value),
        }
    }

    /// [`ParticleField::set_target`] by control key
    pub fn set_target_by_key(&mut self, key: &str, value: f64) -> Result<(), UnknownFieldKey> {
        let key = key.parse()?;
        self.set_target(key, value);
        Ok(())
    }

    fn set_immediate(&mut self, name: ParamName, value: f64) {
        match name {
            ParamName::MeshRotation => self.mesh_rotation = value,
            ParamName::ParticleSize => self.update_params(AppearanceUpdate {
                particle_size: Some(value),
                ..Default::default()
            }),
            ParamName::Opacity => self.update_params(AppearanceUpdate {
                opacity: Some(value),
                ..Default::default()
            }),
            _ => {}
        }
    }

    /// Apply a timeline snapshot, bypassing smoothing
    pub fn apply_snapshot(&mut self, values: &ParamValues) {
        for (i, name) in ParamName::SMOOTHED.into_iter().enumerate() {
            let value = values.get(name);
            self.smoothed[i] = ParamState {
                active: value,
                target: value,
            };
        }
        self.mesh_rotation = values.get(ParamName::MeshRotation);
        self.update_params(AppearanceUpdate {
            particle_size: Some(values.get(ParamName::ParticleSize)),
            opacity: Some(values.get(ParamName::Opacity)),
            color: None,
        });
    }

    /// Merge appearance changes
    pub fn update_params(&mut self, update: AppearanceUpdate) {
        if let Some(size) = update.particle_size {
            self.appearance.particle_size = size;
        }
        if let Some(color) = update.color {
            self.appearance.color = color;
        }
        if let Some(opacity) = update.opacity {
            self.appearance.opacity = opacity;
        }
    }

    /// Material settings
    pub fn appearance(&self) -> Appearance {
        self.appearance
    }

    /// Effect speeds
    pub fn speeds(&self) -> EffectSpeeds {
        self.speeds
    }

    /// Replace all effect speeds
    pub fn set_speeds(&mut self, speeds: EffectSpeeds) {
        self.speeds = speeds;
    }

    /// Whole-field rotation in degrees
    pub fn mesh_rotation(&self) -> f64 {
        self.mesh_rotation
    }

    /// Whole-field rotation about Y in radians, for the renderer
    pub fn mesh_rotation_radians(&self) -> f64 {
        self.mesh_rotation.to_radians()
    }

    /// Smoothing rate
    pub fn lerp_rate(&self) -> f64 {
        self.lerp_rate
    }

    /// Set the smoothing rate, clamped to `(0, 1]`
    pub fn set_lerp_rate(&mut self, rate: f64) {
        self.lerp_rate = rate.clamp(f64::EPSILON, 1.0);
    }

    // ========== Transitions ==========

    /// Start an `in` transition at the current phase time
    pub fn transition_in(&mut self, shape: TransitionShape, unit: TransitionUnit) {
        self.start_transition(TransitionDirection::In, shape, unit);
    }

    /// Start an `out` transition at the current phase time
    pub fn transition_out(&mut self, shape: TransitionShape, unit: TransitionUnit) {
        self.start_transition(TransitionDirection::Out, shape, unit);
    }

    fn start_transition(
        &mut self,
        direction: TransitionDirection,
        shape: TransitionShape,
        unit: TransitionUnit,
    ) {
        let total_units = match unit {
            TransitionUnit::PerLetter => self.total_chars(),
            TransitionUnit::PerWord => self.total_words(),
        };
        self.transition
            .start(direction, shape, unit, self.time, total_units);
    }

    /// Configure the controller from a keyframe and start its transition
    pub fn trigger_transition(&mut self, keyframe: &TransitionKeyframe) {
        self.transition.set_duration(keyframe.duration);
        self.transition.set_stagger_delay(keyframe.stagger_delay);
        self.transition.set_slide_direction(keyframe.slide_direction);
        self.start_transition(keyframe.direction, keyframe.shape, keyframe.unit);
    }

    /// End the running transition now
    pub fn stop_transition(&mut self) {
        self.transition.stop();
    }

    /// Whether a transition is running
    pub fn is_transitioning(&self) -> bool {
        self.transition.is_active()
    }

    /// Whether text is visible while no transition runs
    pub fn default_visible(&self) -> bool {
        self.transition.default_visible()
    }

    /// Transition controller
    pub fn transition(&self) -> &TransitionController {
        &self.transition
    }

    /// Transition controller, for changing its settings
    pub fn transition_mut(&mut self) -> &mut TransitionController {
        &mut self.transition
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glyphmotion_sequencer::SlideDirection;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    /// Two characters of two particles each, second character in a second word
    fn two_chars() -> Geometry {
        let mut geometry = Geometry::default();
        geometry.push([0.0, 0.0, 0.0], ParticleMeta::new(0, 0, 0));
        geometry.push([2.0, 2.0, 0.0], ParticleMeta::new(0, 0, 1));
        geometry.push([4.0, 0.0, 0.0], ParticleMeta::new(1, 1, 0));
        geometry.push([6.0, 4.0, 0.0], ParticleMeta::new(1, 1, 1));
        geometry
    }

    fn flat_field() -> ParticleField<fn(f64, f64, f64) -> f64> {
        fn zero(_: f64, _: f64, _: f64) -> f64 {
            0.0
        }
        let mut field = ParticleField::with_noise(zero as fn(f64, f64, f64) -> f64);
        field.set_geometry(&two_chars());
        field
    }

    #[test]
    fn test_stagger_blend() {
        assert!(approx_eq(stagger_blend(0.03), 0.3));
        assert_eq!(stagger_blend(0.2), 1.0);
        assert_eq!(stagger_blend(0.0), 0.0);
        assert_eq!(stagger_blend(-1.0), 0.0);
    }

    #[test]
    fn test_char_centers_and_counts() {
        let field = flat_field();
        assert_eq!(field.char_center(0), Some([1.0, 1.0]));
        assert_eq!(field.char_center(1), Some([5.0, 2.0]));
        assert_eq!(field.total_chars(), 2);
        assert_eq!(field.total_words(), 2);
        assert_eq!(field.particle_count(), 4);
        assert!(field.is_dirty());
    }

    #[test]
    fn test_empty_geometry_is_noop() {
        let mut field = ParticleField::new();
        assert!(!field.update());
        assert_eq!(field.phase_time(), 0.0);
        assert_eq!(field.total_chars(), 0);
    }

    #[test]
    fn test_missing_metadata() {
        let mut field = ParticleField::new();
        field.update_particles(&[[1.0, 1.0, 0.0], [2.0, 0.0, 0.0]], &[ParticleMeta::new(3, 0, 0)]);
        assert_eq!(field.particles()[1].meta, None);
        assert_eq!(field.total_chars(), 4);
        assert_eq!(field.char_center(3), Some([1.0, 1.0]));
    }

    #[test]
    fn test_smoothing_converges_and_snaps() {
        let mut field = flat_field();
        field.set_target(FieldKey::Param(ParamName::BounceAmount), 1.0);

        field.update();
        let state = field.param_state(ParamName::BounceAmount).unwrap();
        assert!(approx_eq(state.active, 0.08));
        assert!(field.is_lerping());

        for _ in 0..200 {
            field.update();
        }
        assert_eq!(field.param(ParamName::BounceAmount), 1.0);
        assert!(!field.is_lerping());
    }

    #[test]
    fn test_snapshot_bypasses_smoothing() {
        let mut field = flat_field();
        let mut values = ParamValues::defaults();
        values.set(ParamName::WaveAmount, 2.5);
        values.set(ParamName::MeshRotation, 90.0);
        values.set(ParamName::Opacity, 0.4);
        field.apply_snapshot(&values);

        assert_eq!(
            field.param_state(ParamName::WaveAmount),
            Some(ParamState { active: 2.5, target: 2.5 })
        );
        assert!(approx_eq(field.mesh_rotation_radians(), std::f64::consts::FRAC_PI_2));
        assert_eq!(field.appearance().opacity, 0.4);
    }

    #[test]
    fn test_immediate_targets() {
        let mut field = flat_field();
        field.set_target_by_key("particleSize", 1.2).unwrap();
        field.set_target_by_key("noiseSpeed", 2.0).unwrap();
        field.set_target_by_key("meshRotation", 45.0).unwrap();
        assert_eq!(field.appearance().particle_size, 1.2);
        assert_eq!(field.speeds().noise_speed, 2.0);
        assert_eq!(field.mesh_rotation(), 45.0);
        assert!(field.set_target_by_key("sparkle", 1.0).is_err());
    }

    #[test]
    fn test_idle_field_skips_positions() {
        let mut field = flat_field();
        field.clear_dirty();
        assert!(!field.update());
        assert!(!field.is_dirty());
        assert!(approx_eq(field.phase_time(), PHASE_STEP));
    }

    #[test]
    fn test_bounce_displacement() {
        let mut field = flat_field();
        let mut values = ParamValues::defaults();
        values.set(ParamName::BounceAmount, 2.0);
        field.apply_snapshot(&values);

        assert!(field.update());
        let expected = (PHASE_STEP.sin() * 2.0) as f32;
        assert!((field.positions()[0][1] - expected).abs() < 1e-6);
        assert!((field.positions()[1][1] - (2.0 + expected)).abs() < 1e-6);
    }

    #[test]
    fn test_constant_noise_offsets_every_axis() {
        let mut field = ParticleField::with_noise(|_: f64, _: f64, _: f64| 0.5);
        field.set_geometry(&two_chars());
        field.set_speeds(EffectSpeeds {
            animation_speed: 0.0,
            ..Default::default()
        });
        let mut values = ParamValues::defaults();
        values.set(ParamName::NoiseAmount, 2.0);
        field.apply_snapshot(&values);

        field.update();
        assert_eq!(field.positions()[2], [5.0, 1.0, 1.0]);
    }

    #[test]
    fn test_transition_out_hides_particles() {
        let mut field = flat_field();
        let keyframe = TransitionKeyframe::new(
            TransitionDirection::Out,
            TransitionShape::Slide,
            TransitionUnit::PerWord,
        )
        .with_timing(0.05, 0.0)
        .with_slide_direction(SlideDirection::Left);
        field.trigger_transition(&keyframe);

        assert!(field.is_transitioning());
        assert_eq!(field.transition().active().map(|a| a.total_units), Some(2));
        assert_eq!(field.transition().slide_direction(), SlideDirection::Left);

        for _ in 0..5 {
            field.update();
        }
        assert!(!field.is_transitioning());
        assert!(!field.default_visible());
        assert!(field.positions().iter().all(|p| *p == HIDDEN_POSITION));

        // Hidden text keeps being recomputed so a later `in` can reveal it
        field.clear_dirty();
        assert!(field.update());
    }

    #[test]
    fn test_transition_in_reveals() {
        let mut field = flat_field();
        field.transition_mut().set_duration(0.032);
        field.transition_mut().set_stagger_delay(0.0);
        field.transition_in(TransitionShape::Fade, TransitionUnit::PerLetter);

        field.update();
        assert!(field.is_transitioning());
        field.update();
        assert!(!field.is_transitioning());
        assert!(field.default_visible());
    }

    #[test]
    fn test_stop_transition() {
        let mut field = flat_field();
        field.transition_out(TransitionShape::Explode, TransitionUnit::PerLetter);
        field.stop_transition();
        assert!(!field.is_transitioning());
        assert!(!field.default_visible());
    }

    fn close(actual: f32, expected: f64) -> bool {
        (f64::from(actual) - expected).abs() < 1e-5
    }

    #[test]
    fn test_rotation_pivots_on_char_center() {
        let mut field = flat_field();
        let mut values = ParamValues::defaults();
        values.set(ParamName::Stagger, 0.2);
        values.set(ParamName::RotationAmount, 0.5);
        field.apply_snapshot(&values);

        assert!(field.update());
        // Full blend: each character turns about its own centroid
        let cases = [(0, 0.0, [0.0, 0.0], [1.0, 1.0]), (3, 1.0, [6.0, 4.0], [5.0, 2.0])];
        for (i, char_index, [ox, oy], [px, py]) in cases {
            let effect_time = PHASE_STEP - char_index * 0.2;
            let angle = (effect_time * 2.0).sin() * 0.5;
            let (sin, cos) = angle.sin_cos();
            let (rx, ry) = (ox - px, oy - py);
            let position = field.positions()[i];
            assert!(close(position[0], px + rx * cos - ry * sin));
            assert!(close(position[1], py + rx * sin + ry * cos));
            assert_eq!(position[2], 0.0);
        }
    }

    #[test]
    fn test_scale_depth_and_wave_mix() {
        let mut field = flat_field();
        let mut values = ParamValues::defaults();
        values.set(ParamName::Stagger, 0.03);
        values.set(ParamName::ScaleAmount, 0.4);
        values.set(ParamName::WaveAmount, 0.5);
        field.apply_snapshot(&values);

        assert!(field.update());
        let blend = 0.3;
        let geometry = two_chars();
        for (i, origin) in geometry.positions.iter().enumerate() {
            let [ox, oy, _] = *origin;
            let char_index = f64::from(geometry.metadata[i].char_index);
            let [cx, cy] = field.char_center(geometry.metadata[i].char_index).unwrap();
            let (px, py) = (blend * cx, blend * cy);
            let effect_time = PHASE_STEP - char_index * 0.03;

            let phase = effect_time * 2.0;
            let factor = 1.0 + phase.sin() * 0.4;
            let depth = (phase + i as f64 * 0.1).sin() * 0.4 * 2.0 * (1.0 - blend);
            let spatial =
                (ox * 0.5 + PHASE_STEP).sin() * 0.5 + (oy * 0.5 + PHASE_STEP * 0.7).cos() * 0.25;
            let indexed = effect_time.sin() * 0.5 + (effect_time * 0.7).cos() * 0.25;

            let position = field.positions()[i];
            assert!(close(position[0], px + (ox - px) * factor));
            assert!(close(position[1], py + (oy - py) * factor));
            assert!(close(position[2], depth + spatial * (1.0 - blend) + indexed * blend));
        }
    }

    #[test]
    fn test_spread_shifts_phase_within_char() {
        let mut field = flat_field();
        let mut values = ParamValues::defaults();
        values.set(ParamName::Spread, 1.0);
        values.set(ParamName::BounceAmount, 1.0);
        field.apply_snapshot(&values);

        assert!(field.update());
        assert!(close(field.positions()[0][1], PHASE_STEP.sin()));
        assert!(close(field.positions()[1][1], 2.0 + (PHASE_STEP + 0.15).sin()));
        assert!(close(field.positions()[3][1], 4.0 + (PHASE_STEP + 0.15).sin()));
    }

    #[test]
    fn test_zeroed_snapshot_keeps_last_positions() {
        let mut field = flat_field();
        let mut values = ParamValues::defaults();
        values.set(ParamName::BounceAmount, 2.0);
        field.apply_snapshot(&values);
        assert!(field.update());
        let displaced = field.positions().to_vec();
        assert_ne!(displaced[0], [0.0, 0.0, 0.0]);

        // Nothing is active or lerping, so the displaced frame stays
        field.apply_snapshot(&ParamValues::defaults());
        field.clear_dirty();
        assert!(!field.update());
        assert!(!field.is_dirty());
        assert_eq!(field.positions(), displaced.as_slice());
    }
}
