// SPDX-License-Identifier: MIT OR Apache-2.0
//! Particle deformation field for glyphmotion.
//!
//! This crate turns static glyph geometry into animated particles:
//! - Smoothed effect parameters (bounce, rotation, scale, wave, noise)
//! - Per-character pivots and stagger blending
//! - Staggered in/out transitions per letter or per word
//! - Named effect presets
//!
//! ## Architecture
//!
//! [`ParticleField`] owns the particles, a phase clock that only moves
//! forward, and a [`TransitionController`]. Hosts feed it geometry from a
//! [`GeometrySource`], snapshots from the timeline, and call
//! [`ParticleField::update`] once per frame before uploading
//! [`ParticleField::positions`].

pub mod field;
pub mod geometry;
pub mod noise;
pub mod presets;
pub mod transition;

pub use field::{
    stagger_blend, Appearance, AppearanceUpdate, EffectSpeeds, FieldKey, Particle, ParamState,
    ParticleField, SpeedKnob, UnknownFieldKey, HIDDEN_POSITION,
};
pub use geometry::{Geometry, GeometrySource, ParticleMeta};
pub use noise::{Noise3, PerlinNoise};
pub use presets::{builtin_preset, builtin_presets, EffectPreset};
pub use transition::{ActiveTransition, TransitionContribution, TransitionController};
