// SPDX-License-Identifier: MIT OR Apache-2.0
//! Particle geometry handed to the field by a glyph converter.

use serde::{Deserialize, Serialize};

/// Per-particle grouping metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticleMeta {
    /// Global character index
    pub char_index: u32,
    /// Word index
    pub word_index: u32,
    /// Index of the particle within its character
    pub particle_in_char: u32,
}

impl ParticleMeta {
    /// Create metadata
    pub fn new(char_index: u32, word_index: u32, particle_in_char: u32) -> Self {
        Self {
            char_index,
            word_index,
            particle_in_char,
        }
    }
}

/// Particle positions with parallel metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    /// Original particle positions
    pub positions: Vec<[f64; 3]>,
    /// Metadata, one entry per position
    pub metadata: Vec<ParticleMeta>,
}

impl Geometry {
    /// Append one particle
    pub fn push(&mut self, position: [f64; 3], meta: ParticleMeta) {
        self.positions.push(position);
        self.metadata.push(meta);
    }

    /// Number of particles
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Whether there are no particles
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Shift all positions so the XY bounding box is centered on the origin
    pub fn center(&mut self) {
        if self.positions.is_empty() {
            return;
        }
        let (mut min_x, mut max_x) = (f64::INFINITY, f64::NEG_INFINITY);
        let (mut min_y, mut max_y) = (f64::INFINITY, f64::NEG_INFINITY);
        for [x, y, _] in &self.positions {
            min_x = min_x.min(*x);
            max_x = max_x.max(*x);
            min_y = min_y.min(*y);
            max_y = max_y.max(*y);
        }
        let cx = (min_x + max_x) / 2.0;
        let cy = (min_y + max_y) / 2.0;
        for p in &mut self.positions {
            p[0] -= cx;
            p[1] -= cy;
        }
    }
}

/// Converts text into particle geometry
pub trait GeometrySource {
    /// Produce geometry for `text`
    fn generate(&self, text: &str) -> Geometry;
}
