// SPDX-License-Identifier: MIT OR Apache-2.0
//! Dot-grid fonts that turn text into particle geometry.
//!
//! A grid font maps each character to a boolean grid; every lit cell
//! becomes one particle. Spaces and unknown characters still advance the
//! cursor and consume a character index.

use glyphmotion_field::{Geometry, GeometrySource, ParticleMeta};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Errors loading a grid font
#[derive(Debug, thiserror::Error)]
pub enum FontError {
    /// Reading the font file failed
    #[error("Failed to read font {path}: {source}")]
    Io {
        /// Font file
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// The font file is not valid JSON
    #[error("Invalid font {path}: {source}")]
    Parse {
        /// Font file
        path: PathBuf,
        /// Underlying error
        source: serde_json::Error,
    },
}

/// Font file as stored on disk
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FontFile {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    grid_size: Option<[u32; 2]>,
    characters: HashMap<String, Vec<Vec<u8>>>,
}

/// 3x5 block glyphs for A-Z and 0-9, one bit per column (MSB left)
const BLOCK_GLYPHS: &[(char, [u8; 5])] = &[
    ('A', [0b010, 0b101, 0b111, 0b101, 0b101]),
    ('B', [0b110, 0b101, 0b110, 0b101, 0b110]),
    ('C', [0b011, 0b100, 0b100, 0b100, 0b011]),
    ('D', [0b110, 0b101, 0b101, 0b101, 0b110]),
    ('E', [0b111, 0b100, 0b110, 0b100, 0b111]),
    ('F', [0b111, 0b100, 0b110, 0b100, 0b100]),
    ('G', [0b011, 0b100, 0b101, 0b101, 0b011]),
    ('H', [0b101, 0b101, 0b111, 0b101, 0b101]),
    ('I', [0b111, 0b010, 0b010, 0b010, 0b111]),
    ('J', [0b001, 0b001, 0b001, 0b101, 0b010]),
    ('K', [0b101, 0b101, 0b110, 0b101, 0b101]),
    ('L', [0b100, 0b100, 0b100, 0b100, 0b111]),
    ('M', [0b101, 0b111, 0b111, 0b101, 0b101]),
    ('N', [0b110, 0b101, 0b101, 0b101, 0b101]),
    ('O', [0b010, 0b101, 0b101, 0b101, 0b010]),
    ('P', [0b110, 0b101, 0b110, 0b100, 0b100]),
    ('Q', [0b010, 0b101, 0b101, 0b110, 0b011]),
    ('R', [0b110, 0b101, 0b110, 0b101, 0b101]),
    ('S', [0b011, 0b100, 0b010, 0b001, 0b110]),
    ('T', [0b111, 0b010, 0b010, 0b010, 0b010]),
    ('U', [0b101, 0b101, 0b101, 0b101, 0b111]),
    ('V', [0b101, 0b101, 0b101, 0b101, 0b010]),
    ('W', [0b101, 0b101, 0b111, 0b111, 0b101]),
    ('X', [0b101, 0b101, 0b010, 0b101, 0b101]),
    ('Y', [0b101, 0b101, 0b010, 0b010, 0b010]),
    ('Z', [0b111, 0b001, 0b010, 0b100, 0b111]),
    ('0', [0b111, 0b101, 0b101, 0b101, 0b111]),
    ('1', [0b010, 0b110, 0b010, 0b010, 0b111]),
    ('2', [0b110, 0b001, 0b010, 0b100, 0b111]),
    ('3', [0b110, 0b001, 0b010, 0b001, 0b110]),
    ('4', [0b101, 0b101, 0b111, 0b001, 0b001]),
    ('5', [0b111, 0b100, 0b110, 0b001, 0b110]),
    ('6', [0b011, 0b100, 0b111, 0b101, 0b111]),
    ('7', [0b111, 0b001, 0b010, 0b010, 0b010]),
    ('8', [0b111, 0b101, 0b111, 0b101, 0b111]),
    ('9', [0b111, 0b101, 0b111, 0b001, 0b110]),
];

/// Text-to-particle converter backed by a dot-grid font
#[derive(Debug, Clone)]
pub struct GridFont {
    name: String,
    grid_width: u32,
    grid_height: u32,
    glyphs: HashMap<char, Vec<Vec<bool>>>,
    /// Horizontal gap between characters, in cells
    pub letter_spacing: f64,
    /// Vertical gap between lines, in cells
    pub line_spacing: f64,
    /// World units per cell
    pub dot_spacing: f64,
}

impl GridFont {
    fn with_glyphs(name: String, grid: [u32; 2], glyphs: HashMap<char, Vec<Vec<bool>>>) -> Self {
        Self {
            name,
            grid_width: grid[0],
            grid_height: grid[1],
            glyphs,
            letter_spacing: 1.0,
            line_spacing: 2.0,
            dot_spacing: 0.5,
        }
    }

    /// Built-in 3x5 block font
    pub fn block() -> Self {
        let glyphs = BLOCK_GLYPHS
            .iter()
            .map(|(c, rows)| {
                let grid = rows
                    .iter()
                    .map(|row| (0..3).map(|col| row & (0b100 >> col) != 0).collect())
                    .collect();
                (*c, grid)
            })
            .collect();
        Self::with_glyphs("Block".to_string(), [3, 5], glyphs)
    }

    /// Parse a JSON grid font
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let file: FontFile = serde_json::from_str(json)?;
        let glyphs = file
            .characters
            .into_iter()
            .filter_map(|(key, rows)| {
                let c = key.chars().next()?;
                let grid = rows
                    .into_iter()
                    .map(|row| row.into_iter().map(|cell| cell == 1).collect())
                    .collect();
                Some((c, grid))
            })
            .collect();
        Ok(Self::with_glyphs(
            file.name.unwrap_or_else(|| "Unknown".to_string()),
            file.grid_size.unwrap_or([5, 7]),
            glyphs,
        ))
    }

    /// Load a JSON grid font from disk
    pub fn load(path: &Path) -> Result<Self, FontError> {
        let json = std::fs::read_to_string(path).map_err(|source| FontError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let font = Self::from_json(&json).map_err(|source| FontError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::info!("Loaded font {} ({} glyphs)", font.name, font.glyphs.len());
        Ok(font)
    }

    /// Font name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Glyph for `c`, case-insensitive, falling back to the space glyph
    fn glyph(&self, c: char) -> Option<&Vec<Vec<bool>>> {
        let upper = c.to_uppercase().next().unwrap_or(c);
        self.glyphs.get(&upper).or_else(|| self.glyphs.get(&' '))
    }
}

impl GeometrySource for GridFont {
    fn generate(&self, text: &str) -> Geometry {
        let mut geometry = Geometry::default();
        let advance = f64::from(self.grid_width) + self.letter_spacing;
        let line_advance = f64::from(self.grid_height) + self.line_spacing;

        let mut char_index = 0u32;
        let mut word_index = 0u32;
        let mut cursor_y = 0.0;

        for line in text.split('\n') {
            let mut cursor_x = 0.0;
            for c in line.chars() {
                if c == ' ' {
                    word_index += 1;
                }

                if let Some(grid) = self.glyph(c) {
                    for (row, cells) in grid.iter().enumerate() {
                        for (col, lit) in cells.iter().enumerate() {
                            if !*lit {
                                continue;
                            }
                            let particle_in_char = (row * cells.len() + col) as u32;
                            geometry.push(
                                [
                                    (cursor_x + col as f64) * self.dot_spacing,
                                    -(cursor_y + row as f64) * self.dot_spacing,
                                    0.0,
                                ],
                                ParticleMeta::new(char_index, word_index, particle_in_char),
                            );
                        }
                    }
                }

                cursor_x += advance;
                char_index += 1;
            }
            cursor_y += line_advance;
            word_index += 1;
        }

        geometry.center();
        geometry
    }
}
