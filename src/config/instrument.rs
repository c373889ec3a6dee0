// Copyright (C) 2026 The strata authors
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::error::ConfigError;

/// Highest valid MIDI note or velocity value.
pub const MAX_NOTE: u8 = 127;

/// A YAML representation of a layered instrument: an ordered list of sample
/// boxes. Box order matters, it is the merge order during layer map
/// construction.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct InstrumentConfig {
    /// The instrument name, also used as the sound name at dispatch time.
    name: String,

    /// Restricts the instrument to one MIDI channel. Absent means all
    /// channels.
    channel: Option<u8>,

    /// The sample boxes, in declaration (merge) order.
    boxes: Vec<BoxConfig>,
}

/// A declared note/velocity region backed by one recorded sample.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct BoxConfig {
    /// The audio file for this box, relative to the instrument base path.
    file: String,

    /// The note the sample was recorded at.
    root_note: u8,

    /// Inclusive note range `[low, high]` this box covers.
    note_range: [u8; 2],

    /// Inclusive velocity range `[low, high]` this box covers.
    velocity_range: [u8; 2],

    /// How the sample is pitch-corrected across the note range.
    #[serde(default)]
    transpose: TransposeMode,
}

/// Transpose policy for a box.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransposeMode {
    /// Run the pitch-shift transform for every covered note.
    #[default]
    PitchShift,
    /// Play the sample as recorded on every covered note.
    None,
}

impl InstrumentConfig {
    /// Loads an instrument description from a YAML file and validates it.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: InstrumentConfig = serde_yml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks every box range, reporting the index and ranges of the first
    /// bad entry.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (index, sample_box) in self.boxes.iter().enumerate() {
            sample_box.validate(index)?;
        }
        Ok(())
    }

    /// Gets the instrument name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Gets the MIDI channel restriction, if any.
    pub fn channel(&self) -> Option<u8> {
        self.channel
    }

    /// Gets the boxes in declaration order.
    pub fn boxes(&self) -> &[BoxConfig] {
        &self.boxes
    }
}

impl BoxConfig {
    /// Gets the sample file path.
    pub fn file(&self) -> &str {
        &self.file
    }

    /// Gets the recorded root note.
    pub fn root_note(&self) -> u8 {
        self.root_note
    }

    /// Gets the inclusive note range.
    pub fn note_range(&self) -> (u8, u8) {
        (self.note_range[0], self.note_range[1])
    }

    /// Gets the inclusive velocity range.
    pub fn velocity_range(&self) -> (u8, u8) {
        (self.velocity_range[0], self.velocity_range[1])
    }

    /// Gets the transpose policy.
    pub fn transpose(&self) -> TransposeMode {
        self.transpose
    }

    fn validate(&self, index: usize) -> Result<(), ConfigError> {
        let checks = [
            ("note_range", self.note_range),
            ("velocity_range", self.velocity_range),
        ];
        for (field, [low, high]) in checks {
            if low > high {
                return Err(ConfigError::InvalidBox {
                    index,
                    reason: format!("{} is inverted ({}..{})", field, low, high),
                });
            }
            if high > MAX_NOTE {
                return Err(ConfigError::InvalidBox {
                    index,
                    reason: format!("{} exceeds {} ({}..{})", field, MAX_NOTE, low, high),
                });
            }
        }
        if self.root_note > MAX_NOTE {
            return Err(ConfigError::InvalidBox {
                index,
                reason: format!("root_note {} exceeds {}", self.root_note, MAX_NOTE),
            });
        }
        Ok(())
    }
}
