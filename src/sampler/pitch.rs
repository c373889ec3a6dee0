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

use crate::audio::AudioBuffer;

/// Produces a transposed rendition of a sample for a target note.
///
/// Pitch-shifting algorithms are outside this crate; hosts plug one in when
/// building a layer map. The transform is keyed by the target note only, so
/// the map can reuse one rendition across velocity layers that share audio.
pub trait PitchShift: Send + Sync {
    fn transpose(&self, buffer: &AudioBuffer, note: u8) -> AudioBuffer;
}

/// Identity transform for instruments whose boxes are played as recorded.
pub struct NoPitchShift;

impl PitchShift for NoPitchShift {
    fn transpose(&self, buffer: &AudioBuffer, _note: u8) -> AudioBuffer {
        buffer.clone()
    }
}
