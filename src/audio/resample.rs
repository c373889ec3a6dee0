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

//! Deterministic sample-rate conversion for preloaded instrument samples.
//!
//! Linear interpolation is sufficient for one-shot sample material and keeps
//! the output length exactly predictable, which the layer map relies on for
//! its merge bookkeeping.

use super::buffer::AudioBuffer;

/// Rate-converts `source` by `ratio = source_rate / target_rate`, producing
/// exactly `floor(frames / ratio)` frames. Identical input always produces
/// identical output. A non-positive ratio yields an empty buffer.
pub fn resample(source: &AudioBuffer, ratio: f64) -> AudioBuffer {
    if !(ratio > 0.0) {
        return AudioBuffer::new(source.channel_count(), 0);
    }
    if ratio == 1.0 {
        return source.clone();
    }

    let source_frames = source.frames();
    let frames = (source_frames as f64 / ratio).floor() as usize;
    let mut channels = Vec::with_capacity(source.channel_count());

    for c in 0..source.channel_count() {
        let input = source.channel(c);
        let mut output = Vec::with_capacity(frames);
        for frame in 0..frames {
            let position = frame as f64 * ratio;
            let index = position.floor() as usize;
            let frac = position.fract() as f32;

            let s0 = input.get(index).copied().unwrap_or(0.0);
            let s1 = input.get(index + 1).copied().unwrap_or(s0);
            output.push(s0 + (s1 - s0) * frac);
        }
        channels.push(output);
    }

    AudioBuffer::from_channels(channels)
}
