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

//! Feedback delay line.

use parking_lot::Mutex;

use crate::audio::AudioBuffer;
use crate::config::ConfigError;
use crate::effects::{block_range, Effect, ParamSet, TURNED_ON};

/// Capacity of the delay line in seconds. Fixed at construction, never
/// reallocated.
const LINE_SECONDS: usize = 2;

struct DelayState {
    /// One circular buffer per channel (left, right).
    lines: [Vec<f32>; 2],
    read: usize,
    write: usize,
}

/// A stereo feedback delay. The write cursor continuously tracks
/// `time * sample_rate` samples ahead of the read cursor (modulo the line
/// length), so changing `time` live moves where future feedback lands
/// without resetting the line. Integer sample offsets only, no
/// interpolation.
pub struct DelayEffect {
    name: String,
    params: ParamSet,
    sample_rate: u32,
    state: Mutex<DelayState>,
}

impl DelayEffect {
    /// Creates a delay sized for `LINE_SECONDS` at the given sample rate.
    pub fn new(name: &str, sample_rate: u32) -> Result<Self, ConfigError> {
        if sample_rate == 0 {
            return Err(ConfigError::InvalidSampleRate);
        }
        let mut params = ParamSet::new();
        params.insert(TURNED_ON, 1.0, 0.0, 1.0);
        params.insert("dryWet", 1.0, 0.0, 1.0);
        params.insert("time", 0.5, 0.0, 1.0);
        params.insert("feedback", 0.5, 0.0, 1.0);

        let length = LINE_SECONDS * sample_rate as usize;
        Ok(Self {
            name: name.to_string(),
            params,
            sample_rate,
            state: Mutex::new(DelayState {
                lines: [vec![0.0; length], vec![0.0; length]],
                read: 0,
                write: 0,
            }),
        })
    }

    /// Integer sample offset for a delay time, always in bounds.
    fn offset(time: f32, sample_rate: u32, length: usize) -> usize {
        ((time * sample_rate as f32) as usize) % length.max(1)
    }
}

impl Effect for DelayEffect {
    fn name(&self) -> &str {
        &self.name
    }

    fn params(&self) -> &ParamSet {
        &self.params
    }

    fn apply(&self, buffer: &mut AudioBuffer, start_sample: usize, num_samples: usize) {
        if !self.is_on() {
            return;
        }
        let dry_wet = self.params.value("dryWet").unwrap_or(1.0);
        let feedback = self.params.value("feedback").unwrap_or(0.0);
        let time = self.params.value("time").unwrap_or(0.0);

        let mut state = self.state.lock();
        let length = state.lines[0].len();
        let offset = Self::offset(time, self.sample_rate, length);
        let channels = buffer.channel_count().min(2);
        let range = block_range(buffer, start_sample, num_samples);

        // A time change takes effect at the block boundary: re-derive the
        // write cursor from the read cursor before processing.
        state.write = (state.read + offset) % length;

        for sample in range {
            for channel in 0..channels {
                let echo = state.lines[channel][state.read] * dry_wet * feedback;
                let out = buffer.channel(channel)[sample] + echo;
                buffer.channel_mut(channel)[sample] = out;
                // The post-mix value is fed back into the line.
                let write = state.write;
                state.lines[channel][write] = out;
            }
            state.read = (state.read + 1) % length;
            state.write = (state.read + offset) % length;
        }
    }
}
