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
use crate::effects::{block_range, Effect, ParamSet, TURNED_ON};

/// Scales every sample by the `value` parameter.
pub struct VolumeEffect {
    name: String,
    params: ParamSet,
}

impl VolumeEffect {
    pub fn new(name: &str) -> Self {
        let mut params = ParamSet::new();
        params.insert(TURNED_ON, 1.0, 0.0, 1.0);
        params.insert("value", 1.0, 0.0, 1.0);
        Self {
            name: name.to_string(),
            params,
        }
    }
}

impl Effect for VolumeEffect {
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
        let gain = self.params.value("value").unwrap_or(1.0);
        let range = block_range(buffer, start_sample, num_samples);
        for channel in 0..buffer.channel_count() {
            for sample in &mut buffer.channel_mut(channel)[range.clone()] {
                *sample *= gain;
            }
        }
    }
}
