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

/// Linear stereo pan. `value` runs -1 (hard left) to 1 (hard right); the
/// louder side stays at unity gain. A mono block passes through untouched.
pub struct PanEffect {
    name: String,
    params: ParamSet,
}

impl PanEffect {
    pub fn new(name: &str) -> Self {
        let mut params = ParamSet::new();
        params.insert(TURNED_ON, 1.0, 0.0, 1.0);
        params.insert("value", 0.0, -1.0, 1.0);
        Self {
            name: name.to_string(),
            params,
        }
    }
}

impl Effect for PanEffect {
    fn name(&self) -> &str {
        &self.name
    }

    fn params(&self) -> &ParamSet {
        &self.params
    }

    fn apply(&self, buffer: &mut AudioBuffer, start_sample: usize, num_samples: usize) {
        if !self.is_on() || buffer.channel_count() < 2 {
            return;
        }
        let value = self.params.value("value").unwrap_or(0.0);
        let left_gain = (1.0 - value).min(1.0);
        let right_gain = (1.0 + value).min(1.0);
        let range = block_range(buffer, start_sample, num_samples);

        for sample in &mut buffer.channel_mut(0)[range.clone()] {
            *sample *= left_gain;
        }
        for sample in &mut buffer.channel_mut(1)[range] {
            *sample *= right_gain;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_center_is_identity() {
        let pan = PanEffect::new("pan");
        let mut buffer = AudioBuffer::from_channels(vec![vec![0.5; 4], vec![0.5; 4]]);
        pan.apply(&mut buffer, 0, 4);
        assert_eq!(buffer.channel(0), &[0.5; 4]);
        assert_eq!(buffer.channel(1), &[0.5; 4]);
    }

    #[test]
    fn test_hard_right_silences_left() {
        let pan = PanEffect::new("pan");
        pan.set_param("value", 1.0);
        let mut buffer = AudioBuffer::from_channels(vec![vec![0.5; 4], vec![0.5; 4]]);
        pan.apply(&mut buffer, 0, 4);
        assert_eq!(buffer.channel(0), &[0.0; 4]);
        assert_eq!(buffer.channel(1), &[0.5; 4]);
    }

    #[test]
    fn test_partial_left_attenuates_right_only() {
        let pan = PanEffect::new("pan");
        pan.set_param("value", -0.5);
        let mut buffer = AudioBuffer::from_channels(vec![vec![1.0; 2], vec![1.0; 2]]);
        pan.apply(&mut buffer, 0, 2);
        assert_eq!(buffer.channel(0), &[1.0; 2]);
        assert_eq!(buffer.channel(1), &[0.5; 2]);
    }

    #[test]
    fn test_start_past_buffer_end_is_noop() {
        let pan = PanEffect::new("pan");
        pan.set_param("value", 1.0);
        let mut buffer = AudioBuffer::from_channels(vec![vec![0.5; 8], vec![0.5; 8]]);
        pan.apply(&mut buffer, 16, 4);
        assert_eq!(buffer.channel(0), &[0.5; 8]);
        assert_eq!(buffer.channel(1), &[0.5; 8]);
    }

    #[test]
    fn test_mono_passes_through() {
        let pan = PanEffect::new("pan");
        pan.set_param("value", 1.0);
        let mut buffer = AudioBuffer::from_channels(vec![vec![0.5; 4]]);
        pan.apply(&mut buffer, 0, 4);
        assert_eq!(buffer.channel(0), &[0.5; 4]);
    }
}
