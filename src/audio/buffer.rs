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

//! Planar f32 audio buffer shared by the sampler and the effect rack.

/// A planar (non-interleaved) buffer of f32 samples. All channels have the
/// same frame count.
#[derive(Clone, Debug, Default)]
pub struct AudioBuffer {
    channels: Vec<Vec<f32>>,
}

impl AudioBuffer {
    /// Creates a silent buffer with the given shape.
    pub fn new(channel_count: usize, frames: usize) -> Self {
        Self {
            channels: vec![vec![0.0; frames]; channel_count],
        }
    }

    /// Wraps existing channel data. Shorter channels are zero-padded so every
    /// channel ends up with the length of the longest one.
    pub fn from_channels(mut channels: Vec<Vec<f32>>) -> Self {
        let frames = channels.iter().map(Vec::len).max().unwrap_or(0);
        for channel in &mut channels {
            channel.resize(frames, 0.0);
        }
        Self { channels }
    }

    /// Returns the number of channels.
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Returns the number of frames per channel.
    pub fn frames(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }

    /// Returns true if the buffer holds no audio at all.
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty() || self.frames() == 0
    }

    /// Returns a read slice for one channel.
    pub fn channel(&self, index: usize) -> &[f32] {
        &self.channels[index]
    }

    /// Returns a write slice for one channel.
    pub fn channel_mut(&mut self, index: usize) -> &mut [f32] {
        &mut self.channels[index]
    }

    /// Zeroes every sample.
    pub fn clear(&mut self) {
        for channel in &mut self.channels {
            channel.fill(0.0);
        }
    }

    /// Grows every channel to at least `frames`, zero-padding the tail.
    /// Never shrinks.
    pub fn grow_to(&mut self, frames: usize) {
        if frames <= self.frames() {
            return;
        }
        for channel in &mut self.channels {
            channel.resize(frames, 0.0);
        }
    }

    /// Additively mixes `frames` samples of `source_channel` into `channel`,
    /// starting at frame 0 on both sides. The destination must already be
    /// large enough.
    pub fn add_from(
        &mut self,
        channel: usize,
        source: &AudioBuffer,
        source_channel: usize,
        frames: usize,
    ) {
        let dest = &mut self.channels[channel];
        let src = source.channel(source_channel);
        for i in 0..frames.min(src.len()).min(dest.len()) {
            dest[i] += src[i];
        }
    }

    /// Returns a stereo view of this buffer's content: mono input is
    /// duplicated onto both channels, anything beyond two channels is
    /// dropped.
    pub fn to_stereo(&self) -> AudioBuffer {
        match self.channel_count() {
            0 => AudioBuffer::new(2, 0),
            1 => AudioBuffer::from_channels(vec![
                self.channels[0].clone(),
                self.channels[0].clone(),
            ]),
            _ => AudioBuffer::from_channels(vec![
                self.channels[0].clone(),
                self.channels[1].clone(),
            ]),
        }
    }
}
