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

use std::sync::Arc;

use crate::audio::AudioBuffer;
use crate::sampler::layer_map::LayeredSound;

/// Plays one buffer from start to end, mixing into the output block.
///
/// A renderer is a dumb cursor: it holds a shared handle to the sample data
/// and a frame offset, nothing else. Lifetime decisions (stealing, release
/// tails) belong to the allocator and the envelope gate.
#[derive(Default)]
pub struct VoiceRenderer {
    note: u8,
    velocity: u8,
    cursor: usize,
    frames: usize,
    buffer: Option<Arc<AudioBuffer>>,
}

impl VoiceRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether this renderer can play the given sound. All layered sounds
    /// render the same way, so this only checks that there is audio at all.
    pub fn can_start(&self, sound: &LayeredSound) -> bool {
        !sound.map().is_empty()
    }

    /// Points the cursor at the start of a buffer. Sample data is shared,
    /// never copied.
    pub fn start(&mut self, note: u8, velocity: u8, buffer: Arc<AudioBuffer>, frames: usize) {
        self.note = note;
        self.velocity = velocity;
        self.cursor = 0;
        self.frames = frames;
        self.buffer = Some(buffer);
    }

    /// Drops the assignment. The renderer is immediately reusable.
    pub fn stop(&mut self) {
        self.buffer = None;
        self.cursor = 0;
        self.frames = 0;
    }

    /// Whether the renderer holds a buffer with frames left to play.
    pub fn is_active(&self) -> bool {
        self.buffer.is_some() && self.cursor < self.frames
    }

    /// The note this renderer is sounding, if any.
    pub fn playing_note(&self) -> Option<u8> {
        self.buffer.as_ref().map(|_| self.note)
    }

    /// Mixes up to `num_samples` frames into `output` starting at
    /// `start_sample`, clamped to what remains of the source, and advances
    /// the cursor. Channel counts are reconciled: mono sources feed both
    /// output channels, stereo sources downmix to mono at half gain.
    pub fn render_block(&mut self, output: &mut AudioBuffer, start_sample: usize, num_samples: usize) {
        let Some(buffer) = self.buffer.as_ref() else {
            return;
        };
        if self.cursor >= self.frames {
            return;
        }
        let available = output.frames().saturating_sub(start_sample);
        let count = num_samples
            .min(self.frames - self.cursor)
            .min(available);
        let source_channels = buffer.channel_count();
        let output_channels = output.channel_count();

        for out_channel in 0..output_channels {
            match (source_channels, output_channels) {
                (0, _) => {}
                (1, _) => mix(output, out_channel, start_sample, buffer, 0, self.cursor, count, 1.0),
                (_, 1) => {
                    mix(output, 0, start_sample, buffer, 0, self.cursor, count, 0.5);
                    mix(output, 0, start_sample, buffer, 1, self.cursor, count, 0.5);
                }
                _ => {
                    let src = out_channel.min(source_channels - 1);
                    mix(output, out_channel, start_sample, buffer, src, self.cursor, count, 1.0);
                }
            }
        }
        self.cursor += count;
    }
}

#[allow(clippy::too_many_arguments)]
fn mix(
    output: &mut AudioBuffer,
    out_channel: usize,
    start_sample: usize,
    source: &AudioBuffer,
    source_channel: usize,
    cursor: usize,
    count: usize,
    gain: f32,
) {
    let dest = &mut output.channel_mut(out_channel)[start_sample..start_sample + count];
    let src = &source.channel(source_channel)[cursor..cursor + count];
    for (d, s) in dest.iter_mut().zip(src) {
        *d += s * gain;
    }
}

impl std::fmt::Debug for VoiceRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VoiceRenderer")
            .field("note", &self.note)
            .field("velocity", &self.velocity)
            .field("cursor", &self.cursor)
            .field("frames", &self.frames)
            .field("assigned", &self.buffer.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stereo_sample(left: f32, right: f32, frames: usize) -> Arc<AudioBuffer> {
        Arc::new(AudioBuffer::from_channels(vec![
            vec![left; frames],
            vec![right; frames],
        ]))
    }

    #[test]
    fn test_render_clamps_to_remaining_frames() {
        let mut voice = VoiceRenderer::new();
        voice.start(60, 100, stereo_sample(0.5, 0.5, 50), 50);

        let mut output = AudioBuffer::new(2, 80);
        voice.render_block(&mut output, 0, 80);

        assert_eq!(output.channel(0)[..50], [0.5; 50]);
        assert_eq!(output.channel(0)[50..], [0.0; 30]);
        assert!(!voice.is_active());

        // Exhausted voices render nothing further.
        let mut next = AudioBuffer::new(2, 80);
        voice.render_block(&mut next, 0, 80);
        assert_eq!(next.channel(0), &[0.0; 80]);
    }

    #[test]
    fn test_render_advances_across_blocks() {
        let source = Arc::new(AudioBuffer::from_channels(vec![
            (0..8).map(|i| i as f32).collect::<Vec<_>>(),
            vec![0.0; 8],
        ]));
        let mut voice = VoiceRenderer::new();
        voice.start(60, 100, source, 8);

        let mut first = AudioBuffer::new(2, 4);
        voice.render_block(&mut first, 0, 4);
        assert_eq!(first.channel(0), &[0.0, 1.0, 2.0, 3.0]);

        let mut second = AudioBuffer::new(2, 4);
        voice.render_block(&mut second, 0, 4);
        assert_eq!(second.channel(0), &[4.0, 5.0, 6.0, 7.0]);
        assert!(!voice.is_active());
    }

    #[test]
    fn test_mono_source_feeds_both_channels() {
        let source = Arc::new(AudioBuffer::from_channels(vec![vec![0.25; 4]]));
        let mut voice = VoiceRenderer::new();
        voice.start(60, 100, source, 4);

        let mut output = AudioBuffer::new(2, 4);
        voice.render_block(&mut output, 0, 4);
        assert_eq!(output.channel(0), &[0.25; 4]);
        assert_eq!(output.channel(1), &[0.25; 4]);
    }

    #[test]
    fn test_stereo_source_downmixes_to_mono() {
        let mut voice = VoiceRenderer::new();
        voice.start(60, 100, stereo_sample(1.0, 0.5, 4), 4);

        let mut output = AudioBuffer::new(1, 4);
        voice.render_block(&mut output, 0, 4);
        assert_eq!(output.channel(0), &[0.75; 4]);
    }

    #[test]
    fn test_mix_is_additive() {
        let mut voice = VoiceRenderer::new();
        voice.start(60, 100, stereo_sample(0.25, 0.25, 4), 4);

        let mut output = AudioBuffer::from_channels(vec![vec![0.5; 4], vec![0.5; 4]]);
        voice.render_block(&mut output, 0, 4);
        assert_eq!(output.channel(0), &[0.75; 4]);
    }

    #[test]
    fn test_stop_frees_renderer() {
        let mut voice = VoiceRenderer::new();
        voice.start(60, 100, stereo_sample(0.5, 0.5, 50), 50);
        assert!(voice.is_active());
        assert_eq!(voice.playing_note(), Some(60));

        voice.stop();
        assert!(!voice.is_active());
        assert_eq!(voice.playing_note(), None);

        let mut output = AudioBuffer::new(2, 8);
        voice.render_block(&mut output, 0, 8);
        assert_eq!(output.channel(0), &[0.0; 8]);
    }

    #[test]
    fn test_render_respects_block_offset() {
        let mut voice = VoiceRenderer::new();
        voice.start(60, 100, stereo_sample(0.5, 0.5, 16), 16);

        let mut output = AudioBuffer::new(2, 16);
        voice.render_block(&mut output, 4, 4);
        assert_eq!(output.channel(0)[..4], [0.0; 4]);
        assert_eq!(output.channel(0)[4..8], [0.5; 4]);
        assert_eq!(output.channel(0)[8..], [0.0; 8]);
    }
}
