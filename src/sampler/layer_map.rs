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

//! Note/velocity layered sample addressing.
//!
//! Boxes declare which (note, velocity) cells a recorded sample covers.
//! Ingestion rate-converts each sample and writes its handle into a fixed
//! 128×128 grid, mixing where boxes overlap; a final transposition pass
//! produces the pitch-corrected buffer each cell plays, computed once per
//! distinct raw buffer per note.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;

use crate::audio::{resample, AudioBuffer};
use crate::config::{ConfigError, TransposeMode, MAX_NOTE};
use crate::sampler::pitch::PitchShift;

/// Grid side length: one cell per MIDI note/velocity value.
const GRID: usize = MAX_NOTE as usize + 1;

/// A recorded sample with the note/velocity region it covers, at its native
/// sample rate. Immutable once constructed.
pub struct SoundBox {
    root_note: u8,
    note_range: (u8, u8),
    velocity_range: (u8, u8),
    transpose: TransposeMode,
    buffer: AudioBuffer,
    sample_rate: u32,
}

impl SoundBox {
    pub fn new(
        root_note: u8,
        note_range: (u8, u8),
        velocity_range: (u8, u8),
        transpose: TransposeMode,
        buffer: AudioBuffer,
        sample_rate: u32,
    ) -> Self {
        Self {
            root_note,
            note_range,
            velocity_range,
            transpose,
            buffer,
            sample_rate,
        }
    }

    /// The note the sample was recorded at.
    pub fn root_note(&self) -> u8 {
        self.root_note
    }

    fn validate(&self, index: usize) -> Result<(), ConfigError> {
        for (field, (low, high)) in [
            ("note_range", self.note_range),
            ("velocity_range", self.velocity_range),
        ] {
            if low > high || high > MAX_NOTE {
                return Err(ConfigError::InvalidBox {
                    index,
                    reason: format!("{} out of order or range ({}..{})", field, low, high),
                });
            }
        }
        if self.sample_rate == 0 {
            return Err(ConfigError::InvalidSampleRate);
        }
        Ok(())
    }
}

/// Accumulates boxes into the layer grid. Ingestion order matters: it is
/// the merge order. `build` consumes the builder; a map is built once.
pub struct SampleLayerMapBuilder {
    host_sample_rate: u32,
    /// Rate-converted stereo buffers, one per ingested box. Grid cells hold
    /// indices into this arena; overlapping boxes mix in place here.
    arena: Vec<AudioBuffer>,
    /// Transpose policy of the box that created each arena buffer.
    modes: Vec<TransposeMode>,
    layer_grid: Vec<Option<usize>>,
    boxes_ingested: usize,
}

impl SampleLayerMapBuilder {
    pub fn new(host_sample_rate: u32) -> Result<Self, ConfigError> {
        if host_sample_rate == 0 {
            return Err(ConfigError::InvalidSampleRate);
        }
        Ok(Self {
            host_sample_rate,
            arena: Vec::new(),
            modes: Vec::new(),
            layer_grid: vec![None; GRID * GRID],
            boxes_ingested: 0,
        })
    }

    /// Rate-converts the box's sample and writes it into every cell of the
    /// box's region. An empty cell takes the new handle directly; a cell
    /// already holding an earlier box's buffer gets the new audio mixed into
    /// that buffer instead, at most once per ingestion per buffer.
    pub fn ingest(&mut self, sound_box: &SoundBox) -> Result<(), ConfigError> {
        sound_box.validate(self.boxes_ingested)?;

        let stereo = sound_box.buffer.to_stereo();
        let ratio = sound_box.sample_rate as f64 / self.host_sample_rate as f64;
        let converted = resample(&stereo, ratio);
        debug!(
            index = self.boxes_ingested,
            frames = converted.frames(),
            root_note = sound_box.root_note,
            "ingesting box"
        );

        self.arena.push(converted);
        self.modes.push(sound_box.transpose);
        let handle = self.arena.len() - 1;

        let (note_low, note_high) = sound_box.note_range;
        let (vel_low, vel_high) = sound_box.velocity_range;
        let mut merged: HashSet<usize> = HashSet::new();

        for note in note_low..=note_high {
            for velocity in vel_low..=vel_high {
                let cell = note as usize * GRID + velocity as usize;
                match self.layer_grid[cell] {
                    None => self.layer_grid[cell] = Some(handle),
                    Some(existing) if existing != handle && !merged.contains(&existing) => {
                        // The new buffer is always last in the arena, so the
                        // split at `handle` keeps the borrows disjoint.
                        let (head, tail) = self.arena.split_at_mut(handle);
                        let dest = &mut head[existing];
                        let src = &tail[0];
                        dest.grow_to(src.frames());
                        for channel in 0..2 {
                            dest.add_from(channel, src, channel, src.frames());
                        }
                        merged.insert(existing);
                    }
                    Some(_) => {}
                }
            }
        }

        self.boxes_ingested += 1;
        Ok(())
    }

    /// Runs the transposition pass and produces the finished map. The
    /// pitch-shift transform runs once per distinct raw buffer per note;
    /// consecutive velocities sharing a raw buffer share its result.
    pub fn build(self, pitch_shift: &dyn PitchShift) -> SampleLayerMap {
        let mut buffers: Vec<Arc<AudioBuffer>> = Vec::new();
        let mut full_grid: Vec<Option<usize>> = vec![None; GRID * GRID];

        for note in 0..GRID {
            let mut prev_layer: Option<usize> = None;
            let mut prev_full: Option<usize> = None;
            for velocity in 0..GRID {
                let cell = note * GRID + velocity;
                match self.layer_grid[cell] {
                    None => {}
                    Some(handle) if Some(handle) == prev_layer => {
                        full_grid[cell] = prev_full;
                    }
                    Some(handle) => {
                        let raw = &self.arena[handle];
                        let transposed = match self.modes[handle] {
                            TransposeMode::PitchShift => {
                                pitch_shift.transpose(raw, note as u8)
                            }
                            TransposeMode::None => raw.clone(),
                        };
                        buffers.push(Arc::new(transposed));
                        let full = buffers.len() - 1;
                        full_grid[cell] = Some(full);
                        prev_layer = Some(handle);
                        prev_full = Some(full);
                    }
                }
            }
        }

        SampleLayerMap { full_grid, buffers }
    }
}

/// The finished note/velocity → buffer mapping. Immutable; cheap shared
/// handles are handed to voices at note-on.
pub struct SampleLayerMap {
    full_grid: Vec<Option<usize>>,
    buffers: Vec<Arc<AudioBuffer>>,
}

impl SampleLayerMap {
    /// An empty map: every lookup misses.
    pub fn empty() -> Self {
        Self {
            full_grid: vec![None; GRID * GRID],
            buffers: Vec::new(),
        }
    }

    /// The authoritative playback buffer for a cell, with its frame count.
    /// Out-of-range indices and empty cells miss.
    pub fn lookup(&self, note: u8, velocity: u8) -> Option<(Arc<AudioBuffer>, usize)> {
        if note > MAX_NOTE || velocity > MAX_NOTE {
            return None;
        }
        let cell = note as usize * GRID + velocity as usize;
        let buffer = &self.buffers[self.full_grid[cell]?];
        let frames = buffer.frames();
        if frames == 0 {
            return None;
        }
        Some((buffer.clone(), frames))
    }

    /// Whether any velocity at this note has playable audio.
    pub fn has_note(&self, note: u8) -> bool {
        (0..=MAX_NOTE).any(|velocity| self.lookup(note, velocity).is_some())
    }

    /// Whether no cell has playable audio.
    pub fn is_empty(&self) -> bool {
        self.buffers.iter().all(|b| b.frames() == 0)
    }
}

/// A named instrument: a layer map plus its dispatch constraints.
pub struct LayeredSound {
    name: String,
    channel: Option<u8>,
    map: SampleLayerMap,
}

impl LayeredSound {
    pub fn new(name: &str, channel: Option<u8>, map: SampleLayerMap) -> Self {
        Self {
            name: name.to_string(),
            channel,
            map,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether this sound listens on the given MIDI channel.
    pub fn applies_to_channel(&self, channel: u8) -> bool {
        self.channel.map_or(true, |c| c == channel)
    }

    /// Whether this sound responds to the given event at all.
    pub fn applies_to(&self, channel: u8, note: u8, velocity: u8) -> bool {
        self.applies_to_channel(channel) && self.map.lookup(note, velocity).is_some()
    }

    pub fn map(&self) -> &SampleLayerMap {
        &self.map
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampler::pitch::NoPitchShift;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const RATE: u32 = 48000;

    /// Identity transform that counts invocations.
    struct CountingShift {
        calls: AtomicUsize,
    }

    impl CountingShift {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl PitchShift for CountingShift {
        fn transpose(&self, buffer: &AudioBuffer, _note: u8) -> AudioBuffer {
            self.calls.fetch_add(1, Ordering::SeqCst);
            buffer.clone()
        }
    }

    fn mono_box(
        value: f32,
        frames: usize,
        note_range: (u8, u8),
        velocity_range: (u8, u8),
    ) -> SoundBox {
        SoundBox::new(
            60,
            note_range,
            velocity_range,
            TransposeMode::PitchShift,
            AudioBuffer::from_channels(vec![vec![value; frames]]),
            RATE,
        )
    }

    #[test]
    fn test_single_box_shares_one_rendition() {
        let mut builder = SampleLayerMapBuilder::new(RATE).unwrap();
        builder
            .ingest(&mono_box(0.5, 100, (60, 60), (0, 127)))
            .unwrap();

        let shift = CountingShift::new();
        let map = builder.build(&shift);

        // One raw buffer on one note: the transform runs exactly once and
        // every velocity hands out the identical rendition.
        assert_eq!(shift.calls.load(Ordering::SeqCst), 1);
        let (first, frames) = map.lookup(60, 0).unwrap();
        assert_eq!(frames, 100);
        for velocity in 1..=127 {
            let (buffer, len) = map.lookup(60, velocity).unwrap();
            assert!(Arc::ptr_eq(&first, &buffer));
            assert_eq!(len, 100);
        }
        assert!(map.lookup(61, 64).is_none());
    }

    #[test]
    fn test_transform_runs_per_covered_note() {
        let mut builder = SampleLayerMapBuilder::new(RATE).unwrap();
        builder
            .ingest(&mono_box(0.5, 100, (60, 62), (0, 127)))
            .unwrap();

        let shift = CountingShift::new();
        let map = builder.build(&shift);
        assert_eq!(shift.calls.load(Ordering::SeqCst), 3);
        assert!(map.has_note(60));
        assert!(map.has_note(62));
        assert!(!map.has_note(63));
    }

    #[test]
    fn test_overlap_merges_into_earlier_buffer() {
        let mut builder = SampleLayerMapBuilder::new(RATE).unwrap();
        builder
            .ingest(&mono_box(0.25, 100, (60, 60), (0, 127)))
            .unwrap();
        builder
            .ingest(&mono_box(0.5, 150, (60, 60), (0, 63)))
            .unwrap();

        let map = builder.build(&NoPitchShift);

        // Overlapping cells kept the first box's handle; its buffer grew to
        // the longer length and the second box's audio was mixed in.
        let (merged, frames) = map.lookup(60, 0).unwrap();
        assert_eq!(frames, 150);
        assert_eq!(merged.channel(0)[..100], [0.75; 100]);
        assert_eq!(merged.channel(0)[100..], [0.5; 50]);

        // Non-overlapping velocities still play the first box unmixed, but
        // via the same (now grown) buffer.
        let (upper, upper_frames) = map.lookup(60, 100).unwrap();
        assert_eq!(upper_frames, 150);
        assert!(Arc::ptr_eq(&merged, &upper));
    }

    #[test]
    fn test_merge_happens_once_per_ingestion() {
        let mut builder = SampleLayerMapBuilder::new(RATE).unwrap();
        // First box covers many cells with one buffer; the second overlaps
        // all of them but must only mix in once.
        builder
            .ingest(&mono_box(0.25, 10, (60, 60), (0, 127)))
            .unwrap();
        builder
            .ingest(&mono_box(0.5, 10, (60, 60), (0, 127)))
            .unwrap();

        let map = builder.build(&NoPitchShift);
        let (merged, _) = map.lookup(60, 0).unwrap();
        assert_eq!(merged.channel(0), &[0.75; 10]);
    }

    #[test]
    fn test_rate_conversion_on_ingest() {
        let mut builder = SampleLayerMapBuilder::new(RATE).unwrap();
        let sound_box = SoundBox::new(
            60,
            (60, 60),
            (0, 127),
            TransposeMode::PitchShift,
            AudioBuffer::from_channels(vec![vec![0.5; 200]]),
            RATE * 2,
        );
        builder.ingest(&sound_box).unwrap();

        let map = builder.build(&NoPitchShift);
        let (_, frames) = map.lookup(60, 64).unwrap();
        assert_eq!(frames, 100);
    }

    #[test]
    fn test_transpose_none_skips_transform() {
        let mut builder = SampleLayerMapBuilder::new(RATE).unwrap();
        let sound_box = SoundBox::new(
            60,
            (55, 65),
            (0, 127),
            TransposeMode::None,
            AudioBuffer::from_channels(vec![vec![0.5; 10]]),
            RATE,
        );
        builder.ingest(&sound_box).unwrap();

        let shift = CountingShift::new();
        let map = builder.build(&shift);
        assert_eq!(shift.calls.load(Ordering::SeqCst), 0);
        assert!(map.lookup(55, 0).is_some());
    }

    #[test]
    fn test_invalid_box_reports_index() {
        let mut builder = SampleLayerMapBuilder::new(RATE).unwrap();
        builder
            .ingest(&mono_box(0.5, 10, (60, 60), (0, 127)))
            .unwrap();

        let err = builder
            .ingest(&mono_box(0.5, 10, (70, 60), (0, 127)))
            .unwrap_err();
        match err {
            ConfigError::InvalidBox { index, reason } => {
                assert_eq!(index, 1);
                assert!(reason.contains("note_range"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_empty_map_misses_everywhere() {
        let map = SampleLayerMap::empty();
        assert!(map.lookup(60, 64).is_none());
        assert!(map.is_empty());
        assert!(!map.has_note(60));
    }

    #[test]
    fn test_sound_channel_dispatch() {
        let mut builder = SampleLayerMapBuilder::new(RATE).unwrap();
        builder
            .ingest(&mono_box(0.5, 10, (60, 60), (0, 127)))
            .unwrap();
        let sound = LayeredSound::new("piano", Some(2), builder.build(&NoPitchShift));

        assert!(sound.applies_to(2, 60, 64));
        assert!(!sound.applies_to(1, 60, 64));
        assert!(!sound.applies_to(2, 61, 64));

        let any_channel = LayeredSound::new("pad", None, SampleLayerMap::empty());
        assert!(any_channel.applies_to_channel(9));
    }
}
