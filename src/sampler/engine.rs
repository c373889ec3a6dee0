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

//! The split engine: event-side [`Sampler`], render-side [`BlockRenderer`].

use std::path::Path;
use std::sync::Arc;

use crossbeam_channel::{unbounded, Receiver};
use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::audio::{decode, AudioBuffer};
use crate::config::{ConfigError, InstrumentConfig, MAX_NOTE};
use crate::effects::{Effect, EffectRack, EnvelopeEffect};
use crate::sampler::allocator::{VoiceAllocator, VoiceCommand};
use crate::sampler::layer_map::{LayeredSound, SampleLayerMapBuilder, SoundBox};
use crate::sampler::pitch::PitchShift;
use crate::sampler::voice::VoiceRenderer;

/// Event-side handle: note dispatch, instrument loading and the effect rack
/// parameter surface. Clonable state is shared with the render half; the
/// render thread itself never takes the dispatch lock.
pub struct Sampler {
    sample_rate: u32,
    sounds: RwLock<Vec<LayeredSound>>,
    allocator: Mutex<VoiceAllocator>,
    rack: Arc<EffectRack>,
    gates: Arc<RwLock<Vec<Arc<EnvelopeEffect>>>>,
}

impl Sampler {
    /// Creates the engine pair. The [`Sampler`] stays on the event thread;
    /// the [`BlockRenderer`] moves to the render thread.
    pub fn new(
        sample_rate: u32,
        max_voices: usize,
    ) -> Result<(Self, BlockRenderer), ConfigError> {
        if sample_rate == 0 {
            return Err(ConfigError::InvalidSampleRate);
        }
        let (tx, rx) = unbounded();
        let rack = Arc::new(EffectRack::new("master"));
        let gates: Arc<RwLock<Vec<Arc<EnvelopeEffect>>>> = Arc::new(RwLock::new(Vec::new()));

        let sampler = Self {
            sample_rate,
            sounds: RwLock::new(Vec::new()),
            allocator: Mutex::new(VoiceAllocator::new(max_voices, tx)),
            rack: rack.clone(),
            gates: gates.clone(),
        };
        let renderer = BlockRenderer {
            commands: rx,
            voices: (0..max_voices).map(|_| VoiceRenderer::new()).collect(),
            rack,
            gates,
            pending_stops: Vec::new(),
        };
        Ok((sampler, renderer))
    }

    /// The engine sample rate.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Builds a layer map from an instrument description and registers it as
    /// a dispatchable sound. A sample file that cannot be read or decoded is
    /// skipped with a warning; an invalid box range is fatal.
    pub fn load_instrument(
        &self,
        config: &InstrumentConfig,
        base_path: &Path,
        pitch_shift: &dyn PitchShift,
    ) -> Result<(), ConfigError> {
        let mut builder = SampleLayerMapBuilder::new(self.sample_rate)?;
        for (index, box_config) in config.boxes().iter().enumerate() {
            let path = base_path.join(box_config.file());
            let bytes = match std::fs::read(&path) {
                Ok(bytes) => bytes,
                Err(error) => {
                    warn!(index, path = %path.display(), %error, "skipping unreadable sample");
                    continue;
                }
            };
            let decoded = match decode(&bytes) {
                Ok(decoded) => decoded,
                Err(error) => {
                    warn!(index, path = %path.display(), %error, "skipping undecodable sample");
                    continue;
                }
            };
            let sound_box = SoundBox::new(
                box_config.root_note(),
                box_config.note_range(),
                box_config.velocity_range(),
                box_config.transpose(),
                decoded.buffer,
                decoded.sample_rate,
            );
            builder.ingest(&sound_box)?;
        }

        let map = builder.build(pitch_shift);
        info!(
            instrument = config.name(),
            boxes = config.boxes().len(),
            "loaded instrument"
        );
        self.sounds
            .write()
            .push(LayeredSound::new(config.name(), config.channel(), map));
        Ok(())
    }

    /// Registers an already-built sound.
    pub fn add_sound(&self, sound: LayeredSound) {
        self.sounds.write().push(sound);
    }

    /// Starts a voice for every registered sound covering this event.
    /// Out-of-range note or velocity values are a no-op.
    pub fn note_on(&self, channel: u8, note: u8, velocity: u8) {
        if note > MAX_NOTE || velocity > MAX_NOTE {
            return;
        }
        let sounds = self.sounds.read();
        let mut allocator = self.allocator.lock();
        let mut triggered = false;
        for sound in sounds.iter() {
            if !sound.applies_to_channel(channel) {
                continue;
            }
            if let Some((buffer, frames)) = sound.map().lookup(note, velocity) {
                let slot = allocator.note_on(channel, note, velocity, buffer, frames);
                debug!(sound = sound.name(), channel, note, velocity, slot, "note on");
                triggered = true;
            }
        }
        drop(allocator);
        if triggered {
            for gate in self.gates.read().iter() {
                gate.note_on();
            }
        }
    }

    /// Releases every voice sounding the note on the channel. With an active
    /// gate the voice plays its release tail; without one it stops at the
    /// next block. The release velocity is accepted for interface parity but
    /// does not influence the release.
    pub fn note_off(&self, channel: u8, note: u8, velocity: u8) {
        let mut tail = false;
        for gate in self.gates.read().iter() {
            gate.note_off();
            tail |= gate.is_active();
        }
        self.allocator.lock().note_off(channel, note, tail);
        debug!(channel, note, velocity, tail, "note off");
    }

    /// Silences every voice at the next block.
    pub fn stop_all(&self) {
        for gate in self.gates.read().iter() {
            gate.note_off();
        }
        self.allocator.lock().stop_all();
        debug!("stop all");
    }

    /// The number of currently assigned voices.
    pub fn active_voices(&self) -> usize {
        self.allocator.lock().active_count()
    }

    /// Creates an envelope, installs it in the rack under `key` and
    /// registers it as a voice-lifetime gate.
    pub fn add_gate(&self, key: &str) -> Result<Arc<EnvelopeEffect>, ConfigError> {
        let gate = Arc::new(EnvelopeEffect::new(key, self.sample_rate)?);
        self.rack.add(key, gate.clone());
        self.gates.write().push(gate.clone());
        Ok(gate)
    }

    /// The master effect rack.
    pub fn rack(&self) -> &Arc<EffectRack> {
        &self.rack
    }

    /// Installs an effect in the master rack.
    pub fn add_effect(&self, key: &str, effect: Arc<dyn Effect>) {
        self.rack.add(key, effect);
    }

    /// Removes an effect from the master rack.
    pub fn remove_effect(&self, key: &str) -> Option<Arc<dyn Effect>> {
        self.rack.remove(key)
    }

    /// Finds a rack effect by key substring.
    pub fn find_effect(&self, fragment: &str) -> Option<Arc<dyn Effect>> {
        self.rack.find_effect(fragment)
    }

    /// Snapshots a rack effect's parameters.
    pub fn effect_params(
        &self,
        key: &str,
    ) -> Option<std::collections::BTreeMap<String, (f32, f32, f32)>> {
        self.rack.effect_params(key)
    }

    /// Sets one parameter on a rack effect.
    pub fn set_effect_param(&self, key: &str, name: &str, value: f32) {
        self.rack.set_effect_param(key, name, value);
    }
}

/// Render-side half: owns the voice renderers and produces audio. Lives on
/// the render thread; its only contact with the event side is draining the
/// command channel at block start.
pub struct BlockRenderer {
    commands: Receiver<VoiceCommand>,
    voices: Vec<VoiceRenderer>,
    rack: Arc<EffectRack>,
    gates: Arc<RwLock<Vec<Arc<EnvelopeEffect>>>>,
    /// Slots released with a tail, stopped once every gate is idle.
    pending_stops: Vec<usize>,
}

impl BlockRenderer {
    /// Renders one block: drain commands, mix every active voice, run the
    /// rack, then flush deferred stops once no gate is holding a tail.
    pub fn render_block(&mut self, output: &mut AudioBuffer, start_sample: usize, num_samples: usize) {
        self.drain_commands();
        for voice in &mut self.voices {
            voice.render_block(output, start_sample, num_samples);
        }
        self.rack.apply(output, start_sample, num_samples);
        self.flush_pending_stops();
    }

    /// The number of renderers still holding audio.
    pub fn active_voices(&self) -> usize {
        self.voices.iter().filter(|v| v.is_active()).count()
    }

    fn drain_commands(&mut self) {
        while let Ok(command) = self.commands.try_recv() {
            match command {
                VoiceCommand::Start {
                    slot,
                    note,
                    velocity,
                    buffer,
                    frames,
                } => {
                    if let Some(voice) = self.voices.get_mut(slot) {
                        // A restarted slot is no longer waiting to be
                        // stopped.
                        self.pending_stops.retain(|s| *s != slot);
                        voice.start(note, velocity, buffer, frames);
                    }
                }
                VoiceCommand::Stop { slot } => {
                    if let Some(voice) = self.voices.get_mut(slot) {
                        voice.stop();
                    }
                }
                VoiceCommand::Release { slot } => {
                    if slot < self.voices.len() && !self.pending_stops.contains(&slot) {
                        self.pending_stops.push(slot);
                    }
                }
                VoiceCommand::StopAll => {
                    for voice in &mut self.voices {
                        voice.stop();
                    }
                    self.pending_stops.clear();
                }
            }
        }
    }

    fn flush_pending_stops(&mut self) {
        if self.pending_stops.is_empty() {
            return;
        }
        if self.gates.read().iter().any(|gate| gate.is_active()) {
            return;
        }
        for slot in self.pending_stops.drain(..) {
            self.voices[slot].stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TransposeMode;
    use crate::effects::{VolumeEffect, TURNED_ON};
    use crate::sampler::pitch::NoPitchShift;

    const RATE: u32 = 48000;

    fn sound_with_note(note: u8, value: f32, frames: usize) -> LayeredSound {
        let mut builder = SampleLayerMapBuilder::new(RATE).unwrap();
        let sound_box = SoundBox::new(
            note,
            (note, note),
            (0, 127),
            TransposeMode::None,
            AudioBuffer::from_channels(vec![vec![value; frames]]),
            RATE,
        );
        builder.ingest(&sound_box).unwrap();
        LayeredSound::new("test", None, builder.build(&NoPitchShift))
    }

    #[test]
    fn test_note_on_renders_audio() {
        let (sampler, mut renderer) = Sampler::new(RATE, 4).unwrap();
        sampler.add_sound(sound_with_note(60, 0.5, 100));

        sampler.note_on(0, 60, 100);
        assert_eq!(sampler.active_voices(), 1);

        let mut output = AudioBuffer::new(2, 32);
        renderer.render_block(&mut output, 0, 32);
        assert_eq!(output.channel(0), &[0.5; 32]);
        assert_eq!(output.channel(1), &[0.5; 32]);
        assert_eq!(renderer.active_voices(), 1);
    }

    #[test]
    fn test_unknown_note_is_silent() {
        let (sampler, mut renderer) = Sampler::new(RATE, 4).unwrap();
        sampler.add_sound(sound_with_note(60, 0.5, 100));

        sampler.note_on(0, 61, 100);
        assert_eq!(sampler.active_voices(), 0);

        let mut output = AudioBuffer::new(2, 32);
        renderer.render_block(&mut output, 0, 32);
        assert_eq!(output.channel(0), &[0.0; 32]);
    }

    #[test]
    fn test_out_of_range_event_is_noop() {
        let (sampler, _renderer) = Sampler::new(RATE, 4).unwrap();
        sampler.add_sound(sound_with_note(60, 0.5, 100));
        sampler.note_on(0, 200, 100);
        sampler.note_on(0, 60, 200);
        assert_eq!(sampler.active_voices(), 0);
    }

    #[test]
    fn test_channel_restriction() {
        let (sampler, _renderer) = Sampler::new(RATE, 4).unwrap();
        let mut builder = SampleLayerMapBuilder::new(RATE).unwrap();
        builder
            .ingest(&SoundBox::new(
                60,
                (60, 60),
                (0, 127),
                TransposeMode::None,
                AudioBuffer::from_channels(vec![vec![0.5; 10]]),
                RATE,
            ))
            .unwrap();
        sampler.add_sound(LayeredSound::new(
            "ch2",
            Some(2),
            builder.build(&NoPitchShift),
        ));

        sampler.note_on(1, 60, 100);
        assert_eq!(sampler.active_voices(), 0);
        sampler.note_on(2, 60, 100);
        assert_eq!(sampler.active_voices(), 1);
    }

    #[test]
    fn test_note_off_without_gate_stops_next_block() {
        let (sampler, mut renderer) = Sampler::new(RATE, 4).unwrap();
        sampler.add_sound(sound_with_note(60, 0.5, 1000));

        sampler.note_on(0, 60, 100);
        let mut output = AudioBuffer::new(2, 16);
        renderer.render_block(&mut output, 0, 16);
        assert_eq!(output.channel(0), &[0.5; 16]);

        sampler.note_off(0, 60, 0);
        let mut output = AudioBuffer::new(2, 16);
        renderer.render_block(&mut output, 0, 16);
        assert_eq!(output.channel(0), &[0.0; 16]);
        assert_eq!(renderer.active_voices(), 0);
    }

    #[test]
    fn test_gate_defers_stop_until_release_ends() {
        let (sampler, mut renderer) = Sampler::new(RATE, 4).unwrap();
        sampler.add_sound(sound_with_note(60, 0.5, 10_000));
        let gate = sampler.add_gate("adsr").unwrap();
        gate.set_param("attack", 0.0);
        gate.set_param("decay", 0.0);
        gate.set_param("sustain", 1.0);
        gate.set_param("release", 1.0);

        sampler.note_on(0, 60, 100);
        let mut output = AudioBuffer::new(2, 16);
        renderer.render_block(&mut output, 0, 16);
        assert_eq!(output.channel(0), &[0.5; 16]);

        // Release tail: the voice keeps sounding, attenuated.
        sampler.note_off(0, 60, 64);
        let mut output = AudioBuffer::new(2, 16);
        renderer.render_block(&mut output, 0, 16);
        assert!(output.channel(0).iter().all(|s| *s > 0.0 && *s < 0.5));
        assert_eq!(renderer.active_voices(), 1);

        // Force the gate idle; the deferred stop flushes on the next block.
        gate.set_param("release", 0.0);
        gate.note_off();
        let mut output = AudioBuffer::new(2, 16);
        renderer.render_block(&mut output, 0, 16);
        assert_eq!(renderer.active_voices(), 0);
    }

    #[test]
    fn test_stop_all_silences_everything() {
        let (sampler, mut renderer) = Sampler::new(RATE, 4).unwrap();
        sampler.add_sound(sound_with_note(60, 0.5, 1000));
        sampler.add_sound(sound_with_note(62, 0.25, 1000));

        sampler.note_on(0, 60, 100);
        sampler.note_on(0, 62, 100);
        sampler.stop_all();
        assert_eq!(sampler.active_voices(), 0);

        let mut output = AudioBuffer::new(2, 16);
        renderer.render_block(&mut output, 0, 16);
        assert_eq!(output.channel(0), &[0.0; 16]);
    }

    #[test]
    fn test_rack_shapes_rendered_audio() {
        let (sampler, mut renderer) = Sampler::new(RATE, 4).unwrap();
        sampler.add_sound(sound_with_note(60, 0.5, 100));
        sampler.add_effect("volume", Arc::new(VolumeEffect::new("vol")));
        sampler.set_effect_param("volume", "value", 0.5);

        sampler.note_on(0, 60, 100);
        let mut output = AudioBuffer::new(2, 16);
        renderer.render_block(&mut output, 0, 16);
        assert_eq!(output.channel(0), &[0.25; 16]);
    }

    #[test]
    fn test_effect_facade_roundtrip() {
        let (sampler, _renderer) = Sampler::new(RATE, 4).unwrap();
        sampler.add_effect("volume", Arc::new(VolumeEffect::new("vol")));

        assert!(sampler.find_effect("vol").is_some());
        let params = sampler.effect_params("volume").unwrap();
        assert_eq!(params["value"], (1.0, 0.0, 1.0));
        assert_eq!(params[TURNED_ON], (1.0, 0.0, 1.0));

        let removed = sampler.remove_effect("volume").unwrap();
        assert_eq!(removed.name(), "vol");
        assert!(sampler.find_effect("vol").is_none());
    }

    #[test]
    fn test_zero_sample_rate_is_rejected() {
        assert!(Sampler::new(0, 4).is_err());
    }

    #[test]
    fn test_load_instrument_skips_missing_files() {
        let yaml = r#"
name: ghost
boxes:
  - file: does-not-exist.wav
    root_note: 60
    note_range: [60, 60]
    velocity_range: [0, 127]
"#;
        let config: InstrumentConfig = serde_yml::from_str(yaml).unwrap();
        let (sampler, _renderer) = Sampler::new(RATE, 4).unwrap();
        let dir = tempfile::tempdir().unwrap();

        sampler
            .load_instrument(&config, dir.path(), &NoPitchShift)
            .unwrap();
        // The sound registers but has no playable audio.
        sampler.note_on(0, 60, 100);
        assert_eq!(sampler.active_voices(), 0);
    }

    #[test]
    fn test_load_instrument_from_wav() {
        let dir = tempfile::tempdir().unwrap();
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: RATE,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(dir.path().join("c4.wav"), spec).unwrap();
        for _ in 0..100 {
            writer.write_sample(8192i16).unwrap();
        }
        writer.finalize().unwrap();

        let yaml = r#"
name: piano
boxes:
  - file: c4.wav
    root_note: 60
    note_range: [60, 60]
    velocity_range: [0, 127]
    transpose: none
"#;
        let config: InstrumentConfig = serde_yml::from_str(yaml).unwrap();
        let (sampler, mut renderer) = Sampler::new(RATE, 4).unwrap();
        sampler
            .load_instrument(&config, dir.path(), &NoPitchShift)
            .unwrap();

        sampler.note_on(0, 60, 100);
        assert_eq!(sampler.active_voices(), 1);
        let mut output = AudioBuffer::new(2, 16);
        renderer.render_block(&mut output, 0, 16);
        assert!(output.channel(0).iter().all(|s| *s > 0.2 && *s < 0.3));
    }
}
