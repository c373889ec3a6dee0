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

//! ADSR envelope generation.
//!
//! The generator is both a note-shaping gain curve and the gate that keeps a
//! voice alive through its release phase: callers poll [`EnvelopeGenerator::is_active`]
//! to decide whether a stopped note can be finalized.

use parking_lot::Mutex;

use crate::audio::AudioBuffer;
use crate::config::ConfigError;
use crate::effects::{block_range, Effect, ParamSet, TURNED_ON};

/// Attack/decay/release times in seconds plus the sustain level (0..1).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnvelopeParameters {
    pub attack: f32,
    pub decay: f32,
    pub sustain: f32,
    pub release: f32,
}

impl Default for EnvelopeParameters {
    fn default() -> Self {
        Self {
            attack: 0.1,
            decay: 0.1,
            sustain: 1.0,
            release: 0.1,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    Idle,
    Attack,
    Decay,
    Sustain,
    Release,
}

/// An ADSR state machine producing one gain value per output sample.
///
/// A stage whose time is zero or negative has no usable rate and is bypassed
/// entirely: `note_on` with an unusable attack starts in decay (or sustain),
/// `note_off` with an unusable release snaps straight back to idle.
#[derive(Debug)]
pub struct EnvelopeGenerator {
    sample_rate: u32,
    parameters: EnvelopeParameters,
    state: State,
    value: f32,
    sustain_level: f32,
    attack_rate: Option<f32>,
    decay_rate: Option<f32>,
    release_rate: Option<f32>,
}

impl EnvelopeGenerator {
    /// Creates an idle generator with default parameters. The sample rate is
    /// required up front; rate-dependent constants are recomputed whenever
    /// parameters or the rate change.
    pub fn new(sample_rate: u32) -> Result<Self, ConfigError> {
        if sample_rate == 0 {
            return Err(ConfigError::InvalidSampleRate);
        }
        let mut envelope = Self {
            sample_rate,
            parameters: EnvelopeParameters::default(),
            state: State::Idle,
            value: 0.0,
            sustain_level: 0.0,
            attack_rate: None,
            decay_rate: None,
            release_rate: None,
        };
        envelope.set_parameters(EnvelopeParameters::default());
        Ok(envelope)
    }

    /// Stores new parameters and recomputes the per-sample rates.
    pub fn set_parameters(&mut self, parameters: EnvelopeParameters) {
        self.sustain_level = parameters.sustain;
        self.attack_rate = self.rate(1.0, parameters.attack);
        self.decay_rate = self.rate(1.0 - parameters.sustain, parameters.decay);
        self.release_rate = self.rate(parameters.sustain, parameters.release);
        self.parameters = parameters;
    }

    /// Gets the current parameters.
    pub fn parameters(&self) -> EnvelopeParameters {
        self.parameters
    }

    /// Changes the sample rate and recomputes the rates.
    pub fn set_sample_rate(&mut self, sample_rate: u32) -> Result<(), ConfigError> {
        if sample_rate == 0 {
            return Err(ConfigError::InvalidSampleRate);
        }
        self.sample_rate = sample_rate;
        self.set_parameters(self.parameters);
        Ok(())
    }

    fn rate(&self, span: f32, time: f32) -> Option<f32> {
        (time > 0.0).then(|| span / (time * self.sample_rate as f32))
    }

    /// Resets to idle with the value snapped to 0.
    pub fn reset(&mut self) {
        self.value = 0.0;
        self.state = State::Idle;
    }

    /// Starts the envelope: attack if usable, else decay, else sustain.
    pub fn note_on(&mut self) {
        self.state = if self.attack_rate.is_some() {
            State::Attack
        } else if self.decay_rate.is_some() {
            State::Decay
        } else {
            State::Sustain
        };
    }

    /// Starts the release phase, or resets immediately if release is
    /// unusable. A no-op on an idle envelope.
    pub fn note_off(&mut self) {
        if self.state == State::Idle {
            return;
        }
        if self.release_rate.is_some() {
            self.state = State::Release;
        } else {
            self.reset();
        }
    }

    /// True while the envelope is in any stage other than idle.
    pub fn is_active(&self) -> bool {
        self.state != State::Idle
    }

    /// Advances one sample and returns the envelope value.
    pub fn next_sample(&mut self) -> f32 {
        match self.state {
            State::Idle => return 0.0,
            State::Attack => {
                if let Some(rate) = self.attack_rate {
                    self.value += rate;
                }
                if self.value >= 1.0 {
                    self.value = 1.0;
                    self.state = if self.decay_rate.is_some() {
                        State::Decay
                    } else {
                        State::Sustain
                    };
                }
            }
            State::Decay => {
                if let Some(rate) = self.decay_rate {
                    self.value -= rate;
                }
                if self.value <= self.sustain_level {
                    self.value = self.sustain_level;
                    self.state = State::Sustain;
                }
            }
            // Re-clamped every sample to tolerate live parameter changes.
            State::Sustain => self.value = self.sustain_level,
            State::Release => {
                if let Some(rate) = self.release_rate {
                    self.value -= rate;
                }
                if self.value <= 0.0 {
                    self.reset();
                }
            }
        }
        self.value
    }
}

/// An envelope applied as a block effect: every sample of every channel is
/// scaled by the per-sample envelope value. Also serves as the engine's
/// voice-lifetime gate via [`EnvelopeEffect::note_on`]/[`EnvelopeEffect::note_off`]/
/// [`EnvelopeEffect::is_active`].
pub struct EnvelopeEffect {
    name: String,
    params: ParamSet,
    envelope: Mutex<EnvelopeGenerator>,
}

impl EnvelopeEffect {
    /// Creates an envelope effect with the standard parameter surface.
    pub fn new(name: &str, sample_rate: u32) -> Result<Self, ConfigError> {
        let mut params = ParamSet::new();
        params.insert(TURNED_ON, 1.0, 0.0, 1.0);
        params.insert("attack", 0.1, 0.0, 1.0);
        params.insert("decay", 0.5, 0.0, 1.0);
        params.insert("sustain", 0.5, 0.0, 1.0);
        params.insert("release", 1.0, 0.0, 1.0);

        let effect = Self {
            name: name.to_string(),
            params,
            envelope: Mutex::new(EnvelopeGenerator::new(sample_rate)?),
        };
        effect.sync_params();
        Ok(effect)
    }

    /// Starts the embedded envelope.
    pub fn note_on(&self) {
        self.envelope.lock().note_on();
    }

    /// Releases the embedded envelope.
    pub fn note_off(&self) {
        self.envelope.lock().note_off();
    }

    /// Gate status: true while the envelope still shapes audio.
    pub fn is_active(&self) -> bool {
        self.envelope.lock().is_active()
    }
}

impl Effect for EnvelopeEffect {
    fn name(&self) -> &str {
        &self.name
    }

    fn params(&self) -> &ParamSet {
        &self.params
    }

    fn sync_params(&self) {
        let parameters = EnvelopeParameters {
            attack: self.params.value("attack").unwrap_or(0.0),
            decay: self.params.value("decay").unwrap_or(0.0),
            sustain: self.params.value("sustain").unwrap_or(0.0),
            release: self.params.value("release").unwrap_or(0.0),
        };
        self.envelope.lock().set_parameters(parameters);
    }

    fn apply(&self, buffer: &mut AudioBuffer, start_sample: usize, num_samples: usize) {
        if !self.is_on() {
            return;
        }
        let range = block_range(buffer, start_sample, num_samples);
        let mut envelope = self.envelope.lock();
        for sample in range {
            let gain = envelope.next_sample();
            for channel in 0..buffer.channel_count() {
                buffer.channel_mut(channel)[sample] *= gain;
            }
        }
    }
}
