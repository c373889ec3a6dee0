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

//! The effect contract and its variants.
//!
//! Every effect is an in-place block transform plus a uniform parameter
//! store with synchronous change notification. Parameter values live in
//! atomic cells so the event thread can write while the render thread reads;
//! DSP state is guarded per effect, which lets effects be shared as
//! `Arc<dyn Effect>` between a rack, a mirror controller and host handles.

use std::collections::BTreeMap;

use crate::audio::AudioBuffer;

pub mod delay;
pub mod envelope;
pub mod mirror;
pub mod pan;
pub mod params;
pub mod rack;
pub mod reverb;
pub mod volume;

pub use delay::DelayEffect;
pub use envelope::{EnvelopeEffect, EnvelopeGenerator, EnvelopeParameters};
pub use mirror::MirrorController;
pub use pan::PanEffect;
pub use params::{Param, ParamSet};
pub use rack::EffectRack;
pub use reverb::{ReverbEffect, ReverbKernel};
pub use volume::VolumeEffect;

/// Parameter carried by every effect; `0` means the effect should skip its
/// transform. Honoring it is a convention, not enforced here.
pub const TURNED_ON: &str = "turnedOn";

/// An in-place audio block transform with a uniform parameter surface.
pub trait Effect: Send + Sync {
    /// The effect instance name.
    fn name(&self) -> &str;

    /// The effect's parameter store.
    fn params(&self) -> &ParamSet;

    /// Re-derives internal DSP state from the current parameter values.
    /// Called after every parameter write; the default does nothing.
    fn sync_params(&self) {}

    /// Transforms `num_samples` samples starting at `start_sample` in place.
    /// Must not retain references to the buffer beyond the call.
    fn apply(&self, buffer: &mut AudioBuffer, start_sample: usize, num_samples: usize);

    /// Sets a single parameter, resyncs internal state and broadcasts to
    /// listeners. An unknown parameter name is a defined no-op.
    fn set_param(&self, name: &str, value: f32) {
        if self.params().set(name, value) {
            self.sync_params();
            self.params().notify();
        }
    }

    /// Sets several parameters, then resyncs and broadcasts once.
    fn set_params(&self, values: &BTreeMap<String, f32>) {
        let mut changed = false;
        for (name, value) in values {
            changed |= self.params().set(name, *value);
        }
        if changed {
            self.sync_params();
            self.params().notify();
        }
    }

    /// Gets the current value of a parameter, or `None` for an unknown name.
    fn param_value(&self, name: &str) -> Option<f32> {
        self.params().value(name)
    }

    /// Whether the `turnedOn` convention says this effect should run.
    fn is_on(&self) -> bool {
        self.params().value(TURNED_ON).map_or(true, |v| v != 0.0)
    }
}

/// Clamps a `(start, num_samples)` request against the buffer length,
/// returning an iterable, sliceable frame range. A start past the buffer
/// end yields an empty range; the render path must never unwind.
pub(crate) fn block_range(
    buffer: &AudioBuffer,
    start_sample: usize,
    num_samples: usize,
) -> std::ops::Range<usize> {
    let frames = buffer.frames();
    let start = start_sample.min(frames);
    start..start_sample.saturating_add(num_samples).min(frames)
}
