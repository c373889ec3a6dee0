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

use parking_lot::Mutex;

use crate::audio::AudioBuffer;
use crate::effects::{Effect, ParamSet, TURNED_ON};

/// The reverb algorithm behind [`ReverbEffect`]. Reverb internals are
/// deliberately external to this crate; hosts supply an implementation.
pub trait ReverbKernel: Send {
    /// Pushes the current parameter values into the algorithm.
    fn configure(&mut self, room_size: f32, width: f32, dry_wet: f32);

    /// Processes the block in place.
    fn process(&mut self, buffer: &mut AudioBuffer, start_sample: usize, num_samples: usize);
}

/// Wraps an opaque reverb kernel behind the standard parameter surface
/// (`dryWet`, `roomSize`, `width`). Parameter writes are pushed into the
/// kernel on every resync.
pub struct ReverbEffect {
    name: String,
    params: ParamSet,
    kernel: Mutex<Box<dyn ReverbKernel>>,
}

impl ReverbEffect {
    pub fn new(name: &str, kernel: Box<dyn ReverbKernel>) -> Self {
        let mut params = ParamSet::new();
        params.insert(TURNED_ON, 1.0, 0.0, 1.0);
        params.insert("dryWet", 0.5, 0.0, 1.0);
        params.insert("roomSize", 0.5, 0.0, 1.0);
        params.insert("width", 0.5, 0.0, 1.0);

        let effect = Self {
            name: name.to_string(),
            params,
            kernel: Mutex::new(kernel),
        };
        effect.sync_params();
        effect
    }
}

impl Effect for ReverbEffect {
    fn name(&self) -> &str {
        &self.name
    }

    fn params(&self) -> &ParamSet {
        &self.params
    }

    fn sync_params(&self) {
        self.kernel.lock().configure(
            self.params.value("roomSize").unwrap_or(0.5),
            self.params.value("width").unwrap_or(0.5),
            self.params.value("dryWet").unwrap_or(0.5),
        );
    }

    fn apply(&self, buffer: &mut AudioBuffer, start_sample: usize, num_samples: usize) {
        if !self.is_on() {
            return;
        }
        self.kernel.lock().process(buffer, start_sample, num_samples);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Kernel that records configuration and counts process calls.
    struct RecordingKernel {
        configured: Arc<Mutex<(f32, f32, f32)>>,
        processed: Arc<AtomicUsize>,
    }

    impl ReverbKernel for RecordingKernel {
        fn configure(&mut self, room_size: f32, width: f32, dry_wet: f32) {
            *self.configured.lock() = (room_size, width, dry_wet);
        }

        fn process(&mut self, _buffer: &mut AudioBuffer, _start: usize, _num: usize) {
            self.processed.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn recording_reverb() -> (ReverbEffect, Arc<Mutex<(f32, f32, f32)>>, Arc<AtomicUsize>) {
        let configured = Arc::new(Mutex::new((0.0, 0.0, 0.0)));
        let processed = Arc::new(AtomicUsize::new(0));
        let kernel = RecordingKernel {
            configured: configured.clone(),
            processed: processed.clone(),
        };
        (
            ReverbEffect::new("reverb", Box::new(kernel)),
            configured,
            processed,
        )
    }

    #[test]
    fn test_params_are_pushed_into_kernel() {
        let (reverb, configured, _) = recording_reverb();
        // Defaults already synced at construction.
        assert_eq!(*configured.lock(), (0.5, 0.5, 0.5));

        reverb.set_param("roomSize", 0.9);
        assert_eq!(configured.lock().0, 0.9);
    }

    #[test]
    fn test_turned_off_skips_kernel() {
        let (reverb, _, processed) = recording_reverb();
        let mut buffer = AudioBuffer::new(2, 16);

        reverb.apply(&mut buffer, 0, 16);
        assert_eq!(processed.load(Ordering::SeqCst), 1);

        reverb.set_param(TURNED_ON, 0.0);
        reverb.apply(&mut buffer, 0, 16);
        assert_eq!(processed.load(Ordering::SeqCst), 1);
    }
}
