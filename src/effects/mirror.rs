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

use parking_lot::Mutex;

use crate::audio::AudioBuffer;
use crate::effects::params::Param;
use crate::effects::{Effect, ParamSet};

/// Private mirror-health flag; never forwarded to linked effects.
pub const BROKEN: &str = "broken";

/// Forwards parameter writes to a set of linked effect instances.
///
/// The controller's parameter set aliases the *same* cells as its source
/// effect, plus its own private `broken` flag. It also listens to the
/// source: if the source's parameter shape stops being the single parameter
/// the internal check expects, `broken` is raised as a pollable consistency
/// signal. Applying a mirror to audio is a no-op.
pub struct MirrorController {
    name: String,
    params: ParamSet,
    linked: Mutex<Vec<Arc<dyn Effect>>>,
}

impl MirrorController {
    /// Snapshots `source`'s parameter set and starts observing it.
    pub fn new(name: &str, source: &dyn Effect) -> Self {
        let mut params = ParamSet::aliasing(source.params());
        let broken = Arc::new(Param::new(0.0, 0.0, 1.0));
        params.insert_param(BROKEN, broken.clone());

        source.params().add_listener(move |source_params| {
            if source_params.len() != 1 {
                broken.set(1.0);
            }
        });

        Self {
            name: name.to_string(),
            params,
            linked: Mutex::new(Vec::new()),
        }
    }

    /// Links an effect; subsequent parameter writes are forwarded to it.
    /// The mirror does not own the effect.
    pub fn link(&self, effect: Arc<dyn Effect>) {
        self.linked.lock().push(effect);
    }

    /// Whether the source's parameter shape diverged since linking.
    pub fn is_broken(&self) -> bool {
        self.params.value(BROKEN).map_or(false, |v| v != 0.0)
    }
}

impl Effect for MirrorController {
    fn name(&self) -> &str {
        &self.name
    }

    fn params(&self) -> &ParamSet {
        &self.params
    }

    fn set_param(&self, name: &str, value: f32) {
        if self.params.set(name, value) {
            self.params.notify();
        }
        if name != BROKEN {
            for effect in self.linked.lock().iter() {
                effect.set_param(name, value);
            }
        }
    }

    fn apply(&self, _buffer: &mut AudioBuffer, _start_sample: usize, _num_samples: usize) {}
}
