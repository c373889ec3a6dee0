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

//! A named, ordered collection of effects applied as one unit.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::audio::AudioBuffer;
use crate::effects::{Effect, ParamSet, TURNED_ON};

/// Applies its child effects to each block in key order. A rack is itself an
/// effect, so racks nest. Children are shared handles; adding an effect to a
/// rack does not take sole ownership of it.
pub struct EffectRack {
    name: String,
    params: ParamSet,
    effects: RwLock<BTreeMap<String, Arc<dyn Effect>>>,
}

impl EffectRack {
    pub fn new(name: &str) -> Self {
        let mut params = ParamSet::new();
        params.insert(TURNED_ON, 1.0, 0.0, 1.0);
        Self {
            name: name.to_string(),
            params,
            effects: RwLock::new(BTreeMap::new()),
        }
    }

    /// Adds an effect under a key, replacing any effect previously stored
    /// under the same key.
    pub fn add(&self, key: &str, effect: Arc<dyn Effect>) {
        debug!(rack = %self.name, key, effect = effect.name(), "adding effect");
        self.effects.write().insert(key.to_string(), effect);
    }

    /// Removes and returns the effect stored under a key.
    pub fn remove(&self, key: &str) -> Option<Arc<dyn Effect>> {
        let removed = self.effects.write().remove(key);
        if removed.is_some() {
            debug!(rack = %self.name, key, "removed effect");
        }
        removed
    }

    /// Returns the number of child effects.
    pub fn len(&self) -> usize {
        self.effects.read().len()
    }

    /// Returns true if the rack has no child effects.
    pub fn is_empty(&self) -> bool {
        self.effects.read().is_empty()
    }

    /// Finds the first effect (in key order) whose key contains `fragment`.
    pub fn find_effect(&self, fragment: &str) -> Option<Arc<dyn Effect>> {
        self.effects
            .read()
            .iter()
            .find(|(key, _)| key.contains(fragment))
            .map(|(_, effect)| effect.clone())
    }

    /// Snapshots `(current, min, max)` for every parameter of the effect
    /// stored under a key.
    pub fn effect_params(&self, key: &str) -> Option<BTreeMap<String, (f32, f32, f32)>> {
        self.effects
            .read()
            .get(key)
            .map(|effect| effect.params().snapshot())
    }

    /// Sets one parameter on the effect stored under a key, then notifies
    /// the rack's own listeners so observers see child changes without
    /// subscribing to every child. Unknown keys are a no-op.
    pub fn set_effect_param(&self, key: &str, name: &str, value: f32) {
        let effect = self.effects.read().get(key).cloned();
        if let Some(effect) = effect {
            effect.set_param(name, value);
            self.params.notify();
        }
    }
}

impl Effect for EffectRack {
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
        for effect in self.effects.read().values() {
            effect.apply(buffer, start_sample, num_samples);
        }
    }
}

impl std::fmt::Debug for EffectRack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let keys: Vec<String> = self.effects.read().keys().cloned().collect();
        f.debug_struct("EffectRack")
            .field("name", &self.name)
            .field("effects", &keys)
            .finish()
    }
}
