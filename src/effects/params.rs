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

//! Generic effect parameter registry with listener broadcast.
//!
//! A parameter is a `(current, min, max)` triple whose current value is an
//! atomic f32 cell: the event thread writes, the render thread reads, and an
//! update is guaranteed visible by the next block. The map shape is fixed at
//! construction; only values change afterwards.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

/// A single named parameter value with its advisory range.
#[derive(Debug)]
pub struct Param {
    bits: AtomicU32,
    min: f32,
    max: f32,
}

impl Param {
    /// Creates a parameter with an initial value and advisory range.
    pub fn new(value: f32, min: f32, max: f32) -> Self {
        Self {
            bits: AtomicU32::new(value.to_bits()),
            min,
            max,
        }
    }

    /// Gets the current value.
    pub fn value(&self) -> f32 {
        f32::from_bits(self.bits.load(Ordering::Relaxed))
    }

    /// Sets the current value. The range is advisory (for UI binding) and is
    /// not enforced here.
    pub fn set(&self, value: f32) {
        self.bits.store(value.to_bits(), Ordering::Relaxed);
    }

    /// Gets the advisory minimum.
    pub fn min(&self) -> f32 {
        self.min
    }

    /// Gets the advisory maximum.
    pub fn max(&self) -> f32 {
        self.max
    }
}

/// Listener invoked synchronously after every parameter write.
pub type ParamListener = Box<dyn Fn(&ParamSet) + Send + Sync>;

/// A named collection of parameters plus registered listeners.
///
/// Parameter cells are held via `Arc` so a mirror controller can alias the
/// same cells as its source effect; handle comparison replaces pointer
/// comparison when deciding whether two sets share a parameter.
#[derive(Default)]
pub struct ParamSet {
    params: BTreeMap<String, Arc<Param>>,
    listeners: Mutex<Vec<ParamListener>>,
}

impl ParamSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a set aliasing every parameter cell of `source`. Listeners are
    /// not carried over.
    pub fn aliasing(source: &ParamSet) -> Self {
        Self {
            params: source.params.clone(),
            listeners: Mutex::new(Vec::new()),
        }
    }

    /// Inserts a new parameter cell.
    pub fn insert(&mut self, name: &str, value: f32, min: f32, max: f32) {
        self.insert_param(name, Arc::new(Param::new(value, min, max)));
    }

    /// Inserts an existing (possibly shared) parameter cell.
    pub fn insert_param(&mut self, name: &str, param: Arc<Param>) {
        self.params.insert(name.to_string(), param);
    }

    /// Gets the cell for a parameter.
    pub fn param(&self, name: &str) -> Option<&Arc<Param>> {
        self.params.get(name)
    }

    /// Gets the current value of a parameter.
    pub fn value(&self, name: &str) -> Option<f32> {
        self.params.get(name).map(|p| p.value())
    }

    /// Sets a parameter value. Returns false (a no-op) for an unknown name;
    /// the set's shape never changes after construction.
    pub fn set(&self, name: &str, value: f32) -> bool {
        match self.params.get(name) {
            Some(param) => {
                param.set(value);
                true
            }
            None => false,
        }
    }

    /// Returns the number of parameters.
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Returns true if the set has no parameters.
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Iterates parameters in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<Param>)> {
        self.params.iter().map(|(name, param)| (name.as_str(), param))
    }

    /// Captures `(current, min, max)` for every parameter, in name order.
    pub fn snapshot(&self) -> BTreeMap<String, (f32, f32, f32)> {
        self.params
            .iter()
            .map(|(name, p)| (name.clone(), (p.value(), p.min(), p.max())))
            .collect()
    }

    /// Registers a change listener.
    pub fn add_listener(&self, listener: impl Fn(&ParamSet) + Send + Sync + 'static) {
        self.listeners.lock().push(Box::new(listener));
    }

    /// Drops all registered listeners.
    pub fn clear_listeners(&self) {
        self.listeners.lock().clear();
    }

    /// Synchronously invokes every listener once. No batching.
    pub fn notify(&self) {
        for listener in self.listeners.lock().iter() {
            listener(self);
        }
    }
}

impl std::fmt::Debug for ParamSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParamSet")
            .field("params", &self.snapshot())
            .field("listeners", &self.listeners.lock().len())
            .finish()
    }
}
