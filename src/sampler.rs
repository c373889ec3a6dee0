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

//! The sample playback engine.
//!
//! [`Sampler`] is the event-side handle (note on/off, sounds, effects) and
//! [`BlockRenderer`] is the render-side half that owns the voices and
//! produces audio. The two communicate over a channel, so the render half
//! can live on a realtime thread.

pub mod allocator;
pub mod engine;
pub mod layer_map;
pub mod pitch;
pub mod voice;

pub use allocator::{VoiceAllocator, VoiceCommand};
pub use engine::{BlockRenderer, Sampler};
pub use layer_map::{LayeredSound, SampleLayerMap, SampleLayerMapBuilder, SoundBox};
pub use pitch::{NoPitchShift, PitchShift};
pub use voice::VoiceRenderer;
