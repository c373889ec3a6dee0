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

//! A note-driven, velocity/pitch-layered sample playback engine feeding a
//! chain of configurable audio effects.
//!
//! The crate splits into four layers:
//! - [`audio`]: PCM buffers, decoding and rate conversion
//! - [`config`]: YAML instrument/preset descriptions
//! - [`sampler`]: the layered-sample lookup table, voices and note dispatch
//! - [`effects`]: the effect contract, parameter store and effect variants
//!
//! [`Sampler`] is the host-facing entry point: it hands back a control handle
//! for the event thread and a [`BlockRenderer`] for the audio callback.

pub mod audio;
pub mod config;
pub mod effects;
pub mod sampler;

pub use sampler::{BlockRenderer, Sampler};
