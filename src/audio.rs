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

//! PCM buffer primitives plus the decode and rate-conversion collaborators
//! consumed by the sampler during instrument loading.

pub mod buffer;
pub mod decode;
pub mod resample;

pub use buffer::AudioBuffer;
pub use decode::{decode, DecodeError, DecodedAudio};
pub use resample::resample;
