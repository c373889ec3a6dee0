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

//! YAML instrument/preset configuration.

pub mod error;
pub mod instrument;

pub use error::ConfigError;
pub use instrument::{BoxConfig, InstrumentConfig, TransposeMode, MAX_NOTE};
