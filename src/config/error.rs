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

/// Typed error for configuration and setup failures. These are fatal at
/// build/load time and never surface on the render path.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yml::Error),

    /// A malformed box range, with enough context to locate the preset entry.
    #[error("box {index}: {reason}")]
    InvalidBox { index: usize, reason: String },

    #[error("sample rate must be non-zero")]
    InvalidSampleRate,
}
