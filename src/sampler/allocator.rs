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

//! Event-side voice slot bookkeeping.
//!
//! The allocator decides which renderer slot sounds which note and sends the
//! outcome over a channel; the render thread owns the renderers themselves
//! and drains the channel at block start. The allocator never touches audio.

use std::sync::Arc;

use crossbeam_channel::Sender;
use tracing::warn;

use crate::audio::AudioBuffer;

/// A slot decision shipped to the render thread.
pub enum VoiceCommand {
    /// Point the slot's renderer at a buffer and start playing.
    Start {
        slot: usize,
        note: u8,
        velocity: u8,
        buffer: Arc<AudioBuffer>,
        frames: usize,
    },
    /// Silence the slot immediately.
    Stop { slot: usize },
    /// Let the slot play out its release tail, then stop.
    Release { slot: usize },
    /// Silence every slot immediately.
    StopAll,
}

struct SlotState {
    /// `(channel, note)` this slot is sounding, if any.
    playing: Option<(u8, u8)>,
    /// Allocation sequence number, for oldest-first stealing.
    started: u64,
}

/// Assigns notes to a fixed pool of renderer slots.
///
/// A note retriggered on the same channel steals its own slot. When the pool
/// is exhausted the oldest sounding slot is stolen.
pub struct VoiceAllocator {
    slots: Vec<SlotState>,
    seq: u64,
    commands: Sender<VoiceCommand>,
}

impl VoiceAllocator {
    pub fn new(max_voices: usize, commands: Sender<VoiceCommand>) -> Self {
        let slots = (0..max_voices)
            .map(|_| SlotState {
                playing: None,
                started: 0,
            })
            .collect();
        Self {
            slots,
            seq: 0,
            commands,
        }
    }

    /// Assigns a slot for the note and ships a start command. Returns the
    /// slot index.
    pub fn note_on(
        &mut self,
        channel: u8,
        note: u8,
        velocity: u8,
        buffer: Arc<AudioBuffer>,
        frames: usize,
    ) -> usize {
        let slot = self.acquire(channel, note);
        self.slots[slot].playing = Some((channel, note));
        self.slots[slot].started = self.seq;
        self.seq += 1;
        self.send(VoiceCommand::Start {
            slot,
            note,
            velocity,
            buffer,
            frames,
        });
        slot
    }

    /// Releases every slot sounding the note on the channel. With
    /// `allow_tail` the render side lets the gate's release play out;
    /// otherwise the slot is silenced immediately.
    pub fn note_off(&mut self, channel: u8, note: u8, allow_tail: bool) {
        for slot in 0..self.slots.len() {
            if self.slots[slot].playing == Some((channel, note)) {
                self.slots[slot].playing = None;
                if allow_tail {
                    self.send(VoiceCommand::Release { slot });
                } else {
                    self.send(VoiceCommand::Stop { slot });
                }
            }
        }
    }

    /// Silences everything.
    pub fn stop_all(&mut self) {
        for slot in &mut self.slots {
            slot.playing = None;
        }
        self.send(VoiceCommand::StopAll);
    }

    /// The number of slots currently assigned a note.
    pub fn active_count(&self) -> usize {
        self.slots.iter().filter(|s| s.playing.is_some()).count()
    }

    fn acquire(&mut self, channel: u8, note: u8) -> usize {
        // Retrigger steals its own slot first.
        if let Some(slot) = self
            .slots
            .iter()
            .position(|s| s.playing == Some((channel, note)))
        {
            return slot;
        }
        if let Some(slot) = self.slots.iter().position(|s| s.playing.is_none()) {
            return slot;
        }
        // Pool exhausted: steal the oldest sounding slot.
        let slot = self
            .slots
            .iter()
            .enumerate()
            .min_by_key(|(_, s)| s.started)
            .map(|(index, _)| index)
            .unwrap_or(0);
        warn!(slot, channel, note, "voice pool exhausted, stealing oldest");
        slot
    }

    fn send(&self, command: VoiceCommand) {
        if self.commands.send(command).is_err() {
            warn!("render side disconnected, dropping voice command");
        }
    }
}
