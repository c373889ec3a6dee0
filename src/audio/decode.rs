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

//! In-memory audio decoding via symphonia.
//!
//! Instrument samples arrive as raw file bytes from the preset source; this
//! module turns them into planar f32 PCM at their native rate. A failed
//! decode is reported to the caller, which skips the offending box rather
//! than aborting the whole instrument load.

use std::io::Cursor;

use symphonia::core::audio::{AudioBuffer as SymphoniaBuffer, Signal};
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::default::{get_codecs, get_probe};

use super::buffer::AudioBuffer;

/// Decoded linear PCM plus the rate it was recorded at.
#[derive(Clone, Debug)]
pub struct DecodedAudio {
    /// Planar samples at the native rate.
    pub buffer: AudioBuffer,
    /// The native sample rate of the source material.
    pub sample_rate: u32,
}

/// Errors produced while decoding raw sample bytes.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("audio decode error: {0}")]
    Symphonia(#[from] SymphoniaError),

    #[error("no decodable audio track")]
    NoAudioTrack,

    #[error("sample rate not specified by the container")]
    MissingSampleRate,

    #[error("decoded stream contained no audio frames")]
    Empty,
}

/// Decodes raw audio file bytes (WAV, FLAC, MP3, ...) into planar f32 PCM.
pub fn decode(bytes: &[u8]) -> Result<DecodedAudio, DecodeError> {
    let stream = MediaSourceStream::new(Box::new(Cursor::new(bytes.to_vec())), Default::default());

    let probed = get_probe().format(
        &Hint::new(),
        stream,
        &FormatOptions::default(),
        &MetadataOptions::default(),
    )?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or(DecodeError::NoAudioTrack)?;
    let track_id = track.id;
    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or(DecodeError::MissingSampleRate)?;

    let mut decoder = get_codecs().make(&track.codec_params, &DecoderOptions::default())?;

    let mut channels: Vec<Vec<f32>> = Vec::new();
    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            // End of stream.
            Err(SymphoniaError::IoError(e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(e.into()),
        };
        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            // A corrupt packet is recoverable; keep whatever else decodes.
            Err(SymphoniaError::DecodeError(_)) => continue,
            Err(e) => return Err(e.into()),
        };

        let mut converted: SymphoniaBuffer<f32> =
            SymphoniaBuffer::new(decoded.capacity() as u64, *decoded.spec());
        decoded.convert(&mut converted);

        if channels.is_empty() {
            channels = vec![Vec::new(); converted.spec().channels.count()];
        }
        for (index, channel) in channels.iter_mut().enumerate() {
            channel.extend_from_slice(converted.chan(index));
        }
    }

    let buffer = AudioBuffer::from_channels(channels);
    if buffer.is_empty() {
        return Err(DecodeError::Empty);
    }

    Ok(DecodedAudio {
        buffer,
        sample_rate,
    })
}
