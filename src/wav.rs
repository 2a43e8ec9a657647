// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
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

//! RIFF/WAVE reading and writing.
//!
//! Reading supports 8-bit unsigned and 16-bit signed PCM in mono or stereo,
//! either loaded in one go ([`load_wav`]) or pulled incrementally through a
//! [`WavStream`]. Writing accepts any [`SampleBuffer`] encoding and narrows
//! it to 8- or 16-bit PCM.

use std::io::{Read, Seek};
use std::path::Path;

use tracing::info;

use crate::audio::{SampleBuffer, SampleData};

pub mod encoder;
pub mod error;
pub mod header;
pub mod reader;
pub mod stream;


pub use encoder::{save_wav, write_wav};
pub use error::{FormatError, WavError};
pub use header::WavSpec;
pub use stream::WavStream;

/// Loads a whole WAV file into memory.
pub fn load_wav<P: AsRef<Path>>(path: P) -> Result<SampleBuffer, WavError> {
    let path = path.as_ref();
    let buffer = decode_all(WavStream::open(path)?)?;
    info!(
        path = ?path,
        frames = buffer.frames(),
        sample_rate = buffer.sample_rate(),
        channels = buffer.channel_count(),
        "Loaded WAV file"
    );
    Ok(buffer)
}

/// Loads a whole WAV container from any seekable reader.
pub fn read_wav<R: Read + Seek>(reader: R) -> Result<SampleBuffer, WavError> {
    decode_all(WavStream::from_reader(reader)?)
}

fn decode_all<R: Read + Seek>(mut stream: WavStream<R>) -> Result<SampleBuffer, WavError> {
    let spec = *stream.spec();
    let frames = usize::try_from(spec.frames).map_err(|_| WavError::DataTooLarge(spec.data_len))?;
    let len = frames * usize::from(spec.channels);

    // Frames missing from a truncated file are left zeroed.
    let mut data = if spec.bits_per_sample == 8 {
        SampleData::Uint8(vec![0; len])
    } else {
        SampleData::Int16(vec![0; len])
    };
    stream.decode_into(&mut data, 0, frames)?;

    SampleBuffer::new(data, stream.channel_conf(), spec.sample_rate)
}
