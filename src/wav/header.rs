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
use std::fmt;
use std::io::{self, ErrorKind, Read, Seek};

use tracing::debug;

use super::error::{FormatError, WavError};
use super::reader::ByteReader;

/// Integer PCM, the only format code we accept.
pub const PCM_FORMAT_CODE: u16 = 1;

/// Bytes of the fmt chunk we actually interpret.
pub const FMT_CHUNK_LEN: u32 = 16;

// Values assumed until a fmt chunk says otherwise.
const DEFAULT_SAMPLE_RATE: u32 = 22050;
const DEFAULT_BITS_PER_SAMPLE: u16 = 8;
const DEFAULT_CHANNELS: u16 = 1;

/// Format information extracted from a RIFF/WAVE header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavSpec {
    /// 1 (mono) or 2 (stereo).
    pub channels: u16,
    /// Frames per second.
    pub sample_rate: u32,
    /// 8 (unsigned) or 16 (signed, little-endian).
    pub bits_per_sample: u16,
    /// Number of frames derived from the data chunk length.
    pub frames: u64,
    /// Absolute offset of the first sample byte.
    pub data_offset: u64,
    /// Byte length declared by the data chunk.
    pub data_len: u64,
}

impl WavSpec {
    pub fn bytes_per_sample(&self) -> usize {
        usize::from(self.bits_per_sample / 8)
    }

    pub fn bytes_per_frame(&self) -> usize {
        self.bytes_per_sample() * usize::from(self.channels)
    }

    /// Total playing time in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.frames as f64 / f64::from(self.sample_rate)
    }

    /// Absolute offset one past the last sample byte.
    pub fn data_end(&self) -> u64 {
        self.data_offset + self.data_len
    }
}

impl fmt::Display for WavSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} Hz, {}-bit, {} ({} frames, {:.3}s)",
            self.sample_rate,
            self.bits_per_sample,
            if self.channels == 1 { "mono" } else { "stereo" },
            self.frames,
            self.duration_secs()
        )
    }
}

/// Converts the data chunk byte count into a frame count.
///
/// Stereo counts are rounded up before halving so an odd byte count does not
/// silently lose a frame; 16-bit counts are halved again.
pub fn frames_from_data_len(data_len: u64, channels: u16, bits_per_sample: u16) -> u64 {
    let mut frames = data_len;
    if channels == 2 {
        frames = frames.div_ceil(2);
    }
    if bits_per_sample == 16 {
        frames /= 2;
    }
    frames
}

/// Parses the container header and leaves the reader positioned at the first
/// sample byte.
pub fn parse<R: Read + Seek>(reader: &mut ByteReader<R>) -> Result<WavSpec, WavError> {
    parse_inner(reader).map_err(|e| match e {
        HeaderError::Eof => WavError::Format(FormatError::Truncated),
        HeaderError::Wav(e) => e,
    })
}

enum HeaderError {
    Eof,
    Wav(WavError),
}

impl From<io::Error> for HeaderError {
    fn from(e: io::Error) -> Self {
        if e.kind() == ErrorKind::UnexpectedEof {
            HeaderError::Eof
        } else {
            HeaderError::Wav(WavError::Io(e))
        }
    }
}

impl From<FormatError> for HeaderError {
    fn from(e: FormatError) -> Self {
        HeaderError::Wav(WavError::Format(e))
    }
}

fn parse_inner<R: Read + Seek>(reader: &mut ByteReader<R>) -> Result<WavSpec, HeaderError> {
    let mut prefix = [0u8; 12];
    reader.read_exact(&mut prefix)?;
    if &prefix[0..4] != b"RIFF" || &prefix[8..12] != b"WAVE" {
        return Err(FormatError::BadMagic.into());
    }

    let mut channels = DEFAULT_CHANNELS;
    let mut sample_rate = DEFAULT_SAMPLE_RATE;
    let mut bits_per_sample = DEFAULT_BITS_PER_SAMPLE;

    loop {
        let tag = reader.read_tag()?;
        match &tag {
            b"fmt " => {
                let length = reader.read_u32_le()?;
                if length < FMT_CHUNK_LEN {
                    return Err(FormatError::FmtChunkTooShort(length).into());
                }

                let format_code = reader.read_u16_le()?;
                if format_code != PCM_FORMAT_CODE {
                    return Err(FormatError::UnsupportedFormatCode(format_code).into());
                }

                channels = reader.read_u16_le()?;
                if channels != 1 && channels != 2 {
                    return Err(FormatError::UnsupportedChannels(channels).into());
                }

                sample_rate = reader.read_u32_le()?;

                // Byte rate and block align are derived values.
                reader.skip(6)?;

                bits_per_sample = reader.read_u16_le()?;
                if bits_per_sample != 8 && bits_per_sample != 16 {
                    return Err(FormatError::UnsupportedBitDepth(bits_per_sample).into());
                }

                reader.skip(u64::from(length - FMT_CHUNK_LEN))?;
            }
            b"data" => break,
            _ => {
                let length = reader.read_u32_le()?;
                debug!(
                    chunk = %String::from_utf8_lossy(&tag),
                    length,
                    "Ignoring chunk"
                );
                reader.skip(u64::from(length))?;
            }
        }
    }

    if sample_rate == 0 {
        return Err(FormatError::ZeroSampleRate.into());
    }

    let data_len = u64::from(reader.read_u32_le()?);
    let frames = frames_from_data_len(data_len, channels, bits_per_sample);

    Ok(WavSpec {
        channels,
        sample_rate,
        bits_per_sample,
        frames,
        data_offset: reader.position(),
        data_len,
    })
}
