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

/// Reasons a RIFF/WAVE container is rejected while parsing its header.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormatError {
    #[error("missing RIFF/WAVE magic")]
    BadMagic,

    #[error("header ended before the data chunk was found")]
    Truncated,

    #[error("fmt chunk is {0} bytes, expected at least 16")]
    FmtChunkTooShort(u32),

    #[error("unsupported format code {0} (only integer PCM is supported)")]
    UnsupportedFormatCode(u16),

    #[error("unsupported channel count {0} (expected 1 or 2)")]
    UnsupportedChannels(u16),

    #[error("unsupported bit depth {0} (expected 8 or 16)")]
    UnsupportedBitDepth(u16),

    #[error("sample rate must be greater than 0")]
    ZeroSampleRate,
}

/// Error types for WAV reading, writing and stream control.
#[derive(Debug, thiserror::Error)]
pub enum WavError {
    #[error("Malformed WAV container: {0}")]
    Format(#[from] FormatError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unsupported sample encoding: {0}")]
    UnsupportedEncoding(String),

    #[error("Cannot write {0} channels (expected 1 or 2)")]
    UnsupportedChannels(u16),

    #[error("Seek to {time}s rejected: loop end is {loop_end}s")]
    SeekOutOfRange { time: f64, loop_end: f64 },

    #[error("Sample data of {0} bytes does not fit in a WAV container")]
    DataTooLarge(u64),

    #[error("Sample buffer of {len} samples is not a whole number of {channels}-channel frames")]
    PartialFrame { len: usize, channels: u16 },
}

impl WavError {
    /// Returns true if this error came from a malformed or unsupported header.
    pub fn is_format_error(&self) -> bool {
        matches!(self, WavError::Format(_))
    }
}
