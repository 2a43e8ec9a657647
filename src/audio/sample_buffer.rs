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
use super::format::{AudioDepth, ChannelConf};
use crate::wav::WavError;

/// Interleaved samples tagged with their numeric encoding.
#[derive(Debug, Clone, PartialEq)]
pub enum SampleData {
    Int8(Vec<i8>),
    Int16(Vec<i16>),
    Int24(Vec<i32>),
    Float32(Vec<f32>),
    Uint8(Vec<u8>),
    Uint16(Vec<u16>),
    Uint24(Vec<u32>),
}

impl SampleData {
    /// Creates `len` samples of silence in the given encoding.
    pub fn silence(depth: AudioDepth, len: usize) -> SampleData {
        match depth {
            AudioDepth::Int8 => SampleData::Int8(vec![0; len]),
            AudioDepth::Int16 => SampleData::Int16(vec![0; len]),
            AudioDepth::Int24 => SampleData::Int24(vec![0; len]),
            AudioDepth::Float32 => SampleData::Float32(vec![0.0; len]),
            AudioDepth::Uint8 => SampleData::Uint8(vec![0x80; len]),
            AudioDepth::Uint16 => SampleData::Uint16(vec![0x8000; len]),
            AudioDepth::Uint24 => SampleData::Uint24(vec![0x80_0000; len]),
        }
    }

    pub fn depth(&self) -> AudioDepth {
        match self {
            SampleData::Int8(_) => AudioDepth::Int8,
            SampleData::Int16(_) => AudioDepth::Int16,
            SampleData::Int24(_) => AudioDepth::Int24,
            SampleData::Float32(_) => AudioDepth::Float32,
            SampleData::Uint8(_) => AudioDepth::Uint8,
            SampleData::Uint16(_) => AudioDepth::Uint16,
            SampleData::Uint24(_) => AudioDepth::Uint24,
        }
    }

    /// Number of individual samples (not frames).
    pub fn len(&self) -> usize {
        match self {
            SampleData::Int8(v) => v.len(),
            SampleData::Int16(v) => v.len(),
            SampleData::Int24(v) => v.len(),
            SampleData::Float32(v) => v.len(),
            SampleData::Uint8(v) => v.len(),
            SampleData::Uint16(v) => v.len(),
            SampleData::Uint24(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Overwrites every sample from `start` onwards with silence.
    pub fn fill_silence(&mut self, start: usize) {
        match self {
            SampleData::Int8(v) => fill_from(v, start, 0),
            SampleData::Int16(v) => fill_from(v, start, 0),
            SampleData::Int24(v) => fill_from(v, start, 0),
            SampleData::Float32(v) => fill_from(v, start, 0.0),
            SampleData::Uint8(v) => fill_from(v, start, 0x80),
            SampleData::Uint16(v) => fill_from(v, start, 0x8000),
            SampleData::Uint24(v) => fill_from(v, start, 0x80_0000),
        }
    }

    /// Appends the samples of `other`, which must share this encoding.
    pub fn extend_from(&mut self, other: &SampleData) -> Result<(), WavError> {
        match (self, other) {
            (SampleData::Int8(a), SampleData::Int8(b)) => a.extend_from_slice(b),
            (SampleData::Int16(a), SampleData::Int16(b)) => a.extend_from_slice(b),
            (SampleData::Int24(a), SampleData::Int24(b)) => a.extend_from_slice(b),
            (SampleData::Float32(a), SampleData::Float32(b)) => a.extend_from_slice(b),
            (SampleData::Uint8(a), SampleData::Uint8(b)) => a.extend_from_slice(b),
            (SampleData::Uint16(a), SampleData::Uint16(b)) => a.extend_from_slice(b),
            (SampleData::Uint24(a), SampleData::Uint24(b)) => a.extend_from_slice(b),
            (this, other) => {
                return Err(WavError::UnsupportedEncoding(format!(
                    "cannot append {} samples to a {} buffer",
                    other.depth(),
                    this.depth()
                )))
            }
        }
        Ok(())
    }

    /// Shortens the data to `len` samples.
    pub fn truncate(&mut self, len: usize) {
        match self {
            SampleData::Int8(v) => v.truncate(len),
            SampleData::Int16(v) => v.truncate(len),
            SampleData::Int24(v) => v.truncate(len),
            SampleData::Float32(v) => v.truncate(len),
            SampleData::Uint8(v) => v.truncate(len),
            SampleData::Uint16(v) => v.truncate(len),
            SampleData::Uint24(v) => v.truncate(len),
        }
    }
}

fn fill_from<T: Copy>(samples: &mut [T], start: usize, value: T) {
    if start < samples.len() {
        samples[start..].fill(value);
    }
}

/// An in-memory block of interleaved audio with its format. This is what a
/// one-shot load produces and what the encoder consumes.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBuffer {
    data: SampleData,
    channels: ChannelConf,
    sample_rate: u32,
}

impl SampleBuffer {
    /// Creates a new buffer. The sample count must be a whole number of frames.
    pub fn new(
        data: SampleData,
        channels: ChannelConf,
        sample_rate: u32,
    ) -> Result<SampleBuffer, WavError> {
        let channel_count = channels.channel_count();
        if data.len() % usize::from(channel_count) != 0 {
            return Err(WavError::PartialFrame {
                len: data.len(),
                channels: channel_count,
            });
        }

        Ok(SampleBuffer {
            data,
            channels,
            sample_rate,
        })
    }

    pub fn data(&self) -> &SampleData {
        &self.data
    }

    pub fn depth(&self) -> AudioDepth {
        self.data.depth()
    }

    pub fn channel_conf(&self) -> ChannelConf {
        self.channels
    }

    pub fn channel_count(&self) -> u16 {
        self.channels.channel_count()
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of frames (samples per channel).
    pub fn frames(&self) -> usize {
        self.data.len() / usize::from(self.channel_count())
    }

    /// Length in seconds.
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames() as f64 / f64::from(self.sample_rate)
    }
}
