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

use std::{fmt, str::FromStr};

use crate::wav::WavError;

/// Numeric encoding of the samples in a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AudioDepth {
    Int8,
    Int16,
    /// Signed 24-bit samples held in 32-bit containers.
    Int24,
    Float32,
    Uint8,
    Uint16,
    /// Unsigned 24-bit samples held in 32-bit containers.
    Uint24,
}

impl AudioDepth {
    /// Every supported encoding.
    pub const ALL: [AudioDepth; 7] = [
        AudioDepth::Int8,
        AudioDepth::Int16,
        AudioDepth::Int24,
        AudioDepth::Float32,
        AudioDepth::Uint8,
        AudioDepth::Uint16,
        AudioDepth::Uint24,
    ];

    /// Convert to string representation
    pub fn as_str(self) -> &'static str {
        match self {
            AudioDepth::Int8 => "s8",
            AudioDepth::Int16 => "s16",
            AudioDepth::Int24 => "s24",
            AudioDepth::Float32 => "f32",
            AudioDepth::Uint8 => "u8",
            AudioDepth::Uint16 => "u16",
            AudioDepth::Uint24 => "u24",
        }
    }

    /// The numeric depth code used by mixer-style APIs. Unsigned encodings
    /// carry the 0x08 flag on top of their signed counterpart.
    pub fn code(self) -> u8 {
        match self {
            AudioDepth::Int8 => 0x00,
            AudioDepth::Int16 => 0x01,
            AudioDepth::Int24 => 0x02,
            AudioDepth::Float32 => 0x03,
            AudioDepth::Uint8 => 0x08,
            AudioDepth::Uint16 => 0x09,
            AudioDepth::Uint24 => 0x0A,
        }
    }

    /// The bit depth written to a WAV file for this encoding. Only 8-bit
    /// sources stay 8-bit; everything else is narrowed to 16-bit.
    pub fn wav_bits(self) -> u16 {
        match self {
            AudioDepth::Int8 | AudioDepth::Uint8 => 8,
            _ => 16,
        }
    }
}

impl TryFrom<u8> for AudioDepth {
    type Error = WavError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        AudioDepth::ALL
            .into_iter()
            .find(|depth| depth.code() == code)
            .ok_or_else(|| WavError::UnsupportedEncoding(format!("depth code {code:#04x}")))
    }
}

impl FromStr for AudioDepth {
    type Err = WavError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "s8" | "i8" | "int8" => Ok(AudioDepth::Int8),
            "s16" | "i16" | "int16" => Ok(AudioDepth::Int16),
            "s24" | "i24" | "int24" => Ok(AudioDepth::Int24),
            "f32" | "float" | "float32" => Ok(AudioDepth::Float32),
            "u8" | "uint8" => Ok(AudioDepth::Uint8),
            "u16" | "uint16" => Ok(AudioDepth::Uint16),
            "u24" | "uint24" => Ok(AudioDepth::Uint24),
            _ => Err(WavError::UnsupportedEncoding(s.to_string())),
        }
    }
}

impl fmt::Display for AudioDepth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Speaker layout of a sample buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelConf {
    Mono,
    Stereo,
    Three,
    Quad,
    Surround51,
    Surround61,
    Surround71,
}

impl ChannelConf {
    /// Layout code: the high nibble counts full-range channels and the low
    /// nibble counts subwoofers.
    pub fn code(self) -> u8 {
        match self {
            ChannelConf::Mono => 0x10,
            ChannelConf::Stereo => 0x20,
            ChannelConf::Three => 0x30,
            ChannelConf::Quad => 0x40,
            ChannelConf::Surround51 => 0x51,
            ChannelConf::Surround61 => 0x61,
            ChannelConf::Surround71 => 0x71,
        }
    }

    /// Total number of interleaved channels.
    pub fn channel_count(self) -> u16 {
        let code = self.code();
        u16::from(code >> 4) + u16::from(code & 0x0F)
    }

    /// Layout for a plain channel count, as found in a WAV header.
    pub fn from_count(count: u16) -> Option<ChannelConf> {
        match count {
            1 => Some(ChannelConf::Mono),
            2 => Some(ChannelConf::Stereo),
            3 => Some(ChannelConf::Three),
            4 => Some(ChannelConf::Quad),
            6 => Some(ChannelConf::Surround51),
            7 => Some(ChannelConf::Surround61),
            8 => Some(ChannelConf::Surround71),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ChannelConf::Mono => "mono",
            ChannelConf::Stereo => "stereo",
            ChannelConf::Three => "3.0",
            ChannelConf::Quad => "4.0",
            ChannelConf::Surround51 => "5.1",
            ChannelConf::Surround61 => "6.1",
            ChannelConf::Surround71 => "7.1",
        }
    }
}

impl fmt::Display for ChannelConf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
