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
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::{debug, info};

use super::error::WavError;
use super::header::{FMT_CHUNK_LEN, PCM_FORMAT_CODE};
use crate::audio::{SampleBuffer, SampleData};

/// Full scale of a 24-bit sample.
const S24_FULL_SCALE: f64 = 0x7F_FFFF as f64;
/// Full scale of a 16-bit sample.
const S16_FULL_SCALE: f64 = 0x7FFF as f64;

/// Samples converted per write call.
const WRITE_BLOCK: usize = 4096;

/// Signed 8-bit to unsigned 8-bit.
pub fn convert_s8(sample: i8) -> u8 {
    (sample as u8) ^ 0x80
}

/// Unsigned 16-bit to signed 16-bit.
pub fn convert_u16(sample: u16) -> i16 {
    sample.wrapping_sub(0x8000) as i16
}

/// Signed 24-bit to signed 16-bit. The sample is biased to unsigned and then
/// rescaled, so this agrees with [`convert_u24`] on biased input.
pub fn convert_s24(sample: i32) -> i16 {
    scale_u24(f64::from(sample) + f64::from(0x80_0000))
}

/// Unsigned 24-bit to signed 16-bit.
pub fn convert_u24(sample: u32) -> i16 {
    scale_u24(f64::from(sample))
}

fn scale_u24(biased: f64) -> i16 {
    let value = (biased / S24_FULL_SCALE) * S16_FULL_SCALE - 32768.0;
    value as i16
}

/// 32-bit float to signed 16-bit. Truncates toward zero and saturates, so
/// 1.0 maps to 0x7FFF and -1.0 to -0x7FFF.
pub fn convert_f32(sample: f32) -> i16 {
    (f64::from(sample) * S16_FULL_SCALE) as i16
}

/// Writes `buffer` as an 8- or 16-bit PCM WAV file.
///
/// 8-bit sources are written as unsigned 8-bit; every other encoding is
/// narrowed to signed 16-bit. If this fails the output is incomplete and
/// should be discarded.
pub fn write_wav<W: Write>(writer: &mut W, buffer: &SampleBuffer) -> Result<(), WavError> {
    let channels = buffer.channel_count();
    if channels != 1 && channels != 2 {
        return Err(WavError::UnsupportedChannels(channels));
    }

    let bits = buffer.depth().wav_bits();
    let bytes_per_sample = u32::from(bits / 8);
    let data_size = buffer.frames() as u64 * u64::from(channels) * u64::from(bytes_per_sample);
    let riff_size = data_size + 36;
    if riff_size > u64::from(u32::MAX) {
        return Err(WavError::DataTooLarge(data_size));
    }
    let data_size = data_size as u32;

    let sample_rate = buffer.sample_rate();
    let block_align = u32::from(channels) * bytes_per_sample;
    let byte_rate = sample_rate
        .checked_mul(block_align)
        .ok_or(WavError::DataTooLarge(
            u64::from(sample_rate) * u64::from(block_align),
        ))?;

    writer.write_all(b"RIFF")?;
    writer.write_all(&(riff_size as u32).to_le_bytes())?;
    writer.write_all(b"WAVE")?;

    writer.write_all(b"fmt ")?;
    writer.write_all(&FMT_CHUNK_LEN.to_le_bytes())?;
    writer.write_all(&PCM_FORMAT_CODE.to_le_bytes())?;
    writer.write_all(&channels.to_le_bytes())?;
    writer.write_all(&sample_rate.to_le_bytes())?;
    writer.write_all(&byte_rate.to_le_bytes())?;
    writer.write_all(&(block_align as u16).to_le_bytes())?;
    writer.write_all(&bits.to_le_bytes())?;

    writer.write_all(b"data")?;
    writer.write_all(&data_size.to_le_bytes())?;

    debug!(
        depth = %buffer.depth(),
        channels,
        sample_rate,
        bits,
        data_size,
        "Writing WAV data"
    );

    match buffer.data() {
        SampleData::Uint8(samples) => writer.write_all(samples)?,
        SampleData::Int16(samples) => write_i16(writer, samples, |s| s)?,
        SampleData::Int8(samples) => {
            for block in samples.chunks(WRITE_BLOCK) {
                let bytes: Vec<u8> = block.iter().map(|&s| convert_s8(s)).collect();
                writer.write_all(&bytes)?;
            }
        }
        SampleData::Uint16(samples) => write_i16(writer, samples, convert_u16)?,
        SampleData::Int24(samples) => write_i16(writer, samples, convert_s24)?,
        SampleData::Uint24(samples) => write_i16(writer, samples, convert_u24)?,
        SampleData::Float32(samples) => write_i16(writer, samples, convert_f32)?,
    }

    Ok(())
}

fn write_i16<W, T, F>(writer: &mut W, samples: &[T], convert: F) -> Result<(), WavError>
where
    W: Write,
    T: Copy,
    F: Fn(T) -> i16,
{
    let mut bytes = Vec::with_capacity(WRITE_BLOCK.min(samples.len()) * 2);
    for block in samples.chunks(WRITE_BLOCK) {
        bytes.clear();
        for &sample in block {
            bytes.extend_from_slice(&convert(sample).to_le_bytes());
        }
        writer.write_all(&bytes)?;
    }
    Ok(())
}

/// Writes `buffer` to a WAV file at `path`.
pub fn save_wav<P: AsRef<Path>>(path: P, buffer: &SampleBuffer) -> Result<(), WavError> {
    let path = path.as_ref();
    let mut writer = BufWriter::new(File::create(path)?);
    write_wav(&mut writer, buffer)?;
    writer.flush()?;
    info!(
        path = ?path,
        frames = buffer.frames(),
        depth = %buffer.depth(),
        "Saved WAV file"
    );
    Ok(())
}
