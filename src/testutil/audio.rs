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

use std::{error::Error, path::Path};

use hound::{SampleFormat, WavSpec, WavWriter};

/// Builds RIFF/WAVE containers byte by byte, including malformed ones.
pub struct WavBuilder {
    channels: u16,
    sample_rate: u32,
    bits_per_sample: u16,
    format_code: u16,
    fmt_len: Option<u32>,
    fmt_extra: Vec<u8>,
    chunks: Vec<([u8; 4], Vec<u8>)>,
    data: Vec<u8>,
    data_chunk: bool,
    trailing: Vec<u8>,
}

impl WavBuilder {
    pub fn new(channels: u16, sample_rate: u32, bits_per_sample: u16) -> Self {
        Self {
            channels,
            sample_rate,
            bits_per_sample,
            format_code: 1,
            fmt_len: None,
            fmt_extra: Vec::new(),
            chunks: Vec::new(),
            data: Vec::new(),
            data_chunk: true,
            trailing: Vec::new(),
        }
    }

    pub fn format_code(mut self, code: u16) -> Self {
        self.format_code = code;
        self
    }

    /// Overrides the declared fmt chunk length without changing its body.
    pub fn fmt_len(mut self, len: u32) -> Self {
        self.fmt_len = Some(len);
        self
    }

    pub fn fmt_extra(mut self, extra: Vec<u8>) -> Self {
        self.fmt_extra = extra;
        self
    }

    /// Adds a chunk between fmt and data.
    pub fn chunk(mut self, tag: [u8; 4], body: Vec<u8>) -> Self {
        self.chunks.push((tag, body));
        self
    }

    pub fn data(mut self, data: Vec<u8>) -> Self {
        self.data = data;
        self
    }

    pub fn data_i16(self, samples: &[i16]) -> Self {
        let data = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
        self.data(data)
    }

    /// Bytes written after the data chunk.
    pub fn trailing(mut self, bytes: Vec<u8>) -> Self {
        self.trailing = bytes;
        self
    }

    pub fn without_data_chunk(mut self) -> Self {
        self.data_chunk = false;
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let bytes_per_sample = u32::from(self.bits_per_sample / 8);
        let block_align = u32::from(self.channels) * bytes_per_sample;

        let mut out = Vec::new();
        out.extend_from_slice(b"RIFF");
        out.extend_from_slice(&0u32.to_le_bytes());
        out.extend_from_slice(b"WAVE");

        out.extend_from_slice(b"fmt ");
        let fmt_len = self
            .fmt_len
            .unwrap_or(16 + self.fmt_extra.len() as u32);
        out.extend_from_slice(&fmt_len.to_le_bytes());
        out.extend_from_slice(&self.format_code.to_le_bytes());
        out.extend_from_slice(&self.channels.to_le_bytes());
        out.extend_from_slice(&self.sample_rate.to_le_bytes());
        out.extend_from_slice(&(self.sample_rate * block_align).to_le_bytes());
        out.extend_from_slice(&(block_align as u16).to_le_bytes());
        out.extend_from_slice(&self.bits_per_sample.to_le_bytes());
        out.extend_from_slice(&self.fmt_extra);

        for (tag, body) in &self.chunks {
            out.extend_from_slice(tag);
            out.extend_from_slice(&(body.len() as u32).to_le_bytes());
            out.extend_from_slice(body);
        }

        if self.data_chunk {
            out.extend_from_slice(b"data");
            out.extend_from_slice(&(self.data.len() as u32).to_le_bytes());
            out.extend_from_slice(&self.data);
        }
        out.extend_from_slice(&self.trailing);

        let riff_len = (out.len() - 8) as u32;
        out[4..8].copy_from_slice(&riff_len.to_le_bytes());
        out
    }
}

/// Writes interleaved 16-bit samples with hound, as an independent producer
/// of test files.
pub fn write_hound_wav(
    path: &Path,
    samples: &[i16],
    channels: u16,
    sample_rate: u32,
) -> Result<(), Box<dyn Error>> {
    let mut writer = WavWriter::create(
        path,
        WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        },
    )?;

    for sample in samples {
        writer.write_sample(*sample)?;
    }
    writer.finalize()?;

    Ok(())
}
