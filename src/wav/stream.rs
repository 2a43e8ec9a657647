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
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use tracing::debug;

use super::error::{FormatError, WavError};
use super::header::{self, WavSpec};
use super::reader::ByteReader;
use crate::audio::{AudioDepth, ChannelConf, FeedSource, PlayMode, SampleData};

/// An open WAV file positioned inside its data chunk.
///
/// Reads are pull based: callers ask for up to N frames and get back however
/// many the file still holds. The loop region only affects seeking and
/// looped feeding; it defaults to the whole file.
pub struct WavStream<R> {
    reader: ByteReader<R>,
    spec: WavSpec,
    channels: ChannelConf,
    loop_start: f64,
    loop_end: f64,
    // Raw bytes for 16-bit reads, reused between calls.
    scratch: Vec<u8>,
}

impl WavStream<BufReader<File>> {
    /// Opens a WAV file from disk.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, WavError> {
        let file = File::open(path.as_ref())?;
        debug!(path = ?path.as_ref(), "Opening WAV stream");
        Self::from_reader(BufReader::new(file))
    }
}

impl<R: Read + Seek> WavStream<R> {
    /// Parses the header of `inner` and positions it at the first sample.
    pub fn from_reader(inner: R) -> Result<Self, WavError> {
        let mut reader = ByteReader::new(inner)?;
        let spec = header::parse(&mut reader)?;
        let channels = ChannelConf::from_count(spec.channels)
            .ok_or(FormatError::UnsupportedChannels(spec.channels))?;
        let loop_end = spec.duration_secs();

        Ok(Self {
            reader,
            spec,
            channels,
            loop_start: 0.0,
            loop_end,
            scratch: Vec::new(),
        })
    }

    pub fn spec(&self) -> &WavSpec {
        &self.spec
    }

    /// The encoding decoded samples are produced in.
    pub fn depth(&self) -> AudioDepth {
        if self.spec.bits_per_sample == 8 {
            AudioDepth::Uint8
        } else {
            AudioDepth::Int16
        }
    }

    pub fn channel_conf(&self) -> ChannelConf {
        self.channels
    }

    /// Decodes up to `max_frames` frames into a freshly allocated buffer.
    ///
    /// The buffer is sized for what the data chunk still holds, so oversized
    /// requests cost nothing extra.
    pub fn decode(&mut self, max_frames: usize) -> Result<SampleData, WavError> {
        let channels = usize::from(self.spec.channels);
        // Round up so a trailing partial frame is still read and then dropped.
        let available = self.remaining_bytes().div_ceil(self.spec.bytes_per_frame());
        let max_frames = max_frames.min(available);
        let mut output = SampleData::silence(self.depth(), max_frames * channels);
        let frames = self.decode_into(&mut output, 0, max_frames)?;
        output.truncate(frames * channels);
        Ok(output)
    }

    /// Decodes up to `max_frames` frames into `output`, starting at frame
    /// `start_frame`. Returns the number of whole frames written; anything
    /// less than requested means the data chunk is exhausted.
    pub fn decode_into(
        &mut self,
        output: &mut SampleData,
        start_frame: usize,
        max_frames: usize,
    ) -> Result<usize, WavError> {
        let channels = usize::from(self.spec.channels);
        let capacity = (output.len() / channels).saturating_sub(start_frame);
        let frames = max_frames.min(capacity);
        if frames == 0 {
            return Ok(0);
        }

        let remaining = self.remaining_bytes();
        let start = start_frame * channels;
        let wanted = frames * channels;

        match output {
            SampleData::Uint8(samples) if self.spec.bits_per_sample == 8 => {
                let limit = wanted.min(remaining);
                let read = self.reader.read_up_to(&mut samples[start..start + limit])?;
                Ok(read / channels)
            }
            SampleData::Int16(samples) if self.spec.bits_per_sample == 16 => {
                let limit = (wanted * 2).min(remaining);
                self.scratch.resize(limit, 0);
                let read = self.reader.read_up_to(&mut self.scratch[..limit])?;
                let values = read / 2;
                for (dst, bytes) in samples[start..start + values]
                    .iter_mut()
                    .zip(self.scratch.chunks_exact(2))
                {
                    *dst = i16::from_le_bytes([bytes[0], bytes[1]]);
                }
                Ok(values / channels)
            }
            other => Err(WavError::UnsupportedEncoding(format!(
                "cannot decode {}-bit data into a {} buffer",
                self.spec.bits_per_sample,
                other.depth()
            ))),
        }
    }

    /// Fills `output` from `start_frame` onwards for playback and returns the
    /// number of bytes produced.
    ///
    /// In loop mode the read is clamped so it stops exactly at the loop end.
    /// The loop end is rounded to the nearest frame.
    pub fn feed(
        &mut self,
        output: &mut SampleData,
        start_frame: usize,
        mode: PlayMode,
    ) -> Result<usize, WavError> {
        let channels = usize::from(self.spec.channels);
        let capacity = (output.len() / channels).saturating_sub(start_frame);

        let frames = if mode == PlayMode::Loop {
            let loop_end_frame = (self.loop_end * f64::from(self.spec.sample_rate)).round();
            let until_end = loop_end_frame - self.current_frame() as f64;
            if until_end < 0.0 {
                return Ok(0);
            }
            capacity.min(until_end as usize)
        } else {
            capacity
        };

        let read = self.decode_into(output, start_frame, frames)?;
        Ok(read * self.spec.bytes_per_frame())
    }

    /// Moves the read cursor to `time` seconds into the data.
    ///
    /// Times at or past the loop end are rejected without moving the cursor.
    /// The byte offset is rounded up to the next whole frame and clamped to
    /// the end of the data chunk.
    pub fn seek(&mut self, time: f64) -> Result<(), WavError> {
        if time >= self.loop_end {
            return Err(WavError::SeekOutOfRange {
                time,
                loop_end: self.loop_end,
            });
        }

        let align = self.spec.bytes_per_frame() as u64;
        let bytes_per_second = f64::from(self.spec.sample_rate) * align as f64;
        // Negative and NaN times saturate to zero, huge ones to u64::MAX.
        let offset = ((time * bytes_per_second) as u64)
            .min(self.spec.data_len)
            .div_ceil(align)
            * align;

        self.reader.seek_to(self.spec.data_offset + offset)?;
        Ok(())
    }

    /// Seeks back to the loop start.
    pub fn rewind(&mut self) -> Result<(), WavError> {
        self.seek(self.loop_start)
    }

    /// Current read position in seconds.
    pub fn position(&self) -> f64 {
        let bytes_per_second =
            self.spec.bytes_per_frame() as f64 * f64::from(self.spec.sample_rate);
        let consumed = self.reader.position().saturating_sub(self.spec.data_offset);
        consumed as f64 / bytes_per_second
    }

    /// Total length in seconds.
    pub fn length(&self) -> f64 {
        self.spec.duration_secs()
    }

    /// Sets the loop region in seconds. Always succeeds.
    pub fn set_loop(&mut self, start: f64, end: f64) {
        self.loop_start = start;
        self.loop_end = end;
    }

    pub fn loop_start(&self) -> f64 {
        self.loop_start
    }

    pub fn loop_end(&self) -> f64 {
        self.loop_end
    }

    /// Closes the stream and hands back the underlying reader.
    pub fn into_inner(self) -> R {
        self.reader.into_inner()
    }

    /// Whole frames between the data start and the read cursor.
    fn current_frame(&self) -> u64 {
        let consumed = self.reader.position().saturating_sub(self.spec.data_offset);
        consumed / self.spec.bytes_per_frame() as u64
    }

    fn remaining_bytes(&self) -> usize {
        let remaining = self.spec.data_end().saturating_sub(self.reader.position());
        usize::try_from(remaining).unwrap_or(usize::MAX)
    }
}

impl<R: Read + Seek + Send> FeedSource for WavStream<R> {
    fn depth(&self) -> AudioDepth {
        WavStream::depth(self)
    }

    fn channel_conf(&self) -> ChannelConf {
        WavStream::channel_conf(self)
    }

    fn sample_rate(&self) -> u32 {
        self.spec.sample_rate
    }

    fn feed(
        &mut self,
        output: &mut SampleData,
        start_frame: usize,
        mode: PlayMode,
    ) -> Result<usize, WavError> {
        WavStream::feed(self, output, start_frame, mode)
    }

    fn seek(&mut self, time: f64) -> Result<(), WavError> {
        WavStream::seek(self, time)
    }

    fn rewind(&mut self) -> Result<(), WavError> {
        WavStream::rewind(self)
    }

    fn position(&self) -> f64 {
        WavStream::position(self)
    }

    fn length(&self) -> f64 {
        WavStream::length(self)
    }

    fn set_loop(&mut self, start: f64, end: f64) {
        WavStream::set_loop(self, start, end)
    }

    fn loop_points(&self) -> (f64, f64) {
        (self.loop_start, self.loop_end)
    }
}
