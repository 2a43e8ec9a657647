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
use super::sample_buffer::SampleData;
use super::stream::PlayMode;
use crate::wav::WavError;

/// A decoder that can keep a playback stream fed.
///
/// Each format binds its own implementation when the stream is created; the
/// feeder thread only ever talks to the source through this trait.
pub trait FeedSource: Send {
    /// Encoding of the samples `feed` produces.
    fn depth(&self) -> AudioDepth;

    fn channel_conf(&self) -> ChannelConf;

    fn sample_rate(&self) -> u32;

    /// Fills `output` from frame `start_frame` onwards and returns the number
    /// of bytes produced. Producing fewer bytes than fit means the source is
    /// exhausted (or, in loop mode, that the loop end was reached).
    fn feed(
        &mut self,
        output: &mut SampleData,
        start_frame: usize,
        mode: PlayMode,
    ) -> Result<usize, WavError>;

    /// Moves the cursor to `time` seconds.
    fn seek(&mut self, time: f64) -> Result<(), WavError>;

    /// Moves the cursor back to the loop start.
    fn rewind(&mut self) -> Result<(), WavError>;

    /// Current cursor position in seconds.
    fn position(&self) -> f64;

    /// Total length in seconds.
    fn length(&self) -> f64;

    fn set_loop(&mut self, start: f64, end: f64);

    /// The loop region as `(start, end)` in seconds.
    fn loop_points(&self) -> (f64, f64);

    /// Bytes in one frame of `feed` output.
    fn bytes_per_frame(&self) -> usize {
        let bytes_per_sample = match self.depth() {
            AudioDepth::Int8 | AudioDepth::Uint8 => 1,
            AudioDepth::Int16 | AudioDepth::Uint16 => 2,
            AudioDepth::Int24 | AudioDepth::Uint24 | AudioDepth::Float32 => 4,
        };
        bytes_per_sample * usize::from(self.channel_conf().channel_count())
    }
}

/// Blanket implementation for Box<dyn FeedSource> so boxed sources can be
/// handed to generic code directly.
impl FeedSource for Box<dyn FeedSource> {
    fn depth(&self) -> AudioDepth {
        (**self).depth()
    }

    fn channel_conf(&self) -> ChannelConf {
        (**self).channel_conf()
    }

    fn sample_rate(&self) -> u32 {
        (**self).sample_rate()
    }

    fn feed(
        &mut self,
        output: &mut SampleData,
        start_frame: usize,
        mode: PlayMode,
    ) -> Result<usize, WavError> {
        (**self).feed(output, start_frame, mode)
    }

    fn seek(&mut self, time: f64) -> Result<(), WavError> {
        (**self).seek(time)
    }

    fn rewind(&mut self) -> Result<(), WavError> {
        (**self).rewind()
    }

    fn position(&self) -> f64 {
        (**self).position()
    }

    fn length(&self) -> f64 {
        (**self).length()
    }

    fn set_loop(&mut self, start: f64, end: f64) {
        (**self).set_loop(start, end)
    }

    fn loop_points(&self) -> (f64, f64) {
        (**self).loop_points()
    }
}
