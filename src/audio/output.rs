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
use std::{fmt, thread, time::Duration};

use tracing::{debug, info, span, Level};

use super::format::{AudioDepth, ChannelConf};
use super::sample_buffer::{SampleBuffer, SampleData};
use super::stream::{Fragment, PlaybackStream, StreamError};

/// Something that consumes a playback stream.
pub trait Output: fmt::Display + Send {
    /// Plays `stream` until it ends or the output's frame limit is reached.
    /// Returns the number of frames consumed.
    fn play(&mut self, stream: &mut PlaybackStream) -> Result<u64, StreamError>;
}

/// Pulls fragments from `stream`, handing each to `consume` with the number
/// of frames to take from it, and recycles them afterwards.
fn drain<F>(
    stream: &mut PlaybackStream,
    limit: Option<u64>,
    mut consume: F,
) -> Result<u64, StreamError>
where
    F: FnMut(&Fragment, usize) -> Result<(), StreamError>,
{
    let mut played: u64 = 0;
    while limit.map_or(true, |limit| played < limit) {
        let Some(fragment) = stream.next_fragment()? else {
            break;
        };

        let mut frames = fragment.frames();
        if let Some(limit) = limit {
            frames = frames.min(usize::try_from(limit - played).unwrap_or(usize::MAX));
        }
        consume(&fragment, frames)?;
        played += frames as u64;

        if fragment.is_end_of_stream() {
            break;
        }
        stream.recycle(fragment)?;
    }
    Ok(played)
}

/// Discards everything it plays. With pacing on, each fragment takes as long
/// as it would through a real device.
pub struct NullOutput {
    paced: bool,
    limit: Option<u64>,
}

impl NullOutput {
    pub fn new(paced: bool, limit: Option<u64>) -> NullOutput {
        NullOutput { paced, limit }
    }
}

impl Output for NullOutput {
    fn play(&mut self, stream: &mut PlaybackStream) -> Result<u64, StreamError> {
        let span = span!(Level::INFO, "play (null)");
        let _enter = span.enter();

        let sample_rate = f64::from(stream.sample_rate());
        let paced = self.paced;
        let played = drain(stream, self.limit, |_, frames| {
            if paced && sample_rate > 0.0 {
                thread::sleep(Duration::from_secs_f64(frames as f64 / sample_rate));
            }
            Ok(())
        })?;

        info!(frames = played, "Finished playback");
        Ok(played)
    }
}

impl fmt::Display for NullOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.paced {
            write!(f, "null (paced)")
        } else {
            write!(f, "null")
        }
    }
}

/// Records the streamed audio so it can be inspected or written out.
pub struct CaptureOutput {
    limit: Option<u64>,
    captured: Option<SampleBuffer>,
}

impl CaptureOutput {
    pub fn new(limit: Option<u64>) -> CaptureOutput {
        CaptureOutput {
            limit,
            captured: None,
        }
    }

    /// The audio recorded by the last call to `play`.
    pub fn captured(&self) -> Option<&SampleBuffer> {
        self.captured.as_ref()
    }

    pub fn into_buffer(self) -> Option<SampleBuffer> {
        self.captured
    }
}

impl Output for CaptureOutput {
    fn play(&mut self, stream: &mut PlaybackStream) -> Result<u64, StreamError> {
        let depth: AudioDepth = stream.depth();
        let channels: ChannelConf = stream.channel_conf();
        let channel_count = usize::from(channels.channel_count());
        let mut data = SampleData::silence(depth, 0);

        let played = drain(stream, self.limit, |fragment, frames| {
            let mut chunk = fragment.data().clone();
            chunk.truncate(frames * channel_count);
            data.extend_from(&chunk)?;
            Ok(())
        })?;

        debug!(frames = played, "Captured stream");
        self.captured = Some(SampleBuffer::new(data, channels, stream.sample_rate())?);
        Ok(played)
    }
}

impl fmt::Display for CaptureOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "capture")
    }
}
