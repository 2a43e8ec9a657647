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
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError};
use parking_lot::Mutex;
use serde::Deserialize;
use ::thread_priority::ThreadPriorityValue;
use tracing::{debug, error, info, span, warn, Level};

use super::format::{AudioDepth, ChannelConf};
use super::sample_buffer::SampleData;
use super::thread_priority;
use super::traits::FeedSource;
use crate::config::{self, ConfigError};
use crate::wav::WavError;

/// How a stream behaves when it reaches the end of its data.
#[derive(Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PlayMode {
    /// Play through once, then pad with silence and stop.
    #[default]
    Once,
    /// Jump back to the loop start whenever the loop end is reached.
    Loop,
}

#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    #[error("failed to spawn feeder thread: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("feeder thread is no longer running")]
    Disconnected,

    #[error("no fragment was filled within {0:?}")]
    Timeout(Duration),

    #[error("feeder thread panicked")]
    FeederPanicked,

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Wav(#[from] WavError),
}

/// One of the rotating buffers handed between the feeder and the consumer.
#[derive(Debug)]
pub struct Fragment {
    data: SampleData,
    frames: usize,
    end_of_stream: bool,
    // Number of resumes the feeder had seen when this was filled.
    epoch: u64,
}

impl Fragment {
    fn new(depth: AudioDepth, channels: usize, frames: usize) -> Fragment {
        Fragment {
            data: SampleData::silence(depth, frames * channels),
            frames: 0,
            end_of_stream: false,
            epoch: 0,
        }
    }

    /// The interleaved samples. Always the full fragment size; anything past
    /// `frames()` is silence.
    pub fn data(&self) -> &SampleData {
        &self.data
    }

    /// Frames of real audio at the start of the fragment.
    pub fn frames(&self) -> usize {
        self.frames
    }

    /// True for the last fragment of a stream that has run out of data.
    pub fn is_end_of_stream(&self) -> bool {
        self.end_of_stream
    }
}

/// Messages the feeder thread waits on.
#[derive(Debug)]
pub enum FeederEvent {
    /// The consumer finished with this fragment; fill it again.
    Fill(Fragment),
    /// The cursor was moved; a finished stream starts filling again.
    Resume,
    /// Stop the feeder thread.
    Quit,
}

/// A source being decoded ahead of playback by a dedicated feeder thread.
///
/// Fragments rotate between the two: the consumer takes a filled fragment
/// with [`PlaybackStream::next_fragment`], plays it and gives it back with
/// [`PlaybackStream::recycle`], which asks the feeder to refill it.
pub struct PlaybackStream {
    source: Arc<Mutex<Box<dyn FeedSource>>>,
    events: Sender<FeederEvent>,
    filled: Receiver<Fragment>,
    handle: Option<JoinHandle<()>>,
    mode: PlayMode,
    depth: AudioDepth,
    channels: ChannelConf,
    sample_rate: u32,
    fragment_frames: usize,
    timeout: Duration,
    ended: bool,
    epoch: u64,
}

impl PlaybackStream {
    /// Starts feeding `source` according to `config`. Every fragment is
    /// queued for filling straight away.
    pub fn spawn(
        source: Box<dyn FeedSource>,
        config: &config::Stream,
    ) -> Result<PlaybackStream, StreamError> {
        let mode = config.play_mode();
        let depth = source.depth();
        let channels = source.channel_conf();
        let sample_rate = source.sample_rate();
        let fragment_frames = config.fragment_frames();
        let timeout = config.fragment_timeout()?;
        let priority = thread_priority::feeder_thread_priority(config.feeder_priority());

        let source = Arc::new(Mutex::new(source));
        let (events_tx, events_rx) = crossbeam_channel::unbounded();
        let (filled_tx, filled_rx) = crossbeam_channel::unbounded();

        for _ in 0..config.buffer_count() {
            let fragment = Fragment::new(
                depth,
                usize::from(channels.channel_count()),
                fragment_frames,
            );
            // The receiver is still in scope, so this cannot fail.
            let _ = events_tx.send(FeederEvent::Fill(fragment));
        }

        let feeder_source = source.clone();
        let handle = thread::Builder::new()
            .name("wavstream-feeder".into())
            .spawn(move || run_feeder(feeder_source, events_rx, filled_tx, mode, priority))
            .map_err(StreamError::Spawn)?;

        info!(
            mode = ?mode,
            buffers = config.buffer_count(),
            fragment_frames,
            sample_rate,
            channels = %channels,
            depth = %depth,
            "Started playback stream"
        );

        Ok(PlaybackStream {
            source,
            events: events_tx,
            filled: filled_rx,
            handle: Some(handle),
            mode,
            depth,
            channels,
            sample_rate,
            fragment_frames,
            timeout,
            ended: false,
            epoch: 0,
        })
    }

    /// Waits for the next filled fragment. Returns `None` once the
    /// end-of-stream fragment has been handed out, until the stream is
    /// resumed by a seek or rewind.
    pub fn next_fragment(&mut self) -> Result<Option<Fragment>, StreamError> {
        if self.ended {
            return Ok(None);
        }
        match self.filled.recv_timeout(self.timeout) {
            Ok(fragment) => Ok(Some(self.take(fragment))),
            Err(RecvTimeoutError::Timeout) => Err(StreamError::Timeout(self.timeout)),
            Err(RecvTimeoutError::Disconnected) => Err(StreamError::Disconnected),
        }
    }

    /// Returns a filled fragment if one is ready, without waiting.
    pub fn try_next_fragment(&mut self) -> Result<Option<Fragment>, StreamError> {
        if self.ended {
            return Ok(None);
        }
        match self.filled.try_recv() {
            Ok(fragment) => Ok(Some(self.take(fragment))),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(StreamError::Disconnected),
        }
    }

    /// Hands a played fragment back to the feeder for refilling.
    pub fn recycle(&self, fragment: Fragment) -> Result<(), StreamError> {
        self.events
            .send(FeederEvent::Fill(fragment))
            .map_err(|_| StreamError::Disconnected)
    }

    fn take(&mut self, fragment: Fragment) -> Fragment {
        // An end marker filled before the latest seek is stale.
        if fragment.end_of_stream && fragment.epoch == self.epoch {
            self.ended = true;
        }
        fragment
    }

    /// True once the end-of-stream fragment has been handed out.
    pub fn is_finished(&self) -> bool {
        self.ended
    }

    pub fn play_mode(&self) -> PlayMode {
        self.mode
    }

    pub fn depth(&self) -> AudioDepth {
        self.depth
    }

    pub fn channel_conf(&self) -> ChannelConf {
        self.channels
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn fragment_frames(&self) -> usize {
        self.fragment_frames
    }

    /// Moves the source cursor. Fragments that are already filled still
    /// play before the new position is heard. A stream that had reached its
    /// end starts delivering again.
    pub fn seek(&mut self, time: f64) -> Result<(), StreamError> {
        self.source.lock().seek(time)?;
        self.resume()
    }

    /// Seeks back to the loop start.
    pub fn rewind(&mut self) -> Result<(), StreamError> {
        self.source.lock().rewind()?;
        self.resume()
    }

    fn resume(&mut self) -> Result<(), StreamError> {
        self.epoch += 1;
        self.ended = false;
        self.events
            .send(FeederEvent::Resume)
            .map_err(|_| StreamError::Disconnected)
    }

    /// Position of the feeder's read cursor in seconds.
    pub fn position(&self) -> f64 {
        self.source.lock().position()
    }

    pub fn length(&self) -> f64 {
        self.source.lock().length()
    }

    pub fn set_loop(&self, start: f64, end: f64) {
        self.source.lock().set_loop(start, end)
    }

    pub fn loop_points(&self) -> (f64, f64) {
        self.source.lock().loop_points()
    }

    /// Stops the feeder thread and waits for it to exit. The source is
    /// dropped after the thread has been joined.
    pub fn close(mut self) -> Result<(), StreamError> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> Result<(), StreamError> {
        let Some(handle) = self.handle.take() else {
            return Ok(());
        };

        // The feeder may already be gone if it hit a send failure.
        let _ = self.events.send(FeederEvent::Quit);
        handle.join().map_err(|_| StreamError::FeederPanicked)?;
        debug!("Playback stream closed");
        Ok(())
    }
}

impl Drop for PlaybackStream {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            error!(err = %e, "Error shutting down playback stream");
        }
    }
}

fn run_feeder(
    source: Arc<Mutex<Box<dyn FeedSource>>>,
    events: Receiver<FeederEvent>,
    filled: Sender<Fragment>,
    mode: PlayMode,
    priority: Option<ThreadPriorityValue>,
) {
    let span = span!(Level::INFO, "feeder");
    let _enter = span.enter();

    if let Some(priority) = priority {
        thread_priority::configure_feeder_priority(priority);
    }
    info!("Feeder started");

    let mut feeder = Feeder {
        source,
        filled,
        mode,
        epoch: 0,
        finished: false,
        parked: Vec::new(),
    };

    for event in events.iter() {
        let connected = match event {
            FeederEvent::Quit => break,
            FeederEvent::Fill(fragment) => feeder.fill(fragment),
            FeederEvent::Resume => feeder.resume(),
        };
        if !connected {
            warn!("Consumer went away, stopping feeder");
            break;
        }
    }

    info!("Feeder stopped");
}

struct Feeder {
    source: Arc<Mutex<Box<dyn FeedSource>>>,
    filled: Sender<Fragment>,
    mode: PlayMode,
    epoch: u64,
    finished: bool,
    // Fragments recycled after the end of the stream, waiting for a resume.
    parked: Vec<Fragment>,
}

impl Feeder {
    /// Fills and sends one fragment. Returns false if the consumer is gone.
    fn fill(&mut self, mut fragment: Fragment) -> bool {
        if self.finished {
            self.parked.push(fragment);
            return true;
        }

        if let Err(e) = fill_fragment(&self.source, &mut fragment, self.mode) {
            error!(err = %e, "Error feeding stream");
            fragment.data.fill_silence(0);
            fragment.frames = 0;
            fragment.end_of_stream = true;
        }
        fragment.epoch = self.epoch;
        self.finished = fragment.end_of_stream;

        self.filled.send(fragment).is_ok()
    }

    fn resume(&mut self) -> bool {
        self.epoch += 1;
        self.finished = false;
        debug!(epoch = self.epoch, parked = self.parked.len(), "Resuming feeder");

        for fragment in std::mem::take(&mut self.parked) {
            if !self.fill(fragment) {
                return false;
            }
        }
        true
    }
}

/// Fills one fragment from the source. In loop mode a short read rewinds to
/// the loop start and keeps filling; a rewind that produces nothing ends the
/// stream instead of spinning.
fn fill_fragment(
    source: &Mutex<Box<dyn FeedSource>>,
    fragment: &mut Fragment,
    mode: PlayMode,
) -> Result<(), WavError> {
    let mut source = source.lock();
    let bytes_per_frame = source.bytes_per_frame();
    let channels = usize::from(source.channel_conf().channel_count());
    let capacity = fragment.data.len() / channels;

    fragment.frames = 0;
    fragment.end_of_stream = false;

    let mut rewound = false;
    while fragment.frames < capacity {
        let bytes = source.feed(&mut fragment.data, fragment.frames, mode)?;
        let frames = bytes / bytes_per_frame;
        fragment.frames += frames;

        if fragment.frames >= capacity || mode == PlayMode::Once {
            break;
        }
        if frames == 0 && rewound {
            warn!("Loop region produced no audio, ending stream");
            break;
        }

        if let Err(e) = source.rewind() {
            warn!(err = %e, "Unable to rewind to loop start, ending stream");
            break;
        }
        debug!(position = source.position(), "Looped back to loop start");
        rewound = true;
    }

    if fragment.frames < capacity {
        fragment.data.fill_silence(fragment.frames * channels);
        fragment.end_of_stream = true;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use ::config::{Config, File, FileFormat};

    use super::*;
    use crate::testutil::{eventually, WavBuilder};
    use crate::wav::WavStream;

    fn stream_config(yaml: &str) -> crate::config::Stream {
        Config::builder()
            .add_source(File::from_str(yaml, FileFormat::Yaml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    fn mono_ramp(frames: i16) -> Box<dyn FeedSource> {
        let samples: Vec<i16> = (0..frames).collect();
        let bytes = WavBuilder::new(1, 100, 16).data_i16(&samples).build();
        Box::new(WavStream::from_reader(Cursor::new(bytes)).unwrap())
    }

    fn int16(fragment: &Fragment) -> Vec<i16> {
        match fragment.data() {
            SampleData::Int16(samples) => samples.clone(),
            other => panic!("unexpected encoding {}", other.depth()),
        }
    }

    #[test]
    fn test_once_pads_final_fragment() {
        let config = stream_config("buffer_count: 2\nfragment_frames: 4\n");
        let mut stream = PlaybackStream::spawn(mono_ramp(6), &config).unwrap();

        let first = stream.next_fragment().unwrap().unwrap();
        assert_eq!(first.frames(), 4);
        assert!(!first.is_end_of_stream());
        assert_eq!(int16(&first), vec![0, 1, 2, 3]);

        let second = stream.next_fragment().unwrap().unwrap();
        assert_eq!(second.frames(), 2);
        assert!(second.is_end_of_stream());
        assert_eq!(int16(&second), vec![4, 5, 0, 0]);

        stream.recycle(first).unwrap();
        assert!(stream.next_fragment().unwrap().is_none());
        assert!(stream.is_finished());
        stream.close().unwrap();
    }

    #[test]
    fn test_rewind_resumes_finished_stream() {
        let config = stream_config("buffer_count: 2\nfragment_frames: 4\n");
        let mut stream = PlaybackStream::spawn(mono_ramp(6), &config).unwrap();

        let first = stream.next_fragment().unwrap().unwrap();
        let second = stream.next_fragment().unwrap().unwrap();
        assert!(second.is_end_of_stream());
        assert!(stream.next_fragment().unwrap().is_none());

        // Rewind before handing the fragments back.
        stream.rewind().unwrap();
        assert!(!stream.is_finished());
        stream.recycle(first).unwrap();
        stream.recycle(second).unwrap();

        let first = stream.next_fragment().unwrap().unwrap();
        assert_eq!(int16(&first), vec![0, 1, 2, 3]);
        assert!(!first.is_end_of_stream());
        let second = stream.next_fragment().unwrap().unwrap();
        assert_eq!(int16(&second), vec![4, 5, 0, 0]);
        assert!(second.is_end_of_stream());
        assert!(stream.next_fragment().unwrap().is_none());

        // Fragments handed back after the end wait for the next seek.
        stream.recycle(first).unwrap();
        stream.recycle(second).unwrap();
        stream.seek(0.02).unwrap();

        let fragment = stream.next_fragment().unwrap().unwrap();
        assert_eq!(int16(&fragment), vec![2, 3, 4, 5]);
        assert!(!fragment.is_end_of_stream());
        let fragment = stream.next_fragment().unwrap().unwrap();
        assert_eq!(fragment.frames(), 0);
        assert!(fragment.is_end_of_stream());
        assert!(stream.is_finished());
    }

    #[test]
    fn test_stale_end_marker_does_not_end_resumed_stream() {
        let config = stream_config("buffer_count: 2\nfragment_frames: 4\n");
        let mut stream = PlaybackStream::spawn(mono_ramp(6), &config).unwrap();

        let first = stream.next_fragment().unwrap().unwrap();
        // The end marker is already queued; seeking makes it stale.
        eventually(
            || (stream.position() - 0.06).abs() < 1e-9,
            "Feeder never reached the end of the data",
        );
        stream.seek(0.0).unwrap();
        stream.recycle(first).unwrap();

        let stale = stream.next_fragment().unwrap().unwrap();
        assert!(stale.is_end_of_stream());
        assert!(!stream.is_finished());

        let fragment = stream.next_fragment().unwrap().unwrap();
        assert_eq!(int16(&fragment), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_unsigned_padding_is_centered() {
        let bytes = WavBuilder::new(1, 100, 8).data(vec![10, 20, 30]).build();
        let source = Box::new(WavStream::from_reader(Cursor::new(bytes)).unwrap());
        let config = stream_config("buffer_count: 2\nfragment_frames: 5\n");
        let mut stream = PlaybackStream::spawn(source, &config).unwrap();

        let fragment = stream.next_fragment().unwrap().unwrap();
        assert!(fragment.is_end_of_stream());
        assert_eq!(fragment.frames(), 3);
        assert_eq!(
            fragment.data(),
            &SampleData::Uint8(vec![10, 20, 30, 0x80, 0x80])
        );
    }

    #[test]
    fn test_loop_wraps_inside_fragment() {
        let config = stream_config("buffer_count: 2\nfragment_frames: 4\nplay_mode: loop\n");
        let mut stream = PlaybackStream::spawn(mono_ramp(6), &config).unwrap();

        let mut heard = Vec::new();
        for _ in 0..3 {
            let fragment = stream.next_fragment().unwrap().unwrap();
            assert_eq!(fragment.frames(), 4);
            assert!(!fragment.is_end_of_stream());
            heard.extend(int16(&fragment));
            stream.recycle(fragment).unwrap();
        }
        assert_eq!(heard, vec![0, 1, 2, 3, 4, 5, 0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_loop_region_respected() {
        let config = stream_config("buffer_count: 2\nfragment_frames: 5\nplay_mode: loop\n");
        let mut source = mono_ramp(20);
        source.set_loop(0.1, 0.13);
        source.seek(0.1).unwrap();
        let mut stream = PlaybackStream::spawn(source, &config).unwrap();
        let fragment = stream.next_fragment().unwrap().unwrap();
        assert_eq!(int16(&fragment), vec![10, 11, 12, 10, 11]);
    }

    #[test]
    fn test_empty_loop_ends_stream() {
        let config = stream_config("buffer_count: 2\nfragment_frames: 4\nplay_mode: loop\n");
        let mut source = mono_ramp(6);
        // Both loop points land on frame 2, so the rewind yields nothing.
        source.set_loop(0.02, 0.024);
        let mut stream = PlaybackStream::spawn(source, &config).unwrap();

        let fragment = stream.next_fragment().unwrap().unwrap();
        assert!(fragment.is_end_of_stream());
        assert_eq!(fragment.frames(), 2);
        assert_eq!(int16(&fragment), vec![0, 1, 0, 0]);
        assert!(stream.next_fragment().unwrap().is_none());
    }

    #[test]
    fn test_failed_rewind_ends_stream() {
        let config = stream_config("buffer_count: 2\nfragment_frames: 4\nplay_mode: loop\n");
        let mut source = mono_ramp(6);
        // A loop that starts past its end can never be rewound into.
        source.set_loop(0.05, 0.02);
        let mut stream = PlaybackStream::spawn(source, &config).unwrap();

        let fragment = stream.next_fragment().unwrap().unwrap();
        assert!(fragment.is_end_of_stream());
        assert_eq!(fragment.frames(), 2);
        assert_eq!(int16(&fragment), vec![0, 1, 0, 0]);
    }

    #[test]
    fn test_set_loop_through_stream() {
        let config = stream_config("buffer_count: 2\nfragment_frames: 4\n");
        let mut stream = PlaybackStream::spawn(mono_ramp(20), &config).unwrap();
        assert_eq!(stream.loop_points(), (0.0, 0.2));
        stream.set_loop(0.05, 0.1);
        assert_eq!(stream.loop_points(), (0.05, 0.1));
        assert!(stream.seek(0.1).is_err());
    }

    #[test]
    fn test_control_surface() {
        let config = stream_config("buffer_count: 2\nfragment_frames: 2\n");
        let mut stream = PlaybackStream::spawn(mono_ramp(50), &config).unwrap();

        assert!((stream.length() - 0.5).abs() < 1e-9);
        assert_eq!(stream.play_mode(), PlayMode::Once);
        assert_eq!(stream.depth(), AudioDepth::Int16);
        assert_eq!(stream.channel_conf(), ChannelConf::Mono);
        assert_eq!(stream.sample_rate(), 100);
        assert_eq!(stream.fragment_frames(), 2);

        // Both fragments are filled at spawn.
        eventually(
            || (stream.position() - 0.04).abs() < 1e-9,
            "Feeder never filled the initial fragments",
        );

        assert!(matches!(
            stream.seek(0.5),
            Err(StreamError::Wav(WavError::SeekOutOfRange { .. }))
        ));
        stream.seek(0.3).unwrap();
        assert!((stream.position() - 0.3).abs() < 1e-9);

        // Drain the stale fragments, then the refill comes from the new position.
        for _ in 0..2 {
            let fragment = stream.next_fragment().unwrap().unwrap();
            stream.recycle(fragment).unwrap();
        }
        let fragment = stream.next_fragment().unwrap().unwrap();
        assert_eq!(int16(&fragment), vec![30, 31]);
        let fragment = stream.next_fragment().unwrap().unwrap();
        assert_eq!(int16(&fragment), vec![32, 33]);

        stream.rewind().unwrap();
        assert_eq!(stream.position(), 0.0);
    }

    #[test]
    fn test_try_next_fragment() {
        let config = stream_config("buffer_count: 2\nfragment_frames: 4\n");
        let mut stream = PlaybackStream::spawn(mono_ramp(6), &config).unwrap();

        let mut fragments = Vec::new();
        eventually(
            || {
                if let Some(fragment) = stream.try_next_fragment().unwrap() {
                    fragments.push(fragment);
                }
                fragments.len() == 2
            },
            "Feeder never produced both fragments",
        );
        assert!(stream.try_next_fragment().unwrap().is_none());
        assert!(fragments[1].is_end_of_stream());
    }

    #[test]
    fn test_next_fragment_times_out() {
        let config = stream_config(
            "buffer_count: 2\nfragment_frames: 4\nplay_mode: loop\nfragment_timeout: 20ms\n",
        );
        let mut stream = PlaybackStream::spawn(mono_ramp(8), &config).unwrap();

        // Hold on to both fragments so nothing gets refilled.
        let _first = stream.next_fragment().unwrap().unwrap();
        let _second = stream.next_fragment().unwrap().unwrap();
        assert!(matches!(
            stream.next_fragment(),
            Err(StreamError::Timeout(timeout)) if timeout == Duration::from_millis(20)
        ));
    }

    #[test]
    fn test_close_joins_feeder() {
        let config = stream_config("buffer_count: 3\nfragment_frames: 8\nplay_mode: loop\n");
        let stream = PlaybackStream::spawn(mono_ramp(4), &config).unwrap();
        let source = Arc::downgrade(&stream.source);

        stream.close().unwrap();
        assert!(source.upgrade().is_none());
    }

    #[test]
    fn test_drop_joins_feeder() {
        let config = stream_config("buffer_count: 2\nfragment_frames: 8\n");
        let stream = PlaybackStream::spawn(mono_ramp(4), &config).unwrap();
        let source = Arc::downgrade(&stream.source);

        drop(stream);
        assert!(source.upgrade().is_none());
    }
}
