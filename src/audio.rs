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

//! Sample buffers and streamed playback.

pub mod format;
pub mod output;
pub mod sample_buffer;
pub mod stream;
pub mod thread_priority;
pub mod traits;

pub use format::{AudioDepth, ChannelConf};
pub use output::{CaptureOutput, NullOutput, Output};
pub use sample_buffer::{SampleBuffer, SampleData};
pub use stream::{FeederEvent, Fragment, PlayMode, PlaybackStream, StreamError};
pub use traits::FeedSource;
