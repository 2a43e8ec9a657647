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
use std::{path::Path, time::Duration};

use config::{Config, Environment, File};
use duration_string::DurationString;
use serde::Deserialize;

use super::error::ConfigError;
use crate::audio::PlayMode;

const DEFAULT_BUFFER_COUNT: usize = 4;
const MIN_BUFFER_COUNT: usize = 2;
const DEFAULT_FRAGMENT_FRAMES: usize = 1024;
const DEFAULT_FRAGMENT_TIMEOUT: Duration = Duration::from_millis(500);

/// A YAML representation of the playback stream configuration.
#[derive(Deserialize, Clone, Debug, Default)]
pub struct Stream {
    /// Number of rotating fragments (default: 4, at least 2).
    buffer_count: Option<usize>,

    /// Frames per fragment (default: 1024).
    fragment_frames: Option<usize>,

    /// "once" or "loop" (default: once).
    play_mode: Option<PlayMode>,

    /// How long a consumer waits for a filled fragment (default: 500ms).
    fragment_timeout: Option<String>,

    /// Feeder thread priority, 0-99. Unset leaves the OS default.
    feeder_priority: Option<u8>,
}

impl Stream {
    /// Loads the configuration from an optional YAML file, then applies any
    /// WAVSTREAM_* environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Stream, ConfigError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }
        Ok(builder
            .add_source(Environment::with_prefix("WAVSTREAM").try_parsing(true))
            .build()?
            .try_deserialize::<Stream>()?)
    }

    /// Returns a copy with the play mode replaced.
    pub fn with_play_mode(mut self, play_mode: PlayMode) -> Stream {
        self.play_mode = Some(play_mode);
        self
    }

    pub fn buffer_count(&self) -> usize {
        self.buffer_count
            .unwrap_or(DEFAULT_BUFFER_COUNT)
            .max(MIN_BUFFER_COUNT)
    }

    pub fn fragment_frames(&self) -> usize {
        self.fragment_frames.unwrap_or(DEFAULT_FRAGMENT_FRAMES).max(1)
    }

    pub fn play_mode(&self) -> PlayMode {
        self.play_mode.unwrap_or_default()
    }

    /// Returns the fragment timeout from the configuration.
    pub fn fragment_timeout(&self) -> Result<Duration, ConfigError> {
        match &self.fragment_timeout {
            Some(timeout) => Ok(DurationString::from_string(timeout.clone())
                .map_err(|e| ConfigError::InvalidDuration {
                    value: timeout.clone(),
                    reason: e.to_string(),
                })?
                .into()),
            None => Ok(DEFAULT_FRAGMENT_TIMEOUT),
        }
    }

    pub fn feeder_priority(&self) -> Option<u8> {
        self.feeder_priority
    }
}
