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
use std::error::Error;
use std::path::PathBuf;

use clap::{crate_version, Parser, Subcommand};
use tracing::info;
use wavstream::audio::{CaptureOutput, NullOutput, Output, PlayMode, PlaybackStream, SampleData};
use wavstream::config;
use wavstream::wav::{self, WavStream};

#[derive(Parser)]
#[clap(
    author = "Michael Wilson",
    version = crate_version!(),
    about = "A streaming WAV decoder and encoder."
)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Prints the format of a WAV file.
    Info {
        /// The path to the WAV file.
        path: PathBuf,
    },
    /// Prints the first decoded frames of a WAV file.
    Dump {
        /// The path to the WAV file.
        path: PathBuf,
        /// How many frames to print.
        #[arg(short, long, default_value_t = 16)]
        frames: usize,
    },
    /// Loads a WAV file and writes it back out with a clean header.
    Convert {
        /// The file to read.
        input: PathBuf,
        /// The file to write.
        output: PathBuf,
    },
    /// Streams a WAV file through the feeder and writes what comes out.
    Render {
        /// The file to read.
        input: PathBuf,
        /// The file to write.
        output: PathBuf,
        /// Loop start in seconds. Giving either loop point enables looping.
        #[arg(long)]
        loop_start: Option<f64>,
        /// Loop end in seconds.
        #[arg(long)]
        loop_end: Option<f64>,
        /// How many seconds to render. Required when looping.
        #[arg(short, long)]
        seconds: Option<f64>,
        /// The path to a stream config file.
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Plays a WAV file through the null output, paced in real time.
    Play {
        /// The path to the WAV file.
        path: PathBuf,
        /// The path to a stream config file.
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Stop after this many seconds.
        #[arg(short, long)]
        seconds: Option<f64>,
        /// Drain the stream as fast as possible.
        #[arg(long)]
        unpaced: bool,
    },
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Info { path } => {
            let stream = WavStream::open(&path)?;
            let spec = stream.spec();
            println!("{}: {}", path.display(), spec);
            println!("- data offset: {}", spec.data_offset);
            println!("- data length: {} bytes", spec.data_len);
        }
        Commands::Dump { path, frames } => {
            let mut stream = WavStream::open(&path)?;
            let channels = usize::from(stream.spec().channels);
            match stream.decode(frames)? {
                SampleData::Uint8(samples) => print_frames(&samples, channels),
                SampleData::Int16(samples) => print_frames(&samples, channels),
                other => return Err(format!("unexpected {} data", other.depth()).into()),
            }
        }
        Commands::Convert { input, output } => {
            let buffer = wav::load_wav(&input)?;
            wav::save_wav(&output, &buffer)?;
        }
        Commands::Render {
            input,
            output,
            loop_start,
            loop_end,
            seconds,
            config: config_path,
        } => {
            let mut stream_config = config::Stream::load(config_path.as_deref())?;
            let mut source = WavStream::open(&input)?;
            if loop_start.is_some() || loop_end.is_some() {
                let length = source.length();
                source.set_loop(loop_start.unwrap_or(0.0), loop_end.unwrap_or(length));
                stream_config = stream_config.with_play_mode(PlayMode::Loop);
            }

            let sample_rate = source.spec().sample_rate;
            let limit = match seconds {
                Some(seconds) => Some(seconds_to_frames(seconds, sample_rate)),
                None if stream_config.play_mode() == PlayMode::Loop => {
                    return Err("rendering a looped stream needs --seconds".into())
                }
                None => None,
            };

            let mut stream = PlaybackStream::spawn(Box::new(source), &stream_config)?;
            let mut capture = CaptureOutput::new(limit);
            let frames = capture.play(&mut stream)?;
            stream.close()?;

            let buffer = capture.into_buffer().ok_or("nothing was captured")?;
            wav::save_wav(&output, &buffer)?;
            info!(frames, output = ?output, "Rendered stream");
        }
        Commands::Play {
            path,
            config: config_path,
            seconds,
            unpaced,
        } => {
            let stream_config = config::Stream::load(config_path.as_deref())?;
            let source = WavStream::open(&path)?;
            let limit = seconds.map(|s| seconds_to_frames(s, source.spec().sample_rate));

            let mut stream = PlaybackStream::spawn(Box::new(source), &stream_config)?;
            let mut output = NullOutput::new(!unpaced, limit);
            println!("Playing {} through {}", path.display(), output);
            let frames = output.play(&mut stream)?;
            stream.close()?;
            println!("Played {} frames", frames);
        }
    }

    Ok(())
}

fn seconds_to_frames(seconds: f64, sample_rate: u32) -> u64 {
    (seconds * f64::from(sample_rate)).round() as u64
}

fn print_frames<T: std::fmt::Display>(samples: &[T], channels: usize) {
    for (i, frame) in samples.chunks(channels).enumerate() {
        let values: Vec<String> = frame.iter().map(|s| s.to_string()).collect();
        println!("{:>8}: {}", i, values.join(" "));
    }
}
