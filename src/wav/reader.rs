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
use std::io::{self, ErrorKind, Read, Seek, SeekFrom};

/// Sequential little-endian reads over a seekable byte stream.
///
/// The reader keeps its own copy of the stream cursor so that the current
/// position can be queried without touching the underlying stream.
pub struct ByteReader<R> {
    inner: R,
    position: u64,
}

impl<R: Read + Seek> ByteReader<R> {
    /// Wraps the given stream, starting from its current position.
    pub fn new(mut inner: R) -> io::Result<Self> {
        let position = inner.stream_position()?;
        Ok(Self { inner, position })
    }

    /// Returns the absolute byte position of the next read.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Reads as many bytes as are available into `buf`, stopping early only at
    /// end of stream. Returns the number of bytes read.
    pub fn read_up_to(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => {
                    filled += n;
                    self.position += n as u64;
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(filled)
    }

    /// Fills `buf` completely or fails with `UnexpectedEof`.
    pub fn read_exact(&mut self, buf: &mut [u8]) -> io::Result<()> {
        if self.read_up_to(buf)? != buf.len() {
            return Err(io::Error::new(
                ErrorKind::UnexpectedEof,
                "stream ended mid-read",
            ));
        }
        Ok(())
    }

    /// Reads a four character chunk tag.
    pub fn read_tag(&mut self) -> io::Result<[u8; 4]> {
        let mut tag = [0u8; 4];
        self.read_exact(&mut tag)?;
        Ok(tag)
    }

    pub fn read_u16_le(&mut self) -> io::Result<u16> {
        let mut bytes = [0u8; 2];
        self.read_exact(&mut bytes)?;
        Ok(u16::from_le_bytes(bytes))
    }

    pub fn read_u32_le(&mut self) -> io::Result<u32> {
        let mut bytes = [0u8; 4];
        self.read_exact(&mut bytes)?;
        Ok(u32::from_le_bytes(bytes))
    }

    /// Reads a signed 16-bit sample. Returns `None` at end of stream.
    pub fn read_i16_le(&mut self) -> io::Result<Option<i16>> {
        let mut bytes = [0u8; 2];
        match self.read_up_to(&mut bytes)? {
            2 => Ok(Some(i16::from_le_bytes(bytes))),
            _ => Ok(None),
        }
    }

    /// Skips `count` bytes forward without reading them.
    pub fn skip(&mut self, count: u64) -> io::Result<()> {
        if count == 0 {
            return Ok(());
        }
        let offset = i64::try_from(count)
            .map_err(|_| io::Error::new(ErrorKind::InvalidInput, "skip too large"))?;
        self.position = self.inner.seek(SeekFrom::Current(offset))?;
        Ok(())
    }

    /// Moves the cursor to an absolute byte offset.
    pub fn seek_to(&mut self, offset: u64) -> io::Result<()> {
        self.position = self.inner.seek(SeekFrom::Start(offset))?;
        Ok(())
    }

    /// Releases the underlying stream.
    pub fn into_inner(self) -> R {
        self.inner
    }
}
