use std::io::{BufRead, Write};

use crate::{
    error::{FramewarpError, FramewarpResult},
    pixfmt::PixelFormat,
};

/// Geometry and pixel format of one stream, as carried by its head line.
///
/// The wire form is a single ASCII line `<width> <height> <pixfmt>\n`,
/// followed immediately by the frame bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StreamHeader {
    pub width: u32,
    pub height: u32,
    pub pixfmt: PixelFormat,
}

impl StreamHeader {
    pub fn read_from(reader: &mut impl BufRead) -> FramewarpResult<Self> {
        let mut line = String::new();
        let n = reader.read_line(&mut line)?;
        if n == 0 {
            return Err(FramewarpError::stream("missing stream header"));
        }
        let Some(line) = line.strip_suffix('\n') else {
            return Err(FramewarpError::validation(
                "stream header is not newline-terminated",
            ));
        };
        Self::parse(line)
    }

    fn parse(line: &str) -> FramewarpResult<Self> {
        let mut fields = line.split_ascii_whitespace();
        let (Some(width), Some(height), Some(tag), None) =
            (fields.next(), fields.next(), fields.next(), fields.next())
        else {
            return Err(FramewarpError::validation(format!(
                "malformed stream header '{line}' (expected '<width> <height> <pixfmt>')"
            )));
        };

        let width = width.parse::<u32>().map_err(|_| {
            FramewarpError::validation(format!("stream width '{width}' is not a valid integer"))
        })?;
        let height = height.parse::<u32>().map_err(|_| {
            FramewarpError::validation(format!("stream height '{height}' is not a valid integer"))
        })?;
        if width == 0 || height == 0 {
            return Err(FramewarpError::validation(format!(
                "stream geometry {width}x{height} must be non-zero"
            )));
        }

        Ok(Self {
            width,
            height,
            pixfmt: PixelFormat::from_tag(tag)?,
        })
    }

    /// Emits the head line and flushes it, so frame bytes never sit
    /// behind an unflushed header in the sink.
    pub fn write_to(&self, writer: &mut impl Write) -> FramewarpResult<()> {
        writeln!(writer, "{self}")?;
        writer.flush()?;
        Ok(())
    }

    pub fn row_size(&self) -> FramewarpResult<usize> {
        (self.width as usize)
            .checked_mul(self.pixfmt.pixel_size())
            .ok_or_else(|| FramewarpError::validation("stream row size overflows usize"))
    }

    pub fn frame_size(&self) -> FramewarpResult<usize> {
        self.row_size()?
            .checked_mul(self.height as usize)
            .ok_or_else(|| FramewarpError::validation("stream frame size overflows usize"))
    }
}

impl std::fmt::Display for StreamHeader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {}", self.width, self.height, self.pixfmt)
    }
}

/// One open stream of fixed-size frames: a parsed header plus the
/// reader positioned at the first frame byte.
pub struct FrameStream<R> {
    header: StreamHeader,
    row_size: usize,
    frame_size: usize,
    reader: R,
}

impl<R: BufRead> FrameStream<R> {
    pub fn open(mut reader: R) -> FramewarpResult<Self> {
        let header = StreamHeader::read_from(&mut reader)?;
        Ok(Self {
            row_size: header.row_size()?,
            frame_size: header.frame_size()?,
            header,
            reader,
        })
    }

    pub fn header(&self) -> &StreamHeader {
        &self.header
    }

    pub fn row_size(&self) -> usize {
        self.row_size
    }

    pub fn frame_size(&self) -> usize {
        self.frame_size
    }

    /// Fills `buf` with the next frame. `Ok(false)` means the stream
    /// ended cleanly at a frame boundary; a truncated frame is an error.
    pub fn read_frame(&mut self, buf: &mut [u8]) -> FramewarpResult<bool> {
        debug_assert_eq!(buf.len(), self.frame_size);
        self.read_block(buf, "frame")
    }

    /// Same contract as [`read_frame`](Self::read_frame), at row granularity.
    pub fn read_row(&mut self, buf: &mut [u8]) -> FramewarpResult<bool> {
        debug_assert_eq!(buf.len(), self.row_size);
        self.read_block(buf, "row")
    }

    fn read_block(&mut self, buf: &mut [u8], what: &str) -> FramewarpResult<bool> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.reader.read(&mut buf[filled..]) {
                Ok(0) if filled == 0 => return Ok(false),
                Ok(0) => {
                    return Err(FramewarpError::stream(format!(
                        "stream ended mid-{what} ({filled} of {} bytes)",
                        buf.len()
                    )));
                }
                Ok(n) => filled += n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(true)
    }
}
