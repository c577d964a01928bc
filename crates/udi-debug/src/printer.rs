// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! The `udi_debug_printf` line printer.
//!
//! Each call writes one line: [`TAG`], the rendered template, then `\n`.
//! Rendered bytes are staged in a small chunk buffer on their way to the
//! writer. No lock is held across a line, so concurrent callers may interleave.

use crate::arg::Arg;
use crate::render::{render, RenderError, Sink};
use std::io::{self, Write};
use thiserror::Error;

/// Prefix written before every debug line.
pub const TAG: &str = "udi_debug_printf: ";

const CHUNK_SIZE: usize = 64;

/// Debug print failures.
#[derive(Debug, Error)]
pub enum PrintError {
    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("failed to write debug line: {0}")]
    Io(#[from] io::Error),
}

/// Writes tagged debug lines to an [`io::Write`] destination.
#[derive(Debug)]
pub struct DebugPrinter<W> {
    writer: W,
}

impl DebugPrinter<io::Stdout> {
    /// Printer for the process standard output stream.
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> DebugPrinter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    /// Write one debug line.
    ///
    /// A rendering error still produces a terminated line containing the
    /// text rendered before the failure; the error is returned afterwards.
    pub fn try_print(&mut self, template: &str, args: &[Arg<'_>]) -> Result<(), PrintError> {
        self.writer.write_all(TAG.as_bytes())?;

        let mut chunks = ChunkWriter::new(&mut self.writer);
        let rendered = render(&mut chunks, template, args);
        let body = chunks.finish();

        // The line is terminated even when the body could not be written.
        let newline = self.writer.write_all(b"\n");
        let flushed = self.writer.flush();

        body?;
        newline?;
        flushed?;
        rendered?;
        Ok(())
    }

    /// Write one debug line, logging any failure instead of returning it.
    pub fn print(&mut self, template: &str, args: &[Arg<'_>]) {
        if let Err(err) = self.try_print(template, args) {
            tracing::warn!(template, error = %err, "udi_debug_printf line incomplete");
        }
    }
}

/// Print a tagged debug line to standard output.
pub fn debug_print(template: &str, args: &[Arg<'_>]) {
    DebugPrinter::stdout().print(template, args);
}

/// Print a tagged debug line to standard output.
///
/// ```
/// udi_debug::udi_debug_printf!("value=%d", 42);
/// // udi_debug_printf: value=42
/// ```
#[macro_export]
macro_rules! udi_debug_printf {
    ($template:expr $(, $arg:expr)* $(,)?) => {
        $crate::debug_print($template, &[$($crate::Arg::from($arg)),*])
    };
}

/// Sink that forwards bytes to a writer in fixed-size chunks.
///
/// The first write error is kept and reported by [`ChunkWriter::finish`];
/// later bytes are dropped.
struct ChunkWriter<'w, W: Write> {
    writer: &'w mut W,
    buf: [u8; CHUNK_SIZE],
    len: usize,
    error: Option<io::Error>,
}

impl<'w, W: Write> ChunkWriter<'w, W> {
    fn new(writer: &'w mut W) -> Self {
        Self {
            writer,
            buf: [0; CHUNK_SIZE],
            len: 0,
            error: None,
        }
    }

    fn flush_chunk(&mut self) {
        if self.len == 0 {
            return;
        }
        if self.error.is_none() {
            if let Err(err) = self.writer.write_all(&self.buf[..self.len]) {
                self.error = Some(err);
            }
        }
        self.len = 0;
    }

    fn finish(mut self) -> io::Result<()> {
        self.flush_chunk();
        match self.error.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl<W: Write> Sink for ChunkWriter<'_, W> {
    fn push(&mut self, byte: u8) {
        if self.len == CHUNK_SIZE {
            self.flush_chunk();
        }
        self.buf[self.len] = byte;
        self.len += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(template: &str, args: &[Arg<'_>]) -> String {
        let mut printer = DebugPrinter::new(Vec::<u8>::new());
        printer.try_print(template, args).expect("print should succeed");
        String::from_utf8(printer.into_inner()).unwrap()
    }

    /// Writer that counts writes and fails after a budget is spent.
    struct FlakyWriter {
        writes: usize,
        fail_after: usize,
        data: Vec<u8>,
    }

    impl Write for FlakyWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.writes >= self.fail_after {
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"));
            }
            self.writes += 1;
            self.data.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_tagged_lines() {
        assert_eq!(line("value=%d", &[42.into()]), "udi_debug_printf: value=42\n");
        assert_eq!(line("a=%s b=%s", &["x".into(), "y".into()]), "udi_debug_printf: a=x b=y\n");
        assert_eq!(line("plain", &[]), "udi_debug_printf: plain\n");
        assert_eq!(line("", &[]), "udi_debug_printf: \n");
    }

    #[test]
    fn test_repeated_calls_are_independent() {
        let mut printer = DebugPrinter::new(Vec::<u8>::new());
        printer.print("n=%u", &[5u32.into()]);
        printer.print("n=%u", &[5u32.into()]);
        assert_eq!(printer.get_ref().as_slice(), b"udi_debug_printf: n=5\nudi_debug_printf: n=5\n");
    }

    #[test]
    fn test_long_line_spans_chunks() {
        let long = "x".repeat(CHUNK_SIZE * 3 + 7);
        assert_eq!(line("%s", &[Arg::from(long.as_str())]), format!("{TAG}{long}\n"));
    }

    #[test]
    fn test_render_error_still_terminates_line() {
        let mut printer = DebugPrinter::new(Vec::<u8>::new());
        let err = printer.try_print("a=%d b=%d", &[1.into()]).unwrap_err();
        assert!(matches!(err, PrintError::Render(RenderError::MissingArgument { index: 1, .. })));
        assert_eq!(printer.get_ref().as_slice(), b"udi_debug_printf: a=1 b=\n");

        // The non-failing variant swallows the error but produces the same line.
        let mut printer = DebugPrinter::new(Vec::<u8>::new());
        printer.print("a=%d b=%d", &[1.into()]);
        assert_eq!(printer.get_ref().as_slice(), b"udi_debug_printf: a=1 b=\n");
    }

    #[test]
    fn test_io_error_is_reported() {
        let writer = FlakyWriter {
            writes: 0,
            fail_after: 1,
            data: Vec::new(),
        };
        let mut printer = DebugPrinter::new(writer);
        let err = printer.try_print("body", &[]).unwrap_err();
        assert!(matches!(err, PrintError::Io(ref e) if e.kind() == io::ErrorKind::BrokenPipe));
        assert_eq!(printer.get_ref().data, TAG.as_bytes());
    }

    #[test]
    fn test_io_error_wins_over_render_error() {
        let writer = FlakyWriter {
            writes: 0,
            fail_after: 1,
            data: Vec::new(),
        };
        let mut printer = DebugPrinter::new(writer);
        let err = printer.try_print("%s", &[]).unwrap_err();
        // Nothing was rendered, so the chunk writer never touched the writer;
        // the newline write is the one that fails.
        assert!(matches!(err, PrintError::Io(_)));
    }

    /// Writer that rejects exactly one write call.
    struct HiccupWriter {
        calls: usize,
        fail_on: usize,
        data: Vec<u8>,
    }

    impl Write for HiccupWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.calls += 1;
            if self.calls == self.fail_on {
                return Err(io::Error::new(io::ErrorKind::WouldBlock, "busy"));
            }
            self.data.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_body_write_error_still_terminates_line() {
        let writer = HiccupWriter {
            calls: 0,
            fail_on: 2,
            data: Vec::new(),
        };
        let mut printer = DebugPrinter::new(writer);
        let err = printer.try_print("first", &[]).unwrap_err();
        assert!(matches!(err, PrintError::Io(ref e) if e.kind() == io::ErrorKind::WouldBlock));

        printer.print("second", &[]);
        assert_eq!(
            printer.get_ref().data,
            b"udi_debug_printf: \nudi_debug_printf: second\n"
        );
    }
}
