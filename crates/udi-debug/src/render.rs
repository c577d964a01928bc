// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Template rendering into byte sinks.
//!
//! Rendering streams: bytes reach the sink as segments are parsed, so output
//! produced before a failure stays in the sink.

use crate::arg::{Arg, ArgKind};
use crate::format::{
    BitField, Bitset, Conversion, FieldSpec, IntFormat, IntSize, PadKind, ParseError, Parser,
    Segment,
};
use thiserror::Error;

/// Rendering failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("malformed template: {0}")]
    Parse(#[from] ParseError),

    #[error("missing argument {index} (expected {expected})")]
    MissingArgument { index: usize, expected: ArgKind },

    #[error("argument {index} is a {found}, expected {expected}")]
    ArgumentMismatch {
        index: usize,
        expected: ArgKind,
        found: ArgKind,
    },

    #[error("template consumes {expected} arguments but {supplied} were supplied")]
    ExtraArguments { expected: usize, supplied: usize },
}

/// Byte destination for rendered output.
pub trait Sink {
    fn push(&mut self, byte: u8);

    fn push_bytes(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.push(byte);
        }
    }
}

impl Sink for Vec<u8> {
    fn push(&mut self, byte: u8) {
        Vec::push(self, byte);
    }

    fn push_bytes(&mut self, bytes: &[u8]) {
        self.extend_from_slice(bytes);
    }
}

/// Render `template` against `args` into `sink`.
///
/// Returns the number of bytes pushed. Arguments are checked against the
/// conversions that consume them; surplus arguments are reported only after
/// the whole template has been rendered.
pub fn render<S: Sink + ?Sized>(
    sink: &mut S,
    template: &str,
    args: &[Arg<'_>],
) -> Result<usize, RenderError> {
    let mut out = Counting { inner: sink, count: 0 };
    let mut args = ArgCursor { args, next: 0 };

    for segment in Parser::new(template) {
        match segment? {
            Segment::Literal(text) => out.push_bytes(text.as_bytes()),
            Segment::Conversion(conversion) => {
                render_conversion(&mut out, &conversion, &mut args)?;
            }
        }
    }

    args.finish()?;
    Ok(out.count)
}

fn render_conversion<S: Sink + ?Sized>(
    out: &mut S,
    conversion: &Conversion<'_>,
    args: &mut ArgCursor<'_, '_>,
) -> Result<(), RenderError> {
    match conversion {
        Conversion::Integer { spec, size, format } => {
            render_integer(out, *spec, *size, *format, args.integer()?);
        }
        Conversion::String(spec) => pad(out, *spec, args.string()?, None),
        Conversion::Char => out.push(args.char()?),
        Conversion::Pointer { upper } => {
            out.push_bytes(b"0x");
            out.push_bytes(Digits::new(args.pointer()? as u64, 16, *upper).as_bytes());
        }
        Conversion::BusAddr { upper } => {
            out.push_bytes(b"0x");
            out.push_bytes(Digits::new(args.bus_addr()?, 16, *upper).as_bytes());
        }
        Conversion::Bitset(bitset) => render_bitset(out, bitset, args.integer()?),
    }
    Ok(())
}

fn render_integer<S: Sink + ?Sized>(
    out: &mut S,
    spec: FieldSpec,
    size: IntSize,
    format: IntFormat,
    raw: u32,
) {
    let (value, radix, upper) = match format {
        IntFormat::Decimal => {
            let value = size.sign_extend(raw);
            let digits = Digits::new(u64::from(value.unsigned_abs()), 10, false);
            let sign = value.is_negative().then_some(b'-');
            pad(out, spec, digits.as_bytes(), sign);
            return;
        }
        IntFormat::Unsigned => (size.truncate(raw), 10, false),
        IntFormat::LowerHex => (size.truncate(raw), 16, false),
        IntFormat::UpperHex => (size.truncate(raw), 16, true),
    };
    pad(out, spec, Digits::new(u64::from(value), radix, upper).as_bytes(), None);
}

fn render_bitset<S: Sink + ?Sized>(out: &mut S, bitset: &Bitset<'_>, value: u32) {
    out.push(b'<');
    let mut first = true;
    let mut separate = |out: &mut S| {
        if !first {
            out.push_bytes(b", ");
        }
        first = false;
    };

    for field in bitset.fields() {
        match field {
            BitField::Flag { bit, inverted, name } => {
                let set = (value >> bit) & 1 == 1;
                if set != *inverted {
                    separate(out);
                    out.push_bytes(name.as_bytes());
                }
            }
            BitField::Range { start, end, name, values } => {
                let mask = ((1u64 << (end - start + 1)) - 1) as u32;
                let field_value = (value >> start) & mask;

                separate(out);
                out.push_bytes(name.as_bytes());
                out.push(b'=');
                match values.iter().find(|(candidate, _)| *candidate == field_value) {
                    Some((_, label)) => out.push_bytes(label.as_bytes()),
                    None => {
                        let digits = Digits::new(u64::from(field_value), 16, false);
                        out.push_bytes(digits.as_bytes());
                    }
                }
            }
        }
    }
    out.push(b'>');
}

/// Emit `body` (with an optional sign byte) padded to the field width.
fn pad<S: Sink + ?Sized>(out: &mut S, spec: FieldSpec, body: &[u8], sign: Option<u8>) {
    let len = body.len() + usize::from(sign.is_some());
    let fill = spec.width.saturating_sub(len);

    match spec.pad {
        PadKind::Unspecified => {
            repeat(out, b' ', fill);
            out.push_bytes(sign.as_slice());
            out.push_bytes(body);
        }
        PadKind::LeadingZero => {
            out.push_bytes(sign.as_slice());
            repeat(out, b'0', fill);
            out.push_bytes(body);
        }
        PadKind::LeftJustify => {
            out.push_bytes(sign.as_slice());
            out.push_bytes(body);
            repeat(out, b' ', fill);
        }
    }
}

fn repeat<S: Sink + ?Sized>(out: &mut S, byte: u8, count: usize) {
    for _ in 0..count {
        out.push(byte);
    }
}

/// Digits of an unsigned value, most significant first.
struct Digits {
    buf: [u8; 64],
    start: usize,
}

impl Digits {
    fn new(mut value: u64, radix: u64, upper: bool) -> Self {
        let mut buf = [0u8; 64];
        let mut start = buf.len();
        loop {
            let digit = (value % radix) as u8;
            start -= 1;
            buf[start] = match digit {
                0..=9 => b'0' + digit,
                _ if upper => b'A' + digit - 10,
                _ => b'a' + digit - 10,
            };
            value /= radix;
            if value == 0 {
                break;
            }
        }
        Self { buf, start }
    }

    fn as_bytes(&self) -> &[u8] {
        &self.buf[self.start..]
    }
}

/// Sink adapter counting the bytes that pass through.
struct Counting<'s, S: ?Sized> {
    inner: &'s mut S,
    count: usize,
}

impl<S: Sink + ?Sized> Sink for Counting<'_, S> {
    fn push(&mut self, byte: u8) {
        self.inner.push(byte);
        self.count += 1;
    }

    fn push_bytes(&mut self, bytes: &[u8]) {
        self.inner.push_bytes(bytes);
        self.count += bytes.len();
    }
}

/// Positional argument reader with kind checks.
struct ArgCursor<'r, 'a> {
    args: &'r [Arg<'a>],
    next: usize,
}

impl<'a> ArgCursor<'_, 'a> {
    fn take(&mut self, expected: ArgKind) -> Result<(usize, Arg<'a>), RenderError> {
        let index = self.next;
        let arg = *self
            .args
            .get(index)
            .ok_or(RenderError::MissingArgument { index, expected })?;
        self.next += 1;
        Ok((index, arg))
    }

    fn mismatch(index: usize, expected: ArgKind, found: &Arg<'_>) -> RenderError {
        RenderError::ArgumentMismatch {
            index,
            expected,
            found: found.kind(),
        }
    }

    fn integer(&mut self) -> Result<u32, RenderError> {
        match self.take(ArgKind::Integer)? {
            (_, Arg::Integer(value)) => Ok(value),
            (index, other) => Err(Self::mismatch(index, ArgKind::Integer, &other)),
        }
    }

    fn string(&mut self) -> Result<&'a [u8], RenderError> {
        match self.take(ArgKind::String)? {
            (_, Arg::Str(value)) => Ok(value),
            (index, other) => Err(Self::mismatch(index, ArgKind::String, &other)),
        }
    }

    /// `%c` also takes an integer and prints its low byte.
    fn char(&mut self) -> Result<u8, RenderError> {
        match self.take(ArgKind::Char)? {
            (_, Arg::Char(value)) => Ok(value),
            (_, Arg::Integer(value)) => Ok(value as u8),
            (index, other) => Err(Self::mismatch(index, ArgKind::Char, &other)),
        }
    }

    fn pointer(&mut self) -> Result<usize, RenderError> {
        match self.take(ArgKind::Pointer)? {
            (_, Arg::Pointer(value)) => Ok(value),
            (index, other) => Err(Self::mismatch(index, ArgKind::Pointer, &other)),
        }
    }

    fn bus_addr(&mut self) -> Result<u64, RenderError> {
        match self.take(ArgKind::BusAddr)? {
            (_, Arg::BusAddr(value)) => Ok(value),
            (index, other) => Err(Self::mismatch(index, ArgKind::BusAddr, &other)),
        }
    }

    fn finish(self) -> Result<(), RenderError> {
        if self.next < self.args.len() {
            return Err(RenderError::ExtraArguments {
                expected: self.next,
                supplied: self.args.len(),
            });
        }
        Ok(())
    }
}
