// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! UDI printf template parser.
//!
//! Templates are parsed lazily: [`Parser`] yields one [`Segment`] at a time so a
//! renderer can stop at the first malformed conversion and keep everything it
//! already emitted. [`Template::parse`] collects and validates a whole template.
//!
//! # Dialect
//!
//! | Conversion            | Argument              |
//! |-----------------------|-----------------------|
//! | `%d %u %x %X`         | 32-bit integer        |
//! | `%hd %hu %hx %hX`     | 16-bit integer        |
//! | `%bd %bu %bx %bX`     | 8-bit integer         |
//! | `%s`                  | string                |
//! | `%c`                  | single byte           |
//! | `%p %P`               | pointer               |
//! | `%a %A`               | 64-bit bus address    |
//! | `%<...>`              | 32-bit bitset         |
//!
//! Integers and strings accept a `0` (zero fill) or `-` (left justify) flag
//! followed by a minimum field width.

use crate::arg::ArgKind;
use thiserror::Error;

/// Template parse failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} at offset {pos}")]
pub struct ParseError {
    /// Byte offset into the template where the problem was detected.
    pub pos: usize,
    /// What went wrong.
    pub kind: ParseErrorKind,
}

/// Kinds of template parse failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    #[error("unexpected end of template")]
    UnexpectedEof,

    #[error("expected a digit, got {0:?}")]
    ExpectedDigit(char),

    #[error("number does not fit in 32 bits")]
    NumberTooLarge,

    #[error("invalid conversion `{0}`")]
    InvalidConversion(String),

    #[error("unexpected character {found:?}, expected {expected}")]
    UnexpectedChar { expected: &'static str, found: char },

    #[error("bit {0} is outside a 32-bit value")]
    BitOutOfRange(u32),

    #[error("bit range {start}-{end} is inverted")]
    InvertedRange { start: u32, end: u32 },
}

/// Padding behaviour selected by a conversion flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PadKind {
    /// No flag: right-justify with spaces.
    #[default]
    Unspecified,
    /// `0` flag: sign first, then zero fill.
    LeadingZero,
    /// `-` flag: left-justify, spaces after.
    LeftJustify,
}

/// Flag and minimum width of a conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FieldSpec {
    pub pad: PadKind,
    pub width: usize,
}

/// Integer width selected by the `h` / `b` size prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntSize {
    /// No prefix.
    Word,
    /// `h`
    Half,
    /// `b`
    Byte,
}

impl IntSize {
    /// Number of significant bits.
    pub fn bits(self) -> u32 {
        match self {
            Self::Word => 32,
            Self::Half => 16,
            Self::Byte => 8,
        }
    }

    /// Keep only the significant bits of a raw argument.
    pub fn truncate(self, raw: u32) -> u32 {
        match self {
            Self::Word => raw,
            Self::Half => raw & 0xffff,
            Self::Byte => raw & 0xff,
        }
    }

    /// Interpret a raw argument as a signed value of this size.
    pub fn sign_extend(self, raw: u32) -> i32 {
        match self {
            Self::Word => raw as i32,
            Self::Half => i32::from(raw as u16 as i16),
            Self::Byte => i32::from(raw as u8 as i8),
        }
    }
}

/// Integer rendering style.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntFormat {
    Decimal,
    Unsigned,
    LowerHex,
    UpperHex,
}

/// One entry of a `%<...>` descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BitField<'a> {
    /// `N=Name` (or `~N=Name` when inverted).
    Flag {
        bit: u32,
        inverted: bool,
        name: &'a str,
    },
    /// `S-E=Name:V=ValueName...` over the inclusive range `start..=end`.
    Range {
        start: u32,
        end: u32,
        name: &'a str,
        values: Vec<(u32, &'a str)>,
    },
}

/// Parsed `%<...>` descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitset<'a> {
    fields: Vec<BitField<'a>>,
}

impl<'a> Bitset<'a> {
    /// Parse the text between `%<` and `>`. `offset` is the position of that
    /// text inside the enclosing template and is used for error reporting.
    pub fn parse(body: &'a str, offset: usize) -> Result<Self, ParseError> {
        let mut cursor = Cursor::new(body, offset);
        let mut fields = Vec::new();

        loop {
            // Entries are comma separated; a leading comma is accepted.
            cursor.eat(',');
            if cursor.is_empty() {
                break;
            }

            let inverted = cursor.eat('~');
            let start = cursor.bit_number()?;

            let field = if !inverted && cursor.eat('-') {
                let end_pos = cursor.pos;
                let end = cursor.bit_number()?;
                if start > end {
                    return Err(
                        cursor.error_at(end_pos, ParseErrorKind::InvertedRange { start, end })
                    );
                }
                cursor.expect('=', "`=`")?;
                let name = cursor.take_until(&[',', ':']);

                let mut values = Vec::new();
                while cursor.eat(':') {
                    let value = cursor.number()?;
                    cursor.expect('=', "`=`")?;
                    values.push((value, cursor.take_until(&[',', ':'])));
                }

                BitField::Range {
                    start,
                    end,
                    name,
                    values,
                }
            } else {
                cursor.expect('=', "`=`")?;
                BitField::Flag {
                    bit: start,
                    inverted,
                    name: cursor.take_until(&[',']),
                }
            };

            fields.push(field);
        }

        Ok(Self { fields })
    }

    pub fn fields(&self) -> &[BitField<'a>] {
        &self.fields
    }
}

/// A conversion: how to render the next argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Conversion<'a> {
    Integer {
        spec: FieldSpec,
        size: IntSize,
        format: IntFormat,
    },
    String(FieldSpec),
    Char,
    Pointer {
        upper: bool,
    },
    BusAddr {
        upper: bool,
    },
    Bitset(Bitset<'a>),
}

impl Conversion<'_> {
    /// Kind of argument this conversion consumes.
    pub fn arg_kind(&self) -> ArgKind {
        match self {
            Self::Integer { .. } | Self::Bitset(_) => ArgKind::Integer,
            Self::String(_) => ArgKind::String,
            Self::Char => ArgKind::Char,
            Self::Pointer { .. } => ArgKind::Pointer,
            Self::BusAddr { .. } => ArgKind::BusAddr,
        }
    }
}

/// A piece of a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment<'a> {
    /// Text copied to the output unchanged (`%%` yields a literal `%`).
    Literal(&'a str),
    Conversion(Conversion<'a>),
}

/// Streaming template parser.
///
/// Yields segments until the template is exhausted or an error is produced;
/// nothing is yielded after an error.
#[derive(Debug, Clone)]
pub struct Parser<'a> {
    cursor: Cursor<'a>,
    failed: bool,
}

impl<'a> Parser<'a> {
    pub fn new(template: &'a str) -> Self {
        Self {
            cursor: Cursor::new(template, 0),
            failed: false,
        }
    }

    /// Byte offset of the next unparsed character.
    pub fn offset(&self) -> usize {
        self.cursor.pos
    }

    fn conversion(&mut self) -> Result<Segment<'a>, ParseError> {
        let start = self.cursor.pos;
        self.cursor.expect('%', "`%`")?;

        if self.cursor.eat('%') {
            let input = self.cursor.input;
            return Ok(Segment::Literal(&input[start + 1..self.cursor.pos]));
        }

        let pad = if self.cursor.eat('0') {
            PadKind::LeadingZero
        } else if self.cursor.eat('-') {
            PadKind::LeftJustify
        } else {
            PadKind::Unspecified
        };
        let width = match self.cursor.peek() {
            Some(c) if c.is_ascii_digit() => self.cursor.number()? as usize,
            _ => 0,
        };
        let spec = FieldSpec { pad, width };

        let conversion = match self.cursor.bump()? {
            'h' => self.sized_integer(start, spec, IntSize::Half)?,
            'b' => self.sized_integer(start, spec, IntSize::Byte)?,
            'p' => Conversion::Pointer { upper: false },
            'P' => Conversion::Pointer { upper: true },
            'a' => Conversion::BusAddr { upper: false },
            'A' => Conversion::BusAddr { upper: true },
            'c' => Conversion::Char,
            's' => Conversion::String(spec),
            '<' => {
                let body_start = self.cursor.pos;
                let body = self.cursor.take_until(&['>']);
                if !self.cursor.eat('>') {
                    return Err(self.cursor.error(ParseErrorKind::UnexpectedEof));
                }
                Conversion::Bitset(Bitset::parse(body, body_start)?)
            }
            c => match int_format(c) {
                Some(format) => Conversion::Integer {
                    spec,
                    size: IntSize::Word,
                    format,
                },
                None => return Err(self.invalid(start)),
            },
        };

        Ok(Segment::Conversion(conversion))
    }

    fn sized_integer(
        &mut self,
        start: usize,
        spec: FieldSpec,
        size: IntSize,
    ) -> Result<Conversion<'a>, ParseError> {
        match int_format(self.cursor.bump()?) {
            Some(format) => Ok(Conversion::Integer { spec, size, format }),
            None => Err(self.invalid(start)),
        }
    }

    fn invalid(&self, start: usize) -> ParseError {
        let fragment = &self.cursor.input[start..self.cursor.pos];
        self.cursor
            .error_at(start, ParseErrorKind::InvalidConversion(fragment.to_string()))
    }
}

impl<'a> Iterator for Parser<'a> {
    type Item = Result<Segment<'a>, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        let item = match self.cursor.peek()? {
            '%' => self.conversion(),
            _ => Ok(Segment::Literal(self.cursor.take_until(&['%']))),
        };
        self.failed = item.is_err();
        Some(item)
    }
}

fn int_format(c: char) -> Option<IntFormat> {
    match c {
        'd' => Some(IntFormat::Decimal),
        'u' => Some(IntFormat::Unsigned),
        'x' => Some(IntFormat::LowerHex),
        'X' => Some(IntFormat::UpperHex),
        _ => None,
    }
}

/// Fully parsed template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template<'a> {
    source: &'a str,
    segments: Vec<Segment<'a>>,
}

impl<'a> Template<'a> {
    /// Parse and validate the whole template.
    pub fn parse(source: &'a str) -> Result<Self, ParseError> {
        let segments = Parser::new(source).collect::<Result<Vec<_>, _>>()?;
        Ok(Self { source, segments })
    }

    pub fn source(&self) -> &'a str {
        self.source
    }

    pub fn segments(&self) -> &[Segment<'a>] {
        &self.segments
    }

    /// Conversions in argument order.
    pub fn conversions(&self) -> impl Iterator<Item = &Conversion<'a>> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Conversion(conversion) => Some(conversion),
            Segment::Literal(_) => None,
        })
    }

    /// Argument kinds the template consumes, in order.
    pub fn arg_kinds(&self) -> Vec<ArgKind> {
        self.conversions().map(Conversion::arg_kind).collect()
    }
}

/// Character cursor shared by the template and bitset parsers.
#[derive(Debug, Clone)]
struct Cursor<'a> {
    input: &'a str,
    pos: usize,
    /// Offset of `input` inside the full template.
    base: usize,
}

impl<'a> Cursor<'a> {
    fn new(input: &'a str, base: usize) -> Self {
        Self {
            input,
            pos: 0,
            base,
        }
    }

    fn is_empty(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Result<char, ParseError> {
        let c = self
            .peek()
            .ok_or_else(|| self.error(ParseErrorKind::UnexpectedEof))?;
        self.pos += c.len_utf8();
        Ok(c)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: char, what: &'static str) -> Result<(), ParseError> {
        let at = self.pos;
        match self.bump()? {
            c if c == expected => Ok(()),
            found => Err(self.error_at(
                at,
                ParseErrorKind::UnexpectedChar {
                    expected: what,
                    found,
                },
            )),
        }
    }

    /// Advance up to (not past) the first character in `stop`, or to the end.
    fn take_until(&mut self, stop: &[char]) -> &'a str {
        let input = self.input;
        let rest = &input[self.pos..];
        let len = rest.find(stop).unwrap_or(rest.len());
        self.pos += len;
        &rest[..len]
    }

    fn number(&mut self) -> Result<u32, ParseError> {
        let start = self.pos;
        match self.peek() {
            Some(c) if c.is_ascii_digit() => {}
            Some(c) => return Err(self.error(ParseErrorKind::ExpectedDigit(c))),
            None => return Err(self.error(ParseErrorKind::UnexpectedEof)),
        }

        let mut value: u32 = 0;
        while let Some(digit) = self.peek().and_then(|c| c.to_digit(10)) {
            value = value
                .checked_mul(10)
                .and_then(|v| v.checked_add(digit))
                .ok_or_else(|| self.error_at(start, ParseErrorKind::NumberTooLarge))?;
            self.pos += 1;
        }
        Ok(value)
    }

    fn bit_number(&mut self) -> Result<u32, ParseError> {
        let start = self.pos;
        let bit = self.number()?;
        if bit >= u32::BITS {
            return Err(self.error_at(start, ParseErrorKind::BitOutOfRange(bit)));
        }
        Ok(bit)
    }

    fn error(&self, kind: ParseErrorKind) -> ParseError {
        self.error_at(self.pos, kind)
    }

    fn error_at(&self, pos: usize, kind: ParseErrorKind) -> ParseError {
        ParseError {
            pos: self.base + pos,
            kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segments(template: &str) -> Vec<Segment<'_>> {
        Parser::new(template)
            .collect::<Result<Vec<_>, _>>()
            .expect("template should parse")
    }

    fn error(template: &str) -> ParseError {
        Template::parse(template).expect_err("template should be rejected")
    }

    #[test]
    fn test_literal_only() {
        assert_eq!(segments("hello world"), vec![Segment::Literal("hello world")]);
        assert!(segments("").is_empty());
    }

    #[test]
    fn test_percent_escape() {
        assert_eq!(
            segments("100%% done"),
            vec![
                Segment::Literal("100"),
                Segment::Literal("%"),
                Segment::Literal(" done"),
            ]
        );
    }

    #[test]
    fn test_integer_flags_and_width() {
        let parsed = segments("%05d%-3x%12hu%bX");
        assert_eq!(
            parsed,
            vec![
                Segment::Conversion(Conversion::Integer {
                    spec: FieldSpec {
                        pad: PadKind::LeadingZero,
                        width: 5
                    },
                    size: IntSize::Word,
                    format: IntFormat::Decimal,
                }),
                Segment::Conversion(Conversion::Integer {
                    spec: FieldSpec {
                        pad: PadKind::LeftJustify,
                        width: 3
                    },
                    size: IntSize::Word,
                    format: IntFormat::LowerHex,
                }),
                Segment::Conversion(Conversion::Integer {
                    spec: FieldSpec {
                        pad: PadKind::Unspecified,
                        width: 12
                    },
                    size: IntSize::Half,
                    format: IntFormat::Unsigned,
                }),
                Segment::Conversion(Conversion::Integer {
                    spec: FieldSpec::default(),
                    size: IntSize::Byte,
                    format: IntFormat::UpperHex,
                }),
            ]
        );
    }

    #[test]
    fn test_other_conversions() {
        let template = Template::parse("%s %c %p %P %a %A").unwrap();
        assert_eq!(
            template.arg_kinds(),
            vec![
                ArgKind::String,
                ArgKind::Char,
                ArgKind::Pointer,
                ArgKind::Pointer,
                ArgKind::BusAddr,
                ArgKind::BusAddr,
            ]
        );
    }

    #[test]
    fn test_invalid_conversion() {
        let err = error("abc %q");
        assert_eq!(err.pos, 4);
        assert_eq!(err.kind, ParseErrorKind::InvalidConversion("%q".to_string()));

        let err = error("%hz");
        assert_eq!(err.kind, ParseErrorKind::InvalidConversion("%hz".to_string()));
    }

    #[test]
    fn test_truncated_conversion() {
        assert_eq!(error("tail %").kind, ParseErrorKind::UnexpectedEof);
        assert_eq!(error("%05").kind, ParseErrorKind::UnexpectedEof);
        assert_eq!(error("%b").kind, ParseErrorKind::UnexpectedEof);
    }

    #[test]
    fn test_non_ascii_does_not_split_characters() {
        assert_eq!(segments("héllo %d")[0], Segment::Literal("héllo "));
        let err = error("%é");
        assert_eq!(err.kind, ParseErrorKind::InvalidConversion("%é".to_string()));
    }

    #[test]
    fn test_parser_stops_after_error() {
        let mut parser = Parser::new("ok %y more %d");
        assert_eq!(parser.next(), Some(Ok(Segment::Literal("ok "))));
        assert!(matches!(parser.next(), Some(Err(_))));
        assert_eq!(parser.next(), None);
    }

    #[test]
    fn test_bitset_fields() {
        let template =
            Template::parse("%<,15=Active,~13=RCV,0-2=Mode:0=HDX:1=FDX,3-6=TX>").unwrap();
        let Some(Conversion::Bitset(bitset)) = template.conversions().next() else {
            panic!("expected a bitset conversion");
        };
        assert_eq!(
            bitset.fields(),
            &[
                BitField::Flag {
                    bit: 15,
                    inverted: false,
                    name: "Active"
                },
                BitField::Flag {
                    bit: 13,
                    inverted: true,
                    name: "RCV"
                },
                BitField::Range {
                    start: 0,
                    end: 2,
                    name: "Mode",
                    values: vec![(0, "HDX"), (1, "FDX")],
                },
                BitField::Range {
                    start: 3,
                    end: 6,
                    name: "TX",
                    values: vec![],
                },
            ]
        );
        assert_eq!(template.arg_kinds(), vec![ArgKind::Integer]);
    }

    #[test]
    fn test_bitset_errors() {
        assert_eq!(error("%<32=Big>").kind, ParseErrorKind::BitOutOfRange(32));
        assert_eq!(
            error("%<6-3=Backwards>").kind,
            ParseErrorKind::InvertedRange { start: 6, end: 3 }
        );
        assert_eq!(
            error("%<3:Name>").kind,
            ParseErrorKind::UnexpectedChar {
                expected: "`=`",
                found: ':'
            }
        );
        assert_eq!(error("%<x=Name>").kind, ParseErrorKind::ExpectedDigit('x'));
        assert_eq!(error("%<3=Unclosed").kind, ParseErrorKind::UnexpectedEof);
    }

    #[test]
    fn test_bitset_error_offset_is_template_relative() {
        // "ab %<" is five bytes; the bad bit number starts right after.
        assert_eq!(error("ab %<99=X>").pos, 5);
    }

    #[test]
    fn test_width_overflow() {
        assert_eq!(error("%99999999999d").kind, ParseErrorKind::NumberTooLarge);
    }

    #[test]
    fn test_int_size_helpers() {
        assert_eq!(IntSize::Half.truncate(0xdead_beef), 0xbeef);
        assert_eq!(IntSize::Byte.truncate(0xdead_beef), 0xef);
        assert_eq!(IntSize::Half.sign_extend(0xffff), -1);
        assert_eq!(IntSize::Byte.sign_extend(0x80), -128);
        assert_eq!(IntSize::Word.sign_extend(0xffff_fffe), -2);
    }
}
