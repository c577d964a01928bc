// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! `udi_strtou32`-style unsigned integer parsing.

/// Parse an unsigned 32-bit integer from the start of `s`.
///
/// Leading ASCII whitespace is skipped and an optional `+`/`-` sign is
/// accepted; a negated value wraps in two's complement. Base 0 selects 16 for
/// a `0x`/`0X` prefix, 8 for a leading `0` and 10 otherwise. Base 16 also
/// accepts an optional `0x` prefix. Overflow wraps.
///
/// Returns the value and the unparsed remainder. When no digits are found, or
/// `base` is not 0 or in `2..=36`, the result is 0 and the remainder is all
/// of `s`.
pub fn strtou32(s: &str, base: u32) -> (u32, &str) {
    let (value, rest) = strtou64(s, base);
    (value as u32, rest)
}

/// 64-bit variant of [`strtou32`], used for bus addresses.
pub fn strtou64(s: &str, base: u32) -> (u64, &str) {
    if base == 1 || base > 36 {
        return (0, s);
    }

    let mut rest = s.trim_start_matches(|c: char| c.is_ascii_whitespace());
    let negative = match rest.as_bytes().first() {
        Some(b'-') => {
            rest = &rest[1..];
            true
        }
        Some(b'+') => {
            rest = &rest[1..];
            false
        }
        _ => false,
    };

    let base = match base {
        0 | 16 if has_hex_prefix(rest) => {
            rest = &rest[2..];
            16
        }
        0 if rest.starts_with('0') => 8,
        0 => 10,
        other => other,
    };

    let len = rest.find(|c: char| !c.is_digit(base)).unwrap_or(rest.len());
    if len == 0 {
        return (0, s);
    }

    let value = rest[..len]
        .chars()
        .filter_map(|c| c.to_digit(base))
        .fold(0u64, |acc, digit| {
            acc.wrapping_mul(u64::from(base)).wrapping_add(u64::from(digit))
        });
    let value = if negative { value.wrapping_neg() } else { value };

    (value, &rest[len..])
}

fn has_hex_prefix(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() > 2 && bytes[0] == b'0' && (bytes[1] | 0x20) == b'x' && bytes[2].is_ascii_hexdigit()
}
