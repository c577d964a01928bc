// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Bounded rendering into caller-provided buffers (`udi_snprintf`).

use crate::arg::Arg;
use crate::render::{render, RenderError, Sink};

/// Render into `buf`, truncating to fit and NUL terminating.
///
/// Returns the length of the full rendering (excluding the NUL), which may be
/// larger than `buf`. At most `buf.len() - 1` bytes are stored. An empty buffer
/// is left untouched.
///
/// The buffer is NUL terminated even when rendering fails part way.
pub fn snprintf(buf: &mut [u8], template: &str, args: &[Arg<'_>]) -> Result<usize, RenderError> {
    let mut out = Truncating { buf, len: 0 };
    let result = render(&mut out, template, args);
    out.terminate();

    if out.truncated() {
        tracing::debug!(
            required = out.len + 1,
            capacity = out.buf.len(),
            "snprintf output truncated"
        );
    }
    result
}

/// Render with printf-style arguments into a byte buffer.
///
/// ```
/// let mut buf = [0u8; 16];
/// let len = udi_debug::udi_snprintf!(&mut buf, "id=%04x", 0x2au32).unwrap();
/// assert_eq!(&buf[..len], b"id=002a");
/// assert_eq!(buf[len], 0);
/// ```
#[macro_export]
macro_rules! udi_snprintf {
    ($buf:expr, $template:expr $(, $arg:expr)* $(,)?) => {
        $crate::snprintf($buf, $template, &[$($crate::Arg::from($arg)),*])
    };
}

struct Truncating<'b> {
    buf: &'b mut [u8],
    len: usize,
}

impl Truncating<'_> {
    /// Whether some rendered bytes did not fit before the terminator.
    fn truncated(&self) -> bool {
        self.len > 0 && self.len >= self.buf.len()
    }

    fn terminate(&mut self) {
        if let Some(last) = self.buf.len().checked_sub(1) {
            self.buf[self.len.min(last)] = 0;
        }
    }
}

impl Sink for Truncating<'_> {
    fn push(&mut self, byte: u8) {
        if self.len + 1 < self.buf.len() {
            self.buf[self.len] = byte;
        }
        self.len += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fits() {
        let mut buf = [0xffu8; 16];
        let len = snprintf(&mut buf, "v=%u", &[Arg::from(7u32)]).unwrap();
        assert_eq!(len, 3);
        assert_eq!(&buf[..4], b"v=7\0");
    }

    #[test]
    fn test_truncation_reports_full_length() {
        let mut buf = [0xffu8; 4];
        let len = snprintf(&mut buf, "hello", &[]).unwrap();
        assert_eq!(len, 5);
        assert_eq!(&buf, b"hel\0");
    }

    #[test]
    fn test_exact_fit_leaves_room_for_nul() {
        let mut buf = [0xffu8; 5];
        let len = snprintf(&mut buf, "abcde", &[]).unwrap();
        assert_eq!(len, 5);
        assert_eq!(&buf, b"abcd\0");
    }

    #[test]
    fn test_empty_buffer() {
        let mut buf: [u8; 0] = [];
        let len = snprintf(&mut buf, "%s", &[Arg::from("abc")]).unwrap();
        assert_eq!(len, 3);
    }

    #[test]
    fn test_truncation_detection() {
        let mut empty: [u8; 0] = [];
        assert!(!Truncating { buf: &mut empty, len: 0 }.truncated());
        assert!(Truncating { buf: &mut empty, len: 1 }.truncated());

        let mut buf = [0u8; 4];
        assert!(!Truncating { buf: &mut buf, len: 3 }.truncated());
        assert!(Truncating { buf: &mut buf, len: 4 }.truncated());
    }

    #[test]
    fn test_empty_render_into_empty_buffer() {
        let mut buf: [u8; 0] = [];
        assert_eq!(snprintf(&mut buf, "", &[]).unwrap(), 0);
    }

    #[test]
    fn test_error_still_terminates() {
        let mut buf = [0xffu8; 8];
        let err = snprintf(&mut buf, "ab%d", &[]).unwrap_err();
        assert!(matches!(err, RenderError::MissingArgument { index: 0, .. }));
        assert_eq!(&buf[..3], b"ab\0");
    }

    #[test]
    fn test_macro_form() {
        let mut buf = [0u8; 32];
        let len = udi_snprintf!(&mut buf, "%s:%d", "port", 8).unwrap();
        assert_eq!(&buf[..len], b"port:8");
    }
}
