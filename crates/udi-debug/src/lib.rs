// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! UDI debug printing
//!
//! Renders UDI printf-dialect templates and writes `udi_debug_printf` lines.
//!
//! # Features
//!
//! - **Debug lines**: `udi_debug_printf: <rendered>\n` on standard output
//! - **Bounded rendering**: `udi_snprintf` semantics into byte buffers
//! - **UDI dialect**: sized integers (`%hx`, `%bd`), bus addresses (`%a`),
//!   bitset descriptors (`%<...>`)
//! - **Checked arguments**: missing, surplus or mistyped arguments are
//!   reported as [`RenderError`]s instead of undefined behaviour
//!
//! # Example
//!
//! ```rust
//! use udi_debug::{udi_debug_printf, udi_snprintf, DebugPrinter, Arg};
//!
//! udi_debug_printf!("link %s at %u Mbit/s", "up", 100u32);
//!
//! let mut printer = DebugPrinter::new(Vec::<u8>::new());
//! printer.print("status=%<0=Link,1=Duplex>", &[Arg::from(0b11u32)]);
//! assert_eq!(printer.into_inner(), b"udi_debug_printf: status=<Link, Duplex>\n");
//!
//! let mut buf = [0u8; 16];
//! let len = udi_snprintf!(&mut buf, "%08X", 0xbeefu32).unwrap();
//! assert_eq!(&buf[..len], b"0000BEEF");
//! ```

mod arg;
pub mod format;
mod printer;
mod render;
mod snprintf;
mod strtou;

pub use arg::{Arg, ArgKind};
pub use format::{ParseError, ParseErrorKind, Parser, Segment, Template};
pub use printer::{debug_print, DebugPrinter, PrintError, TAG};
pub use render::{render, RenderError, Sink};
pub use snprintf::snprintf;
pub use strtou::{strtou32, strtou64};
