// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Typed printf arguments.

use std::ffi::CStr;
use std::fmt;

/// A single positional argument.
///
/// Integers are stored as raw 32-bit patterns; the conversion decides whether
/// they are read as signed, unsigned, and at which width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arg<'a> {
    Integer(u32),
    Str(&'a [u8]),
    Char(u8),
    Pointer(usize),
    BusAddr(u64),
}

impl Arg<'_> {
    /// Address of `ptr`, for `%p`.
    pub fn pointer<T: ?Sized>(ptr: *const T) -> Self {
        Arg::Pointer(ptr.cast::<()>() as usize)
    }

    pub fn kind(&self) -> ArgKind {
        match self {
            Self::Integer(_) => ArgKind::Integer,
            Self::Str(_) => ArgKind::String,
            Self::Char(_) => ArgKind::Char,
            Self::Pointer(_) => ArgKind::Pointer,
            Self::BusAddr(_) => ArgKind::BusAddr,
        }
    }
}

/// Kind of value a conversion consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArgKind {
    Integer,
    String,
    Char,
    Pointer,
    BusAddr,
}

impl ArgKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Integer => "integer",
            Self::String => "string",
            Self::Char => "char",
            Self::Pointer => "pointer",
            Self::BusAddr => "bus address",
        }
    }
}

impl fmt::Display for ArgKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

macro_rules! impl_from_unsigned {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Arg<'_> {
                fn from(value: $ty) -> Self {
                    Arg::Integer(u32::from(value))
                }
            }
        )*
    };
}

macro_rules! impl_from_signed {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Arg<'_> {
                fn from(value: $ty) -> Self {
                    Arg::Integer(i32::from(value) as u32)
                }
            }
        )*
    };
}

impl_from_unsigned!(u8, u16, u32, bool);
impl_from_signed!(i8, i16, i32);

/// 64-bit values are bus addresses (`%a`).
impl From<u64> for Arg<'_> {
    fn from(value: u64) -> Self {
        Arg::BusAddr(value)
    }
}

/// Pointer-sized values are addresses (`%p`).
impl From<usize> for Arg<'_> {
    fn from(value: usize) -> Self {
        Arg::Pointer(value)
    }
}

impl<'a> From<&'a str> for Arg<'a> {
    fn from(value: &'a str) -> Self {
        Arg::Str(value.as_bytes())
    }
}

impl<'a> From<&'a String> for Arg<'a> {
    fn from(value: &'a String) -> Self {
        Arg::Str(value.as_bytes())
    }
}

impl<'a> From<&'a CStr> for Arg<'a> {
    fn from(value: &'a CStr) -> Self {
        Arg::Str(value.to_bytes())
    }
}

impl<'a> From<&'a [u8]> for Arg<'a> {
    fn from(value: &'a [u8]) -> Self {
        Arg::Str(value)
    }
}

impl<T: ?Sized> From<*const T> for Arg<'_> {
    fn from(value: *const T) -> Self {
        Arg::pointer(value)
    }
}

impl<T: ?Sized> From<*mut T> for Arg<'_> {
    fn from(value: *mut T) -> Self {
        Arg::pointer(value.cast_const())
    }
}
