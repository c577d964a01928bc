// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! UDI printf CLI
//!
//! Render and inspect UDI printf templates.
//!
//! # Usage
//!
//! ```bash
//! # Emit a debug line on stdout
//! udi-printf print "value=%d" 42
//!
//! # Render into a 16 byte buffer
//! udi-printf format --size 16 "%s=%08x" status 0xbeef
//!
//! # List the arguments a template expects
//! udi-printf check --output json "%<0=Link,1-2=Speed:0=10:1=100>"
//! ```

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing_subscriber::{fmt, EnvFilter};
use udi_debug::format::{Conversion, IntFormat, PadKind};
use udi_debug::{strtou64, Arg, ArgKind, DebugPrinter, Segment, Template};

#[derive(Parser)]
#[command(name = "udi-printf")]
#[command(author = "naskel.com")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Render and inspect UDI printf templates")]
#[command(long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Verbose mode (show internal logs)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Print a tagged debug line to stdout
    Print {
        /// UDI printf template
        template: String,
        /// Arguments, converted according to the template
        #[arg(allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// Render into a fixed-size buffer (udi_snprintf)
    Format {
        /// Buffer size in bytes, including the terminating NUL
        #[arg(short, long, default_value = "256")]
        size: usize,
        /// UDI printf template
        template: String,
        /// Arguments, converted according to the template
        #[arg(allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// Parse a template and list the arguments it consumes
    Check {
        /// Report format
        #[arg(short, long, value_enum, default_value = "text")]
        output: ReportFormat,
        /// UDI printf template
        template: String,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ReportFormat {
    Text,
    Json,
}

/// Template inspection report.
#[derive(Debug, Serialize)]
struct CheckReport<'a> {
    template: &'a str,
    arguments: usize,
    conversions: Vec<ConversionReport<'a>>,
}

#[derive(Debug, Serialize)]
struct ConversionReport<'a> {
    index: usize,
    offset: usize,
    fragment: &'a str,
    argument: &'static str,
    description: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("udi_printf=debug,udi_debug=debug")
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("udi_printf=info,udi_debug=warn"))
    };
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Print { template, args } => run_print(&template, &args),
        Command::Format { size, template, args } => run_format(size, &template, &args),
        Command::Check { output, template } => run_check(output, &template),
    }
}

fn run_print(template: &str, raw: &[String]) -> Result<()> {
    let args = convert_args(template, raw)?;
    DebugPrinter::stdout()
        .try_print(template, &args)
        .context("Failed to print debug line")?;
    Ok(())
}

fn run_format(size: usize, template: &str, raw: &[String]) -> Result<()> {
    let args = convert_args(template, raw)?;
    let mut buf = vec![0u8; size];
    let len = udi_debug::snprintf(&mut buf, template, &args).context("Failed to render template")?;

    let stored = len.min(size.saturating_sub(1));
    tracing::debug!(len, stored, size, "rendered into buffer");

    println!("{}", String::from_utf8_lossy(&buf[..stored]));
    if stored < len {
        println!("(truncated: {} of {} bytes stored)", stored, len);
    }
    Ok(())
}

fn run_check(output: ReportFormat, template: &str) -> Result<()> {
    let report = inspect(template)?;
    match output {
        ReportFormat::Json => {
            let json = serde_json::to_string_pretty(&report).context("Failed to encode report")?;
            println!("{}", json);
        }
        ReportFormat::Text => {
            println!("{} argument(s)", report.arguments);
            for conversion in &report.conversions {
                println!(
                    "  #{:<2} @{:<3} {:<12} {:<12} {}",
                    conversion.index,
                    conversion.offset,
                    conversion.fragment,
                    conversion.argument,
                    conversion.description
                );
            }
        }
    }
    Ok(())
}

fn inspect(template: &str) -> Result<CheckReport<'_>> {
    let mut parser = udi_debug::Parser::new(template);
    let mut conversions = Vec::new();

    loop {
        let offset = parser.offset();
        let Some(segment) = parser.next() else { break };
        let segment = segment.with_context(|| format!("Invalid template {:?}", template))?;
        if let Segment::Conversion(conversion) = segment {
            conversions.push(ConversionReport {
                index: conversions.len(),
                offset,
                fragment: &template[offset..parser.offset()],
                argument: conversion.arg_kind().as_str(),
                description: describe(&conversion),
            });
        }
    }

    Ok(CheckReport {
        template,
        arguments: conversions.len(),
        conversions,
    })
}

/// Human-readable summary of a conversion.
fn describe(conversion: &Conversion<'_>) -> String {
    let padding = |pad: PadKind, width: usize| match (pad, width) {
        (_, 0) => String::new(),
        (PadKind::Unspecified, w) => format!(", right-justified to {}", w),
        (PadKind::LeadingZero, w) => format!(", zero-filled to {}", w),
        (PadKind::LeftJustify, w) => format!(", left-justified to {}", w),
    };

    match conversion {
        Conversion::Integer { spec, size, format } => {
            let style = match format {
                IntFormat::Decimal => "signed decimal",
                IntFormat::Unsigned => "unsigned decimal",
                IntFormat::LowerHex => "lowercase hex",
                IntFormat::UpperHex => "uppercase hex",
            };
            format!("{}-bit {}{}", size.bits(), style, padding(spec.pad, spec.width))
        }
        Conversion::String(spec) => format!("string{}", padding(spec.pad, spec.width)),
        Conversion::Char => "single byte".to_string(),
        Conversion::Pointer { upper } => format!("pointer, {} hex", case(*upper)),
        Conversion::BusAddr { upper } => format!("64-bit bus address, {} hex", case(*upper)),
        Conversion::Bitset(bitset) => format!("32-bit bitset, {} field(s)", bitset.fields().len()),
    }
}

fn case(upper: bool) -> &'static str {
    if upper {
        "uppercase"
    } else {
        "lowercase"
    }
}

/// Convert textual arguments to the kinds the template expects.
///
/// Arguments beyond the template's conversions are passed as strings so the
/// renderer can report the surplus.
fn convert_args<'a>(template: &str, raw: &'a [String]) -> Result<Vec<Arg<'a>>> {
    let kinds = match Template::parse(template) {
        Ok(parsed) => parsed.arg_kinds(),
        Err(err) => {
            // Let the renderer report the error after emitting what it can.
            tracing::debug!(error = %err, "template does not parse; passing arguments as strings");
            Vec::new()
        }
    };

    raw.iter()
        .enumerate()
        .map(|(index, text)| {
            let kind = kinds.get(index).copied().unwrap_or(ArgKind::String);
            convert_arg(kind, text).with_context(|| {
                format!("Argument {} ({:?}) is not a valid {}", index, text, kind)
            })
        })
        .collect()
}

fn convert_arg(kind: ArgKind, text: &str) -> Result<Arg<'_>> {
    Ok(match kind {
        ArgKind::Integer => Arg::Integer(parse_integer(text)?),
        ArgKind::Pointer => {
            let value = parse_number(text, strtou64)?;
            match usize::try_from(value) {
                Ok(addr) => Arg::Pointer(addr),
                Err(_) => bail!("{:#x} does not fit in a pointer", value),
            }
        }
        ArgKind::BusAddr => Arg::BusAddr(parse_number(text, strtou64)?),
        ArgKind::String => Arg::Str(text.as_bytes()),
        ArgKind::Char => match text.as_bytes() {
            [byte] => Arg::Char(*byte),
            _ => bail!("expected exactly one byte"),
        },
    })
}

/// Parse a 32-bit integer; negative decimal input is stored as two's complement.
fn parse_integer(text: &str) -> Result<u32> {
    let value = parse_number(text, strtou64)?;
    if text.trim_start().starts_with('-') {
        let magnitude = value.wrapping_neg();
        if magnitude > 1 << 31 {
            bail!("-{} is below the 32-bit signed range", magnitude);
        }
        return Ok((magnitude as u32).wrapping_neg());
    }
    match u32::try_from(value) {
        Ok(value) => Ok(value),
        Err(_) => bail!("{} does not fit in 32 bits", value),
    }
}

/// Parse a whole argument with base auto-detection.
fn parse_number<T>(text: &str, parse: fn(&str, u32) -> (T, &str)) -> Result<T> {
    let (value, rest) = parse(text, 0);
    if rest.len() == text.len() || !rest.trim_end().is_empty() {
        bail!("expected a number");
    }
    Ok(value)
}
