//! DataFlash Parser Library
//!
//! A Rust library for decoding ArduPilot DataFlash logs, both the binary
//! `.BIN` form written by the flight controller and the text `.log` form
//! produced by ground stations. DataFlash logs describe themselves: `FMT`
//! records define the layout of every other record type, so the decoder
//! learns the schema from the log as it reads.
//!
//! # Features
//!
//! - **`csv`** (default): Enable CSV export functionality
//! - **`cli`** (default): Build the command-line interface binary
//! - **`json`**: Enable JSON-lines export
//! - **`serde`**: Enable serialization of records and statistics
//!
//! # Quick Start
//!
//! Parse a log file of either encoding and walk its records:
//! ```rust,no_run
//! use dataflash_parser::{parse_dataflash_file, ParserOptions};
//! use std::path::Path;
//!
//! let log = parse_dataflash_file(Path::new("00000042.BIN"), ParserOptions::default()).unwrap();
//! println!("Decoded {} records", log.records.len());
//! for record in log.records_named("GPS") {
//!     println!("{:?} {:?}", record.latitude(), record.longitude());
//! }
//! ```
//!
//! Stream records lazily, with several passes over one buffer:
//! ```rust,no_run
//! use dataflash_parser::BinaryLogParser;
//!
//! let data = std::fs::read("00000042.BIN").unwrap();
//! let mut parser = BinaryLogParser::new(&data);
//! for record in parser.records() {
//!     let record = record.unwrap();
//!     if let Some(mode) = record.mode() {
//!         println!("mode change: {}", mode);
//!     }
//! }
//! println!("{} frames skipped", parser.stats().skipped());
//! ```
//!
//! # Public API
//!
//! ## Parsing
//! - [`parse_dataflash_file`] / [`parse_dataflash_bytes`] - Collect a whole log, detecting the encoding
//! - [`BinaryLogParser`] - Lazy, restartable decoding of binary logs
//! - [`TextLogParser`] - Lazy, restartable decoding of text logs over any [`LineSource`]
//! - [`FormatRegistry`] - Formats known to a log session
//! - [`ParserOptions`] - Lookback horizons and vehicle seeding
//!
//! ## Data Types
//! - [`Record`] - One decoded record with typed field accessors
//! - [`FormatDescriptor`] - Layout of one record type
//! - [`TypedValue`] - Integer, float or text field value
//! - [`DataFlashLog`] - Records, registry and statistics of a parsed log
//! - [`ParseStats`] - Per-pass counters
//!
//! ## Export Functions
//! - [`export_log`] - Run the exports enabled in [`ExportOptions`]
//! - [`export_to_text`] - Canonical text log
//! - `export_to_csv` - One CSV file per message type (feature `csv`)
//! - `export_to_json` - JSON lines (feature `json`)
//!
//! ## Conversion Utilities
//! - [`gps_time_to_unix_us`] - GPS week and milliseconds to Unix time
//! - [`format_unix_time_us`] - ISO-8601 rendering
//! - [`format_mode`] - Flight mode number to name

// Module declarations
pub mod conversion;
pub mod error;
pub mod export;
pub mod parser;
pub mod types;
pub mod vehicle;

// Re-export everything from modules for convenience
#[allow(ambiguous_glob_reexports)]
pub use conversion::*;
#[allow(ambiguous_glob_reexports)]
pub use error::*;
#[allow(ambiguous_glob_reexports)]
pub use export::*;
#[allow(ambiguous_glob_reexports)]
pub use parser::*;
#[allow(ambiguous_glob_reexports)]
pub use types::*;
#[allow(ambiguous_glob_reexports)]
pub use vehicle::*;
