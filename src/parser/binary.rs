//! Binary DataFlash decoding
//!
//! A binary log is a sequence of frames: two sync bytes `0xA3 0x95`, a
//! one-byte type code, then the payload laid out by the descriptor
//! registered for that code. Frames carry no length prefix, so the payload
//! width is whatever the descriptor's converters consume.

use crate::error::{DFError, Result};
use crate::parser::options::ParserOptions;
use crate::parser::registry::FormatRegistry;
use crate::parser::stream::DFDataStream;
use crate::types::{ParseStats, Record, FRAME_HEADER_LEN};
use tracing::{info, warn};

pub const SYNC_BYTE_1: u8 = 0xA3;
pub const SYNC_BYTE_2: u8 = 0x95;

/// Result of one frame attempt
enum FrameOutcome {
    Record(Record),
    BadSync,
    EndOfStream,
}

/// Decoder over an in-memory binary log.
///
/// Each call to [`records`](Self::records) starts a fresh cursor at offset
/// 0. The registry is kept across passes, so later passes see every format
/// registered by earlier ones.
pub struct BinaryLogParser<'a> {
    data: &'a [u8],
    registry: FormatRegistry,
    options: ParserOptions,
    stats: ParseStats,
}

impl<'a> BinaryLogParser<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self::with_registry(data, FormatRegistry::new(), ParserOptions::default())
    }

    pub fn with_options(data: &'a [u8], options: ParserOptions) -> Self {
        Self::with_registry(data, FormatRegistry::new(), options)
    }

    pub fn with_registry(
        data: &'a [u8],
        mut registry: FormatRegistry,
        options: ParserOptions,
    ) -> Self {
        if let Some(vehicle) = options.vehicle {
            registry.set_vehicle(vehicle);
        }
        Self {
            data,
            registry,
            options,
            stats: ParseStats::default(),
        }
    }

    /// Start a new pass from the beginning of the buffer
    pub fn records(&mut self) -> BinaryRecords<'_, 'a> {
        self.stats = ParseStats::default();
        BinaryRecords {
            stream: DFDataStream::new(self.data),
            registry: &mut self.registry,
            options: &self.options,
            stats: &mut self.stats,
            schema_seen: false,
            finished: false,
        }
    }

    pub fn registry(&self) -> &FormatRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut FormatRegistry {
        &mut self.registry
    }

    pub fn into_registry(self) -> FormatRegistry {
        self.registry
    }

    /// Counters from the most recent pass
    pub fn stats(&self) -> &ParseStats {
        &self.stats
    }
}

/// Lazy record sequence for one binary pass.
///
/// Yields `Err` only for fatal conditions (no FMT record within the
/// lookback horizon); the sequence ends after a fatal error.
pub struct BinaryRecords<'p, 'a> {
    stream: DFDataStream<'a>,
    registry: &'p mut FormatRegistry,
    options: &'p ParserOptions,
    stats: &'p mut ParseStats,
    schema_seen: bool,
    finished: bool,
}

impl<'p, 'a> BinaryRecords<'p, 'a> {
    fn read_frame(&mut self) -> Result<FrameOutcome> {
        if self.stream.is_at_end() {
            return Ok(FrameOutcome::EndOfStream);
        }
        self.stats.units_read += 1;
        let frame_start = self.stream.pos;

        // Only the header bytes actually read are consumed on a bad sync
        let first = self.stream.read_byte()?;
        if first != SYNC_BYTE_1 {
            return Ok(FrameOutcome::BadSync);
        }
        let second = match self.stream.read_byte() {
            Ok(byte) => byte,
            Err(DFError::UnexpectedEof) => return Ok(self.truncated(frame_start)),
            Err(e) => return Err(e),
        };
        if second != SYNC_BYTE_2 {
            return Ok(FrameOutcome::BadSync);
        }
        let type_code = match self.stream.read_byte() {
            Ok(byte) => byte,
            Err(DFError::UnexpectedEof) => return Ok(self.truncated(frame_start)),
            Err(e) => return Err(e),
        };

        let descriptor = self
            .registry
            .by_code(type_code)
            .cloned()
            .ok_or_else(|| DFError::UnknownFormat(format!("type code {}", type_code)))?;

        let (record, consumed) =
            match descriptor.decode_binary(&mut self.stream, self.registry.vehicle()) {
                Ok(decoded) => decoded,
                Err(DFError::UnexpectedEof) => return Ok(self.truncated(frame_start)),
                Err(e) => return Err(e),
            };

        let declared_payload = descriptor.length.saturating_sub(FRAME_HEADER_LEN);
        if self.options.honor_declared_length && consumed < declared_payload {
            self.stream.skip(declared_payload - consumed);
        }

        if record.is_schema_definition() {
            self.schema_seen = true;
            self.registry.register_schema_record(&record)?;
            self.stats.formats_registered += 1;
        }
        self.registry.observe_build_record(&record);

        Ok(FrameOutcome::Record(record))
    }

    fn truncated(&mut self, frame_start: usize) -> FrameOutcome {
        warn!(
            "Truncated frame at offset {} ({} trailing bytes dropped)",
            frame_start,
            self.stream.pos - frame_start
        );
        FrameOutcome::EndOfStream
    }

    fn check_horizon(&self) -> Result<()> {
        let horizon = self.options.binary_lookback_frames as u64;
        if !self.schema_seen && self.stats.units_read >= horizon {
            return Err(DFError::InvalidLog(format!(
                "no FMT record in the first {} frames",
                self.options.binary_lookback_frames
            )));
        }
        Ok(())
    }

    fn finish(&mut self) {
        self.finished = true;
        self.stats.bytes_consumed = self.stream.pos as u64;
        info!(
            "Binary pass complete: {} records, {} frames skipped, {} formats registered",
            self.stats.records,
            self.stats.skipped(),
            self.stats.formats_registered
        );
    }
}

impl<'p, 'a> Iterator for BinaryRecords<'p, 'a> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.finished {
            let frame_start = self.stream.pos;
            let produced = match self.read_frame() {
                Ok(FrameOutcome::Record(record)) => Some(record),
                Ok(FrameOutcome::BadSync) => {
                    self.stats.bad_sync += 1;
                    warn!("Bad sync bytes at offset {}, frame skipped", frame_start);
                    None
                }
                Ok(FrameOutcome::EndOfStream) => {
                    self.finish();
                    return None;
                }
                Err(e) if e.is_recoverable() => {
                    match &e {
                        DFError::UnknownFormat(_) => self.stats.unknown_format += 1,
                        _ => self.stats.malformed += 1,
                    }
                    warn!("Skipping frame at offset {}: {}", frame_start, e);
                    None
                }
                Err(e) => {
                    self.finish();
                    return Some(Err(e));
                }
            };

            if let Err(e) = self.check_horizon() {
                self.finish();
                return Some(Err(e));
            }

            if let Some(record) = produced {
                self.stats.count_record(record.name());
                return Some(Ok(record));
            }
        }
        None
    }
}
