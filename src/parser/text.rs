//! Text DataFlash decoding
//!
//! One record per line: `NAME, field, field, ...`. `FMT` lines declare
//! new formats inline, exactly like FMT frames in the binary form.

use crate::error::{DFError, Result};
use crate::parser::options::ParserOptions;
use crate::parser::registry::FormatRegistry;
use crate::types::{ParseStats, Record};
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Lines produced by one pass over a [`LineSource`]
pub type Lines<'s> = Box<dyn Iterator<Item = io::Result<String>> + 's>;

/// A text source that can be read from the start any number of times
pub trait LineSource {
    fn open(&self) -> io::Result<Lines<'_>>;
}

impl LineSource for str {
    fn open(&self) -> io::Result<Lines<'_>> {
        Ok(Box::new(self.lines().map(|line| Ok(line.to_string()))))
    }
}

impl LineSource for String {
    fn open(&self) -> io::Result<Lines<'_>> {
        self.as_str().open()
    }
}

impl<T: LineSource + ?Sized> LineSource for &T {
    fn open(&self) -> io::Result<Lines<'_>> {
        (**self).open()
    }
}

/// Text log on disk, reopened for every pass
#[derive(Debug, Clone)]
pub struct FileLineSource {
    path: PathBuf,
}

impl FileLineSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LineSource for FileLineSource {
    fn open(&self) -> io::Result<Lines<'_>> {
        let reader = BufReader::new(File::open(&self.path)?);
        // non-UTF-8 bytes are replaced rather than failing the pass
        Ok(Box::new(reader.split(b'\n').map(|line| {
            line.map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        })))
    }
}

/// Decoder over a restartable text source.
///
/// Each call to [`records`](Self::records) reopens the source. As with the
/// binary parser, the registry carries over from pass to pass.
pub struct TextLogParser<S: LineSource> {
    source: S,
    registry: FormatRegistry,
    options: ParserOptions,
    stats: ParseStats,
}

impl<S: LineSource> TextLogParser<S> {
    pub fn new(source: S) -> Self {
        Self::with_registry(source, FormatRegistry::new(), ParserOptions::default())
    }

    pub fn with_options(source: S, options: ParserOptions) -> Self {
        Self::with_registry(source, FormatRegistry::new(), options)
    }

    pub fn with_registry(source: S, mut registry: FormatRegistry, options: ParserOptions) -> Self {
        if let Some(vehicle) = options.vehicle {
            registry.set_vehicle(vehicle);
        }
        Self {
            source,
            registry,
            options,
            stats: ParseStats::default(),
        }
    }

    /// Start a new pass from the first line.
    ///
    /// Fails only if the source cannot be opened.
    pub fn records(&mut self) -> Result<TextRecords<'_>> {
        self.stats = ParseStats::default();
        let lines = self.source.open()?;
        Ok(TextRecords {
            lines,
            registry: &mut self.registry,
            options: &self.options,
            stats: &mut self.stats,
            schema_seen: false,
            finished: false,
        })
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

/// Lazy record sequence for one text pass.
///
/// Yields `Err` for a missing FMT record within the lookback horizon or an
/// I/O failure of the source; the sequence ends after either.
pub struct TextRecords<'p> {
    lines: Lines<'p>,
    registry: &'p mut FormatRegistry,
    options: &'p ParserOptions,
    stats: &'p mut ParseStats,
    schema_seen: bool,
    finished: bool,
}

impl<'p> TextRecords<'p> {
    fn parse_line(&mut self, line: &str) -> Result<Option<Record>> {
        if line.trim().is_empty() {
            return Ok(None);
        }
        let (name, rest) = match line.split_once(',') {
            Some((name, rest)) => (name.trim(), Some(rest)),
            None => (line.trim(), None),
        };

        let descriptor = self
            .registry
            .by_name(name)
            .cloned()
            .ok_or_else(|| DFError::UnknownFormat(name.to_string()))?;
        // The last column takes the rest of the line verbatim, commas included
        let fields: Vec<&str> = match rest {
            Some(rest) => rest.splitn(descriptor.column_count(), ',').map(str::trim).collect(),
            None => Vec::new(),
        };
        let record = descriptor.decode_text(&fields, self.registry.vehicle())?;

        if record.is_schema_definition() {
            self.schema_seen = true;
            self.registry.register_schema_record(&record)?;
            self.stats.formats_registered += 1;
        }
        self.registry.observe_build_record(&record);

        Ok(Some(record))
    }

    fn check_horizon(&self) -> Result<()> {
        let horizon = self.options.text_lookback_lines as u64;
        if !self.schema_seen && self.stats.units_read >= horizon {
            return Err(DFError::InvalidLog(format!(
                "no FMT record in the first {} lines",
                self.options.text_lookback_lines
            )));
        }
        Ok(())
    }

    fn finish(&mut self) {
        self.finished = true;
        info!(
            "Text pass complete: {} records, {} lines skipped, {} formats registered",
            self.stats.records,
            self.stats.skipped(),
            self.stats.formats_registered
        );
    }
}

impl<'p> Iterator for TextRecords<'p> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.finished {
            let line = match self.lines.next() {
                Some(Ok(line)) => line,
                Some(Err(e)) => {
                    self.finish();
                    return Some(Err(e.into()));
                }
                None => {
                    self.finish();
                    return None;
                }
            };
            self.stats.units_read += 1;
            self.stats.bytes_consumed += line.len() as u64 + 1;
            let line_number = self.stats.units_read;

            let produced = match self.parse_line(&line) {
                Ok(record) => record,
                Err(e) if e.is_recoverable() => {
                    match &e {
                        DFError::UnknownFormat(_) => self.stats.unknown_format += 1,
                        _ => self.stats.malformed += 1,
                    }
                    warn!("Skipping line {}: {}", line_number, e);
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
