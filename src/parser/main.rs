use crate::parser::{BinaryLogParser, FormatRegistry, ParserOptions, TextLogParser, SYNC_BYTE_1, SYNC_BYTE_2};
use crate::types::{DataFlashLog, LogEncoding, Record};
use anyhow::{Context, Result};
use std::path::Path;
use tracing::debug;

/// Binary logs start with a frame header; anything else is read as text.
pub fn detect_encoding(data: &[u8]) -> LogEncoding {
    if data.starts_with(&[SYNC_BYTE_1, SYNC_BYTE_2]) {
        LogEncoding::Binary
    } else {
        LogEncoding::Text
    }
}

/// Parse a DataFlash log file of either encoding
pub fn parse_dataflash_file(file_path: &Path, options: ParserOptions) -> Result<DataFlashLog> {
    let file_data = std::fs::read(file_path)
        .with_context(|| format!("Failed to read DataFlash file: {:?}", file_path))?;
    debug!(
        "Read {} bytes ({:.2} MB) from {:?}",
        file_data.len(),
        file_data.len() as f64 / 1024.0 / 1024.0,
        file_path
    );

    parse_dataflash_bytes(&file_data, options)
        .with_context(|| format!("Failed to decode DataFlash file: {:?}", file_path))
}

/// Parse a DataFlash log held in memory, detecting the encoding
pub fn parse_dataflash_bytes(data: &[u8], options: ParserOptions) -> Result<DataFlashLog> {
    match detect_encoding(data) {
        LogEncoding::Binary => parse_binary_bytes(data, options),
        LogEncoding::Text => {
            // Stray non-UTF-8 bytes only affect the lines that contain them
            let text = String::from_utf8_lossy(data);
            parse_text(&text, options)
        }
    }
}

/// Parse an in-memory binary log
pub fn parse_binary_bytes(data: &[u8], options: ParserOptions) -> Result<DataFlashLog> {
    let mut parser = BinaryLogParser::with_options(data, options);
    let records = parser
        .records()
        .collect::<crate::Result<Vec<Record>>>()
        .context("Binary decoding stopped")?;
    let stats = parser.stats().clone();

    Ok(DataFlashLog {
        encoding: LogEncoding::Binary,
        records,
        registry: parser.into_registry(),
        stats,
    })
}

/// Parse a text log held in a string
pub fn parse_text(text: &str, options: ParserOptions) -> Result<DataFlashLog> {
    let mut parser = TextLogParser::with_registry(text, FormatRegistry::new(), options);
    let records = parser
        .records()
        .context("Failed to open text source")?
        .collect::<crate::Result<Vec<Record>>>()
        .context("Text decoding stopped")?;
    let stats = parser.stats().clone();

    Ok(DataFlashLog {
        encoding: LogEncoding::Text,
        records,
        registry: parser.into_registry(),
        stats,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_encoding() {
        assert_eq!(detect_encoding(&[0xA3, 0x95, 128]), LogEncoding::Binary);
        assert_eq!(detect_encoding(b"FMT, 128, 89"), LogEncoding::Text);
        assert_eq!(detect_encoding(&[0xA3]), LogEncoding::Text);
        assert_eq!(detect_encoding(&[]), LogEncoding::Text);
    }

    #[test]
    fn test_parse_text_bytes() {
        let data = b"FMT, 128, 89, FMT, BBnNZ, Type,Length,Name,Format,Columns\n\
                     FMT, 129, 23, PARM, QNf, TimeUS,Name,Value\n\
                     PARM, 1, ANGLE_MAX, 4500\n";
        let log = parse_dataflash_bytes(data, ParserOptions::default()).unwrap();
        assert_eq!(log.encoding, LogEncoding::Text);
        assert_eq!(log.records.len(), 3);
        assert_eq!(log.message_types(), vec!["FMT", "PARM"]);
        assert_eq!(log.records_named("PARM").count(), 1);
    }

    #[test]
    fn test_not_a_log_carries_context() {
        let prose = "hello, world\n".repeat(200);
        let err = parse_dataflash_bytes(prose.as_bytes(), ParserOptions::default()).unwrap_err();
        assert!(format!("{:#}", err).contains("recognized DataFlash log"));
    }
}
