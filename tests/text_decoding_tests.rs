//! Integration tests for text log decoding
//!
//! Tests the line-oriented decoder over files and strings:
//! - FMT lines registering formats inline
//! - The FMT lookback horizon at its boundary
//! - Skipping of unknown and malformed lines
//! - Format redefinition and repeated passes

use dataflash_parser::{
    parse_dataflash_file, DFError, FileLineSource, LogEncoding, ParserOptions, Record,
    TextLogParser, TypedValue, VehicleType,
};
use std::fs;
use tempfile::TempDir;

const HEADER: &str = "\
FMT, 128, 89, FMT, BBnNZ, Type,Length,Name,Format,Columns
FMT, 129, 75, MSG, QZ, TimeUS,Message
FMT, 130, 14, MODE, QMBB, TimeUS,Mode,ModeNum,Rsn
FMT, 131, 33, GPS, QBIHLLe, TimeUS,Status,GMS,GWk,Lat,Lng,Alt
FMT, 132, 31, PARM, QNf, TimeUS,Name,Value
";

fn sample_log() -> String {
    format!(
        "{HEADER}\
MSG, 100, ArduPlane V4.4.0 (61e8f5a4)
MODE, 200, 11, 11, 2
GPS, 300, 3, 86400500, 2190, -35.363261, 149.165244, 584.1
PARM, 400, TRIM_ARSPD_CM, 1200
"
    )
}

fn prose(lines: usize) -> String {
    (0..lines).map(|i| format!("note {i}, nothing here\n")).collect()
}

fn collect(text: &str) -> (Vec<Record>, TextLogParser<&str>) {
    let mut parser = TextLogParser::new(text);
    let records = parser
        .records()
        .expect("string sources always open")
        .collect::<Result<Vec<_>, _>>()
        .expect("log should decode");
    (records, parser)
}

#[test]
fn test_decodes_plane_log() {
    let log = sample_log();
    let (records, parser) = collect(&log);

    assert_eq!(records.len(), 9);
    assert_eq!(parser.registry().vehicle(), Some(VehicleType::Plane));
    assert_eq!(records[6].mode(), Some("RTL"));

    let gps = &records[7];
    assert_eq!(gps.gps_week(), Some(2190));
    assert_eq!(gps.latitude(), Some(-35.363261));
    assert_eq!(gps.altitude(), Some(584.1));
    assert!(gps.gps_time_us().is_some());

    assert_eq!(records[8].param_name(), Some("TRIM_ARSPD_CM"));
    assert_eq!(records[8].param_value(), Some(1200.0));
}

#[test]
fn test_reads_from_file() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = temp_dir.path().join("flight.log");
    fs::write(&path, sample_log()).unwrap();

    let mut parser = TextLogParser::new(FileLineSource::new(&path));
    let count = parser.records().unwrap().filter(|r| r.is_ok()).count();
    assert_eq!(count, 9);
    assert_eq!(parser.stats().count_for("PARM"), 1);

    let log = parse_dataflash_file(&path, ParserOptions::default()).unwrap();
    assert_eq!(log.encoding, LogEncoding::Text);
    assert_eq!(log.records.len(), 9);
}

#[test]
fn test_missing_file_fails_to_open() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let mut parser = TextLogParser::new(FileLineSource::new(temp_dir.path().join("absent.log")));
    assert!(matches!(parser.records(), Err(DFError::Io(_))));
}

#[test]
fn test_fmt_on_last_line_of_horizon() {
    let log = format!("{}{}", prose(99), sample_log());
    let (records, parser) = collect(&log);
    assert_eq!(records.len(), 9);
    assert_eq!(parser.stats().unknown_format, 99);
}

#[test]
fn test_fmt_past_horizon_is_fatal() {
    let log = format!("{}{}", prose(100), sample_log());
    let mut parser = TextLogParser::new(log.as_str());
    let results: Vec<Result<Record, DFError>> = parser.records().unwrap().collect();
    assert_eq!(results.len(), 1);
    assert!(matches!(results[0], Err(DFError::InvalidLog(_))));
}

#[test]
fn test_custom_horizon() {
    let log = format!("{}{}", prose(150), sample_log());
    let options = ParserOptions {
        text_lookback_lines: 200,
        ..ParserOptions::default()
    };
    let mut parser = TextLogParser::with_options(log.as_str(), options);
    let records: Vec<Record> = parser.records().unwrap().collect::<Result<_, _>>().unwrap();
    assert_eq!(records.len(), 9);
}

#[test]
fn test_bad_lines_do_not_stop_decoding() {
    let log = format!(
        "{}PARM, 500, SHORT\nGPS, x, 3, 1, 1, 0, 0, 0\n\nXYZ, 1, 2\nPARM, 600, ARSPD_USE, 1\n",
        sample_log()
    );
    let (records, parser) = collect(&log);
    assert_eq!(records.len(), 10);
    assert_eq!(records[9].param_name(), Some("ARSPD_USE"));
    assert_eq!(parser.stats().malformed, 2);
    assert_eq!(parser.stats().unknown_format, 1);
}

#[test]
fn test_redefinition_applies_to_later_lines() {
    let log = format!(
        "{HEADER}PARM, 1, A, 1\nFMT, 132, 35, PARM, QNff, TimeUS,Name,Value,Default\nPARM, 2, B, 2, 3\n"
    );
    let (records, parser) = collect(&log);
    let parms: Vec<&Record> = records.iter().filter(|r| r.name() == "PARM").collect();
    assert_eq!(parms[0].values().len(), 3);
    assert_eq!(parms[1].param_default(), Some(3.0));
    assert_eq!(
        parser.registry().by_code(132).unwrap().types,
        "QNff".to_string()
    );
}

#[test]
fn test_message_with_commas_survives() {
    let log = format!("{HEADER}MSG, 10, Frame: QUAD/X, motors 4\n");
    let (records, _) = collect(&log);
    assert_eq!(
        records[5].get("Message"),
        Some(&TypedValue::from("Frame: QUAD/X, motors 4"))
    );
}

#[test]
fn test_trailing_field_keeps_inner_spacing() {
    let log = format!("{HEADER}MSG, 10,   PreArm: Compass,  not healthy  \nMSG, 20, RCOut: PWM:1-8\n");
    let (records, _) = collect(&log);
    assert_eq!(
        records[5].get("Message"),
        Some(&TypedValue::from("PreArm: Compass,  not healthy"))
    );
    assert_eq!(
        records[6].get("Message"),
        Some(&TypedValue::from("RCOut: PWM:1-8"))
    );
}

#[test]
fn test_passes_share_registry() {
    let log = sample_log();
    let mut parser = TextLogParser::new(log.as_str());
    let first: Vec<Record> = parser.records().unwrap().collect::<Result<_, _>>().unwrap();
    let second: Vec<Record> = parser.records().unwrap().collect::<Result<_, _>>().unwrap();
    assert_eq!(first, second);

    // An independent pass starts from a cloned registry
    let registry = parser.registry().clone();
    let body = "PARM, 700, FLAP_1_SPEED, 0\n".repeat(3);
    let mut next = TextLogParser::with_registry(body.as_str(), registry, ParserOptions::default());
    let records: Vec<Record> = next.records().unwrap().collect::<Result<_, _>>().unwrap();
    assert_eq!(records.len(), 3);
}
