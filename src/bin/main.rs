//! CLI binary for the DataFlash parser
//!
//! This provides the command-line interface for the dataflash_parser library.

use anyhow::Result;
use clap::{Arg, ArgAction, Command};
use dataflash_parser::{
    export_log, format_unix_time_us, parse_dataflash_file, DataFlashLog, ExportOptions,
    ParserOptions, VehicleType,
};
use glob::glob;
use std::path::{Path, PathBuf};
use tracing::debug;

const SUPPORTED_EXTENSIONS: [&str; 2] = ["bin", "log"];

fn version() -> &'static str {
    match option_env!("VERGEN_GIT_SHA") {
        Some(sha) if !sha.is_empty() => {
            // leaked once at startup for clap's 'static requirement
            Box::leak(format!("{} ({})", env!("CARGO_PKG_VERSION"), sha).into_boxed_str())
        }
        _ => env!("CARGO_PKG_VERSION"),
    }
}

fn setup_logging(debug: bool) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let level = if debug { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("dataflash_parser={}", level)));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_level(true)
                .with_writer(std::io::stderr)
                .compact(),
        )
        .init();
}

fn main() -> Result<()> {
    let matches = Command::new("DataFlash Parser")
        .version(version())
        .about("Read and decode ArduPilot DataFlash logs (.BIN binary or .log text). Output to various formats.")
        .arg(
            Arg::new("files")
                .help("DataFlash files to parse (.BIN, .LOG extensions supported, case-insensitive, supports globbing)")
                .required(true)
                .num_args(1..)
                .index(1),
        )
        .arg(
            Arg::new("debug")
                .long("debug")
                .help("Enable debug logging (overridden by RUST_LOG)")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("text")
                .long("text")
                .help("Write the decoded records as a text log (<name>.txt)")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("csv")
                .long("csv")
                .help("Export one CSV file per message type (<name>.<TYPE>.csv)")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .help("Export records as JSON lines (<name>.jsonl)")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("output-dir")
                .long("output-dir")
                .help("Directory for exported files (default: same as input file)")
                .value_name("DIR"),
        )
        .arg(
            Arg::new("vehicle")
                .long("vehicle")
                .help("Vehicle family for mode names when the log does not say (Copter, Plane, Rover, Sub, Tracker)")
                .value_name("NAME"),
        )
        .get_matches();

    let debug = matches.get_flag("debug");
    setup_logging(debug);

    let export_options = ExportOptions {
        text: matches.get_flag("text"),
        csv: matches.get_flag("csv"),
        json: matches.get_flag("json"),
        output_dir: matches.get_one::<String>("output-dir").cloned(),
    };

    let vehicle = match matches.get_one::<String>("vehicle") {
        Some(name) => match name.parse::<VehicleType>() {
            Ok(vehicle) => Some(vehicle),
            Err(e) => {
                eprintln!("Error: {e}");
                std::process::exit(2);
            }
        },
        None => None,
    };
    let parser_options = ParserOptions {
        vehicle,
        ..ParserOptions::default()
    };

    let file_patterns: Vec<&String> = matches
        .get_many::<String>("files")
        .map(|values| values.collect())
        .unwrap_or_default();
    debug!("Input patterns: {file_patterns:?}");

    let valid_paths = collect_input_paths(&file_patterns);
    debug!("Found {} valid files to process", valid_paths.len());

    if valid_paths.is_empty() {
        eprintln!("Error: No valid files found to process.");
        eprintln!("Supported extensions: .BIN, .LOG (case-insensitive)");
        eprintln!("Input patterns were: {file_patterns:?}");
        std::process::exit(1);
    }

    let mut processed_files = 0;
    for (index, path) in valid_paths.iter().enumerate() {
        if index > 0 {
            println!();
        }

        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown");
        println!("Processing: {filename}");

        match parse_dataflash_file(path, parser_options.clone()) {
            Ok(log) => {
                print_summary(&log);
                if let Err(e) = export_log(&log, path, &export_options) {
                    eprintln!("Error exporting {filename}: {e:#}");
                } else {
                    processed_files += 1;
                }
            }
            Err(e) => {
                eprintln!("Error processing {filename}: {e:#}");
                eprintln!("Continuing with next file...");
            }
        }
    }

    if processed_files == 0 {
        eprintln!(
            "Error: No files were successfully processed out of {} files found.",
            valid_paths.len()
        );
        eprintln!("This could be due to:");
        eprintln!("  - Files not being DataFlash logs");
        eprintln!("  - Corrupted or empty files");
        eprintln!("  - No FMT records near the start of the file");
        eprintln!("Use --debug flag for more detailed error information.");
        std::process::exit(1);
    }

    Ok(())
}

/// Expand glob patterns and keep existing files with a supported extension
fn collect_input_paths(patterns: &[&String]) -> Vec<PathBuf> {
    let mut valid_paths = Vec::new();
    for pattern in patterns {
        let paths: Vec<PathBuf> = if pattern.contains('*') || pattern.contains('?') {
            match glob(pattern) {
                Ok(glob_iter) => match glob_iter.collect::<Result<Vec<_>, _>>() {
                    Ok(paths) => {
                        debug!("Glob pattern '{pattern}' matched {} files", paths.len());
                        paths
                    }
                    Err(e) => {
                        eprintln!("Error expanding glob pattern '{pattern}': {e}");
                        continue;
                    }
                },
                Err(e) => {
                    eprintln!("Invalid glob pattern '{pattern}': {e}");
                    continue;
                }
            }
        } else {
            vec![Path::new(pattern.as_str()).to_path_buf()]
        };

        for path in paths {
            if !path.exists() {
                eprintln!("Warning: File does not exist: {path:?}");
                continue;
            }

            let valid_extension = path
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| SUPPORTED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
                .unwrap_or(false);

            if !valid_extension {
                let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("none");
                eprintln!("Warning: Skipping file with unsupported extension '{ext}': {path:?}");
                continue;
            }

            valid_paths.push(path);
        }
    }
    valid_paths
}

fn print_summary(log: &DataFlashLog) {
    println!(
        "  Encoding: {}, {} records, {} skipped",
        log.encoding.as_str(),
        log.stats.records,
        log.stats.skipped()
    );
    println!("  Message types: {}", log.message_types().join(", "));
    match log.vehicle() {
        Some(vehicle) => match log.registry.session().firmware_version() {
            Some(version) => println!("  Vehicle: {vehicle} {version}"),
            None => println!("  Vehicle: {vehicle}"),
        },
        None => println!("  Vehicle: unknown"),
    }
    if let Some(unix_us) = log.first_gps_time_us() {
        println!("  First GPS time: {}", format_unix_time_us(unix_us));
    }
}
