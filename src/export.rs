//! Export functionality for DataFlash logs
//!
//! Writes decoded records as a canonical text log, one CSV file per message
//! type, or JSON lines.

use crate::types::{DataFlashLog, Record};
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Export options for controlling output formats
#[derive(Debug, Clone, Default)]
pub struct ExportOptions {
    pub text: bool,
    pub csv: bool,
    pub json: bool,
    pub output_dir: Option<String>,
}

/// Paths written by an export run
#[derive(Debug, Default, Clone)]
pub struct ExportReport {
    pub text_path: Option<PathBuf>,
    pub csv_paths: Vec<PathBuf>,
    pub json_path: Option<PathBuf>,
}

impl ExportReport {
    pub fn written(&self) -> impl Iterator<Item = &PathBuf> {
        self.text_path
            .iter()
            .chain(self.csv_paths.iter())
            .chain(self.json_path.iter())
    }
}

/// Output directory and file stem for an input file
pub fn compute_export_paths(
    input_path: &Path,
    export_options: &ExportOptions,
) -> Result<(PathBuf, String)> {
    let base_name = input_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("dataflash")
        .to_string();

    let output_dir = match &export_options.output_dir {
        Some(dir) => PathBuf::from(dir),
        None => input_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(".")),
    };

    if !output_dir.as_os_str().is_empty() && !output_dir.exists() {
        std::fs::create_dir_all(&output_dir)
            .with_context(|| format!("Failed to create output directory: {:?}", output_dir))?;
        debug!("Created output directory: {:?}", output_dir);
    }

    Ok((output_dir, base_name))
}

/// Run every export enabled in `export_options`
pub fn export_log(
    log: &DataFlashLog,
    input_path: &Path,
    export_options: &ExportOptions,
) -> Result<ExportReport> {
    let mut report = ExportReport::default();
    let (output_dir, base_name) = compute_export_paths(input_path, export_options)?;

    if export_options.text {
        let path = output_dir.join(format!("{base_name}.txt"));
        export_to_text(&log.records, &path)?;
        report.text_path = Some(path);
    }

    if export_options.csv {
        #[cfg(feature = "csv")]
        {
            report.csv_paths = export_to_csv(&log.records, &output_dir, &base_name)?;
        }
        #[cfg(not(feature = "csv"))]
        anyhow::bail!("CSV export requires the `csv` feature");
    }

    if export_options.json {
        #[cfg(feature = "json")]
        {
            let path = output_dir.join(format!("{base_name}.jsonl"));
            export_to_json(&log.records, &path)?;
            report.json_path = Some(path);
        }
        #[cfg(not(feature = "json"))]
        anyhow::bail!("JSON export requires the `json` feature");
    }

    Ok(report)
}

/// Write records as `NAME, v1, v2, ...` lines, readable by the text parser
pub fn write_text_log<W: Write>(records: &[Record], writer: &mut W) -> std::io::Result<()> {
    for record in records {
        writeln!(writer, "{}", record.to_text_line())?;
    }
    Ok(())
}

pub fn export_to_text(records: &[Record], output_path: &Path) -> Result<()> {
    let file = File::create(output_path)
        .with_context(|| format!("Failed to create text log: {output_path:?}"))?;
    let mut writer = BufWriter::new(file);
    write_text_log(records, &mut writer)
        .with_context(|| format!("Failed to write text log: {output_path:?}"))?;
    writer
        .flush()
        .with_context(|| format!("Failed to flush text log: {output_path:?}"))?;
    debug!("Exported {} records to {:?}", records.len(), output_path);
    Ok(())
}

/// One `<stem>.<NAME>.csv` per message type.
///
/// The header row is the column list of the format in effect when the first
/// record of that type was seen. Rows from a later redefinition keep their
/// own width.
#[cfg(feature = "csv")]
pub fn export_to_csv(records: &[Record], output_dir: &Path, base_name: &str) -> Result<Vec<PathBuf>> {
    use std::collections::BTreeMap;

    let mut writers: BTreeMap<&str, (PathBuf, csv::Writer<File>, usize)> = BTreeMap::new();

    for record in records {
        let name = record.name();
        if !writers.contains_key(name) {
            let path = output_dir.join(format!("{base_name}.{name}.csv"));
            let mut writer = csv::WriterBuilder::new()
                .flexible(true)
                .from_path(&path)
                .with_context(|| format!("Failed to create CSV file: {path:?}"))?;
            writer.write_record(&record.format().columns)?;
            let width = record.format().column_count();
            writers.insert(name, (path, writer, width));
        }

        if let Some((path, writer, width)) = writers.get_mut(name) {
            if record.values().len() != *width {
                debug!(
                    "{} record has {} columns, CSV header has {}",
                    name,
                    record.values().len(),
                    width
                );
            }
            writer
                .write_record(record.values().iter().map(|v| v.to_string()))
                .with_context(|| format!("Failed to write CSV row: {path:?}"))?;
        }
    }

    let mut paths = Vec::with_capacity(writers.len());
    for (_, (path, mut writer, _)) in writers {
        writer
            .flush()
            .with_context(|| format!("Failed to flush CSV file: {path:?}"))?;
        paths.push(path);
    }
    debug!("Exported {} CSV files", paths.len());
    Ok(paths)
}

/// One JSON object per line: `{"name": ..., "fields": {...}}`
#[cfg(feature = "json")]
pub fn export_to_json(records: &[Record], output_path: &Path) -> Result<()> {
    let file = File::create(output_path)
        .with_context(|| format!("Failed to create JSON file: {output_path:?}"))?;
    let mut writer = BufWriter::new(file);
    for record in records {
        serde_json::to_writer(&mut writer, record)
            .with_context(|| format!("Failed to serialize {} record", record.name()))?;
        writer.write_all(b"\n")?;
    }
    writer
        .flush()
        .with_context(|| format!("Failed to flush JSON file: {output_path:?}"))?;
    Ok(())
}
