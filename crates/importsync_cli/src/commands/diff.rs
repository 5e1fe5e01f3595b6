//! Diff command implementation.

use serde::Serialize;
use std::error::Error;
use std::path::{Path, PathBuf};
use tracing::debug;

use importsync_core::{FieldValue, ImportStatus, Record};
use importsync_engine::{ChunkedSync, EngineError, SyncMode, SyncOptions};

/// Options for a diff run.
#[derive(Debug)]
pub struct DiffOptions {
    /// Name of the natural key column.
    pub key_column: String,
    /// Name of the status column, ignored for files that lack it.
    pub status_column: Option<String>,
    /// Whether the input files carry a header row.
    pub has_header: bool,
    /// Combined target size of a chunk pair.
    pub chunk_hint: usize,
    /// The reconciliation policy.
    pub mode: SyncMode,
    /// Keep invalid records that are absent from the source.
    pub retain_invalid: bool,
    /// Where to write the reconciled destination, if anywhere.
    pub output: Option<PathBuf>,
}

/// Keys touched by a completed diff run.
#[derive(Debug, Default, Serialize)]
pub struct DiffResult {
    /// Number of chunk pairs reconciled.
    pub chunks: usize,
    /// Keys of records added to the destination.
    pub added: Vec<String>,
    /// Keys of records removed from the destination.
    pub removed: Vec<String>,
    /// Keys of records changed in place.
    pub changed: Vec<String>,
}

/// Column layout of a loaded CSV file.
struct FeedLayout {
    columns: Vec<String>,
    key_index: usize,
    status_index: Option<usize>,
    fields: Vec<(usize, &'static str)>,
}

impl FeedLayout {
    fn field_name(&self, index: usize) -> Option<&'static str> {
        self.fields
            .iter()
            .find(|(i, _)| *i == index)
            .map(|(_, name)| *name)
    }
}

/// Runs the diff command.
pub fn run(
    source: &Path,
    destination: &Path,
    options: &DiffOptions,
    format: &str,
) -> Result<(), Box<dyn Error>> {
    let result = reconcile_files(source, destination, options)?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        _ => {
            print_text_output(source, destination, &result);
        }
    }

    Ok(())
}

/// Reconciles two CSV files and returns the touched keys.
pub fn reconcile_files(
    source: &Path,
    destination: &Path,
    options: &DiffOptions,
) -> Result<DiffResult, Box<dyn Error>> {
    let (_, source_records) = load_csv(source, options)?;
    let (layout, destination_records) = load_csv(destination, options)?;

    let mut writer = match &options.output {
        Some(path) => {
            let mut writer = csv::Writer::from_path(path)?;
            if options.has_header {
                writer.write_record(&layout.columns)?;
            }
            Some(writer)
        }
        None => None,
    };

    let sync_options = SyncOptions::new()
        .chunk_hint(options.chunk_hint)
        .mode(options.mode)
        .retain_invalid(options.retain_invalid);
    let driver = ChunkedSync::new(sync_options);

    let mut result = DiffResult::default();
    let report = driver.run(source_records, destination_records, |_, diff| {
        result.added.extend(diff.added().map(|r| r.key().clone()));
        result.removed.extend(diff.removed().map(|r| r.key().clone()));
        result.changed.extend(diff.changed().map(|r| r.key().clone()));

        if let Some(writer) = writer.as_mut() {
            for record in diff.iter() {
                let row = render_row(&layout, record);
                writer
                    .write_record(&row)
                    .map_err(|e| EngineError::sink(e.to_string()))?;
            }
        }
        Ok(())
    })?;
    result.chunks = report.chunks;

    if let Some(mut writer) = writer {
        writer.flush()?;
    }

    Ok(result)
}

/// Loads a key-sorted record stream from a CSV file.
fn load_csv(
    path: &Path,
    options: &DiffOptions,
) -> Result<(FeedLayout, Vec<Record<String>>), Box<dyn Error>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(options.has_header)
        .from_path(path)?;

    let columns: Vec<String> = if options.has_header {
        reader.headers()?.iter().map(str::to_string).collect()
    } else {
        (0..reader.headers()?.len())
            .map(|i| format!("col{i}"))
            .collect()
    };

    let key_index = columns
        .iter()
        .position(|name| name == &options.key_column)
        .ok_or_else(|| {
            format!(
                "no {:?} column in {}",
                options.key_column,
                path.display()
            )
        })?;
    let status_index = options
        .status_column
        .as_ref()
        .and_then(|name| columns.iter().position(|column| column == name));

    // Content schema: every column except the key and status columns. The
    // names must outlive every record, so they are leaked once per load.
    let fields: Vec<(usize, &'static str)> = columns
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != key_index && Some(*i) != status_index)
        .map(|(i, name)| (i, &*name.clone().leak()))
        .collect();
    let schema: &'static [&'static str] = fields
        .iter()
        .map(|(_, name)| *name)
        .collect::<Vec<_>>()
        .leak();

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        let key = row
            .get(key_index)
            .ok_or_else(|| format!("row {} is missing the key column", records.len() + 1))?
            .to_string();

        let mut record = Record::new(key, schema);
        if let Some(index) = status_index {
            if let Some(status) = parse_status(row.get(index).unwrap_or(""))? {
                record.set_status(Some(status));
            }
        }
        for (index, field) in &fields {
            if let Some(raw) = row.get(*index) {
                record.set(field, parse_value(raw))?;
            }
        }
        records.push(record);
    }

    // The engine expects both streams ordered by key.
    records.sort();
    debug!(records = records.len(), path = %path.display(), "loaded feed");

    let layout = FeedLayout {
        columns,
        key_index,
        status_index,
        fields,
    };
    Ok((layout, records))
}

fn parse_status(raw: &str) -> Result<Option<ImportStatus>, Box<dyn Error>> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "" => Ok(None),
        "imported" => Ok(Some(ImportStatus::Imported)),
        "forced" => Ok(Some(ImportStatus::Forced)),
        "invalid" => Ok(Some(ImportStatus::Invalid)),
        other => Err(format!("unknown status {other:?}").into()),
    }
}

fn parse_value(raw: &str) -> FieldValue {
    if raw.is_empty() {
        return FieldValue::Null;
    }
    if let Ok(integer) = raw.parse::<i64>() {
        return FieldValue::Integer(integer);
    }
    if let Ok(float) = raw.parse::<f64>() {
        return FieldValue::Float(float);
    }
    match raw {
        "true" => FieldValue::Bool(true),
        "false" => FieldValue::Bool(false),
        _ => FieldValue::Text(raw.to_string()),
    }
}

fn render_row(layout: &FeedLayout, record: &Record<String>) -> Vec<String> {
    (0..layout.columns.len())
        .map(|index| {
            if index == layout.key_index {
                record.key().clone()
            } else if Some(index) == layout.status_index {
                render_status(record.status())
            } else {
                match layout.field_name(index) {
                    Some(field) => render_value(record.get(field)),
                    None => String::new(),
                }
            }
        })
        .collect()
}

fn render_status(status: Option<ImportStatus>) -> String {
    match status {
        None => String::new(),
        Some(ImportStatus::Imported) => "imported".to_string(),
        Some(ImportStatus::Forced) => "forced".to_string(),
        Some(ImportStatus::Invalid) => "invalid".to_string(),
    }
}

fn render_value(value: Option<&FieldValue>) -> String {
    match value {
        None | Some(FieldValue::Null) => String::new(),
        Some(FieldValue::Bool(b)) => b.to_string(),
        Some(FieldValue::Integer(i)) => i.to_string(),
        Some(FieldValue::Float(f)) => f.to_string(),
        Some(FieldValue::Text(t)) => t.clone(),
    }
}

fn print_text_output(source: &Path, destination: &Path, result: &DiffResult) {
    println!("Import Diff");
    println!("===========");
    println!();
    println!("Source:      {}", source.display());
    println!("Destination: {}", destination.display());
    println!();
    println!("Chunks:  {}", result.chunks);
    println!("Added:   {}", result.added.len());
    println!("Removed: {}", result.removed.len());
    println!("Changed: {}", result.changed.len());

    if !result.added.is_empty() || !result.removed.is_empty() || !result.changed.is_empty() {
        println!();
        for key in &result.added {
            println!("  + {key}");
        }
        for key in &result.removed {
            println!("  - {key}");
        }
        for key in &result.changed {
            println!("  ~ {key}");
        }
    }
}
