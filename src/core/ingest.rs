//! Ingestor: turns uploaded bytes into a [`Table`].
//!
//! Format is chosen from the file extension only. Both decoders share the same
//! header normalization and per-value inference, so a CSV and a workbook holding
//! the same cells produce the same table.

use crate::domain::model::{SourceFormat, Table, UploadedFile, Value};
use crate::domain::ports::IngestOptions;
use crate::utils::error::{Result, SweepError};
use calamine::{open_workbook_from_rs, Data, Reader, Xlsx};
use chrono::{NaiveDateTime, NaiveTime};
use std::collections::{HashMap, HashSet};
use std::io::Cursor;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

pub fn load(file: &UploadedFile, options: &IngestOptions) -> Result<Table> {
    let format = file.source_format()?;
    tracing::debug!("Decoding {} ({} bytes) as {:?}", file.name, file.size(), format);

    let table = match format {
        SourceFormat::Csv => read_csv(&file.name, &file.bytes, options)?,
        SourceFormat::Xlsx => read_xlsx(&file.name, &file.bytes, options)?,
    };

    tracing::debug!(
        "Decoded {}: {} rows x {} columns",
        file.name,
        table.row_count(),
        table.column_count()
    );
    Ok(table)
}

pub fn read_csv(file_name: &str, bytes: &[u8], options: &IngestOptions) -> Result<Table> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);

    let raw_headers: Vec<String> = reader
        .headers()
        .map_err(|e| decode_error(file_name, e))?
        .iter()
        .map(str::to_string)
        .collect();

    if raw_headers.is_empty() {
        return Err(decode_error(file_name, "no columns to parse from file"));
    }

    let headers = normalize_headers(raw_headers);
    let width = headers.len();
    let mut rows = Vec::new();

    for (index, result) in reader.records().enumerate() {
        let record = result.map_err(|e| decode_error(file_name, e))?;

        if record.len() > width {
            let line = record
                .position()
                .map(|p| p.line())
                .unwrap_or(index as u64 + 2);
            return Err(decode_error(
                file_name,
                format!("expected {} fields in line {}, saw {}", width, line, record.len()),
            ));
        }

        // 欄位不足的列以缺值補齊
        let mut row: Vec<Value> = record
            .iter()
            .map(|field| Value::infer(field, &options.missing_markers))
            .collect();
        row.resize(width, Value::Missing);
        rows.push(row);
    }

    Table::from_rows(headers, rows)
}

/// Reads the first worksheet of an OpenXML workbook; its first used row is the header.
///
/// Leading blank columns are kept (as `Unnamed: i` columns of missing values) so
/// column positions match the sheet. Leading blank rows are skipped.
pub fn read_xlsx(file_name: &str, bytes: &[u8], options: &IngestOptions) -> Result<Table> {
    let mut workbook: Xlsx<_> =
        open_workbook_from_rs(Cursor::new(bytes)).map_err(|e| decode_error(file_name, e))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| decode_error(file_name, "workbook has no worksheets"))?
        .map_err(|e| decode_error(file_name, e))?;

    let mut rows = range.rows();
    let Some(header_row) = rows.next() else {
        tracing::debug!("First worksheet of {} is empty", file_name);
        return Ok(Table::empty());
    };

    // 範圍從第一個有值的儲存格開始，補回前面的空白欄
    let leading = range.start().map(|(_, col)| col as usize).unwrap_or(0);

    let headers = normalize_headers(
        std::iter::repeat_with(String::new)
            .take(leading)
            .chain(header_row.iter().map(header_text))
            .collect(),
    );
    let body = rows
        .map(|row| {
            std::iter::repeat(Value::Missing)
                .take(leading)
                .chain(row.iter().map(|cell| cell_value(cell, &options.missing_markers)))
                .collect()
        })
        .collect();

    Table::from_rows(headers, body)
}

fn header_text(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.clone(),
        Data::Empty => String::new(),
        other => cell_value(other, &[] as &[&str]).to_string(),
    }
}

fn cell_value<S: AsRef<str>>(cell: &Data, missing_markers: &[S]) -> Value {
    match cell {
        Data::Int(i) => Value::Numeric(*i as f64),
        Data::Float(f) if f.is_finite() => Value::Numeric(*f),
        Data::Float(_) => Value::Missing,
        // 字串儲存格維持文字，只辨識缺值標記
        Data::String(s) if missing_markers.iter().any(|m| m.as_ref() == s.as_str()) => Value::Missing,
        Data::String(s) => Value::Text(s.clone()),
        Data::Bool(b) => Value::Boolean(*b),
        Data::DateTime(dt) => {
            let text = if dt.is_duration() {
                dt.as_duration().map(|d| d.to_string())
            } else {
                dt.as_datetime().map(format_datetime)
            };
            text.map(Value::Text)
                .unwrap_or_else(|| Value::Numeric(dt.as_f64()))
        }
        Data::DateTimeIso(s) | Data::DurationIso(s) => Value::Text(s.clone()),
        Data::Error(_) | Data::Empty => Value::Missing,
    }
}

fn format_datetime(datetime: NaiveDateTime) -> String {
    if datetime.time() == NaiveTime::MIN {
        datetime.format("%Y-%m-%d").to_string()
    } else {
        datetime.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

/// Blank headers become `Unnamed: <index>`; repeated headers get `.1`, `.2`, ... suffixes.
pub fn normalize_headers(raw: Vec<String>) -> Vec<String> {
    let mut counters: HashMap<String, usize> = HashMap::new();
    let mut used: HashSet<String> = HashSet::new();
    let mut headers = Vec::with_capacity(raw.len());

    for (index, name) in raw.into_iter().enumerate() {
        let base = if name.trim().is_empty() {
            format!("Unnamed: {}", index)
        } else {
            name
        };

        let mut candidate = base.clone();
        while used.contains(&candidate) {
            let counter = counters.entry(base.clone()).or_insert(0);
            *counter += 1;
            candidate = format!("{}.{}", base, counter);
        }

        used.insert(candidate.clone());
        headers.push(candidate);
    }

    headers
}

fn decode_error(file_name: &str, reason: impl std::fmt::Display) -> SweepError {
    SweepError::Decode {
        file_name: file_name.to_string(),
        reason: reason.to_string(),
    }
}
