use crate::utils::error::{Result, SweepError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::Path;
use std::str::FromStr;

/// Raw field contents treated as a missing value when no override is configured.
pub const DEFAULT_MISSING_MARKERS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

pub const CSV_MIME_TYPE: &str = "text/csv";
pub const XLSX_MIME_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// A single cell. Numbers are always finite.
#[derive(Debug, Clone)]
pub enum Value {
    Numeric(f64),
    Text(String),
    Boolean(bool),
    Missing,
}

impl Value {
    /// 依單一欄位內容推斷型別
    pub fn infer<S: AsRef<str>>(raw: &str, missing_markers: &[S]) -> Value {
        if missing_markers.iter().any(|marker| marker.as_ref() == raw) {
            return Value::Missing;
        }

        if let Ok(number) = raw.trim().parse::<f64>() {
            if number.is_finite() {
                return Value::Numeric(number);
            }
        }

        if raw.eq_ignore_ascii_case("true") {
            return Value::Boolean(true);
        }
        if raw.eq_ignore_ascii_case("false") {
            return Value::Boolean(false);
        }

        Value::Text(raw.to_string())
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Numeric(n) => Some(*n),
            _ => None,
        }
    }

    // -0.0 and 0.0 must hash alike because they compare equal
    fn numeric_key(n: f64) -> u64 {
        if n == 0.0 {
            0.0f64.to_bits()
        } else {
            n.to_bits()
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Numeric(a), Value::Numeric(b)) => Value::numeric_key(*a) == Value::numeric_key(*b),
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Missing, Value::Missing) => true,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Numeric(n) => Value::numeric_key(*n).hash(state),
            Value::Text(s) => s.hash(state),
            Value::Boolean(b) => b.hash(state),
            Value::Missing => {}
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Numeric(n) => write!(f, "{}", n),
            Value::Text(s) => f.write_str(s),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Missing => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Numeric,
    Boolean,
    Text,
    Mixed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<Value>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// The observed type of the column. A column with no present values counts as
    /// numeric, the same way a dataframe types an all-empty column as float.
    pub fn kind(&self) -> ColumnKind {
        let mut numeric = false;
        let mut boolean = false;
        let mut text = false;

        for value in &self.values {
            match value {
                Value::Numeric(_) => numeric = true,
                Value::Boolean(_) => boolean = true,
                Value::Text(_) => text = true,
                Value::Missing => {}
            }
        }

        match (numeric, boolean, text) {
            (_, false, false) => ColumnKind::Numeric,
            (false, true, false) => ColumnKind::Boolean,
            (false, false, true) => ColumnKind::Text,
            _ => ColumnKind::Mixed,
        }
    }

    pub fn is_numeric(&self) -> bool {
        self.kind() == ColumnKind::Numeric
    }

    pub fn missing_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_missing()).count()
    }

    /// Arithmetic mean of the present numeric values; `None` when there are none.
    /// The result is always finite, even when the plain sum would overflow.
    pub fn mean(&self) -> Option<f64> {
        let (sum, count) = self
            .values
            .iter()
            .filter_map(Value::as_f64)
            .fold((0.0, 0usize), |(sum, count), n| (sum + n, count + 1));

        if count == 0 {
            return None;
        }

        let count = count as f64;
        let mean = if sum.is_finite() {
            sum / count
        } else {
            // 總和溢位時先除再加
            self.values
                .iter()
                .filter_map(Value::as_f64)
                .map(|n| n / count)
                .sum()
        };

        mean.is_finite().then_some(mean)
    }
}

/// Ordered named columns sharing one row count. A table without columns has no rows.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<Column>,
}

impl Table {
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        if let Some(first) = columns.first() {
            let expected = first.values.len();
            if let Some(ragged) = columns.iter().find(|c| c.values.len() != expected) {
                return Err(SweepError::ValidationError {
                    message: format!(
                        "column '{}' has {} rows, expected {}",
                        ragged.name,
                        ragged.values.len(),
                        expected
                    ),
                });
            }
        }
        Ok(Self { columns })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds a table from row-major data. Every row must have one value per header.
    pub fn from_rows(headers: Vec<String>, rows: Vec<Vec<Value>>) -> Result<Self> {
        let mut columns: Vec<Column> = headers
            .into_iter()
            .map(|name| Column::new(name, Vec::with_capacity(rows.len())))
            .collect();

        for (index, row) in rows.into_iter().enumerate() {
            if row.len() != columns.len() {
                return Err(SweepError::ValidationError {
                    message: format!(
                        "row {} has {} values, expected {}",
                        index + 1,
                        row.len(),
                        columns.len()
                    ),
                });
            }
            for (column, value) in columns.iter_mut().zip(row) {
                column.values.push(value);
            }
        }

        Ok(Self { columns })
    }

    pub fn row_count(&self) -> usize {
        self.columns.first().map(|c| c.values.len()).unwrap_or(0)
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub(crate) fn columns_mut(&mut self) -> &mut [Column] {
        &mut self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn row(&self, index: usize) -> Option<Vec<&Value>> {
        if index >= self.row_count() {
            return None;
        }
        Some(self.columns.iter().map(|c| &c.values[index]).collect())
    }

    pub fn head(&self, n: usize) -> Table {
        let columns = self
            .columns
            .iter()
            .map(|c| Column::new(c.name.clone(), c.values.iter().take(n).cloned().collect()))
            .collect();
        Table { columns }
    }

    pub fn numeric_columns(&self) -> Vec<&Column> {
        self.columns.iter().filter(|c| c.is_numeric()).collect()
    }

    /// Keeps the rows whose flag is set. `keep` must have one entry per row.
    pub(crate) fn retain_rows(&mut self, keep: &[bool]) {
        for column in &mut self.columns {
            let mut flags = keep.iter();
            column.values.retain(|_| flags.next().copied().unwrap_or(false));
        }
    }
}

/// A file as received from the user, before any decoding.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    pub fn size_kb(&self) -> f64 {
        self.bytes.len() as f64 / 1024.0
    }

    /// Lower-cased extension including the leading dot, or an empty string.
    pub fn extension(&self) -> String {
        file_extension(&self.name)
    }

    pub fn source_format(&self) -> Result<SourceFormat> {
        SourceFormat::from_file_name(&self.name)
    }
}

pub fn file_extension(file_name: &str) -> String {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
        .unwrap_or_default()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    Csv,
    Xlsx,
}

impl SourceFormat {
    pub fn from_file_name(file_name: &str) -> Result<Self> {
        match file_extension(file_name).as_str() {
            ".csv" => Ok(SourceFormat::Csv),
            ".xlsx" => Ok(SourceFormat::Xlsx),
            other => Err(SweepError::UnsupportedFormat {
                file_name: file_name.to_string(),
                extension: other.to_string(),
            }),
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            SourceFormat::Csv => ".csv",
            SourceFormat::Xlsx => ".xlsx",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum TargetFormat {
    #[default]
    Csv,
    #[serde(alias = "excel")]
    #[cfg_attr(feature = "cli", value(alias = "excel"))]
    Xlsx,
}

impl TargetFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            TargetFormat::Csv => ".csv",
            TargetFormat::Xlsx => ".xlsx",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            TargetFormat::Csv => CSV_MIME_TYPE,
            TargetFormat::Xlsx => XLSX_MIME_TYPE,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TargetFormat::Csv => "CSV",
            TargetFormat::Xlsx => "Excel",
        }
    }
}

impl FromStr for TargetFormat {
    type Err = SweepError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(TargetFormat::Csv),
            "xlsx" | "excel" => Ok(TargetFormat::Xlsx),
            other => Err(SweepError::InvalidConfigValueError {
                field: "format".to_string(),
                value: other.to_string(),
                reason: "Valid formats: csv, xlsx".to_string(),
            }),
        }
    }
}

/// Where and how a table should be re-encoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversionRequest {
    pub format: TargetFormat,
    pub file_name: String,
    pub mime_type: String,
}

impl ConversionRequest {
    pub fn for_file(original_name: &str, format: TargetFormat) -> Self {
        let extension = format.extension().trim_start_matches('.');
        let file_name = Path::new(original_name)
            .with_extension(extension)
            .to_string_lossy()
            .into_owned();

        Self {
            format,
            file_name,
            mime_type: format.mime_type().to_string(),
        }
    }
}

/// Encoded export ready to be offered for download.
#[derive(Debug, Clone)]
pub struct Download {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// A download after it has been handed to storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SavedDownload {
    pub file_name: String,
    pub mime_type: String,
    pub location: String,
    pub size: usize,
}
