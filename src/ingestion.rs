use crate::error::{Result, SalesPulseError};
use crate::normalize::normalize_record;
use crate::schema::{Month, MonthlyDataset, SalesRecord};
use crate::storage::{month_key, original_key, save_dataset, KeyValueStore};
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use chrono::NaiveDateTime;
use encoding_rs::WINDOWS_1252;
use log::{debug, info, warn};
use serde_json::{Number, Value};
use std::borrow::Cow;
use std::collections::HashSet;
use std::fmt;
use std::io::Cursor;
use std::path::Path;

/// A month needs at least this many normalized columns to be worth analysing.
pub const MIN_COLUMNS: usize = 3;

const EMPTY_HEADER: &str = "__EMPTY";

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetFormat {
    Xlsx,
    Xls,
    Xlsb,
    Ods,
    Csv,
}

impl SheetFormat {
    pub fn from_extension(extension: &str) -> Result<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "xlsx" | "xlsm" => Ok(SheetFormat::Xlsx),
            "xls" => Ok(SheetFormat::Xls),
            "xlsb" => Ok(SheetFormat::Xlsb),
            "ods" => Ok(SheetFormat::Ods),
            "csv" => Ok(SheetFormat::Csv),
            other => Err(SalesPulseError::UnsupportedFormat(other.to_string())),
        }
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| SalesPulseError::UnsupportedFormat(path.display().to_string()))?;
        Self::from_extension(extension)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestReport {
    pub month: Month,
    pub rows: usize,
    pub columns: usize,
}

impl fmt::Display for IngestReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Planilha de {} carregada com sucesso! ({} linhas, {} colunas)",
            self.month, self.rows, self.columns
        )
    }
}

/// Reads the first sheet of a workbook (or a CSV file) into row records keyed by header text.
///
/// The first row is the header. Blank headers become `__EMPTY`, `__EMPTY_1`, ...,
/// repeated headers get `_1`, `_2` suffixes. Empty cells are left out of a row and
/// rows with no cells at all are skipped.
pub fn parse_sheet(bytes: &[u8], format: SheetFormat) -> Result<MonthlyDataset> {
    match format {
        SheetFormat::Csv => parse_csv(bytes),
        _ => parse_workbook(bytes),
    }
}

fn parse_workbook(bytes: &[u8]) -> Result<MonthlyDataset> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;
    let range = match workbook.worksheet_range_at(0) {
        Some(range) => range?,
        None => return Ok(Vec::new()),
    };

    let mut rows = range.rows();
    let headers = match rows.next() {
        Some(header_row) => resolve_headers(header_row.iter().map(|cell| cell.to_string())),
        None => return Ok(Vec::new()),
    };

    let records = rows
        .map(|row| {
            headers
                .iter()
                .zip(row.iter())
                .filter_map(|(header, cell)| cell_value(cell).map(|v| (header.clone(), v)))
                .collect::<SalesRecord>()
        })
        .filter(|record| !record.is_empty())
        .collect();

    Ok(records)
}

fn parse_csv(bytes: &[u8]) -> Result<MonthlyDataset> {
    let text = decode_text(bytes);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = resolve_headers(reader.headers()?.iter().map(str::to_string));

    let mut records = Vec::new();
    for (line, result) in reader.records().enumerate() {
        let row = result.map_err(|e| {
            debug!("CSV parse error at line {}: {}", line + 2, e);
            e
        })?;
        let record: SalesRecord = headers
            .iter()
            .zip(row.iter())
            .filter(|(_, field)| !field.is_empty())
            .map(|(header, field)| (header.clone(), scalar_from_text(field)))
            .collect();
        if !record.is_empty() {
            records.push(record);
        }
    }

    Ok(records)
}

/// UTF-8 text passes through (minus a BOM). Anything else is read as Windows-1252,
/// the encoding spreadsheet programs use for CSV exports in Portuguese locales.
fn decode_text(bytes: &[u8]) -> Cow<'_, str> {
    let content = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    match std::str::from_utf8(content) {
        Ok(text) => Cow::Borrowed(text),
        Err(e) => {
            warn!(
                "CSV is not valid UTF-8 (byte {}), decoding as Windows-1252",
                e.valid_up_to()
            );
            let (text, _) = WINDOWS_1252.decode_without_bom_handling(content);
            text
        }
    }
}

fn resolve_headers(raw: impl Iterator<Item = String>) -> Vec<String> {
    let mut used = HashSet::new();
    raw.map(|text| {
        let base = if text.is_empty() {
            EMPTY_HEADER.to_string()
        } else {
            text
        };
        let mut name = base.clone();
        let mut suffix = 0;
        while used.contains(&name) {
            suffix += 1;
            name = format!("{}_{}", base, suffix);
        }
        used.insert(name.clone());
        name
    })
    .collect()
}

fn cell_value(cell: &Data) -> Option<Value> {
    match cell {
        Data::Empty => None,
        Data::String(s) if s.is_empty() => None,
        Data::String(s) => Some(Value::String(s.clone())),
        Data::Int(i) => Some(Value::from(*i)),
        Data::Float(f) => Some(float_value(*f)),
        Data::Bool(b) => Some(Value::Bool(*b)),
        Data::DateTime(dt) => Some(match dt.as_datetime() {
            Some(at) => Value::String(iso_datetime(at)),
            None => float_value(dt.as_f64()),
        }),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Some(Value::String(s.clone())),
        Data::Error(e) => Some(Value::String(e.to_string())),
    }
}

fn iso_datetime(at: NaiveDateTime) -> String {
    at.format("%Y-%m-%dT%H:%M:%S").to_string()
}

/// Whole numbers come out as integers, so a quantity of 3 is `3` and not `3.0`.
fn float_value(f: f64) -> Value {
    if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 {
        return Value::from(f as i64);
    }
    Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null)
}

fn scalar_from_text(text: &str) -> Value {
    let trimmed = text.trim();
    if let Ok(i) = trimmed.parse::<i64>() {
        return Value::from(i);
    }
    if let Ok(f) = trimmed.parse::<f64>() {
        if f.is_finite() {
            return float_value(f);
        }
    }
    if trimmed.eq_ignore_ascii_case("true") {
        return Value::Bool(true);
    }
    if trimmed.eq_ignore_ascii_case("false") {
        return Value::Bool(false);
    }
    Value::String(text.to_string())
}

/// Turns one uploaded file into a stored month dataset.
pub struct SheetIngestor<'a> {
    store: &'a dyn KeyValueStore,
}

impl<'a> SheetIngestor<'a> {
    pub fn new(store: &'a dyn KeyValueStore) -> Self {
        Self { store }
    }

    pub fn ingest_file(&self, month_index: usize, path: &Path) -> Result<IngestReport> {
        let format = SheetFormat::from_path(path)?;
        let bytes = std::fs::read(path)?;
        self.ingest_bytes(month_index, &bytes, format)
    }

    pub fn ingest_bytes(
        &self,
        month_index: usize,
        bytes: &[u8],
        format: SheetFormat,
    ) -> Result<IngestReport> {
        let month = Month::from_index(month_index)?;
        let original = parse_sheet(bytes, format)?;
        self.ingest_records(month, original)
    }

    /// Validates and persists already-parsed rows. Nothing is written unless
    /// the sheet has rows and its first normalized row has enough columns.
    pub fn ingest_records(&self, month: Month, original: MonthlyDataset) -> Result<IngestReport> {
        let first = original.first().ok_or(SalesPulseError::EmptyDataset)?;

        let columns = normalize_record(first).column_count();
        if columns < MIN_COLUMNS {
            return Err(SalesPulseError::InsufficientColumns { found: columns });
        }

        let normalized: MonthlyDataset = original.iter().map(normalize_record).collect();

        save_dataset(self.store, &month_key(month), &normalized)?;
        save_dataset(self.store, &original_key(month), &original)?;

        info!(
            "Stored {} rows ({} columns) for {}",
            normalized.len(),
            columns,
            month
        );

        Ok(IngestReport {
            month,
            rows: normalized.len(),
            columns,
        })
    }
}
