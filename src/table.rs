//! In-memory tables read from delimited text.
//!
//! A [`RawTable`] is a header row plus string cells, with headers already
//! passed through [`normalize_header`]. A [`Workbook`] is a set of named
//! tables; on disk it is a directory holding one CSV file per sheet.

use std::path::Path;

use csv::ReaderBuilder;
use tracing::warn;

use crate::error::TableError;
use crate::fetch::{is_remote, read_source};
use crate::headers::{normalize_header, normalize_sheet_name};

#[derive(Debug, Clone, Default)]
pub struct RawTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Builds a table from already-split cells. Headers are normalized.
    pub fn new<H: AsRef<str>>(headers: &[H], rows: Vec<Vec<String>>) -> Self {
        Self {
            headers: headers.iter().map(|h| normalize_header(h.as_ref())).collect(),
            rows,
        }
    }

    /// Parses delimited text whose first record is the header row.
    ///
    /// The delimiter is whichever of `,` and `;` occurs more often in the
    /// header line. Ragged rows are accepted; invalid UTF-8 is replaced.
    pub fn from_csv_bytes(bytes: &[u8]) -> Result<Self, csv::Error> {
        let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);

        let mut reader = ReaderBuilder::new()
            .delimiter(detect_delimiter(bytes))
            .has_headers(true)
            .flexible(true)
            .from_reader(bytes);

        let headers: Vec<String> = reader
            .byte_headers()?
            .iter()
            .map(|h| String::from_utf8_lossy(h).into_owned())
            .collect();

        let mut rows = Vec::new();
        for record in reader.byte_records() {
            let record = record?;
            rows.push(
                record
                    .iter()
                    .map(|c| String::from_utf8_lossy(c).into_owned())
                    .collect(),
            );
        }

        Ok(Self::new(&headers, rows))
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of the first column matching any of `aliases` after normalization.
    pub fn column(&self, aliases: &[&str]) -> Option<usize> {
        aliases.iter().find_map(|alias| {
            let alias = normalize_header(alias);
            self.headers.iter().position(|h| *h == alias)
        })
    }

    /// Resolves every `(name, aliases)` pair to a column index, or reports
    /// all names that could not be found.
    pub fn require(&self, columns: &[(&str, &[&str])]) -> Result<Vec<usize>, TableError> {
        let mut found = Vec::with_capacity(columns.len());
        let mut missing = Vec::new();
        for (name, aliases) in columns {
            match self.column(aliases) {
                Some(idx) => found.push(idx),
                None => missing.push(name.to_string()),
            }
        }
        if missing.is_empty() {
            Ok(found)
        } else {
            Err(TableError::MissingColumns(missing))
        }
    }
}

/// Cell at `idx`, trimmed, or `None` when absent or blank.
pub fn cell(row: &[String], idx: usize) -> Option<&str> {
    row.get(idx).map(|c| c.trim()).filter(|c| !c.is_empty())
}

/// Parses a numeric cell. Accepts `,` as decimal separator. Rejects
/// non-finite values.
pub fn coerce_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let value: f64 = trimmed.replace(',', ".").parse().ok()?;
    value.is_finite().then_some(value)
}

/// Parses a cell holding a whole number (`"15"`, `"15.0"`, `"15,0"`).
pub fn coerce_integer(raw: &str) -> Option<i64> {
    let value = coerce_number(raw)?;
    if value.fract() != 0.0 || value.abs() > i64::MAX as f64 {
        return None;
    }
    Some(value as i64)
}

fn detect_delimiter(bytes: &[u8]) -> u8 {
    let first_line = bytes.split(|b| *b == b'\n').next().unwrap_or_default();
    let commas = first_line.iter().filter(|b| **b == b',').count();
    let semicolons = first_line.iter().filter(|b| **b == b';').count();
    if semicolons > commas { b';' } else { b',' }
}

/// A set of named sheets.
#[derive(Debug, Clone, Default)]
pub struct Workbook {
    sheets: Vec<(String, RawTable)>,
}

impl Workbook {
    pub fn new(sheets: Vec<(String, RawTable)>) -> Self {
        Self { sheets }
    }

    /// Reads every `*.csv` / `*.csv.gz` file in `dir` as a sheet named by its
    /// file stem. Files that fail to parse are skipped with a warning.
    pub fn from_dir(dir: &Path) -> Result<Self, TableError> {
        let source_name = dir.display().to_string();
        let entries =
            std::fs::read_dir(dir).map_err(|e| TableError::unreadable(&source_name, e))?;

        let mut sheets = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| TableError::unreadable(&source_name, e))?;
            let path = entry.path();
            let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let Some(stem) = file_name
                .strip_suffix(".csv.gz")
                .or_else(|| file_name.strip_suffix(".csv"))
            else {
                continue;
            };

            let path_str = path.display().to_string();
            match read_source(&path_str)
                .map_err(|e| e.to_string())
                .and_then(|bytes| RawTable::from_csv_bytes(&bytes).map_err(|e| e.to_string()))
            {
                Ok(table) => sheets.push((stem.to_string(), table)),
                Err(reason) => warn!(sheet = stem, %reason, "Skipping unreadable sheet"),
            }
        }

        sheets.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(Self { sheets })
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Finds the sheet whose name matches `label` ignoring case, whitespace
    /// and Latin look-alike letters.
    pub fn sheet(&self, label: &str) -> Result<&RawTable, TableError> {
        let wanted = normalize_sheet_name(label);
        self.sheets
            .iter()
            .find(|(name, _)| normalize_sheet_name(name) == wanted)
            .map(|(_, table)| table)
            .ok_or_else(|| TableError::SheetNotFound {
                label: label.to_string(),
                available: self.sheet_names().join(", "),
            })
    }
}

/// What a table source turned out to be.
#[derive(Debug, Clone)]
pub enum TableSource {
    Table(RawTable),
    Workbook(Workbook),
}

impl TableSource {
    /// Loads a source: a local directory becomes a [`Workbook`], anything else
    /// (file, `.gz` file, URL) a single [`RawTable`].
    pub fn load(source: &str) -> Result<Self, TableError> {
        if !is_remote(source) && Path::new(source).is_dir() {
            return Workbook::from_dir(Path::new(source)).map(TableSource::Workbook);
        }

        let bytes =
            read_source(source).map_err(|e| TableError::unreadable(source, format!("{e:#}")))?;
        if bytes.iter().all(|b| b.is_ascii_whitespace()) {
            return Err(TableError::Empty);
        }
        RawTable::from_csv_bytes(&bytes)
            .map(TableSource::Table)
            .map_err(|e| TableError::unreadable(source, e))
    }

    /// The table to use: the source itself for a plain table, the sheet
    /// matching `label` for a workbook.
    pub fn resolve(&self, label: &str) -> Result<&RawTable, TableError> {
        match self {
            TableSource::Table(table) => Ok(table),
            TableSource::Workbook(book) => book.sheet(label),
        }
    }

    /// The table itself, or the first sheet (by name) of a workbook. Used for
    /// reference sources, which carry a single table.
    pub fn primary(&self) -> Option<&RawTable> {
        match self {
            TableSource::Table(table) => Some(table),
            TableSource::Workbook(book) => book.sheets.first().map(|(_, table)| table),
        }
    }
}
