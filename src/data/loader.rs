use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow::array::{Array, ArrayRef, AsArray};
use arrow::compute::kernels::cast::cast;
use arrow::datatypes::{DataType, Date32Type, Float64Type};
use bytes::Bytes;
use chrono::{Duration, NaiveDate};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;
use sha2::{Digest, Sha256};

use super::cache::Memo;
use super::model::{GameRecord, GameTable};

/// Columns every source must provide.
pub const REQUIRED_COLUMNS: [&str; 7] = [
    "title",
    "developer",
    "publisher",
    "genre",
    "copies_sold",
    "release_date",
    "as_of",
];

#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("unsupported file extension: .{0}")]
    UnsupportedFormat(String),
    #[error("missing required column '{0}'")]
    MissingColumn(String),
    #[error("row {row}: {reason}")]
    InvalidRow { row: usize, reason: String },
    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("malformed parquet: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),
    #[error("arrow: {0}")]
    Arrow(#[from] arrow::error::ArrowError),
}

type Result<T, E = DataLoadError> = std::result::Result<T, E>;

// ---------------------------------------------------------------------------
// Format dispatch
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataFormat {
    Csv,
    Json,
    Parquet,
}

impl DataFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();

        match ext.as_str() {
            "csv" => Ok(DataFormat::Csv),
            "json" => Ok(DataFormat::Json),
            "parquet" | "pq" => Ok(DataFormat::Parquet),
            other => Err(DataLoadError::UnsupportedFormat(other.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// DataStore – cached entry point
// ---------------------------------------------------------------------------

/// Loads game tables and keeps them for the rest of the process.
///
/// The cache key is the SHA-256 of the file bytes, so reloading an unchanged
/// file (under any path) hands back the same `Arc` without re-parsing.
#[derive(Debug, Default)]
pub struct DataStore {
    tables: Memo<(DataFormat, String), GameTable>,
}

impl DataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read `path` and parse it, unless a file with the same bytes was parsed
    /// before. Dispatch is by extension:
    ///
    /// * `.csv`     – header row naming at least [`REQUIRED_COLUMNS`]
    /// * `.json`    – `[{ "title": ..., "copies_sold": ..., ... }, ...]`
    /// * `.parquet` – one column per field; dates as strings, Date32 or timestamps
    pub fn load(&mut self, path: &Path) -> Result<Arc<GameTable>> {
        let format = DataFormat::from_path(path)?;
        let bytes = std::fs::read(path).map_err(|source| DataLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let digest = content_hash(&bytes);
        log::debug!("{} has content hash {digest}", path.display());

        self.tables.get_or_try_insert_with((format, digest), move || {
            let table = parse(format, bytes)?;
            log::info!(
                "Parsed {} games from {} ({format:?})",
                table.len(),
                path.display()
            );
            Ok(table)
        })
    }

    /// Number of distinct sources parsed so far.
    pub fn cached_tables(&self) -> usize {
        self.tables.len()
    }
}

/// Parse the bytes that were hashed, so the cache key always describes what
/// was actually parsed.
fn parse(format: DataFormat, bytes: Vec<u8>) -> Result<GameTable> {
    let rows = match format {
        DataFormat::Csv => parse_csv(&bytes)?,
        DataFormat::Json => parse_json(&bytes)?,
        DataFormat::Parquet => parse_parquet(Bytes::from(bytes))?,
    };
    Ok(GameTable::new(rows))
}

fn content_hash(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

// ---------------------------------------------------------------------------
// Field parsing shared by every format
// ---------------------------------------------------------------------------

const DATE_FORMATS: [&str; 5] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%B %d, %Y", "%b %d, %Y"];

/// Parse a calendar date. Datetimes keep only their date part.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if let Some(d) = DATE_FORMATS
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(s, f).ok())
    {
        return Some(d);
    }
    // "2017-03-03T00:00:00" / "2017-03-03 00:00:00"
    let (head, _) = s.split_once(['T', ' '])?;
    NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()
}

fn parse_copies(s: &str) -> Option<f64> {
    let cleaned: String = s.trim().chars().filter(|c| *c != ',' && *c != '_').collect();
    cleaned.parse::<f64>().ok()
}

/// Borrowed field values for one source row, before validation.
struct RawRow<'a> {
    title: &'a str,
    developer: &'a str,
    publisher: &'a str,
    genre: &'a str,
    copies_sold: f64,
    release_date: NaiveDate,
    as_of: NaiveDate,
}

impl RawRow<'_> {
    fn validate(self, row: usize) -> Result<GameRecord> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(invalid(row, "empty title"));
        }
        // Blank studios would otherwise form their own "" group.
        let developer = self.developer.trim();
        if developer.is_empty() {
            return Err(invalid(row, "empty developer"));
        }
        let publisher = self.publisher.trim();
        if publisher.is_empty() {
            return Err(invalid(row, "empty publisher"));
        }
        if !self.copies_sold.is_finite() || self.copies_sold < 0.0 {
            return Err(invalid(
                row,
                format!("copies_sold must be a non-negative number, got {}", self.copies_sold),
            ));
        }
        Ok(GameRecord {
            title: title.to_string(),
            developer: developer.to_string(),
            publisher: publisher.to_string(),
            genre: self.genre.trim().to_string(),
            copies_sold: self.copies_sold,
            release_date: self.release_date,
            as_of: self.as_of,
        })
    }
}

fn invalid(row: usize, reason: impl Into<String>) -> DataLoadError {
    DataLoadError::InvalidRow {
        row,
        reason: reason.into(),
    }
}

fn date_field(row: usize, col: &str, s: &str) -> Result<NaiveDate> {
    parse_date(s).ok_or_else(|| invalid(row, format!("'{s}' in {col} is not a date")))
}

fn copies_field(row: usize, s: &str) -> Result<f64> {
    parse_copies(s).ok_or_else(|| invalid(row, format!("'{s}' in copies_sold is not a number")))
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

fn parse_csv(bytes: &[u8]) -> Result<Vec<GameRecord>> {
    let mut reader = csv::Reader::from_reader(bytes);
    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut idx = [0usize; REQUIRED_COLUMNS.len()];
    for (slot, name) in idx.iter_mut().zip(REQUIRED_COLUMNS) {
        *slot = headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| DataLoadError::MissingColumn(name.to_string()))?;
    }
    let [title, developer, publisher, genre, copies, release, as_of] = idx;

    let mut rows = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result?;
        let field = |i: usize| record.get(i).unwrap_or("");

        let raw = RawRow {
            title: field(title),
            developer: field(developer),
            publisher: field(publisher),
            genre: field(genre),
            copies_sold: copies_field(row_no, field(copies))?,
            release_date: date_field(row_no, "release_date", field(release))?,
            as_of: date_field(row_no, "as_of", field(as_of))?,
        };
        rows.push(raw.validate(row_no)?);
    }
    Ok(rows)
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, `df.to_json(orient='records')`):
///
/// ```json
/// [
///   {
///     "title": "Mario Kart 8 Deluxe",
///     "developer": "Nintendo EPD",
///     "publisher": "Nintendo",
///     "genre": "Kart racing",
///     "copies_sold": 57460000,
///     "release_date": "2017-04-28",
///     "as_of": "2023-09-30"
///   }
/// ]
/// ```
///
/// Dates may also be epoch milliseconds, which is what Pandas writes by
/// default.
fn parse_json(bytes: &[u8]) -> Result<Vec<GameRecord>> {
    let root: JsonValue = serde_json::from_slice(bytes)?;
    let records = root
        .as_array()
        .ok_or_else(|| invalid(0, "expected a top-level JSON array"))?;

    let mut rows = Vec::with_capacity(records.len());
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .ok_or_else(|| invalid(i, "not a JSON object"))?;

        let copies_sold = match json_field(obj, "copies_sold")? {
            JsonValue::Number(n) => n
                .as_f64()
                .ok_or_else(|| invalid(i, format!("{n} in copies_sold is not a number")))?,
            JsonValue::String(s) => copies_field(i, s)?,
            other => return Err(invalid(i, format!("{other} in copies_sold is not a number"))),
        };

        let raw = RawRow {
            title: json_text(obj, i, "title")?,
            developer: json_text(obj, i, "developer")?,
            publisher: json_text(obj, i, "publisher")?,
            genre: json_text(obj, i, "genre")?,
            copies_sold,
            release_date: json_date(obj, i, "release_date")?,
            as_of: json_date(obj, i, "as_of")?,
        };
        rows.push(raw.validate(i)?);
    }
    Ok(rows)
}

type JsonObject = serde_json::Map<String, JsonValue>;

fn json_field<'a>(obj: &'a JsonObject, col: &str) -> Result<&'a JsonValue> {
    obj.get(col)
        .ok_or_else(|| DataLoadError::MissingColumn(col.to_string()))
}

fn json_text<'a>(obj: &'a JsonObject, row: usize, col: &str) -> Result<&'a str> {
    json_field(obj, col)?
        .as_str()
        .ok_or_else(|| invalid(row, format!("{col} is not a string")))
}

fn json_date(obj: &JsonObject, row: usize, col: &str) -> Result<NaiveDate> {
    match json_field(obj, col)? {
        JsonValue::String(s) => date_field(row, col, s),
        JsonValue::Number(n) => n
            .as_i64()
            .and_then(epoch_millis_to_date)
            .ok_or_else(|| invalid(row, format!("{n} in {col} is not a date"))),
        other => Err(invalid(row, format!("{other} in {col} is not a date"))),
    }
}

fn unix_epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or_default()
}

fn epoch_millis_to_date(ms: i64) -> Option<NaiveDate> {
    unix_epoch().checked_add_signed(Duration::try_milliseconds(ms)?)
}

fn epoch_days_to_date(days: i32) -> Option<NaiveDate> {
    unix_epoch().checked_add_signed(Duration::try_days(i64::from(days))?)
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Parse an in-memory Parquet file with one column per [`REQUIRED_COLUMNS`]
/// entry.
///
/// Text columns may be any string type, `copies_sold` any numeric type, and
/// the date columns strings, Date32/Date64 or timestamps. Works with files
/// written by both **Pandas** (`df.to_parquet()`) and **Polars**.
fn parse_parquet(bytes: Bytes) -> Result<Vec<GameRecord>> {
    let reader = ParquetRecordBatchReaderBuilder::try_new(bytes)?.build()?;

    let mut rows = Vec::new();
    for batch_result in reader {
        let batch = batch_result?;
        let column = |name: &str| -> Result<ArrayRef> {
            let i = batch
                .schema()
                .index_of(name)
                .map_err(|_| DataLoadError::MissingColumn(name.to_string()))?;
            Ok(Arc::clone(batch.column(i)))
        };

        let titles = cast(&column("title")?, &DataType::Utf8)?;
        let developers = cast(&column("developer")?, &DataType::Utf8)?;
        let publishers = cast(&column("publisher")?, &DataType::Utf8)?;
        let genres = cast(&column("genre")?, &DataType::Utf8)?;
        let copies = cast(&column("copies_sold")?, &DataType::Float64)?;
        let release = DateColumn::new(&column("release_date")?)?;
        let as_of = DateColumn::new(&column("as_of")?)?;
        let copies = copies.as_primitive::<Float64Type>();

        for i in 0..batch.num_rows() {
            let row = rows.len();
            if copies.is_null(i) {
                return Err(invalid(row, "null copies_sold"));
            }

            let raw = RawRow {
                title: arrow_text(&titles, row, i, "title")?,
                developer: arrow_text(&developers, row, i, "developer")?,
                publisher: arrow_text(&publishers, row, i, "publisher")?,
                genre: arrow_text(&genres, row, i, "genre")?,
                copies_sold: copies.value(i),
                release_date: release.get(row, i, "release_date")?,
                as_of: as_of.get(row, i, "as_of")?,
            };
            rows.push(raw.validate(row)?);
        }
    }
    Ok(rows)
}

/// Value `i` of a column already cast to Utf8.
fn arrow_text<'a>(arr: &'a ArrayRef, row: usize, i: usize, col: &str) -> Result<&'a str> {
    let arr = arr.as_string::<i32>();
    if arr.is_null(i) {
        return Err(invalid(row, format!("null {col}")));
    }
    Ok(arr.value(i))
}

/// A date column normalised to either text (parsed per row) or Date32.
enum DateColumn {
    Text(ArrayRef),
    Days(ArrayRef),
}

impl DateColumn {
    fn new(col: &ArrayRef) -> Result<Self> {
        Ok(match col.data_type() {
            DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View => {
                DateColumn::Text(cast(col, &DataType::Utf8)?)
            }
            _ => DateColumn::Days(cast(col, &DataType::Date32)?),
        })
    }

    fn get(&self, row: usize, i: usize, col: &str) -> Result<NaiveDate> {
        match self {
            DateColumn::Text(arr) => date_field(row, col, arrow_text(arr, row, i, col)?),
            DateColumn::Days(arr) => {
                let arr = arr.as_primitive::<Date32Type>();
                if arr.is_null(i) {
                    return Err(invalid(row, format!("null {col}")));
                }
                epoch_days_to_date(arr.value(i))
                    .ok_or_else(|| invalid(row, format!("{col} out of range")))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    use arrow::array::{Date32Array, Int64Array, StringArray};
    use arrow::datatypes::{Field, Schema};
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::ArrowWriter;

    const CSV: &str = "\
title,copies_sold,genre,developer,publisher,as_of,release_date
Mario Kart 8 Deluxe,57460000,Kart racing,Nintendo EPD,Nintendo,2023-09-30,2017-04-28
Animal Crossing: New Horizons,44790000,Social simulation,Nintendo EPD,Nintendo,2023-09-30,2020-03-20
Minecraft,15000000,Sandbox,Mojang Studios,Microsoft,2023-09-30,2018-06-21
";

    fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn load(path: &Path) -> Result<Arc<GameTable>> {
        DataStore::new().load(path)
    }

    #[test]
    fn loads_csv_in_any_column_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "games.csv", CSV);

        let table = load(&path).unwrap();
        assert_eq!(table.len(), 3);
        let first = &table.rows()[0];
        assert_eq!(first.title, "Mario Kart 8 Deluxe");
        assert_eq!(first.developer, "Nintendo EPD");
        assert_eq!(first.copies_sold, 57_460_000.0);
        assert_eq!(first.release_date, date(2017, 4, 28));
        assert_eq!(first.as_of, date(2023, 9, 30));
    }

    #[test]
    fn missing_column_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            "games.csv",
            "title,copies_sold,developer,publisher,as_of,release_date\nA,1,D,P,2023-01-01,2020-01-01\n",
        );
        match load(&path) {
            Err(DataLoadError::MissingColumn(col)) => assert_eq!(col, "genre"),
            other => panic!("expected missing column, got {other:?}"),
        }
    }

    #[test]
    fn bad_rows_abort_the_load() {
        let dir = tempfile::tempdir().unwrap();
        let header = "title,copies_sold,genre,developer,publisher,as_of,release_date\n";
        for (name, row) in [
            ("date.csv", "A,1,G,D,P,2023-01-01,not a date\n"),
            ("neg.csv", "A,-5,G,D,P,2023-01-01,2020-01-01\n"),
            ("nan.csv", "A,lots,G,D,P,2023-01-01,2020-01-01\n"),
            ("title.csv", " ,1,G,D,P,2023-01-01,2020-01-01\n"),
            ("developer.csv", "A,1,G, ,P,2023-01-01,2020-01-01\n"),
            ("publisher.csv", "A,1,G,D,,2023-01-01,2020-01-01\n"),
        ] {
            let path = write(dir.path(), name, &format!("{header}{row}"));
            assert!(
                matches!(load(&path), Err(DataLoadError::InvalidRow { row: 0, .. })),
                "{name} should be rejected"
            );
        }
    }

    #[test]
    fn missing_file_and_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            load(&dir.path().join("nope.csv")),
            Err(DataLoadError::Io { .. })
        ));
        let txt = write(dir.path(), "games.txt", CSV);
        assert!(matches!(
            load(&txt),
            Err(DataLoadError::UnsupportedFormat(ext)) if ext == "txt"
        ));
    }

    #[test]
    fn store_caches_by_content() {
        let dir = tempfile::tempdir().unwrap();
        let a = write(dir.path(), "a.csv", CSV);
        let b = write(dir.path(), "b.csv", CSV);
        let mut store = DataStore::new();

        let first = store.load(&a).unwrap();
        let again = store.load(&a).unwrap();
        let copy = store.load(&b).unwrap();
        assert!(Arc::ptr_eq(&first, &again));
        assert!(Arc::ptr_eq(&first, &copy));
        assert_eq!(store.cached_tables(), 1);

        fs::write(&a, CSV.replace("57460000", "57460001")).unwrap();
        let changed = store.load(&a).unwrap();
        assert!(!Arc::ptr_eq(&first, &changed));
        assert_eq!(store.cached_tables(), 2);
    }

    #[test]
    fn failed_loads_are_not_cached() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "bad.csv", "title\nA\n");
        let mut store = DataStore::new();
        assert!(store.load(&path).is_err());
        assert_eq!(store.cached_tables(), 0);
    }

    #[test]
    fn loads_json_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            "games.json",
            r#"[
                {"title": "Splatoon 2", "developer": "Nintendo EPD", "publisher": "Nintendo",
                 "genre": "Shooter", "copies_sold": 13600000,
                 "release_date": "2017-07-21", "as_of": 1696032000000},
                {"title": "Kirby Star Allies", "developer": "HAL Laboratory", "publisher": "Nintendo",
                 "genre": "Platformer", "copies_sold": "3,500,000",
                 "release_date": "March 16, 2018", "as_of": "2023-09-30T00:00:00"}
            ]"#,
        );
        let mut store = DataStore::new();
        let table = store.load(&path).unwrap();
        assert_eq!(table.len(), 2);
        assert!(Arc::ptr_eq(&table, &store.load(&path).unwrap()));
        assert_eq!(table.rows()[0].as_of, date(2023, 9, 30));
        assert_eq!(table.rows()[1].copies_sold, 3_500_000.0);
        assert_eq!(table.rows()[1].release_date, date(2018, 3, 16));
    }

    #[test]
    fn json_missing_field() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "games.json", r#"[{"title": "A"}]"#);
        assert!(matches!(load(&path), Err(DataLoadError::MissingColumn(_))));
    }

    #[test]
    fn loads_parquet() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("games.parquet");

        let text = |v: &[&str]| Arc::new(StringArray::from(v.to_vec())) as ArrayRef;
        let schema = Arc::new(Schema::new(vec![
            Field::new("title", DataType::Utf8, false),
            Field::new("developer", DataType::Utf8, false),
            Field::new("publisher", DataType::Utf8, false),
            Field::new("genre", DataType::Utf8, false),
            Field::new("copies_sold", DataType::Int64, false),
            Field::new("release_date", DataType::Utf8, false),
            Field::new("as_of", DataType::Date32, false),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                text(&["Metroid Dread", "Bayonetta 2"]),
                text(&["MercurySteam", "PlatinumGames"]),
                text(&["Nintendo", "Nintendo"]),
                text(&["Action-adventure", "Action"]),
                Arc::new(Int64Array::from(vec![3_030_000, 1_000_000])),
                text(&["2021-10-08", "2018-02-16"]),
                Arc::new(Date32Array::from(vec![19630, 19630])),
            ],
        )
        .unwrap();
        let file = fs::File::create(&path).unwrap();
        let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let mut store = DataStore::new();
        let table = store.load(&path).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows()[0].copies_sold, 3_030_000.0);
        assert_eq!(table.rows()[1].release_date, date(2018, 2, 16));
        assert_eq!(table.rows()[1].as_of, date(2023, 9, 30));

        // Same bytes under another name: served from the cache.
        let copy = dir.path().join("copy.pq");
        fs::copy(&path, &copy).unwrap();
        assert!(Arc::ptr_eq(&table, &store.load(&copy).unwrap()));
        assert_eq!(store.cached_tables(), 1);
    }

    #[test]
    fn truncated_parquet_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("games.parquet");
        fs::write(&path, b"PAR1 not really").unwrap();
        let mut store = DataStore::new();
        assert!(matches!(store.load(&path), Err(DataLoadError::Parquet(_))));
        assert_eq!(store.cached_tables(), 0);
    }

    #[test]
    fn date_formats() {
        assert_eq!(parse_date("2017-03-03"), Some(date(2017, 3, 3)));
        assert_eq!(parse_date("2017/03/03"), Some(date(2017, 3, 3)));
        assert_eq!(parse_date("03/03/2017"), Some(date(2017, 3, 3)));
        assert_eq!(parse_date("Mar 3, 2017"), Some(date(2017, 3, 3)));
        assert_eq!(parse_date("2017-03-03 12:30:00"), Some(date(2017, 3, 3)));
        assert_eq!(parse_date("soon"), None);
    }
}
