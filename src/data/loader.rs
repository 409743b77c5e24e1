use std::collections::HashMap;
use std::path::Path;

use anyhow::{bail, Context};
use arrow::array::{Array, ArrayRef, AsArray};
use arrow::datatypes::{DataType, Float32Type, Float64Type, Int32Type, Int64Type};
use arrow::util::display::array_value_to_string;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use log::{info, warn};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{AccidentRecord, Cell, Datasets, DelayRecord, LoadReport, Severity};
use super::schema::{AccidentColumns, AccidentIndices, DelayColumns, DelayIndices};
use crate::config::DataSources;
use crate::error::{PipelineError, Result};

// ---------------------------------------------------------------------------
// Table – rows of untyped cells under a header
// ---------------------------------------------------------------------------

/// A parsed tabular source before any field is interpreted.
/// Every row holds exactly `headers.len()` cells.
#[derive(Debug, Clone, Default)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    fn require(&self, name: &str) -> anyhow::Result<usize> {
        self.column(name).with_context(|| {
            format!(
                "missing required column '{name}' (found: {})",
                self.headers.join(", ")
            )
        })
    }
}

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load both collections described by `sources`.
///
/// Fails with [`PipelineError::DataUnavailable`] when either file cannot be
/// read at all; individual bad rows never fail the load.
pub fn load(sources: &DataSources) -> Result<Datasets> {
    let (delays, delay_report) = load_delays(&sources.delays, &sources.columns.delays)?;
    let (accidents, accident_report) =
        load_accidents(&sources.accidents, &sources.columns.accidents)?;

    info!(
        "Loaded {} delay records ({} dropped) and {} accident records",
        delays.len(),
        delay_report.rows_dropped,
        accidents.len()
    );

    Ok(Datasets {
        delays,
        accidents,
        delay_report,
        accident_report,
    })
}

pub fn load_delays(path: &Path, columns: &DelayColumns) -> Result<(Vec<DelayRecord>, LoadReport)> {
    load_table(path)
        .and_then(|table| delays_from_table(&table, columns))
        .map_err(|e| PipelineError::unavailable(path, &e))
}

pub fn load_accidents(
    path: &Path,
    columns: &AccidentColumns,
) -> Result<(Vec<AccidentRecord>, LoadReport)> {
    load_table(path)
        .map(|table| accidents_from_table(&table, columns))
        .map_err(|e| PipelineError::unavailable(path, &e))
}

/// Read a tabular file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row followed by records
/// * `.json`    – `[{ "Train Name": "...", ... }, ...]`
/// * `.parquet` – any flat schema
pub fn load_table(path: &Path) -> anyhow::Result<Table> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "csv" => load_csv(path),
        "json" => load_json(path),
        "parquet" | "pq" => load_parquet(path),
        other => bail!("Unsupported file extension: .{other}"),
    }
}

// ---------------------------------------------------------------------------
// Typed conversion
// ---------------------------------------------------------------------------

fn delays_from_table(
    table: &Table,
    columns: &DelayColumns,
) -> anyhow::Result<(Vec<DelayRecord>, LoadReport)> {
    let idx = DelayIndices {
        train_name: table.require(&columns.train_name)?,
        source_station: table.require(&columns.source_station)?,
        destination_station: table.require(&columns.destination_station)?,
        delay_minutes: table.require(&columns.delay_minutes)?,
        scheduled_time: table.column(&columns.scheduled_time),
        actual_time: table.column(&columns.actual_time),
    };
    if idx.scheduled_time.is_none() {
        warn!(
            "Delay source has no '{}' column; date filters will exclude every record",
            columns.scheduled_time
        );
    }

    let mut report = LoadReport {
        total_rows: table.rows.len(),
        ..Default::default()
    };
    let mut records = Vec::with_capacity(table.rows.len());

    for row in &table.rows {
        let (
            Some(train_name),
            Some(source_station),
            Some(destination_station),
            Some(delay_minutes),
        ) = (
            row[idx.train_name].as_text(),
            row[idx.source_station].as_text(),
            row[idx.destination_station].as_text(),
            row[idx.delay_minutes].as_f64(),
        )
        else {
            report.rows_dropped += 1;
            continue;
        };

        let scheduled_time = timestamp_field(row, idx.scheduled_time, &mut report);
        let actual_time = timestamp_field(row, idx.actual_time, &mut report);

        records.push(DelayRecord {
            train_name,
            source_station,
            destination_station,
            scheduled_time,
            actual_time,
            delay_minutes,
        });
    }

    if report.rows_dropped > 0 {
        warn!(
            "Dropped {} of {} delay rows missing a required field",
            report.rows_dropped, report.total_rows
        );
    }
    if report.unparsable_timestamps > 0 {
        warn!("{} timestamp values could not be parsed", report.unparsable_timestamps);
    }

    Ok((records, report))
}

fn accidents_from_table(
    table: &Table,
    columns: &AccidentColumns,
) -> (Vec<AccidentRecord>, LoadReport) {
    let optional = |name: &str| {
        let found = table.column(name);
        if found.is_none() {
            warn!("Accident source has no '{name}' column; field will be null");
        }
        found
    };
    let idx = AccidentIndices {
        year: optional(&columns.year),
        train_name: optional(&columns.train_name),
        departure_from: optional(&columns.departure_from),
        going_to: optional(&columns.going_to),
        location: optional(&columns.location),
        latitude: optional(&columns.latitude),
        longitude: optional(&columns.longitude),
        severity: optional(&columns.severity),
    };

    let cell = |row: &[Cell], i: Option<usize>| i.map(|i| row[i].clone()).unwrap_or(Cell::Null);

    let records = table
        .rows
        .iter()
        .map(|row| AccidentRecord {
            year: cell(row, idx.year)
                .as_i64()
                .and_then(|y| i32::try_from(y).ok()),
            train_name: cell(row, idx.train_name).as_text(),
            departure_from: cell(row, idx.departure_from).as_text(),
            going_to: cell(row, idx.going_to).as_text(),
            location: cell(row, idx.location).as_text(),
            latitude: cell(row, idx.latitude).as_f64(),
            longitude: cell(row, idx.longitude).as_f64(),
            severity: cell(row, idx.severity)
                .as_text()
                .and_then(|s| s.parse::<Severity>().ok()),
        })
        .collect();

    let report = LoadReport {
        total_rows: table.rows.len(),
        ..Default::default()
    };
    (records, report)
}

fn timestamp_field(
    row: &[Cell],
    idx: Option<usize>,
    report: &mut LoadReport,
) -> Option<NaiveDateTime> {
    let cell = &row[idx?];
    if cell.is_null() {
        return None;
    }
    let parsed = cell.as_text().as_deref().and_then(parse_timestamp);
    if parsed.is_none() {
        report.unparsable_timestamps += 1;
    }
    parsed
}

// ---------------------------------------------------------------------------
// Timestamps
// ---------------------------------------------------------------------------

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%d-%m-%Y %H:%M:%S",
    "%d-%m-%Y %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d-%m-%Y", "%d/%m/%Y"];

/// Parse a timestamp in any of the layouts seen in the delay datasets.
/// Date-only values mean midnight; offsets are dropped (wall-clock time kept).
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|f| NaiveDate::parse_from_str(s, f).ok())
                .map(|d| d.and_time(NaiveTime::MIN))
        })
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

fn load_csv(path: &Path) -> anyhow::Result<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .context("opening CSV")?;
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();

    let mut rows = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        rows.push(
            (0..headers.len())
                .map(|i| Cell::from_text(record.get(i).unwrap_or("")))
                .collect(),
        );
    }

    Ok(Table { headers, rows })
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Records-oriented JSON, the default `df.to_json(orient='records')`.
/// Keys missing from a record become nulls.
fn load_json(path: &Path) -> anyhow::Result<Table> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let records = root.as_array().context("Expected top-level JSON array")?;

    let mut objects = Vec::with_capacity(records.len());
    let mut headers: Vec<String> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;
        for key in obj.keys() {
            if !positions.contains_key(key) {
                positions.insert(key.clone(), headers.len());
                headers.push(key.clone());
            }
        }
        objects.push(obj);
    }

    let rows = objects
        .into_iter()
        .map(|obj| {
            let mut row = vec![Cell::Null; headers.len()];
            for (key, val) in obj {
                row[positions[key]] = json_to_cell(val);
            }
            row
        })
        .collect();

    Ok(Table { headers, rows })
}

fn json_to_cell(val: &JsonValue) -> Cell {
    match val {
        JsonValue::String(s) => Cell::from_text(s),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Cell::Integer(i)
            } else if let Some(f) = n.as_f64() {
                Cell::Float(f)
            } else {
                Cell::Text(n.to_string())
            }
        }
        JsonValue::Bool(b) => Cell::Bool(*b),
        JsonValue::Null => Cell::Null,
        other => Cell::Text(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`).
fn load_parquet(path: &Path) -> anyhow::Result<Table> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let headers: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build().context("building parquet reader")?;

    let mut rows = Vec::new();
    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        for row in 0..batch.num_rows() {
            let cells = batch
                .columns()
                .iter()
                .map(|col| extract_cell(col, row))
                .collect::<anyhow::Result<Vec<_>>>()
                .with_context(|| format!("Row {row}"))?;
            rows.push(cells);
        }
    }

    Ok(Table { headers, rows })
}

/// Extract a single cell from an Arrow column at a given row.
/// Types without a dedicated variant (timestamps, dates, small ints) go
/// through Arrow's display formatting.
fn extract_cell(col: &ArrayRef, row: usize) -> anyhow::Result<Cell> {
    if col.is_null(row) {
        return Ok(Cell::Null);
    }
    let cell = match col.data_type() {
        DataType::Utf8 => Cell::from_text(col.as_string::<i32>().value(row)),
        DataType::LargeUtf8 => Cell::from_text(col.as_string::<i64>().value(row)),
        DataType::Int32 => Cell::Integer(col.as_primitive::<Int32Type>().value(row) as i64),
        DataType::Int64 => Cell::Integer(col.as_primitive::<Int64Type>().value(row)),
        DataType::Float32 => Cell::Float(col.as_primitive::<Float32Type>().value(row) as f64),
        DataType::Float64 => Cell::Float(col.as_primitive::<Float64Type>().value(row)),
        DataType::Boolean => Cell::Bool(col.as_boolean().value(row)),
        _ => Cell::from_text(&array_value_to_string(col, row)?),
    };
    Ok(cell)
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::path::PathBuf;
    use std::sync::Arc;

    use arrow::array::{Float64Array, Int64Array, StringArray};
    use arrow::datatypes::{Field, Schema};
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::ArrowWriter;
    use tempfile::TempDir;

    use super::*;

    const DELAY_HEADER: &str =
        "Train Name,Source,Destination,Scheduled Arrival,Actual Arrival,Delay (Minutes)";

    fn write(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn drops_rows_missing_required_fields() {
        let dir = TempDir::new().unwrap();
        let mut csv = format!("{DELAY_HEADER}\n");
        for i in 0..9 {
            csv.push_str(&format!(
                "Express {i},Delhi,Mumbai,2023-06-0{} 10:00:00,2023-06-0{} 10:{i}5:00,{i}5\n",
                i + 1,
                i + 1
            ));
        }
        csv.push_str(",Delhi,Mumbai,2023-06-01 10:00:00,2023-06-01 10:30:00,30\n");
        let path = write(&dir, "delays.csv", &csv);

        let (records, report) = load_delays(&path, &DelayColumns::default()).unwrap();
        assert_eq!(records.len(), 9);
        assert_eq!(report.total_rows, 10);
        assert_eq!(report.rows_dropped, 1);
        assert_eq!(report.rows_kept(), 9);
    }

    #[test]
    fn non_numeric_delay_counts_as_missing() {
        let dir = TempDir::new().unwrap();
        let csv = format!(
            "{DELAY_HEADER}\nA,X,Y,2023-06-01 10:00,,late\nB,X,Y,2023-06-01 10:00,,NaN\nC,X,Y,,,4\n"
        );
        let path = write(&dir, "delays.csv", &csv);

        let (records, report) = load_delays(&path, &DelayColumns::default()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].train_name, "C");
        assert_eq!(report.rows_dropped, 2);
    }

    #[test]
    fn unparsable_timestamp_is_nulled_not_dropped() {
        let dir = TempDir::new().unwrap();
        let csv = format!("{DELAY_HEADER}\nA,X,Y,yesterday-ish,2023-06-01 10:05,5\n");
        let path = write(&dir, "delays.csv", &csv);

        let (records, report) = load_delays(&path, &DelayColumns::default()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].scheduled_time, None);
        assert!(records[0].actual_time.is_some());
        assert_eq!(report.unparsable_timestamps, 1);
    }

    #[test]
    fn missing_file_is_data_unavailable() {
        let err = load_delays(Path::new("/nonexistent/delays.csv"), &DelayColumns::default())
            .unwrap_err();
        assert!(matches!(err, PipelineError::DataUnavailable { .. }));
    }

    #[test]
    fn missing_required_column_is_data_unavailable() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "delays.csv", "Train Name,Source\nA,X\n");
        let err = load_delays(&path, &DelayColumns::default()).unwrap_err();
        match err {
            PipelineError::DataUnavailable { reason, .. } => {
                assert!(reason.contains("Destination"), "{reason}")
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unsupported_extension_is_data_unavailable() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "delays.xlsx", "");
        assert!(load_delays(&path, &DelayColumns::default()).is_err());
    }

    #[test]
    fn custom_column_mapping() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "delays.csv", "train,from,to,minutes\nRajdhani,NDLS,BCT,42\n");
        let columns = DelayColumns {
            train_name: "train".into(),
            source_station: "from".into(),
            destination_station: "to".into(),
            delay_minutes: "minutes".into(),
            ..Default::default()
        };
        let (records, _) = load_delays(&path, &columns).unwrap();
        assert_eq!(records[0].train_name, "Rajdhani");
        assert_eq!(records[0].delay_minutes, 42.0);
        assert_eq!(records[0].scheduled_time, None);
    }

    #[test]
    fn accidents_pass_through_with_nulls() {
        let dir = TempDir::new().unwrap();
        let csv = "Year,Train Name,Departure From,Going To,Accident Location,Severity\n\
                   2016,Indore-Patna Express,Indore,Patna,Pukhrayan,High\n\
                   ,,,,,\n\
                   2010,Gyaneshwari Express,Howrah,Mumbai,Jhargram,unknown\n";
        let path = write(&dir, "accidents.csv", csv);

        let (records, report) = load_accidents(&path, &AccidentColumns::default()).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(report.rows_dropped, 0);
        assert_eq!(records[0].year, Some(2016));
        assert_eq!(records[0].severity, Some(Severity::High));
        assert_eq!(records[1].train_name, None);
        assert_eq!(records[2].severity, None);
        assert_eq!(records[0].latitude, None);
    }

    #[test]
    fn json_records_load() {
        let dir = TempDir::new().unwrap();
        let json = r#"[
            {"Train Name": "Duronto", "Source": "Pune", "Destination": "Howrah",
             "Scheduled Arrival": "2023-07-01T06:30:00", "Delay (Minutes)": 12},
            {"Train Name": "Garib Rath", "Source": "Pune", "Destination": null,
             "Delay (Minutes)": 3.5}
        ]"#;
        let path = write(&dir, "delays.json", json);

        let (records, report) = load_delays(&path, &DelayColumns::default()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(report.rows_dropped, 1);
        assert_eq!(records[0].delay_minutes, 12.0);
        assert!(records[0].scheduled_time.is_some());
    }

    #[test]
    fn parquet_loads() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("accidents.parquet");

        let schema = Arc::new(Schema::new(vec![
            Field::new("Year", arrow::datatypes::DataType::Int64, true),
            Field::new("Train Name", arrow::datatypes::DataType::Utf8, true),
            Field::new("Latitude", arrow::datatypes::DataType::Float64, true),
            Field::new("Longitude", arrow::datatypes::DataType::Float64, true),
            Field::new("Severity", arrow::datatypes::DataType::Utf8, true),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(Int64Array::from(vec![Some(2023), None])),
                Arc::new(StringArray::from(vec![Some("Coromandel Express"), None])),
                Arc::new(Float64Array::from(vec![Some(21.3), None])),
                Arc::new(Float64Array::from(vec![Some(86.7), None])),
                Arc::new(StringArray::from(vec![Some("High"), Some("Low")])),
            ],
        )
        .unwrap();
        let file = std::fs::File::create(&path).unwrap();
        let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let (records, _) = load_accidents(&path, &AccidentColumns::default()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].year, Some(2023));
        assert_eq!(records[0].latitude, Some(21.3));
        assert_eq!(records[1].year, None);
        assert_eq!(records[1].severity, Some(Severity::Low));
    }

    #[test]
    fn timestamp_layouts() {
        let expect = NaiveDate::from_ymd_opt(2023, 6, 1)
            .unwrap()
            .and_hms_opt(10, 30, 0)
            .unwrap();
        for s in [
            "2023-06-01 10:30:00",
            "2023-06-01T10:30:00",
            "2023-06-01 10:30",
            "01-06-2023 10:30",
            "01/06/2023 10:30:00",
            "2023-06-01T10:30:00+05:30",
        ] {
            assert_eq!(parse_timestamp(s), Some(expect), "{s}");
        }
        assert_eq!(
            parse_timestamp("2023-06-01").map(|t| t.time()),
            Some(NaiveTime::MIN)
        );
        assert_eq!(parse_timestamp("not a date"), None);
    }
}
