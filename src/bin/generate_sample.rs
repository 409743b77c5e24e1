use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use clap::Parser;
use log::info;
use parquet::arrow::ArrowWriter;

const TRAINS: &[(&str, &str, &str)] = &[
    ("Rajdhani Express", "New Delhi", "Mumbai Central"),
    ("Shatabdi Express", "New Delhi", "Bhopal"),
    ("Duronto Express", "Howrah", "Pune"),
    ("Garib Rath", "Kolkata", "Chennai Central"),
    ("Vande Bharat", "Varanasi", "New Delhi"),
    ("Gatimaan Express", "Hazrat Nizamuddin", "Agra Cantt"),
    ("Coromandel Express", "Shalimar", "Chennai Central"),
    ("Howrah Mail", "Howrah", "Mumbai CSMT"),
];

const LOCATIONS: &[(&str, f64, f64)] = &[
    ("Balasore", 21.49, 86.93),
    ("Pukhrayan", 26.23, 79.85),
    ("Khatauli", 29.28, 77.73),
    ("Jhargram", 22.45, 86.99),
    ("Kanpur", 26.45, 80.33),
];

const SEVERITIES: &[&str] = &["High", "Medium", "Low"];

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5)).rotate_left(7).wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn below(&mut self, n: usize) -> usize {
        (self.next_f64() * n as f64) as usize % n
    }

    /// Exponential draw, for right-skewed delays.
    fn exponential(&mut self, mean: f64) -> f64 {
        -mean * (1.0 - self.next_f64()).max(1e-15).ln()
    }
}

struct DelayRow {
    train: &'static str,
    source: &'static str,
    destination: &'static str,
    scheduled: NaiveDateTime,
    actual: NaiveDateTime,
    delay: i64,
}

struct AccidentRow {
    year: i64,
    train: &'static str,
    from: &'static str,
    to: &'static str,
    location: &'static str,
    latitude: f64,
    longitude: f64,
    severity: &'static str,
}

fn delay_rows(rng: &mut SimpleRng, n: usize) -> Result<Vec<DelayRow>> {
    let start = NaiveDate::from_ymd_opt(2023, 4, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .context("invalid start date")?;

    Ok((0..n)
        .map(|i| {
            let (train, source, destination) = TRAINS[i % TRAINS.len()];
            // Each train gets its own typical lateness.
            let mean = 5.0 + 7.0 * (i % TRAINS.len()) as f64;
            let delay = rng.exponential(mean).round() as i64;
            let scheduled = start
                + Duration::days(rng.below(365) as i64)
                + Duration::minutes(rng.below(24 * 60) as i64);
            DelayRow {
                train,
                source,
                destination,
                scheduled,
                actual: scheduled + Duration::minutes(delay),
                delay,
            }
        })
        .collect())
}

fn accident_rows(rng: &mut SimpleRng, n: usize) -> Vec<AccidentRow> {
    (0..n)
        .map(|_| {
            let (train, from, to) = TRAINS[rng.below(TRAINS.len())];
            let (location, lat, lon) = LOCATIONS[rng.below(LOCATIONS.len())];
            AccidentRow {
                year: 2000 + rng.below(25) as i64,
                train,
                from,
                to,
                location,
                latitude: lat + (rng.next_f64() - 0.5) * 0.1,
                longitude: lon + (rng.next_f64() - 0.5) * 0.1,
                severity: SEVERITIES[rng.below(SEVERITIES.len())],
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Writers
// ---------------------------------------------------------------------------

const TS_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn write_csv(delays: &[DelayRow], accidents: &[AccidentRow], dir: &Path) -> Result<()> {
    let mut w = csv::Writer::from_path(dir.join("sample_delays.csv"))?;
    w.write_record([
        "Train Name",
        "Source",
        "Destination",
        "Scheduled Arrival",
        "Actual Arrival",
        "Delay (Minutes)",
    ])?;
    for d in delays {
        w.write_record([
            d.train.to_string(),
            d.source.to_string(),
            d.destination.to_string(),
            d.scheduled.format(TS_FORMAT).to_string(),
            d.actual.format(TS_FORMAT).to_string(),
            d.delay.to_string(),
        ])?;
    }
    w.flush()?;

    let mut w = csv::Writer::from_path(dir.join("sample_accidents.csv"))?;
    w.write_record([
        "Year",
        "Train Name",
        "Departure From",
        "Going To",
        "Accident Location",
        "Latitude",
        "Longitude",
        "Severity",
    ])?;
    for a in accidents {
        w.write_record([
            a.year.to_string(),
            a.train.to_string(),
            a.from.to_string(),
            a.to.to_string(),
            a.location.to_string(),
            format!("{:.4}", a.latitude),
            format!("{:.4}", a.longitude),
            a.severity.to_string(),
        ])?;
    }
    w.flush()?;
    Ok(())
}

fn write_parquet(path: &Path, columns: Vec<(&str, ArrayRef)>) -> Result<()> {
    let schema = Arc::new(Schema::new(
        columns
            .iter()
            .map(|(name, array)| Field::new(*name, array.data_type().clone(), false))
            .collect::<Vec<_>>(),
    ));
    let batch = RecordBatch::try_new(
        schema.clone(),
        columns.into_iter().map(|(_, array)| array).collect(),
    )
    .context("building record batch")?;

    let file = std::fs::File::create(path).context("creating output file")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating writer")?;
    writer.write(&batch).context("writing batch")?;
    writer.close().context("closing writer")?;
    Ok(())
}

fn strings<'a>(values: impl Iterator<Item = &'a str>) -> ArrayRef {
    Arc::new(StringArray::from(values.collect::<Vec<_>>()))
}

fn ints(values: impl Iterator<Item = i64>) -> ArrayRef {
    Arc::new(Int64Array::from(values.collect::<Vec<_>>()))
}

fn floats(values: impl Iterator<Item = f64>) -> ArrayRef {
    Arc::new(Float64Array::from(values.collect::<Vec<_>>()))
}

fn timestamps(values: impl Iterator<Item = NaiveDateTime>) -> Vec<String> {
    values.map(|t| t.format(TS_FORMAT).to_string()).collect()
}

fn write_parquet_pair(delays: &[DelayRow], accidents: &[AccidentRow], dir: &Path) -> Result<()> {
    let scheduled = timestamps(delays.iter().map(|d| d.scheduled));
    let actual = timestamps(delays.iter().map(|d| d.actual));

    write_parquet(
        &dir.join("sample_delays.parquet"),
        vec![
            ("Train Name", strings(delays.iter().map(|d| d.train))),
            ("Source", strings(delays.iter().map(|d| d.source))),
            ("Destination", strings(delays.iter().map(|d| d.destination))),
            ("Scheduled Arrival", strings(scheduled.iter().map(String::as_str))),
            ("Actual Arrival", strings(actual.iter().map(String::as_str))),
            ("Delay (Minutes)", ints(delays.iter().map(|d| d.delay))),
        ],
    )?;

    write_parquet(
        &dir.join("sample_accidents.parquet"),
        vec![
            ("Year", ints(accidents.iter().map(|a| a.year))),
            ("Train Name", strings(accidents.iter().map(|a| a.train))),
            ("Departure From", strings(accidents.iter().map(|a| a.from))),
            ("Going To", strings(accidents.iter().map(|a| a.to))),
            ("Accident Location", strings(accidents.iter().map(|a| a.location))),
            ("Latitude", floats(accidents.iter().map(|a| a.latitude))),
            ("Longitude", floats(accidents.iter().map(|a| a.longitude))),
            ("Severity", strings(accidents.iter().map(|a| a.severity))),
        ],
    )
}

/// Write deterministic synthetic delay and accident datasets.
#[derive(Parser)]
struct Args {
    /// Output directory
    #[arg(default_value = ".")]
    dir: PathBuf,

    /// Write .parquet instead of .csv
    #[arg(long, default_value_t = false)]
    parquet: bool,

    #[arg(long, default_value_t = 2_000)]
    delays: usize,

    #[arg(long, default_value_t = 120)]
    accidents: usize,

    #[arg(long, default_value_t = 42)]
    seed: u64,
}

fn main() -> Result<()> {
    env_logger::init();

    let Args {
        dir,
        parquet,
        delays,
        accidents,
        seed,
    } = Args::parse();

    let mut rng = SimpleRng::new(seed);
    let delays = delay_rows(&mut rng, delays)?;
    let accidents = accident_rows(&mut rng, accidents);

    if parquet {
        write_parquet_pair(&delays, &accidents, &dir)?;
    } else {
        write_csv(&delays, &accidents, &dir)?;
    }

    info!(
        "Wrote {} delay rows and {} accident rows to {}",
        delays.len(),
        accidents.len(),
        dir.display()
    );
    println!(
        "Wrote {} delay rows and {} accident rows ({}) to {}",
        delays.len(),
        accidents.len(),
        if parquet { "parquet" } else { "csv" },
        dir.display()
    );
    Ok(())
}
