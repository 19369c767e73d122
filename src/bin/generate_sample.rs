use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Date32Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use arrow::util::pretty::pretty_format_batches;
use chrono::NaiveDate;
use parquet::arrow::ArrowWriter;

/// (title, developer, publisher, genre, base copies, release date)
type Entry = (&'static str, &'static str, &'static str, &'static str, i64, &'static str);

const CATALOGUE: &[Entry] = &[
    ("Mario Kart 8 Deluxe", "Nintendo EPD", "Nintendo", "Kart racing", 57_000_000, "2017-04-28"),
    ("Animal Crossing: New Horizons", "Nintendo EPD", "Nintendo", "Social simulation", 44_000_000, "2020-03-20"),
    ("Super Smash Bros. Ultimate", "Bandai Namco Studios", "Nintendo", "Fighting", 33_000_000, "2018-12-07"),
    ("The Legend of Zelda: Breath of the Wild", "Nintendo EPD", "Nintendo", "Action-adventure", 31_000_000, "2017-03-03"),
    ("Pokemon Sword and Shield", "Game Freak", "The Pokemon Company", "Role-playing", 26_000_000, "2019-11-15"),
    ("Super Mario Odyssey", "Nintendo EPD", "Nintendo", "Platformer", 27_000_000, "2017-10-27"),
    ("Pokemon Scarlet and Violet", "Game Freak", "The Pokemon Company", "Role-playing", 23_000_000, "2022-11-18"),
    ("Super Mario Party", "NDcube", "Nintendo", "Party", 19_000_000, "2018-10-05"),
    ("Ring Fit Adventure", "Nintendo EPD", "Nintendo", "Exergaming", 15_000_000, "2019-10-18"),
    ("Minecraft", "Mojang Studios", "Microsoft", "Sandbox", 15_000_000, "2018-06-21"),
    ("Splatoon 2", "Nintendo EPD", "Nintendo", "Third-person shooter", 13_000_000, "2017-07-21"),
    ("Luigi's Mansion 3", "Next Level Games", "Nintendo", "Action-adventure", 13_000_000, "2019-10-31"),
    ("Pokemon Legends: Arceus", "Game Freak", "The Pokemon Company", "Action role-playing", 14_000_000, "2022-01-28"),
    ("Mario Party Superstars", "NDcube", "Nintendo", "Party", 10_000_000, "2021-10-29"),
    ("Kirby and the Forgotten Land", "HAL Laboratory", "Nintendo", "Platformer", 6_000_000, "2022-03-25"),
    ("Xenoblade Chronicles 2", "Monolith Soft", "Nintendo", "Action role-playing", 2_000_000, "2017-12-01"),
    ("Hollow Knight", "Team Cherry", "Team Cherry", "Metroidvania", 3_000_000, "2018-06-12"),
    ("Stardew Valley", "ConcernedApe", "ConcernedApe", "Simulation", 4_000_000, "2017-10-05"),
    ("Octopath Traveler", "Square Enix", "Square Enix", "Role-playing", 3_000_000, "2018-07-13"),
    ("Monster Hunter Rise", "Capcom", "Capcom", "Action role-playing", 11_000_000, "2021-03-26"),
];

const AS_OF: &str = "2023-09-30";

/// Seeded splitmix64 stream; the sample only needs reproducible noise.
struct Jitter(u64);

impl Jitter {
    fn unit(&mut self) -> f64 {
        self.0 = self.0.wrapping_add(0x9e37_79b9_7f4a_7c15);
        let mut z = self.0;
        z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
        ((z ^ (z >> 31)) >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Scale `base` by a factor in [1 - spread, 1 + spread], rounded to 10k.
    fn apply(&mut self, base: i64, spread: f64) -> i64 {
        let factor = 1.0 + spread * (2.0 * self.unit() - 1.0);
        ((base as f64 * factor) / 10_000.0).round() as i64 * 10_000
    }
}

fn days_since_epoch(date: &str) -> Result<i32> {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).context("epoch")?;
    let d = NaiveDate::parse_from_str(date, "%Y-%m-%d").with_context(|| format!("bad date {date}"))?;
    i32::try_from((d - epoch).num_days()).context("date out of range")
}

fn main() -> Result<()> {
    let mut jitter = Jitter(42);
    let copies: Vec<i64> = CATALOGUE
        .iter()
        .map(|&(_, _, _, _, base, _)| jitter.apply(base, 0.05))
        .collect();

    // ---- CSV, in the column order of the public dataset ----
    let csv_path = "best_selling_switch_games.csv";
    let mut writer = csv::Writer::from_path(csv_path).context("creating CSV")?;
    writer.write_record(["title", "copies_sold", "genre", "developer", "publisher", "as_of", "release_date"])?;
    for (&(title, developer, publisher, genre, _, release), sold) in CATALOGUE.iter().zip(&copies) {
        let sold = sold.to_string();
        writer.write_record([title, sold.as_str(), genre, developer, publisher, AS_OF, release])?;
    }
    writer.flush()?;

    // ---- Parquet, with typed date columns ----
    let column = |pick: fn(&Entry) -> &'static str| -> ArrayRef {
        Arc::new(StringArray::from(CATALOGUE.iter().map(pick).collect::<Vec<_>>()))
    };
    let release_days = CATALOGUE
        .iter()
        .map(|&(_, _, _, _, _, release)| days_since_epoch(release))
        .collect::<Result<Vec<_>>>()?;
    let as_of_days = vec![days_since_epoch(AS_OF)?; CATALOGUE.len()];

    let schema = Arc::new(Schema::new(vec![
        Field::new("title", DataType::Utf8, false),
        Field::new("developer", DataType::Utf8, false),
        Field::new("publisher", DataType::Utf8, false),
        Field::new("genre", DataType::Utf8, false),
        Field::new("copies_sold", DataType::Int64, false),
        Field::new("release_date", DataType::Date32, false),
        Field::new("as_of", DataType::Date32, false),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            column(|r| r.0),
            column(|r| r.1),
            column(|r| r.2),
            column(|r| r.3),
            Arc::new(Int64Array::from(copies)),
            Arc::new(Date32Array::from(release_days)),
            Arc::new(Date32Array::from(as_of_days)),
        ],
    )
    .context("building record batch")?;

    let parquet_path = "best_selling_switch_games.parquet";
    let file = std::fs::File::create(parquet_path).context("creating parquet file")?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;

    println!("{}", pretty_format_batches(&[batch.slice(0, 5)])?);
    println!(
        "Wrote {} games to {csv_path} and {parquet_path}",
        CATALOGUE.len()
    );
    Ok(())
}
