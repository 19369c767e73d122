use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

// ---------------------------------------------------------------------------
// FilterColumn – the categorical columns a user can filter and group by
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterColumn {
    Genre,
    Developer,
    Publisher,
}

impl FilterColumn {
    /// All filterable columns, in the order the sidebar applies them.
    pub const ALL: [FilterColumn; 3] = [
        FilterColumn::Genre,
        FilterColumn::Developer,
        FilterColumn::Publisher,
    ];

    /// Column name as it appears in the source file.
    pub fn name(self) -> &'static str {
        match self {
            FilterColumn::Genre => "genre",
            FilterColumn::Developer => "developer",
            FilterColumn::Publisher => "publisher",
        }
    }

    /// Human-readable label for widgets.
    pub fn label(self) -> &'static str {
        match self {
            FilterColumn::Genre => "Genre",
            FilterColumn::Developer => "Developer",
            FilterColumn::Publisher => "Publisher",
        }
    }

    /// Borrow this column's value out of a record.
    pub fn value_of(self, record: &GameRecord) -> &str {
        match self {
            FilterColumn::Genre => &record.genre,
            FilterColumn::Developer => &record.developer,
            FilterColumn::Publisher => &record.publisher,
        }
    }
}

impl fmt::Display for FilterColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unknown filter column '{0}' (expected genre, developer or publisher)")]
pub struct UnknownColumn(pub String);

impl FromStr for FilterColumn {
    type Err = UnknownColumn;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FilterColumn::ALL
            .into_iter()
            .find(|c| c.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownColumn(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// GameRecord – one row of the sales table
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameRecord {
    pub title: String,
    pub developer: String,
    pub publisher: String,
    pub genre: String,
    /// Lifetime copies sold; never negative.
    pub copies_sold: f64,
    pub release_date: NaiveDate,
    /// Snapshot date the sales figure was measured at.
    pub as_of: NaiveDate,
}

// ---------------------------------------------------------------------------
// GameTable – an immutable, fingerprinted collection of records
// ---------------------------------------------------------------------------

/// An ordered, read-only set of [`GameRecord`]s.
///
/// Tables are never mutated after construction; filtering builds a new one.
/// The fingerprint is a SHA-256 over the row contents, so two tables holding
/// the same rows in the same order share a fingerprint.
#[derive(Debug, Clone, PartialEq)]
pub struct GameTable {
    rows: Vec<GameRecord>,
    fingerprint: String,
}

impl GameTable {
    pub fn new(rows: Vec<GameRecord>) -> Self {
        let fingerprint = fingerprint_rows(&rows);
        GameTable { rows, fingerprint }
    }

    pub fn empty() -> Self {
        GameTable::new(Vec::new())
    }

    pub fn rows(&self) -> &[GameRecord] {
        &self.rows
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Sum of `copies_sold` over every row; `+0.0` for an empty table.
    pub fn total_copies(&self) -> f64 {
        // `Sum for f64` starts from -0.0, which would print as "-0.00M".
        self.rows.iter().fold(0.0, |acc, r| acc + r.copies_sold)
    }

    /// Distinct values of `column`, in order of first appearance.
    pub fn distinct(&self, column: FilterColumn) -> Vec<String> {
        let mut seen = HashSet::new();
        self.rows
            .iter()
            .map(|r| column.value_of(r))
            .filter(|v| seen.insert(*v))
            .map(str::to_string)
            .collect()
    }

    pub fn count_distinct_titles(&self) -> usize {
        self.rows
            .iter()
            .map(|r| r.title.as_str())
            .collect::<HashSet<_>>()
            .len()
    }

    pub fn count_distinct(&self, column: FilterColumn) -> usize {
        self.rows
            .iter()
            .map(|r| column.value_of(r))
            .collect::<HashSet<_>>()
            .len()
    }

    /// Earliest release date (default start of the sidebar date range).
    pub fn release_date_min(&self) -> Option<NaiveDate> {
        self.rows.iter().map(|r| r.release_date).min()
    }

    /// Latest snapshot date (default end of the sidebar date range).
    pub fn as_of_max(&self) -> Option<NaiveDate> {
        self.rows.iter().map(|r| r.as_of).max()
    }

    /// Build a derived table holding the rows that satisfy `keep`.
    pub fn retain_view(&self, mut keep: impl FnMut(&GameRecord) -> bool) -> GameTable {
        GameTable::new(self.rows.iter().filter(|r| keep(r)).cloned().collect())
    }
}

impl Default for GameTable {
    fn default() -> Self {
        GameTable::empty()
    }
}

const FIELD_SEP: &[u8] = &[0x1f];
const ROW_SEP: &[u8] = &[0x1e];

fn fingerprint_rows(rows: &[GameRecord]) -> String {
    let mut hasher = Sha256::new();
    for r in rows {
        for text in [&r.title, &r.developer, &r.publisher, &r.genre] {
            hasher.update(text.as_bytes());
            hasher.update(FIELD_SEP);
        }
        hasher.update(r.copies_sold.to_bits().to_le_bytes());
        hasher.update(r.release_date.num_days_from_ce().to_le_bytes());
        hasher.update(r.as_of.num_days_from_ce().to_le_bytes());
        hasher.update(ROW_SEP);
    }
    hex::encode(hasher.finalize())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    pub(crate) fn record(title: &str, developer: &str, publisher: &str, genre: &str, copies: f64) -> GameRecord {
        GameRecord {
            title: title.to_string(),
            developer: developer.to_string(),
            publisher: publisher.to_string(),
            genre: genre.to_string(),
            copies_sold: copies,
            release_date: date(2017, 3, 3),
            as_of: date(2023, 9, 30),
        }
    }

    /// A small table covering several genres, developers and publishers.
    pub(crate) fn sample_table() -> GameTable {
        GameTable::new(vec![
            record("Mario Kart 8 Deluxe", "Nintendo EPD", "Nintendo", "Kart racing", 57_460_000.0),
            record("Animal Crossing: New Horizons", "Nintendo EPD", "Nintendo", "Social simulation", 44_790_000.0),
            record("Super Smash Bros. Ultimate", "Bandai Namco Studios", "Nintendo", "Fighting", 33_290_000.0),
            record("Pokemon Sword and Shield", "Game Freak", "The Pokemon Company", "Role-playing", 26_020_000.0),
            record("Minecraft", "Mojang Studios", "Microsoft", "Sandbox", 15_000_000.0),
            record("Hollow Knight", "Team Cherry", "Team Cherry", "Metroidvania", 3_000_000.0),
        ])
    }

    #[test]
    fn distinct_keeps_first_appearance_order() {
        let t = sample_table();
        assert_eq!(
            t.distinct(FilterColumn::Publisher),
            vec!["Nintendo", "The Pokemon Company", "Microsoft", "Team Cherry"]
        );
        assert_eq!(t.count_distinct(FilterColumn::Developer), 5);
        assert_eq!(t.count_distinct_titles(), 6);
    }

    #[test]
    fn fingerprint_tracks_content() {
        let a = sample_table();
        let b = sample_table();
        assert_eq!(a.fingerprint(), b.fingerprint());

        let mut rows = a.rows().to_vec();
        rows[0].copies_sold += 1.0;
        let c = GameTable::new(rows);
        assert_ne!(a.fingerprint(), c.fingerprint());
        assert_ne!(a.fingerprint(), GameTable::empty().fingerprint());
    }

    #[test]
    fn empty_total_is_positive_zero() {
        let total = GameTable::empty().total_copies();
        assert_eq!(total, 0.0);
        assert!(total.is_sign_positive());
    }

    #[test]
    fn date_bounds() {
        let mut rows = sample_table().rows().to_vec();
        rows[2].release_date = date(2015, 1, 1);
        rows[4].as_of = date(2024, 2, 29);
        let t = GameTable::new(rows);
        assert_eq!(t.release_date_min(), Some(date(2015, 1, 1)));
        assert_eq!(t.as_of_max(), Some(date(2024, 2, 29)));
        assert_eq!(GameTable::empty().release_date_min(), None);
    }

    #[test]
    fn column_names_parse() {
        assert_eq!("Developer".parse::<FilterColumn>(), Ok(FilterColumn::Developer));
        assert_eq!(" genre ".parse::<FilterColumn>(), Ok(FilterColumn::Genre));
        assert!("title".parse::<FilterColumn>().is_err());
    }
}
