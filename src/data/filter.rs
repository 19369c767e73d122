use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::model::{FilterColumn, GameTable};

// ---------------------------------------------------------------------------
// Single-column filter
// ---------------------------------------------------------------------------

/// Keep the rows whose `column` value is in `allowed`.
///
/// An empty `allowed` set means "no restriction" and yields the table
/// unchanged. Values absent from the table simply match nothing.
pub fn apply(table: &GameTable, column: FilterColumn, allowed: &BTreeSet<String>) -> GameTable {
    if allowed.is_empty() {
        return table.clone();
    }
    table.retain_view(|r| allowed.contains(column.value_of(r)))
}

// ---------------------------------------------------------------------------
// Filter predicate: which values are selected per column
// ---------------------------------------------------------------------------

/// Per-column selection state: column → set of selected values.
/// If a column is absent or its set is empty it places no restriction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FilterSelection {
    selected: BTreeMap<FilterColumn, BTreeSet<String>>,
}

impl FilterSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the selection for `column`.
    pub fn set<I, S>(&mut self, column: FilterColumn, values: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values: BTreeSet<String> = values.into_iter().map(Into::into).collect();
        if values.is_empty() {
            self.selected.remove(&column);
        } else {
            self.selected.insert(column, values);
        }
    }

    /// Builder-style variant of [`FilterSelection::set`].
    #[cfg(test)]
    pub fn with<I, S>(mut self, column: FilterColumn, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.set(column, values);
        self
    }

    /// Flip a single value in or out of a column's selection.
    pub fn toggle(&mut self, column: FilterColumn, value: &str) {
        let selected = self.selected.entry(column).or_default();
        if !selected.remove(value) {
            selected.insert(value.to_string());
        }
        if selected.is_empty() {
            self.selected.remove(&column);
        }
    }

    pub fn clear(&mut self, column: FilterColumn) {
        self.selected.remove(&column);
    }

    pub fn is_selected(&self, column: FilterColumn, value: &str) -> bool {
        self.selected
            .get(&column)
            .is_some_and(|s| s.contains(value))
    }

    pub fn selected_count(&self, column: FilterColumn) -> usize {
        self.selected.get(&column).map_or(0, BTreeSet::len)
    }

    /// `true` when no column is restricted.
    pub fn is_empty(&self) -> bool {
        self.selected.values().all(BTreeSet::is_empty)
    }

    /// Apply every column filter in turn (logical AND across columns).
    pub fn apply(&self, table: &GameTable) -> GameTable {
        let mut view = table.clone();
        for column in FilterColumn::ALL {
            if let Some(allowed) = self.selected.get(&column) {
                view = apply(&view, column, allowed);
            }
        }
        view
    }
}

// ---------------------------------------------------------------------------
// Release-date window
// ---------------------------------------------------------------------------

/// Inclusive window on `release_date`. A window with `start > end` matches
/// no rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    pub fn apply(&self, table: &GameTable) -> GameTable {
        table.retain_view(|r| self.contains(r.release_date))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::tests::{date, sample_table};

    fn set(values: &[&str]) -> BTreeSet<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn empty_allowed_set_is_identity() {
        let t = sample_table();
        let out = apply(&t, FilterColumn::Genre, &BTreeSet::new());
        assert_eq!(out, t);
        assert_eq!(FilterSelection::new().apply(&t), t);
    }

    #[test]
    fn rows_satisfy_every_active_column() {
        let t = sample_table();
        let sel = FilterSelection::new()
            .with(FilterColumn::Publisher, ["Nintendo", "Microsoft"])
            .with(FilterColumn::Developer, ["Nintendo EPD", "Mojang Studios", "Game Freak"]);
        let out = sel.apply(&t);

        assert!(out.len() <= t.len());
        assert_eq!(out.len(), 3);
        for r in out.rows() {
            assert!(sel.is_selected(FilterColumn::Publisher, &r.publisher));
            assert!(sel.is_selected(FilterColumn::Developer, &r.developer));
        }
    }

    #[test]
    fn column_order_does_not_matter() {
        let t = sample_table();
        let genres = set(&["Kart racing", "Fighting", "Sandbox"]);
        let publishers = set(&["Nintendo"]);

        let a = apply(&apply(&t, FilterColumn::Genre, &genres), FilterColumn::Publisher, &publishers);
        let b = apply(&apply(&t, FilterColumn::Publisher, &publishers), FilterColumn::Genre, &genres);
        assert_eq!(a, b);
        assert_eq!(a.len(), 2);
    }

    #[test]
    fn unknown_values_match_nothing() {
        let t = sample_table();
        let out = apply(&t, FilterColumn::Developer, &set(&["Dev2"]));
        assert!(out.is_empty());
    }

    #[test]
    fn toggle_adds_and_removes() {
        let mut sel = FilterSelection::new();
        sel.toggle(FilterColumn::Genre, "Fighting");
        assert!(sel.is_selected(FilterColumn::Genre, "Fighting"));
        assert_eq!(sel.selected_count(FilterColumn::Genre), 1);

        sel.toggle(FilterColumn::Genre, "Fighting");
        assert!(sel.is_empty());
        // Fully deselected columns drop out so equal selections hash equally.
        assert_eq!(sel, FilterSelection::new());
    }

    #[test]
    fn date_range_is_inclusive() {
        let mut rows = sample_table().rows().to_vec();
        rows[0].release_date = date(2017, 4, 28);
        rows[1].release_date = date(2020, 3, 20);
        rows[2].release_date = date(2018, 12, 7);
        let t = GameTable::new(rows);

        let range = DateRange { start: date(2018, 12, 7), end: date(2020, 3, 20) };
        let out = range.apply(&t);
        let titles: Vec<_> = out.rows().iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, ["Animal Crossing: New Horizons", "Super Smash Bros. Ultimate"]);

        let inverted = DateRange { start: date(2021, 1, 1), end: date(2020, 1, 1) };
        assert!(inverted.apply(&t).is_empty());
    }
}
