use serde::{Deserialize, Serialize};

use super::model::{FilterColumn, GameTable};

/// Display labels, in the order [`KpiBundle::metrics`] yields values.
pub const KPI_LABELS: [&str; 4] = [
    "Total Sales",
    "Total Games",
    "Unique Developers",
    "Average Sales Per Developer",
];

/// The four headline numbers of a table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiBundle {
    /// Sum of `copies_sold`.
    pub total_sales: f64,
    pub total_games: usize,
    pub unique_developers: usize,
    /// `total_sales / unique_developers`, or 0 for an empty table.
    pub average_sales_per_developer: f64,
}

impl KpiBundle {
    /// Total sales in millions, e.g. `"1.00M"`.
    pub fn total_sales_display(&self) -> String {
        format!("{:.2}M", self.total_sales / 1_000_000.0)
    }

    /// Average per developer in thousands, e.g. `"1000.00K"`.
    pub fn average_sales_display(&self) -> String {
        format!("{:.2}K", self.average_sales_per_developer / 1_000.0)
    }

    /// `(label, formatted value)` pairs for the metric widgets.
    pub fn metrics(&self) -> [(&'static str, String); 4] {
        [
            (KPI_LABELS[0], self.total_sales_display()),
            (KPI_LABELS[1], self.total_games.to_string()),
            (KPI_LABELS[2], self.unique_developers.to_string()),
            (KPI_LABELS[3], self.average_sales_display()),
        ]
    }
}

pub fn compute(table: &GameTable) -> KpiBundle {
    let total_sales = table.total_copies();
    let unique_developers = table.count_distinct(FilterColumn::Developer);
    let average_sales_per_developer = if unique_developers == 0 {
        0.0
    } else {
        total_sales / unique_developers as f64
    };

    KpiBundle {
        total_sales,
        total_games: table.count_distinct_titles(),
        unique_developers,
        average_sales_per_developer,
    }
}
