use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use super::model::{FilterColumn, GameTable};

/// Default length of the best-sellers chart.
pub const DEFAULT_TOP_N: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TitleTotal {
    pub title: String,
    pub copies_sold: f64,
}

/// Best-selling titles of a table, highest first.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TopTitles {
    pub ranked: Vec<TitleTotal>,
    /// Leader's copies over the total of the same table; 0 when empty.
    pub leader_share: f64,
}

impl TopTitles {
    pub fn leader(&self) -> Option<&TitleTotal> {
        self.ranked.first()
    }

    /// "`<title>` makes up `<p>`% of total sales", if there is a leader.
    pub fn headline(&self) -> Option<String> {
        self.leader().map(|top| {
            format!(
                "{} makes up {:.0}% of total sales",
                top.title,
                self.leader_share * 100.0
            )
        })
    }
}

/// Sum `copies_sold` per title and keep the `n` largest.
///
/// Ties keep the order in which titles first appear in the table.
pub fn top_titles(table: &GameTable, n: usize) -> TopTitles {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut totals: Vec<TitleTotal> = Vec::new();

    for r in table.rows() {
        match index.get(r.title.as_str()) {
            Some(&i) => totals[i].copies_sold += r.copies_sold,
            None => {
                index.insert(&r.title, totals.len());
                totals.push(TitleTotal {
                    title: r.title.clone(),
                    copies_sold: r.copies_sold,
                });
            }
        }
    }

    // `sort_by` is stable, which is what keeps ties in appearance order.
    totals.sort_by(|a, b| b.copies_sold.total_cmp(&a.copies_sold));
    totals.truncate(n);

    let total = table.total_copies();
    let leader_share = match totals.first() {
        Some(top) if total > 0.0 => top.copies_sold / total,
        _ => 0.0,
    };

    TopTitles {
        ranked: totals,
        leader_share,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupTotal {
    pub group: String,
    pub copies_sold: f64,
}

/// One row per distinct `column` value with its summed copies, sorted by
/// group name.
pub fn sum_by_group(table: &GameTable, column: FilterColumn) -> Vec<GroupTotal> {
    let mut groups: BTreeMap<&str, f64> = BTreeMap::new();
    for r in table.rows() {
        *groups.entry(column.value_of(r)).or_default() += r.copies_sold;
    }
    groups
        .into_iter()
        .map(|(group, copies_sold)| GroupTotal {
            group: group.to_string(),
            copies_sold,
        })
        .collect()
}
