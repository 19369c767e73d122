use serde::{Deserialize, Serialize};

use super::aggregate::{self, GroupTotal, TopTitles};
use super::kpi::{self, KpiBundle};
use super::model::{FilterColumn, GameTable};

/// Everything the dashboard shows for one filtered view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub rows: usize,
    pub kpis: KpiBundle,
    pub top_titles: TopTitles,
    pub by_developer: Vec<GroupTotal>,
    pub by_publisher: Vec<GroupTotal>,
}

impl DashboardSummary {
    pub fn compute(table: &GameTable, top_n: usize) -> Self {
        DashboardSummary {
            rows: table.len(),
            kpis: kpi::compute(table),
            top_titles: aggregate::top_titles(table, top_n),
            by_developer: aggregate::sum_by_group(table, FilterColumn::Developer),
            by_publisher: aggregate::sum_by_group(table, FilterColumn::Publisher),
        }
    }
}
