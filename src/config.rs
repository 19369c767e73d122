use std::path::PathBuf;

use crate::data::aggregate::DEFAULT_TOP_N;

pub const DEFAULT_DATA_PATH: &str = "best_selling_switch_games.csv";

/// Startup settings. Each field can be overridden from the environment;
/// the first command-line argument wins over `SWITCH_DASHBOARD_DATA`.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Dataset opened at startup.
    pub data_path: PathBuf,
    /// Length of the best-sellers chart.
    pub top_n: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            top_n: DEFAULT_TOP_N,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_sources(
            std::env::args().nth(1),
            std::env::var("SWITCH_DASHBOARD_DATA").ok(),
            std::env::var("SWITCH_DASHBOARD_TOP_N").ok(),
        )
    }

    fn from_sources(arg: Option<String>, data_var: Option<String>, top_n_var: Option<String>) -> Self {
        let defaults = Self::default();
        let data_path = arg
            .or(data_var)
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.data_path);
        let top_n = match top_n_var.as_deref().map(str::trim).map(str::parse::<usize>) {
            Some(Ok(n)) if n >= 1 => n,
            Some(_) => {
                log::warn!("Ignoring SWITCH_DASHBOARD_TOP_N (must be a positive integer)");
                defaults.top_n
            }
            None => defaults.top_n,
        };
        Self { data_path, top_n }
    }
}
