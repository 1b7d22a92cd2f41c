//! Period-over-period change classification.
//!
//! `trend` depends only on the sign of the change. Whether that direction is
//! good news is a separate `Polarity`, derived once here from the metric's
//! `Orientation`.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::normalize::round1;

/// Raw counts for one metric in the current and the reference period.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricPoint {
    #[serde(default)]
    pub current: u64,
    #[serde(default)]
    pub previous: u64,
}

impl MetricPoint {
    pub fn new(current: u64, previous: u64) -> Self {
        Self { current, previous }
    }

    pub fn classify(&self) -> TrendResult {
        classify(self.current, self.previous)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    Stable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Polarity {
    Positive,
    Negative,
    Neutral,
}

/// Which direction counts as favourable for a metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    #[default]
    HigherIsBetter,
    /// Risk counts, error queues: a rise is bad news.
    LowerIsBetter,
}

impl Orientation {
    pub fn inverted(inverted: bool) -> Self {
        if inverted {
            Orientation::LowerIsBetter
        } else {
            Orientation::HigherIsBetter
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendResult {
    pub current: u64,
    pub previous: u64,
    pub change: i64,
    /// One decimal; 0.0 when the percent is undefined (see `percent_defined`).
    pub change_percent: f64,
    pub trend: Trend,
    /// False when `previous == 0` and `change != 0`.
    pub percent_defined: bool,
}

impl TrendResult {
    pub fn polarity(&self, orientation: Orientation) -> Polarity {
        match (self.trend, orientation) {
            (Trend::Stable, _) => Polarity::Neutral,
            (Trend::Up, Orientation::HigherIsBetter) | (Trend::Down, Orientation::LowerIsBetter) => {
                Polarity::Positive
            }
            (Trend::Up, Orientation::LowerIsBetter) | (Trend::Down, Orientation::HigherIsBetter) => {
                Polarity::Negative
            }
        }
    }

    /// `+13.1%`, `-4.3%`, `0.0%`, or `N/A`.
    pub fn display_percent(&self) -> String {
        if !self.percent_defined {
            return "N/A".to_string();
        }
        if self.change_percent > 0.0 {
            format!("+{:.1}%", self.change_percent)
        } else {
            format!("{:.1}%", self.change_percent)
        }
    }

    /// `+247 (13.1%)`, or `-` when nothing changed.
    pub fn display_change(&self) -> String {
        if self.change == 0 {
            return "-".to_string();
        }
        let sign = if self.change > 0 { "+" } else { "" };
        let percent = if self.percent_defined {
            format!("{:.1}%", self.change_percent)
        } else {
            "N/A".to_string()
        };
        format!("{}{} ({})", sign, self.change, percent)
    }
}

/// Trend and its judgement for one metric.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Assessment {
    pub result: TrendResult,
    pub polarity: Polarity,
}

/// `change` saturates at the `i64` bounds; trend and percent use the exact
/// difference.
pub fn classify(current: u64, previous: u64) -> TrendResult {
    let diff = i128::from(current) - i128::from(previous);
    let change = i64::try_from(diff).unwrap_or(if diff > 0 { i64::MAX } else { i64::MIN });
    let trend = match current.cmp(&previous) {
        Ordering::Greater => Trend::Up,
        Ordering::Less => Trend::Down,
        Ordering::Equal => Trend::Stable,
    };
    let (change_percent, percent_defined) = if previous == 0 {
        (0.0, current == 0)
    } else {
        (round1(diff as f64 / previous as f64 * 100.0), true)
    };
    TrendResult { current, previous, change, change_percent, trend, percent_defined }
}

pub fn assess(current: u64, previous: u64, orientation: Orientation) -> Assessment {
    let result = classify(current, previous);
    Assessment { polarity: result.polarity(orientation), result }
}
