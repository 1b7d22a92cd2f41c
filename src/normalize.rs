use serde::Serialize;

use crate::taxonomy::{SeverityBucket, TaxonomyError};

/// Share of `value` in `total` as a percentage; 0 when `total <= 0`.
pub fn percentage(value: f64, total: f64) -> f64 {
    if total <= 0.0 {
        return 0.0;
    }
    (value / total) * 100.0
}

/// Round to one decimal place for display.
pub fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

/// Percentage share of each value in the sum of all values.
pub fn shares(values: &[u64]) -> Vec<f64> {
    let total: u64 = values.iter().sum();
    values
        .iter()
        .map(|v| percentage(*v as f64, total as f64))
        .collect()
}

/// Value as a percentage of the largest sibling (bar widths).
pub fn relative_to_max(value: u64, max: u64) -> f64 {
    percentage(value as f64, max as f64)
}

/// Collapse a 1..5 severity level into its bucket.
pub fn bucketize(level: u8) -> Result<SeverityBucket, TaxonomyError> {
    match level {
        1 | 2 => Ok(SeverityBucket::Low),
        3 => Ok(SeverityBucket::Medium),
        4 => Ok(SeverityBucket::High),
        5 => Ok(SeverityBucket::Critical),
        other => Err(TaxonomyError::new("severity level", other.to_string())),
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BucketCounts {
    pub low: u64,
    pub medium: u64,
    pub high: u64,
    pub critical: u64,
}

impl BucketCounts {
    pub fn get(&self, bucket: SeverityBucket) -> u64 {
        match bucket {
            SeverityBucket::Low => self.low,
            SeverityBucket::Medium => self.medium,
            SeverityBucket::High => self.high,
            SeverityBucket::Critical => self.critical,
        }
    }

    fn add(&mut self, bucket: SeverityBucket, n: u64) {
        match bucket {
            SeverityBucket::Low => self.low += n,
            SeverityBucket::Medium => self.medium += n,
            SeverityBucket::High => self.high += n,
            SeverityBucket::Critical => self.critical += n,
        }
    }

    pub fn total(&self) -> u64 {
        self.low + self.medium + self.high + self.critical
    }
}

/// Fold a level histogram into buckets. Levels outside 1..5 are returned
/// separately so the caller decides how loudly to reject them.
pub fn bucket_histogram<I>(levels: I) -> (BucketCounts, Vec<u8>)
where
    I: IntoIterator<Item = (u8, u64)>,
{
    let mut counts = BucketCounts::default();
    let mut rejected = Vec::new();
    for (level, n) in levels {
        match bucketize(level) {
            Ok(bucket) => counts.add(bucket, n),
            Err(_) => rejected.push(level),
        }
    }
    (counts, rejected)
}

// =============================================================================
// Heat intensity
// =============================================================================

/// Upper bounds (exclusive) of intensity bands 0..3; anything at or above
/// the last bound is band 4.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeatThresholds {
    bounds: [u64; 4],
}

impl Default for HeatThresholds {
    fn default() -> Self {
        Self { bounds: [15, 25, 35, 45] }
    }
}

impl HeatThresholds {
    /// Bounds are sorted so a misordered config still yields monotone bands.
    pub fn new(mut bounds: [u64; 4]) -> Self {
        bounds.sort_unstable();
        Self { bounds }
    }

    pub fn bounds(&self) -> [u64; 4] {
        self.bounds
    }

    pub fn intensity(&self, value: u64) -> u8 {
        self.bounds
            .iter()
            .position(|b| value < *b)
            .map(|i| i as u8)
            .unwrap_or(4)
    }
}

pub fn heat_intensity(value: u64, thresholds: &HeatThresholds) -> u8 {
    thresholds.intensity(value)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatSummary {
    pub intensities: Vec<[u8; 7]>,
    pub week_totals: Vec<u64>,
    pub max_week_total: u64,
    pub total: u64,
    pub avg_per_week: u64,
}

/// Weekly activity grid (oldest week first, Sunday..Saturday).
pub fn heat_grid(weeks: &[[u64; 7]], thresholds: &HeatThresholds) -> HeatSummary {
    let intensities = weeks
        .iter()
        .map(|week| {
            let mut row = [0u8; 7];
            for (cell, value) in row.iter_mut().zip(week.iter()) {
                *cell = thresholds.intensity(*value);
            }
            row
        })
        .collect();
    let week_totals: Vec<u64> = weeks.iter().map(|w| w.iter().sum()).collect();
    let total: u64 = week_totals.iter().sum();
    let avg_per_week = if weeks.is_empty() {
        0
    } else {
        (total as f64 / weeks.len() as f64).round() as u64
    };
    HeatSummary {
        intensities,
        max_week_total: week_totals.iter().copied().max().unwrap_or(0),
        week_totals,
        total,
        avg_per_week,
    }
}
