//! Current-vs-reference period snapshot.
//!
//! A `TimePeriodComparison` is built whole from a trend payload or not at
//! all: a payload missing any required section is rejected and the caller
//! keeps its previous snapshot.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::aggregate::{roll_up, Valued};
use crate::logging::log_unknown_label;
use crate::taxonomy::{primary_category_of, PrimaryCategory, SecondaryTag, SeverityBucket, TaxonomyError};
use crate::trend::{classify, MetricPoint, TrendResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Week,
    Month,
}

impl Period {
    pub const ALL: [Period; 2] = [Period::Week, Period::Month];

    pub fn as_str(&self) -> &'static str {
        match self {
            Period::Week => "week",
            Period::Month => "month",
        }
    }
}

impl FromStr for Period {
    type Err = TaxonomyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "week" => Ok(Period::Week),
            "month" => Ok(Period::Month),
            other => Err(TaxonomyError::new("period", other)),
        }
    }
}

// =============================================================================
// Snapshot
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeverityTrends {
    pub low: TrendResult,
    pub medium: TrendResult,
    pub high: TrendResult,
    pub critical: TrendResult,
}

impl SeverityTrends {
    pub fn get(&self, bucket: SeverityBucket) -> &TrendResult {
        match bucket {
            SeverityBucket::Low => &self.low,
            SeverityBucket::Medium => &self.medium,
            SeverityBucket::High => &self.high,
            SeverityBucket::Critical => &self.critical,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTrend {
    pub category: SecondaryTag,
    pub label: &'static str,
    #[serde(flatten)]
    pub trend: TrendResult,
}

impl Valued for CategoryTrend {
    fn value(&self) -> u64 {
        self.trend.current
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PrimaryTrends {
    pub technical: TrendResult,
    pub operational: TrendResult,
    pub business: TrendResult,
}

impl PrimaryTrends {
    pub fn get(&self, category: PrimaryCategory) -> &TrendResult {
        match category {
            PrimaryCategory::Technical => &self.technical,
            PrimaryCategory::Operational => &self.operational,
            PrimaryCategory::Business => &self.business,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimePeriodComparison {
    pub period: Period,
    pub severity: SeverityTrends,
    pub categories: Vec<CategoryTrend>,
    pub primary_categories: PrimaryTrends,
    pub overall: TrendResult,
}

impl TimePeriodComparison {
    pub fn category(&self, tag: SecondaryTag) -> Option<&CategoryTrend> {
        self.categories.iter().find(|c| c.category == tag)
    }
}

// =============================================================================
// Wire payload
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityPoints {
    #[serde(default)]
    pub low: MetricPoint,
    #[serde(default)]
    pub medium: MetricPoint,
    #[serde(default)]
    pub high: MetricPoint,
    #[serde(default)]
    pub critical: MetricPoint,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimaryPoints {
    #[serde(default)]
    pub technical: MetricPoint,
    #[serde(default)]
    pub operational: MetricPoint,
    #[serde(default)]
    pub business: MetricPoint,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryPoint {
    pub category: String,
    #[serde(flatten)]
    pub point: MetricPoint,
}

/// `GET /dashboard/trends?period=...` as sent. Derived fields
/// (`change`, `changePercent`, `trend`) are ignored and recomputed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendPayload {
    #[serde(default)]
    pub period: Option<String>,
    #[serde(default)]
    pub severity: Option<SeverityPoints>,
    #[serde(default)]
    pub categories: Option<Vec<CategoryPoint>>,
    #[serde(default)]
    pub primary_categories: Option<PrimaryPoints>,
    #[serde(default)]
    pub overall: Option<MetricPoint>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssembleError {
    MissingSection(&'static str),
}

impl fmt::Display for AssembleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssembleError::MissingSection(s) => write!(f, "trend payload missing section: {}", s),
        }
    }
}

impl std::error::Error for AssembleError {}

/// Known tag points in payload order; unknown and repeated tags are dropped.
fn tag_points(points: &[CategoryPoint]) -> Vec<(SecondaryTag, MetricPoint)> {
    let mut out: Vec<(SecondaryTag, MetricPoint)> = Vec::with_capacity(points.len());
    for p in points {
        match p.category.parse::<SecondaryTag>() {
            Ok(tag) if out.iter().all(|(t, _)| *t != tag) => out.push((tag, p.point)),
            Ok(_) => {}
            Err(_) => log_unknown_label("secondary tag", &p.category),
        }
    }
    out
}

fn derive_primary(tags: &[(SecondaryTag, MetricPoint)]) -> PrimaryPoints {
    let current: Vec<(SecondaryTag, u64)> = tags.iter().map(|(t, p)| (*t, p.current)).collect();
    let previous: Vec<(SecondaryTag, u64)> = tags.iter().map(|(t, p)| (*t, p.previous)).collect();
    let cur = roll_up(&current, primary_category_of);
    let prev = roll_up(&previous, primary_category_of);
    PrimaryPoints {
        technical: MetricPoint::new(cur.technical, prev.technical),
        operational: MetricPoint::new(cur.operational, prev.operational),
        business: MetricPoint::new(cur.business, prev.business),
    }
}

/// Classify every constituent of a snapshot from raw points.
pub fn from_points(
    period: Period,
    severity: &SeverityPoints,
    tags: &[(SecondaryTag, MetricPoint)],
    primary: &PrimaryPoints,
    overall: &MetricPoint,
) -> TimePeriodComparison {
    TimePeriodComparison {
        period,
        severity: SeverityTrends {
            low: severity.low.classify(),
            medium: severity.medium.classify(),
            high: severity.high.classify(),
            critical: severity.critical.classify(),
        },
        categories: tags
            .iter()
            .map(|(tag, p)| CategoryTrend {
                category: *tag,
                label: tag.label(),
                trend: classify(p.current, p.previous),
            })
            .collect(),
        primary_categories: PrimaryTrends {
            technical: primary.technical.classify(),
            operational: primary.operational.classify(),
            business: primary.business.classify(),
        },
        overall: overall.classify(),
    }
}

/// Build a snapshot for `period`, or reject the payload as incomplete.
/// The requested period wins over whatever the payload echoes back.
pub fn assemble(period: Period, payload: &TrendPayload) -> Result<TimePeriodComparison, AssembleError> {
    let severity = payload
        .severity
        .as_ref()
        .ok_or(AssembleError::MissingSection("severity"))?;
    let categories = payload
        .categories
        .as_ref()
        .ok_or(AssembleError::MissingSection("categories"))?;
    let overall = payload
        .overall
        .as_ref()
        .ok_or(AssembleError::MissingSection("overall"))?;

    let tags = tag_points(categories);
    let primary = payload
        .primary_categories
        .unwrap_or_else(|| derive_primary(&tags));
    Ok(from_points(period, severity, &tags, &primary, overall))
}

/// Stale: showing a sample or last accepted snapshot after a failed cycle.
/// Fresh: the latest cycle's snapshot was accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Freshness {
    Stale,
    Fresh,
}
