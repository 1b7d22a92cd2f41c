//! Roll-ups and rankings over the category hierarchy, domains and industries.
//!
//! Shares are parent-scoped at every level: a primary category's share is of
//! the sum of its siblings, a tag's share is of its parent's value.

use serde::{Deserialize, Serialize};

use crate::model::{DomainDistribution, IndustryDistribution};
use crate::normalize::percentage;
use crate::taxonomy::{PrimaryCategory, RiskDomain, SecondaryTag, Sector};
use crate::trend::{classify, TrendResult};

/// Anything ranked by a current count.
pub trait Valued {
    fn value(&self) -> u64;
}

impl<T> Valued for (T, u64) {
    fn value(&self) -> u64 {
        self.1
    }
}

/// Descending by value; equal values keep their input order.
pub fn sort_descending_by_value<T: Valued>(mut nodes: Vec<T>) -> Vec<T> {
    // slice::sort_by is stable
    nodes.sort_by(|a, b| b.value().cmp(&a.value()));
    nodes
}

/// First `n` after ranking; never padded.
pub fn top_n<T: Valued>(nodes: Vec<T>, n: usize) -> Vec<T> {
    let mut ranked = sort_descending_by_value(nodes);
    ranked.truncate(n);
    ranked
}

// =============================================================================
// Primary roll-up
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimaryCounts {
    #[serde(default)]
    pub technical: u64,
    #[serde(default)]
    pub operational: u64,
    #[serde(default)]
    pub business: u64,
}

impl PrimaryCounts {
    pub fn get(&self, category: PrimaryCategory) -> u64 {
        match category {
            PrimaryCategory::Technical => self.technical,
            PrimaryCategory::Operational => self.operational,
            PrimaryCategory::Business => self.business,
        }
    }

    fn add(&mut self, category: PrimaryCategory, n: u64) {
        match category {
            PrimaryCategory::Technical => self.technical += n,
            PrimaryCategory::Operational => self.operational += n,
            PrimaryCategory::Business => self.business += n,
        }
    }

    /// Every primary category, including zero ones.
    pub fn iter(&self) -> impl Iterator<Item = (PrimaryCategory, u64)> + '_ {
        PrimaryCategory::ALL.iter().map(move |c| (*c, self.get(*c)))
    }

    pub fn total(&self) -> u64 {
        self.technical + self.operational + self.business
    }
}

/// Sum each tag's count into its mapped primary category.
pub fn roll_up<M>(secondary: &[(SecondaryTag, u64)], mapping: M) -> PrimaryCounts
where
    M: Fn(SecondaryTag) -> PrimaryCategory,
{
    let mut out = PrimaryCounts::default();
    for (tag, n) in secondary {
        out.add(mapping(*tag), *n);
    }
    out
}

// =============================================================================
// Category tree
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChildTag {
    pub tag: SecondaryTag,
    pub label: &'static str,
    pub value: u64,
    /// Percent of the parent category's value
    pub share: f64,
    pub trend: Option<TrendResult>,
}

impl Valued for ChildTag {
    fn value(&self) -> u64 {
        self.value
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryNode {
    pub category: PrimaryCategory,
    pub name: &'static str,
    pub value: u64,
    pub color: &'static str,
    /// Percent of the sum of all primary siblings
    pub share: f64,
    pub trend: Option<TrendResult>,
    pub children: Vec<ChildTag>,
}

impl Valued for CategoryNode {
    fn value(&self) -> u64 {
        self.value
    }
}

/// Input row for one secondary tag. `trend` is whatever the comparison
/// reports for the tag; it is carried as is and never recomputed from
/// `current`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TagCount {
    pub tag: SecondaryTag,
    pub current: u64,
    pub trend: Option<TrendResult>,
}

/// Build the primary → tag tree, ranked at both levels.
///
/// Values and shares come from `current` and the tag counts. Node trends
/// come from `primary_trend`, so a distribution snapshot and a period
/// comparison can be combined without mixing their numbers.
pub fn category_tree<F>(
    current: &PrimaryCounts,
    primary_trend: F,
    tags: &[TagCount],
) -> Vec<CategoryNode>
where
    F: Fn(PrimaryCategory) -> Option<TrendResult>,
{
    let total = current.total();
    let nodes = current
        .iter()
        .map(|(category, value)| {
            let children = tags
                .iter()
                .filter(|t| t.tag.primary() == category)
                .map(|t| ChildTag {
                    tag: t.tag,
                    label: t.tag.label(),
                    value: t.current,
                    share: percentage(t.current as f64, value as f64),
                    trend: t.trend,
                })
                .collect();
            CategoryNode {
                category,
                name: category.label(),
                value,
                color: category.color(),
                share: percentage(value as f64, total as f64),
                trend: primary_trend(category),
                children: sort_descending_by_value(children),
            }
        })
        .collect();
    sort_descending_by_value(nodes)
}

// =============================================================================
// Domains
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DomainRow {
    pub domain: RiskDomain,
    pub label: &'static str,
    pub color: &'static str,
    pub count: u64,
    pub previous_count: Option<u64>,
    pub share: f64,
    pub trend: Option<TrendResult>,
}

impl Valued for DomainRow {
    fn value(&self) -> u64 {
        self.count
    }
}

/// All seven domains, zero ones included, ranked by count.
pub fn domain_rows(
    current: &DomainDistribution,
    previous: Option<&DomainDistribution>,
) -> Vec<DomainRow> {
    let total = current.total();
    let rows = current
        .iter()
        .map(|(domain, count)| {
            let previous_count = previous.map(|p| p.get(domain));
            DomainRow {
                domain,
                label: domain.label(),
                color: domain.color(),
                count,
                previous_count,
                share: percentage(count as f64, total as f64),
                trend: previous_count.map(|p| classify(count, p)),
            }
        })
        .collect();
    sort_descending_by_value(rows)
}

// =============================================================================
// Industries
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndustryEntry {
    pub sector: Sector,
    pub name: String,
    pub count: u64,
    /// Missing from the previous distribution reads as unchanged.
    pub previous_count: u64,
}

impl Valued for IndustryEntry {
    fn value(&self) -> u64 {
        self.count
    }
}

impl IndustryEntry {
    pub fn trend(&self) -> TrendResult {
        classify(self.count, self.previous_count)
    }
}

fn sector_entries(
    current: &IndustryDistribution,
    previous: Option<&IndustryDistribution>,
    sector: Sector,
) -> Vec<IndustryEntry> {
    current
        .sector(sector)
        .iter()
        .map(|(name, count)| IndustryEntry {
            sector,
            name: name.clone(),
            count: *count,
            previous_count: previous
                .and_then(|p| p.sector(sector).get(name).copied())
                .unwrap_or(*count),
        })
        .collect()
}

/// Top `limit` industries of one sector.
pub fn top_industries(
    current: &IndustryDistribution,
    previous: Option<&IndustryDistribution>,
    sector: Sector,
    limit: usize,
) -> Vec<IndustryEntry> {
    top_n(sector_entries(current, previous, sector), limit)
}

/// Local top-k per sector, then one global ranking over the union, so a
/// small sector is never crowded out entirely by a dominant one.
pub fn cross_sector_top_industries(
    distribution: &IndustryDistribution,
    per_sector_limit: usize,
) -> Vec<IndustryEntry> {
    let merged: Vec<IndustryEntry> = Sector::ALL
        .iter()
        .flat_map(|s| top_industries(distribution, None, *s, per_sector_limit))
        .collect();
    sort_descending_by_value(merged)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectorSummary {
    pub sector: Sector,
    pub label: &'static str,
    pub total: u64,
    pub previous_total: u64,
    /// Percent of all sectors combined
    pub share: f64,
    pub trend: TrendResult,
}

/// Per-sector totals in presentation order. Without a previous distribution
/// every sector reads as stable.
pub fn sector_summaries(
    current: &IndustryDistribution,
    previous: Option<&IndustryDistribution>,
) -> Vec<SectorSummary> {
    let grand_total = current.grand_total();
    Sector::ALL
        .iter()
        .map(|sector| {
            let total = current.sector_total(*sector);
            let previous_total = previous.map(|p| p.sector_total(*sector)).unwrap_or(total);
            SectorSummary {
                sector: *sector,
                label: sector.label(),
                total,
                previous_total,
                share: percentage(total as f64, grand_total as f64),
                trend: classify(total, previous_total),
            }
        })
        .collect()
}
