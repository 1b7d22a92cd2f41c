//! Derived dashboard digest: everything the overview shows, computed from the
//! current family states in one pass.

use serde::Serialize;

use crate::acquisition::Acquisition;
use crate::acquisition::samples;
use crate::aggregate::{
    category_tree, cross_sector_top_industries, domain_rows, sector_summaries, top_n,
    CategoryNode, DomainRow, SectorSummary, TagCount,
};
use crate::compare::{Freshness, Period, TimePeriodComparison};
use crate::config::Config;
use crate::logging::ts_now;
use crate::model::{
    ConfidenceMetrics, DashboardSummary, IndustryDistribution, JobsSummary,
    RiskCategoryDistribution, SummaryTotals,
};
use crate::normalize::{heat_grid, percentage, relative_to_max, HeatSummary};
use crate::taxonomy::{SecondaryTag, SeverityBucket, Sector, TaxonomyLabel};
use crate::trend::TrendResult;

const TOP_LABELS: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeverityRow {
    pub bucket: SeverityBucket,
    pub color: &'static str,
    pub count: u64,
    pub share: f64,
    pub trend: TrendResult,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedLabel {
    pub key: String,
    pub label: String,
    pub count: u64,
    /// Percent of the largest entry
    pub bar: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedIndustry {
    pub sector: Sector,
    pub name: String,
    pub count: u64,
    pub bar: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardDigest {
    pub generated_at: String,
    pub period: Period,
    pub freshness: Freshness,
    pub using_fallback: bool,
    pub totals: SummaryTotals,
    pub overall: TrendResult,
    pub overall_display: String,
    pub severity: Vec<SeverityRow>,
    pub categories: Vec<CategoryNode>,
    pub domains: Vec<DomainRow>,
    pub sectors: Vec<SectorSummary>,
    pub top_industries: Vec<RankedIndustry>,
    pub top_labels: Vec<RankedLabel>,
    pub top_tags: Vec<RankedLabel>,
    pub job_success_rate: f64,
    pub confidence: ConfidenceMetrics,
    pub activity: HeatSummary,
}

/// Borrowed inputs for one digest.
pub struct DigestInputs<'a> {
    pub summary: &'a DashboardSummary,
    pub jobs: &'a JobsSummary,
    pub categories: &'a RiskCategoryDistribution,
    pub industries: &'a IndustryDistribution,
    pub confidence: &'a ConfidenceMetrics,
    pub comparison: &'a TimePeriodComparison,
    /// Daily counts, oldest week first
    pub activity: &'a [[u64; 7]],
}

fn ranked(pairs: &[(String, u64)], display: impl Fn(&str) -> String) -> Vec<RankedLabel> {
    let top = top_n(pairs.to_vec(), TOP_LABELS);
    let max = top.first().map(|(_, n)| *n).unwrap_or(0);
    top.into_iter()
        .map(|(key, count)| RankedLabel {
            label: display(&key),
            key,
            count,
            bar: relative_to_max(count, max),
        })
        .collect()
}

fn label_display(key: &str) -> String {
    key.parse::<TaxonomyLabel>()
        .map(|l| l.label().to_string())
        .unwrap_or_else(|_| key.to_string())
}

fn tag_display(key: &str) -> String {
    key.parse::<SecondaryTag>()
        .map(|t| t.label().to_string())
        .unwrap_or_else(|_| key.to_string())
}

pub fn build_digest(
    inputs: &DigestInputs<'_>,
    freshness: Freshness,
    using_fallback: bool,
    cfg: &Config,
) -> DashboardDigest {
    let cmp = inputs.comparison;

    let buckets = inputs.jobs.severity_buckets();
    let severity = SeverityBucket::ALL
        .iter()
        .map(|b| SeverityRow {
            bucket: *b,
            color: b.color(),
            count: buckets.get(*b),
            share: percentage(buckets.get(*b) as f64, buckets.total() as f64),
            trend: *cmp.severity.get(*b),
        })
        .collect();

    // Counts and shares come from the distribution, trends only from the comparison
    let tags: Vec<TagCount> = inputs
        .categories
        .secondary_counts()
        .into_iter()
        .map(|(tag, current)| TagCount {
            tag,
            current,
            trend: cmp.category(tag).map(|c| c.trend),
        })
        .collect();
    let categories = category_tree(
        &inputs.categories.primary,
        |c| Some(*cmp.primary_categories.get(c)),
        &tags,
    );

    let industries = cross_sector_top_industries(inputs.industries, cfg.top_industries_per_sector);
    let max_industry = industries.first().map(|e| e.count).unwrap_or(0);
    let top_industries = industries
        .into_iter()
        .map(|e| RankedIndustry {
            bar: relative_to_max(e.count, max_industry),
            sector: e.sector,
            name: e.name,
            count: e.count,
        })
        .collect();

    DashboardDigest {
        generated_at: ts_now(),
        period: cmp.period,
        freshness,
        using_fallback,
        totals: inputs.summary.totals.clone(),
        overall: cmp.overall,
        overall_display: cmp.overall.display_change(),
        severity,
        categories,
        domains: domain_rows(&inputs.categories.domain_distribution(), None),
        sectors: sector_summaries(inputs.industries, None),
        top_industries,
        top_labels: ranked(&inputs.summary.top_taxonomy_labels, label_display),
        top_tags: ranked(&inputs.summary.top_tags, tag_display),
        job_success_rate: inputs.jobs.success_rate,
        confidence: inputs.confidence.clone(),
        activity: heat_grid(inputs.activity, &cfg.heat()),
    }
}

/// Digest of whatever the families currently hold, for `period`.
pub fn digest(acq: &Acquisition, period: Period, cfg: &Config) -> DashboardDigest {
    let summary = acq.summary.snapshot();
    let jobs = acq.jobs_summary.snapshot();
    let categories = acq.risk_categories.snapshot();
    let industries = acq.industries.snapshot();
    let confidence = acq.confidence.snapshot();
    let comparison = acq.comparison(period).snapshot();
    let activity = samples::weekly_activity().value;
    let inputs = DigestInputs {
        summary: &summary.value,
        jobs: &jobs.value,
        categories: &categories.value,
        industries: &industries.value,
        confidence: &confidence.value,
        comparison: &comparison.value,
        activity: &activity,
    };
    build_digest(&inputs, comparison.freshness(), acq.is_using_fallback(), cfg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::PrimaryCounts;
    use crate::compare::{from_points, PrimaryPoints, SeverityPoints};
    use crate::taxonomy::PrimaryCategory;
    use crate::trend::{MetricPoint, Trend};

    fn sample_digest() -> DashboardDigest {
        sample_digest_with(&Config::default())
    }

    fn sample_digest_with(cfg: &Config) -> DashboardDigest {
        let summary = samples::dashboard_summary().value;
        let jobs = samples::jobs_summary().value;
        let categories = samples::risk_categories().value;
        let industries = samples::industries().value;
        let confidence = samples::confidence().value;
        let comparison = samples::comparison(Period::Week).value;
        let activity = samples::weekly_activity().value;
        let inputs = DigestInputs {
            summary: &summary,
            jobs: &jobs,
            categories: &categories,
            industries: &industries,
            confidence: &confidence,
            comparison: &comparison,
            activity: &activity,
        };
        build_digest(&inputs, Freshness::Stale, true, cfg)
    }

    #[test]
    fn test_severity_rows() {
        let d = sample_digest();
        assert_eq!(d.severity.len(), 4);
        // levels 1+2 collapse into low
        assert_eq!(d.severity[0].count, 2139);
        assert_eq!(d.severity[3].bucket, SeverityBucket::Critical);
        assert_eq!(d.severity[3].trend.trend, Trend::Down);
        let shares: f64 = d.severity.iter().map(|r| r.share).sum();
        assert!((shares - 100.0).abs() < 0.5);
    }

    #[test]
    fn test_category_tree_carries_trends() {
        let d = sample_digest();
        assert_eq!(d.categories[0].category, PrimaryCategory::Technical);
        assert_eq!(d.categories[0].children[0].tag, SecondaryTag::SecurityRisk);
        assert_eq!(d.categories[0].children[0].trend.unwrap().trend, Trend::Up);
        assert_eq!(d.categories[2].trend.unwrap().trend, Trend::Stable);
    }

    #[test]
    fn test_rankings() {
        let d = sample_digest();
        assert_eq!(d.top_industries.len(), 12);
        assert_eq!(d.top_industries[0].name, "Healthcare");
        assert_eq!(d.top_industries[0].bar, 100.0);
        assert_eq!(d.top_labels[0].label, TaxonomyLabel::CybersecurityVulnerability.label());
        assert_eq!(d.top_tags[0].label, "Security Risk");
        assert_eq!(d.domains.len(), 7);
        assert_eq!(d.overall_display, "+90 (2.4%)");
    }

    #[test]
    fn test_category_trends_come_only_from_comparison() {
        // all-time distribution far larger than the period's counts
        let mut categories = RiskCategoryDistribution::default();
        categories.primary = PrimaryCounts { technical: 5000, operational: 0, business: 0 };
        categories.secondary.insert("security_risk".to_string(), 4000);
        categories.secondary.insert("privacy_risk".to_string(), 1000);

        let zero = MetricPoint::new(0, 0);
        let severity = SeverityPoints { low: zero, medium: zero, high: zero, critical: zero };
        let primary = PrimaryPoints {
            technical: MetricPoint::new(200, 100),
            operational: zero,
            business: zero,
        };
        let comparison = from_points(
            Period::Month,
            &severity,
            &[(SecondaryTag::SecurityRisk, MetricPoint::new(200, 100))],
            &primary,
            &MetricPoint::new(200, 100),
        );

        let summary = samples::dashboard_summary().value;
        let jobs = samples::jobs_summary().value;
        let industries = samples::industries().value;
        let confidence = samples::confidence().value;
        let inputs = DigestInputs {
            summary: &summary,
            jobs: &jobs,
            categories: &categories,
            industries: &industries,
            confidence: &confidence,
            comparison: &comparison,
            activity: &[],
        };
        let d = build_digest(&inputs, Freshness::Fresh, false, &Config::default());

        let tech = &d.categories[0];
        assert_eq!(tech.category, PrimaryCategory::Technical);
        assert_eq!(tech.value, 5000);
        let trend = tech.trend.unwrap();
        assert_eq!((trend.current, trend.previous, trend.change), (200, 100, 100));
        assert_eq!(trend.change_percent, 100.0);

        let security = &tech.children[0];
        assert_eq!(security.tag, SecondaryTag::SecurityRisk);
        assert_eq!(security.value, 4000);
        assert_eq!(security.share, 80.0);
        let trend = security.trend.unwrap();
        assert_eq!((trend.current, trend.previous, trend.change), (200, 100, 100));

        // no comparison entry for the tag: no trend rather than a made-up one
        assert_eq!(tech.children[1].tag, SecondaryTag::PrivacyRisk);
        assert!(tech.children[1].trend.is_none());
    }

    #[test]
    fn test_activity_uses_configured_heat_thresholds() {
        let d = sample_digest();
        assert_eq!(d.activity.intensities.len(), 8);
        assert_eq!(d.activity.intensities[7], [0, 3, 4, 2, 3, 1, 1]);
        assert_eq!(d.activity.total, 1373);
        assert_eq!(d.activity.max_week_total, 212);
        assert_eq!(d.activity.avg_per_week, 172);

        let cfg = Config { heat_thresholds: [5, 10, 20, 30], ..Config::default() };
        let d = sample_digest_with(&cfg);
        assert_eq!(d.activity.intensities[7], [2, 4, 4, 3, 4, 2, 2]);
        assert_eq!(d.activity.total, 1373);
    }
}
