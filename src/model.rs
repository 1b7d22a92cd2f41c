//! Wire types for the dashboard read API.
//!
//! Every field defaults when absent so a partial payload still decodes;
//! labels outside the closed taxonomy are skipped at conversion time.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::aggregate::PrimaryCounts;
use crate::logging::log_unknown_label;
use crate::normalize::{bucket_histogram, BucketCounts};
use crate::taxonomy::{RiskDomain, SecondaryTag, Sector, TaxonomyLabel};

// =============================================================================
// Summaries
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SummaryTotals {
    #[serde(default)]
    pub articles: u64,
    #[serde(default)]
    pub risks: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardSummary {
    #[serde(default)]
    pub totals: SummaryTotals,
    #[serde(default)]
    pub top_taxonomy_labels: Vec<(String, u64)>,
    #[serde(default)]
    pub top_tags: Vec<(String, u64)>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobTotals {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub pending: u64,
    #[serde(default)]
    pub running: u64,
    #[serde(default)]
    pub done: u64,
    #[serde(default)]
    pub error: u64,
    #[serde(default)]
    pub skipped: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecentActivity {
    #[serde(default)]
    pub last_24h: u64,
    #[serde(default)]
    pub completed_24h: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobTypes {
    #[serde(default)]
    pub ingest: u64,
    #[serde(default)]
    pub aiid: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobSources {
    #[serde(default)]
    pub manual: u64,
    #[serde(default)]
    pub discovery: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobsSummary {
    #[serde(default)]
    pub totals: JobTotals,
    #[serde(default)]
    pub success_rate: f64,
    #[serde(default)]
    pub recent_activity: RecentActivity,
    #[serde(default)]
    pub job_types: JobTypes,
    #[serde(default)]
    pub sources: JobSources,
    #[serde(default)]
    pub avg_processing_time_seconds: f64,
    /// Keyed "1".."5"
    #[serde(default)]
    pub severity_distribution: BTreeMap<String, u64>,
}

impl JobsSummary {
    /// Severity histogram collapsed into low/medium/high/critical.
    pub fn severity_buckets(&self) -> BucketCounts {
        let levels = self.severity_distribution.iter().filter_map(|(k, n)| {
            match k.parse::<u8>() {
                Ok(level) => Some((level, *n)),
                Err(_) => {
                    log_unknown_label("severity level", k);
                    None
                }
            }
        });
        let (counts, rejected) = bucket_histogram(levels);
        for level in rejected {
            log_unknown_label("severity level", &level.to_string());
        }
        counts
    }

    /// Count for one raw severity level, 0 if absent.
    pub fn severity_level(&self, level: u8) -> u64 {
        self.severity_distribution
            .get(&level.to_string())
            .copied()
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceMetrics {
    #[serde(default)]
    pub average: f64,
    /// Extractions above 90% confidence
    #[serde(default)]
    pub high: u64,
    /// 70-90%
    #[serde(default)]
    pub medium: u64,
    /// Below 70%
    #[serde(default)]
    pub low: u64,
}

// =============================================================================
// Distributions
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskCategoryDistribution {
    #[serde(default)]
    pub primary: PrimaryCounts,
    #[serde(default)]
    pub secondary: BTreeMap<String, u64>,
    #[serde(default)]
    pub domains: BTreeMap<String, u64>,
}

impl RiskCategoryDistribution {
    /// Known tags in registry order; absent tags count 0.
    pub fn secondary_counts(&self) -> Vec<(SecondaryTag, u64)> {
        for key in self.secondary.keys() {
            if key.parse::<SecondaryTag>().is_err() {
                log_unknown_label("secondary tag", key);
            }
        }
        SecondaryTag::ALL
            .iter()
            .map(|t| (*t, self.secondary.get(t.as_str()).copied().unwrap_or(0)))
            .collect()
    }

    pub fn domain_distribution(&self) -> DomainDistribution {
        let mut dist = DomainDistribution::default();
        for (key, n) in &self.domains {
            match key.parse::<RiskDomain>() {
                Ok(domain) => dist.set(domain, *n),
                Err(_) => log_unknown_label("risk domain", key),
            }
        }
        dist
    }
}

/// Count per risk domain. The key set is the closed 7-domain enumeration;
/// a domain with no data is present with 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DomainDistribution {
    counts: [u64; 7],
}

impl DomainDistribution {
    pub fn get(&self, domain: RiskDomain) -> u64 {
        self.counts[domain.index()]
    }

    pub fn set(&mut self, domain: RiskDomain, count: u64) {
        self.counts[domain.index()] = count;
    }

    pub fn iter(&self) -> impl Iterator<Item = (RiskDomain, u64)> + '_ {
        RiskDomain::ALL.iter().map(move |d| (*d, self.get(*d)))
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }
}

impl FromIterator<(RiskDomain, u64)> for DomainDistribution {
    fn from_iter<I: IntoIterator<Item = (RiskDomain, u64)>>(iter: I) -> Self {
        let mut dist = DomainDistribution::default();
        for (d, n) in iter {
            dist.set(d, n);
        }
        dist
    }
}

/// Sector → industry → count. Industry names are free-form within a sector.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndustryDistribution {
    #[serde(default)]
    pub public: BTreeMap<String, u64>,
    #[serde(default)]
    pub private: BTreeMap<String, u64>,
    #[serde(default)]
    pub nonprofit: BTreeMap<String, u64>,
}

impl IndustryDistribution {
    pub fn sector(&self, sector: Sector) -> &BTreeMap<String, u64> {
        match sector {
            Sector::Public => &self.public,
            Sector::Private => &self.private,
            Sector::Nonprofit => &self.nonprofit,
        }
    }

    pub fn sector_mut(&mut self, sector: Sector) -> &mut BTreeMap<String, u64> {
        match sector {
            Sector::Public => &mut self.public,
            Sector::Private => &mut self.private,
            Sector::Nonprofit => &mut self.nonprofit,
        }
    }

    pub fn sector_total(&self, sector: Sector) -> u64 {
        self.sector(sector).values().sum()
    }

    pub fn grand_total(&self) -> u64 {
        Sector::ALL.iter().map(|s| self.sector_total(*s)).sum()
    }
}

// =============================================================================
// Row-level listings
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Running,
    Done,
    Error,
    Skipped,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobKind {
    Ingest,
    Aiid,
    Reextract,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JobSource {
    Manual,
    Discovery,
    AutoIngest,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: u64,
    #[serde(default)]
    pub url: String,
    pub status: JobStatus,
    pub kind: JobKind,
    pub source: JobSource,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
    #[serde(default)]
    pub tries: u32,
    #[serde(default)]
    pub last_error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub id: u64,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub raw_text: Option<String>,
    #[serde(default)]
    pub sha256: Option<String>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub risks_count: Option<u64>,
}

/// One labelled risk extracted from an article.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Extraction {
    pub id: u64,
    #[serde(default)]
    pub article_id: u64,
    pub taxonomy_label: TaxonomyLabel,
    #[serde(default)]
    pub taxonomy_subcategory: String,
    #[serde(default)]
    pub actor: String,
    #[serde(default)]
    pub asset: String,
    #[serde(default)]
    pub capability: String,
    #[serde(default)]
    pub harm: String,
    #[serde(default)]
    pub preconditions: String,
    #[serde(default)]
    pub sector: String,
    #[serde(default)]
    pub industries: Vec<String>,
    /// 1..5; 0 when absent
    #[serde(default)]
    pub severity: u8,
    #[serde(default)]
    pub severity_rationale: String,
    /// 1..5; 0 when absent
    #[serde(default)]
    pub likelihood: u8,
    #[serde(default)]
    pub likelihood_rationale: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub primary_category: Option<String>,
    #[serde(default)]
    pub secondary_tag: Option<String>,
    #[serde(default)]
    pub confidence_score: Option<f64>,
    #[serde(default)]
    pub risk_domain: Option<String>,
}

impl Extraction {
    pub fn secondary(&self) -> Option<SecondaryTag> {
        self.secondary_tag.as_deref().and_then(|t| t.parse().ok())
    }

    pub fn domain(&self) -> Option<RiskDomain> {
        self.risk_domain.as_deref().and_then(|d| d.parse().ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_payloads_default() {
        let s: DashboardSummary = serde_json::from_str("{}").unwrap();
        assert_eq!(s.totals.risks, 0);
        assert!(s.top_tags.is_empty());

        let j: JobsSummary = serde_json::from_str(r#"{"totals": {"total": 4}}"#).unwrap();
        assert_eq!(j.totals.total, 4);
        assert_eq!(j.totals.error, 0);
        assert_eq!(j.severity_buckets(), BucketCounts::default());
    }

    #[test]
    fn test_summary_tuple_lists() {
        let s: DashboardSummary = serde_json::from_str(
            r#"{"totals":{"articles":3,"risks":2},"top_tags":[["security_risk",12]]}"#,
        )
        .unwrap();
        assert_eq!(s.top_tags, vec![("security_risk".to_string(), 12)]);
    }

    #[test]
    fn test_severity_buckets_skip_bad_keys() {
        let j: JobsSummary = serde_json::from_str(
            r#"{"severity_distribution": {"1": 10, "2": 5, "5": 1, "x": 7, "8": 2}}"#,
        )
        .unwrap();
        let b = j.severity_buckets();
        assert_eq!(b.low, 15);
        assert_eq!(b.critical, 1);
        assert_eq!(b.total(), 16);
        assert_eq!(j.severity_level(2), 5);
        assert_eq!(j.severity_level(3), 0);
    }

    #[test]
    fn test_domain_distribution_is_closed() {
        let d: RiskCategoryDistribution = serde_json::from_str(
            r#"{"domains": {"safety_harm": 4, "made_up": 99}}"#,
        )
        .unwrap();
        let dist = d.domain_distribution();
        assert_eq!(dist.iter().count(), 7);
        assert_eq!(dist.get(RiskDomain::SafetyHarm), 4);
        assert_eq!(dist.get(RiskDomain::PrivacyData), 0);
        assert_eq!(dist.total(), 4);
    }

    #[test]
    fn test_secondary_counts_cover_every_tag() {
        let d: RiskCategoryDistribution =
            serde_json::from_str(r#"{"secondary": {"data_risk": 3}}"#).unwrap();
        let counts = d.secondary_counts();
        assert_eq!(counts.len(), 11);
        assert!(counts.contains(&(SecondaryTag::DataRisk, 3)));
    }

    #[test]
    fn test_industry_totals() {
        let d: IndustryDistribution = serde_json::from_str(
            r#"{"public": {"A": 2, "B": 3}, "private": {"C": 10}}"#,
        )
        .unwrap();
        assert_eq!(d.sector_total(Sector::Public), 5);
        assert_eq!(d.sector_total(Sector::Nonprofit), 0);
        assert_eq!(d.grand_total(), 15);
    }

    #[test]
    fn test_job_with_unknown_enum_values() {
        let job: Job = serde_json::from_str(
            r#"{"id": 1, "status": "archived", "kind": "ingest", "source": "auto-ingest"}"#,
        )
        .unwrap();
        assert_eq!(job.status, JobStatus::Unknown);
        assert_eq!(job.source, JobSource::AutoIngest);
        assert_eq!(job.tries, 0);
    }
}
