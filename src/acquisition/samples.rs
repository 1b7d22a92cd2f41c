//! Deterministic sample datasets shown until (or instead of) live data.
//!
//! Each metric family owns exactly one of these; nothing is shared across
//! families and nothing here is mutable.

use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

use crate::aggregate::PrimaryCounts;
use crate::compare::{from_points, Period, PrimaryPoints, SeverityPoints, TimePeriodComparison};
use crate::model::{
    Article, ConfidenceMetrics, DashboardSummary, Extraction, IndustryDistribution, Job, JobKind,
    JobSource, JobSources, JobStatus, JobTotals, JobTypes, JobsSummary, RecentActivity,
    RiskCategoryDistribution, SummaryTotals,
};
use crate::taxonomy::{SecondaryTag, TaxonomyLabel};
use crate::trend::MetricPoint;

pub const SAMPLE_VERSION: &str = "2024.1";

/// Fixed so fingerprints stay stable across runs.
const SAMPLE_TS: &str = "2024-01-15T09:30:00Z";

#[derive(Debug, Clone)]
pub struct FallbackDataset<T> {
    pub version: &'static str,
    pub value: T,
}

impl<T: Serialize> FallbackDataset<T> {
    pub fn new(value: T) -> Self {
        Self { version: SAMPLE_VERSION, value }
    }

    /// SHA-256 of the dataset's JSON encoding, hex.
    pub fn fingerprint(&self) -> String {
        let bytes = serde_json::to_vec(&self.value).unwrap_or_default();
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        hex::encode(hasher.finalize())
    }
}

fn counts(pairs: &[(&str, u64)]) -> BTreeMap<String, u64> {
    pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

fn ranked(pairs: &[(&str, u64)]) -> Vec<(String, u64)> {
    pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

pub fn dashboard_summary() -> FallbackDataset<DashboardSummary> {
    FallbackDataset::new(DashboardSummary {
        totals: SummaryTotals { articles: 10247, risks: 3892 },
        top_taxonomy_labels: ranked(&[
            ("cybersecurity_vulnerability", 892),
            ("privacy_violation", 654),
            ("fairness_bias", 521),
            ("safety_constraint_failure", 489),
            ("model_misuse", 412),
        ]),
        top_tags: ranked(&[
            ("security_risk", 1247),
            ("compliance_regulatory_risk", 892),
            ("privacy_risk", 756),
            ("data_risk", 632),
            ("reputational_risk", 489),
        ]),
    })
}

pub fn jobs_summary() -> FallbackDataset<JobsSummary> {
    FallbackDataset::new(JobsSummary {
        totals: JobTotals { total: 12458, pending: 18, running: 3, done: 11892, error: 342, skipped: 203 },
        success_rate: 94.0,
        recent_activity: RecentActivity { last_24h: 342, completed_24h: 298 },
        job_types: JobTypes { ingest: 8924, aiid: 3534 },
        sources: JobSources { manual: 1247, discovery: 11211 },
        avg_processing_time_seconds: 2.3,
        severity_distribution: counts(&[("1", 1247), ("2", 892), ("3", 1756), ("4", 632), ("5", 189)]),
    })
}

pub fn risk_categories() -> FallbackDataset<RiskCategoryDistribution> {
    FallbackDataset::new(RiskCategoryDistribution {
        primary: PrimaryCounts { technical: 2147, operational: 1089, business: 656 },
        secondary: counts(&[
            ("security_risk", 892),
            ("privacy_risk", 654),
            ("technical_performance_risk", 312),
            ("data_risk", 289),
            ("compliance_regulatory_risk", 456),
            ("legal_liability_risk", 342),
            ("third_party_vendor_risk", 291),
            ("business_financial_risk", 234),
            ("reputational_risk", 189),
            ("ethical_risk", 134),
            ("strategic_risk", 99),
        ]),
        domains: counts(&[
            ("safety_harm", 892),
            ("security_threats", 756),
            ("privacy_data", 654),
            ("fairness_bias", 521),
            ("transparency_accountability", 412),
            ("reliability_robustness", 367),
            ("societal_environmental", 290),
        ]),
    })
}

pub fn industries() -> FallbackDataset<IndustryDistribution> {
    FallbackDataset::new(IndustryDistribution {
        public: counts(&[
            ("Federal Government (US)", 289),
            ("State Government (US)", 178),
            ("Defense & Military", 134),
            ("Educational Institutions (Public)", 98),
            ("Law Enforcement & Emergency Services", 67),
        ]),
        private: counts(&[
            ("Healthcare", 456),
            ("Finance & Banking", 398),
            ("Technology & Software", 367),
            ("Insurance", 234),
            ("Manufacturing", 189),
        ]),
        nonprofit: counts(&[
            ("Educational Institutions (Non-Profit)", 89),
            ("Healthcare (Non-Profit)", 67),
            ("Research & Think Tanks", 45),
            ("Social Services", 34),
            ("Arts & Culture", 23),
        ]),
    })
}

pub fn confidence() -> FallbackDataset<ConfidenceMetrics> {
    FallbackDataset::new(ConfidenceMetrics { average: 87.4, high: 2847, medium: 892, low: 153 })
}

/// The same reference numbers serve both periods; only the label differs.
pub fn comparison(period: Period) -> FallbackDataset<TimePeriodComparison> {
    let severity = SeverityPoints {
        low: MetricPoint::new(2139, 1892),
        medium: MetricPoint::new(1756, 1834),
        high: MetricPoint::new(632, 589),
        critical: MetricPoint::new(189, 212),
    };
    let tags = [
        (SecondaryTag::SecurityRisk, MetricPoint::new(892, 834)),
        (SecondaryTag::PrivacyRisk, MetricPoint::new(654, 701)),
        (SecondaryTag::ComplianceRegulatoryRisk, MetricPoint::new(456, 412)),
        (SecondaryTag::DataRisk, MetricPoint::new(289, 267)),
        (SecondaryTag::TechnicalPerformanceRisk, MetricPoint::new(312, 298)),
        (SecondaryTag::LegalLiabilityRisk, MetricPoint::new(342, 356)),
        (SecondaryTag::ThirdPartyVendorRisk, MetricPoint::new(291, 278)),
        (SecondaryTag::BusinessFinancialRisk, MetricPoint::new(234, 245)),
        (SecondaryTag::ReputationalRisk, MetricPoint::new(189, 178)),
        (SecondaryTag::EthicalRisk, MetricPoint::new(134, 142)),
        (SecondaryTag::StrategicRisk, MetricPoint::new(99, 91)),
    ];
    let primary = PrimaryPoints {
        technical: MetricPoint::new(2147, 2100),
        operational: MetricPoint::new(1089, 1046),
        business: MetricPoint::new(656, 656),
    };
    let overall = MetricPoint::new(3892, 3802);
    FallbackDataset::new(from_points(period, &severity, &tags, &primary, &overall))
}

fn job(id: u64, status: JobStatus, kind: JobKind, source: JobSource, tries: u32, last_error: Option<&str>) -> Job {
    Job {
        id,
        url: format!("https://example.com/article-{}", id),
        status,
        kind,
        source,
        created_at: SAMPLE_TS.to_string(),
        updated_at: SAMPLE_TS.to_string(),
        tries,
        last_error: last_error.map(str::to_string),
    }
}

pub fn jobs() -> FallbackDataset<Vec<Job>> {
    FallbackDataset::new(vec![
        job(1, JobStatus::Done, JobKind::Ingest, JobSource::Discovery, 1, None),
        job(2, JobStatus::Running, JobKind::Aiid, JobSource::Manual, 1, None),
        job(3, JobStatus::Pending, JobKind::Ingest, JobSource::Discovery, 0, None),
        job(4, JobStatus::Error, JobKind::Reextract, JobSource::AutoIngest, 3, Some("Connection timeout")),
        job(5, JobStatus::Done, JobKind::Ingest, JobSource::Discovery, 1, None),
    ])
}

fn article(id: u64, url: &str, title: &str, risks_count: u64) -> Article {
    Article {
        id,
        url: url.to_string(),
        title: title.to_string(),
        raw_text: None,
        sha256: None,
        created_at: SAMPLE_TS.to_string(),
        risks_count: Some(risks_count),
    }
}

pub fn articles() -> FallbackDataset<Vec<Article>> {
    FallbackDataset::new(vec![
        article(1, "https://techcrunch.com/ai-risks-2024", "AI Risk Assessment in Enterprise Applications", 4),
        article(2, "https://wired.com/privacy-ai", "Privacy Concerns in Machine Learning Systems", 3),
        article(3, "https://arxiv.org/bias-study", "Algorithmic Bias in Hiring Systems", 5),
        article(4, "https://security.io/ml-vuln", "Security Vulnerabilities in ML Pipelines", 6),
        article(5, "https://research.org/ai-safety", "AI Safety Research Updates", 2),
    ])
}

/// Risk activity per day over the past eight weeks, oldest week first,
/// Sunday..Saturday. Weekends run lower and recent weeks higher.
const WEEKLY_ACTIVITY: [[u64; 7]; 8] = [
    [6, 19, 28, 13, 22, 31, 9],
    [16, 36, 20, 30, 13, 23, 19],
    [10, 28, 38, 20, 31, 13, 14],
    [21, 17, 28, 39, 21, 32, 8],
    [15, 37, 18, 29, 41, 21, 19],
    [8, 26, 38, 18, 30, 42, 13],
    [21, 49, 27, 40, 18, 31, 26],
    [13, 36, 50, 27, 40, 17, 18],
];

pub fn weekly_activity() -> FallbackDataset<Vec<[u64; 7]>> {
    FallbackDataset::new(WEEKLY_ACTIVITY.to_vec())
}

struct RiskRow<'a> {
    id: u64,
    label: TaxonomyLabel,
    subcategory: &'a str,
    actor: &'a str,
    asset: &'a str,
    capability: &'a str,
    harm: &'a str,
    preconditions: &'a str,
    sector: &'a str,
    industry: &'a str,
    severity: (u8, &'a str),
    likelihood: (u8, &'a str),
}

fn extraction(r: RiskRow<'_>) -> Extraction {
    Extraction {
        id: r.id,
        article_id: r.id,
        taxonomy_label: r.label,
        taxonomy_subcategory: r.subcategory.to_string(),
        actor: r.actor.to_string(),
        asset: r.asset.to_string(),
        capability: r.capability.to_string(),
        harm: r.harm.to_string(),
        preconditions: r.preconditions.to_string(),
        sector: r.sector.to_string(),
        industries: vec![r.industry.to_string()],
        severity: r.severity.0,
        severity_rationale: r.severity.1.to_string(),
        likelihood: r.likelihood.0,
        likelihood_rationale: r.likelihood.1.to_string(),
        created_at: SAMPLE_TS.to_string(),
        primary_category: None,
        secondary_tag: None,
        confidence_score: None,
        risk_domain: None,
    }
}

pub fn risks() -> FallbackDataset<Vec<Extraction>> {
    FallbackDataset::new(vec![
        extraction(RiskRow {
            id: 1, label: TaxonomyLabel::ModelMisuse, subcategory: "Unauthorized Use",
            actor: "External", asset: "AI Model", capability: "Generation", harm: "Misinformation",
            preconditions: "Public access", sector: "public", industry: "Technology",
            severity: (4, "High impact"), likelihood: (3, "Moderate"),
        }),
        extraction(RiskRow {
            id: 2, label: TaxonomyLabel::PrivacyViolation, subcategory: "Data Leak",
            actor: "Internal", asset: "User Data", capability: "Access", harm: "Privacy breach",
            preconditions: "Weak controls", sector: "private", industry: "Healthcare",
            severity: (5, "Critical"), likelihood: (4, "Likely"),
        }),
        extraction(RiskRow {
            id: 3, label: TaxonomyLabel::FairnessBias, subcategory: "Algorithmic Bias",
            actor: "System", asset: "Decision Model", capability: "Prediction", harm: "Discrimination",
            preconditions: "Biased training", sector: "public", industry: "Finance",
            severity: (3, "Medium"), likelihood: (4, "Likely"),
        }),
        extraction(RiskRow {
            id: 4, label: TaxonomyLabel::CybersecurityVulnerability, subcategory: "Injection",
            actor: "External", asset: "API", capability: "Exploit", harm: "System compromise",
            preconditions: "Unpatched", sector: "private", industry: "Technology",
            severity: (5, "Critical"), likelihood: (3, "Moderate"),
        }),
        extraction(RiskRow {
            id: 5, label: TaxonomyLabel::RobustnessFailure, subcategory: "Edge Case",
            actor: "System", asset: "ML Model", capability: "Inference", harm: "Wrong output",
            preconditions: "Unusual input", sector: "nonprofit", industry: "Research",
            severity: (2, "Low"), likelihood: (2, "Unlikely"),
        }),
    ])
}
