//! Row-level listings: job and risk filtering, and the severity × likelihood
//! risk matrix.

use serde::Serialize;
use std::collections::BTreeSet;

use crate::model::{Extraction, Job, JobKind, JobSource, JobStatus};
use crate::taxonomy::TaxonomyLabel;

/// `None` on any field matches everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JobFilter {
    pub status: Option<JobStatus>,
    pub kind: Option<JobKind>,
    pub source: Option<JobSource>,
}

impl JobFilter {
    pub fn matches(&self, job: &Job) -> bool {
        self.status.map_or(true, |s| job.status == s)
            && self.kind.map_or(true, |k| job.kind == k)
            && self.source.map_or(true, |s| job.source == s)
    }

    pub fn apply<'a>(&self, jobs: &'a [Job]) -> Vec<&'a Job> {
        jobs.iter().filter(|j| self.matches(j)).collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RiskFilter {
    pub severity: Option<u8>,
    pub label: Option<TaxonomyLabel>,
    pub sector: Option<String>,
}

impl RiskFilter {
    pub fn matches(&self, risk: &Extraction) -> bool {
        self.severity.map_or(true, |s| risk.severity == s)
            && self.label.map_or(true, |l| risk.taxonomy_label == l)
            && self.sector.as_deref().map_or(true, |s| risk.sector == s)
    }

    pub fn apply<'a>(&self, risks: &'a [Extraction]) -> Vec<&'a Extraction> {
        risks.iter().filter(|r| self.matches(r)).collect()
    }
}

/// Sectors present in the listing, sorted.
pub fn distinct_sectors(risks: &[Extraction]) -> Vec<String> {
    risks
        .iter()
        .map(|r| r.sector.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Taxonomy labels present in the listing, in first-seen order.
pub fn distinct_labels(risks: &[Extraction]) -> Vec<TaxonomyLabel> {
    let mut seen = Vec::new();
    for r in risks {
        if !seen.contains(&r.taxonomy_label) {
            seen.push(r.taxonomy_label);
        }
    }
    seen
}

pub fn count_by_severity(risks: &[Extraction], severity: u8) -> usize {
    risks.iter().filter(|r| r.severity == severity).count()
}

// =============================================================================
// Risk matrix
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskBand {
    Low,
    Moderate,
    Elevated,
    High,
    Critical,
}

impl RiskBand {
    /// Band for a severity × likelihood score (1..=25).
    pub fn for_score(score: u8) -> RiskBand {
        match score {
            s if s >= 20 => RiskBand::Critical,
            s if s >= 12 => RiskBand::High,
            s if s >= 6 => RiskBand::Elevated,
            s if s >= 3 => RiskBand::Moderate,
            _ => RiskBand::Low,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MatrixCell {
    pub severity: u8,
    pub likelihood: u8,
    pub count: u64,
    pub score: u8,
    pub band: RiskBand,
}

/// 5 × 5 grid. Rows run likelihood 5 down to 1, columns severity 1 to 5.
/// Risks with either axis outside 1..=5 are left out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RiskMatrix {
    pub rows: Vec<Vec<MatrixCell>>,
    pub excluded: u64,
}

impl RiskMatrix {
    pub fn cell(&self, severity: u8, likelihood: u8) -> Option<&MatrixCell> {
        self.rows
            .iter()
            .flatten()
            .find(|c| c.severity == severity && c.likelihood == likelihood)
    }

    pub fn total(&self) -> u64 {
        self.rows.iter().flatten().map(|c| c.count).sum()
    }
}

pub fn risk_matrix(risks: &[Extraction]) -> RiskMatrix {
    let mut counts = [[0u64; 5]; 5];
    let mut excluded = 0;
    for r in risks {
        if (1..=5).contains(&r.severity) && (1..=5).contains(&r.likelihood) {
            counts[(r.likelihood - 1) as usize][(r.severity - 1) as usize] += 1;
        } else {
            excluded += 1;
        }
    }
    let rows = (1..=5u8)
        .rev()
        .map(|likelihood| {
            (1..=5u8)
                .map(|severity| {
                    let score = severity * likelihood;
                    MatrixCell {
                        severity,
                        likelihood,
                        count: counts[(likelihood - 1) as usize][(severity - 1) as usize],
                        score,
                        band: RiskBand::for_score(score),
                    }
                })
                .collect()
        })
        .collect();
    RiskMatrix { rows, excluded }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquisition::samples;

    #[test]
    fn test_job_filter() {
        let jobs = samples::jobs().value;
        assert_eq!(JobFilter::default().apply(&jobs).len(), 5);

        let done = JobFilter { status: Some(JobStatus::Done), ..Default::default() };
        assert_eq!(done.apply(&jobs).len(), 2);

        let narrow = JobFilter {
            status: Some(JobStatus::Done),
            kind: Some(JobKind::Ingest),
            source: Some(JobSource::Manual),
        };
        assert!(narrow.apply(&jobs).is_empty());
    }

    #[test]
    fn test_risk_filter() {
        let risks = samples::risks().value;
        let public = RiskFilter { sector: Some("public".into()), ..Default::default() };
        assert_eq!(public.apply(&risks).len(), 2);

        let critical_private = RiskFilter {
            severity: Some(5),
            sector: Some("private".into()),
            ..Default::default()
        };
        let ids: Vec<u64> = critical_private.apply(&risks).iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![2, 4]);

        let label = RiskFilter { label: Some(TaxonomyLabel::FairnessBias), ..Default::default() };
        assert_eq!(label.apply(&risks)[0].id, 3);
    }

    #[test]
    fn test_distinct_values_and_counts() {
        let risks = samples::risks().value;
        assert_eq!(distinct_sectors(&risks), vec!["nonprofit", "private", "public"]);
        assert_eq!(distinct_labels(&risks).len(), 5);
        assert_eq!(count_by_severity(&risks, 5), 2);
        assert_eq!(count_by_severity(&risks, 4), 1);
    }

    #[test]
    fn test_band_thresholds() {
        assert_eq!(RiskBand::for_score(25), RiskBand::Critical);
        assert_eq!(RiskBand::for_score(20), RiskBand::Critical);
        assert_eq!(RiskBand::for_score(16), RiskBand::High);
        assert_eq!(RiskBand::for_score(12), RiskBand::High);
        assert_eq!(RiskBand::for_score(9), RiskBand::Elevated);
        assert_eq!(RiskBand::for_score(4), RiskBand::Moderate);
        assert_eq!(RiskBand::for_score(2), RiskBand::Low);
    }

    #[test]
    fn test_matrix_layout_and_counts() {
        let mut risks = samples::risks().value;
        risks[0].likelihood = 0;
        let m = risk_matrix(&risks);
        assert_eq!(m.rows.len(), 5);
        assert_eq!(m.rows[0][0].likelihood, 5);
        assert_eq!(m.rows[0][0].severity, 1);
        assert_eq!(m.rows[4][4].likelihood, 1);
        assert_eq!(m.cell(5, 4).unwrap().count, 1);
        assert_eq!(m.cell(5, 4).unwrap().band, RiskBand::Critical);
        assert_eq!(m.cell(3, 4).unwrap().count, 1);
        assert_eq!(m.total(), 4);
        assert_eq!(m.excluded, 1);
    }
}
