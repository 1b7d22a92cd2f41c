//! Fixed lookup tables for the risk taxonomy.
//!
//! Every table here is closed: typed inputs make the lookups total, and
//! string input from the wire goes through `FromStr`, which rejects anything
//! outside the enumeration with a `TaxonomyError`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaxonomyError {
    pub kind: &'static str,
    pub value: String,
}

impl TaxonomyError {
    pub fn new(kind: &'static str, value: impl Into<String>) -> Self {
        Self { kind, value: value.into() }
    }
}

impl fmt::Display for TaxonomyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown {}: {:?}", self.kind, self.value)
    }
}

impl std::error::Error for TaxonomyError {}

// =============================================================================
// Primary categories
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimaryCategory {
    Technical,
    Operational,
    Business,
}

impl PrimaryCategory {
    pub const ALL: [PrimaryCategory; 3] = [
        PrimaryCategory::Technical,
        PrimaryCategory::Operational,
        PrimaryCategory::Business,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PrimaryCategory::Technical => "technical",
            PrimaryCategory::Operational => "operational",
            PrimaryCategory::Business => "business",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PrimaryCategory::Technical => "Technical",
            PrimaryCategory::Operational => "Operational",
            PrimaryCategory::Business => "Business",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            PrimaryCategory::Technical => "hsl(217 91% 60%)",
            PrimaryCategory::Operational => "hsl(38 92% 50%)",
            PrimaryCategory::Business => "hsl(280 70% 50%)",
        }
    }

    /// Secondary tags that roll up into this category, in registry order.
    pub fn tags(&self) -> Vec<SecondaryTag> {
        SecondaryTag::ALL
            .iter()
            .copied()
            .filter(|t| t.primary() == *self)
            .collect()
    }
}

impl FromStr for PrimaryCategory {
    type Err = TaxonomyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PrimaryCategory::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| TaxonomyError::new("primary category", s))
    }
}

// =============================================================================
// Secondary risk tags
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecondaryTag {
    SecurityRisk,
    PrivacyRisk,
    TechnicalPerformanceRisk,
    DataRisk,
    ComplianceRegulatoryRisk,
    LegalLiabilityRisk,
    ThirdPartyVendorRisk,
    BusinessFinancialRisk,
    ReputationalRisk,
    EthicalRisk,
    StrategicRisk,
}

impl SecondaryTag {
    pub const ALL: [SecondaryTag; 11] = [
        SecondaryTag::SecurityRisk,
        SecondaryTag::PrivacyRisk,
        SecondaryTag::TechnicalPerformanceRisk,
        SecondaryTag::DataRisk,
        SecondaryTag::ComplianceRegulatoryRisk,
        SecondaryTag::LegalLiabilityRisk,
        SecondaryTag::ThirdPartyVendorRisk,
        SecondaryTag::BusinessFinancialRisk,
        SecondaryTag::ReputationalRisk,
        SecondaryTag::EthicalRisk,
        SecondaryTag::StrategicRisk,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SecondaryTag::SecurityRisk => "security_risk",
            SecondaryTag::PrivacyRisk => "privacy_risk",
            SecondaryTag::TechnicalPerformanceRisk => "technical_performance_risk",
            SecondaryTag::DataRisk => "data_risk",
            SecondaryTag::ComplianceRegulatoryRisk => "compliance_regulatory_risk",
            SecondaryTag::LegalLiabilityRisk => "legal_liability_risk",
            SecondaryTag::ThirdPartyVendorRisk => "third_party_vendor_risk",
            SecondaryTag::BusinessFinancialRisk => "business_financial_risk",
            SecondaryTag::ReputationalRisk => "reputational_risk",
            SecondaryTag::EthicalRisk => "ethical_risk",
            SecondaryTag::StrategicRisk => "strategic_risk",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SecondaryTag::SecurityRisk => "Security Risk",
            SecondaryTag::PrivacyRisk => "Privacy Risk",
            SecondaryTag::TechnicalPerformanceRisk => "Technical/Performance Risk",
            SecondaryTag::DataRisk => "Data Risk",
            SecondaryTag::ComplianceRegulatoryRisk => "Compliance/Regulatory Risk",
            SecondaryTag::LegalLiabilityRisk => "Legal/Liability Risk",
            SecondaryTag::ThirdPartyVendorRisk => "Third-Party/Vendor Risk",
            SecondaryTag::BusinessFinancialRisk => "Business/Financial Risk",
            SecondaryTag::ReputationalRisk => "Reputational Risk",
            SecondaryTag::EthicalRisk => "Ethical Risk",
            SecondaryTag::StrategicRisk => "Strategic Risk",
        }
    }

    pub fn primary(&self) -> PrimaryCategory {
        match self {
            SecondaryTag::SecurityRisk
            | SecondaryTag::PrivacyRisk
            | SecondaryTag::TechnicalPerformanceRisk
            | SecondaryTag::DataRisk => PrimaryCategory::Technical,
            SecondaryTag::ComplianceRegulatoryRisk
            | SecondaryTag::LegalLiabilityRisk
            | SecondaryTag::ThirdPartyVendorRisk => PrimaryCategory::Operational,
            SecondaryTag::BusinessFinancialRisk
            | SecondaryTag::ReputationalRisk
            | SecondaryTag::EthicalRisk
            | SecondaryTag::StrategicRisk => PrimaryCategory::Business,
        }
    }
}

impl FromStr for SecondaryTag {
    type Err = TaxonomyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SecondaryTag::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| TaxonomyError::new("secondary tag", s))
    }
}

pub fn primary_category_of(tag: SecondaryTag) -> PrimaryCategory {
    tag.primary()
}

// =============================================================================
// Risk domains
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskDomain {
    SafetyHarm,
    SecurityThreats,
    PrivacyData,
    FairnessBias,
    TransparencyAccountability,
    ReliabilityRobustness,
    SocietalEnvironmental,
}

impl RiskDomain {
    pub const ALL: [RiskDomain; 7] = [
        RiskDomain::SafetyHarm,
        RiskDomain::SecurityThreats,
        RiskDomain::PrivacyData,
        RiskDomain::FairnessBias,
        RiskDomain::TransparencyAccountability,
        RiskDomain::ReliabilityRobustness,
        RiskDomain::SocietalEnvironmental,
    ];

    /// Position in `ALL`; used as a dense array index.
    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskDomain::SafetyHarm => "safety_harm",
            RiskDomain::SecurityThreats => "security_threats",
            RiskDomain::PrivacyData => "privacy_data",
            RiskDomain::FairnessBias => "fairness_bias",
            RiskDomain::TransparencyAccountability => "transparency_accountability",
            RiskDomain::ReliabilityRobustness => "reliability_robustness",
            RiskDomain::SocietalEnvironmental => "societal_environmental",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RiskDomain::SafetyHarm => "Safety & Harm",
            RiskDomain::SecurityThreats => "Security Threats",
            RiskDomain::PrivacyData => "Privacy & Data",
            RiskDomain::FairnessBias => "Fairness & Bias",
            RiskDomain::TransparencyAccountability => "Transparency & Accountability",
            RiskDomain::ReliabilityRobustness => "Reliability & Robustness",
            RiskDomain::SocietalEnvironmental => "Societal & Environmental",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            RiskDomain::SafetyHarm => "hsl(0 84% 60%)",
            RiskDomain::SecurityThreats => "hsl(38 92% 50%)",
            RiskDomain::PrivacyData => "hsl(217 91% 60%)",
            RiskDomain::FairnessBias => "hsl(280 70% 50%)",
            RiskDomain::TransparencyAccountability => "hsl(200 70% 50%)",
            RiskDomain::ReliabilityRobustness => "hsl(160 84% 39%)",
            RiskDomain::SocietalEnvironmental => "hsl(330 70% 50%)",
        }
    }
}

impl FromStr for RiskDomain {
    type Err = TaxonomyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RiskDomain::ALL
            .iter()
            .copied()
            .find(|d| d.as_str() == s)
            .ok_or_else(|| TaxonomyError::new("risk domain", s))
    }
}

/// Display label for anything in the registry.
pub trait Labelled {
    fn display_label(&self) -> &'static str;
}

impl Labelled for SecondaryTag {
    fn display_label(&self) -> &'static str {
        self.label()
    }
}

impl Labelled for RiskDomain {
    fn display_label(&self) -> &'static str {
        self.label()
    }
}

impl Labelled for PrimaryCategory {
    fn display_label(&self) -> &'static str {
        self.label()
    }
}

pub fn label_of<L: Labelled>(item: &L) -> &'static str {
    item.display_label()
}

// =============================================================================
// Severity buckets
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeverityBucket {
    Low,
    Medium,
    High,
    Critical,
}

impl SeverityBucket {
    pub const ALL: [SeverityBucket; 4] = [
        SeverityBucket::Low,
        SeverityBucket::Medium,
        SeverityBucket::High,
        SeverityBucket::Critical,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SeverityBucket::Low => "low",
            SeverityBucket::Medium => "medium",
            SeverityBucket::High => "high",
            SeverityBucket::Critical => "critical",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            SeverityBucket::Low => "hsl(160 84% 39%)",
            SeverityBucket::Medium => "hsl(38 92% 50%)",
            SeverityBucket::High => "hsl(25 95% 53%)",
            SeverityBucket::Critical => "hsl(0 84% 60%)",
        }
    }
}

/// Label for a raw 1..5 severity level.
pub fn severity_level_label(level: u8) -> Result<&'static str, TaxonomyError> {
    match level {
        1 => Ok("Very Low"),
        2 => Ok("Low"),
        3 => Ok("Medium"),
        4 => Ok("High"),
        5 => Ok("Critical"),
        other => Err(TaxonomyError::new("severity level", other.to_string())),
    }
}

// =============================================================================
// Sectors and incident taxonomy labels
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sector {
    Public,
    Private,
    Nonprofit,
}

impl Sector {
    /// Presentation order.
    pub const ALL: [Sector; 3] = [Sector::Private, Sector::Public, Sector::Nonprofit];

    pub fn as_str(&self) -> &'static str {
        match self {
            Sector::Public => "public",
            Sector::Private => "private",
            Sector::Nonprofit => "nonprofit",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Sector::Public => "Public Sector",
            Sector::Private => "Private Sector",
            Sector::Nonprofit => "Non-Profit Sector",
        }
    }

    /// Canonical industry names the extraction pipeline assigns in this sector.
    pub fn canonical_industries(&self) -> &'static [&'static str] {
        match self {
            Sector::Public => &[
                "Federal Government (US)",
                "State Government (US)",
                "Local Government (US)",
                "International Governments",
                "Educational Institutions (Public)",
                "Public Healthcare Systems",
                "Public Utilities",
                "Defense & Military",
                "Law Enforcement & Emergency Services",
                "Unknown",
            ],
            Sector::Private => &[
                "Healthcare",
                "Finance & Banking",
                "Insurance",
                "GovTech",
                "Manufacturing",
                "Retail & E-commerce",
                "Technology & Software",
                "Telecommunications",
                "Energy & Utilities",
                "Transportation & Logistics",
                "Real Estate & Construction",
                "Professional Services",
                "Media & Entertainment",
                "Hospitality & Tourism",
                "Agriculture & Food Production",
                "Pharmaceuticals & Biotechnology",
                "Automotive",
                "Aerospace & Defense (Private)",
                "Chemical & Materials",
                "Consumer Goods",
                "Unknown",
            ],
            Sector::Nonprofit => &[
                "Educational Institutions (Non-Profit)",
                "Healthcare (Non-Profit)",
                "Social Services",
                "Arts & Culture",
                "Environmental & Conservation",
                "International Development & Relief",
                "Advocacy & Civil Rights",
                "Religious Organizations",
                "Research & Think Tanks",
                "Foundations & Grantmaking",
                "Community Development",
                "Unknown",
            ],
        }
    }
}

impl FromStr for Sector {
    type Err = TaxonomyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Sector::ALL
            .iter()
            .copied()
            .find(|x| x.as_str() == s)
            .ok_or_else(|| TaxonomyError::new("sector", s))
    }
}

/// Incident class assigned to an extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaxonomyLabel {
    ModelMisuse,
    DataPoisoning,
    MisalignedObjectives,
    PrivacyViolation,
    FairnessBias,
    RobustnessFailure,
    SafetyConstraintFailure,
    Disinformation,
    CybersecurityVulnerability,
    SupplyChainRisk,
    #[serde(other)]
    Other,
}

impl TaxonomyLabel {
    pub const ALL: [TaxonomyLabel; 11] = [
        TaxonomyLabel::ModelMisuse,
        TaxonomyLabel::DataPoisoning,
        TaxonomyLabel::MisalignedObjectives,
        TaxonomyLabel::PrivacyViolation,
        TaxonomyLabel::FairnessBias,
        TaxonomyLabel::RobustnessFailure,
        TaxonomyLabel::SafetyConstraintFailure,
        TaxonomyLabel::Disinformation,
        TaxonomyLabel::CybersecurityVulnerability,
        TaxonomyLabel::SupplyChainRisk,
        TaxonomyLabel::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaxonomyLabel::ModelMisuse => "model_misuse",
            TaxonomyLabel::DataPoisoning => "data_poisoning",
            TaxonomyLabel::MisalignedObjectives => "misaligned_objectives",
            TaxonomyLabel::PrivacyViolation => "privacy_violation",
            TaxonomyLabel::FairnessBias => "fairness_bias",
            TaxonomyLabel::RobustnessFailure => "robustness_failure",
            TaxonomyLabel::SafetyConstraintFailure => "safety_constraint_failure",
            TaxonomyLabel::Disinformation => "disinformation",
            TaxonomyLabel::CybersecurityVulnerability => "cybersecurity_vulnerability",
            TaxonomyLabel::SupplyChainRisk => "supply_chain_risk",
            TaxonomyLabel::Other => "other",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TaxonomyLabel::ModelMisuse => "Model Misuse",
            TaxonomyLabel::DataPoisoning => "Data Poisoning",
            TaxonomyLabel::MisalignedObjectives => "Misaligned Objectives",
            TaxonomyLabel::PrivacyViolation => "Privacy Violation",
            TaxonomyLabel::FairnessBias => "Fairness & Bias",
            TaxonomyLabel::RobustnessFailure => "Robustness Failure",
            TaxonomyLabel::SafetyConstraintFailure => "Safety Constraint Failure",
            TaxonomyLabel::Disinformation => "Disinformation",
            TaxonomyLabel::CybersecurityVulnerability => "Cybersecurity Vulnerability",
            TaxonomyLabel::SupplyChainRisk => "Supply Chain Risk",
            TaxonomyLabel::Other => "Other",
        }
    }
}

impl FromStr for TaxonomyLabel {
    type Err = TaxonomyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TaxonomyLabel::ALL
            .iter()
            .copied()
            .find(|l| l.as_str() == s)
            .ok_or_else(|| TaxonomyError::new("taxonomy label", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_tag_maps_to_one_primary() {
        let total: usize = PrimaryCategory::ALL.iter().map(|c| c.tags().len()).sum();
        assert_eq!(total, SecondaryTag::ALL.len());
        assert_eq!(PrimaryCategory::Technical.tags().len(), 4);
        assert_eq!(PrimaryCategory::Operational.tags().len(), 3);
        assert_eq!(PrimaryCategory::Business.tags().len(), 4);
    }

    #[test]
    fn test_primary_category_of() {
        assert_eq!(primary_category_of(SecondaryTag::DataRisk), PrimaryCategory::Technical);
        assert_eq!(
            primary_category_of(SecondaryTag::ThirdPartyVendorRisk),
            PrimaryCategory::Operational
        );
        assert_eq!(primary_category_of(SecondaryTag::EthicalRisk), PrimaryCategory::Business);
    }

    #[test]
    fn test_string_round_trip_and_rejection() {
        for tag in SecondaryTag::ALL {
            assert_eq!(tag.as_str().parse::<SecondaryTag>().unwrap(), tag);
        }
        let err = "quantum_risk".parse::<SecondaryTag>().unwrap_err();
        assert_eq!(err.kind, "secondary tag");
        assert!("galactic".parse::<RiskDomain>().is_err());
        assert!("state".parse::<Sector>().is_err());
    }

    #[test]
    fn test_labels() {
        assert_eq!(label_of(&SecondaryTag::LegalLiabilityRisk), "Legal/Liability Risk");
        assert_eq!(label_of(&RiskDomain::TransparencyAccountability), "Transparency & Accountability");
        assert_eq!(severity_level_label(1).unwrap(), "Very Low");
        assert!(severity_level_label(0).is_err());
    }

    #[test]
    fn test_domain_index_matches_all_order() {
        for (i, d) in RiskDomain::ALL.iter().enumerate() {
            assert_eq!(d.index(), i);
        }
    }

    #[test]
    fn test_unknown_taxonomy_label_deserializes_as_other() {
        let label: TaxonomyLabel = serde_json::from_str("\"prompt_injection\"").unwrap();
        assert_eq!(label, TaxonomyLabel::Other);
    }
}
