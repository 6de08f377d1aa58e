use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Identifies one of the year-versioned progressive tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BracketTableCode {
    /// Employee social-security contribution (INSS, progressive).
    SocialSecurity,
    /// Income-tax withholding (IRRF).
    IncomeTax,
    /// Social-security contribution on an owner's professional draw (flat 11%).
    OwnerDrawSocialSecurity,
    /// Simples Nacional Annex III, evaluated on twelve-month revenue.
    SimplesAnnexIii,
    /// Simples Nacional Annex V, evaluated on twelve-month revenue.
    SimplesAnnexV,
}

impl BracketTableCode {
    pub const ALL: [BracketTableCode; 5] = [
        Self::SocialSecurity,
        Self::IncomeTax,
        Self::OwnerDrawSocialSecurity,
        Self::SimplesAnnexIii,
        Self::SimplesAnnexV,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SocialSecurity => "INSS",
            Self::IncomeTax => "IRRF",
            Self::OwnerDrawSocialSecurity => "INSS_PRO_LABORE",
            Self::SimplesAnnexIii => "SIMPLES_III",
            Self::SimplesAnnexV => "SIMPLES_V",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "INSS" => Some(Self::SocialSecurity),
            "IRRF" => Some(Self::IncomeTax),
            "INSS_PRO_LABORE" => Some(Self::OwnerDrawSocialSecurity),
            "SIMPLES_III" => Some(Self::SimplesAnnexIii),
            "SIMPLES_V" => Some(Self::SimplesAnnexV),
            _ => None,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::SocialSecurity => "INSS - employee contribution",
            Self::IncomeTax => "IRRF - income tax withholding",
            Self::OwnerDrawSocialSecurity => "INSS - contribution on pro-labore",
            Self::SimplesAnnexIii => "Simples Nacional - Annex III",
            Self::SimplesAnnexV => "Simples Nacional - Annex V",
        }
    }

    /// Whether the statutory contribution ceiling clamps the base of this table.
    pub fn uses_contribution_ceiling(&self) -> bool {
        matches!(self, Self::SocialSecurity | Self::OwnerDrawSocialSecurity)
    }
}

/// A single `(upper_bound, rate, deduction)` row of a progressive table.
///
/// `upper_bound` is `None` for the last, unbounded row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxBracket {
    pub fiscal_year: i32,
    pub table_code: BracketTableCode,
    pub upper_bound: Option<Decimal>,
    pub rate: Decimal,
    pub deduction: Decimal,
}
