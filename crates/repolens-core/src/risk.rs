//! Risk Scoring
//!
//! A bounded, monotonic heuristic turning impact metrics into a score
//! in [0, 100] and a qualitative level. The coefficients are a product
//! decision carried over as-is, not a calibrated model; keep the
//! arithmetic intact.

use serde::{Deserialize, Serialize};

use crate::graph::ImpactReport;

/// Points per transitively affected file.
pub const AFFECTED_WEIGHT: i64 = 8;
/// Cap on the affected-files contribution.
pub const AFFECTED_CAP: i64 = 60;
/// Points per direct dependent.
pub const DEPENDENT_WEIGHT: i64 = 10;
/// Cap on the direct-dependent contribution.
pub const DEPENDENT_CAP: i64 = 25;
/// Penalty when the file participates in an import cycle.
pub const CYCLE_PENALTY: i64 = 15;
/// Discount when the change is scoped to a single symbol.
pub const SYMBOL_SCOPE_DISCOUNT: i64 = 10;

/// Score threshold for the "high" level.
pub const HIGH_THRESHOLD: u8 = 70;
/// Score threshold for the "medium" level.
pub const MEDIUM_THRESHOLD: u8 = 35;

/// Qualitative risk level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }

    /// Classify a score.
    pub fn from_score(score: u8) -> Self {
        if score >= HIGH_THRESHOLD {
            RiskLevel::High
        } else if score >= MEDIUM_THRESHOLD {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Score and level for one prospective change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// Integer score in [0, 100].
    pub score: u8,
    pub level: RiskLevel,
}

impl RiskAssessment {
    pub fn new(score: u8) -> Self {
        Self {
            score,
            level: RiskLevel::from_score(score),
        }
    }

    /// Assess an impact report directly.
    pub fn from_impact(report: &ImpactReport, has_cycle: bool, symbol_scoped: bool) -> Self {
        Self::new(risk_score(
            report.total_affected,
            report.direct_dependents.len(),
            has_cycle,
            symbol_scoped,
        ))
    }
}

/// Compute the risk score, clamped to [0, 100].
pub fn risk_score(
    total_affected: usize,
    direct_dependents: usize,
    has_cycle: bool,
    symbol_scoped: bool,
) -> u8 {
    let mut score = (total_affected as i64 * AFFECTED_WEIGHT).min(AFFECTED_CAP)
        + (direct_dependents as i64 * DEPENDENT_WEIGHT).min(DEPENDENT_CAP);
    if has_cycle {
        score += CYCLE_PENALTY;
    }
    if symbol_scoped {
        score -= SYMBOL_SCOPE_DISCOUNT;
    }
    score.clamp(0, 100) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_arithmetic() {
        // 2*8 + 1*10 = 26
        assert_eq!(risk_score(2, 1, false, false), 26);
        // Caps: 60 + 25
        assert_eq!(risk_score(100, 50, false, false), 85);
        // Cycle penalty on top of caps
        assert_eq!(risk_score(100, 50, true, false), 100);
        // Symbol-scope discount
        assert_eq!(risk_score(2, 1, false, true), 16);
    }

    #[test]
    fn test_clamped_to_range() {
        // Discount cannot go below zero
        assert_eq!(risk_score(0, 0, false, true), 0);
        assert_eq!(risk_score(1000, 1000, true, false), 100);
    }

    #[test]
    fn test_monotonic_in_affected_and_dependents() {
        for affected in 0..20 {
            assert!(
                risk_score(affected + 1, 3, false, false) >= risk_score(affected, 3, false, false)
            );
        }
        for dependents in 0..20 {
            assert!(
                risk_score(5, dependents + 1, false, false)
                    >= risk_score(5, dependents, false, false)
            );
        }
    }

    #[test]
    fn test_levels() {
        assert_eq!(RiskLevel::from_score(0), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(34), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(35), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(69), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(70), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(100), RiskLevel::High);
    }

    #[test]
    fn test_isolated_file_is_low_risk() {
        let assessment = RiskAssessment::new(risk_score(0, 0, false, false));
        assert_eq!(assessment.score, 0);
        assert_eq!(assessment.level, RiskLevel::Low);
    }
}
