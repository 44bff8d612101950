use serde::{Deserialize, Serialize};

use super::ComponentKind;
use crate::error::MatchError;

/// 既定の重み。習熟度を最重視し、経験年数は補助的に扱う。
pub const DEFAULT_WEIGHTS: ComponentWeights = ComponentWeights {
    proficiency: 0.30,
    availability: 0.20,
    performance: 0.20,
    team_chemistry: 0.15,
    workload_balance: 0.10,
    experience: 0.05,
};

/// コンポーネント別の重み設定。フィールドは 6 コンポーネントと 1:1 で、
/// 設定漏れや綴り違いが型レベルで起きないようにしてある。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComponentWeights {
    pub proficiency: f64,
    pub availability: f64,
    pub performance: f64,
    pub team_chemistry: f64,
    pub workload_balance: f64,
    pub experience: f64,
}

impl Default for ComponentWeights {
    fn default() -> Self {
        DEFAULT_WEIGHTS
    }
}

impl ComponentWeights {
    pub fn weight_for(&self, kind: ComponentKind) -> f64 {
        match kind {
            ComponentKind::Proficiency => self.proficiency,
            ComponentKind::Availability => self.availability,
            ComponentKind::Performance => self.performance,
            ComponentKind::TeamChemistry => self.team_chemistry,
            ComponentKind::WorkloadBalance => self.workload_balance,
            ComponentKind::Experience => self.experience,
        }
    }

    pub fn sum(&self) -> f64 {
        self.proficiency
            + self.availability
            + self.performance
            + self.team_chemistry
            + self.workload_balance
            + self.experience
    }

    /// 重み合計が 1.0 ± 0.01 に収まらない設定はエラー。黙って補正しない。
    pub fn validate(&self) -> Result<(), MatchError> {
        let total = self.sum();
        if (total - 1.0).abs() > 0.01 {
            return Err(MatchError::InvalidConfiguration(format!(
                "weights must sum to 1.0, current sum: {total}"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_weights_sum_to_one() {
        assert!((DEFAULT_WEIGHTS.sum() - 1.0).abs() < 1e-9);
        assert!(DEFAULT_WEIGHTS.validate().is_ok());
    }

    #[test]
    fn rejects_weights_off_by_more_than_tolerance() {
        let half = ComponentWeights {
            proficiency: 0.5,
            availability: 0.0,
            performance: 0.0,
            team_chemistry: 0.0,
            workload_balance: 0.0,
            experience: 0.0,
        };
        assert!(matches!(
            half.validate(),
            Err(MatchError::InvalidConfiguration(_))
        ));

        let oversized = ComponentWeights {
            proficiency: 0.5,
            ..DEFAULT_WEIGHTS
        };
        assert!((oversized.sum() - 1.2).abs() < 1e-9);
        assert!(oversized.validate().is_err());

        let far_oversized = ComponentWeights {
            proficiency: 0.8,
            ..DEFAULT_WEIGHTS
        };
        assert!((far_oversized.sum() - 1.5).abs() < 1e-9);
        assert!(matches!(
            far_oversized.validate(),
            Err(MatchError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn accepts_sums_within_tolerance() {
        let slightly_low = ComponentWeights {
            proficiency: 0.29,
            ..DEFAULT_WEIGHTS
        };
        assert!(slightly_low.validate().is_ok());

        let slightly_high = ComponentWeights {
            proficiency: 0.31,
            ..DEFAULT_WEIGHTS
        };
        assert!(slightly_high.validate().is_ok());
    }

    #[test]
    fn weight_lookup_matches_fields() {
        assert_eq!(
            DEFAULT_WEIGHTS.weight_for(ComponentKind::Proficiency),
            0.30
        );
        assert_eq!(DEFAULT_WEIGHTS.weight_for(ComponentKind::Experience), 0.05);
    }
}
