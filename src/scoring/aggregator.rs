use std::collections::BTreeMap;

use super::{round2, ComponentKind, ComponentScore, ComponentWeights};

/// 確信度込みの重み付き正規化でコンポーネントスコアを 1 つの総合点にまとめる。
///
/// `total = Σ(score·weight·confidence) / Σ(weight·confidence)`
///
/// 確信度の低いコンポーネント（実績のない新人の Performance など）は
/// 個別の特別扱いなしに自然と寄与が小さくなる。分母が 0 の場合は 0 を返す。
pub fn aggregate(
    component_scores: &BTreeMap<ComponentKind, ComponentScore>,
    weights: &ComponentWeights,
) -> f64 {
    let mut total = 0.0;
    let mut total_confidence = 0.0;

    for (kind, component) in component_scores {
        let weight = weights.weight_for(*kind);
        total += component.score * weight * component.confidence;
        total_confidence += weight * component.confidence;
    }

    if total_confidence > 0.0 {
        round2(total / total_confidence)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::DEFAULT_WEIGHTS;

    fn scores(entries: &[(ComponentKind, f64, f64)]) -> BTreeMap<ComponentKind, ComponentScore> {
        entries
            .iter()
            .map(|(kind, score, confidence)| {
                (*kind, ComponentScore::new(*score, "test", *confidence))
            })
            .collect()
    }

    #[test]
    fn equal_confidence_reduces_to_weighted_average() {
        let components = scores(&[
            (ComponentKind::Proficiency, 80.0, 1.0),
            (ComponentKind::Availability, 100.0, 1.0),
            (ComponentKind::Performance, 70.0, 1.0),
            (ComponentKind::TeamChemistry, 75.0, 1.0),
            (ComponentKind::WorkloadBalance, 90.0, 1.0),
            (ComponentKind::Experience, 55.0, 1.0),
        ]);

        let expected = 80.0 * 0.30
            + 100.0 * 0.20
            + 70.0 * 0.20
            + 75.0 * 0.15
            + 90.0 * 0.10
            + 55.0 * 0.05;
        assert_eq!(aggregate(&components, &DEFAULT_WEIGHTS), round2(expected));
    }

    #[test]
    fn two_component_split_matches_hand_calculation() {
        let weights = ComponentWeights {
            proficiency: 0.5,
            availability: 0.5,
            performance: 0.0,
            team_chemistry: 0.0,
            workload_balance: 0.0,
            experience: 0.0,
        };
        let components = scores(&[
            (ComponentKind::Proficiency, 80.0, 1.0),
            (ComponentKind::Availability, 100.0, 1.0),
        ]);

        // (80*0.5 + 100*0.5) / (0.5 + 0.5)
        assert_eq!(aggregate(&components, &weights), 90.0);
    }

    #[test]
    fn low_confidence_components_contribute_less() {
        let weights = ComponentWeights {
            proficiency: 0.5,
            availability: 0.0,
            performance: 0.5,
            team_chemistry: 0.0,
            workload_balance: 0.0,
            experience: 0.0,
        };

        let confident = scores(&[
            (ComponentKind::Proficiency, 100.0, 1.0),
            (ComponentKind::Performance, 40.0, 1.0),
        ]);
        let uncertain = scores(&[
            (ComponentKind::Proficiency, 100.0, 1.0),
            (ComponentKind::Performance, 40.0, 0.2),
        ]);

        // Performance の確信度が下がるほど総合点は Proficiency に寄る
        assert!(aggregate(&uncertain, &weights) > aggregate(&confident, &weights));
    }

    #[test]
    fn empty_or_zero_confidence_yields_zero() {
        let empty = BTreeMap::new();
        assert_eq!(aggregate(&empty, &DEFAULT_WEIGHTS), 0.0);

        let zeroed = scores(&[(ComponentKind::Proficiency, 100.0, 0.0)]);
        assert_eq!(aggregate(&zeroed, &DEFAULT_WEIGHTS), 0.0);
    }

    #[test]
    fn result_is_rounded_to_two_decimals() {
        let weights = ComponentWeights {
            proficiency: 0.6,
            availability: 0.4,
            performance: 0.0,
            team_chemistry: 0.0,
            workload_balance: 0.0,
            experience: 0.0,
        };
        let components = scores(&[
            (ComponentKind::Proficiency, 33.33, 1.0),
            (ComponentKind::Availability, 66.67, 0.5),
        ]);

        let value = aggregate(&components, &weights);
        assert_eq!(value, round2(value));
    }
}
