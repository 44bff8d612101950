use super::{ComponentKind, ComponentScore, ScoringComponent, ScoringContext};
use crate::allocation::AllocationOracle;
use crate::store::MatchStore;

/// プロジェクト期間中の空き状況を採点する。
/// 100% 追加を仮定した衝突があれば即 0、無ければ空き容量の段階評価。
pub struct AvailabilityScorer<'a> {
    oracle: AllocationOracle<'a>,
}

impl<'a> AvailabilityScorer<'a> {
    pub fn new(store: &'a dyn MatchStore) -> Self {
        Self {
            oracle: AllocationOracle::new(store),
        }
    }
}

impl ScoringComponent for AvailabilityScorer<'_> {
    fn kind(&self) -> ComponentKind {
        ComponentKind::Availability
    }

    fn default_weight(&self) -> f64 {
        0.20
    }

    fn calculate(&self, context: &ScoringContext<'_>) -> ComponentScore {
        let current_allocation = context.candidate.current_allocation_percentage();

        let has_conflict = self.oracle.check_conflict(
            context.candidate.id,
            100,
            context.project.start_date,
            context.project.end_date,
        );

        if has_conflict {
            return ComponentScore::new(
                0.0,
                "Has scheduling conflicts during project period",
                1.0,
            )
            .with_detail("has_conflict", true)
            .with_detail("current_allocation", current_allocation);
        }

        let available_capacity = 100 - current_allocation;
        let (score, explanation) = if available_capacity >= 100 {
            (100.0, "Fully available".to_string())
        } else if available_capacity >= 80 {
            (90.0, format!("{available_capacity}% available capacity"))
        } else if available_capacity >= 60 {
            (75.0, format!("{available_capacity}% available capacity"))
        } else if available_capacity >= 40 {
            (60.0, format!("Limited availability ({available_capacity}%)"))
        } else if available_capacity >= 20 {
            (
                40.0,
                format!("Very limited availability ({available_capacity}%)"),
            )
        } else {
            (
                20.0,
                format!("Minimal availability ({available_capacity}%)"),
            )
        };

        ComponentScore::new(score, explanation, 1.0)
            .with_detail("current_allocation", current_allocation)
            .with_detail("available_capacity", available_capacity)
            .with_detail("has_conflict", false)
    }
}
